// region:    --- Imports
use crate::auction::events::AuctionEvent;
use crate::config::RetryPolicy;
use crate::error::AppError;
use crate::message_broker::{single_header, KafkaConsumer, KafkaProducer, ReceivedMessage};
use crate::search::projector::{Projection, SearchProjector};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{error, info, warn};

// endregion: --- Imports

// region:    --- Dead Letter
/// 처리 불가능한 메시지 보관소
#[async_trait]
pub trait DeadLetterSink: Send + Sync {
    async fn park(&self, message: &ReceivedMessage, reason: &str) -> Result<(), AppError>;
}

/// Kafka 데드레터 토픽
pub struct KafkaDeadLetterSink {
    producer: Arc<KafkaProducer>,
    topic: String,
}

impl KafkaDeadLetterSink {
    pub fn new(producer: Arc<KafkaProducer>, topic: &str) -> Self {
        Self {
            producer,
            topic: topic.to_string(),
        }
    }
}

#[async_trait]
impl DeadLetterSink for KafkaDeadLetterSink {
    async fn park(&self, message: &ReceivedMessage, reason: &str) -> Result<(), AppError> {
        let key = message.key.clone().unwrap_or_default();
        self.producer
            .send_with_headers(
                &self.topic,
                &key,
                &message.payload,
                single_header("error", reason),
            )
            .await
    }
}
// endregion: --- Dead Letter

// region:    --- Message Handling
/// 메시지 처리 결과
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Projected(Projection),
    DeadLettered,
}

/// 재시도 정책에 따라 이벤트 반영
pub async fn apply_with_retry(
    projector: &SearchProjector,
    event: &AuctionEvent,
    policy: RetryPolicy,
) -> Result<Projection, AppError> {
    let mut attempt = 1;
    loop {
        match projector.apply(event).await {
            Ok(outcome) => return Ok(outcome),
            Err(e) if attempt < policy.attempts => {
                warn!(
                    "{:<12} --> 이벤트 처리 실패, 재시도 {}/{}: id={}, error={}",
                    "Consumer", attempt, policy.attempts, event.auction_id, e
                );
                attempt += 1;
                tokio::time::sleep(policy.interval).await;
            }
            Err(e) => return Err(e),
        }
    }
}

/// 수신 메시지 하나 처리: 역직렬화 → 재시도 반영 → 실패 시 데드레터
pub async fn handle_message(
    projector: &SearchProjector,
    dead_letters: &dyn DeadLetterSink,
    policy: RetryPolicy,
    message: &ReceivedMessage,
) -> Delivery {
    let event = match serde_json::from_slice::<AuctionEvent>(&message.payload) {
        Ok(event) => event,
        Err(e) => {
            error!("{:<12} --> deserialize 오류: {:?}", "Consumer", e);
            park(dead_letters, message, &format!("deserialize: {}", e)).await;
            return Delivery::DeadLettered;
        }
    };

    match apply_with_retry(projector, &event, policy).await {
        Ok(outcome) => Delivery::Projected(outcome),
        Err(e) => {
            error!(
                "{:<12} --> 재시도 초과, 데드레터로 이동: id={}, version={}, error={}",
                "Consumer", event.auction_id, event.version, e
            );
            park(dead_letters, message, &e.to_string()).await;
            Delivery::DeadLettered
        }
    }
}

async fn park(dead_letters: &dyn DeadLetterSink, message: &ReceivedMessage, reason: &str) {
    if let Err(e) = dead_letters.park(message, reason).await {
        // 데드레터 전송까지 실패하면 메시지는 로그로만 남는다
        error!(
            "{:<12} --> 데드레터 전송 실패: partition={}, offset={}, payload={}, error={}",
            "Consumer",
            message.partition,
            message.offset,
            String::from_utf8_lossy(&message.payload),
            e
        );
    }
}
// endregion: --- Message Handling

// region:    --- Event Consumer
/// 검색 서비스 이벤트 컨슈머
pub struct SearchEventConsumer {
    projector: Arc<SearchProjector>,
    kafka_consumer: KafkaConsumer,
    dead_letters: Arc<dyn DeadLetterSink>,
    topic: String,
    policy: RetryPolicy,
}

impl SearchEventConsumer {
    pub fn new(
        projector: Arc<SearchProjector>,
        kafka_consumer: KafkaConsumer,
        dead_letters: Arc<dyn DeadLetterSink>,
        topic: &str,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            projector,
            kafka_consumer,
            dead_letters,
            topic: topic.to_string(),
            policy,
        }
    }

    /// 이벤트 소비 시작
    pub async fn start(&self) {
        info!("{:<12} --> 검색 프로젝션 시작: topic={}", "Consumer", self.topic);
        let result = self
            .kafka_consumer
            .consume(&self.topic, |message| async move {
                handle_message(
                    &self.projector,
                    self.dead_letters.as_ref(),
                    self.policy,
                    &message,
                )
                .await;
            })
            .await;

        if let Err(e) = result {
            error!("{:<12} --> 이벤트 소비 오류: {:?}", "Consumer", e);
        }
    }
}
// endregion: --- Event Consumer

// endregion: --- Tests
