/// 아웃박스 릴레이
/// 요청 처리 중 Kafka 전송에 실패해 `published_at` 이 비어 있는 이벤트를 주기적으로 재전송한다.
// region:    --- Imports
use crate::error::AppError;
use crate::event_store::{StoredEvent, GET_UNPUBLISHED_EVENTS, MARK_PUBLISHED_BY_ID};
use crate::message_broker::KafkaProducer;
use chrono::Utc;
use sqlx::PgPool;
use std::sync::Arc;
use tokio::time::{interval, Duration};
use tracing::{debug, error, info, warn};

// endregion: --- Imports

/// 한 번에 재전송할 최대 이벤트 수
const RELAY_BATCH_SIZE: i64 = 100;

// region:    --- Outbox Relay
pub struct OutboxRelay {
    pool: Arc<PgPool>,
    kafka_producer: Arc<KafkaProducer>,
    topic: String,
    period: Duration,
}

impl OutboxRelay {
    pub fn new(
        pool: Arc<PgPool>,
        kafka_producer: Arc<KafkaProducer>,
        topic: &str,
        period: Duration,
    ) -> Self {
        Self {
            pool,
            kafka_producer,
            topic: topic.to_string(),
            period,
        }
    }

    /// 릴레이 시작
    pub async fn start(self) {
        tokio::spawn(async move {
            let mut interval = interval(self.period);
            loop {
                interval.tick().await;
                if let Err(e) = self.relay_pending().await {
                    error!("{:<12} --> 미발행 이벤트 재전송 중 오류: {:?}", "Relay", e);
                }
            }
        });
    }

    /// 미발행 이벤트 재전송, 전송 실패 시 남은 이벤트는 다음 주기로 넘긴다
    async fn relay_pending(&self) -> Result<usize, AppError> {
        let pending: Vec<StoredEvent> = sqlx::query_as(GET_UNPUBLISHED_EVENTS)
            .bind(RELAY_BATCH_SIZE)
            .fetch_all(self.pool.as_ref())
            .await?;

        if pending.is_empty() {
            debug!("{:<12} --> 미발행 이벤트 없음", "Relay");
            return Ok(0);
        }

        let mut relayed = 0;
        for event in &pending {
            let key = event.aggregate_id.to_string();
            if let Err(e) = self
                .kafka_producer
                .send_message(&self.topic, &key, &event.data.to_string())
                .await
            {
                warn!(
                    "{:<12} --> 재전송 실패: id={}, type={}, error={}",
                    "Relay", event.aggregate_id, event.event_type, e
                );
                break;
            }

            sqlx::query(MARK_PUBLISHED_BY_ID)
                .bind(event.id)
                .bind(Utc::now())
                .execute(self.pool.as_ref())
                .await?;
            relayed += 1;
        }

        info!(
            "{:<12} --> 미발행 이벤트 {}/{}건 재전송",
            "Relay",
            relayed,
            pending.len()
        );
        Ok(relayed)
    }
}
// endregion: --- Outbox Relay
