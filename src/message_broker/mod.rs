// region:    --- Imports
use crate::error::AppError;
use rdkafka::admin::{AdminClient, AdminOptions, NewTopic, TopicReplication};
use rdkafka::client::DefaultClientContext;
use rdkafka::consumer::{Consumer, StreamConsumer};
use rdkafka::error::{KafkaError, RDKafkaErrorCode};
use rdkafka::message::{BorrowedMessage, Header, Message, OwnedHeaders};
use rdkafka::producer::{FutureProducer, FutureRecord};
use rdkafka::ClientConfig;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

// endregion: --- Imports

// region:    --- Kafka Producer
#[derive(Clone)]
pub struct KafkaProducer {
    producer: Arc<FutureProducer>,
}

/// KafkaProducer 구현
impl KafkaProducer {
    pub fn new(brokers: &str) -> Result<Self, AppError> {
        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", brokers)
            .set("message.timeout.ms", "5000")
            .set("enable.idempotence", "true")
            .create()
            .map_err(|e| AppError::Transport(format!("Producer creation error: {:?}", e)))?;

        Ok(KafkaProducer {
            producer: Arc::new(producer),
        })
    }

    /// 메시지 전송
    pub async fn send_message(&self, topic: &str, key: &str, value: &str) -> Result<(), AppError> {
        self.send_with_headers(topic, key, value.as_bytes(), OwnedHeaders::new())
            .await
    }

    /// 헤더를 포함한 메시지 전송
    pub async fn send_with_headers(
        &self,
        topic: &str,
        key: &str,
        payload: &[u8],
        headers: OwnedHeaders,
    ) -> Result<(), AppError> {
        info!(
            "{:<12} --> Kafka 메시지 전송: topic={}, key={}",
            "Producer", topic, key
        );
        let record = FutureRecord::to(topic)
            .key(key)
            .payload(payload)
            .headers(headers);

        self.producer
            .send(record, Duration::from_secs(0))
            .await
            .map_err(|(e, _)| AppError::Transport(format!("Error sending message: {:?}", e)))?;

        Ok(())
    }
}

/// 헤더 하나를 가진 헤더 목록 생성
pub fn single_header(key: &str, value: &str) -> OwnedHeaders {
    OwnedHeaders::new().insert(Header {
        key,
        value: Some(value),
    })
}

// endregion: --- Kafka Producer

// region:    --- Kafka Consumer
pub struct KafkaConsumer {
    consumer: Arc<StreamConsumer>,
}

/// KafkaConsumer 구현
impl KafkaConsumer {
    pub fn new(brokers: &str, group_id: &str) -> Result<Self, AppError> {
        let consumer: StreamConsumer = ClientConfig::new()
            .set("bootstrap.servers", brokers)
            .set("group.id", group_id)
            .set("enable.auto.commit", "true")
            .set("auto.offset.reset", "earliest")
            .set("session.timeout.ms", "6000")
            .set("fetch.max.bytes", "5242880")
            .set("allow.auto.create.topics", "true")
            .create()
            .map_err(|e| AppError::Transport(format!("Consumer creation failed: {:?}", e)))?;

        Ok(KafkaConsumer {
            consumer: Arc::new(consumer),
        })
    }

    /// 토픽을 구독하고 메시지를 순서대로 처리
    ///
    /// 핸들러가 반환할 때까지 다음 메시지를 받지 않으므로 같은 파티션(같은 키) 내 순서가 유지된다.
    pub async fn consume<F, Fut>(&self, topic: &str, mut handler: F) -> Result<(), AppError>
    where
        F: FnMut(ReceivedMessage) -> Fut,
        Fut: Future<Output = ()>,
    {
        info!("{:<12} --> Kafka 구독 시작: topic={}", "Consumer", topic);
        self.consumer
            .subscribe(&[topic])
            .map_err(|e| AppError::Transport(e.to_string()))?;

        loop {
            let received = match self.consumer.recv().await {
                Ok(message) => {
                    info!(
                        "{:<12} --> 메시지 수신: topic={}, partition={}, offset={}",
                        "Consumer",
                        message.topic(),
                        message.partition(),
                        message.offset()
                    );
                    ReceivedMessage::from_borrowed(&message)
                }
                Err(e) => {
                    error!("{:<12} --> 메시지 수신 오류: {:?}", "Consumer", e);
                    continue;
                }
            };

            match received {
                Some(received) => handler(received).await,
                None => warn!("{:<12} --> 빈 페이로드 수신", "Consumer"),
            }
        }
    }
}

/// 컨슈머 스레드 밖으로 넘길 수 있는 수신 메시지 사본
#[derive(Debug, Clone)]
pub struct ReceivedMessage {
    pub key: Option<String>,
    pub payload: Vec<u8>,
    pub partition: i32,
    pub offset: i64,
}

impl ReceivedMessage {
    fn from_borrowed(message: &BorrowedMessage<'_>) -> Option<Self> {
        let payload = message.payload()?.to_vec();
        let key = message
            .key()
            .map(|k| String::from_utf8_lossy(k).into_owned());
        Some(Self {
            key,
            payload,
            partition: message.partition(),
            offset: message.offset(),
        })
    }
}

// endregion: --- Kafka Consumer

// region:    --- Kafka Manager
pub struct KafkaManager {
    brokers: String,
}

/// KafkaManager 구현
impl KafkaManager {
    pub fn new(brokers: &str) -> Self {
        KafkaManager {
            brokers: brokers.to_string(),
        }
    }

    pub fn producer(&self) -> Result<Arc<KafkaProducer>, AppError> {
        Ok(Arc::new(KafkaProducer::new(&self.brokers)?))
    }

    pub fn consumer(&self, group_id: &str) -> Result<KafkaConsumer, AppError> {
        KafkaConsumer::new(&self.brokers, group_id)
    }

    /// 토픽 생성 (이미 존재하면 성공으로 간주)
    pub async fn create_topic(
        &self,
        topic_name: &str,
        num_partitions: i32,
        replication_factor: i32,
    ) -> Result<(), AppError> {
        info!("{:<12} --> Kafka 토픽 생성 시작: {}", "Manager", topic_name);

        let admin_client: AdminClient<DefaultClientContext> = ClientConfig::new()
            .set("bootstrap.servers", &self.brokers)
            .create()
            .map_err(|e| AppError::Transport(format!("AdminClient 생성 실패: {:?}", e)))?;

        let new_topic = NewTopic::new(
            topic_name,
            num_partitions,
            TopicReplication::Fixed(replication_factor),
        );

        let results = admin_client
            .create_topics(&[new_topic], &AdminOptions::new())
            .await
            .map_err(|e: KafkaError| {
                error!("{:<12} --> Kafka 토픽 생성 실패: {:?}", "Manager", e);
                AppError::Transport(format!("토픽 생성 실패: {:?}", e))
            })?;

        for result in results {
            match result {
                Ok(name) => info!("{:<12} --> Kafka 토픽 생성 성공: {}", "Manager", name),
                Err((name, RDKafkaErrorCode::TopicAlreadyExists)) => {
                    info!("{:<12} --> Kafka 토픽 이미 존재: {}", "Manager", name)
                }
                Err((name, code)) => {
                    error!("{:<12} --> Kafka 토픽 생성 실패: {} {:?}", "Manager", name, code);
                    return Err(AppError::Transport(format!(
                        "토픽 생성 실패: {} {:?}",
                        name, code
                    )));
                }
            }
        }
        Ok(())
    }
}

// endregion: --- Kafka Manager
