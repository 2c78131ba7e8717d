// region:    --- Imports
use crate::auction::events::AuctionEvent;
use crate::error::AppError;
use crate::message_broker::KafkaProducer;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgConnection, PgPool};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

// endregion: --- Imports

// region:    --- Event Model
/// 아웃박스에 저장되는 이벤트 모델
#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct StoredEvent {
    pub id: i64,
    pub aggregate_id: Uuid,
    pub event_type: String,
    pub data: serde_json::Value,
    pub timestamp: DateTime<Utc>,
    pub version: i64,
}

const APPEND_EVENT: &str = r#"
    INSERT INTO events (aggregate_id, event_type, data, timestamp, version)
    VALUES ($1, $2, $3, $4, $5)
    ON CONFLICT (aggregate_id, version) DO NOTHING
"#;

const MARK_PUBLISHED: &str = r#"
    UPDATE events SET published_at = $3
    WHERE aggregate_id = $1 AND version = $2
"#;

/// 미발행 이벤트 조회 (오래된 순)
pub(crate) const GET_UNPUBLISHED_EVENTS: &str = r#"
    SELECT id, aggregate_id, event_type, data, timestamp, version
    FROM events
    WHERE published_at IS NULL
    ORDER BY id
    LIMIT $1
"#;

pub(crate) const MARK_PUBLISHED_BY_ID: &str = "UPDATE events SET published_at = $2 WHERE id = $1";

// endregion: --- Event Model

// region:    --- Outbox
/// 아웃박스에 이벤트 기록, 경매 변경과 같은 트랜잭션의 연결로 호출한다 (중복은 무시)
pub(crate) async fn append_event(
    conn: &mut PgConnection,
    event: &AuctionEvent,
) -> Result<(), AppError> {
    let data = serde_json::to_value(event).map_err(|e| AppError::Transport(e.to_string()))?;
    sqlx::query(APPEND_EVENT)
        .bind(event.auction_id)
        .bind(event.event_type())
        .bind(&data)
        .bind(event.occurred_at)
        .bind(event.version)
        .execute(&mut *conn)
        .await?;
    Ok(())
}
// endregion: --- Outbox

// region:    --- Event Publisher Trait
/// 이벤트 발행 트레이트
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// 아웃박스에 이미 기록된 이벤트를 전송한다.
    /// 실패는 `AppError::Transport` 로 반환되며, 미발행 이벤트는 아웃박스 릴레이가 재전송한다
    async fn publish(&self, event: &AuctionEvent) -> Result<(), AppError>;
}

/// Kafka 전송 후 아웃박스 행을 발행 완료로 표시하는 구현체
pub struct KafkaEventPublisher {
    pool: Arc<PgPool>,
    kafka_producer: Arc<KafkaProducer>,
    topic: String,
}

impl KafkaEventPublisher {
    pub fn new(pool: Arc<PgPool>, kafka_producer: Arc<KafkaProducer>, topic: &str) -> Self {
        Self {
            pool,
            kafka_producer,
            topic: topic.to_string(),
        }
    }
}

#[async_trait]
impl EventPublisher for KafkaEventPublisher {
    async fn publish(&self, event: &AuctionEvent) -> Result<(), AppError> {
        let data =
            serde_json::to_value(event).map_err(|e| AppError::Transport(e.to_string()))?;

        // 이벤트를 카프카에 발행, 실패 시 아웃박스 릴레이가 재전송
        self.kafka_producer
            .send_message(&self.topic, &event.auction_id.to_string(), &data.to_string())
            .await?;

        sqlx::query(MARK_PUBLISHED)
            .bind(event.auction_id)
            .bind(event.version)
            .bind(Utc::now())
            .execute(&*self.pool)
            .await
            .map_err(|e| AppError::Transport(format!("outbox mark failed: {}", e)))?;

        info!(
            "{:<12} --> {} 발행 완료: id={}, version={}",
            "Publisher",
            event.event_type(),
            event.auction_id,
            event.version
        );
        Ok(())
    }
}

// endregion: --- Event Publisher
