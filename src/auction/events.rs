use crate::auction::model::Auction;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 경매 변경 이벤트 본문
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub enum AuctionEventPayload {
    // 생성 이벤트 (전체 스냅샷)
    Created(Auction),
    // 수정 이벤트 (수정 후 전체 스냅샷)
    Updated(Auction),
    // 삭제 이벤트
    Deleted,
}

/// 메시지 브로커로 발행되는 경매 이벤트
///
/// 같은 경매에 대한 이벤트는 `version` 으로 순서가 정해지며,
/// 소비자는 도착 순서가 아니라 버전으로 최신 여부를 판단한다.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct AuctionEvent {
    pub auction_id: Uuid,
    pub version: i64,
    pub occurred_at: DateTime<Utc>,
    pub payload: AuctionEventPayload,
}

impl AuctionEvent {
    pub fn created(auction: &Auction) -> Self {
        Self {
            auction_id: auction.id,
            version: auction.version,
            occurred_at: auction.updated_at,
            payload: AuctionEventPayload::Created(auction.clone()),
        }
    }

    pub fn updated(auction: &Auction) -> Self {
        Self {
            auction_id: auction.id,
            version: auction.version,
            occurred_at: auction.updated_at,
            payload: AuctionEventPayload::Updated(auction.clone()),
        }
    }

    /// 삭제 이벤트는 마지막 버전 다음 버전을 가진다
    pub fn deleted(auction: &Auction, now: DateTime<Utc>) -> Self {
        Self {
            auction_id: auction.id,
            version: auction.version + 1,
            occurred_at: now,
            payload: AuctionEventPayload::Deleted,
        }
    }

    pub fn event_type(&self) -> &'static str {
        match self.payload {
            AuctionEventPayload::Created(_) => "AuctionCreated",
            AuctionEventPayload::Updated(_) => "AuctionUpdated",
            AuctionEventPayload::Deleted => "AuctionDeleted",
        }
    }
}
