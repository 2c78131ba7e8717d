//! 경매 이벤트를 검색 읽기 모델에 반영
//!
//! 같은 경매에 대한 이벤트는 버전이 더 높은 것만 반영된다.
//! 중복 수신과 순서 뒤바뀜 모두 같은 최종 상태로 수렴한다.
// region:    --- Imports
use crate::auction::events::{AuctionEvent, AuctionEventPayload};
use crate::auction::model::Auction;
use crate::error::AppError;
use crate::search::model::SearchItem;
use crate::search::repository::SearchRepository;
use std::sync::Arc;
use tracing::{debug, info};

// endregion: --- Imports

/// 이벤트 반영 결과
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Projection {
    /// 읽기 모델이 변경됨
    Applied,
    /// 이미 같거나 더 새로운 버전이 반영되어 있음
    Stale,
}

impl From<bool> for Projection {
    fn from(applied: bool) -> Self {
        if applied {
            Projection::Applied
        } else {
            Projection::Stale
        }
    }
}

pub struct SearchProjector {
    repository: Arc<dyn SearchRepository>,
}

impl SearchProjector {
    pub fn new(repository: Arc<dyn SearchRepository>) -> Self {
        Self { repository }
    }

    pub fn repository(&self) -> Arc<dyn SearchRepository> {
        Arc::clone(&self.repository)
    }

    /// 이벤트 반영
    pub async fn apply(&self, event: &AuctionEvent) -> Result<Projection, AppError> {
        let outcome = match &event.payload {
            // 생성/수정 모두 스냅샷 upsert, 행이 없으면 스냅샷으로 새로 만든다
            AuctionEventPayload::Created(auction) | AuctionEventPayload::Updated(auction) => {
                let mut item = SearchItem::from(auction);
                item.version = event.version;
                self.repository.upsert_if_newer(&item).await?
            }
            AuctionEventPayload::Deleted => {
                self.repository
                    .tombstone_if_newer(event.auction_id, event.version)
                    .await?
            }
        };

        let outcome = Projection::from(outcome);
        match outcome {
            Projection::Applied => info!(
                "{:<12} --> {} 반영: id={}, version={}",
                "Projector",
                event.event_type(),
                event.auction_id,
                event.version
            ),
            Projection::Stale => debug!(
                "{:<12} --> {} 무시 (이미 최신): id={}, version={}",
                "Projector",
                event.event_type(),
                event.auction_id,
                event.version
            ),
        }
        Ok(outcome)
    }

    /// 경매 서비스에서 직접 가져온 스냅샷 반영 (동기화용)
    pub async fn apply_snapshot(&self, auction: &Auction) -> Result<Projection, AppError> {
        let applied = self
            .repository
            .upsert_if_newer(&SearchItem::from(auction))
            .await?;
        Ok(Projection::from(applied))
    }
}

// endregion: --- Tests
