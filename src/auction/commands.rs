//! 경매 관련 커맨드 처리
//! 1. 생성
//! 2. 조회 / 목록
//! 3. 수정 (소유자만)
//! 4. 삭제 (소유자만)
// region:    --- Imports
use crate::auction::events::AuctionEvent;
use crate::auction::model::{current_time, Auction, AuctionFilter, CreateAuction, UpdateAuction};
use crate::auction::repository::AuctionRepository;
use crate::error::AppError;
use crate::event_store::EventPublisher;
use futures::stream::BoxStream;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

// endregion: --- Imports

// 버전 충돌 시 최대 재시도 횟수
const MAX_RETRIES: u32 = 10;

// region:    --- Auction Store
/// 경매 저장소 + 이벤트 발행
pub struct AuctionStore {
    repository: Arc<dyn AuctionRepository>,
    publisher: Arc<dyn EventPublisher>,
}

impl AuctionStore {
    pub fn new(repository: Arc<dyn AuctionRepository>, publisher: Arc<dyn EventPublisher>) -> Self {
        Self {
            repository,
            publisher,
        }
    }

    /// 1. 경매 생성
    pub async fn create(&self, request: CreateAuction, seller: &str) -> Result<Auction, AppError> {
        info!("{:<12} --> 경매 생성 요청: seller={}", "Command", seller);
        request.validate()?;

        let auction = request.into_auction(seller, current_time());
        let event = AuctionEvent::created(&auction);
        self.repository.insert(&auction, &event).await?;

        self.publish(event).await;
        Ok(auction)
    }

    /// 2. 경매 조회
    pub async fn get(&self, id: Uuid) -> Result<Auction, AppError> {
        self.repository.get(id).await?.ok_or(AppError::NotFound)
    }

    /// 2. 경매 목록 (호출할 때마다 새 스트림)
    pub fn list(&self, filter: AuctionFilter) -> BoxStream<'_, Result<Auction, AppError>> {
        self.repository.list(filter)
    }

    /// 3. 경매 수정
    ///
    /// 존재 여부 → 소유자 → 입력 검증 순으로 확인한다.
    /// 요청 본문을 해석하지 못한 경우에도 같은 순서를 따르도록 해석 결과를 그대로 받는다.
    pub async fn update(
        &self,
        id: Uuid,
        caller: &str,
        patch: Result<UpdateAuction, AppError>,
    ) -> Result<Auction, AppError> {
        info!("{:<12} --> 경매 수정 요청: id={}, caller={}", "Command", id, caller);
        let patch = match patch {
            Ok(patch) => patch,
            Err(e) => {
                authorize(&self.get(id).await?, caller)?;
                return Err(e);
            }
        };

        let mut retries = 0;
        while retries < MAX_RETRIES {
            let current = self.get(id).await?;
            authorize(&current, caller)?;
            patch.validate()?;

            let mut changed = current.clone();
            patch.apply_to(&mut changed);
            changed.updated_at = current_time();
            changed.version = current.version + 1;
            let event = AuctionEvent::updated(&changed);

            match self
                .repository
                .update(&changed, current.version, &event)
                .await?
            {
                Some(updated) => {
                    self.publish(event).await;
                    return Ok(updated);
                }
                None => {
                    warn!(
                        "{:<12} --> 낙관적 업데이트로 인한 버전 충돌: 재시도",
                        "Command"
                    );
                    retries += 1;
                }
            }
        }

        Err(AppError::Conflict)
    }

    /// 4. 경매 삭제
    pub async fn delete(&self, id: Uuid, caller: &str) -> Result<(), AppError> {
        info!("{:<12} --> 경매 삭제 요청: id={}, caller={}", "Command", id, caller);
        let mut retries = 0;

        while retries < MAX_RETRIES {
            let current = self.get(id).await?;
            authorize(&current, caller)?;

            let event = AuctionEvent::deleted(&current, current_time());
            if self.repository.delete(id, current.version, &event).await? {
                self.publish(event).await;
                return Ok(());
            }

            warn!("{:<12} --> 삭제 중 버전 충돌: 재시도", "Command");
            retries += 1;
        }

        Err(AppError::Conflict)
    }

    /// 이벤트 전송, 실패해도 커밋된 변경과 아웃박스 행은 유지 (아웃박스 릴레이가 재전송)
    async fn publish(&self, event: AuctionEvent) {
        if let Err(e) = self.publisher.publish(&event).await {
            warn!(
                "{:<12} --> {} 발행 실패 (변경은 커밋됨): id={}, version={}, error={}",
                "Command",
                event.event_type(),
                event.auction_id,
                event.version,
                e
            );
        }
    }
}

/// 변경 권한 확인: 요청자 == 판매자
pub fn authorize(auction: &Auction, caller: &str) -> Result<(), AppError> {
    if auction.is_owned_by(caller) {
        Ok(())
    } else {
        Err(AppError::Forbidden)
    }
}

// endregion: --- Auction Store

// endregion: --- Tests
