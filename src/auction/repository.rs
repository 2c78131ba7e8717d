// region:    --- Imports
use crate::auction::events::AuctionEvent;
use crate::auction::model::{Auction, AuctionFilter};
use crate::database::DatabaseManager;
use crate::error::AppError;
use crate::event_store::append_event;
use async_trait::async_trait;
use futures::stream::{BoxStream, StreamExt};
use std::sync::Arc;
use uuid::Uuid;

// endregion: --- Imports

// region:    --- Queries
/// 경매 생성
const INSERT_AUCTION: &str = r#"
    INSERT INTO auctions (id, make, model, color, mileage, year, image_url, reserve_price, seller,
                          winner, sold_amount, current_high_bid, status, auction_end, created_at, updated_at, version)
    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
"#;

/// 경매 조회
const GET_AUCTION: &str = r#"
    SELECT id, make, model, color, mileage, year, image_url, reserve_price, seller, winner, sold_amount,
           current_high_bid, status, auction_end, created_at, updated_at, version
    FROM auctions
    WHERE id = $1
"#;

/// 경매 목록 조회 (필터는 NULL 이면 무시)
const LIST_AUCTIONS: &str = r#"
    SELECT id, make, model, color, mileage, year, image_url, reserve_price, seller, winner, sold_amount,
           current_high_bid, status, auction_end, created_at, updated_at, version
    FROM auctions
    WHERE ($1::text IS NULL OR lower(make) = lower($1))
      AND ($2::text IS NULL OR seller = $2)
      AND ($3::text IS NULL OR winner = $3)
      AND ($4::timestamptz IS NULL OR updated_at > $4)
    ORDER BY make, id
"#;

/// 버전이 일치할 때만 수정 (낙관적 동시성 제어)
const UPDATE_AUCTION: &str = r#"
    UPDATE auctions
    SET make = $3, model = $4, color = $5, mileage = $6, year = $7, updated_at = $8, version = version + 1
    WHERE id = $1 AND version = $2
    RETURNING id, make, model, color, mileage, year, image_url, reserve_price, seller, winner, sold_amount,
              current_high_bid, status, auction_end, created_at, updated_at, version
"#;

/// 버전이 일치할 때만 삭제
const DELETE_AUCTION: &str = "DELETE FROM auctions WHERE id = $1 AND version = $2";

// endregion: --- Queries

// region:    --- Auction Repository
/// 경매 저장소 트레이트
///
/// 변경 메서드는 경매 행과 아웃박스 이벤트를 한 트랜잭션으로 기록한다.
/// 버전 충돌로 변경되지 않으면 이벤트도 기록되지 않는다.
#[async_trait]
pub trait AuctionRepository: Send + Sync {
    async fn insert(&self, auction: &Auction, event: &AuctionEvent) -> Result<(), AppError>;

    async fn get(&self, id: Uuid) -> Result<Option<Auction>, AppError>;

    /// 호출할 때마다 새로 조회하는 지연 스트림
    fn list(&self, filter: AuctionFilter) -> BoxStream<'_, Result<Auction, AppError>>;

    /// `expected_version` 과 저장된 버전이 같을 때만 수정, 충돌 시 `None`
    async fn update(
        &self,
        auction: &Auction,
        expected_version: i64,
        event: &AuctionEvent,
    ) -> Result<Option<Auction>, AppError>;

    /// `expected_version` 과 저장된 버전이 같을 때만 삭제, 삭제 여부 반환
    async fn delete(
        &self,
        id: Uuid,
        expected_version: i64,
        event: &AuctionEvent,
    ) -> Result<bool, AppError>;
}

/// Postgres 경매 저장소
pub struct PostgresAuctionRepository {
    db_manager: Arc<DatabaseManager>,
}

impl PostgresAuctionRepository {
    pub fn new(db_manager: Arc<DatabaseManager>) -> Self {
        Self { db_manager }
    }
}

#[async_trait]
impl AuctionRepository for PostgresAuctionRepository {
    async fn insert(&self, auction: &Auction, event: &AuctionEvent) -> Result<(), AppError> {
        let auction = auction.clone();
        let event = event.clone();
        self.db_manager
            .transaction(move |tx| {
                Box::pin(async move {
                    sqlx::query(INSERT_AUCTION)
                        .bind(auction.id)
                        .bind(&auction.make)
                        .bind(&auction.model)
                        .bind(&auction.color)
                        .bind(auction.mileage)
                        .bind(auction.year)
                        .bind(&auction.image_url)
                        .bind(auction.reserve_price)
                        .bind(&auction.seller)
                        .bind(&auction.winner)
                        .bind(auction.sold_amount)
                        .bind(auction.current_high_bid)
                        .bind(&auction.status)
                        .bind(auction.auction_end)
                        .bind(auction.created_at)
                        .bind(auction.updated_at)
                        .bind(auction.version)
                        .execute(&mut **tx)
                        .await?;
                    append_event(&mut **tx, &event).await?;
                    Ok::<(), AppError>(())
                })
            })
            .await
    }

    async fn get(&self, id: Uuid) -> Result<Option<Auction>, AppError> {
        let auction = sqlx::query_as::<_, Auction>(GET_AUCTION)
            .bind(id)
            .fetch_optional(self.db_manager.pool.as_ref())
            .await?;
        Ok(auction)
    }

    fn list(&self, filter: AuctionFilter) -> BoxStream<'_, Result<Auction, AppError>> {
        sqlx::query_as::<_, Auction>(LIST_AUCTIONS)
            .bind(filter.make)
            .bind(filter.seller)
            .bind(filter.winner)
            .bind(filter.updated_after)
            .fetch(self.db_manager.pool.as_ref())
            .map(|row| row.map_err(AppError::from))
            .boxed()
    }

    async fn update(
        &self,
        auction: &Auction,
        expected_version: i64,
        event: &AuctionEvent,
    ) -> Result<Option<Auction>, AppError> {
        let auction = auction.clone();
        let event = event.clone();
        self.db_manager
            .transaction(move |tx| {
                Box::pin(async move {
                    let updated = sqlx::query_as::<_, Auction>(UPDATE_AUCTION)
                        .bind(auction.id)
                        .bind(expected_version)
                        .bind(&auction.make)
                        .bind(&auction.model)
                        .bind(&auction.color)
                        .bind(auction.mileage)
                        .bind(auction.year)
                        .bind(auction.updated_at)
                        .fetch_optional(&mut **tx)
                        .await?;
                    if updated.is_some() {
                        append_event(&mut **tx, &event).await?;
                    }
                    Ok::<Option<Auction>, AppError>(updated)
                })
            })
            .await
    }

    async fn delete(
        &self,
        id: Uuid,
        expected_version: i64,
        event: &AuctionEvent,
    ) -> Result<bool, AppError> {
        let event = event.clone();
        self.db_manager
            .transaction(move |tx| {
                Box::pin(async move {
                    let result = sqlx::query(DELETE_AUCTION)
                        .bind(id)
                        .bind(expected_version)
                        .execute(&mut **tx)
                        .await?;
                    let deleted = result.rows_affected() == 1;
                    if deleted {
                        append_event(&mut **tx, &event).await?;
                    }
                    Ok::<bool, AppError>(deleted)
                })
            })
            .await
    }
}
// endregion: --- Auction Repository
