// region:    --- Imports
use crate::error::AppError;
use crate::search::model::{SearchItem, SearchPage};
use crate::search::query::{count_sql, search_sql, SearchQuery};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

// endregion: --- Imports

// region:    --- Queries
/// 저장된 버전보다 새로울 때만 덮어쓰기 (툼스톤 포함)
const UPSERT_IF_NEWER: &str = r#"
    INSERT INTO search_items (id, make, model, color, mileage, year, image_url, reserve_price, seller, winner,
                              sold_amount, current_high_bid, status, auction_end, created_at, updated_at,
                              version, deleted)
    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, FALSE)
    ON CONFLICT (id) DO UPDATE
    SET make = EXCLUDED.make, model = EXCLUDED.model, color = EXCLUDED.color, mileage = EXCLUDED.mileage,
        year = EXCLUDED.year, image_url = EXCLUDED.image_url, reserve_price = EXCLUDED.reserve_price,
        seller = EXCLUDED.seller, winner = EXCLUDED.winner, sold_amount = EXCLUDED.sold_amount,
        current_high_bid = EXCLUDED.current_high_bid, status = EXCLUDED.status,
        auction_end = EXCLUDED.auction_end, created_at = EXCLUDED.created_at,
        updated_at = EXCLUDED.updated_at, version = EXCLUDED.version, deleted = FALSE
    WHERE search_items.version < EXCLUDED.version
"#;

/// 삭제 이벤트 반영 (행이 없으면 툼스톤 생성)
const TOMBSTONE_IF_NEWER: &str = r#"
    INSERT INTO search_items (id, version, deleted)
    VALUES ($1, $2, TRUE)
    ON CONFLICT (id) DO UPDATE
    SET version = EXCLUDED.version, deleted = TRUE
    WHERE search_items.version < EXCLUDED.version
"#;

const GET_SEARCH_ITEM: &str = r#"
    SELECT id, make, model, color, mileage, year, image_url, reserve_price, seller, winner, sold_amount,
           current_high_bid, status, auction_end, created_at, updated_at, version
    FROM search_items
    WHERE id = $1 AND NOT deleted
"#;

/// 가장 최근 수정 시각 (동기화 기준점)
const GET_LATEST_UPDATED_AT: &str =
    "SELECT MAX(updated_at) FROM search_items WHERE NOT deleted";

// endregion: --- Queries

// region:    --- Search Repository
/// 검색 읽기 모델 저장소 트레이트
#[async_trait]
pub trait SearchRepository: Send + Sync {
    /// 없거나 저장된 버전이 더 오래된 경우에만 반영, 반영 여부 반환
    async fn upsert_if_newer(&self, item: &SearchItem) -> Result<bool, AppError>;

    /// 없거나 저장된 버전이 더 오래된 경우에만 툼스톤으로 전환, 반영 여부 반환
    async fn tombstone_if_newer(&self, id: Uuid, version: i64) -> Result<bool, AppError>;

    /// 삭제되지 않은 항목 조회
    async fn get(&self, id: Uuid) -> Result<Option<SearchItem>, AppError>;

    async fn search(&self, query: &SearchQuery, now: DateTime<Utc>)
        -> Result<SearchPage, AppError>;

    async fn latest_updated_at(&self) -> Result<Option<DateTime<Utc>>, AppError>;
}

/// Postgres 검색 저장소
pub struct PostgresSearchRepository {
    pool: Arc<PgPool>,
}

impl PostgresSearchRepository {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SearchRepository for PostgresSearchRepository {
    async fn upsert_if_newer(&self, item: &SearchItem) -> Result<bool, AppError> {
        let result = sqlx::query(UPSERT_IF_NEWER)
            .bind(item.id)
            .bind(&item.make)
            .bind(&item.model)
            .bind(&item.color)
            .bind(item.mileage)
            .bind(item.year)
            .bind(&item.image_url)
            .bind(item.reserve_price)
            .bind(&item.seller)
            .bind(&item.winner)
            .bind(item.sold_amount)
            .bind(item.current_high_bid)
            .bind(&item.status)
            .bind(item.auction_end)
            .bind(item.created_at)
            .bind(item.updated_at)
            .bind(item.version)
            .execute(&*self.pool)
            .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn tombstone_if_newer(&self, id: Uuid, version: i64) -> Result<bool, AppError> {
        let result = sqlx::query(TOMBSTONE_IF_NEWER)
            .bind(id)
            .bind(version)
            .execute(&*self.pool)
            .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn get(&self, id: Uuid) -> Result<Option<SearchItem>, AppError> {
        let item = sqlx::query_as::<_, SearchItem>(GET_SEARCH_ITEM)
            .bind(id)
            .fetch_optional(&*self.pool)
            .await?;
        Ok(item)
    }

    async fn search(
        &self,
        query: &SearchQuery,
        now: DateTime<Utc>,
    ) -> Result<SearchPage, AppError> {
        let total_count: i64 = sqlx::query_scalar(&count_sql())
            .bind(&query.search_term)
            .bind(&query.seller)
            .bind(&query.winner)
            .bind(query.filter.as_key())
            .bind(now)
            .fetch_one(&*self.pool)
            .await?;

        let results = sqlx::query_as::<_, SearchItem>(&search_sql())
            .bind(&query.search_term)
            .bind(&query.seller)
            .bind(&query.winner)
            .bind(query.filter.as_key())
            .bind(now)
            .bind(query.order.as_key())
            .bind(query.page_size)
            .bind(query.offset())
            .fetch_all(&*self.pool)
            .await?;

        Ok(SearchPage::new(results, total_count, query.page_size))
    }

    async fn latest_updated_at(&self) -> Result<Option<DateTime<Utc>>, AppError> {
        let latest: Option<DateTime<Utc>> = sqlx::query_scalar(GET_LATEST_UPDATED_AT)
            .fetch_one(&*self.pool)
            .await?;
        Ok(latest)
    }
}
// endregion: --- Search Repository
