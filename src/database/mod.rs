use sqlx::postgres::{PgPool, PgPoolOptions};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tracing::info;

/// 서비스별 스키마
#[derive(Debug, Clone, Copy)]
pub enum Schema {
    Auction,
    Search,
}

impl Schema {
    fn sql(self) -> &'static str {
        match self {
            Schema::Auction => include_str!("../sql/01-auction-schema.sql"),
            Schema::Search => include_str!("../sql/02-search-schema.sql"),
        }
    }
}

pub struct DatabaseManager {
    pub pool: Arc<PgPool>,
}

impl DatabaseManager {
    /// 데이터베이스 매니저 생성
    pub async fn connect(database_url: &str) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?;
        Ok(Self {
            pool: Arc::new(pool),
        })
    }

    /// 데이터베이스 풀 가져오기
    pub fn get_pool(&self) -> Arc<PgPool> {
        Arc::clone(&self.pool)
    }

    /// 트랜잭션 실행
    pub async fn transaction<F, R, E>(&self, f: F) -> Result<R, E>
    where
        F: for<'c> FnOnce(
            &'c mut sqlx::Transaction<'_, sqlx::Postgres>,
        ) -> Pin<Box<dyn Future<Output = Result<R, E>> + Send + 'c>>,
        E: From<sqlx::Error>,
    {
        let mut tx = self.pool.begin().await?;
        let result = f(&mut tx).await;
        match result {
            Ok(r) => {
                tx.commit().await?;
                Ok(r)
            }
            Err(e) => {
                tx.rollback().await?;
                Err(e)
            }
        }
    }

    /// 스키마 초기화 (존재하지 않는 테이블만 생성)
    pub async fn initialize_schema(&self, schema: Schema) -> Result<(), sqlx::Error> {
        info!("{:<12} --> 스키마 초기화: {:?}", "Database", schema);
        let sql = schema.sql();
        self.transaction(|tx| {
            Box::pin(async move {
                for query in sql.split(';') {
                    let query = query.trim();
                    if !query.is_empty() {
                        sqlx::query(query).execute(&mut **tx).await?;
                    }
                }
                Ok::<(), sqlx::Error>(())
            })
        })
        .await
    }
}
