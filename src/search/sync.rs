//! 검색 서비스 시작 시 경매 서비스와의 동기화
//!
//! 이벤트를 놓쳤거나 검색 DB 가 새로 만들어진 경우, 마지막으로 반영된 수정 시각 이후의
//! 경매를 경매 서비스에서 직접 가져와 읽기 모델에 반영한다.
// region:    --- Imports
use crate::auction::model::Auction;
use crate::error::AppError;
use crate::search::projector::{Projection, SearchProjector};
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tokio::time;
use tracing::{info, warn};

// endregion: --- Imports

// region:    --- Auction Service Client
/// 경매 서비스 HTTP 클라이언트
#[derive(Clone)]
pub struct AuctionServiceClient {
    client: Client,
    base_url: String,
}

impl AuctionServiceClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// `since` 이후 수정된 경매 목록 조회
    pub async fn get_auctions_since(
        &self,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<Auction>, AppError> {
        let mut request = self.client.get(format!("{}/api/auctions", self.base_url));
        if let Some(since) = since {
            request = request.query(&[("date", since.to_rfc3339_opts(SecondsFormat::Micros, true))]);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AppError::Transport(e.to_string()))?;

        // 404 는 경매 서비스가 아직 준비되지 않은 것으로 보고 재시도 대상으로 취급
        match response.status() {
            status if status.is_success() => response
                .json::<Vec<Auction>>()
                .await
                .map_err(|e| AppError::Transport(e.to_string())),
            StatusCode::NOT_FOUND => Err(AppError::Transport(
                "auction service returned 404".to_string(),
            )),
            status if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS => Err(
                AppError::Transport(format!("auction service returned {}", status)),
            ),
            status => Err(AppError::Validation(format!(
                "auction service rejected sync request: {}",
                status
            ))),
        }
    }
}
// endregion: --- Auction Service Client

// region:    --- Reconciliation
/// 동기화 실행, 일시적 오류는 고정 간격으로 무제한 재시도
pub async fn reconcile(
    projector: &SearchProjector,
    client: &AuctionServiceClient,
    retry_interval: Duration,
) -> Result<usize, AppError> {
    let since = projector.repository().latest_updated_at().await?;
    info!("{:<12} --> 경매 서비스 동기화 시작: since={:?}", "Sync", since);

    let auctions = loop {
        match client.get_auctions_since(since).await {
            Ok(auctions) => break auctions,
            Err(e) if e.is_transient() => {
                warn!(
                    "{:<12} --> 경매 서비스 호출 실패, {:?} 후 재시도: {}",
                    "Sync", retry_interval, e
                );
                time::sleep(retry_interval).await;
            }
            Err(e) => return Err(e),
        }
    };

    let mut applied = 0;
    for auction in &auctions {
        if projector.apply_snapshot(auction).await? == Projection::Applied {
            applied += 1;
        }
    }

    info!(
        "{:<12} --> 동기화 완료: 수신 {}건, 반영 {}건",
        "Sync",
        auctions.len(),
        applied
    );
    Ok(applied)
}
// endregion: --- Reconciliation

// endregion: --- Tests
