pub mod auction;
pub mod auth;
pub mod search;

use axum::http::StatusCode;

/// 헬스 체크
pub async fn handle_health() -> StatusCode {
    StatusCode::OK
}
