// region:    --- Imports
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::error;

// endregion: --- Imports

// region:    --- App Error
/// 서비스 공통 에러
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// 잘못된 입력
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("auction not found")]
    NotFound,

    /// 소유자가 아닌 사용자의 변경 요청
    #[error("caller does not own this auction")]
    Forbidden,

    #[error("authentication required")]
    Unauthenticated,

    /// 낙관적 업데이트 재시도 초과
    #[error("auction was modified concurrently, retry the request")]
    Conflict,

    /// 메시지 브로커 / 외부 HTTP 전송 오류 (재시도 대상)
    #[error("transport error: {0}")]
    Transport(String),

    /// 영속화 실패
    #[error("store error: {0}")]
    Store(#[from] sqlx::Error),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::Unauthenticated => StatusCode::UNAUTHORIZED,
            AppError::Conflict => StatusCode::CONFLICT,
            AppError::Transport(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// 재시도하면 성공할 수 있는 오류인지 여부
    pub fn is_transient(&self) -> bool {
        matches!(self, AppError::Transport(_) | AppError::Conflict)
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match &self {
            // DB 에러 상세는 로그에만 남긴다
            AppError::Store(e) => {
                error!("{:<12} --> 저장소 오류: {:?}", "Error", e);
                "internal store error".to_string()
            }
            other => other.to_string(),
        };
        (status, Json(ErrorBody { error: message })).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

// endregion: --- App Error

// region:    --- Tests
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_domain_errors_to_status_codes() {
        assert_eq!(
            AppError::Validation("make".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(AppError::NotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::Forbidden.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(
            AppError::Unauthenticated.status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::Store(sqlx::Error::RowNotFound).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn only_transport_and_conflict_are_transient() {
        assert!(AppError::Transport("broker down".into()).is_transient());
        assert!(AppError::Conflict.is_transient());
        assert!(!AppError::Forbidden.is_transient());
        assert!(!AppError::Store(sqlx::Error::PoolTimedOut).is_transient());
    }
}
// endregion: --- Tests
