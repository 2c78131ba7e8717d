// region:    --- Imports
use crate::error::AppError;
use axum::async_trait;
use axum::extract::{FromRef, FromRequestParts};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

// endregion: --- Imports

// region:    --- Auth Config
/// bearer token 클레임
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    #[serde(default)]
    pub sub: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    pub exp: i64,
}

/// HS256 토큰 검증기
pub struct AuthConfig {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl AuthConfig {
    pub fn new(secret: &str) -> Self {
        Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
        }
    }

    /// 토큰 검증 후 호출자 이름 반환 (username 클레임, 없으면 sub)
    pub fn verify(&self, token: &str) -> Result<String, AppError> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
            debug!("{:<12} --> 토큰 검증 실패: {}", "Auth", e);
            AppError::Unauthenticated
        })?;
        let claims = data.claims;
        let name = claims.username.unwrap_or(claims.sub);
        if name.is_empty() {
            return Err(AppError::Unauthenticated);
        }
        Ok(name)
    }
}

/// 사용자 이름으로 토큰 발급 (로컬 개발 및 테스트용)
pub fn issue_token(secret: &str, username: &str, ttl_secs: i64) -> Result<String, AppError> {
    let claims = Claims {
        sub: username.to_string(),
        username: Some(username.to_string()),
        exp: Utc::now().timestamp() + ttl_secs,
    };
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Validation(e.to_string()))
}

// endregion: --- Auth Config

// region:    --- Caller Extractor
/// 인증된 요청자
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller(pub String);

#[async_trait]
impl<S> FromRequestParts<S> for Caller
where
    Arc<AuthConfig>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let auth = Arc::<AuthConfig>::from_ref(state);
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .ok_or(AppError::Unauthenticated)?;

        auth.verify(token).map(Caller)
    }
}
// endregion: --- Caller Extractor

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret";

    #[test]
    fn verifies_token_issued_with_same_secret() {
        let token = issue_token(SECRET, "bob", 60).unwrap();
        assert_eq!(AuthConfig::new(SECRET).verify(&token).unwrap(), "bob");
    }

    #[test]
    fn rejects_token_signed_with_other_secret() {
        let token = issue_token("other", "bob", 60).unwrap();
        assert!(matches!(
            AuthConfig::new(SECRET).verify(&token),
            Err(AppError::Unauthenticated)
        ));
    }

    #[test]
    fn rejects_expired_token() {
        let token = issue_token(SECRET, "bob", -3600).unwrap();
        assert!(matches!(
            AuthConfig::new(SECRET).verify(&token),
            Err(AppError::Unauthenticated)
        ));
    }

    #[test]
    fn falls_back_to_subject_without_username_claim() {
        let claims = Claims {
            sub: "alice".to_string(),
            username: None,
            exp: Utc::now().timestamp() + 60,
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();

        assert_eq!(AuthConfig::new(SECRET).verify(&token).unwrap(), "alice");
    }

    #[test]
    fn accepts_token_with_only_username_claim() {
        let claims = serde_json::json!({
            "username": "carol",
            "exp": Utc::now().timestamp() + 60,
        });
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();

        assert_eq!(AuthConfig::new(SECRET).verify(&token).unwrap(), "carol");
    }
}
