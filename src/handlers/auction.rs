// region:    --- Imports
use crate::auction::commands::AuctionStore;
use crate::auction::model::{Auction, AuctionFilter, CreateAuction, UpdateAuction};
use crate::error::AppError;
use crate::handlers::auth::{AuthConfig, Caller};
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{FromRef, Path, Query, State};
use axum::http::header::LOCATION;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use futures::TryStreamExt;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

// endregion: --- Imports

// region:    --- State
#[derive(Clone)]
pub struct AuctionState {
    pub store: Arc<AuctionStore>,
    pub auth: Arc<AuthConfig>,
}

impl FromRef<AuctionState> for Arc<AuthConfig> {
    fn from_ref(state: &AuctionState) -> Self {
        Arc::clone(&state.auth)
    }
}

pub fn routes(state: AuctionState) -> Router {
    Router::new()
        .route(
            "/api/auctions",
            get(handle_list_auctions).post(handle_create_auction),
        )
        .route(
            "/api/auctions/:id",
            get(handle_get_auction)
                .put(handle_update_auction)
                .delete(handle_delete_auction),
        )
        .with_state(state)
}
// endregion: --- State

// region:    --- Query Handlers

/// 경매 목록 조회
pub async fn handle_list_auctions(
    State(state): State<AuctionState>,
    filter: Result<Query<AuctionFilter>, QueryRejection>,
) -> Result<Json<Vec<Auction>>, AppError> {
    let Query(filter) = filter.map_err(|e| AppError::Validation(e.body_text()))?;
    info!("{:<12} --> 경매 목록 조회: {:?}", "HandlerQuery", filter);
    let auctions: Vec<Auction> = state.store.list(filter).try_collect().await?;
    Ok(Json(auctions))
}

/// 경매 조회
pub async fn handle_get_auction(
    State(state): State<AuctionState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<Auction>, AppError> {
    let id = parse_id(id)?;
    info!("{:<12} --> 경매 조회 id: {}", "HandlerQuery", id);
    Ok(Json(state.store.get(id).await?))
}

// endregion: --- Query Handlers

// region:    --- Command Handlers

/// 경매 생성
pub async fn handle_create_auction(
    State(state): State<AuctionState>,
    Caller(caller): Caller,
    body: Result<Json<CreateAuction>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(request) = body.map_err(|e| AppError::Validation(e.body_text()))?;
    let auction = state.store.create(request, &caller).await?;
    let location = format!("/api/auctions/{}", auction.id);
    Ok((StatusCode::CREATED, [(LOCATION, location)], Json(auction)))
}

/// 경매 수정
pub async fn handle_update_auction(
    State(state): State<AuctionState>,
    Caller(caller): Caller,
    id: Result<Path<Uuid>, PathRejection>,
    body: Result<Json<UpdateAuction>, JsonRejection>,
) -> Result<Json<Auction>, AppError> {
    let id = parse_id(id)?;
    // 본문 오류는 존재 여부와 소유자 확인 뒤에 반환된다
    let patch = body
        .map(|Json(patch)| patch)
        .map_err(|e| AppError::Validation(e.body_text()));
    let auction = state.store.update(id, &caller, patch).await?;
    Ok(Json(auction))
}

/// 경매 삭제
pub async fn handle_delete_auction(
    State(state): State<AuctionState>,
    Caller(caller): Caller,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<StatusCode, AppError> {
    let id = parse_id(id)?;
    state.store.delete(id, &caller).await?;
    Ok(StatusCode::OK)
}

// endregion: --- Command Handlers

/// 잘못된 형식의 id 는 400
fn parse_id(id: Result<Path<Uuid>, PathRejection>) -> Result<Uuid, AppError> {
    id.map(|Path(id)| id)
        .map_err(|e| AppError::Validation(format!("invalid auction id: {}", e.body_text())))
}

// endregion: --- Tests
