// region:    --- Imports
use crate::error::AppError;
use crate::search::model::{SearchItem, SearchPage};
use crate::search::query::{SearchParams, SearchQuery};
use crate::search::repository::SearchRepository;
use axum::extract::rejection::{PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

// endregion: --- Imports

#[derive(Clone)]
pub struct SearchState {
    pub repository: Arc<dyn SearchRepository>,
}

pub fn routes(state: SearchState) -> Router {
    Router::new()
        .route("/api/search", get(handle_search))
        .route("/api/search/:id", get(handle_get_search_item))
        .with_state(state)
}

/// 검색
pub async fn handle_search(
    State(state): State<SearchState>,
    params: Result<Query<SearchParams>, QueryRejection>,
) -> Result<Json<SearchPage>, AppError> {
    let Query(params) = params.map_err(|e| AppError::Validation(e.body_text()))?;
    let query = SearchQuery::from(params);
    info!("{:<12} --> 검색: {:?}", "HandlerSearch", query);
    let page = state.repository.search(&query, Utc::now()).await?;
    Ok(Json(page))
}

/// 검색 항목 단건 조회
pub async fn handle_get_search_item(
    State(state): State<SearchState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<SearchItem>, AppError> {
    let Path(id) = id.map_err(|e| AppError::Validation(e.body_text()))?;
    state
        .repository
        .get(id)
        .await?
        .map(Json)
        .ok_or(AppError::NotFound)
}

// region:    --- Tests
#[cfg(test)]
mod tests {
    use super::*;
    use crate::auction::events::AuctionEvent;
    use crate::auction::model::CreateAuction;
    use crate::search::projector::SearchProjector;
    use crate::testing::InMemorySearchRepository;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use chrono::Duration;
    use serde_json::Value;
    use tower::ServiceExt;

    async fn seeded() -> (Router, Vec<Uuid>) {
        let repository = Arc::new(InMemorySearchRepository::default());
        let projector = SearchProjector::new(repository.clone());
        let now = Utc::now();
        let mut ids = Vec::new();
        for (make, seller, end_in_hours) in [
            ("Ford", "bob", 48),
            ("Audi", "alice", 2),
            ("Bugatti", "bob", -1),
        ] {
            let auction = CreateAuction {
                make: make.to_string(),
                model: "Model".to_string(),
                color: "Red".to_string(),
                auction_end: Some(now + Duration::hours(end_in_hours)),
                ..Default::default()
            }
            .into_auction(seller, now);
            ids.push(auction.id);
            projector.apply(&AuctionEvent::created(&auction)).await.unwrap();
        }
        (routes(SearchState { repository }), ids)
    }

    async fn get_json(app: &Router, uri: &str) -> (StatusCode, Value) {
        let response = app
            .clone()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    #[tokio::test]
    async fn default_search_returns_live_auctions_ending_first() {
        let (app, _) = seeded().await;
        let (status, page) = get_json(&app, "/api/search").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(page["totalCount"], 2);
        assert_eq!(page["pageCount"], 1);
        assert_eq!(page["results"][0]["make"], "Audi");
        assert_eq!(page["results"][1]["make"], "Ford");
    }

    #[tokio::test]
    async fn filters_and_pagination_are_applied() {
        let (app, _) = seeded().await;

        let (_, finished) = get_json(&app, "/api/search?filterBy=finished").await;
        assert_eq!(finished["totalCount"], 1);
        assert_eq!(finished["results"][0]["make"], "Bugatti");

        let (_, ending) = get_json(&app, "/api/search?filterBy=endingSoon").await;
        assert_eq!(ending["totalCount"], 1);
        assert_eq!(ending["results"][0]["make"], "Audi");

        let (_, paged) = get_json(&app, "/api/search?orderBy=make&pageSize=1&pageNumber=2").await;
        assert_eq!(paged["pageCount"], 2);
        assert_eq!(paged["results"].as_array().unwrap().len(), 1);
        assert_eq!(paged["results"][0]["make"], "Ford");

        let (_, by_seller) = get_json(&app, "/api/search?seller=alice&searchTerm=aud").await;
        assert_eq!(by_seller["totalCount"], 1);
    }

    #[tokio::test]
    async fn get_item_by_id() {
        let (app, ids) = seeded().await;

        let (status, item) = get_json(&app, &format!("/api/search/{}", ids[0])).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(item["make"], "Ford");

        let (status, _) = get_json(&app, &format!("/api/search/{}", Uuid::new_v4())).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = get_json(&app, "/api/search/notaguid").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
// endregion: --- Tests
