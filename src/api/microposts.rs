use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use std::sync::Arc;

use super::auth::CurrentUser;
use super::{ApiError, ApiResponse, AppState, FeedPageDto, MessageResponse, MicropostDto};

#[derive(Deserialize)]
pub struct CreateMicropostRequest {
    pub content: String,
}

#[derive(Deserialize)]
pub struct FeedQuery {
    /// Optional content substring filter.
    #[serde(default)]
    pub filter: Option<String>,
    #[serde(default)]
    pub page: Option<u64>,
    #[serde(default)]
    pub page_size: Option<u64>,
}

/// POST /microposts
pub async fn create(
    State(state): State<Arc<AppState>>,
    CurrentUser(current): CurrentUser,
    Json(payload): Json<CreateMicropostRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let post = state
        .feed_service()
        .create_post(&current, &payload.content)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(MicropostDto::from(post))),
    ))
}

/// DELETE /microposts/{id}
/// Owner-only.
pub async fn destroy(
    State(state): State<Arc<AppState>>,
    CurrentUser(current): CurrentUser,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    state.feed_service().delete_post(&current, id).await?;

    Ok(Json(ApiResponse::success(MessageResponse {
        message: "Micropost deleted".to_string(),
    })))
}

/// GET /feed
/// The caller's aggregated feed: own posts plus followed users' posts,
/// newest first, optionally filtered.
pub async fn feed(
    State(state): State<Arc<AppState>>,
    CurrentUser(current): CurrentUser,
    Query(query): Query<FeedQuery>,
) -> Result<Json<ApiResponse<FeedPageDto>>, ApiError> {
    let (page, page_size) = state.page_params(query.page, query.page_size).await;

    let result = state
        .feed_service()
        .feed(current.id, query.filter.as_deref(), page, page_size)
        .await?;

    Ok(Json(ApiResponse::success(FeedPageDto {
        posts: result.posts.into_iter().map(MicropostDto::from).collect(),
        page,
        total_pages: result.total_pages,
    })))
}
