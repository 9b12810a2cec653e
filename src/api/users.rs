use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_sessions::Session;

use super::auth::{CurrentUser, MaybeUser, SESSION_TOKEN_KEY};
use super::{
    ApiError, ApiResponse, AppState, MessageResponse, MicropostDto, UserDto, UserPageDto,
    UserProfileDto,
};
use crate::services::{NewUser, ProfileUpdate};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub password_confirmation: String,
}

#[derive(Serialize)]
pub struct RegisterResponse {
    pub user: UserDto,
    /// Registration signs the new user in; this is their remember token.
    pub token: String,
}

#[derive(Deserialize)]
pub struct UpdateUserRequest {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub password_confirmation: Option<String>,
}

#[derive(Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub page: Option<u64>,
    #[serde(default)]
    pub page_size: Option<u64>,
}

#[derive(Deserialize)]
pub struct PageQuery {
    #[serde(default)]
    pub page: Option<u64>,
    #[serde(default)]
    pub page_size: Option<u64>,
}

#[derive(Serialize)]
pub struct FollowStateDto {
    pub following: bool,
    pub followers_count: u64,
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /users
/// Register a new account and sign it in. Rejected for signed-in callers.
pub async fn register(
    State(state): State<Arc<AppState>>,
    MaybeUser(current): MaybeUser,
    session: Session,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if current.is_some() {
        return Err(ApiError::Forbidden("You are already registered".to_string()));
    }

    let password = payload.password.clone();
    let user = state
        .user_service()
        .register(NewUser {
            name: payload.name,
            email: payload.email,
            password: payload.password,
            password_confirmation: payload.password_confirmation,
        })
        .await?;

    let signed_in = state.auth_service().sign_in(&user.email, &password).await?;

    session
        .insert(SESSION_TOKEN_KEY, &signed_in.token)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to create session: {e}")))?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(RegisterResponse {
            user: UserDto::from(signed_in.user),
            token: signed_in.token,
        })),
    ))
}

/// GET /users
/// Paginated user index, optionally filtered by a name substring.
pub async fn index(
    State(state): State<Arc<AppState>>,
    _current: CurrentUser,
    Query(query): Query<ListQuery>,
) -> Result<Json<ApiResponse<UserPageDto>>, ApiError> {
    let (page, page_size) = state.page_params(query.page, query.page_size).await;

    let result = state
        .user_service()
        .list(page, page_size, query.search.as_deref())
        .await?;

    Ok(Json(ApiResponse::success(UserPageDto {
        users: result.users.into_iter().map(UserDto::from).collect(),
        page,
        total_pages: result.total_pages,
    })))
}

/// GET /users/{id}
/// Profile with graph counts and one page of the user's posts, newest first.
pub async fn show(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
    Query(query): Query<PageQuery>,
) -> Result<Json<ApiResponse<UserProfileDto>>, ApiError> {
    let (page, page_size) = state.page_params(query.page, query.page_size).await;

    let user = state.user_service().get(id).await?;
    let posts = state
        .feed_service()
        .posts_for_user(id, page, page_size)
        .await?;

    let micropost_count = state.store().micropost_count(id).await?;
    let following_count = state.store().following_count(id).await?;
    let followers_count = state.store().follower_count(id).await?;

    Ok(Json(ApiResponse::success(UserProfileDto {
        user: UserDto::from(user),
        micropost_count,
        following_count,
        followers_count,
        microposts: posts.posts.into_iter().map(MicropostDto::from).collect(),
        total_pages: posts.total_pages,
    })))
}

/// PUT /users/{id}
/// Update a profile. Users can only edit themselves.
pub async fn update(
    State(state): State<Arc<AppState>>,
    CurrentUser(current): CurrentUser,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    let user = state
        .user_service()
        .update_profile(
            &current,
            id,
            ProfileUpdate {
                name: payload.name,
                email: payload.email,
                password: payload.password,
                password_confirmation: payload.password_confirmation,
            },
        )
        .await?;

    Ok(Json(ApiResponse::success(UserDto::from(user))))
}

/// DELETE /users/{id}
/// Admin-only cascading delete.
pub async fn destroy(
    State(state): State<Arc<AppState>>,
    CurrentUser(current): CurrentUser,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    state.user_service().delete(&current, id).await?;

    Ok(Json(ApiResponse::success(MessageResponse {
        message: "User destroyed".to_string(),
    })))
}

/// GET /users/{id}/following
pub async fn following(
    State(state): State<Arc<AppState>>,
    _current: CurrentUser,
    Path(id): Path<i32>,
    Query(query): Query<PageQuery>,
) -> Result<Json<ApiResponse<UserPageDto>>, ApiError> {
    let (page, page_size) = state.page_params(query.page, query.page_size).await;

    let result = state.user_service().following(id, page, page_size).await?;

    Ok(Json(ApiResponse::success(UserPageDto {
        users: result.users.into_iter().map(UserDto::from).collect(),
        page,
        total_pages: result.total_pages,
    })))
}

/// GET /users/{id}/followers
pub async fn followers(
    State(state): State<Arc<AppState>>,
    _current: CurrentUser,
    Path(id): Path<i32>,
    Query(query): Query<PageQuery>,
) -> Result<Json<ApiResponse<UserPageDto>>, ApiError> {
    let (page, page_size) = state.page_params(query.page, query.page_size).await;

    let result = state.user_service().followers(id, page, page_size).await?;

    Ok(Json(ApiResponse::success(UserPageDto {
        users: result.users.into_iter().map(UserDto::from).collect(),
        page,
        total_pages: result.total_pages,
    })))
}

/// POST /users/{id}/follow
pub async fn follow(
    State(state): State<Arc<AppState>>,
    CurrentUser(current): CurrentUser,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<FollowStateDto>>, ApiError> {
    state.user_service().follow(&current, id).await?;

    let followers_count = state.store().follower_count(id).await?;

    Ok(Json(ApiResponse::success(FollowStateDto {
        following: true,
        followers_count,
    })))
}

/// DELETE /users/{id}/follow
pub async fn unfollow(
    State(state): State<Arc<AppState>>,
    CurrentUser(current): CurrentUser,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<FollowStateDto>>, ApiError> {
    state.user_service().unfollow(&current, id).await?;

    let followers_count = state.store().follower_count(id).await?;

    Ok(Json(ApiResponse::success(FollowStateDto {
        following: false,
        followers_count,
    })))
}
