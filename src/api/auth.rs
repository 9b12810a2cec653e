use axum::{
    Json,
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_sessions::Session;

use super::{ApiError, ApiResponse, AppState, UserDto};
use crate::db::User;

/// Session key holding the raw remember token for browser clients.
pub const SESSION_TOKEN_KEY: &str = "remember_token";

// ============================================================================
// Request identity
// ============================================================================

/// The identity resolved for this request, memoized in request extensions by
/// [`resolve_identity`]: the token is digested and looked up exactly once per
/// request, and every handler sees the same identity even if the session
/// changes mid-flight.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .ok_or_else(|| ApiError::Unauthorized("Please sign in".to_string()))
    }
}

/// Like [`CurrentUser`], but absent identity is not an error. Used by the
/// handlers that behave differently for signed-in callers (registration).
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<User>);

impl<S> FromRequestParts<S> for MaybeUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(
            parts.extensions.get::<CurrentUser>().map(|c| c.0.clone()),
        ))
    }
}

// ============================================================================
// Middleware
// ============================================================================

/// Resolves the caller's identity from, in order:
/// 1. the session cookie (browser clients), or
/// 2. an `Authorization: Bearer <token>` header (API clients),
///
/// and stores the result in request extensions. An invalid or missing token
/// just leaves the request anonymous; enforcement happens at the extractor.
pub async fn resolve_identity(
    State(state): State<Arc<AppState>>,
    session: Session,
    mut request: Request,
    next: Next,
) -> Response {
    if let Some(token) = presented_token(&session, request.headers()).await {
        match state.auth_service().resolve_token(&token).await {
            Ok(Some(user)) => {
                tracing::Span::current().record("user_id", user.id);
                request.extensions_mut().insert(CurrentUser(user));
            }
            Ok(None) => {}
            Err(e) => {
                tracing::error!("Identity resolution failed: {e}");
            }
        }
    }

    next.run(request).await
}

/// Extract the raw remember token from the session or the request headers.
async fn presented_token(session: &Session, headers: &HeaderMap) -> Option<String> {
    if let Ok(Some(token)) = session.get::<String>(SESSION_TOKEN_KEY).await {
        return Some(token);
    }

    if let Some(auth_header) = headers.get("Authorization")
        && let Ok(auth_str) = auth_header.to_str()
        && let Some(token) = auth_str.strip_prefix("Bearer ")
    {
        return Some(token.trim().to_string());
    }

    None
}

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub user: UserDto,
    /// The raw remember token. Browser clients get it in the session cookie
    /// as well; API clients present it as a bearer token.
    pub token: String,
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /auth/login
/// Authenticate with email and password; issues a fresh remember token.
pub async fn login(
    State(state): State<Arc<AppState>>,
    session: Session,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<ApiResponse<LoginResponse>>, ApiError> {
    if payload.email.trim().is_empty() {
        return Err(ApiError::validation("Email is required"));
    }
    if payload.password.is_empty() {
        return Err(ApiError::validation("Password is required"));
    }

    let result = state
        .auth_service()
        .sign_in(&payload.email, &payload.password)
        .await?;

    session
        .insert(SESSION_TOKEN_KEY, &result.token)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to create session: {e}")))?;

    Ok(Json(ApiResponse::success(LoginResponse {
        user: UserDto::from(result.user),
        token: result.token,
    })))
}

/// POST /auth/logout
/// Invalidates the current token server-side and drops the session.
pub async fn logout(
    State(state): State<Arc<AppState>>,
    session: Session,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    if let Some(token) = presented_token(&session, &headers).await {
        state.auth_service().sign_out(&token).await?;
    }

    let _ = session.flush().await;

    Ok(Json(ApiResponse::success(super::MessageResponse {
        message: "Signed out".to_string(),
    })))
}

/// GET /auth/me
/// The identity behind the presented token.
pub async fn me(CurrentUser(user): CurrentUser) -> Json<ApiResponse<UserDto>> {
    Json(ApiResponse::success(UserDto::from(user)))
}
