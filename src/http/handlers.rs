use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::{header, HeaderMap, HeaderName},
    response::AppendHeaders,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::app::comments::CommentService;
use crate::app::dashboard::DashboardService;
use crate::app::likes::{LikeService, ToggleOutcome};
use crate::app::ownership::{ensure_owner, owns};
use crate::domain::channel::ChannelStats;
use crate::domain::engagement::{Comment, CommentView, Like, LikeTarget, LikeTargetKind};
use crate::domain::page::{Page, Pagination};
use crate::domain::user::User;
use crate::domain::video::Video;
use crate::http::auth::{
    cookie_value, expired_cookie, session_cookie, ACCESS_TOKEN_COOKIE, REFRESH_TOKEN_COOKIE,
};
use crate::http::response::{ApiResponse, Empty};
use crate::http::{AppError, AuthUser};
use crate::AppState;

const MAX_COMMENT_LEN: usize = 1000;

type CookieHeaders = AppendHeaders<[(HeaderName, String); 2]>;

fn parse_id(raw: &str, message: &'static str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw.trim()).map_err(|_| AppError::bad_request(message))
}

/// Trimmed, non-empty comment content.
fn required_content(payload: Option<Json<ContentRequest>>) -> Result<String, AppError> {
    let content = payload
        .and_then(|Json(payload)| payload.content)
        .map(|content| content.trim().to_string())
        .filter(|content| !content.is_empty())
        .ok_or_else(|| AppError::bad_request("Content is required"))?;

    if content.chars().count() > MAX_COMMENT_LEN {
        return Err(AppError::bad_request(
            "Content must be at most 1000 characters",
        ));
    }
    Ok(content)
}

#[derive(Serialize)]
pub(crate) struct HealthResponse {
    status: &'static str,
}

pub(crate) async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let status = if state.db.ping().await.is_ok() {
        "ok"
    } else {
        "degraded"
    };

    Json(HealthResponse { status })
}

// ---------------------------------------------------------------------------
// Sessions
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub username: Option<String>,
    pub password: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginData {
    pub user: User,
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenData {
    pub access_token: String,
    pub refresh_token: String,
}

fn token_cookies(state: &AppState, access_token: &str, refresh_token: &str) -> CookieHeaders {
    let access_max_age = state.access_ttl_minutes as i64 * 60;
    let refresh_max_age = state.refresh_ttl_days as i64 * 24 * 60 * 60;
    AppendHeaders([
        (
            header::SET_COOKIE,
            session_cookie(ACCESS_TOKEN_COOKIE, access_token, access_max_age, state.cookie_secure),
        ),
        (
            header::SET_COOKIE,
            session_cookie(REFRESH_TOKEN_COOKIE, refresh_token, refresh_max_age, state.cookie_secure),
        ),
    ])
}

pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<(CookieHeaders, ApiResponse<LoginData>), AppError> {
    const MAX_PASSWORD_LEN: usize = 128;

    let Json(payload) = payload?;

    let identifier = payload
        .email
        .as_deref()
        .or(payload.username.as_deref())
        .map(str::trim)
        .filter(|identifier| !identifier.is_empty())
        .ok_or_else(|| AppError::bad_request("username or email is required"))?
        .to_string();
    if payload.password.trim().is_empty() {
        return Err(AppError::bad_request("password is required"));
    }
    if payload.password.len() > MAX_PASSWORD_LEN {
        return Err(AppError::bad_request("password must be at most 128 characters"));
    }

    let session = state
        .auth_service()
        .login(&identifier, &payload.password)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, "failed to login");
            AppError::internal("failed to login")
        })?;

    let (user, tokens) = session.ok_or_else(|| AppError::unauthorized("Invalid user credentials"))?;
    tracing::info!(user_id = %user.id, "user logged in");

    let cookies = token_cookies(&state, &tokens.access_token, &tokens.refresh_token);
    Ok((
        cookies,
        ApiResponse::ok(
            LoginData {
                user,
                access_token: tokens.access_token,
                refresh_token: tokens.refresh_token,
            },
            "User logged in successfully",
        ),
    ))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: Option<String>,
}

pub async fn refresh_token(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Option<Json<RefreshRequest>>,
) -> Result<(CookieHeaders, ApiResponse<TokenData>), AppError> {
    let incoming = cookie_value(&headers, REFRESH_TOKEN_COOKIE)
        .or_else(|| payload.and_then(|Json(payload)| payload.refresh_token))
        .filter(|token| !token.trim().is_empty())
        .ok_or_else(|| AppError::unauthorized("Unauthorized request"))?;

    let tokens = state
        .auth_service()
        .refresh(&incoming)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, "failed to refresh token");
            AppError::internal("failed to refresh token")
        })?
        .ok_or_else(|| AppError::unauthorized("Invalid refresh token"))?;

    let cookies = token_cookies(&state, &tokens.access_token, &tokens.refresh_token);
    Ok((
        cookies,
        ApiResponse::ok(
            TokenData {
                access_token: tokens.access_token,
                refresh_token: tokens.refresh_token,
            },
            "Access token refreshed",
        ),
    ))
}

pub async fn logout(
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<(CookieHeaders, ApiResponse<Empty>), AppError> {
    let revoked = state
        .auth_service()
        .logout(auth.user_id())
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, user_id = %auth.user_id(), "failed to logout");
            AppError::internal("failed to logout")
        })?;
    tracing::info!(user_id = %auth.user_id(), revoked, "user logged out");

    let cookies = AppendHeaders([
        (header::SET_COOKIE, expired_cookie(ACCESS_TOKEN_COOKIE, state.cookie_secure)),
        (header::SET_COOKIE, expired_cookie(REFRESH_TOKEN_COOKIE, state.cookie_secure)),
    ]);
    Ok((cookies, ApiResponse::ok(Empty {}, "User logged out")))
}

// ---------------------------------------------------------------------------
// Comments
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
pub struct CommentPageQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Deserialize)]
pub struct ContentRequest {
    pub content: Option<String>,
}

pub async fn list_video_comments(
    video_id: Result<Path<String>, PathRejection>,
    auth: Option<AuthUser>,
    State(state): State<AppState>,
    query: Result<Query<CommentPageQuery>, QueryRejection>,
) -> Result<ApiResponse<Page<CommentView>>, AppError> {
    let Path(video_id) = video_id?;
    let video_id = parse_id(&video_id, "Invalid video Id")?;
    let Query(query) = query
        .map_err(|_| AppError::bad_request("page and limit must be positive integers"))?;
    let pagination = Pagination::new(query.page, query.limit)
        .ok_or_else(|| AppError::bad_request("page and limit must be positive integers"))?;
    let viewer_id = auth.map(|auth| auth.user_id());

    let service = CommentService::new(state.db.clone());
    let page = service
        .list_for_video(video_id, viewer_id, pagination)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, video_id = %video_id, "failed to list comments");
            AppError::internal("failed to list comments")
        })?
        .ok_or_else(|| AppError::not_found("Video not found"))?;

    // An out-of-range page is reported the same way as a video with no comments.
    if page.is_empty() {
        return Err(AppError::not_found("No comments on the video"));
    }

    Ok(ApiResponse::ok(page, "Comments fetched successfully"))
}

pub async fn add_comment(
    video_id: Result<Path<String>, PathRejection>,
    auth: AuthUser,
    State(state): State<AppState>,
    payload: Option<Json<ContentRequest>>,
) -> Result<ApiResponse<Comment>, AppError> {
    let Path(video_id) = video_id?;
    let video_id = parse_id(&video_id, "Invalid videoId")?;
    let content = required_content(payload)?;

    let service = CommentService::new(state.db.clone());
    let comment = service
        .create(auth.user_id(), video_id, content)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, user_id = %auth.user_id(), video_id = %video_id, "failed to comment");
            AppError::internal("Error in creating the comment")
        })?
        .ok_or_else(|| AppError::not_found("Video not found"))?;

    Ok(ApiResponse::ok(comment, "Commented successfully"))
}

pub async fn update_comment(
    comment_id: Result<Path<String>, PathRejection>,
    auth: AuthUser,
    State(state): State<AppState>,
    payload: Option<Json<ContentRequest>>,
) -> Result<ApiResponse<Comment>, AppError> {
    let Path(comment_id) = comment_id?;
    let comment_id = parse_id(&comment_id, "Cannot find comment id")?;

    let service = CommentService::new(state.db.clone());
    let comment = service.find(comment_id).await.map_err(|err| {
        tracing::error!(error = ?err, comment_id = %comment_id, "failed to fetch comment");
        AppError::internal("failed to fetch comment")
    })?;

    // A missing comment fails the owner check as well.
    let comment = ensure_owner(comment, auth.user_id())
        .ok_or_else(|| AppError::bad_request("Only the owner can update the comment"))?;
    let content = required_content(payload)?;

    let updated = service
        .update_content(comment.id, content)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, comment_id = %comment_id, "failed to update comment");
            AppError::internal("failed to update comment")
        })?
        .ok_or_else(|| AppError::not_found("Comment not found"))?;

    Ok(ApiResponse::ok(updated, "comment updated successfully"))
}

pub async fn delete_comment(
    comment_id: Result<Path<String>, PathRejection>,
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<ApiResponse<Empty>, AppError> {
    let Path(comment_id) = comment_id?;
    let comment_id = parse_id(&comment_id, "comment Id cant be fetched for params")?;

    let service = CommentService::new(state.db.clone());
    let comment = service.find(comment_id).await.map_err(|err| {
        tracing::error!(error = ?err, comment_id = %comment_id, "failed to fetch comment");
        AppError::internal("failed to fetch comment")
    })?;

    let Some(comment) = comment else {
        return Ok(ApiResponse::new(
            axum::http::StatusCode::NOT_FOUND,
            Empty {},
            "Comment not found",
        ));
    };

    if !owns(&comment, auth.user_id()) {
        return Err(AppError::unauthorized("Only user can delete the comment"));
    }

    service.delete(comment.id).await.map_err(|err| {
        tracing::error!(error = ?err, comment_id = %comment_id, user_id = %auth.user_id(), "failed to delete comment");
        AppError::internal("failed to delete comment")
    })?;

    Ok(ApiResponse::ok(Empty {}, "Comment deleted successfully"))
}

// ---------------------------------------------------------------------------
// Likes
// ---------------------------------------------------------------------------

#[derive(Serialize)]
#[serde(untagged)]
pub enum ToggleData {
    Added(Like),
    Removed(Empty),
}

pub async fn toggle_like(
    params: Result<Path<(String, String)>, PathRejection>,
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<ApiResponse<ToggleData>, AppError> {
    let Path((kind, target_id)) = params?;
    let kind = LikeTargetKind::from_route(&kind)
        .ok_or_else(|| AppError::not_found("Unknown like target"))?;
    let target_id = Uuid::parse_str(target_id.trim())
        .map_err(|_| AppError::bad_request(format!("Invalid {} Id", kind.as_db())))?;
    let target = LikeTarget::new(kind, target_id);

    let service = LikeService::new(state.db.clone());
    let exists = service.target_exists(target).await.map_err(|err| {
        tracing::error!(error = ?err, target_id = %target_id, kind = kind.as_db(), "failed to fetch like target");
        AppError::internal("failed to toggle like")
    })?;
    if !exists {
        return Err(AppError::not_found(format!("{} not found", kind.label())));
    }

    let outcome = service
        .toggle(auth.user_id(), target)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, user_id = %auth.user_id(), target_id = %target_id, "failed to toggle like");
            AppError::internal("failed to toggle like")
        })?;

    match outcome {
        ToggleOutcome::Added(like) => {
            tracing::debug!(user_id = %auth.user_id(), target_id = %target_id, "like added");
            Ok(ApiResponse::ok(ToggleData::Added(like), "Like added successfully"))
        }
        ToggleOutcome::Removed => {
            tracing::debug!(user_id = %auth.user_id(), target_id = %target_id, "like removed");
            Ok(ApiResponse::ok(
                ToggleData::Removed(Empty {}),
                "Like removed successfully",
            ))
        }
    }
}

pub async fn liked_videos(
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<ApiResponse<Vec<Option<Video>>>, AppError> {
    let service = LikeService::new(state.db.clone());
    let videos = service.liked_videos(auth.user_id()).await.map_err(|err| {
        tracing::error!(error = ?err, user_id = %auth.user_id(), "failed to list liked videos");
        AppError::internal("failed to list liked videos")
    })?;

    Ok(ApiResponse::ok(videos, "Liked videos fetched successfully"))
}

pub async fn liked_comments(
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<ApiResponse<Vec<Option<Comment>>>, AppError> {
    let service = LikeService::new(state.db.clone());
    let comments = service.liked_comments(auth.user_id()).await.map_err(|err| {
        tracing::error!(error = ?err, user_id = %auth.user_id(), "failed to list liked comments");
        AppError::internal("failed to list liked comments")
    })?;

    Ok(ApiResponse::ok(comments, "Liked comments fetched successfully"))
}

// ---------------------------------------------------------------------------
// Dashboard
// ---------------------------------------------------------------------------

pub async fn channel_stats(
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<ApiResponse<ChannelStats>, AppError> {
    let service = DashboardService::new(state.db.clone());
    let stats = service.channel_stats(auth.user_id()).await.map_err(|err| {
        tracing::error!(error = ?err, user_id = %auth.user_id(), "failed to compute channel stats");
        AppError::internal("failed to compute channel stats")
    })?;

    Ok(ApiResponse::ok(stats, "Channel stats fetched successfully"))
}

pub async fn channel_videos(
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<ApiResponse<Vec<Video>>, AppError> {
    let service = DashboardService::new(state.db.clone());
    let videos = service.channel_videos(auth.user_id()).await.map_err(|err| {
        tracing::error!(error = ?err, user_id = %auth.user_id(), "failed to list channel videos");
        AppError::internal("Error while fetching the videos")
    })?;

    // A channel without videos is reported as a server error.
    if videos.is_empty() {
        return Err(AppError::internal("Error while fetching the videos"));
    }

    Ok(ApiResponse::ok(videos, "Videos fetched successfully"))
}
