use axum::{routing::get, routing::patch, routing::post, Router};

use crate::http::handlers;
use crate::AppState;

pub fn health() -> Router<AppState> {
    Router::new().route("/health", get(handlers::health))
}

pub fn users() -> Router<AppState> {
    Router::new()
        .route("/users/login", post(handlers::login))
        .route("/users/refresh-token", post(handlers::refresh_token))
        .route("/users/logout", post(handlers::logout))
}

pub fn comments() -> Router<AppState> {
    Router::new()
        .route(
            "/comments/v/:video_id",
            get(handlers::list_video_comments).post(handlers::add_comment),
        )
        .route(
            "/comments/c/:comment_id",
            patch(handlers::update_comment).delete(handlers::delete_comment),
        )
}

pub fn likes() -> Router<AppState> {
    Router::new()
        .route("/likes/toggle/:kind/:id", post(handlers::toggle_like))
        .route("/likes/videos", get(handlers::liked_videos))
        .route("/likes/comments", get(handlers::liked_comments))
}

pub fn dashboard() -> Router<AppState> {
    Router::new()
        .route("/dashboard/stats", get(handlers::channel_stats))
        .route("/dashboard/videos", get(handlers::channel_videos))
}
