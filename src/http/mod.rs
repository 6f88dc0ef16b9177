use axum::Router;

use crate::AppState;

mod auth;
mod error;
mod handlers;
mod response;
mod routes;

pub use auth::AuthUser;
pub use error::AppError;
pub use response::{ApiResponse, Empty};

pub const API_PREFIX: &str = "/api/v1";

pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .merge(routes::health())
        .merge(routes::users())
        .merge(routes::comments())
        .merge(routes::likes())
        .merge(routes::dashboard());

    Router::new().nest(API_PREFIX, api).with_state(state)
}
