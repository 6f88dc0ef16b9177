pub mod auth;
pub mod comments;
pub mod dashboard;
pub mod likes;
pub mod ownership;
