pub mod channel;
pub mod engagement;
pub mod page;
pub mod user;
pub mod video;
