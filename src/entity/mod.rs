//! SeaORM entity models.
//!
//! `session` backs the [`SeaOrmStore`](crate::SeaOrmStore); `user`, `listing`
//! and `review` hold the site's own documents.

pub mod listing;
pub mod review;
pub mod session;
pub mod user;
