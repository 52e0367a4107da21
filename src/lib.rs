//! # Wanderlust
//!
//! A server-rendered site for browsing, creating, editing and reviewing
//! property listings.
//!
//! The interesting part is the request lifecycle wrapped around the CRUD
//! routes:
//!
//! 1. the `tower-sessions` layer loads the browser's session from
//!    [`SeaOrmStore`] (or starts a new one), and [`session::fix_expiry`] pins it
//!    to an absolute seven day lifetime;
//! 2. [`auth::identity_middleware`] resolves the session's user through the
//!    [`CredentialStore`];
//! 3. route guards from [`guard`] decide whether the request may reach its
//!    handler, redirecting with a [`flash`] message when it may not;
//! 4. handlers render pages through [`views`], draining the flash queue.
//!
//! ## Quick Start
//!
//! ```no_run
//! use sea_orm::Database;
//! use sea_orm_migration::MigratorTrait;
//! use wanderlust::{migration::Migrator, AppState, Settings};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let settings = Settings::from_env()?;
//! let db = Database::connect(&settings.database_url).await?;
//! Migrator::up(&db, None).await?;
//!
//! let addr = settings.addr;
//! let app = wanderlust::app(AppState::new(db, settings));
//! let listener = tokio::net::TcpListener::bind(addr).await?;
//! axum::serve(listener, axum::ServiceExt::<axum::extract::Request>::into_make_service(app)).await?;
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod config;
pub mod credentials;
pub mod entity;
pub mod error;
pub mod flash;
pub mod guard;
pub mod migration;
pub mod resources;
pub mod routes;
pub mod session;
mod state;
mod store;
pub mod validation;
pub mod views;

pub use config::Settings;
pub use credentials::{CredentialStore, DbCredentialStore, NewIdentity, User};
pub use error::{AppError, Result};
pub use routes::{app, App};
pub use state::AppState;

/// Session persistence over SeaORM, plugged into the `tower-sessions` layer.
pub use store::SeaOrmStore;

// Re-exported so callers can drive the store without naming tower-sessions.
pub use tower_sessions::{session::Id, session::Record, ExpiredDeletion, Session, SessionStore};
