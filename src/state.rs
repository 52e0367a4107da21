use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::{
    config::Settings,
    credentials::{CredentialStore, DbCredentialStore},
    resources::{ListingStore, ReviewStore},
};

/// Shared handles for every handler and middleware.
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub credentials: Arc<dyn CredentialStore>,
    pub listings: ListingStore,
    pub reviews: ReviewStore,
    pub settings: Arc<Settings>,
}

impl AppState {
    pub fn new(db: DatabaseConnection, settings: Settings) -> Self {
        Self {
            credentials: Arc::new(DbCredentialStore::new(db.clone())),
            listings: ListingStore::new(db.clone()),
            reviews: ReviewStore::new(db.clone()),
            settings: Arc::new(settings),
            db,
        }
    }
}
