//! Account registration and password verification.
//!
//! Passwords are hashed with Argon2 (default parameters, 16 byte random salt)
//! and stored as PHC strings. The hash never leaves this module: callers only
//! ever see a [`User`].

use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter, Set,
    SqlErr,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{
    entity::user,
    error::{AppError, Result},
};

/// Public view of an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i32,
    pub username: String,
    pub email: String,
}

impl From<user::Model> for User {
    fn from(model: user::Model) -> Self {
        Self {
            id: model.id,
            username: model.username,
            email: model.email,
        }
    }
}

/// Identity fields supplied at signup.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewIdentity {
    pub username: String,
    pub email: String,
}

#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Creates an account, failing with `DuplicateIdentity` when the username
    /// or email is already taken.
    async fn register(&self, identity: NewIdentity, password: &str) -> Result<User>;

    /// Checks a username/password pair, failing with `InvalidCredentials`.
    async fn authenticate(&self, username: &str, password: &str) -> Result<User>;

    async fn find(&self, id: i32) -> Result<Option<User>>;
}

/// [`CredentialStore`] backed by the `users` table.
#[derive(Debug, Clone)]
pub struct DbCredentialStore {
    conn: DatabaseConnection,
}

impl DbCredentialStore {
    pub fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Which identity field, if any, already belongs to another account.
    async fn taken_field(&self, username: &str, email: &str) -> Result<Option<&'static str>> {
        let existing = user::Entity::find()
            .filter(
                Condition::any()
                    .add(user::Column::Username.eq(username))
                    .add(user::Column::Email.eq(email)),
            )
            .one(&self.conn)
            .await?;
        Ok(existing.map(|m| if m.username == username { "username" } else { "email" }))
    }

    async fn find_model(&self, username: &str) -> Result<Option<user::Model>> {
        Ok(user::Entity::find()
            .filter(user::Column::Username.eq(username))
            .one(&self.conn)
            .await?)
    }
}

#[async_trait]
impl CredentialStore for DbCredentialStore {
    async fn register(&self, identity: NewIdentity, password: &str) -> Result<User> {
        let NewIdentity { username, email } = identity;
        let username = username.trim().to_string();
        let email = email.trim().to_string();
        if username.is_empty() {
            return Err(AppError::ValidationFailure("No username was given".into()));
        }
        if email.is_empty() {
            return Err(AppError::ValidationFailure("No email was given".into()));
        }
        if password.is_empty() {
            return Err(AppError::ValidationFailure("No password was given".into()));
        }

        if let Some(field) = self.taken_field(&username, &email).await? {
            return Err(AppError::DuplicateIdentity(field));
        }

        let password = password.to_owned();
        let password_hash = tokio::task::spawn_blocking(move || hash_password(&password)).await??;

        let model = user::ActiveModel {
            username: Set(username.clone()),
            email: Set(email.clone()),
            password_hash: Set(password_hash),
            ..Default::default()
        };
        // Another signup may have raced us past the pre-check
        let model = match model.insert(&self.conn).await {
            Ok(model) => model,
            Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                let field = self.taken_field(&username, &email).await?;
                return Err(AppError::DuplicateIdentity(field.unwrap_or("username")));
            }
            Err(e) => return Err(AppError::Database(e)),
        };

        info!(user_id = model.id, username = %model.username, "user registered");
        Ok(model.into())
    }

    async fn authenticate(&self, username: &str, password: &str) -> Result<User> {
        let model = self.find_model(username).await?;

        let stored = model.as_ref().map(|m| m.password_hash.clone());
        let password = password.to_owned();
        let verified = tokio::task::spawn_blocking(move || {
            verify_password(stored.as_deref().unwrap_or(DUMMY_HASH.as_str()), &password)
        })
        .await?;

        match model {
            Some(model) if verified => Ok(model.into()),
            _ => {
                warn!(username, "authentication failed");
                Err(AppError::InvalidCredentials)
            }
        }
    }

    async fn find(&self, id: i32) -> Result<Option<User>> {
        Ok(user::Entity::find_by_id(id)
            .one(&self.conn)
            .await?
            .map(User::from))
    }
}

// Unknown usernames are checked against this so they cost one Argon2 run,
// same as a wrong password.
static DUMMY_HASH: Lazy<String> =
    Lazy::new(|| hash_password("wanderlust-dummy-password").unwrap_or_default());

fn hash_password(password: &str) -> Result<String> {
    let mut salt_bytes = [0u8; 16];
    getrandom::getrandom(&mut salt_bytes).map_err(|e| AppError::Internal(e.to_string()))?;
    let salt =
        SaltString::encode_b64(&salt_bytes).map_err(|e| AppError::Internal(e.to_string()))?;
    let phc = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(e.to_string()))?
        .to_string();
    Ok(phc)
}

fn verify_password(hash: &str, password: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_round_trip() {
        let phc = hash_password("p").unwrap();
        assert!(phc.starts_with("$argon2"));
        assert!(!phc.contains("$p$"));
        assert!(verify_password(&phc, "p"));
        assert!(!verify_password(&phc, "q"));
    }

    #[test]
    fn same_password_gets_fresh_salt() {
        assert_ne!(hash_password("p").unwrap(), hash_password("p").unwrap());
    }

    async fn store() -> DbCredentialStore {
        use sea_orm_migration::MigratorTrait;

        let mut opt = sea_orm::ConnectOptions::new("sqlite::memory:");
        opt.max_connections(1).sqlx_logging(false);
        let conn = sea_orm::Database::connect(opt).await.unwrap();
        crate::migration::Migrator::up(&conn, None).await.unwrap();
        DbCredentialStore::new(conn)
    }

    #[tokio::test]
    async fn taken_field_names_the_colliding_column() {
        let store = store().await;
        let identity = NewIdentity {
            username: "alice".into(),
            email: "alice@example.com".into(),
        };
        store.register(identity, "p").await.unwrap();

        assert_eq!(store.taken_field("bob", "alice@example.com").await.unwrap(), Some("email"));
        assert_eq!(store.taken_field("alice", "bob@example.com").await.unwrap(), Some("username"));
        assert_eq!(store.taken_field("bob", "bob@example.com").await.unwrap(), None);

        let clash = NewIdentity {
            username: "bob".into(),
            email: "alice@example.com".into(),
        };
        assert!(matches!(
            store.register(clash, "p").await,
            Err(AppError::DuplicateIdentity("email"))
        ));
    }

    #[test]
    fn garbage_hash_never_verifies() {
        assert!(!verify_password("not-a-phc-string", "p"));
        assert!(!verify_password("", ""));
    }
}
