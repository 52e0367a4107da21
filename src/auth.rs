//! Authentication gate: who is making this request.
//!
//! [`attach_identity`] runs once per request and leaves a [`CurrentUser`] in
//! the request extensions. [`login`] and [`logout`] move a session between the
//! anonymous and authenticated states.

use std::convert::Infallible;

use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use tower_sessions::Session;
use tracing::{info, warn};

use crate::{
    credentials::{CredentialStore, User},
    error::{AppError, Result},
    flash::{self, Severity},
    session::{self, RETURN_TO_KEY, USER_KEY},
    state::AppState,
};

pub const LOGIN_PATH: &str = "/login";
pub const DEFAULT_LANDING: &str = "/listing";

/// Identity resolved for this request; `None` means anonymous.
#[derive(Debug, Clone, Default)]
pub struct CurrentUser(pub Option<User>);

impl<S: Send + Sync> FromRequestParts<S> for CurrentUser {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .unwrap_or_default())
    }
}

/// Like [`CurrentUser`], but only for authenticated requests. Anonymous ones
/// are bounced to the login form.
#[derive(Debug, Clone)]
pub struct AuthUser(pub User);

impl<S: Send + Sync> FromRequestParts<S> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match CurrentUser::from_request_parts(parts, state).await {
            Ok(CurrentUser(Some(user))) => Ok(AuthUser(user)),
            _ => Err(AppError::Unauthorized {
                redirect_to: LOGIN_PATH.into(),
            }),
        }
    }
}

/// Resolves the session's user reference into a [`User`].
///
/// A reference to an account that no longer exists is dropped from the
/// session and the request continues anonymously.
pub async fn attach_identity(session: &Session, credentials: &dyn CredentialStore) -> Result<Option<User>> {
    let Some(user_id) = session.get::<i32>(USER_KEY).await? else {
        return Ok(None);
    };

    match credentials.find(user_id).await? {
        Some(user) => Ok(Some(user)),
        None => {
            warn!(user_id, "session refers to a missing user");
            session.remove::<i32>(USER_KEY).await?;
            Ok(None)
        }
    }
}

pub async fn identity_middleware(
    State(state): State<AppState>,
    session: Session,
    mut request: Request,
    next: Next,
) -> Result<Response> {
    let user = attach_identity(&session, state.credentials.as_ref()).await?;
    request.extensions_mut().insert(CurrentUser(user));
    Ok(next.run(request).await)
}

/// Verifies the credentials and, on success, binds the account to the session.
///
/// Returns where the browser should go next: the page that bounced it to the
/// login form, or the listing index. On failure an error flash is queued and
/// `InvalidCredentials` is returned; the session stays anonymous.
pub async fn login(
    session: &Session,
    credentials: &dyn CredentialStore,
    username: &str,
    password: &str,
) -> Result<String> {
    let user = match credentials.authenticate(username, password).await {
        Ok(user) => user,
        Err(AppError::InvalidCredentials) => {
            flash::enqueue(session, Severity::Error, AppError::InvalidCredentials.to_string()).await?;
            return Err(AppError::InvalidCredentials);
        }
        Err(e) => return Err(e),
    };

    // Fresh ID for the authenticated session
    session.cycle_id().await?;
    session.insert(USER_KEY, user.id).await?;
    flash::enqueue(
        session,
        Severity::Success,
        format!("Welcome {} to wanderlust", user.username),
    )
    .await?;

    let return_to = session.remove::<String>(RETURN_TO_KEY).await?;
    info!(user_id = user.id, "user logged in");
    Ok(landing_page(return_to))
}

pub async fn logout(session: &Session) -> Result<()> {
    let user_id = session
        .get::<i32>(USER_KEY)
        .await
        .map_err(|e| AppError::LogoutFailed(e.to_string()))?;
    session::destroy(session)
        .await
        .map_err(|e| AppError::LogoutFailed(e.to_string()))?;
    flash::enqueue(session, Severity::Success, "logged out").await?;

    info!(?user_id, "user logged out");
    Ok(())
}

/// Only same-site absolute paths are honored as post-login targets.
fn landing_page(return_to: Option<String>) -> String {
    match return_to {
        Some(path) if path.starts_with('/') && !path.starts_with("//") && !path.contains('\\') => path,
        _ => DEFAULT_LANDING.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn landing_defaults_to_index() {
        assert_eq!(landing_page(None), "/listing");
    }

    #[test]
    fn landing_keeps_local_paths() {
        assert_eq!(landing_page(Some("/listing/new".into())), "/listing/new");
        assert_eq!(landing_page(Some("/listing/3/edit?x=1".into())), "/listing/3/edit?x=1");
    }

    #[test]
    fn landing_rejects_offsite_targets() {
        assert_eq!(landing_page(Some("https://evil.example".into())), "/listing");
        assert_eq!(landing_page(Some("//evil.example".into())), "/listing");
        assert_eq!(landing_page(Some("/\\evil.example".into())), "/listing");
    }
}
