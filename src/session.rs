//! Cookie-keyed server-side sessions.
//!
//! Loading and persisting are done by the `tower-sessions` layer over
//! [`SeaOrmStore`]; this module configures the cookie, pins each session to an
//! absolute expiry and knows how to tear one down on logout.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use time::{Duration, OffsetDateTime};
use tower_sessions::{cookie::SameSite, Expiry, Session, SessionManagerLayer};

use crate::{error::Result, state::AppState, store::SeaOrmStore};

pub const COOKIE_NAME: &str = "wanderlust.sid";

/// Unix timestamp stamped into the session when it is first created.
pub(crate) const EXPIRES_AT_KEY: &str = "session.expires_at";
pub(crate) const USER_KEY: &str = "auth.user_id";
pub(crate) const RETURN_TO_KEY: &str = "auth.return_to";

pub fn session_layer(store: SeaOrmStore, secure: bool, ttl_days: i64) -> SessionManagerLayer<SeaOrmStore> {
    SessionManagerLayer::new(store)
        .with_name(COOKIE_NAME)
        .with_http_only(true)
        .with_same_site(SameSite::Lax)
        .with_secure(secure)
        .with_expiry(Expiry::OnInactivity(Duration::days(ttl_days)))
}

/// Middleware giving every session one expiry instant for its whole life.
///
/// The first request stamps `now + ttl`; later requests re-apply the stamped
/// instant, so the cookie and the stored record never slide forward.
pub async fn fix_expiry(
    State(state): State<AppState>,
    session: Session,
    request: Request,
    next: Next,
) -> Result<Response> {
    let expires_at = pinned_expiry(&session, Duration::days(state.settings.session_ttl_days)).await?;
    session.set_expiry(Some(Expiry::AtDateTime(expires_at)));
    Ok(next.run(request).await)
}

async fn pinned_expiry(session: &Session, ttl: Duration) -> Result<OffsetDateTime> {
    let now = OffsetDateTime::now_utc();
    if let Some(stamp) = session.get::<i64>(EXPIRES_AT_KEY).await? {
        if let Ok(at) = OffsetDateTime::from_unix_timestamp(stamp) {
            return Ok(at);
        }
    }

    let at = now + ttl;
    session.insert(EXPIRES_AT_KEY, at.unix_timestamp()).await?;
    Ok(at)
}

/// Invalidates the current server record and drops the identity reference.
///
/// The session ID is cycled, so the old cookie no longer resolves to anything.
/// Remaining data (flash queue, expiry stamp) moves to the new ID.
pub async fn destroy(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.remove::<i32>(USER_KEY).await?;
    session.remove::<String>(RETURN_TO_KEY).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tower_sessions::MemoryStore;

    use super::*;

    #[tokio::test]
    async fn expiry_is_stamped_once() {
        let session = Session::new(None, Arc::new(MemoryStore::default()), None);

        let first = pinned_expiry(&session, Duration::days(7)).await.unwrap();
        let second = pinned_expiry(&session, Duration::days(30)).await.unwrap();

        assert_eq!(first.unix_timestamp(), second.unix_timestamp());
        let remaining = first - OffsetDateTime::now_utc();
        assert!(remaining <= Duration::days(7) && remaining > Duration::days(6));
    }
}
