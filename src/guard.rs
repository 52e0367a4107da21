//! Authorization guards.
//!
//! A [`Guard`] inspects a [`GuardContext`] and either allows the request or
//! denies it with a [`Denial`] (where to send the browser and what to tell
//! it). Guards know nothing about axum; the `require_*` functions at the
//! bottom adapt them into route middleware.

use async_trait::async_trait;
use axum::{
    extract::{Path, Request, State},
    http::Method,
    middleware::Next,
    response::Response,
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::warn;

use crate::{
    auth::{CurrentUser, LOGIN_PATH},
    credentials::User,
    error::{AppError, Result},
    flash::{self, Severity},
    resources::{ListingStore, ReviewStore},
    session::RETURN_TO_KEY,
    state::AppState,
};

pub const LOGIN_REQUIRED: &str = "Please login first";
pub const NOT_OWNER: &str = "you don't have permission to edit";
pub const NOT_REVIEW_AUTHOR: &str = "you don't have access to delete";

/// What a guard gets to look at.
#[derive(Debug, Clone, Copy, Default)]
pub struct GuardContext<'a> {
    pub identity: Option<&'a User>,
    /// Path and query the browser asked for, when it can be revisited with a
    /// plain GET after logging in.
    pub requested: Option<&'a str>,
    pub listing_id: Option<i32>,
    pub review_id: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Denial {
    pub redirect_to: String,
    pub message: &'static str,
    /// Path to come back to after logging in.
    pub remember: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(Denial),
}

#[async_trait]
pub trait Guard: Send + Sync {
    async fn check(&self, ctx: &GuardContext<'_>) -> Result<Decision>;
}

/// Runs guards in order; the first denial wins and later guards are skipped.
pub async fn evaluate(guards: &[&dyn Guard], ctx: &GuardContext<'_>) -> Result<Decision> {
    for guard in guards {
        if let Decision::Deny(denial) = guard.check(ctx).await? {
            return Ok(Decision::Deny(denial));
        }
    }
    Ok(Decision::Allow)
}

pub struct RequireAuthenticated;

#[async_trait]
impl Guard for RequireAuthenticated {
    async fn check(&self, ctx: &GuardContext<'_>) -> Result<Decision> {
        if ctx.identity.is_some() {
            return Ok(Decision::Allow);
        }
        Ok(Decision::Deny(Denial {
            redirect_to: LOGIN_PATH.to_string(),
            message: LOGIN_REQUIRED,
            remember: ctx.requested.map(str::to_string),
        }))
    }
}

fn detail_page(listing_id: i32) -> String {
    format!("/listing/{listing_id}")
}

/// Only the listing's owner may pass.
pub struct RequireOwner {
    pub listings: ListingStore,
}

#[async_trait]
impl Guard for RequireOwner {
    async fn check(&self, ctx: &GuardContext<'_>) -> Result<Decision> {
        let Some(user) = ctx.identity else {
            return RequireAuthenticated.check(ctx).await;
        };
        let listing_id = ctx.listing_id.ok_or(AppError::ResourceNotFound("Listing"))?;
        let owner = self
            .listings
            .owner_of(listing_id)
            .await?
            .ok_or(AppError::ResourceNotFound("Listing"))?;

        if owner == user.id {
            return Ok(Decision::Allow);
        }
        Ok(Decision::Deny(Denial {
            redirect_to: detail_page(listing_id),
            message: NOT_OWNER,
            remember: None,
        }))
    }
}

/// Only the review's author may pass.
pub struct RequireReviewAuthor {
    pub reviews: ReviewStore,
}

#[async_trait]
impl Guard for RequireReviewAuthor {
    async fn check(&self, ctx: &GuardContext<'_>) -> Result<Decision> {
        let Some(user) = ctx.identity else {
            return RequireAuthenticated.check(ctx).await;
        };
        let listing_id = ctx.listing_id.ok_or(AppError::ResourceNotFound("Listing"))?;
        let review_id = ctx.review_id.ok_or(AppError::ResourceNotFound("Review"))?;
        let author = self
            .reviews
            .author_of(listing_id, review_id)
            .await?
            .ok_or(AppError::ResourceNotFound("Review"))?;

        if author == user.id {
            return Ok(Decision::Allow);
        }
        Ok(Decision::Deny(Denial {
            redirect_to: detail_page(listing_id),
            message: NOT_REVIEW_AUTHOR,
            remember: None,
        }))
    }
}

/// Applies a decision to the session. A denial queues its flash, records the
/// return path when asked to, and turns into `Unauthorized`.
pub async fn enforce(session: &Session, decision: Decision) -> Result<()> {
    let Decision::Deny(denial) = decision else {
        return Ok(());
    };

    if let Some(path) = denial.remember {
        session.insert(RETURN_TO_KEY, path).await?;
    }
    flash::enqueue(session, Severity::Error, denial.message).await?;
    warn!(redirect_to = %denial.redirect_to, reason = denial.message, "request denied");

    Err(AppError::Unauthorized {
        redirect_to: denial.redirect_to,
    })
}

/// Route ids arrive as text; anything that is not a number can't name a row.
pub fn parse_id(raw: &str, kind: &'static str) -> Result<i32> {
    raw.parse().map_err(|_| AppError::ResourceNotFound(kind))
}

#[derive(Debug, Deserialize)]
pub struct ListingPath {
    pub id: String,
}

#[derive(Debug, Deserialize)]
pub struct ReviewPath {
    pub id: String,
    pub review_id: String,
}

/// Only GET and HEAD requests can be replayed by the post-login redirect.
fn requested(request: &Request) -> Option<String> {
    if request.method() != Method::GET && request.method() != Method::HEAD {
        return None;
    }
    let uri = request.uri();
    Some(
        uri.path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or_else(|| uri.path().to_string()),
    )
}

pub async fn require_login(
    session: Session,
    CurrentUser(user): CurrentUser,
    request: Request,
    next: Next,
) -> Result<Response> {
    let requested = requested(&request);
    let ctx = GuardContext {
        identity: user.as_ref(),
        requested: requested.as_deref(),
        ..Default::default()
    };
    enforce(&session, evaluate(&[&RequireAuthenticated], &ctx).await?).await?;
    Ok(next.run(request).await)
}

pub async fn require_owner(
    State(state): State<AppState>,
    Path(path): Path<ListingPath>,
    session: Session,
    CurrentUser(user): CurrentUser,
    request: Request,
    next: Next,
) -> Result<Response> {
    let requested = requested(&request);
    let ctx = GuardContext {
        identity: user.as_ref(),
        requested: requested.as_deref(),
        listing_id: Some(parse_id(&path.id, "Listing")?),
        review_id: None,
    };
    let owner = RequireOwner {
        listings: state.listings.clone(),
    };
    enforce(&session, evaluate(&[&RequireAuthenticated, &owner], &ctx).await?).await?;
    Ok(next.run(request).await)
}

pub async fn require_review_author(
    State(state): State<AppState>,
    Path(path): Path<ReviewPath>,
    session: Session,
    CurrentUser(user): CurrentUser,
    request: Request,
    next: Next,
) -> Result<Response> {
    let requested = requested(&request);
    let ctx = GuardContext {
        identity: user.as_ref(),
        requested: requested.as_deref(),
        listing_id: Some(parse_id(&path.id, "Listing")?),
        review_id: Some(parse_id(&path.review_id, "Review")?),
    };
    let author = RequireReviewAuthor {
        reviews: state.reviews.clone(),
    };
    enforce(&session, evaluate(&[&RequireAuthenticated, &author], &ctx).await?).await?;
    Ok(next.run(request).await)
}
