use axum::{
    extract::{Path, State},
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use tower_sessions::Session;

use crate::{
    auth::{AuthUser, CurrentUser},
    credentials::User,
    error::{AppError, Result},
    flash::{self, Severity},
    guard::{parse_id, ListingPath},
    state::AppState,
    validation::ListingForm,
    views::{self, RenderContext},
};

async fn context(state: &AppState, session: &Session, user: Option<User>) -> Result<RenderContext> {
    RenderContext::build(session, user, &state.settings.app_name).await
}

pub async fn index(
    State(state): State<AppState>,
    session: Session,
    CurrentUser(user): CurrentUser,
) -> Result<Html<String>> {
    let listings = state.listings.all().await?;
    let ctx = context(&state, &session, user).await?;
    Ok(views::listing_index(&ctx, &listings))
}

pub async fn new_form(
    State(state): State<AppState>,
    session: Session,
    AuthUser(user): AuthUser,
) -> Result<Html<String>> {
    let ctx = context(&state, &session, Some(user)).await?;
    Ok(views::listing_new(&ctx))
}

pub async fn create(
    State(state): State<AppState>,
    session: Session,
    AuthUser(user): AuthUser,
    Form(form): Form<ListingForm>,
) -> Result<Redirect> {
    let input = form.validate()?;
    state.listings.create(user.id, input).await?;
    flash::enqueue(&session, Severity::Success, "New Listing Created").await?;
    Ok(Redirect::to("/listing"))
}

pub async fn show(
    State(state): State<AppState>,
    Path(path): Path<ListingPath>,
    session: Session,
    CurrentUser(user): CurrentUser,
) -> Result<Response> {
    let detail = match parse_id(&path.id, "Listing") {
        Ok(id) => state.listings.find_detail(id).await?,
        Err(_) => None,
    };
    let Some(detail) = detail else {
        flash::enqueue(&session, Severity::Error, "Listing you requested for does not exist!").await?;
        return Ok(Redirect::to("/listing").into_response());
    };

    let ctx = context(&state, &session, user).await?;
    Ok(views::listing_show(&ctx, &detail).into_response())
}

pub async fn edit_form(
    State(state): State<AppState>,
    Path(path): Path<ListingPath>,
    session: Session,
    AuthUser(user): AuthUser,
) -> Result<Html<String>> {
    let listing = state
        .listings
        .find(parse_id(&path.id, "Listing")?)
        .await?
        .ok_or(AppError::ResourceNotFound("Listing"))?;
    let ctx = context(&state, &session, Some(user)).await?;
    Ok(views::listing_edit(&ctx, &listing))
}

pub async fn update(
    State(state): State<AppState>,
    Path(path): Path<ListingPath>,
    session: Session,
    Form(form): Form<ListingForm>,
) -> Result<Redirect> {
    let id = parse_id(&path.id, "Listing")?;
    let input = form.validate()?;
    state.listings.update(id, input).await?;
    flash::enqueue(&session, Severity::Success, "Listing Updated").await?;
    Ok(Redirect::to(&format!("/listing/{id}")))
}

pub async fn destroy(
    State(state): State<AppState>,
    Path(path): Path<ListingPath>,
    session: Session,
) -> Result<Redirect> {
    let id = parse_id(&path.id, "Listing")?;
    state.listings.delete(id).await?;
    flash::enqueue(&session, Severity::Success, "Deleted listing").await?;
    Ok(Redirect::to("/listing"))
}

/// Plain POST to a listing (no `_method`) just goes back to the index.
pub async fn back() -> Redirect {
    Redirect::to("/listing")
}
