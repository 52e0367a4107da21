use axum::{
    extract::{Path, State},
    response::Redirect,
    Form,
};
use tower_sessions::Session;

use crate::{
    auth::AuthUser,
    error::{AppError, Result},
    flash::{self, Severity},
    guard::{parse_id, ListingPath, ReviewPath},
    state::AppState,
    validation::ReviewForm,
};

pub async fn create(
    State(state): State<AppState>,
    Path(path): Path<ListingPath>,
    session: Session,
    AuthUser(user): AuthUser,
    Form(form): Form<ReviewForm>,
) -> Result<Redirect> {
    let listing_id = parse_id(&path.id, "Listing")?;
    let input = form.validate()?;
    state.reviews.create(listing_id, user.id, input).await?;
    flash::enqueue(&session, Severity::Success, "review is added successfully").await?;
    Ok(Redirect::to(&format!("/listing/{listing_id}")))
}

pub async fn destroy(
    State(state): State<AppState>,
    Path(path): Path<ReviewPath>,
    session: Session,
) -> Result<Redirect> {
    let listing_id = parse_id(&path.id, "Listing")?;
    let review_id = parse_id(&path.review_id, "Review")?;
    if !state.reviews.delete(listing_id, review_id).await? {
        return Err(AppError::ResourceNotFound("Review"));
    }
    flash::enqueue(&session, Severity::Success, "review deleted").await?;
    Ok(Redirect::to(&format!("/listing/{listing_id}")))
}
