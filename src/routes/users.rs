use axum::{
    extract::State,
    response::{Html, Redirect},
    Form,
};
use serde::Deserialize;
use tower_sessions::Session;

use crate::{
    auth::{self, CurrentUser, LOGIN_PATH},
    credentials::NewIdentity,
    error::{AppError, Result},
    flash::{self, Severity},
    state::AppState,
    views::{self, RenderContext},
};

#[derive(Debug, Deserialize)]
pub struct SignupForm {
    #[serde(default)]
    username: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
}

pub async fn signup_form(
    State(state): State<AppState>,
    session: Session,
    CurrentUser(user): CurrentUser,
) -> Result<Html<String>> {
    let ctx = RenderContext::build(&session, user, &state.settings.app_name).await?;
    Ok(views::signup(&ctx))
}

/// Registers the account and sends the browser to the login form. Identity
/// problems (taken name, blank fields) come back as a flash on the signup page.
pub async fn signup(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<SignupForm>,
) -> Result<Redirect> {
    let identity = NewIdentity {
        username: form.username,
        email: form.email,
    };
    match state.credentials.register(identity, &form.password).await {
        Ok(_) => Ok(Redirect::to(LOGIN_PATH)),
        Err(e @ (AppError::DuplicateIdentity(_) | AppError::ValidationFailure(_))) => {
            flash::enqueue(&session, Severity::Error, e.to_string()).await?;
            Ok(Redirect::to("/signup"))
        }
        Err(e) => Err(e),
    }
}

pub async fn login_form(
    State(state): State<AppState>,
    session: Session,
    CurrentUser(user): CurrentUser,
) -> Result<Html<String>> {
    let ctx = RenderContext::build(&session, user, &state.settings.app_name).await?;
    Ok(views::login(&ctx))
}

pub async fn admin_form(
    State(state): State<AppState>,
    session: Session,
    CurrentUser(user): CurrentUser,
) -> Result<Html<String>> {
    let ctx = RenderContext::build(&session, user, &state.settings.app_name).await?;
    Ok(views::admin_login(&ctx))
}

pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Redirect> {
    match auth::login(&session, state.credentials.as_ref(), &form.username, &form.password).await {
        Ok(landing) => Ok(Redirect::to(&landing)),
        Err(AppError::InvalidCredentials) => Ok(Redirect::to(LOGIN_PATH)),
        Err(e) => Err(e),
    }
}

pub async fn logout(session: Session) -> Result<Redirect> {
    auth::logout(&session).await?;
    Ok(Redirect::to(auth::DEFAULT_LANDING))
}
