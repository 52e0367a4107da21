//! Signup, login, logout and the flash/redirect behavior around them.

mod common;

use axum::http::StatusCode;
use common::{spawn_app, Browser};
use wanderlust::{AppError, CredentialStore, NewIdentity};

#[tokio::test]
async fn signup_then_login_welcomes_once() {
    let app = spawn_app().await;
    let mut browser = Browser::new(&app);

    let response = browser.signup("a", "p").await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(response.location.as_deref(), Some("/login"));

    let response = browser.login("a", "p").await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(response.location.as_deref(), Some("/listing"));

    let first = browser.get("/listing").await;
    assert_eq!(first.status, StatusCode::OK);
    assert!(first.body.contains("Welcome a to wanderlust"));
    assert!(first.body.contains("/logout"));

    let second = browser.get("/listing").await;
    assert!(!second.body.contains("Welcome a to wanderlust"));
    assert!(second.body.contains("/logout"));
}

#[tokio::test]
async fn duplicate_username_is_rejected_and_first_account_still_works() {
    let app = spawn_app().await;
    let credentials = app.state.credentials.clone();

    credentials
        .register(
            NewIdentity {
                username: "a".into(),
                email: "a@example.com".into(),
            },
            "p",
        )
        .await
        .unwrap();
    let second = credentials
        .register(
            NewIdentity {
                username: "a".into(),
                email: "other@example.com".into(),
            },
            "q",
        )
        .await;
    assert!(matches!(second, Err(AppError::DuplicateIdentity("username"))));

    let user = credentials.authenticate("a", "p").await.unwrap();
    assert_eq!(user.email, "a@example.com");
    assert!(matches!(
        credentials.authenticate("a", "q").await,
        Err(AppError::InvalidCredentials)
    ));
}

#[tokio::test]
async fn duplicate_signup_flashes_on_signup_page() {
    let app = spawn_app().await;
    let mut browser = Browser::new(&app);

    browser.signup("a", "p").await;
    let response = browser.signup("a", "other").await;
    assert_eq!(response.location.as_deref(), Some("/signup"));

    let page = browser.get("/signup").await;
    assert!(page.body.contains("A user with the given username is already registered"));
}

#[tokio::test]
async fn wrong_password_leaves_session_anonymous() {
    let app = spawn_app().await;
    let mut browser = Browser::new(&app);
    browser.signup("a", "p").await;

    let response = browser.login("a", "wrong").await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(response.location.as_deref(), Some("/login"));

    let page = browser.get("/login").await;
    assert!(page.body.contains("Password or username is incorrect"));
    assert!(!page.body.contains("/logout"));

    let guarded = browser.get("/listing/new").await;
    assert_eq!(guarded.location.as_deref(), Some("/login"));
}

#[tokio::test]
async fn unknown_user_fails_like_a_wrong_password() {
    let app = spawn_app().await;
    let mut browser = Browser::new(&app);

    let response = browser.login("ghost", "p").await;
    assert_eq!(response.location.as_deref(), Some("/login"));
    let page = browser.get("/login").await;
    assert!(page.body.contains("Password or username is incorrect"));
}

#[tokio::test]
async fn login_returns_to_the_page_that_required_it() {
    let app = spawn_app().await;
    let mut browser = Browser::new(&app);
    browser.signup("a", "p").await;

    let bounced = browser.get("/listing/new").await;
    assert_eq!(bounced.status, StatusCode::SEE_OTHER);
    assert_eq!(bounced.location.as_deref(), Some("/login"));

    let form = browser.get("/login").await;
    assert!(form.body.contains("Please login first"));

    let response = browser.login("a", "p").await;
    assert_eq!(response.location.as_deref(), Some("/listing/new"));

    let page = browser.get("/listing/new").await;
    assert_eq!(page.status, StatusCode::OK);
    assert!(page.body.contains("Create a New Listing"));

    // The return path is used once
    browser.get("/logout").await;
    let response = browser.login("a", "p").await;
    assert_eq!(response.location.as_deref(), Some("/listing"));
}

#[tokio::test]
async fn logout_invalidates_the_old_cookie() {
    let app = spawn_app().await;
    let mut browser = Browser::new(&app);
    browser.signup("a", "p").await;
    browser.login("a", "p").await;
    let authenticated_cookie = browser.cookie.clone();

    let response = browser.get("/logout").await;
    assert_eq!(response.location.as_deref(), Some("/listing"));
    let page = browser.get("/listing").await;
    assert!(page.body.contains("logged out"));
    assert!(!page.body.contains("/logout"));

    let mut replay = Browser::new(&app);
    replay.cookie = authenticated_cookie;
    let guarded = replay.get("/listing/new").await;
    assert_eq!(guarded.location.as_deref(), Some("/login"));
}

#[tokio::test]
async fn admin_form_logs_in_too() {
    let app = spawn_app().await;
    let mut browser = Browser::new(&app);
    browser.signup("a", "p").await;

    let form = browser.get("/admin").await;
    assert!(form.body.contains("Admin Login"));

    let response = browser.post("/admin", "username=a&password=p").await;
    assert_eq!(response.location.as_deref(), Some("/listing"));
    let page = browser.get("/listing").await;
    assert!(page.body.contains("Welcome a to wanderlust"));
}

#[tokio::test]
async fn blank_signup_fields_flash_an_error() {
    let app = spawn_app().await;
    let mut browser = Browser::new(&app);

    let response = browser.post("/signup", "username=&email=x%40example.com&password=p").await;
    assert_eq!(response.location.as_deref(), Some("/signup"));
    let page = browser.get("/signup").await;
    assert!(page.body.contains("No username was given"));
}
