#![allow(dead_code)]

use axum::{
    body::{to_bytes, Body},
    extract::Request,
    http::{header, Method, StatusCode},
};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;
use tempfile::TempDir;
use tower::ServiceExt;
use wanderlust::{migration::Migrator, App, AppState, Settings};

pub struct TestApp {
    pub app: App,
    pub state: AppState,
    pub db: DatabaseConnection,
    _dir: TempDir,
}

pub async fn spawn_app() -> TestApp {
    let dir = tempfile::tempdir().expect("tempdir");
    let url = format!("sqlite://{}?mode=rwc", dir.path().join("wanderlust.db").display());

    let mut opt = ConnectOptions::new(url.clone());
    opt.max_connections(1).sqlx_logging(false);
    let db = Database::connect(opt).await.expect("connect");
    Migrator::up(&db, None).await.expect("migrate");

    let settings = Settings {
        database_url: url,
        ..Settings::default()
    };
    let state = AppState::new(db.clone(), settings);
    TestApp {
        app: wanderlust::app(state.clone()),
        state,
        db,
        _dir: dir,
    }
}

pub struct TestResponse {
    pub status: StatusCode,
    pub location: Option<String>,
    pub set_cookie: Option<String>,
    pub body: String,
}

/// A browser: one cookie jar, requests in sequence.
pub struct Browser<'a> {
    app: &'a TestApp,
    pub cookie: Option<String>,
}

impl<'a> Browser<'a> {
    pub fn new(app: &'a TestApp) -> Self {
        Self { app, cookie: None }
    }

    pub async fn send(&mut self, method: Method, uri: &str, form: Option<&str>) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(cookie) = &self.cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        let body = match form {
            Some(form) => {
                builder = builder.header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
                Body::from(form.to_string())
            }
            None => Body::empty(),
        };

        let response = self
            .app
            .app
            .clone()
            .oneshot(builder.body(body).expect("request"))
            .await
            .expect("infallible");

        let status = response.status();
        let location = response
            .headers()
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let set_cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        if let Some(pair) = set_cookie.as_deref().and_then(|c| c.split(';').next()) {
            self.cookie = Some(pair.to_string());
        }
        let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");

        TestResponse {
            status,
            location,
            set_cookie,
            body: String::from_utf8_lossy(&bytes).into_owned(),
        }
    }

    pub async fn get(&mut self, uri: &str) -> TestResponse {
        self.send(Method::GET, uri, None).await
    }

    pub async fn post(&mut self, uri: &str, form: &str) -> TestResponse {
        self.send(Method::POST, uri, Some(form)).await
    }

    pub async fn signup(&mut self, username: &str, password: &str) -> TestResponse {
        self.post(
            "/signup",
            &format!("username={username}&email={username}%40example.com&password={password}"),
        )
        .await
    }

    pub async fn login(&mut self, username: &str, password: &str) -> TestResponse {
        self.post("/login", &format!("username={username}&password={password}"))
            .await
    }

    /// Creates a listing as the logged-in user and returns its id.
    pub async fn create_listing(&mut self, title: &str) -> i32 {
        let response = self
            .post(
                "/listing",
                &format!(
                    "listing[title]={title}&listing[description]=Nice+place&listing[image]=&listing[price]=100&listing[location]=Goa&listing[country]=India"
                ),
            )
            .await;
        assert_eq!(response.status, StatusCode::SEE_OTHER);
        assert_eq!(response.location.as_deref(), Some("/listing"));

        self.app
            .state
            .listings
            .all()
            .await
            .expect("listings")
            .into_iter()
            .rev()
            .find(|l| l.title == title)
            .map(|l| l.id)
            .expect("listing was created")
    }
}
