//! URL routing and the middleware stack around it.

use axum::{
    extract::{Query, Request},
    http::Method,
    middleware::{from_fn, from_fn_with_state},
    routing::{delete, get, post, put},
    Router,
};
use serde::Deserialize;
use tower::{
    util::{MapRequest, MapRequestLayer},
    Layer,
};

use crate::{
    auth::identity_middleware,
    error::AppError,
    guard::{require_login, require_owner, require_review_author},
    session::{fix_expiry, session_layer},
    state::AppState,
    store::SeaOrmStore,
};

mod listings;
mod reviews;
mod users;

/// The full application: router plus the `_method` override in front of it.
pub type App = MapRequest<Router, fn(Request) -> Request>;

pub fn app(state: AppState) -> App {
    MapRequestLayer::new(method_override as fn(Request) -> Request).layer(router(state))
}

pub fn router(state: AppState) -> Router {
    let sessions = session_layer(
        SeaOrmStore::new(state.db.clone()),
        state.settings.secure_cookies,
        state.settings.session_ttl_days,
    );
    let owner = from_fn_with_state(state.clone(), require_owner);

    Router::new()
        .route("/listing", get(listings::index))
        .route("/listing", post(listings::create).route_layer(from_fn(require_login)))
        .route("/listing/new", get(listings::new_form).route_layer(from_fn(require_login)))
        .route("/listing/{id}", get(listings::show).post(listings::back))
        .route(
            "/listing/{id}",
            put(listings::update)
                .delete(listings::destroy)
                .route_layer(owner.clone()),
        )
        .route("/listing/{id}/edit", get(listings::edit_form).route_layer(owner))
        .route(
            "/listing/{id}/review",
            post(reviews::create).route_layer(from_fn(require_login)),
        )
        .route(
            "/listing/{id}/review/{review_id}",
            delete(reviews::destroy)
                .route_layer(from_fn_with_state(state.clone(), require_review_author)),
        )
        .route("/signup", get(users::signup_form).post(users::signup))
        .route("/login", get(users::login_form).post(users::login))
        .route("/admin", get(users::admin_form).post(users::login))
        .route("/logout", get(users::logout))
        .fallback(not_found)
        .method_not_allowed_fallback(not_found)
        .layer(from_fn_with_state(state.clone(), identity_middleware))
        .layer(from_fn_with_state(state.clone(), fix_expiry))
        .layer(sessions)
        .with_state(state)
}

async fn not_found() -> AppError {
    AppError::PageNotFound
}

#[derive(Deserialize)]
struct MethodQuery {
    #[serde(rename = "_method")]
    method: Option<String>,
}

/// HTML forms only speak GET and POST; `POST ...?_method=PUT` is treated as
/// a PUT (likewise PATCH and DELETE).
fn method_override(mut request: Request) -> Request {
    if request.method() != Method::POST {
        return request;
    }
    let Ok(Query(query)) = Query::<MethodQuery>::try_from_uri(request.uri()) else {
        return request;
    };
    let method = match query.method.map(|m| m.to_ascii_uppercase()).as_deref() {
        Some("PUT") => Method::PUT,
        Some("PATCH") => Method::PATCH,
        Some("DELETE") => Method::DELETE,
        _ => return request,
    };
    *request.method_mut() = method;
    request
}

#[cfg(test)]
mod tests {
    use axum::body::Body;

    use super::*;

    fn post(uri: &str) -> Request {
        Request::builder()
            .method(Method::POST)
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    #[test]
    fn post_with_override_becomes_delete() {
        let request = method_override(post("/listing/1?_method=DELETE"));
        assert_eq!(request.method(), Method::DELETE);
        assert_eq!(request.uri().path(), "/listing/1");
    }

    #[test]
    fn override_is_case_insensitive() {
        assert_eq!(method_override(post("/listing/1?_method=put")).method(), Method::PUT);
    }

    #[test]
    fn unknown_or_missing_override_is_ignored() {
        assert_eq!(method_override(post("/listing/1")).method(), Method::POST);
        assert_eq!(method_override(post("/listing/1?_method=GET")).method(), Method::POST);
    }

    #[test]
    fn only_post_is_rewritten() {
        let request = Request::builder()
            .uri("/listing/1?_method=DELETE")
            .body(Body::empty())
            .unwrap();
        assert_eq!(method_override(request).method(), Method::GET);
    }
}
