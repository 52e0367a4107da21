//! Application error type and its HTTP mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use sea_orm::DbErr;
use thiserror::Error;
use tracing::error;

use crate::views;

pub type Result<T, E = AppError> = std::result::Result<T, E>;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Password or username is incorrect")]
    InvalidCredentials,

    #[error("A user with the given {0} is already registered")]
    DuplicateIdentity(&'static str),

    #[error("{0} not found")]
    ResourceNotFound(&'static str),

    #[error("{0}")]
    ValidationFailure(String),

    /// A guard turned the request away. The flash banner has already been
    /// queued; the response is only the redirect.
    #[error("not authorized, redirecting to {redirect_to}")]
    Unauthorized { redirect_to: String },

    #[error("logout failed: {0}")]
    LogoutFailed(String),

    #[error("Page Not Found!")]
    PageNotFound,

    #[error("database error: {0}")]
    Database(#[from] DbErr),

    #[error("session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Internal(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AppError::DuplicateIdentity(_) => StatusCode::CONFLICT,
            AppError::ResourceNotFound(_) | AppError::PageNotFound => StatusCode::NOT_FOUND,
            AppError::ValidationFailure(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized { .. } => StatusCode::SEE_OTHER,
            AppError::LogoutFailed(_)
            | AppError::Database(_)
            | AppError::Session(_)
            | AppError::Config(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(e: tokio::task::JoinError) -> Self {
        AppError::Internal(e.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if let AppError::Unauthorized { redirect_to } = self {
            return Redirect::to(&redirect_to).into_response();
        }

        let status = self.status();
        if status.is_server_error() {
            error!(error = %self, "request failed");
        }

        (status, views::error_page(&self.to_string())).into_response()
    }
}
