use axum::{
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Json,
};
use serde_json::json;

use crate::names;

/// Errors a handler can end in. Each maps to one status and a JSON body.
#[derive(Debug)]
pub enum AppError {
    Unauthorized,
    /// Signed in, but the role may not open this screen.
    AccessDenied,
    /// Signed in, but the record belongs to someone else.
    Forbidden(&'static str),
    NotFound(&'static str),
    Input(String),
    Conflict(String),
    /// The generation service or object storage failed.
    Upstream(String),
    Internal(&'static str),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::AccessDenied => StatusCode::SEE_OTHER,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Input(_) => StatusCode::BAD_REQUEST,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Upstream(_) => StatusCode::BAD_GATEWAY,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> &str {
        match self {
            Self::Unauthorized => "UNAUTHORIZED",
            Self::AccessDenied => "ACCESS_DENIED",
            Self::Forbidden(msg) | Self::NotFound(msg) | Self::Internal(msg) => msg,
            Self::Input(msg) | Self::Conflict(msg) | Self::Upstream(msg) => msg,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if let Self::AccessDenied = self {
            return Redirect::to(names::ACCESS_DENIED_URL).into_response();
        }

        let status = self.status();
        (status, Json(json!({ "error": self.message() }))).into_response()
    }
}

pub trait ResultExt<T> {
    /// Logs the underlying error and turns it into a 500 carrying `msg`.
    fn reject(self, msg: &'static str) -> Result<T, AppError>;

    /// Turns the error into a 400 carrying its own message.
    fn reject_input(self) -> Result<T, AppError>;
}

impl<T, E: std::fmt::Display> ResultExt<T> for Result<T, E> {
    fn reject(self, msg: &'static str) -> Result<T, AppError> {
        self.map_err(|e| {
            tracing::error!("{msg}: {e}");
            AppError::Internal(msg)
        })
    }

    fn reject_input(self) -> Result<T, AppError> {
        self.map_err(|e| AppError::Input(e.to_string()))
    }
}
