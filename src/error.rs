//! Unified application error model and mapping helpers.
//! This module provides the error enum returned by every HTTP handler, the stable
//! error codes of the auth taxonomy, and the mapping to status codes and JSON bodies.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

use crate::identity::{StoreError, TokenError};

/// Stable machine-readable codes carried by [`AppError`].
pub mod codes {
    pub const DUPLICATE_EMAIL: &str = "duplicate_email";
    pub const INVALID_CREDENTIALS: &str = "invalid_credentials";
    pub const MISSING_TOKEN: &str = "missing_token";
    pub const INVALID_TOKEN: &str = "invalid_token";
    pub const FORBIDDEN: &str = "forbidden";
    pub const BAD_INPUT: &str = "bad_input";
    pub const INTERNAL: &str = "internal";
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AppError {
    UserInput { code: String, message: String },
    Auth { code: String, message: String },
    Forbidden { code: String, message: String },
    Internal { code: String, message: String },
}

impl AppError {
    pub fn code_str(&self) -> &str {
        match self {
            AppError::UserInput { code, .. }
            | AppError::Auth { code, .. }
            | AppError::Forbidden { code, .. }
            | AppError::Internal { code, .. } => code.as_str(),
        }
    }

    pub fn message(&self) -> &str {
        match self {
            AppError::UserInput { message, .. }
            | AppError::Auth { message, .. }
            | AppError::Forbidden { message, .. }
            | AppError::Internal { message, .. } => message.as_str(),
        }
    }

    pub fn user<S: Into<String>>(code: S, msg: S) -> Self { AppError::UserInput { code: code.into(), message: msg.into() } }
    pub fn auth<S: Into<String>>(code: S, msg: S) -> Self { AppError::Auth { code: code.into(), message: msg.into() } }
    pub fn forbidden_with<S: Into<String>>(code: S, msg: S) -> Self { AppError::Forbidden { code: code.into(), message: msg.into() } }
    pub fn internal<S: Into<String>>(code: S, msg: S) -> Self { AppError::Internal { code: code.into(), message: msg.into() } }

    pub fn bad_input(msg: impl Into<String>) -> Self {
        AppError::UserInput { code: codes::BAD_INPUT.into(), message: msg.into() }
    }

    pub fn duplicate_email() -> Self { Self::user(codes::DUPLICATE_EMAIL, "User already exists") }

    /// Unknown email and wrong password both map here; callers cannot tell them apart.
    pub fn invalid_credentials() -> Self { Self::user(codes::INVALID_CREDENTIALS, "Invalid credentials") }

    pub fn missing_token() -> Self { Self::auth(codes::MISSING_TOKEN, "No token, authorization denied") }

    pub fn invalid_token() -> Self { Self::auth(codes::INVALID_TOKEN, "Token is not valid") }

    pub fn forbidden() -> Self { Self::forbidden_with(codes::FORBIDDEN, "Access denied") }

    /// Generic 500. The detail is logged, never returned to the caller.
    pub fn server_error(detail: impl Display) -> Self {
        tracing::error!(detail = %detail, "internal error");
        Self::internal(codes::INTERNAL, "Server error")
    }

    /// Map to HTTP status code.
    pub fn http_status(&self) -> u16 {
        match self {
            AppError::UserInput { .. } => 400,
            AppError::Auth { .. } => 401,
            AppError::Forbidden { .. } => 403,
            AppError::Internal { .. } => 500,
        }
    }
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code_str(), self.message())
    }
}

impl std::error::Error for AppError {}

pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(serde_json::json!({ "message": self.message() }))).into_response()
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateEmail(_) => AppError::duplicate_email(),
        }
    }
}

impl From<TokenError> for AppError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Expired | TokenError::Invalid(_) => AppError::invalid_token(),
            TokenError::Signing(e) => AppError::server_error(e),
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::server_error(format!("{err:#}"))
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
