//! Session guard: token extraction, verification and role checks for incoming requests.
//!
//! Handlers either call [`SessionGuard::authorize`] directly or take one of the
//! extractors ([`Authenticated`], [`RequireAdmin`]) which do the same thing and
//! reject with the matching [`AppError`].

use axum::extract::{FromRef, FromRequestParts};
use axum::http::request::Parts;
use axum::http::HeaderMap;
use std::sync::Arc;
use tracing::debug;

use super::authorizer::check_role;
use super::principal::Role;
use super::provider::Authenticator;
use super::token::Claims;
use crate::error::{AppError, AppResult};

pub const AUTH_HEADER: &str = "x-auth-token";

#[derive(Clone)]
pub struct SessionGuard {
    auth: Arc<Authenticator>,
}

impl SessionGuard {
    pub fn new(auth: Arc<Authenticator>) -> Self { Self { auth } }

    /// Blank counts as absent; a header that is not visible ASCII is a bad token.
    fn token_from(headers: &HeaderMap) -> AppResult<Option<&str>> {
        let Some(value) = headers.get(AUTH_HEADER) else { return Ok(None) };
        let token = value.to_str().map_err(|_| AppError::invalid_token())?.trim();
        Ok((!token.is_empty()).then_some(token))
    }

    /// Verify the request's token and, if `required` is set, its role.
    /// No store lookup: the embedded claims are trusted until they expire.
    pub fn authorize(&self, headers: &HeaderMap, required: Option<Role>) -> AppResult<Claims> {
        let Some(token) = Self::token_from(headers)? else {
            return Err(AppError::missing_token());
        };
        let claims = self.auth.verify_token(token).map_err(|e| {
            debug!(error = %e, "token rejected");
            AppError::from(e)
        })?;
        check_role(&claims.principal(), required)?;
        Ok(claims)
    }

    /// Like `authorize(headers, None)` but an absent header is `Ok(None)`.
    /// A header that is present but invalid is still an error.
    pub fn identify(&self, headers: &HeaderMap) -> AppResult<Option<Claims>> {
        if Self::token_from(headers)?.is_none() {
            return Ok(None);
        }
        self.authorize(headers, None).map(Some)
    }
}

/// Any caller holding a valid token.
#[derive(Debug, Clone)]
pub struct Authenticated(pub Claims);

/// A caller whose token carries the `admin` role.
#[derive(Debug, Clone)]
pub struct RequireAdmin(pub Claims);

impl<S> FromRequestParts<S> for Authenticated
where
    SessionGuard: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        SessionGuard::from_ref(state).authorize(&parts.headers, None).map(Authenticated)
    }
}

impl<S> FromRequestParts<S> for RequireAdmin
where
    SessionGuard: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        SessionGuard::from_ref(state).authorize(&parts.headers, Some(Role::Admin)).map(RequireAdmin)
    }
}
