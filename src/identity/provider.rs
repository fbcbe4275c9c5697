use anyhow::Context;
use serde::Deserialize;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::clock::Clock;
use super::principal::{Principal, PublicUser, Role, User};
use super::store::{normalize_email, CredentialStore};
use super::token::{Claims, IssuedToken, TokenError, TokenSigner};
use crate::error::{AppError, AppResult};
use crate::security;
use crate::tprintln;

/// Who may register an account with the `admin` role.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RolePolicy {
    /// Anonymous callers get `user`; `admin` requires an admin caller.
    #[default]
    Restricted,
    /// Any caller may pick any role. Demo behavior; opt in explicitly.
    Open,
}

impl FromStr for RolePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "restricted" => Ok(RolePolicy::Restricted),
            "open" => Ok(RolePolicy::Open),
            other => Err(format!("unknown role policy '{}' (expected restricted|open)", other)),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub role: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct LoginResponse {
    pub user: PublicUser,
    pub token: IssuedToken,
}

/// Registers accounts and exchanges credentials for signed tokens.
///
/// Owns the credential store handle, the token signer and the clock; one
/// instance is built at startup and shared by every request handler.
pub struct Authenticator {
    store: Arc<dyn CredentialStore>,
    signer: TokenSigner,
    clock: Arc<dyn Clock>,
    policy: RolePolicy,
}

impl Authenticator {
    pub fn new(store: Arc<dyn CredentialStore>, signer: TokenSigner, clock: Arc<dyn Clock>, policy: RolePolicy) -> Self {
        Self { store, signer, clock, policy }
    }

    pub fn policy(&self) -> RolePolicy { self.policy }

    pub fn store(&self) -> &Arc<dyn CredentialStore> { &self.store }

    pub fn verify_token(&self, token: &str) -> Result<Claims, TokenError> {
        self.signer.verify(token, self.clock.now())
    }

    /// Create an account. `caller` is the identity behind the request's token, if any;
    /// it only matters when the request asks for a privileged role.
    pub fn register(&self, req: &RegisterRequest, caller: Option<&Principal>) -> AppResult<PublicUser> {
        let name = req.name.trim();
        let email = normalize_email(&req.email);
        if name.is_empty() { return Err(AppError::bad_input("name is required")); }
        if email.is_empty() { return Err(AppError::bad_input("email is required")); }
        if req.password.is_empty() { return Err(AppError::bad_input("password is required")); }

        let role = match req.role.as_deref().map(str::trim) {
            None | Some("") => Role::User,
            Some(r) => Role::from_str(r).map_err(|e| AppError::bad_input(e))?,
        };
        if role == Role::Admin && self.policy == RolePolicy::Restricted {
            let caller_is_admin = caller.map(|p| p.role == Role::Admin).unwrap_or(false);
            if !caller_is_admin {
                warn!(role = %role, "self-assigned admin registration refused");
                return Err(AppError::forbidden());
            }
        }

        // Cheap pre-check so duplicates skip the hash; insert re-checks atomically.
        if self.store.find_by_email(&email).is_some() {
            return Err(AppError::duplicate_email());
        }
        let password_hash = security::hash_password(&req.password).context("hashing password")?;
        let user = User {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.to_string(),
            email,
            password_hash,
            role,
        };
        let user = self.store.insert(user)?;
        info!(user_id = %user.id, role = %user.role, "user registered");
        Ok(PublicUser::from(&user))
    }

    /// Exchange email + password for a token. Unknown email and wrong password are
    /// indistinguishable: same error, same status, one hash verification each.
    pub fn login(&self, req: &LoginRequest) -> AppResult<LoginResponse> {
        let Some(user) = self.store.find_by_email(&req.email) else {
            security::verify_dummy(&req.password);
            debug!("login failed");
            return Err(AppError::invalid_credentials());
        };
        if !security::verify_password(&user.password_hash, &req.password) {
            debug!("login failed");
            return Err(AppError::invalid_credentials());
        }
        let token = self.signer.issue(&user.principal(), self.clock.now())?;
        tprintln!("auth.login user={} exp={}", user.id, token.claims.exp);
        info!(user_id = %user.id, role = %user.role, "login succeeded");
        Ok(LoginResponse { user: PublicUser::from(&user), token })
    }

    /// Make sure an admin account exists for `email`. Returns true if one was created.
    pub fn ensure_admin(&self, name: &str, email: &str, password: &str) -> anyhow::Result<bool> {
        if let Some(existing) = self.store.find_by_email(email) {
            if existing.role != Role::Admin {
                warn!(user_id = %existing.id, "bootstrap admin email belongs to a non-admin account");
            }
            return Ok(false);
        }
        let req = RegisterRequest {
            name: name.to_string(),
            email: email.to_string(),
            password: password.to_string(),
            role: Some(Role::Admin.as_str().to_string()),
        };
        let system = Principal { user_id: "bootstrap".into(), role: Role::Admin };
        self.register(&req, Some(&system)).map_err(|e| anyhow::anyhow!("bootstrap admin: {}", e))?;
        Ok(true)
    }
}

#[cfg(test)]
#[path = "provider_tests.rs"]
mod tests;
