//! HTTP client for the real auth server. A successful login is mirrored into
//! the session cache; the cached token is sent on every later call.

use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Response, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use super::local_store::LocalStoreError;
use super::session::SessionCache;
use crate::identity::{PublicUser, Role, AUTH_HEADER};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },
    #[error("invalid base URL: {0}")]
    BadUrl(String),
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error(transparent)]
    Storage(#[from] LocalStoreError),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggedIn {
    #[serde(flatten)]
    pub user: PublicUser,
    pub token: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenIdentity {
    pub id: String,
    pub role: Role,
    pub issued_at: i64,
    pub expires_at: i64,
}

#[derive(Debug, Deserialize)]
struct MessageBody {
    message: String,
}

#[derive(Serialize)]
struct RegisterBody<'a> {
    name: &'a str,
    email: &'a str,
    password: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<Role>,
}

#[derive(Clone)]
pub struct ApiClient {
    base: Url,
    http: reqwest::Client,
    cache: SessionCache,
}

impl ApiClient {
    pub fn new(base: &str, cache: SessionCache) -> Result<Self, ApiError> {
        let base = Url::parse(base).map_err(|e| ApiError::BadUrl(e.to_string()))?;
        Ok(Self { base, http: reqwest::Client::new(), cache })
    }

    pub fn session(&self) -> &SessionCache { &self.cache }

    fn url(&self, path: &str) -> Result<Url, ApiError> {
        self.base.join(path).map_err(|e| ApiError::BadUrl(e.to_string()))
    }

    fn auth_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Some(token) = self.cache.token() {
            if let Ok(v) = HeaderValue::from_str(&token) {
                headers.insert(AUTH_HEADER, v);
            }
        }
        headers
    }

    async fn decode<T: DeserializeOwned>(resp: Response) -> Result<T, ApiError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp.json::<T>().await?);
        }
        let message = match resp.json::<MessageBody>().await {
            Ok(body) => body.message,
            Err(_) => status.canonical_reason().unwrap_or("request failed").to_string(),
        };
        debug!(status = status.as_u16(), %message, "api call failed");
        Err(ApiError::Status { status: status.as_u16(), message })
    }

    /// `role` is only honoured for `admin` when the cached token belongs to an admin,
    /// unless the server runs with the open role policy.
    pub async fn register(&self, name: &str, email: &str, password: &str, role: Option<Role>) -> Result<PublicUser, ApiError> {
        let resp = self
            .http
            .post(self.url("/api/auth/register")?)
            .headers(self.auth_headers())
            .json(&RegisterBody { name, email, password, role })
            .send()
            .await?;
        Self::decode(resp).await
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<LoggedIn, ApiError> {
        let resp = self
            .http
            .post(self.url("/api/auth/login")?)
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await?;
        let logged_in: LoggedIn = Self::decode(resp).await?;
        self.cache.login(Some(&logged_in.user), &logged_in.token, logged_in.user.role)?;
        Ok(logged_in)
    }

    pub async fn me(&self) -> Result<TokenIdentity, ApiError> {
        let resp = self.http.get(self.url("/api/auth/me")?).headers(self.auth_headers()).send().await?;
        Self::decode(resp).await
    }

    /// Returns the server's greeting message.
    pub async fn admin(&self) -> Result<String, ApiError> {
        let resp = self.http.get(self.url("/api/admin")?).headers(self.auth_headers()).send().await?;
        let body: MessageBody = Self::decode(resp).await?;
        Ok(body.message)
    }

    /// Local only: tokens are stateless, so there is nothing to tell the server.
    pub fn logout(&self) -> Result<(), ApiError> {
        self.cache.logout()?;
        Ok(())
    }
}
