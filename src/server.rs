//!
//! redress HTTP server
//! -------------------
//! Axum router for the auth API. One `Authenticator` (credential store, token
//! signer, clock, role policy) is built at startup and shared through `AppState`.
//!
//! Routes:
//! - `POST /api/auth/register` create an account, `201 {id, name, email, role}`.
//! - `POST /api/auth/login` exchange credentials for a token.
//! - `GET  /api/auth/me` decode the caller's token (any role).
//! - `GET  /api/admin` admin-only greeting.
//!
//! Every failure is an `AppError` rendered as `{status, {"message": ..}}`.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRef, Request, State};
use axum::http::{HeaderMap, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use tracing::{info, warn};

use crate::config::ServerConfig;
use crate::error::{AppError, AppResult};
use crate::identity::{
    Authenticated, Authenticator, Clock, LoginRequest, MemoryCredentialStore, PublicUser, RegisterRequest, RequireAdmin,
    Role, SessionGuard, SystemClock, TokenSigner,
};

/// Shared server state injected into all handlers.
#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<Authenticator>,
    pub guard: SessionGuard,
}

impl AppState {
    pub fn new(auth: Arc<Authenticator>) -> Self {
        let guard = SessionGuard::new(auth.clone());
        Self { auth, guard }
    }

    /// Build the store, signer and authenticator described by `cfg`, creating the
    /// bootstrap admin when one is configured.
    pub fn from_config(cfg: &ServerConfig, clock: Arc<dyn Clock>) -> anyhow::Result<Self> {
        let auth = Authenticator::new(
            Arc::new(MemoryCredentialStore::new()),
            TokenSigner::new(cfg.jwt_secret.as_bytes()),
            clock,
            cfg.role_policy,
        );
        if let Some(admin) = &cfg.bootstrap_admin {
            let created = auth
                .ensure_admin("Administrator", &admin.email, &admin.password)
                .context("While creating bootstrap admin")?;
            if created {
                info!(target: "startup", "bootstrap admin account created");
            }
        }
        Ok(Self::new(Arc::new(auth)))
    }
}

impl FromRef<AppState> for SessionGuard {
    fn from_ref(state: &AppState) -> Self { state.guard.clone() }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(|| async { "redress ok" }))
        .route("/api/auth/register", post(register))
        .route("/api/auth/login", post(login))
        .route("/api/auth/me", get(me))
        .route("/api/admin", get(admin))
        .layer(middleware::from_fn(contain_panics))
        .with_state(state)
}

/// Each request runs on its own task; a panic there is answered with a 500.
async fn contain_panics(req: Request, next: Next) -> Response {
    match tokio::spawn(next.run(req)).await {
        Ok(resp) => resp,
        Err(e) => AppError::server_error(e).into_response(),
    }
}

/// Start the HTTP server described by `cfg` and serve until Ctrl-C.
pub async fn run(cfg: ServerConfig) -> anyhow::Result<()> {
    info!(
        target: "startup",
        "redress starting: addr={}, role_policy={:?}, bootstrap_admin={}",
        cfg.addr(), cfg.role_policy, cfg.bootstrap_admin.is_some()
    );
    let state = AppState::from_config(&cfg, Arc::new(SystemClock))?;
    let addr: SocketAddr = cfg.addr();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Starting server on {}", addr);
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("failed to listen for ctrl-c: {}", e);
        std::future::pending::<()>().await;
    }
}

fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> AppResult<T> {
    payload.map(|Json(v)| v).map_err(|rej| AppError::bad_input(rej.body_text()))
}

async fn register(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> AppResult<(StatusCode, Json<PublicUser>)> {
    let req = json_body(payload)?;
    // A bad or absent token just means an anonymous caller here.
    let caller = state.guard.identify(&headers).ok().flatten().map(|c| c.principal());
    let auth = state.auth.clone();
    let user = tokio::task::spawn_blocking(move || auth.register(&req, caller.as_ref()))
        .await
        .map_err(AppError::server_error)??;
    Ok((StatusCode::CREATED, Json(user)))
}

#[derive(Debug, Serialize)]
struct LoginBody {
    #[serde(flatten)]
    user: PublicUser,
    token: String,
}

async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> AppResult<Json<LoginBody>> {
    let req = json_body(payload)?;
    let auth = state.auth.clone();
    let resp = tokio::task::spawn_blocking(move || auth.login(&req))
        .await
        .map_err(AppError::server_error)??;
    Ok(Json(LoginBody { user: resp.user, token: resp.token.token }))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct MeBody {
    id: String,
    role: Role,
    issued_at: i64,
    expires_at: i64,
}

async fn me(Authenticated(claims): Authenticated) -> Json<MeBody> {
    Json(MeBody { id: claims.sub, role: claims.role, issued_at: claims.iat, expires_at: claims.exp })
}

async fn admin(RequireAdmin(claims): RequireAdmin) -> Json<serde_json::Value> {
    info!(user_id = %claims.sub, "admin route served");
    Json(serde_json::json!({ "message": "Welcome, admin!" }))
}
