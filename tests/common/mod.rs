#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use chrono::{TimeZone, Utc};
use serde_json::Value;
use tower::ServiceExt;

use redress::config::{BootstrapAdmin, ServerConfig};
use redress::identity::{ManualClock, RolePolicy, AUTH_HEADER};
use redress::server::{router, AppState};

pub const ADMIN_EMAIL: &str = "root@desk.test";
pub const ADMIN_PASSWORD: &str = "root-pw";

pub fn config(policy: RolePolicy) -> ServerConfig {
    ServerConfig {
        jwt_secret: "integration-secret".into(),
        bind: [127, 0, 0, 1].into(),
        port: 0,
        role_policy: policy,
        bootstrap_admin: Some(BootstrapAdmin { email: ADMIN_EMAIL.into(), password: ADMIN_PASSWORD.into() }),
    }
}

pub fn app_with_clock(policy: RolePolicy) -> (Router, ManualClock) {
    let clock = ManualClock::new(Utc.with_ymd_and_hms(2026, 5, 1, 8, 0, 0).unwrap());
    let state = AppState::from_config(&config(policy), Arc::new(clock.clone())).expect("state");
    (router(state), clock)
}

pub fn app() -> Router { app_with_clock(RolePolicy::Restricted).0 }

pub async fn send(app: &Router, method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
    let mut req = Request::builder().method(method).uri(uri);
    if let Some(t) = token {
        req = req.header(AUTH_HEADER, t);
    }
    let req = match body {
        Some(v) => req.header("content-type", "application/json").body(Body::from(v.to_string())),
        None => req.body(Body::empty()),
    }
    .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

pub async fn login_token(app: &Router, email: &str, password: &str) -> String {
    let (status, body) = send(app, "POST", "/api/auth/login", None, Some(serde_json::json!({"email": email, "password": password}))).await;
    assert_eq!(status, StatusCode::OK, "login failed: {}", body);
    body["token"].as_str().unwrap().to_string()
}
