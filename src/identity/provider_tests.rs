use super::*;
use crate::error::codes;
use crate::identity::{ManualClock, MemoryCredentialStore};
use chrono::{Duration, TimeZone, Utc};

fn setup(policy: RolePolicy) -> (Authenticator, ManualClock) {
    let clock = ManualClock::new(Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap());
    let auth = Authenticator::new(
        Arc::new(MemoryCredentialStore::new()),
        TokenSigner::new(b"test-secret"),
        Arc::new(clock.clone()),
        policy,
    );
    (auth, clock)
}

fn reg(name: &str, email: &str, password: &str, role: Option<&str>) -> RegisterRequest {
    RegisterRequest { name: name.into(), email: email.into(), password: password.into(), role: role.map(Into::into) }
}

fn login(email: &str, password: &str) -> LoginRequest {
    LoginRequest { email: email.into(), password: password.into() }
}

#[test]
fn register_then_login_round_trip() {
    let (auth, _) = setup(RolePolicy::Restricted);
    let created = auth.register(&reg("Ann", "ann@x.com", "p1", None), None).unwrap();
    assert_eq!(created.role, Role::User);

    let resp = auth.login(&login("ann@x.com", "p1")).unwrap();
    assert_eq!(resp.user, created);
    assert_eq!(resp.token.claims.sub, created.id);
    assert_eq!(resp.token.claims.role, Role::User);
}

#[test]
fn stored_hash_is_not_plaintext() {
    let (auth, _) = setup(RolePolicy::Restricted);
    auth.register(&reg("Ann", "ann@x.com", "p1", None), None).unwrap();
    let stored = auth.store().find_by_email("ann@x.com").unwrap();
    assert_ne!(stored.password_hash, "p1");
    assert!(security::verify_password(&stored.password_hash, "p1"));
}

#[test]
fn duplicate_email_fails() {
    let (auth, _) = setup(RolePolicy::Restricted);
    auth.register(&reg("Ann", "ann@x.com", "p1", None), None).unwrap();
    let err = auth.register(&reg("Other Ann", "ANN@x.com", "p2", None), None).unwrap_err();
    assert_eq!(err.code_str(), codes::DUPLICATE_EMAIL);
    assert_eq!(err.http_status(), 400);
}

#[test]
fn wrong_password_and_unknown_email_are_identical() {
    let (auth, _) = setup(RolePolicy::Restricted);
    auth.register(&reg("A", "a@x.com", "right", None), None).unwrap();
    let wrong = auth.login(&login("a@x.com", "wrong")).unwrap_err();
    let unknown = auth.login(&login("nouser@x.com", "anything")).unwrap_err();
    assert_eq!(wrong, unknown);
    assert_eq!(wrong.code_str(), codes::INVALID_CREDENTIALS);
}

#[test]
fn token_accepted_inside_window_rejected_after() {
    let (auth, clock) = setup(RolePolicy::Restricted);
    auth.register(&reg("A", "a@x.com", "pw", None), None).unwrap();
    let resp = auth.login(&login("a@x.com", "pw")).unwrap();

    clock.advance(Duration::minutes(59));
    assert!(auth.verify_token(&resp.token.token).is_ok());
    clock.advance(Duration::minutes(2));
    assert!(matches!(auth.verify_token(&resp.token.token), Err(TokenError::Expired)));
}

#[test]
fn missing_fields_are_bad_input() {
    let (auth, _) = setup(RolePolicy::Restricted);
    for r in [reg("", "a@x.com", "pw", None), reg("A", "  ", "pw", None), reg("A", "a@x.com", "", None)] {
        let err = auth.register(&r, None).unwrap_err();
        assert_eq!(err.code_str(), codes::BAD_INPUT);
    }
    assert!(auth.store().is_empty());
}

#[test]
fn unknown_role_is_bad_input() {
    let (auth, _) = setup(RolePolicy::Open);
    let err = auth.register(&reg("A", "a@x.com", "pw", Some("superuser")), None).unwrap_err();
    assert_eq!(err.http_status(), 400);
}

#[test]
fn restricted_policy_refuses_self_assigned_admin() {
    let (auth, _) = setup(RolePolicy::Restricted);
    let err = auth.register(&reg("Eve", "eve@x.com", "pw", Some("admin")), None).unwrap_err();
    assert_eq!(err.http_status(), 403);

    let user = Principal { user_id: "u".into(), role: Role::User };
    assert!(auth.register(&reg("Eve", "eve@x.com", "pw", Some("admin")), Some(&user)).is_err());

    let admin = Principal { user_id: "root".into(), role: Role::Admin };
    let created = auth.register(&reg("Bob", "bob@x.com", "pw", Some("admin")), Some(&admin)).unwrap();
    assert_eq!(created.role, Role::Admin);
}

#[test]
fn open_policy_accepts_self_assigned_admin() {
    let (auth, _) = setup(RolePolicy::Open);
    let created = auth.register(&reg("Eve", "eve@x.com", "pw", Some("admin")), None).unwrap();
    assert_eq!(created.role, Role::Admin);
}

#[test]
fn ensure_admin_is_idempotent() {
    let (auth, _) = setup(RolePolicy::Restricted);
    assert!(auth.ensure_admin("Admin", "root@x.com", "pw").unwrap());
    assert!(!auth.ensure_admin("Admin", "root@x.com", "pw").unwrap());
    let resp = auth.login(&login("root@x.com", "pw")).unwrap();
    assert_eq!(resp.user.role, Role::Admin);
}

#[test]
fn role_policy_parse() {
    assert_eq!("OPEN".parse::<RolePolicy>().unwrap(), RolePolicy::Open);
    assert_eq!(" restricted ".parse::<RolePolicy>().unwrap(), RolePolicy::Restricted);
    assert!("maybe".parse::<RolePolicy>().is_err());
}
