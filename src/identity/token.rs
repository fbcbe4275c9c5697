//! Stateless bearer tokens: HS256 JWTs carrying `{sub, role, iat, exp}`.
//!
//! Expiry is checked here against an explicit `now` rather than inside
//! `jsonwebtoken`, so the validity window is exact (no leeway) and tests can
//! drive time through a [`Clock`](super::Clock). A token is valid while
//! `now < exp`; `exp` is always `iat + ttl`.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::principal::{Principal, Role};

pub const TOKEN_TTL: Duration = Duration::hours(1);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn principal(&self) -> Principal {
        Principal { user_id: self.sub.clone(), role: self.role }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    pub token: String,
    pub claims: Claims,
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("token expired")]
    Expired,
    #[error("token rejected: {0}")]
    Invalid(String),
    #[error("token signing failed: {0}")]
    Signing(String),
}

#[derive(Clone)]
pub struct TokenSigner {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl std::fmt::Debug for TokenSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenSigner").field("ttl_secs", &self.ttl.num_seconds()).finish_non_exhaustive()
    }
}

impl TokenSigner {
    pub fn new(secret: &[u8]) -> Self { Self::with_ttl(secret, TOKEN_TTL) }

    pub fn with_ttl(secret: &[u8], ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration { self.ttl }

    pub fn issue(&self, principal: &Principal, now: DateTime<Utc>) -> Result<IssuedToken, TokenError> {
        let iat = now.timestamp();
        let claims = Claims {
            sub: principal.user_id.clone(),
            role: principal.role,
            iat,
            exp: iat + self.ttl.num_seconds(),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| TokenError::Signing(e.to_string()))?;
        Ok(IssuedToken { token, claims })
    }

    pub fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, TokenError> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation)
            .map_err(|e| TokenError::Invalid(e.to_string()))?;
        if now.timestamp() >= data.claims.exp {
            return Err(TokenError::Expired);
        }
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> { Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap() }

    fn ann() -> Principal { Principal { user_id: "u-1".into(), role: Role::User } }

    #[test]
    fn window_is_exactly_one_hour() {
        let s = TokenSigner::new(b"secret");
        let issued = s.issue(&ann(), t0()).unwrap();
        assert_eq!(issued.claims.exp - issued.claims.iat, 3600);

        assert!(s.verify(&issued.token, t0() + Duration::minutes(59)).is_ok());
        assert!(s.verify(&issued.token, t0() + Duration::seconds(3599)).is_ok());
        assert!(matches!(s.verify(&issued.token, t0() + Duration::hours(1)), Err(TokenError::Expired)));
        assert!(matches!(s.verify(&issued.token, t0() + Duration::minutes(61)), Err(TokenError::Expired)));
    }

    #[test]
    fn claims_round_trip_identity() {
        let s = TokenSigner::new(b"secret");
        let p = Principal { user_id: "u-9".into(), role: Role::Admin };
        let issued = s.issue(&p, t0()).unwrap();
        let claims = s.verify(&issued.token, t0()).unwrap();
        assert_eq!(claims.principal(), p);
        assert_eq!(claims, issued.claims);
    }

    #[test]
    fn other_secret_rejected() {
        let issued = TokenSigner::new(b"one").issue(&ann(), t0()).unwrap();
        let err = TokenSigner::new(b"two").verify(&issued.token, t0()).unwrap_err();
        assert!(matches!(err, TokenError::Invalid(_)));
    }

    #[test]
    fn tampered_payload_rejected() {
        let s = TokenSigner::new(b"secret");
        let issued = s.issue(&ann(), t0()).unwrap();
        let mut parts: Vec<String> = issued.token.split('.').map(str::to_string).collect();
        // flip one character of the payload segment
        let mut payload: Vec<char> = parts[1].chars().collect();
        payload[3] = if payload[3] == 'A' { 'B' } else { 'A' };
        parts[1] = payload.into_iter().collect();
        let forged = parts.join(".");
        assert!(matches!(s.verify(&forged, t0()), Err(TokenError::Invalid(_))));
        assert!(matches!(s.verify("not.a.jwt", t0()), Err(TokenError::Invalid(_))));
        assert!(matches!(s.verify("", t0()), Err(TokenError::Invalid(_))));
    }
}
