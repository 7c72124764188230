//! Authentication primitives: roles, the token service, password hashing.
//!
//! Tokens are compact JWS strings (HS256): a base64url header and claims
//! segment signed with HMAC-SHA256 over `header.claims`. The signing secret
//! is symmetric and loaded once at startup. There is no revocation list;
//! a token stays valid until its embedded expiry.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::error::{Error, Result};

type HmacSha256 = Hmac<Sha256>;

/// Fixed JWS header for all issued tokens.
const TOKEN_HEADER: &str = r#"{"alg":"HS256","typ":"JWT"}"#;

/// User role, compared by exact equality for access checks.
///
/// There is no hierarchy: `Admin` does not implicitly satisfy a `Staff`
/// requirement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Staff,
    Auditor,
    Guest,
}

impl Role {
    /// The wire/storage representation of the role.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Staff => "staff",
            Role::Auditor => "auditor",
            Role::Guest => "guest",
        }
    }

    /// Parse a role from its storage representation.
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "admin" => Ok(Role::Admin),
            "staff" => Ok(Role::Staff),
            "auditor" => Ok(Role::Auditor),
            "guest" => Ok(Role::Guest),
            other => Err(Error::Validation(format!("unknown role: {}", other))),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Role::parse(s)
    }
}

/// Claims embedded in an issued token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Id of the authenticated user.
    pub user_id: i64,
    /// Role at issue time. Access checks re-resolve the live user record,
    /// so a role change takes effect on the next request, not at expiry.
    pub role: Role,
    /// Absolute expiry as a unix timestamp (seconds).
    pub exp: i64,
}

/// Issues and verifies signed, time-limited credentials.
#[derive(Clone)]
pub struct TokenService {
    secret: Vec<u8>,
    ttl_secs: i64,
}

impl TokenService {
    /// Create a token service with the given symmetric secret and TTL.
    pub fn new(secret: impl Into<Vec<u8>>, ttl_secs: i64) -> Self {
        Self {
            secret: secret.into(),
            ttl_secs,
        }
    }

    /// Issue a token for `user_id` expiring `ttl_secs` from now.
    pub fn issue(&self, user_id: i64, role: Role) -> Result<String> {
        self.issue_at(user_id, role, Utc::now())
    }

    /// Issue a token with an explicit clock (test seam).
    pub fn issue_at(&self, user_id: i64, role: Role, now: DateTime<Utc>) -> Result<String> {
        let claims = Claims {
            user_id,
            role,
            exp: now.timestamp() + self.ttl_secs,
        };
        let header = URL_SAFE_NO_PAD.encode(TOKEN_HEADER);
        let payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&claims)?);
        let signature = self.sign(&header, &payload)?;
        Ok(format!("{}.{}.{}", header, payload, signature))
    }

    /// Verify a token against the current clock.
    pub fn verify(&self, token: &str) -> Result<Claims> {
        self.verify_at(token, Utc::now())
    }

    /// Verify a token with an explicit clock (test seam).
    ///
    /// Fails with `Unauthorized` on a bad signature, malformed payload,
    /// or an expiry at or before `now`.
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<Claims> {
        let mut parts = token.split('.');
        let (header, payload, signature) = match (parts.next(), parts.next(), parts.next()) {
            (Some(h), Some(p), Some(s)) if parts.next().is_none() => (h, p, s),
            _ => return Err(Error::Unauthorized("malformed token".into())),
        };

        let mut mac = self.mac()?;
        mac.update(header.as_bytes());
        mac.update(b".");
        mac.update(payload.as_bytes());
        let given = URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|_| Error::Unauthorized("malformed token signature".into()))?;
        mac.verify_slice(&given)
            .map_err(|_| Error::Unauthorized("invalid token signature".into()))?;

        let claims_bytes = URL_SAFE_NO_PAD
            .decode(payload)
            .map_err(|_| Error::Unauthorized("malformed token payload".into()))?;
        let claims: Claims = serde_json::from_slice(&claims_bytes)
            .map_err(|_| Error::Unauthorized("malformed token payload".into()))?;

        if claims.exp <= now.timestamp() {
            return Err(Error::Unauthorized("token expired".into()));
        }

        Ok(claims)
    }

    fn sign(&self, header: &str, payload: &str) -> Result<String> {
        let mut mac = self.mac()?;
        mac.update(header.as_bytes());
        mac.update(b".");
        mac.update(payload.as_bytes());
        Ok(URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes()))
    }

    fn mac(&self) -> Result<HmacSha256> {
        HmacSha256::new_from_slice(&self.secret)
            .map_err(|_| Error::Config("empty token secret".into()))
    }
}

/// Hash a password with Argon2id and a random salt.
pub fn hash_password(password: &str) -> Result<String> {
    use argon2::password_hash::{rand_core::OsRng, PasswordHasher, SaltString};

    let salt = SaltString::generate(&mut OsRng);
    argon2::Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| Error::Internal(format!("password hashing failed: {}", e)))
}

/// Verify a password against a stored Argon2id hash.
///
/// An unparseable stored hash verifies as false rather than erroring, so a
/// corrupt credential row reads as a failed login.
pub fn verify_password(password: &str, stored: &str) -> bool {
    use argon2::password_hash::{PasswordHash, PasswordVerifier};

    PasswordHash::new(stored)
        .map(|parsed| {
            argon2::Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn service() -> TokenService {
        TokenService::new("test-secret", 86400)
    }

    #[test]
    fn test_issue_and_verify_round_trip() {
        let svc = service();
        let token = svc.issue(42, Role::Staff).unwrap();
        let claims = svc.verify(&token).unwrap();
        assert_eq!(claims.user_id, 42);
        assert_eq!(claims.role, Role::Staff);
    }

    #[test]
    fn test_verify_just_before_expiry() {
        let svc = service();
        let issued = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let token = svc.issue_at(1, Role::Admin, issued).unwrap();

        let almost = issued + chrono::Duration::seconds(86399);
        assert!(svc.verify_at(&token, almost).is_ok());
    }

    #[test]
    fn test_verify_after_expiry() {
        let svc = service();
        let issued = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let token = svc.issue_at(1, Role::Admin, issued).unwrap();

        let late = issued + chrono::Duration::seconds(86401);
        match svc.verify_at(&token, late) {
            Err(Error::Unauthorized(msg)) => assert!(msg.contains("expired")),
            other => panic!("expected expiry failure, got {:?}", other.map(|c| c.exp)),
        }
    }

    #[test]
    fn test_verify_rejects_tampered_payload() {
        let svc = service();
        let token = svc.issue(7, Role::Guest).unwrap();

        let mut parts: Vec<&str> = token.split('.').collect();
        let forged =
            URL_SAFE_NO_PAD.encode(r#"{"user_id":7,"role":"admin","exp":9999999999}"#);
        parts[1] = &forged;
        let tampered = parts.join(".");

        assert!(matches!(
            svc.verify(&tampered),
            Err(Error::Unauthorized(_))
        ));
    }

    #[test]
    fn test_verify_rejects_wrong_secret() {
        let token = service().issue(7, Role::Guest).unwrap();
        let other = TokenService::new("another-secret", 86400);
        assert!(matches!(other.verify(&token), Err(Error::Unauthorized(_))));
    }

    #[test]
    fn test_verify_rejects_garbage() {
        let svc = service();
        for garbage in ["", "abc", "a.b", "a.b.c.d", "not a token at all"] {
            assert!(svc.verify(garbage).is_err(), "accepted {:?}", garbage);
        }
    }

    #[test]
    fn test_role_parse_round_trip() {
        for role in [Role::Admin, Role::Staff, Role::Auditor, Role::Guest] {
            assert_eq!(Role::parse(role.as_str()).unwrap(), role);
        }
        assert!(Role::parse("superuser").is_err());
    }

    #[test]
    fn test_role_no_hierarchy() {
        assert_ne!(Role::Admin, Role::Staff);
    }

    #[test]
    fn test_password_hash_and_verify() {
        let hash = hash_password("pw123").unwrap();
        assert!(verify_password("pw123", &hash));
        assert!(!verify_password("pw124", &hash));
    }

    #[test]
    fn test_verify_password_with_bad_hash() {
        assert!(!verify_password("pw123", "not-a-phc-string"));
    }

    #[test]
    fn test_hashes_are_salted() {
        let a = hash_password("pw123").unwrap();
        let b = hash_password("pw123").unwrap();
        assert_ne!(a, b);
    }
}
