//! HS256 JWT issuing and verification

use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::error::{Error, ErrorCode, Result};

/// Fallback token lifetime when the expiry string is not understood
const DEFAULT_EXPIRY_SECS: u64 = 3600;

/// Claims carried by gateway access tokens
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// User ID
    pub sub: String,
    pub username: String,
    pub roles: Vec<String>,
    pub permissions: Vec<String>,
    pub iat: i64,
    pub exp: i64,
}

/// Signing and verification keys plus token lifetime
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    expires_in: u64,
}

impl JwtKeys {
    /// # Arguments
    /// * `secret` - Shared HMAC secret
    /// * `expires_in` - Lifetime such as `30s`, `15m`, `1h`, `7d`
    pub fn new(secret: &str, expires_in: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            expires_in: parse_expiration(expires_in),
        }
    }

    /// Token lifetime in seconds
    pub fn expires_in(&self) -> u64 {
        self.expires_in
    }

    /// Claims for a user, valid from now for the configured lifetime
    pub fn claims_for(&self, sub: &str, username: &str, roles: Vec<String>, permissions: Vec<String>) -> Claims {
        let now = Utc::now().timestamp();
        Claims {
            sub: sub.to_string(),
            username: username.to_string(),
            roles,
            permissions,
            iat: now,
            exp: now + self.expires_in as i64,
        }
    }

    pub fn encode(&self, claims: &Claims) -> Result<String> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding)
            .map_err(|e| Error::new(ErrorCode::Unknown, format!("Token encoding failed: {e}")))
    }

    /// Verify signature and expiry
    pub fn decode(&self, token: &str) -> Result<Claims> {
        let validation = Validation::new(Algorithm::HS256);
        decode::<Claims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| Error::unauthorized(format!("Invalid token: {e}")))
    }
}

/// Parse `<n>s|m|h|d` into seconds; anything else is one hour
pub fn parse_expiration(expiration: &str) -> u64 {
    let expiration = expiration.trim();
    let Some(unit) = expiration.chars().last() else {
        return DEFAULT_EXPIRY_SECS;
    };
    let multiplier = match unit {
        's' => 1,
        'm' => 60,
        'h' => 3600,
        'd' => 86_400,
        _ => return DEFAULT_EXPIRY_SECS,
    };
    match expiration[..expiration.len() - 1].parse::<u64>() {
        Ok(value) => value * multiplier,
        Err(_) => DEFAULT_EXPIRY_SECS,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn admin_claims(keys: &JwtKeys) -> Claims {
        keys.claims_for("1", "admin", vec!["admin".into()], vec!["read".into(), "write".into()])
    }

    #[test]
    fn test_parse_expiration() {
        assert_eq!(parse_expiration("30s"), 30);
        assert_eq!(parse_expiration("15m"), 900);
        assert_eq!(parse_expiration("1h"), 3600);
        assert_eq!(parse_expiration("7d"), 604_800);
        assert_eq!(parse_expiration("2w"), 3600);
        assert_eq!(parse_expiration("h"), 3600);
        assert_eq!(parse_expiration(""), 3600);
        assert_eq!(parse_expiration("abc"), 3600);
    }

    #[test]
    fn test_token_round_trip() {
        let keys = JwtKeys::new("secret", "1h");
        let claims = admin_claims(&keys);
        assert_eq!(claims.exp - claims.iat, 3600);

        let token = keys.encode(&claims).unwrap();
        assert_eq!(keys.decode(&token).unwrap(), claims);
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let keys = JwtKeys::new("secret", "1h");
        let token = keys.encode(&admin_claims(&keys)).unwrap();

        let other = JwtKeys::new("other-secret", "1h");
        let err = other.decode(&token).unwrap_err();
        assert_eq!(err.code, ErrorCode::AuthenticationFailed);
    }

    #[test]
    fn test_expired_token_rejected() {
        let keys = JwtKeys::new("secret", "1h");
        let mut claims = admin_claims(&keys);
        claims.iat -= 7200;
        claims.exp -= 7200;
        let token = keys.encode(&claims).unwrap();
        assert!(keys.decode(&token).is_err());
    }

    #[test]
    fn test_garbage_token_rejected() {
        let keys = JwtKeys::new("secret", "1h");
        assert!(keys.decode("not.a.token").is_err());
    }
}
