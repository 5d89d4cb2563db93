use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use super::AuthError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id.
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

/// Issues and verifies HS256 bearer tokens with a fixed lifetime.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl TokenIssuer {
    pub fn new(secret: &str, ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        }
    }

    pub fn issue(&self, user_id: &str) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AuthError::Signing(e.to_string()))
    }

    /// Any malformed, forged or expired token is `NotAuthorized`.
    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        decode::<Claims>(token, &self.decoding, &Validation::new(Algorithm::HS256))
            .map(|data| data.claims)
            .map_err(|_| AuthError::NotAuthorized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issued_token_verifies() {
        let issuer = TokenIssuer::new("test-secret", Duration::days(7));
        let token = issuer.issue("user_1").unwrap();
        let claims = issuer.verify(&token).unwrap();
        assert_eq!(claims.sub, "user_1");
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_foreign_and_expired_tokens_are_rejected() {
        let issuer = TokenIssuer::new("test-secret", Duration::days(7));
        let other = TokenIssuer::new("other-secret", Duration::days(7));
        let token = other.issue("user_1").unwrap();
        assert_eq!(issuer.verify(&token).unwrap_err(), AuthError::NotAuthorized);

        // Past the default 60s validation leeway.
        let expired = TokenIssuer::new("test-secret", Duration::minutes(-5));
        let token = expired.issue("user_1").unwrap();
        assert_eq!(issuer.verify(&token).unwrap_err(), AuthError::NotAuthorized);
    }
}
