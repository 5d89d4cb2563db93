use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use sha2::{Digest, Sha256};

/// How long a reset link stays valid.
pub const RESET_TOKEN_TTL_MINUTES: i64 = 30;

/// A freshly issued reset token. Only `token_hash` is stored; `token` goes
/// into the mailed link.
#[derive(Debug, Clone)]
pub struct ResetToken {
    pub token: String,
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
}

pub fn generate_reset_token(now: DateTime<Utc>) -> ResetToken {
    let mut bytes = [0u8; 20];
    rand::thread_rng().fill_bytes(&mut bytes);
    let token = hex::encode(bytes);
    ResetToken {
        token_hash: hash_reset_token(&token),
        token,
        expires_at: now + Duration::minutes(RESET_TOKEN_TTL_MINUTES),
    }
}

/// Hex sha256 of the raw token.
pub fn hash_reset_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}
