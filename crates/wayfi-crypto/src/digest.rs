//! Token digests for storage lookups.

use sha2::{Digest, Sha256};

/// Hash a provisioning token for storage (raw tokens are never persisted).
pub fn token_digest(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}
