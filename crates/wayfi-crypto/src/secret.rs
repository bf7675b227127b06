//! Secret and token generation.
//!
//! Characters are drawn from `[A-Za-z0-9]` by rejection sampling over bytes
//! read from [`OsRng`], so every character is uniformly distributed
//! (~5.95 bits each).

use rand::RngCore;
use rand::rngs::OsRng;

use crate::error::CryptoError;

/// Shortest secret the generator will produce.
pub const MIN_SECRET_LENGTH: usize = 16;

/// Length of a provisioning token string (~190 bits).
pub const TOKEN_LENGTH: usize = 32;

const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// Largest multiple of the charset size that fits in a byte; bytes at or
/// above it are rejected to avoid modulo bias.
#[allow(clippy::cast_possible_truncation)]
const ACCEPT_BELOW: u8 = (256 - 256 % CHARSET.len()) as u8;

/// Generate a WiFi credential secret of `len` characters.
///
/// Fails with [`CryptoError::SecretTooShort`] below [`MIN_SECRET_LENGTH`] and
/// with [`CryptoError::RandomUnavailable`] if the OS source errors.
pub fn generate_secret(len: usize) -> Result<String, CryptoError> {
    if len < MIN_SECRET_LENGTH {
        return Err(CryptoError::SecretTooShort {
            minimum: MIN_SECRET_LENGTH,
            requested: len,
        });
    }
    alphanumeric_from(&mut OsRng, len)
}

/// Generate an opaque provisioning token.
pub fn generate_token() -> Result<String, CryptoError> {
    alphanumeric_from(&mut OsRng, TOKEN_LENGTH)
}

/// Whether `token` has the shape produced by [`generate_token`].
///
/// Used to reject junk before it reaches storage or a URL.
pub fn is_well_formed_token(token: &str) -> bool {
    token.len() == TOKEN_LENGTH && token.bytes().all(|b| b.is_ascii_alphanumeric())
}

fn alphanumeric_from<R: RngCore>(rng: &mut R, len: usize) -> Result<String, CryptoError> {
    let mut out = String::with_capacity(len);
    let mut buf = [0u8; 64];
    while out.len() < len {
        rng.try_fill_bytes(&mut buf)
            .map_err(|e| CryptoError::RandomUnavailable(e.to_string()))?;
        for &b in &buf {
            if b >= ACCEPT_BELOW {
                continue;
            }
            out.push(char::from(CHARSET[usize::from(b) % CHARSET.len()]));
            if out.len() == len {
                break;
            }
        }
    }
    Ok(out)
}
