//! Shared-secret gate for directory mutations.

use sha2::{Digest, Sha256};

use crate::error::AuthError;

fn digest(secret: &str) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(secret.as_bytes());
    hasher.finalize().into()
}

/// Compare SHA-256 digests of the configured and supplied secrets. No
/// configured secret means every mutation is refused.
pub fn verify_secret(expected: Option<&str>, supplied: &str) -> Result<(), AuthError> {
    let Some(expected) = expected else {
        return Err(AuthError);
    };
    if digest(expected) == digest(supplied) {
        Ok(())
    } else {
        Err(AuthError)
    }
}
