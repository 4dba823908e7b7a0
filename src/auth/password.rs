//! Password Hashing
//! Mission: One-way salted hashing for stored credentials

use bcrypt::{hash, verify, BcryptError, DEFAULT_COST};

/// Hashing/verification failures. A malformed stored hash is its own
/// condition so callers can tell corrupt data from a transient failure.
#[derive(Debug)]
pub enum PasswordError {
    FormatoInvalido,
    Interno(BcryptError),
}

impl std::fmt::Display for PasswordError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PasswordError::FormatoInvalido => write!(f, "Stored hash has invalid format"),
            PasswordError::Interno(e) => write!(f, "Hashing failed: {e}"),
        }
    }
}

impl std::error::Error for PasswordError {}

/// Salted one-way hash. Non-deterministic: a fresh salt per call.
pub fn hash_password(plaintext: &str) -> Result<String, PasswordError> {
    hash(plaintext, DEFAULT_COST).map_err(PasswordError::Interno)
}

/// Verify a plaintext against a stored hash. bcrypt's comparison is
/// constant-time over the digest.
pub fn verificar_password(plaintext: &str, hash_almacenado: &str) -> Result<bool, PasswordError> {
    verify(plaintext, hash_almacenado).map_err(|e| match e {
        BcryptError::InvalidHash(_)
        | BcryptError::InvalidPrefix(_)
        | BcryptError::InvalidCost(_)
        | BcryptError::InvalidBase64(_) => PasswordError::FormatoInvalido,
        otro => PasswordError::Interno(otro),
    })
}
