use argon2::{Algorithm, Argon2, Params, Version};
use base64::Engine;
use base64::engine::general_purpose::{STANDARD_NO_PAD, URL_SAFE_NO_PAD};
use rand::RngCore;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use crate::error::{Error, Result};

/// Salt length in bytes, before encoding.
pub const SALT_BYTES: usize = 16;

const DIGEST_BYTES: usize = 32;

/// Deterministic password digest: same password and salt, same output.
pub trait CredentialHasher: Send + Sync {
    fn hash(&self, password: &str, salt: &str) -> Result<String>;
}

/// Argon2id in raw mode. The salt is stored next to the digest rather than
/// inside a PHC string.
pub struct Argon2Hasher {
    argon2: Argon2<'static>,
}

impl Argon2Hasher {
    pub fn new(params: Params) -> Self {
        Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        }
    }
}

impl Default for Argon2Hasher {
    fn default() -> Self {
        Self::new(Params::default())
    }
}

impl CredentialHasher for Argon2Hasher {
    fn hash(&self, password: &str, salt: &str) -> Result<String> {
        let mut out = [0u8; DIGEST_BYTES];
        self.argon2
            .hash_password_into(password.as_bytes(), salt.as_bytes(), &mut out)
            .map_err(|e| Error::Hashing(e.to_string()))?;
        Ok(STANDARD_NO_PAD.encode(out))
    }
}

/// `n` bytes from the thread-local CSPRNG, URL/cookie-safe base64.
pub fn random_token(n: usize) -> String {
    let mut buf = vec![0u8; n];
    rand::rng().fill_bytes(&mut buf);
    URL_SAFE_NO_PAD.encode(buf)
}

/// Session tokens are stored hashed; a leaked sessions table cannot be replayed.
pub fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

pub fn digests_match(a: &str, b: &str) -> bool {
    a.as_bytes().ct_eq(b.as_bytes()).into()
}
