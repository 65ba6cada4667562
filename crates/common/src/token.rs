use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use base64::{Engine as _, engine::general_purpose::URL_SAFE};
use rand::RngCore;
use rand::rng;
use uuid::Uuid;

const UUID_LEN: usize = Uuid::from_u128(0).as_bytes().len();
const SECRET_LEN: usize = 48;
const MIN_SECRET_LEN: usize = 16;

/// A freshly minted auth key. `token` is shown to the operator once; only
/// `token_hash` is persisted.
#[derive(Debug, Clone)]
pub struct GeneratedToken {
    pub token_id: Uuid,
    pub token: String,
    pub token_hash: String,
}

#[derive(Debug, PartialEq, Eq)]
pub enum TokenError {
    Malformed,
    Hashing,
}

impl std::fmt::Display for TokenError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenError::Malformed => write!(f, "malformed auth key"),
            TokenError::Hashing => write!(f, "failed to hash auth key"),
        }
    }
}

impl std::error::Error for TokenError {}

pub fn hash_secret(secret: &[u8]) -> Result<String, TokenError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(secret, &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| TokenError::Hashing)
}

/// Token layout: base64url(token id bytes || random secret).
pub fn generate_api_token() -> Result<GeneratedToken, TokenError> {
    let token_id = Uuid::new_v4();

    let mut secret = [0u8; SECRET_LEN];
    rng().fill_bytes(&mut secret);

    let mut raw = Vec::with_capacity(UUID_LEN + SECRET_LEN);
    raw.extend_from_slice(token_id.as_bytes());
    raw.extend_from_slice(&secret);

    Ok(GeneratedToken {
        token_id,
        token: URL_SAFE.encode(&raw),
        token_hash: hash_secret(&secret)?,
    })
}

pub fn decode_api_token(token: &str) -> Result<(Uuid, Vec<u8>), TokenError> {
    let raw = URL_SAFE.decode(token).map_err(|_| TokenError::Malformed)?;

    if raw.len() < UUID_LEN + MIN_SECRET_LEN {
        return Err(TokenError::Malformed);
    }

    let token_id = Uuid::from_slice(&raw[..UUID_LEN]).map_err(|_| TokenError::Malformed)?;
    Ok((token_id, raw[UUID_LEN..].to_vec()))
}

pub fn verify_api_secret(secret: &[u8], stored_hash: &str) -> bool {
    match PasswordHash::new(stored_hash) {
        Ok(parsed) => Argon2::default().verify_password(secret, &parsed).is_ok(),
        Err(_) => false,
    }
}
