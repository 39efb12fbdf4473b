use argon2::password_hash::{rand_core::OsRng, SaltString};
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};

/// Mints a per-user salt at registration time. Stored next to the digest.
pub fn generate_salt() -> String {
    SaltString::generate(&mut OsRng).as_str().to_string()
}

/// Derives a salted Argon2id digest in PHC string form. A salt that does not
/// parse is a hard error, never an empty or degenerate digest.
pub fn hash_password(password: &str, salt: &str) -> anyhow::Result<String> {
    let salt = SaltString::from_b64(salt)
        .map_err(|e| anyhow::anyhow!("malformed password salt: {}", e))?;
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("password hashing failed: {}", e))?;
    Ok(hash.to_string())
}

/// Checks a password against a stored digest.
///
/// Returns `Ok(false)` only for a genuine mismatch; the comparison inside
/// `verify_password` is constant-time. An unparseable stored digest is an
/// `Err` so callers can tell data corruption apart from a wrong password.
pub fn verify_password(password: &str, expected: &str) -> anyhow::Result<bool> {
    let parsed = PasswordHash::new(expected)
        .map_err(|e| anyhow::anyhow!("stored password digest unparseable: {}", e))?;
    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(anyhow::anyhow!("password verification failed: {}", e)),
    }
}
