//! Credential hashing with Argon2id.
//!
//! Parameters follow the OWASP ASVS recommendation (memory: 19 MiB,
//! iterations: 2, parallelism: 1). The salt is randomly generated per
//! hash. An optional pepper (server-side secret) is prepended to the
//! password before hashing and must match at verification time.

use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHasher, PasswordVerifier};
use palisade_core::error::{PalisadeError, PalisadeResult};

fn peppered<'a>(password: &'a str, pepper: Option<&str>, buf: &'a mut String) -> &'a [u8] {
    match pepper {
        Some(p) => {
            buf.push_str(p);
            buf.push_str(password);
            buf.as_bytes()
        }
        None => password.as_bytes(),
    }
}

/// Hash a plaintext credential; failures surface as `internal`.
pub fn hash_password(password: &str, pepper: Option<&str>) -> PalisadeResult<String> {
    let params = argon2::Params::new(19456, 2, 1, None).map_err(|e| PalisadeError::Internal {
        detail: format!("argon2 params error: {e}"),
    })?;
    let argon2 = Argon2::new(argon2::Algorithm::Argon2id, argon2::Version::V0x13, params);

    let mut buf = String::new();
    let input = peppered(password, pepper, &mut buf);

    let salt = SaltString::generate(&mut argon2::password_hash::rand_core::OsRng);
    let hash = argon2
        .hash_password(input, &salt)
        .map_err(|e| PalisadeError::Internal {
            detail: format!("password hash error: {e}"),
        })?;

    Ok(hash.to_string())
}

/// Verify a plaintext credential against a PHC-format hash.
///
/// Returns `Ok(true)` on match, `Ok(false)` on mismatch, or an
/// `internal` error if the stored hash is malformed.
pub fn verify_password(password: &str, hash: &str, pepper: Option<&str>) -> PalisadeResult<bool> {
    let mut buf = String::new();
    let input = peppered(password, pepper, &mut buf);

    let parsed_hash = argon2::PasswordHash::new(hash).map_err(|e| PalisadeError::Internal {
        detail: format!("invalid hash format: {e}"),
    })?;

    let argon2 = Argon2::default();
    match argon2.verify_password(input, &parsed_hash) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(PalisadeError::Internal {
            detail: format!("verify error: {e}"),
        }),
    }
}
