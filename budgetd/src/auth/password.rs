//! Account password hashing.
//!
//! Hashes are Argon2id PHC strings (`$argon2id$v=19$m=..,t=..,p=..$salt$hash`). The cost is written
//! into every hash, so checking a password never needs to know what cost it was stored with.

use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

use crate::errors::Error;

/// Argon2id work factors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashCost {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl HashCost {
    /// Used for every stored account password: 19 MiB, two passes, one lane.
    pub const STANDARD: Self = Self {
        memory_kib: 19 * 1024,
        iterations: 2,
        parallelism: 1,
    };

    /// The cheapest cost Argon2 accepts. Only fit for fixtures.
    pub const MINIMAL: Self = Self {
        memory_kib: 8,
        iterations: 1,
        parallelism: 1,
    };

    fn argon2(self) -> Result<Argon2<'static>, Error> {
        let params = Params::new(self.memory_kib, self.iterations, self.parallelism, None).map_err(|e| Error::Internal {
            operation: format!("configure argon2 ({self:?}): {e}"),
        })?;
        Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
    }
}

impl Default for HashCost {
    fn default() -> Self {
        Self::STANDARD
    }
}

/// Hash `password` with a fresh salt at `cost`.
pub fn hash_with_cost(password: &str, cost: HashCost) -> Result<String, Error> {
    let salt = SaltString::generate(&mut OsRng);
    let phc = cost.argon2()?.hash_password(password.as_bytes(), &salt).map_err(|e| Error::Internal {
        operation: format!("hash password: {e}"),
    })?;
    Ok(phc.to_string())
}

/// Whether `password` is the one `stored` was made from.
///
/// A wrong password is `Ok(false)`; a stored value that is not a PHC string is an internal error.
pub fn password_matches(password: &str, stored: &str) -> Result<bool, Error> {
    let stored = PasswordHash::new(stored).map_err(|e| Error::Internal {
        operation: format!("read stored password hash: {e}"),
    })?;
    Ok(Argon2::default().verify_password(password.as_bytes(), &stored).is_ok())
}

async fn off_runtime<T, F>(operation: &'static str, work: F) -> Result<T, Error>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, Error> + Send + 'static,
{
    tokio::task::spawn_blocking(work).await.map_err(|e| Error::Internal {
        operation: format!("{operation}: {e}"),
    })?
}

/// Hash a new account password at [`HashCost::STANDARD`] on the blocking pool.
pub async fn hash_password(password: String) -> Result<String, Error> {
    off_runtime("join password hashing task", move || hash_with_cost(&password, HashCost::STANDARD)).await
}

/// [`password_matches`] on the blocking pool.
pub async fn verify_password(password: String, stored: String) -> Result<bool, Error> {
    off_runtime("join password check task", move || password_matches(&password, &stored)).await
}
