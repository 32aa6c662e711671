//! Password hashing
//!
//! bcrypt digests with a per-call random salt. The work factor comes
//! from configuration so tests can turn it down.

use crate::error::AppError;

/// Hash a plaintext password with the given bcrypt cost.
///
/// # Returns
/// A `$2b$`-prefixed digest embedding the salt and cost
pub fn hash_password(plain: &str, cost: u32) -> Result<String, AppError> {
    bcrypt::hash(plain, cost).map_err(|e| AppError::Encryption(e.to_string()))
}

/// Check a plaintext password against a stored digest.
///
/// A malformed digest is treated as a failed match, not an error.
pub fn verify_password(plain: &str, digest: &str) -> bool {
    bcrypt::verify(plain, digest).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_COST: u32 = 4;

    #[test]
    fn digest_carries_version_marker_and_hides_plaintext() {
        let digest = hash_password("HASHED_PASSWORD", TEST_COST).unwrap();
        assert!(digest.starts_with("$2b$"));
        assert!(!digest.contains("HASHED_PASSWORD"));
    }

    #[test]
    fn same_password_hashes_differently_but_both_verify() {
        let first = hash_password("password", TEST_COST).unwrap();
        let second = hash_password("password", TEST_COST).unwrap();
        assert_ne!(first, second);
        assert!(verify_password("password", &first));
        assert!(verify_password("password", &second));
    }

    #[test]
    fn wrong_password_does_not_verify() {
        let digest = hash_password("password", TEST_COST).unwrap();
        assert!(!verify_password("wrongpassword", &digest));
    }

    #[test]
    fn malformed_digest_is_not_a_match() {
        assert!(!verify_password("password", "not-a-bcrypt-digest"));
        assert!(!verify_password("password", ""));
    }
}
