/// Hash a plaintext password with bcrypt. The output embeds algorithm,
/// cost, and salt, so verification survives future cost changes.
pub fn hash(plaintext: &str) -> Result<String, bcrypt::BcryptError> {
    bcrypt::hash(plaintext, bcrypt::DEFAULT_COST)
}

/// Verify a plaintext password against a stored hash. Fails safe:
/// malformed hashes verify as false rather than erroring.
pub fn verify(plaintext: &str, hashed: &str) -> bool {
    bcrypt::verify(plaintext, hashed).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_accepts_matching_password() {
        let hashed = hash("Abcdefgh").unwrap();
        assert!(verify("Abcdefgh", &hashed));
    }

    #[test]
    fn verify_rejects_wrong_password() {
        let hashed = hash("Abcdefgh").unwrap();
        assert!(!verify("Zyxwvuts", &hashed));
    }

    #[test]
    fn verify_is_false_on_malformed_hash() {
        assert!(!verify("anything", "not-a-bcrypt-hash"));
        assert!(!verify("anything", ""));
    }

    #[test]
    fn hash_is_salted_per_call() {
        let h1 = hash("Abcdefgh").unwrap();
        let h2 = hash("Abcdefgh").unwrap();
        assert_ne!(h1, h2);
        assert!(verify("Abcdefgh", &h1));
        assert!(verify("Abcdefgh", &h2));
    }
}
