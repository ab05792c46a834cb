/// PasswordHasher
///
/// One-way, self-salted bcrypt hashing with a tunable work factor.
///
/// Both `hash` and `verify` trim surrounding whitespace first.
#[derive(Clone, Copy, Debug)]
pub struct PasswordHasher {
    cost: u32,
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new(bcrypt::DEFAULT_COST)
    }
}

impl PasswordHasher {
    /// `cost` is clamped to bcrypt's accepted range (4..=31).
    pub fn new(cost: u32) -> Self {
        Self {
            cost: cost.clamp(4, 31),
        }
    }

    pub fn cost(&self) -> u32 {
        self.cost
    }

    /// Hashes the trimmed password. Errors only if the random salt source fails.
    pub fn hash(&self, password: &str) -> Result<String, bcrypt::BcryptError> {
        bcrypt::hash(password.trim(), self.cost)
    }

    /// Checks the trimmed password against a stored digest.
    ///
    /// A mismatch and an unparsable digest both return `false`.
    pub fn verify(&self, password: &str, digest: &str) -> bool {
        match bcrypt::verify(password.trim(), digest) {
            Ok(matches) => matches,
            Err(e) => {
                tracing::warn!(error = %e, "Stored password digest could not be parsed");
                false
            }
        }
    }
}
