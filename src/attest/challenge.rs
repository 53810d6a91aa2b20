//! Challenge validation
//!
//! A verifier challenge is either empty (attestation challenge disabled)
//! or at least 16 bytes. The check runs before any hardware interaction.

/// Minimum length of a non-empty attestation challenge
pub const MIN_CHALLENGE_LEN: usize = 16;

/// Challenge contract violations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChallengeError {
    #[error("challenge must be at least {MIN_CHALLENGE_LEN} bytes or empty, got {len}")]
    TooShort { len: usize },
}

/// Check the byte-length contract on an attestation challenge
pub fn validate_challenge(challenge: &[u8]) -> Result<(), ChallengeError> {
    if !challenge.is_empty() && challenge.len() < MIN_CHALLENGE_LEN {
        return Err(ChallengeError::TooShort {
            len: challenge.len(),
        });
    }
    Ok(())
}
