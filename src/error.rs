//! Error types for the signing core

use thiserror::Error;

use crate::types::ShareholderId;

/// Result type alias using our Error
pub type Result<T> = std::result::Result<T, Error>;

/// Which role a cosigner plays in a signing session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Runs rounds 1, 3 and 5; holds the Paillier secret key
    Primary,
    /// Runs rounds 2 and 4
    Secondary,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Primary => write!(f, "primary"),
            Role::Secondary => write!(f, "secondary"),
        }
    }
}

/// Errors that can occur during shard handling and interactive signing
#[derive(Debug, Error)]
pub enum Error {
    /// Missing or malformed input, caught before any round work happens
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A round function was called out of order
    #[error("{role} cosigner expected round {expected}, got round {actual}")]
    RoundMismatch { role: Role, expected: u8, actual: u8 },

    /// A check on counterparty-supplied data failed; names the offender
    #[error("aborted, attributable to shareholder {party}: {reason}")]
    IdentifiableAbort { party: ShareholderId, reason: String },

    /// The session cannot continue and no party can be blamed
    #[error("protocol aborted: {0}")]
    ProtocolAbort(String),

    /// A cryptographic operation failed
    #[error("cryptographic error: {0}")]
    Crypto(String),

    /// The randomness source failed to produce bytes
    #[error("randomness failure: {0}")]
    Randomness(String),

    /// Signature verification failed
    #[error("invalid signature")]
    InvalidSignature,

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_names_the_offender() {
        let err = Error::IdentifiableAbort {
            party: 3,
            reason: "proof does not verify".into(),
        };
        assert!(err.to_string().contains("shareholder 3"));
    }

    #[test]
    fn round_mismatch_display() {
        let err = Error::RoundMismatch {
            role: Role::Secondary,
            expected: 2,
            actual: 4,
        };
        assert_eq!(
            err.to_string(),
            "secondary cosigner expected round 2, got round 4"
        );
    }
}
