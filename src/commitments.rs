//! Session-keyed hash commitments
//!
//! Commit-then-reveal for round messages. The key is derived from the
//! session id and the committer's identity, so a commitment made in one
//! session (or by another party) can never open in a different context.

use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;

use crate::error::{Error, Result};
use crate::types::{SessionId, ShareholderId};

const COMMITMENT_KEY_CONTEXT: &str = "lindell17-core v1 nonce commitment key";

/// Key binding commitments to one (session, committer) pair
#[derive(Debug, Clone)]
pub struct CommitmentKey([u8; 32]);

/// The committed digest, safe to send before the message is revealed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commitment([u8; 32]);

/// The decommitment nonce, revealed together with the message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Opening {
    nonce: [u8; 32],
}

impl CommitmentKey {
    /// Derive the commitment key for a committer within a session
    pub fn derive(session_id: &SessionId, committer: ShareholderId) -> Self {
        let mut material = Vec::with_capacity(40);
        material.extend_from_slice(session_id);
        material.extend_from_slice(&committer.to_be_bytes());
        Self(blake3::derive_key(COMMITMENT_KEY_CONTEXT, &material))
    }

    /// Commit to a message under a fresh random nonce
    pub fn commit<R: RngCore + CryptoRng>(
        &self,
        message: &[u8],
        rng: &mut R,
    ) -> Result<(Commitment, Opening)> {
        let mut nonce = [0u8; 32];
        rng.try_fill_bytes(&mut nonce)
            .map_err(|e| Error::Randomness(e.to_string()))?;
        let digest = self.digest(message, &nonce);
        Ok((Commitment(digest), Opening { nonce }))
    }

    /// Check an opening against a previously received commitment
    pub fn verify(&self, commitment: &Commitment, message: &[u8], opening: &Opening) -> Result<()> {
        let digest = self.digest(message, &opening.nonce);
        if bool::from(digest.ct_eq(&commitment.0)) {
            Ok(())
        } else {
            Err(Error::Crypto("commitment opening mismatch".into()))
        }
    }

    fn digest(&self, message: &[u8], nonce: &[u8; 32]) -> [u8; 32] {
        let mut hasher = blake3::Hasher::new_keyed(&self.0);
        hasher.update(nonce);
        hasher.update(message);
        *hasher.finalize().as_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    fn rng() -> StdRng {
        StdRng::seed_from_u64(21)
    }

    #[test]
    fn commit_and_open() {
        let key = CommitmentKey::derive(&[1u8; 32], 7);
        let (commitment, opening) = key.commit(b"nonce point", &mut rng()).unwrap();
        key.verify(&commitment, b"nonce point", &opening).unwrap();
    }

    #[test]
    fn rejects_wrong_message() {
        let key = CommitmentKey::derive(&[1u8; 32], 7);
        let (commitment, opening) = key.commit(b"nonce point", &mut rng()).unwrap();
        assert!(key.verify(&commitment, b"other point", &opening).is_err());
    }

    #[test]
    fn surfaces_randomness_failure() {
        struct FailingRng;

        impl RngCore for FailingRng {
            fn next_u32(&mut self) -> u32 {
                0
            }
            fn next_u64(&mut self) -> u64 {
                0
            }
            fn fill_bytes(&mut self, dest: &mut [u8]) {
                dest.fill(0);
            }
            fn try_fill_bytes(&mut self, _dest: &mut [u8]) -> std::result::Result<(), rand::Error> {
                Err(rand::Error::new("entropy source unavailable"))
            }
        }

        impl CryptoRng for FailingRng {}

        let key = CommitmentKey::derive(&[1u8; 32], 7);
        match key.commit(b"nonce point", &mut FailingRng) {
            Err(Error::Randomness(_)) => {}
            other => panic!("expected a randomness error, got {other:?}"),
        }
    }

    #[test]
    fn keys_are_separated_by_session_and_committer() {
        let key = CommitmentKey::derive(&[1u8; 32], 7);
        let (commitment, opening) = key.commit(b"nonce point", &mut rng()).unwrap();

        let other_session = CommitmentKey::derive(&[2u8; 32], 7);
        assert!(other_session
            .verify(&commitment, b"nonce point", &opening)
            .is_err());

        let other_committer = CommitmentKey::derive(&[1u8; 32], 8);
        assert!(other_committer
            .verify(&commitment, b"nonce point", &opening)
            .is_err());
    }
}
