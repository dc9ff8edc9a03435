//! Round message types
//!
//! One record per round transition, produced by one party and consumed
//! exactly once by the other. All messages serialize with serde so callers
//! can move them over whatever transport they use.

use k256::ProjectivePoint;
use libpaillier::{Ciphertext, EncryptionKey};
use serde::{Deserialize, Serialize};

use crate::commitments::{Commitment, Opening};
use crate::error::Result;
use crate::paillier;
use crate::proofs::dlog;
use crate::types::{point_serde, reject_identity};

/// Round 1 → 2: commitment to the primary's nonce point
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Round1Message {
    pub nonce_commitment: Commitment,
}

/// Round 2 → 3: the secondary's nonce point and a proof it knows its dlog
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Round2Message {
    #[serde(with = "point_serde")]
    pub big_r2: ProjectivePoint,
    pub proof: dlog::Proof,
}

impl Round2Message {
    pub fn validate(&self) -> Result<()> {
        reject_identity(&self.big_r2, "secondary nonce point")
    }
}

/// Round 3 → 4: opening of the round-1 commitment, the primary's nonce
/// point and its dlog proof
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Round3Message {
    pub opening: Opening,
    #[serde(with = "point_serde")]
    pub big_r1: ProjectivePoint,
    pub proof: dlog::Proof,
}

impl Round3Message {
    pub fn validate(&self) -> Result<()> {
        reject_identity(&self.big_r1, "primary nonce point")
    }
}

/// Round 4 → 5: the blinded partial signature, encrypted under the
/// primary's Paillier key
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Round4Message {
    pub c3: Ciphertext,
}

impl Round4Message {
    pub fn validate(&self, ek: &EncryptionKey) -> Result<()> {
        paillier::validate_ciphertext(ek, &self.c3)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commitments::CommitmentKey;
    use crate::error::Error;
    use k256::{elliptic_curve::Field, Scalar};
    use merlin::Transcript;
    use rand::{rngs::StdRng, SeedableRng};

    fn nonce_point_with_proof(rng: &mut StdRng) -> (ProjectivePoint, dlog::Proof) {
        let witness = Scalar::random(&mut *rng);
        let statement = ProjectivePoint::GENERATOR * witness;
        let proof = dlog::prove(
            &mut Transcript::new(b"round message test"),
            rng,
            &witness,
            &statement,
        );
        (statement, proof)
    }

    #[test]
    fn round2_rejects_identity_nonce_point() {
        let mut rng = StdRng::seed_from_u64(61);
        let (big_r2, proof) = nonce_point_with_proof(&mut rng);

        let message = Round2Message {
            big_r2,
            proof: proof.clone(),
        };
        message.validate().unwrap();

        let message = Round2Message {
            big_r2: ProjectivePoint::IDENTITY,
            proof,
        };
        assert!(matches!(
            message.validate(),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn round3_rejects_identity_nonce_point() {
        let mut rng = StdRng::seed_from_u64(62);
        let (big_r1, proof) = nonce_point_with_proof(&mut rng);
        let key = CommitmentKey::derive(&[1u8; 32], 1);
        let (_, opening) = key.commit(b"nonce point", &mut rng).unwrap();

        let message = Round3Message {
            opening: opening.clone(),
            big_r1,
            proof: proof.clone(),
        };
        message.validate().unwrap();

        let message = Round3Message {
            opening,
            big_r1: ProjectivePoint::IDENTITY,
            proof,
        };
        assert!(matches!(
            message.validate(),
            Err(Error::InvalidArgument(_))
        ));
    }
}
