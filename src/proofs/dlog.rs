//! Schnorr proof of knowledge of a discrete logarithm
//!
//! Non-interactive via Fiat-Shamir over a caller-supplied transcript. The
//! prover and verifier must have extended their transcripts identically
//! before calling in here; any divergence makes the proof fail to verify.

use k256::{
    elliptic_curve::{Field, PrimeField},
    ProjectivePoint, Scalar,
};
use merlin::Transcript;
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::{point_serde, point_to_bytes, scalar_serde};

const STATEMENT_LABEL: &[u8] = b"dlog proof statement";
const COMMITMENT_LABEL: &[u8] = b"dlog proof commitment";
const CHALLENGE_LABEL: &[u8] = b"dlog proof challenge";

/// Proof that the prover knows `w` with `statement = w * G`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Proof {
    #[serde(with = "point_serde")]
    big_a: ProjectivePoint,
    #[serde(with = "scalar_serde")]
    z: Scalar,
}

/// Prove knowledge of `witness` for `statement = witness * G`.
pub fn prove<R: RngCore + CryptoRng>(
    transcript: &mut Transcript,
    rng: &mut R,
    witness: &Scalar,
    statement: &ProjectivePoint,
) -> Proof {
    transcript.append_message(STATEMENT_LABEL, &point_to_bytes(statement));

    let alpha = Scalar::random(rng);
    let big_a = ProjectivePoint::GENERATOR * alpha;
    transcript.append_message(COMMITMENT_LABEL, &point_to_bytes(&big_a));

    let e = challenge_scalar(transcript);
    let z = alpha + e * witness;
    Proof { big_a, z }
}

/// Verify a proof against a statement, consuming the same transcript
/// extensions the prover made.
pub fn verify(transcript: &mut Transcript, statement: &ProjectivePoint, proof: &Proof) -> Result<()> {
    transcript.append_message(STATEMENT_LABEL, &point_to_bytes(statement));
    transcript.append_message(COMMITMENT_LABEL, &point_to_bytes(&proof.big_a));

    let e = challenge_scalar(transcript);
    if ProjectivePoint::GENERATOR * proof.z == proof.big_a + *statement * e {
        Ok(())
    } else {
        Err(Error::Crypto("dlog proof does not verify".into()))
    }
}

/// Draw a uniform scalar from the transcript by rejection sampling.
fn challenge_scalar(transcript: &mut Transcript) -> Scalar {
    loop {
        let mut buf = [0u8; 32];
        transcript.challenge_bytes(CHALLENGE_LABEL, &mut buf);
        if let Some(e) = Option::<Scalar>::from(Scalar::from_repr(buf.into())) {
            return e;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    fn transcript() -> Transcript {
        Transcript::new(b"dlog test")
    }

    #[test]
    fn valid_proof_verifies() {
        let mut rng = StdRng::seed_from_u64(31);
        let witness = Scalar::random(&mut rng);
        let statement = ProjectivePoint::GENERATOR * witness;

        let proof = prove(&mut transcript(), &mut rng, &witness, &statement);
        verify(&mut transcript(), &statement, &proof).unwrap();
    }

    #[test]
    fn rejects_wrong_statement() {
        let mut rng = StdRng::seed_from_u64(32);
        let witness = Scalar::random(&mut rng);
        let statement = ProjectivePoint::GENERATOR * witness;
        let proof = prove(&mut transcript(), &mut rng, &witness, &statement);

        let other = ProjectivePoint::GENERATOR * Scalar::random(&mut rng);
        assert!(verify(&mut transcript(), &other, &proof).is_err());
    }

    #[test]
    fn rejects_diverged_transcript() {
        let mut rng = StdRng::seed_from_u64(33);
        let witness = Scalar::random(&mut rng);
        let statement = ProjectivePoint::GENERATOR * witness;
        let proof = prove(&mut transcript(), &mut rng, &witness, &statement);

        let mut diverged = transcript();
        diverged.append_message(b"extra", b"context the prover never saw");
        assert!(verify(&mut diverged, &statement, &proof).is_err());
    }
}
