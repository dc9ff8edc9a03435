//! Round functions for the interactive signing protocol
//!
//! Each round validates its input message, does its cryptographic work, and
//! only then advances the state machine. Any failure parks the cosigner in
//! the terminal `Failed` state; sessions are never retried in place.

use std::mem;

use k256::{
    elliptic_curve::{bigint::U256, ops::Reduce, sec1::ToEncodedPoint, Field, Group},
    ProjectivePoint, Scalar,
};
use libpaillier::{unknown_order::BigNumber, EncryptionKey};
use merlin::Transcript;
use rand::{CryptoRng, RngCore};
use tracing::{debug, info, instrument};

use super::cosigner::{PrimaryCosigner, PrimaryState, SecondaryCosigner, SecondaryState};
use super::messages::{Round1Message, Round2Message, Round3Message, Round4Message};
use super::{message_to_scalar, partial};
use crate::commitments::CommitmentKey;
use crate::error::{Error, Result, Role};
use crate::paillier;
use crate::proofs::dlog;
use crate::sharing;
use crate::types::{bn_to_scalar, curve_order, point_to_bytes, ShareholderId, Signature};

const DLOG_CONTEXT_LABEL: &[u8] = b"dlog proof context";
const PROVER_LABEL: &[u8] = b"dlog prover";

impl<R: RngCore + CryptoRng> PrimaryCosigner<R> {
    /// Round 1: sample the nonce k1 and commit to R1 = k1·G.
    #[instrument(skip(self), fields(shareholder = self.shareholder()))]
    pub fn round1(&mut self) -> Result<Round1Message> {
        let state = mem::replace(&mut self.state, PrimaryState::Failed);
        match state {
            PrimaryState::Round1 => {}
            PrimaryState::Failed => return Err(session_aborted()),
            other => {
                let expected = other.expected_round();
                self.state = other;
                return Err(round_mismatch(Role::Primary, expected, 1));
            }
        }

        let k1 = Scalar::random(&mut self.inner.rng);
        let big_r1 = ProjectivePoint::GENERATOR * k1;

        let (nonce_commitment, opening) = self
            .commitment_key()
            .commit(&point_to_bytes(&big_r1), &mut self.inner.rng)?;

        self.state = PrimaryState::Round3 {
            k1,
            big_r1,
            opening,
        };
        debug!("committed to nonce point");
        Ok(Round1Message { nonce_commitment })
    }

    /// Round 3: verify the secondary's nonce proof, reveal and prove our
    /// own nonce, and derive the combined nonce point.
    #[instrument(skip(self, msg), fields(shareholder = self.shareholder()))]
    pub fn round3(&mut self, msg: &Round2Message) -> Result<Round3Message> {
        let state = mem::replace(&mut self.state, PrimaryState::Failed);
        let (k1, big_r1, opening) = match state {
            PrimaryState::Round3 {
                k1,
                big_r1,
                opening,
            } => (k1, big_r1, opening),
            PrimaryState::Failed => return Err(session_aborted()),
            other => {
                let expected = other.expected_round();
                self.state = other;
                return Err(round_mismatch(Role::Primary, expected, 3));
            }
        };

        msg.validate()?;

        let secondary = self.secondary;
        bind_dlog_context(&mut self.inner.transcript, secondary, self.inner.shard.shareholder);
        dlog::verify(&mut self.inner.transcript, &msg.big_r2, &msg.proof).map_err(|_| {
            Error::IdentifiableAbort {
                party: secondary,
                reason: "nonce dlog proof does not verify".into(),
            }
        })?;
        debug!("verified secondary nonce proof");

        bind_dlog_context(&mut self.inner.transcript, self.inner.shard.shareholder, secondary);
        let proof = dlog::prove(&mut self.inner.transcript, &mut self.inner.rng, &k1, &big_r1);

        let big_r = msg.big_r2 * k1;
        let r = nonce_x_scalar(&big_r)?;

        self.state = PrimaryState::Round5 { k1, big_r, r };
        Ok(Round3Message {
            opening,
            big_r1,
            proof,
        })
    }

    /// Round 5: decrypt the partial signature, assemble the final
    /// signature, normalize it and verify it before returning.
    #[instrument(skip(self, msg, message), fields(shareholder = self.shareholder()))]
    pub fn round5(&mut self, msg: &Round4Message, message: &[u8]) -> Result<Signature> {
        let state = mem::replace(&mut self.state, PrimaryState::Failed);
        let (k1, big_r, r) = match state {
            PrimaryState::Round5 { k1, big_r, r } => (k1, big_r, r),
            PrimaryState::Failed => return Err(session_aborted()),
            other => {
                let expected = other.expected_round();
                self.state = other;
                return Err(round_mismatch(Role::Primary, expected, 5));
            }
        };

        let secondary = self.secondary;
        let dk = self
            .inner
            .shard
            .paillier_secret_key
            .as_ref()
            .ok_or_else(|| {
                Error::InvalidArgument("primary shard is missing its paillier secret key".into())
            })?;
        let ek = EncryptionKey::from(dk);
        msg.validate(&ek)?;

        let plaintext = paillier::decrypt(dk, &msg.c3).map_err(|_| Error::IdentifiableAbort {
            party: secondary,
            reason: "partial signature does not decrypt".into(),
        })?;
        let s_prime = bn_to_scalar(&plaintext)?;

        let k1_inv = Option::<Scalar>::from(k1.invert())
            .ok_or_else(|| Error::Crypto("nonce is not invertible".into()))?;
        let s = k1_inv * s_prime;
        if bool::from(s.is_zero()) {
            return Err(Error::IdentifiableAbort {
                party: secondary,
                reason: "partial signature collapses to zero".into(),
            });
        }

        let mut signature = Signature::from_scalars(r, s, recovery_id(&big_r)?);
        signature.normalize();

        signature
            .verify(&self.inner.shard.public_key, message)
            .map_err(|_| Error::IdentifiableAbort {
                party: secondary,
                reason: "assembled signature does not verify".into(),
            })?;

        self.state = PrimaryState::Finished;
        info!(
            r = %hex::encode(signature.r),
            s = %hex::encode(signature.s),
            "signing session completed"
        );
        Ok(signature)
    }
}

impl<R: RngCore + CryptoRng> SecondaryCosigner<R> {
    /// Round 2: record the primary's commitment, sample the nonce k2 and
    /// prove knowledge of its discrete log.
    #[instrument(skip(self, msg), fields(shareholder = self.shareholder()))]
    pub fn round2(&mut self, msg: &Round1Message) -> Result<Round2Message> {
        let state = mem::replace(&mut self.state, SecondaryState::Failed);
        match state {
            SecondaryState::Round2 => {}
            SecondaryState::Failed => return Err(session_aborted()),
            other => {
                let expected = other.expected_round();
                self.state = other;
                return Err(round_mismatch(Role::Secondary, expected, 2));
            }
        }

        let k2 = Scalar::random(&mut self.inner.rng);
        let big_r2 = ProjectivePoint::GENERATOR * k2;

        let primary = self.primary;
        bind_dlog_context(&mut self.inner.transcript, self.inner.shard.shareholder, primary);
        let proof = dlog::prove(&mut self.inner.transcript, &mut self.inner.rng, &k2, &big_r2);

        self.state = SecondaryState::Round4 {
            k2,
            nonce_commitment: msg.nonce_commitment.clone(),
        };
        debug!("produced nonce and proof");
        Ok(Round2Message { big_r2, proof })
    }

    /// Round 4: open the primary's commitment, verify its nonce proof, and
    /// compute the blinded partial signature in ciphertext space.
    #[instrument(skip(self, msg, message), fields(shareholder = self.shareholder()))]
    pub fn round4(&mut self, msg: &Round3Message, message: &[u8]) -> Result<Round4Message> {
        let state = mem::replace(&mut self.state, SecondaryState::Failed);
        let (k2, nonce_commitment) = match state {
            SecondaryState::Round4 {
                k2,
                nonce_commitment,
            } => (k2, nonce_commitment),
            SecondaryState::Failed => return Err(session_aborted()),
            other => {
                let expected = other.expected_round();
                self.state = other;
                return Err(round_mismatch(Role::Secondary, expected, 4));
            }
        };

        msg.validate()?;

        let primary = self.primary;
        let commitment_key = CommitmentKey::derive(&self.inner.session_id, primary);
        commitment_key
            .verify(&nonce_commitment, &point_to_bytes(&msg.big_r1), &msg.opening)
            .map_err(|_| Error::IdentifiableAbort {
                party: primary,
                reason: "nonce commitment does not open".into(),
            })?;
        debug!("opened primary nonce commitment");

        bind_dlog_context(&mut self.inner.transcript, primary, self.inner.shard.shareholder);
        dlog::verify(&mut self.inner.transcript, &msg.big_r1, &msg.proof).map_err(|_| {
            Error::IdentifiableAbort {
                party: primary,
                reason: "nonce dlog proof does not verify".into(),
            }
        })?;

        let big_r = msg.big_r1 * k2;
        let r = nonce_x_scalar(&big_r)?;

        let own = self.inner.shard.shareholder;
        let signing_quorum = [own, primary];
        let additive_share =
            sharing::to_additive_share(&self.inner.shard.secret_share, own, &signing_quorum)?;
        let primary_lambda = sharing::lagrange_coefficient(primary, &signing_quorum)?;

        let m_prime = message_to_scalar(message);
        let ek = self.inner.shard.paillier_public_key(primary)?;
        let encrypted_primary_share = self.inner.shard.encrypted_share(primary)?;

        let c3 = partial::compute(
            primary_lambda,
            k2,
            m_prime,
            r,
            additive_share,
            ek,
            encrypted_primary_share,
            &mut self.inner.rng,
        )?;

        self.state = SecondaryState::Finished;
        debug!("produced blinded partial signature");
        Ok(Round4Message { c3 })
    }
}

/// Bind the transcript to one directed prover/verifier pair before a dlog
/// proof. Keeps the two parties' proofs in this session from being confused
/// for each other.
fn bind_dlog_context(transcript: &mut Transcript, prover: ShareholderId, verifier: ShareholderId) {
    let mut pair = [0u8; 16];
    pair[..8].copy_from_slice(&prover.to_be_bytes());
    pair[8..].copy_from_slice(&verifier.to_be_bytes());
    transcript.append_message(DLOG_CONTEXT_LABEL, &pair);
    transcript.append_message(PROVER_LABEL, &prover.to_be_bytes());
}

/// r = R.x mod q; the identity and an x reducing to zero both kill the
/// session with no party to blame.
fn nonce_x_scalar(big_r: &ProjectivePoint) -> Result<Scalar> {
    if bool::from(big_r.is_identity()) {
        return Err(Error::ProtocolAbort(
            "combined nonce point is the identity".into(),
        ));
    }
    let encoded = big_r.to_affine().to_encoded_point(false);
    let x: [u8; 32] = encoded.as_bytes()[1..33]
        .try_into()
        .map_err(|_| Error::Crypto("malformed affine encoding".into()))?;
    let r = <Scalar as Reduce<U256>>::reduce_bytes(&x.into());
    if bool::from(r.is_zero()) {
        return Err(Error::ProtocolAbort(
            "combined nonce x-coordinate reduces to zero".into(),
        ));
    }
    Ok(r)
}

/// Recovery id of the combined nonce point: bit 0 is the y parity, bit 1
/// marks an x-coordinate at or above the curve order.
fn recovery_id(big_r: &ProjectivePoint) -> Result<u8> {
    if bool::from(big_r.is_identity()) {
        return Err(Error::ProtocolAbort(
            "combined nonce point is the identity".into(),
        ));
    }
    let encoded = big_r.to_affine().to_encoded_point(false);
    let bytes = encoded.as_bytes();
    let y_is_odd = (bytes[64] & 1) == 1;
    let x_overflows = BigNumber::from_slice(&bytes[1..33]) >= curve_order();
    Ok(u8::from(y_is_odd) | (u8::from(x_overflows) << 1))
}

fn round_mismatch(role: Role, expected: u8, actual: u8) -> Error {
    Error::RoundMismatch {
        role,
        expected,
        actual,
    }
}

fn session_aborted() -> Error {
    Error::ProtocolAbort("signing session already aborted".into())
}
