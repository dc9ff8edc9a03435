//! Cosigner state machines
//!
//! A shared base owns the session identity, the merlin transcript and the
//! randomness source; the two role-specialized cosigners own their round
//! progress as a closed enum, one variant per round, each holding exactly
//! the data produced so far. Round methods live in `rounds.rs`.

use std::sync::Arc;

use k256::{ProjectivePoint, Scalar};
use merlin::Transcript;
use rand::{CryptoRng, RngCore};

use crate::commitments::{Commitment, CommitmentKey, Opening};
use crate::error::{Error, Result};
use crate::shard::Shard;
use crate::types::{SessionId, ShareholderId};
use crate::THRESHOLD;

const TRANSCRIPT_LABEL: &[u8] = b"lindell17-core interactive signing";

pub(crate) struct Cosigner<R> {
    pub(crate) session_id: SessionId,
    pub(crate) transcript: Transcript,
    pub(crate) rng: R,
    pub(crate) shard: Arc<Shard>,
}

impl<R: RngCore + CryptoRng> Cosigner<R> {
    /// Seed the session transcript with everything both parties agree on
    /// up front. Both sides must build it from the same values or every
    /// later proof fails.
    fn new(
        shard: Arc<Shard>,
        session_id: SessionId,
        primary: ShareholderId,
        secondary: ShareholderId,
        rng: R,
    ) -> Self {
        let mut transcript = Transcript::new(TRANSCRIPT_LABEL);
        transcript.append_message(b"session id", &session_id);
        transcript.append_message(b"primary shareholder", &primary.to_be_bytes());
        transcript.append_message(b"secondary shareholder", &secondary.to_be_bytes());
        transcript.append_message(b"aggregate public key", &shard.public_key);
        Self {
            session_id,
            transcript,
            rng,
            shard,
        }
    }
}

/// Primary-side round progress. Variants own the data committed so far;
/// `Failed` is a terminal state entered when any round errors.
pub(crate) enum PrimaryState {
    Round1,
    Round3 {
        k1: Scalar,
        big_r1: ProjectivePoint,
        opening: Opening,
    },
    Round5 {
        k1: Scalar,
        big_r: ProjectivePoint,
        r: Scalar,
    },
    Finished,
    Failed,
}

impl PrimaryState {
    /// The round this state is waiting for; past the last round for
    /// terminal states.
    pub(crate) fn expected_round(&self) -> u8 {
        match self {
            PrimaryState::Round1 => 1,
            PrimaryState::Round3 { .. } => 3,
            PrimaryState::Round5 { .. } => 5,
            PrimaryState::Finished | PrimaryState::Failed => 7,
        }
    }
}

/// Secondary-side round progress.
pub(crate) enum SecondaryState {
    Round2,
    Round4 {
        k2: Scalar,
        nonce_commitment: Commitment,
    },
    Finished,
    Failed,
}

impl SecondaryState {
    pub(crate) fn expected_round(&self) -> u8 {
        match self {
            SecondaryState::Round2 => 2,
            SecondaryState::Round4 { .. } => 4,
            SecondaryState::Finished | SecondaryState::Failed => 6,
        }
    }
}

/// The cosigner that runs rounds 1, 3 and 5 and ends holding the final
/// signature. Must own the Paillier secret key.
pub struct PrimaryCosigner<R> {
    pub(crate) inner: Cosigner<R>,
    pub(crate) secondary: ShareholderId,
    pub(crate) state: PrimaryState,
}

impl<R: RngCore + CryptoRng> PrimaryCosigner<R> {
    /// Create the primary cosigner for one signing session with `secondary`
    /// as the counterparty.
    pub fn new(
        shard: Arc<Shard>,
        secondary: ShareholderId,
        session_id: SessionId,
        rng: R,
    ) -> Result<Self> {
        validate_pairing(&shard, secondary)?;
        if shard.paillier_secret_key.is_none() {
            return Err(Error::InvalidArgument(
                "primary shard is missing its paillier secret key".into(),
            ));
        }
        let primary = shard.shareholder;
        Ok(Self {
            inner: Cosigner::new(shard, session_id, primary, secondary, rng),
            secondary,
            state: PrimaryState::Round1,
        })
    }

    pub fn shareholder(&self) -> ShareholderId {
        self.inner.shard.shareholder
    }

    pub(crate) fn commitment_key(&self) -> CommitmentKey {
        CommitmentKey::derive(&self.inner.session_id, self.shareholder())
    }
}

/// The cosigner that runs rounds 2 and 4. Needs the primary's Paillier
/// public key and encrypted share from its shard.
pub struct SecondaryCosigner<R> {
    pub(crate) inner: Cosigner<R>,
    pub(crate) primary: ShareholderId,
    pub(crate) state: SecondaryState,
}

impl<R: RngCore + CryptoRng> SecondaryCosigner<R> {
    /// Create the secondary cosigner for one signing session with `primary`
    /// as the counterparty.
    pub fn new(
        shard: Arc<Shard>,
        primary: ShareholderId,
        session_id: SessionId,
        rng: R,
    ) -> Result<Self> {
        validate_pairing(&shard, primary)?;
        shard.paillier_public_key(primary)?;
        shard.encrypted_share(primary)?;
        let secondary = shard.shareholder;
        Ok(Self {
            inner: Cosigner::new(shard, session_id, primary, secondary, rng),
            primary,
            state: SecondaryState::Round2,
        })
    }

    pub fn shareholder(&self) -> ShareholderId {
        self.inner.shard.shareholder
    }
}

fn validate_pairing(shard: &Shard, counterparty: ShareholderId) -> Result<()> {
    shard.validate()?;
    if shard.quorum.threshold != THRESHOLD {
        return Err(Error::InvalidArgument(format!(
            "signing requires a threshold of {THRESHOLD}, quorum has {}",
            shard.quorum.threshold
        )));
    }
    if counterparty == shard.shareholder {
        return Err(Error::InvalidArgument(
            "counterparty must be a different shareholder".into(),
        ));
    }
    if !shard.quorum.contains(counterparty) {
        return Err(Error::InvalidArgument(format!(
            "counterparty {counterparty} is not in the quorum"
        )));
    }
    Ok(())
}
