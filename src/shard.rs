//! Long-term key material held by one shareholder

use std::collections::{BTreeMap, BTreeSet};

use k256::{ProjectivePoint, Scalar};
use libpaillier::{Ciphertext, DecryptionKey, EncryptionKey};
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{Error, Result};
use crate::paillier;
use crate::types::{point_from_bytes, reject_identity, scalar_serde, Quorum, ShareholderId};

/// One shareholder's output of the dealing ceremony.
///
/// Read-only during signing; a single shard is shared across concurrent
/// sessions behind an `Arc`. The Shamir share value is the long-term secret;
/// callers should not serialize shards onto untrusted storage.
#[derive(Clone, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct Shard {
    /// This shareholder's identifier (also its Shamir evaluation point)
    #[zeroize(skip)]
    pub shareholder: ShareholderId,
    /// The access structure this share belongs to
    #[zeroize(skip)]
    pub quorum: Quorum,
    /// This party's Shamir share of the signing key
    // Note: Scalar doesn't implement Zeroize, so we skip it
    #[zeroize(skip)]
    #[serde(with = "scalar_serde")]
    pub secret_share: Scalar,
    /// Aggregate ECDSA public key, SEC1 compressed
    pub public_key: Vec<u8>,
    /// This party's Paillier secret key; required to act as primary
    #[zeroize(skip)]
    pub paillier_secret_key: Option<DecryptionKey>,
    /// Counterparty Paillier public keys, by shareholder
    #[zeroize(skip)]
    pub paillier_public_keys: BTreeMap<ShareholderId, EncryptionKey>,
    /// Counterparty Shamir share values, each encrypted under that
    /// counterparty's own Paillier public key
    #[zeroize(skip)]
    pub encrypted_shares: BTreeMap<ShareholderId, Ciphertext>,
}

impl Shard {
    /// Structural validation: quorum shape, membership, point parsing and
    /// consistency of the counterparty key material.
    pub fn validate(&self) -> Result<()> {
        self.quorum.validate()?;
        if !self.quorum.contains(self.shareholder) {
            return Err(Error::InvalidArgument(format!(
                "shareholder {} is not in its own quorum",
                self.shareholder
            )));
        }

        let public_key = point_from_bytes(&self.public_key)?;
        reject_identity(&public_key, "aggregate public key")?;

        let counterparties: BTreeSet<ShareholderId> = self
            .quorum
            .shareholders
            .iter()
            .copied()
            .filter(|&id| id != self.shareholder)
            .collect();
        let key_holders: BTreeSet<ShareholderId> =
            self.paillier_public_keys.keys().copied().collect();
        if key_holders != counterparties {
            return Err(Error::InvalidArgument(
                "paillier public keys must cover every counterparty exactly once".into(),
            ));
        }
        let share_holders: BTreeSet<ShareholderId> =
            self.encrypted_shares.keys().copied().collect();
        if share_holders != counterparties {
            return Err(Error::InvalidArgument(
                "encrypted shares must cover every counterparty exactly once".into(),
            ));
        }

        for (id, ciphertext) in &self.encrypted_shares {
            let ek = self.paillier_public_key(*id)?;
            paillier::validate_ciphertext(ek, ciphertext).map_err(|_| {
                Error::InvalidArgument(format!(
                    "encrypted share for shareholder {id} is out of range"
                ))
            })?;
        }
        Ok(())
    }

    /// Aggregate public key as a curve point.
    pub fn public_key_point(&self) -> Result<ProjectivePoint> {
        point_from_bytes(&self.public_key)
    }

    pub fn paillier_public_key(&self, id: ShareholderId) -> Result<&EncryptionKey> {
        self.paillier_public_keys.get(&id).ok_or_else(|| {
            Error::InvalidArgument(format!("no paillier public key for shareholder {id}"))
        })
    }

    pub fn encrypted_share(&self, id: ShareholderId) -> Result<&Ciphertext> {
        self.encrypted_shares.get(&id).ok_or_else(|| {
            Error::InvalidArgument(format!("no encrypted share for shareholder {id}"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::point_to_bytes;
    use k256::elliptic_curve::Field;
    use rand::{rngs::StdRng, SeedableRng};

    fn bare_shard() -> Shard {
        let mut rng = StdRng::seed_from_u64(61);
        let secret = Scalar::random(&mut rng);
        Shard {
            shareholder: 1,
            quorum: Quorum {
                threshold: 2,
                shareholders: vec![1, 2],
            },
            secret_share: Scalar::random(&mut rng),
            public_key: point_to_bytes(&(ProjectivePoint::GENERATOR * secret)),
            paillier_secret_key: None,
            paillier_public_keys: BTreeMap::new(),
            encrypted_shares: BTreeMap::new(),
        }
    }

    #[test]
    fn rejects_missing_counterparty_material() {
        // no entry for shareholder 2
        assert!(bare_shard().validate().is_err());
    }

    #[test]
    fn rejects_foreign_shareholder() {
        let mut shard = bare_shard();
        shard.shareholder = 9;
        assert!(shard.validate().is_err());
    }

    #[test]
    fn rejects_malformed_public_key() {
        let mut shard = bare_shard();
        shard.public_key = vec![0u8; 33];
        assert!(shard.validate().is_err());
    }
}
