//! Trusted-dealer shard issuance
//!
//! Splits an ECDSA signing key into shards for a 2-of-n quorum. Every
//! shareholder gets its own Paillier key pair, and every other shard carries
//! that party's Paillier public key plus the encryption of its Shamir share
//! under that key, so any pair of shareholders can sign with either of them
//! as primary. Meant for key ceremonies and tests; a dealerless interactive
//! keygen is a separate protocol.

use std::collections::BTreeMap;

use k256::{elliptic_curve::Field, ProjectivePoint, Scalar};
use rand::{CryptoRng, RngCore};
use tracing::info;

use crate::error::{Error, Result};
use crate::paillier;
use crate::shard::Shard;
use crate::types::{point_to_bytes, scalar_to_bn, Quorum, ShareholderId};
use crate::THRESHOLD;

/// Default Paillier prime bit length, giving a 2048-bit modulus. Large
/// enough that the blinded partial-signature plaintexts (below q^3 for the
/// 256-bit curve order q) never wrap.
pub const PAILLIER_PRIME_BITS: usize = 1024;

/// Generate a fresh signing key and deal shards for it.
pub fn keygen<R: RngCore + CryptoRng>(
    quorum: &Quorum,
    rng: &mut R,
) -> Result<BTreeMap<ShareholderId, Shard>> {
    let secret = Scalar::random(&mut *rng);
    deal(quorum, secret, PAILLIER_PRIME_BITS, rng)
}

/// Deal shards of a known secret. `paillier_prime_bits` is tunable so tests
/// can use smaller moduli.
pub fn deal<R: RngCore + CryptoRng>(
    quorum: &Quorum,
    secret: Scalar,
    paillier_prime_bits: usize,
    rng: &mut R,
) -> Result<BTreeMap<ShareholderId, Shard>> {
    quorum.validate()?;
    if quorum.threshold != THRESHOLD {
        return Err(Error::InvalidArgument(format!(
            "dealer supports threshold {THRESHOLD} only, got {}",
            quorum.threshold
        )));
    }
    if bool::from(secret.is_zero()) {
        return Err(Error::InvalidArgument("signing key must be non-zero".into()));
    }

    let public_key = point_to_bytes(&(ProjectivePoint::GENERATOR * secret));

    // Shamir over f(x) = secret + slope * x, threshold 2
    let slope = Scalar::random(&mut *rng);
    let mut shards: BTreeMap<ShareholderId, Shard> = BTreeMap::new();
    for &id in &quorum.shareholders {
        let share = secret + slope * Scalar::from(id);
        shards.insert(
            id,
            Shard {
                shareholder: id,
                quorum: quorum.clone(),
                secret_share: share,
                public_key: public_key.clone(),
                paillier_secret_key: None,
                paillier_public_keys: BTreeMap::new(),
                encrypted_shares: BTreeMap::new(),
            },
        );
    }

    // One Paillier key pair per shareholder; every other shard learns the
    // public key and the encryption of this party's share under it.
    for &id in &quorum.shareholders {
        let (ek, dk) = paillier::generate_keypair(paillier_prime_bits)?;
        let share_value = scalar_to_bn(&shard_ref(&shards, id)?.secret_share);

        for &other in &quorum.shareholders {
            if other == id {
                continue;
            }
            let ciphertext = paillier::encrypt(&ek, &share_value, rng)?;
            let counterparty = shard_mut(&mut shards, other)?;
            counterparty.paillier_public_keys.insert(id, ek.clone());
            counterparty.encrypted_shares.insert(id, ciphertext);
        }
        shard_mut(&mut shards, id)?.paillier_secret_key = Some(dk);
    }

    for shard in shards.values() {
        shard.validate()?;
    }
    info!(
        shareholders = quorum.shareholders.len(),
        "dealt signing shards"
    );
    Ok(shards)
}

fn shard_ref(
    shards: &BTreeMap<ShareholderId, Shard>,
    id: ShareholderId,
) -> Result<&Shard> {
    shards
        .get(&id)
        .ok_or_else(|| Error::Crypto(format!("dealer lost the shard for shareholder {id}")))
}

fn shard_mut(
    shards: &mut BTreeMap<ShareholderId, Shard>,
    id: ShareholderId,
) -> Result<&mut Shard> {
    shards
        .get_mut(&id)
        .ok_or_else(|| Error::Crypto(format!("dealer lost the shard for shareholder {id}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sharing;
    use rand::{rngs::StdRng, SeedableRng};

    const TEST_PAILLIER_PRIME_BITS: usize = 512;

    #[test]
    fn shards_validate_and_reconstruct() {
        let mut rng = StdRng::seed_from_u64(81);
        let quorum = Quorum::new(2, vec![1, 2, 3]).unwrap();
        let secret = Scalar::random(&mut rng);
        let shards = deal(&quorum, secret, TEST_PAILLIER_PRIME_BITS, &mut rng).unwrap();

        assert_eq!(shards.len(), 3);
        for shard in shards.values() {
            shard.validate().unwrap();
            assert!(shard.paillier_secret_key.is_some());
        }

        // any pair reconstructs the secret additively
        for pair in [[1u64, 2], [2, 3], [1, 3]] {
            let sum: Scalar = pair
                .iter()
                .map(|&id| {
                    sharing::to_additive_share(&shards[&id].secret_share, id, &pair).unwrap()
                })
                .sum();
            assert_eq!(sum, secret);
        }
    }

    #[test]
    fn encrypted_shares_decrypt_to_the_share_value() {
        let mut rng = StdRng::seed_from_u64(82);
        let quorum = Quorum::new(2, vec![1, 2]).unwrap();
        let secret = Scalar::random(&mut rng);
        let shards = deal(&quorum, secret, TEST_PAILLIER_PRIME_BITS, &mut rng).unwrap();

        // shard 2 holds Enc_{pk_1}(share_1); shard 1's secret key opens it
        let dk1 = shards[&1].paillier_secret_key.as_ref().unwrap();
        let ciphertext = shards[&2].encrypted_share(1).unwrap();
        let plaintext = paillier::decrypt(dk1, ciphertext).unwrap();
        assert_eq!(plaintext, scalar_to_bn(&shards[&1].secret_share));
    }

    #[test]
    fn rejects_unsupported_threshold() {
        let mut rng = StdRng::seed_from_u64(83);
        let quorum = Quorum::new(3, vec![1, 2, 3]).unwrap();
        let secret = Scalar::random(&mut rng);
        assert!(deal(&quorum, secret, TEST_PAILLIER_PRIME_BITS, &mut rng).is_err());
    }
}
