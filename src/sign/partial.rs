//! Homomorphic partial-signature computation
//!
//! The secondary combines its nonce and additive share with the primary's
//! encrypted share entirely in ciphertext space. The plaintext is blinded
//! with a fresh multiple of the curve order, so the decrypting side learns
//! nothing beyond the partial signature modulo q.

use k256::Scalar;
use libpaillier::{unknown_order::BigNumber, Ciphertext, EncryptionKey};
use rand::{CryptoRng, RngCore};

use crate::error::{Error, Result};
use crate::paillier;
use crate::types::{curve_order, scalar_to_bn};

/// c3 = Enc(ρ·q) ⊕ Enc(k2⁻¹·m′) ⊕ (c_key ⊗ k2⁻¹·r·λ1) ⊕ Enc(k2⁻¹·r·y2)
/// with ρ uniform in [0, q²). Decrypting and reducing modulo q yields
/// s′ = k2⁻¹·(m′ + r·x), one inversion away from the final s.
#[allow(clippy::too_many_arguments)]
pub(crate) fn compute<R: RngCore + CryptoRng>(
    primary_lambda: Scalar,
    k2: Scalar,
    m_prime: Scalar,
    r: Scalar,
    additive_share: Scalar,
    ek: &EncryptionKey,
    encrypted_primary_share: &Ciphertext,
    rng: &mut R,
) -> Result<Ciphertext> {
    let k2_inv = Option::<Scalar>::from(k2.invert())
        .ok_or_else(|| Error::Crypto("nonce is not invertible".into()))?;

    let q = curve_order();
    let rho = BigNumber::from_rng(&(&q * &q), rng);
    let blind = &rho * &q;

    let c_blind = paillier::encrypt(ek, &blind, rng)?;
    let c_message = paillier::encrypt(ek, &scalar_to_bn(&(k2_inv * m_prime)), rng)?;
    let c_primary = paillier::scale(
        ek,
        encrypted_primary_share,
        &scalar_to_bn(&(k2_inv * r * primary_lambda)),
    )?;
    let c_own = paillier::encrypt(ek, &scalar_to_bn(&(k2_inv * r * additive_share)), rng)?;

    let mut c3 = paillier::add(ek, &c_blind, &c_message)?;
    c3 = paillier::add(ek, &c3, &c_primary)?;
    paillier::add(ek, &c3, &c_own)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::bn_to_scalar;
    use k256::elliptic_curve::Field;
    use rand::{rngs::StdRng, SeedableRng};

    /// The ciphertext-space computation must agree with the same arithmetic
    /// done directly on scalars.
    #[test]
    fn matches_direct_scalar_computation() {
        let mut rng = StdRng::seed_from_u64(71);
        let (ek, dk) = paillier::generate_keypair(512).unwrap();

        let primary_share = Scalar::random(&mut rng);
        let primary_lambda = Scalar::random(&mut rng);
        let additive_share = Scalar::random(&mut rng);
        let k2 = Scalar::random(&mut rng);
        let m_prime = Scalar::random(&mut rng);
        let r = Scalar::random(&mut rng);

        let encrypted_primary_share =
            paillier::encrypt(&ek, &scalar_to_bn(&primary_share), &mut rng).unwrap();

        let c3 = compute(
            primary_lambda,
            k2,
            m_prime,
            r,
            additive_share,
            &ek,
            &encrypted_primary_share,
            &mut rng,
        )
        .unwrap();

        let decrypted = bn_to_scalar(&paillier::decrypt(&dk, &c3).unwrap()).unwrap();

        let k2_inv = k2.invert().unwrap();
        let expected = k2_inv * (m_prime + r * (primary_share * primary_lambda + additive_share));
        assert_eq!(decrypted, expected);
    }
}
