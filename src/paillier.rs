//! Additively homomorphic encryption adapter
//!
//! Thin wrapper over the Paillier scheme. Plaintexts are non-negative
//! integers below the modulus N; the signing protocol keeps them far below
//! that bound (the q-blinding term rho * q with rho < q^2 dominates, so
//! sums stay under q^3, roughly 768 bits against a 2048-bit N) so
//! additions never wrap.

use libpaillier::{unknown_order::BigNumber, Ciphertext, DecryptionKey, EncryptionKey, Nonce};
use rand::{CryptoRng, RngCore};

use crate::error::{Error, Result};

const NONCE_RETRY_MAX: usize = 500;

/// Generate a key pair with primes of the given bit length.
///
/// Ordinary primes, not safe primes: nothing in this protocol proves
/// statements about the modulus, and safe-prime generation at 1024 bits
/// takes minutes.
pub fn generate_keypair(prime_bits: usize) -> Result<(EncryptionKey, DecryptionKey)> {
    let p = BigNumber::prime(prime_bits);
    let q = BigNumber::prime(prime_bits);
    let dk = DecryptionKey::with_primes_unchecked(&p, &q)
        .ok_or_else(|| Error::Crypto("paillier key generation failed".into()))?;
    let ek = EncryptionKey::from(&dk);
    Ok((ek, dk))
}

/// Encrypt a non-negative plaintext, drawing the nonce from `rng`.
pub fn encrypt<R: RngCore + CryptoRng>(
    ek: &EncryptionKey,
    plaintext: &BigNumber,
    rng: &mut R,
) -> Result<Ciphertext> {
    let nonce = sample_unit(ek.n(), rng)?;
    let (ciphertext, _) = ek
        .encrypt(plaintext.to_bytes(), Some(nonce))
        .ok_or_else(|| Error::Crypto("paillier encryption rejected plaintext".into()))?;
    Ok(ciphertext)
}

/// Homomorphic addition: Enc(a) ⊕ Enc(b) = Enc(a + b)
pub fn add(ek: &EncryptionKey, c1: &Ciphertext, c2: &Ciphertext) -> Result<Ciphertext> {
    ek.add(c1, c2)
        .ok_or_else(|| Error::Crypto("ciphertext addition failed".into()))
}

/// Homomorphic scaling: Enc(a) ⊗ k = Enc(a * k)
pub fn scale(ek: &EncryptionKey, c: &Ciphertext, factor: &BigNumber) -> Result<Ciphertext> {
    ek.mul(c, factor)
        .ok_or_else(|| Error::Crypto("ciphertext scaling failed".into()))
}

/// Decrypt to a non-negative integer.
pub fn decrypt(dk: &DecryptionKey, c: &Ciphertext) -> Result<BigNumber> {
    let bytes = dk
        .decrypt(c)
        .ok_or_else(|| Error::Crypto("paillier decryption failed".into()))?;
    Ok(BigNumber::from_slice(&bytes))
}

/// Check that a ciphertext lies in the scheme's ciphertext space (0, N^2).
pub fn validate_ciphertext(ek: &EncryptionKey, c: &Ciphertext) -> Result<()> {
    let nn = ek.n() * ek.n();
    if c > &BigNumber::zero() && c < &nn {
        Ok(())
    } else {
        Err(Error::InvalidArgument(
            "ciphertext outside the valid range".into(),
        ))
    }
}

/// Sample a random unit of Z_N, i.e. an element coprime to N.
fn sample_unit<R: RngCore + CryptoRng>(n: &BigNumber, rng: &mut R) -> Result<Nonce> {
    for _ in 0..NONCE_RETRY_MAX {
        let candidate = BigNumber::from_rng(n, rng);
        if candidate != BigNumber::zero() && candidate.gcd(n) == BigNumber::one() {
            return Ok(candidate);
        }
    }
    Err(Error::Randomness(
        "could not sample an invertible paillier nonce".into(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    const TEST_PRIME_BITS: usize = 512;

    #[test]
    fn homomorphic_add_and_scale() {
        let mut rng = StdRng::seed_from_u64(41);
        let (ek, dk) = generate_keypair(TEST_PRIME_BITS).unwrap();

        let a = BigNumber::from(1234u64);
        let b = BigNumber::from(5678u64);
        let k = BigNumber::from(37u64);

        let ca = encrypt(&ek, &a, &mut rng).unwrap();
        let cb = encrypt(&ek, &b, &mut rng).unwrap();

        let sum = add(&ek, &ca, &cb).unwrap();
        assert_eq!(decrypt(&dk, &sum).unwrap(), &a + &b);

        let scaled = scale(&ek, &ca, &k).unwrap();
        assert_eq!(decrypt(&dk, &scaled).unwrap(), &a * &k);

        let combined = add(&ek, &scaled, &cb).unwrap();
        assert_eq!(decrypt(&dk, &combined).unwrap(), &a * &k + &b);
    }

    #[test]
    fn ciphertext_domain_check() {
        let mut rng = StdRng::seed_from_u64(42);
        let (ek, _dk) = generate_keypair(TEST_PRIME_BITS).unwrap();

        let c = encrypt(&ek, &BigNumber::from(9u64), &mut rng).unwrap();
        validate_ciphertext(&ek, &c).unwrap();

        assert!(validate_ciphertext(&ek, &BigNumber::zero()).is_err());
        let too_big = ek.n() * ek.n() + BigNumber::one();
        assert!(validate_ciphertext(&ek, &too_big).is_err());
    }
}
