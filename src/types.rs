//! Core types shared across the crate

use k256::{
    ecdsa,
    ecdsa::signature::hazmat::PrehashVerifier,
    elliptic_curve::{
        bigint::{Encoding, U256},
        ops::Reduce,
        scalar::IsHigh,
        sec1::{FromEncodedPoint, ToEncodedPoint},
        Curve, Group,
    },
    AffinePoint, EncodedPoint, ProjectivePoint, Scalar, Secp256k1,
};
use libpaillier::unknown_order::BigNumber;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{Error, Result};

/// Shareholder identifier, doubling as the Shamir evaluation point.
/// Zero is never a valid id.
pub type ShareholderId = u64;

/// Unique session identifier for one signing attempt
pub type SessionId = [u8; 32];

/// The access structure a shard belongs to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quorum {
    /// Minimum number of shareholders needed to sign
    pub threshold: usize,
    /// All shareholder ids in the scheme
    pub shareholders: Vec<ShareholderId>,
}

impl Quorum {
    pub fn new(threshold: usize, shareholders: Vec<ShareholderId>) -> Result<Self> {
        let quorum = Self {
            threshold,
            shareholders,
        };
        quorum.validate()?;
        Ok(quorum)
    }

    pub fn validate(&self) -> Result<()> {
        if self.threshold < 2 {
            return Err(Error::InvalidArgument(
                "threshold must be at least 2".into(),
            ));
        }
        if self.shareholders.len() < self.threshold {
            return Err(Error::InvalidArgument(format!(
                "quorum of {} cannot meet threshold {}",
                self.shareholders.len(),
                self.threshold
            )));
        }
        let mut seen = std::collections::BTreeSet::new();
        for &id in &self.shareholders {
            if id == 0 {
                return Err(Error::InvalidArgument(
                    "shareholder id zero is reserved".into(),
                ));
            }
            if !seen.insert(id) {
                return Err(Error::InvalidArgument(format!(
                    "duplicate shareholder id {id}"
                )));
            }
        }
        Ok(())
    }

    pub fn contains(&self, id: ShareholderId) -> bool {
        self.shareholders.contains(&id)
    }
}

/// An ECDSA signature with recovery information
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    /// r component (32 bytes, big-endian)
    pub r: [u8; 32],
    /// s component (32 bytes, big-endian)
    pub s: [u8; 32],
    /// Recovery id: bit 0 is the nonce point's y parity, bit 1 marks an
    /// x-coordinate at or above the curve order
    pub recovery_id: u8,
}

impl Signature {
    pub fn new(r: [u8; 32], s: [u8; 32], recovery_id: u8) -> Self {
        Self { r, s, recovery_id }
    }

    pub(crate) fn from_scalars(r: Scalar, s: Scalar, recovery_id: u8) -> Self {
        Self {
            r: r.to_bytes().into(),
            s: s.to_bytes().into(),
            recovery_id,
        }
    }

    pub fn r_scalar(&self) -> Scalar {
        <Scalar as Reduce<U256>>::reduce_bytes(&self.r.into())
    }

    pub fn s_scalar(&self) -> Scalar {
        <Scalar as Reduce<U256>>::reduce_bytes(&self.s.into())
    }

    /// Replace a high s with its negation, keeping the signature valid while
    /// making it canonical. Flips the recovery id's parity bit when applied.
    pub fn normalize(&mut self) {
        let s = self.s_scalar();
        if bool::from(s.is_high()) {
            self.s = (-s).to_bytes().into();
            self.recovery_id ^= 1;
        }
    }

    /// Verify against a SEC1-encoded public key and the raw message.
    /// The message is hashed with SHA-256 before verification.
    pub fn verify(&self, public_key: &[u8], message: &[u8]) -> Result<()> {
        let verifying_key = ecdsa::VerifyingKey::from_sec1_bytes(public_key)
            .map_err(|e| Error::InvalidArgument(format!("invalid public key: {e}")))?;
        let signature =
            ecdsa::Signature::from_scalars(self.r, self.s).map_err(|_| Error::InvalidSignature)?;
        let digest = Sha256::digest(message);
        verifying_key
            .verify_prehash(&digest, &signature)
            .map_err(|_| Error::InvalidSignature)
    }

    /// Serialize as 65 bytes: r || s || recovery_id
    pub fn to_bytes(&self) -> [u8; 65] {
        let mut bytes = [0u8; 65];
        bytes[..32].copy_from_slice(&self.r);
        bytes[32..64].copy_from_slice(&self.s);
        bytes[64] = self.recovery_id;
        bytes
    }

    /// Serialize in DER format (without recovery id)
    pub fn to_der(&self) -> Result<Vec<u8>> {
        let signature =
            ecdsa::Signature::from_scalars(self.r, self.s).map_err(|_| Error::InvalidSignature)?;
        Ok(signature.to_der().as_bytes().to_vec())
    }
}

/// SEC1 compressed encoding of a curve point
pub(crate) fn point_to_bytes(point: &ProjectivePoint) -> Vec<u8> {
    point.to_affine().to_encoded_point(true).as_bytes().to_vec()
}

pub(crate) fn point_from_bytes(bytes: &[u8]) -> Result<ProjectivePoint> {
    let encoded = EncodedPoint::from_bytes(bytes)
        .map_err(|e| Error::InvalidArgument(format!("invalid point encoding: {e}")))?;
    let affine = Option::<AffinePoint>::from(AffinePoint::from_encoded_point(&encoded))
        .ok_or_else(|| Error::InvalidArgument("encoding is not a curve point".into()))?;
    Ok(ProjectivePoint::from(affine))
}

/// The secp256k1 group order as an arbitrary-precision integer
pub(crate) fn curve_order() -> BigNumber {
    BigNumber::from_slice(Secp256k1::ORDER.to_be_bytes())
}

pub(crate) fn scalar_to_bn(scalar: &Scalar) -> BigNumber {
    BigNumber::from_slice(scalar.to_bytes().as_slice())
}

/// Reduce a non-negative integer modulo the curve order into a scalar
pub(crate) fn bn_to_scalar(value: &BigNumber) -> Result<Scalar> {
    let reduced = value % &curve_order();
    let bytes = reduced.to_bytes();
    if bytes.len() > 32 {
        return Err(Error::Crypto("reduced value exceeds field width".into()));
    }
    let mut buf = [0u8; 32];
    buf[32 - bytes.len()..].copy_from_slice(&bytes);
    Ok(<Scalar as Reduce<U256>>::reduce_bytes(&buf.into()))
}

/// Serde support for `k256::Scalar` as canonical 32-byte big-endian
pub(crate) mod scalar_serde {
    use k256::{
        elliptic_curve::{bigint::U256, ops::Reduce},
        Scalar,
    };
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(scalar: &Scalar, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_bytes(&scalar.to_bytes())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Scalar, D::Error>
    where
        D: Deserializer<'de>,
    {
        let bytes: Vec<u8> = Vec::deserialize(deserializer)?;
        if bytes.len() != 32 {
            return Err(serde::de::Error::custom("scalar must be 32 bytes"));
        }
        let mut buf = [0u8; 32];
        buf.copy_from_slice(&bytes);
        Ok(<Scalar as Reduce<U256>>::reduce_bytes(&buf.into()))
    }
}

/// Serde support for `k256::ProjectivePoint` as SEC1 compressed bytes
pub(crate) mod point_serde {
    use k256::{
        elliptic_curve::sec1::{FromEncodedPoint, ToEncodedPoint},
        AffinePoint, EncodedPoint, ProjectivePoint,
    };
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(point: &ProjectivePoint, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_bytes(point.to_affine().to_encoded_point(true).as_bytes())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<ProjectivePoint, D::Error>
    where
        D: Deserializer<'de>,
    {
        let bytes: Vec<u8> = Vec::deserialize(deserializer)?;
        let encoded = EncodedPoint::from_bytes(&bytes).map_err(serde::de::Error::custom)?;
        let affine = Option::<AffinePoint>::from(AffinePoint::from_encoded_point(&encoded))
            .ok_or_else(|| serde::de::Error::custom("encoding is not a curve point"))?;
        Ok(ProjectivePoint::from(affine))
    }
}

/// Reject the identity and return the point otherwise.
pub(crate) fn reject_identity(point: &ProjectivePoint, what: &str) -> Result<()> {
    if bool::from(point.is_identity()) {
        return Err(Error::InvalidArgument(format!("{what} is the identity point")));
    }
    Ok(())
}
