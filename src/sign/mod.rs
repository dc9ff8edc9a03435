//! Interactive two-party signing
//!
//! Five alternating rounds between a primary cosigner (rounds 1, 3, 5) and a
//! secondary cosigner (rounds 2, 4):
//!
//! 1. Primary samples its nonce k1 and sends a commitment to R1 = k1·G.
//! 2. Secondary samples k2 and sends R2 = k2·G with a dlog proof.
//! 3. Primary verifies the proof, opens its commitment and proves its own
//!    nonce; both now derive R = k1·k2·G.
//! 4. Secondary checks the opening and proof, then computes the blinded
//!    partial signature homomorphically under the primary's Paillier key.
//! 5. Primary decrypts, assembles the signature, normalizes it and verifies
//!    it against the aggregate public key before returning it.
//!
//! Sessions are single-use: a failed round aborts the whole session and the
//! cosigner refuses further calls.

mod cosigner;
mod messages;
mod partial;
mod rounds;


pub use cosigner::{PrimaryCosigner, SecondaryCosigner};
pub use messages::{Round1Message, Round2Message, Round3Message, Round4Message};

use k256::{
    elliptic_curve::{bigint::U256, ops::Reduce},
    Scalar,
};
use sha2::{Digest, Sha256};

/// Reduce a message into the scalar field: big-endian reduction of its
/// SHA-256 digest. This is the m' that enters the partial signature, and it
/// matches what a standard prehash verifier computes.
pub fn message_to_scalar(message: &[u8]) -> Scalar {
    let digest = Sha256::digest(message);
    <Scalar as Reduce<U256>>::reduce_bytes(&digest)
}
