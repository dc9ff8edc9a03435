//! # Lindell17 Core
//!
//! Core primitives for the Lindell 2017 two-party threshold ECDSA signing
//! protocol.
//!
//! This crate provides the fundamental building blocks for:
//! - Interactive two-party signing over a 2-of-n Shamir-shared key
//! - Trusted-dealer shard issuance
//!
//! ## Protocol Overview
//!
//! A signing session runs five alternating rounds between two cosigners.
//! The primary (rounds 1, 3, 5) commits to its nonce point before seeing the
//! secondary's, both prove knowledge of their nonces, and the secondary
//! (rounds 2, 4) combines its secret material with the primary's
//! Paillier-encrypted share entirely in ciphertext space. The primary
//! decrypts, assembles a standard single-signer ECDSA signature and verifies
//! it before returning. Neither party ever learns the other's share or the
//! combined private key.
//!
//! ## Example
//!
//! ```rust,ignore
//! use lindell17_core::sign::{PrimaryCosigner, SecondaryCosigner};
//!
//! let mut primary = PrimaryCosigner::new(shard1, 2, session_id, rng1)?;
//! let mut secondary = SecondaryCosigner::new(shard2, 1, session_id, rng2)?;
//!
//! let r1 = primary.round1()?;
//! let r2 = secondary.round2(&r1)?;
//! let r3 = primary.round3(&r2)?;
//! let r4 = secondary.round4(&r3, message)?;
//! let signature = primary.round5(&r4, message)?;
//! ```

pub mod commitments;
pub mod dealer;
pub mod error;
pub mod paillier;
pub mod proofs;
pub mod sharing;
pub mod shard;
pub mod sign;
pub mod types;

pub use error::{Error, Result, Role};
pub use shard::Shard;
pub use sign::{PrimaryCosigner, SecondaryCosigner};
pub use types::{Quorum, SessionId, ShareholderId, Signature};

/// Protocol version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Signing threshold (always 2 in this protocol)
pub const THRESHOLD: usize = 2;
