//! Non-interactive zero-knowledge proofs

pub mod dlog;
