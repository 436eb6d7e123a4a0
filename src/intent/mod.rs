//! # Intent Construction & Signing
//!
//! A withdrawal leaves this crate as a signed intent: a canonical message
//! string, a fresh nonce, and an Ed25519 signature binding both to one
//! specific vault contract. The relay reconstructs the exact same bytes
//! independently — any deviation on our side produces a signature that
//! verifies against nothing, and a withdrawal that goes nowhere.
//!
//! ```text
//! message.rs — canonical withdrawal message (deterministic JSON)
//! signing.rs — nonce, key handling, pre-hash, Ed25519 signature
//! ```

pub mod message;
pub mod signing;

pub use message::{IntentAction, WithdrawIntentMessage};
pub use signing::{SignedIntentPayload, SignerCredentials, SigningError};
