//! # Nonce, Keys, and the Contract-Bound Signature
//!
//! Signing is the point of no return for a withdrawal, so this module is
//! strict about the three things that make a signature worth trusting:
//!
//! - **The nonce is fresh.** 32 bytes from the OS CSPRNG per signing
//!   operation, never reused. The relay enforces nonce uniqueness per
//!   signer and rejects replays; our job is to never hand it a duplicate.
//! - **The signature binds the contract.** We sign a SHA-256 hash over a
//!   tagged serialization of `(message, recipient, nonce)` — not the raw
//!   message. A payload signed for one vault contract cannot be replayed
//!   against another, and the same message signed twice carries two
//!   different hashes.
//! - **Key material stays contained.** Secret keys enter as strings, are
//!   decoded for the duration of one signing call, and are never logged or
//!   printed. `Debug` on [`SignerCredentials`] shows the account, not the key.
//!
//! Signing performs no I/O and reads no chain state. Given the same inputs
//! and the same nonce it is fully deterministic, which is what makes the
//! byte layout testable.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use ed25519_dalek::{Signer, SigningKey};
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};
use std::fmt;
use thiserror::Error;

use crate::config::{
    ED25519_PREFIX, EXPANDED_KEY_LENGTH, KEY_SEED_LENGTH, NONCE_LENGTH, PAYLOAD_MESSAGE_TAG,
};
use crate::intent::message::WithdrawIntentMessage;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors from key handling and payload signing.
#[derive(Debug, Error)]
pub enum SigningError {
    /// The decoded secret key is neither a 32-byte seed nor a 64-byte
    /// expanded key. A fatal configuration error — nothing was signed and
    /// no network call was made.
    #[error("invalid secret key length: {0} bytes (expected 32 or 64)")]
    InvalidKeyLength(usize),

    /// The secret key string is not valid base58.
    #[error("secret key is not valid base58")]
    InvalidKeyEncoding(#[from] bs58::decode::Error),

    /// Canonical message serialization failed.
    #[error("message serialization failed: {0}")]
    Message(#[from] serde_json::Error),
}

// ---------------------------------------------------------------------------
// SignerCredentials
// ---------------------------------------------------------------------------

/// Account identity plus the secret key that speaks for it.
///
/// Passed explicitly into each withdrawal call — the engine holds no
/// ambient wallet state. The secret key accepts the common formats key
/// material actually arrives in: with or without the `ed25519:` prefix,
/// and with stray underscores (env files and copy-paste both produce them).
#[derive(Clone)]
pub struct SignerCredentials {
    /// The vault account authorizing withdrawals.
    pub account_id: String,

    /// Base58 secret key material. Kept private to the crate; there is no
    /// getter that hands it out.
    secret_key: String,
}

impl SignerCredentials {
    /// Creates credentials for the given account.
    pub fn new(account_id: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            account_id: account_id.into(),
            secret_key: secret_key.into(),
        }
    }

    pub(crate) fn secret_key(&self) -> &str {
        &self.secret_key
    }
}

impl fmt::Debug for SignerCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Never print secret key material. Not even "partially."
        write!(f, "SignerCredentials(account={})", self.account_id)
    }
}

// ---------------------------------------------------------------------------
// SignedIntentPayload
// ---------------------------------------------------------------------------

/// The authenticated withdrawal instruction, ready to publish.
///
/// Write-once: constructed by [`sign_intent`], then only read. There are no
/// setters and the fields are private — a payload that could be edited
/// after signing would be a payload whose signature means nothing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignedIntentPayload {
    message: String,
    nonce: String,
    recipient: String,
    signature: String,
    public_key: String,
}

impl SignedIntentPayload {
    /// The canonical message string the signature covers.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The base64-encoded 32-byte nonce.
    pub fn nonce(&self) -> &str {
        &self.nonce
    }

    /// The vault contract the signature is bound to.
    pub fn recipient(&self) -> &str {
        &self.recipient
    }

    /// The `ed25519:`-tagged base58 signature.
    pub fn signature(&self) -> &str {
        &self.signature
    }

    /// The `ed25519:`-tagged base58 public key of the signer.
    pub fn public_key(&self) -> &str {
        &self.public_key
    }
}

// ---------------------------------------------------------------------------
// Key Decoding
// ---------------------------------------------------------------------------

/// Decodes a base58 secret key string into a signing key.
///
/// Accepts a 32-byte seed or a 64-byte expanded key (seed followed by the
/// public key) — in the expanded case only the first 32 bytes are used and
/// the public half is re-derived, so a corrupted public half cannot produce
/// a mismatched keypair. Any other length is [`SigningError::InvalidKeyLength`].
pub fn decode_secret_key(secret_key: &str) -> Result<SigningKey, SigningError> {
    let stripped = secret_key
        .strip_prefix(ED25519_PREFIX)
        .unwrap_or(secret_key);
    // Underscores show up in key material pasted through env files.
    let cleaned: String = stripped.chars().filter(|&c| c != '_').collect();

    let bytes = bs58::decode(cleaned.as_str()).into_vec()?;

    let mut seed = [0u8; KEY_SEED_LENGTH];
    match bytes.len() {
        KEY_SEED_LENGTH => seed.copy_from_slice(&bytes),
        EXPANDED_KEY_LENGTH => seed.copy_from_slice(&bytes[..KEY_SEED_LENGTH]),
        n => return Err(SigningError::InvalidKeyLength(n)),
    }

    Ok(SigningKey::from_bytes(&seed))
}

// ---------------------------------------------------------------------------
// Nonce
// ---------------------------------------------------------------------------

/// Generates a fresh 32-byte nonce from the OS CSPRNG.
pub fn generate_nonce() -> [u8; NONCE_LENGTH] {
    let mut nonce = [0u8; NONCE_LENGTH];
    OsRng.fill_bytes(&mut nonce);
    nonce
}

// ---------------------------------------------------------------------------
// Pre-Hash
// ---------------------------------------------------------------------------

/// The canonical byte sequence the signature hash covers.
///
/// Layout, in order:
///
/// - tag: `u32` little-endian ([`PAYLOAD_MESSAGE_TAG`]) — keeps off-chain
///   message hashes disjoint from on-chain transaction hashes
/// - message: `u32` LE byte length, then UTF-8 bytes
/// - nonce: 32 raw bytes, no length prefix
/// - recipient: `u32` LE byte length, then UTF-8 bytes
/// - `0x00` — no callback URL
///
/// The length prefixes prevent ambiguity when one field's suffix matches
/// another's prefix. This layout is wire format and must never change.
pub fn signable_bytes(message: &str, recipient: &str, nonce: &[u8; NONCE_LENGTH]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(message.len() + recipient.len() + NONCE_LENGTH + 16);

    buf.extend_from_slice(&PAYLOAD_MESSAGE_TAG.to_le_bytes());

    buf.extend_from_slice(&(message.len() as u32).to_le_bytes());
    buf.extend_from_slice(message.as_bytes());

    buf.extend_from_slice(nonce);

    buf.extend_from_slice(&(recipient.len() as u32).to_le_bytes());
    buf.extend_from_slice(recipient.as_bytes());

    buf.push(0x00);

    buf
}

/// SHA-256 digest of the signable bytes — the actual signing input.
pub fn payload_hash(message: &str, recipient: &str, nonce: &[u8; NONCE_LENGTH]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(signable_bytes(message, recipient, nonce));
    let digest = hasher.finalize();
    let mut output = [0u8; 32];
    output.copy_from_slice(&digest);
    output
}

// ---------------------------------------------------------------------------
// Signing
// ---------------------------------------------------------------------------

/// Signs a withdrawal message for one vault contract, with a fresh nonce.
///
/// This is the only public entry point that produces a
/// [`SignedIntentPayload`]. Deterministic given its inputs except for the
/// nonce; performs no I/O.
pub fn sign_intent(
    secret_key: &str,
    vault_contract_id: &str,
    message: &WithdrawIntentMessage,
) -> Result<SignedIntentPayload, SigningError> {
    sign_intent_with_nonce(secret_key, vault_contract_id, message, generate_nonce())
}

/// Signing core with an explicit nonce. Private: a caller-supplied nonce is
/// a replay-rejection waiting to happen everywhere except in tests.
fn sign_intent_with_nonce(
    secret_key: &str,
    vault_contract_id: &str,
    message: &WithdrawIntentMessage,
    nonce: [u8; NONCE_LENGTH],
) -> Result<SignedIntentPayload, SigningError> {
    let signing_key = decode_secret_key(secret_key)?;
    let canonical = message.to_canonical_json()?;

    let hash = payload_hash(&canonical, vault_contract_id, &nonce);
    let signature = signing_key.sign(&hash);
    let public_key = signing_key.verifying_key();

    Ok(SignedIntentPayload {
        message: canonical,
        nonce: BASE64.encode(nonce),
        recipient: vault_contract_id.to_string(),
        signature: format!(
            "{}{}",
            ED25519_PREFIX,
            bs58::encode(signature.to_bytes()).into_string()
        ),
        public_key: format!(
            "{}{}",
            ED25519_PREFIX,
            bs58::encode(public_key.to_bytes()).into_string()
        ),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
