//! # Relay Wire Format & Transport Seam
//!
//! A signed intent reaches the chain through the vault's relay: one
//! JSON-RPC publish call, then status polls until the relay reports the
//! intent settled or dead. This module owns the wire shapes — the publish
//! envelope the relay expects and the acknowledgment/status records it
//! returns — and the [`RelayTransport`] trait that moves them.
//!
//! The engine never constructs an HTTP client. Production transports wrap
//! whatever client the host application already has; tests wrap a `Vec`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::SIGNATURE_STANDARD;
use crate::intent::signing::SignedIntentPayload;

pub mod poller;

// ---------------------------------------------------------------------------
// Publish Envelope
// ---------------------------------------------------------------------------

/// The JSON-RPC 2.0 request that publishes a signed intent.
///
/// Field order is declaration order; the envelope is stable so transports
/// and tests can assert against its serialized form.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishIntentRequest {
    pub id: u32,
    pub jsonrpc: String,
    pub method: String,
    pub params: Vec<PublishIntentParams>,
}

/// Parameters of a `publish_intent` call.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishIntentParams {
    /// Solver quote hashes backing the intent. Withdrawals consume no
    /// quotes, so this is always empty here — but the field is part of the
    /// relay's schema and must be present.
    pub quote_hashes: Vec<String>,
    pub signed_data: SignedData,
}

/// The signed payload in the relay's expected shape.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedData {
    pub payload: PayloadFields,
    /// Signature standard identifier (`nep413`).
    pub standard: String,
    /// `ed25519:`-tagged base58 signature.
    pub signature: String,
    /// `ed25519:`-tagged base58 public key.
    pub public_key: String,
}

/// The signed-over fields: exactly what the relay re-hashes to verify.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayloadFields {
    pub message: String,
    pub nonce: String,
    pub recipient: String,
}

impl PublishIntentRequest {
    /// Wraps a signed payload in the relay's publish envelope.
    pub fn new(payload: &SignedIntentPayload) -> Self {
        Self {
            id: 1,
            jsonrpc: "2.0".to_string(),
            method: "publish_intent".to_string(),
            params: vec![PublishIntentParams {
                quote_hashes: Vec::new(),
                signed_data: SignedData {
                    payload: PayloadFields {
                        message: payload.message().to_string(),
                        nonce: payload.nonce().to_string(),
                        recipient: payload.recipient().to_string(),
                    },
                    standard: SIGNATURE_STANDARD.to_string(),
                    signature: payload.signature().to_string(),
                    public_key: payload.public_key().to_string(),
                },
            }],
        }
    }
}

// ---------------------------------------------------------------------------
// Relay Responses
// ---------------------------------------------------------------------------

/// The relay's immediate answer to a publish call.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PublishAck {
    /// `"OK"` when the relay accepted the intent for settlement. Anything
    /// else is a rejection and the withdrawal is over for this attempt.
    pub status: String,

    /// The relay-assigned intent identifier, used for settlement polling.
    pub intent_hash: Option<String>,

    /// Relay diagnostic for non-`OK` statuses, passed through verbatim.
    pub diagnostic: Option<Value>,
}

impl PublishAck {
    /// Returns `true` when the relay accepted the intent.
    pub fn is_ok(&self) -> bool {
        self.status == "OK"
    }
}

/// Where a published intent currently stands.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum SettlementStatus {
    /// Not yet terminal; keep polling.
    Pending,
    /// Finalized on-chain.
    Settled {
        /// The on-chain transaction hash — the proof the caller keeps.
        tx_hash: String,
    },
    /// The relay gave up on the intent. Terminal.
    Failed { diagnostic: Option<Value> },
}

// ---------------------------------------------------------------------------
// Transport
// ---------------------------------------------------------------------------

/// Moves publish requests and status queries to the relay and back.
///
/// Both methods return `Err` only for transport-level trouble (unreachable
/// endpoint, malformed response). A *rejection* is data, not an error: it
/// comes back as a non-`OK` [`PublishAck`] or a
/// [`SettlementStatus::Failed`].
#[async_trait]
pub trait RelayTransport: Send + Sync {
    /// Submits a publish envelope.
    async fn publish(&self, request: &PublishIntentRequest) -> anyhow::Result<PublishAck>;

    /// Looks up the settlement status of a published intent.
    async fn settlement_status(&self, intent_hash: &str) -> anyhow::Result<SettlementStatus>;
}

#[async_trait]
impl<T: RelayTransport + ?Sized> RelayTransport for &T {
    async fn publish(&self, request: &PublishIntentRequest) -> anyhow::Result<PublishAck> {
        (**self).publish(request).await
    }

    async fn settlement_status(&self, intent_hash: &str) -> anyhow::Result<SettlementStatus> {
        (**self).settlement_status(intent_hash).await
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
