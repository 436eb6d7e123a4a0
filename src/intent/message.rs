//! # Canonical Withdrawal Message
//!
//! The message is the human- and contract-readable core of a signed intent:
//! who is withdrawing, what, how much, to whom, and onto which chain. The
//! signature covers a hash of this exact string, so construction must be
//! byte-for-byte reproducible — the relay rebuilds the message from the
//! same parameters and compares hashes, and a single reordered field or
//! stray space yields a signature that verifies against nothing.
//!
//! Determinism here rides on two guarantees: `serde_json` serializes struct
//! fields in declaration order, and compact encoding inserts no whitespace.
//! The field order below is therefore wire format. Do not reorder.

use serde::{Deserialize, Serialize};

use crate::config::WITHDRAW_INTENT_KIND;

// ---------------------------------------------------------------------------
// Message Types
// ---------------------------------------------------------------------------

/// The signable withdrawal instruction.
///
/// One message carries one signer and a list of intent actions. The engine
/// only ever emits a single-action list today, but the relay's message shape
/// is a list, and the wire format follows the relay.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawIntentMessage {
    /// The vault account authorizing the withdrawal.
    pub signer_id: String,

    /// The actions being authorized, in execution order.
    pub intents: Vec<IntentAction>,
}

/// A single authorized action. The `intent` tag is serialized first,
/// followed by the variant fields in declaration order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "intent", rename_all = "snake_case")]
pub enum IntentAction {
    /// Withdraw a fungible token from the vault to an external receiver.
    FtWithdraw {
        /// Bare token contract id (namespace prefix already stripped).
        token: String,
        /// Destination account or address.
        receiver_id: String,
        /// Smallest-unit amount, decimal-string encoded. Integers on this
        /// wire are strings; a JSON number would lose precision past 2^53
        /// in half the relay's client stacks.
        amount: String,
        /// The chain the funds land on.
        destination_chain: String,
    },
}

impl WithdrawIntentMessage {
    /// Builds a single-action fungible-token withdrawal message.
    pub fn ft_withdraw(
        signer_id: impl Into<String>,
        token: impl Into<String>,
        receiver_id: impl Into<String>,
        amount: u128,
        destination_chain: impl Into<String>,
    ) -> Self {
        Self {
            signer_id: signer_id.into(),
            intents: vec![IntentAction::FtWithdraw {
                token: token.into(),
                receiver_id: receiver_id.into(),
                amount: amount.to_string(),
                destination_chain: destination_chain.into(),
            }],
        }
    }

    /// Serializes the message to its canonical compact-JSON form — the
    /// exact string the signature covers.
    pub fn to_canonical_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

impl IntentAction {
    /// The action kind tag as it appears on the wire.
    pub fn kind(&self) -> &'static str {
        match self {
            IntentAction::FtWithdraw { .. } => WITHDRAW_INTENT_KIND,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
