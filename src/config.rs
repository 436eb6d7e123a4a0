//! # Protocol Constants & Engine Defaults
//!
//! Every magic number in Drawbridge lives here. The wire-facing values
//! (payload tag, signature standard, key prefixes) are fixed by the vault's
//! relay and must never drift; the timing values are defaults that callers
//! can override through [`EngineConfig`](crate::withdraw::EngineConfig).

use std::time::Duration;

// ---------------------------------------------------------------------------
// Vault & Relay Identifiers
// ---------------------------------------------------------------------------

/// The multi-asset custody contract the engine withdraws from.
///
/// Every signature this crate produces is bound to a vault contract id; this
/// is the mainnet default. Override it in `EngineConfig` for other networks.
pub const DEFAULT_VAULT_CONTRACT_ID: &str = "intents.near";

/// The mainnet solver relay that accepts published intents.
///
/// The engine itself never dials this URL — transports do. It is exported so
/// that `RelayTransport` implementations and operators share one well-known
/// endpoint instead of each hardcoding their own.
pub const DEFAULT_SOLVER_RELAY_URL: &str = "https://solver-relay-v2.chaindefuser.com/rpc";

// ---------------------------------------------------------------------------
// Wire Format
// ---------------------------------------------------------------------------

/// Signature standard tag carried in the publish envelope.
pub const SIGNATURE_STANDARD: &str = "nep413";

/// Little-endian `u32` prefix of the signable byte sequence.
///
/// NEP-413 reserves the discriminant `2^31 + 413` so that an off-chain
/// message pre-hash can never collide with an on-chain transaction, whose
/// serialized prefix is always below `2^31`. Part of the wire format —
/// changing it invalidates every signature against the relay.
pub const PAYLOAD_MESSAGE_TAG: u32 = (1 << 31) + 413;

/// Namespace prefix carried by fungible-token asset ids inside the vault
/// (e.g. `nep141:usdc.token.near`). Stripped to obtain the bare token
/// contract id embedded in the withdrawal message.
pub const FT_ASSET_NAMESPACE: &str = "nep141:";

/// Action kind for a fungible-token withdrawal intent.
pub const WITHDRAW_INTENT_KIND: &str = "ft_withdraw";

// ---------------------------------------------------------------------------
// Cryptographic Parameters
// ---------------------------------------------------------------------------

/// Encoding prefix for Ed25519 key and signature material on the wire.
pub const ED25519_PREFIX: &str = "ed25519:";

/// Nonce length in bytes. The relay rejects any previously-seen nonce per
/// signer, so 32 bytes of CSPRNG output makes accidental reuse a non-event.
pub const NONCE_LENGTH: usize = 32;

/// Ed25519 seed length. A 32-byte secret key *is* the seed.
pub const KEY_SEED_LENGTH: usize = 32;

/// Length of an expanded Ed25519 secret key (seed || public key). Only the
/// first 32 bytes are used as the seed.
pub const EXPANDED_KEY_LENGTH: usize = 64;

// ---------------------------------------------------------------------------
// Settlement Polling
// ---------------------------------------------------------------------------

/// Default pause between settlement-status polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Default total wait budget for settlement before the outcome is reported
/// as indeterminate. Exceeding the budget does not cancel the published
/// intent — nothing can, once it is on the relay.
pub const DEFAULT_POLL_BUDGET: Duration = Duration::from_secs(120);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_tag_is_offset_from_sign_bit() {
        assert_eq!(PAYLOAD_MESSAGE_TAG, 2_147_484_061);
        assert!(PAYLOAD_MESSAGE_TAG > 1 << 31);
    }

    #[test]
    fn poll_budget_covers_multiple_intervals() {
        assert!(DEFAULT_POLL_BUDGET.as_millis() > 10 * DEFAULT_POLL_INTERVAL.as_millis());
    }
}
