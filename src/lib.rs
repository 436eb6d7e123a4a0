// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Drawbridge — Vault Withdrawal Engine
//!
//! Drawbridge moves funds *out* of a shared multi-asset intents vault, even
//! when a user's balance of an economically-equivalent token is scattered
//! across several chain-specific variants (USDC bridged from three chains is
//! three distinct vault assets, whether the user thinks of it that way or not).
//!
//! Given a withdrawal request — a symbol, an amount (fixed or a percentage of
//! the total across variants), and a receiver — the engine:
//!
//! 1. Resolves the amount, summing balances across every variant of the
//!    symbol when a percentage is requested.
//! 2. Enforces the variant's minimum-withdrawal policy before touching
//!    anything irreversible.
//! 3. Opportunistically converts sibling-variant balances into the target
//!    variant via the vault's swap primitive, one sibling at a time, stopping
//!    the moment the target balance is sufficient. Individual swap failures
//!    are tolerated — a partial consolidation can still fund the withdrawal.
//! 4. Re-reads the target balance from chain (never trusting the working
//!    copy), clamping to the full available balance when the request
//!    overshoots.
//! 5. Builds the canonical withdrawal message, generates a fresh nonce,
//!    signs the contract-bound pre-hash with Ed25519, and publishes the
//!    payload to the vault's relay.
//! 6. Polls the relay until the intent settles on-chain, fails terminally,
//!    or the poll budget runs out.
//!
//! ## Architecture
//!
//! - **config** — Protocol constants and engine defaults.
//! - **catalog** — The token-variant registry: one symbol, many variants.
//! - **amount** — Fixed-point decimal parsing and smallest-unit conversion.
//! - **balance** — Balance snapshots and the oracle trait that fills them.
//! - **swap** — The swap-execution trait used during consolidation.
//! - **intent** — Canonical message construction, nonce, and signing.
//! - **relay** — The relay transport trait, publish envelope, and the
//!   settlement poller.
//! - **withdraw** — The orchestration core tying all of the above together.
//!
//! ## Design Philosophy
//!
//! 1. Nothing here owns persistent state. Every call receives account
//!    identity, credentials, and catalogue data as arguments.
//! 2. Network effects live behind async traits. The engine never opens a
//!    socket itself, which is why every flow in this crate is testable
//!    without one.
//! 3. Working balances computed during consolidation are advisory. The only
//!    balance that authorizes a signature is one freshly read from chain.
//! 4. If it touches money, it has tests. Plural.

pub mod amount;
pub mod balance;
pub mod catalog;
pub mod config;
pub mod intent;
pub mod relay;
pub mod swap;
pub mod withdraw;

pub use amount::{AmountError, AmountSpec};
pub use balance::{BalanceOracle, BalanceSnapshot};
pub use catalog::{CatalogError, TokenVariant, VariantCatalog};
pub use intent::message::WithdrawIntentMessage;
pub use intent::signing::{SignedIntentPayload, SignerCredentials, SigningError};
pub use relay::poller::{SettlementOutcome, SettlementPoller};
pub use relay::{PublishAck, PublishIntentRequest, RelayTransport, SettlementStatus};
pub use swap::{SwapExecutor, SwapFill};
pub use withdraw::{
    EngineConfig, WithdrawEngine, WithdrawError, WithdrawReceipt, WithdrawalRequest,
};
