//! # Withdrawal Orchestration
//!
//! The full path from "withdraw 75% of my USDC to this address" to an
//! on-chain transaction hash:
//!
//! 1. **Resolve** — pick the target variant, turn the amount string into a
//!    concrete quantity.
//! 2. **Guard** — reject anything under the variant's withdrawal minimum
//!    before a single irreversible thing happens.
//! 3. **Consolidate** — pull sibling-variant balances into the target as
//!    needed, tolerating individual swap failures.
//! 4. **Reconcile** — re-read the target balance from chain and clamp the
//!    request to what is actually there. The working numbers from step 3
//!    never authorize anything.
//! 5. **Sign** — canonical message, fresh nonce, contract-bound Ed25519
//!    signature ([`crate::intent`]).
//! 6. **Publish & poll** — hand the payload to the relay and wait for
//!    settlement ([`crate::relay`]).
//!
//! The engine owns no state between calls. Each withdrawal gets its own
//! balance snapshots and its own nonce; concurrent calls for different
//! accounts share nothing but the catalogue, which is read-only.

use std::time::Duration;

use rust_decimal::Decimal;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::amount::{from_atomic, to_atomic, AmountError, AmountSpec};
use crate::balance::BalanceOracle;
use crate::catalog::{CatalogError, VariantCatalog};
use crate::config::{DEFAULT_POLL_BUDGET, DEFAULT_POLL_INTERVAL, DEFAULT_VAULT_CONTRACT_ID};
use crate::intent::message::WithdrawIntentMessage;
use crate::intent::signing::{sign_intent, SignerCredentials, SigningError};
use crate::relay::poller::{SettlementOutcome, SettlementPoller};
use crate::relay::{PublishIntentRequest, RelayTransport};
use crate::swap::SwapExecutor;

mod consolidate;
mod resolve;

use consolidate::consolidate;
use resolve::resolve_amount;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Everything that can stop a withdrawal.
///
/// The ordering of the flow is visible in the taxonomy: parse and policy
/// errors fire before anything irreversible, collaborator failures abort
/// mid-flight, and the settlement variants describe a payload that already
/// left the building. Nothing past publish is retried automatically — a
/// resubmission needs a fresh nonce and a deliberate new call.
#[derive(Debug, Error)]
pub enum WithdrawError {
    /// The amount string failed to parse or convert. No side effects.
    #[error(transparent)]
    Amount(#[from] AmountError),

    /// Symbol or variant lookup failed against the catalogue.
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// Percentage resolution overflowed decimal arithmetic.
    #[error("percentage resolution overflowed: {percent}% of {total}")]
    AmountOverflow { total: Decimal, percent: Decimal },

    /// The resolved amount is under the variant's withdrawal minimum.
    /// Terminal; nothing was swapped and nothing was signed.
    #[error("you need to withdraw at least {minimum} {symbol} or the funds may be lost")]
    BelowMinimum { symbol: String, minimum: Decimal },

    /// Nothing to withdraw after reconciliation. Terminal; no payload
    /// was built.
    #[error("no {symbol} balance available to withdraw")]
    ZeroBalance { symbol: String },

    /// Key decoding or signing failed. Fatal configuration error, caught
    /// before any publish.
    #[error(transparent)]
    Signing(#[from] SigningError),

    /// The balance oracle could not complete a read.
    #[error("balance read failed: {0:#}")]
    Oracle(anyhow::Error),

    /// The relay transport failed outright (as opposed to answering with
    /// a rejection).
    #[error("relay transport failed: {0:#}")]
    Relay(anyhow::Error),

    /// The relay declined the signed payload. Fatal for this attempt.
    #[error("relay rejected the intent (status {status}): {diagnostic}")]
    PublishRejected { status: String, diagnostic: Value },

    /// The relay accepted the intent and later reported it terminally
    /// failed.
    #[error("intent settlement failed: {diagnostic}")]
    SettlementFailed { diagnostic: Value },

    /// No terminal answer within the poll budget. **Indeterminate**, not a
    /// failure: the intent cannot be cancelled and may still settle. Check
    /// the intent status out of band before assuming anything about the
    /// funds.
    #[error(
        "no settlement confirmation for intent {intent_hash} after {elapsed:?}; \
         the withdrawal may still complete"
    )]
    SettlementTimeout {
        intent_hash: String,
        elapsed: Duration,
    },
}

// ---------------------------------------------------------------------------
// Request & Receipt
// ---------------------------------------------------------------------------

/// One withdrawal, as the caller states it.
#[derive(Clone, Debug)]
pub struct WithdrawalRequest {
    /// Token symbol, any casing.
    pub symbol: String,

    /// Amount string: a decimal literal (`"10.5"`) or a percentage of the
    /// total balance across all variants (`"75%"`).
    pub amount: String,

    /// Destination account or address on the target chain.
    pub receiver_id: String,

    /// Which chain to withdraw to. `None` selects the symbol's first
    /// catalogue variant.
    pub destination_chain: Option<String>,
}

/// Proof of a settled withdrawal, plus anything the caller should know
/// about how the request was adjusted along the way.
#[derive(Clone, Debug)]
pub struct WithdrawReceipt {
    /// The amount actually withdrawn, human units. Equal to the request
    /// unless the clamp note below says otherwise.
    pub amount: Decimal,

    /// The same amount in smallest units — exactly what the signed
    /// message carried.
    pub amount_atomic: u128,

    /// The on-chain transaction hash of the settled intent.
    pub tx_hash: String,

    /// Informational adjustments: the clamp note when the request exceeded
    /// the available balance, and one warning per sibling swap that failed
    /// during consolidation.
    pub notes: Vec<String>,
}

// ---------------------------------------------------------------------------
// Engine Configuration
// ---------------------------------------------------------------------------

/// Tunables for the withdrawal engine.
#[derive(Clone, Debug)]
pub struct EngineConfig {
    /// The vault contract every signature is bound to.
    pub vault_contract_id: String,

    /// Pause between settlement polls.
    pub poll_interval: Duration,

    /// Total settlement wait before reporting an indeterminate timeout.
    pub poll_budget: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            vault_contract_id: DEFAULT_VAULT_CONTRACT_ID.to_string(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            poll_budget: DEFAULT_POLL_BUDGET,
        }
    }
}

// ---------------------------------------------------------------------------
// WithdrawEngine
// ---------------------------------------------------------------------------

/// The withdrawal engine: catalogue plus the three collaborator seams.
///
/// Construct once, call [`withdraw`](Self::withdraw) per request. The
/// engine is `Send + Sync` when its collaborators are; calls for disjoint
/// accounts can run concurrently without coordination because every piece
/// of mutable state lives inside a single call's stack frame.
pub struct WithdrawEngine<O, S, R> {
    oracle: O,
    swapper: S,
    relay: R,
    catalog: VariantCatalog,
    config: EngineConfig,
}

impl<O, S, R> WithdrawEngine<O, S, R>
where
    O: BalanceOracle,
    S: SwapExecutor,
    R: RelayTransport,
{
    /// Creates an engine with default configuration.
    pub fn new(oracle: O, swapper: S, relay: R, catalog: VariantCatalog) -> Self {
        Self::with_config(oracle, swapper, relay, catalog, EngineConfig::default())
    }

    /// Creates an engine with explicit configuration.
    pub fn with_config(
        oracle: O,
        swapper: S,
        relay: R,
        catalog: VariantCatalog,
        config: EngineConfig,
    ) -> Self {
        Self {
            oracle,
            swapper,
            relay,
            catalog,
            config,
        }
    }

    /// Runs one withdrawal end to end.
    ///
    /// Returns a [`WithdrawReceipt`] only after the relay confirms on-chain
    /// settlement. See [`WithdrawError`] for every way this can end
    /// differently — in particular, a [`WithdrawError::SettlementTimeout`]
    /// means *unknown*, not *lost*.
    pub async fn withdraw(
        &self,
        credentials: &SignerCredentials,
        request: &WithdrawalRequest,
    ) -> Result<WithdrawReceipt, WithdrawError> {
        // Resolve the target variant and the requested quantity.
        let variants = self.catalog.variants_of(&request.symbol)?;
        let (target_index, target) = self
            .catalog
            .select_target(&request.symbol, request.destination_chain.as_deref())?;

        let spec: AmountSpec = request.amount.parse()?;
        let requested =
            resolve_amount(&self.oracle, &credentials.account_id, variants, &spec).await?;
        let requested_atomic = to_atomic(requested, target.decimals)?;

        // Policy gate. Nothing irreversible has happened yet, and nothing
        // will if the amount is under the floor.
        let minimum_atomic = to_atomic(target.min_withdraw, target.decimals)?;
        if requested_atomic < minimum_atomic {
            return Err(WithdrawError::BelowMinimum {
                symbol: target.symbol.clone(),
                minimum: target.min_withdraw,
            });
        }

        info!(
            account = %credentials.account_id,
            symbol = %target.symbol,
            chain = %target.destination_chain,
            amount = %requested,
            "starting withdrawal"
        );

        // Consolidate sibling variants when the symbol has any.
        let mut notes = Vec::new();
        if variants.len() > 1 {
            let report = consolidate(
                &self.oracle,
                &self.swapper,
                &credentials.account_id,
                variants,
                target_index,
                requested,
            )
            .await?;
            debug!(projected = %report.projected_balance, "consolidation finished");
            notes.extend(report.warnings);
        }

        // Authoritative sufficiency check: one fresh read of the target
        // asset. The consolidation estimate is not consulted again.
        let target_ids = [target.asset_id.clone()];
        let available_atomic = self
            .oracle
            .read_balances(&credentials.account_id, &target_ids)
            .await
            .map_err(WithdrawError::Oracle)?
            .raw_amount(&target.asset_id);

        let final_atomic = if requested_atomic > available_atomic {
            let available = from_atomic(available_atomic, target.decimals)?;
            info!(
                requested = %requested,
                %available,
                "requested amount exceeds available balance; clamping"
            );
            notes.push(format!(
                "requested {} {} exceeds the available balance of {}; \
                 withdrawing the full available amount",
                requested, target.symbol, available
            ));
            available_atomic
        } else {
            requested_atomic
        };

        if final_atomic == 0 {
            return Err(WithdrawError::ZeroBalance {
                symbol: target.symbol.clone(),
            });
        }
        let final_amount = from_atomic(final_atomic, target.decimals)?;

        // Build and sign the intent. Everything past this point concerns a
        // payload that must never be altered.
        let message = WithdrawIntentMessage::ft_withdraw(
            credentials.account_id.clone(),
            target.token_contract_id(),
            request.receiver_id.clone(),
            final_atomic,
            target.destination_chain.clone(),
        );
        let payload = sign_intent(
            credentials.secret_key(),
            &self.config.vault_contract_id,
            &message,
        )?;

        let publish_request = PublishIntentRequest::new(&payload);
        let ack = self
            .relay
            .publish(&publish_request)
            .await
            .map_err(WithdrawError::Relay)?;

        if !ack.is_ok() {
            warn!(status = %ack.status, "relay rejected the published intent");
            return Err(WithdrawError::PublishRejected {
                status: ack.status,
                diagnostic: ack.diagnostic.unwrap_or(Value::Null),
            });
        }
        let intent_hash = ack.intent_hash.ok_or_else(|| WithdrawError::PublishRejected {
            status: "OK".to_string(),
            diagnostic: Value::String(
                "relay acknowledged the intent without returning an intent hash".to_string(),
            ),
        })?;

        let poller = SettlementPoller::new(self.config.poll_interval, self.config.poll_budget);
        match poller
            .wait(&self.relay, &intent_hash)
            .await
            .map_err(WithdrawError::Relay)?
        {
            SettlementOutcome::Settled { tx_hash } => {
                info!(%tx_hash, amount = %final_amount, "withdrawal settled");
                Ok(WithdrawReceipt {
                    amount: final_amount,
                    amount_atomic: final_atomic,
                    tx_hash,
                    notes,
                })
            }
            SettlementOutcome::Failed { diagnostic } => Err(WithdrawError::SettlementFailed {
                diagnostic: diagnostic.unwrap_or(Value::Null),
            }),
            SettlementOutcome::TimedOut { elapsed } => Err(WithdrawError::SettlementTimeout {
                intent_hash,
                elapsed,
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::balance::BalanceSnapshot;
    use crate::catalog::TokenVariant;
    use crate::relay::{PublishAck, SettlementStatus};
    use crate::swap::SwapFill;
    use anyhow::anyhow;
    use async_trait::async_trait;
    use rust_decimal::Decimal;
    use std::collections::HashMap;
    use std::str::FromStr;
    use std::sync::Mutex;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn creds() -> SignerCredentials {
        SignerCredentials::new("alice.near", bs58::encode([7u8; 32]).into_string())
    }

    // -- collaborator doubles ------------------------------------------------

    /// Oracle serving a single mutable balance map; consolidation swaps are
    /// not reflected unless a test updates the map through the swapper.
    struct MapOracle {
        balances: Mutex<HashMap<String, u128>>,
        reads: Mutex<Vec<Vec<String>>>,
    }

    impl MapOracle {
        fn new(entries: impl IntoIterator<Item = (&'static str, u128)>) -> Self {
            Self {
                balances: Mutex::new(
                    entries
                        .into_iter()
                        .map(|(k, v)| (k.to_string(), v))
                        .collect(),
                ),
                reads: Mutex::new(Vec::new()),
            }
        }

        fn read_count(&self) -> usize {
            self.reads.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl BalanceOracle for MapOracle {
        async fn read_balances(
            &self,
            _account_id: &str,
            asset_ids: &[String],
        ) -> anyhow::Result<BalanceSnapshot> {
            self.reads.lock().unwrap().push(asset_ids.to_vec());
            let balances = self.balances.lock().unwrap();
            Ok(BalanceSnapshot::from_entries(
                asset_ids
                    .iter()
                    .filter_map(|id| balances.get(id).map(|v| (id.clone(), *v))),
            ))
        }
    }

    /// Swapper that fails for every asset unless scripted, and on success
    /// credits the oracle's map so the post-consolidation re-read sees the
    /// converted funds — the closest double to a real vault.
    struct CreditingSwapper<'a> {
        oracle: &'a MapOracle,
        // from_asset -> (amount_out, raw credit to the target asset)
        fills: HashMap<String, (Decimal, u128)>,
        calls: Mutex<Vec<String>>,
    }

    impl<'a> CreditingSwapper<'a> {
        fn new(
            oracle: &'a MapOracle,
            fills: impl IntoIterator<Item = (&'static str, (&'static str, u128))>,
        ) -> Self {
            Self {
                oracle,
                fills: fills
                    .into_iter()
                    .map(|(from, (out, raw))| (from.to_string(), (dec(out), raw)))
                    .collect(),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl SwapExecutor for CreditingSwapper<'_> {
        async fn swap(
            &self,
            from_asset_id: &str,
            to_asset_id: &str,
            _amount: Decimal,
        ) -> anyhow::Result<SwapFill> {
            self.calls.lock().unwrap().push(from_asset_id.to_string());
            let (amount_out, raw_credit) = self
                .fills
                .get(from_asset_id)
                .cloned()
                .ok_or_else(|| anyhow!("swap unavailable for {from_asset_id}"))?;

            let mut balances = self.oracle.balances.lock().unwrap();
            balances.insert(from_asset_id.to_string(), 0);
            *balances.entry(to_asset_id.to_string()).or_insert(0) += raw_credit;
            Ok(SwapFill { amount_out })
        }
    }

    /// Relay double: configurable ack, scripted statuses, records every
    /// publish for inspection.
    struct StubRelay {
        ack: PublishAck,
        status: SettlementStatus,
        published: Mutex<Vec<PublishIntentRequest>>,
        polls: Mutex<u32>,
    }

    impl StubRelay {
        fn settling(tx_hash: &str) -> Self {
            Self {
                ack: PublishAck {
                    status: "OK".to_string(),
                    intent_hash: Some("intent-1".to_string()),
                    diagnostic: None,
                },
                status: SettlementStatus::Settled {
                    tx_hash: tx_hash.to_string(),
                },
                published: Mutex::new(Vec::new()),
                polls: Mutex::new(0),
            }
        }

        fn rejecting(status: &str) -> Self {
            Self {
                ack: PublishAck {
                    status: status.to_string(),
                    intent_hash: None,
                    diagnostic: Some(serde_json::json!({"reason": "test rejection"})),
                },
                status: SettlementStatus::Pending,
                published: Mutex::new(Vec::new()),
                polls: Mutex::new(0),
            }
        }

        fn published_amount(&self) -> String {
            let published = self.published.lock().unwrap();
            let message: WithdrawIntentMessage = serde_json::from_str(
                &published[0].params[0].signed_data.payload.message,
            )
            .expect("published message parses");
            match message.intents.into_iter().next().unwrap() {
                crate::intent::message::IntentAction::FtWithdraw { amount, .. } => amount,
            }
        }
    }

    #[async_trait]
    impl RelayTransport for StubRelay {
        async fn publish(&self, request: &PublishIntentRequest) -> anyhow::Result<PublishAck> {
            self.published.lock().unwrap().push(request.clone());
            Ok(self.ack.clone())
        }

        async fn settlement_status(
            &self,
            _intent_hash: &str,
        ) -> anyhow::Result<SettlementStatus> {
            *self.polls.lock().unwrap() += 1;
            Ok(self.status.clone())
        }
    }

    // -- fixtures ------------------------------------------------------------

    fn usdc_catalog() -> VariantCatalog {
        VariantCatalog::from_variants([
            TokenVariant {
                symbol: "USDC".to_string(),
                asset_id: "nep141:usdc.near".to_string(),
                decimals: 6,
                min_withdraw: Decimal::ZERO,
                destination_chain: "near".to_string(),
            },
            TokenVariant {
                symbol: "USDC".to_string(),
                asset_id: "nep141:base-usdc.omft.near".to_string(),
                decimals: 6,
                min_withdraw: Decimal::ZERO,
                destination_chain: "base".to_string(),
            },
        ])
        .unwrap()
    }

    fn request(amount: &str) -> WithdrawalRequest {
        WithdrawalRequest {
            symbol: "usdc".to_string(),
            amount: amount.to_string(),
            receiver_id: "bob.near".to_string(),
            destination_chain: Some("near".to_string()),
        }
    }

    // -- scenarios -----------------------------------------------------------

    #[tokio::test]
    async fn percentage_withdrawal_consolidates_and_settles() {
        // NEAR-native 1.0, Base-bridged 0.5; 75% of the 1.5 total is 1.125.
        // The target starts 0.125 short, so the Base sibling is consolidated.
        let oracle = MapOracle::new([
            ("nep141:usdc.near", 1_000_000u128),
            ("nep141:base-usdc.omft.near", 500_000u128),
        ]);
        let swapper =
            CreditingSwapper::new(&oracle, [("nep141:base-usdc.omft.near", ("0.4999", 499_900u128))]);
        let relay = StubRelay::settling("0xabc123");

        let engine = WithdrawEngine::new(&oracle, swapper, &relay, usdc_catalog());
        let receipt = engine.withdraw(&creds(), &request("75%")).await.unwrap();

        assert_eq!(receipt.amount, dec("1.125"));
        assert_eq!(receipt.amount_atomic, 1_125_000);
        assert_eq!(receipt.tx_hash, "0xabc123");
        assert!(receipt.notes.is_empty());
        assert_eq!(relay.published_amount(), "1125000");
        // Reads: percentage resolution, consolidation, final reconciliation.
        assert_eq!(oracle.read_count(), 3);
    }

    #[tokio::test]
    async fn below_minimum_is_rejected_before_any_swap() {
        let catalog = VariantCatalog::from_variants([TokenVariant {
            symbol: "USDC".to_string(),
            asset_id: "nep141:usdc.near".to_string(),
            decimals: 6,
            min_withdraw: dec("1"),
            destination_chain: "near".to_string(),
        }])
        .unwrap();

        let oracle = MapOracle::new([("nep141:usdc.near", 10_000_000u128)]);
        let swapper = CreditingSwapper::new(&oracle, []);
        let relay = StubRelay::settling("0x1");

        let engine = WithdrawEngine::new(&oracle, &swapper, &relay, catalog);
        let err = engine
            .withdraw(&creds(), &request("0.5"))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            WithdrawError::BelowMinimum { ref minimum, .. } if *minimum == dec("1")
        ));
        // A fixed amount needs no resolution read, and the guard fires
        // before consolidation: zero collaborator traffic of any kind.
        assert_eq!(oracle.read_count(), 0);
        assert_eq!(swapper.call_count(), 0);
        assert!(relay.published.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn zero_balance_everywhere_signs_nothing() {
        let oracle = MapOracle::new([]);
        let swapper = CreditingSwapper::new(&oracle, []);
        let relay = StubRelay::settling("0x1");

        let engine = WithdrawEngine::new(&oracle, &swapper, &relay, usdc_catalog());
        let err = engine.withdraw(&creds(), &request("50%")).await.unwrap_err();

        assert!(matches!(err, WithdrawError::ZeroBalance { .. }));
        assert!(relay.published.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn failed_swap_clamps_to_available_balance() {
        // Target holds 1.0 of the 1.5 total; the request wants 1.125 but the
        // only sibling swap fails, so the engine clamps to the authoritative
        // 1.0 and still settles.
        let oracle = MapOracle::new([
            ("nep141:usdc.near", 1_000_000u128),
            ("nep141:base-usdc.omft.near", 500_000u128),
        ]);
        let swapper = CreditingSwapper::new(&oracle, []); // every swap fails
        let relay = StubRelay::settling("0xclamped");

        let engine = WithdrawEngine::new(&oracle, &swapper, &relay, usdc_catalog());
        let receipt = engine.withdraw(&creds(), &request("1.125")).await.unwrap();

        assert_eq!(receipt.amount, dec("1"));
        assert_eq!(receipt.amount_atomic, 1_000_000);
        assert_eq!(relay.published_amount(), "1000000");
        // One swap warning plus the clamp note.
        assert_eq!(receipt.notes.len(), 2);
        assert!(receipt.notes[1].contains("full available amount"));
        assert_eq!(swapper.call_count(), 1);
    }

    #[tokio::test]
    async fn exact_amount_with_sufficient_target_skips_swaps() {
        let oracle = MapOracle::new([
            ("nep141:usdc.near", 2_000_000u128),
            ("nep141:base-usdc.omft.near", 500_000u128),
        ]);
        let swapper = CreditingSwapper::new(&oracle, []);
        let relay = StubRelay::settling("0xdirect");

        let engine = WithdrawEngine::new(&oracle, &swapper, &relay, usdc_catalog());
        let receipt = engine.withdraw(&creds(), &request("1.5")).await.unwrap();

        assert_eq!(receipt.amount, dec("1.5"));
        assert_eq!(swapper.call_count(), 0);
        assert!(receipt.notes.is_empty());
    }

    #[tokio::test]
    async fn publish_rejection_is_fatal_and_never_polled() {
        let oracle = MapOracle::new([("nep141:usdc.near", 2_000_000u128)]);
        let swapper = CreditingSwapper::new(&oracle, []);
        let relay = StubRelay::rejecting("INVALID_SIGNATURE");

        let engine = WithdrawEngine::new(&oracle, &swapper, &relay, usdc_catalog());
        let err = engine.withdraw(&creds(), &request("1")).await.unwrap_err();

        match err {
            WithdrawError::PublishRejected { status, .. } => {
                assert_eq!(status, "INVALID_SIGNATURE");
            }
            other => panic!("expected publish rejection, got {other:?}"),
        }
        assert_eq!(*relay.polls.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn settlement_failure_reports_diagnostic() {
        let oracle = MapOracle::new([("nep141:usdc.near", 2_000_000u128)]);
        let swapper = CreditingSwapper::new(&oracle, []);
        let relay = StubRelay {
            ack: PublishAck {
                status: "OK".to_string(),
                intent_hash: Some("intent-9".to_string()),
                diagnostic: None,
            },
            status: SettlementStatus::Failed {
                diagnostic: Some(serde_json::json!({"reason": "insufficient solver liquidity"})),
            },
            published: Mutex::new(Vec::new()),
            polls: Mutex::new(0),
        };

        let engine = WithdrawEngine::new(&oracle, &swapper, &relay, usdc_catalog());
        let err = engine.withdraw(&creds(), &request("1")).await.unwrap_err();

        match err {
            WithdrawError::SettlementFailed { diagnostic } => {
                assert_eq!(diagnostic["reason"], "insufficient solver liquidity");
            }
            other => panic!("expected settlement failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn malformed_amount_fails_before_side_effects() {
        let oracle = MapOracle::new([("nep141:usdc.near", 2_000_000u128)]);
        let swapper = CreditingSwapper::new(&oracle, []);
        let relay = StubRelay::settling("0x1");

        let engine = WithdrawEngine::new(&oracle, &swapper, &relay, usdc_catalog());
        let err = engine
            .withdraw(&creds(), &request("lots"))
            .await
            .unwrap_err();

        assert!(matches!(err, WithdrawError::Amount(AmountError::Parse(_))));
        assert_eq!(oracle.read_count(), 0);
    }

    #[tokio::test]
    async fn bad_key_fails_before_publish() {
        let oracle = MapOracle::new([("nep141:usdc.near", 2_000_000u128)]);
        let swapper = CreditingSwapper::new(&oracle, []);
        let relay = StubRelay::settling("0x1");

        let engine = WithdrawEngine::new(&oracle, &swapper, &relay, usdc_catalog());
        let bad_creds =
            SignerCredentials::new("alice.near", bs58::encode([1u8; 20]).into_string());
        let err = engine
            .withdraw(&bad_creds, &request("1"))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            WithdrawError::Signing(SigningError::InvalidKeyLength(20))
        ));
        assert!(relay.published.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn unknown_symbol_is_a_catalog_error() {
        let oracle = MapOracle::new([]);
        let swapper = CreditingSwapper::new(&oracle, []);
        let relay = StubRelay::settling("0x1");

        let engine = WithdrawEngine::new(&oracle, &swapper, &relay, usdc_catalog());
        let mut req = request("1");
        req.symbol = "DOGE".to_string();
        let err = engine.withdraw(&creds(), &req).await.unwrap_err();
        assert!(matches!(
            err,
            WithdrawError::Catalog(CatalogError::UnknownSymbol(_))
        ));
    }
}
