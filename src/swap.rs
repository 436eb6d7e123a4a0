//! # Swap Execution Seam
//!
//! Consolidation converts sibling-variant balances into the withdrawal
//! target through the vault's intent-swap primitive. Quoting, routing, and
//! execution all live outside this crate — the engine only needs "turn this
//! much of asset A into asset B and tell me what came out".
//!
//! Swaps are live-market operations: they can fail for reasons that have
//! nothing to do with this withdrawal (no solver liquidity, quote expiry,
//! slippage bounds). The consolidation loop treats any `Err` as "this
//! sibling is unavailable right now" and moves on.

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// The executed result of a variant-to-variant swap.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SwapFill {
    /// Amount of the target asset received, in human units.
    pub amount_out: Decimal,
}

/// Executes a conversion between two vault assets.
#[async_trait]
pub trait SwapExecutor: Send + Sync {
    /// Converts `amount` (human units) of `from_asset_id` into
    /// `to_asset_id`, returning the filled output amount.
    ///
    /// An `Err` means the conversion did not happen; the caller's balances
    /// are untouched and it is safe to try a different sibling.
    async fn swap(
        &self,
        from_asset_id: &str,
        to_asset_id: &str,
        amount: Decimal,
    ) -> anyhow::Result<SwapFill>;
}

#[async_trait]
impl<T: SwapExecutor + ?Sized> SwapExecutor for &T {
    async fn swap(
        &self,
        from_asset_id: &str,
        to_asset_id: &str,
        amount: Decimal,
    ) -> anyhow::Result<SwapFill> {
        (**self).swap(from_asset_id, to_asset_id, amount).await
    }
}
