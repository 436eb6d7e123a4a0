//! # Amount Resolution
//!
//! Turns a parsed [`AmountSpec`] into a concrete human-unit quantity. Exact
//! amounts pass straight through; percentage amounts are a share of the
//! total balance across *every* variant of the symbol — each variant's raw
//! balance converted with its own decimals before summing, because "75% of
//! my USDC" means all of it, not just the slice that happens to live on the
//! target chain.
//!
//! Percentage mode costs exactly one batched balance read. Exact mode costs
//! none.

use rust_decimal::Decimal;
use tracing::info;

use super::WithdrawError;
use crate::amount::AmountSpec;
use crate::balance::BalanceOracle;
use crate::catalog::TokenVariant;

/// Resolves a withdrawal amount in human units.
pub(crate) async fn resolve_amount<O: BalanceOracle>(
    oracle: &O,
    account_id: &str,
    variants: &[TokenVariant],
    spec: &AmountSpec,
) -> Result<Decimal, WithdrawError> {
    match spec {
        AmountSpec::Exact(amount) => Ok(*amount),
        AmountSpec::Percent(percent) => {
            let asset_ids: Vec<String> =
                variants.iter().map(|v| v.asset_id.clone()).collect();
            let snapshot = oracle
                .read_balances(account_id, &asset_ids)
                .await
                .map_err(WithdrawError::Oracle)?;

            let total = snapshot.total_human(variants)?;
            let amount = total
                .checked_mul(*percent)
                .and_then(|scaled| scaled.checked_div(Decimal::ONE_HUNDRED))
                .ok_or(WithdrawError::AmountOverflow {
                    total,
                    percent: *percent,
                })?;

            info!(
                symbol = %variants[0].symbol,
                %percent,
                %total,
                resolved = %amount,
                "resolved percentage withdrawal against total balance"
            );
            Ok(amount)
        }
    }
}
