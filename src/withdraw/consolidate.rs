//! # Sibling-Variant Consolidation
//!
//! When the target variant alone cannot cover the withdrawal, balance held
//! in sibling variants can — after a conversion through the vault's swap
//! primitive. Swaps are irreversible, rate-bearing operations against a
//! live market, so the loop is greedy and minimal: siblings are visited in
//! catalogue order, skipped when empty, and the iteration stops the moment
//! the working target balance covers the request. No conversion happens
//! that the request did not force.
//!
//! A failed sibling swap is not a failed withdrawal. The sibling is skipped
//! with a warning and the loop moves on — a partial consolidation can still
//! leave enough for a full or clamped withdrawal. The working balance this
//! module computes is advisory either way; the caller re-reads the chain
//! before signing anything.

use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use super::WithdrawError;
use crate::balance::BalanceOracle;
use crate::catalog::TokenVariant;
use crate::swap::SwapExecutor;

/// What consolidation accomplished, advisory numbers included.
#[derive(Debug)]
pub(crate) struct ConsolidationReport {
    /// Working estimate of the target balance after swaps, human units.
    /// Never used to authorize a withdrawal — only to decide that further
    /// swaps are unnecessary.
    pub projected_balance: Decimal,

    /// One human-readable warning per sibling swap that failed.
    pub warnings: Vec<String>,
}

/// Pulls sibling-variant balances into the target variant until the target
/// covers `target_amount` or the siblings run out.
pub(crate) async fn consolidate<O, S>(
    oracle: &O,
    swapper: &S,
    account_id: &str,
    variants: &[TokenVariant],
    target_index: usize,
    target_amount: Decimal,
) -> Result<ConsolidationReport, WithdrawError>
where
    O: BalanceOracle,
    S: SwapExecutor,
{
    let target = &variants[target_index];

    let asset_ids: Vec<String> = variants.iter().map(|v| v.asset_id.clone()).collect();
    let snapshot = oracle
        .read_balances(account_id, &asset_ids)
        .await
        .map_err(WithdrawError::Oracle)?;

    // Working copy in human units, one slot per variant.
    let mut balances = Vec::with_capacity(variants.len());
    for variant in variants {
        balances.push(snapshot.human_amount(variant)?);
    }

    let mut have = balances[target_index];
    let mut warnings = Vec::new();

    for (i, sibling) in variants.iter().enumerate() {
        if i == target_index || balances[i].is_zero() {
            continue;
        }
        if have >= target_amount {
            debug!(
                symbol = %target.symbol,
                projected = %have,
                "target balance sufficient; skipping remaining siblings"
            );
            break;
        }

        // Convert the sibling's entire balance. Partial conversions would
        // need a reverse quote to size, and the clamp step already absorbs
        // any overshoot.
        match swapper
            .swap(&sibling.asset_id, &target.asset_id, balances[i])
            .await
        {
            Ok(fill) => {
                info!(
                    from = %sibling.asset_id,
                    to = %target.asset_id,
                    amount_in = %balances[i],
                    amount_out = %fill.amount_out,
                    "consolidated sibling variant into target"
                );
                balances[i] = Decimal::ZERO;
                have += fill.amount_out;
            }
            Err(error) => {
                warn!(
                    from = %sibling.asset_id,
                    to = %target.asset_id,
                    error = %format!("{error:#}"),
                    "sibling swap failed; continuing with remaining variants"
                );
                warnings.push(format!(
                    "could not convert {} from {} into {}: {error:#}",
                    balances[i], sibling.asset_id, target.asset_id
                ));
            }
        }
    }

    Ok(ConsolidationReport {
        projected_balance: have,
        warnings,
    })
}
