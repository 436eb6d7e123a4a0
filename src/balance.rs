//! # Balance Snapshots & the Balance Oracle
//!
//! The vault reports balances as smallest-unit integers per asset id. A
//! [`BalanceSnapshot`] is one batched read of those integers at a single
//! point in time — and that qualifier does real work: a snapshot taken
//! before a swap says nothing about the world after it. The withdrawal flow
//! re-reads before anything irreversible instead of trusting arithmetic on
//! a stale snapshot.
//!
//! The [`BalanceOracle`] trait is the seam to whatever actually performs the
//! read (a JSON-RPC view call in production, a scripted map in tests). The
//! engine never talks to a chain directly.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::amount::{from_atomic, AmountError};
use crate::catalog::TokenVariant;

// ---------------------------------------------------------------------------
// BalanceSnapshot
// ---------------------------------------------------------------------------

/// Smallest-unit balances for a set of asset ids, captured in one read.
///
/// Asset ids absent from the snapshot read as zero — the vault omits
/// accounts that never held an asset, and "never held" and "holds nothing"
/// are the same thing for a withdrawal.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BalanceSnapshot {
    /// Raw balances indexed by vault asset id.
    balances: HashMap<String, u128>,

    /// When the batch read happened. Diagnostic only — staleness decisions
    /// are made by re-reading, not by inspecting this field.
    pub captured_at: DateTime<Utc>,
}

impl BalanceSnapshot {
    /// Creates a snapshot from `(asset_id, raw_balance)` pairs, stamped now.
    pub fn from_entries(entries: impl IntoIterator<Item = (String, u128)>) -> Self {
        Self {
            balances: entries.into_iter().collect(),
            captured_at: Utc::now(),
        }
    }

    /// Creates an empty snapshot (every asset reads zero).
    pub fn empty() -> Self {
        Self::from_entries([])
    }

    /// Raw smallest-unit balance for an asset id; zero when absent.
    pub fn raw_amount(&self, asset_id: &str) -> u128 {
        self.balances.get(asset_id).copied().unwrap_or(0)
    }

    /// Human-unit balance of one variant, converted with that variant's own
    /// decimals.
    pub fn human_amount(&self, variant: &TokenVariant) -> Result<Decimal, AmountError> {
        from_atomic(self.raw_amount(&variant.asset_id), variant.decimals)
    }

    /// Sum of human-unit balances across the given variants, each converted
    /// with its own decimals. This is the denominator for percentage-mode
    /// withdrawals.
    pub fn total_human(&self, variants: &[TokenVariant]) -> Result<Decimal, AmountError> {
        let mut total = Decimal::ZERO;
        for variant in variants {
            total += self.human_amount(variant)?;
        }
        Ok(total)
    }

    /// Number of asset entries actually present in the snapshot.
    pub fn len(&self) -> usize {
        self.balances.len()
    }

    /// Returns `true` when the snapshot carries no entries.
    pub fn is_empty(&self) -> bool {
        self.balances.is_empty()
    }
}

// ---------------------------------------------------------------------------
// BalanceOracle
// ---------------------------------------------------------------------------

/// Reads vault-internal balances for one account.
///
/// Implementations perform a single batched call per invocation; the engine
/// is written so that each flow step needs at most one. Failures are opaque
/// to the engine — network, decoding, whatever — and abort the withdrawal
/// before anything irreversible happens.
#[async_trait]
pub trait BalanceOracle: Send + Sync {
    /// Fetches smallest-unit balances for `asset_ids` held by `account_id`.
    async fn read_balances(
        &self,
        account_id: &str,
        asset_ids: &[String],
    ) -> anyhow::Result<BalanceSnapshot>;
}

#[async_trait]
impl<T: BalanceOracle + ?Sized> BalanceOracle for &T {
    async fn read_balances(
        &self,
        account_id: &str,
        asset_ids: &[String],
    ) -> anyhow::Result<BalanceSnapshot> {
        (**self).read_balances(account_id, asset_ids).await
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
