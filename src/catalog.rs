//! # Token-Variant Catalogue
//!
//! One economic token, many vault assets. USDC bridged from Ethereum, Base,
//! and Arbitrum shares a symbol but lives in the vault as three distinct
//! asset ids with their own decimals and withdrawal minimums. The catalogue
//! is the read-only map from a symbol to its variants.
//!
//! Lookups are case-insensitive: the index is normalized to uppercase once
//! at load time, so `"usdc"`, `"Usdc"`, and `"USDC"` all land on the same
//! entry without per-lookup string games. Within a symbol, variants keep
//! their registry order — consolidation iterates siblings in exactly this
//! order, which makes the whole flow deterministic for a given catalogue.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use rust_decimal::Decimal;
use thiserror::Error;

use crate::config::FT_ASSET_NAMESPACE;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors from catalogue construction and lookup.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Two variants claimed the same vault asset id. Variants may share a
    /// symbol freely, but an asset id is globally unique by definition.
    #[error("duplicate asset id in catalogue: {0}")]
    DuplicateAssetId(String),

    /// No variant of any kind is registered for the symbol.
    #[error("unknown token symbol: {0}")]
    UnknownSymbol(String),

    /// The symbol exists but has no variant on the requested chain.
    #[error("no {symbol} variant on chain {chain}")]
    NoVariantOnChain { symbol: String, chain: String },
}

// ---------------------------------------------------------------------------
// TokenVariant
// ---------------------------------------------------------------------------

/// A chain-specific representation of a token inside the vault.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TokenVariant {
    /// Trading symbol, canonical uppercase (normalized at catalogue load).
    pub symbol: String,

    /// Vault-internal asset id, globally unique, including its namespace
    /// prefix (e.g. `nep141:usdc.token.near`).
    pub asset_id: String,

    /// Fixed-point scale: raw balance `10^decimals` equals one human unit.
    pub decimals: u32,

    /// Smallest withdrawal the destination chain will honor, in human
    /// units. Withdrawing less than this can strand the funds.
    #[serde(default)]
    pub min_withdraw: Decimal,

    /// The chain this variant withdraws to.
    pub destination_chain: String,
}

impl TokenVariant {
    /// The bare token contract id: the asset id with its namespace prefix
    /// stripped. This is what the withdrawal message embeds.
    pub fn token_contract_id(&self) -> &str {
        self.asset_id
            .strip_prefix(FT_ASSET_NAMESPACE)
            .unwrap_or(&self.asset_id)
    }
}

// ---------------------------------------------------------------------------
// VariantCatalog
// ---------------------------------------------------------------------------

/// The read-only variant registry, indexed by normalized symbol.
#[derive(Clone, Debug, Default)]
pub struct VariantCatalog {
    by_symbol: HashMap<String, Vec<TokenVariant>>,
}

impl VariantCatalog {
    /// Builds a catalogue from variant records, normalizing symbols to
    /// uppercase and preserving registry order within each symbol.
    ///
    /// # Errors
    ///
    /// [`CatalogError::DuplicateAssetId`] if two records share an asset id.
    pub fn from_variants(
        variants: impl IntoIterator<Item = TokenVariant>,
    ) -> Result<Self, CatalogError> {
        let mut by_symbol: HashMap<String, Vec<TokenVariant>> = HashMap::new();
        let mut seen_assets = HashSet::new();

        for mut variant in variants {
            if !seen_assets.insert(variant.asset_id.clone()) {
                return Err(CatalogError::DuplicateAssetId(variant.asset_id));
            }
            variant.symbol = variant.symbol.to_uppercase();
            by_symbol
                .entry(variant.symbol.clone())
                .or_default()
                .push(variant);
        }

        Ok(Self { by_symbol })
    }

    /// All variants of a symbol, in registry order.
    pub fn variants_of(&self, symbol: &str) -> Result<&[TokenVariant], CatalogError> {
        self.by_symbol
            .get(&symbol.to_uppercase())
            .map(Vec::as_slice)
            .ok_or_else(|| CatalogError::UnknownSymbol(symbol.to_string()))
    }

    /// Picks the withdrawal target among a symbol's variants.
    ///
    /// With a destination chain, the match is case-insensitive on
    /// [`TokenVariant::destination_chain`]; without one, the first
    /// registry-order variant wins. Returns the index into
    /// [`variants_of`](Self::variants_of) alongside the variant so callers
    /// can line the target up against a batched balance read.
    pub fn select_target<'a>(
        &'a self,
        symbol: &str,
        destination_chain: Option<&str>,
    ) -> Result<(usize, &'a TokenVariant), CatalogError> {
        let variants = self.variants_of(symbol)?;
        match destination_chain {
            None => Ok((0, &variants[0])),
            Some(chain) => variants
                .iter()
                .enumerate()
                .find(|(_, v)| v.destination_chain.eq_ignore_ascii_case(chain))
                .ok_or_else(|| CatalogError::NoVariantOnChain {
                    symbol: symbol.to_uppercase(),
                    chain: chain.to_string(),
                }),
        }
    }

    /// Number of distinct symbols in the catalogue.
    pub fn symbol_count(&self) -> usize {
        self.by_symbol.len()
    }

    /// Returns `true` if the catalogue holds no variants at all.
    pub fn is_empty(&self) -> bool {
        self.by_symbol.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
