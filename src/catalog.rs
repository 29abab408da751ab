//! Coin catalog lookup and token resolution
//!
//! The catalog itself is populated elsewhere; discovery only asks it to turn
//! raw token ids into canonical [`CoinRecord`]s.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, RwLock};

use crate::error::CatalogError;
use crate::types::{CoinRecord, CoinType, TokenId};

/// Batch lookup `CoinType -> CoinRecord`
///
/// Missing entries are simply absent from the result. An `Err` means the
/// catalog could not be consulted at all.
pub trait CoinCatalog: Send + Sync {
    fn coin_records(&self, coin_types: &[CoinType]) -> Result<Vec<CoinRecord>, CatalogError>;
}

#[derive(Default)]
pub struct InMemoryCoinCatalog {
    records: RwLock<HashMap<CoinType, CoinRecord>>,
}

impl InMemoryCoinCatalog {
    pub fn new(records: impl IntoIterator<Item = CoinRecord>) -> Self {
        Self {
            records: RwLock::new(
                records
                    .into_iter()
                    .map(|record| (record.coin_type, record))
                    .collect(),
            ),
        }
    }

    /// Load a JSON array of coin records
    pub fn from_json_file(path: &Path) -> Result<Self, CatalogError> {
        let contents = std::fs::read_to_string(path)?;
        let records: Vec<CoinRecord> = serde_json::from_str(&contents)?;
        log::info!("Loaded {} catalog records from {}", records.len(), path.display());
        Ok(Self::new(records))
    }

    /// Add or replace a record
    pub fn insert(&self, record: CoinRecord) {
        match self.records.write() {
            Ok(mut records) => {
                records.insert(record.coin_type, record);
            }
            Err(poisoned) => {
                poisoned.into_inner().insert(record.coin_type, record);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.records.read().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CoinCatalog for InMemoryCoinCatalog {
    fn coin_records(&self, coin_types: &[CoinType]) -> Result<Vec<CoinRecord>, CatalogError> {
        let records = self
            .records
            .read()
            .map_err(|_| CatalogError::Unavailable("catalog lock poisoned".to_string()))?;
        Ok(coin_types
            .iter()
            .filter_map(|coin_type| records.get(coin_type).cloned())
            .collect())
    }
}

/// Why a token id was left out of a resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The catalog has no record for the token yet
    NotInCatalog,
}

/// Output of [`CoinResolver::resolve`]
#[derive(Debug, Default)]
pub struct Resolution {
    pub resolved: Vec<CoinRecord>,
    pub skipped: Vec<(TokenId, SkipReason)>,
}

#[derive(Clone)]
pub struct CoinResolver {
    catalog: Arc<dyn CoinCatalog>,
}

impl CoinResolver {
    pub fn new(catalog: Arc<dyn CoinCatalog>) -> Self {
        Self { catalog }
    }

    /// Resolve token ids against the catalog
    ///
    /// Unknown tokens are skipped with [`SkipReason::NotInCatalog`]; they
    /// are not retried by later passes once the cursor has moved past them.
    pub fn resolve<'a>(
        &self,
        token_ids: impl IntoIterator<Item = &'a TokenId>,
    ) -> Result<Resolution, CatalogError> {
        let token_ids: Vec<TokenId> = token_ids.into_iter().copied().collect();
        if token_ids.is_empty() {
            return Ok(Resolution::default());
        }

        let coin_types: Vec<CoinType> = token_ids.iter().map(TokenId::coin_type).collect();
        let records = self.catalog.coin_records(&coin_types)?;
        let by_type: HashMap<CoinType, CoinRecord> = records
            .into_iter()
            .map(|record| (record.coin_type, record))
            .collect();

        let mut resolution = Resolution::default();
        for token_id in token_ids {
            match by_type.get(&token_id.coin_type()) {
                Some(record) => resolution.resolved.push(record.clone()),
                None => {
                    log::debug!("Skipping token {}: not in catalog", token_id);
                    resolution.skipped.push((token_id, SkipReason::NotInCatalog));
                }
            }
        }
        Ok(resolution)
    }
}
