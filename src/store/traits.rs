//! Store trait and error types

use crate::store::{PendingTaxon, TaxonRecord};
use crate::tree::{Taxon, TaxonId};
use thiserror::Error;

/// Errors that can occur during store operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Capability interface over the document store
///
/// The crawl loop only needs find/upsert/aggregate; everything engine
/// specific stays behind this trait so tests can run against an
/// in-memory database.
pub trait Store {
    /// Looks up a taxon by id
    fn find(&self, id: TaxonId) -> StoreResult<Option<TaxonRecord>>;

    /// Inserts or merges a taxon record
    ///
    /// Merge overwrites the identity fields and `to_visit`. The parent
    /// link is only overwritten when the incoming record carries one: a
    /// re-discovery whose sibling run was detached by a continuation
    /// marker must not erase a previously known parent.
    fn upsert(&mut self, id: TaxonId, taxon: &Taxon) -> StoreResult<()>;

    /// Clears the `to_visit` flag; a no-op for unknown ids
    fn clear_to_visit(&mut self, id: TaxonId) -> StoreResult<()>;

    /// The reseeding aggregate: taxa with `to_visit` set and a level
    /// below `level_below`, each with its live count of stored children,
    /// ordered ascending by that count (sparsest subtrees first)
    fn pending_exploration(&self, level_below: i32) -> StoreResult<Vec<PendingTaxon>>;

    /// Total number of stored taxa
    fn count_taxa(&self) -> StoreResult<u64>;

    /// Number of taxa still flagged for a visit
    fn count_pending(&self) -> StoreResult<u64>;
}
