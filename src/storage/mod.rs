//! Persisted state: the embedding store and the write ledger.
//!
//! - [`EmbeddingStore`] keeps one rkyv-encoded [`CacheEntry`] per
//!   `(content_hash, model_id)` key.
//! - [`Ledger`] is an append-only JSON-lines log of every fetch-mode write.

pub mod error;
pub mod ledger;
mod model;
pub mod store;

pub use error::{LedgerError, LedgerResult, StoreError, StoreResult};
pub use ledger::{Ledger, LedgerAudit, audit_replay, read_records};
pub use model::{ArchivedCacheEntry, CacheEntry, LedgerRecord};
pub use store::{EmbeddingStore, StoreStats};
