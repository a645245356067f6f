use async_trait::async_trait;
use thiserror::Error;

use crate::lookup::models::{LookupEntry, LookupId, LookupKind, RewriteAction, UsageInfo};

/// Failures surfaced by a lookup store.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Transport-level failure: the store could not be reached at all.
    /// Usage checks degrade on this instead of blocking deletion.
    #[error("store unreachable: {0}")]
    Unavailable(String),

    /// The store answered and refused the operation. The message is the
    /// store's own, passed through verbatim.
    #[error("{0}")]
    Rejected(String),
}

/// Contract of the journal's lookup repository, as consumed by the
/// reference-integrity core. Backed by the journal HTTP API in production
/// and by [`MemoryStore`](crate::db::MemoryStore) in tests.
#[async_trait]
pub trait LookupStore: Send + Sync {
    /// Fetch a lookup entry, `None` if absent. Used to validate
    /// replacement candidates before a rewrite.
    async fn find_lookup(
        &self,
        kind: LookupKind,
        id: LookupId,
    ) -> Result<Option<LookupEntry>, StoreError>;

    /// Live usage of a lookup entity. An absent id reports zero usage
    /// rather than an error: the end state "entity absent" is already
    /// satisfied.
    async fn lookup_usage(
        &self,
        kind: LookupKind,
        id: LookupId,
    ) -> Result<UsageInfo, StoreError>;

    /// Apply `action` to every record referencing `id`. All matching
    /// records are updated or none are; invoking the same action twice
    /// yields the same end state as once. Returns the number of records
    /// modified.
    async fn rewrite_references(
        &self,
        kind: LookupKind,
        id: LookupId,
        action: RewriteAction,
    ) -> Result<u64, StoreError>;

    /// Delete a lookup entry by id. Deleting an absent id is a no-op
    /// success; the returned bool reports whether anything was removed.
    async fn delete_lookup(&self, kind: LookupKind, id: LookupId)
        -> Result<bool, StoreError>;
}
