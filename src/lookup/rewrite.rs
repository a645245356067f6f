use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info};

use crate::db::{LookupStore, StoreError};
use crate::lookup::models::{LookupId, LookupKind, RewriteAction, RewriteOutcome};

#[derive(Error, Debug)]
pub enum RewriteError {
    /// Precondition violation: the replacement does not name an existing
    /// lookup of the same kind, or names the deletion target itself.
    /// Nothing was mutated.
    #[error("invalid replacement: {0}")]
    InvalidReplacement(String),

    /// The store failed during the bulk update. The store contract is
    /// all-or-nothing per rewrite, so records are as they were.
    #[error("reference rewrite failed: {0}")]
    Failed(#[from] StoreError),
}

/// Applies one bulk change to every record referencing a lookup entity:
/// clear the reference, or repoint it to a replacement of the same kind.
/// Idempotent; safe to re-issue after a failure.
pub struct ReferenceRewriter {
    store: Arc<dyn LookupStore>,
}

impl ReferenceRewriter {
    pub fn new(store: Arc<dyn LookupStore>) -> Self {
        Self { store }
    }

    pub async fn rewrite(
        &self,
        kind: LookupKind,
        target: LookupId,
        action: RewriteAction,
    ) -> Result<RewriteOutcome, RewriteError> {
        if let RewriteAction::Replace(replacement) = action {
            self.validate_replacement(kind, target, replacement).await?;
        }

        debug!("Rewriting references to {} {} ({})", kind, target, action);
        let updated = self.store.rewrite_references(kind, target, action).await?;
        info!(
            "Rewrite complete for {} {}: {} record(s) updated",
            kind, target, updated
        );
        Ok(RewriteOutcome { updated })
    }

    /// Checked before any mutation so a bad replacement can never
    /// half-apply.
    async fn validate_replacement(
        &self,
        kind: LookupKind,
        target: LookupId,
        replacement: LookupId,
    ) -> Result<(), RewriteError> {
        if replacement == target {
            return Err(RewriteError::InvalidReplacement(format!(
                "replacement {kind} {replacement} is the deletion target itself"
            )));
        }
        match self.store.find_lookup(kind, replacement).await {
            Ok(Some(_)) => Ok(()),
            Ok(None) => Err(RewriteError::InvalidReplacement(format!(
                "no {kind} with id {replacement}"
            ))),
            Err(e) => Err(RewriteError::Failed(e)),
        }
    }
}
