use std::sync::Arc;

use tracing::{debug, error, info};

use super::models::{DeletionError, DeletionIntent, DeletionOutcome, DeletionState};
use crate::db::LookupStore;
use crate::lookup::models::{LookupId, LookupKind, RewriteAction, UsageReport};
use crate::lookup::rewrite::{ReferenceRewriter, RewriteError};
use crate::lookup::usage::UsageChecker;

/// The negotiated-deletion workflow for lookup entities:
/// check usage, obtain an explicit intent when the entity is in use,
/// rewrite references, then delete.
///
/// Per attempt: `Initiated -> Checked -> {Cancelled | Rewriting ->
/// Deleting -> Deleted}`, with at most one rewrite and exactly one delete,
/// in that order. The rewrite+delete pair is not transactional; a delete
/// failure after a successful rewrite leaves the rewrite in place
/// (surfaced as [`DeletionError::DeleteFailed`]).
pub struct DeletionManager {
    store: Arc<dyn LookupStore>,
    usage: UsageChecker,
    rewriter: ReferenceRewriter,
}

impl DeletionManager {
    pub fn new(store: Arc<dyn LookupStore>) -> Self {
        info!("DeletionManager initialized");
        Self {
            usage: UsageChecker::new(store.clone()),
            rewriter: ReferenceRewriter::new(store.clone()),
            store,
        }
    }

    pub fn with_sample_limit(mut self, limit: usize) -> Self {
        self.usage = self.usage.with_sample_limit(limit);
        self
    }

    /// Delete `(kind, id)`, consulting `resolve_intent` only when the
    /// entity is in use. The callback receives the fresh usage report and
    /// must return an explicit [`DeletionIntent`]; for unused entities it
    /// is never invoked and the entity is deleted directly.
    pub async fn request_deletion<F>(
        &self,
        kind: LookupKind,
        id: LookupId,
        resolve_intent: F,
    ) -> Result<DeletionOutcome, DeletionError>
    where
        F: FnOnce(&UsageReport) -> DeletionIntent,
    {
        debug!(state = %DeletionState::Initiated, "Deletion requested for {} {}", kind, id);
        let report = self.usage.check(kind, id).await;
        debug!(
            state = %DeletionState::Checked,
            verified = report.is_verified(),
            in_use = report.in_use(),
            "Usage checked for {} {}",
            kind,
            id
        );

        if !report.in_use() {
            // Common case: created then never used. Unverified reports land
            // here too by design; the checker already logged the warning.
            self.delete_step(kind, id, 0).await?;
            return Ok(DeletionOutcome::Deleted);
        }

        match resolve_intent(&report) {
            DeletionIntent::Cancel => {
                info!(
                    state = %DeletionState::Cancelled,
                    "Deletion of {} {} cancelled, no changes made",
                    kind,
                    id
                );
                Ok(DeletionOutcome::Cancelled)
            }
            DeletionIntent::RemoveReferences => {
                let rewritten = self.rewrite_step(kind, id, RewriteAction::Clear).await?;
                self.delete_step(kind, id, rewritten).await?;
                Ok(DeletionOutcome::DeletedAfterRewrite { rewritten })
            }
            DeletionIntent::ReplaceReferences(replacement) => {
                let rewritten = self
                    .rewrite_step(kind, id, RewriteAction::Replace(replacement))
                    .await?;
                self.delete_step(kind, id, rewritten).await?;
                Ok(DeletionOutcome::DeletedAfterRewrite { rewritten })
            }
        }
    }

    async fn rewrite_step(
        &self,
        kind: LookupKind,
        id: LookupId,
        action: RewriteAction,
    ) -> Result<u64, DeletionError> {
        debug!(state = %DeletionState::Rewriting, "Rewriting references to {} {}", kind, id);
        match self.rewriter.rewrite(kind, id, action).await {
            Ok(outcome) => Ok(outcome.updated),
            Err(RewriteError::InvalidReplacement(message)) => {
                error!("Rejected deletion of {} {}: {}", kind, id, message);
                Err(DeletionError::InvalidReplacement(message))
            }
            Err(RewriteError::Failed(e)) => {
                error!("Rewrite failed for {} {}: {}", kind, id, e);
                Err(DeletionError::RewriteFailed(e.to_string()))
            }
        }
    }

    async fn delete_step(
        &self,
        kind: LookupKind,
        id: LookupId,
        rewritten: u64,
    ) -> Result<(), DeletionError> {
        debug!(state = %DeletionState::Deleting, "Deleting {} {}", kind, id);
        match self.store.delete_lookup(kind, id).await {
            Ok(existed) => {
                info!(
                    state = %DeletionState::Deleted,
                    "Deleted {} {} (was present: {})",
                    kind,
                    id,
                    existed
                );
                Ok(())
            }
            Err(e) => {
                error!("Delete failed for {} {}: {}", kind, id, e);
                Err(DeletionError::DeleteFailed {
                    rewritten,
                    message: e.to_string(),
                })
            }
        }
    }
}
