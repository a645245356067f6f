use thiserror::Error;

use crate::lookup::models::LookupId;

/// The caller's explicit decision for an in-use lookup entity. Never
/// defaulted: stripping a reference off other records is destructive and
/// not equivalent to cancelling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeletionIntent {
    Cancel,
    RemoveReferences,
    ReplaceReferences(LookupId),
}

/// Terminal result of a deletion attempt that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeletionOutcome {
    /// Caller chose to keep the entity; nothing changed.
    Cancelled,
    /// Entity was not in use and was deleted directly.
    Deleted,
    /// References were rewritten, then the entity was deleted.
    DeletedAfterRewrite { rewritten: u64 },
}

impl DeletionOutcome {
    pub fn is_deleted(&self) -> bool {
        matches!(self, Self::Deleted | Self::DeletedAfterRewrite { .. })
    }
}

impl std::fmt::Display for DeletionOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cancelled => write!(f, "cancelled"),
            Self::Deleted => write!(f, "deleted"),
            Self::DeletedAfterRewrite { rewritten } => {
                write!(f, "deleted after rewriting {rewritten} reference(s)")
            }
        }
    }
}

/// States of one deletion attempt, traced at each transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeletionState {
    Initiated,
    Checked,
    Rewriting,
    Deleting,
    Deleted,
    Cancelled,
}

impl std::fmt::Display for DeletionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = match self {
            Self::Initiated => "initiated",
            Self::Checked => "checked",
            Self::Rewriting => "rewriting",
            Self::Deleting => "deleting",
            Self::Deleted => "deleted",
            Self::Cancelled => "cancelled",
        };
        write!(f, "{state}")
    }
}

#[derive(Error, Debug)]
pub enum DeletionError {
    /// The chosen replacement was rejected before anything was mutated;
    /// the caller should re-prompt for a valid one.
    #[error("invalid replacement: {0}")]
    InvalidReplacement(String),

    /// The bulk update failed; no delete was attempted and records are as
    /// they were before the attempt.
    #[error("reference rewrite failed: {0}")]
    RewriteFailed(String),

    /// The final delete failed after references were already rewritten.
    /// The rewrite is not rolled back; re-issuing the request is safe.
    #[error("delete failed after rewriting {rewritten} reference(s): {message}")]
    DeleteFailed { rewritten: u64, message: String },
}
