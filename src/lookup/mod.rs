pub mod deletion;
pub mod models;
pub mod rewrite;
pub mod usage;

pub use deletion::{DeletionError, DeletionIntent, DeletionManager, DeletionOutcome};
pub use models::{
    FieldShape, LookupEntry, LookupId, LookupKind, NewLookup, RecordKind, RewriteAction,
    RewriteOutcome, UsageInfo, UsageReport, UsageSample,
};
pub use rewrite::{ReferenceRewriter, RewriteError};
pub use usage::UsageChecker;
