pub mod core;
pub mod db;
pub mod lookup;
pub mod utils;

pub use crate::core::config::JournalConfig;
pub use crate::core::error::{BrewlogError, Result};
pub use crate::db::{JournalClient, LookupStore, MemoryStore, StoreError};
pub use crate::lookup::deletion::{
    DeletionError, DeletionIntent, DeletionManager, DeletionOutcome,
};
pub use crate::lookup::models::{
    LookupEntry, LookupId, LookupKind, RecordKind, RewriteAction, RewriteOutcome, UsageInfo,
    UsageReport,
};
pub use crate::lookup::rewrite::{ReferenceRewriter, RewriteError};
pub use crate::lookup::usage::UsageChecker;
pub use crate::utils::{safe_truncate, safe_truncate_ellipsis};

/// Default root of the journal API.
pub const DEFAULT_API_URL: &str = "http://localhost:5000/api";

pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;

/// Default upper bound on recent-usage samples in a report.
pub const DEFAULT_SAMPLE_LIMIT: usize = 5;

/// Usage-sample labels longer than this are truncated with an ellipsis.
pub const MAX_SAMPLE_LABEL_CHARS: usize = 60;
