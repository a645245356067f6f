use std::sync::Arc;

use tracing::{debug, warn};

use crate::db::LookupStore;
use crate::lookup::models::{LookupId, LookupKind, UsageReport};
use crate::utils::safe_truncate_ellipsis;
use crate::{DEFAULT_SAMPLE_LIMIT, MAX_SAMPLE_LABEL_CHARS};

/// Reports whether and how heavily a lookup entity is referenced, with a
/// bounded preview of the most recent referencing records.
///
/// A failed check does not block deletion: it degrades to "assume not in
/// use" but comes back tagged as [`UsageReport::Unverified`] and is logged,
/// so a fallback is never mistaken for a verified zero.
pub struct UsageChecker {
    store: Arc<dyn LookupStore>,
    sample_limit: usize,
}

impl UsageChecker {
    pub fn new(store: Arc<dyn LookupStore>) -> Self {
        Self {
            store,
            sample_limit: DEFAULT_SAMPLE_LIMIT,
        }
    }

    pub fn with_sample_limit(mut self, limit: usize) -> Self {
        self.sample_limit = limit;
        self
    }

    /// Read-only; reflects the live state at call time.
    pub async fn check(&self, kind: LookupKind, id: LookupId) -> UsageReport {
        debug!("Checking usage of {} {}", kind, id);
        match self.store.lookup_usage(kind, id).await {
            Ok(mut info) => {
                info.recent_samples.truncate(self.sample_limit);
                for sample in &mut info.recent_samples {
                    sample.label = safe_truncate_ellipsis(&sample.label, MAX_SAMPLE_LABEL_CHARS);
                }
                debug!(
                    "Usage of {} {}: {} {}",
                    kind,
                    id,
                    info.usage_count,
                    info.counted.label()
                );
                UsageReport::Verified(info)
            }
            Err(e) => {
                warn!(
                    "Usage check failed for {} {}: {}; assuming not in use",
                    kind, id, e
                );
                UsageReport::Unverified {
                    counted: kind.counted_records(),
                    error: e.to_string(),
                }
            }
        }
    }
}
