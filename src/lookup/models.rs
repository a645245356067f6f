use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};
use thiserror::Error;

/// Identifier of a lookup entity. Opaque and stable once assigned; the
/// journal store hands these out sequentially per kind.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct LookupId(pub i64);

impl std::fmt::Display for LookupId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for LookupId {
    fn from(raw: i64) -> Self {
        Self(raw)
    }
}

/// The ten lookup categories of the journal. Closed on purpose: the wire
/// names and route segments are part of the journal API contract.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum LookupKind {
    Roaster,
    BeanType,
    Country,
    DecafMethod,
    BrewMethod,
    Recipe,
    Grinder,
    Filter,
    Kettle,
    Scale,
}

impl LookupKind {
    /// Pluralized path segment used by the journal API routes.
    pub fn path_segment(self) -> &'static str {
        match self {
            Self::Roaster => "roasters",
            Self::BeanType => "bean_types",
            Self::Country => "countries",
            Self::DecafMethod => "decaf_methods",
            Self::BrewMethod => "brew_methods",
            Self::Recipe => "recipes",
            Self::Grinder => "grinders",
            Self::Filter => "filters",
            Self::Kettle => "kettles",
            Self::Scale => "scales",
        }
    }

    /// Which referencing-record kind is counted for this lookup. A lookup
    /// could in principle be referenced from several record kinds; usage
    /// reports the single dominant one, matching the journal API.
    pub fn counted_records(self) -> RecordKind {
        match self {
            Self::Roaster | Self::BeanType | Self::Country | Self::DecafMethod => {
                RecordKind::Products
            }
            Self::BrewMethod
            | Self::Recipe
            | Self::Grinder
            | Self::Filter
            | Self::Kettle
            | Self::Scale => RecordKind::BrewSessions,
        }
    }

    /// Shape of the foreign-key field referencing this kind.
    pub fn field_shape(self) -> FieldShape {
        match self {
            Self::BeanType | Self::Country => FieldShape::Multi,
            _ => FieldShape::Single,
        }
    }
}

/// Whether a kind is referenced through a single-valued field or a
/// multi-valued set of ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldShape {
    Single,
    Multi,
}

/// Referencing-record kinds. Replaces the loose `usage_type` strings of the
/// journal API with a closed enum plus a display label.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RecordKind {
    Products,
    BrewSessions,
}

impl RecordKind {
    /// Human-readable label for confirmation prompts.
    pub fn label(self) -> &'static str {
        match self {
            Self::Products => "products",
            Self::BrewSessions => "brew sessions",
        }
    }
}

/// A shared, named reference record (roaster, grinder, filter, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LookupEntry {
    pub id: LookupId,
    pub kind: LookupKind,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short_form: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Payload for creating a lookup entry; the store assigns the id.
#[derive(Debug, Clone, Default)]
pub struct NewLookup {
    pub name: String,
    pub short_form: Option<String>,
    pub url: Option<String>,
    pub image_url: Option<String>,
    pub notes: Option<String>,
}

impl NewLookup {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

const MAX_SHORT_FORM_CHARS: usize = 20;

#[derive(Error, Debug)]
#[error("{0}")]
pub struct InvalidLookup(pub String);

/// Field validation applied before a lookup entry is stored.
pub fn validate_entry(entry: &NewLookup) -> Result<(), InvalidLookup> {
    if entry.name.trim().is_empty() {
        return Err(InvalidLookup("Name cannot be empty".into()));
    }
    for (field, value) in [("url", &entry.url), ("image_url", &entry.image_url)] {
        if let Some(value) = value {
            let value = value.trim();
            if !value.is_empty()
                && !(value.starts_with("http://") || value.starts_with("https://"))
            {
                return Err(InvalidLookup(format!(
                    "{field} must be a valid HTTP or HTTPS URL"
                )));
            }
        }
    }
    if let Some(short_form) = &entry.short_form {
        if short_form.trim().chars().count() > MAX_SHORT_FORM_CHARS {
            return Err(InvalidLookup(format!(
                "short_form must be {MAX_SHORT_FORM_CHARS} characters or less"
            )));
        }
    }
    Ok(())
}

/// One referencing record, summarized for the confirmation prompt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageSample {
    pub timestamp: DateTime<Utc>,
    pub label: String,
}

/// Live usage of a lookup entity. Computed on demand, never cached: it must
/// reflect the state at the moment of the deletion decision.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageInfo {
    pub in_use: bool,
    pub usage_count: u64,
    pub counted: RecordKind,
    /// Most-recent first, bounded by the checker's sample limit.
    pub recent_samples: Vec<UsageSample>,
}

impl UsageInfo {
    /// Zero usage, for absent entities and empty journals.
    pub fn none(counted: RecordKind) -> Self {
        Self {
            in_use: false,
            usage_count: 0,
            counted,
            recent_samples: Vec::new(),
        }
    }
}

/// Result of a usage check. A failed check degrades to "assume not in use"
/// but stays distinguishable from a verified zero.
#[derive(Debug, Clone)]
pub enum UsageReport {
    Verified(UsageInfo),
    Unverified { counted: RecordKind, error: String },
}

impl UsageReport {
    pub fn is_verified(&self) -> bool {
        matches!(self, Self::Verified(_))
    }

    /// Whether the deletion flow must ask for an intent. An unverified
    /// check counts as not in use (availability over strict safety).
    pub fn in_use(&self) -> bool {
        match self {
            Self::Verified(info) => info.in_use,
            Self::Unverified { .. } => false,
        }
    }

    pub fn info(&self) -> Option<&UsageInfo> {
        match self {
            Self::Verified(info) => Some(info),
            Self::Unverified { .. } => None,
        }
    }

    pub fn counted(&self) -> RecordKind {
        match self {
            Self::Verified(info) => info.counted,
            Self::Unverified { counted, .. } => *counted,
        }
    }
}

/// Bulk change applied to every record referencing a lookup entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RewriteAction {
    /// Unset single-valued fields; drop the id from multi-valued sets.
    Clear,
    /// Substitute the replacement id, keeping set semantics for
    /// multi-valued fields (no duplicate members).
    Replace(LookupId),
}

impl RewriteAction {
    /// Action name in the `update_references` wire body.
    pub fn wire_name(self) -> &'static str {
        match self {
            Self::Clear => "remove",
            Self::Replace(_) => "replace",
        }
    }

    pub fn replacement(self) -> Option<LookupId> {
        match self {
            Self::Clear => None,
            Self::Replace(id) => Some(id),
        }
    }
}

impl std::fmt::Display for RewriteAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Clear => write!(f, "clear"),
            Self::Replace(id) => write!(f, "replace with {id}"),
        }
    }
}

/// Count of records actually modified by a rewrite.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RewriteOutcome {
    pub updated: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_path_segments_cover_all_kinds() {
        for kind in LookupKind::iter() {
            assert!(!kind.path_segment().is_empty());
        }
        assert_eq!(LookupKind::Roaster.path_segment(), "roasters");
        assert_eq!(LookupKind::BeanType.path_segment(), "bean_types");
        assert_eq!(LookupKind::Country.path_segment(), "countries");
    }

    #[test]
    fn test_counted_record_kinds() {
        assert_eq!(LookupKind::Roaster.counted_records(), RecordKind::Products);
        assert_eq!(
            LookupKind::DecafMethod.counted_records(),
            RecordKind::Products
        );
        assert_eq!(
            LookupKind::Grinder.counted_records(),
            RecordKind::BrewSessions
        );
        assert_eq!(
            LookupKind::Kettle.counted_records(),
            RecordKind::BrewSessions
        );
    }

    #[test]
    fn test_field_shapes() {
        assert_eq!(LookupKind::BeanType.field_shape(), FieldShape::Multi);
        assert_eq!(LookupKind::Country.field_shape(), FieldShape::Multi);
        assert_eq!(LookupKind::Roaster.field_shape(), FieldShape::Single);
        assert_eq!(LookupKind::Scale.field_shape(), FieldShape::Single);
    }

    #[test]
    fn test_kind_wire_names() {
        assert_eq!(
            serde_json::to_string(&LookupKind::BrewMethod).unwrap(),
            "\"brew_method\""
        );
        assert_eq!(LookupKind::DecafMethod.to_string(), "decaf_method");
        assert_eq!(
            "bean_type".parse::<LookupKind>().unwrap(),
            LookupKind::BeanType
        );
    }

    #[test]
    fn test_lookup_id_serde_transparent() {
        assert_eq!(serde_json::to_string(&LookupId(7)).unwrap(), "7");
        let id: LookupId = serde_json::from_str("42").unwrap();
        assert_eq!(id, LookupId(42));
    }

    #[test]
    fn test_validate_entry_rejects_blank_name() {
        assert!(validate_entry(&NewLookup::named("  ")).is_err());
        assert!(validate_entry(&NewLookup::named("Hario")).is_ok());
    }

    #[test]
    fn test_validate_entry_rejects_bad_url() {
        let mut entry = NewLookup::named("Comandante");
        entry.url = Some("ftp://example.com".into());
        assert!(validate_entry(&entry).is_err());
        entry.url = Some("https://example.com".into());
        assert!(validate_entry(&entry).is_ok());
    }

    #[test]
    fn test_validate_entry_bounds_short_form() {
        let mut entry = NewLookup::named("Aeropress");
        entry.short_form = Some("A".repeat(21));
        assert!(validate_entry(&entry).is_err());
        entry.short_form = Some("AP".into());
        assert!(validate_entry(&entry).is_ok());
    }

    #[test]
    fn test_rewrite_action_wire_form() {
        assert_eq!(RewriteAction::Clear.wire_name(), "remove");
        assert_eq!(RewriteAction::Replace(LookupId(3)).wire_name(), "replace");
        assert_eq!(
            RewriteAction::Replace(LookupId(3)).replacement(),
            Some(LookupId(3))
        );
        assert_eq!(RewriteAction::Clear.replacement(), None);
    }

    #[test]
    fn test_unverified_report_assumes_not_in_use() {
        let report = UsageReport::Unverified {
            counted: RecordKind::Products,
            error: "connection refused".into(),
        };
        assert!(!report.in_use());
        assert!(!report.is_verified());
        assert!(report.info().is_none());
    }
}
