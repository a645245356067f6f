use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use tracing::debug;

use super::store::{LookupStore, StoreError};
use crate::lookup::models::{
    LookupEntry, LookupId, LookupKind, NewLookup, RecordKind, RewriteAction, UsageInfo,
    UsageSample, validate_entry,
};

/// A coffee product: references lookups through one single-valued field
/// (roaster, decaf method) and two multi-valued sets (bean types,
/// countries).
#[derive(Debug, Clone)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub roaster_id: Option<LookupId>,
    pub bean_type_ids: Vec<LookupId>,
    pub country_ids: Vec<LookupId>,
    pub decaf_method_id: Option<LookupId>,
    pub created_at: DateTime<Utc>,
}

/// A brew session: every equipment reference is single-valued.
#[derive(Debug, Clone)]
pub struct BrewSession {
    pub id: i64,
    pub product_name: String,
    pub brew_method_id: Option<LookupId>,
    pub recipe_id: Option<LookupId>,
    pub grinder_id: Option<LookupId>,
    pub filter_id: Option<LookupId>,
    pub kettle_id: Option<LookupId>,
    pub scale_id: Option<LookupId>,
    pub brewed_at: DateTime<Utc>,
}

/// Seed for [`MemoryStore::add_product`].
#[derive(Debug, Clone, Default)]
pub struct NewProduct {
    pub name: String,
    pub roaster: Option<LookupId>,
    pub bean_types: Vec<LookupId>,
    pub countries: Vec<LookupId>,
    pub decaf_method: Option<LookupId>,
}

/// Seed for [`MemoryStore::add_session`].
#[derive(Debug, Clone, Default)]
pub struct NewSession {
    pub product_name: String,
    pub brew_method: Option<LookupId>,
    pub recipe: Option<LookupId>,
    pub grinder: Option<LookupId>,
    pub filter: Option<LookupId>,
    pub kettle: Option<LookupId>,
    pub scale: Option<LookupId>,
}

#[derive(Default)]
struct JournalData {
    lookups: HashMap<LookupKind, Vec<LookupEntry>>,
    products: Vec<Product>,
    sessions: Vec<BrewSession>,
}

impl JournalData {
    fn next_lookup_id(&self, kind: LookupKind) -> LookupId {
        let max = self
            .lookups
            .get(&kind)
            .and_then(|entries| entries.iter().map(|e| e.id.0).max())
            .unwrap_or(0);
        LookupId(max + 1)
    }
}

/// In-process journal implementing the full [`LookupStore`] contract,
/// including the single- vs multi-valued rewrite semantics. Serves as the
/// reference store for tests and offline use.
pub struct MemoryStore {
    inner: RwLock<JournalData>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(JournalData::default()),
        }
    }

    /// Create a lookup entry with the next free id for its kind.
    pub fn create_lookup(
        &self,
        kind: LookupKind,
        new: NewLookup,
    ) -> Result<LookupEntry, StoreError> {
        validate_entry(&new).map_err(|e| StoreError::Rejected(e.to_string()))?;
        let mut data = self.inner.write();
        let entry = LookupEntry {
            id: data.next_lookup_id(kind),
            kind,
            name: new.name.trim().to_string(),
            short_form: new.short_form,
            url: new.url,
            image_url: new.image_url,
            notes: new.notes,
        };
        data.lookups.entry(kind).or_default().push(entry.clone());
        debug!("Created {} {} ({})", kind, entry.id, entry.name);
        Ok(entry)
    }

    pub fn find_by_name(&self, kind: LookupKind, name: &str) -> Option<LookupEntry> {
        let data = self.inner.read();
        data.lookups
            .get(&kind)?
            .iter()
            .find(|e| e.name == name)
            .cloned()
    }

    /// Substring search over name and short_form. An empty query matches
    /// nothing, mirroring the journal API.
    pub fn search(&self, kind: LookupKind, query: &str) -> Vec<LookupEntry> {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return Vec::new();
        }
        let data = self.inner.read();
        data.lookups
            .get(&kind)
            .map(|entries| {
                entries
                    .iter()
                    .filter(|e| {
                        e.name.to_lowercase().contains(&query)
                            || e.short_form
                                .as_deref()
                                .is_some_and(|s| s.to_lowercase().contains(&query))
                    })
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn add_product(&self, new: NewProduct) -> i64 {
        let mut data = self.inner.write();
        let id = data.products.iter().map(|p| p.id).max().unwrap_or(0) + 1;
        data.products.push(Product {
            id,
            name: new.name,
            roaster_id: new.roaster,
            bean_type_ids: new.bean_types,
            country_ids: new.countries,
            decaf_method_id: new.decaf_method,
            created_at: Utc::now(),
        });
        id
    }

    pub fn add_session(&self, new: NewSession) -> i64 {
        let mut data = self.inner.write();
        let id = data.sessions.iter().map(|s| s.id).max().unwrap_or(0) + 1;
        data.sessions.push(BrewSession {
            id,
            product_name: new.product_name,
            brew_method_id: new.brew_method,
            recipe_id: new.recipe,
            grinder_id: new.grinder,
            filter_id: new.filter,
            kettle_id: new.kettle,
            scale_id: new.scale,
            brewed_at: Utc::now(),
        });
        id
    }

    pub fn product(&self, id: i64) -> Option<Product> {
        self.inner.read().products.iter().find(|p| p.id == id).cloned()
    }

    pub fn session(&self, id: i64) -> Option<BrewSession> {
        self.inner.read().sessions.iter().find(|s| s.id == id).cloned()
    }

    pub fn products(&self) -> Vec<Product> {
        self.inner.read().products.clone()
    }

    pub fn sessions(&self) -> Vec<BrewSession> {
        self.inner.read().sessions.clone()
    }
}

fn product_references(product: &Product, kind: LookupKind, id: LookupId) -> bool {
    match kind {
        LookupKind::Roaster => product.roaster_id == Some(id),
        LookupKind::DecafMethod => product.decaf_method_id == Some(id),
        LookupKind::BeanType => product.bean_type_ids.contains(&id),
        LookupKind::Country => product.country_ids.contains(&id),
        _ => false,
    }
}

fn session_field_mut(
    session: &mut BrewSession,
    kind: LookupKind,
) -> Option<&mut Option<LookupId>> {
    match kind {
        LookupKind::BrewMethod => Some(&mut session.brew_method_id),
        LookupKind::Recipe => Some(&mut session.recipe_id),
        LookupKind::Grinder => Some(&mut session.grinder_id),
        LookupKind::Filter => Some(&mut session.filter_id),
        LookupKind::Kettle => Some(&mut session.kettle_id),
        LookupKind::Scale => Some(&mut session.scale_id),
        _ => None,
    }
}

fn session_field(session: &BrewSession, kind: LookupKind) -> Option<LookupId> {
    match kind {
        LookupKind::BrewMethod => session.brew_method_id,
        LookupKind::Recipe => session.recipe_id,
        LookupKind::Grinder => session.grinder_id,
        LookupKind::Filter => session.filter_id,
        LookupKind::Kettle => session.kettle_id,
        LookupKind::Scale => session.scale_id,
        _ => None,
    }
}

/// Rewrite one single-valued field. Returns true if the record changed.
fn rewrite_single(field: &mut Option<LookupId>, target: LookupId, action: RewriteAction) -> bool {
    if *field != Some(target) {
        return false;
    }
    *field = match action {
        RewriteAction::Clear => None,
        RewriteAction::Replace(rid) => Some(rid),
    };
    true
}

/// Rewrite one multi-valued set. Set semantics: replacing A with B in
/// {A, B} yields {B}, never {B, B}.
fn rewrite_set(set: &mut Vec<LookupId>, target: LookupId, action: RewriteAction) -> bool {
    if !set.contains(&target) {
        return false;
    }
    let mut rewritten = Vec::with_capacity(set.len());
    for member in set.iter() {
        let member = if *member == target {
            match action {
                RewriteAction::Clear => continue,
                RewriteAction::Replace(rid) => rid,
            }
        } else {
            *member
        };
        if !rewritten.contains(&member) {
            rewritten.push(member);
        }
    }
    *set = rewritten;
    true
}

#[async_trait]
impl LookupStore for MemoryStore {
    async fn find_lookup(
        &self,
        kind: LookupKind,
        id: LookupId,
    ) -> Result<Option<LookupEntry>, StoreError> {
        let data = self.inner.read();
        Ok(data
            .lookups
            .get(&kind)
            .and_then(|entries| entries.iter().find(|e| e.id == id))
            .cloned())
    }

    async fn lookup_usage(
        &self,
        kind: LookupKind,
        id: LookupId,
    ) -> Result<UsageInfo, StoreError> {
        let data = self.inner.read();
        let mut samples: Vec<UsageSample> = match kind.counted_records() {
            RecordKind::Products => data
                .products
                .iter()
                .filter(|p| product_references(p, kind, id))
                .map(|p| UsageSample {
                    timestamp: p.created_at,
                    label: p.name.clone(),
                })
                .collect(),
            RecordKind::BrewSessions => data
                .sessions
                .iter()
                .filter(|s| session_field(s, kind) == Some(id))
                .map(|s| UsageSample {
                    timestamp: s.brewed_at,
                    label: s.product_name.clone(),
                })
                .collect(),
        };
        samples.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

        let usage_count = samples.len() as u64;
        Ok(UsageInfo {
            in_use: usage_count > 0,
            usage_count,
            counted: kind.counted_records(),
            recent_samples: samples,
        })
    }

    async fn rewrite_references(
        &self,
        kind: LookupKind,
        id: LookupId,
        action: RewriteAction,
    ) -> Result<u64, StoreError> {
        if let RewriteAction::Replace(rid) = action {
            // The rewrite services validate upfront, but the store contract
            // is atomic per call: refuse rather than half-apply.
            let data = self.inner.read();
            let exists = data
                .lookups
                .get(&kind)
                .is_some_and(|entries| entries.iter().any(|e| e.id == rid));
            if !exists {
                return Err(StoreError::Rejected(format!(
                    "replacement {kind} {rid} does not exist"
                )));
            }
        }

        let mut data = self.inner.write();
        let mut updated = 0u64;
        match kind {
            LookupKind::Roaster | LookupKind::DecafMethod => {
                for product in &mut data.products {
                    let field = if kind == LookupKind::Roaster {
                        &mut product.roaster_id
                    } else {
                        &mut product.decaf_method_id
                    };
                    if rewrite_single(field, id, action) {
                        updated += 1;
                    }
                }
            }
            LookupKind::BeanType | LookupKind::Country => {
                for product in &mut data.products {
                    let set = if kind == LookupKind::BeanType {
                        &mut product.bean_type_ids
                    } else {
                        &mut product.country_ids
                    };
                    if rewrite_set(set, id, action) {
                        updated += 1;
                    }
                }
            }
            _ => {
                for session in &mut data.sessions {
                    if let Some(field) = session_field_mut(session, kind) {
                        if rewrite_single(field, id, action) {
                            updated += 1;
                        }
                    }
                }
            }
        }
        debug!("Rewrote {} record(s) for {} {} ({})", updated, kind, id, action);
        Ok(updated)
    }

    async fn delete_lookup(
        &self,
        kind: LookupKind,
        id: LookupId,
    ) -> Result<bool, StoreError> {
        let mut data = self.inner.write();
        let Some(entries) = data.lookups.get_mut(&kind) else {
            return Ok(false);
        };
        let before = entries.len();
        entries.retain(|e| e.id != id);
        Ok(entries.len() < before)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with_roasters() -> (MemoryStore, LookupId, LookupId) {
        let store = MemoryStore::new();
        let a = store
            .create_lookup(LookupKind::Roaster, NewLookup::named("Square Mile"))
            .unwrap();
        let b = store
            .create_lookup(LookupKind::Roaster, NewLookup::named("Tim Wendelboe"))
            .unwrap();
        (store, a.id, b.id)
    }

    #[test]
    fn test_lookup_ids_increment_per_kind() {
        let (store, a, b) = store_with_roasters();
        assert_eq!(a, LookupId(1));
        assert_eq!(b, LookupId(2));
        let g = store
            .create_lookup(LookupKind::Grinder, NewLookup::named("Comandante C40"))
            .unwrap();
        assert_eq!(g.id, LookupId(1));
    }

    #[test]
    fn test_create_rejects_invalid_entry() {
        let store = MemoryStore::new();
        assert!(
            store
                .create_lookup(LookupKind::Roaster, NewLookup::named(" "))
                .is_err()
        );
    }

    #[test]
    fn test_search_matches_name_and_short_form() {
        let store = MemoryStore::new();
        let mut entry = NewLookup::named("Aeropress");
        entry.short_form = Some("AP".into());
        store.create_lookup(LookupKind::BrewMethod, entry).unwrap();
        store
            .create_lookup(LookupKind::BrewMethod, NewLookup::named("V60"))
            .unwrap();

        assert_eq!(store.search(LookupKind::BrewMethod, "aero").len(), 1);
        assert_eq!(store.search(LookupKind::BrewMethod, "ap").len(), 1);
        assert!(store.search(LookupKind::BrewMethod, "").is_empty());
    }

    #[tokio::test]
    async fn test_usage_counts_single_valued_references() {
        let (store, roaster, _) = store_with_roasters();
        store.add_product(NewProduct {
            name: "Red Brick".into(),
            roaster: Some(roaster),
            ..NewProduct::default()
        });
        store.add_product(NewProduct {
            name: "Sweet Shop".into(),
            roaster: Some(roaster),
            ..NewProduct::default()
        });

        let info = store.lookup_usage(LookupKind::Roaster, roaster).await.unwrap();
        assert!(info.in_use);
        assert_eq!(info.usage_count, 2);
        assert_eq!(info.counted, RecordKind::Products);
        assert_eq!(info.recent_samples.len(), 2);
    }

    #[tokio::test]
    async fn test_usage_of_absent_id_is_zero_not_error() {
        let store = MemoryStore::new();
        let info = store
            .lookup_usage(LookupKind::Kettle, LookupId(99))
            .await
            .unwrap();
        assert!(!info.in_use);
        assert_eq!(info.usage_count, 0);
        assert_eq!(info.counted, RecordKind::BrewSessions);
    }

    #[tokio::test]
    async fn test_clear_strips_target_from_sets_only() {
        let store = MemoryStore::new();
        let eth = store
            .create_lookup(LookupKind::BeanType, NewLookup::named("Heirloom"))
            .unwrap();
        let bourbon = store
            .create_lookup(LookupKind::BeanType, NewLookup::named("Bourbon"))
            .unwrap();
        let pid = store.add_product(NewProduct {
            name: "Blend".into(),
            bean_types: vec![eth.id, bourbon.id],
            ..NewProduct::default()
        });

        let updated = store
            .rewrite_references(LookupKind::BeanType, eth.id, RewriteAction::Clear)
            .await
            .unwrap();
        assert_eq!(updated, 1);
        assert_eq!(store.product(pid).unwrap().bean_type_ids, vec![bourbon.id]);
    }

    #[tokio::test]
    async fn test_replace_in_set_never_duplicates() {
        let store = MemoryStore::new();
        let a = store
            .create_lookup(LookupKind::BeanType, NewLookup::named("Typica"))
            .unwrap();
        let b = store
            .create_lookup(LookupKind::BeanType, NewLookup::named("Caturra"))
            .unwrap();
        let pid = store.add_product(NewProduct {
            name: "Blend".into(),
            bean_types: vec![a.id, b.id],
            ..NewProduct::default()
        });

        let updated = store
            .rewrite_references(LookupKind::BeanType, a.id, RewriteAction::Replace(b.id))
            .await
            .unwrap();
        assert_eq!(updated, 1);
        assert_eq!(store.product(pid).unwrap().bean_type_ids, vec![b.id]);
    }

    #[tokio::test]
    async fn test_rewrite_is_idempotent() {
        let (store, roaster, other) = store_with_roasters();
        let pid = store.add_product(NewProduct {
            name: "Filter Blend".into(),
            roaster: Some(roaster),
            ..NewProduct::default()
        });

        let first = store
            .rewrite_references(LookupKind::Roaster, roaster, RewriteAction::Replace(other))
            .await
            .unwrap();
        let second = store
            .rewrite_references(LookupKind::Roaster, roaster, RewriteAction::Replace(other))
            .await
            .unwrap();
        assert_eq!(first, 1);
        assert_eq!(second, 0);
        assert_eq!(store.product(pid).unwrap().roaster_id, Some(other));
    }

    #[tokio::test]
    async fn test_rewrite_refuses_missing_replacement() {
        let (store, roaster, _) = store_with_roasters();
        store.add_product(NewProduct {
            name: "Espresso Blend".into(),
            roaster: Some(roaster),
            ..NewProduct::default()
        });

        let result = store
            .rewrite_references(
                LookupKind::Roaster,
                roaster,
                RewriteAction::Replace(LookupId(99)),
            )
            .await;
        assert!(matches!(result, Err(StoreError::Rejected(_))));
        // Nothing was half-applied.
        assert_eq!(store.products()[0].roaster_id, Some(roaster));
    }

    #[tokio::test]
    async fn test_delete_absent_is_noop_success() {
        let store = MemoryStore::new();
        let removed = store
            .delete_lookup(LookupKind::Scale, LookupId(5))
            .await
            .unwrap();
        assert!(!removed);
    }

    #[tokio::test]
    async fn test_session_equipment_rewrites() {
        let store = MemoryStore::new();
        let grinder = store
            .create_lookup(LookupKind::Grinder, NewLookup::named("Niche Zero"))
            .unwrap();
        let sid = store.add_session(NewSession {
            product_name: "Kenya AA".into(),
            grinder: Some(grinder.id),
            ..NewSession::default()
        });

        let updated = store
            .rewrite_references(LookupKind::Grinder, grinder.id, RewriteAction::Clear)
            .await
            .unwrap();
        assert_eq!(updated, 1);
        assert_eq!(store.session(sid).unwrap().grinder_id, None);
    }
}
