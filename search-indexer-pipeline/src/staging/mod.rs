//! Staging module for the search indexer pipeline.
//!
//! Holds pending mutations keyed by unique id until the next commit.
//!
//! - Adds are first-write-wins: a second add for the same id is ignored.
//! - Updates and removals are last-write-wins.
//! - The three registries are independent. The same id may be pending in
//!   all of them at once, and each is dispatched on its own.
//!
//! Staging calls take `&self` and may run concurrently from any number of
//! producer threads. Each registry is a sharded concurrent map, so the
//! overwrite policy is resolved per key without a global lock.

use std::collections::HashSet;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::{debug, error, warn};

use search_indexer_shared::{BinaryItem, DocumentRef, IndexItem, MutationKind};

/// Restricts staging and commits to a set of active publications.
///
/// An empty set accepts every publication.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublicationFilter {
    active: HashSet<String>,
}

impl PublicationFilter {
    /// A filter accepting every publication.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn new<I, S>(publication_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            active: publication_ids.into_iter().map(Into::into).collect(),
        }
    }

    pub fn accepts(&self, publication_id: &str) -> bool {
        self.active.is_empty() || self.active.contains(publication_id)
    }

    pub fn is_unrestricted(&self) -> bool {
        self.active.is_empty()
    }
}

/// Why a staging call left the registry untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    FilteredPublication,
    EmptyId,
    DuplicateAdd,
}

/// Result of a staging call. Staging never fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageOutcome {
    /// The id was not pending in the target registry.
    Staged,
    /// A pending entry with the same id was overwritten.
    Replaced,
    Ignored(IgnoreReason),
}

impl StageOutcome {
    pub fn is_staged(&self) -> bool {
        matches!(self, StageOutcome::Staged | StageOutcome::Replaced)
    }
}

/// Number of pending entries per registry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PendingCounts {
    pub adds: usize,
    pub updates: usize,
    pub removals: usize,
    pub binaries: usize,
}

impl PendingCounts {
    pub fn total(&self) -> usize {
        self.adds + self.updates + self.removals + self.binaries
    }
}

/// In-memory registries of pending mutations.
pub struct StagingRegistry {
    filter: PublicationFilter,
    adds: DashMap<String, IndexItem>,
    updates: DashMap<String, IndexItem>,
    removals: DashMap<String, DocumentRef>,
    // Never populated: binary indexing is not implemented.
    binaries: DashMap<String, BinaryItem>,
}

impl Default for StagingRegistry {
    fn default() -> Self {
        Self::new(PublicationFilter::all())
    }
}

impl StagingRegistry {
    pub fn new(filter: PublicationFilter) -> Self {
        Self {
            filter,
            adds: DashMap::new(),
            updates: DashMap::new(),
            removals: DashMap::new(),
            binaries: DashMap::new(),
        }
    }

    /// Stage any kind of mutation.
    pub fn stage(&self, mutation: MutationKind) -> StageOutcome {
        match mutation {
            MutationKind::Add(item) => self.stage_add(item),
            MutationKind::Update(item) => self.stage_update(item),
            MutationKind::Remove(doc) => self.stage_remove(doc),
        }
    }

    /// Stage an add. The first add for an id wins until the next commit.
    pub fn stage_add(&self, item: IndexItem) -> StageOutcome {
        if let Some(ignored) = self.admit("add", &item.id, &item.publication_id) {
            return ignored;
        }
        warn_if_empty(&item);

        match self.adds.entry(item.id.clone()) {
            Entry::Occupied(_) => {
                debug!(id = %item.id, "Add already staged, keeping the first one");
                StageOutcome::Ignored(IgnoreReason::DuplicateAdd)
            }
            Entry::Vacant(entry) => {
                entry.insert(item);
                StageOutcome::Staged
            }
        }
    }

    /// Stage an update. The latest update for an id wins.
    pub fn stage_update(&self, item: IndexItem) -> StageOutcome {
        if let Some(ignored) = self.admit("update", &item.id, &item.publication_id) {
            return ignored;
        }
        warn_if_empty(&item);

        replaced_or_staged(self.updates.insert(item.id.clone(), item).is_some())
    }

    /// Stage a removal. The latest removal for an id wins.
    pub fn stage_remove(&self, doc: DocumentRef) -> StageOutcome {
        if let Some(ignored) = self.admit("remove", &doc.id, &doc.publication_id) {
            return ignored;
        }

        replaced_or_staged(self.removals.insert(doc.id.clone(), doc).is_some())
    }

    /// Apply the publication filter and the non-empty id rule.
    fn admit(&self, action: &'static str, id: &str, publication_id: &str) -> Option<StageOutcome> {
        debug!(action = action, id = %id, publication_id = %publication_id, "Staging mutation");

        if !self.filter.accepts(publication_id) {
            debug!(
                action = action,
                publication_id = %publication_id,
                "Publication is not active, ignoring mutation"
            );
            return Some(StageOutcome::Ignored(IgnoreReason::FilteredPublication));
        }

        if id.is_empty() {
            error!(action = action, publication_id = %publication_id, "Unique id is empty, ignoring mutation");
            return Some(StageOutcome::Ignored(IgnoreReason::EmptyId));
        }

        None
    }

    pub fn staged_add(&self, id: &str) -> Option<IndexItem> {
        self.adds.get(id).map(|entry| entry.value().clone())
    }

    pub fn staged_update(&self, id: &str) -> Option<IndexItem> {
        self.updates.get(id).map(|entry| entry.value().clone())
    }

    pub fn staged_removal(&self, id: &str) -> Option<DocumentRef> {
        self.removals.get(id).map(|entry| entry.value().clone())
    }

    pub fn pending(&self) -> PendingCounts {
        PendingCounts {
            adds: self.adds.len(),
            updates: self.updates.len(),
            removals: self.removals.len(),
            binaries: self.binaries.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.pending().total() == 0
    }

    /// Current adds, ordered by id.
    pub(crate) fn adds_snapshot(&self) -> Vec<IndexItem> {
        snapshot(&self.adds)
    }

    /// Current updates, ordered by id.
    pub(crate) fn updates_snapshot(&self) -> Vec<IndexItem> {
        snapshot(&self.updates)
    }

    /// Current removals, ordered by id.
    pub(crate) fn removals_snapshot(&self) -> Vec<DocumentRef> {
        snapshot(&self.removals)
    }

    /// Empty every registry.
    pub(crate) fn clear(&self) {
        self.adds.clear();
        self.updates.clear();
        self.removals.clear();
        self.binaries.clear();
    }
}

fn warn_if_empty(item: &IndexItem) {
    if item.field_count() == 0 {
        warn!(id = %item.id, item = ?item, "To be indexed item has no data");
    }
}

fn replaced_or_staged(replaced: bool) -> StageOutcome {
    if replaced {
        StageOutcome::Replaced
    } else {
        StageOutcome::Staged
    }
}

fn snapshot<V: Clone>(map: &DashMap<String, V>) -> Vec<V> {
    let mut entries: Vec<(String, V)> = map
        .iter()
        .map(|entry| (entry.key().clone(), entry.value().clone()))
        .collect();
    entries.sort_by(|a, b| a.0.cmp(&b.0));
    entries.into_iter().map(|(_, value)| value).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;

    fn item(id: &str, title: &str) -> IndexItem {
        IndexItem::new(id, "1").with_value("title", title)
    }

    #[test]
    fn test_add_first_write_wins() {
        let registry = StagingRegistry::default();

        assert_eq!(registry.stage_add(item("a", "first")), StageOutcome::Staged);
        assert_eq!(
            registry.stage_add(item("a", "second")),
            StageOutcome::Ignored(IgnoreReason::DuplicateAdd)
        );
        assert_eq!(
            registry.stage_add(item("a", "third")),
            StageOutcome::Ignored(IgnoreReason::DuplicateAdd)
        );

        let staged = registry.staged_add("a").unwrap();
        assert_eq!(staged.fields["title"], vec![json!("first")]);
        assert_eq!(registry.pending().adds, 1);
    }

    #[test]
    fn test_update_last_write_wins() {
        let registry = StagingRegistry::default();

        assert_eq!(registry.stage_update(item("a", "first")), StageOutcome::Staged);
        assert_eq!(registry.stage_update(item("a", "second")), StageOutcome::Replaced);
        assert_eq!(registry.stage_update(item("a", "third")), StageOutcome::Replaced);

        let staged = registry.staged_update("a").unwrap();
        assert_eq!(staged.fields["title"], vec![json!("third")]);
        assert_eq!(registry.pending().updates, 1);
    }

    #[test]
    fn test_remove_last_write_wins() {
        let registry = StagingRegistry::default();

        registry.stage_remove(DocumentRef::new("a", "1"));
        let outcome = registry.stage_remove(DocumentRef::new("a", "2"));

        assert_eq!(outcome, StageOutcome::Replaced);
        assert_eq!(registry.staged_removal("a").unwrap().publication_id, "2");
        assert_eq!(registry.pending().removals, 1);
    }

    #[test]
    fn test_empty_id_is_ignored() {
        let registry = StagingRegistry::default();

        assert_eq!(
            registry.stage_add(item("", "x")),
            StageOutcome::Ignored(IgnoreReason::EmptyId)
        );
        assert_eq!(
            registry.stage_update(item("", "x")),
            StageOutcome::Ignored(IgnoreReason::EmptyId)
        );
        assert_eq!(
            registry.stage_remove(DocumentRef::new("", "1")),
            StageOutcome::Ignored(IgnoreReason::EmptyId)
        );
        assert!(registry.is_empty());
    }

    #[test]
    fn test_filtered_publication_is_ignored() {
        let registry = StagingRegistry::new(PublicationFilter::new(["5", "7"]));

        let outcome = registry.stage_add(IndexItem::new("a", "1").with_value("title", "x"));
        assert_eq!(outcome, StageOutcome::Ignored(IgnoreReason::FilteredPublication));

        let outcome = registry.stage_remove(DocumentRef::new("b", "3"));
        assert_eq!(outcome, StageOutcome::Ignored(IgnoreReason::FilteredPublication));

        assert!(registry.is_empty());

        assert!(registry
            .stage_update(IndexItem::new("c", "7").with_value("title", "x"))
            .is_staged());
        assert_eq!(registry.pending().updates, 1);
    }

    #[test]
    fn test_filter_checked_before_empty_id() {
        let registry = StagingRegistry::new(PublicationFilter::new(["5"]));

        let outcome = registry.stage_add(IndexItem::new("", "1"));

        assert_eq!(outcome, StageOutcome::Ignored(IgnoreReason::FilteredPublication));
    }

    #[test]
    fn test_zero_field_item_is_accepted() {
        let registry = StagingRegistry::default();

        assert_eq!(registry.stage_add(IndexItem::new("a", "1")), StageOutcome::Staged);
        assert_eq!(registry.staged_add("a").unwrap().field_count(), 0);
    }

    #[test]
    fn test_registries_are_independent() {
        let registry = StagingRegistry::default();

        registry.stage(MutationKind::Add(item("x", "added")));
        registry.stage(MutationKind::Update(item("x", "updated")));
        registry.stage(MutationKind::Remove(DocumentRef::new("x", "1")));

        assert_eq!(
            registry.pending(),
            PendingCounts {
                adds: 1,
                updates: 1,
                removals: 1,
                binaries: 0
            }
        );
    }

    #[test]
    fn test_snapshot_is_ordered_by_id() {
        let registry = StagingRegistry::default();
        for id in ["d", "b", "e", "a", "c"] {
            registry.stage_add(item(id, id));
        }

        let ids: Vec<String> = registry
            .adds_snapshot()
            .into_iter()
            .map(|item| item.id)
            .collect();

        assert_eq!(ids, vec!["a", "b", "c", "d", "e"]);
    }

    #[test]
    fn test_clear_empties_everything() {
        let registry = StagingRegistry::default();
        registry.stage_add(item("a", "x"));
        registry.stage_update(item("b", "x"));
        registry.stage_remove(DocumentRef::new("c", "1"));

        registry.clear();

        assert!(registry.is_empty());
        assert!(registry.removals_snapshot().is_empty());
        assert!(registry.updates_snapshot().is_empty());
    }

    #[test]
    fn test_concurrent_staging() {
        let registry = Arc::new(StagingRegistry::default());

        std::thread::scope(|scope| {
            for producer in 0..8 {
                let registry = registry.clone();
                scope.spawn(move || {
                    for n in 0..100 {
                        let id = format!("doc-{}", n);
                        registry.stage_add(item(&id, &format!("producer-{}", producer)));
                        registry.stage_update(item(&id, &format!("producer-{}", producer)));
                        registry.stage_remove(DocumentRef::new(id, "1"));
                    }
                });
            }
        });

        let pending = registry.pending();
        assert_eq!(pending.adds, 100);
        assert_eq!(pending.updates, 100);
        assert_eq!(pending.removals, 100);
    }
}
