// ── Dependency Graph ──
//
// An artifact's dependency set: document ids of other artifacts it references.
// Set semantics with insertion order kept for display. Resolution against the
// loaded listing only filters what is shown; it never trims the stored set.

use serde::{Deserialize, Serialize};

use crate::types::{Artifact, ArtifactSummary, DocumentId};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DependencySet(Vec<DocumentId>);

// ── Public API ──

impl DependencySet {
    /// Build a set owned by `owner`. Duplicates collapse, `owner` itself is dropped.
    pub fn for_owner<I>(owner: &DocumentId, ids: I) -> Self
    where
        I: IntoIterator<Item = DocumentId>,
    {
        let mut set = Self::default();
        set.replace(owner, ids);
        set
    }

    /// Bulk-select semantics: the whole set is replaced.
    pub fn replace<I>(&mut self, owner: &DocumentId, ids: I)
    where
        I: IntoIterator<Item = DocumentId>,
    {
        self.0.clear();
        for id in ids {
            if &id == owner {
                log::warn!("ignoring self-reference in dependencies of {}", owner);
                continue;
            }
            if !self.0.contains(&id) {
                self.0.push(id);
            }
        }
    }

    /// Remove exactly one id. Returns whether anything was removed.
    pub fn remove(&mut self, id: &DocumentId) -> bool {
        let before = self.0.len();
        self.0.retain(|existing| existing != id);
        self.0.len() != before
    }

    pub fn contains(&self, id: &DocumentId) -> bool {
        self.0.contains(id)
    }

    pub fn ids(&self) -> &[DocumentId] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DocumentId> {
        self.0.iter()
    }

    /// Summaries for the dependencies present in `loaded`, in dependency order.
    /// Ids with no loaded artifact are skipped.
    pub fn resolve<'a, I>(&self, loaded: I) -> Vec<ArtifactSummary>
    where
        I: IntoIterator<Item = &'a Artifact>,
    {
        let loaded: Vec<&Artifact> = loaded.into_iter().collect();
        self.0
            .iter()
            .filter_map(|id| loaded.iter().find(|a| &a.document_id == id))
            .map(|a| a.summary())
            .collect()
    }

    /// Ids that `resolve` would skip against the same listing.
    pub fn unresolved<'a, I>(&self, loaded: I) -> Vec<DocumentId>
    where
        I: IntoIterator<Item = &'a Artifact>,
    {
        let loaded: Vec<&Artifact> = loaded.into_iter().collect();
        self.0
            .iter()
            .filter(|id| !loaded.iter().any(|a| &a.document_id == *id))
            .cloned()
            .collect()
    }
}

impl IntoIterator for DependencySet {
    type Item = DocumentId;
    type IntoIter = std::vec::IntoIter<DocumentId>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a DependencySet {
    type Item = &'a DocumentId;
    type IntoIter = std::slice::Iter<'a, DocumentId>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ArtType;

    fn id(s: &str) -> DocumentId {
        DocumentId::new(s)
    }

    fn loaded(ids: &[&str]) -> Vec<Artifact> {
        ids.iter()
            .map(|s| {
                let mut a = Artifact::draft(id(s), s.to_uppercase(), ArtType::Note);
                a.is_new = false;
                a.version = 1;
                a
            })
            .collect()
    }

    #[test]
    fn test_replace_collapses_duplicates_and_keeps_order() {
        let owner = id("owner");
        let set = DependencySet::for_owner(&owner, vec![id("c"), id("a"), id("c"), id("b")]);
        assert_eq!(set.ids(), &[id("c"), id("a"), id("b")]);
    }

    #[test]
    fn test_replace_is_a_full_replacement() {
        let owner = id("owner");
        let mut set = DependencySet::for_owner(&owner, vec![id("a"), id("b")]);
        set.replace(&owner, vec![id("c")]);
        assert_eq!(set.ids(), &[id("c")]);
    }

    #[test]
    fn test_never_contains_owner() {
        let owner = id("owner");
        let set = DependencySet::for_owner(&owner, vec![id("owner"), id("a")]);
        assert!(!set.contains(&owner));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let owner = id("owner");
        let mut set = DependencySet::for_owner(&owner, vec![id("a"), id("b")]);
        let before = set.clone();
        assert!(!set.remove(&id("zzz")));
        assert_eq!(set, before);
    }

    #[test]
    fn test_add_then_remove_yields_empty() {
        let owner = id("owner");
        let mut set = DependencySet::default();
        set.replace(&owner, vec![id("A")]);
        assert!(set.remove(&id("A")));
        assert!(set.is_empty());
    }

    #[test]
    fn test_resolve_skips_unloaded_without_trimming() {
        let owner = id("owner");
        let set = DependencySet::for_owner(&owner, vec![id("b"), id("missing"), id("a")]);
        let listing = loaded(&["a", "b", "c"]);

        let resolved = set.resolve(&listing);
        let resolved_ids: Vec<&str> = resolved.iter().map(|s| s.document_id.as_str()).collect();
        assert_eq!(resolved_ids, vec!["b", "a"]);
        assert_eq!(resolved[0].title, "B");

        assert_eq!(set.unresolved(&listing), vec![id("missing")]);
        // the stored set is untouched
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn test_resolve_against_empty_listing() {
        let owner = id("owner");
        let set = DependencySet::for_owner(&owner, vec![id("a")]);
        assert!(set.resolve(&Vec::new()).is_empty());
        assert_eq!(set.unresolved(&Vec::new()), vec![id("a")]);
    }
}
