use std::collections::BTreeMap;

use crate::error::{CoreError, Result};
use crate::id::ObjectId;

use super::hierarchy::{Ancestors, Attach, Hierarchy};

/// Identifier-keyed exclusive-ownership store for one object kind.
///
/// Entries iterate in ascending identifier order, which is issuance order for
/// identifiers from a single [`IdSource`](crate::id::IdSource). Hierarchy edges
/// live in a side table and only ever connect live entries.
///
/// Removal hands ownership back to the caller instead of dropping in place:
/// objects owning backend handles must be released against the backend by
/// whoever owns both the registry and the backend.
#[derive(Debug)]
pub struct Registry<T> {
    kind: &'static str,
    entries: BTreeMap<ObjectId, T>,
    hierarchy: Hierarchy,
}

impl<T> Registry<T> {
    /// `kind` names the stored objects in log messages and errors.
    pub fn new(kind: &'static str) -> Self {
        Self {
            kind,
            entries: BTreeMap::new(),
            hierarchy: Hierarchy::new(),
        }
    }

    #[inline]
    pub fn kind(&self) -> &'static str {
        self.kind
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[inline]
    pub fn contains(&self, id: ObjectId) -> bool {
        self.entries.contains_key(&id)
    }

    /// Inserts `value` under `id`. Fails if the identifier is taken.
    pub fn add(&mut self, id: ObjectId, value: T) -> Result<&mut T> {
        if self.entries.contains_key(&id) {
            log::error!(
                target: "registry",
                "cannot add {} with ID '{id}' because the ID is already assigned",
                self.kind
            );
            return Err(CoreError::DuplicateId { kind: self.kind, id });
        }
        Ok(self.entries.entry(id).or_insert(value))
    }

    #[inline]
    pub fn get(&self, id: ObjectId) -> Option<&T> {
        self.entries.get(&id)
    }

    #[inline]
    pub fn get_mut(&mut self, id: ObjectId) -> Option<&mut T> {
        self.entries.get_mut(&id)
    }

    /// Like [`get`](Self::get) but reports a missing entry.
    pub fn lookup(&self, id: ObjectId) -> Result<&T> {
        match self.entries.get(&id) {
            Some(v) => Ok(v),
            None => Err(self.not_found(id)),
        }
    }

    pub fn lookup_mut(&mut self, id: ObjectId) -> Result<&mut T> {
        let kind = self.kind;
        match self.entries.get_mut(&id) {
            Some(v) => Ok(v),
            None => Err(not_found(kind, id)),
        }
    }

    /// Removes `id` and its whole subtree.
    ///
    /// Returns the removed objects children-first, ending with `id` itself.
    /// All hierarchy edges touching removed nodes are gone when this returns.
    pub fn remove(&mut self, id: ObjectId) -> Result<Vec<(ObjectId, T)>> {
        if !self.entries.contains_key(&id) {
            return Err(self.not_found(id));
        }

        let order = self.hierarchy.subtree_post_order(id);
        let mut removed = Vec::with_capacity(order.len());
        for node in order {
            self.hierarchy.forget(node);
            if let Some(value) = self.entries.remove(&node) {
                removed.push((node, value));
            }
        }

        log::debug!(
            target: "registry",
            "removed {} '{id}' ({} object(s) including descendants)",
            self.kind,
            removed.len()
        );

        Ok(removed)
    }

    /// Removes every entry, children before parents.
    pub fn drain(&mut self) -> Vec<(ObjectId, T)> {
        let roots: Vec<ObjectId> = self
            .entries
            .keys()
            .copied()
            .filter(|&id| self.hierarchy.parent(id).is_none())
            .collect();

        let mut out = Vec::with_capacity(self.entries.len());
        for root in roots {
            if let Ok(mut removed) = self.remove(root) {
                out.append(&mut removed);
            }
        }
        out
    }

    /// Attaches `child` under `parent`. Both must be live.
    pub fn set_parent(&mut self, child: ObjectId, parent: ObjectId) -> Result<Attach> {
        if !self.contains(child) {
            return Err(self.not_found(child));
        }
        if !self.contains(parent) {
            log::error!(
                target: "registry",
                "cannot parent {} '{child}' under '{parent}' because the parent does not exist",
                self.kind
            );
            return Err(CoreError::InvalidParent {
                child,
                parent,
                reason: "the parent does not exist",
            });
        }

        self.hierarchy.attach(child, parent).inspect_err(|e| {
            log::error!(target: "registry", "{} hierarchy: {e}", self.kind);
        })
    }

    /// Detaches `child` from its parent. Returns the former parent.
    pub fn remove_parent(&mut self, child: ObjectId) -> Result<Option<ObjectId>> {
        if !self.contains(child) {
            return Err(self.not_found(child));
        }
        Ok(self.hierarchy.detach(child))
    }

    #[inline]
    pub fn parent(&self, id: ObjectId) -> Option<ObjectId> {
        self.hierarchy.parent(id)
    }

    #[inline]
    pub fn children(&self, id: ObjectId) -> &[ObjectId] {
        self.hierarchy.children(id)
    }

    #[inline]
    pub fn ancestors(&self, id: ObjectId) -> Ancestors<'_> {
        self.hierarchy.ancestors(id)
    }

    /// Every node below `id`, children before their parents. Excludes `id`.
    pub fn descendants(&self, id: ObjectId) -> Vec<ObjectId> {
        let mut nodes = self.hierarchy.subtree_post_order(id);
        nodes.pop();
        nodes
    }

    pub fn hierarchy(&self) -> &Hierarchy {
        &self.hierarchy
    }

    /// Identifiers in ascending order.
    pub fn ids(&self) -> impl Iterator<Item = ObjectId> + '_ {
        self.entries.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ObjectId, &T)> {
        self.entries.iter().map(|(&id, v)| (id, v))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (ObjectId, &mut T)> {
        self.entries.iter_mut().map(|(&id, v)| (id, v))
    }

    fn not_found(&self, id: ObjectId) -> CoreError {
        not_found(self.kind, id)
    }
}

fn not_found(kind: &'static str, id: ObjectId) -> CoreError {
    log::error!(target: "registry", "{kind} with ID '{id}' does not exist");
    CoreError::NotFound { kind, id }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;
    use crate::id::IdSource;

    fn id(v: u32) -> ObjectId {
        ObjectId::new(v).unwrap()
    }

    #[test]
    fn add_get_remove() {
        let mut reg = Registry::new("thing");
        reg.add(id(1), "a").unwrap();

        assert_eq!(reg.get(id(1)), Some(&"a"));
        assert_eq!(reg.len(), 1);

        let removed = reg.remove(id(1)).unwrap();
        assert_eq!(removed, vec![(id(1), "a")]);
        assert!(reg.get(id(1)).is_none());
        assert!(reg.is_empty());
    }

    #[test]
    fn duplicate_add_fails_and_keeps_original() {
        let mut reg = Registry::new("thing");
        reg.add(id(1), 10).unwrap();

        let err = reg.add(id(1), 20).unwrap_err();
        assert!(matches!(err, CoreError::DuplicateId { kind: "thing", .. }));
        assert_eq!(reg.get(id(1)), Some(&10));

        *reg.lookup_mut(id(1)).unwrap() += 1;
        assert_eq!(reg.get(id(1)), Some(&11));
    }

    #[test]
    fn missing_lookups_report_not_found() {
        let mut reg: Registry<u8> = Registry::new("thing");
        assert!(reg.get(id(4)).is_none());
        assert!(matches!(reg.lookup(id(4)), Err(CoreError::NotFound { .. })));
        assert!(matches!(reg.lookup_mut(id(4)), Err(CoreError::NotFound { kind: "thing", .. })));
        assert!(matches!(reg.remove(id(4)), Err(CoreError::NotFound { .. })));
        assert!(matches!(reg.remove_parent(id(4)), Err(CoreError::NotFound { .. })));
    }

    #[test]
    fn removal_is_recursive_and_children_first() {
        let mut reg = Registry::new("node");
        for v in 1..=4 {
            reg.add(id(v), v).unwrap();
        }
        reg.set_parent(id(2), id(1)).unwrap();
        reg.set_parent(id(3), id(2)).unwrap();

        let removed: Vec<_> = reg.remove(id(1)).unwrap().into_iter().map(|(i, _)| i).collect();
        assert_eq!(removed, vec![id(3), id(2), id(1)]);

        for gone in [1, 2, 3] {
            assert!(reg.get(id(gone)).is_none());
        }
        assert_eq!(reg.get(id(4)), Some(&4));
        assert_eq!(reg.hierarchy().edge_count(), 0);
    }

    #[test]
    fn removing_a_child_detaches_it_from_its_parent() {
        let mut reg = Registry::new("node");
        reg.add(id(1), ()).unwrap();
        reg.add(id(2), ()).unwrap();
        reg.set_parent(id(2), id(1)).unwrap();

        reg.remove(id(2)).unwrap();
        assert!(reg.children(id(1)).is_empty());
    }

    #[test]
    fn parent_must_be_live() {
        let mut reg = Registry::new("node");
        reg.add(id(1), ()).unwrap();

        let err = reg.set_parent(id(1), id(9)).unwrap_err();
        assert!(matches!(err, CoreError::InvalidParent { .. }));
        assert_eq!(reg.parent(id(1)), None);
    }

    #[test]
    fn reparenting_twice_keeps_a_single_edge() {
        let mut reg = Registry::new("node");
        reg.add(id(1), ()).unwrap();
        reg.add(id(2), ()).unwrap();

        assert!(reg.set_parent(id(2), id(1)).unwrap().changed());
        assert!(!reg.set_parent(id(2), id(1)).unwrap().changed());
        assert_eq!(reg.children(id(1)), &[id(2)]);
        assert_eq!(reg.hierarchy().edge_count(), 1);
    }

    #[test]
    fn iteration_follows_issuance_order() {
        let mut ids = IdSource::new();
        let mut reg = Registry::new("node");
        let issued: Vec<_> = (0..5).map(|_| ids.issue().unwrap()).collect();
        for &i in issued.iter().rev() {
            reg.add(i, ()).unwrap();
        }
        assert_eq!(reg.ids().collect::<Vec<_>>(), issued);
    }

    #[test]
    fn drain_empties_the_registry() {
        let mut reg = Registry::new("node");
        for v in 1..=3 {
            reg.add(id(v), ()).unwrap();
        }
        reg.set_parent(id(1), id(3)).unwrap();

        let drained: Vec<_> = reg.drain().into_iter().map(|(i, _)| i).collect();
        assert_eq!(drained.len(), 3);
        assert!(reg.is_empty());
        let pos = |x| drained.iter().position(|&d| d == id(x)).unwrap();
        assert!(pos(1) < pos(3));
    }

    /// Replays a scripted sequence of adds/removes/parenting and checks the
    /// live set against a simple model.
    #[test]
    fn live_set_matches_model_after_replay() {
        let mut ids = IdSource::new();
        let mut reg = Registry::new("node");
        let mut model: BTreeSet<ObjectId> = BTreeSet::new();
        let mut parent_of: Vec<(ObjectId, ObjectId)> = Vec::new();

        let mut live = Vec::new();
        for step in 0u32..40 {
            match step % 5 {
                0 | 1 | 2 => {
                    let i = ids.issue().unwrap();
                    reg.add(i, step).unwrap();
                    model.insert(i);
                    if let Some(&p) = live.get((step as usize * 7) % (live.len().max(1))) {
                        if reg.set_parent(i, p).is_ok() {
                            parent_of.push((i, p));
                        }
                    }
                    live.push(i);
                }
                _ => {
                    if live.is_empty() {
                        continue;
                    }
                    let victim = live[(step as usize * 3) % live.len()];
                    // Model: victim plus everything whose ancestor chain hits it.
                    let mut doomed = BTreeSet::from([victim]);
                    loop {
                        let before = doomed.len();
                        for &(c, p) in &parent_of {
                            if doomed.contains(&p) {
                                doomed.insert(c);
                            }
                        }
                        if doomed.len() == before {
                            break;
                        }
                    }
                    reg.remove(victim).unwrap();
                    model.retain(|i| !doomed.contains(i));
                    parent_of.retain(|(c, p)| !doomed.contains(c) && !doomed.contains(p));
                    live.retain(|i| !doomed.contains(i));
                    for gone in &doomed {
                        assert!(reg.get(*gone).is_none());
                    }
                }
            }
        }

        assert_eq!(reg.ids().collect::<BTreeSet<_>>(), model);
    }
}
