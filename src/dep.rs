use std::collections::BTreeMap;
use std::ffi::{OsStr, OsString};

use crate::mask::FileKind;

/// One directory entry recorded by a scan: a name, the inode it resolved to at scan time, and a
/// type hint.
///
/// `inode` may repeat across entries within one list (hard links); `name` may not.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DepItem {
    pub name: OsString,
    pub inode: u64,
    pub kind: FileKind,
}

impl DepItem {
    pub fn new(name: OsString, inode: u64, kind: FileKind) -> Self {
        Self { name, inode, kind }
    }
}

/// A snapshot of one directory's contents, keyed by entry name.
///
/// Iteration order is alphabetical by name (a `BTreeMap` gives this for free), which is what
/// makes `diff()` stable and what the worker relies on to emit rescan-synthesized events in
/// alphabetical order.
#[derive(Clone, Debug, Default)]
pub struct DepList {
    items: BTreeMap<OsString, DepItem>,
}

impl DepList {
    pub fn new() -> Self {
        Self {
            items: BTreeMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Insert or overwrite an entry by name.
    pub fn insert(&mut self, item: DepItem) {
        self.items.insert(item.name.clone(), item);
    }

    pub fn get(&self, name: &OsStr) -> Option<&DepItem> {
        self.items.get(name)
    }

    pub fn remove(&mut self, name: &OsStr) -> Option<DepItem> {
        self.items.remove(name)
    }

    /// Rename an entry in place, preserving its inode/kind. No-op if `from` isn't present.
    pub fn rename(&mut self, from: &OsStr, to: OsString) {
        if let Some(mut item) = self.items.remove(from) {
            item.name = to.clone();
            self.items.insert(to, item);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &DepItem> {
        self.items.values()
    }

    pub fn names(&self) -> impl Iterator<Item = &OsString> {
        self.items.keys()
    }

    /// Diff two snapshots of the same directory.
    ///
    /// Entries that disappeared under one name and reappeared under another with the same inode
    /// are reported as renames rather than as an unrelated removal/addition pair; this is what
    /// lets a plain `mv` inside a watched directory produce `MOVED_FROM`/`MOVED_TO` instead of
    /// `DELETE`/`CREATE`.
    ///
    /// An entry that keeps its *name* across both snapshots but resolves to a different inode
    /// (a file unlinked and replaced in place by a new file with the same name, observed across
    /// two separate rescans rather than within one `add_subwatch` call) is a removal of the old
    /// item and an addition of the new one, not "unchanged" -- name-set membership alone can't
    /// tell the two apart from a no-op, so inodes are compared for every name present in both
    /// snapshots.
    pub fn diff(old: &DepList, new: &DepList) -> Diff {
        let mut removed_by_name: Vec<DepItem> = Vec::new();
        let mut added_by_name: Vec<DepItem> = Vec::new();

        for (name, old_item) in old.items.iter() {
            match new.items.get(name) {
                None => removed_by_name.push(old_item.clone()),
                Some(new_item) if new_item.inode != old_item.inode => {
                    removed_by_name.push(old_item.clone());
                    added_by_name.push(new_item.clone());
                }
                Some(_) => {}
            }
        }

        added_by_name.extend(
            new.items
                .iter()
                .filter(|(name, _)| !old.items.contains_key(*name))
                .map(|(_, item)| item.clone()),
        );

        let mut renamed = Vec::new();

        removed_by_name.retain(|removed| {
            if let Some(pos) = added_by_name
                .iter()
                .position(|added| added.inode == removed.inode)
            {
                let added = added_by_name.remove(pos);
                renamed.push((removed.clone(), added));
                false
            } else {
                true
            }
        });

        Diff {
            added: added_by_name,
            removed: removed_by_name,
            renamed,
        }
    }
}

/// The result of [`DepList::diff()`].
#[derive(Debug, Default)]
pub struct Diff {
    pub added: Vec<DepItem>,
    pub removed: Vec<DepItem>,
    pub renamed: Vec<(DepItem, DepItem)>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(name: &str, inode: u64) -> DepItem {
        DepItem::new(OsString::from(name), inode, FileKind::Regular)
    }

    #[test]
    fn test_insert_and_alphabetical_order() {
        let mut list = DepList::new();
        list.insert(item("b", 2));
        list.insert(item("a", 1));
        list.insert(item("c", 3));

        let names: Vec<_> = list.names().map(|n| n.to_str().unwrap()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_diff_create_delete() {
        let mut old = DepList::new();
        old.insert(item("a", 1));

        let mut new = DepList::new();
        new.insert(item("a", 1));
        new.insert(item("b", 2));

        let diff = DepList::diff(&old, &new);
        assert_eq!(diff.added.len(), 1);
        assert_eq!(diff.added[0].name, "b");
        assert!(diff.removed.is_empty());
        assert!(diff.renamed.is_empty());
    }

    #[test]
    fn test_diff_rename_same_inode() {
        let mut old = DepList::new();
        old.insert(item("x", 10));

        let mut new = DepList::new();
        new.insert(item("y", 10));

        let diff = DepList::diff(&old, &new);
        assert!(diff.added.is_empty());
        assert!(diff.removed.is_empty());
        assert_eq!(diff.renamed.len(), 1);
        assert_eq!(diff.renamed[0].0.name, "x");
        assert_eq!(diff.renamed[0].1.name, "y");
    }

    #[test]
    fn test_diff_replacement_in_place_same_name_different_inode() {
        // `f` was unlinked and replaced by a new file also named `f` between two rescans -- the
        // name set is unchanged, but the inode underneath it is not, so this must surface as a
        // removed/added pair rather than being swallowed as "present in both, therefore
        // unchanged."
        let mut old = DepList::new();
        old.insert(item("f", 100));

        let mut new = DepList::new();
        new.insert(item("f", 101));

        let diff = DepList::diff(&old, &new);
        assert_eq!(diff.removed.len(), 1);
        assert_eq!(diff.removed[0].name, "f");
        assert_eq!(diff.removed[0].inode, 100);

        assert_eq!(diff.added.len(), 1);
        assert_eq!(diff.added[0].name, "f");
        assert_eq!(diff.added[0].inode, 101);

        assert!(diff.renamed.is_empty());
    }

    #[test]
    fn test_rename_preserves_inode() {
        let mut list = DepList::new();
        list.insert(item("x", 10));
        list.rename(OsStr::new("x"), OsString::from("y"));

        assert!(list.get(OsStr::new("x")).is_none());
        assert_eq!(list.get(OsStr::new("y")).unwrap().inode, 10);
    }
}
