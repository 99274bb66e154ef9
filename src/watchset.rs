use std::collections::BTreeMap;

use crate::watch::Watch;

/// Index of watches by inode, scoped to one `i_watch`.
///
/// Collisions within one `i_watch` are impossible by invariant (I4): two entries resolving to
/// the same inode are always folded into one watch via "adopt". `insert` asserts that invariant
/// rather than silently overwriting, since a duplicate-inode insert would mean a watch's fd was
/// leaked.
#[derive(Debug, Default)]
pub struct WatchSet {
    watches: BTreeMap<u64, Watch>,
}

impl WatchSet {
    pub fn new() -> Self {
        Self {
            watches: BTreeMap::new(),
        }
    }

    pub fn find(&self, inode: u64) -> Option<&Watch> {
        self.watches.get(&inode)
    }

    pub fn find_mut(&mut self, inode: u64) -> Option<&mut Watch> {
        self.watches.get_mut(&inode)
    }

    /// Insert a new watch. Panics if `inode` is already present — see the type-level doc comment.
    pub fn insert(&mut self, inode: u64, watch: Watch) {
        let prior = self.watches.insert(inode, watch);
        assert!(prior.is_none(), "duplicate inode {} in watch-set", inode);
    }

    pub fn remove(&mut self, inode: u64) -> Option<Watch> {
        self.watches.remove(&inode)
    }

    pub fn len(&self) -> usize {
        self.watches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.watches.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&u64, &Watch)> {
        self.watches.iter()
    }
}
