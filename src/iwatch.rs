use std::ffi::{OsStr, OsString};

use crate::config::Config;
use crate::dep::DepItem;
use crate::mask::{self, FileKind, InotifyMask};
use crate::reporter::{Reporter, ReporterEvent};
use crate::scanner;
use crate::skipfs;
use crate::watch::{Watch, WatchKind};
use crate::watchset::WatchSet;
use crate::worker::{EventSink, IWatchId, KqueueSink};
use crate::{AtFlag, FileDesc, OFlag, Result};

/// One user-visible watch: one parent vnode watch, plus zero or more dependency vnode watches
/// covering the directory's current entries.
///
/// `sink`/`events`/`reporter` are non-owning references to the worker's collaborators — the
/// `worker <-> i_watch <-> watch` relationship is not a true ownership cycle (the worker owns
/// `i_watch`es, an `i_watch` owns its `watch`es), so these back-references never need to be more
/// than borrows.
pub struct IWatch<'a> {
    id: IWatchId,
    sink: &'a dyn KqueueSink,
    events: &'a dyn EventSink,
    reporter: &'a dyn Reporter,
    config: &'a Config,

    parent_fd: std::os::unix::io::RawFd,
    inode: u64,
    dev: u64,
    parent_kind: FileKind,

    mask: InotifyMask,
    watches: WatchSet,
    deps: crate::dep::DepList,

    is_closed: bool,
    skip_subfiles: bool,
    next_cookie: u32,
}

impl<'a> IWatch<'a> {
    /// Open `path` and call [`init`](Self::init) on the result.
    ///
    /// `config.follow_symlinks` governs only this open: if `false` (the default), the parent is
    /// opened `O_NOFOLLOW` like every child; if `true`, a final symlink component in `path` is
    /// followed. Children are always opened `O_NOFOLLOW` regardless of this setting, per spec
    /// §6's `follow-symlinks` option.
    #[allow(clippy::too_many_arguments)]
    pub fn open<P: crate::AsPath>(
        id: IWatchId,
        path: P,
        mask: InotifyMask,
        sink: &'a dyn KqueueSink,
        events: &'a dyn EventSink,
        reporter: &'a dyn Reporter,
        config: &'a Config,
    ) -> Result<Self> {
        let mut flags = OFlag::O_RDONLY | OFlag::O_CLOEXEC;
        if !config.follow_symlinks {
            flags |= OFlag::O_NOFOLLOW;
        }

        let fd = crate::open(path, flags, 0)?;
        Self::init(id, fd, mask, sink, events, reporter, config)
    }

    /// `iwatch_init`: take ownership of an already-opened fd for the watch target and bring up
    /// the parent watch (and, for a directory, every subwatch the current mask justifies).
    ///
    /// A scan failure on a directory target is init-fatal, matching spec §4.3.1 step 3.
    pub fn init(
        id: IWatchId,
        target_fd: FileDesc,
        mask: InotifyMask,
        sink: &'a dyn KqueueSink,
        events: &'a dyn EventSink,
        reporter: &'a dyn Reporter,
        config: &'a Config,
    ) -> Result<Self> {
        let st = crate::fstat(target_fd.fd())?;
        let dev = st.dev();
        let inode = st.ino();
        let parent_kind = FileKind::from(st.file_type());
        let parent_fd = target_fd.fd();

        let mut initial_entries = Vec::new();
        let mut skip_subfiles = false;

        if parent_kind == FileKind::Directory {
            let snapshot = match scanner::scan(parent_fd) {
                Ok(snapshot) => snapshot,
                Err(e) => {
                    reporter.note(ReporterEvent::ScanFailed { err: e });
                    return Err(e);
                }
            };
            skip_subfiles = skipfs::should_skip_subfiles(parent_fd, &config.skip_fs_types);
            initial_entries = snapshot.iter().cloned().collect();
        }

        let parent_fflags = mask::inotify_to_kqueue(mask, parent_kind, true);
        let parent_watch = Watch::init(sink, WatchKind::User, target_fd, parent_fflags, inode)?;

        let mut watches = WatchSet::new();
        watches.insert(inode, parent_watch);

        let mut iw = Self {
            id,
            sink,
            events,
            reporter,
            config,
            parent_fd,
            inode,
            dev,
            parent_kind,
            mask,
            watches,
            deps: crate::dep::DepList::new(),
            is_closed: false,
            skip_subfiles,
            next_cookie: 1,
        };

        // Populating the initial snapshot is not a content change: no events fire for it.
        for entry in initial_entries {
            iw.add_subwatch(entry);
        }

        Ok(iw)
    }

    pub fn id(&self) -> IWatchId {
        self.id
    }

    pub fn inode(&self) -> u64 {
        self.inode
    }

    pub fn dev(&self) -> u64 {
        self.dev
    }

    pub fn mask(&self) -> InotifyMask {
        self.mask
    }

    pub fn is_closed(&self) -> bool {
        self.is_closed
    }

    pub fn skip_subfiles(&self) -> bool {
        self.skip_subfiles
    }

    pub fn watches(&self) -> &WatchSet {
        &self.watches
    }

    pub fn deps(&self) -> &crate::dep::DepList {
        &self.deps
    }

    fn open_flags(&self) -> OFlag {
        OFlag::O_RDONLY | OFlag::O_CLOEXEC | OFlag::O_NOFOLLOW
    }

    fn next_cookie(&mut self) -> u32 {
        let c = self.next_cookie;
        self.next_cookie = self.next_cookie.wrapping_add(1).max(1);
        c
    }

    /// Fill in an `UNKNOWN` type hint via `fstatat(AT_SYMLINK_NOFOLLOW)`, for deps that never get
    /// a fd opened (spec §4.3.2 step 9).
    fn fill_type_via_lstat(&self, dep: &mut DepItem) {
        if dep.kind != FileKind::Unknown {
            return;
        }

        if let Ok(st) =
            crate::fstatat(self.parent_fd, dep.name.as_os_str(), AtFlag::AT_SYMLINK_NOFOLLOW)
        {
            dep.kind = FileKind::from(st.file_type());
        }
    }

    /// `iwatch_add_subwatch`. Implements spec §4.3.2's decision order exactly; see the inline
    /// step numbers.
    pub fn add_subwatch(&mut self, mut dep: DepItem) -> Option<u64> {
        // 1.
        if self.is_closed {
            return None;
        }

        // 2.
        if self.skip_subfiles {
            self.fill_type_via_lstat(&mut dep);
            self.deps.insert(dep);
            return None;
        }

        // 3. adopt by inode known from the snapshot.
        if self.watches.find(dep.inode).is_some() {
            let name = dep.name.clone();
            let watch = self.watches.find_mut(dep.inode).unwrap();
            watch.add_dep_name(name);
            let inode = dep.inode;
            self.deps.insert(dep);
            return Some(inode);
        }

        // 4. known type, translator says "don't watch": elide without opening.
        if dep.kind != FileKind::Unknown {
            let fflags = mask::inotify_to_kqueue(self.mask, dep.kind, false);
            if fflags.is_empty() {
                self.deps.insert(dep);
                return None;
            }
        }

        // 5. open by name, not following symlinks.
        let opened = crate::openat(self.parent_fd, dep.name.as_os_str(), self.open_flags(), 0);
        let fd = match opened {
            Ok(fd) => fd,
            Err(err) => {
                self.reporter.note(ReporterEvent::SubwatchOpenFailed {
                    name: dep.name.clone(),
                    err,
                });
                self.fill_type_via_lstat(&mut dep);
                self.deps.insert(dep);
                return None;
            }
        };

        // 6. fstat the opened fd.
        let st = match crate::fstat(fd.fd()) {
            Ok(st) => st,
            Err(err) => {
                self.reporter.note(ReporterEvent::SubwatchStatFailed {
                    name: dep.name.clone(),
                    err,
                });
                self.fill_type_via_lstat(&mut dep);
                self.deps.insert(dep);
                return None;
            }
        };

        let opened_inode = st.ino();
        let opened_dev = st.dev();
        let opened_kind = FileKind::from(st.file_type());
        dep.kind = opened_kind;

        // 7. reconcile scan-time inode with open-time inode.
        let target_inode = if opened_inode == dep.inode {
            opened_inode
        } else if opened_dev != self.dev {
            self.reporter.note(ReporterEvent::MountpointPreserved {
                name: dep.name.clone(),
                inode: dep.inode,
                dev: opened_dev,
            });
            dep.inode
        } else {
            self.reporter.note(ReporterEvent::ReplaceRace {
                name: dep.name.clone(),
                old_inode: dep.inode,
                new_inode: opened_inode,
            });
            dep.inode = opened_inode;
            opened_inode
        };

        if self.watches.find(target_inode).is_some() {
            let name = dep.name.clone();
            let watch = self.watches.find_mut(target_inode).unwrap();
            watch.add_dep_name(name);
            self.deps.insert(dep);
            return Some(target_inode);
        }

        let fflags = mask::inotify_to_kqueue(self.mask, opened_kind, false);
        if fflags.is_empty() {
            // Translator-empty after opening: no point keeping the fd or a watch around.
            self.deps.insert(dep);
            return None;
        }

        // 8. hold step: create the watch and record the dependency.
        match Watch::init(self.sink, WatchKind::Dependency, fd, fflags, target_inode) {
            Ok(mut watch) => {
                watch.add_dep_name(dep.name.clone());
                self.watches.insert(target_inode, watch);
                self.deps.insert(dep);
                Some(target_inode)
            }
            Err(err) => {
                self.reporter.note(ReporterEvent::SubwatchOpenFailed {
                    name: dep.name.clone(),
                    err,
                });
                self.deps.insert(dep);
                None
            }
        }
    }

    /// `iwatch_del_subwatch`.
    pub fn del_subwatch(&mut self, dep: &DepItem) {
        self.unwatch_dep(dep);
        self.deps.remove(dep.name.as_os_str());
    }

    /// Remove `dep`'s back-reference from whatever watch holds it (tearing the watch down if this
    /// was its last dependency), without touching the directory-content snapshot in `self.deps`.
    ///
    /// This is what `update_flags` needs for an entry that the new mask no longer requires a
    /// kernel watch for: the entry still exists on disk, so dropping it from `self.deps` entirely
    /// would make the next rescan see it as freshly created. `del_subwatch` additionally removes
    /// the snapshot entry, which is correct only when the entry is actually gone from the
    /// directory.
    fn unwatch_dep(&mut self, dep: &DepItem) {
        if let Some(watch) = self.watches.find_mut(dep.inode) {
            if watch.del_dep(self.sink, dep.name.as_os_str()) {
                self.watches.remove(dep.inode);
            }
        }
    }

    /// `iwatch_move_subwatch`. Precondition: `from.inode == to.inode`.
    pub fn move_subwatch(&mut self, from_name: &OsStr, to_name: OsString, inode: u64) {
        if let Some(watch) = self.watches.find_mut(inode) {
            if !watch.deps_is_empty() {
                watch.chg_dep(from_name, to_name.clone());
            }
        }
        self.deps.rename(from_name, to_name);
    }

    /// `iwatch_update_flags`.
    pub fn update_flags(&mut self, new_mask: InotifyMask) {
        let mask = if new_mask.contains(InotifyMask::MASK_ADD) && self.config.mask_add_semantics {
            self.mask | (new_mask - InotifyMask::MASK_ADD)
        } else {
            new_mask - InotifyMask::MASK_ADD
        };
        self.mask = mask;

        let parent_fflags = mask::inotify_to_kqueue(mask, self.parent_kind, true);
        if let Some(parent) = self.watches.find_mut(self.inode) {
            let _ = parent.register_event(self.sink, parent_fflags, self.inode);
        }

        let names: Vec<OsString> = self.deps.names().cloned().collect();

        for name in names {
            let dep = match self.deps.get(&name) {
                Some(dep) => dep.clone(),
                None => continue,
            };

            let covered = self
                .watches
                .find(dep.inode)
                .map_or(false, |w| w.has_dep(&name));

            if !covered {
                self.add_subwatch(dep);
                continue;
            }

            let fflags = mask::inotify_to_kqueue(mask, dep.kind, false);
            if fflags.is_empty() {
                self.unwatch_dep(&dep);
            } else if let Some(watch) = self.watches.find_mut(dep.inode) {
                let _ = watch.register_event(self.sink, fflags, dep.inode);
            }
        }
    }

    /// Rescan the directory, diff it against the stored snapshot, reconcile the watch-set
    /// (`add_subwatch`/`del_subwatch`/`move_subwatch`), and emit the inotify events the diff
    /// implies. This is what the worker calls when a `NOTE_WRITE` event arrives on the parent.
    ///
    /// Events are emitted in alphabetical order across the *full* set of entries the rescan
    /// affected, not merely alphabetically within each of removed/renamed/added separately: a
    /// removed/renamed/added entry is keyed by its affected name (a rename pair by its old name,
    /// since that's the name the prior snapshot held it under) and the merged sequence is sorted
    /// once before anything is reconciled or emitted. A `MOVED_FROM`/`MOVED_TO` pair still comes
    /// out contiguous, just placed by its key name relative to every other affected entry.
    pub fn handle_dir_change(&mut self) -> Result<()> {
        if self.is_closed || self.parent_kind != FileKind::Directory {
            return Ok(());
        }

        let new_snapshot = match scanner::scan(self.parent_fd) {
            Ok(s) => s,
            Err(e) => {
                self.reporter.note(ReporterEvent::ScanFailed { err: e });
                return Err(e);
            }
        };

        let diff = crate::dep::DepList::diff(&self.deps, &new_snapshot);

        enum Change {
            Removed(DepItem),
            Renamed(DepItem, DepItem),
            Added(DepItem),
        }

        let mut changes: Vec<(OsString, Change)> = Vec::new();
        changes.extend(
            diff.removed
                .into_iter()
                .map(|d| (d.name.clone(), Change::Removed(d))),
        );
        changes.extend(
            diff.renamed
                .into_iter()
                .map(|(from, to)| (from.name.clone(), Change::Renamed(from, to))),
        );
        changes.extend(
            diff.added
                .into_iter()
                .map(|d| (d.name.clone(), Change::Added(d))),
        );
        changes.sort_by(|(a, _), (b, _)| a.cmp(b));

        for (_, change) in changes {
            match change {
                Change::Removed(removed) => {
                    self.del_subwatch(&removed);
                    self.events
                        .emit(self.id, InotifyMask::DELETE, 0, Some(removed.name));
                }
                Change::Renamed(from, to) => {
                    let cookie = self.next_cookie();
                    self.move_subwatch(from.name.as_os_str(), to.name.clone(), from.inode);
                    self.events
                        .emit(self.id, InotifyMask::MOVED_FROM, cookie, Some(from.name));
                    self.events
                        .emit(self.id, InotifyMask::MOVED_TO, cookie, Some(to.name));
                }
                Change::Added(added) => {
                    let name = added.name.clone();
                    self.add_subwatch(added);
                    self.events.emit(self.id, InotifyMask::CREATE, 0, Some(name));
                }
            }
        }

        Ok(())
    }

    /// `iwatch_free`: tear down every dependency watch, then the parent, marking the `i_watch`
    /// closed so any in-flight `add_subwatch` call that hasn't checked `is_closed` yet still
    /// returns `None` once it does.
    pub fn free(mut self) {
        self.teardown();
    }

    fn teardown(&mut self) {
        let entries: Vec<DepItem> = self.deps.iter().cloned().collect();
        for dep in entries {
            self.del_subwatch(&dep);
        }

        if let Some(parent) = self.watches.remove(self.inode) {
            let _ = self.sink.deregister(parent.fd());
            // `parent`'s FileDesc closes the fd on drop here.
        }

        self.is_closed = true;
    }
}

impl<'a> Drop for IWatch<'a> {
    fn drop(&mut self) {
        if !self.is_closed {
            self.teardown();
        }
    }
}
