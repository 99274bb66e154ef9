use std::collections::BTreeSet;
use std::ffi::{OsStr, OsString};
use std::os::unix::io::RawFd;

use crate::kqueue::VnodeFlags;
use crate::worker::KqueueSink;
use crate::{FileDesc, Result};

/// Whether a watch was explicitly requested by the caller, or opened automatically to cover one
/// directory entry.
///
/// This replaces the source's `DI_PARENT` sentinel dependency with a plain boolean: the
/// close-on-empty rule becomes "no deps and not user-requested", which is locally checkable
/// without special-casing a fake dependency entry.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum WatchKind {
    User,
    Dependency,
}

/// One kqueue `EVFILT_VNODE` registration, tied to one open fd, shared by every dependency item
/// whose name currently resolves to that fd's inode.
#[derive(Debug)]
pub struct Watch {
    fd: FileDesc,
    fflags: VnodeFlags,
    kind: WatchKind,
    deps: BTreeSet<OsString>,
}

impl Watch {
    /// Register `fd` with the owning kqueue for `fflags` and construct the watch.
    ///
    /// `udata` is the tag the worker will see on every event delivered for this registration;
    /// `IWatch` passes the watch's inode, since watches are already uniquely keyed by inode
    /// within one `i_watch`.
    pub fn init(
        sink: &dyn KqueueSink,
        kind: WatchKind,
        fd: FileDesc,
        fflags: VnodeFlags,
        udata: u64,
    ) -> Result<Self> {
        sink.register(fd.fd(), fflags, udata)?;
        Ok(Self {
            fd,
            fflags,
            kind,
            deps: BTreeSet::new(),
        })
    }

    /// Add a dependency by name without recomputing or re-registering fflags.
    ///
    /// Used both for a freshly created watch's first dependency and for "adopt" (a second name
    /// resolving to an inode this watch already covers) — per the open question on re-translating
    /// flags on adopt, this crate does not re-register; a dep whose own requirements exceed the
    /// watch's current fflags stays under-observed until the next `update_flags` call.
    pub fn add_dep_name(&mut self, name: OsString) {
        self.deps.insert(name);
    }

    /// Remove a dependency by name. Returns `true` if the watch should now be torn down (no
    /// remaining deps and not user-requested); the caller is responsible for removing it from
    /// the watch-set in that case, since this watch cannot remove itself from a map it doesn't
    /// hold a reference to.
    pub fn del_dep(&mut self, sink: &dyn KqueueSink, name: &OsStr) -> bool {
        self.deps.remove(name);

        let should_close = self.deps.is_empty() && self.kind != WatchKind::User;
        if should_close {
            let _ = sink.deregister(self.fd.fd());
        }
        should_close
    }

    /// Atomic rename: the dependency list's key moves, the watch/fd/registration do not change.
    pub fn chg_dep(&mut self, from: &OsStr, to: OsString) {
        if self.deps.remove(from) {
            self.deps.insert(to);
        }
    }

    /// Replace the kqueue registration with `fflags`.
    pub fn register_event(&mut self, sink: &dyn KqueueSink, fflags: VnodeFlags, udata: u64) -> Result<()> {
        sink.register(self.fd.fd(), fflags, udata)?;
        self.fflags = fflags;
        Ok(())
    }

    pub fn has_dep(&self, name: &OsStr) -> bool {
        self.deps.contains(name)
    }

    pub fn deps_is_empty(&self) -> bool {
        self.deps.is_empty()
    }

    pub fn kind(&self) -> WatchKind {
        self.kind
    }

    pub fn fflags(&self) -> VnodeFlags {
        self.fflags
    }

    pub fn fd(&self) -> RawFd {
        self.fd.fd()
    }
}
