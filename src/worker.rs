use std::ffi::OsString;
use std::os::unix::io::RawFd;

use crate::kqueue::VnodeFlags;
use crate::mask::InotifyMask;
use crate::Result;

/// Opaque identity of one `IWatch`, chosen by the caller at [`init`](crate::IWatch::init).
///
/// Watch-descriptor allocation is the worker's job, not the core's (see the module-level
/// documentation); the core tags every event it emits with this id and leaves the `wd`
/// translation to whoever owns that allocation.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct IWatchId(pub u64);

/// The contract the core needs from whatever owns the kqueue file descriptor.
///
/// A real worker backs this with the kqueue registered against its event loop; tests back it
/// with an in-memory recorder.
pub trait KqueueSink {
    /// The kqueue file descriptor watches are registered against.
    fn kqueue_fd(&self) -> RawFd;

    /// Install or replace a vnode watch. `udata` identifies the owning watch to the worker.
    fn register(&self, fd: RawFd, fflags: VnodeFlags, udata: u64) -> Result<()>;

    /// Remove a vnode watch. Failure is not actionable: closing `fd` removes the kqueue
    /// registration implicitly, so callers ignore this error per the deregister-failure policy.
    fn deregister(&self, fd: RawFd) -> Result<()>;
}

/// Where synthesized inotify events go.
///
/// The core does not format wire bytes; it hands the worker a `(watch, mask, cookie, name)`
/// tuple and lets the worker serialize it into the client's ring buffer.
pub trait EventSink {
    fn emit(&self, watch: IWatchId, mask: InotifyMask, cookie: u32, name: Option<OsString>);
}
