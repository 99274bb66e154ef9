use std::os::unix::io::{AsRawFd, FromRawFd, IntoRawFd};

use crate::internal_prelude::*;

/// A `timespec`-based timeout for [`kevent_raw()`].
#[derive(Copy, Clone, Debug)]
#[repr(transparent)]
pub struct TimeSpec(libc::timespec);

impl TimeSpec {
    /// A zero timeout: `kevent()` drains whatever is already pending and returns immediately.
    #[inline]
    pub fn zero() -> Self {
        Self(libc::timespec {
            tv_sec: 0,
            tv_nsec: 0,
        })
    }

    #[inline]
    pub fn from_millis(ms: u64) -> Self {
        Self(libc::timespec {
            tv_sec: (ms / 1000) as libc::time_t,
            tv_nsec: ((ms % 1000) * 1_000_000) as _,
        })
    }

    #[inline]
    fn as_ref(&self) -> &libc::timespec {
        &self.0
    }
}

/// Create a new kqueue instance.
///
/// The returned kqueue file descriptor does NOT have its close-on-exec flag set.
#[inline]
pub fn kqueue() -> Result<FileDesc> {
    unsafe { Error::unpack_fdesc(libc::kqueue()) }
}

/// Create a new kqueue instance, specifying flags on it.
#[cfg(target_os = "netbsd")]
#[inline]
pub fn kqueue1(flags: crate::OFlag) -> Result<FileDesc> {
    unsafe { Error::unpack_fdesc(libc::kqueue1(flags.bits())) }
}

/// Create a new kqueue instance with its close-on-exec flag set.
#[inline]
pub fn kqueue_cloexec() -> Result<FileDesc> {
    #[cfg(target_os = "netbsd")]
    return kqueue1(crate::OFlag::O_CLOEXEC);

    #[cfg(not(target_os = "netbsd"))]
    {
        let mut kq = kqueue()?;
        kq.set_cloexec(true)?;
        Ok(kq)
    }
}

/// Register events with the queue and return pending events to the user.
///
/// This is a thin wrapper around `kevent(2)`.
#[inline]
pub fn kevent_raw(
    kq: RawFd,
    changes: &[libc::kevent],
    events: &mut [libc::kevent],
    timeout: Option<&TimeSpec>,
) -> Result<usize> {
    use std::convert::TryInto;

    if changes.len() > libc::c_int::MAX as usize {
        return Err(Error::from_code(libc::EINVAL));
    }

    let n = Error::unpack(unsafe {
        libc::kevent(
            kq,
            changes.as_ptr(),
            changes.len() as _,
            events.as_mut_ptr(),
            events.len().try_into().unwrap_or(libc::c_int::MAX as _),
            timeout.map_or_else(std::ptr::null, |t| t.as_ref()),
        )
    })?;

    Ok(n as usize)
}

bitflags::bitflags! {
    /// `EVFILT_VNODE` `fflags`: the set of vnode conditions a kqueue watch can ask to be notified
    /// about.
    ///
    /// These are translated to and from inotify masks; see the mask translation table.
    pub struct VnodeFlags: u32 {
        /// A write occurred on the file referenced by the descriptor.
        const WRITE = libc::NOTE_WRITE as u32;
        /// The file referenced by the descriptor was deleted.
        const DELETE = libc::NOTE_DELETE as u32;
        /// The file referenced by the descriptor was renamed.
        const RENAME = libc::NOTE_RENAME as u32;
        /// The file referenced by the descriptor had its attributes changed.
        const ATTRIB = libc::NOTE_ATTRIB as u32;
        /// The file referenced by the descriptor was extended.
        const EXTEND = libc::NOTE_EXTEND as u32;
        /// The link count on the file changed.
        const LINK = libc::NOTE_LINK as u32;
        /// The file was revoked (e.g. its backing filesystem was unmounted).
        const REVOKE = libc::NOTE_REVOKE as u32;

        #[cfg(any(target_os = "macos", target_os = "ios", target_os = "freebsd"))]
        const OPEN = libc::NOTE_OPEN as u32;
        #[cfg(any(target_os = "macos", target_os = "ios", target_os = "freebsd"))]
        const CLOSE = libc::NOTE_CLOSE as u32;
        #[cfg(any(target_os = "macos", target_os = "ios", target_os = "freebsd"))]
        const CLOSE_WRITE = libc::NOTE_CLOSE_WRITE as u32;
        #[cfg(any(target_os = "macos", target_os = "ios", target_os = "freebsd"))]
        const READ = libc::NOTE_READ as u32;
    }
}

/// Build an `EV_ADD`/`EV_CLEAR` change entry registering `fflags` on `fd`, tagged with `udata` so
/// the worker can map the resulting events back to the owning watch.
#[inline]
pub fn vnode_change(fd: RawFd, fflags: VnodeFlags, udata: usize) -> libc::kevent {
    libc::kevent {
        ident: fd as libc::uintptr_t,
        filter: libc::EVFILT_VNODE,
        flags: libc::EV_ADD | libc::EV_CLEAR,
        fflags: fflags.bits(),
        data: 0,
        udata: udata as _,
    }
}

/// Build a change entry that removes a previously registered vnode watch.
#[inline]
pub fn vnode_delete(fd: RawFd) -> libc::kevent {
    libc::kevent {
        ident: fd as libc::uintptr_t,
        filter: libc::EVFILT_VNODE,
        flags: libc::EV_DELETE,
        fflags: 0,
        data: 0,
        udata: std::ptr::null_mut(),
    }
}

/// A wrapper around a kqueue instance.
#[derive(Debug)]
pub struct Kqueue(FileDesc);

impl Kqueue {
    /// See [`kqueue()`].
    #[inline]
    pub fn new() -> Result<Self> {
        kqueue().map(Self)
    }

    /// See [`kqueue1()`].
    #[cfg(target_os = "netbsd")]
    #[inline]
    pub fn new_flags(flags: crate::OFlag) -> Result<Self> {
        kqueue1(flags).map(Self)
    }

    /// See [`kqueue_cloexec()`].
    #[inline]
    pub fn new_cloexec() -> Result<Self> {
        kqueue_cloexec().map(Self)
    }

    /// See [`kevent_raw()`].
    #[inline]
    pub fn kevent_raw(
        &self,
        changes: &[libc::kevent],
        events: &mut [libc::kevent],
        timeout: Option<&TimeSpec>,
    ) -> Result<usize> {
        kevent_raw(self.fd(), changes, events, timeout)
    }

    /// Register a single vnode watch and, in the same `kevent()` call, drain any events already
    /// pending. The worker loop uses this so that every `kevent()` call is both a registration
    /// point and a poll.
    #[inline]
    pub fn register_vnode(&self, fd: RawFd, fflags: VnodeFlags, udata: usize) -> Result<()> {
        let change = vnode_change(fd, fflags, udata);
        self.kevent_raw(std::slice::from_ref(&change), &mut [], Some(&TimeSpec::zero()))?;
        Ok(())
    }

    #[inline]
    pub fn fd(&self) -> RawFd {
        self.0.fd()
    }

    #[inline]
    pub fn into_fd(self) -> RawFd {
        self.0.into_fd()
    }

    /// Create a new `Kqueue` wrapper around the given kqueue file descriptor.
    ///
    /// # Safety
    ///
    /// The given file descriptor must refer to a valid kqueue instance, and it must not be in use
    /// by other code.
    #[inline]
    pub unsafe fn from_fd(fd: RawFd) -> Self {
        Self(FileDesc::new(fd))
    }
}

impl AsRawFd for Kqueue {
    #[inline]
    fn as_raw_fd(&self) -> RawFd {
        self.0.as_raw_fd()
    }
}

impl IntoRawFd for Kqueue {
    #[inline]
    fn into_raw_fd(self) -> RawFd {
        self.0.into_raw_fd()
    }
}

impl FromRawFd for Kqueue {
    #[inline]
    unsafe fn from_raw_fd(fd: RawFd) -> Self {
        Self::from_fd(fd)
    }
}
