use std::os::unix::io::{AsRawFd, FromRawFd, IntoRawFd, RawFd};

use crate::internal_prelude::*;

/// A helper struct that wraps a file descriptor and provides useful methods.
///
/// The file descriptor is automatically closed when the `FileDesc` struct is dropped. Every
/// vnode watch, directory scan, and the kqueue itself are represented by one of these; ownership
/// never needs to be shared, so there is no separate non-owning wrapper.
#[derive(Debug)]
pub struct FileDesc(RawFd);

impl FileDesc {
    /// Create a new `FileDesc` wrapper around a raw file descriptor.
    ///
    /// # Safety
    ///
    /// The given file descriptor must be valid and not in use elsewhere.
    #[inline]
    pub const unsafe fn new(fd: RawFd) -> Self {
        Self(fd)
    }

    /// Access the inner file descriptor.
    ///
    /// The file descriptor is only valid as long as this object is in scope. It should NOT be
    /// closed or "consumed" by other interfaces; use [`into_fd()`](#method.into_fd) if it is
    /// going to be used for those purposes.
    #[inline]
    pub fn fd(&self) -> RawFd {
        self.0
    }

    /// Take ownership of the inner file descriptor.
    ///
    /// After this method is called, the caller is responsible for closing the file descriptor.
    #[inline]
    pub fn into_fd(self) -> RawFd {
        let fd = self.0;
        std::mem::forget(self);
        fd
    }

    /// Get the close-on-exec status of the file descriptor.
    #[inline]
    pub fn get_cloexec(&self) -> Result<bool> {
        let flags = Error::unpack(unsafe { libc::fcntl(self.0, libc::F_GETFD) })?;
        Ok(flags & libc::FD_CLOEXEC != 0)
    }

    /// Set the close-on-exec status of the file descriptor.
    pub fn set_cloexec(&mut self, cloexec: bool) -> Result<()> {
        let flags = Error::unpack(unsafe { libc::fcntl(self.0, libc::F_GETFD) })?;

        let new_flags = if cloexec {
            flags | libc::FD_CLOEXEC
        } else {
            flags & !libc::FD_CLOEXEC
        };

        if new_flags == flags {
            return Ok(());
        }

        Error::unpack(unsafe { libc::fcntl(self.0, libc::F_SETFD, new_flags) })?;
        Ok(())
    }

    /// Duplicate the file descriptor, with close-on-exec set on the copy.
    pub fn dup_cloexec(&self) -> Result<Self> {
        let fd = Error::unpack(unsafe { libc::fcntl(self.0, libc::F_DUPFD_CLOEXEC, 0) })?;
        Ok(unsafe { Self::new(fd) })
    }
}

impl Drop for FileDesc {
    #[inline]
    fn drop(&mut self) {
        unsafe {
            libc::close(self.0);
        }
    }
}

impl FromRawFd for FileDesc {
    #[inline]
    unsafe fn from_raw_fd(fd: RawFd) -> Self {
        Self(fd)
    }
}

impl AsRawFd for FileDesc {
    #[inline]
    fn as_raw_fd(&self) -> RawFd {
        self.0
    }
}

impl IntoRawFd for FileDesc {
    #[inline]
    fn into_raw_fd(self) -> RawFd {
        self.into_fd()
    }
}

impl From<std::fs::File> for FileDesc {
    #[inline]
    fn from(f: std::fs::File) -> Self {
        Self(f.into_raw_fd())
    }
}
