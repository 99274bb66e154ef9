use crate::internal_prelude::*;

bitflags::bitflags! {
    /// Flags for [`open()`] and [`openat()`].
    ///
    /// See open(2) for more details.
    pub struct OFlag: libc::c_int {
        /// Open the file for reading only.
        const O_RDONLY = libc::O_RDONLY;
        /// Fail with `EISDIR` if the specified file is not a directory.
        const O_DIRECTORY = libc::O_DIRECTORY;
        /// If the final component of the given path refers to a symbolic link, fail with
        /// `ELOOP` rather than following it.
        ///
        /// Every vnode watch opens its target this way; watching through a symlink would watch
        /// the wrong inode on rename.
        const O_NOFOLLOW = libc::O_NOFOLLOW;
        /// Set the close-on-exec flag on the new file descriptor.
        const O_CLOEXEC = libc::O_CLOEXEC;
        /// Open the file in nonblocking mode.
        const O_NONBLOCK = libc::O_NONBLOCK;
        /// If the specified file is a terminal device, do not make it the process's controlling
        /// terminal.
        const O_NOCTTY = libc::O_NOCTTY;
    }
}

bitflags::bitflags! {
    pub struct AtFlag: libc::c_int {
        const AT_SYMLINK_NOFOLLOW = libc::AT_SYMLINK_NOFOLLOW;
        const AT_SYMLINK_FOLLOW = libc::AT_SYMLINK_FOLLOW;
    }
}

pub const AT_FDCWD: RawFd = libc::AT_FDCWD;

#[inline]
pub fn open<P: AsPath>(path: P, flags: OFlag, mode: u32) -> Result<FileDesc> {
    path.with_cstr(|path| unsafe {
        Error::unpack_fdesc(libc::open(path.as_ptr(), flags.bits(), mode))
    })
}

#[inline]
pub fn openat<P: AsPath>(dirfd: RawFd, path: P, flags: OFlag, mode: u32) -> Result<FileDesc> {
    path.with_cstr(|path| unsafe {
        Error::unpack_fdesc(libc::openat(dirfd, path.as_ptr(), flags.bits(), mode))
    })
}

#[inline]
pub fn fcntl_getfd(fd: RawFd) -> Result<libc::c_int> {
    Error::unpack(unsafe { libc::fcntl(fd, libc::F_GETFD) })
}

#[inline]
pub fn fcntl_setfd(fd: RawFd, flags: libc::c_int) -> Result<()> {
    Error::unpack(unsafe { libc::fcntl(fd, libc::F_SETFD, flags) })?;
    Ok(())
}
