use crate::internal_prelude::*;

/// Filesystem statistics, as returned by [`fstatfs()`].
///
/// Only the fields the skip-filesystem policy actually consults are exposed; the full
/// `struct statfs` carries many platform-specific accounting fields that this crate has no use
/// for.
#[derive(Copy, Clone, Debug)]
#[repr(transparent)]
pub struct Statfs(libc::statfs);

impl Statfs {
    /// The filesystem type name (e.g. `"nfs"`, `"msdos"`, `"ufs"`).
    ///
    /// This is how the skip-filesystem policy recognizes filesystems that don't support
    /// `EVFILT_VNODE` reliably (network filesystems in particular).
    #[inline]
    pub fn fstypename(&self) -> &OsStr {
        util::osstr_from_buf(util::cvt_char_buf(&self.0.f_fstypename))
    }

    /// The path this filesystem is mounted on.
    #[inline]
    pub fn mnttoname(&self) -> &OsStr {
        util::osstr_from_buf(util::cvt_char_buf(&self.0.f_mntonname))
    }
}

#[inline]
pub fn fstatfs(fd: RawFd) -> Result<Statfs> {
    let mut buf = MaybeUninit::uninit();
    Error::unpack_nz(unsafe { libc::fstatfs(fd, buf.as_mut_ptr()) })?;
    Ok(Statfs(unsafe { buf.assume_init() }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fstatfs_tmp() {
        let dir = std::env::temp_dir();
        let fd = crate::open(&dir, crate::OFlag::O_RDONLY | crate::OFlag::O_DIRECTORY, 0).unwrap();
        let sfs = fstatfs(fd.fd()).unwrap();
        assert!(!sfs.fstypename().is_empty());
    }
}
