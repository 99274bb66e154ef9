use std::ffi::OsString;
use std::os::unix::io::RawFd;

/// Whether `fd`'s filesystem type matches one of `skip_types`.
///
/// `iwatch_init` calls this once on the parent fd; when it returns `true`, `skip_subfiles` is
/// set for the lifetime of the `i_watch` and no child fds are ever opened, regardless of
/// directory contents. A `fstatfs` failure is treated as "don't skip" — the filesystem type is
/// simply unknown, which is not grounds for silently dropping child watches.
pub fn should_skip_subfiles(fd: RawFd, skip_types: &[OsString]) -> bool {
    if skip_types.is_empty() {
        return false;
    }

    match crate::statfs::fstatfs(fd) {
        Ok(sfs) => {
            let fstype = sfs.fstypename();
            skip_types.iter().any(|t| t.as_os_str() == fstype)
        }
        Err(_) => false,
    }
}
