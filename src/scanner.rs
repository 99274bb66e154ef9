use std::os::unix::io::RawFd;

use crate::dep::{DepItem, DepList};
use crate::dirent::Dir;
use crate::mask::FileKind;
use crate::Result;

/// Snapshot a directory's entries into a [`DepList`], excluding `.` and `..`.
///
/// `dir_fd` is borrowed: the scan operates on a `dup()`ed descriptor so the caller's fd (which
/// may be a live vnode watch) is never closed out from under it.
pub fn scan(dir_fd: RawFd) -> Result<DepList> {
    let dup_fd = crate::Error::unpack(unsafe { libc::fcntl(dir_fd, libc::F_DUPFD_CLOEXEC, 0) })?;
    let mut dir = unsafe { Dir::fdopen(dup_fd) }?;

    let mut list = DepList::new();

    while let Some(entry) = dir.next() {
        let entry = entry?;
        let name = entry.name();

        if name == "." || name == ".." {
            continue;
        }

        let kind = entry
            .file_type()
            .map(FileKind::from)
            .unwrap_or(FileKind::Unknown);

        list.insert(DepItem::new(name.to_owned(), entry.ino(), kind));
    }

    Ok(list)
}
