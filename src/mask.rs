use crate::internal_prelude::*;
use crate::kqueue::VnodeFlags;

/// A coarse file-type tag shared by directory entries, stat results, and the flag translator.
///
/// This mirrors the type tag carried on a `dep_item` and on `Dirent::file_type()`; `Unknown` is
/// the legitimate "the OS didn't tell us" case, not an error.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum FileKind {
    Regular,
    Directory,
    Symlink,
    Fifo,
    Socket,
    Block,
    Char,
    Unknown,
}

impl From<crate::StatFileType> for FileKind {
    fn from(ft: crate::StatFileType) -> Self {
        if ft.is_dir() {
            Self::Directory
        } else if ft.is_file() {
            Self::Regular
        } else if ft.is_symlink() {
            Self::Symlink
        } else if ft.is_fifo() {
            Self::Fifo
        } else if ft.is_socket() {
            Self::Socket
        } else if ft.is_block_device() {
            Self::Block
        } else if ft.is_char_device() {
            Self::Char
        } else {
            Self::Unknown
        }
    }
}

impl From<crate::DirFileType> for FileKind {
    fn from(ft: crate::DirFileType) -> Self {
        Self::from(crate::StatFileType::from(ft))
    }
}

bitflags::bitflags! {
    /// A Linux `inotify(7)` event mask.
    ///
    /// The bit values are hardcoded to match Linux's `<sys/inotify.h>` exactly (this target OS
    /// has no such header), so that code written against real inotify masks behaves identically
    /// against this crate.
    pub struct InotifyMask: u32 {
        const ACCESS = 0x0000_0001;
        const MODIFY = 0x0000_0002;
        const ATTRIB = 0x0000_0004;
        const CLOSE_WRITE = 0x0000_0008;
        const CLOSE_NOWRITE = 0x0000_0010;
        const OPEN = 0x0000_0020;
        const MOVED_FROM = 0x0000_0040;
        const MOVED_TO = 0x0000_0080;
        const CREATE = 0x0000_0100;
        const DELETE = 0x0000_0200;
        const DELETE_SELF = 0x0000_0400;
        const MOVE_SELF = 0x0000_0800;

        const UNMOUNT = 0x0000_2000;
        const Q_OVERFLOW = 0x0000_4000;
        const IGNORED = 0x0000_8000;

        const ONLYDIR = 0x0100_0000;
        const DONT_FOLLOW = 0x0200_0000;
        const EXCL_UNLINK = 0x0400_0000;
        const MASK_ADD = 0x2000_0000;
        const ISDIR = 0x4000_0000;
        const ONESHOT = 0x8000_0000;

        const CLOSE = Self::CLOSE_WRITE.bits | Self::CLOSE_NOWRITE.bits;
        const MOVE = Self::MOVED_FROM.bits | Self::MOVED_TO.bits;
    }
}

/// Translate a requested inotify mask into the `EVFILT_VNODE` fflags that, registered on an
/// object of type `kind`, can deliver every event in `mask` that kqueue is capable of observing.
///
/// `is_parent` distinguishes the user-requested watch (which needs `NOTE_WRITE` to observe
/// directory-content changes) from an auto-opened dependency watch on one child.
///
/// An empty result means no kernel watch is needed for this combination of mask and type; the
/// caller must not open a vnode watch in that case.
pub fn inotify_to_kqueue(mask: InotifyMask, kind: FileKind, is_parent: bool) -> VnodeFlags {
    let mut out = VnodeFlags::empty();

    if is_parent
        && kind == FileKind::Directory
        && mask.intersects(
            InotifyMask::CREATE | InotifyMask::DELETE | InotifyMask::MOVE,
        )
    {
        out |= VnodeFlags::WRITE;
    }

    if mask.contains(InotifyMask::MODIFY) {
        out |= VnodeFlags::WRITE | VnodeFlags::EXTEND;
    }

    if mask.contains(InotifyMask::ATTRIB) {
        out |= VnodeFlags::ATTRIB | VnodeFlags::LINK;
    }

    if is_parent {
        if mask.contains(InotifyMask::DELETE_SELF) {
            out |= VnodeFlags::DELETE;
        }

        if mask.contains(InotifyMask::MOVE_SELF) {
            out |= VnodeFlags::RENAME;
        }
    }

    #[cfg(any(target_os = "macos", target_os = "ios", target_os = "freebsd"))]
    {
        if mask.contains(InotifyMask::OPEN) {
            out |= VnodeFlags::OPEN;
        }
        if mask.contains(InotifyMask::CLOSE_WRITE) {
            out |= VnodeFlags::CLOSE_WRITE;
        }
        if mask.contains(InotifyMask::CLOSE_NOWRITE) {
            out |= VnodeFlags::CLOSE;
        }
        if mask.contains(InotifyMask::ACCESS) {
            out |= VnodeFlags::READ;
        }
    }

    out
}
