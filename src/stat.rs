use core::fmt;

use crate::internal_prelude::*;
use crate::AtFlag;

/// The file type mask from a `Stat` structure. Can be used to determine the file type.
#[derive(Copy, Clone, Eq, Hash, PartialEq)]
pub struct StatFileType {
    pub mask: u32,
}

impl StatFileType {
    #[inline]
    pub fn is_dir(&self) -> bool {
        self.mask == libc::S_IFDIR as u32
    }

    #[inline]
    pub fn is_file(&self) -> bool {
        self.mask == libc::S_IFREG as u32
    }

    #[inline]
    pub fn is_symlink(&self) -> bool {
        self.mask == libc::S_IFLNK as u32
    }

    #[inline]
    pub fn is_block_device(&self) -> bool {
        self.mask == libc::S_IFBLK as u32
    }

    #[inline]
    pub fn is_char_device(&self) -> bool {
        self.mask == libc::S_IFCHR as u32
    }

    #[inline]
    pub fn is_fifo(&self) -> bool {
        self.mask == libc::S_IFIFO as u32
    }

    #[inline]
    pub fn is_socket(&self) -> bool {
        self.mask == libc::S_IFSOCK as u32
    }
}

impl fmt::Debug for StatFileType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = if self.is_dir() {
            "Directory"
        } else if self.is_file() {
            "File"
        } else if self.is_symlink() {
            "Symlink"
        } else if self.is_block_device() {
            "BlockDevice"
        } else if self.is_char_device() {
            "CharacterDevice"
        } else if self.is_fifo() {
            "Fifo"
        } else if self.is_socket() {
            "Socket"
        } else {
            "Unknown"
        };

        f.write_str(s)
    }
}

/// A trimmed-down `struct stat`: just the fields the watch-identity and dependency-diffing logic
/// actually reads (`(dev, ino)` identity, mode for the type tag).
#[derive(Copy, Clone, Debug)]
pub struct Stat(libc::stat);

impl Stat {
    /// The device ID of the device containing this file.
    #[inline]
    pub fn dev(&self) -> u64 {
        self.0.st_dev as u64
    }

    /// This file's inode number.
    #[inline]
    pub fn ino(&self) -> u64 {
        self.0.st_ino as u64
    }

    /// This file's mode, embedding the file type and access bits.
    #[inline]
    pub fn mode(&self) -> u32 {
        self.0.st_mode as u32
    }

    /// The file type information associated with this `Stat` structure.
    #[inline]
    pub fn file_type(&self) -> StatFileType {
        StatFileType {
            mask: self.mode() & (libc::S_IFMT as u32),
        }
    }

    /// The number of hardlinks to this file.
    #[inline]
    pub fn nlink(&self) -> u64 {
        self.0.st_nlink as u64
    }
}

impl From<Stat> for libc::stat {
    #[inline]
    fn from(s: Stat) -> libc::stat {
        s.0
    }
}

#[inline]
pub fn fstat(fd: RawFd) -> Result<Stat> {
    let mut buf = MaybeUninit::uninit();
    Error::unpack_nz(unsafe { libc::fstat(fd, buf.as_mut_ptr()) })?;
    Ok(Stat(unsafe { buf.assume_init() }))
}

#[inline]
pub fn fstatat<P: AsPath>(dfd: RawFd, path: P, flags: AtFlag) -> Result<Stat> {
    let mut buf = MaybeUninit::uninit();
    path.with_cstr(|path| {
        Error::unpack_nz(unsafe {
            libc::fstatat(dfd, path.as_ptr(), buf.as_mut_ptr(), flags.bits())
        })
    })?;
    Ok(Stat(unsafe { buf.assume_init() }))
}
