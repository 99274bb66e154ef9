use std::fmt;

use crate::internal_prelude::*;

pub type Result<T> = std::result::Result<T, Error>;

/// Represents an OS error encountered when performing an operation.
#[derive(Clone, Copy, Eq, PartialEq)]
pub struct Error(i32);

impl Error {
    /// If `res` is -1, return the last OS error. Otherwise return `Ok(res)`.
    #[inline]
    pub(crate) fn unpack(res: i32) -> Result<i32> {
        if res == -1 {
            Err(Self::last())
        } else {
            Ok(res)
        }
    }

    /// If `res` is -1, return the last OS error. Otherwise construct a `FileDesc` from it.
    #[inline]
    pub(crate) fn unpack_fdesc(res: i32) -> Result<FileDesc> {
        if res == -1 {
            Err(Self::last())
        } else {
            Ok(unsafe { FileDesc::new(res) })
        }
    }

    /// If `res` is non-zero, return the last OS error. Otherwise return `Ok(())`.
    #[inline]
    pub(crate) fn unpack_nz(res: i32) -> Result<()> {
        if res != 0 {
            Err(Self::last())
        } else {
            Ok(())
        }
    }

    /// If `ptr` is null, return the last OS error. Otherwise return the non-null pointer.
    #[inline]
    pub(crate) fn unpack_ptr<T>(ptr: *mut T) -> Result<core::ptr::NonNull<T>> {
        core::ptr::NonNull::new(ptr).ok_or_else(Self::last)
    }

    /// Get the last OS error that occurred (i.e. the current `errno` value).
    #[inline]
    pub fn last() -> Self {
        Self(errno_get())
    }

    /// Construct an `Error` from an `errno` code.
    #[inline]
    pub fn from_code(eno: i32) -> Self {
        Self(eno)
    }

    /// Get the `errno` code represented by this `Error` object.
    #[inline]
    pub fn code(&self) -> i32 {
        self.0
    }

    /// `true` for `EMFILE`/`ENFILE` -- the "too many open files" conditions that callers are
    /// expected to tolerate (leaving the owning `IWatch` consistent) rather than treat as fatal.
    #[inline]
    pub fn is_out_of_fds(&self) -> bool {
        self.0 == libc::EMFILE || self.0 == libc::ENFILE
    }

    fn strerror(&self) -> String {
        static UNKNOWN_ERROR: &str = "Unknown error";

        if self.0 <= 0 {
            return if self.0 == 0 {
                "Success".to_string()
            } else {
                UNKNOWN_ERROR.to_string()
            };
        }

        let ptr = unsafe { libc::strerror(self.0) };
        debug_assert!(!ptr.is_null());

        let msg = unsafe { CStr::from_ptr(ptr) }.to_string_lossy().into_owned();

        if msg.starts_with(UNKNOWN_ERROR) {
            UNKNOWN_ERROR.to_string()
        } else {
            msg
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} (code {})", self.strerror(), self.0)
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Error")
            .field("code", &self.0)
            .field("message", &self.strerror())
            .finish()
    }
}

impl std::error::Error for Error {}

impl From<Error> for std::io::Error {
    #[inline]
    fn from(e: Error) -> Self {
        Self::from_raw_os_error(e.0)
    }
}
