use std::path::{Path, PathBuf};

use crate::internal_prelude::*;

/// Represents a string that can be cheaply re-cast as an `OsStr`, and possibly also as a `CStr`.
///
/// The design of this was inspired by `openat`'s `AsPath` trait and `nix`'s `NixPath` trait.
pub trait AsPath {
    /// Convert this string to an `OsStr`.
    fn as_os_str(&self) -> &OsStr;

    /// Calls the given closure with a version of `self` converted to a `CStr`.
    ///
    /// The `CStr` may actually be a `CString` (allocated from the heap), or it may be the
    /// original string if that string is already nul-terminated.
    ///
    /// If the string contains an interior nul byte that prevents it from being converted to a
    /// `CString`, the closure will not be called, and an error will be returned.
    fn with_cstr<T, F: FnMut(&CStr) -> Result<T>>(&self, f: F) -> Result<T>;
}

macro_rules! osstr_ref_impl {
    ($($type:ty)*) => {
        $(
            impl AsPath for $type {
                #[inline]
                fn as_os_str(&self) -> &OsStr {
                    self.as_ref()
                }

                fn with_cstr<T, F: FnMut(&CStr) -> Result<T>>(&self, mut f: F) -> Result<T> {
                    if let Ok(s) = CString::new(self.as_os_str().as_bytes()) {
                        f(&s)
                    } else {
                        Err(Error::from_code(libc::EINVAL))
                    }
                }
            }
        )*
    };
}

macro_rules! cstr_impl {
    ($($type:ty)*) => {
        $(
            impl AsPath for $type {
                #[inline]
                fn as_os_str(&self) -> &OsStr {
                    OsStr::from_bytes(self.to_bytes())
                }

                #[inline]
                fn with_cstr<T, F: FnMut(&CStr) -> Result<T>>(&self, mut f: F) -> Result<T> {
                    f(self)
                }
            }
        )*
    };
}

osstr_ref_impl! { &Path PathBuf &PathBuf &OsStr OsString &OsString &str String &String }
cstr_impl! { &CStr CString &CString }
