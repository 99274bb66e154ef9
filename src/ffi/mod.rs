pub use std::ffi::{CStr, CString, OsStr, OsString};

pub type RawFd = libc::c_int;

pub mod prelude {
    pub use super::RawFd;

    pub use std::os::unix::ffi::{OsStrExt, OsStringExt};
}
