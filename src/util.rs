use crate::internal_prelude::*;

#[cfg(any(
    target_os = "dragonfly",
    target_os = "macos",
    target_os = "ios",
    target_os = "freebsd"
))]
pub use libc::__error as errno_ptr;

#[cfg(any(target_os = "netbsd", target_os = "openbsd"))]
pub use libc::__errno as errno_ptr;

#[inline]
pub fn cvt_char_buf(buf: &[libc::c_char]) -> &[u8] {
    unsafe { core::slice::from_raw_parts(buf.as_ptr() as *const u8, buf.len()) }
}

#[inline]
pub fn osstr_from_buf(buf: &[u8]) -> &OsStr {
    OsStr::from_bytes(match crate::memchr(buf, 0) {
        Some(index) => &buf[..index],
        None => buf,
    })
}
