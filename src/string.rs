/// Search a given byte slice for a given byte.
///
/// This is a simple wrapper around the system's `memchr()` function. For more advanced uses,
/// investigate the `memchr` crate.
#[inline]
pub fn memchr(s: &[u8], c: u8) -> Option<usize> {
    unsafe {
        let ptr = libc::memchr(s.as_ptr() as *const _, c as _, s.len());

        if ptr.is_null() {
            None
        } else {
            Some((ptr as *const u8).offset_from(s.as_ptr()) as usize)
        }
    }
}
