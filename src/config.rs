use std::ffi::OsString;

/// In-memory configuration injected at construction. There is no global: every `IWatch` is
/// handed a `&Config` explicitly.
#[derive(Clone, Debug)]
pub struct Config {
    /// Filesystem type names (as reported by `fstatfs`'s `f_fstypename`) for which
    /// `skip_subfiles` is set at init. Typical entries: `"procfs"`, `"devfs"`, `"fdescfs"`.
    pub skip_fs_types: Vec<OsString>,

    /// If `false` (the default), parent and child watches are opened with `O_NOFOLLOW`. If
    /// `true`, the parent (but never a child) may be opened following a final symlink component.
    pub follow_symlinks: bool,

    /// Whether the `IN_MASK_ADD` bit on `update_flags` OR-merges with the current mask rather
    /// than replacing it. Default: `true` (honor the bit).
    pub mask_add_semantics: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            skip_fs_types: Vec::new(),
            follow_symlinks: false,
            mask_add_semantics: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let cfg = Config::default();
        assert!(cfg.skip_fs_types.is_empty());
        assert!(!cfg.follow_symlinks);
        assert!(cfg.mask_add_semantics);
    }
}
