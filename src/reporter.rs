use std::ffi::OsString;

use crate::Error;

/// A soft-error or race-observed condition the core wants recorded without failing the calling
/// operation.
///
/// These correspond exactly to the subwatch-soft and race-observed error kinds: init-fatal
/// errors are returned as `Err` instead and never reach a `Reporter`.
#[derive(Debug)]
pub enum ReporterEvent {
    /// Opening a child entry failed (subwatch-soft).
    SubwatchOpenFailed { name: OsString, err: Error },
    /// `fstat` on a freshly opened child fd failed (subwatch-soft).
    SubwatchStatFailed { name: OsString, err: Error },
    /// Scan-time and open-time inodes disagreed and both sides share the watch's `dev`
    /// (race-observed: replacement-in-place).
    ReplaceRace {
        name: OsString,
        old_inode: u64,
        new_inode: u64,
    },
    /// Scan-time and open-time inodes disagreed because the entry is a mountpoint
    /// (race-observed: the underlying directory's inode is retained).
    MountpointPreserved { name: OsString, inode: u64, dev: u64 },
    /// A directory rescan failed.
    ScanFailed { err: Error },
}

/// A pluggable sink for [`ReporterEvent`]s.
///
/// The default implementation, [`LogReporter`], forwards to the `log` crate.
pub trait Reporter {
    fn note(&self, event: ReporterEvent);
}

/// Forwards every [`ReporterEvent`] to the `log` crate: `warn!` for conditions that leave a dep
/// degraded (open/stat failures), `trace!` for conditions that are transparently reconciled.
#[derive(Copy, Clone, Debug, Default)]
pub struct LogReporter;

impl Reporter for LogReporter {
    fn note(&self, event: ReporterEvent) {
        match event {
            ReporterEvent::SubwatchOpenFailed { name, err } => {
                log::warn!("open failed for {:?}: {}", name, err);
            }
            ReporterEvent::SubwatchStatFailed { name, err } => {
                log::warn!("fstat failed for {:?}: {}", name, err);
            }
            ReporterEvent::ReplaceRace {
                name,
                old_inode,
                new_inode,
            } => {
                log::trace!(
                    "{:?} replaced between scan and open ({} -> {})",
                    name,
                    old_inode,
                    new_inode
                );
            }
            ReporterEvent::MountpointPreserved { name, inode, dev } => {
                log::trace!(
                    "{:?} is a mountpoint, keeping underlying inode {} (dev {})",
                    name,
                    inode,
                    dev
                );
            }
            ReporterEvent::ScanFailed { err } => {
                log::warn!("directory rescan failed: {}", err);
            }
        }
    }
}

/// A `Reporter` that discards everything; useful in tests that only care about watch-set state.
#[derive(Copy, Clone, Debug, Default)]
pub struct NullReporter;

impl Reporter for NullReporter {
    fn note(&self, _event: ReporterEvent) {}
}
