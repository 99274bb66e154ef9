//! Inotify-compatible watch/event semantics, implemented on top of kqueue's `EVFILT_VNODE`.
//!
//! Linux inotify watches one path and reports events on it and (for a directory) on everything
//! inside it, identified by a single watch descriptor. `EVFILT_VNODE` only watches the one vnode
//! it's registered against, with no concept of a directory's contents. The [`iwatch`] module
//! bridges the gap: for every user-visible watch it keeps one kqueue registration on the target
//! plus one per directory entry, reconciles that set against the directory's actual contents on
//! every `NOTE_WRITE`, and translates between `InotifyMask`s and `VnodeFlags`.
//!
//! This crate does not open the kqueue itself, run an event loop, or format events onto a wire --
//! see [`worker::KqueueSink`] and [`worker::EventSink`] for the boundary a caller implements to
//! supply those.
//!
//! ## File descriptor handling
//!
//! Every file descriptor this crate creates is wrapped in a [`FileDesc`], which closes it on
//! drop. File descriptors are exclusively owned by the [`watch::Watch`] that opened them; nothing
//! here clones or shares a raw fd behind callers' backs.
//!
//! ## Error handling
//!
//! Fallible OS operations return [`Result<T>`] = `Result<T, Error>`, where [`Error`] wraps a raw
//! `errno` value. Soft errors encountered while reconciling one directory entry (a failed
//! `openat`, a race against a concurrent rename) are not propagated as `Err` -- they're reported
//! through the [`reporter::Reporter`] trait and the affected entry is degraded rather than the
//! whole watch failing. See [`reporter::ReporterEvent`] for the full list of conditions this
//! crate can report.

#![deny(warnings)]

mod as_path;
mod err;
mod string;
mod util;

pub(crate) use string::memchr;

pub use as_path::AsPath;
pub use err::{Error, Result};

mod internal_prelude {
    pub use std::mem::MaybeUninit;

    pub(crate) use super::util;
    pub(crate) use super::{errno::errno_get, AsPath, Error, Result};

    pub use super::ffi::prelude::*;
    pub use super::ffi::{CStr, CString, OsStr, OsString};

    pub use super::fcntl::OFlag;
    pub use super::FileDesc;
}

pub mod ffi;

mod fdesc;
pub use fdesc::*;

mod errno;
mod fcntl;
mod stat;
mod statfs;

pub use errno::*;
pub use fcntl::*;
pub use stat::*;
pub use statfs::*;

mod dirent;
pub use dirent::*;

mod kqueue;
pub use kqueue::*;

mod mask;
pub use mask::{FileKind, InotifyMask};

mod dep;
pub use dep::{DepItem, DepList, Diff};

mod scanner;
pub use scanner::scan;

mod skipfs;
pub use skipfs::should_skip_subfiles;

mod config;
pub use config::Config;

mod reporter;
pub use reporter::{LogReporter, NullReporter, Reporter, ReporterEvent};

mod worker;
pub use worker::{EventSink, IWatchId, KqueueSink};

mod watch;
pub use watch::{Watch, WatchKind};

mod watchset;
pub use watchset::WatchSet;

mod iwatch;
pub use iwatch::IWatch;
