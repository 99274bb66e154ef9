use std::cell::RefCell;
use std::ffi::OsString;
use std::os::unix::io::RawFd;

use kqinotify::{EventSink, InotifyMask, IWatchId, KqueueSink, VnodeFlags};

/// A `KqueueSink` double that just records what would have been registered, instead of touching
/// a real kqueue. Good enough to drive `IWatch` through its reconciliation logic without a live
/// event loop.
#[derive(Default)]
pub struct FakeSink {
    pub registered: RefCell<Vec<(RawFd, VnodeFlags, u64)>>,
    pub deregistered: RefCell<Vec<RawFd>>,
}

impl KqueueSink for FakeSink {
    fn kqueue_fd(&self) -> RawFd {
        -1
    }

    fn register(&self, fd: RawFd, fflags: VnodeFlags, udata: u64) -> kqinotify::Result<()> {
        self.registered.borrow_mut().push((fd, fflags, udata));
        Ok(())
    }

    fn deregister(&self, fd: RawFd) -> kqinotify::Result<()> {
        self.deregistered.borrow_mut().push(fd);
        Ok(())
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RecordedEvent {
    pub watch: IWatchId,
    pub mask: InotifyMask,
    pub cookie: u32,
    pub name: Option<OsString>,
}

/// An `EventSink` double that stores every emitted event for later assertions.
#[derive(Default)]
pub struct FakeEvents {
    pub events: RefCell<Vec<RecordedEvent>>,
}

impl EventSink for FakeEvents {
    fn emit(&self, watch: IWatchId, mask: InotifyMask, cookie: u32, name: Option<OsString>) {
        self.events.borrow_mut().push(RecordedEvent {
            watch,
            mask,
            cookie,
            name,
        });
    }
}

impl FakeEvents {
    pub fn names_with_mask(&self, mask: InotifyMask) -> Vec<OsString> {
        self.events
            .borrow()
            .iter()
            .filter(|e| e.mask == mask)
            .filter_map(|e| e.name.clone())
            .collect()
    }
}
