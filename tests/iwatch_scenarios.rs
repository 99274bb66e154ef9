mod common;

use std::ffi::OsStr;

use common::{FakeEvents, FakeSink};
use kqinotify::{Config, InotifyMask, IWatch, IWatchId, NullReporter, OFlag};

fn open_dir(path: &std::path::Path) -> kqinotify::FileDesc {
    kqinotify::open(path, OFlag::O_RDONLY | OFlag::O_DIRECTORY, 0).unwrap()
}

/// Scenario 1: directory create/delete.
#[test]
fn test_directory_create_delete() {
    let tmp = tempfile::tempdir().unwrap();
    std::fs::File::create(tmp.path().join("a")).unwrap();

    let sink = FakeSink::default();
    let events = FakeEvents::default();
    let reporter = NullReporter;
    let config = Config::default();

    let mut iw = IWatch::init(
        IWatchId(1),
        open_dir(tmp.path()),
        InotifyMask::CREATE | InotifyMask::DELETE,
        &sink,
        &events,
        &reporter,
        &config,
    )
    .unwrap();

    // parent + "a"
    assert_eq!(iw.watches().len(), 2);

    std::fs::File::create(tmp.path().join("b")).unwrap();
    iw.handle_dir_change().unwrap();

    assert_eq!(iw.watches().len(), 3);
    assert_eq!(
        events.names_with_mask(InotifyMask::CREATE),
        vec![OsStr::new("b").to_owned()]
    );

    std::fs::remove_file(tmp.path().join("a")).unwrap();
    iw.handle_dir_change().unwrap();

    assert_eq!(iw.watches().len(), 2);
    assert_eq!(
        events.names_with_mask(InotifyMask::DELETE),
        vec![OsStr::new("a").to_owned()]
    );
}

/// Scenario 2: rename within directory.
#[test]
fn test_rename_within_directory() {
    let tmp = tempfile::tempdir().unwrap();
    std::fs::File::create(tmp.path().join("x")).unwrap();

    let sink = FakeSink::default();
    let events = FakeEvents::default();
    let reporter = NullReporter;
    let config = Config::default();

    let mut iw = IWatch::init(
        IWatchId(1),
        open_dir(tmp.path()),
        InotifyMask::MOVED_FROM | InotifyMask::MOVED_TO,
        &sink,
        &events,
        &reporter,
        &config,
    )
    .unwrap();

    let watches_before = iw.watches().len();

    std::fs::rename(tmp.path().join("x"), tmp.path().join("y")).unwrap();
    iw.handle_dir_change().unwrap();

    // A plain rename visible only through MOVED_FROM/MOVED_TO on the parent doesn't need a
    // per-child watch at all (the translator elides it for a regular file); watch-set size is
    // unaffected either way.
    assert_eq!(iw.watches().len(), watches_before);
    assert!(iw.deps().get(OsStr::new("x")).is_none());
    assert!(iw.deps().get(OsStr::new("y")).is_some());

    let recorded = events.events.borrow();
    let from = recorded
        .iter()
        .find(|e| e.mask == InotifyMask::MOVED_FROM)
        .unwrap();
    let to = recorded
        .iter()
        .find(|e| e.mask == InotifyMask::MOVED_TO)
        .unwrap();

    assert_eq!(from.name.as_deref(), Some(OsStr::new("x")));
    assert_eq!(to.name.as_deref(), Some(OsStr::new("y")));
    assert_eq!(from.cookie, to.cookie);
    assert_ne!(from.cookie, 0);
}

/// Scenario 3: replace-in-place race. The scan snapshot records a stale inode; by the time
/// `add_subwatch` opens the entry, it resolves to a different inode on the same device. The
/// dep's inode should be corrected and a fresh watch opened -- no duplicate watch, no crash.
#[test]
fn test_replace_in_place_race_reconciles_inode() {
    let tmp = tempfile::tempdir().unwrap();
    std::fs::write(tmp.path().join("f"), b"one").unwrap();

    let sink = FakeSink::default();
    let events = FakeEvents::default();
    let reporter = NullReporter;
    let config = Config::default();

    let mut iw = IWatch::init(
        IWatchId(1),
        open_dir(tmp.path()),
        InotifyMask::MODIFY,
        &sink,
        &events,
        &reporter,
        &config,
    )
    .unwrap();

    // Craft a stale dep: right name, deliberately wrong inode (as if the entry had been replaced
    // between the directory scan and the open).
    let stale = kqinotify::DepItem::new(
        std::ffi::OsString::from("f"),
        u64::MAX,
        kqinotify::FileKind::Unknown,
    );

    let resolved_inode = iw.add_subwatch(stale);
    assert!(resolved_inode.is_some());
    assert_ne!(resolved_inode.unwrap(), u64::MAX);

    // The dependency snapshot now carries the corrected inode, and exactly one watch exists for
    // it -- no watch was ever created under the stale inode.
    let dep = iw.deps().get(OsStr::new("f")).unwrap();
    assert_eq!(dep.inode, resolved_inode.unwrap());
    assert!(iw.watches().find(u64::MAX).is_none());
}

/// Replacement-in-place across two separate rescans (as opposed to scenario 3's within-one-call
/// scan-vs-open race): a file is unlinked and a new file created under the same name between two
/// `handle_dir_change` calls. The name-set is unchanged, but the inode underneath it is not, so
/// this must surface as a `DELETE`/`CREATE` pair rather than silently leaving the stale dep (and
/// its watch, if any) in place forever.
#[test]
fn test_replacement_in_place_across_rescans_emits_delete_create() {
    let tmp = tempfile::tempdir().unwrap();
    std::fs::write(tmp.path().join("f"), b"one").unwrap();

    let sink = FakeSink::default();
    let events = FakeEvents::default();
    let reporter = NullReporter;
    let config = Config::default();

    let mut iw = IWatch::init(
        IWatchId(1),
        open_dir(tmp.path()),
        InotifyMask::CREATE | InotifyMask::DELETE | InotifyMask::MODIFY,
        &sink,
        &events,
        &reporter,
        &config,
    )
    .unwrap();

    let original_inode = iw.deps().get(OsStr::new("f")).unwrap().inode;
    let original_watch_inode = iw
        .watches()
        .iter()
        .map(|(inode, _)| *inode)
        .find(|i| *i != iw.inode())
        .unwrap();
    assert_eq!(original_watch_inode, original_inode);

    // Unlink and recreate "f" between two rescans -- a new inode under the same name.
    std::fs::remove_file(tmp.path().join("f")).unwrap();
    std::fs::write(tmp.path().join("f"), b"two").unwrap();

    iw.handle_dir_change().unwrap();

    let new_inode = iw.deps().get(OsStr::new("f")).unwrap().inode;
    assert_ne!(new_inode, original_inode);

    // The stale watch is gone; a fresh one exists under the new inode.
    assert!(iw.watches().find(original_inode).is_none());
    assert!(iw.watches().find(new_inode).is_some());

    assert_eq!(
        events.names_with_mask(InotifyMask::DELETE),
        vec![OsStr::new("f").to_owned()]
    );
    assert_eq!(
        events.names_with_mask(InotifyMask::CREATE),
        vec![OsStr::new("f").to_owned()]
    );

    // DELETE must precede CREATE for the same name (removal before the replacement appears).
    let recorded = events.events.borrow();
    let delete_pos = recorded
        .iter()
        .position(|e| e.mask == InotifyMask::DELETE)
        .unwrap();
    let create_pos = recorded
        .iter()
        .position(|e| e.mask == InotifyMask::CREATE)
        .unwrap();
    assert!(delete_pos < create_pos);
}

/// A single rescan that both deletes a late-alphabet entry and creates an early-alphabet one must
/// emit the CREATE first -- events are ordered alphabetically across the whole affected set, not
/// grouped by removed/renamed/added category.
#[test]
fn test_handle_dir_change_emits_events_in_alphabetical_order_across_categories() {
    let tmp = tempfile::tempdir().unwrap();
    std::fs::File::create(tmp.path().join("z")).unwrap();

    let sink = FakeSink::default();
    let events = FakeEvents::default();
    let reporter = NullReporter;
    let config = Config::default();

    let mut iw = IWatch::init(
        IWatchId(1),
        open_dir(tmp.path()),
        InotifyMask::CREATE | InotifyMask::DELETE,
        &sink,
        &events,
        &reporter,
        &config,
    )
    .unwrap();

    std::fs::remove_file(tmp.path().join("z")).unwrap();
    std::fs::File::create(tmp.path().join("a")).unwrap();
    iw.handle_dir_change().unwrap();

    let recorded = events.events.borrow();
    let names: Vec<_> = recorded
        .iter()
        .map(|e| e.name.clone().unwrap())
        .collect();
    assert_eq!(names, vec![OsStr::new("a").to_owned(), OsStr::new("z").to_owned()]);
}

/// Scenario 5: skip-subfiles filesystem. Configuring `skip_fs_types` with the watched
/// directory's own filesystem type name makes `iwatch_init` skip opening any child fds,
/// regardless of directory contents.
#[test]
fn test_skip_subfiles_opens_no_children() {
    let tmp = tempfile::tempdir().unwrap();
    std::fs::File::create(tmp.path().join("a")).unwrap();
    std::fs::File::create(tmp.path().join("b")).unwrap();

    let dir_fd = open_dir(tmp.path());
    let fstype = kqinotify::fstatfs(dir_fd.fd())
        .unwrap()
        .fstypename()
        .to_owned();

    let sink = FakeSink::default();
    let events = FakeEvents::default();
    let reporter = NullReporter;
    let config = Config {
        skip_fs_types: vec![fstype],
        ..Config::default()
    };

    let iw = IWatch::init(
        IWatchId(1),
        dir_fd,
        InotifyMask::CREATE | InotifyMask::MODIFY,
        &sink,
        &events,
        &reporter,
        &config,
    )
    .unwrap();

    assert!(iw.skip_subfiles());
    assert_eq!(iw.watches().len(), 1);
}

/// Scenario 6: flag upgrade. With only `CREATE` requested, regular-file children need no watch
/// (the translator returns an empty fflag set for them); raising the mask to `MODIFY` opens
/// watches for the existing children.
#[test]
fn test_flag_upgrade_opens_child_watches() {
    let tmp = tempfile::tempdir().unwrap();
    std::fs::File::create(tmp.path().join("a")).unwrap();
    std::fs::File::create(tmp.path().join("b")).unwrap();

    let sink = FakeSink::default();
    let events = FakeEvents::default();
    let reporter = NullReporter;
    let config = Config::default();

    let mut iw = IWatch::init(
        IWatchId(1),
        open_dir(tmp.path()),
        InotifyMask::CREATE,
        &sink,
        &events,
        &reporter,
        &config,
    )
    .unwrap();

    assert_eq!(iw.watches().len(), 1);

    iw.update_flags(InotifyMask::MODIFY);

    assert_eq!(iw.watches().len(), 3);
}

/// A mask downgrade that makes the translator return an empty fflag set for an existing child
/// must drop the watch without forgetting the directory entry: a later rescan should not see the
/// still-present file as freshly created.
#[test]
fn test_flag_downgrade_keeps_dep_tracked_after_dropping_watch() {
    let tmp = tempfile::tempdir().unwrap();
    std::fs::File::create(tmp.path().join("a")).unwrap();

    let sink = FakeSink::default();
    let events = FakeEvents::default();
    let reporter = NullReporter;
    let config = Config::default();

    let mut iw = IWatch::init(
        IWatchId(1),
        open_dir(tmp.path()),
        InotifyMask::MODIFY,
        &sink,
        &events,
        &reporter,
        &config,
    )
    .unwrap();

    // MODIFY on a regular file needs a child watch.
    assert_eq!(iw.watches().len(), 2);
    assert!(iw.deps().get(OsStr::new("a")).is_some());

    // Downgrading to CREATE alone needs no child watch for an existing regular file.
    iw.update_flags(InotifyMask::CREATE);
    assert_eq!(iw.watches().len(), 1);

    // The entry must still be tracked in the snapshot -- dropping the watch is not the same as
    // the file disappearing from the directory.
    assert!(iw.deps().get(OsStr::new("a")).is_some());

    // A rescan that sees the same unchanged directory must not synthesize a CREATE for "a".
    iw.handle_dir_change().unwrap();
    assert!(events.names_with_mask(InotifyMask::CREATE).is_empty());
}

/// `IWatch::open` honors `follow_symlinks` for the parent only: a symlink to a directory can be
/// watched directly when the config opts in, while a child watch never follows one.
#[test]
fn test_open_follows_symlink_parent_when_configured() {
    let tmp = tempfile::tempdir().unwrap();
    let real_dir = tmp.path().join("real");
    std::fs::create_dir(&real_dir).unwrap();
    let link = tmp.path().join("link");
    std::os::unix::fs::symlink(&real_dir, &link).unwrap();

    let sink = FakeSink::default();
    let events = FakeEvents::default();
    let reporter = NullReporter;

    let no_follow = Config::default();
    assert!(IWatch::open(
        IWatchId(1),
        &link,
        InotifyMask::CREATE,
        &sink,
        &events,
        &reporter,
        &no_follow,
    )
    .is_err());

    let follow = Config {
        follow_symlinks: true,
        ..Config::default()
    };
    let iw = IWatch::open(
        IWatchId(2),
        &link,
        InotifyMask::CREATE,
        &sink,
        &events,
        &reporter,
        &follow,
    )
    .unwrap();

    assert_eq!(iw.watches().len(), 1);
}
