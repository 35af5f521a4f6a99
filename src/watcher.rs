//! Polling directory watcher.
//!
//! A background thread re-snapshots the watched tree at a fixed interval and
//! publishes the difference to the previous snapshot as a [`ChangeSet`] on a
//! channel. Consumers read change sets on their own schedule with
//! [`DirectoryWatcher::changes`]. The first poll compares against an empty
//! snapshot, so every file present at start arrives as `added`.
//!
//! # Usage
//!
//! ```no_run
//! use smartsort::watcher::{DirectoryWatcher, WatchConfig};
//! use std::path::Path;
//!
//! let mut watcher = DirectoryWatcher::new(WatchConfig::default());
//! watcher.start(Path::new("/home/me/Downloads"));
//! for changes in watcher.changes().iter().take(1) {
//!     println!("{} new file(s)", changes.added.len());
//! }
//! watcher.stop();
//! ```
//!
//! # Cancellation
//!
//! [`DirectoryWatcher::stop`] clears the session flag. The loop checks the
//! flag once per iteration and is not interrupted mid-sleep, so `stop` only
//! waits up to `join_timeout` before detaching the thread.

use crossbeam_channel::{Receiver, Sender, unbounded};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use std::time::{Duration, Instant, SystemTime};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Timing of the polling loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WatchConfig {
    /// Sleep between successful polls.
    pub poll_interval: Duration,
    /// Sleep after a failed poll.
    pub error_backoff: Duration,
    /// Upper bound `stop` waits for the thread to exit.
    pub join_timeout: Duration,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(2),
            error_backoff: Duration::from_secs(5),
            join_timeout: Duration::from_secs(1),
        }
    }
}

/// Size and modification time of one file at snapshot time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileStamp {
    pub size: u64,
    pub modified: SystemTime,
}

/// Point-in-time view of a directory tree.
pub type Snapshot = BTreeMap<PathBuf, FileStamp>;

/// Files that changed between two snapshots, each list in path order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    pub added: Vec<PathBuf>,
    pub modified: Vec<PathBuf>,
    pub deleted: Vec<PathBuf>,
}

impl ChangeSet {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.modified.is_empty() && self.deleted.is_empty()
    }
}

/// Records every regular file below `directory`.
///
/// Symlinks to files are followed. A directory that does not exist yields an
/// empty snapshot, and entries that vanish or cannot be read mid-walk are
/// skipped.
///
/// # Errors
///
/// Returns an error if `directory` exists but cannot be listed.
pub fn take_snapshot(directory: &Path) -> io::Result<Snapshot> {
    let mut snapshot = Snapshot::new();
    if !directory.exists() {
        return Ok(snapshot);
    }

    fs::read_dir(directory)?;

    for entry in WalkDir::new(directory).min_depth(1) {
        let Ok(entry) = entry else {
            continue;
        };
        if entry.file_type().is_dir() {
            continue;
        }
        if let Ok(metadata) = fs::metadata(entry.path())
            && metadata.is_file()
            && let Ok(modified) = metadata.modified()
        {
            snapshot.insert(
                entry.into_path(),
                FileStamp {
                    size: metadata.len(),
                    modified,
                },
            );
        }
    }

    Ok(snapshot)
}

/// Compares two snapshots.
///
/// A file counts as modified only when its modification time changed.
pub fn diff_snapshots(previous: &Snapshot, current: &Snapshot) -> ChangeSet {
    let mut changes = ChangeSet::default();

    for (path, stamp) in current {
        match previous.get(path) {
            None => changes.added.push(path.clone()),
            Some(old) if old.modified != stamp.modified => changes.modified.push(path.clone()),
            Some(_) => {}
        }
    }

    changes.deleted = previous
        .keys()
        .filter(|path| !current.contains_key(*path))
        .cloned()
        .collect();

    changes
}

struct WatchSession {
    directory: PathBuf,
    running: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

/// Watches one directory at a time on a background thread.
pub struct DirectoryWatcher {
    config: WatchConfig,
    session: Option<WatchSession>,
    sender: Sender<ChangeSet>,
    receiver: Receiver<ChangeSet>,
}

impl DirectoryWatcher {
    pub fn new(config: WatchConfig) -> Self {
        let (sender, receiver) = unbounded();
        Self {
            config,
            session: None,
            sender,
            receiver,
        }
    }

    /// Receiving end for change sets; clones share the same queue.
    pub fn changes(&self) -> Receiver<ChangeSet> {
        self.receiver.clone()
    }

    pub fn is_watching(&self) -> bool {
        self.session.is_some()
    }

    /// Directory of the active session, if any.
    pub fn directory(&self) -> Option<&Path> {
        self.session.as_ref().map(|s| s.directory.as_path())
    }

    /// Starts watching `directory`.
    ///
    /// Files already present are reported as added by the first poll.
    /// Returns `false` if a session is already active or the thread could
    /// not be spawned.
    pub fn start(&mut self, directory: &Path) -> bool {
        if self.session.is_some() {
            debug!("Watcher already running");
            return false;
        }

        let running = Arc::new(AtomicBool::new(true));
        let loop_running = Arc::clone(&running);
        let loop_directory = directory.to_path_buf();
        let sender = self.sender.clone();
        let config = self.config;

        let spawned = std::thread::Builder::new()
            .name("smartsort-watcher".to_owned())
            .spawn(move || run_watch_loop(loop_directory, loop_running, sender, config));

        match spawned {
            Ok(handle) => {
                info!("Watching {}", directory.display());
                self.session = Some(WatchSession {
                    directory: directory.to_path_buf(),
                    running,
                    handle,
                });
                true
            }
            Err(e) => {
                warn!("Failed to spawn watcher thread: {}", e);
                false
            }
        }
    }

    /// Stops the active session. A no-op when idle.
    pub fn stop(&mut self) {
        let Some(session) = self.session.take() else {
            return;
        };

        session.running.store(false, Ordering::Release);

        let deadline = Instant::now() + self.config.join_timeout;
        while !session.handle.is_finished() && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(10));
        }

        if session.handle.is_finished() {
            if session.handle.join().is_err() {
                warn!("Watcher thread panicked");
            }
        } else {
            debug!("Watcher thread still sleeping, detaching");
        }
        info!("Stopped watching {}", session.directory.display());
    }
}

impl Drop for DirectoryWatcher {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run_watch_loop(
    directory: PathBuf,
    running: Arc<AtomicBool>,
    sender: Sender<ChangeSet>,
    config: WatchConfig,
) {
    debug!("Watcher: starting on {:?}", directory);
    let mut previous = Snapshot::new();

    while running.load(Ordering::Acquire) {
        match take_snapshot(&directory) {
            Ok(current) => {
                let changes = diff_snapshots(&previous, &current);
                previous = current;

                if !changes.is_empty() {
                    debug!(
                        "Watcher: {} added, {} modified, {} deleted",
                        changes.added.len(),
                        changes.modified.len(),
                        changes.deleted.len()
                    );
                    if sender.send(changes).is_err() {
                        break;
                    }
                }
                std::thread::sleep(config.poll_interval);
            }
            Err(e) => {
                warn!("Directory watcher error on {}: {}", directory.display(), e);
                std::thread::sleep(config.error_backoff);
            }
        }
    }

    debug!("Watcher: exited for {:?}", directory);
}
