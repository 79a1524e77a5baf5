//! Console-session persistence for engine and weather selections
//!
//! A session is scoped to the shell the launcher is started from. Each shell
//! gets its own small JSON file, keyed by `EPQC_SESSION` when set and by the
//! parent process otherwise, so selections made with `-e`/`-w` are
//! remembered for later runs from the same console and nowhere else.
//!
//! `EPQC_SESSION` is the reliable scope. The parent-process key includes the
//! process start time on Linux, so a recycled pid does not inherit an old
//! session; elsewhere it is the pid alone. Default session files untouched
//! for [`STALE_SESSION_AGE`] are removed when a session is opened.
//!
//! The store is single-writer: two launcher runs against the same session
//! file at the same time may lose one of the updates.

pub mod state;
pub mod store;

pub use state::{SessionKey, SessionState};
pub use store::SessionStore;

use directories::ProjectDirs;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tracing::{debug, warn};

use crate::error::Result;

/// Environment variable naming the session explicitly
pub const SESSION_ID_ENV: &str = "EPQC_SESSION";

/// Environment variable pointing at a session file, bypassing the id lookup
pub const SESSION_FILE_ENV: &str = "EPQC_SESSION_FILE";

/// Default session files older than this are pruned
pub const STALE_SESSION_AGE: Duration = Duration::from_secs(30 * 24 * 60 * 60);

/// Session file named by `explicit` or, failing that, `EPQC_SESSION_FILE`
pub fn session_file_override(explicit: Option<PathBuf>) -> Option<PathBuf> {
    explicit.or_else(|| std::env::var_os(SESSION_FILE_ENV).map(PathBuf::from))
}

/// Open the session store for this run, in memory when there is nowhere to
/// keep it
pub fn open_session(explicit: Option<PathBuf>) -> Result<SessionStore> {
    if let Some(path) = session_file_override(explicit) {
        return SessionStore::open(path);
    }
    match default_session_path(&current_session_id()) {
        Some(path) => {
            if let Some(dir) = path.parent() {
                prune_stale_sessions(dir, STALE_SESSION_AGE, &path);
            }
            SessionStore::open(path)
        }
        None => {
            warn!("No data directory available; session values will not persist");
            Ok(SessionStore::in_memory())
        }
    }
}

/// Remove session files in `dir` not modified within `max_age`, except `keep`.
/// Returns how many were removed. Failures are logged and skipped.
pub fn prune_stale_sessions(dir: &Path, max_age: Duration, keep: &Path) -> usize {
    let Ok(entries) = fs::read_dir(dir) else {
        return 0;
    };
    let now = SystemTime::now();
    let mut removed = 0;
    for path in entries.filter_map(|entry| entry.ok().map(|e| e.path())) {
        if path == keep || path.extension().map_or(true, |ext| ext != "json") {
            continue;
        }
        let age = fs::metadata(&path)
            .and_then(|meta| meta.modified())
            .ok()
            .and_then(|modified| now.duration_since(modified).ok());
        if age.is_some_and(|age| age > max_age) {
            match fs::remove_file(&path) {
                Ok(()) => {
                    debug!("Removed stale session file {}", path.display());
                    removed += 1;
                }
                Err(e) => warn!("Cannot remove stale session {}: {}", path.display(), e),
            }
        }
    }
    removed
}

/// Identifier of the enclosing console session
pub fn current_session_id() -> String {
    if let Ok(id) = std::env::var(SESSION_ID_ENV) {
        let id = sanitize(&id);
        if !id.is_empty() {
            return id;
        }
    }
    parent_session_id()
}

#[cfg(unix)]
fn parent_session_id() -> String {
    let ppid = std::os::unix::process::parent_id();
    match process_start_ticks(ppid) {
        Some(start) => format!("ppid-{ppid}-{start}"),
        None => format!("ppid-{ppid}"),
    }
}

/// Start time of `pid` in clock ticks since boot (field 22 of `/proc/<pid>/stat`)
#[cfg(target_os = "linux")]
fn process_start_ticks(pid: u32) -> Option<u64> {
    let stat = fs::read_to_string(format!("/proc/{pid}/stat")).ok()?;
    // The command name may contain spaces; fields resume after its closing paren
    let rest = &stat[stat.rfind(')')? + 1..];
    rest.split_whitespace().nth(19)?.parse().ok()
}

#[cfg(all(unix, not(target_os = "linux")))]
fn process_start_ticks(_pid: u32) -> Option<u64> {
    None
}

#[cfg(not(unix))]
fn parent_session_id() -> String {
    "default".to_string()
}

fn sanitize(id: &str) -> String {
    id.chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        .collect()
}

/// Default location of the file for session `id`
pub fn default_session_path(id: &str) -> Option<PathBuf> {
    ProjectDirs::from("org", "epqc", "epqc").map(|dirs| {
        dirs.data_local_dir()
            .join("sessions")
            .join(format!("{id}.json"))
    })
}
