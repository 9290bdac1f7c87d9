//! Filesystem watch source.
//!
//! Wraps `notify`'s recommended watcher (inotify on Linux, FSEvents on
//! macOS) and forwards add/change/remove notifications over a bounded tokio
//! mpsc channel. Events are intent, not data: the sync cycle always re-reads
//! the filesystem, so a dropped event on a full channel costs nothing as
//! long as one event in the same burst gets through.
//!
//! Glob targets are registered at their longest literal prefix directory —
//! the OS watcher has no glob support, and a spurious trigger only causes an
//! extra cycle over correct content.

use anyhow::{Context, Result};
use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;

use crate::aggregate;

/// Bounded channel capacity for raw change events.
const CHANNEL_CAPACITY: usize = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Add,
    Change,
    Remove,
}

/// A single filesystem mutation. Ephemeral: consumed by the coalescer and
/// never persisted.
#[derive(Debug, Clone)]
pub struct ChangeEvent {
    pub kind: ChangeKind,
    pub path: PathBuf,
}

/// Create the event channel with the standard capacity.
pub fn channel() -> (mpsc::Sender<ChangeEvent>, mpsc::Receiver<ChangeEvent>) {
    mpsc::channel(CHANNEL_CAPACITY)
}

/// Start watching every target's root directory. The returned watcher must
/// stay alive for the duration of the watch loop — dropping it stops event
/// delivery.
pub fn spawn(targets: &[String], tx: mpsc::Sender<ChangeEvent>) -> Result<RecommendedWatcher> {
    let mut watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
        let event = match res {
            Ok(event) => event,
            Err(e) => {
                tracing::warn!(error = %e, "filesystem watch error");
                return;
            }
        };

        let kind = match event.kind {
            EventKind::Create(_) => ChangeKind::Add,
            EventKind::Modify(_) => ChangeKind::Change,
            EventKind::Remove(_) => ChangeKind::Remove,
            _ => return,
        };

        for path in event.paths {
            if is_temp_file(&path) {
                continue;
            }
            // try_send: the callback runs on the notify thread and must not
            // block. A full channel means a burst is already queued.
            let _ = tx.try_send(ChangeEvent { kind, path });
        }
    })?;

    let mut roots: Vec<PathBuf> = Vec::new();
    for target in targets {
        let root = watch_root(target);
        if !roots.contains(&root) {
            roots.push(root);
        }
    }

    for root in &roots {
        if !root.exists() {
            tracing::warn!(root = %root.display(), "watch root does not exist, skipping");
            continue;
        }
        watcher
            .watch(root, RecursiveMode::Recursive)
            .with_context(|| format!("Failed to watch {}", root.display()))?;
        tracing::info!(root = %root.display(), "watching");
    }

    Ok(watcher)
}

/// The directory to register for a target: the file's parent, the directory
/// itself, or a glob's literal prefix.
fn watch_root(target: &str) -> PathBuf {
    let path = Path::new(target);
    if path.is_file() {
        return path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
    }
    if path.is_dir() {
        return path.to_path_buf();
    }

    let prefix = aggregate::literal_prefix(target);
    if prefix.is_file() {
        prefix
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."))
    } else {
        prefix
    }
}

/// Editor temp/swap files that would otherwise double every save.
fn is_temp_file(path: &Path) -> bool {
    let name = match path.file_name().and_then(|n| n.to_str()) {
        Some(name) => name,
        None => return true,
    };
    name.starts_with('.')
        || name.starts_with('~')
        || name.ends_with('~')
        || name.ends_with(".swp")
        || name.ends_with(".tmp")
        || name.contains(".#")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::time::Duration;
    use tempfile::TempDir;

    #[test]
    fn test_temp_file_detection() {
        assert!(is_temp_file(Path::new("/x/.hidden")));
        assert!(is_temp_file(Path::new("/x/file.swp")));
        assert!(is_temp_file(Path::new("/x/file.rs~")));
        assert!(is_temp_file(Path::new("/x/.#file.rs")));
        assert!(!is_temp_file(Path::new("/x/file.rs")));
    }

    #[test]
    fn test_watch_root_for_glob() {
        assert_eq!(watch_root("src/**/*.rs"), PathBuf::from("src"));
        assert_eq!(watch_root("*.md"), PathBuf::from("."));
    }

    #[tokio::test]
    async fn test_events_arrive_for_created_file() {
        let tmp = TempDir::new().unwrap();
        let (tx, mut rx) = channel();
        let _watcher = spawn(&[tmp.path().display().to_string()], tx).unwrap();

        // Give the OS watcher a moment to register before mutating.
        tokio::time::sleep(Duration::from_millis(100)).await;
        fs::write(tmp.path().join("new.txt"), "content").unwrap();

        let event = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("no event within timeout")
            .expect("channel closed");
        assert_eq!(event.path.file_name().unwrap(), "new.txt");
    }
}
