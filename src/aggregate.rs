//! Content aggregation: expand watch targets into an ordered list of files
//! and read them into memory.
//!
//! Each target is expanded in order: an existing file stands for itself, an
//! existing directory for every regular file beneath it, and anything else is
//! treated as a glob pattern walked from its longest literal prefix. Within
//! one expansion entries come back in `walkdir`'s file-name sort order, so the
//! full listing is deterministic for a fixed filesystem state — two runs over
//! the same tree produce byte-identical snapshots.
//!
//! Targets that match nothing are skipped, and a file that disappears between
//! listing and reading is dropped from the batch rather than failing it. File
//! reads fan out concurrently over a [`tokio::task::JoinSet`] and are stitched
//! back into listing order afterwards.

use anyhow::{Context, Result};
use globset::Glob;
use std::path::{Path, PathBuf};
use tokio::task::JoinSet;
use walkdir::WalkDir;

/// Expand every target and read the resulting files, preserving target order.
pub async fn collect(targets: &[String]) -> Result<Vec<(PathBuf, String)>> {
    let mut paths = Vec::new();

    for target in targets {
        let expanded = expand_target(target)?;
        if expanded.is_empty() {
            tracing::debug!(target = %target, "watch target matched no files");
        }
        paths.extend(expanded);
    }

    read_all(paths).await
}

/// Expand a single target into absolute file paths.
pub fn expand_target(target: &str) -> Result<Vec<PathBuf>> {
    let path = Path::new(target);

    match std::fs::metadata(path) {
        Ok(meta) if meta.is_file() => Ok(vec![absolute(path)]),
        Ok(meta) if meta.is_dir() => Ok(files_under(path)),
        // Not an existing path: treat as a glob. A literal path that has
        // been deleted falls through here and expands to nothing.
        _ => expand_glob(target),
    }
}

/// All regular files beneath `dir`, recursively, in file-name sort order.
fn files_under(dir: &Path) -> Vec<PathBuf> {
    WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| absolute(entry.path()))
        .collect()
}

fn expand_glob(pattern: &str) -> Result<Vec<PathBuf>> {
    let matcher = Glob::new(pattern)
        .with_context(|| format!("Invalid watch target pattern: '{}'", pattern))?
        .compile_matcher();

    let root = literal_prefix(pattern);
    if !root.exists() {
        return Ok(Vec::new());
    }

    let mut out = Vec::new();
    let mut walker = WalkDir::new(&root).sort_by_file_name().into_iter();

    while let Some(entry) = walker.next() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(_) => continue,
        };

        if !matcher.is_match(entry.path()) {
            continue;
        }

        if entry.file_type().is_dir() {
            // A glob that matches a directory stands for its whole subtree.
            out.extend(files_under(entry.path()));
            walker.skip_current_dir();
        } else if entry.file_type().is_file() {
            out.push(absolute(entry.path()));
        }
    }

    Ok(out)
}

/// Longest leading run of pattern components with no glob metacharacters;
/// the walk root for glob expansion. Shared with the watcher, which needs
/// a concrete directory to register with the OS.
pub fn literal_prefix(pattern: &str) -> PathBuf {
    let mut prefix = PathBuf::new();

    for component in Path::new(pattern).components() {
        let text = component.as_os_str().to_string_lossy();
        if text.contains(['*', '?', '[', '{']) {
            break;
        }
        prefix.push(component);
    }

    if prefix.as_os_str().is_empty() {
        PathBuf::from(".")
    } else {
        prefix
    }
}

fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

/// Read every listed file concurrently, keeping listing order in the output.
/// Unreadable files are logged and dropped; the batch itself never fails on
/// a single file.
async fn read_all(paths: Vec<PathBuf>) -> Result<Vec<(PathBuf, String)>> {
    let mut slots: Vec<Option<(PathBuf, String)>> = (0..paths.len()).map(|_| None).collect();
    let mut join = JoinSet::new();

    for (idx, path) in paths.into_iter().enumerate() {
        join.spawn(async move {
            let content = tokio::fs::read_to_string(&path).await;
            (idx, path, content)
        });
    }

    while let Some(res) = join.join_next().await {
        let (idx, path, content) = res?;
        match content {
            Ok(content) => slots[idx] = Some((path, content)),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "skipping unreadable file");
            }
        }
    }

    Ok(slots.into_iter().flatten().collect())
}
