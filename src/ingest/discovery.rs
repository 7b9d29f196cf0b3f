//! Locating the files of a throughput sweep.
//!
//! A sweep is one file per player count, named `{prefix}{N}.csv`
//! (e.g. `writeThroughput3.csv`).

use crate::error::{PlotError, Result};
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// One file of a sweep and the player count it was recorded with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SweepFile {
    pub players: usize,
    pub path: PathBuf,
}

/// Path of the file recorded with `players` participants.
pub fn sweep_file_path(dir: &Path, prefix: &str, players: usize) -> PathBuf {
    dir.join(format!("{}{}.csv", prefix, players))
}

/// Use the configured player counts, or scan `dir` when none are given.
pub fn resolve_sweep_files(dir: &Path, prefix: &str, players: &[usize]) -> Result<Vec<SweepFile>> {
    if players.is_empty() {
        return discover_sweep_files(dir, prefix);
    }

    Ok(players
        .iter()
        .map(|&players| SweepFile {
            players,
            path: sweep_file_path(dir, prefix, players),
        })
        .collect())
}

/// Find every `{prefix}{N}.csv` directly inside `dir`, ordered by `N`.
pub fn discover_sweep_files(dir: &Path, prefix: &str) -> Result<Vec<SweepFile>> {
    if !dir.is_dir() {
        return Err(PlotError::io(
            dir,
            io::Error::new(io::ErrorKind::NotFound, "not a directory"),
        ));
    }

    let mut files = Vec::new();

    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(dir).to_path_buf();
            PlotError::io(path, io::Error::from(e))
        })?;

        if !entry.file_type().is_file() {
            continue;
        }

        let name = entry.file_name().to_string_lossy();
        if let Some(players) = players_from_name(&name, prefix) {
            debug!("Sweep file for {} players: {}", players, entry.path().display());
            files.push(SweepFile {
                players,
                path: entry.path().to_path_buf(),
            });
        }
    }

    if files.is_empty() {
        return Err(PlotError::NoSweepFiles {
            dir: dir.to_path_buf(),
            prefix: prefix.to_string(),
        });
    }

    files.sort_by_key(|f| f.players);
    Ok(files)
}

/// `writeThroughput12.csv` with prefix `writeThroughput` -> `Some(12)`.
fn players_from_name(name: &str, prefix: &str) -> Option<usize> {
    let digits = name.strip_prefix(prefix)?.strip_suffix(".csv")?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}
