//! Filesystem chunk store: durable, crash-safe progress tracking.
//!
//! Every chunk lives as one immutable file under its job's `backup/`
//! directory and is renamed into `restore/` once replayed. File existence is
//! the only completion marker; there is no separate index. Filenames are
//! derived solely from the range start (`<start>.chunk`) so a numeric sort
//! of the listing recovers replay order.

use crate::utils::errors::Result;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

const ARTIFACT_EXT: &str = "chunk";

/// Content-addressed-by-range artifact store rooted at a data directory.
#[derive(Debug, Clone)]
pub struct ChunkStore {
    root: PathBuf,
}

impl ChunkStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn backup_dir(&self, job: &str) -> PathBuf {
        self.root.join(job).join("backup")
    }

    fn restore_dir(&self, job: &str) -> PathBuf {
        self.root.join(job).join("restore")
    }

    fn artifact_name(start: u64) -> String {
        format!("{start}.{ARTIFACT_EXT}")
    }

    /// True iff the chunk starting at `start` was already captured, whether
    /// still pending or already replayed. A replayed chunk must never be
    /// refetched by a later backup run.
    pub fn exists(&self, job: &str, start: u64) -> bool {
        let name = Self::artifact_name(start);
        self.backup_dir(job).join(&name).exists() || self.restore_dir(job).join(&name).exists()
    }

    /// Durably persist a chunk payload at its canonical path.
    ///
    /// Writes to a temp file in the same directory and renames it into
    /// place, so a crash mid-write never leaves a truncated artifact that a
    /// later run would mistake for a completed one.
    pub fn write(&self, job: &str, start: u64, payload: &[u8]) -> Result<()> {
        let dir = self.backup_dir(job);
        fs::create_dir_all(&dir)?;

        let tmp = dir.join(format!(".{start}.{ARTIFACT_EXT}.tmp"));
        fs::write(&tmp, payload)?;
        fs::rename(&tmp, dir.join(Self::artifact_name(start)))?;
        Ok(())
    }

    /// Range starts of pending (not yet replayed) chunks, ascending.
    ///
    /// Sorted explicitly; directory enumeration order is never trusted.
    pub fn pending(&self, job: &str) -> Result<Vec<u64>> {
        list_starts(&self.backup_dir(job))
    }

    /// Range starts of replayed chunks, ascending.
    pub fn done(&self, job: &str) -> Result<Vec<u64>> {
        list_starts(&self.restore_dir(job))
    }

    /// Read the payload of a pending chunk.
    pub fn read(&self, job: &str, start: u64) -> Result<Vec<u8>> {
        Ok(fs::read(self.backup_dir(job).join(Self::artifact_name(start)))?)
    }

    /// Move a replayed chunk from `backup/` to `restore/`.
    ///
    /// A single rename, atomic on one filesystem: a crash between the target
    /// accepting the batch and this call leaves the chunk pending, and the
    /// next run resubmits it (at-least-once delivery).
    pub fn mark_done(&self, job: &str, start: u64) -> Result<()> {
        let name = Self::artifact_name(start);
        let dest = self.restore_dir(job);
        fs::create_dir_all(&dest)?;
        fs::rename(self.backup_dir(job).join(&name), dest.join(&name))?;
        Ok(())
    }

    /// Names of jobs that still hold pending chunks, ascending.
    pub fn jobs_with_pending(&self) -> Result<Vec<String>> {
        let mut jobs = Vec::new();
        if !self.root.exists() {
            return Ok(jobs);
        }
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().to_string();
            if !self.pending(&name)?.is_empty() {
                jobs.push(name);
            }
        }
        jobs.sort();
        Ok(jobs)
    }
}

fn list_starts(dir: &Path) -> Result<Vec<u64>> {
    let mut starts = Vec::new();
    if !dir.exists() {
        return Ok(starts);
    }
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().to_string();
        if name.starts_with('.') {
            // In-progress temp file
            continue;
        }
        match parse_artifact_name(&name) {
            Some(start) => starts.push(start),
            None => warn!("Ignoring unrecognized file in {}: {}", dir.display(), name),
        }
    }
    starts.sort_unstable();
    Ok(starts)
}

fn parse_artifact_name(name: &str) -> Option<u64> {
    name.strip_suffix(&format!(".{ARTIFACT_EXT}"))?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_write_then_exists() -> Result<()> {
        let dir = TempDir::new()?;
        let store = ChunkStore::new(dir.path());

        assert!(!store.exists("developers", 0));
        store.write("developers", 0, b"payload")?;
        assert!(store.exists("developers", 0));
        assert_eq!(store.read("developers", 0)?, b"payload");
        Ok(())
    }

    #[test]
    fn test_pending_sorted_numerically() -> Result<()> {
        let dir = TempDir::new()?;
        let store = ChunkStore::new(dir.path());

        // Written out of order; 10000 also sorts after 5000 only numerically,
        // not lexicographically.
        store.write("developers", 10_000, b"c")?;
        store.write("developers", 0, b"a")?;
        store.write("developers", 5000, b"b")?;

        assert_eq!(store.pending("developers")?, vec![0, 5000, 10_000]);
        Ok(())
    }

    #[test]
    fn test_mark_done_moves_artifact() -> Result<()> {
        let dir = TempDir::new()?;
        let store = ChunkStore::new(dir.path());

        store.write("apps", 0, b"x")?;
        store.mark_done("apps", 0)?;

        assert!(store.pending("apps")?.is_empty());
        assert_eq!(store.done("apps")?, vec![0]);
        // Still counts as captured for backup skip purposes.
        assert!(store.exists("apps", 0));
        Ok(())
    }

    #[test]
    fn test_missing_job_dir_is_empty() -> Result<()> {
        let dir = TempDir::new()?;
        let store = ChunkStore::new(dir.path());
        assert!(store.pending("nope")?.is_empty());
        assert!(store.done("nope")?.is_empty());
        Ok(())
    }

    #[test]
    fn test_unrecognized_files_ignored() -> Result<()> {
        let dir = TempDir::new()?;
        let store = ChunkStore::new(dir.path());

        store.write("developers", 0, b"a")?;
        std::fs::write(dir.path().join("developers/backup/notes.txt"), b"n")?;
        std::fs::write(dir.path().join("developers/backup/.5000.chunk.tmp"), b"t")?;

        assert_eq!(store.pending("developers")?, vec![0]);
        Ok(())
    }

    #[test]
    fn test_jobs_with_pending() -> Result<()> {
        let dir = TempDir::new()?;
        let store = ChunkStore::new(dir.path());

        store.write("developers", 0, b"a")?;
        store.write("apps", 0, b"b")?;
        store.mark_done("apps", 0)?;

        assert_eq!(store.jobs_with_pending()?, vec!["developers".to_string()]);
        Ok(())
    }

    #[test]
    fn test_overwrite_is_permitted() -> Result<()> {
        let dir = TempDir::new()?;
        let store = ChunkStore::new(dir.path());

        store.write("developers", 0, b"first")?;
        store.write("developers", 0, b"second")?;
        assert_eq!(store.read("developers", 0)?, b"second");
        Ok(())
    }
}
