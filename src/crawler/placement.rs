//! Artifact placement
//!
//! The browser saves downloads into a staging directory. After each processed
//! node the staging directory is drained into the node's level directory.
//! Moves are retried with a fixed backoff; a destination that already exists
//! is resolved once by copying under a unique name and removing the source.

use super::classify::{self, Classification};
use crate::capture::unique_file_name;
use crate::state::Counters;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Filesystem operations used for placement
pub trait ArtifactFs {
    fn exists(&self, path: &Path) -> bool;
    fn move_file(&mut self, from: &Path, to: &Path) -> io::Result<()>;
    fn copy(&mut self, from: &Path, to: &Path) -> io::Result<()>;
    fn remove(&mut self, path: &Path) -> io::Result<()>;
    /// Regular files directly inside `dir`, sorted by name
    fn list(&self, dir: &Path) -> io::Result<Vec<PathBuf>>;
    fn create_dir_all(&mut self, dir: &Path) -> io::Result<()>;
}

/// The real filesystem
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFs;

impl ArtifactFs for LocalFs {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn move_file(&mut self, from: &Path, to: &Path) -> io::Result<()> {
        match std::fs::rename(from, to) {
            Ok(()) => Ok(()),
            Err(e) if matches!(e.kind(), io::ErrorKind::NotFound | io::ErrorKind::AlreadyExists) => Err(e),
            // Staging and output may sit on different filesystems
            Err(_) => {
                std::fs::copy(from, to)?;
                std::fs::remove_file(from)
            }
        }
    }

    fn copy(&mut self, from: &Path, to: &Path) -> io::Result<()> {
        std::fs::copy(from, to).map(|_| ())
    }

    fn remove(&mut self, path: &Path) -> io::Result<()> {
        std::fs::remove_file(path)
    }

    fn list(&self, dir: &Path) -> io::Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                files.push(entry.path());
            }
        }
        files.sort();
        Ok(files)
    }

    fn create_dir_all(&mut self, dir: &Path) -> io::Result<()> {
        std::fs::create_dir_all(dir)
    }
}

/// Retry and wait bounds for placement
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Move attempts per file
    pub attempts: u32,
    /// Fixed wait between failed attempts
    pub backoff: Duration,
    /// Wait between checks for in-progress downloads
    pub download_poll: Duration,
    /// Checks before draining regardless of in-progress downloads
    pub max_download_polls: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            backoff: Duration::from_secs(10),
            download_poll: Duration::from_secs(10),
            max_download_polls: 30,
        }
    }
}

/// Where a file ended up
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Placement {
    Moved(PathBuf),
    /// The plain name was taken; stored under a unique name instead
    Renamed(PathBuf),
}

/// Moves finished downloads from staging into level directories
#[derive(Debug)]
pub struct ArtifactPlacer<F: ArtifactFs = LocalFs> {
    fs: F,
    policy: RetryPolicy,
    partial_extension: String,
}

impl ArtifactPlacer<LocalFs> {
    pub fn local(policy: RetryPolicy, partial_extension: &str) -> Self {
        Self::new(LocalFs, policy, partial_extension)
    }
}

impl<F: ArtifactFs> ArtifactPlacer<F> {
    pub fn new(fs: F, policy: RetryPolicy, partial_extension: &str) -> Self {
        Self {
            fs,
            policy,
            partial_extension: partial_extension.trim_start_matches('.').to_string(),
        }
    }

    pub fn fs(&self) -> &F {
        &self.fs
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    fn is_partial(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext == self.partial_extension)
    }

    /// Moves `src` into `dst_dir`, keeping its file name when possible
    ///
    /// Transient failures are retried up to the policy's attempt count. A
    /// destination conflict ends the retry loop with a single copy under a
    /// unique name followed by removal of the source.
    pub async fn place(&mut self, src: &Path, dst_dir: &Path) -> io::Result<Placement> {
        let file_name = src
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, format!("no file name in {}", src.display())))?
            .to_string();
        let dest = dst_dir.join(&file_name);

        let attempts = self.policy.attempts.max(1);
        let mut last_error = None;

        for attempt in 1..=attempts {
            if self.fs.exists(&dest) {
                return self.place_unique(src, dst_dir, &file_name);
            }

            match self.fs.move_file(src, &dest) {
                Ok(()) => return Ok(Placement::Moved(dest)),
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                    return self.place_unique(src, dst_dir, &file_name);
                }
                Err(e) => {
                    tracing::warn!(
                        "Move of {} failed (attempt {}/{}): {}",
                        src.display(),
                        attempt,
                        attempts,
                        e
                    );
                    last_error = Some(e);
                    if attempt < attempts {
                        tokio::time::sleep(self.policy.backoff).await;
                    }
                }
            }
        }

        Err(last_error.unwrap_or_else(|| io::Error::other("placement not attempted")))
    }

    fn place_unique(&mut self, src: &Path, dst_dir: &Path, file_name: &str) -> io::Result<Placement> {
        let dest = dst_dir.join(unique_file_name(file_name));
        self.fs.copy(src, &dest)?;
        self.fs.remove(src)?;
        Ok(Placement::Renamed(dest))
    }

    /// Waits for in-progress downloads, then moves every staged file
    ///
    /// Returns the number of files placed. Files that cannot be placed are
    /// counted as errors keyed by their path; they never abort the crawl.
    pub async fn drain(&mut self, staging: &Path, dst_dir: &Path, counters: &mut Counters) -> usize {
        if !self.fs.exists(staging) {
            return 0;
        }

        let mut files = self.list_staged(staging);
        for _ in 0..self.policy.max_download_polls {
            if !files.iter().any(|f| self.is_partial(f)) {
                break;
            }
            tracing::info!("Waiting for downloads to finish in {}", staging.display());
            tokio::time::sleep(self.policy.download_poll).await;
            files = self.list_staged(staging);
        }

        if files.is_empty() {
            return 0;
        }

        if let Err(e) = self.fs.create_dir_all(dst_dir) {
            tracing::error!("Cannot create {}: {}", dst_dir.display(), e);
            return 0;
        }

        let mut placed = 0;
        for file in files {
            if self.is_partial(&file) {
                tracing::warn!("Download still in progress, leaving {} staged", file.display());
                continue;
            }

            let key = file.display().to_string();
            match self.place(&file, dst_dir).await {
                Ok(Placement::Moved(dest)) => {
                    tracing::debug!("Moved {} to {}", key, dest.display());
                    placed += 1;
                }
                Ok(Placement::Renamed(_)) => {
                    classify::record(counters, Classification::MoveConflict, &key);
                    placed += 1;
                }
                Err(e) => {
                    counters.error.record(&key);
                    tracing::error!("Could not place {}: {}", key, e);
                }
            }
        }
        placed
    }

    fn list_staged(&self, staging: &Path) -> Vec<PathBuf> {
        self.fs.list(staging).unwrap_or_else(|e| {
            tracing::warn!("Cannot list {}: {}", staging.display(), e);
            Vec::new()
        })
    }
}
