//! Archival sink for fetched files.
//!
//! [`Store::store`] is fire-and-forget: implementations log their own failures
//! and never report back to the scheduler. The scheduler awaits
//! [`Store::flush`] once at the end of a job.

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::task::JoinSet;

use crate::storage::temp_path;

#[async_trait]
pub trait Store: Send + Sync {
    fn store(&self, local_path: &Path, key_prefix: &str);

    /// Waits for work started by earlier `store` calls.
    async fn flush(&self) {}
}

/// Discards every request.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullStore;

impl Store for NullStore {
    fn store(&self, _local_path: &Path, _key_prefix: &str) {}
}

/// Mirrors stored files into `root/<key_prefix>/<file name>`.
///
/// Each copy runs as a tokio task, so `store` must be called from inside a
/// runtime. Copies still running are joined by [`Store::flush`].
#[derive(Debug, Clone)]
pub struct DirStore {
    root: PathBuf,
    pending: Arc<Mutex<JoinSet<()>>>,
}

impl DirStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            pending: Arc::default(),
        }
    }

    fn pending(&self) -> MutexGuard<'_, JoinSet<()>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Archive path for `local_path` under `key_prefix`.
    ///
    /// Prefix segments that are empty, `.` or `..` are dropped so the result
    /// always stays under the root.
    pub fn destination(&self, local_path: &Path, key_prefix: &str) -> Option<PathBuf> {
        let file_name = local_path.file_name()?;
        let mut dest = self.root.clone();
        for seg in key_prefix.split('/') {
            let mut comps = Path::new(seg).components();
            if let (Some(Component::Normal(c)), None) = (comps.next(), comps.next()) {
                dest.push(c);
            }
        }
        dest.push(file_name);
        Some(dest)
    }
}

#[async_trait]
impl Store for DirStore {
    fn store(&self, local_path: &Path, key_prefix: &str) {
        let Some(dest) = self.destination(local_path, key_prefix) else {
            tracing::warn!(path = %local_path.display(), "store skipped: path has no file name");
            return;
        };
        let src = local_path.to_path_buf();
        let mut pending = self.pending();
        while pending.try_join_next().is_some() {}
        pending.spawn(async move {
            match copy_into(&src, &dest).await {
                Ok(bytes) => tracing::debug!(
                    src = %src.display(),
                    dest = %dest.display(),
                    bytes,
                    "archived"
                ),
                Err(e) => tracing::warn!(src = %src.display(), "archive failed: {:#}", e),
            }
        });
    }

    async fn flush(&self) {
        let mut pending = std::mem::take(&mut *self.pending());
        if !pending.is_empty() {
            tracing::debug!(pending = pending.len(), "waiting for archive copies");
        }
        while let Some(joined) = pending.join_next().await {
            if let Err(e) = joined {
                tracing::warn!("archive copy did not finish: {}", e);
            }
        }
    }
}

/// Copies `src` to `dest`, creating parent directories. The copy lands in
/// `dest.part` and is renamed into place, so `dest` is never half-written.
pub async fn copy_into(src: &Path, dest: &Path) -> Result<u64> {
    if let Some(parent) = dest.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("create archive dir {}", parent.display()))?;
    }
    let tmp = temp_path(dest);
    let bytes = tokio::fs::copy(src, &tmp)
        .await
        .with_context(|| format!("copy {} -> {}", src.display(), tmp.display()))?;
    tokio::fs::rename(&tmp, dest)
        .await
        .with_context(|| format!("rename {} -> {}", tmp.display(), dest.display()))?;
    Ok(bytes)
}
