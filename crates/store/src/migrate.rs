//! Bulk copy of a local filestore tree into the remote bucket.
//!
//! Every regular file under the root (and every symlink to a file) is uploaded
//! to `<namespace>/<relative path>`. Keys that cannot be stored verbatim, such
//! as non-UTF-8 names, count as failures.
//! Keys are not re-derived from content; the tree is lifted as is so existing
//! identifiers keep resolving. The job never returns an error: failures are
//! logged and reported in the [`MigrationReport`].

use std::path::{Component, Path};

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};
use walkdir::{DirEntry, WalkDir};

use crate::client::TargetFactory;
use crate::descriptor::StorageMode;
use crate::error::{Result, StoreError};
use crate::target::{NamespacedPath, StorageTarget};

/// What to do when a single file fails to copy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Stop the walk at the first failure
    #[default]
    AbortOnFirst,
    /// Record the failure and keep going
    Continue,
}

#[derive(Debug, Clone, Default)]
pub struct MigrationOptions {
    pub failure_policy: FailurePolicy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MigrationOutcome {
    /// Location is not remote; nothing was copied
    Skipped,
    /// The whole tree was walked
    Completed,
    /// The job stopped early
    Aborted,
}

#[derive(Debug, Clone, Serialize)]
pub struct MigrationReport {
    pub outcome: MigrationOutcome,
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub first_error: Option<String>,
}

impl MigrationReport {
    fn new(outcome: MigrationOutcome) -> Self {
        Self {
            outcome,
            attempted: 0,
            succeeded: 0,
            failed: 0,
            first_error: None,
        }
    }

    fn record_failure(&mut self, error: String) {
        self.attempted += 1;
        self.failed += 1;
        if self.first_error.is_none() {
            self.first_error = Some(error);
        }
    }

    fn abort(mut self, error: String) -> Self {
        error!(error = %error, "filestore copy to remote store aborted");
        if self.first_error.is_none() {
            self.first_error = Some(error);
        }
        self.outcome = MigrationOutcome::Aborted;
        self
    }
}

/// Copy every file under `local_root` to the bucket named by `location`.
pub async fn migrate_tree(
    factory: &TargetFactory,
    location: &str,
    local_root: &Path,
    namespace: &str,
    options: &MigrationOptions,
) -> MigrationReport {
    let report = MigrationReport::new(MigrationOutcome::Completed);

    let descriptor = match StorageMode::resolve(location) {
        Ok(StorageMode::Remote(descriptor)) => descriptor,
        Ok(StorageMode::Local) => {
            info!("storage location is not remote, nothing to migrate");
            return MigrationReport::new(MigrationOutcome::Skipped);
        }
        Err(e) => return report.abort(e.to_string()),
    };

    let target = match factory.get_or_create_target(&descriptor).await {
        Ok(target) => target,
        Err(e) => return report.abort(e.to_string()),
    };

    let report = copy_tree(&target, local_root, namespace, options.failure_policy, report).await;
    if report.outcome == MigrationOutcome::Completed {
        info!(
            namespace = %namespace,
            succeeded = report.succeeded,
            failed = report.failed,
            "filestore copied to remote store"
        );
    }
    report
}

async fn copy_tree(
    target: &StorageTarget,
    local_root: &Path,
    namespace: &str,
    policy: FailurePolicy,
    mut report: MigrationReport,
) -> MigrationReport {
    for entry in WalkDir::new(local_root).follow_links(false) {
        let result = match entry {
            Ok(entry) => {
                if !is_uploadable(&entry).await {
                    continue;
                }
                copy_file(target, local_root, entry.path(), namespace).await
            }
            Err(e) if e.depth() == 0 => {
                // the root itself could not be opened, there is nothing to walk
                let message = StoreError::Io(e.into()).to_string();
                report.record_failure(message.clone());
                return report.abort(message);
            }
            Err(e) => Err(StoreError::Io(e.into())),
        };

        match result {
            Ok(relative) => {
                report.attempted += 1;
                report.succeeded += 1;
                info!(namespace = %namespace, path = %relative, "copied file to remote store");
            }
            Err(e) => {
                let message = e.to_string();
                report.record_failure(message.clone());
                match policy {
                    FailurePolicy::AbortOnFirst => return report.abort(message),
                    FailurePolicy::Continue => {
                        warn!(error = %message, "failed to copy file, continuing");
                    }
                }
            }
        }
    }
    report
}

/// Regular files, and symlinks unless they point at a directory. Dangling
/// links are attempted so the read failure shows up in the report.
async fn is_uploadable(entry: &DirEntry) -> bool {
    let file_type = entry.file_type();
    if file_type.is_file() {
        return true;
    }
    if !file_type.is_symlink() {
        return false;
    }
    match tokio::fs::metadata(entry.path()).await {
        Ok(meta) if meta.is_dir() => {
            debug!(path = %entry.path().display(), "skipping symlinked directory");
            false
        }
        _ => true,
    }
}

async fn copy_file(
    target: &StorageTarget,
    local_root: &Path,
    path: &Path,
    namespace: &str,
) -> Result<String> {
    let relative = relative_key(local_root, path)?;
    let data = tokio::fs::read(path).await?;
    target
        .put(&NamespacedPath::new(namespace, relative.as_str()), Bytes::from(data))
        .await?;
    Ok(relative)
}

/// `path` relative to `root`, joined with `/` on every platform. Components
/// that are not valid UTF-8 are an error, never replaced.
fn relative_key(root: &Path, path: &Path) -> Result<String> {
    let relative = path
        .strip_prefix(root)
        .map_err(|_| StoreError::Path(path.to_path_buf()))?;

    let mut parts = Vec::new();
    for component in relative.components() {
        if let Component::Normal(part) = component {
            let part = part
                .to_str()
                .ok_or_else(|| StoreError::Path(path.to_path_buf()))?;
            parts.push(part);
        }
    }

    if parts.is_empty() {
        return Err(StoreError::Path(path.to_path_buf()));
    }
    Ok(parts.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relative_key() {
        let root = Path::new("/var/filestore/db1");
        assert_eq!(
            relative_key(root, &root.join("ab").join("abcdef")).unwrap(),
            "ab/abcdef"
        );
        assert_eq!(relative_key(root, &root.join("a.txt")).unwrap(), "a.txt");
        assert!(relative_key(root, Path::new("/elsewhere/a.txt")).is_err());
        assert!(relative_key(root, root).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_relative_key_rejects_non_utf8() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let root = Path::new("/var/filestore/db1");
        let first = root.join(OsStr::from_bytes(b"caf\xe9.txt"));
        let second = root.join(OsStr::from_bytes(b"caf\xff.txt"));

        assert!(matches!(relative_key(root, &first), Err(StoreError::Path(p)) if p == first));
        assert!(matches!(relative_key(root, &second), Err(StoreError::Path(_))));
    }

    #[test]
    fn test_report_failure_bookkeeping() {
        let mut report = MigrationReport::new(MigrationOutcome::Completed);
        report.record_failure("first".to_string());
        report.record_failure("second".to_string());
        assert_eq!(report.attempted, 2);
        assert_eq!(report.failed, 2);
        assert_eq!(report.first_error.as_deref(), Some("first"));

        let report = report.abort("third".to_string());
        assert_eq!(report.outcome, MigrationOutcome::Aborted);
        assert_eq!(report.first_error.as_deref(), Some("first"));
    }
}
