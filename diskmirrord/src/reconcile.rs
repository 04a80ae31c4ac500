use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use tracing::{error, info};

use crate::backend::{EntryKind, StorageBackend};
use crate::scan::{LocalFile, scan_local};

/// One primitive action against the remote side. Operations live for a
/// single cycle; nothing is persisted or retried across cycles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOperation {
    Delete { name: String },
    Upload { name: String, local_path: PathBuf },
    Overwrite { name: String, local_path: PathBuf },
}

/// Computes the operations that make the remote name set match the local
/// one. Deletions for remote-only names come first, then every local name
/// gets an unconditional overwrite (when also present remotely) or an upload
/// (when new). The local directory is authoritative: local absence means the
/// file should be gone remotely.
pub fn plan(local: &BTreeMap<String, LocalFile>, remote: &BTreeSet<String>) -> Vec<SyncOperation> {
    let mut operations = Vec::new();
    for name in remote {
        if !local.contains_key(name) {
            operations.push(SyncOperation::Delete { name: name.clone() });
        }
    }
    for (name, file) in local {
        if remote.contains(name) {
            operations.push(SyncOperation::Overwrite {
                name: name.clone(),
                local_path: file.path.clone(),
            });
        } else {
            operations.push(SyncOperation::Upload {
                name: name.clone(),
                local_path: file.path.clone(),
            });
        }
    }
    operations
}

/// Runs one full scan-diff-apply pass. Every failure is contained inside the
/// cycle: a scan or listing failure degrades that side to an empty view, and
/// a failed operation never blocks the remaining files. The next scheduled
/// cycle recomputes everything from scratch, so partial progress self-heals.
pub async fn run_cycle(backend: &dyn StorageBackend, local_root: &Path) {
    info!("starting synchronization cycle");

    let local = match scan_local(local_root).await {
        Ok(files) => files,
        Err(err) => {
            error!(root = %local_root.display(), "error reading local directory: {err}");
            BTreeMap::new()
        }
    };
    let remote: BTreeSet<String> = match backend.list().await {
        Ok(entries) => entries
            .into_iter()
            .filter(|entry| entry.kind == EntryKind::File)
            .map(|entry| entry.name)
            .collect(),
        Err(err) => {
            error!("error listing remote folder: {err}");
            BTreeSet::new()
        }
    };

    for operation in plan(&local, &remote) {
        apply(backend, &operation).await;
    }

    info!("synchronization cycle finished");
}

async fn apply(backend: &dyn StorageBackend, operation: &SyncOperation) {
    match operation {
        SyncOperation::Delete { name } => {
            info!(file = %name, "missing locally, deleting from remote");
            match backend.delete(name).await {
                Ok(()) => info!(file = %name, "deleted from remote"),
                Err(err) => error!(file = %name, "delete failed: {err}"),
            }
        }
        SyncOperation::Upload { name, local_path } => {
            info!(file = %name, "new file, uploading to remote");
            match backend.upload(local_path, name).await {
                Ok(()) => info!(file = %name, "uploaded to remote"),
                Err(err) => error!(file = %name, "upload failed: {err}"),
            }
        }
        SyncOperation::Overwrite { name, local_path } => {
            info!(file = %name, "present on both sides, re-uploading");
            match backend.overwrite(local_path, name).await {
                Ok(()) => info!(file = %name, "updated on remote"),
                Err(err) => error!(file = %name, "overwrite failed: {err}"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{BackendError, RemoteEntry};
    use async_trait::async_trait;
    use std::io;
    use std::sync::Mutex;
    use std::time::SystemTime;

    fn local_set(names: &[&str]) -> BTreeMap<String, LocalFile> {
        names
            .iter()
            .map(|name| {
                (
                    name.to_string(),
                    LocalFile {
                        path: PathBuf::from(format!("/local/{name}")),
                        modified: SystemTime::UNIX_EPOCH,
                    },
                )
            })
            .collect()
    }

    fn remote_set(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|name| name.to_string()).collect()
    }

    fn op_names(operations: &[SyncOperation]) -> Vec<String> {
        operations
            .iter()
            .map(|op| match op {
                SyncOperation::Delete { name } => format!("delete {name}"),
                SyncOperation::Upload { name, .. } => format!("upload {name}"),
                SyncOperation::Overwrite { name, .. } => format!("overwrite {name}"),
            })
            .collect()
    }

    #[test]
    fn plan_partitions_names_into_three_batches() {
        let operations = plan(&local_set(&["a.txt", "b.txt"]), &remote_set(&["b.txt", "c.txt"]));

        assert_eq!(
            op_names(&operations),
            vec!["delete c.txt", "upload a.txt", "overwrite b.txt"]
        );
    }

    #[test]
    fn plan_with_empty_local_only_deletes() {
        let operations = plan(&local_set(&[]), &remote_set(&["x.txt"]));

        assert_eq!(op_names(&operations), vec!["delete x.txt"]);
    }

    #[test]
    fn plan_with_empty_remote_only_uploads() {
        let operations = plan(&local_set(&["a.txt", "b.txt"]), &remote_set(&[]));

        assert_eq!(op_names(&operations), vec!["upload a.txt", "upload b.txt"]);
    }

    #[test]
    fn deletions_always_precede_transfers() {
        let operations = plan(
            &local_set(&["a.txt", "z.txt"]),
            &remote_set(&["a.txt", "b.txt", "y.txt"]),
        );

        let names = op_names(&operations);
        let last_delete = names.iter().rposition(|n| n.starts_with("delete")).unwrap();
        let first_transfer = names.iter().position(|n| !n.starts_with("delete")).unwrap();
        assert!(last_delete < first_transfer);
    }

    #[test]
    fn overwrite_is_emitted_even_for_identical_names_every_time() {
        // No change detection: a name on both sides is always re-transferred.
        let local = local_set(&["same.txt"]);
        let remote = remote_set(&["same.txt"]);

        for _ in 0..2 {
            let operations = plan(&local, &remote);
            assert_eq!(op_names(&operations), vec!["overwrite same.txt"]);
        }
    }

    /// In-memory backend that records calls and can be told to fail for
    /// specific names or for the listing itself.
    #[derive(Default)]
    struct RecordingBackend {
        files: Mutex<BTreeSet<String>>,
        fail_names: BTreeSet<String>,
        fail_list: bool,
        calls: Mutex<Vec<String>>,
    }

    impl RecordingBackend {
        fn with_files(names: &[&str]) -> Self {
            Self {
                files: Mutex::new(names.iter().map(|n| n.to_string()).collect()),
                ..Self::default()
            }
        }

        fn failing_for(mut self, names: &[&str]) -> Self {
            self.fail_names = names.iter().map(|n| n.to_string()).collect();
            self
        }

        fn with_broken_listing(mut self) -> Self {
            self.fail_list = true;
            self
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn files(&self) -> BTreeSet<String> {
            self.files.lock().unwrap().clone()
        }

        fn check(&self, verb: &str, name: &str) -> Result<(), BackendError> {
            self.calls.lock().unwrap().push(format!("{verb} {name}"));
            if self.fail_names.contains(name) {
                return Err(BackendError::Io(io::Error::other("injected failure")));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl StorageBackend for RecordingBackend {
        async fn upload(&self, _local_path: &Path, remote_name: &str) -> Result<(), BackendError> {
            self.check("upload", remote_name)?;
            self.files.lock().unwrap().insert(remote_name.to_string());
            Ok(())
        }

        async fn overwrite(
            &self,
            _local_path: &Path,
            remote_name: &str,
        ) -> Result<(), BackendError> {
            self.check("overwrite", remote_name)?;
            self.files.lock().unwrap().insert(remote_name.to_string());
            Ok(())
        }

        async fn delete(&self, remote_name: &str) -> Result<(), BackendError> {
            self.check("delete", remote_name)?;
            self.files.lock().unwrap().remove(remote_name);
            Ok(())
        }

        async fn list(&self) -> Result<Vec<RemoteEntry>, BackendError> {
            if self.fail_list {
                return Err(BackendError::Io(io::Error::other("listing unavailable")));
            }
            Ok(self
                .files
                .lock()
                .unwrap()
                .iter()
                .map(|name| RemoteEntry {
                    name: name.clone(),
                    kind: EntryKind::File,
                })
                .collect())
        }
    }

    fn write_files(dir: &Path, names: &[&str]) {
        for name in names {
            std::fs::write(dir.join(name), name.as_bytes()).unwrap();
        }
    }

    #[tokio::test]
    async fn cycle_converges_remote_set_to_local_set() {
        let local = tempfile::tempdir().unwrap();
        write_files(local.path(), &["a.txt", "b.txt"]);
        let backend = RecordingBackend::with_files(&["b.txt", "c.txt"]);

        run_cycle(&backend, local.path()).await;

        assert_eq!(backend.files(), remote_set(&["a.txt", "b.txt"]));
        assert_eq!(
            backend.calls(),
            vec!["delete c.txt", "upload a.txt", "overwrite b.txt"]
        );
    }

    #[tokio::test]
    async fn one_failing_file_does_not_block_the_rest() {
        let local = tempfile::tempdir().unwrap();
        write_files(local.path(), &["a.txt", "b.txt", "c.txt"]);
        let backend = RecordingBackend::with_files(&[]).failing_for(&["b.txt"]);

        run_cycle(&backend, local.path()).await;

        assert_eq!(
            backend.calls(),
            vec!["upload a.txt", "upload b.txt", "upload c.txt"]
        );
        assert_eq!(backend.files(), remote_set(&["a.txt", "c.txt"]));
    }

    #[tokio::test]
    async fn listing_failure_means_no_deletions_and_all_uploads() {
        let local = tempfile::tempdir().unwrap();
        write_files(local.path(), &["a.txt"]);
        let backend = RecordingBackend::with_files(&["stale.txt"]).with_broken_listing();

        run_cycle(&backend, local.path()).await;

        assert_eq!(backend.calls(), vec!["upload a.txt"]);
        assert!(backend.files().contains("stale.txt"));
    }

    #[tokio::test]
    async fn unreadable_local_root_degrades_to_deleting_everything_remote() {
        let local = tempfile::tempdir().unwrap();
        let missing = local.path().join("vanished");
        let backend = RecordingBackend::with_files(&["x.txt"]);

        run_cycle(&backend, &missing).await;

        assert_eq!(backend.calls(), vec!["delete x.txt"]);
        assert!(backend.files().is_empty());
    }

    #[tokio::test]
    async fn unchanged_file_is_still_overwritten_each_cycle() {
        let local = tempfile::tempdir().unwrap();
        write_files(local.path(), &["same.txt"]);
        let backend = RecordingBackend::with_files(&["same.txt"]);

        run_cycle(&backend, local.path()).await;
        run_cycle(&backend, local.path()).await;

        assert_eq!(
            backend.calls(),
            vec!["overwrite same.txt", "overwrite same.txt"]
        );
    }
}
