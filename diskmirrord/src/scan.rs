use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// A regular file in the mirrored directory, as seen by one cycle's scan.
/// The modification time is recorded but not used for diff decisions; every
/// file present on both sides is re-transferred regardless.
#[derive(Debug, Clone)]
pub struct LocalFile {
    pub path: PathBuf,
    #[allow(dead_code)]
    pub modified: SystemTime,
}

/// Lists the regular files directly under `root`, keyed by file name.
/// Subdirectories are not descended into.
pub async fn scan_local(root: &Path) -> io::Result<BTreeMap<String, LocalFile>> {
    let mut files = BTreeMap::new();
    let mut entries = tokio::fs::read_dir(root).await?;
    while let Some(entry) = entries.next_entry().await? {
        if !entry.file_type().await?.is_file() {
            continue;
        }
        let modified = entry
            .metadata()
            .await?
            .modified()
            .unwrap_or(SystemTime::UNIX_EPOCH);
        files.insert(
            entry.file_name().to_string_lossy().into_owned(),
            LocalFile {
                path: entry.path(),
                modified,
            },
        );
    }
    Ok(files)
}
