//! Zip extraction into private temp directories.
//!
//! Entries that would land outside the target and symlink entries are
//! dropped, so nothing in an extracted tree points elsewhere.

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::Context;
use judgeline_adapter_api::{status, JudgeError};
use tracing::{debug, warn};

const S_IFMT: u32 = 0o170000;
const S_IFLNK: u32 = 0o120000;

/// Extract `archive` into a fresh directory under `tmp_root`.
pub async fn extract_to_temp(archive: &Path, tmp_root: &Path, prefix: &str) -> anyhow::Result<tempfile::TempDir> {
    let dir = tempfile::Builder::new()
        .prefix(prefix)
        .tempdir_in(tmp_root)
        .context("failed to create extraction dir")?;

    let source = archive.to_path_buf();
    let target = dir.path().to_path_buf();
    let entries = tokio::task::spawn_blocking(move || extract_into(&source, &target))
        .await
        .context("extraction task failed")??;

    debug!(archive = %archive.display(), entries, "archive extracted");
    Ok(dir)
}

/// Extract a submitted archive; failures are blamed on the submission.
pub async fn extract_solution(archive: &Path, tmp_root: &Path) -> Result<tempfile::TempDir, JudgeError> {
    extract_to_temp(archive, tmp_root, "solution-")
        .await
        .map_err(|e| JudgeError::solution(status::WRONG_ANSWER, "Invalid solution archive", format!("{e:#}")))
}

fn extract_into(archive: &Path, target: &Path) -> anyhow::Result<usize> {
    let file = File::open(archive).with_context(|| format!("failed to open {}", archive.display()))?;
    let mut zip = zip::ZipArchive::new(file).context("failed to open ZIP archive")?;
    let mut extracted = 0;

    for i in 0..zip.len() {
        let mut entry = zip.by_index(i).context("failed to read ZIP entry")?;

        let Some(relative) = entry.enclosed_name() else {
            warn!(name = %entry.name(), "skipping ZIP entry outside the archive root");
            continue;
        };
        if entry.unix_mode().is_some_and(|mode| mode & S_IFMT == S_IFLNK) {
            debug!(name = %entry.name(), "dropping symlink entry");
            continue;
        }

        let out: PathBuf = target.join(relative);
        if entry.is_dir() {
            std::fs::create_dir_all(&out)?;
            continue;
        }
        if let Some(parent) = out.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut dest = File::create(&out).with_context(|| format!("failed to create {}", out.display()))?;
        io::copy(&mut entry, &mut dest).with_context(|| format!("failed to extract {}", entry.name()))?;
        extracted += 1;
    }

    Ok(extracted)
}


#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn extracts_nested_files() {
        let root = tempfile::tempdir().unwrap();
        let archive = root.path().join("a.zip");
        testing::write_zip(&archive, &[("answer.json", "{}"), ("src/main.ts", "1")]);

        let dir = extract_to_temp(&archive, root.path(), "x-").await.unwrap();
        assert_eq!(std::fs::read_to_string(dir.path().join("answer.json")).unwrap(), "{}");
        assert!(dir.path().join("src/main.ts").is_file());
    }

    #[tokio::test]
    async fn garbage_is_a_solution_error() {
        let root = tempfile::tempdir().unwrap();
        let archive = root.path().join("bad.zip");
        std::fs::write(&archive, "not a zip").unwrap();

        let err = extract_solution(&archive, root.path()).await.unwrap_err();
        assert_eq!(err.info().status, status::WRONG_ANSWER);
        assert_eq!(err.to_string(), "Invalid solution archive");
    }
}
