//! File system utils.

use std::{
    fs::File,
    path::{Path, PathBuf},
};

use anyhow::Context;
use fs2::FileExt;

/// Name of the lock file taken inside the deployments directory.
pub const LOCK_FILENAME: &str = ".mirror.lock";

pub struct FsHandler;

impl FsHandler {
    /// Collect every `.json` file below `directory`, sorted by path.
    ///
    /// The order is the lexicographic order of the full paths, which is the order
    /// action files are applied in.
    pub fn collect_action_files(directory: &Path) -> anyhow::Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        Self::walk(directory, &mut files)?;
        files.retain(|path| {
            path.extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
        });
        files.sort_by(|a, b| a.as_os_str().cmp(b.as_os_str()));

        tracing::debug!(
            directory = %directory.display(),
            files = files.len(),
            "Collected action files"
        );

        Ok(files)
    }

    fn walk(directory: &Path, files: &mut Vec<PathBuf>) -> anyhow::Result<()> {
        let entries = std::fs::read_dir(directory)
            .with_context(|| format!("Failed to read directory {}", directory.display()))?;

        for entry in entries {
            let path = entry
                .with_context(|| format!("Failed to read entry in {}", directory.display()))?
                .path();
            if path.is_dir() {
                Self::walk(&path, files)?;
            } else if path.is_file() {
                files.push(path);
            }
        }

        Ok(())
    }

    /// Replace `path` with `content` through a sibling temporary file and a rename.
    pub fn write_atomic(path: &Path, content: &[u8]) -> anyhow::Result<()> {
        let file_name = path
            .file_name()
            .context("File path must have a file name")?
            .to_string_lossy();
        let tmp_path = path.with_file_name(format!(".{file_name}.tmp"));

        std::fs::write(&tmp_path, content)
            .with_context(|| format!("Failed to write {}", tmp_path.display()))?;
        std::fs::rename(&tmp_path, path).with_context(|| {
            format!(
                "Failed to move {} over {}",
                tmp_path.display(),
                path.display()
            )
        })?;

        Ok(())
    }

    /// Mark a file as executable by everyone (no-op on non-unix targets).
    pub fn set_executable(path: &Path) -> anyhow::Result<()> {
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;

            let mut perms = std::fs::metadata(path)
                .context("Failed to get metadata for file")?
                .permissions();
            perms.set_mode(0o755);
            std::fs::set_permissions(path, perms)
                .context("Failed to set permissions on file")?;
        }
        #[cfg(not(unix))]
        let _ = path;

        Ok(())
    }
}

/// Exclusive advisory lock over a deployments directory, released on drop.
#[derive(Debug)]
pub struct RunLock {
    _file: File,
    path: PathBuf,
}

impl RunLock {
    /// Take the lock or fail immediately if another process holds it.
    pub fn acquire(directory: &Path) -> anyhow::Result<Self> {
        let path = directory.join(LOCK_FILENAME);
        let file = File::options()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)
            .with_context(|| format!("Failed to open lock file {}", path.display()))?;

        FileExt::try_lock_exclusive(&file).with_context(|| {
            format!(
                "Another run holds {}; running the same action set twice concurrently is unsafe",
                path.display()
            )
        })?;

        tracing::debug!(path = %path.display(), "Run lock acquired");

        Ok(Self { _file: file, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
