//! Per-run scratch directories that an interrupt handler can still remove.

use std::{
    fs,
    path::{Path, PathBuf},
    sync::{LazyLock, Mutex, PoisonError},
};

use tempfile::TempDir;
use tracing::debug;

use crate::{error::ErrorContext, GlyphResult};

static LIVE_DIRS: LazyLock<Mutex<Vec<PathBuf>>> = LazyLock::new(|| Mutex::new(Vec::new()));

/// Temporary directory removed on drop and registered for [`cleanup_scratch_dirs`].
#[derive(Debug)]
pub struct ScratchDir {
    dir: TempDir,
}

impl ScratchDir {
    pub fn new() -> GlyphResult<Self> {
        let dir = tempfile::Builder::new()
            .prefix("glyphdrop-")
            .tempdir()
            .with_context(|| "creating scratch directory".to_string())?;

        LIVE_DIRS
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(dir.path().to_path_buf());
        debug!("scratch directory: {}", dir.path().display());

        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }
}

impl Drop for ScratchDir {
    fn drop(&mut self) {
        LIVE_DIRS
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|p| p != self.dir.path());
    }
}

/// Removes every live scratch directory. Meant for signal handlers, where
/// destructors will not run.
pub fn cleanup_scratch_dirs() {
    let mut dirs = LIVE_DIRS.lock().unwrap_or_else(PoisonError::into_inner);
    for dir in dirs.drain(..) {
        let _ = fs::remove_dir_all(&dir);
    }
}

#[cfg(test)]
mod tests {
    use serial_test::serial;

    use super::*;

    fn is_registered(path: &Path) -> bool {
        LIVE_DIRS
            .lock()
            .unwrap()
            .iter()
            .any(|p| p == path)
    }

    #[test]
    #[serial]
    fn test_scratch_dir_unregisters_on_drop() {
        let scratch = ScratchDir::new().unwrap();
        let path = scratch.path().to_path_buf();
        assert!(path.is_dir());
        assert!(is_registered(&path));

        drop(scratch);
        assert!(!path.exists());
        assert!(!is_registered(&path));
    }

    #[test]
    #[serial]
    fn test_cleanup_removes_live_dirs() {
        let scratch = ScratchDir::new().unwrap();
        let path = scratch.path().to_path_buf();
        fs::write(path.join("partial.zip"), b"data").unwrap();

        cleanup_scratch_dirs();
        assert!(!path.exists());
        assert!(!is_registered(&path));

        // dropping afterwards must not fail even though the directory is gone
        drop(scratch);
    }
}
