use std::{
    fs::{self, Permissions},
    os::unix::fs::PermissionsExt as _,
    path::{Path, PathBuf},
    process,
    sync::{LazyLock, Mutex, PoisonError},
};

use crate::error::{FileSystemError, FileSystemResult};

/// Removes the specified file or directory safely.
///
/// If the path does not exist, this function returns `Ok(())` without error. Directories are
/// removed recursively.
///
/// # Errors
///
/// Returns a [`FileSystemError::File`] if the removal fails for any reason other than the path
/// not existing.
pub fn safe_remove<P: AsRef<Path>>(path: P) -> FileSystemResult<()> {
    let path = path.as_ref();

    if !path.exists() {
        return Ok(());
    }

    let result = if path.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    };

    result.map_err(|err| {
        FileSystemError::File {
            path: path.to_path_buf(),
            action: "remove",
            source: err,
        }
    })
}

/// Creates a directory structure if it doesn't exist.
///
/// # Errors
///
/// * [`FileSystemError::Directory`] if the directory could not be created.
/// * [`FileSystemError::NotADirectory`] if the path exists but is not a directory.
pub fn ensure_dir_exists<P: AsRef<Path>>(path: P) -> FileSystemResult<()> {
    let path = path.as_ref();
    if !path.exists() {
        fs::create_dir_all(path).map_err(|err| {
            FileSystemError::Directory {
                path: path.to_path_buf(),
                action: "create",
                source: err,
            }
        })?;
    } else if !path.is_dir() {
        return Err(FileSystemError::NotADirectory {
            path: path.to_path_buf(),
        });
    }

    Ok(())
}

/// Like [`ensure_dir_exists`], but restricts the directory to its owner (`0700`).
pub fn ensure_private_dir<P: AsRef<Path>>(path: P) -> FileSystemResult<()> {
    let path = path.as_ref();
    ensure_dir_exists(path)?;
    fs::set_permissions(path, Permissions::from_mode(0o700)).map_err(|err| {
        FileSystemError::Directory {
            path: path.to_path_buf(),
            action: "restrict",
            source: err,
        }
    })
}

/// Restricts a file to owner read/write (`0600`).
pub fn restrict_to_owner<P: AsRef<Path>>(path: P) -> FileSystemResult<()> {
    let path = path.as_ref();
    fs::set_permissions(path, Permissions::from_mode(0o600)).map_err(|err| {
        FileSystemError::File {
            path: path.to_path_buf(),
            action: "restrict",
            source: err,
        }
    })
}

static LIVE_STAGING: LazyLock<Mutex<Vec<PathBuf>>> = LazyLock::new(|| Mutex::new(Vec::new()));

/// A partially written file that is removed on drop unless it was moved away.
///
/// While alive the path is also registered for [`cleanup_staging_files`], so an interrupt
/// handler can remove it when destructors will not run.
#[derive(Debug)]
pub struct StagingFile {
    path: PathBuf,
}

impl StagingFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        LIVE_STAGING
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(path.clone());
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for StagingFile {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
        LIVE_STAGING
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|p| p != &self.path);
    }
}

/// Removes every live staging file.
pub fn cleanup_staging_files() {
    let mut files = LIVE_STAGING.lock().unwrap_or_else(PoisonError::into_inner);
    for file in files.drain(..) {
        let _ = fs::remove_file(&file);
    }
}

/// Copies `src` over `dest` without ever exposing a half-written `dest`.
///
/// The bytes land in a hidden sibling of `dest` first and are renamed into place, so a
/// failure midway leaves any previous `dest` untouched. Parent directories are created.
pub fn replace_file<P: AsRef<Path>, Q: AsRef<Path>>(src: P, dest: Q) -> FileSystemResult<()> {
    let src = src.as_ref();
    let dest = dest.as_ref();

    if let Some(parent) = dest.parent() {
        ensure_dir_exists(parent)?;
    }

    let file_name = dest
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let staging = StagingFile::new(
        dest.with_file_name(format!(".{file_name}.{}.tmp", process::id())),
    );

    fs::copy(src, staging.path()).map_err(|err| {
        FileSystemError::File {
            path: src.to_path_buf(),
            action: "copy",
            source: err,
        }
    })?;

    fs::rename(staging.path(), dest).map_err(|err| {
        FileSystemError::File {
            path: dest.to_path_buf(),
            action: "replace",
            source: err,
        }
    })
}
