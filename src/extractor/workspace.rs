use crate::error::{DebugSymError, Result};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use tempfile::TempDir;

// The working directory is process-wide; only one workspace may hold it.
static WORKING_DIR: Mutex<()> = Mutex::new(());

/// A private scratch directory that the process works inside for the
/// duration of one extraction.
///
/// Dropping the workspace (or calling [`TempWorkspace::release`]) restores
/// the previous working directory and removes the directory tree, on every
/// exit path including panics.
pub struct TempWorkspace {
    previous_dir: PathBuf,
    dir: Option<TempDir>,
    _cwd: MutexGuard<'static, ()>,
}

impl TempWorkspace {
    /// Create a uniquely named directory under `root` (or the system temp
    /// dir) and change into it.
    pub fn acquire(root: Option<&Path>) -> Result<Self> {
        let cwd = WORKING_DIR.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        let previous_dir = std::env::current_dir()?;

        let mut builder = tempfile::Builder::new();
        builder.prefix("debugsym-");
        let dir = match root {
            Some(root) => builder.tempdir_in(root),
            None => builder.tempdir(),
        }?;

        std::env::set_current_dir(dir.path())?;
        log::debug!("Entered workspace {}", dir.path().display());

        Ok(Self {
            previous_dir,
            dir: Some(dir),
            _cwd: cwd,
        })
    }

    pub fn path(&self) -> &Path {
        match self.dir {
            Some(ref dir) => dir.path(),
            None => &self.previous_dir,
        }
    }

    /// Leave and delete the workspace, reporting cleanup failures that a
    /// plain drop would only log.
    pub fn release(mut self) -> Result<()> {
        self.restore_working_dir()?;
        if let Some(dir) = self.dir.take() {
            let path = dir.path().to_path_buf();
            dir.close().map_err(|e| DebugSymError::InvalidPath {
                path: format!("Failed to remove workspace {}: {}", path.display(), e),
            })?;
        }
        Ok(())
    }

    fn restore_working_dir(&self) -> Result<()> {
        std::env::set_current_dir(&self.previous_dir)?;
        Ok(())
    }
}

impl Drop for TempWorkspace {
    fn drop(&mut self) {
        if self.dir.is_none() {
            return;
        }

        if let Err(e) = self.restore_working_dir() {
            log::warn!(
                "Could not return to {}: {}",
                self.previous_dir.display(),
                e
            );
        }

        if let Some(dir) = self.dir.take() {
            let path = dir.path().to_path_buf();
            if let Err(e) = dir.close() {
                log::warn!("Failed to remove workspace {}: {}", path.display(), e);
            }
        }
    }
}
