use super::backend::PackageBackend;
use crate::error::{DebugSymError, Result};
use crate::package::PackageRef;
use std::path::PathBuf;

/// Fetches located packages into a local cache directory.
pub struct PackageDownloader<'a> {
    backend: &'a dyn PackageBackend,
    cache_dir: PathBuf,
}

impl<'a> PackageDownloader<'a> {
    pub(crate) fn new(backend: &'a dyn PackageBackend, cache_dir: PathBuf) -> Self {
        Self { backend, cache_dir }
    }

    /// Download `package` and record where it landed.
    ///
    /// On failure `package.local_path` is cleared; a failed transfer is
    /// never resumed.
    pub fn download(&self, package: &mut PackageRef) -> Result<PathBuf> {
        package.local_path = None;

        log::debug!("Downloading {}", package);

        let path = self
            .backend
            .download(package, &self.cache_dir)
            .map_err(|e| match e {
                DebugSymError::Download { .. } => e,
                other => DebugSymError::Download {
                    package: package.nvra(),
                    reason: other.to_string(),
                },
            })?;

        package.local_path = Some(path.clone());
        Ok(path)
    }
}
