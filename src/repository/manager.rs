use super::backend::PackageBackend;
use super::downloader::PackageDownloader;
use super::locator::PackageLocator;
use crate::error::{compile_glob, DebugSymError, Result};
use std::path::PathBuf;

/// Owns the package backend until repositories have been configured.
pub struct RepositoryManager {
    backend: Box<dyn PackageBackend>,
}

impl RepositoryManager {
    pub fn new(backend: Box<dyn PackageBackend>) -> Self {
        Self { backend }
    }

    /// Ids of enabled repositories, in backend order.
    pub fn list_enabled_ids(&self) -> Vec<String> {
        enabled_ids(self.backend.as_ref())
    }

    /// Disable repositories matching `disable_pattern`, then enable those
    /// matching `enable_pattern`.
    ///
    /// Consumes the manager: searching is only possible on the returned
    /// [`ConfiguredRepositories`], which exists only if at least one enabled
    /// repository matches `enable_pattern`. An empty `disable_pattern`
    /// leaves every repository's state untouched.
    pub fn configure(
        mut self,
        enable_pattern: &str,
        disable_pattern: &str,
    ) -> Result<ConfiguredRepositories> {
        let enable = compile_glob(enable_pattern)?;

        if !disable_pattern.is_empty() {
            let disable = compile_glob(disable_pattern)?;
            let disabled = self.backend.set_enabled(&disable, false);
            log::debug!("Disabled {} repositories matching {}", disabled, disable_pattern);
        }

        let enabled = self.backend.set_enabled(&enable, true);
        log::debug!("Enabled {} repositories matching {}", enabled, enable_pattern);

        let active: Vec<String> = self
            .list_enabled_ids()
            .into_iter()
            .filter(|id| enable.matches(id))
            .collect();

        if active.is_empty() {
            return Err(DebugSymError::NoMatchingRepositories {
                pattern: enable_pattern.to_string(),
            });
        }

        log::info!("Using repositories: {}", active.join(", "));

        Ok(ConfiguredRepositories {
            backend: self.backend,
        })
    }
}

/// Repositories that passed the enable check and may be searched.
pub struct ConfiguredRepositories {
    backend: Box<dyn PackageBackend>,
}

impl ConfiguredRepositories {
    pub fn list_enabled_ids(&self) -> Vec<String> {
        enabled_ids(self.backend.as_ref())
    }

    pub fn locator(&self) -> PackageLocator<'_> {
        PackageLocator::new(self.backend.as_ref(), self.list_enabled_ids())
    }

    pub fn downloader(&self, cache_dir: PathBuf) -> PackageDownloader<'_> {
        PackageDownloader::new(self.backend.as_ref(), cache_dir)
    }
}

fn enabled_ids(backend: &dyn PackageBackend) -> Vec<String> {
    backend
        .repositories()
        .into_iter()
        .filter(|repo| repo.enabled)
        .map(|repo| repo.id)
        .collect()
}
