use super::backend::PackageBackend;
use crate::error::compile_glob;
use crate::package::PackageRef;

/// Best-effort package search over the enabled repositories.
pub struct PackageLocator<'a> {
    backend: &'a dyn PackageBackend,
    repo_ids: Vec<String>,
}

impl<'a> PackageLocator<'a> {
    pub(crate) fn new(backend: &'a dyn PackageBackend, repo_ids: Vec<String>) -> Self {
        Self { backend, repo_ids }
    }

    /// Packages whose name, name-version, nvr or nvra match `name_pattern`.
    ///
    /// Never fails: an invalid pattern or a backend error is logged and
    /// reported as no packages found.
    pub fn find(&self, name_pattern: &str) -> Vec<PackageRef> {
        let pattern = match compile_glob(name_pattern) {
            Ok(pattern) => pattern,
            Err(e) => {
                log::error!("{}", e);
                return Vec::new();
            }
        };

        match self.backend.search(&self.repo_ids, &pattern) {
            Ok(packages) => {
                log::debug!(
                    "Found {} packages matching {} in {} repositories",
                    packages.len(),
                    name_pattern,
                    self.repo_ids.len()
                );
                packages
            }
            Err(e) => {
                log::error!("Package search for {} failed: {}", name_pattern, e);
                Vec::new()
            }
        }
    }
}
