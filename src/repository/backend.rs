use crate::error::Result;
use crate::package::PackageRef;
use glob::Pattern;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// A software repository known to a backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    pub id: String,
    pub enabled: bool,
}

impl Repository {
    pub fn new<S: Into<String>>(id: S, enabled: bool) -> Self {
        Self {
            id: id.into(),
            enabled,
        }
    }
}

/// Package metadata and transport service.
///
/// Implementations own the repository list; callers only toggle repositories
/// through [`PackageBackend::set_enabled`] and never see transport details.
pub trait PackageBackend: Send {
    /// Every known repository, in configuration order.
    fn repositories(&self) -> Vec<Repository>;

    /// Enable or disable each repository whose id matches `pattern`,
    /// returning how many matched.
    fn set_enabled(&mut self, pattern: &Pattern, enabled: bool) -> usize;

    /// Packages in the given repositories that match `pattern`.
    fn search(&self, repo_ids: &[String], pattern: &Pattern) -> Result<Vec<PackageRef>>;

    /// Fetch `package` into `dest_dir`, returning the local file.
    fn download(&self, package: &PackageRef, dest_dir: &Path) -> Result<PathBuf>;
}

/// Whether `package` matches any of the spellings a package can be asked for by.
pub fn package_matches(package: &PackageRef, pattern: &Pattern) -> bool {
    package
        .search_keys()
        .iter()
        .any(|key| pattern.matches(key))
}
