use serde::{Deserialize, Serialize};
use std::ffi::OsStr;
use std::fmt;
use std::path::{Path, PathBuf};

/// A package as reported by a repository backend.
///
/// Name, version and release are always present; identifiers are derived
/// from them rather than stored separately.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageRef {
    pub name: String,
    pub version: String,
    pub release: String,
    #[serde(default)]
    pub arch: Option<String>,
    /// Repository the package was found in.
    #[serde(default)]
    pub repo_id: String,
    /// Paths of the files packed in the payload, in archive order.
    #[serde(default)]
    pub files: Vec<String>,
    /// Set once the package has been downloaded.
    #[serde(skip)]
    pub local_path: Option<PathBuf>,
}

impl PackageRef {
    pub fn new<S: Into<String>>(name: S, version: S, release: S) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            release: release.into(),
            arch: None,
            repo_id: String::new(),
            files: Vec::new(),
            local_path: None,
        }
    }

    pub fn with_arch<S: Into<String>>(mut self, arch: S) -> Self {
        self.arch = Some(arch.into());
        self
    }

    pub fn with_repo<S: Into<String>>(mut self, repo_id: S) -> Self {
        self.repo_id = repo_id.into();
        self
    }

    pub fn with_files<I, S>(mut self, files: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.files = files.into_iter().map(Into::into).collect();
        self
    }

    /// `name-version-release`, the identifier used for cache directories
    /// and manifest entries.
    pub fn nvr(&self) -> String {
        format!("{}-{}-{}", self.name, self.version, self.release)
    }

    /// `name-version-release.arch` when the arch is known.
    pub fn nvra(&self) -> String {
        match self.arch {
            Some(ref arch) => format!("{}.{}", self.nvr(), arch),
            None => self.nvr(),
        }
    }

    /// The spellings a user may search for this package by.
    pub fn search_keys(&self) -> Vec<String> {
        let mut keys = vec![
            self.name.clone(),
            format!("{}-{}", self.name, self.version),
            self.nvr(),
        ];
        if let Some(ref arch) = self.arch {
            keys.push(format!("{}.{}", self.name, arch));
            keys.push(self.nvra());
        }
        keys
    }

    /// First payload file whose final component is `file_name`.
    pub fn find_file(&self, file_name: &str) -> Option<&str> {
        let wanted = OsStr::new(file_name);
        self.files
            .iter()
            .map(String::as_str)
            .find(|path| Path::new(path).file_name() == Some(wanted))
    }
}

impl fmt::Display for PackageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.nvra())
    }
}
