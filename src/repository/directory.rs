use super::backend::{package_matches, PackageBackend, Repository};
use crate::error::{DebugSymError, Result};
use crate::package::PackageRef;
use glob::Pattern;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use url::Url;

/// On-disk layout of a repository index file.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RepositoryIndex {
    #[serde(default, rename = "repository")]
    pub repositories: Vec<RepositoryDefinition>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RepositoryDefinition {
    pub id: String,
    #[serde(default)]
    pub enabled: bool,
    /// Plain path or `file://` URL; relative paths resolve against the index directory.
    pub baseurl: String,
    #[serde(default, rename = "package")]
    pub packages: Vec<PackageEntry>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PackageEntry {
    pub name: String,
    pub version: String,
    pub release: String,
    #[serde(default)]
    pub arch: Option<String>,
    /// Package file, relative to the repository base.
    pub location: String,
    #[serde(default)]
    pub files: Vec<String>,
}

impl PackageEntry {
    fn to_package_ref(&self, repo_id: &str) -> PackageRef {
        PackageRef {
            name: self.name.clone(),
            version: self.version.clone(),
            release: self.release.clone(),
            arch: self.arch.clone(),
            repo_id: repo_id.to_string(),
            files: self.files.clone(),
            local_path: None,
        }
    }

    fn is(&self, package: &PackageRef) -> bool {
        self.name == package.name
            && self.version == package.version
            && self.release == package.release
            && self.arch == package.arch
    }
}

/// Backend serving repositories described by a TOML index and stored on a
/// local or mounted filesystem.
pub struct DirectoryBackend {
    index_dir: PathBuf,
    repositories: Vec<RepositoryDefinition>,
}

impl DirectoryBackend {
    pub fn load<P: AsRef<Path>>(index_path: P) -> Result<Self> {
        let index_path = index_path.as_ref();

        let content = fs::read_to_string(index_path).map_err(|e| DebugSymError::Config {
            message: format!(
                "Failed to read repository index {}: {}",
                index_path.display(),
                e
            ),
        })?;

        let index: RepositoryIndex = toml::from_str(&content).map_err(|e| DebugSymError::Config {
            message: format!(
                "Failed to parse repository index {}: {}",
                index_path.display(),
                e
            ),
        })?;

        let index_dir = index_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));

        log::debug!(
            "Loaded {} repositories from {}",
            index.repositories.len(),
            index_path.display()
        );

        Ok(Self::new(index_dir, index.repositories))
    }

    pub fn new(index_dir: PathBuf, repositories: Vec<RepositoryDefinition>) -> Self {
        Self {
            index_dir,
            repositories,
        }
    }

    fn resolve_base(&self, repo: &RepositoryDefinition) -> Result<PathBuf> {
        let baseurl = repo.baseurl.trim();

        if baseurl.contains("://") {
            let url = Url::parse(baseurl).map_err(|e| DebugSymError::Config {
                message: format!("Invalid baseurl for {}: {}", repo.id, e),
            })?;

            if url.scheme() != "file" {
                return Err(DebugSymError::Config {
                    message: format!(
                        "Repository {} uses unsupported transport '{}'",
                        repo.id,
                        url.scheme()
                    ),
                });
            }

            return url.to_file_path().map_err(|_| DebugSymError::Config {
                message: format!("Invalid file URL for {}: {}", repo.id, baseurl),
            });
        }

        let path = PathBuf::from(baseurl);
        if path.is_absolute() {
            Ok(path)
        } else {
            Ok(self.index_dir.join(path))
        }
    }

    fn locate(&self, package: &PackageRef) -> Option<(&RepositoryDefinition, &PackageEntry)> {
        self.repositories
            .iter()
            .filter(|repo| package.repo_id.is_empty() || repo.id == package.repo_id)
            .find_map(|repo| {
                repo.packages
                    .iter()
                    .find(|entry| entry.is(package))
                    .map(|entry| (repo, entry))
            })
    }
}

impl PackageBackend for DirectoryBackend {
    fn repositories(&self) -> Vec<Repository> {
        self.repositories
            .iter()
            .map(|repo| Repository::new(repo.id.clone(), repo.enabled))
            .collect()
    }

    fn set_enabled(&mut self, pattern: &Pattern, enabled: bool) -> usize {
        let mut count = 0;
        for repo in self.repositories.iter_mut().filter(|r| pattern.matches(&r.id)) {
            repo.enabled = enabled;
            count += 1;
        }
        count
    }

    fn search(&self, repo_ids: &[String], pattern: &Pattern) -> Result<Vec<PackageRef>> {
        let mut found = Vec::new();

        for repo_id in repo_ids {
            let repo = self
                .repositories
                .iter()
                .find(|r| &r.id == repo_id)
                .ok_or_else(|| DebugSymError::Config {
                    message: format!("Unknown repository: {}", repo_id),
                })?;

            // Surface a bad baseurl here rather than at download time.
            self.resolve_base(repo)?;

            found.extend(
                repo.packages
                    .iter()
                    .map(|entry| entry.to_package_ref(&repo.id))
                    .filter(|pkg| package_matches(pkg, pattern)),
            );
        }

        Ok(found)
    }

    fn download(&self, package: &PackageRef, dest_dir: &Path) -> Result<PathBuf> {
        let download_error = |reason: String| DebugSymError::Download {
            package: package.nvra(),
            reason,
        };

        let (repo, entry) = self
            .locate(package)
            .ok_or_else(|| download_error("package is not present in any repository".to_string()))?;

        let source = self.resolve_base(repo)?.join(&entry.location);
        let file_name = source
            .file_name()
            .ok_or_else(|| download_error(format!("invalid location {}", entry.location)))?
            .to_os_string();

        fs::create_dir_all(dest_dir)
            .map_err(|e| download_error(format!("cannot create {}: {}", dest_dir.display(), e)))?;

        let dest = dest_dir.join(&file_name);
        let mut partial_name = file_name;
        partial_name.push(".part");
        let partial = dest_dir.join(partial_name);

        log::debug!("Copying {} to {}", source.display(), dest.display());

        let transfer = fs::copy(&source, &partial).and_then(|_| fs::rename(&partial, &dest));
        if let Err(e) = transfer {
            let _ = fs::remove_file(&partial);
            return Err(download_error(format!("{}: {}", source.display(), e)));
        }

        Ok(dest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const INDEX: &str = r#"
[[repository]]
id = "repo-debug"
enabled = true
baseurl = "debug"

[[repository.package]]
name = "kernel-debuginfo"
version = "3.10.0"
release = "1160.el7"
arch = "x86_64"
location = "Packages/kernel-debuginfo-3.10.0-1160.el7.x86_64.rpm"
files = ["/usr/lib/debug/lib/modules/3.10.0-1160.el7.x86_64/vmlinux"]

[[repository]]
id = "repo-base"
baseurl = "file:///srv/base"
"#;

    fn write_index(dir: &Path) -> PathBuf {
        let index = dir.join("repos.toml");
        fs::write(&index, INDEX).unwrap();
        let packages = dir.join("debug").join("Packages");
        fs::create_dir_all(&packages).unwrap();
        fs::write(
            packages.join("kernel-debuginfo-3.10.0-1160.el7.x86_64.rpm"),
            b"rpm payload",
        )
        .unwrap();
        index
    }

    #[test]
    fn test_load_index() {
        let temp = TempDir::new().unwrap();
        let backend = DirectoryBackend::load(write_index(temp.path())).unwrap();

        assert_eq!(
            backend.repositories(),
            vec![
                Repository::new("repo-debug", true),
                Repository::new("repo-base", false),
            ]
        );
    }

    #[test]
    fn test_set_enabled_counts_matches() {
        let temp = TempDir::new().unwrap();
        let mut backend = DirectoryBackend::load(write_index(temp.path())).unwrap();

        assert_eq!(backend.set_enabled(&Pattern::new("*").unwrap(), false), 2);
        assert_eq!(backend.set_enabled(&Pattern::new("*base*").unwrap(), true), 1);
        assert_eq!(
            backend.repositories(),
            vec![
                Repository::new("repo-debug", false),
                Repository::new("repo-base", true),
            ]
        );
    }

    #[test]
    fn test_search_and_download() {
        let temp = TempDir::new().unwrap();
        let backend = DirectoryBackend::load(write_index(temp.path())).unwrap();

        let found = backend
            .search(
                &["repo-debug".to_string()],
                &Pattern::new("kernel-debuginfo-*").unwrap(),
            )
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].repo_id, "repo-debug");

        let cache = temp.path().join("cache");
        let local = backend.download(&found[0], &cache).unwrap();
        assert_eq!(fs::read(&local).unwrap(), b"rpm payload");
        assert!(!cache
            .join("kernel-debuginfo-3.10.0-1160.el7.x86_64.rpm.part")
            .exists());
    }

    #[test]
    fn test_download_missing_file_leaves_nothing() {
        let temp = TempDir::new().unwrap();
        let index = write_index(temp.path());
        fs::remove_dir_all(temp.path().join("debug")).unwrap();
        let backend = DirectoryBackend::load(index).unwrap();

        let pkg = PackageRef::new("kernel-debuginfo", "3.10.0", "1160.el7")
            .with_arch("x86_64")
            .with_repo("repo-debug");
        let cache = temp.path().join("cache");

        let result = backend.download(&pkg, &cache);
        assert!(matches!(result, Err(DebugSymError::Download { .. })));
        assert_eq!(fs::read_dir(&cache).unwrap().count(), 0);
    }

    #[test]
    fn test_search_unknown_repository() {
        let temp = TempDir::new().unwrap();
        let backend = DirectoryBackend::load(write_index(temp.path())).unwrap();

        let result = backend.search(&["missing".to_string()], &Pattern::new("*").unwrap());
        assert!(result.is_err());
    }

    #[test]
    fn test_file_url_base() {
        let backend = DirectoryBackend::new(
            PathBuf::from("/etc/debugsym"),
            vec![RepositoryDefinition {
                id: "r".to_string(),
                enabled: true,
                baseurl: "file:///srv/repo".to_string(),
                packages: Vec::new(),
            }],
        );
        assert_eq!(
            backend.resolve_base(&backend.repositories[0]).unwrap(),
            PathBuf::from("/srv/repo")
        );
    }

    #[test]
    fn test_remote_transport_rejected() {
        let backend = DirectoryBackend::new(
            PathBuf::from("."),
            vec![RepositoryDefinition {
                id: "r".to_string(),
                enabled: true,
                baseurl: "https://cdn.example.com/repo".to_string(),
                packages: Vec::new(),
            }],
        );
        assert!(backend
            .search(&["r".to_string()], &Pattern::new("*").unwrap())
            .is_err());
    }
}
