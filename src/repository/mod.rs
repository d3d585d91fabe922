pub mod backend;
pub mod directory;
pub mod downloader;
pub mod locator;
pub mod manager;

pub use backend::{PackageBackend, Repository};
pub use directory::{DirectoryBackend, PackageEntry, RepositoryDefinition, RepositoryIndex};
pub use downloader::PackageDownloader;
pub use locator::PackageLocator;
pub use manager::{ConfiguredRepositories, RepositoryManager};
