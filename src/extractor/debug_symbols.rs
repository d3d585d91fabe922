use super::file_extractor::{sanitize_filename, ExtractedFile, ExtractionRequest, FileExtractor};
use super::manifest::{Manifest, SkipReason};
use crate::error::{DebugSymError, Result};
use crate::package::PackageRef;
use crate::repository::PackageDownloader;
use crate::ui::GracefulShutdown;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct BatchProgress {
    pub packages_processed: usize,
    pub total_packages: usize,
    pub current_package: Option<String>,
    pub start_time: Instant,
    pub failures: usize,
}

impl BatchProgress {
    pub fn new(total_packages: usize) -> Self {
        Self {
            packages_processed: 0,
            total_packages,
            current_package: None,
            start_time: Instant::now(),
            failures: 0,
        }
    }

    pub fn start_package(&mut self, package: String) {
        self.current_package = Some(package);
    }

    pub fn finish_package(&mut self, failed: bool) {
        self.packages_processed += 1;
        if failed {
            self.failures += 1;
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    pub fn estimated_remaining(&self) -> Duration {
        if self.packages_processed == 0 {
            return Duration::from_secs(0);
        }

        let rate = self.packages_processed as f64 / self.elapsed().as_secs_f64();
        let remaining = self.total_packages.saturating_sub(self.packages_processed);

        if rate > 0.0 {
            Duration::from_secs_f64(remaining as f64 / rate)
        } else {
            Duration::from_secs(0)
        }
    }
}

/// What a batch would do with one package, without touching the network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedPackage {
    pub package: String,
    pub repo_id: String,
    /// Archive member holding the symbol file, if the package has one.
    pub member: Option<String>,
    pub destination: PathBuf,
    pub already_extracted: bool,
}

/// Downloads kernel debuginfo packages and extracts their symbol image into
/// `output_root/<name-version-release>/<symbol_file>`.
pub struct DebugSymbolExtractor<'a> {
    downloader: PackageDownloader<'a>,
    extractor: FileExtractor,
    symbol_file: String,
    progress_callback: Option<Box<dyn Fn(&BatchProgress) + 'a>>,
    shutdown: Option<GracefulShutdown>,
}

impl<'a> DebugSymbolExtractor<'a> {
    pub fn new(downloader: PackageDownloader<'a>, extractor: FileExtractor) -> Self {
        Self {
            downloader,
            extractor,
            symbol_file: "vmlinux".to_string(),
            progress_callback: None,
            shutdown: None,
        }
    }

    pub fn with_symbol_file<S: Into<String>>(mut self, symbol_file: S) -> Self {
        self.symbol_file = symbol_file.into();
        self
    }

    pub fn with_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(&BatchProgress) + 'a,
    {
        self.progress_callback = Some(Box::new(callback));
        self
    }

    pub fn with_shutdown(mut self, shutdown: GracefulShutdown) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    /// Where the symbol file of `package` lands under `output_root`.
    pub fn destination_for(&self, package: &PackageRef, output_root: &Path) -> PathBuf {
        output_root
            .join(sanitize_filename(&package.nvr()))
            .join(&self.symbol_file)
    }

    pub fn plan(&self, packages: &[PackageRef], output_root: &Path) -> Vec<PlannedPackage> {
        packages
            .iter()
            .map(|package| {
                let destination = self.destination_for(package, output_root);
                PlannedPackage {
                    package: package.nvr(),
                    repo_id: package.repo_id.clone(),
                    member: package.find_file(&self.symbol_file).map(str::to_string),
                    already_extracted: destination.exists(),
                    destination,
                }
            })
            .collect()
    }

    /// Process `packages` one after another.
    ///
    /// Only an unusable `output_root` or a user interrupt fails the batch;
    /// every per-package problem is logged, recorded in
    /// [`Manifest::skipped`] and the batch moves on.
    pub fn extract_all(&self, packages: &mut [PackageRef], output_root: &Path) -> Result<Manifest> {
        let mut manifest = Manifest::new();
        if packages.is_empty() {
            return Ok(manifest);
        }

        check_output_root(output_root)?;

        let mut progress = BatchProgress::new(packages.len());

        for package in packages.iter_mut() {
            if let Some(ref shutdown) = self.shutdown {
                shutdown.check_shutdown()?;
            }

            let id = package.nvr();
            progress.start_package(id.clone());
            self.report(&progress);

            match self.extract_one(package, output_root) {
                Ok(extracted) => {
                    if extracted.cached {
                        log::info!("{}: already extracted to {}", id, extracted.path.display());
                    } else {
                        log::info!("{}: extracted {}", id, extracted.path.display());
                    }
                    manifest.record(id, extracted.path, extracted.cached);
                    progress.finish_package(false);
                }
                Err(e) => {
                    match e {
                        DebugSymError::MissingTargetMember { .. } => {
                            log::info!("{}: nothing to extract ({})", id, e)
                        }
                        // Not a package problem, but still confined to this package.
                        ref e if e.is_fatal() => log::error!("{}: skipped: {}", id, e),
                        _ => log::warn!("{}: skipped: {}", id, e),
                    }
                    manifest.skip(id, SkipReason::from(&e));
                    progress.finish_package(true);
                }
            }
        }

        progress.current_package = None;
        self.report(&progress);

        Ok(manifest)
    }

    fn extract_one(&self, package: &mut PackageRef, output_root: &Path) -> Result<ExtractedFile> {
        // Member and destination both come from repository metadata, so a
        // package without the symbol file, or one already extracted, is
        // settled here without downloading it.
        let member = package
            .find_file(&self.symbol_file)
            .map(str::to_string)
            .ok_or_else(|| DebugSymError::MissingTargetMember {
                package: package.nvr(),
                member: self.symbol_file.clone(),
            })?;

        let destination = self.destination_for(package, output_root);
        if destination.exists() {
            return Ok(ExtractedFile {
                path: destination,
                cached: true,
            });
        }

        let local_path = self.downloader.download(package)?;
        self.extractor
            .extract(&ExtractionRequest::new(local_path, &member, destination))
    }

    fn report(&self, progress: &BatchProgress) {
        if let Some(ref callback) = self.progress_callback {
            callback(progress);
        }
    }
}

/// `output_root` must be an existing, writable directory.
pub fn check_output_root(output_root: &Path) -> Result<()> {
    check_output_root_with(output_root, create_scratch_file)
}

/// Writability is decided by `write_test`, which must leave nothing behind.
fn check_output_root_with<F>(output_root: &Path, write_test: F) -> Result<()>
where
    F: FnOnce(&Path) -> std::io::Result<()>,
{
    let unavailable = |reason: &str| DebugSymError::WorkspaceUnavailable {
        path: output_root.display().to_string(),
        reason: reason.to_string(),
    };

    let metadata = fs::metadata(output_root).map_err(|_| unavailable("does not exist"))?;
    if !metadata.is_dir() {
        return Err(unavailable("is not a directory"));
    }

    write_test(output_root).map_err(|e| {
        log::debug!("write test in {} failed: {}", output_root.display(), e);
        unavailable("is not writeable")
    })
}

fn create_scratch_file(dir: &Path) -> std::io::Result<()> {
    tempfile::Builder::new()
        .prefix(".debugsym-")
        .tempfile_in(dir)
        .map(drop)
}
