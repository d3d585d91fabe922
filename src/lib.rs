pub mod cli;
pub mod config;
pub mod error;
pub mod extractor;
pub mod package;
pub mod repository;
pub mod ui;

// Public API re-exports
pub use cli::{Cli, OutputFormat};
pub use config::{CliOverrides, Config, DownloadConfig, ExtractionConfig, RepositoryConfig, ToolsConfig};
pub use error::{DebugSymError, Result, UserFriendlyError};
pub use package::PackageRef;

// Core functionality re-exports
pub use extractor::{
    BatchProgress, DebugSymbolExtractor, ExtractedFile, ExtractionRequest, FileExtractor, Manifest,
    PlannedPackage, ProcessPipeline, TempWorkspace,
};
pub use repository::{
    ConfiguredRepositories, DirectoryBackend, PackageBackend, PackageDownloader, PackageLocator,
    RepositoryManager,
};
pub use ui::{GracefulShutdown, OutputFormatter, OutputMode, ProgressManager};

use indicatif::ProgressBar;
use std::path::Path;
use std::time::Instant;
use tokio::task;

/// Main library interface: one configured invocation of the tool.
pub struct DebugSym {
    config: Config,
    output_formatter: OutputFormatter,
    progress_manager: ProgressManager,
    shutdown: GracefulShutdown,
}

impl DebugSym {
    pub fn new(config: Config, output_mode: OutputMode, verbose: u8, quiet: bool) -> Result<Self> {
        let output_formatter = OutputFormatter::new(output_mode, verbose, quiet);
        let progress_manager = ProgressManager::new(!quiet && output_mode == OutputMode::Human);
        let shutdown = GracefulShutdown::new()?;

        Ok(Self {
            config,
            output_formatter,
            progress_manager,
            shutdown,
        })
    }

    /// Create an instance for testing (no signal handler registration)
    #[cfg(test)]
    pub fn new_for_test(config: Config, output_mode: OutputMode) -> Self {
        Self {
            config,
            output_formatter: OutputFormatter::new(output_mode, 0, true),
            progress_manager: ProgressManager::new(false),
            shutdown: GracefulShutdown::new_for_test(),
        }
    }

    pub fn from_cli(cli_args: &Cli) -> Result<Self> {
        let config = cli_args.load_config()?;
        let output_mode = match cli_args.output_format {
            OutputFormat::Human => OutputMode::Human,
            OutputFormat::Json => OutputMode::Json,
            OutputFormat::Plain => OutputMode::Plain,
        };

        Self::new(config, output_mode, cli_args.verbose, cli_args.quiet)
    }

    /// Enable the debug repositories, find packages matching `package_pattern`
    /// and extract the symbol file of each into the configured output root.
    pub async fn extract_kernel_debug_symbols(&self, package_pattern: &str) -> Result<Manifest> {
        let start_time = Instant::now();
        self.shutdown.check_shutdown()?;

        self.output_formatter.start_operation(&format!(
            "Extracting {} from packages matching {}",
            self.config.extraction.symbol_file, package_pattern
        ));

        let progress = self.progress_manager.create_package_progress(0);
        let config = self.config.clone();
        let pattern = package_pattern.to_string();
        let shutdown = self.shutdown.clone();
        let pb = progress.clone();

        let manifest = task::spawn_blocking(move || run_batch(&config, &pattern, shutdown, Some(pb)))
            .await
            .map_err(|e| DebugSymError::Config {
                message: format!("Extraction task failed: {}", e),
            })?;

        let manifest = match manifest {
            Ok(manifest) => manifest,
            Err(e) => {
                progress.abandon();
                return Err(e);
            }
        };

        if manifest.is_empty() && manifest.skipped.is_empty() {
            self.output_formatter
                .warning(&format!("No packages match {}", package_pattern));
        }

        ui::progress::finish_progress_with_summary(
            &progress,
            &format!("Processed {} package(s)", manifest.len() + manifest.skipped.len()),
            start_time.elapsed(),
        );
        self.progress_manager.clear();
        self.output_formatter
            .print_manifest(&manifest, start_time.elapsed());

        Ok(manifest)
    }

    /// List what a run would do without downloading anything.
    pub fn plan(&self, package_pattern: &str) -> Result<Vec<PlannedPackage>> {
        let repositories = open_repositories(&self.config)?;
        let packages = repositories.locator().find(package_pattern);
        let extractor = batch_extractor(&self.config, &repositories);

        let plan = extractor.plan(&packages, &self.config.extraction.output_root);
        if plan.is_empty() {
            self.output_formatter
                .warning(&format!("No packages match {}", package_pattern));
        }
        self.output_formatter
            .print_plan(&plan, &self.config.extraction.output_root);

        Ok(plan)
    }

    pub fn generate_sample_config<P: AsRef<Path>>(output_path: P) -> Result<()> {
        Config::default().save_to_file(output_path)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn handle_error(&self, error: &DebugSymError) {
        self.output_formatter.print_user_friendly_error(error);
    }
}

/// Load the repository index and enable the repositories selected by `config`.
pub fn open_repositories(config: &Config) -> Result<ConfiguredRepositories> {
    let backend = DirectoryBackend::load(&config.repositories.index)?;
    RepositoryManager::new(Box::new(backend))
        .configure(&config.repositories.enable, &config.repositories.disable)
}

fn batch_extractor<'a>(
    config: &Config,
    repositories: &'a ConfiguredRepositories,
) -> DebugSymbolExtractor<'a> {
    let file_extractor = FileExtractor::new(config.tools.clone())
        .with_workspace_root(config.extraction.workspace_root.clone());

    DebugSymbolExtractor::new(
        repositories.downloader(config.download.cache_dir.clone()),
        file_extractor,
    )
    .with_symbol_file(config.extraction.symbol_file.clone())
}

/// Run one batch synchronously: configure repositories, search, then
/// download and extract every match.
pub fn run_batch(
    config: &Config,
    package_pattern: &str,
    shutdown: GracefulShutdown,
    progress: Option<ProgressBar>,
) -> Result<Manifest> {
    let repositories = open_repositories(config)?;

    let mut packages = repositories.locator().find(package_pattern);
    if packages.is_empty() {
        log::info!("No packages match {}", package_pattern);
    }

    let mut extractor = batch_extractor(config, &repositories).with_shutdown(shutdown);
    if let Some(pb) = progress {
        pb.set_length(packages.len() as u64);
        extractor = extractor.with_progress(move |batch: &BatchProgress| {
            ui::progress::update_package_progress(&pb, batch);
        });
    }

    extractor.extract_all(&mut packages, &config.extraction.output_root)
}

pub fn build_info() -> BuildInfo {
    BuildInfo {
        version: env!("CARGO_PKG_VERSION"),
        git_hash: option_env!("GIT_HASH").unwrap_or("unknown"),
        build_date: option_env!("BUILD_DATE").unwrap_or("unknown"),
        target: std::env::consts::ARCH.to_string(),
    }
}

#[derive(Debug, Clone)]
pub struct BuildInfo {
    pub version: &'static str,
    pub git_hash: &'static str,
    pub build_date: &'static str,
    pub target: String,
}

impl std::fmt::Display for BuildInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "debugsym {} ({}) built on {} for {}",
            self.version, self.git_hash, self.build_date, self.target
        )
    }
}
