use crate::config::{CliOverrides, Config};
use crate::error::Result;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "debugsym")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Fetch kernel debuginfo packages and extract their symbol images")]
#[command(
    long_about = "debugsym enables the matching debuginfo repositories, finds the kernel \
                  debuginfo packages you ask for, downloads them and extracts vmlinux into \
                  one directory per kernel build. Packages that were already extracted are \
                  not downloaded again."
)]
#[command(after_help = "EXAMPLES:\n  \
    debugsym\n  \
    debugsym 'kernel-debuginfo-3.10.0-1160*' --output /srv/kernels\n  \
    debugsym --enable-repos 'rhel-7-*-debug-rpms' --index repos.toml\n  \
    debugsym --dry-run --output-format json\n  \
    debugsym --generate-config --config debugsym.toml")]
pub struct Cli {
    /// Package glob matched against name, name-version, nvr and nvra
    pub package_pattern: Option<String>,

    /// Directory receiving one sub-directory per extracted kernel
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Glob of repository ids to enable
    #[arg(short, long)]
    pub enable_repos: Option<String>,

    /// Glob of repository ids to disable first (empty string to keep them all)
    #[arg(short, long)]
    pub disable_repos: Option<String>,

    /// Repository index file
    #[arg(short, long, env = "DEBUGSYM_INDEX")]
    pub index: Option<PathBuf>,

    /// Directory downloaded packages are stored in
    #[arg(long)]
    pub cache_dir: Option<PathBuf>,

    /// Name of the file to extract from each package
    #[arg(long)]
    pub symbol_file: Option<String>,

    /// Configuration file path
    #[arg(short, long, help = "Path to TOML configuration file")]
    pub config: Option<PathBuf>,

    /// Output format for results
    #[arg(long, value_enum, default_value_t = OutputFormat::Human)]
    pub output_format: OutputFormat,

    /// Verbose output level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (suppress non-essential output)
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Dry run (show what would be done without executing)
    #[arg(long, help = "List matching packages and destinations without downloading")]
    pub dry_run: bool,

    /// Generate sample configuration file
    #[arg(long, help = "Generate a sample configuration file")]
    pub generate_config: bool,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable colored output
    Human,
    /// JSON formatted output
    Json,
    /// One extracted path per line
    Plain,
}

impl Cli {
    pub fn load_config(&self) -> Result<Config> {
        let mut config = Config::load_with_defaults(self.config.as_ref())?;

        config.merge_with_cli_args(&self.create_cli_overrides());
        config.validate()?;
        crate::error::compile_glob(self.package_pattern(&config))?;

        Ok(config)
    }

    pub fn create_cli_overrides(&self) -> CliOverrides {
        CliOverrides::new()
            .with_index(self.index.clone())
            .with_enable_repos(self.enable_repos.clone())
            .with_disable_repos(self.disable_repos.clone())
            .with_output_dir(self.output.clone())
            .with_symbol_file(self.symbol_file.clone())
            .with_cache_dir(self.cache_dir.clone())
    }

    /// The pattern from the command line, or the configured default.
    pub fn package_pattern<'a>(&'a self, config: &'a Config) -> &'a str {
        self.package_pattern
            .as_deref()
            .unwrap_or(&config.extraction.package_pattern)
    }

    /// Default `env_logger` filter for the chosen verbosity.
    pub fn log_filter(&self) -> &'static str {
        if self.quiet {
            return "error";
        }
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}
