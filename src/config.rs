use crate::error::{DebugSymError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub repositories: RepositoryConfig,
    pub extraction: ExtractionConfig,
    pub tools: ToolsConfig,
    pub download: DownloadConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RepositoryConfig {
    /// Repository index file read by the directory backend.
    pub index: PathBuf,
    /// Glob of repository ids to enable.
    pub enable: String,
    /// Glob of repository ids to disable before enabling.
    pub disable: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ExtractionConfig {
    pub output_root: PathBuf,
    pub symbol_file: String,
    pub package_pattern: String,
    /// Parent directory for per-extraction workspaces (system temp dir when unset).
    pub workspace_root: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ToolsConfig {
    pub converter: String,
    pub converter_args: Vec<String>,
    pub unpacker: String,
    pub unpacker_args: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DownloadConfig {
    pub cache_dir: PathBuf,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            index: PathBuf::from("/etc/debugsym/repos.toml"),
            enable: "*debug*".to_string(),
            disable: "*".to_string(),
        }
    }
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            output_root: PathBuf::from("/var/lib/debugsym/kernels"),
            symbol_file: "vmlinux".to_string(),
            package_pattern: "kernel-debuginfo-*".to_string(),
            workspace_root: None,
        }
    }
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            converter: "rpm2cpio".to_string(),
            converter_args: Vec::new(),
            unpacker: "cpio".to_string(),
            unpacker_args: vec!["-id".to_string()],
        }
    }
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            cache_dir: std::env::temp_dir().join("debugsym-packages"),
        }
    }
}

impl Config {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(DebugSymError::Config {
                message: format!("Configuration file not found: {}", path.display()),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| DebugSymError::Config {
            message: format!("Failed to read config file {}: {}", path.display(), e),
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| DebugSymError::Config {
            message: format!("Failed to parse config file {}: {}", path.display(), e),
        })?;

        Ok(config)
    }

    pub fn load_with_defaults<P: AsRef<Path>>(config_path: Option<P>) -> Result<Self> {
        match config_path {
            Some(path) => Self::load_from_file(path),
            None => {
                let default_paths = ["debugsym.toml", ".debugsym.toml"];

                for default_path in &default_paths {
                    if Path::new(default_path).exists() {
                        log::debug!("Using configuration from {}", default_path);
                        return Self::load_from_file(default_path);
                    }
                }

                Ok(Self::default())
            }
        }
    }

    pub fn merge_with_cli_args(&mut self, cli_args: &CliOverrides) {
        if let Some(ref index) = cli_args.index {
            self.repositories.index = index.clone();
        }

        if let Some(ref enable) = cli_args.enable_repos {
            self.repositories.enable = enable.clone();
        }

        if let Some(ref disable) = cli_args.disable_repos {
            self.repositories.disable = disable.clone();
        }

        if let Some(ref output_dir) = cli_args.output_dir {
            self.extraction.output_root = output_dir.clone();
        }

        if let Some(ref symbol_file) = cli_args.symbol_file {
            self.extraction.symbol_file = symbol_file.clone();
        }

        if let Some(ref cache_dir) = cli_args.cache_dir {
            self.download.cache_dir = cache_dir.clone();
        }
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let content = toml::to_string_pretty(self).map_err(|e| DebugSymError::Config {
            message: format!("Failed to serialize config: {}", e),
        })?;

        std::fs::write(path, content).map_err(|e| DebugSymError::Config {
            message: format!("Failed to write config file {}: {}", path.display(), e),
        })?;

        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        // An empty disable pattern is allowed and means "leave everything as is".
        if self.repositories.enable.trim().is_empty() {
            return Err(DebugSymError::Config {
                message: "A repository enable pattern must be specified".to_string(),
            });
        }

        for pattern in [&self.repositories.enable, &self.repositories.disable] {
            if !pattern.is_empty() {
                crate::error::compile_glob(pattern)?;
            }
        }

        let symbol_file = self.extraction.symbol_file.trim();
        if symbol_file.is_empty()
            || symbol_file == "."
            || symbol_file == ".."
            || symbol_file.contains('/')
        {
            return Err(DebugSymError::Config {
                message: format!(
                    "Symbol file must be a plain file name, got '{}'",
                    self.extraction.symbol_file
                ),
            });
        }

        if self.tools.converter.trim().is_empty() || self.tools.unpacker.trim().is_empty() {
            return Err(DebugSymError::Config {
                message: "Both [tools] converter and unpacker must be set".to_string(),
            });
        }

        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct CliOverrides {
    pub index: Option<PathBuf>,
    pub enable_repos: Option<String>,
    pub disable_repos: Option<String>,
    pub output_dir: Option<PathBuf>,
    pub symbol_file: Option<String>,
    pub cache_dir: Option<PathBuf>,
}

impl CliOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_index(mut self, index: Option<PathBuf>) -> Self {
        self.index = index;
        self
    }

    pub fn with_enable_repos(mut self, pattern: Option<String>) -> Self {
        self.enable_repos = pattern;
        self
    }

    pub fn with_disable_repos(mut self, pattern: Option<String>) -> Self {
        self.disable_repos = pattern;
        self
    }

    pub fn with_output_dir(mut self, output_dir: Option<PathBuf>) -> Self {
        self.output_dir = output_dir;
        self
    }

    pub fn with_symbol_file(mut self, symbol_file: Option<String>) -> Self {
        self.symbol_file = symbol_file;
        self
    }

    pub fn with_cache_dir(mut self, cache_dir: Option<PathBuf>) -> Self {
        self.cache_dir = cache_dir;
        self
    }
}
