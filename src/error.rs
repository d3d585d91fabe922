use thiserror::Error;

#[derive(Error, Debug)]
pub enum DebugSymError {
    #[error("No repositories matching {pattern} could be enabled")]
    NoMatchingRepositories { pattern: String },

    #[error("Failed to download {package}: {reason}")]
    Download { package: String, reason: String },

    #[error("Package {package} does not contain {member}")]
    MissingTargetMember { package: String, member: String },

    #[error("Unable to extract {member} from {archive}")]
    ExtractionPipeline {
        archive: String,
        member: String,
        diagnostics: String,
    },

    #[error("Failed to run {program}: {source}")]
    ToolUnavailable {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Output directory {path} is unavailable: {reason}")]
    WorkspaceUnavailable { path: String, reason: String },

    #[error("Invalid pattern {pattern}: {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("IO operation failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Path validation failed: {path}")]
    InvalidPath { path: String },

    #[error("Operation was cancelled by user")]
    Cancelled,
}

impl DebugSymError {
    /// Whether this error aborts a whole batch rather than a single package.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            DebugSymError::Download { .. }
                | DebugSymError::MissingTargetMember { .. }
                | DebugSymError::ExtractionPipeline { .. }
                | DebugSymError::ToolUnavailable { .. }
        )
    }
}

pub trait UserFriendlyError {
    fn user_message(&self) -> String;
    fn suggestion(&self) -> Option<String>;
}

impl UserFriendlyError for DebugSymError {
    fn user_message(&self) -> String {
        match self {
            DebugSymError::NoMatchingRepositories { pattern } => {
                format!(
                    "No repositories matching {} were able to be enabled",
                    pattern
                )
            }
            DebugSymError::Download { package, reason } => {
                format!("Download of {} failed: {}", package, reason)
            }
            DebugSymError::ExtractionPipeline {
                archive,
                member,
                diagnostics,
            } => {
                if diagnostics.trim().is_empty() {
                    format!("Unable to extract {} from {}", member, archive)
                } else {
                    format!(
                        "Unable to extract {} from {}: {}",
                        member,
                        archive,
                        diagnostics.trim()
                    )
                }
            }
            DebugSymError::WorkspaceUnavailable { path, reason } => {
                format!(
                    "Unable to download kernel debug symbols because the cache directory, {}, {}",
                    path, reason
                )
            }
            DebugSymError::Config { message } => {
                format!("Configuration error: {}", message)
            }
            DebugSymError::InvalidPath { path } => {
                format!("Invalid file path: {}", path)
            }
            DebugSymError::Cancelled => "Operation was cancelled by user".to_string(),
            _ => self.to_string(),
        }
    }

    fn suggestion(&self) -> Option<String> {
        match self {
            DebugSymError::NoMatchingRepositories { .. } => Some(
                "Ensure that your system is subscribed to the appropriate software repositories, or adjust --enable-repos.".to_string()
            ),
            DebugSymError::WorkspaceUnavailable { .. } => Some(
                "Create the directory and make it writable, or choose another location with --output.".to_string()
            ),
            DebugSymError::ToolUnavailable { program, .. } => Some(format!(
                "Install {} or point the [tools] section of your configuration at it.",
                program
            )),
            DebugSymError::ExtractionPipeline { .. } => Some(
                "The package may be corrupt; delete it from the download cache and try again.".to_string()
            ),
            DebugSymError::Config { .. } => Some(
                "Check your configuration file syntax and ensure all required fields are present.".to_string()
            ),
            DebugSymError::InvalidPattern { .. } => Some(
                "Patterns use shell glob syntax, e.g. *debug* or kernel-debuginfo-3.10.0*.".to_string()
            ),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, DebugSymError>;

/// Compile a shell glob, keeping the offending pattern in the error.
pub(crate) fn compile_glob(pattern: &str) -> Result<glob::Pattern> {
    glob::Pattern::new(pattern).map_err(|e| DebugSymError::InvalidPattern {
        pattern: pattern.to_string(),
        reason: e.msg.to_string(),
    })
}
