use crate::error::DebugSymError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Result of a batch: one entry per package whose symbol file is on disk,
/// plus the packages that were skipped and why.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub entries: Vec<ManifestEntry>,
    pub skipped: Vec<SkippedPackage>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub package: String,
    pub path: PathBuf,
    /// Found from an earlier run rather than extracted now.
    #[serde(default)]
    pub cached: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedPackage {
    pub package: String,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SkipReason {
    DownloadFailed { message: String },
    NoSymbolFile { file: String },
    ExtractionFailed { message: String, diagnostics: String },
    Failed { message: String },
}

impl From<&DebugSymError> for SkipReason {
    fn from(error: &DebugSymError) -> Self {
        match error {
            DebugSymError::Download { reason, .. } => SkipReason::DownloadFailed {
                message: reason.clone(),
            },
            DebugSymError::MissingTargetMember { member, .. } => SkipReason::NoSymbolFile {
                file: member.clone(),
            },
            DebugSymError::ExtractionPipeline { diagnostics, .. } => SkipReason::ExtractionFailed {
                message: error.to_string(),
                diagnostics: diagnostics.clone(),
            },
            DebugSymError::ToolUnavailable { .. } => SkipReason::ExtractionFailed {
                message: error.to_string(),
                diagnostics: String::new(),
            },
            other => SkipReason::Failed {
                message: other.to_string(),
            },
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::DownloadFailed { message } => write!(f, "download failed: {}", message),
            SkipReason::NoSymbolFile { file } => write!(f, "no {} in package", file),
            SkipReason::ExtractionFailed {
                message,
                diagnostics,
            } => {
                if diagnostics.trim().is_empty() {
                    write!(f, "{}", message)
                } else {
                    write!(f, "{} ({})", message, diagnostics.trim())
                }
            }
            SkipReason::Failed { message } => f.write_str(message),
        }
    }
}

impl Manifest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record<S: Into<String>>(&mut self, package: S, path: PathBuf, cached: bool) {
        self.entries.push(ManifestEntry {
            package: package.into(),
            path,
            cached,
        });
    }

    pub fn skip<S: Into<String>>(&mut self, package: S, reason: SkipReason) {
        self.skipped.push(SkippedPackage {
            package: package.into(),
            reason,
        });
    }

    /// Number of successfully extracted packages.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn paths(&self) -> impl Iterator<Item = &PathBuf> {
        self.entries.iter().map(|entry| &entry.path)
    }

    /// Packages that failed for a reason other than simply not shipping
    /// the symbol file.
    pub fn failures(&self) -> impl Iterator<Item = &SkippedPackage> {
        self.skipped
            .iter()
            .filter(|s| !matches!(s.reason, SkipReason::NoSymbolFile { .. }))
    }
}
