use super::pipeline::ProcessPipeline;
use super::workspace::TempWorkspace;
use crate::config::ToolsConfig;
use crate::error::{DebugSymError, Result};
use std::fs;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

/// Pull one member out of a package archive into `destination`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionRequest {
    pub source_archive: PathBuf,
    /// Path of the member inside the archive; acts as an inclusion filter.
    pub member_pattern: String,
    pub destination: PathBuf,
}

impl ExtractionRequest {
    pub fn new<A, D>(source_archive: A, member_pattern: &str, destination: D) -> Self
    where
        A: Into<PathBuf>,
        D: Into<PathBuf>,
    {
        Self {
            source_archive: source_archive.into(),
            member_pattern: member_pattern.to_string(),
            destination: destination.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedFile {
    pub path: PathBuf,
    /// The destination already existed and nothing was run.
    pub cached: bool,
}

pub struct FileExtractor {
    tools: ToolsConfig,
    workspace_root: Option<PathBuf>,
    buffer_size: usize,
}

impl FileExtractor {
    pub fn new(tools: ToolsConfig) -> Self {
        Self {
            tools,
            workspace_root: None,
            buffer_size: 64 * 1024, // 64KB buffer
        }
    }

    pub fn with_workspace_root(mut self, root: Option<PathBuf>) -> Self {
        self.workspace_root = root;
        self
    }

    /// Extract `request.member_pattern` from `request.source_archive`.
    ///
    /// An existing destination short-circuits without touching the archive.
    /// On failure nothing is written at the destination, and the scratch
    /// workspace is gone whichever way this returns.
    pub fn extract(&self, request: &ExtractionRequest) -> Result<ExtractedFile> {
        validate_destination_path(&request.destination)?;

        if request.destination.exists() {
            log::debug!("{} already extracted", request.destination.display());
            return Ok(ExtractedFile {
                path: request.destination.clone(),
                cached: true,
            });
        }

        let pipeline_error = |diagnostics: String| DebugSymError::ExtractionPipeline {
            archive: request.source_archive.display().to_string(),
            member: request.member_pattern.clone(),
            diagnostics,
        };

        // Resolved before the working directory moves.
        let archive = fs::canonicalize(&request.source_archive)
            .map_err(|e| pipeline_error(e.to_string()))?;

        let destination = if request.destination.is_absolute() {
            request.destination.clone()
        } else {
            std::env::current_dir()?.join(&request.destination)
        };

        let workspace = TempWorkspace::acquire(self.workspace_root.as_deref())?;

        let output = ProcessPipeline::new()
            .with_current_dir(workspace.path())
            .run(&self.converter_argv(&archive), &self.unpacker_argv(&request.member_pattern))?;

        if !output.success() {
            return Err(pipeline_error(output.diagnostics()));
        }

        let unpacked = find_unpacked_member(workspace.path(), &request.member_pattern)
            .ok_or_else(|| {
                pipeline_error(format!(
                    "no file matching {} was unpacked",
                    archive_member_pattern(&request.member_pattern)
                ))
            })?;

        self.promote(&unpacked, &destination)?;

        if let Err(e) = workspace.release() {
            log::warn!("{}", e);
        }

        Ok(ExtractedFile {
            path: request.destination.clone(),
            cached: false,
        })
    }

    fn converter_argv(&self, archive: &Path) -> Vec<String> {
        let mut argv = Vec::with_capacity(self.tools.converter_args.len() + 2);
        argv.push(self.tools.converter.clone());
        argv.extend(self.tools.converter_args.iter().cloned());
        argv.push(archive.to_string_lossy().into_owned());
        argv
    }

    fn unpacker_argv(&self, member_pattern: &str) -> Vec<String> {
        let mut argv = Vec::with_capacity(self.tools.unpacker_args.len() + 2);
        argv.push(self.tools.unpacker.clone());
        argv.extend(self.tools.unpacker_args.iter().cloned());
        argv.push(archive_member_pattern(member_pattern));
        argv
    }

    /// Move the unpacked member to its destination, copying when the
    /// workspace lives on another filesystem.
    fn promote(&self, source: &Path, dest: &Path) -> Result<()> {
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }

        if fs::rename(source, dest).is_ok() {
            return Ok(());
        }

        let mut partial = dest.as_os_str().to_os_string();
        partial.push(".part");
        let partial = PathBuf::from(partial);

        let copied = self
            .copy_file_with_buffer(source, &partial)
            .and_then(|_| fs::rename(&partial, dest).map_err(DebugSymError::Io));

        if copied.is_err() {
            let _ = fs::remove_file(&partial);
        }
        copied
    }

    fn copy_file_with_buffer(&self, source: &Path, dest: &Path) -> Result<u64> {
        let source_file = fs::File::open(source)?;
        let dest_file = fs::File::create(dest)?;

        let mut reader = BufReader::with_capacity(self.buffer_size, source_file);
        let mut writer = BufWriter::with_capacity(self.buffer_size, dest_file);

        let mut total_bytes = 0u64;
        let mut buffer = vec![0u8; 8192];

        loop {
            let bytes_read = reader.read(&mut buffer)?;
            if bytes_read == 0 {
                break;
            }
            writer.write_all(&buffer[..bytes_read])?;
            total_bytes += bytes_read as u64;
        }

        writer.flush()?;

        if let Ok(modified_time) = fs::metadata(source).and_then(|m| m.modified()) {
            let _ = filetime::set_file_mtime(dest, filetime::FileTime::from_system_time(modified_time));
        }

        Ok(total_bytes)
    }
}

/// Inclusion pattern handed to the unpacker. Package payloads store members
/// relative to `.`, so `/usr/lib/debug/vmlinux` becomes `./usr/lib/debug/vmlinux`.
pub fn archive_member_pattern(member: &str) -> String {
    if member.starts_with("./") {
        member.to_string()
    } else if member.starts_with('/') {
        format!(".{}", member)
    } else {
        format!("./{}", member)
    }
}

/// Where the unpacker left `member` inside `workspace`.
fn find_unpacked_member(workspace: &Path, member: &str) -> Option<PathBuf> {
    let relative = member.trim_start_matches("./").trim_start_matches('/');
    let expected = workspace.join(relative);
    if expected.is_file() {
        return Some(expected);
    }

    // The pattern may be a glob; take the first unpacked file whose name fits.
    let name = Path::new(relative).file_name()?.to_string_lossy().into_owned();
    let name_pattern = glob::Pattern::new(&name).ok();

    WalkDir::new(workspace)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .find(|entry| {
            let file_name = entry.file_name().to_string_lossy();
            match name_pattern {
                Some(ref pattern) => pattern.matches(&file_name),
                None => file_name == name,
            }
        })
        .map(|entry| entry.into_path())
}

pub fn validate_destination_path(path: &Path) -> Result<()> {
    let path_str = path.to_string_lossy();

    if path.components().any(|c| matches!(c, Component::ParentDir)) {
        return Err(DebugSymError::InvalidPath {
            path: format!("Directory traversal not allowed: {}", path_str),
        });
    }

    if path_str.len() > 4096 {
        return Err(DebugSymError::InvalidPath {
            path: format!("Path too long: {} characters", path_str.len()),
        });
    }

    if path.file_name().is_none() {
        return Err(DebugSymError::InvalidPath {
            path: format!("Destination has no file name: {}", path_str),
        });
    }

    Ok(())
}

/// Make a package identifier safe to use as a single directory name.
pub fn sanitize_filename(name: &str) -> String {
    let mut sanitized = String::new();

    for ch in name.chars() {
        match ch {
            '<' | '>' | ':' | '"' | '|' | '?' | '*' => sanitized.push('_'),
            '/' | '\\' => sanitized.push('_'),
            c if c.is_control() => sanitized.push('_'),
            c => sanitized.push(c),
        }
    }

    let sanitized = sanitized
        .trim_start_matches('.')
        .trim_end_matches(&['.', ' '][..])
        .to_string();

    if sanitized.is_empty() {
        "unnamed_package".to_string()
    } else {
        sanitized
    }
}
