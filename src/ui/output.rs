use crate::error::{DebugSymError, UserFriendlyError};
use crate::extractor::{Manifest, PlannedPackage};
use console::{style, Emoji, Term};
use std::path::Path;
use std::time::Duration;

use super::progress::format_duration;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OutputMode {
    Human,
    Json,
    Plain,
}

static CROSS: Emoji = Emoji("❌ ", "✗ ");
static INFO: Emoji = Emoji("ℹ️  ", "i ");
static WARNING: Emoji = Emoji("⚠️  ", "! ");
static ROCKET: Emoji = Emoji("🚀 ", "> ");

pub struct OutputFormatter {
    mode: OutputMode,
    use_colors: bool,
    verbose_level: u8,
    quiet: bool,
}

impl OutputFormatter {
    pub fn new(mode: OutputMode, verbose: u8, quiet: bool) -> Self {
        let use_colors = match mode {
            OutputMode::Human => Term::stdout().features().colors_supported() && !quiet,
            _ => false,
        };

        Self {
            mode,
            use_colors,
            verbose_level: if quiet { 0 } else { verbose },
            quiet,
        }
    }

    pub fn error(&self, message: &str) {
        match self.mode {
            OutputMode::Human => self.print_human_message(MessageType::Error, message),
            OutputMode::Json => self.print_json_message("error", message),
            OutputMode::Plain => eprintln!("ERROR: {}", message),
        }
    }

    pub fn warning(&self, message: &str) {
        if self.should_show_message(0) {
            match self.mode {
                OutputMode::Human => self.print_human_message(MessageType::Warning, message),
                OutputMode::Json => self.print_json_message("warning", message),
                OutputMode::Plain => eprintln!("WARNING: {}", message),
            }
        }
    }

    pub fn start_operation(&self, operation: &str) {
        if self.should_show_message(0) {
            match self.mode {
                OutputMode::Human => {
                    if self.use_colors {
                        println!("{}{}", ROCKET, style(operation).bold());
                    } else {
                        println!("> {}", operation);
                    }
                }
                OutputMode::Json => self.print_json_message("operation_start", operation),
                OutputMode::Plain => eprintln!("STARTING: {}", operation),
            }
        }
    }

    pub fn print_user_friendly_error(&self, error: &DebugSymError) {
        self.error(&error.user_message());

        if let Some(suggestion) = error.suggestion() {
            match self.mode {
                OutputMode::Human => {
                    eprintln!();
                    if self.use_colors {
                        eprintln!(
                            "{}{}",
                            INFO,
                            style(&format!("Suggestion: {}", suggestion)).cyan()
                        );
                    } else {
                        eprintln!("Suggestion: {}", suggestion);
                    }
                }
                OutputMode::Json => {
                    self.print_json_object(&serde_json::json!({
                        "type": "suggestion",
                        "message": suggestion
                    }));
                }
                OutputMode::Plain => eprintln!("SUGGESTION: {}", suggestion),
            }
        }
    }

    /// Final result of a batch.
    ///
    /// Plain mode prints one extracted path per line on stdout so the output
    /// can be piped; everything else goes to stderr.
    pub fn print_manifest(&self, manifest: &Manifest, elapsed: Duration) {
        match self.mode {
            OutputMode::Human => {
                if !self.quiet {
                    self.print_human_manifest(manifest, elapsed);
                }
            }
            OutputMode::Json => self.print_json_object(&serde_json::json!({
                "type": "manifest",
                "manifest": manifest,
                "duration_ms": elapsed.as_millis() as u64,
                "timestamp": chrono::Utc::now().to_rfc3339()
            })),
            OutputMode::Plain => {
                for path in manifest.paths() {
                    println!("{}", path.display());
                }
                for skipped in manifest.failures() {
                    eprintln!("SKIPPED: {}: {}", skipped.package, skipped.reason);
                }
            }
        }
    }

    pub fn print_plan(&self, plan: &[PlannedPackage], output_root: &Path) {
        match self.mode {
            OutputMode::Human => {
                println!(
                    "{} package(s) would be processed into {}",
                    plan.len(),
                    output_root.display()
                );
                for item in plan {
                    let status = match (&item.member, item.already_extracted) {
                        (None, _) => "no symbol file",
                        (Some(_), true) => "already extracted",
                        (Some(_), false) => "download and extract",
                    };
                    println!("  {} [{}] -> {} ({})", item.package, item.repo_id, item.destination.display(), status);
                }
            }
            OutputMode::Json => self.print_json_object(&serde_json::json!({
                "type": "plan",
                "output_root": output_root,
                "packages": plan
            })),
            OutputMode::Plain => {
                for item in plan.iter().filter(|item| item.member.is_some()) {
                    println!("{}\t{}", item.package, item.destination.display());
                }
            }
        }
    }

    fn should_show_message(&self, min_verbose_level: u8) -> bool {
        !self.quiet && self.verbose_level >= min_verbose_level
    }

    fn print_human_message(&self, msg_type: MessageType, message: &str) {
        if self.use_colors {
            let line = match msg_type {
                MessageType::Error => format!("{}{}", CROSS, style(message).red().bold()),
                MessageType::Warning => format!("{}{}", WARNING, style(message).yellow().bold()),
            };
            eprintln!("{}", line);
        } else {
            let prefix = match msg_type {
                MessageType::Error => "✗",
                MessageType::Warning => "!",
            };
            eprintln!("{} {}", prefix, message);
        }
    }

    fn print_json_message(&self, level: &str, message: &str) {
        self.print_json_object(&serde_json::json!({
            "type": "message",
            "level": level,
            "message": message,
            "timestamp": chrono::Utc::now().to_rfc3339()
        }));
    }

    fn print_json_object(&self, obj: &serde_json::Value) {
        println!(
            "{}",
            serde_json::to_string(obj).unwrap_or_else(|_| "{}".to_string())
        );
    }

    fn print_human_manifest(&self, manifest: &Manifest, elapsed: Duration) {
        println!();
        for entry in &manifest.entries {
            let note = if entry.cached { " (already present)" } else { "" };
            if self.use_colors {
                println!("  {} {}{}", style(&entry.package).bold(), entry.path.display(), style(note).dim());
            } else {
                println!("  {} {}{}", entry.package, entry.path.display(), note);
            }
        }

        let failures: Vec<_> = manifest.failures().collect();
        if !failures.is_empty() {
            println!();
            println!("Skipped:");
            for skipped in &failures {
                println!("  - {}: {}", skipped.package, skipped.reason);
            }
        }

        let without_symbols = manifest.skipped.len() - failures.len();
        println!();
        println!("{}", summary_line(manifest.len(), failures.len(), without_symbols, elapsed));
    }
}

#[derive(Debug, Clone, Copy)]
enum MessageType {
    Error,
    Warning,
}

fn summary_line(extracted: usize, failed: usize, without_symbols: usize, elapsed: Duration) -> String {
    let mut line = format!("{} symbol file(s) available", extracted);
    if failed > 0 {
        line.push_str(&format!(", {} package(s) failed", failed));
    }
    if without_symbols > 0 {
        line.push_str(&format!(", {} without symbols", without_symbols));
    }
    line.push_str(&format!(" in {}", format_duration(elapsed)));
    line
}
