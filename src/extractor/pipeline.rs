use crate::error::{DebugSymError, Result};
use std::io::Read;
use std::path::PathBuf;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;

/// Outcome of a two-stage pipeline. A non-zero exit is data, not an error.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub producer_status: ExitStatus,
    pub status: ExitStatus,
    pub stdout: Vec<u8>,
    pub stderr: String,
    pub producer_stderr: String,
}

impl PipelineOutput {
    /// The consuming stage decides success.
    pub fn success(&self) -> bool {
        self.status.success()
    }

    /// Diagnostics from both stages, consumer first.
    pub fn diagnostics(&self) -> String {
        let mut text = String::new();
        if !self.stderr.trim().is_empty() {
            text.push_str(self.stderr.trim_end());
        }
        if !self.producer_stderr.trim().is_empty() {
            if !text.is_empty() {
                text.push('\n');
            }
            text.push_str(self.producer_stderr.trim_end());
        }
        if text.is_empty() && !self.success() {
            text = format!("exited with {}", self.status);
        }
        text
    }
}

/// Runs `stage_a | stage_b` without a shell: each stage is a discrete argv
/// and stage A's stdout is handed straight to stage B's stdin.
#[derive(Debug, Default)]
pub struct ProcessPipeline {
    current_dir: Option<PathBuf>,
}

impl ProcessPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_current_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.current_dir = Some(dir.into());
        self
    }

    /// Run both stages to completion.
    ///
    /// Fails only when a program cannot be started.
    pub fn run<A, B>(&self, stage_a: &[A], stage_b: &[B]) -> Result<PipelineOutput>
    where
        A: AsRef<str>,
        B: AsRef<str>,
    {
        let mut producer_cmd = self.command(stage_a)?;
        let mut consumer_cmd = self.command(stage_b)?;

        log::debug!("Running {} | {}", display_argv(stage_a), display_argv(stage_b));

        let mut producer = producer_cmd
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| DebugSymError::ToolUnavailable {
                program: stage_a[0].as_ref().to_string(),
                source: e,
            })?;

        let producer_stdout = match producer.stdout.take() {
            Some(stdout) => stdout,
            None => {
                reap(&mut producer);
                return Err(DebugSymError::ToolUnavailable {
                    program: stage_a[0].as_ref().to_string(),
                    source: std::io::Error::other("stdout was not captured"),
                });
            }
        };

        // Drained on its own thread so a chatty producer cannot block the pipe.
        let producer_stderr = producer.stderr.take().map(|mut stderr| {
            thread::spawn(move || {
                let mut buf = String::new();
                let _ = stderr.read_to_string(&mut buf);
                buf
            })
        });

        let consumer = consumer_cmd
            .stdin(Stdio::from(producer_stdout))
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn();
        // Close the parent's copy of the pipe so the producer sees EOF/EPIPE
        // as soon as the consumer exits.
        drop(consumer_cmd);

        let consumer = match consumer {
            Ok(child) => child,
            Err(e) => {
                reap(&mut producer);
                return Err(DebugSymError::ToolUnavailable {
                    program: stage_b[0].as_ref().to_string(),
                    source: e,
                });
            }
        };

        let output = consumer.wait_with_output()?;
        let producer_status = producer.wait()?;
        let producer_stderr = producer_stderr
            .and_then(|handle| handle.join().ok())
            .unwrap_or_default();

        Ok(PipelineOutput {
            producer_status,
            status: output.status,
            stdout: output.stdout,
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            producer_stderr,
        })
    }

    fn command<S: AsRef<str>>(&self, argv: &[S]) -> Result<Command> {
        let (program, args) = argv.split_first().ok_or_else(|| DebugSymError::Config {
            message: "Pipeline stage has an empty argument vector".to_string(),
        })?;

        let mut cmd = Command::new(program.as_ref());
        cmd.args(args.iter().map(AsRef::as_ref));
        if let Some(ref dir) = self.current_dir {
            cmd.current_dir(dir);
        }
        Ok(cmd)
    }
}

fn reap(child: &mut Child) {
    let _ = child.kill();
    let _ = child.wait();
}

fn display_argv<S: AsRef<str>>(argv: &[S]) -> String {
    argv.iter().map(AsRef::as_ref).collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stdout_flows_between_stages() {
        let output = ProcessPipeline::new()
            .run(&["printf", "hello pipeline"], &["cat"])
            .unwrap();

        assert!(output.success());
        assert_eq!(output.stdout, b"hello pipeline");
    }

    #[test]
    fn test_arguments_are_not_shell_interpreted() {
        let hostile = "$(id); a | b && c > out";
        let output = ProcessPipeline::new()
            .run(&["printf", "%s", hostile], &["cat"])
            .unwrap();

        assert!(output.success());
        assert_eq!(String::from_utf8_lossy(&output.stdout), hostile);
    }

    #[test]
    fn test_nonzero_exit_is_not_an_error() {
        let output = ProcessPipeline::new()
            .run(&["printf", "data"], &["sh", "-c", "cat >/dev/null; echo broken archive >&2; exit 3"])
            .unwrap();

        assert!(!output.success());
        assert_eq!(output.status.code(), Some(3));
        assert!(output.diagnostics().contains("broken archive"));
    }

    #[test]
    fn test_producer_diagnostics_are_captured() {
        let output = ProcessPipeline::new()
            .run(&["sh", "-c", "echo not an rpm >&2; exit 1"], &["cat"])
            .unwrap();

        assert!(output.success());
        assert!(!output.producer_status.success());
        assert!(output.diagnostics().contains("not an rpm"));
    }

    #[test]
    fn test_missing_program() {
        let result = ProcessPipeline::new().run(&["printf", "x"], &["debugsym-no-such-tool"]);
        assert!(matches!(
            result,
            Err(DebugSymError::ToolUnavailable { ref program, .. }) if program == "debugsym-no-such-tool"
        ));

        let result = ProcessPipeline::new().run(&["debugsym-no-such-tool"], &["cat"]);
        assert!(matches!(result, Err(DebugSymError::ToolUnavailable { .. })));
    }

    #[test]
    fn test_empty_stage_rejected() {
        let empty: [&str; 0] = [];
        assert!(ProcessPipeline::new().run(&empty, &["cat"]).is_err());
    }

    #[test]
    fn test_current_dir() {
        let dir = tempfile::TempDir::new().unwrap();
        let output = ProcessPipeline::new()
            .with_current_dir(dir.path())
            .run(&["printf", "x"], &["sh", "-c", "cat > marker"])
            .unwrap();

        assert!(output.success());
        assert!(dir.path().join("marker").exists());
    }
}
