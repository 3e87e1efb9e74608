//! Completion backends: the external language-model seam.
//!
//! The pipeline executor is backend-agnostic; anything that can turn a
//! persona plus a prompt into text implements [`CompletionBackend`]. The
//! default [`CommandBackend`] dispatches a subprocess from a command
//! template, feeding the prompt on stdin and reading the completion from
//! stdout. This supports any CLI-based model runner (ollama, llm, a
//! vendor CLI, a house script) without coupling to a specific protocol.

use crate::template::{self, ResolveError};
use anyhow::{Context as _, anyhow, bail};
use std::collections::BTreeMap;
use std::io::{Read, Write};
use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};

/// One completion call, assembled by the executor.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    /// Role name of the requesting agent.
    pub role: String,
    /// Persona block (identity, objective, backstory).
    pub system: String,
    /// Task prompt (instruction, dependency context, reference material,
    /// expected output).
    pub prompt: String,
    /// Sampling temperature in [0.0, 1.0].
    pub temperature: f32,
    /// Reasoning-iteration bound.
    pub max_iter: u32,
}

/// A completion provider. Implementations are blocking: the call returns
/// once the full completion is available.
pub trait CompletionBackend {
    fn complete(&self, request: &CompletionRequest) -> anyhow::Result<String>;
}

/// Subprocess-based backend.
///
/// The command is a template with `{role}`, `{temperature}` and
/// `{max_iter}` placeholders, split with shell-words rules. The prompt
/// (system block, blank line, task prompt) is piped on stdin; stdout is
/// the completion.
pub struct CommandBackend {
    command: String,
    environment: BTreeMap<String, String>,
    timeout: Option<Duration>,
}

impl CommandBackend {
    /// Create a backend from a command template.
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            environment: BTreeMap::new(),
            timeout: None,
        }
    }

    /// Kill the subprocess after `timeout` and report an error.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set an environment variable for the subprocess.
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.environment.insert(key.into(), value.into());
        self
    }

    fn render_command(&self, request: &CompletionRequest) -> anyhow::Result<String> {
        let vars = BTreeMap::from([
            ("role".to_string(), request.role.clone()),
            ("temperature".to_string(), request.temperature.to_string()),
            ("max_iter".to_string(), request.max_iter.to_string()),
        ]);

        template::resolve(&self.command, &vars).map_err(|e| match e {
            ResolveError::UnknownPlaceholder { name, .. } => anyhow!(
                "agent command template references undefined variable '{}'\n\
                 Command: {}\n\
                 Available variables: role, temperature, max_iter",
                name,
                self.command
            ),
            other => anyhow!("agent command template is invalid: {}", other),
        })
    }
}

impl CompletionBackend for CommandBackend {
    fn complete(&self, request: &CompletionRequest) -> anyhow::Result<String> {
        let command_str = self.render_command(request)?;

        let args = shell_words::split(&command_str).with_context(|| {
            format!(
                "failed to parse agent command '{}'; check for unmatched quotes",
                command_str
            )
        })?;

        let Some((program, rest)) = args.split_first() else {
            bail!("agent command is empty after parsing: '{}'", command_str);
        };

        let mut command = Command::new(program);
        command
            .args(rest)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        for (key, value) in &self.environment {
            command.env(key, value);
        }

        let mut child = command.spawn().with_context(|| {
            format!(
                "failed to execute agent command '{}'; ensure it is installed and in PATH",
                program
            )
        })?;

        // Feed and capture from dedicated threads so a child that fills a
        // pipe in either direction cannot deadlock the poll loop.
        let input = format!("{}\n\n{}\n", request.system, request.prompt);
        let mut stdin = child.stdin.take().expect("stdin is piped");
        let writer = std::thread::spawn(move || {
            // A child that exits without draining stdin yields a broken
            // pipe; its exit status is the interesting signal then.
            let _ = stdin.write_all(input.as_bytes());
        });

        let stdout = child.stdout.take().expect("stdout is piped");
        let stderr = child.stderr.take().expect("stderr is piped");
        let out_reader = std::thread::spawn(move || read_to_string(stdout));
        let err_reader = std::thread::spawn(move || read_to_string(stderr));

        let started = Instant::now();
        let (exit_code, timed_out) = wait_with_timeout(&mut child, self.timeout)?;

        writer.join().ok();
        let stdout = out_reader.join().unwrap_or_default();
        let stderr = err_reader.join().unwrap_or_default();

        if timed_out {
            bail!(
                "agent command timed out after {:.0?}",
                started.elapsed()
            );
        }

        if exit_code != Some(0) {
            let detail = stderr.trim();
            if detail.is_empty() {
                bail!("agent command exited with status {:?}", exit_code);
            }
            bail!(
                "agent command exited with status {:?}: {}",
                exit_code,
                truncate_detail(detail)
            );
        }

        let output = stdout.trim();
        if output.is_empty() {
            bail!("agent command produced no output");
        }

        Ok(output.to_string())
    }
}

fn read_to_string(mut source: impl Read) -> String {
    let mut buffer = String::new();
    let _ = source.read_to_string(&mut buffer);
    buffer
}

/// Wait for a child process, optionally with a timeout.
///
/// Returns (exit_code, timed_out).
fn wait_with_timeout(
    child: &mut Child,
    timeout: Option<Duration>,
) -> anyhow::Result<(Option<i32>, bool)> {
    let Some(timeout) = timeout else {
        let status = child.wait().context("failed to wait for agent command")?;
        return Ok((status.code(), false));
    };

    let start = Instant::now();
    let poll_interval = Duration::from_millis(100);

    loop {
        match child.try_wait() {
            Ok(Some(status)) => return Ok((status.code(), false)),
            Ok(None) => {
                if start.elapsed() >= timeout {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Ok((None, true));
                }
                std::thread::sleep(poll_interval);
            }
            Err(e) => bail!("failed to check agent command status: {}", e),
        }
    }
}

/// Bound stderr detail carried into error messages.
fn truncate_detail(detail: &str) -> String {
    const MAX: usize = 400;
    let mut chars = detail.chars();
    let head: String = chars.by_ref().take(MAX).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}
