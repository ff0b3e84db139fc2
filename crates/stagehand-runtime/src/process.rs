//! External command execution
//!
//! Every command runs in the project root. Output lines are forwarded to the
//! log as they arrive; the per-run timeout kills the child on expiry.

use std::process::{ExitStatus, Stdio};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use async_trait::async_trait;
use camino::{Utf8Path, Utf8PathBuf};
use stagehand_core::Error;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, BufReader};
use tokio::process::Command;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Runs external programs on behalf of the deployment
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run a program with arguments
    async fn run(&self, program: &str, args: &[&str]) -> Result<()>;

    /// Run `php bin/console -n <args>`
    async fn console(&self, args: &[&str]) -> Result<()>;

    /// Run a shell snippet through `sh -c`
    async fn run_and_tail(&self, script: &str) -> Result<()>;

    /// Run a console command and capture its stdout
    async fn output(&self, args: &[&str]) -> Result<String>;
}

/// [`CommandRunner`] backed by `tokio::process`
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    project_root: Utf8PathBuf,
    php_binary: String,
    timeout: Option<Duration>,
}

impl ProcessRunner {
    pub fn new(project_root: impl Into<Utf8PathBuf>) -> Self {
        Self {
            project_root: project_root.into(),
            php_binary: "php".to_string(),
            timeout: None,
        }
    }

    /// Use `PHP_BINARY` when set, otherwise `php` from `PATH`
    pub fn with_php_from_env(mut self) -> Result<Self> {
        self.php_binary = match std::env::var("PHP_BINARY") {
            Ok(php) if !php.is_empty() => php,
            _ => which::which("php")
                .context("PHP binary not found in PATH (set PHP_BINARY to override)")?
                .to_string_lossy()
                .into_owned(),
        };
        Ok(self)
    }

    pub fn with_php_binary(mut self, php: impl Into<String>) -> Self {
        self.php_binary = php.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn project_root(&self) -> &Utf8Path {
        &self.project_root
    }

    fn console_argv<'a>(&'a self, args: &[&'a str]) -> Vec<&'a str> {
        let mut argv = vec!["bin/console", "-n"];
        argv.extend_from_slice(args);
        argv
    }

    async fn execute(&self, program: &str, args: &[&str], capture: bool) -> Result<String> {
        let command_line = display_command(program, args);
        info!("Start: {}", command_line);
        let started = Instant::now();

        let mut cmd = Command::new(program);
        cmd.args(args)
            .current_dir(&self.project_root)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = cmd
            .spawn()
            .with_context(|| format!("Failed to spawn {}", command_line))?;

        let stdout_task: Option<JoinHandle<String>> = child.stdout.take().map(|stdout| {
            if capture {
                tokio::spawn(read_all(stdout))
            } else {
                tokio::spawn(forward_lines(stdout, false))
            }
        });
        let stderr_task = child
            .stderr
            .take()
            .map(|stderr| tokio::spawn(forward_lines(stderr, true)));

        let status = wait_with_timeout(&mut child, self.timeout, &command_line).await?;

        let stdout = match stdout_task {
            Some(task) => task.await.unwrap_or_default(),
            None => String::new(),
        };
        if let Some(task) = stderr_task {
            let _ = task.await;
        }

        info!(
            "End: {} ({} ms)",
            command_line,
            started.elapsed().as_millis()
        );

        if !status.success() {
            return Err(Error::command_failed(command_line, status.to_string()).into());
        }

        Ok(stdout)
    }
}

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(&self, program: &str, args: &[&str]) -> Result<()> {
        self.execute(program, args, false).await.map(|_| ())
    }

    async fn console(&self, args: &[&str]) -> Result<()> {
        let argv = self.console_argv(args);
        self.execute(&self.php_binary, &argv, false)
            .await
            .map(|_| ())
    }

    async fn run_and_tail(&self, script: &str) -> Result<()> {
        self.execute("sh", &["-c", script], false).await.map(|_| ())
    }

    async fn output(&self, args: &[&str]) -> Result<String> {
        let argv = self.console_argv(args);
        self.execute(&self.php_binary, &argv, true).await
    }
}

async fn wait_with_timeout(
    child: &mut tokio::process::Child,
    timeout: Option<Duration>,
    command_line: &str,
) -> Result<ExitStatus> {
    let Some(limit) = timeout else {
        return child
            .wait()
            .await
            .with_context(|| format!("Failed to wait for {}", command_line));
    };

    match tokio::time::timeout(limit, child.wait()).await {
        Ok(status) => status.with_context(|| format!("Failed to wait for {}", command_line)),
        Err(_) => {
            if let Err(e) = child.kill().await {
                warn!("Failed to kill {} after timeout: {}", command_line, e);
            }
            Err(Error::command_timeout(command_line, limit.as_secs()).into())
        }
    }
}

async fn forward_lines<R>(stream: R, is_stderr: bool) -> String
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let mut lines = BufReader::new(stream).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        if is_stderr {
            warn!("  {}", line);
        } else {
            info!("  {}", line);
        }
    }
    String::new()
}

async fn read_all<R>(mut stream: R) -> String
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let mut buf = String::new();
    if let Err(e) = stream.read_to_string(&mut buf).await {
        debug!("Failed to read command output: {}", e);
    }
    buf
}

/// Human-readable command line for logs and errors
pub fn display_command(program: &str, args: &[&str]) -> String {
    std::iter::once(program)
        .chain(args.iter().copied())
        .map(|part| {
            if part.is_empty() || part.contains(char::is_whitespace) {
                format!("'{}'", part.replace('\'', "'\\''"))
            } else {
                part.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
