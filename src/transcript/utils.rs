// Subprocess helpers shared by the out-of-process backends

use std::process::{Output, Stdio};
use std::time::Duration;
use thiserror::Error;
use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::debug;

use super::errors::ProviderError;

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("Failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} timed out after {}s", .after.as_secs())]
    Timeout { program: String, after: Duration },

    #[error("I/O error while running {program}: {message}")]
    Io { program: String, message: String },
}

impl From<CommandError> for ProviderError {
    fn from(e: CommandError) -> Self {
        match e {
            CommandError::Timeout { .. } => ProviderError::Transient(e.to_string()),
            CommandError::Spawn { .. } | CommandError::Io { .. } => ProviderError::Internal(e.to_string()),
        }
    }
}

/// Run a command to completion, killing it if it outlives `limit`
pub async fn run_output_with_timeout(
    program: &str,
    args: &[String],
    limit: Duration,
) -> Result<Output, CommandError> {
    debug!(program, ?args, "Spawning subprocess");

    let io_err = |message: String| CommandError::Io {
        program: program.to_string(),
        message,
    };

    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|source| CommandError::Spawn {
            program: program.to_string(),
            source,
        })?;

    let mut stdout_pipe = child
        .stdout
        .take()
        .ok_or_else(|| io_err("stdout was not captured".to_string()))?;
    let mut stderr_pipe = child
        .stderr
        .take()
        .ok_or_else(|| io_err("stderr was not captured".to_string()))?;

    // Drain both pipes while waiting
    let stdout_task = tokio::spawn(async move {
        let mut buf = Vec::new();
        stdout_pipe.read_to_end(&mut buf).await.map(|_| buf)
    });
    let stderr_task = tokio::spawn(async move {
        let mut buf = Vec::new();
        stderr_pipe.read_to_end(&mut buf).await.map(|_| buf)
    });

    match timeout(limit, child.wait()).await {
        Ok(status) => {
            let status = status.map_err(|e| io_err(e.to_string()))?;
            let stdout = stdout_task
                .await
                .map_err(|e| io_err(e.to_string()))?
                .map_err(|e| io_err(e.to_string()))?;
            let stderr = stderr_task
                .await
                .map_err(|e| io_err(e.to_string()))?
                .map_err(|e| io_err(e.to_string()))?;
            Ok(Output { status, stdout, stderr })
        }
        Err(_) => {
            let _ = child.kill().await;
            stdout_task.abort();
            stderr_task.abort();
            Err(CommandError::Timeout {
                program: program.to_string(),
                after: limit,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_binary_is_spawn_error() {
        let err = run_output_with_timeout("definitely-not-a-real-binary-xyz", &[], Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(matches!(err, CommandError::Spawn { .. }));
        assert!(matches!(ProviderError::from(err), ProviderError::Internal(_)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_captures_output() {
        let output = run_output_with_timeout("sh", &["-c".to_string(), "echo out; echo err >&2".to_string()], Duration::from_secs(5))
            .await
            .unwrap();
        assert!(output.status.success());
        assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "out");
        assert_eq!(String::from_utf8_lossy(&output.stderr).trim(), "err");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_timeout_is_transient() {
        let err = run_output_with_timeout("sleep", &["5".to_string()], Duration::from_millis(50))
            .await
            .unwrap_err();
        assert!(matches!(err, CommandError::Timeout { .. }));
        assert!(ProviderError::from(err).is_retryable());
    }
}
