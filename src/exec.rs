use async_trait::async_trait;
use std::path::Path;
use std::process::{Output, Stdio};

/// Seam for everything that shells out (git, gh). Implemented by
/// [`SystemRunner`] in production; tests substitute scripted runners so
/// no real subprocess is spawned.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run `program` with `args`, optionally in `cwd`, capturing output.
    /// An Err means the process could not be spawned at all; a non-zero
    /// exit lands in `Output::status`.
    async fn run(&self, program: &str, args: &[&str], cwd: Option<&Path>)
        -> std::io::Result<Output>;
}

/// Runs commands on the host via tokio's process support.
pub struct SystemRunner;

#[async_trait]
impl CommandRunner for SystemRunner {
    async fn run(
        &self,
        program: &str,
        args: &[&str],
        cwd: Option<&Path>,
    ) -> std::io::Result<Output> {
        let mut cmd = tokio::process::Command::new(program);
        cmd.args(args);
        if let Some(dir) = cwd {
            cmd.current_dir(dir);
        }
        cmd.stdout(Stdio::piped()).stderr(Stdio::piped());
        cmd.output().await
    }
}

/// Captured stdout as trimmed UTF-8 (lossy).
pub fn stdout_str(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

/// Captured stderr as trimmed UTF-8 (lossy).
pub fn stderr_str(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_system_runner_captures_stdout() {
        let output = SystemRunner
            .run("git", &["--version"], None)
            .await
            .unwrap();
        assert!(output.status.success());
        assert!(stdout_str(&output).starts_with("git version"));
    }

    #[tokio::test]
    async fn test_system_runner_missing_program_is_spawn_error() {
        let result = SystemRunner
            .run("definitely-not-a-real-binary", &[], None)
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_system_runner_respects_cwd() {
        let dir = tempfile::tempdir().unwrap();
        let output = SystemRunner
            .run("git", &["init"], Some(dir.path()))
            .await
            .unwrap();
        assert!(output.status.success());
        assert!(dir.path().join(".git").exists());
    }
}
