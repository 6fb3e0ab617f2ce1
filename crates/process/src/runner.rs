// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! One-shot simplified runner used by the Action Runner: run a command under a shell, aggregate
//! output, and enforce an inactivity timeout rather than a wall-clock one.

use std::os::unix::process::CommandExt as _;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tokio::sync::mpsc;
use tokio::time::Instant;

const DEFAULT_INACTIVITY_TIMEOUT: Duration = Duration::from_secs(60);
const READ_CHUNK: usize = 8192;

/// Fixed non-privileged uid/gid pair the Runner drops to when the container runs as root.
#[derive(Debug, Clone, Copy)]
pub struct RunnerIdentity {
    pub uid: u32,
    pub gid: u32,
}

/// Chown `path` to the Runner's non-privileged identity. Called after the Runner writes a file
/// on behalf of an action, so files on disk match the uid/gid the command itself ran as.
pub fn chown_to(path: &Path, identity: RunnerIdentity) -> std::io::Result<()> {
    nix::unistd::chown(
        path,
        Some(nix::unistd::Uid::from_raw(identity.uid)),
        Some(nix::unistd::Gid::from_raw(identity.gid)),
    )
    .map_err(|errno| std::io::Error::from_raw_os_error(errno as i32))
}

#[derive(Debug, Clone)]
pub struct RunnerConfig {
    pub inactivity_timeout: Duration,
    pub identity: Option<RunnerIdentity>,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self { inactivity_timeout: DEFAULT_INACTIVITY_TIMEOUT, identity: None }
    }
}

#[derive(Debug, Clone)]
pub struct RunResult {
    pub success: bool,
    pub output: String,
    pub error: Option<String>,
}

/// Run `command` under `/bin/sh -c` inside `workspace`. Returns success with aggregated output on
/// exit code 0; otherwise failure, with the inactivity timeout treated the same as a non-zero
/// exit.
pub async fn run_one_shot(workspace: &Path, command: &str, config: &RunnerConfig) -> RunResult {
    let mut cmd = Command::new("/bin/sh");
    cmd.arg("-c")
        .arg(command)
        .current_dir(workspace)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    if let Some(identity) = config.identity {
        cmd.uid(identity.uid);
        cmd.gid(identity.gid);
    }

    let mut child = match cmd.spawn() {
        Ok(child) => child,
        Err(err) => {
            return RunResult { success: false, output: String::new(), error: Some(err.to_string()) }
        }
    };

    let Some(stdout) = child.stdout.take() else {
        return failure_missing_handle(child).await;
    };
    let Some(stderr) = child.stderr.take() else {
        return failure_missing_handle(child).await;
    };

    let (tx, mut rx) = mpsc::unbounded_channel::<Vec<u8>>();
    spawn_pump(stdout, tx.clone());
    spawn_pump(stderr, tx.clone());
    drop(tx);

    let mut output = Vec::new();
    let mut deadline = Instant::now() + config.inactivity_timeout;
    loop {
        tokio::select! {
            chunk = rx.recv() => {
                match chunk {
                    Some(bytes) => {
                        output.extend_from_slice(&bytes);
                        deadline = Instant::now() + config.inactivity_timeout;
                    }
                    None => break,
                }
            }
            _ = tokio::time::sleep_until(deadline) => {
                let _ = child.kill().await;
                let output = String::from_utf8_lossy(&output).into_owned();
                return RunResult {
                    success: false,
                    output,
                    error: Some("process timed out due to inactivity".to_string()),
                };
            }
        }
    }

    let status = match child.wait().await {
        Ok(status) => status,
        Err(err) => {
            let output = String::from_utf8_lossy(&output).into_owned();
            return RunResult { success: false, output, error: Some(err.to_string()) };
        }
    };

    let output = String::from_utf8_lossy(&output).into_owned();
    if status.success() {
        RunResult { success: true, output, error: None }
    } else {
        let code = status.code().map(|c| c.to_string()).unwrap_or_else(|| "signal".to_string());
        RunResult { success: false, output, error: Some(format!("exited with code {code}")) }
    }
}

async fn failure_missing_handle(mut child: tokio::process::Child) -> RunResult {
    let _ = child.kill().await;
    RunResult {
        success: false,
        output: String::new(),
        error: Some("missing stdio handle".to_string()),
    }
}

fn spawn_pump<R>(mut reader: R, tx: mpsc::UnboundedSender<Vec<u8>>)
where
    R: tokio::io::AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut buf = vec![0u8; READ_CHUNK];
        loop {
            match reader.read(&mut buf).await {
                Ok(0) | Err(_) => break,
                Ok(n) => {
                    if tx.send(buf[..n].to_vec()).is_err() {
                        break;
                    }
                }
            }
        }
    });
}

#[cfg(test)]
#[path = "runner_tests.rs"]
mod tests;
