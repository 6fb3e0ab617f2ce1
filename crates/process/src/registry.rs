// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Process Registry: one entry per live child process, independent of whether anyone is
//! subscribed to its output.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use agent8_core::{ConnectionId, Pid};
use nix::sys::signal::{self, Signal};
use parking_lot::RwLock;
use tokio::io::AsyncReadExt;
use tokio::process::{ChildStdin, Command};
use tokio::sync::{mpsc, Mutex as AsyncMutex};

use crate::error::ProcessError;

const READ_CHUNK: usize = 8192;
const KILL_GRACE: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub enum ProcessEventKind {
    Stdout(Vec<u8>),
    Stderr(Vec<u8>),
    Exit(Option<i32>),
}

#[derive(Debug, Clone)]
pub struct ProcessEvent {
    pub pid: Pid,
    pub kind: ProcessEventKind,
}

struct ProcessRecord {
    stdin: Arc<AsyncMutex<ChildStdin>>,
    subscribers: Arc<RwLock<HashSet<ConnectionId>>>,
}

/// Registry of live child processes. Cheaply cloneable; every clone shares the same underlying
/// map and event channel.
#[derive(Clone)]
pub struct ProcessRegistry {
    records: Arc<parking_lot::Mutex<HashMap<Pid, ProcessRecord>>>,
    events_tx: mpsc::UnboundedSender<ProcessEvent>,
}

impl ProcessRegistry {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ProcessEvent>) {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        (Self { records: Arc::new(parking_lot::Mutex::new(HashMap::new())), events_tx }, events_rx)
    }

    /// Launch a child with piped stdio under `workspace`, and register it. stdout/stderr are
    /// fanned out as they arrive; the exit status is always collected by a dedicated reaper task
    /// even if nobody is subscribed.
    pub async fn spawn(
        &self,
        workspace: &Path,
        command: &str,
        args: &[String],
    ) -> Result<Pid, ProcessError> {
        let mut cmd = Command::new(command);
        cmd.args(args)
            .current_dir(workspace)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(false);

        let mut child = cmd.spawn().map_err(|e| ProcessError::SpawnFailed(e.to_string()))?;
        let raw_pid = child
            .id()
            .ok_or_else(|| ProcessError::SpawnFailed("process exited immediately".to_string()))?;
        let pid = Pid::from(raw_pid);

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| ProcessError::SpawnFailed("missing stdin handle".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| ProcessError::SpawnFailed("missing stdout handle".to_string()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| ProcessError::SpawnFailed("missing stderr handle".to_string()))?;

        let subscribers = Arc::new(RwLock::new(HashSet::new()));
        self.records.lock().insert(
            pid,
            ProcessRecord { stdin: Arc::new(AsyncMutex::new(stdin)), subscribers: subscribers.clone() },
        );

        spawn_reader(pid, stdout, subscribers.clone(), self.events_tx.clone(), true);
        spawn_reader(pid, stderr, subscribers.clone(), self.events_tx.clone(), false);
        self.spawn_reaper(pid, child, subscribers);

        tracing::info!(%pid, command, "process spawned");
        Ok(pid)
    }

    fn spawn_reaper(
        &self,
        pid: Pid,
        mut child: tokio::process::Child,
        subscribers: Arc<RwLock<HashSet<ConnectionId>>>,
    ) {
        let records = self.records.clone();
        let events_tx = self.events_tx.clone();
        tokio::spawn(async move {
            let status = child.wait().await;
            let code = status.ok().and_then(|s| s.code());
            if !subscribers.read().is_empty() {
                let _ = events_tx.send(ProcessEvent { pid, kind: ProcessEventKind::Exit(code) });
            }
            records.lock().remove(&pid);
            tracing::info!(%pid, exit_code = ?code, "process exited");
        });
    }

    /// Add `connection` to the set of subscribers for `pid`. No-op if the pid no longer exists
    /// (the process may have already exited).
    pub fn subscribe(&self, pid: Pid, connection: ConnectionId) {
        if let Some(record) = self.records.lock().get(&pid) {
            record.subscribers.write().insert(connection);
        }
    }

    /// Remove `connection` from every process record's subscriber set. Called on disconnect.
    /// Process records themselves are never removed by this — only watchers tear down on an
    /// empty subscriber set.
    pub fn unsubscribe_connection(&self, connection: ConnectionId) {
        for record in self.records.lock().values() {
            record.subscribers.write().remove(&connection);
        }
    }

    pub async fn input(&self, pid: Pid, data: &[u8]) -> Result<(), ProcessError> {
        let stdin = {
            let records = self.records.lock();
            records.get(&pid).map(|r| r.stdin.clone())
        };
        let stdin = stdin.ok_or(ProcessError::NotFound)?;
        use tokio::io::AsyncWriteExt;
        stdin.lock().await.write_all(data).await?;
        Ok(())
    }

    /// Signal termination and remove the record. The underlying reaper task still runs to
    /// completion independently (it discards events once the record is gone).
    pub fn kill(&self, pid: Pid) -> Result<(), ProcessError> {
        if self.records.lock().remove(&pid).is_none() {
            return Err(ProcessError::NotFound);
        }
        let nix_pid = nix::unistd::Pid::from_raw(pid.0 as i32);
        let _ = signal::kill(nix_pid, Signal::SIGTERM);

        tokio::spawn(async move {
            tokio::time::sleep(KILL_GRACE).await;
            let _ = signal::kill(nix_pid, Signal::SIGKILL);
        });
        Ok(())
    }

    /// `resize` has no observable effect without a PTY wrapper; validate the pid is known and
    /// record nothing further, per the documented no-op behavior.
    pub fn resize(&self, pid: Pid, _cols: u16, _rows: u16) -> Result<(), ProcessError> {
        if self.records.lock().contains_key(&pid) {
            Ok(())
        } else {
            Err(ProcessError::NotFound)
        }
    }

    /// Kill every live process record. Used on gateway shutdown, where every child is torn down
    /// regardless of subscriber state.
    pub fn kill_all(&self) {
        let pids: Vec<Pid> = self.records.lock().keys().copied().collect();
        for pid in pids {
            let _ = self.kill(pid);
        }
    }

    /// Snapshot of the connections currently subscribed to `pid`. Used by the gateway to decide
    /// which connections a `ProcessEvent` should be forwarded to; empty if the pid is unknown.
    pub fn subscribers(&self, pid: Pid) -> HashSet<ConnectionId> {
        self.records.lock().get(&pid).map(|record| record.subscribers.read().clone()).unwrap_or_default()
    }
}

fn spawn_reader<R>(
    pid: Pid,
    mut reader: R,
    subscribers: Arc<RwLock<HashSet<ConnectionId>>>,
    events_tx: mpsc::UnboundedSender<ProcessEvent>,
    is_stdout: bool,
) where
    R: tokio::io::AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut buf = vec![0u8; READ_CHUNK];
        loop {
            match reader.read(&mut buf).await {
                Ok(0) => break,
                Ok(n) => {
                    if !subscribers.read().is_empty() {
                        let chunk = buf[..n].to_vec();
                        let kind = if is_stdout {
                            ProcessEventKind::Stdout(chunk)
                        } else {
                            ProcessEventKind::Stderr(chunk)
                        };
                        let _ = events_tx.send(ProcessEvent { pid, kind });
                    }
                }
                Err(_) => break,
            }
        }
    });
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
