//! Stdio pool: a bounded pool of worker processes for one
//! stdio-configured agent. Single-inflight per worker; correlation by
//! request id; retirement on process exit, write failure, timeout, or
//! frame-parse failure.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::process::Stdio as StdStdio;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::{oneshot, Mutex, Notify};

use super::{AgentTransport, AgentTransportError};
use crate::config_doc::PoolConfig;
use crate::model::{AgentRequest, AgentResponse};

#[derive(Debug, Error)]
pub enum PoolError {
    #[error("timed out acquiring an idle worker")]
    AcquireTimeout,
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("worker response timed out")]
    RequestTimeout,
    #[error("failed to parse worker response line: {0}")]
    ParseFrame(String),
}

struct Worker {
    child: Child,
    stdin: tokio::process::ChildStdin,
    /// Set by the reader task when it parses a well-formed, correctly-
    /// correlated line; cleared once the waiting dispatch consumes it.
    inbox: Arc<Mutex<Option<(String, oneshot::Sender<String>)>>>,
}

struct Slot {
    worker: Mutex<Option<Worker>>,
    busy: std::sync::atomic::AtomicBool,
}

/// A bounded pool of worker processes for one stdio-configured agent.
pub struct StdioPool {
    command: String,
    args: Vec<String>,
    env: HashMap<String, String>,
    config: PoolConfig,
    slots: Vec<Slot>,
    notify: Notify,
    next_id: AtomicU64,
}

impl StdioPool {
    pub fn new(command: String, args: Vec<String>, env: HashMap<String, String>, config: PoolConfig) -> Self {
        let slots = (0..config.max_workers)
            .map(|_| Slot {
                worker: Mutex::new(None),
                busy: std::sync::atomic::AtomicBool::new(false),
            })
            .collect();
        Self {
            command,
            args,
            env,
            config,
            slots,
            notify: Notify::new(),
            next_id: AtomicU64::new(1),
        }
    }

    async fn spawn_worker(&self) -> Result<Worker, PoolError> {
        let mut cmd = Command::new(&self.command);
        cmd.args(&self.args)
            .envs(&self.env)
            .stdin(StdStdio::piped())
            .stdout(StdStdio::piped())
            .stderr(StdStdio::piped())
            .kill_on_drop(true);
        let mut child = cmd.spawn()?;
        let stdin = child.stdin.take().expect("piped stdin");
        let stdout = child.stdout.take().expect("piped stdout");
        let stderr = child.stderr.take().expect("piped stderr");

        let inbox: Arc<Mutex<Option<(String, oneshot::Sender<String>)>>> = Arc::new(Mutex::new(None));
        let reader_inbox = Arc::clone(&inbox);
        tokio::spawn(async move {
            let mut lines = BufReader::new(stdout).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                if line.trim().is_empty() {
                    continue;
                }
                let mut guard = reader_inbox.lock().await;
                if let Some((expected_id, _)) = guard.as_ref() {
                    let actual_id = serde_json::from_str::<Value>(&line)
                        .ok()
                        .and_then(|v| v.get("id").and_then(Value::as_str).map(str::to_string));
                    match actual_id {
                        Some(id) if &id == expected_id => {
                            let (_, sender) = guard.take().unwrap();
                            let _ = sender.send(line);
                        }
                        _ => {
                            tracing::warn!(line, "stdio worker emitted mismatched or unparsable id, discarding");
                        }
                    }
                }
            }
        });

        tokio::spawn(async move {
            let mut lines = BufReader::new(stderr).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                tracing::warn!(target: "agent_stdio_stderr", "{line}");
            }
        });

        Ok(Worker { child, stdin, inbox })
    }

    /// Acquires an idle slot (claiming it via `busy`), spawning a worker
    /// into it if empty, up to `acquireTimeout`. The caller must release it
    /// via `release` on every path (success or failure) — this is the
    /// single-inflight-per-worker invariant: only one dispatch ever holds a
    /// slot's `busy` flag at a time.
    async fn acquire(&self) -> Result<usize, PoolError> {
        let deadline = tokio::time::Instant::now() + Duration::from_millis(self.config.acquire_timeout_ms);
        loop {
            for (idx, slot) in self.slots.iter().enumerate() {
                if slot
                    .busy
                    .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
                    .is_ok()
                {
                    let needs_spawn = slot.worker.lock().await.is_none();
                    if needs_spawn {
                        match self.spawn_worker().await {
                            Ok(worker) => *slot.worker.lock().await = Some(worker),
                            Err(e) => {
                                slot.busy.store(false, Ordering::SeqCst);
                                self.notify.notify_waiters();
                                return Err(e);
                            }
                        }
                    }
                    return Ok(idx);
                }
            }
            let wait = tokio::time::timeout_at(deadline, self.notify.notified()).await;
            if wait.is_err() {
                return Err(PoolError::AcquireTimeout);
            }
        }
    }

    fn release(&self, idx: usize) {
        self.slots[idx].busy.store(false, Ordering::SeqCst);
        self.notify.notify_waiters();
    }

    async fn dispatch_to_worker(&self, request: &AgentRequest) -> Result<AgentResponse, PoolError> {
        let idx = self.acquire().await?;
        let result = self.run_on_slot(idx, request).await;
        self.release(idx);
        result
    }

    async fn run_on_slot(&self, idx: usize, request: &AgentRequest) -> Result<AgentResponse, PoolError> {
        let request_id = self.next_id.fetch_add(1, Ordering::SeqCst).to_string();
        let mut guard = self.slots[idx].worker.lock().await;
        let worker = guard.as_mut().expect("acquire spawned this slot's worker");

        let mut line = serde_json::to_string(&serde_json::json!({"id": request_id, "request": request}))
            .map_err(|e| PoolError::ParseFrame(e.to_string()))?;
        line.push('\n');

        let (tx, rx) = oneshot::channel();
        *worker.inbox.lock().await = Some((request_id.clone(), tx));

        if let Err(e) = worker.stdin.write_all(line.as_bytes()).await {
            self.retire(&mut guard);
            return Err(PoolError::Io(e));
        }

        let timeout = Duration::from_millis(self.config.request_timeout_ms);
        match tokio::time::timeout(timeout, rx).await {
            Ok(Ok(raw)) => serde_json::from_str::<AgentResponse>(&raw)
                .map_err(|e| PoolError::ParseFrame(e.to_string())),
            Ok(Err(_)) | Err(_) => {
                self.retire(&mut guard);
                Err(PoolError::RequestTimeout)
            }
        }
    }

    fn retire(&self, guard: &mut Option<Worker>) {
        if let Some(mut worker) = guard.take() {
            let _ = worker.child.start_kill();
        }
    }

    /// Sends SIGTERM-equivalent shutdown to all workers, then kills any
    /// still alive after a grace period.
    pub async fn shutdown(&self) {
        for slot in &self.slots {
            let mut guard = slot.worker.lock().await;
            if let Some(worker) = guard.as_mut() {
                let _ = worker.stdin.shutdown().await;
            }
        }
        tokio::time::sleep(Duration::from_millis(500)).await;
        for slot in &self.slots {
            let mut guard = slot.worker.lock().await;
            self.retire(&mut guard);
        }
    }
}

#[async_trait]
impl AgentTransport for StdioPool {
    async fn dispatch(&self, request: AgentRequest) -> Result<AgentResponse, AgentTransportError> {
        self.dispatch_to_worker(&request)
            .await
            .map_err(AgentTransportError::Pool)
    }
}
