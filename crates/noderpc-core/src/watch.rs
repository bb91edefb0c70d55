//! Polling watch engine.
//!
//! Each watch is a Tokio task that calls one RPC method on a fixed interval
//! and reports to its callback only when the result changes, or once when
//! polling fails for good.
//!
//! Per job:
//! ```text
//! Idle ──tick──▶ Polling ──ok, same signature──────▶ Idle
//!                   │────ok, new signature──▶ Delivering ──▶ Idle
//!                   │────err, count <= max_retry───▶ Idle
//!                   └────err, count >  max_retry───▶ Stopped (callback(Err) once)
//! ```
//!
//! A poll runs inside the job's own task, so ticks that elapse while it is
//! in flight are skipped rather than queued, and callbacks for one handle
//! never run concurrently.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde_json::Value;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};

use crate::config::WatchConfig;
use crate::error::ClientError;
use crate::request::RpcParam;
use crate::requester::RpcCaller;

/// Opaque identifier of a registered watch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WatchHandle(u64);

impl WatchHandle {
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for WatchHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "watch#{}", self.0)
    }
}

/// Receives every changed value, or the terminal error.
pub type WatchCallback = Box<dyn FnMut(Result<Value, ClientError>) + Send + 'static>;

tokio::task_local! {
    /// Set while a job's callback is running on the job's own task.
    static DELIVERING: WatchHandle;
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Stop flag plus the lock that orders deliveries against `stop`.
#[derive(Default)]
struct JobControl {
    stopped: AtomicBool,
    delivery: Mutex<()>,
}

impl JobControl {
    fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    /// Mark the job stopped.
    ///
    /// Outside of any callback this waits for an in-progress delivery to
    /// finish. Inside a callback it only sets the flag: the caller already
    /// holds its own job's delivery lock, and waiting on another job's lock
    /// from there can deadlock against that job stopping this one.
    fn halt(&self) {
        if DELIVERING.try_with(|_| ()).is_ok() {
            self.stopped.store(true, Ordering::SeqCst);
        } else {
            let _guard = lock(&self.delivery);
            self.stopped.store(true, Ordering::SeqCst);
        }
    }
}

struct WatchEntry {
    method: String,
    control: Arc<JobControl>,
    task: JoinHandle<()>,
}

type JobMap = Arc<Mutex<HashMap<WatchHandle, WatchEntry>>>;

/// Registry of polling jobs.
pub struct WatchEngine {
    jobs: JobMap,
    next_handle: AtomicU64,
    config: WatchConfig,
}

impl WatchEngine {
    pub fn new(config: WatchConfig) -> Self {
        Self {
            jobs: Arc::new(Mutex::new(HashMap::new())),
            next_handle: AtomicU64::new(1),
            config,
        }
    }

    pub fn config(&self) -> &WatchConfig {
        &self.config
    }

    /// Register a job and start polling. The first poll fires right away.
    pub(crate) fn spawn(
        &self,
        caller: Arc<RpcCaller>,
        method: String,
        params: Vec<RpcParam>,
        callback: WatchCallback,
    ) -> Result<WatchHandle, ClientError> {
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| ClientError::NoRuntime)?;
        let handle = WatchHandle(self.next_handle.fetch_add(1, Ordering::Relaxed));
        let control = Arc::new(JobControl::default());

        let job = PollJob {
            handle,
            method: method.clone(),
            params,
            callback,
            control: Arc::clone(&control),
            caller,
            jobs: Arc::clone(&self.jobs),
            interval: self.config.interval(),
            max_retry: self.config.max_retry,
        };

        // Hold the registry while spawning so the job is visible before it
        // can try to deregister itself.
        let mut jobs = lock(&self.jobs);
        let task = runtime.spawn(job.run());
        jobs.insert(handle, WatchEntry { method: method.clone(), control, task });
        drop(jobs);

        tracing::debug!(%handle, method = %method, interval_ms = self.config.interval_ms, "watch started");
        Ok(handle)
    }

    /// Cancel a job. No-op for unknown or already stopped handles.
    ///
    /// Once this returns, the job's callback will not be invoked again. When
    /// called from inside a watch callback, a delivery to the target job that
    /// has already started may still be running; none starts afterwards.
    pub fn stop(&self, handle: WatchHandle) {
        let entry = lock(&self.jobs).remove(&handle);
        if let Some(entry) = entry {
            entry.control.halt();
            entry.task.abort();
            tracing::debug!(%handle, method = %entry.method, "watch stopped");
        }
    }

    /// Cancel every registered job.
    pub fn reset(&self) {
        let drained: Vec<(WatchHandle, WatchEntry)> = lock(&self.jobs).drain().collect();
        if drained.is_empty() {
            return;
        }
        let count = drained.len();
        for (handle, entry) in drained {
            entry.control.halt();
            entry.task.abort();
        }
        tracing::debug!(count, "all watches stopped");
    }

    pub fn contains(&self, handle: WatchHandle) -> bool {
        lock(&self.jobs).contains_key(&handle)
    }

    /// Number of registered jobs.
    pub fn len(&self) -> usize {
        lock(&self.jobs).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Drop for WatchEngine {
    fn drop(&mut self) {
        self.reset();
    }
}

/// State owned by a job's task.
struct PollJob {
    handle: WatchHandle,
    method: String,
    params: Vec<RpcParam>,
    callback: WatchCallback,
    control: Arc<JobControl>,
    caller: Arc<RpcCaller>,
    jobs: JobMap,
    interval: Duration,
    max_retry: u32,
}

impl PollJob {
    async fn run(mut self) {
        let mut ticker = time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let mut last_signature: Option<String> = None;
        let mut error_count: u32 = 0;

        loop {
            ticker.tick().await;
            if self.control.is_stopped() {
                break;
            }

            let outcome = self.caller.send(&self.method, self.params.clone()).await;
            match outcome {
                Ok(result) => {
                    error_count = 0;
                    let current = signature(&result);
                    if last_signature.as_deref() == Some(current.as_str()) {
                        tracing::trace!(handle = %self.handle, method = %self.method, "watched value unchanged");
                        continue;
                    }
                    last_signature = Some(current);
                    if !self.deliver(Ok(result)) {
                        break;
                    }
                }
                Err(err) => {
                    error_count += 1;
                    if error_count <= self.max_retry {
                        tracing::warn!(
                            handle = %self.handle,
                            method = %self.method,
                            attempt = error_count,
                            max_retry = self.max_retry,
                            error = %err,
                            "watch poll failed"
                        );
                        continue;
                    }

                    tracing::error!(
                        handle = %self.handle,
                        method = %self.method,
                        attempts = error_count,
                        error = %err,
                        "watch retry budget exhausted, giving up"
                    );
                    // A concurrent `stop` may have won; only the side that
                    // removes the entry gets to report.
                    let registered = lock(&self.jobs).remove(&self.handle).is_some();
                    if registered {
                        self.deliver(Err(err));
                    }
                    break;
                }
            }
        }
    }

    /// Invoke the callback unless the job was stopped. Returns `false` once
    /// the job should stop polling.
    fn deliver(&mut self, update: Result<Value, ClientError>) -> bool {
        let _guard = lock(&self.control.delivery);
        if self.control.is_stopped() {
            return false;
        }
        let callback = &mut self.callback;
        DELIVERING.sync_scope(self.handle, || callback(update));
        !self.control.is_stopped()
    }
}

/// Stable textual form of a result, used to detect changes between polls.
///
/// Object keys are written in sorted order, so two structurally equal
/// values always produce the same signature.
pub fn signature(value: &Value) -> String {
    let mut out = String::new();
    write_canonical(value, &mut out);
    out
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<_> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            out.push('{');
            for (i, (key, item)) in entries.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String(key.clone()).to_string());
                out.push(':');
                write_canonical(item, out);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}
