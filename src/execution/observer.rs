use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Events emitted by the [`super::KernelRunner`].
#[derive(Debug, Clone)]
pub enum KernelEvent {
    RunStarted {
        kernel: &'static str,
        rows: usize,
        columns: usize,
    },
    ChunkStarted {
        start_row: usize,
        row_count: usize,
    },
    ChunkFinished {
        output_rows: usize,
    },
    RunFinished {
        kernel: &'static str,
        elapsed: Duration,
        metrics: KernelMetricsSnapshot,
    },
    RunFailed {
        kernel: &'static str,
        error: String,
    },
}

/// Observer hook for kernel events.
pub trait KernelObserver: Send + Sync {
    fn on_event(&self, event: &KernelEvent);
}

/// A simple stderr logger for kernel events.
#[derive(Debug, Default)]
pub struct StdErrKernelObserver;

impl KernelObserver for StdErrKernelObserver {
    fn on_event(&self, event: &KernelEvent) {
        match event {
            KernelEvent::RunFailed { kernel, error } => {
                eprintln!("[kernel][error] kernel={kernel} err={error}")
            }
            KernelEvent::RunFinished {
                kernel,
                elapsed,
                metrics,
            } => eprintln!("[kernel][ok] kernel={kernel} elapsed={elapsed:?} {metrics}"),
            other => eprintln!("[kernel] {other:?}"),
        }
    }
}

/// An observer that fans out events to a list of observers.
#[derive(Default)]
pub struct CompositeObserver {
    observers: Vec<Arc<dyn KernelObserver>>,
}

impl CompositeObserver {
    pub fn new(observers: Vec<Arc<dyn KernelObserver>>) -> Self {
        Self { observers }
    }
}

impl fmt::Debug for CompositeObserver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeObserver")
            .field("observers_len", &self.observers.len())
            .finish()
    }
}

impl KernelObserver for CompositeObserver {
    fn on_event(&self, event: &KernelEvent) {
        for o in &self.observers {
            o.on_event(event);
        }
    }
}

/// Cumulative counters across every run of one runner.
///
/// The runner may be shared between threads, so all counters are atomics; callers can snapshot
/// them at any time.
pub struct KernelMetrics {
    runs_started: AtomicU64,
    runs_failed: AtomicU64,
    rows_processed: AtomicU64,
    chunks_processed: AtomicU64,
    last_elapsed_ns: AtomicU64,
}

impl KernelMetrics {
    pub fn new() -> Self {
        Self {
            runs_started: AtomicU64::new(0),
            runs_failed: AtomicU64::new(0),
            rows_processed: AtomicU64::new(0),
            chunks_processed: AtomicU64::new(0),
            last_elapsed_ns: AtomicU64::new(0),
        }
    }

    pub fn on_run_start(&self) {
        let _ = self.runs_started.fetch_add(1, Ordering::SeqCst);
    }

    pub fn on_run_failed(&self) {
        let _ = self.runs_failed.fetch_add(1, Ordering::SeqCst);
    }

    pub fn on_run_end(&self, rows: usize, elapsed: Duration) {
        let _ = self.rows_processed.fetch_add(rows as u64, Ordering::SeqCst);
        self.last_elapsed_ns
            .store(elapsed.as_nanos().min(u64::MAX as u128) as u64, Ordering::SeqCst);
    }

    pub fn on_chunk(&self) {
        let _ = self.chunks_processed.fetch_add(1, Ordering::SeqCst);
    }

    pub fn snapshot(&self) -> KernelMetricsSnapshot {
        let elapsed_ns = self.last_elapsed_ns.load(Ordering::SeqCst);
        KernelMetricsSnapshot {
            runs_started: self.runs_started.load(Ordering::SeqCst),
            runs_failed: self.runs_failed.load(Ordering::SeqCst),
            rows_processed: self.rows_processed.load(Ordering::SeqCst),
            chunks_processed: self.chunks_processed.load(Ordering::SeqCst),
            last_elapsed: (elapsed_ns > 0).then(|| Duration::from_nanos(elapsed_ns)),
        }
    }
}

impl Default for KernelMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Immutable snapshot of [`KernelMetrics`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KernelMetricsSnapshot {
    pub runs_started: u64,
    pub runs_failed: u64,
    pub rows_processed: u64,
    pub chunks_processed: u64,
    pub last_elapsed: Option<Duration>,
}

impl fmt::Display for KernelMetricsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "runs={} failed={} rows_processed={} chunks={} last_elapsed={:?}",
            self.runs_started,
            self.runs_failed,
            self.rows_processed,
            self.chunks_processed,
            self.last_elapsed
        )
    }
}
