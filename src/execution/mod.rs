//! Kernel selection, configuration and instrumented execution.
//!
//! This module sits "above" [`crate::horizontal`] and provides:
//!
//! - [`KernelSpec`]: which kernel to run plus its flags, deserializable from plugin-style JSON
//!   kwargs
//! - [`KernelRunner`]: validates and prepares the batch (truthiness coercion, optional
//!   precondition checks), optionally runs it chunk by chunk, and reports events/metrics
//!
//! A single run is never internally parallel. Callers that want parallelism run independent
//! batches concurrently; a runner can be shared between threads.
//!
//! ```rust
//! use horizontal_kernels::batch::{Column, RowBatch};
//! use horizontal_kernels::execution::{KernelRunner, KernelSpec, RunnerOptions};
//!
//! let spec = KernelSpec::from_json(r#"{"kernel": "collapse_columns", "is_null_sentinel": false}"#)
//!     .unwrap();
//! let batch = RowBatch::try_new(vec![
//!     Column::utf8("a", vec![Some("x"), None]),
//!     Column::utf8("b", vec![Some("y"), Some("z")]),
//! ])
//! .unwrap();
//!
//! let runner = KernelRunner::new(RunnerOptions {
//!     chunk_size: Some(1),
//!     ..Default::default()
//! });
//! let out = runner.run(&spec, &batch).unwrap();
//! assert_eq!(out.len(), 2);
//! assert_eq!(runner.metrics().snapshot().chunks_processed, 2);
//! ```

mod observer;

use std::borrow::Cow;
use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::batch::{Array, Column, RowBatch};
use crate::error::{KernelError, KernelResult};
use crate::horizontal::{
    ExtremumMode, FirstTrueStrategy, arg_extremum_horizontal, arg_first_null_horizontal,
    arg_first_true_horizontal, arg_true_horizontal, collapse_columns, extremum_mask_over,
    multi_index, verify_null_sentinel,
};

pub use observer::{
    CompositeObserver, KernelEvent, KernelMetrics, KernelMetricsSnapshot, KernelObserver,
    StdErrKernelObserver,
};

/// A kernel selection with its configuration flags.
///
/// Serialized form is tagged by `"kernel"`, e.g.
/// `{"kernel": "arg_extremum_horizontal", "mode": "max", "return_colname": true}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kernel", rename_all = "snake_case")]
pub enum KernelSpec {
    CollapseColumns {
        #[serde(alias = "stop_on_first_null")]
        is_null_sentinel: bool,
    },
    ArgTrueHorizontal,
    ArgFirstTrueHorizontal {
        #[serde(default)]
        strategy: FirstTrueStrategy,
    },
    ArgExtremumHorizontal {
        mode: ExtremumMode,
        #[serde(default)]
        return_colname: bool,
    },
    /// Mask of the batch's single non-partition column.
    ExtremumMask {
        mode: ExtremumMode,
        #[serde(default)]
        partition_by: Option<String>,
    },
    ArgFirstNullHorizontal,
}

impl KernelSpec {
    /// Parse a spec from JSON.
    pub fn from_json(json: &str) -> KernelResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::CollapseColumns { .. } => "collapse_columns",
            Self::ArgTrueHorizontal => "arg_true_horizontal",
            Self::ArgFirstTrueHorizontal { .. } => "arg_first_true_horizontal",
            Self::ArgExtremumHorizontal { .. } => "arg_extremum_horizontal",
            Self::ExtremumMask { .. } => "extremum_mask",
            Self::ArgFirstNullHorizontal => "arg_first_null_horizontal",
        }
    }
}

/// Configuration for the [`KernelRunner`].
#[derive(Debug, Clone)]
pub struct RunnerOptions {
    /// Rows per kernel call.
    ///
    /// If `None`, the whole batch goes through one call. Row-wise kernels give identical results
    /// either way; extremum masks are column reductions and always see the whole batch.
    pub chunk_size: Option<usize>,
    /// Check caller-asserted preconditions before running.
    ///
    /// Currently this verifies the null-sentinel layout for
    /// `CollapseColumns { is_null_sentinel: true }`, failing with
    /// [`KernelError::PreconditionViolated`] instead of returning unspecified output. Defaults to
    /// on in debug builds.
    pub verify_preconditions: bool,
}

impl Default for RunnerOptions {
    fn default() -> Self {
        Self {
            chunk_size: None,
            verify_preconditions: cfg!(debug_assertions),
        }
    }
}

/// Runs kernels with validation, optional chunking, and observer/metrics hooks.
pub struct KernelRunner {
    opts: RunnerOptions,
    observer: Option<Arc<dyn KernelObserver>>,
    metrics: Arc<KernelMetrics>,
}

impl KernelRunner {
    /// Create a new runner with the given options.
    ///
    /// # Panics
    ///
    /// Panics if `chunk_size == Some(0)`.
    pub fn new(opts: RunnerOptions) -> Self {
        if let Some(n) = opts.chunk_size {
            assert!(n > 0, "chunk_size must be > 0 when set");
        }
        Self {
            opts,
            observer: None,
            metrics: Arc::new(KernelMetrics::new()),
        }
    }

    /// Attach an observer for kernel events.
    pub fn with_observer(mut self, observer: Arc<dyn KernelObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Get a handle to the runner's cumulative metrics.
    pub fn metrics(&self) -> Arc<KernelMetrics> {
        Arc::clone(&self.metrics)
    }

    pub fn options(&self) -> &RunnerOptions {
        &self.opts
    }

    /// Run one kernel over `batch` and return its output column.
    pub fn run(&self, spec: &KernelSpec, batch: &RowBatch) -> KernelResult<Column> {
        self.instrumented(spec.name(), batch, || match spec {
            KernelSpec::ExtremumMask { mode, partition_by } => {
                run_extremum_mask(batch, *mode, partition_by.as_deref())
            }
            _ => {
                let prepared = self.prepare(spec, batch)?;
                self.chunked(
                    &prepared,
                    |chunk| invoke(spec, chunk),
                    Column::len,
                    |parts| Column::concat(&parts),
                )
            }
        })
    }

    /// Gather `lookup[index]` for every index in `batch` (checked; see
    /// [`crate::horizontal::multi_index`]).
    ///
    /// The lookup is only read, so one lookup can serve many concurrent runs.
    pub fn run_multi_index(
        &self,
        batch: &RowBatch,
        lookup: &Array<String>,
    ) -> KernelResult<RowBatch> {
        self.instrumented("multi_index", batch, || {
            self.chunked(
                batch,
                |chunk| multi_index(chunk, lookup),
                RowBatch::height,
                |parts| RowBatch::concat(&parts),
            )
        })
    }

    fn prepare<'b>(&self, spec: &KernelSpec, batch: &'b RowBatch) -> KernelResult<Cow<'b, RowBatch>> {
        match spec {
            KernelSpec::CollapseColumns {
                is_null_sentinel: true,
            } if self.opts.verify_preconditions => {
                verify_null_sentinel(batch)?;
                Ok(Cow::Borrowed(batch))
            }
            KernelSpec::ArgTrueHorizontal => coerce_boolean(batch, |_| true),
            KernelSpec::ArgFirstTrueHorizontal { strategy } => match strategy {
                FirstTrueStrategy::Dynamic => coerce_boolean(batch, |_| true),
                // The cascade only reads the columns it names.
                FirstTrueStrategy::Cascade(names) => {
                    coerce_boolean(batch, |c| names.iter().any(|n| n == c.name()))
                }
            },
            _ => Ok(Cow::Borrowed(batch)),
        }
    }

    fn chunked<T>(
        &self,
        batch: &RowBatch,
        kernel: impl Fn(&RowBatch) -> KernelResult<T>,
        rows_of: impl Fn(&T) -> usize,
        concat: impl FnOnce(Vec<T>) -> KernelResult<T>,
    ) -> KernelResult<T> {
        let size = match self.opts.chunk_size {
            Some(size) if batch.height() > size => size,
            _ => return kernel(batch),
        };

        let mut parts = Vec::with_capacity(batch.height().div_ceil(size));
        for (i, chunk) in batch.chunks(size).iter().enumerate() {
            self.emit(KernelEvent::ChunkStarted {
                start_row: i * size,
                row_count: chunk.height(),
            });
            let out = kernel(chunk)?;
            self.metrics.on_chunk();
            self.emit(KernelEvent::ChunkFinished {
                output_rows: rows_of(&out),
            });
            parts.push(out);
        }
        concat(parts)
    }

    fn instrumented<T>(
        &self,
        kernel: &'static str,
        batch: &RowBatch,
        run: impl FnOnce() -> KernelResult<T>,
    ) -> KernelResult<T> {
        let start = Instant::now();
        self.metrics.on_run_start();
        self.emit(KernelEvent::RunStarted {
            kernel,
            rows: batch.height(),
            columns: batch.width(),
        });

        match run() {
            Ok(out) => {
                self.metrics.on_run_end(batch.height(), start.elapsed());
                self.emit(KernelEvent::RunFinished {
                    kernel,
                    elapsed: start.elapsed(),
                    metrics: self.metrics.snapshot(),
                });
                Ok(out)
            }
            Err(err) => {
                self.metrics.on_run_failed();
                self.emit(KernelEvent::RunFailed {
                    kernel,
                    error: err.to_string(),
                });
                Err(err)
            }
        }
    }

    fn emit(&self, event: KernelEvent) {
        if let Some(obs) = &self.observer {
            obs.on_event(&event);
        }
    }
}

/// Cast the columns picked by `read` to boolean, leaving the batch borrowed when nothing changes.
fn coerce_boolean(
    batch: &RowBatch,
    read: impl Fn(&Column) -> bool,
) -> KernelResult<Cow<'_, RowBatch>> {
    if !batch
        .columns()
        .iter()
        .any(|c| read(c) && c.as_boolean().is_none())
    {
        return Ok(Cow::Borrowed(batch));
    }
    let columns = batch
        .columns()
        .iter()
        .map(|c| if read(c) { c.cast_boolean() } else { Ok(c.clone()) })
        .collect::<KernelResult<Vec<_>>>()?;
    Ok(Cow::Owned(RowBatch::try_new(columns)?))
}

fn invoke(spec: &KernelSpec, batch: &RowBatch) -> KernelResult<Column> {
    match spec {
        KernelSpec::CollapseColumns { is_null_sentinel } => {
            collapse_columns(batch, *is_null_sentinel)
        }
        KernelSpec::ArgTrueHorizontal => arg_true_horizontal(batch),
        KernelSpec::ArgFirstTrueHorizontal { strategy } => {
            arg_first_true_horizontal(batch, strategy)
        }
        KernelSpec::ArgExtremumHorizontal {
            mode,
            return_colname,
        } => arg_extremum_horizontal(batch, *mode, *return_colname),
        KernelSpec::ExtremumMask { mode, partition_by } => {
            run_extremum_mask(batch, *mode, partition_by.as_deref())
        }
        KernelSpec::ArgFirstNullHorizontal => Ok(arg_first_null_horizontal(batch)),
    }
}

fn run_extremum_mask(
    batch: &RowBatch,
    mode: ExtremumMode,
    partition_by: Option<&str>,
) -> KernelResult<Column> {
    let partition = partition_by
        .map(|name| batch.column_by_name(name))
        .transpose()?;
    let targets: Vec<&Column> = batch
        .columns()
        .iter()
        .filter(|c| Some(c.name()) != partition_by)
        .collect();
    match targets.as_slice() {
        [target] => extremum_mask_over(target, partition, mode),
        _ => Err(KernelError::InvalidArgument {
            message: format!(
                "extremum_mask expects exactly one target column besides the partition, got {}",
                targets.len()
            ),
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::{KernelEvent, KernelObserver, KernelRunner, KernelSpec, RunnerOptions};
    use crate::batch::{Array, Column, RowBatch};
    use crate::error::KernelError;
    use crate::horizontal::{ExtremumMode, FirstTrueStrategy};

    #[derive(Default)]
    struct RecordingObserver {
        events: Mutex<Vec<KernelEvent>>,
    }

    impl RecordingObserver {
        fn count(&self, pred: impl Fn(&KernelEvent) -> bool) -> usize {
            self.events.lock().unwrap().iter().filter(|e| pred(e)).count()
        }
    }

    impl KernelObserver for RecordingObserver {
        fn on_event(&self, event: &KernelEvent) {
            self.events.lock().unwrap().push(event.clone());
        }
    }

    fn chunked_runner(chunk_size: usize) -> KernelRunner {
        KernelRunner::new(RunnerOptions {
            chunk_size: Some(chunk_size),
            verify_preconditions: true,
        })
    }

    fn int_batch() -> RowBatch {
        RowBatch::try_new(vec![
            Column::int64("a", vec![Some(1), Some(0), None, Some(5), Some(2)]),
            Column::int64("b", vec![Some(0), Some(7), Some(3), None, Some(2)]),
        ])
        .unwrap()
    }

    #[test]
    fn spec_from_json_accepts_plugin_kwargs() {
        let spec =
            KernelSpec::from_json(r#"{"kernel":"collapse_columns","stop_on_first_null":true}"#)
                .unwrap();
        assert_eq!(
            spec,
            KernelSpec::CollapseColumns {
                is_null_sentinel: true
            }
        );

        let spec = KernelSpec::from_json(
            r#"{"kernel":"arg_first_true_horizontal","strategy":{"cascade":["a","b"]}}"#,
        )
        .unwrap();
        assert_eq!(
            spec,
            KernelSpec::ArgFirstTrueHorizontal {
                strategy: FirstTrueStrategy::Cascade(vec!["a".into(), "b".into()])
            }
        );

        let spec = KernelSpec::from_json(r#"{"kernel":"arg_extremum_horizontal","mode":"min"}"#)
            .unwrap();
        assert_eq!(
            spec,
            KernelSpec::ArgExtremumHorizontal {
                mode: ExtremumMode::Min,
                return_colname: false
            }
        );

        assert!(matches!(
            KernelSpec::from_json(r#"{"kernel":"nope"}"#).unwrap_err(),
            KernelError::InvalidConfig(_)
        ));
    }

    #[test]
    fn chunked_run_matches_single_call() {
        let spec = KernelSpec::ArgExtremumHorizontal {
            mode: ExtremumMode::Max,
            return_colname: true,
        };
        let whole = KernelRunner::new(RunnerOptions::default())
            .run(&spec, &int_batch())
            .unwrap();
        for size in 1..=6 {
            assert_eq!(chunked_runner(size).run(&spec, &int_batch()).unwrap(), whole);
        }
    }

    #[test]
    fn events_and_metrics_track_chunks() {
        let observer = Arc::new(RecordingObserver::default());
        let runner = chunked_runner(2).with_observer(observer.clone());

        runner
            .run(&KernelSpec::ArgFirstNullHorizontal, &int_batch())
            .unwrap();

        assert_eq!(
            observer.count(|e| matches!(e, KernelEvent::ChunkStarted { .. })),
            3
        );
        assert_eq!(
            observer.count(|e| matches!(e, KernelEvent::RunFinished { .. })),
            1
        );
        let snap = runner.metrics().snapshot();
        assert_eq!(snap.runs_started, 1);
        assert_eq!(snap.rows_processed, 5);
        assert_eq!(snap.chunks_processed, 3);
        assert_eq!(snap.runs_failed, 0);
    }

    #[test]
    fn failures_are_reported() {
        let observer = Arc::new(RecordingObserver::default());
        let runner = KernelRunner::new(RunnerOptions::default()).with_observer(observer.clone());
        let spec = KernelSpec::CollapseColumns {
            is_null_sentinel: false,
        };

        assert!(runner.run(&spec, &int_batch()).is_err());
        assert_eq!(
            observer.count(|e| matches!(e, KernelEvent::RunFailed { .. })),
            1
        );
        assert_eq!(runner.metrics().snapshot().runs_failed, 1);
    }

    #[test]
    fn integer_columns_are_coerced_for_arg_true() {
        let out = KernelRunner::new(RunnerOptions::default())
            .run(&KernelSpec::ArgTrueHorizontal, &int_batch())
            .unwrap();
        assert_eq!(
            out.as_list_uint32().unwrap().to_vec(),
            vec![
                Some(vec![0]),
                Some(vec![1]),
                Some(vec![1]),
                Some(vec![0]),
                Some(vec![0, 1])
            ]
        );
    }

    #[test]
    fn cascade_coerces_only_named_columns() {
        let batch = RowBatch::try_new(vec![
            Column::int64("a", vec![Some(0), Some(3)]),
            Column::utf8("label", vec![Some("x"), Some("y")]),
        ])
        .unwrap();
        let runner = KernelRunner::new(RunnerOptions::default());

        let cascade = KernelSpec::ArgFirstTrueHorizontal {
            strategy: FirstTrueStrategy::Cascade(vec!["a".into()]),
        };
        let out = runner.run(&cascade, &batch).unwrap();
        assert_eq!(out.as_uint32().unwrap().to_vec(), vec![None, Some(0)]);

        // A dynamic scan reads every column, so the string column is still rejected.
        let dynamic = KernelSpec::ArgFirstTrueHorizontal {
            strategy: FirstTrueStrategy::Dynamic,
        };
        assert!(matches!(
            runner.run(&dynamic, &batch).unwrap_err(),
            KernelError::TypeMismatch { .. }
        ));
    }

    #[test]
    fn sentinel_layout_is_verified_on_request() {
        let batch = RowBatch::try_new(vec![
            Column::utf8("a", vec![None::<&str>]),
            Column::utf8("b", vec![Some("late")]),
        ])
        .unwrap();
        let spec = KernelSpec::CollapseColumns {
            is_null_sentinel: true,
        };

        let strict = chunked_runner(1);
        assert!(matches!(
            strict.run(&spec, &batch).unwrap_err(),
            KernelError::PreconditionViolated { .. }
        ));

        let trusting = KernelRunner::new(RunnerOptions {
            chunk_size: None,
            verify_preconditions: false,
        });
        let out = trusting.run(&spec, &batch).unwrap();
        assert_eq!(out.as_list_utf8().unwrap().to_vec(), vec![Some(vec![])]);
    }

    #[test]
    fn extremum_mask_uses_whole_column_and_partition() {
        let batch = RowBatch::try_new(vec![
            Column::utf8("g", vec![Some("a"), Some("a"), Some("b"), Some("b")]),
            Column::int64("v", vec![Some(1), Some(9), Some(4), Some(3)]),
        ])
        .unwrap();
        let runner = chunked_runner(1);

        let grouped = KernelSpec::ExtremumMask {
            mode: ExtremumMode::Max,
            partition_by: Some("g".into()),
        };
        let out = runner.run(&grouped, &batch).unwrap();
        assert_eq!(
            out.as_boolean().unwrap().to_vec(),
            vec![Some(false), Some(true), Some(true), Some(false)]
        );

        let global = KernelSpec::ExtremumMask {
            mode: ExtremumMode::Max,
            partition_by: None,
        };
        assert!(matches!(
            runner.run(&global, &batch).unwrap_err(),
            KernelError::InvalidArgument { .. }
        ));
    }

    #[test]
    fn multi_index_runs_in_chunks() {
        let batch = RowBatch::try_new(vec![Column::uint32(
            "i",
            vec![Some(2), Some(0), Some(2), Some(1)],
        )])
        .unwrap();
        let lookup = Array::from_values(vec!["alpha".into(), "beta".into(), "gamma".into()]);
        let out = chunked_runner(3).run_multi_index(&batch, &lookup).unwrap();
        assert_eq!(
            out.columns()[0].as_utf8().unwrap().to_vec(),
            vec![
                Some("gamma".to_string()),
                Some("alpha".to_string()),
                Some("gamma".to_string()),
                Some("beta".to_string())
            ]
        );
    }
}
