use std::sync::{Arc, Mutex};

use horizontal_kernels::KernelError;
use horizontal_kernels::batch::{Column, RowBatch};
use horizontal_kernels::execution::{
    CompositeObserver, KernelEvent, KernelObserver, KernelRunner, KernelSpec, RunnerOptions,
    StdErrKernelObserver,
};

#[derive(Default)]
struct RecordingObserver {
    kernels: Mutex<Vec<&'static str>>,
    failures: Mutex<Vec<String>>,
    chunk_starts: Mutex<Vec<(usize, usize)>>,
}

impl KernelObserver for RecordingObserver {
    fn on_event(&self, event: &KernelEvent) {
        match event {
            KernelEvent::RunStarted { kernel, .. } => self.kernels.lock().unwrap().push(*kernel),
            KernelEvent::RunFailed { error, .. } => {
                self.failures.lock().unwrap().push(error.clone())
            }
            KernelEvent::ChunkStarted {
                start_row,
                row_count,
            } => self
                .chunk_starts
                .lock()
                .unwrap()
                .push((*start_row, *row_count)),
            _ => {}
        }
    }
}

fn words() -> RowBatch {
    RowBatch::try_new(vec![
        Column::utf8("a", vec![Some("x"), Some("y"), None, Some("w"), None]),
        Column::utf8("b", vec![Some("1"), None, None, Some("2"), Some("3")]),
    ])
    .unwrap()
}

#[test]
fn composite_observer_fans_out_chunk_events() {
    let left = Arc::new(RecordingObserver::default());
    let right = Arc::new(RecordingObserver::default());
    let composite = CompositeObserver::new(vec![
        left.clone() as Arc<dyn KernelObserver>,
        right.clone(),
        Arc::new(StdErrKernelObserver),
    ]);
    let runner = KernelRunner::new(RunnerOptions {
        chunk_size: Some(2),
        verify_preconditions: false,
    })
    .with_observer(Arc::new(composite));

    let out = runner
        .run(
            &KernelSpec::CollapseColumns {
                is_null_sentinel: false,
            },
            &words(),
        )
        .unwrap();
    assert_eq!(out.len(), 5);

    for obs in [&left, &right] {
        assert_eq!(*obs.kernels.lock().unwrap(), vec!["collapse_columns"]);
        assert_eq!(
            *obs.chunk_starts.lock().unwrap(),
            vec![(0, 2), (2, 2), (4, 1)]
        );
        assert!(obs.failures.lock().unwrap().is_empty());
    }
}

#[test]
fn failed_runs_report_the_error_and_count() {
    let obs = Arc::new(RecordingObserver::default());
    let runner = KernelRunner::new(RunnerOptions::default()).with_observer(obs.clone());
    let spec = KernelSpec::ArgFirstTrueHorizontal {
        strategy: horizontal_kernels::horizontal::FirstTrueStrategy::Cascade(vec![
            "a".into(),
            "missing".into(),
        ]),
    };

    let err = runner.run(&spec, &words()).unwrap_err();
    // Strings have no truthiness, so coercion fails before the cascade is evaluated.
    assert!(matches!(err, KernelError::TypeMismatch { .. }));

    let failures = obs.failures.lock().unwrap().clone();
    assert_eq!(failures.len(), 1);
    assert!(failures[0].contains("type mismatch"));

    let snap = runner.metrics().snapshot();
    assert_eq!((snap.runs_started, snap.runs_failed), (1, 1));
    assert_eq!(snap.rows_processed, 0);
}

#[test]
fn metrics_accumulate_across_runs() {
    let runner = KernelRunner::new(RunnerOptions {
        chunk_size: Some(3),
        ..Default::default()
    });
    let spec = KernelSpec::from_json(r#"{"kernel": "arg_first_null_horizontal"}"#).unwrap();
    for _ in 0..3 {
        runner.run(&spec, &words()).unwrap();
    }
    let snap = runner.metrics().snapshot();
    assert_eq!(snap.runs_started, 3);
    assert_eq!(snap.rows_processed, 15);
    assert_eq!(snap.chunks_processed, 6);
    assert!(snap.to_string().contains("runs=3"));
}
