//! `horizontal-kernels` is a small library of row-wise ("horizontal") reduction kernels over
//! batches of equal-length, nullable, typed columns.
//!
//! Each kernel reads one [`batch::RowBatch`] and produces one output column (or, for
//! [`horizontal::multi_index`], one output batch) with exactly one entry per input row.
//!
//! ## What you can compute
//!
//! - **Collapse**: the non-null strings of each row as a list ([`horizontal::collapse_columns`]),
//!   with a fast path for batches whose nulls only ever trail
//! - **Arg-true**: every / the first column position holding `true`
//!   ([`horizontal::arg_true_horizontal`], [`horizontal::arg_first_true_horizontal`])
//! - **Arg-min/max**: position or name of the smallest/largest non-null value per row
//!   ([`horizontal::arg_extremum_horizontal`])
//! - **Extremum masks**: `is_max`/`is_min` over a whole column or per partition
//!   ([`horizontal::extremum_mask_over`])
//! - **First null**: position of the first null column per row
//!   ([`horizontal::arg_first_null_horizontal`])
//! - **Dictionary gather**: integer index columns resolved against a shared string lookup
//!   ([`horizontal::multi_index`])
//!
//! Nulls are never errors: each kernel documents how it treats them. Floating-point `NaN` is
//! treated like null by the min/max kernels.
//!
//! ## Quick example
//!
//! ```rust
//! use horizontal_kernels::batch::{Column, RowBatch};
//! use horizontal_kernels::horizontal::{FirstTrueStrategy, arg_first_true_horizontal};
//!
//! # fn main() -> Result<(), horizontal_kernels::KernelError> {
//! let batch = RowBatch::try_new(vec![
//!     Column::boolean("a", vec![Some(false), None, Some(false)]),
//!     Column::boolean("b", vec![Some(true), Some(true), Some(false)]),
//! ])?;
//! let first = arg_first_true_horizontal(&batch, &FirstTrueStrategy::Dynamic)?;
//! assert_eq!(first.as_uint32().unwrap().to_vec(), vec![Some(1), Some(1), None]);
//! # Ok(())
//! # }
//! ```
//!
//! ## Running with configuration and observability
//!
//! [`execution::KernelRunner`] runs a [`execution::KernelSpec`] (parsable from JSON kwargs),
//! optionally chunking the batch by rows, and reports [`execution::KernelEvent`]s to a
//! [`execution::KernelObserver`]:
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use horizontal_kernels::batch::{Column, RowBatch};
//! use horizontal_kernels::execution::{
//!     KernelRunner, KernelSpec, RunnerOptions, StdErrKernelObserver,
//! };
//!
//! let runner = KernelRunner::new(RunnerOptions::default())
//!     .with_observer(Arc::new(StdErrKernelObserver));
//! let spec = KernelSpec::from_json(
//!     r#"{"kernel": "arg_extremum_horizontal", "mode": "min", "return_colname": true}"#,
//! )
//! .unwrap();
//! let batch = RowBatch::try_new(vec![
//!     Column::float64("x", vec![Some(3.0), Some(f64::NAN)]),
//!     Column::float64("y", vec![Some(2.0), Some(9.0)]),
//! ])
//! .unwrap();
//! let out = runner.run(&spec, &batch).unwrap();
//! assert_eq!(
//!     out.as_utf8().unwrap().to_vec(),
//!     vec![Some("y".to_string()), Some("y".to_string())]
//! );
//! ```
//!
//! ## Modules
//!
//! - [`batch`]: columns, arrays with validity, and row batches
//! - [`horizontal`]: the kernels themselves
//! - [`execution`]: kernel configuration, chunked runner, observers and metrics
//! - [`types`]: logical dtypes and schemas
//! - [`error`]: error types shared by every kernel
//! - `interop` (feature `polars`): conversions to and from Polars `Series`/`DataFrame`

pub mod batch;
pub mod error;
pub mod execution;
pub mod horizontal;
#[cfg(feature = "polars")]
pub mod interop;
pub mod types;

pub use error::{KernelError, KernelResult};
