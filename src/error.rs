use thiserror::Error;

/// Convenience result type for kernel operations.
pub type KernelResult<T> = Result<T, KernelError>;

/// Error type returned by batch construction and every kernel.
///
/// Nulls are never errors. Every variant is fatal for the call that produced it; kernels validate
/// their inputs once at entry and then run to completion.
#[derive(Debug, Error)]
pub enum KernelError {
    /// A column's length differs from the batch height.
    #[error("shape mismatch: column '{column}' has length {actual}, expected {expected}")]
    ShapeMismatch {
        column: String,
        expected: usize,
        actual: usize,
    },

    /// Columns are not of the dtype family the kernel requires.
    #[error("type mismatch: {message}")]
    TypeMismatch { message: String },

    /// A gather index falls outside `0..len` of the lookup array.
    #[error("index out of bounds: column '{column}' row {row} has index {index}, lookup length is {len}")]
    IndexOutOfBounds {
        column: String,
        row: usize,
        index: i128,
        len: usize,
    },

    /// The kernel needs at least one input column.
    #[error("{kernel} requires at least one input column")]
    EmptyInput { kernel: &'static str },

    /// A referenced column name is not part of the batch.
    #[error("column not found: '{name}'")]
    ColumnNotFound { name: String },

    /// Two columns of one batch share a name.
    #[error("duplicate column name: '{name}'")]
    DuplicateColumn { name: String },

    /// Kernel arguments are inconsistent with the batch (e.g. wrong number of target columns).
    #[error("invalid argument: {message}")]
    InvalidArgument { message: String },

    /// A caller-asserted precondition (such as the null-sentinel layout) does not hold.
    #[error("precondition violated: {message}")]
    PreconditionViolated { message: String },

    /// A kernel configuration could not be parsed.
    #[error("invalid kernel config: {0}")]
    InvalidConfig(#[from] serde_json::Error),

    #[cfg(feature = "polars")]
    /// Polars conversion error (feature-gated behind `polars`).
    #[error("polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),
}

impl KernelError {
    pub(crate) fn type_mismatch(message: impl Into<String>) -> Self {
        Self::TypeMismatch {
            message: message.into(),
        }
    }
}
