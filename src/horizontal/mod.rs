//! Row-wise ("horizontal") reduction kernels over a [`crate::batch::RowBatch`].
//!
//! Every kernel is a synchronous pure function: it validates its inputs once, then scans the
//! batch and returns one freshly allocated output. Row order and row count are preserved 1:1.
//!
//! - [`collapse_columns`]: non-null strings per row, as a list (general path + null-sentinel
//!   fast path)
//! - [`arg_true_horizontal`] / [`arg_first_true_horizontal`]: positions of `true` columns
//! - [`arg_extremum_horizontal`]: position or name of the min/max column per row
//! - [`extremum_mask`] / [`extremum_mask_over`]: `is_min`/`is_max` mask of a single column,
//!   optionally per partition
//! - [`arg_first_null_horizontal`]: position of the first null column per row
//! - [`multi_index`]: gather strings from a shared lookup array by integer index
//!
//! ## Example
//!
//! ```rust
//! use horizontal_kernels::batch::{Column, RowBatch};
//! use horizontal_kernels::horizontal::{arg_max_horizontal, collapse_columns};
//!
//! let names = RowBatch::try_new(vec![
//!     Column::utf8("first", vec![Some("ada"), None]),
//!     Column::utf8("second", vec![Some("grace"), Some("alan")]),
//! ])
//! .unwrap();
//! let lists = collapse_columns(&names, false).unwrap();
//! assert_eq!(
//!     lists.as_list_utf8().unwrap().to_vec(),
//!     vec![
//!         Some(vec!["ada".to_string(), "grace".to_string()]),
//!         Some(vec!["alan".to_string()]),
//!     ]
//! );
//!
//! let scores = RowBatch::try_new(vec![
//!     Column::int64("x", vec![Some(1), None]),
//!     Column::int64("y", vec![Some(5), None]),
//! ])
//! .unwrap();
//! let idx = arg_max_horizontal(&scores).unwrap();
//! assert_eq!(idx.as_uint32().unwrap().to_vec(), vec![Some(1), None]);
//! ```

pub mod arg_extremum;
pub mod arg_true;
pub mod collapse;
pub mod extremum_mask;
pub mod first_null;
pub mod multi_index;

pub use arg_extremum::{
    ExtremumMode, arg_extremum_horizontal, arg_max_horizontal, arg_max_horizontal_colname,
    arg_min_horizontal, arg_min_horizontal_colname,
};
pub use arg_true::{
    FirstTrueStrategy, WhenThen, arg_first_true_horizontal, arg_true_horizontal,
    build_first_true_cascade,
};
pub use collapse::{collapse_columns, verify_null_sentinel};
pub use extremum_mask::{extremum_mask, extremum_mask_over, is_max, is_min};
pub use first_null::arg_first_null_horizontal;
pub use multi_index::{multi_index, multi_index_unchecked};

use crate::batch::{Array, Column, ColumnValues, RowBatch};
use crate::error::{KernelError, KernelResult};

/// Element types a kernel can borrow straight out of a [`Column`].
pub(crate) trait ColumnElement: Sized {
    /// Human-readable dtype family used in type-mismatch messages.
    const FAMILY: &'static str;

    fn array(values: &ColumnValues) -> Option<&Array<Self>>;
}

macro_rules! impl_column_element {
    ($ty:ty, $variant:ident, $family:literal) => {
        impl ColumnElement for $ty {
            const FAMILY: &'static str = $family;

            fn array(values: &ColumnValues) -> Option<&Array<Self>> {
                match values {
                    ColumnValues::$variant(a) => Some(a),
                    _ => None,
                }
            }
        }
    };
}

impl_column_element!(bool, Boolean, "boolean");
impl_column_element!(i32, Int32, "i32");
impl_column_element!(i64, Int64, "i64");
impl_column_element!(u32, UInt32, "u32");
impl_column_element!(u64, UInt64, "u64");
impl_column_element!(f32, Float32, "f32");
impl_column_element!(f64, Float64, "f64");
impl_column_element!(String, Utf8, "string");

/// Borrow one column as `Array<T>`, naming the column in the error if the dtype differs.
pub(crate) fn typed_array<T: ColumnElement>(column: &Column) -> KernelResult<&Array<T>> {
    T::array(column.values()).ok_or_else(|| {
        KernelError::type_mismatch(format!(
            "column '{}' is not a {} column, got: {}",
            column.name(),
            T::FAMILY,
            column.data_type()
        ))
    })
}

/// Borrow every column of the batch as `Array<T>`.
pub(crate) fn typed_arrays<T: ColumnElement>(batch: &RowBatch) -> KernelResult<Vec<&Array<T>>> {
    batch.columns().iter().map(typed_array::<T>).collect()
}

/// Values with a total order once NaN is excluded.
///
/// NaN is treated as null by every extremum kernel.
pub(crate) trait Extremal: PartialOrd {
    fn is_nan(&self) -> bool {
        false
    }
}

impl Extremal for bool {}
impl Extremal for i32 {}
impl Extremal for i64 {}
impl Extremal for u32 {}
impl Extremal for u64 {}
impl Extremal for String {}

impl Extremal for f32 {
    fn is_nan(&self) -> bool {
        f32::is_nan(*self)
    }
}

impl Extremal for f64 {
    fn is_nan(&self) -> bool {
        f64::is_nan(*self)
    }
}

/// `candidate` beats `current` under the given direction; ties keep `current`.
#[inline]
pub(crate) fn beats<T: PartialOrd, const IS_MAX: bool>(candidate: &T, current: &T) -> bool {
    if IS_MAX {
        candidate > current
    } else {
        candidate < current
    }
}

/// Column positions are reported as `u32`, matching the output index dtype.
#[inline]
pub(crate) fn position(idx: usize) -> u32 {
    u32::try_from(idx).unwrap_or(u32::MAX)
}
