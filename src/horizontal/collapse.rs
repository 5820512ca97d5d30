//! Collapse string columns into one list-of-strings column, dropping nulls.

use crate::batch::{Array, Column, ColumnValues, RowBatch};
use crate::error::{KernelError, KernelResult};

use super::typed_arrays;

/// Name of the column produced by [`collapse_columns`].
pub const OUTPUT_NAME: &str = "collapse_columns";

/// For every row, collect the non-null string values across all columns, in column order.
///
/// All columns must be strings ([`KernelError::TypeMismatch`] names the first offender) and there
/// must be at least one column ([`KernelError::EmptyInput`]). Empty strings are values, not nulls.
///
/// With `is_null_sentinel = true` the caller asserts the null-sentinel layout: within each row,
/// once a null is seen scanning left to right, every later column of that row is null too. The
/// scan then stops at the first null and never inspects the trailing columns. If the assertion is
/// false, values after the first null of a row are silently dropped; use
/// [`verify_null_sentinel`] to check the layout up front.
pub fn collapse_columns(batch: &RowBatch, is_null_sentinel: bool) -> KernelResult<Column> {
    if batch.width() == 0 {
        return Err(KernelError::EmptyInput {
            kernel: "collapse_columns",
        });
    }
    let arrays = typed_arrays::<String>(batch)?;

    let rows = if is_null_sentinel {
        collapse_until_first_null(&arrays, batch.height())
    } else {
        collapse_skipping_nulls(&arrays, batch.height())
    };

    Ok(Column::new(
        OUTPUT_NAME,
        ColumnValues::ListUtf8(Array::from_values(rows)),
    ))
}

fn collapse_skipping_nulls(arrays: &[&Array<String>], height: usize) -> Vec<Vec<String>> {
    let mut out = Vec::with_capacity(height);
    for row in 0..height {
        let mut vals = Vec::with_capacity(arrays.len());
        for arr in arrays {
            if let Some(v) = arr.get(row) {
                vals.push(v.clone());
            }
        }
        out.push(vals);
    }
    out
}

// Only the prefix up to the first null is ever touched; its values are read without further
// null checks.
fn collapse_until_first_null(arrays: &[&Array<String>], height: usize) -> Vec<Vec<String>> {
    let mut out = Vec::with_capacity(height);
    for row in 0..height {
        let filled = arrays.iter().take_while(|arr| arr.is_valid(row)).count();
        out.push(arrays[..filled].iter().map(|arr| arr.value(row).clone()).collect());
    }
    out
}

/// Check the null-sentinel layout [`collapse_columns`] relies on when `is_null_sentinel = true`.
///
/// Fails with [`KernelError::PreconditionViolated`] naming the first row holding a value after a
/// null. Works on any dtype.
pub fn verify_null_sentinel(batch: &RowBatch) -> KernelResult<()> {
    for row in 0..batch.height() {
        let Some(first_null) = (0..batch.width()).position(|col| batch.is_null(col, row)) else {
            continue;
        };
        if let Some(col) = (first_null + 1..batch.width()).find(|col| !batch.is_null(*col, row)) {
            return Err(KernelError::PreconditionViolated {
                message: format!(
                    "row {row}: column '{}' holds a value after null column '{}'",
                    batch.columns()[col].name(),
                    batch.columns()[first_null].name()
                ),
            });
        }
    }
    Ok(())
}
