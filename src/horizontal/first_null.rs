//! Position of the first null column per row.

use crate::batch::{Array, Column, ColumnValues, RowBatch};

use super::position;

/// Name of the column produced by [`arg_first_null_horizontal`].
pub const OUTPUT_NAME: &str = "arg_first_null_horizontal";

/// Position of the first null column in each row (left to right), or null if the row has none.
///
/// Nullability does not depend on dtype, so columns may be of mixed types. Cannot fail.
pub fn arg_first_null_horizontal(batch: &RowBatch) -> Column {
    let firsts: Array<u32> = (0..batch.height())
        .map(|row| {
            batch
                .columns()
                .iter()
                .position(|c| c.is_null(row))
                .map(position)
        })
        .collect();
    Column::new(OUTPUT_NAME, ColumnValues::UInt32(firsts))
}
