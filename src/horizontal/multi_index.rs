//! Gather strings from a shared lookup array using integer index columns.
//!
//! Output row `i` of column `c` depends only on input row `i` of column `c` and the lookup, so a
//! large dataset can be processed one chunk at a time against the same resident lookup.

use crate::batch::{Array, Column, ColumnValues, RowBatch};
use crate::error::{KernelError, KernelResult};

/// Integer dtypes accepted as gather indices.
trait GatherIndex: Copy {
    /// The index as a lookup position, or `None` when it cannot be one (negative / too wide).
    fn to_position(self) -> Option<usize>;

    /// Wrapping conversion used by the unchecked path.
    fn as_position(self) -> usize;

    fn widen(self) -> i128;
}

macro_rules! impl_gather_index {
    ($($ty:ty),*) => {$(
        impl GatherIndex for $ty {
            #[inline]
            fn to_position(self) -> Option<usize> {
                usize::try_from(self).ok()
            }

            #[inline]
            fn as_position(self) -> usize {
                self as usize
            }

            fn widen(self) -> i128 {
                i128::from(self)
            }
        }
    )*};
}

impl_gather_index!(i32, i64, u32, u64);

/// Replace every integer index in `batch` with `lookup[index]`.
///
/// Columns must be Int32, Int64, UInt32 or UInt64. Null indices (and null lookup entries) yield
/// null. An index outside `0..lookup.len()` fails the whole call with
/// [`KernelError::IndexOutOfBounds`]. The output batch keeps every column name.
pub fn multi_index(batch: &RowBatch, lookup: &Array<String>) -> KernelResult<RowBatch> {
    let columns = batch
        .columns()
        .iter()
        .map(|col| {
            let gathered = match col.values() {
                ColumnValues::Int32(idx) => gather_checked(col.name(), idx, lookup)?,
                ColumnValues::Int64(idx) => gather_checked(col.name(), idx, lookup)?,
                ColumnValues::UInt32(idx) => gather_checked(col.name(), idx, lookup)?,
                ColumnValues::UInt64(idx) => gather_checked(col.name(), idx, lookup)?,
                other => return Err(not_an_index(col, other)),
            };
            Ok(Column::new(col.name(), ColumnValues::Utf8(gathered)))
        })
        .collect::<KernelResult<Vec<_>>>()?;
    RowBatch::try_new(columns)
}

/// [`multi_index`] without bounds checks, for trusted inputs.
///
/// Dtypes are still validated.
///
/// # Safety
///
/// Every non-null index in `batch` must satisfy `0 <= index < lookup.len()`. An index outside
/// that range reads out of bounds.
pub unsafe fn multi_index_unchecked(
    batch: &RowBatch,
    lookup: &Array<String>,
) -> KernelResult<RowBatch> {
    let columns = batch
        .columns()
        .iter()
        .map(|col| {
            // SAFETY: the caller guarantees every index is within the lookup.
            let gathered = unsafe {
                match col.values() {
                    ColumnValues::Int32(idx) => gather_unchecked(idx, lookup),
                    ColumnValues::Int64(idx) => gather_unchecked(idx, lookup),
                    ColumnValues::UInt32(idx) => gather_unchecked(idx, lookup),
                    ColumnValues::UInt64(idx) => gather_unchecked(idx, lookup),
                    other => return Err(not_an_index(col, other)),
                }
            };
            Ok(Column::new(col.name(), ColumnValues::Utf8(gathered)))
        })
        .collect::<KernelResult<Vec<_>>>()?;
    RowBatch::try_new(columns)
}

fn not_an_index(col: &Column, values: &ColumnValues) -> KernelError {
    KernelError::type_mismatch(format!(
        "column '{}' is not an integer column, got: {}",
        col.name(),
        values.data_type()
    ))
}

fn gather_checked<I: GatherIndex>(
    column: &str,
    indices: &Array<I>,
    lookup: &Array<String>,
) -> KernelResult<Array<String>> {
    let mut out = Vec::with_capacity(indices.len());
    for (row, idx) in indices.iter().enumerate() {
        let Some(&idx) = idx else {
            out.push(None);
            continue;
        };
        let pos = idx
            .to_position()
            .filter(|p| *p < lookup.len())
            .ok_or_else(|| KernelError::IndexOutOfBounds {
                column: column.to_string(),
                row,
                index: idx.widen(),
                len: lookup.len(),
            })?;
        out.push(lookup.get(pos).cloned());
    }
    Ok(Array::from_options(out))
}

/// # Safety
///
/// Every non-null index must be a valid position in `lookup`.
unsafe fn gather_unchecked<I: GatherIndex>(
    indices: &Array<I>,
    lookup: &Array<String>,
) -> Array<String> {
    indices
        .iter()
        .map(|idx| {
            idx.and_then(|&i| {
                let pos = i.as_position();
                debug_assert!(pos < lookup.len(), "gather index {pos} out of bounds");
                // SAFETY: upheld by the caller.
                unsafe { lookup.get_unchecked(pos) }.cloned()
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{multi_index, multi_index_unchecked};
    use crate::batch::{Array, Column, RowBatch};
    use crate::error::KernelError;

    fn lookup(values: &[&str]) -> Array<String> {
        Array::from_values(values.iter().map(|s| s.to_string()).collect())
    }

    fn strings(col: &Column) -> Vec<Option<&str>> {
        col.as_utf8()
            .unwrap()
            .iter()
            .map(|v| v.map(String::as_str))
            .collect()
    }

    #[test]
    fn gathers_per_column_and_keeps_names() {
        let batch = RowBatch::try_new(vec![
            Column::int64("foo", vec![Some(0), Some(1), Some(2)]),
            Column::int32("duchess", vec![None, Some(3), Some(0)]),
        ])
        .unwrap();
        let out = multi_index(&batch, &lookup(&["hi", "how", "are", "you"])).unwrap();
        assert_eq!(out.names().collect::<Vec<_>>(), vec!["foo", "duchess"]);
        assert_eq!(strings(&out.columns()[0]), vec![Some("hi"), Some("how"), Some("are")]);
        assert_eq!(strings(&out.columns()[1]), vec![None, Some("you"), Some("hi")]);
    }

    #[test]
    fn out_of_range_fails() {
        let batch = RowBatch::try_new(vec![Column::uint32("i", vec![Some(0), Some(2)])]).unwrap();
        match multi_index(&batch, &lookup(&["a", "b"])).unwrap_err() {
            KernelError::IndexOutOfBounds {
                column,
                row,
                index,
                len,
            } => {
                assert_eq!((column.as_str(), row, index, len), ("i", 1, 2, 2));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn negative_index_is_out_of_bounds() {
        let batch = RowBatch::try_new(vec![Column::int64("i", vec![Some(-1)])]).unwrap();
        assert!(matches!(
            multi_index(&batch, &lookup(&["a"])).unwrap_err(),
            KernelError::IndexOutOfBounds { index: -1, .. }
        ));
    }

    #[test]
    fn null_lookup_entries_propagate() {
        let table: Array<String> = Array::from_options(vec![Some("a".to_string()), None]);
        let batch = RowBatch::try_new(vec![Column::uint64("i", vec![Some(1), Some(0)])]).unwrap();
        let out = multi_index(&batch, &table).unwrap();
        assert_eq!(strings(&out.columns()[0]), vec![None, Some("a")]);
    }

    #[test]
    fn unchecked_matches_checked_on_valid_input() {
        let batch = RowBatch::try_new(vec![Column::int32("i", vec![Some(2), None, Some(0)])]).unwrap();
        let table = lookup(&["alpha", "beta", "gamma"]);
        let checked = multi_index(&batch, &table).unwrap();
        let unchecked = unsafe { multi_index_unchecked(&batch, &table) }.unwrap();
        assert_eq!(checked, unchecked);
    }

    #[test]
    fn rejects_non_integer_columns() {
        let batch = RowBatch::try_new(vec![Column::float64("f", vec![Some(0.0)])]).unwrap();
        assert!(matches!(
            multi_index(&batch, &lookup(&["a"])).unwrap_err(),
            KernelError::TypeMismatch { .. }
        ));
    }
}
