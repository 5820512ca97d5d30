//! Positions of `true` columns per row.

use serde::{Deserialize, Serialize};

use crate::batch::{Array, Column, ColumnValues, RowBatch};
use crate::error::KernelResult;

use super::{position, typed_array, typed_arrays};

/// Name of the column produced by [`arg_true_horizontal`].
pub const ARG_TRUE_OUTPUT: &str = "arg_true_horizontal";
/// Name of the column produced by [`arg_first_true_horizontal`].
pub const ARG_FIRST_TRUE_OUTPUT: &str = "arg_first_true_horizontal";

/// For every row, the ascending list of column positions holding `true`.
///
/// Columns must be boolean; coerce other dtypes first with [`Column::cast_boolean`]. Null counts
/// as `false`. A row without any `true` yields an empty list.
pub fn arg_true_horizontal(batch: &RowBatch) -> KernelResult<Column> {
    let arrays = typed_arrays::<bool>(batch)?;
    let mut out = Vec::with_capacity(batch.height());
    for row in 0..batch.height() {
        let hits: Vec<u32> = arrays
            .iter()
            .enumerate()
            .filter(|(_, arr)| arr.get(row) == Some(&true))
            .map(|(col, _)| position(col))
            .collect();
        out.push(hits);
    }
    Ok(Column::new(
        ARG_TRUE_OUTPUT,
        ColumnValues::ListUInt32(Array::from_values(out)),
    ))
}

/// How [`arg_first_true_horizontal`] evaluates a batch.
///
/// Both strategies give the same answer for every input when the cascade lists the batch's
/// column names in batch order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FirstTrueStrategy {
    /// Scan each row left to right over whatever columns the batch holds.
    #[default]
    Dynamic,
    /// Evaluate `when(name_0).then(0).when(name_1).then(1)...` over the named columns; the first
    /// matching clause wins.
    Cascade(Vec<String>),
}

/// One `when(column) then position` clause of a first-true cascade.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WhenThen {
    pub column: String,
    pub then: u32,
}

/// Build the ordered cascade for a statically known list of column names.
pub fn build_first_true_cascade<I, S>(columns: I) -> Vec<WhenThen>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    columns
        .into_iter()
        .enumerate()
        .map(|(i, column)| WhenThen {
            column: column.into(),
            then: position(i),
        })
        .collect()
}

/// Position of the first `true` column per row, or null when no column is `true`.
///
/// Nulls count as `false`. With [`FirstTrueStrategy::Cascade`] only the named columns are read
/// (missing names fail with [`crate::KernelError::ColumnNotFound`]) and the reported position is
/// the clause index.
pub fn arg_first_true_horizontal(
    batch: &RowBatch,
    strategy: &FirstTrueStrategy,
) -> KernelResult<Column> {
    let firsts = match strategy {
        FirstTrueStrategy::Dynamic => first_true_scan(batch)?,
        FirstTrueStrategy::Cascade(names) => {
            first_true_cascade(batch, &build_first_true_cascade(names.iter().cloned()))?
        }
    };
    Ok(Column::new(
        ARG_FIRST_TRUE_OUTPUT,
        ColumnValues::UInt32(Array::from_options(firsts)),
    ))
}

fn first_true_scan(batch: &RowBatch) -> KernelResult<Vec<Option<u32>>> {
    let arrays = typed_arrays::<bool>(batch)?;
    Ok((0..batch.height())
        .map(|row| {
            arrays
                .iter()
                .position(|arr| arr.get(row) == Some(&true))
                .map(position)
        })
        .collect())
}

// Clause by clause, filling only rows that no earlier clause has claimed.
fn first_true_cascade(batch: &RowBatch, clauses: &[WhenThen]) -> KernelResult<Vec<Option<u32>>> {
    let conditions = clauses
        .iter()
        .map(|clause| typed_array::<bool>(batch.column_by_name(&clause.column)?))
        .collect::<KernelResult<Vec<_>>>()?;

    let mut out: Vec<Option<u32>> = vec![None; batch.height()];
    for (clause, cond) in clauses.iter().zip(conditions) {
        for (row, slot) in out.iter_mut().enumerate() {
            if slot.is_none() && cond.get(row) == Some(&true) {
                *slot = Some(clause.then);
            }
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::{
        FirstTrueStrategy, WhenThen, arg_first_true_horizontal, arg_true_horizontal,
        build_first_true_cascade,
    };
    use crate::batch::{Column, RowBatch};
    use crate::error::KernelError;

    fn abc_batch() -> RowBatch {
        RowBatch::try_new(vec![
            Column::boolean("a", vec![Some(true), Some(false), Some(true), None]),
            Column::boolean("b", vec![Some(false), Some(true), Some(true), None]),
            Column::boolean("c", vec![Some(false), None, Some(true), Some(false)]),
        ])
        .unwrap()
    }

    #[test]
    fn arg_true_lists_true_positions() {
        let out = arg_true_horizontal(&abc_batch()).unwrap();
        assert_eq!(
            out.as_list_uint32().unwrap().to_vec(),
            vec![Some(vec![0]), Some(vec![1]), Some(vec![0, 1, 2]), Some(vec![])]
        );
    }

    #[test]
    fn arg_true_requires_booleans() {
        let batch = RowBatch::try_new(vec![Column::int64("a", vec![Some(1)])]).unwrap();
        assert!(matches!(
            arg_true_horizontal(&batch).unwrap_err(),
            KernelError::TypeMismatch { .. }
        ));
    }

    #[test]
    fn first_true_dynamic_scan() {
        let out = arg_first_true_horizontal(&abc_batch(), &FirstTrueStrategy::Dynamic).unwrap();
        assert_eq!(
            out.as_uint32().unwrap().to_vec(),
            vec![Some(0), Some(1), Some(0), None]
        );
    }

    #[test]
    fn cascade_matches_dynamic_scan() {
        let batch = abc_batch();
        let names = batch.names().map(str::to_string).collect();
        let cascade = arg_first_true_horizontal(&batch, &FirstTrueStrategy::Cascade(names)).unwrap();
        let dynamic = arg_first_true_horizontal(&batch, &FirstTrueStrategy::Dynamic).unwrap();
        assert_eq!(cascade, dynamic);
    }

    #[test]
    fn cascade_reports_clause_index_and_missing_columns() {
        let batch = abc_batch();
        let reordered = FirstTrueStrategy::Cascade(vec!["c".into(), "b".into()]);
        let out = arg_first_true_horizontal(&batch, &reordered).unwrap();
        assert_eq!(
            out.as_uint32().unwrap().to_vec(),
            vec![None, Some(1), Some(0), None]
        );

        let missing = FirstTrueStrategy::Cascade(vec!["zzz".into()]);
        assert!(matches!(
            arg_first_true_horizontal(&batch, &missing).unwrap_err(),
            KernelError::ColumnNotFound { .. }
        ));
    }

    #[test]
    fn builder_numbers_clauses_in_order() {
        assert_eq!(
            build_first_true_cascade(["x", "y"]),
            vec![
                WhenThen {
                    column: "x".into(),
                    then: 0
                },
                WhenThen {
                    column: "y".into(),
                    then: 1
                },
            ]
        );
    }

    #[test]
    fn zero_columns_give_empty_output() {
        let batch = RowBatch::try_new(vec![]).unwrap();
        assert!(arg_true_horizontal(&batch).unwrap().is_empty());
        assert!(
            arg_first_true_horizontal(&batch, &FirstTrueStrategy::Dynamic)
                .unwrap()
                .is_empty()
        );
    }
}
