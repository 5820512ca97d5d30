//! Arg-min / arg-max across the columns of each row.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::batch::{Array, Column, ColumnValues, RowBatch};
use crate::error::{KernelError, KernelResult};
use crate::types::DataType;

use super::{Extremal, beats, position, typed_arrays};

/// Direction of an extremum search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtremumMode {
    Min,
    Max,
}

impl ExtremumMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Min => "min",
            Self::Max => "max",
        }
    }
}

impl fmt::Display for ExtremumMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Position (or name, with `return_colname`) of the column holding the row's min/max value.
///
/// - All columns must share one numeric dtype (f64, f32, i64, i32, u64, u32); cast before calling.
/// - Nulls and NaN are skipped; a row with nothing left yields null.
/// - Ties go to the leftmost column.
///
/// The index output is a `u32` column named `arg_{mode}_horizontal`; the name output is a string
/// column named `arg_{mode}_horizontal_colname`.
pub fn arg_extremum_horizontal(
    batch: &RowBatch,
    mode: ExtremumMode,
    return_colname: bool,
) -> KernelResult<Column> {
    let dtype = common_dtype(batch)?;

    macro_rules! scan {
        ($ty:ty) => {{
            let arrays = typed_arrays::<$ty>(batch)?;
            match mode {
                ExtremumMode::Max => scan_rows::<$ty, true>(&arrays, batch.height()),
                ExtremumMode::Min => scan_rows::<$ty, false>(&arrays, batch.height()),
            }
        }};
    }

    let winners = match dtype {
        DataType::Float64 => scan!(f64),
        DataType::Float32 => scan!(f32),
        DataType::Int64 => scan!(i64),
        DataType::Int32 => scan!(i32),
        DataType::UInt64 => scan!(u64),
        DataType::UInt32 => scan!(u32),
        other => {
            return Err(KernelError::type_mismatch(format!(
                "column '{}' is not a numeric column, got: {other}",
                batch.columns()[0].name()
            )));
        }
    };

    let base = format!("arg_{mode}_horizontal");
    if return_colname {
        let names: Vec<&str> = batch.names().collect();
        let values = winners
            .into_iter()
            .map(|idx| idx.map(|i| names[i as usize].to_string()))
            .collect();
        Ok(Column::new(format!("{base}_colname"), ColumnValues::Utf8(values)))
    } else {
        Ok(Column::new(
            base,
            ColumnValues::UInt32(Array::from_options(winners)),
        ))
    }
}

/// Position of the largest value per row.
pub fn arg_max_horizontal(batch: &RowBatch) -> KernelResult<Column> {
    arg_extremum_horizontal(batch, ExtremumMode::Max, false)
}

/// Position of the smallest value per row.
pub fn arg_min_horizontal(batch: &RowBatch) -> KernelResult<Column> {
    arg_extremum_horizontal(batch, ExtremumMode::Min, false)
}

/// Name of the column holding the largest value per row.
pub fn arg_max_horizontal_colname(batch: &RowBatch) -> KernelResult<Column> {
    arg_extremum_horizontal(batch, ExtremumMode::Max, true)
}

/// Name of the column holding the smallest value per row.
pub fn arg_min_horizontal_colname(batch: &RowBatch) -> KernelResult<Column> {
    arg_extremum_horizontal(batch, ExtremumMode::Min, true)
}

fn common_dtype(batch: &RowBatch) -> KernelResult<DataType> {
    let first = batch.column(0).ok_or(KernelError::EmptyInput {
        kernel: "arg_extremum_horizontal",
    })?;
    let dtype = first.data_type();
    if let Some(other) = batch.columns().iter().find(|c| c.data_type() != dtype) {
        return Err(KernelError::type_mismatch(format!(
            "All input columns must have the same type: '{}' is {} but '{}' is {}",
            first.name(),
            dtype,
            other.name(),
            other.data_type()
        )));
    }
    Ok(dtype)
}

// `IS_MAX` is a const parameter so the comparison direction is fixed per instantiation.
fn scan_rows<T: Extremal, const IS_MAX: bool>(
    arrays: &[&Array<T>],
    height: usize,
) -> Vec<Option<u32>> {
    let mut out = Vec::with_capacity(height);
    for row in 0..height {
        let mut best: Option<(usize, &T)> = None;
        for (col, arr) in arrays.iter().enumerate() {
            let Some(value) = arr.get(row) else { continue };
            if value.is_nan() {
                continue;
            }
            if best.is_none_or(|(_, current)| beats::<T, IS_MAX>(value, current)) {
                best = Some((col, value));
            }
        }
        out.push(best.map(|(col, _)| position(col)));
    }
    out
}
