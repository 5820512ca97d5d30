//! Polars `Series`/`DataFrame` conversions.
//!
//! Lets the kernels run on data held by Polars:
//!
//! ```rust
//! use polars::prelude::*;
//! use horizontal_kernels::batch::RowBatch;
//! use horizontal_kernels::horizontal::arg_first_null_horizontal;
//!
//! let df = df!("a" => [Some(1i64), None], "b" => [None, Some(2i64)]).unwrap();
//! let batch = RowBatch::try_from(&df).unwrap();
//! let out: Series = (&arg_first_null_horizontal(&batch)).into();
//! assert_eq!(out.u32().unwrap().get(0), Some(1));
//! ```

use ::polars::prelude::{DataFrame, DataType as PlDataType, NamedFrom, PlSmallStr, Series};

use crate::batch::{Array, Column, ColumnValues, RowBatch};
use crate::error::{KernelError, KernelResult};

impl TryFrom<&Series> for Column {
    type Error = KernelError;

    fn try_from(s: &Series) -> KernelResult<Self> {
        let name = s.name().as_str();
        let values = match s.dtype() {
            PlDataType::Boolean => ColumnValues::Boolean(s.bool()?.into_iter().collect()),
            PlDataType::Int32 => ColumnValues::Int32(s.i32()?.into_iter().collect()),
            PlDataType::Int64 => ColumnValues::Int64(s.i64()?.into_iter().collect()),
            PlDataType::UInt32 => ColumnValues::UInt32(s.u32()?.into_iter().collect()),
            PlDataType::UInt64 => ColumnValues::UInt64(s.u64()?.into_iter().collect()),
            PlDataType::Float32 => ColumnValues::Float32(s.f32()?.into_iter().collect()),
            PlDataType::Float64 => ColumnValues::Float64(s.f64()?.into_iter().collect()),
            PlDataType::String => {
                ColumnValues::Utf8(s.str()?.into_iter().map(|v| v.map(str::to_string)).collect())
            }
            PlDataType::List(inner) if **inner == PlDataType::String => {
                let lists = s
                    .list()?
                    .into_iter()
                    .map(|row| row.map(|items| list_strings(name, &items)).transpose())
                    .collect::<KernelResult<Vec<_>>>()?;
                ColumnValues::ListUtf8(Array::from_options(lists))
            }
            PlDataType::List(inner) if **inner == PlDataType::UInt32 => {
                let lists = s
                    .list()?
                    .into_iter()
                    .map(|row| row.map(|items| list_u32(name, &items)).transpose())
                    .collect::<KernelResult<Vec<_>>>()?;
                ColumnValues::ListUInt32(Array::from_options(lists))
            }
            other => {
                return Err(KernelError::type_mismatch(format!(
                    "column '{name}' has unsupported polars dtype: {other}"
                )));
            }
        };
        Ok(Column::new(name, values))
    }
}

fn list_strings(column: &str, items: &Series) -> KernelResult<Vec<String>> {
    items
        .str()?
        .into_iter()
        .map(|v| v.map(str::to_string).ok_or_else(|| null_list_item(column)))
        .collect()
}

fn list_u32(column: &str, items: &Series) -> KernelResult<Vec<u32>> {
    items
        .u32()?
        .into_iter()
        .map(|v| v.ok_or_else(|| null_list_item(column)))
        .collect()
}

fn null_list_item(column: &str) -> KernelError {
    KernelError::type_mismatch(format!("list column '{column}' contains null elements"))
}

impl From<&Column> for Series {
    fn from(col: &Column) -> Self {
        let name: PlSmallStr = col.name().into();
        match col.values() {
            ColumnValues::Boolean(a) => Series::new(name, a.to_vec()),
            ColumnValues::Int32(a) => Series::new(name, a.to_vec()),
            ColumnValues::Int64(a) => Series::new(name, a.to_vec()),
            ColumnValues::UInt32(a) => Series::new(name, a.to_vec()),
            ColumnValues::UInt64(a) => Series::new(name, a.to_vec()),
            ColumnValues::Float32(a) => Series::new(name, a.to_vec()),
            ColumnValues::Float64(a) => Series::new(name, a.to_vec()),
            ColumnValues::Utf8(a) => Series::new(name, a.to_vec()),
            ColumnValues::ListUtf8(a) => {
                let rows: Vec<Option<Series>> = a
                    .iter()
                    .map(|v| v.map(|xs| Series::new(PlSmallStr::EMPTY, xs.as_slice())))
                    .collect();
                Series::new(name, rows)
            }
            ColumnValues::ListUInt32(a) => {
                let rows: Vec<Option<Series>> = a
                    .iter()
                    .map(|v| v.map(|xs| Series::new(PlSmallStr::EMPTY, xs.as_slice())))
                    .collect();
                Series::new(name, rows)
            }
        }
    }
}

impl TryFrom<&DataFrame> for RowBatch {
    type Error = KernelError;

    fn try_from(df: &DataFrame) -> KernelResult<Self> {
        let columns = df
            .get_columns()
            .iter()
            .map(|c| Column::try_from(c.as_materialized_series()))
            .collect::<KernelResult<Vec<_>>>()?;
        RowBatch::try_new(columns)
    }
}

impl RowBatch {
    /// Every column as a Polars `Series`, in batch order.
    pub fn to_series(&self) -> Vec<Series> {
        self.columns().iter().map(Series::from).collect()
    }
}
