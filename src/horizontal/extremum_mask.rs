//! `is_min` / `is_max` masks over a single column, optionally per partition.
//!
//! Unlike [`super::arg_extremum_horizontal`], which reports only the first tied position, every
//! row tied at the extremum is marked `true`.

use std::collections::HashMap;

use crate::batch::{Array, Column, ColumnValues};
use crate::error::{KernelError, KernelResult};

use super::arg_extremum::ExtremumMode;
use super::{Extremal, beats};

/// `true` wherever the column holds its maximum (all ties included).
pub fn is_max(column: &Column) -> KernelResult<Column> {
    extremum_mask(column, ExtremumMode::Max)
}

/// `true` wherever the column holds its minimum (all ties included).
pub fn is_min(column: &Column) -> KernelResult<Column> {
    extremum_mask(column, ExtremumMode::Min)
}

/// Mark every position whose value equals the column's min/max.
///
/// Null and NaN positions are always `false`. A column with no comparable value yields all
/// `false`; a zero-row column yields an empty mask.
pub fn extremum_mask(column: &Column, mode: ExtremumMode) -> KernelResult<Column> {
    extremum_mask_over(column, None, mode)
}

/// Like [`extremum_mask`], but the extremum is computed independently within each group of
/// `partition` (rows with equal keys; null keys form one group of their own). `None` means one
/// group holding every row.
pub fn extremum_mask_over(
    column: &Column,
    partition: Option<&Column>,
    mode: ExtremumMode,
) -> KernelResult<Column> {
    let (groups, n_groups) = match partition {
        Some(keys) => {
            if keys.len() != column.len() {
                return Err(KernelError::ShapeMismatch {
                    column: keys.name().to_string(),
                    expected: column.len(),
                    actual: keys.len(),
                });
            }
            group_ids(keys)
        }
        None => (vec![0; column.len()], usize::from(!column.is_empty())),
    };

    macro_rules! mask {
        ($arr:expr) => {
            match mode {
                ExtremumMode::Max => mask_typed::<_, true>($arr, &groups, n_groups),
                ExtremumMode::Min => mask_typed::<_, false>($arr, &groups, n_groups),
            }
        };
    }

    let mask = match column.values() {
        ColumnValues::Boolean(a) => mask!(a),
        ColumnValues::Int32(a) => mask!(a),
        ColumnValues::Int64(a) => mask!(a),
        ColumnValues::UInt32(a) => mask!(a),
        ColumnValues::UInt64(a) => mask!(a),
        ColumnValues::Float32(a) => mask!(a),
        ColumnValues::Float64(a) => mask!(a),
        ColumnValues::Utf8(a) => mask!(a),
        other => {
            return Err(KernelError::type_mismatch(format!(
                "column '{}' of type {} has no ordering",
                column.name(),
                other.data_type()
            )));
        }
    };

    Ok(Column::new(
        column.name(),
        ColumnValues::Boolean(Array::from_values(mask)),
    ))
}

fn mask_typed<T: Extremal, const IS_MAX: bool>(
    arr: &Array<T>,
    groups: &[usize],
    n_groups: usize,
) -> Vec<bool> {
    let comparable = move |row: usize| arr.get(row).filter(|v| !v.is_nan());

    let mut best: Vec<Option<&T>> = vec![None; n_groups];
    for (row, &g) in groups.iter().enumerate() {
        if let Some(v) = comparable(row) {
            if best[g].is_none_or(|current| beats::<T, IS_MAX>(v, current)) {
                best[g] = Some(v);
            }
        }
    }

    groups
        .iter()
        .enumerate()
        .map(|(row, &g)| match (comparable(row), best[g]) {
            (Some(v), Some(b)) => v == b,
            _ => false,
        })
        .collect()
}

#[derive(PartialEq, Eq, Hash)]
enum GroupKey<'a> {
    Null,
    Bool(bool),
    Int(i128),
    Float(u64),
    Str(&'a str),
    StrList(&'a [String]),
    IntList(&'a [u32]),
}

// -0.0 and 0.0 share a group, as do all NaN payloads.
fn float_key(v: f64) -> GroupKey<'static> {
    let v = if v == 0.0 {
        0.0
    } else if v.is_nan() {
        f64::NAN
    } else {
        v
    };
    GroupKey::Float(v.to_bits())
}

/// Dense group id per row (in first-seen order) and the number of groups.
fn group_ids(keys: &Column) -> (Vec<usize>, usize) {
    fn key_at<'a>(values: &'a ColumnValues, row: usize) -> GroupKey<'a> {
        let key = match values {
            ColumnValues::Boolean(a) => a.get(row).map(|v| GroupKey::Bool(*v)),
            ColumnValues::Int32(a) => a.get(row).map(|v| GroupKey::Int(i128::from(*v))),
            ColumnValues::Int64(a) => a.get(row).map(|v| GroupKey::Int(i128::from(*v))),
            ColumnValues::UInt32(a) => a.get(row).map(|v| GroupKey::Int(i128::from(*v))),
            ColumnValues::UInt64(a) => a.get(row).map(|v| GroupKey::Int(i128::from(*v))),
            ColumnValues::Float32(a) => a.get(row).map(|v| float_key(f64::from(*v))),
            ColumnValues::Float64(a) => a.get(row).map(|v| float_key(*v)),
            ColumnValues::Utf8(a) => a.get(row).map(|v| GroupKey::Str(v.as_str())),
            ColumnValues::ListUtf8(a) => a.get(row).map(|v| GroupKey::StrList(v.as_slice())),
            ColumnValues::ListUInt32(a) => a.get(row).map(|v| GroupKey::IntList(v.as_slice())),
        };
        key.unwrap_or(GroupKey::Null)
    }

    let mut seen: HashMap<GroupKey<'_>, usize> = HashMap::new();
    let ids = (0..keys.len())
        .map(|row| {
            let next = seen.len();
            *seen.entry(key_at(keys.values(), row)).or_insert(next)
        })
        .collect();
    (ids, seen.len())
}
