//! Named, typed, nullable columns.

use crate::error::{KernelError, KernelResult};
use crate::types::DataType;

use super::array::Array;

/// Typed storage of a [`Column`], one variant per supported [`DataType`].
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnValues {
    Boolean(Array<bool>),
    Int32(Array<i32>),
    Int64(Array<i64>),
    UInt32(Array<u32>),
    UInt64(Array<u64>),
    Float32(Array<f32>),
    Float64(Array<f64>),
    Utf8(Array<String>),
    /// List of strings per row (collapse output).
    ListUtf8(Array<Vec<String>>),
    /// List of column positions per row (arg-true output).
    ListUInt32(Array<Vec<u32>>),
}

/// Evaluate `$body` with `$arr` bound to the inner [`Array`] of whatever variant `$values` holds.
macro_rules! with_array {
    ($values:expr, $arr:ident => $body:expr) => {
        match $values {
            ColumnValues::Boolean($arr) => $body,
            ColumnValues::Int32($arr) => $body,
            ColumnValues::Int64($arr) => $body,
            ColumnValues::UInt32($arr) => $body,
            ColumnValues::UInt64($arr) => $body,
            ColumnValues::Float32($arr) => $body,
            ColumnValues::Float64($arr) => $body,
            ColumnValues::Utf8($arr) => $body,
            ColumnValues::ListUtf8($arr) => $body,
            ColumnValues::ListUInt32($arr) => $body,
        }
    };
}

/// Rebuild the same variant from a mapped inner array.
macro_rules! map_array {
    ($values:expr, $arr:ident => $body:expr) => {
        match $values {
            ColumnValues::Boolean($arr) => ColumnValues::Boolean($body),
            ColumnValues::Int32($arr) => ColumnValues::Int32($body),
            ColumnValues::Int64($arr) => ColumnValues::Int64($body),
            ColumnValues::UInt32($arr) => ColumnValues::UInt32($body),
            ColumnValues::UInt64($arr) => ColumnValues::UInt64($body),
            ColumnValues::Float32($arr) => ColumnValues::Float32($body),
            ColumnValues::Float64($arr) => ColumnValues::Float64($body),
            ColumnValues::Utf8($arr) => ColumnValues::Utf8($body),
            ColumnValues::ListUtf8($arr) => ColumnValues::ListUtf8($body),
            ColumnValues::ListUInt32($arr) => ColumnValues::ListUInt32($body),
        }
    };
}

impl ColumnValues {
    pub fn len(&self) -> usize {
        with_array!(self, a => a.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub fn is_null(&self, row: usize) -> bool {
        with_array!(self, a => a.is_null(row))
    }

    pub fn null_count(&self) -> usize {
        with_array!(self, a => a.null_count())
    }

    pub fn data_type(&self) -> DataType {
        match self {
            Self::Boolean(_) => DataType::Boolean,
            Self::Int32(_) => DataType::Int32,
            Self::Int64(_) => DataType::Int64,
            Self::UInt32(_) => DataType::UInt32,
            Self::UInt64(_) => DataType::UInt64,
            Self::Float32(_) => DataType::Float32,
            Self::Float64(_) => DataType::Float64,
            Self::Utf8(_) => DataType::Utf8,
            Self::ListUtf8(_) => DataType::List(Box::new(DataType::Utf8)),
            Self::ListUInt32(_) => DataType::List(Box::new(DataType::UInt32)),
        }
    }

    fn slice(&self, offset: usize, len: usize) -> Self {
        map_array!(self, a => a.slice(offset, len))
    }
}

/// A named column: the unit a [`super::RowBatch`] is built from.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    name: String,
    values: ColumnValues,
}

macro_rules! typed_column {
    ($ctor:ident, $getter:ident, $variant:ident, $ty:ty) => {
        /// Build a column from optional values.
        pub fn $ctor<I>(name: impl Into<String>, values: I) -> Self
        where
            I: IntoIterator<Item = Option<$ty>>,
        {
            Self::new(name, ColumnValues::$variant(Array::from_options(values)))
        }

        pub fn $getter(&self) -> Option<&Array<$ty>> {
            match &self.values {
                ColumnValues::$variant(a) => Some(a),
                _ => None,
            }
        }
    };
}

impl Column {
    pub fn new(name: impl Into<String>, values: ColumnValues) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    typed_column!(boolean, as_boolean, Boolean, bool);
    typed_column!(int32, as_int32, Int32, i32);
    typed_column!(int64, as_int64, Int64, i64);
    typed_column!(uint32, as_uint32, UInt32, u32);
    typed_column!(uint64, as_uint64, UInt64, u64);
    typed_column!(float32, as_float32, Float32, f32);
    typed_column!(float64, as_float64, Float64, f64);
    typed_column!(list_utf8, as_list_utf8, ListUtf8, Vec<String>);
    typed_column!(list_uint32, as_list_uint32, ListUInt32, Vec<u32>);

    /// Build a string column from optional values.
    pub fn utf8<I, S>(name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = Option<S>>,
        S: Into<String>,
    {
        Self::new(
            name,
            ColumnValues::Utf8(values.into_iter().map(|v| v.map(Into::into)).collect()),
        )
    }

    pub fn as_utf8(&self) -> Option<&Array<String>> {
        match &self.values {
            ColumnValues::Utf8(a) => Some(a),
            _ => None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn values(&self) -> &ColumnValues {
        &self.values
    }

    pub fn into_values(self) -> ColumnValues {
        self.values
    }

    pub fn data_type(&self) -> DataType {
        self.values.data_type()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    #[inline]
    pub fn is_null(&self, row: usize) -> bool {
        self.values.is_null(row)
    }

    pub fn null_count(&self) -> usize {
        self.values.null_count()
    }

    /// Copy of `len` rows starting at `offset`.
    ///
    /// # Panics
    ///
    /// Panics if `offset + len` exceeds the column length.
    pub fn slice(&self, offset: usize, len: usize) -> Self {
        Self {
            name: self.name.clone(),
            values: self.values.slice(offset, len),
        }
    }

    /// Concatenate same-typed columns end to end; the result takes the first column's name.
    pub fn concat(parts: &[Column]) -> KernelResult<Column> {
        let first = parts.first().ok_or(KernelError::EmptyInput { kernel: "concat" })?;

        macro_rules! concat_variant {
            ($variant:ident) => {{
                let mut arrays = Vec::with_capacity(parts.len());
                for part in parts {
                    match &part.values {
                        ColumnValues::$variant(a) => arrays.push(a),
                        other => {
                            return Err(KernelError::type_mismatch(format!(
                                "cannot concatenate column '{}' of type {} with type {}",
                                part.name,
                                other.data_type(),
                                first.data_type()
                            )));
                        }
                    }
                }
                ColumnValues::$variant(Array::concat(&arrays))
            }};
        }

        let values = match &first.values {
            ColumnValues::Boolean(_) => concat_variant!(Boolean),
            ColumnValues::Int32(_) => concat_variant!(Int32),
            ColumnValues::Int64(_) => concat_variant!(Int64),
            ColumnValues::UInt32(_) => concat_variant!(UInt32),
            ColumnValues::UInt64(_) => concat_variant!(UInt64),
            ColumnValues::Float32(_) => concat_variant!(Float32),
            ColumnValues::Float64(_) => concat_variant!(Float64),
            ColumnValues::Utf8(_) => concat_variant!(Utf8),
            ColumnValues::ListUtf8(_) => concat_variant!(ListUtf8),
            ColumnValues::ListUInt32(_) => concat_variant!(ListUInt32),
        };
        Ok(Column::new(first.name.clone(), values))
    }

    /// Coerce to a boolean column using the dtype's own truthiness.
    ///
    /// Booleans are copied unchanged; numbers are `true` when nonzero (NaN is nonzero). Nulls stay
    /// null. Strings and lists have no truthiness and fail with [`KernelError::TypeMismatch`].
    pub fn cast_boolean(&self) -> KernelResult<Column> {
        fn truthy<T>(a: &Array<T>, f: impl Fn(&T) -> bool) -> Array<bool> {
            a.iter().map(|v| v.map(&f)).collect()
        }

        let values = match &self.values {
            ColumnValues::Boolean(a) => a.clone(),
            ColumnValues::Int32(a) => truthy(a, |v| *v != 0),
            ColumnValues::Int64(a) => truthy(a, |v| *v != 0),
            ColumnValues::UInt32(a) => truthy(a, |v| *v != 0),
            ColumnValues::UInt64(a) => truthy(a, |v| *v != 0),
            ColumnValues::Float32(a) => truthy(a, |v| *v != 0.0),
            ColumnValues::Float64(a) => truthy(a, |v| *v != 0.0),
            other => {
                return Err(KernelError::type_mismatch(format!(
                    "column '{}' of type {} cannot be cast to bool",
                    self.name,
                    other.data_type()
                )));
            }
        };
        Ok(Column::new(self.name.clone(), ColumnValues::Boolean(values)))
    }
}

#[cfg(test)]
mod tests {
    use super::{Column, ColumnValues};
    use crate::error::KernelError;
    use crate::types::DataType;

    #[test]
    fn typed_constructors_and_accessors() {
        let c = Column::int64("a", vec![Some(1), None]);
        assert_eq!(c.name(), "a");
        assert_eq!(c.data_type(), DataType::Int64);
        assert_eq!(c.len(), 2);
        assert!(c.is_null(1));
        assert!(c.as_utf8().is_none());
        assert_eq!(c.as_int64().unwrap().to_vec(), vec![Some(1), None]);
    }

    #[test]
    fn utf8_keeps_empty_strings_as_values() {
        let c = Column::utf8("s", vec![Some(""), None]);
        assert_eq!(c.null_count(), 1);
        assert_eq!(c.as_utf8().unwrap().get(0).map(String::as_str), Some(""));
    }

    #[test]
    fn concat_rejects_mixed_types() {
        let a = Column::int64("a", vec![Some(1)]);
        let b = Column::utf8("a", vec![Some("x")]);
        let err = Column::concat(&[a, b]).unwrap_err();
        assert!(matches!(err, KernelError::TypeMismatch { .. }));
    }

    #[test]
    fn concat_of_slices_round_trips() {
        let c = Column::float64("f", vec![Some(1.0), None, Some(-2.5), Some(4.0)]);
        let parts = vec![c.slice(0, 1), c.slice(1, 2), c.slice(3, 1)];
        assert_eq!(Column::concat(&parts).unwrap(), c);
    }

    #[test]
    fn cast_boolean_uses_truthiness() {
        let c = Column::int32("i", vec![Some(1), Some(0), None, Some(-2)]);
        let b = c.cast_boolean().unwrap();
        assert_eq!(
            b.as_boolean().unwrap().to_vec(),
            vec![Some(true), Some(false), None, Some(true)]
        );

        let f = Column::float64("f", vec![Some(0.0), Some(f64::NAN)]);
        assert_eq!(
            f.cast_boolean().unwrap().as_boolean().unwrap().to_vec(),
            vec![Some(false), Some(true)]
        );

        let s = Column::utf8("s", vec![Some("x")]);
        assert!(matches!(
            s.cast_boolean().unwrap_err(),
            KernelError::TypeMismatch { .. }
        ));
    }

    #[test]
    fn list_dtypes_report_inner_type() {
        let c = Column::new(
            "l",
            ColumnValues::ListUInt32(vec![Some(vec![0u32, 2])].into_iter().collect()),
        );
        assert_eq!(c.data_type(), DataType::List(Box::new(DataType::UInt32)));
    }
}
