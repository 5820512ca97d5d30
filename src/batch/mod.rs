//! Row batches: equal-length, independently nullable columns processed together by one kernel call.
//!
//! A [`RowBatch`] is a pure data holder. Construction validates that every [`Column`] has the
//! batch height; after that every `(column, row)` null check and value read is O(1).
//!
//! ```rust
//! use horizontal_kernels::batch::{Column, RowBatch};
//!
//! let batch = RowBatch::try_new(vec![
//!     Column::int64("a", vec![Some(1), None]),
//!     Column::utf8("b", vec![None, Some("x")]),
//! ])
//! .unwrap();
//! assert_eq!((batch.width(), batch.height()), (2, 2));
//! assert!(batch.is_null(0, 1));
//! ```

pub mod array;
pub mod column;

pub use array::Array;
pub use column::{Column, ColumnValues};

use std::collections::HashSet;

use crate::error::{KernelError, KernelResult};
use crate::types::{Field, Schema};

/// An ordered set of named columns sharing one height.
#[derive(Debug, Clone, PartialEq)]
pub struct RowBatch {
    columns: Vec<Column>,
    height: usize,
}

impl RowBatch {
    /// Create a batch, failing with [`KernelError::ShapeMismatch`] if column lengths differ and
    /// with [`KernelError::DuplicateColumn`] if two columns share a name.
    ///
    /// The height is taken from the first column; a batch without columns has height 0.
    pub fn try_new(columns: Vec<Column>) -> KernelResult<Self> {
        let height = columns.first().map_or(0, Column::len);
        if let Some(bad) = columns.iter().find(|c| c.len() != height) {
            return Err(KernelError::ShapeMismatch {
                column: bad.name().to_string(),
                expected: height,
                actual: bad.len(),
            });
        }
        let mut seen = HashSet::with_capacity(columns.len());
        if let Some(dup) = columns.iter().find(|c| !seen.insert(c.name())) {
            return Err(KernelError::DuplicateColumn {
                name: dup.name().to_string(),
            });
        }
        Ok(Self { columns, height })
    }

    /// Number of columns (N).
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    /// Number of rows (M).
    pub fn height(&self) -> usize {
        self.height
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn into_columns(self) -> Vec<Column> {
        self.columns
    }

    pub fn column(&self, idx: usize) -> Option<&Column> {
        self.columns.get(idx)
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name() == name)
    }

    pub fn column_by_name(&self, name: &str) -> KernelResult<&Column> {
        self.columns
            .iter()
            .find(|c| c.name() == name)
            .ok_or_else(|| KernelError::ColumnNotFound {
                name: name.to_string(),
            })
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(Column::name)
    }

    pub fn schema(&self) -> Schema {
        Schema::new(
            self.columns
                .iter()
                .map(|c| Field::new(c.name(), c.data_type()))
                .collect(),
        )
    }

    /// Whether the value at `(col, row)` is null.
    ///
    /// # Panics
    ///
    /// Panics if either coordinate is out of range.
    #[inline]
    pub fn is_null(&self, col: usize, row: usize) -> bool {
        self.columns[col].is_null(row)
    }

    /// New batch holding copies of the named columns, in the given order.
    ///
    /// Naming a column twice fails with [`KernelError::DuplicateColumn`].
    pub fn select<S: AsRef<str>>(&self, names: &[S]) -> KernelResult<RowBatch> {
        let columns = names
            .iter()
            .map(|n| self.column_by_name(n.as_ref()).cloned())
            .collect::<KernelResult<Vec<_>>>()?;
        let mut selected = Self::try_new(columns)?;
        selected.height = self.height;
        Ok(selected)
    }

    /// Rows `offset..offset + len`, clamped to the batch height.
    pub fn slice(&self, offset: usize, len: usize) -> RowBatch {
        let offset = offset.min(self.height);
        let len = len.min(self.height - offset);
        Self {
            columns: self.columns.iter().map(|c| c.slice(offset, len)).collect(),
            height: len,
        }
    }

    /// Split into consecutive batches of at most `chunk_size` rows.
    ///
    /// # Panics
    ///
    /// Panics if `chunk_size == 0`.
    pub fn chunks(&self, chunk_size: usize) -> Vec<RowBatch> {
        assert!(chunk_size > 0, "chunk_size must be > 0");
        (0..self.height)
            .step_by(chunk_size)
            .map(|start| self.slice(start, chunk_size))
            .collect()
    }

    /// Stack batches with identical column layout on top of each other.
    pub fn concat(parts: &[RowBatch]) -> KernelResult<RowBatch> {
        let first = parts
            .first()
            .ok_or(KernelError::EmptyInput { kernel: "concat" })?;
        if let Some(bad) = parts.iter().find(|p| p.width() != first.width()) {
            return Err(KernelError::ShapeMismatch {
                column: "<batch width>".to_string(),
                expected: first.width(),
                actual: bad.width(),
            });
        }
        let columns = (0..first.width())
            .map(|i| {
                let pieces: Vec<Column> = parts.iter().map(|p| p.columns[i].clone()).collect();
                Column::concat(&pieces)
            })
            .collect::<KernelResult<Vec<_>>>()?;
        let height = parts.iter().map(RowBatch::height).sum();
        Ok(Self { columns, height })
    }
}
