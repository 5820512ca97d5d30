//! Dense value storage with a per-element null indicator.

/// A dense array of `T` plus an optional validity vector.
///
/// `validity[i] == false` marks position `i` as null; the dense slot underneath holds
/// `T::default()` and carries no meaning. `None` validity means "no nulls".
#[derive(Debug, Clone)]
pub struct Array<T> {
    values: Vec<T>,
    validity: Option<Vec<bool>>,
}

impl<T> Array<T> {
    /// Create an array without nulls.
    pub fn from_values(values: Vec<T>) -> Self {
        Self {
            values,
            validity: None,
        }
    }

    /// Number of elements (valid and null).
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the array holds no elements.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Whether position `i` holds a value.
    #[inline]
    pub fn is_valid(&self, i: usize) -> bool {
        self.validity.as_ref().is_none_or(|v| v[i])
    }

    /// Whether position `i` is null.
    #[inline]
    pub fn is_null(&self, i: usize) -> bool {
        !self.is_valid(i)
    }

    /// Number of null positions.
    pub fn null_count(&self) -> usize {
        self.validity
            .as_ref()
            .map_or(0, |v| v.iter().filter(|valid| !**valid).count())
    }

    /// Value at `i`, or `None` if the slot is null.
    ///
    /// # Panics
    ///
    /// Panics if `i >= len`.
    #[inline]
    pub fn get(&self, i: usize) -> Option<&T> {
        if self.is_valid(i) {
            Some(&self.values[i])
        } else {
            None
        }
    }

    /// Value at `i` without bounds checks.
    ///
    /// # Safety
    ///
    /// `i` must be less than [`Self::len`].
    #[inline]
    pub unsafe fn get_unchecked(&self, i: usize) -> Option<&T> {
        // SAFETY: caller guarantees `i < len`, and validity has the same length as values.
        unsafe {
            match &self.validity {
                Some(v) if !*v.get_unchecked(i) => None,
                _ => Some(self.values.get_unchecked(i)),
            }
        }
    }

    /// Dense slot at `i`, ignoring the null indicator.
    #[inline]
    pub fn value(&self, i: usize) -> &T {
        &self.values[i]
    }

    /// Dense slots, nulls included.
    pub fn values(&self) -> &[T] {
        &self.values
    }

    /// Per-position validity, or `None` when there are no nulls.
    pub fn validity(&self) -> Option<&[bool]> {
        self.validity.as_deref()
    }

    /// Iterate positions in order; nulls come out as `None`.
    pub fn iter(&self) -> impl Iterator<Item = Option<&T>> + '_ {
        (0..self.len()).map(move |i| self.get(i))
    }
}

impl<T: Default> Array<T> {
    /// Build an array from optional values; `None` becomes a null slot.
    pub fn from_options<I>(iter: I) -> Self
    where
        I: IntoIterator<Item = Option<T>>,
    {
        let iter = iter.into_iter();
        let (lower, _) = iter.size_hint();
        let mut values = Vec::with_capacity(lower);
        let mut validity = Vec::with_capacity(lower);
        for item in iter {
            match item {
                Some(v) => {
                    values.push(v);
                    validity.push(true);
                }
                None => {
                    values.push(T::default());
                    validity.push(false);
                }
            }
        }
        let validity = if validity.iter().all(|v| *v) {
            None
        } else {
            Some(validity)
        };
        Self { values, validity }
    }
}

impl<T: Clone> Array<T> {
    /// Copy of `len` elements starting at `offset`.
    ///
    /// # Panics
    ///
    /// Panics if `offset + len` exceeds the array length.
    pub fn slice(&self, offset: usize, len: usize) -> Self {
        let range = offset..offset + len;
        Self {
            values: self.values[range.clone()].to_vec(),
            validity: self
                .validity
                .as_ref()
                .map(|v| v[range].to_vec())
                .filter(|v| v.iter().any(|valid| !*valid)),
        }
    }

    /// Concatenate arrays end to end.
    pub fn concat(parts: &[&Array<T>]) -> Self {
        let total = parts.iter().map(|p| p.len()).sum();
        let mut values = Vec::with_capacity(total);
        for p in parts {
            values.extend_from_slice(&p.values);
        }
        let validity = if parts.iter().any(|p| p.validity.is_some()) {
            let mut validity = Vec::with_capacity(total);
            for p in parts {
                match &p.validity {
                    Some(v) => validity.extend_from_slice(v),
                    None => validity.extend(std::iter::repeat_n(true, p.len())),
                }
            }
            Some(validity)
        } else {
            None
        };
        Self { values, validity }
    }

    /// Materialize as `Vec<Option<T>>`.
    pub fn to_vec(&self) -> Vec<Option<T>> {
        self.iter().map(|v| v.cloned()).collect()
    }
}

impl<T: Default> FromIterator<Option<T>> for Array<T> {
    fn from_iter<I: IntoIterator<Item = Option<T>>>(iter: I) -> Self {
        Self::from_options(iter)
    }
}

// Null slots compare equal regardless of the dense value underneath.
impl<T: PartialEq> PartialEq for Array<T> {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().eq(other.iter())
    }
}
