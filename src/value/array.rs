//! Shared, growable storage for positional field arrays.

use std::{
    cell::{Ref, RefCell},
    fmt,
    rc::Rc,
};

use bytes::{Bytes, BytesMut};

use super::{MAX_NESTING_DEPTH, WireError, WireValue, codec, fmt_nested};

/// Ordered sequence of [`WireValue`]s; insertion order is wire order.
///
/// `FieldArray` is a handle. Cloning it (directly or through a
/// [`WireValue::Array`]) shares the same backing buffer, and a push through
/// any handle is visible through all of them. Elements are addressed by
/// position, never by reference, so growth of the buffer cannot invalidate
/// anything a caller holds.
///
/// An array may hold a handle to itself. Equality, `Debug` and
/// [`deep_clone`](Self::deep_clone) stop at [`MAX_NESTING_DEPTH`] levels, and
/// the cycle keeps its storage alive until [`clear`](Self::clear) breaks it.
#[derive(Clone, Default)]
pub struct FieldArray {
    entries: Rc<RefCell<Vec<WireValue>>>,
}

impl FieldArray {
    /// Create an empty array.
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Create an empty array with room for `capacity` values.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Rc::new(RefCell::new(Vec::with_capacity(capacity))),
        }
    }

    /// Append a value. Every handle sharing this storage observes it.
    ///
    /// # Panics
    ///
    /// Panics if a [`view`](Self::view) of this storage is still borrowed.
    pub fn push(&mut self, value: impl Into<WireValue>) {
        self.entries.borrow_mut().push(value.into());
    }

    /// Remove every value, dropping any handles the array held.
    ///
    /// # Panics
    ///
    /// Panics if a [`view`](Self::view) of this storage is still borrowed.
    pub fn clear(&mut self) { self.entries.borrow_mut().clear(); }

    /// Number of values in the array.
    #[must_use]
    pub fn len(&self) -> usize { self.entries.borrow().len() }

    /// Whether the array holds no values.
    #[must_use]
    pub fn is_empty(&self) -> bool { self.entries.borrow().is_empty() }

    /// Clone the value at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<WireValue> { self.entries.borrow().get(index).cloned() }

    /// Borrow the current contiguous view of the array.
    ///
    /// The view reflects the storage as it is now; request a fresh one after
    /// any push instead of holding it across mutations.
    #[must_use]
    pub fn view(&self) -> Ref<'_, [WireValue]> { Ref::map(self.entries.borrow(), Vec::as_slice) }

    /// Snapshot the values into an owned vector.
    #[must_use]
    pub fn to_vec(&self) -> Vec<WireValue> { self.entries.borrow().clone() }

    /// Whether `self` and `other` share the same backing storage.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool { Rc::ptr_eq(&self.entries, &other.entries) }

    /// Number of handles sharing this storage.
    #[must_use]
    pub fn handle_count(&self) -> usize { Rc::strong_count(&self.entries) }

    /// Copy the array into fresh storage, recursively detaching nested
    /// containers.
    ///
    /// # Errors
    ///
    /// Returns [`WireError::NestingTooDeep`] when containers nest deeper than
    /// [`MAX_NESTING_DEPTH`], including through a handle to an enclosing
    /// container.
    pub fn deep_clone(&self) -> Result<Self, WireError> { self.deep_clone_at(1) }

    pub(super) fn deep_clone_at(&self, depth: usize) -> Result<Self, WireError> {
        if depth > MAX_NESTING_DEPTH {
            return Err(WireError::NestingTooDeep {
                limit: MAX_NESTING_DEPTH,
            });
        }
        self.view()
            .iter()
            .map(|value| value.deep_clone_at(depth))
            .collect()
    }

    /// Past the nesting limit, storages that are not shared compare unequal.
    pub(super) fn eq_at(&self, other: &Self, depth: usize) -> bool {
        if self.ptr_eq(other) {
            return true;
        }
        if depth > MAX_NESTING_DEPTH {
            return false;
        }
        let (lhs, rhs) = (self.view(), other.view());
        lhs.len() == rhs.len() && lhs.iter().zip(rhs.iter()).all(|(a, b)| a.eq_at(b, depth))
    }

    /// Append the array's wire form (`u32` byte length, tagged values) to
    /// `dst`.
    ///
    /// # Errors
    ///
    /// Returns [`WireError`] when a nested value cannot be encoded.
    pub fn encode(&self, dst: &mut BytesMut) -> Result<(), WireError> {
        codec::encode_array_at(self, dst, 1)
    }

    /// Decode an array from the front of `src`.
    ///
    /// # Errors
    ///
    /// Returns [`WireError`] when the input is truncated or malformed.
    pub fn decode(src: &mut Bytes) -> Result<Self, WireError> { codec::decode_array_at(src, 1) }
}

impl PartialEq for FieldArray {
    fn eq(&self, other: &Self) -> bool { self.eq_at(other, 1) }
}

impl Eq for FieldArray {}

impl fmt::Debug for FieldArray {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_nested(f, |f| f.debug_list().entries(self.view().iter()).finish())
    }
}

impl<V: Into<WireValue>> FromIterator<V> for FieldArray {
    fn from_iter<I: IntoIterator<Item = V>>(iter: I) -> Self {
        let values: Vec<WireValue> = iter.into_iter().map(Into::into).collect();
        Self::from(values)
    }
}

impl From<Vec<WireValue>> for FieldArray {
    fn from(values: Vec<WireValue>) -> Self {
        Self {
            entries: Rc::new(RefCell::new(values)),
        }
    }
}
