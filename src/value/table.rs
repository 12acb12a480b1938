//! Shared, growable storage for key/value field tables.

use std::{
    cell::{Ref, RefCell},
    fmt,
    rc::Rc,
};

use bytes::{Bytes, BytesMut};

use super::{MAX_NESTING_DEPTH, WireError, WireValue, codec, fmt_nested};

/// One key/value pair of a [`FieldTable`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TableEntry {
    /// Entry key; a short string on the wire.
    pub key: Bytes,
    /// Entry value.
    pub value: WireValue,
}

/// Ordered sequence of key/value pairs.
///
/// Keys are not deduplicated: the table keeps whatever the broker sent or
/// the application added, repeats included, in order. Lookups return the
/// first match. Like [`FieldArray`](super::FieldArray), a `FieldTable` is a
/// handle onto shared storage, and the same nesting bounds and cycle
/// caveat apply.
///
/// # Examples
///
/// ```
/// use amqpframe::value::{FieldTable, WireValue};
///
/// let mut table = FieldTable::new();
/// table.add("x-retry", 1_u8);
/// table.add("x-retry", 2_u8);
///
/// assert_eq!(table.len(), 2);
/// assert_eq!(table.get("x-retry"), Some(WireValue::U8(1)));
/// assert_eq!(table.get_all("x-retry").len(), 2);
/// ```
#[derive(Clone, Default)]
pub struct FieldTable {
    entries: Rc<RefCell<Vec<TableEntry>>>,
}

impl FieldTable {
    /// Create an empty table.
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Append a key/value pair, keeping any earlier entry with the same key.
    ///
    /// # Panics
    ///
    /// Panics if a [`view`](Self::view) of this storage is still borrowed.
    pub fn add(&mut self, key: impl Into<Bytes>, value: impl Into<WireValue>) {
        self.entries.borrow_mut().push(TableEntry {
            key: key.into(),
            value: value.into(),
        });
    }

    /// Number of entries, duplicates included.
    #[must_use]
    pub fn len(&self) -> usize { self.entries.borrow().len() }

    /// Whether the table has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool { self.entries.borrow().is_empty() }

    /// Clone the value of the first entry with `key`.
    #[must_use]
    pub fn get(&self, key: impl AsRef<[u8]>) -> Option<WireValue> {
        let key = key.as_ref();
        self.entries
            .borrow()
            .iter()
            .find(|entry| entry.key == key)
            .map(|entry| entry.value.clone())
    }

    /// Clone the values of every entry with `key`, in order.
    #[must_use]
    pub fn get_all(&self, key: impl AsRef<[u8]>) -> Vec<WireValue> {
        let key = key.as_ref();
        self.entries
            .borrow()
            .iter()
            .filter(|entry| entry.key == key)
            .map(|entry| entry.value.clone())
            .collect()
    }

    /// Whether any entry uses `key`.
    #[must_use]
    pub fn contains_key(&self, key: impl AsRef<[u8]>) -> bool {
        let key = key.as_ref();
        self.entries.borrow().iter().any(|entry| entry.key == key)
    }

    /// Borrow the current contiguous view of the entries.
    #[must_use]
    pub fn view(&self) -> Ref<'_, [TableEntry]> { Ref::map(self.entries.borrow(), Vec::as_slice) }

    /// Snapshot the entries into an owned vector.
    #[must_use]
    pub fn to_vec(&self) -> Vec<TableEntry> { self.entries.borrow().clone() }

    /// Whether `self` and `other` share the same backing storage.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool { Rc::ptr_eq(&self.entries, &other.entries) }

    /// Number of handles sharing this storage.
    #[must_use]
    pub fn handle_count(&self) -> usize { Rc::strong_count(&self.entries) }

    /// Remove every entry, dropping any handles the table held.
    ///
    /// # Panics
    ///
    /// Panics if a [`view`](Self::view) of this storage is still borrowed.
    pub fn clear(&mut self) { self.entries.borrow_mut().clear(); }

    /// Copy the table into fresh storage, recursively detaching nested
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
            .map(|entry| {
                entry
                    .value
                    .deep_clone_at(depth)
                    .map(|value| (entry.key.clone(), value))
            })
            .collect()
    }

    pub(super) fn eq_at(&self, other: &Self, depth: usize) -> bool {
        if self.ptr_eq(other) {
            return true;
        }
        if depth > MAX_NESTING_DEPTH {
            return false;
        }
        let (lhs, rhs) = (self.view(), other.view());
        lhs.len() == rhs.len()
            && lhs
                .iter()
                .zip(rhs.iter())
                .all(|(a, b)| a.key == b.key && a.value.eq_at(&b.value, depth))
    }

    /// Append the table's wire form (`u32` byte length, then short-string
    /// keys each followed by a tagged value) to `dst`.
    ///
    /// # Errors
    ///
    /// Returns [`WireError::ShortStringTooLong`] for keys over 255 bytes, or
    /// any error raised while encoding a value.
    pub fn encode(&self, dst: &mut BytesMut) -> Result<(), WireError> {
        codec::encode_table_at(self, dst, 1)
    }

    /// Decode a table from the front of `src`.
    ///
    /// # Errors
    ///
    /// Returns [`WireError`] when the input is truncated or malformed.
    pub fn decode(src: &mut Bytes) -> Result<Self, WireError> { codec::decode_table_at(src, 1) }
}

impl PartialEq for FieldTable {
    fn eq(&self, other: &Self) -> bool { self.eq_at(other, 1) }
}

impl Eq for FieldTable {}

impl fmt::Debug for FieldTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_nested(f, |f| {
            f.debug_map()
                .entries(self.view().iter().map(|entry| (&entry.key, &entry.value)))
                .finish()
        })
    }
}

impl<K: Into<Bytes>, V: Into<WireValue>> FromIterator<(K, V)> for FieldTable {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let entries = iter
            .into_iter()
            .map(|(key, value)| TableEntry {
                key: key.into(),
                value: value.into(),
            })
            .collect();
        Self {
            entries: Rc::new(RefCell::new(entries)),
        }
    }
}
