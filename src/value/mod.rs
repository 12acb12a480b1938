//! AMQP field values.
//!
//! [`WireValue`] is the recursive sum type behind message headers and
//! property tables. Scalars are stored inline; arrays and tables hold a
//! shared handle ([`FieldArray`], [`FieldTable`]) to reference-counted
//! backing storage, so cloning a container value is cheap and every clone
//! observes later additions.
//!
//! Nothing in this module caches a view of container storage. The flat,
//! contiguous slice handed to the encoder is borrowed from the current
//! storage each time it is requested, so growing a container can never
//! leave a clone pointing at relocated entries.
//!
//! ## Equality
//!
//! Equality is wire equality: floating-point payloads compare by bit
//! pattern, so a `NaN` decoded from the wire equals the `NaN` that was
//! encoded.
//!
//! A container may hold a handle to itself or to an enclosing container.
//! Comparison, `Debug` output and [`WireValue::deep_clone`] stop after
//! [`MAX_NESTING_DEPTH`] levels: values that only differ (or only cycle)
//! beyond that compare unequal unless they share storage, and `Debug`
//! prints `..` in place of the deeper levels.

mod array;
pub mod codec;
mod error;
mod table;
pub(crate) mod wire;

use std::{cell::Cell, fmt};

use bytes::Bytes;

pub use array::FieldArray;
pub use codec::{MAX_NESTING_DEPTH, decode_value, encode_value};
pub use error::WireError;
pub use table::{FieldTable, TableEntry};

thread_local! {
    static DEBUG_DEPTH: Cell<usize> = const { Cell::new(0) };
}

/// Restores the `Debug` depth on exit, unwinding included.
struct DepthGuard(usize);

impl Drop for DepthGuard {
    fn drop(&mut self) { DEBUG_DEPTH.with(|depth| depth.set(self.0)); }
}

/// Format one container level, writing `..` once the nesting limit is hit.
fn fmt_nested(
    f: &mut fmt::Formatter<'_>,
    body: impl FnOnce(&mut fmt::Formatter<'_>) -> fmt::Result,
) -> fmt::Result {
    let depth = DEBUG_DEPTH.with(Cell::get);
    if depth >= MAX_NESTING_DEPTH {
        return f.write_str("..");
    }
    DEBUG_DEPTH.with(|cell| cell.set(depth + 1));
    let _guard = DepthGuard(depth);
    body(f)
}

/// Fixed-point decimal as carried by the `D` field type.
///
/// The represented number is `value / 10^scale`.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Decimal {
    /// Number of decimal places.
    pub scale: u8,
    /// Unscaled integer value.
    pub value: u32,
}

impl Decimal {
    /// Create a decimal from its scale and unscaled value.
    ///
    /// # Examples
    ///
    /// ```
    /// use amqpframe::value::Decimal;
    ///
    /// assert_eq!(Decimal::new(2, 12_345).to_string(), "123.45");
    /// ```
    #[must_use]
    pub const fn new(scale: u8, value: u32) -> Self { Self { scale, value } }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let digits = self.value.to_string();
        let scale = usize::from(self.scale);
        if scale == 0 {
            return f.write_str(&digits);
        }
        let padded = format!("{digits:0>width$}", width = scale + 1);
        let (whole, fraction) = padded.split_at(padded.len() - scale);
        write!(f, "{whole}.{fraction}")
    }
}

/// Kind discriminator for a [`WireValue`], with its wire tag.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum FieldKind {
    /// No value (`V`).
    Void,
    /// Boolean (`t`).
    Boolean,
    /// Signed 8-bit integer (`b`).
    I8,
    /// Unsigned 8-bit integer (`B`).
    U8,
    /// Signed 16-bit integer (`s`).
    I16,
    /// Unsigned 16-bit integer (`u`).
    U16,
    /// Signed 32-bit integer (`I`).
    I32,
    /// Unsigned 32-bit integer (`i`).
    U32,
    /// Signed 64-bit integer (`l`).
    I64,
    /// Unsigned 64-bit integer (`L`).
    U64,
    /// Single-precision float (`f`).
    F32,
    /// Double-precision float (`d`).
    F64,
    /// Fixed-point decimal (`D`).
    Decimal,
    /// Seconds since the Unix epoch (`T`).
    Timestamp,
    /// Byte string (`S`, also accepted as `x` on decode).
    Bytes,
    /// Positional array (`A`).
    Array,
    /// Key/value table (`F`).
    Table,
}

impl FieldKind {
    /// Tag octet written before a value of this kind.
    #[must_use]
    pub const fn tag(self) -> u8 {
        match self {
            Self::Void => b'V',
            Self::Boolean => b't',
            Self::I8 => b'b',
            Self::U8 => b'B',
            Self::I16 => b's',
            Self::U16 => b'u',
            Self::I32 => b'I',
            Self::U32 => b'i',
            Self::I64 => b'l',
            Self::U64 => b'L',
            Self::F32 => b'f',
            Self::F64 => b'd',
            Self::Decimal => b'D',
            Self::Timestamp => b'T',
            Self::Bytes => b'S',
            Self::Array => b'A',
            Self::Table => b'F',
        }
    }

    /// Resolve a tag octet read from the wire.
    #[must_use]
    pub const fn from_tag(tag: u8) -> Option<Self> {
        let kind = match tag {
            b'V' => Self::Void,
            b't' => Self::Boolean,
            b'b' => Self::I8,
            b'B' => Self::U8,
            b's' => Self::I16,
            b'u' => Self::U16,
            b'I' => Self::I32,
            b'i' => Self::U32,
            b'l' => Self::I64,
            b'L' => Self::U64,
            b'f' => Self::F32,
            b'd' => Self::F64,
            b'D' => Self::Decimal,
            b'T' => Self::Timestamp,
            b'S' | b'x' => Self::Bytes,
            b'A' => Self::Array,
            b'F' => Self::Table,
            _ => return None,
        };
        Some(kind)
    }
}

/// Any AMQP field value.
///
/// # Examples
///
/// ```
/// use amqpframe::value::{FieldArray, FieldKind, WireValue};
///
/// let mut array = FieldArray::new();
/// let value = WireValue::from(array.clone());
/// array.push(7_u16);
///
/// // The value shares storage with `array`.
/// assert_eq!(value.as_array().map(FieldArray::len), Some(1));
/// assert_eq!(value.kind(), FieldKind::Array);
/// ```
#[derive(Clone, Debug, Default)]
pub enum WireValue {
    /// No value.
    #[default]
    Void,
    /// Boolean.
    Boolean(bool),
    /// Signed 8-bit integer.
    I8(i8),
    /// Unsigned 8-bit integer.
    U8(u8),
    /// Signed 16-bit integer.
    I16(i16),
    /// Unsigned 16-bit integer.
    U16(u16),
    /// Signed 32-bit integer.
    I32(i32),
    /// Unsigned 32-bit integer.
    U32(u32),
    /// Signed 64-bit integer.
    I64(i64),
    /// Unsigned 64-bit integer.
    U64(u64),
    /// Single-precision float.
    F32(f32),
    /// Double-precision float.
    F64(f64),
    /// Fixed-point decimal.
    Decimal(Decimal),
    /// Seconds since the Unix epoch.
    Timestamp(u64),
    /// Byte string.
    Bytes(Bytes),
    /// Shared handle to an array.
    Array(FieldArray),
    /// Shared handle to a table.
    Table(FieldTable),
}

impl WireValue {
    /// The kind of this value.
    #[must_use]
    pub const fn kind(&self) -> FieldKind {
        match self {
            Self::Void => FieldKind::Void,
            Self::Boolean(_) => FieldKind::Boolean,
            Self::I8(_) => FieldKind::I8,
            Self::U8(_) => FieldKind::U8,
            Self::I16(_) => FieldKind::I16,
            Self::U16(_) => FieldKind::U16,
            Self::I32(_) => FieldKind::I32,
            Self::U32(_) => FieldKind::U32,
            Self::I64(_) => FieldKind::I64,
            Self::U64(_) => FieldKind::U64,
            Self::F32(_) => FieldKind::F32,
            Self::F64(_) => FieldKind::F64,
            Self::Decimal(_) => FieldKind::Decimal,
            Self::Timestamp(_) => FieldKind::Timestamp,
            Self::Bytes(_) => FieldKind::Bytes,
            Self::Array(_) => FieldKind::Array,
            Self::Table(_) => FieldKind::Table,
        }
    }

    /// Return the boolean payload, if this is a boolean.
    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(value) => Some(*value),
            _ => None,
        }
    }

    /// Return any signed or unsigned integer payload widened to `i128`.
    #[must_use]
    pub fn as_integer(&self) -> Option<i128> {
        match self {
            Self::I8(v) => Some(i128::from(*v)),
            Self::U8(v) => Some(i128::from(*v)),
            Self::I16(v) => Some(i128::from(*v)),
            Self::U16(v) => Some(i128::from(*v)),
            Self::I32(v) => Some(i128::from(*v)),
            Self::U32(v) => Some(i128::from(*v)),
            Self::I64(v) => Some(i128::from(*v)),
            Self::U64(v) | Self::Timestamp(v) => Some(i128::from(*v)),
            _ => None,
        }
    }

    /// Borrow the byte-string payload.
    #[must_use]
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Bytes(value) => Some(&value[..]),
            _ => None,
        }
    }

    /// Borrow the array handle.
    #[must_use]
    pub const fn as_array(&self) -> Option<&FieldArray> {
        match self {
            Self::Array(value) => Some(value),
            _ => None,
        }
    }

    /// Borrow the table handle.
    #[must_use]
    pub const fn as_table(&self) -> Option<&FieldTable> {
        match self {
            Self::Table(value) => Some(value),
            _ => None,
        }
    }

    /// Copy this value, detaching every nested container from shared
    /// storage.
    ///
    /// # Errors
    ///
    /// Returns [`WireError::NestingTooDeep`] when containers nest deeper than
    /// [`MAX_NESTING_DEPTH`], which is always the case for a container that
    /// holds a handle to itself.
    ///
    /// # Examples
    ///
    /// ```
    /// use amqpframe::value::{FieldArray, WireValue};
    ///
    /// let mut array = FieldArray::new();
    /// array.push(1_u8);
    /// let copy = WireValue::from(array.clone()).deep_clone().expect("acyclic");
    /// array.push(2_u8);
    ///
    /// assert_eq!(copy.as_array().map(FieldArray::len), Some(1));
    /// ```
    pub fn deep_clone(&self) -> Result<Self, WireError> { self.deep_clone_at(0) }

    fn deep_clone_at(&self, depth: usize) -> Result<Self, WireError> {
        match self {
            Self::Array(array) => array.deep_clone_at(depth + 1).map(Self::Array),
            Self::Table(table) => table.deep_clone_at(depth + 1).map(Self::Table),
            other => Ok(other.clone()),
        }
    }

    fn eq_at(&self, other: &Self, depth: usize) -> bool {
        match (self, other) {
            (Self::Array(a), Self::Array(b)) => a.eq_at(b, depth + 1),
            (Self::Table(a), Self::Table(b)) => a.eq_at(b, depth + 1),
            _ => self == other,
        }
    }
}

impl PartialEq for WireValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Void, Self::Void) => true,
            (Self::Boolean(a), Self::Boolean(b)) => a == b,
            (Self::I8(a), Self::I8(b)) => a == b,
            (Self::U8(a), Self::U8(b)) => a == b,
            (Self::I16(a), Self::I16(b)) => a == b,
            (Self::U16(a), Self::U16(b)) => a == b,
            (Self::I32(a), Self::I32(b)) => a == b,
            (Self::U32(a), Self::U32(b)) => a == b,
            (Self::I64(a), Self::I64(b)) => a == b,
            (Self::U64(a), Self::U64(b)) | (Self::Timestamp(a), Self::Timestamp(b)) => a == b,
            (Self::F32(a), Self::F32(b)) => a.to_bits() == b.to_bits(),
            (Self::F64(a), Self::F64(b)) => a.to_bits() == b.to_bits(),
            (Self::Decimal(a), Self::Decimal(b)) => a == b,
            (Self::Bytes(a), Self::Bytes(b)) => a == b,
            (Self::Array(a), Self::Array(b)) => a.eq_at(b, 1),
            (Self::Table(a), Self::Table(b)) => a.eq_at(b, 1),
            _ => false,
        }
    }
}

impl Eq for WireValue {}

macro_rules! impl_from_scalar {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for WireValue {
                fn from(value: $ty) -> Self { Self::$variant(value) }
            }
        )*
    };
}

impl_from_scalar! {
    bool => Boolean,
    i8 => I8,
    u8 => U8,
    i16 => I16,
    u16 => U16,
    i32 => I32,
    u32 => U32,
    i64 => I64,
    u64 => U64,
    f32 => F32,
    f64 => F64,
    Decimal => Decimal,
    Bytes => Bytes,
    FieldArray => Array,
    FieldTable => Table,
}

impl From<&[u8]> for WireValue {
    fn from(value: &[u8]) -> Self { Self::Bytes(Bytes::copy_from_slice(value)) }
}

impl From<Vec<u8>> for WireValue {
    fn from(value: Vec<u8>) -> Self { Self::Bytes(Bytes::from(value)) }
}

impl From<&str> for WireValue {
    fn from(value: &str) -> Self { Self::Bytes(Bytes::copy_from_slice(value.as_bytes())) }
}

impl From<String> for WireValue {
    fn from(value: String) -> Self { Self::Bytes(Bytes::from(value)) }
}
