//! Binary encoding of field values, arrays and tables.
//!
//! Every value is written as a one-octet tag followed by its payload; see
//! [`FieldKind::tag`] for the tag table. Containers carry a `u32` byte-length
//! prefix so a reader can skip them without understanding their contents.
//!
//! Both directions bound container nesting at [`MAX_NESTING_DEPTH`]. On
//! decode this protects the stack from hostile input; on encode it turns a
//! container that (through shared handles) contains itself into an error
//! rather than unbounded recursion.

use bytes::{BufMut, Bytes, BytesMut};

use super::{
    Decimal,
    FieldArray,
    FieldKind,
    FieldTable,
    WireError,
    WireValue,
    wire::{
        patch_length,
        put_long_str,
        put_short_str,
        reserve_length,
        take_bytes,
        take_f32,
        take_f64,
        take_i8,
        take_i16,
        take_i32,
        take_i64,
        take_long_str,
        take_short_str,
        take_u8,
        take_u16,
        take_u32,
        take_u64,
    },
};

/// Maximum number of nested arrays and tables accepted by the codec.
pub const MAX_NESTING_DEPTH: usize = 64;

/// Append a tagged field value to `dst`.
///
/// # Errors
///
/// Returns [`WireError`] if a string or container is too long for its
/// length prefix, a table key exceeds 255 bytes, or containers nest deeper
/// than [`MAX_NESTING_DEPTH`].
///
/// # Examples
///
/// ```
/// use amqpframe::value::{WireValue, decode_value, encode_value};
/// use bytes::BytesMut;
///
/// let mut buf = BytesMut::new();
/// encode_value(&WireValue::I16(-2), &mut buf).expect("encode");
/// assert_eq!(&buf[..], &[b's', 0xFF, 0xFE]);
///
/// let mut wire = buf.freeze();
/// assert_eq!(decode_value(&mut wire).expect("decode"), WireValue::I16(-2));
/// ```
pub fn encode_value(value: &WireValue, dst: &mut BytesMut) -> Result<(), WireError> {
    encode_tagged(value, dst, 0)
}

/// Decode one tagged field value from the front of `src`.
///
/// # Errors
///
/// Returns [`WireError`] if the input is truncated, uses an unknown tag, or
/// nests containers deeper than [`MAX_NESTING_DEPTH`].
pub fn decode_value(src: &mut Bytes) -> Result<WireValue, WireError> { decode_tagged(src, 0) }

fn check_depth(depth: usize) -> Result<(), WireError> {
    if depth > MAX_NESTING_DEPTH {
        return Err(WireError::NestingTooDeep {
            limit: MAX_NESTING_DEPTH,
        });
    }
    Ok(())
}

fn encode_tagged(value: &WireValue, dst: &mut BytesMut, depth: usize) -> Result<(), WireError> {
    dst.put_u8(value.kind().tag());
    match value {
        WireValue::Void => {}
        WireValue::Boolean(v) => dst.put_u8(u8::from(*v)),
        WireValue::I8(v) => dst.put_i8(*v),
        WireValue::U8(v) => dst.put_u8(*v),
        WireValue::I16(v) => dst.put_i16(*v),
        WireValue::U16(v) => dst.put_u16(*v),
        WireValue::I32(v) => dst.put_i32(*v),
        WireValue::U32(v) => dst.put_u32(*v),
        WireValue::I64(v) => dst.put_i64(*v),
        WireValue::U64(v) | WireValue::Timestamp(v) => dst.put_u64(*v),
        WireValue::F32(v) => dst.put_f32(*v),
        WireValue::F64(v) => dst.put_f64(*v),
        WireValue::Decimal(v) => {
            dst.put_u8(v.scale);
            dst.put_u32(v.value);
        }
        WireValue::Bytes(v) => put_long_str(dst, v)?,
        WireValue::Array(v) => encode_array_at(v, dst, depth + 1)?,
        WireValue::Table(v) => encode_table_at(v, dst, depth + 1)?,
    }
    Ok(())
}

pub(crate) fn encode_array_at(
    array: &FieldArray,
    dst: &mut BytesMut,
    depth: usize,
) -> Result<(), WireError> {
    check_depth(depth)?;
    let offset = reserve_length(dst);
    for value in array.view().iter() {
        encode_tagged(value, dst, depth)?;
    }
    patch_length(dst, offset)
}

pub(crate) fn encode_table_at(
    table: &FieldTable,
    dst: &mut BytesMut,
    depth: usize,
) -> Result<(), WireError> {
    check_depth(depth)?;
    let offset = reserve_length(dst);
    for entry in table.view().iter() {
        put_short_str(dst, &entry.key)?;
        encode_tagged(&entry.value, dst, depth)?;
    }
    patch_length(dst, offset)
}

fn decode_tagged(src: &mut Bytes, depth: usize) -> Result<WireValue, WireError> {
    let tag = take_u8(src)?;
    let kind = FieldKind::from_tag(tag).ok_or(WireError::UnknownTag { tag })?;
    let value = match kind {
        FieldKind::Void => WireValue::Void,
        FieldKind::Boolean => WireValue::Boolean(take_u8(src)? != 0),
        FieldKind::I8 => WireValue::I8(take_i8(src)?),
        FieldKind::U8 => WireValue::U8(take_u8(src)?),
        FieldKind::I16 => WireValue::I16(take_i16(src)?),
        FieldKind::U16 => WireValue::U16(take_u16(src)?),
        FieldKind::I32 => WireValue::I32(take_i32(src)?),
        FieldKind::U32 => WireValue::U32(take_u32(src)?),
        FieldKind::I64 => WireValue::I64(take_i64(src)?),
        FieldKind::U64 => WireValue::U64(take_u64(src)?),
        FieldKind::F32 => WireValue::F32(take_f32(src)?),
        FieldKind::F64 => WireValue::F64(take_f64(src)?),
        FieldKind::Decimal => {
            let scale = take_u8(src)?;
            let value = take_u32(src)?;
            WireValue::Decimal(Decimal::new(scale, value))
        }
        FieldKind::Timestamp => WireValue::Timestamp(take_u64(src)?),
        FieldKind::Bytes => WireValue::Bytes(take_long_str(src)?),
        FieldKind::Array => WireValue::Array(decode_array_at(src, depth + 1)?),
        FieldKind::Table => WireValue::Table(decode_table_at(src, depth + 1)?),
    };
    Ok(value)
}

pub(crate) fn decode_array_at(src: &mut Bytes, depth: usize) -> Result<FieldArray, WireError> {
    check_depth(depth)?;
    let len = take_u32(src)? as usize;
    let mut body = take_bytes(src, len)?;
    let mut array = FieldArray::new();
    while !body.is_empty() {
        array.push(decode_tagged(&mut body, depth)?);
    }
    Ok(array)
}

pub(crate) fn decode_table_at(src: &mut Bytes, depth: usize) -> Result<FieldTable, WireError> {
    check_depth(depth)?;
    let len = take_u32(src)? as usize;
    let mut body = take_bytes(src, len)?;
    let mut table = FieldTable::new();
    while !body.is_empty() {
        let key = take_short_str(&mut body)?;
        let value = decode_tagged(&mut body, depth)?;
        table.add(key, value);
    }
    Ok(table)
}
