//! Checked primitive readers and writers shared by the AMQP codecs.
//!
//! `bytes::Buf` getters panic on short input; every read here checks the
//! remaining length first and reports [`WireError::UnexpectedEnd`] instead.

use bytes::{Buf, BufMut, Bytes, BytesMut};

use super::WireError;

pub(crate) fn ensure(src: &Bytes, needed: usize) -> Result<(), WireError> {
    if src.remaining() < needed {
        return Err(WireError::UnexpectedEnd {
            needed,
            remaining: src.remaining(),
        });
    }
    Ok(())
}

macro_rules! take_fixed {
    ($($name:ident => $ty:ty, $get:ident;)*) => {
        $(
            pub(crate) fn $name(src: &mut Bytes) -> Result<$ty, WireError> {
                ensure(src, std::mem::size_of::<$ty>())?;
                Ok(src.$get())
            }
        )*
    };
}

take_fixed! {
    take_u8 => u8, get_u8;
    take_i8 => i8, get_i8;
    take_u16 => u16, get_u16;
    take_i16 => i16, get_i16;
    take_u32 => u32, get_u32;
    take_i32 => i32, get_i32;
    take_u64 => u64, get_u64;
    take_i64 => i64, get_i64;
    take_f32 => f32, get_f32;
    take_f64 => f64, get_f64;
}

/// Split `len` bytes off the front of `src` without copying.
pub(crate) fn take_bytes(src: &mut Bytes, len: usize) -> Result<Bytes, WireError> {
    ensure(src, len)?;
    Ok(src.split_to(len))
}

pub(crate) fn take_short_str(src: &mut Bytes) -> Result<Bytes, WireError> {
    let len = usize::from(take_u8(src)?);
    take_bytes(src, len)
}

pub(crate) fn take_long_str(src: &mut Bytes) -> Result<Bytes, WireError> {
    let len = take_u32(src)? as usize;
    take_bytes(src, len)
}

pub(crate) fn put_short_str(dst: &mut BytesMut, value: &[u8]) -> Result<(), WireError> {
    let len =
        u8::try_from(value.len()).map_err(|_| WireError::ShortStringTooLong { len: value.len() })?;
    dst.put_u8(len);
    dst.put_slice(value);
    Ok(())
}

pub(crate) fn put_long_str(dst: &mut BytesMut, value: &[u8]) -> Result<(), WireError> {
    let len = u32::try_from(value.len()).map_err(|_| WireError::LengthOverflow { len: value.len() })?;
    dst.put_u32(len);
    dst.put_slice(value);
    Ok(())
}

/// Reserve a `u32` length prefix and return its offset for [`patch_length`].
pub(crate) fn reserve_length(dst: &mut BytesMut) -> usize {
    let offset = dst.len();
    dst.put_u32(0);
    offset
}

/// Back-fill the length prefix reserved at `offset` with the bytes written
/// since.
pub(crate) fn patch_length(dst: &mut BytesMut, offset: usize) -> Result<(), WireError> {
    let start = offset + std::mem::size_of::<u32>();
    let written = dst.len().saturating_sub(start);
    let len = u32::try_from(written).map_err(|_| WireError::LengthOverflow { len: written })?;
    if let Some(slot) = dst.get_mut(offset..start) {
        slot.copy_from_slice(&len.to_be_bytes());
    }
    Ok(())
}
