//! AMQP 0-9-1 frame codec.
//!
//! Every frame on the wire is a seven-byte header (type octet, channel
//! `u16`, payload size `u32`), the payload, and the end octet
//! [`FRAME_END`]. [`AmqpFrameCodec`] splits a byte stream into
//! [`RawFrame`]s and writes them back; interpreting payloads is left to
//! [`Frame`](crate::frame::Frame).
//!
//! # Error Handling
//!
//! Failures are reported through [`CodecError`]. A stream that ends exactly
//! on a frame boundary is a clean close and yields `Ok(None)` from
//! [`Decoder::decode_eof`]; ending anywhere else is an [`EofError`].

use bytes::{Buf, BufMut, Bytes, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

pub mod error;

pub use error::{CodecError, EofError, FramingError};

/// Size of the frame header preceding the payload.
pub const FRAME_HEADER_SIZE: usize = 7;

/// Octet terminating every frame.
pub const FRAME_END: u8 = 0xCE;

/// Bytes a frame occupies beyond its payload.
pub const FRAME_OVERHEAD: usize = FRAME_HEADER_SIZE + 1;

/// Smallest frame size a peer may negotiate.
pub const MIN_FRAME_LENGTH: usize = 4096;

/// Largest frame length accepted (16 MiB).
pub const MAX_FRAME_LENGTH: usize = 16 * 1024 * 1024;

/// Frame length used when none is configured.
pub const DEFAULT_FRAME_LENGTH: usize = 131_072;

pub(crate) fn clamp_frame_length(value: usize) -> usize {
    value.clamp(MIN_FRAME_LENGTH, MAX_FRAME_LENGTH)
}

/// One undecoded frame.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RawFrame {
    /// Frame type octet (1 method, 2 header, 3 body, 8 heartbeat).
    pub frame_type: u8,
    /// Channel the frame belongs to.
    pub channel: u16,
    /// Frame payload without header or end octet.
    pub payload: Bytes,
}

impl RawFrame {
    /// Create a frame from its parts.
    #[must_use]
    pub fn new(frame_type: u8, channel: u16, payload: impl Into<Bytes>) -> Self {
        Self {
            frame_type,
            channel,
            payload: payload.into(),
        }
    }

    /// Size of this frame on the wire.
    #[must_use]
    pub fn wire_len(&self) -> usize { self.payload.len() + FRAME_OVERHEAD }
}

/// `tokio_util` codec for AMQP frames.
///
/// The maximum frame length bounds the whole frame, header and end octet
/// included, as negotiated by `Connection.Tune`.
#[derive(Clone, Copy, Debug)]
pub struct AmqpFrameCodec {
    max_frame_length: usize,
}

impl AmqpFrameCodec {
    /// Construct a codec; `max_frame_length` is clamped to
    /// [`MIN_FRAME_LENGTH`]..=[`MAX_FRAME_LENGTH`].
    #[must_use]
    pub fn new(max_frame_length: usize) -> Self {
        Self {
            max_frame_length: clamp_frame_length(max_frame_length),
        }
    }

    /// Return the maximum frame length accepted by this codec.
    #[must_use]
    pub const fn max_frame_length(&self) -> usize { self.max_frame_length }

    /// Largest payload that fits in one frame.
    #[must_use]
    pub const fn max_payload_length(&self) -> usize { self.max_frame_length - FRAME_OVERHEAD }

    fn check_size(&self, size: usize) -> Result<(), CodecError> {
        if size > self.max_frame_length {
            return Err(FramingError::OversizedFrame {
                size,
                max: self.max_frame_length,
            }
            .into());
        }
        Ok(())
    }
}

impl Default for AmqpFrameCodec {
    fn default() -> Self { Self::new(DEFAULT_FRAME_LENGTH) }
}

impl Decoder for AmqpFrameCodec {
    type Item = RawFrame;
    type Error = CodecError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        let Some(mut header) = src.get(..FRAME_HEADER_SIZE) else {
            return Ok(None);
        };
        let frame_type = header.get_u8();
        let channel = header.get_u16();
        let size = header.get_u32() as usize;

        let total = size.saturating_add(FRAME_OVERHEAD);
        self.check_size(total)?;
        if src.len() < total {
            src.reserve(total - src.len());
            return Ok(None);
        }

        let mut frame = src.split_to(total);
        frame.advance(FRAME_HEADER_SIZE);
        let end = frame.get(size).copied().unwrap_or_default();
        if end != FRAME_END {
            return Err(FramingError::InvalidFrameEnd { found: end }.into());
        }
        frame.truncate(size);

        Ok(Some(RawFrame {
            frame_type,
            channel,
            payload: frame.freeze(),
        }))
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if let Some(frame) = self.decode(src)? {
            return Ok(Some(frame));
        }
        if src.is_empty() {
            return Ok(None);
        }
        let err = build_eof_error(src);
        tracing::debug!(error = %err, "stream ended inside a frame");
        Err(err.into())
    }
}

/// Classify a truncated stream as ending inside the header or the payload.
fn build_eof_error(src: &BytesMut) -> EofError {
    let bytes_received = src.len();
    match src.get(3..FRAME_HEADER_SIZE) {
        Some(mut size) => EofError::MidFrame {
            bytes_received: bytes_received - FRAME_HEADER_SIZE,
            expected: size.get_u32() as usize + 1,
        },
        None => EofError::MidHeader {
            bytes_received,
            header_size: FRAME_HEADER_SIZE,
        },
    }
}

impl Encoder<RawFrame> for AmqpFrameCodec {
    type Error = CodecError;

    fn encode(&mut self, item: RawFrame, dst: &mut BytesMut) -> Result<(), Self::Error> {
        self.check_size(item.wire_len())?;
        let size = u32::try_from(item.payload.len()).map_err(|_| FramingError::OversizedFrame {
            size: item.wire_len(),
            max: self.max_frame_length,
        })?;

        dst.reserve(item.wire_len());
        dst.put_u8(item.frame_type);
        dst.put_u16(item.channel);
        dst.put_u32(size);
        dst.put_slice(&item.payload);
        dst.put_u8(FRAME_END);
        Ok(())
    }
}

#[cfg(test)]
mod tests;
