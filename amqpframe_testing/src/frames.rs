//! Frame builders and wire fixtures for delivery tests.
//!
//! Typed builders produce [`Frame`] values; [`encode_frames`] turns them
//! into the bytes a broker would send. The raw fixtures at the bottom build
//! malformed input by hand so they do not depend on the encoder.

use std::io::{self, Read};

use amqpframe::{
    codec::{AmqpFrameCodec, FRAME_END},
    frame::{CloseReason, ContentHeader, Deliver, Frame, Method},
    properties::PropertyBag,
};
use bytes::{Bytes, BytesMut};
use tokio_util::codec::Encoder;

/// Channel used by the builders when a test does not care.
pub const CHANNEL: u16 = 1;

/// `Basic.Deliver` announcing `delivery_tag` on `channel`.
#[must_use]
pub fn deliver(channel: u16, delivery_tag: u64) -> Frame {
    deliver_with(
        channel,
        Deliver {
            consumer_tag: Bytes::from_static(b"amq.ctag-test"),
            delivery_tag,
            exchange: Bytes::from_static(b"amq.direct"),
            routing_key: Bytes::from_static(b"jobs"),
            ..Deliver::default()
        },
    )
}

/// `Basic.Deliver` carrying the given arguments.
#[must_use]
pub fn deliver_with(channel: u16, deliver: Deliver) -> Frame {
    Frame::Method {
        channel,
        method: Method::BasicDeliver(deliver),
    }
}

/// Content header declaring `body_size` bytes.
#[must_use]
pub fn header(channel: u16, body_size: u64, properties: PropertyBag) -> Frame {
    Frame::Header {
        channel,
        header: ContentHeader::new(body_size, properties),
    }
}

/// Body frame carrying `bytes`.
#[must_use]
pub fn body(channel: u16, bytes: &[u8]) -> Frame {
    Frame::Body {
        channel,
        fragment: Bytes::copy_from_slice(bytes),
    }
}

/// Heartbeat frame; always on channel zero.
#[must_use]
pub fn heartbeat() -> Frame { Frame::Heartbeat { channel: 0 } }

/// `Connection.Close` with the given reply.
#[must_use]
pub fn connection_close(reply_code: u16, reply_text: &'static str) -> Frame {
    Frame::Method {
        channel: 0,
        method: Method::ConnectionClose(CloseReason::new(reply_code, reply_text)),
    }
}

/// `Channel.Close` with the given reply.
#[must_use]
pub fn channel_close(channel: u16, reply_code: u16, reply_text: &'static str) -> Frame {
    Frame::Method {
        channel,
        method: Method::ChannelClose(CloseReason::new(reply_code, reply_text)),
    }
}

/// Every frame of one delivery, splitting `payload` into bodies of at most
/// `fragment_len` bytes.
///
/// # Panics
///
/// Panics if `fragment_len` is zero.
#[must_use]
pub fn delivery(
    delivery_tag: u64,
    properties: PropertyBag,
    payload: &[u8],
    fragment_len: usize,
) -> Vec<Frame> {
    assert!(fragment_len > 0, "fragment length must be positive");
    let mut frames = vec![
        deliver(CHANNEL, delivery_tag),
        header(CHANNEL, payload.len() as u64, properties),
    ];
    frames.extend(payload.chunks(fragment_len).map(|chunk| body(CHANNEL, chunk)));
    frames
}

/// Encode `frames` with a default [`AmqpFrameCodec`].
///
/// # Panics
///
/// Panics if a frame cannot be encoded.
#[must_use]
pub fn encode_frames(frames: &[Frame]) -> Vec<u8> {
    let mut codec = AmqpFrameCodec::default();
    let mut buf = BytesMut::new();
    for frame in frames {
        let raw = frame.to_raw().expect("frame payload should encode");
        codec
            .encode(raw, &mut buf)
            .expect("frame should fit the default frame length");
    }
    buf.to_vec()
}

/// Reader yielding at most `chunk` bytes per call, to exercise frames split
/// across reads.
#[derive(Debug)]
pub struct ChunkedReader {
    data: Bytes,
    chunk: usize,
}

impl ChunkedReader {
    /// Serve `data` in pieces of `chunk` bytes.
    #[must_use]
    pub fn new(data: impl Into<Bytes>, chunk: usize) -> Self {
        Self {
            data: data.into(),
            chunk: chunk.max(1),
        }
    }
}

impl Read for ChunkedReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.chunk.min(buf.len()).min(self.data.len());
        buf[..n].copy_from_slice(&self.data.split_to(n));
        Ok(n)
    }
}

/// Reader that serves `data` and then fails with `kind`.
#[derive(Debug)]
pub struct FailingReader {
    data: Bytes,
    kind: io::ErrorKind,
}

impl FailingReader {
    /// Serve `data`, then return an error of `kind`.
    #[must_use]
    pub fn new(data: impl Into<Bytes>, kind: io::ErrorKind) -> Self {
        Self {
            data: data.into(),
            kind,
        }
    }
}

impl Read for FailingReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.data.is_empty() {
            return Err(io::Error::new(self.kind, "injected failure"));
        }
        let n = buf.len().min(self.data.len());
        buf[..n].copy_from_slice(&self.data.split_to(n));
        Ok(n)
    }
}

/// Raw frame bytes with an arbitrary type, payload and end octet.
#[must_use]
pub fn raw_frame(frame_type: u8, channel: u16, payload: &[u8], end: u8) -> Vec<u8> {
    let size = u32::try_from(payload.len()).expect("fixture payload fits u32");
    let mut wire = Vec::with_capacity(payload.len() + 8);
    wire.push(frame_type);
    wire.extend_from_slice(&channel.to_be_bytes());
    wire.extend_from_slice(&size.to_be_bytes());
    wire.extend_from_slice(payload);
    wire.push(end);
    wire
}

/// A well-formed body frame whose final octet is not the frame end marker.
#[must_use]
pub fn bad_end_octet(payload: &[u8]) -> Vec<u8> { raw_frame(3, CHANNEL, payload, 0x00) }

/// A body frame truncated `missing` bytes before its end octet.
///
/// # Panics
///
/// Panics if `missing` exceeds the encoded frame length.
#[must_use]
pub fn truncated_body(payload: &[u8], missing: usize) -> Vec<u8> {
    let mut wire = raw_frame(3, CHANNEL, payload, FRAME_END);
    let keep = wire.len().checked_sub(missing).expect("cannot drop more than the frame");
    wire.truncate(keep);
    wire
}
