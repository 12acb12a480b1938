//! Pull-based delivery consumption.
//!
//! [`DeliveryConsumer`] pulls frames from a [`FrameSource`] one at a time,
//! turns broker close notifications into errors, and feeds everything else
//! through a [`FrameDispatcher`] and [`MessageCollector`] until a delivery
//! completes. Reading blocks; there is no cancellation beyond dropping the
//! consumer or calling [`DeliveryConsumer::reset`].

use std::io::{self, Read};

use bytes::BytesMut;
use tokio_util::codec::Decoder;

use crate::{
    codec::{AmqpFrameCodec, CodecError, RawFrame},
    config::ConsumerConfig,
    delivery::{Delivery, FrameDispatcher, MessageCollector, ResultCollector},
    error::{AmqpError, LibraryStatus, Result},
    frame::Frame,
};

const READ_CONTEXT: &str = "reading frame";
const DECODE_CONTEXT: &str = "decoding frame";
const CONSUME_CONTEXT: &str = "consuming delivery";
const CLOSE_CONTEXT: &str = "closing frame source";

/// A blocking supply of decoded frames.
pub trait FrameSource {
    /// Wait for the next frame.
    ///
    /// Returns `Ok(None)` when the stream ended cleanly at a frame boundary.
    ///
    /// # Errors
    ///
    /// Returns [`AmqpError`] when the transport fails or a frame cannot be
    /// decoded.
    fn next_frame(&mut self) -> Result<Option<Frame>>;
}

impl<S: FrameSource + ?Sized> FrameSource for &mut S {
    fn next_frame(&mut self) -> Result<Option<Frame>> { (**self).next_frame() }
}

/// [`FrameSource`] reading AMQP frames from any [`Read`] implementation.
#[derive(Debug)]
pub struct ReaderSource<R> {
    reader: R,
    codec: AmqpFrameCodec,
    buf: BytesMut,
    chunk_size: usize,
    eof: bool,
}

impl<R: Read> ReaderSource<R> {
    /// Wrap `reader` with default limits.
    pub fn new(reader: R) -> Self { Self::with_config(reader, &ConsumerConfig::default()) }

    /// Wrap `reader` using the frame length and chunk size from `config`.
    pub fn with_config(reader: R, config: &ConsumerConfig) -> Self {
        Self {
            reader,
            codec: AmqpFrameCodec::new(config.frame_length()),
            buf: BytesMut::new(),
            chunk_size: config.chunk_size(),
            eof: false,
        }
    }

    /// Read the next undecoded frame.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError`] on I/O failure, malformed framing, or a stream
    /// ending inside a frame.
    pub fn next_raw(&mut self) -> std::result::Result<Option<RawFrame>, CodecError> {
        loop {
            if let Some(frame) = self.codec.decode(&mut self.buf)? {
                return Ok(Some(frame));
            }
            if self.eof {
                return self.codec.decode_eof(&mut self.buf);
            }
            self.fill()?;
        }
    }

    fn fill(&mut self) -> std::result::Result<(), CodecError> {
        let start = self.buf.len();
        self.buf.resize(start + self.chunk_size, 0);
        let read = loop {
            match self.reader.read(&mut self.buf[start..]) {
                Ok(n) => break n,
                Err(err) if err.kind() == io::ErrorKind::Interrupted => {}
                Err(err) => {
                    self.buf.truncate(start);
                    return Err(err.into());
                }
            }
        };
        self.buf.truncate(start + read);
        if read == 0 {
            tracing::debug!(buffered = start, "frame source reached end of stream");
            self.eof = true;
        }
        Ok(())
    }

    /// Bytes read but not yet decoded.
    #[must_use]
    pub fn buffered(&self) -> usize { self.buf.len() }

    /// Discard buffered input, reporting any partial frame left behind.
    ///
    /// # Errors
    ///
    /// Returns [`AmqpError::Library`] when undecoded bytes were discarded.
    pub fn close(&mut self) -> Result<()> {
        if self.buf.is_empty() {
            return Ok(());
        }
        let discarded = self.buf.len();
        let outcome = self.codec.decode_eof(&mut self.buf);
        self.buf.clear();
        match outcome {
            Err(err) => Err(AmqpError::from_codec(CLOSE_CONTEXT, &err)),
            Ok(_) => Err(AmqpError::Library {
                context: CLOSE_CONTEXT.to_owned(),
                status: Some(LibraryStatus::UnexpectedState),
                message: format!("{discarded} unread bytes discarded"),
            }),
        }
    }

    /// Recover the wrapped reader, dropping buffered input.
    pub fn into_inner(self) -> R { self.reader }
}

impl<R: Read> FrameSource for ReaderSource<R> {
    fn next_frame(&mut self) -> Result<Option<Frame>> {
        let Some(raw) = self
            .next_raw()
            .map_err(|err| AmqpError::from_codec(READ_CONTEXT, &err))?
        else {
            return Ok(None);
        };
        Frame::try_from(raw)
            .map(Some)
            .map_err(|err| AmqpError::from_wire(DECODE_CONTEXT, &err))
    }
}

/// Assembles deliveries from a [`FrameSource`].
///
/// # Examples
///
/// ```
/// use std::io::Cursor;
///
/// use amqpframe::consumer::{DeliveryConsumer, ReaderSource};
///
/// let mut consumer = DeliveryConsumer::new(ReaderSource::new(Cursor::new(Vec::new())));
/// assert!(consumer.next_delivery().expect("empty stream").is_none());
/// ```
#[derive(Debug)]
pub struct DeliveryConsumer<S> {
    source: S,
    dispatcher: FrameDispatcher,
    collector: MessageCollector,
}

impl<S: FrameSource> DeliveryConsumer<S> {
    /// Consume from `source` with no body size limit.
    pub fn new(source: S) -> Self {
        Self {
            source,
            dispatcher: FrameDispatcher::new(),
            collector: MessageCollector::new(),
        }
    }

    /// Consume from `source` applying the body size limit in `config`.
    pub fn with_config(source: S, config: &ConsumerConfig) -> Self {
        Self {
            source,
            dispatcher: FrameDispatcher::new().with_max_body_size(config.body_size_limit()),
            collector: MessageCollector::new(),
        }
    }

    /// Pull frames until one delivery is complete.
    ///
    /// Returns `Ok(None)` when the source ends between deliveries.
    ///
    /// # Errors
    ///
    /// - [`AmqpError::ProtocolClose`] when the broker sends `Connection.Close` or
    ///   `Channel.Close`.
    /// - [`AmqpError::Reassembly`] when frames arrive out of order or overrun the declared body.
    /// - [`AmqpError::Library`] when the source fails or ends mid-delivery.
    ///
    /// Every error abandons the delivery in flight; the next call starts
    /// afresh.
    pub fn next_delivery(&mut self) -> Result<Option<Delivery>> {
        loop {
            let frame = match self.source.next_frame() {
                Ok(Some(frame)) => frame,
                Ok(None) if self.in_flight() => {
                    self.abandon();
                    return Err(AmqpError::library(
                        CONSUME_CONTEXT,
                        LibraryStatus::ConnectionClosed,
                    ));
                }
                Ok(None) => return Ok(None),
                Err(err) => {
                    self.abandon();
                    return Err(err);
                }
            };

            if let Frame::Method { method, .. } = &frame {
                if let Some(err) = AmqpError::from_close(CONSUME_CONTEXT, method) {
                    self.abandon();
                    return Err(err);
                }
            }

            let result = match self.dispatcher.classify(frame) {
                Ok(result) => result,
                Err(violation) => {
                    self.abandon();
                    return Err(violation.into());
                }
            };
            if self.collector.collect(result) {
                if let Some(delivery) = self.collector.take_delivery() {
                    return Ok(Some(delivery));
                }
            }
        }
    }

    /// Whether a delivery is partially assembled.
    #[must_use]
    pub fn in_flight(&self) -> bool {
        self.dispatcher.reassembler().in_flight() || self.collector.delivery_tag().is_some()
    }

    /// Discard any delivery in flight.
    pub fn reset(&mut self) { self.abandon(); }

    fn abandon(&mut self) {
        if let Some(tag) = self.collector.delivery_tag() {
            log::warn!("discarding incomplete delivery {tag}");
        }
        self.dispatcher.reset();
        self.collector.reset();
    }

    /// Borrow the frame source.
    pub const fn source(&self) -> &S { &self.source }

    /// Mutably borrow the frame source.
    pub const fn source_mut(&mut self) -> &mut S { &mut self.source }

    /// Recover the frame source.
    pub fn into_source(self) -> S { self.source }
}

impl<S: FrameSource> Iterator for DeliveryConsumer<S> {
    type Item = Result<Delivery>;

    fn next(&mut self) -> Option<Self::Item> { self.next_delivery().transpose() }
}
