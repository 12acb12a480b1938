//! Accumulation of classified frames into one assembled delivery.

use bytes::{Bytes, BytesMut};

use super::{BodyFragment, DecodeResult};
use crate::{frame::Deliver, properties::PropertyBag};

/// Sink for [`DecodeResult`]s.
///
/// `collect` returns `true` exactly when the result completed a delivery.
pub trait ResultCollector {
    /// Absorb one result and report whether the delivery is complete.
    fn collect(&mut self, result: DecodeResult) -> bool;

    /// Discard the partially collected delivery.
    fn reset(&mut self);
}

/// A fully reassembled message.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Delivery {
    /// Channel-scoped delivery tag.
    pub delivery_tag: u64,
    /// Consumer the message was delivered to.
    pub consumer_tag: Bytes,
    /// Whether the broker delivered this message before.
    pub redelivered: bool,
    /// Exchange the message was published to.
    pub exchange: Bytes,
    /// Routing key used at publication.
    pub routing_key: Bytes,
    /// Message properties.
    pub properties: PropertyBag,
    /// Complete message body.
    pub body: Bytes,
}

/// Standard [`ResultCollector`] holding one delivery at a time.
///
/// # Examples
///
/// ```
/// use amqpframe::delivery::{BodyFragment, DecodeResult, MessageCollector, ResultCollector};
/// use bytes::Bytes;
///
/// let mut collector = MessageCollector::new();
/// let done = collector.collect(DecodeResult::Fragment(BodyFragment {
///     bytes: Bytes::from_static(b"hello"),
///     is_last: true,
/// }));
///
/// assert!(done);
/// assert_eq!(collector.body(), b"hello");
/// ```
#[derive(Debug, Default)]
pub struct MessageCollector {
    deliver: Option<Deliver>,
    properties: PropertyBag,
    body: BytesMut,
}

impl MessageCollector {
    /// Create an empty collector.
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Delivery tag of the collected delivery, once announced.
    #[must_use]
    pub fn delivery_tag(&self) -> Option<u64> { self.deliver.as_ref().map(|d| d.delivery_tag) }

    /// `Basic.Deliver` arguments of the collected delivery.
    #[must_use]
    pub const fn deliver(&self) -> Option<&Deliver> { self.deliver.as_ref() }

    /// Properties from the content header, empty until it arrives.
    #[must_use]
    pub const fn properties(&self) -> &PropertyBag { &self.properties }

    /// Body bytes collected so far.
    #[must_use]
    pub fn body(&self) -> &[u8] { &self.body }

    /// Move the collected delivery out, leaving the collector empty.
    ///
    /// Returns `None` if no delivery was announced.
    pub fn take_delivery(&mut self) -> Option<Delivery> {
        let deliver = self.deliver.take()?;
        let properties = std::mem::take(&mut self.properties);
        let body = self.body.split().freeze();
        Some(Delivery {
            delivery_tag: deliver.delivery_tag,
            consumer_tag: deliver.consumer_tag,
            redelivered: deliver.redelivered,
            exchange: deliver.exchange,
            routing_key: deliver.routing_key,
            properties,
            body,
        })
    }
}

impl ResultCollector for MessageCollector {
    fn collect(&mut self, result: DecodeResult) -> bool {
        match result {
            DecodeResult::Delivery(deliver) => {
                self.deliver = Some(deliver);
                false
            }
            DecodeResult::Properties {
                properties,
                complete,
                ..
            } => {
                self.properties = properties;
                complete
            }
            DecodeResult::Fragment(BodyFragment { bytes, is_last }) => {
                self.body.extend_from_slice(&bytes);
                is_last
            }
            DecodeResult::Unhandled(_) => false,
        }
    }

    fn reset(&mut self) {
        self.body.clear();
        self.properties = PropertyBag::default();
        self.deliver = None;
    }
}

#[cfg(test)]
#[path = "collector_tests.rs"]
mod tests;
