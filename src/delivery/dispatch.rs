//! Frame classification.
//!
//! [`FrameDispatcher`] turns each incoming [`Frame`] into exactly one
//! [`DecodeResult`], driving its [`DeliveryReassembler`] once for every
//! deliver, header or body frame. Frames that play no part in a delivery
//! are reported as [`DecodeResult::Unhandled`] and never fail.

use std::num::NonZeroU64;

use bytes::Bytes;

use super::{
    AssemblyStatus,
    DeliveryEvent,
    DeliveryReassembler,
    ReassemblyViolation,
};
use crate::{
    frame::{Deliver, Frame, FrameKind, Method, MethodId},
    metrics,
    properties::PropertyBag,
};

/// A slice of message body together with its completion flag.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BodyFragment {
    /// Fragment bytes, shared with the frame payload.
    pub bytes: Bytes,
    /// Whether this fragment completed the body.
    pub is_last: bool,
}

/// A frame that took no part in reassembly.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct UnhandledFrame {
    /// Kind of the frame.
    pub kind: FrameKind,
    /// Channel it arrived on.
    pub channel: u16,
    /// Method identifier, for method frames.
    pub method: Option<MethodId>,
}

/// Outcome of classifying one frame.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum DecodeResult {
    /// A delivery was announced.
    Delivery(Deliver),
    /// The content header arrived.
    Properties {
        /// Message properties.
        properties: PropertyBag,
        /// Declared body size.
        body_size: u64,
        /// Whether the header completed the delivery (empty body).
        complete: bool,
    },
    /// A body fragment arrived.
    Fragment(BodyFragment),
    /// The frame is not part of a delivery.
    Unhandled(UnhandledFrame),
}

impl DecodeResult {
    /// Whether this result completed a delivery.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        match self {
            Self::Properties { complete, .. } => *complete,
            Self::Fragment(fragment) => fragment.is_last,
            Self::Delivery(_) | Self::Unhandled(_) => false,
        }
    }
}

/// Classifies frames and tracks delivery progress.
#[derive(Clone, Debug, Default)]
pub struct FrameDispatcher {
    reassembler: DeliveryReassembler,
}

impl FrameDispatcher {
    /// Create a dispatcher with no body size limit.
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Reject deliveries whose declared body exceeds `limit`.
    #[must_use]
    pub fn with_max_body_size(self, limit: Option<NonZeroU64>) -> Self {
        Self {
            reassembler: self.reassembler.with_max_body_size(limit),
        }
    }

    /// Reassembly state, for inspection.
    #[must_use]
    pub const fn reassembler(&self) -> &DeliveryReassembler { &self.reassembler }

    /// Discard any delivery in flight.
    pub fn reset(&mut self) { self.reassembler.reset(); }

    /// Classify one frame.
    ///
    /// # Errors
    ///
    /// Returns [`ReassemblyViolation`] when a deliver, header or body frame
    /// arrives out of order or overruns the declared body size. Other frames
    /// never fail.
    pub fn classify(&mut self, frame: Frame) -> Result<DecodeResult, ReassemblyViolation> {
        metrics::inc_frames(frame.kind());
        let result = match frame {
            Frame::Method {
                method: Method::BasicDeliver(deliver),
                ..
            } => self
                .apply(DeliveryEvent::Deliver {
                    delivery_tag: deliver.delivery_tag,
                })
                .map(|_| DecodeResult::Delivery(deliver)),
            Frame::Header { header, .. } => self
                .apply(DeliveryEvent::Header {
                    body_size: header.body_size,
                })
                .map(|status| DecodeResult::Properties {
                    properties: header.properties,
                    body_size: header.body_size,
                    complete: status.is_complete(),
                }),
            Frame::Body { fragment, .. } => self
                .apply(DeliveryEvent::Body {
                    fragment_len: fragment.len() as u64,
                })
                .map(|status| {
                    DecodeResult::Fragment(BodyFragment {
                        bytes: fragment,
                        is_last: status.is_complete(),
                    })
                }),
            other => Ok(DecodeResult::Unhandled(unhandled(&other))),
        };
        if result.as_ref().is_ok_and(DecodeResult::is_complete) {
            metrics::inc_deliveries();
        }
        result
    }

    fn apply(&mut self, event: DeliveryEvent) -> Result<AssemblyStatus, ReassemblyViolation> {
        self.reassembler.handle(event).inspect_err(|violation| {
            metrics::inc_violations();
            log::warn!("delivery reassembly violation: {violation}");
        })
    }
}

fn unhandled(frame: &Frame) -> UnhandledFrame {
    metrics::inc_unhandled();
    let method = match frame {
        Frame::Method { method, .. } => Some(method.id()),
        _ => None,
    };
    let kind = frame.kind();
    let channel = frame.channel();
    match (kind, method) {
        (FrameKind::Heartbeat, _) => log::debug!("heartbeat on channel {channel}"),
        (_, Some(id)) => log::warn!("ignoring method {id} on channel {channel}"),
        (_, None) => log::warn!("ignoring {} frame on channel {channel}", kind.as_str()),
    }
    UnhandledFrame {
        kind,
        channel,
        method,
    }
}

#[cfg(test)]
#[path = "dispatch_tests.rs"]
mod tests;
