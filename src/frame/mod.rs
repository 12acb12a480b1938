//! Typed AMQP frames.
//!
//! [`Frame`] interprets the payload of a [`RawFrame`] according to its type
//! octet. Method and content-header payloads are decoded; body payloads are
//! passed through without copying.

mod header;
mod method;

use bytes::{Bytes, BytesMut};

pub use header::{BASIC_CLASS_ID, ContentHeader};
pub use method::{CloseReason, Deliver, Method, MethodId};

use crate::{codec::RawFrame, value::WireError};

/// Frame type octet of a method frame.
pub const FRAME_METHOD: u8 = 1;
/// Frame type octet of a content-header frame.
pub const FRAME_HEADER: u8 = 2;
/// Frame type octet of a content-body frame.
pub const FRAME_BODY: u8 = 3;
/// Frame type octet of a heartbeat frame.
pub const FRAME_HEARTBEAT: u8 = 8;

/// Coarse frame classification, used for logging and metrics labels.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum FrameKind {
    /// Method frame.
    Method,
    /// Content-header frame.
    Header,
    /// Content-body frame.
    Body,
    /// Heartbeat frame.
    Heartbeat,
    /// Any other frame type.
    Unknown,
}

impl FrameKind {
    /// Label for this kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Method => "method",
            Self::Header => "header",
            Self::Body => "body",
            Self::Heartbeat => "heartbeat",
            Self::Unknown => "unknown",
        }
    }
}

/// A frame with its payload interpreted.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Frame {
    /// Method frame.
    Method {
        /// Channel the method was sent on.
        channel: u16,
        /// Decoded method.
        method: Method,
    },
    /// Content-header frame.
    Header {
        /// Channel of the delivery.
        channel: u16,
        /// Declared body size and properties.
        header: ContentHeader,
    },
    /// Content-body frame.
    Body {
        /// Channel of the delivery.
        channel: u16,
        /// Body fragment.
        fragment: Bytes,
    },
    /// Heartbeat frame; always on channel 0.
    Heartbeat {
        /// Channel the heartbeat arrived on.
        channel: u16,
    },
    /// Frame of an unrecognised type.
    Unknown {
        /// Type octet.
        frame_type: u8,
        /// Channel number.
        channel: u16,
        /// Raw payload.
        payload: Bytes,
    },
}

impl Frame {
    /// Channel the frame belongs to.
    #[must_use]
    pub const fn channel(&self) -> u16 {
        match self {
            Self::Method { channel, .. }
            | Self::Header { channel, .. }
            | Self::Body { channel, .. }
            | Self::Heartbeat { channel }
            | Self::Unknown { channel, .. } => *channel,
        }
    }

    /// Coarse classification of this frame.
    #[must_use]
    pub const fn kind(&self) -> FrameKind {
        match self {
            Self::Method { .. } => FrameKind::Method,
            Self::Header { .. } => FrameKind::Header,
            Self::Body { .. } => FrameKind::Body,
            Self::Heartbeat { .. } => FrameKind::Heartbeat,
            Self::Unknown { .. } => FrameKind::Unknown,
        }
    }

    /// Type octet written for this frame.
    #[must_use]
    pub const fn frame_type(&self) -> u8 {
        match self {
            Self::Method { .. } => FRAME_METHOD,
            Self::Header { .. } => FRAME_HEADER,
            Self::Body { .. } => FRAME_BODY,
            Self::Heartbeat { .. } => FRAME_HEARTBEAT,
            Self::Unknown { frame_type, .. } => *frame_type,
        }
    }

    /// Encode this frame's payload into a [`RawFrame`].
    ///
    /// # Errors
    ///
    /// Returns [`WireError`] when a method argument or property cannot be
    /// encoded.
    pub fn to_raw(&self) -> Result<RawFrame, WireError> {
        let payload = match self {
            Self::Method { method, .. } => {
                let mut buf = BytesMut::new();
                method.encode(&mut buf)?;
                buf.freeze()
            }
            Self::Header { header, .. } => {
                let mut buf = BytesMut::new();
                header.encode(&mut buf)?;
                buf.freeze()
            }
            Self::Body { fragment, .. } => fragment.clone(),
            Self::Heartbeat { .. } => Bytes::new(),
            Self::Unknown { payload, .. } => payload.clone(),
        };
        Ok(RawFrame::new(self.frame_type(), self.channel(), payload))
    }
}

impl TryFrom<RawFrame> for Frame {
    type Error = WireError;

    fn try_from(raw: RawFrame) -> Result<Self, Self::Error> {
        let RawFrame {
            frame_type,
            channel,
            payload,
        } = raw;
        let frame = match frame_type {
            FRAME_METHOD => Self::Method {
                channel,
                method: Method::decode(payload)?,
            },
            FRAME_HEADER => Self::Header {
                channel,
                header: ContentHeader::decode(payload)?,
            },
            FRAME_BODY => Self::Body {
                channel,
                fragment: payload,
            },
            FRAME_HEARTBEAT => Self::Heartbeat { channel },
            _ => Self::Unknown {
                frame_type,
                channel,
                payload,
            },
        };
        Ok(frame)
    }
}

#[cfg(test)]
mod tests;
