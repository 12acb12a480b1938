//! Method-frame payloads.
//!
//! Only the methods a delivery consumer must understand are decoded:
//! `Basic.Deliver` and the two close notifications. Every other method is
//! kept as an opaque identifier plus argument bytes.

use std::fmt;

use bytes::{BufMut, Bytes, BytesMut};

use crate::value::{
    WireError,
    wire::{put_short_str, take_short_str, take_u8, take_u16, take_u64},
};

/// Combined class and method identifier, `class << 16 | method`.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct MethodId(pub u32);

impl MethodId {
    /// `Connection.Close` (10, 50).
    pub const CONNECTION_CLOSE: Self = Self::new(10, 50);
    /// `Channel.Close` (20, 40).
    pub const CHANNEL_CLOSE: Self = Self::new(20, 40);
    /// `Basic.Deliver` (60, 60).
    pub const BASIC_DELIVER: Self = Self::new(60, 60);

    /// Combine a class and method number.
    #[must_use]
    #[expect(clippy::cast_lossless, reason = "From conversions are not const.")]
    pub const fn new(class_id: u16, method_id: u16) -> Self {
        Self(((class_id as u32) << 16) | method_id as u32)
    }

    /// Class number.
    #[must_use]
    #[expect(clippy::cast_possible_truncation, reason = "The shift leaves 16 bits.")]
    pub const fn class_id(self) -> u16 { (self.0 >> 16) as u16 }

    /// Method number within the class.
    #[must_use]
    #[expect(clippy::cast_possible_truncation, reason = "The mask leaves 16 bits.")]
    pub const fn method_id(self) -> u16 { (self.0 & 0xFFFF) as u16 }
}

impl From<u32> for MethodId {
    fn from(value: u32) -> Self { Self(value) }
}

impl From<MethodId> for u32 {
    fn from(value: MethodId) -> Self { value.0 }
}

impl fmt::Display for MethodId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

/// Arguments of `Basic.Deliver`.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Deliver {
    /// Consumer the message is delivered to.
    pub consumer_tag: Bytes,
    /// Channel-scoped delivery tag used for acknowledgement.
    pub delivery_tag: u64,
    /// Whether the message was delivered before and not acknowledged.
    pub redelivered: bool,
    /// Exchange the message was published to.
    pub exchange: Bytes,
    /// Routing key used at publication.
    pub routing_key: Bytes,
}

impl Deliver {
    fn decode(args: &mut Bytes) -> Result<Self, WireError> {
        Ok(Self {
            consumer_tag: take_short_str(args)?,
            delivery_tag: take_u64(args)?,
            redelivered: take_u8(args)? & 1 != 0,
            exchange: take_short_str(args)?,
            routing_key: take_short_str(args)?,
        })
    }

    fn encode(&self, dst: &mut BytesMut) -> Result<(), WireError> {
        put_short_str(dst, &self.consumer_tag)?;
        dst.put_u64(self.delivery_tag);
        dst.put_u8(u8::from(self.redelivered));
        put_short_str(dst, &self.exchange)?;
        put_short_str(dst, &self.routing_key)
    }
}

/// Arguments shared by `Connection.Close` and `Channel.Close`.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct CloseReason {
    /// Reply code, e.g. 320 (connection forced) or 404 (not found).
    pub reply_code: u16,
    /// Human-readable reason.
    pub reply_text: Bytes,
    /// Class of the method that caused the close, or 0.
    pub class_id: u16,
    /// Method that caused the close, or 0.
    pub method_id: u16,
}

impl CloseReason {
    /// Reason with the given code and text and no failing method.
    #[must_use]
    pub fn new(reply_code: u16, reply_text: impl Into<Bytes>) -> Self {
        Self {
            reply_code,
            reply_text: reply_text.into(),
            ..Self::default()
        }
    }

    fn decode(args: &mut Bytes) -> Result<Self, WireError> {
        Ok(Self {
            reply_code: take_u16(args)?,
            reply_text: take_short_str(args)?,
            class_id: take_u16(args)?,
            method_id: take_u16(args)?,
        })
    }

    fn encode(&self, dst: &mut BytesMut) -> Result<(), WireError> {
        dst.put_u16(self.reply_code);
        put_short_str(dst, &self.reply_text)?;
        dst.put_u16(self.class_id);
        dst.put_u16(self.method_id);
        Ok(())
    }
}

/// A decoded method-frame payload.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Method {
    /// `Basic.Deliver`: announces a delivery.
    BasicDeliver(Deliver),
    /// `Connection.Close`: the broker is closing the connection.
    ConnectionClose(CloseReason),
    /// `Channel.Close`: the broker is closing a channel.
    ChannelClose(CloseReason),
    /// Any other method, undecoded.
    Other {
        /// Method identifier.
        id: MethodId,
        /// Raw argument bytes.
        args: Bytes,
    },
}

impl Method {
    /// Identifier of this method.
    #[must_use]
    pub const fn id(&self) -> MethodId {
        match self {
            Self::BasicDeliver(_) => MethodId::BASIC_DELIVER,
            Self::ConnectionClose(_) => MethodId::CONNECTION_CLOSE,
            Self::ChannelClose(_) => MethodId::CHANNEL_CLOSE,
            Self::Other { id, .. } => *id,
        }
    }

    /// Decode a method-frame payload.
    ///
    /// # Errors
    ///
    /// Returns [`WireError`] when the payload is truncated or carries bytes
    /// past the arguments of a decoded method.
    pub fn decode(mut payload: Bytes) -> Result<Self, WireError> {
        let class_id = take_u16(&mut payload)?;
        let method_id = take_u16(&mut payload)?;
        let id = MethodId::new(class_id, method_id);
        let method = match id {
            MethodId::BASIC_DELIVER => Self::BasicDeliver(Deliver::decode(&mut payload)?),
            MethodId::CONNECTION_CLOSE => Self::ConnectionClose(CloseReason::decode(&mut payload)?),
            MethodId::CHANNEL_CLOSE => Self::ChannelClose(CloseReason::decode(&mut payload)?),
            _ => return Ok(Self::Other { id, args: payload }),
        };
        if !payload.is_empty() {
            return Err(WireError::TrailingBytes {
                what: "method arguments",
                len: payload.len(),
            });
        }
        Ok(method)
    }

    /// Append the method payload (identifier then arguments) to `dst`.
    ///
    /// # Errors
    ///
    /// Returns [`WireError::ShortStringTooLong`] when a string argument
    /// exceeds 255 bytes.
    pub fn encode(&self, dst: &mut BytesMut) -> Result<(), WireError> {
        let id = self.id();
        dst.put_u16(id.class_id());
        dst.put_u16(id.method_id());
        match self {
            Self::BasicDeliver(deliver) => deliver.encode(dst),
            Self::ConnectionClose(reason) | Self::ChannelClose(reason) => reason.encode(dst),
            Self::Other { args, .. } => {
                dst.put_slice(args);
                Ok(())
            }
        }
    }
}
