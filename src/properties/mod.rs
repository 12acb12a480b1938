//! Basic-class message properties.
//!
//! A [`PropertyBag`] holds the fourteen optional properties a content header
//! may carry. Each property is guarded by one bit of a [`PropertyFlags`]
//! word: the bit is set exactly when the property was assigned, either by a
//! setter or by decoding a header whose flags word carried it.
//!
//! On the wire the flags word is followed by the flagged properties only, in
//! the fixed order of [`PropertyFlags::ORDER`]. Unset properties are never
//! written.

use std::ops::{BitOr, BitOrAssign};

use bytes::{BufMut, Bytes, BytesMut};

use crate::value::{
    FieldTable,
    WireError,
    WireValue,
    wire::{put_short_str, take_short_str, take_u8, take_u16, take_u64},
};

/// Presence bits of a [`PropertyBag`].
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct PropertyFlags(u16);

impl PropertyFlags {
    /// `content-type` is present.
    pub const CONTENT_TYPE: Self = Self(1 << 15);
    /// `content-encoding` is present.
    pub const CONTENT_ENCODING: Self = Self(1 << 14);
    /// `headers` is present.
    pub const HEADERS: Self = Self(1 << 13);
    /// `delivery-mode` is present.
    pub const DELIVERY_MODE: Self = Self(1 << 12);
    /// `priority` is present.
    pub const PRIORITY: Self = Self(1 << 11);
    /// `correlation-id` is present.
    pub const CORRELATION_ID: Self = Self(1 << 10);
    /// `reply-to` is present.
    pub const REPLY_TO: Self = Self(1 << 9);
    /// `expiration` is present.
    pub const EXPIRATION: Self = Self(1 << 8);
    /// `message-id` is present.
    pub const MESSAGE_ID: Self = Self(1 << 7);
    /// `timestamp` is present.
    pub const TIMESTAMP: Self = Self(1 << 6);
    /// `type` is present.
    pub const TYPE: Self = Self(1 << 5);
    /// `user-id` is present.
    pub const USER_ID: Self = Self(1 << 4);
    /// `app-id` is present.
    pub const APP_ID: Self = Self(1 << 3);
    /// `cluster-id` is present.
    pub const CLUSTER_ID: Self = Self(1 << 2);

    /// Every property flag, in wire order.
    pub const ORDER: [Self; 14] = [
        Self::CONTENT_TYPE,
        Self::CONTENT_ENCODING,
        Self::HEADERS,
        Self::DELIVERY_MODE,
        Self::PRIORITY,
        Self::CORRELATION_ID,
        Self::REPLY_TO,
        Self::EXPIRATION,
        Self::MESSAGE_ID,
        Self::TIMESTAMP,
        Self::TYPE,
        Self::USER_ID,
        Self::APP_ID,
        Self::CLUSTER_ID,
    ];

    const RESERVED: u16 = 0b11;

    /// No properties present.
    #[must_use]
    pub const fn empty() -> Self { Self(0) }

    /// All fourteen properties present.
    #[must_use]
    pub const fn all() -> Self { Self(!Self::RESERVED) }

    /// Build flags from a raw word, rejecting the reserved low bits.
    #[must_use]
    pub const fn from_bits(bits: u16) -> Option<Self> {
        if bits & Self::RESERVED != 0 {
            return None;
        }
        Some(Self(bits))
    }

    /// The raw flags word.
    #[must_use]
    pub const fn bits(self) -> u16 { self.0 }

    /// Whether every bit of `other` is set in `self`.
    #[must_use]
    pub const fn contains(self, other: Self) -> bool { self.0 & other.0 == other.0 }

    /// Whether no bits are set.
    #[must_use]
    pub const fn is_empty(self) -> bool { self.0 == 0 }
}

impl BitOr for PropertyFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self { Self(self.0 | rhs.0) }
}

impl BitOrAssign for PropertyFlags {
    fn bitor_assign(&mut self, rhs: Self) { self.0 |= rhs.0; }
}

/// Sparse record of basic-class message properties.
///
/// Accessors for unset properties return an empty or zero value; consult
/// [`has`](Self::has) before trusting one.
///
/// # Examples
///
/// ```
/// use amqpframe::properties::{PropertyBag, PropertyFlags};
///
/// let mut props = PropertyBag::new();
/// props.set_correlation_id("req-7").set_priority(3);
///
/// let mut wire = props.to_wire().expect("encode properties");
/// let decoded = PropertyBag::from_wire(&mut wire).expect("decode properties");
///
/// assert_eq!(decoded.flags(), PropertyFlags::CORRELATION_ID | PropertyFlags::PRIORITY);
/// assert_eq!(decoded.correlation_id(), b"req-7");
/// assert!(!decoded.has(PropertyFlags::REPLY_TO));
/// ```
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct PropertyBag {
    flags: PropertyFlags,
    content_type: Bytes,
    content_encoding: Bytes,
    headers: FieldTable,
    delivery_mode: u8,
    priority: u8,
    correlation_id: Bytes,
    reply_to: Bytes,
    expiration: Bytes,
    message_id: Bytes,
    timestamp: u64,
    message_type: Bytes,
    user_id: Bytes,
    app_id: Bytes,
    cluster_id: Bytes,
}

macro_rules! short_string_property {
    ($($(#[$doc:meta])* $field:ident, $setter:ident => $flag:ident;)*) => {
        $(
            $(#[$doc])*
            #[must_use]
            pub fn $field(&self) -> &[u8] { &self.$field }

            #[doc = concat!("Assign `", stringify!($field), "` and mark it present.")]
            pub fn $setter(&mut self, value: impl Into<Bytes>) -> &mut Self {
                self.$field = value.into();
                self.flags |= PropertyFlags::$flag;
                self
            }
        )*
    };
}

impl PropertyBag {
    /// Create a bag with no properties present.
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Decode a flags word and the properties it announces.
    ///
    /// # Errors
    ///
    /// Returns [`WireError`] when the input is truncated or the flags word
    /// uses reserved bits.
    pub fn from_wire(wire: &mut Bytes) -> Result<Self, WireError> {
        let mut bag = Self::new();
        bag.set(wire)?;
        Ok(bag)
    }

    /// Replace this bag's contents with the properties decoded from `wire`.
    ///
    /// Only properties whose bit is set are read, in wire order; every other
    /// property reverts to its empty value. On error `self` is unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`WireError`] when the input is truncated or the flags word
    /// uses reserved bits.
    pub fn set(&mut self, wire: &mut Bytes) -> Result<(), WireError> {
        let raw = take_u16(wire)?;
        let flags =
            PropertyFlags::from_bits(raw).ok_or(WireError::ReservedPropertyFlags { flags: raw })?;

        let mut bag = Self {
            flags,
            ..Self::default()
        };
        for flag in PropertyFlags::ORDER {
            if flags.contains(flag) {
                bag.read_property(flag, wire)?;
            }
        }
        *self = bag;
        Ok(())
    }

    fn read_property(&mut self, flag: PropertyFlags, wire: &mut Bytes) -> Result<(), WireError> {
        match flag {
            PropertyFlags::CONTENT_TYPE => self.content_type = take_short_str(wire)?,
            PropertyFlags::CONTENT_ENCODING => self.content_encoding = take_short_str(wire)?,
            PropertyFlags::HEADERS => self.headers = FieldTable::decode(wire)?,
            PropertyFlags::DELIVERY_MODE => self.delivery_mode = take_u8(wire)?,
            PropertyFlags::PRIORITY => self.priority = take_u8(wire)?,
            PropertyFlags::CORRELATION_ID => self.correlation_id = take_short_str(wire)?,
            PropertyFlags::REPLY_TO => self.reply_to = take_short_str(wire)?,
            PropertyFlags::EXPIRATION => self.expiration = take_short_str(wire)?,
            PropertyFlags::MESSAGE_ID => self.message_id = take_short_str(wire)?,
            PropertyFlags::TIMESTAMP => self.timestamp = take_u64(wire)?,
            PropertyFlags::TYPE => self.message_type = take_short_str(wire)?,
            PropertyFlags::USER_ID => self.user_id = take_short_str(wire)?,
            PropertyFlags::APP_ID => self.app_id = take_short_str(wire)?,
            PropertyFlags::CLUSTER_ID => self.cluster_id = take_short_str(wire)?,
            _ => {}
        }
        Ok(())
    }

    /// Encode the flags word and every present property.
    ///
    /// # Errors
    ///
    /// Returns [`WireError`] when a string property exceeds 255 bytes or the
    /// headers table cannot be encoded.
    pub fn to_wire(&self) -> Result<Bytes, WireError> {
        let mut buf = BytesMut::new();
        self.encode(&mut buf)?;
        Ok(buf.freeze())
    }

    /// Append the flags word and every present property to `dst`.
    ///
    /// # Errors
    ///
    /// See [`to_wire`](Self::to_wire).
    pub fn encode(&self, dst: &mut BytesMut) -> Result<(), WireError> {
        dst.put_u16(self.flags.bits());
        for flag in PropertyFlags::ORDER {
            if self.flags.contains(flag) {
                self.write_property(flag, dst)?;
            }
        }
        Ok(())
    }

    fn write_property(&self, flag: PropertyFlags, dst: &mut BytesMut) -> Result<(), WireError> {
        match flag {
            PropertyFlags::CONTENT_TYPE => put_short_str(dst, &self.content_type)?,
            PropertyFlags::CONTENT_ENCODING => put_short_str(dst, &self.content_encoding)?,
            PropertyFlags::HEADERS => self.headers.encode(dst)?,
            PropertyFlags::DELIVERY_MODE => dst.put_u8(self.delivery_mode),
            PropertyFlags::PRIORITY => dst.put_u8(self.priority),
            PropertyFlags::CORRELATION_ID => put_short_str(dst, &self.correlation_id)?,
            PropertyFlags::REPLY_TO => put_short_str(dst, &self.reply_to)?,
            PropertyFlags::EXPIRATION => put_short_str(dst, &self.expiration)?,
            PropertyFlags::MESSAGE_ID => put_short_str(dst, &self.message_id)?,
            PropertyFlags::TIMESTAMP => dst.put_u64(self.timestamp),
            PropertyFlags::TYPE => put_short_str(dst, &self.message_type)?,
            PropertyFlags::USER_ID => put_short_str(dst, &self.user_id)?,
            PropertyFlags::APP_ID => put_short_str(dst, &self.app_id)?,
            PropertyFlags::CLUSTER_ID => put_short_str(dst, &self.cluster_id)?,
            _ => {}
        }
        Ok(())
    }

    /// Presence bits of every property.
    #[must_use]
    pub const fn flags(&self) -> PropertyFlags { self.flags }

    /// Whether every property in `flag` has been assigned.
    #[must_use]
    pub const fn has(&self, flag: PropertyFlags) -> bool { self.flags.contains(flag) }

    short_string_property! {
        /// MIME content type.
        content_type, set_content_type => CONTENT_TYPE;
        /// MIME content encoding.
        content_encoding, set_content_encoding => CONTENT_ENCODING;
        /// Application correlation identifier.
        correlation_id, set_correlation_id => CORRELATION_ID;
        /// Address to reply to.
        reply_to, set_reply_to => REPLY_TO;
        /// Message expiration specification.
        expiration, set_expiration => EXPIRATION;
        /// Application message identifier.
        message_id, set_message_id => MESSAGE_ID;
        /// Message type name (the `type` property).
        message_type, set_message_type => TYPE;
        /// Creating user id.
        user_id, set_user_id => USER_ID;
        /// Creating application id.
        app_id, set_app_id => APP_ID;
        /// Intra-cluster routing identifier.
        cluster_id, set_cluster_id => CLUSTER_ID;
    }

    /// Message header table.
    #[must_use]
    pub const fn headers(&self) -> &FieldTable { &self.headers }

    /// Replace the header table and mark it present.
    pub fn set_headers(&mut self, headers: FieldTable) -> &mut Self {
        self.headers = headers;
        self.flags |= PropertyFlags::HEADERS;
        self
    }

    /// Append one header and mark the table present.
    pub fn add_header(&mut self, key: impl Into<Bytes>, value: impl Into<WireValue>) -> &mut Self {
        self.headers.add(key, value);
        self.flags |= PropertyFlags::HEADERS;
        self
    }

    /// Delivery mode: 1 for transient, 2 for persistent.
    #[must_use]
    pub const fn delivery_mode(&self) -> u8 { self.delivery_mode }

    /// Assign the delivery mode and mark it present.
    pub fn set_delivery_mode(&mut self, mode: u8) -> &mut Self {
        self.delivery_mode = mode;
        self.flags |= PropertyFlags::DELIVERY_MODE;
        self
    }

    /// Message priority, 0 to 9.
    #[must_use]
    pub const fn priority(&self) -> u8 { self.priority }

    /// Assign the priority and mark it present.
    pub fn set_priority(&mut self, priority: u8) -> &mut Self {
        self.priority = priority;
        self.flags |= PropertyFlags::PRIORITY;
        self
    }

    /// Message timestamp in seconds since the Unix epoch.
    #[must_use]
    pub const fn timestamp(&self) -> u64 { self.timestamp }

    /// Assign the timestamp and mark it present.
    pub fn set_timestamp(&mut self, timestamp: u64) -> &mut Self {
        self.timestamp = timestamp;
        self.flags |= PropertyFlags::TIMESTAMP;
        self
    }
}

#[cfg(test)]
mod tests;
