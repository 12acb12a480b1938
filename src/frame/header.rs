//! Content-header payloads.

use bytes::{BufMut, Bytes, BytesMut};

use crate::{
    properties::PropertyBag,
    value::{
        WireError,
        wire::{take_u16, take_u64},
    },
};

/// Class number of `basic`, the only content class carrying deliveries.
pub const BASIC_CLASS_ID: u16 = 60;

/// Payload of a content-header frame: declared body size plus properties.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ContentHeader {
    /// Total size of the body that follows, across all body frames.
    pub body_size: u64,
    /// Message properties.
    pub properties: PropertyBag,
}

impl ContentHeader {
    /// Header for a basic-class body of `body_size` bytes.
    #[must_use]
    pub fn new(body_size: u64, properties: PropertyBag) -> Self {
        Self {
            body_size,
            properties,
        }
    }

    /// Decode a header-frame payload.
    ///
    /// # Errors
    ///
    /// Returns [`WireError::UnsupportedClass`] for classes other than
    /// `basic`, or any property decoding error. Bytes left after the
    /// property list are rejected.
    pub fn decode(mut payload: Bytes) -> Result<Self, WireError> {
        let class_id = take_u16(&mut payload)?;
        if class_id != BASIC_CLASS_ID {
            return Err(WireError::UnsupportedClass { class_id });
        }
        // weight, unused since AMQP 0-9
        take_u16(&mut payload)?;
        let body_size = take_u64(&mut payload)?;
        let properties = PropertyBag::from_wire(&mut payload)?;
        if !payload.is_empty() {
            return Err(WireError::TrailingBytes {
                what: "content header",
                len: payload.len(),
            });
        }
        Ok(Self {
            body_size,
            properties,
        })
    }

    /// Append the header-frame payload to `dst`.
    ///
    /// # Errors
    ///
    /// Returns [`WireError`] when the properties cannot be encoded.
    pub fn encode(&self, dst: &mut BytesMut) -> Result<(), WireError> {
        dst.put_u16(BASIC_CLASS_ID);
        dst.put_u16(0);
        dst.put_u64(self.body_size);
        self.properties.encode(dst)
    }
}
