//! Error type for the field-value and property wire codecs.
//!
//! Decoding failures carry enough context (remaining bytes, offending tag or
//! flags) to diagnose a malformed broker frame without re-reading it.

use thiserror::Error;

/// Errors produced while encoding or decoding AMQP field values, property
/// lists and method payloads.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum WireError {
    /// The input ended before a complete value could be read.
    #[error("unexpected end of input: needed {needed} bytes, {remaining} remaining")]
    UnexpectedEnd {
        /// Bytes required by the value being read.
        needed: usize,
        /// Bytes left in the input.
        remaining: usize,
    },
    /// A field value carried a type tag this codec does not understand.
    #[error("unknown field value tag {tag:#04x}")]
    UnknownTag {
        /// The tag octet that was read.
        tag: u8,
    },
    /// A short string (table key or property) is longer than 255 bytes.
    #[error("short string of {len} bytes exceeds 255")]
    ShortStringTooLong {
        /// Length of the rejected string.
        len: usize,
    },
    /// A long string or container payload does not fit a `u32` length prefix.
    #[error("payload of {len} bytes exceeds u32::MAX")]
    LengthOverflow {
        /// Length of the rejected payload.
        len: usize,
    },
    /// Arrays and tables were nested deeper than the codec allows.
    #[error("field values nested deeper than {limit} levels")]
    NestingTooDeep {
        /// Maximum nesting depth.
        limit: usize,
    },
    /// A property flags word used reserved bits.
    #[error("reserved property flag bits set: {flags:#06x}")]
    ReservedPropertyFlags {
        /// The full flags word as read from the wire.
        flags: u16,
    },
    /// A content header belonged to a class other than `basic`.
    #[error("unsupported content class {class_id}")]
    UnsupportedClass {
        /// Class identifier carried by the header.
        class_id: u16,
    },
    /// Bytes remained after a payload that must be consumed exactly.
    #[error("{len} trailing bytes after {what}")]
    TrailingBytes {
        /// Description of the payload that should have been exhausted.
        what: &'static str,
        /// Number of unread bytes.
        len: usize,
    },
}
