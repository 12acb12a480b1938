//! Error types for the frame codec.
//!
//! # Error Categories
//!
//! - [`FramingError`]: the byte stream does not follow AMQP frame structure (oversized frames,
//!   missing end octet).
//! - [`EofError`]: the stream ended part way through a frame.
//! - [`CodecError`]: top-level enum wrapping both categories plus I/O errors.

use std::io;

use thiserror::Error;

/// Framing-level errors occurring during frame boundary detection.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum FramingError {
    /// Frame size exceeds the configured maximum.
    #[error("frame exceeds max length: {size} > {max}")]
    OversizedFrame {
        /// Total frame size, header and end octet included.
        size: usize,
        /// Maximum allowed frame size.
        max: usize,
    },

    /// The octet after the payload was not the frame-end marker.
    #[error("invalid frame end octet {found:#04x}")]
    InvalidFrameEnd {
        /// Octet found where the end marker was expected.
        found: u8,
    },
}

/// Premature end of stream.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum EofError {
    /// EOF received after the header, before the payload and end octet.
    #[error("premature EOF: {bytes_received} bytes of {expected} byte frame body received")]
    MidFrame {
        /// Payload bytes received before EOF.
        bytes_received: usize,
        /// Payload plus end octet expected.
        expected: usize,
    },

    /// EOF received while reading the frame header.
    #[error("premature EOF during header: {bytes_received} of {header_size} header bytes")]
    MidHeader {
        /// Header bytes received before EOF.
        bytes_received: usize,
        /// Expected header size.
        header_size: usize,
    },
}

/// Top-level codec error taxonomy.
///
/// # Examples
///
/// ```
/// use amqpframe::codec::{CodecError, FramingError};
///
/// let err = CodecError::Framing(FramingError::InvalidFrameEnd { found: 0 });
/// assert_eq!(err.error_type(), "framing");
/// assert_eq!(err.to_string(), "framing error: invalid frame end octet 0x00");
/// ```
#[derive(Debug, Error)]
pub enum CodecError {
    /// Framing layer error.
    #[error("framing error: {0}")]
    Framing(#[from] FramingError),

    /// Transport layer I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// End-of-stream handling.
    #[error("EOF: {0}")]
    Eof(#[from] EofError),
}

impl CodecError {
    /// Returns the error category as a string for logging and metrics.
    ///
    /// One of: `"framing"`, `"io"`, or `"eof"`.
    #[must_use]
    pub fn error_type(&self) -> &'static str {
        match self {
            Self::Framing(_) => "framing",
            Self::Io(_) => "io",
            Self::Eof(_) => "eof",
        }
    }

    /// Whether the stream ended part way through a frame.
    #[must_use]
    pub fn is_premature_eof(&self) -> bool {
        match self {
            Self::Eof(_) => true,
            Self::Io(err) => err.kind() == io::ErrorKind::UnexpectedEof,
            Self::Framing(_) => false,
        }
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
