//! Violations raised by delivery reassembly.

use std::{fmt, num::NonZeroU64};

use thiserror::Error;

use super::ReassemblyState;

/// The kind of a frame fed into the reassembler.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum EventKind {
    /// `Basic.Deliver` method frame.
    Deliver,
    /// Content-header frame.
    Header,
    /// Content-body frame.
    Body,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Deliver => "deliver",
            Self::Header => "header",
            Self::Body => "body",
        })
    }
}

/// A frame sequence that cannot belong to a well-formed delivery.
///
/// Every violation abandons the delivery in flight.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum ReassemblyViolation {
    /// A frame arrived in a state that does not accept it.
    #[error("unexpected {event} frame while {state}")]
    UnexpectedEvent {
        /// Frame that was received.
        event: EventKind,
        /// State of the reassembler when it arrived.
        state: ReassemblyState,
    },

    /// A body fragment would take the body past its declared size.
    #[error("body overflow: {received} + {fragment_len} bytes exceeds declared {expected}")]
    BodyOverflow {
        /// Body bytes received before the fragment.
        received: u64,
        /// Length of the offending fragment.
        fragment_len: u64,
        /// Size declared by the content header.
        expected: u64,
    },

    /// A content header declared a body larger than the configured limit.
    #[error("declared body of {declared} bytes exceeds limit of {limit} bytes")]
    BodyTooLarge {
        /// Size declared by the content header.
        declared: u64,
        /// Configured cap.
        limit: NonZeroU64,
    },
}
