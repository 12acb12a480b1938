//! Delivery reassembly state machine.
//!
//! A delivery is a `Basic.Deliver` method frame, one content-header frame
//! declaring the body size, and body frames until that many bytes have
//! arrived. Completion is inferred from the byte count alone: no frame
//! carries an end-of-message marker.
//!
//! | From             | Event           | To               |
//! |------------------|-----------------|------------------|
//! | `Idle`           | `Deliver`       | `AwaitingHeader` |
//! | `AwaitingHeader` | `Header`        | `Receiving`      |
//! | `Receiving`      | `Body`          | `Receiving`      |
//!
//! After a `Header` or `Body` event the reassembler compares the received
//! and declared sizes; when they match it reports
//! [`AssemblyStatus::Complete`] and returns to `Idle`.

use std::{fmt, num::NonZeroU64};

use super::error::{EventKind, ReassemblyViolation};

/// Position of the reassembler within a delivery.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum ReassemblyState {
    /// No delivery in flight.
    #[default]
    Idle,
    /// `Basic.Deliver` seen; the content header is next.
    AwaitingHeader,
    /// Header seen; body frames are arriving.
    Receiving,
}

impl fmt::Display for ReassemblyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Idle => "idle",
            Self::AwaitingHeader => "awaiting header",
            Self::Receiving => "receiving body",
        })
    }
}

/// Input to [`DeliveryReassembler::handle`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DeliveryEvent {
    /// A `Basic.Deliver` method frame.
    Deliver {
        /// Delivery tag announced by the broker.
        delivery_tag: u64,
    },
    /// A content-header frame.
    Header {
        /// Declared total body size.
        body_size: u64,
    },
    /// A content-body frame.
    Body {
        /// Length of the fragment.
        fragment_len: u64,
    },
}

impl DeliveryEvent {
    /// Kind of this event.
    #[must_use]
    pub const fn kind(&self) -> EventKind {
        match self {
            Self::Deliver { .. } => EventKind::Deliver,
            Self::Header { .. } => EventKind::Header,
            Self::Body { .. } => EventKind::Body,
        }
    }
}

/// Result of feeding one event into a [`DeliveryReassembler`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AssemblyStatus {
    /// The delivery still expects more frames.
    Incomplete,
    /// The event completed the delivery.
    Complete,
}

impl AssemblyStatus {
    /// Whether this status reports a completed delivery.
    #[must_use]
    pub const fn is_complete(self) -> bool { matches!(self, Self::Complete) }
}

/// Flat state machine tracking one delivery at a time.
///
/// # Examples
///
/// ```
/// use amqpframe::delivery::{AssemblyStatus, DeliveryEvent, DeliveryReassembler};
///
/// let mut reassembler = DeliveryReassembler::new();
/// reassembler
///     .handle(DeliveryEvent::Deliver { delivery_tag: 1 })
///     .expect("deliver");
/// reassembler
///     .handle(DeliveryEvent::Header { body_size: 10 })
///     .expect("header");
///
/// let statuses: Vec<_> = [4, 4, 2]
///     .into_iter()
///     .map(|fragment_len| {
///         reassembler
///             .handle(DeliveryEvent::Body { fragment_len })
///             .expect("body")
///     })
///     .collect();
/// assert_eq!(
///     statuses,
///     [
///         AssemblyStatus::Incomplete,
///         AssemblyStatus::Incomplete,
///         AssemblyStatus::Complete
///     ]
/// );
/// ```
#[derive(Clone, Debug, Default)]
pub struct DeliveryReassembler {
    state: ReassemblyState,
    delivery_tag: u64,
    received_size: u64,
    expected_size: u64,
    max_body_size: Option<NonZeroU64>,
}

impl DeliveryReassembler {
    /// Create an idle reassembler with no body size limit.
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Reject content headers declaring more than `limit` body bytes.
    #[must_use]
    pub fn with_max_body_size(mut self, limit: Option<NonZeroU64>) -> Self {
        self.max_body_size = limit;
        self
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> ReassemblyState { self.state }

    /// Tag of the current or most recent delivery.
    #[must_use]
    pub const fn delivery_tag(&self) -> u64 { self.delivery_tag }

    /// Body bytes received so far.
    #[must_use]
    pub const fn received_size(&self) -> u64 { self.received_size }

    /// Body size declared by the content header.
    #[must_use]
    pub const fn expected_size(&self) -> u64 { self.expected_size }

    /// Configured body size limit.
    #[must_use]
    pub const fn max_body_size(&self) -> Option<NonZeroU64> { self.max_body_size }

    /// Whether a delivery is in flight.
    #[must_use]
    pub const fn in_flight(&self) -> bool { !matches!(self.state, ReassemblyState::Idle) }

    /// Apply one event.
    ///
    /// # Errors
    ///
    /// Returns [`ReassemblyViolation`] for an event the current state does
    /// not accept, a body overrunning its declared size, or a declared size
    /// over the configured limit. A violation abandons the delivery in
    /// flight; in `Idle` the state is left untouched.
    pub fn handle(&mut self, event: DeliveryEvent) -> Result<AssemblyStatus, ReassemblyViolation> {
        match (self.state, event) {
            (ReassemblyState::Idle, DeliveryEvent::Deliver { delivery_tag }) => {
                self.delivery_tag = delivery_tag;
                self.received_size = 0;
                self.expected_size = 0;
                self.state = ReassemblyState::AwaitingHeader;
                Ok(AssemblyStatus::Incomplete)
            }
            (ReassemblyState::AwaitingHeader, DeliveryEvent::Header { body_size }) => {
                if let Some(limit) = self.max_body_size.filter(|limit| body_size > limit.get()) {
                    return Err(self.abandon(ReassemblyViolation::BodyTooLarge {
                        declared: body_size,
                        limit,
                    }));
                }
                self.received_size = 0;
                self.expected_size = body_size;
                self.state = ReassemblyState::Receiving;
                Ok(self.check_complete())
            }
            (ReassemblyState::Receiving, DeliveryEvent::Body { fragment_len }) => {
                let received = self.received_size.saturating_add(fragment_len);
                if received > self.expected_size {
                    return Err(self.abandon(ReassemblyViolation::BodyOverflow {
                        received: self.received_size,
                        fragment_len,
                        expected: self.expected_size,
                    }));
                }
                self.received_size = received;
                Ok(self.check_complete())
            }
            (state, event) => Err(self.abandon(ReassemblyViolation::UnexpectedEvent {
                event: event.kind(),
                state,
            })),
        }
    }

    /// Discard any delivery in flight and return to `Idle`.
    pub fn reset(&mut self) {
        self.state = ReassemblyState::Idle;
        self.received_size = 0;
        self.expected_size = 0;
    }

    fn check_complete(&mut self) -> AssemblyStatus {
        if self.received_size == self.expected_size {
            self.state = ReassemblyState::Idle;
            AssemblyStatus::Complete
        } else {
            AssemblyStatus::Incomplete
        }
    }

    fn abandon(&mut self, violation: ReassemblyViolation) -> ReassemblyViolation {
        if self.in_flight() {
            self.reset();
        }
        violation
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
