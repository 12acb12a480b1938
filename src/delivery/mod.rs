//! Delivery reassembly.
//!
//! A broker delivers one message as a `Basic.Deliver` method frame, a
//! content-header frame and zero or more content-body frames. This module
//! stitches those frames back into one [`Delivery`]:
//!
//! - [`DeliveryReassembler`] is the state machine tracking which frame is
//!   expected next and how many body bytes remain.
//! - [`FrameDispatcher`] classifies typed frames into [`DecodeResult`]s,
//!   feeding the reassembler as it goes.
//! - [`ResultCollector`] (implemented by [`MessageCollector`]) accumulates
//!   results and reports completion.
//!
//! Deliveries are processed one at a time; frames of two deliveries never
//! interleave on a channel.

mod collector;
mod dispatch;
pub mod error;
mod state;

pub use collector::{Delivery, MessageCollector, ResultCollector};
pub use dispatch::{BodyFragment, DecodeResult, FrameDispatcher, UnhandledFrame};
pub use error::{EventKind, ReassemblyViolation};
pub use state::{AssemblyStatus, DeliveryEvent, DeliveryReassembler, ReassemblyState};
