#![doc(html_root_url = "https://docs.rs/amqpframe/latest")]
//! Public API for the `amqpframe` library.
//!
//! This crate models AMQP 0-9-1 field values and message properties, and
//! reassembles `Basic.Deliver` messages from the method, header and body
//! frames a broker interleaves on a connection.

pub mod codec;
pub mod config;
pub mod consumer;
pub mod delivery;
pub mod error;
pub mod frame;
pub mod metrics;
pub mod properties;
pub mod value;

pub use codec::{AmqpFrameCodec, CodecError, RawFrame};
pub use config::ConsumerConfig;
pub use consumer::{DeliveryConsumer, FrameSource, ReaderSource};
pub use delivery::{
    DecodeResult,
    Delivery,
    DeliveryReassembler,
    FrameDispatcher,
    MessageCollector,
    ReassemblyState,
    ReassemblyViolation,
    ResultCollector,
};
/// Result type alias re-exported for convenience.
pub use error::Result;
pub use error::{AmqpError, LibraryStatus, ReplyOutcome};
pub use frame::{ContentHeader, Frame, Method, MethodId};
pub use metrics::{DELIVERIES_TOTAL, FRAMES_PROCESSED, UNHANDLED_FRAMES, VIOLATIONS_TOTAL};
pub use properties::{PropertyBag, PropertyFlags};
pub use value::{FieldArray, FieldTable, WireError, WireValue};
