//! Test support for `amqpframe`.
//!
//! Builders for the frames a broker sends during a delivery, readers that
//! split or fail a byte stream on demand, and a serialised log capture
//! fixture.
//!
//! ```rust
//! use std::io::Cursor;
//!
//! use amqpframe::{DeliveryConsumer, ReaderSource, properties::PropertyBag};
//! use amqpframe_testing::{delivery, encode_frames};
//!
//! let wire = encode_frames(&delivery(7, PropertyBag::new(), b"payload", 3));
//! let mut consumer = DeliveryConsumer::new(ReaderSource::new(Cursor::new(wire)));
//! let message = consumer.next_delivery().unwrap().unwrap();
//! assert_eq!(&message.body[..], b"payload");
//! ```

pub mod frames;
pub mod logging;

pub use frames::{
    CHANNEL,
    ChunkedReader,
    FailingReader,
    bad_end_octet,
    body,
    channel_close,
    connection_close,
    deliver,
    deliver_with,
    delivery,
    encode_frames,
    header,
    heartbeat,
    raw_frame,
    truncated_body,
};
pub use logging::{LoggerHandle, logger};
