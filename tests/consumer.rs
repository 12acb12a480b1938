//! End-to-end tests for `DeliveryConsumer` over encoded frame streams.

use std::{
    io::{self, Cursor},
    num::NonZeroU64,
};

use amqpframe::{
    AmqpError,
    ConsumerConfig,
    DeliveryConsumer,
    LibraryStatus,
    ReaderSource,
    delivery::{EventKind, ReassemblyState, ReassemblyViolation},
    error::CloseEntity,
    properties::PropertyBag,
};
use amqpframe_testing::{
    CHANNEL,
    ChunkedReader,
    FailingReader,
    bad_end_octet,
    body,
    channel_close,
    connection_close,
    deliver,
    delivery,
    encode_frames,
    header,
    heartbeat,
    truncated_body,
};
use rstest::rstest;

fn consumer_over(wire: Vec<u8>) -> DeliveryConsumer<ReaderSource<Cursor<Vec<u8>>>> {
    DeliveryConsumer::new(ReaderSource::new(Cursor::new(wire)))
}

fn tagged_properties() -> PropertyBag {
    let mut properties = PropertyBag::new();
    properties
        .set_content_type("text/plain")
        .set_correlation_id("req-17");
    properties.set_delivery_mode(2);
    properties
}

#[rstest]
#[case::single_read(usize::MAX)]
#[case::split_reads(5)]
#[case::byte_at_a_time(1)]
fn assembles_fragmented_delivery(#[case] read_size: usize) {
    let wire = encode_frames(&delivery(7, tagged_properties(), b"hello world", 4));
    let reader = ChunkedReader::new(wire, read_size);
    let mut consumer = DeliveryConsumer::new(ReaderSource::new(reader));

    let message = consumer
        .next_delivery()
        .expect("stream is well formed")
        .expect("one delivery");

    assert_eq!(message.delivery_tag, 7);
    assert_eq!(&message.consumer_tag[..], b"amq.ctag-test");
    assert_eq!(&message.exchange[..], b"amq.direct");
    assert_eq!(&message.routing_key[..], b"jobs");
    assert_eq!(message.properties.content_type(), b"text/plain");
    assert_eq!(message.properties.correlation_id(), b"req-17");
    assert_eq!(message.properties.delivery_mode(), 2);
    assert_eq!(&message.body[..], b"hello world");

    assert!(consumer.next_delivery().expect("clean end").is_none());
}

#[test]
fn consecutive_deliveries_ignore_interleaved_heartbeats() {
    let mut frames = delivery(1, PropertyBag::new(), b"first", 2);
    frames.insert(3, heartbeat());
    frames.push(heartbeat());
    frames.extend(delivery(2, PropertyBag::new(), b"second", 16));

    let bodies: Vec<_> = consumer_over(encode_frames(&frames))
        .map(|message| message.expect("valid delivery"))
        .map(|message| (message.delivery_tag, message.body))
        .collect();

    assert_eq!(bodies.len(), 2);
    assert_eq!((bodies[0].0, &bodies[0].1[..]), (1, &b"first"[..]));
    assert_eq!((bodies[1].0, &bodies[1].1[..]), (2, &b"second"[..]));
}

#[test]
fn empty_body_completes_without_body_frames() {
    let wire = encode_frames(&[deliver(CHANNEL, 4), header(CHANNEL, 0, PropertyBag::new())]);
    let message = consumer_over(wire)
        .next_delivery()
        .expect("valid stream")
        .expect("delivery");

    assert_eq!(message.delivery_tag, 4);
    assert!(message.body.is_empty());
}

#[test]
fn connection_close_mid_delivery_is_reported() {
    let mut frames = vec![deliver(CHANNEL, 3), header(CHANNEL, 10, PropertyBag::new())];
    frames.push(body(CHANNEL, b"part"));
    frames.push(connection_close(320, "CONNECTION_FORCED"));
    let mut consumer = consumer_over(encode_frames(&frames));

    let err = consumer.next_delivery().expect_err("broker closed");

    assert!(err.is_protocol_close());
    assert_eq!(
        err.to_string(),
        "consuming delivery: server connection error 320, message: CONNECTION_FORCED"
    );
    assert!(!consumer.in_flight());
    assert!(consumer.next_delivery().expect("clean end").is_none());
}

#[test]
fn channel_close_names_the_channel() {
    let wire = encode_frames(&[channel_close(CHANNEL, 404, "NOT_FOUND - no queue 'q'")]);
    let err = consumer_over(wire).next_delivery().expect_err("channel closed");

    let AmqpError::ProtocolClose {
        entity, reply_code, ..
    } = err
    else {
        panic!("expected a protocol close");
    };
    assert_eq!(entity, CloseEntity::Channel);
    assert_eq!(reply_code, 404);
}

#[test]
fn delivery_after_close_starts_fresh() {
    let mut frames = vec![deliver(CHANNEL, 1), channel_close(CHANNEL, 406, "PRECONDITION_FAILED")];
    frames.extend(delivery(2, PropertyBag::new(), b"ok", 8));
    let mut consumer = consumer_over(encode_frames(&frames));

    consumer.next_delivery().expect_err("close is reported");
    let message = consumer
        .next_delivery()
        .expect("later delivery")
        .expect("delivery");
    assert_eq!(message.delivery_tag, 2);
}

#[test]
fn end_of_stream_mid_delivery_is_connection_closed() {
    let wire = encode_frames(&[deliver(CHANNEL, 5), header(CHANNEL, 3, PropertyBag::new())]);
    let err = consumer_over(wire)
        .next_delivery()
        .expect_err("delivery was cut short");

    assert_eq!(err.status(), Some(LibraryStatus::ConnectionClosed));
    assert_eq!(
        err.to_string(),
        "consuming delivery: connection closed unexpectedly"
    );
}

#[rstest]
#[case::truncated_frame(truncated_body(b"payload", 3), LibraryStatus::ConnectionClosed)]
#[case::bad_end_octet(bad_end_octet(b"x"), LibraryStatus::BadAmqpData)]
fn malformed_framing_maps_to_library_status(#[case] wire: Vec<u8>, #[case] status: LibraryStatus) {
    let err = consumer_over(wire)
        .next_delivery()
        .expect_err("malformed stream");

    assert_eq!(err.status(), Some(status));
    assert!(err.to_string().starts_with("reading frame: "));
}

#[test]
fn transport_failure_is_a_socket_error() {
    let reader = FailingReader::new(Vec::new(), io::ErrorKind::ConnectionReset);
    let err = DeliveryConsumer::new(ReaderSource::new(reader))
        .next_delivery()
        .expect_err("reader fails");

    assert_eq!(err.status(), Some(LibraryStatus::SocketError));
}

#[test]
fn oversized_frame_is_rejected_by_configured_length() {
    let config = ConsumerConfig::default().max_frame_length(4096);
    let payload = vec![0_u8; 5000];
    let wire = encode_frames(&delivery(1, PropertyBag::new(), &payload, payload.len()));
    let source = ReaderSource::with_config(Cursor::new(wire), &config);

    let err = DeliveryConsumer::with_config(source, &config)
        .next_delivery()
        .expect_err("body frame exceeds limit");

    assert_eq!(err.status(), Some(LibraryStatus::BadAmqpData));
}

#[test]
fn body_size_limit_rejects_delivery_and_recovers() {
    let config = ConsumerConfig::default().max_body_size(NonZeroU64::new(4));
    let mut frames = delivery(1, PropertyBag::new(), b"too large", 16);
    frames.extend(delivery(2, PropertyBag::new(), b"tiny", 16));
    let source = ReaderSource::new(Cursor::new(encode_frames(&frames)));
    let mut consumer = DeliveryConsumer::with_config(source, &config);

    let err = consumer.next_delivery().expect_err("declared body too large");
    assert!(matches!(
        err,
        AmqpError::Reassembly(ReassemblyViolation::BodyTooLarge { declared: 9, .. })
    ));

    // The rejected delivery's body frame arrives while idle.
    let err = consumer.next_delivery().expect_err("orphaned body frame");
    assert!(matches!(
        err,
        AmqpError::Reassembly(ReassemblyViolation::UnexpectedEvent {
            event: EventKind::Body,
            state: ReassemblyState::Idle,
        })
    ));

    let message = consumer
        .next_delivery()
        .expect("next delivery fits")
        .expect("delivery");
    assert_eq!(&message.body[..], b"tiny");
}

#[test]
fn close_reports_partial_frame_left_in_buffer() {
    let reader = FailingReader::new(truncated_body(b"abcdef", 2), io::ErrorKind::TimedOut);
    let mut source = ReaderSource::new(reader);

    let mut consumer = DeliveryConsumer::new(&mut source);
    consumer.next_delivery().expect_err("reader times out");
    drop(consumer);

    assert!(source.buffered() > 0);
    let err = source.close().expect_err("partial frame discarded");
    assert_eq!(err.status(), Some(LibraryStatus::ConnectionClosed));
    assert!(err.to_string().starts_with("closing frame source: "));

    assert_eq!(source.buffered(), 0);
    source.close().expect("nothing left to report");
}
