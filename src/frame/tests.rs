//! Unit tests for typed frame decoding.

use bytes::{BufMut, Bytes, BytesMut};
use rstest::rstest;

use super::*;
use crate::properties::PropertyBag;

fn round_trip(frame: &Frame) -> Frame {
    let raw = frame.to_raw().expect("encode frame");
    Frame::try_from(raw).expect("decode frame")
}

#[test]
fn method_id_combines_class_and_method() {
    assert_eq!(MethodId::BASIC_DELIVER, MethodId(0x003C_003C));
    assert_eq!(MethodId::CHANNEL_CLOSE.class_id(), 20);
    assert_eq!(MethodId::CHANNEL_CLOSE.method_id(), 40);
    assert_eq!(MethodId::CONNECTION_CLOSE.to_string(), "655410");
}

#[test]
fn deliver_payload_layout() {
    let method = Method::BasicDeliver(Deliver {
        consumer_tag: Bytes::from_static(b"c"),
        delivery_tag: 7,
        redelivered: true,
        exchange: Bytes::new(),
        routing_key: Bytes::from_static(b"rk"),
    });
    let mut buf = BytesMut::new();
    method.encode(&mut buf).expect("encode deliver");

    let expected: &[u8] = &[
        0, 60, 0, 60, // Basic.Deliver
        1, b'c', // consumer tag
        0, 0, 0, 0, 0, 0, 0, 7, // delivery tag
        1, // redelivered
        0, // exchange
        2, b'r', b'k', // routing key
    ];
    assert_eq!(&buf[..], expected);
}

#[rstest]
#[case::deliver(Frame::Method {
    channel: 1,
    method: Method::BasicDeliver(Deliver {
        consumer_tag: Bytes::from_static(b"amq.ctag-1"),
        delivery_tag: 42,
        redelivered: false,
        exchange: Bytes::from_static(b"orders"),
        routing_key: Bytes::from_static(b"created"),
    }),
})]
#[case::channel_close(Frame::Method {
    channel: 1,
    method: Method::ChannelClose(CloseReason::new(404, "NOT_FOUND")),
})]
#[case::other_method(Frame::Method {
    channel: 0,
    method: Method::Other { id: MethodId::new(10, 30), args: Bytes::from_static(&[0, 0, 2, 0]) },
})]
#[case::body(Frame::Body { channel: 1, fragment: Bytes::from_static(b"hello") })]
#[case::heartbeat(Frame::Heartbeat { channel: 0 })]
#[case::unknown(Frame::Unknown { frame_type: 4, channel: 0, payload: Bytes::from_static(b"?") })]
fn frames_survive_encoding(#[case] frame: Frame) {
    assert_eq!(round_trip(&frame), frame);
}

#[test]
fn header_frame_carries_size_and_properties() {
    let mut properties = PropertyBag::new();
    properties.set_content_type("text/plain").set_delivery_mode(2);
    let frame = Frame::Header {
        channel: 3,
        header: ContentHeader::new(1024, properties.clone()),
    };

    let Frame::Header { header, .. } = round_trip(&frame) else {
        panic!("expected a header frame");
    };
    assert_eq!(header.body_size, 1024);
    assert_eq!(header.properties, properties);
}

#[test]
fn header_of_other_class_is_rejected() {
    let mut payload = BytesMut::new();
    payload.put_u16(50);
    payload.put_u16(0);
    payload.put_u64(0);
    payload.put_u16(0);

    assert_eq!(
        ContentHeader::decode(payload.freeze()),
        Err(WireError::UnsupportedClass { class_id: 50 })
    );
}

#[test]
fn trailing_method_arguments_are_rejected() {
    let mut buf = BytesMut::new();
    Method::ChannelClose(CloseReason::new(200, "ok"))
        .encode(&mut buf)
        .expect("encode close");
    buf.put_u8(0xFF);

    assert_eq!(
        Method::decode(buf.freeze()),
        Err(WireError::TrailingBytes {
            what: "method arguments",
            len: 1
        })
    );
}

#[test]
fn truncated_deliver_is_rejected() {
    let payload = Bytes::from_static(&[0, 60, 0, 60, 5, b'a']);
    assert!(matches!(
        Method::decode(payload),
        Err(WireError::UnexpectedEnd { needed: 5, remaining: 1 })
    ));
}

#[test]
fn frame_kind_labels() {
    assert_eq!(Frame::Heartbeat { channel: 0 }.kind().as_str(), "heartbeat");
    assert_eq!(
        Frame::Body {
            channel: 1,
            fragment: Bytes::new()
        }
        .kind(),
        FrameKind::Body
    );
}
