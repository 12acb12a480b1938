//! Unit tests for `MessageCollector`.

use bytes::Bytes;
use rstest::{fixture, rstest};

use super::{MessageCollector, ResultCollector};
use crate::{
    delivery::{BodyFragment, DecodeResult, UnhandledFrame},
    frame::{Deliver, FrameKind},
    properties::PropertyBag,
};

fn fragment(bytes: &'static [u8], is_last: bool) -> DecodeResult {
    DecodeResult::Fragment(BodyFragment {
        bytes: Bytes::from_static(bytes),
        is_last,
    })
}

#[fixture]
fn announced() -> MessageCollector {
    let mut collector = MessageCollector::new();
    let done = collector.collect(DecodeResult::Delivery(Deliver {
        delivery_tag: 11,
        routing_key: Bytes::from_static(b"jobs"),
        ..Deliver::default()
    }));
    assert!(!done);
    collector
}

#[rstest]
fn collects_a_whole_delivery(mut announced: MessageCollector) {
    let mut properties = PropertyBag::new();
    properties.set_message_id("m-1");

    assert!(!announced.collect(DecodeResult::Properties {
        properties,
        body_size: 6,
        complete: false,
    }));
    assert!(!announced.collect(fragment(b"abc", false)));
    assert!(announced.collect(fragment(b"def", true)));

    assert_eq!(announced.delivery_tag(), Some(11));
    assert_eq!(announced.body(), b"abcdef");

    let delivery = announced.take_delivery().expect("delivery");
    assert_eq!(delivery.delivery_tag, 11);
    assert_eq!(&delivery.routing_key[..], b"jobs");
    assert_eq!(delivery.properties.message_id(), b"m-1");
    assert_eq!(&delivery.body[..], b"abcdef");

    assert_eq!(announced.delivery_tag(), None);
    assert!(announced.body().is_empty());
}

#[rstest]
fn header_completion_flag_is_forwarded(mut announced: MessageCollector) {
    assert!(announced.collect(DecodeResult::Properties {
        properties: PropertyBag::new(),
        body_size: 0,
        complete: true,
    }));
    let delivery = announced.take_delivery().expect("delivery");
    assert!(delivery.body.is_empty());
}

#[rstest]
fn unhandled_results_change_nothing(mut announced: MessageCollector) {
    announced.collect(fragment(b"xy", false));

    assert!(!announced.collect(DecodeResult::Unhandled(UnhandledFrame {
        kind: FrameKind::Heartbeat,
        channel: 0,
        method: None,
    })));
    assert_eq!(announced.body(), b"xy");
}

#[rstest]
fn reset_clears_partial_body(mut announced: MessageCollector) {
    announced.collect(fragment(b"partial", false));
    announced.reset();

    assert!(announced.body().is_empty());
    assert!(announced.take_delivery().is_none());
}

#[test]
fn take_without_announcement_returns_none() {
    let mut collector = MessageCollector::new();
    collector.collect(fragment(b"orphan", true));

    assert!(collector.take_delivery().is_none());
}
