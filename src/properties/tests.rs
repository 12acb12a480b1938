//! Unit tests for [`PropertyBag`] encoding and presence tracking.

use bytes::Bytes;
use rstest::{fixture, rstest};

use super::{PropertyBag, PropertyFlags};
use crate::value::{FieldTable, WireError, WireValue};

#[fixture]
fn populated() -> PropertyBag {
    let mut props = PropertyBag::new();
    props
        .set_content_type("application/json")
        .set_delivery_mode(2)
        .set_timestamp(1_700_000_000)
        .set_message_type("order.created")
        .add_header("x-attempt", 3_u8);
    props
}

#[test]
fn empty_bag_encodes_as_zero_flags() {
    let wire = PropertyBag::new().to_wire().expect("encode empty bag");
    assert_eq!(&wire[..], &[0, 0]);
}

#[test]
fn setters_mark_presence() {
    let mut props = PropertyBag::new();
    props.set_priority(0);

    assert!(props.has(PropertyFlags::PRIORITY));
    assert_eq!(props.flags(), PropertyFlags::PRIORITY);
    assert_eq!(props.flags().bits(), 1 << 11);
}

#[test]
fn unset_accessors_return_empty_values() {
    let props = PropertyBag::new();

    assert!(props.flags().is_empty());
    assert_eq!(props.reply_to(), b"");
    assert_eq!(props.delivery_mode(), 0);
    assert!(props.headers().is_empty());
}

#[test]
fn only_flagged_fields_are_written() {
    let mut props = PropertyBag::new();
    props.set_priority(9).set_app_id("svc");
    let wire = props.to_wire().expect("encode properties");

    // flags (priority | app-id), priority octet, app-id short string
    let flags = (PropertyFlags::PRIORITY | PropertyFlags::APP_ID).bits();
    let mut expected = flags.to_be_bytes().to_vec();
    expected.extend_from_slice(&[9, 3, b's', b'v', b'c']);
    assert_eq!(&wire[..], &expected[..]);
}

#[rstest]
fn populated_bag_round_trips(populated: PropertyBag) {
    let mut wire = populated.to_wire().expect("encode properties");
    let decoded = PropertyBag::from_wire(&mut wire).expect("decode properties");

    assert!(wire.is_empty());
    assert_eq!(decoded, populated);
    assert_eq!(decoded.message_type(), b"order.created");
    assert_eq!(
        decoded.headers().get("x-attempt"),
        Some(WireValue::U8(3))
    );
}

#[rstest]
fn set_replaces_previous_contents(populated: PropertyBag) {
    let mut other = PropertyBag::new();
    other.set_user_id("guest");
    let mut wire = other.to_wire().expect("encode properties");

    let mut props = populated;
    props.set(&mut wire).expect("decode properties");

    assert_eq!(props.flags(), PropertyFlags::USER_ID);
    assert_eq!(props.content_type(), b"");
    assert_eq!(props.user_id(), b"guest");
}

#[rstest]
#[case::continuation_bit(0x0001)]
#[case::reserved_bit(0x8002)]
fn reserved_flag_bits_are_rejected(#[case] flags: u16) {
    let mut wire = Bytes::copy_from_slice(&flags.to_be_bytes());
    assert_eq!(
        PropertyBag::from_wire(&mut wire),
        Err(WireError::ReservedPropertyFlags { flags })
    );
}

#[rstest]
fn failed_decode_leaves_bag_unchanged(populated: PropertyBag) {
    // Announces a correlation id but carries no bytes for it.
    let mut wire = Bytes::copy_from_slice(&PropertyFlags::CORRELATION_ID.bits().to_be_bytes());
    let mut props = populated.clone();

    assert!(props.set(&mut wire).is_err());
    assert_eq!(props, populated);
}

#[test]
fn oversized_short_string_fails_to_encode() {
    let mut props = PropertyBag::new();
    props.set_reply_to(vec![b'r'; 300]);

    assert_eq!(
        props.to_wire(),
        Err(WireError::ShortStringTooLong { len: 300 })
    );
}

#[test]
fn headers_share_storage_with_caller_table() {
    let mut table = FieldTable::new();
    let mut props = PropertyBag::new();
    props.set_headers(table.clone());
    table.add("late", true);

    assert!(props.has(PropertyFlags::HEADERS));
    assert_eq!(props.headers().get("late"), Some(WireValue::Boolean(true)));
}

#[test]
fn all_flags_cover_every_property() {
    let combined = PropertyFlags::ORDER
        .iter()
        .fold(PropertyFlags::empty(), |acc, flag| acc | *flag);
    assert_eq!(combined, PropertyFlags::all());
    assert_eq!(PropertyFlags::all().bits(), 0xFFFC);
    assert_eq!(PropertyFlags::from_bits(0xFFFF), None);
}
