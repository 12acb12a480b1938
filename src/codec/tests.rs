//! Unit tests for the AMQP frame codec.
//!
//! Tests length clamping, frame round-tripping, oversized and malformed
//! frame rejection, and EOF handling behaviour.

use bytes::{BufMut, Bytes, BytesMut};
use rstest::rstest;

use super::*;

fn encoded(frame: RawFrame) -> BytesMut {
    let mut buf = BytesMut::new();
    AmqpFrameCodec::default()
        .encode(frame, &mut buf)
        .expect("encode should succeed");
    buf
}

#[rstest]
#[case::below_min(16, MIN_FRAME_LENGTH)]
#[case::above_max(MAX_FRAME_LENGTH + 1, MAX_FRAME_LENGTH)]
#[case::in_range(65_536, 65_536)]
fn codec_clamps_max_frame_length(#[case] requested: usize, #[case] expected: usize) {
    assert_eq!(AmqpFrameCodec::new(requested).max_frame_length(), expected);
}

#[test]
fn frame_layout_matches_wire_format() {
    let buf = encoded(RawFrame::new(3, 1, Bytes::from_static(b"hi")));
    assert_eq!(&buf[..], &[3, 0, 1, 0, 0, 0, 2, b'h', b'i', FRAME_END]);
}

#[test]
fn codec_round_trips_frames() {
    let mut codec = AmqpFrameCodec::default();
    let first = RawFrame::new(1, 7, Bytes::from_static(&[0, 60, 0, 60]));
    let second = RawFrame::new(8, 0, Bytes::new());

    let mut buf = encoded(first.clone());
    buf.extend_from_slice(&encoded(second.clone()));

    assert_eq!(codec.decode(&mut buf).expect("decode"), Some(first));
    assert_eq!(codec.decode(&mut buf).expect("decode"), Some(second));
    assert_eq!(codec.decode(&mut buf).expect("decode"), None);
}

#[test]
fn partial_frame_waits_for_more_bytes() {
    let mut codec = AmqpFrameCodec::default();
    let full = encoded(RawFrame::new(3, 1, Bytes::from_static(b"payload")));
    let mut buf = BytesMut::from(&full[..9]);

    assert_eq!(codec.decode(&mut buf).expect("decode"), None);
    buf.extend_from_slice(&full[9..]);
    let frame = codec.decode(&mut buf).expect("decode").expect("frame");
    assert_eq!(&frame.payload[..], b"payload");
}

#[test]
fn oversized_frame_is_rejected_from_header_alone() {
    let mut codec = AmqpFrameCodec::new(MIN_FRAME_LENGTH);
    let mut buf = BytesMut::new();
    buf.put_u8(3);
    buf.put_u16(1);
    buf.put_u32(u32::try_from(MIN_FRAME_LENGTH).expect("fits"));

    let err = codec.decode(&mut buf).expect_err("oversized frame");
    assert!(matches!(
        err,
        CodecError::Framing(FramingError::OversizedFrame { size, max })
            if size == MIN_FRAME_LENGTH + FRAME_OVERHEAD && max == MIN_FRAME_LENGTH
    ));
}

#[test]
fn encoder_rejects_oversized_payload() {
    let mut codec = AmqpFrameCodec::new(MIN_FRAME_LENGTH);
    let payload = Bytes::from(vec![0_u8; codec.max_payload_length() + 1]);
    let mut buf = BytesMut::new();

    let err = codec
        .encode(RawFrame::new(3, 1, payload), &mut buf)
        .expect_err("expected encode to fail for oversized frame");
    assert_eq!(err.error_type(), "framing");
    assert!(buf.is_empty());
}

#[test]
fn bad_end_octet_is_a_framing_error() {
    let mut codec = AmqpFrameCodec::default();
    let mut buf = encoded(RawFrame::new(3, 1, Bytes::from_static(b"x")));
    let last = buf.len() - 1;
    buf[last] = 0x00;

    let err = codec.decode(&mut buf).expect_err("bad end octet");
    assert!(matches!(
        err,
        CodecError::Framing(FramingError::InvalidFrameEnd { found: 0 })
    ));
}

#[test]
fn decode_eof_with_empty_buffer_returns_none() {
    let mut codec = AmqpFrameCodec::default();
    let mut buf = BytesMut::new();

    let result = codec.decode_eof(&mut buf);
    assert!(
        matches!(result, Ok(None)),
        "clean close should return Ok(None), got {result:?}"
    );
}

#[rstest]
#[case::partial_header(&[3, 0], "header")]
#[case::partial_payload(&[3, 0, 1, 0, 0, 0, 4, b'a', b'b'], "2 bytes of 5")]
fn decode_eof_error_cases(#[case] initial_buffer: &[u8], #[case] expected_substring: &str) {
    let mut codec = AmqpFrameCodec::default();
    let mut buf = BytesMut::from(initial_buffer);

    let err = codec.decode_eof(&mut buf).expect_err("expected error");
    assert!(err.is_premature_eof());
    assert!(
        err.to_string().contains(expected_substring),
        "error message should contain '{expected_substring}', got: {err}"
    );
}

#[test]
fn decode_eof_with_complete_frame_succeeds() {
    let mut codec = AmqpFrameCodec::default();
    let mut buf = encoded(RawFrame::new(3, 1, Bytes::from_static(b"done")));

    let frame = codec
        .decode_eof(&mut buf)
        .expect("decode should succeed")
        .expect("expected a frame");
    assert_eq!(&frame.payload[..], b"done");
}

#[test]
fn decoded_payload_shares_read_buffer() {
    let mut codec = AmqpFrameCodec::default();
    let mut buf = encoded(RawFrame::new(3, 1, Bytes::from_static(b"zero-copy")));
    let start = buf.as_ptr();

    let frame = codec.decode(&mut buf).expect("decode").expect("frame");
    assert_eq!(frame.payload.as_ptr(), start.wrapping_add(FRAME_HEADER_SIZE));
}
