//! Unit tests for codec error types.

use std::io;

use rstest::rstest;

use super::{CodecError, EofError, FramingError};

#[rstest]
#[case::oversized(
    CodecError::Framing(FramingError::OversizedFrame { size: 9000, max: 4096 }),
    "framing",
    false
)]
#[case::mid_header(
    CodecError::Eof(EofError::MidHeader { bytes_received: 2, header_size: 7 }),
    "eof",
    true
)]
#[case::io_eof(
    CodecError::Io(io::Error::from(io::ErrorKind::UnexpectedEof)),
    "io",
    true
)]
#[case::io_reset(
    CodecError::Io(io::Error::from(io::ErrorKind::ConnectionReset)),
    "io",
    false
)]
fn error_categories(
    #[case] err: CodecError,
    #[case] category: &str,
    #[case] premature: bool,
) {
    assert_eq!(err.error_type(), category);
    assert_eq!(err.is_premature_eof(), premature);
}

#[test]
fn mid_frame_message_reports_progress() {
    let err = CodecError::from(EofError::MidFrame {
        bytes_received: 3,
        expected: 11,
    });
    assert_eq!(
        err.to_string(),
        "EOF: premature EOF: 3 bytes of 11 byte frame body received"
    );
}
