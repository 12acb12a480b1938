//! Consumer configuration.
//!
//! [`ConsumerConfig`] bundles the limits applied while reading frames and
//! reassembling deliveries. It follows a by-value builder style:
//!
//! ```
//! use std::num::NonZeroU64;
//!
//! use amqpframe::config::ConsumerConfig;
//!
//! let config = ConsumerConfig::default()
//!     .max_frame_length(65_536)
//!     .max_body_size(NonZeroU64::new(1 << 20));
//! assert_eq!(config.frame_length(), 65_536);
//! ```

use std::num::NonZeroU64;

use crate::codec::{DEFAULT_FRAME_LENGTH, clamp_frame_length};

/// Default size of each read from the byte source.
pub const DEFAULT_READ_CHUNK_SIZE: usize = 8 * 1024;

/// Limits for a [`DeliveryConsumer`](crate::consumer::DeliveryConsumer).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ConsumerConfig {
    max_frame_length: usize,
    max_body_size: Option<NonZeroU64>,
    read_chunk_size: usize,
}

impl Default for ConsumerConfig {
    fn default() -> Self {
        Self {
            max_frame_length: DEFAULT_FRAME_LENGTH,
            max_body_size: None,
            read_chunk_size: DEFAULT_READ_CHUNK_SIZE,
        }
    }
}

impl ConsumerConfig {
    /// Set the negotiated maximum frame length; clamped to the codec's
    /// supported range.
    #[must_use]
    pub fn max_frame_length(mut self, len: usize) -> Self {
        self.max_frame_length = clamp_frame_length(len);
        self
    }

    /// Reject deliveries declaring a larger body; `None` disables the check.
    #[must_use]
    pub const fn max_body_size(mut self, limit: Option<NonZeroU64>) -> Self {
        self.max_body_size = limit;
        self
    }

    /// Set the read buffer growth step; zero is raised to one byte.
    #[must_use]
    pub fn read_chunk_size(mut self, size: usize) -> Self {
        self.read_chunk_size = size.max(1);
        self
    }

    /// Configured maximum frame length.
    #[must_use]
    pub const fn frame_length(&self) -> usize { self.max_frame_length }

    /// Configured body size limit.
    #[must_use]
    pub const fn body_size_limit(&self) -> Option<NonZeroU64> { self.max_body_size }

    /// Configured read chunk size.
    #[must_use]
    pub const fn chunk_size(&self) -> usize { self.read_chunk_size }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::codec::{MAX_FRAME_LENGTH, MIN_FRAME_LENGTH};

    #[test]
    fn defaults_match_codec_defaults() {
        let config = ConsumerConfig::default();
        assert_eq!(config.frame_length(), DEFAULT_FRAME_LENGTH);
        assert_eq!(config.body_size_limit(), None);
        assert_eq!(config.chunk_size(), DEFAULT_READ_CHUNK_SIZE);
    }

    #[rstest]
    #[case(0, MIN_FRAME_LENGTH)]
    #[case(usize::MAX, MAX_FRAME_LENGTH)]
    fn frame_length_is_clamped(#[case] requested: usize, #[case] expected: usize) {
        assert_eq!(
            ConsumerConfig::default()
                .max_frame_length(requested)
                .frame_length(),
            expected
        );
    }

    #[test]
    fn zero_chunk_size_is_raised() {
        assert_eq!(ConsumerConfig::default().read_chunk_size(0).chunk_size(), 1);
    }
}
