//! Canonical error and result types for the crate.
//!
//! [`AmqpError`] is the single public error surface. It is produced from
//! three kinds of input:
//!
//! - client-library status codes (negative `i32`s, see [`LibraryStatus`]) via [`check`];
//! - RPC reply outcomes, including broker close notifications, via [`check_reply`];
//! - codec, wire and reassembly failures raised while consuming frames.
//!
//! Every raising check has a best-effort twin that logs the error at
//! `error` level and lets the caller continue, for use on teardown paths.

use std::fmt;

use bytes::Bytes;
use thiserror::Error;

use crate::{
    codec::CodecError,
    delivery::ReassemblyViolation,
    frame::{CloseReason, Method, MethodId},
    value::WireError,
};

/// Status codes reported by the AMQP client library.
///
/// Discriminants are the library's negative return codes.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[repr(i32)]
pub enum LibraryStatus {
    /// Memory allocation failed.
    NoMemory = -1,
    /// Malformed AMQP data.
    BadAmqpData = -2,
    /// Unknown class id.
    UnknownClass = -3,
    /// Unknown method id.
    UnknownMethod = -4,
    /// Host name lookup failed.
    HostnameResolutionFailed = -5,
    /// Broker speaks an incompatible protocol version.
    IncompatibleAmqpVersion = -6,
    /// Connection closed unexpectedly.
    ConnectionClosed = -7,
    /// AMQP URL could not be parsed.
    BadUrl = -8,
    /// Socket error.
    SocketError = -9,
    /// Invalid parameter.
    InvalidParameter = -10,
    /// Field table too large for the buffer.
    TableTooBig = -11,
    /// An unexpected method was received.
    WrongMethod = -12,
    /// Request timed out.
    Timeout = -13,
    /// System timer failed.
    TimerFailure = -14,
    /// Heartbeats stopped arriving.
    HeartbeatTimeout = -15,
    /// Protocol state machine in an unexpected state.
    UnexpectedState = -16,
    /// Socket is closed.
    SocketClosed = -17,
    /// Socket already open.
    SocketInUse = -18,
    /// Broker does not support the requested SASL method.
    BrokerUnsupportedSaslMethod = -19,
    /// Parameter value is unsupported.
    Unsupported = -20,
}

impl LibraryStatus {
    const ALL: [Self; 20] = [
        Self::NoMemory,
        Self::BadAmqpData,
        Self::UnknownClass,
        Self::UnknownMethod,
        Self::HostnameResolutionFailed,
        Self::IncompatibleAmqpVersion,
        Self::ConnectionClosed,
        Self::BadUrl,
        Self::SocketError,
        Self::InvalidParameter,
        Self::TableTooBig,
        Self::WrongMethod,
        Self::Timeout,
        Self::TimerFailure,
        Self::HeartbeatTimeout,
        Self::UnexpectedState,
        Self::SocketClosed,
        Self::SocketInUse,
        Self::BrokerUnsupportedSaslMethod,
        Self::Unsupported,
    ];

    /// Resolve a negative status code.
    #[must_use]
    pub fn from_code(code: i32) -> Option<Self> {
        Self::ALL.into_iter().find(|status| status.code() == code)
    }

    /// The library's numeric code.
    #[must_use]
    pub const fn code(self) -> i32 { self as i32 }

    /// Human-readable description.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::NoMemory => "could not allocate memory",
            Self::BadAmqpData => "invalid AMQP data",
            Self::UnknownClass => "unknown AMQP class id",
            Self::UnknownMethod => "unknown AMQP method id",
            Self::HostnameResolutionFailed => "hostname lookup failed",
            Self::IncompatibleAmqpVersion => "incompatible AMQP version",
            Self::ConnectionClosed => "connection closed unexpectedly",
            Self::BadUrl => "could not parse AMQP URL",
            Self::SocketError => "a socket error occurred",
            Self::InvalidParameter => "invalid parameter",
            Self::TableTooBig => "table too large for buffer",
            Self::WrongMethod => "unexpected method received",
            Self::Timeout => "request timed out",
            Self::TimerFailure => "system timer has failed",
            Self::HeartbeatTimeout => "heartbeat timeout, connection closed",
            Self::UnexpectedState => "unexpected protocol state",
            Self::SocketClosed => "socket is closed",
            Self::SocketInUse => "socket already open",
            Self::BrokerUnsupportedSaslMethod => "unsupported sasl method requested",
            Self::Unsupported => "parameter value is unsupported",
        }
    }
}

impl fmt::Display for LibraryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.message()) }
}

/// Scope of a broker close notification.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum CloseEntity {
    /// `Connection.Close`.
    Connection,
    /// `Channel.Close`.
    Channel,
}

impl fmt::Display for CloseEntity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Connection => "connection",
            Self::Channel => "channel",
        })
    }
}

/// Outcome of a synchronous request to the broker.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ReplyOutcome {
    /// The request succeeded.
    Normal,
    /// No reply type was recorded.
    None,
    /// The client library failed with the given status code.
    LibraryException(i32),
    /// The broker answered with a method other than the expected reply.
    ServerException(Method),
}

/// Top-level error type exposed by `amqpframe`.
#[derive(Debug, Error)]
pub enum AmqpError {
    /// The client library or transport failed locally.
    #[error("{context}: {message}")]
    Library {
        /// Operation that failed.
        context: String,
        /// Library status, absent when no reply type was recorded.
        status: Option<LibraryStatus>,
        /// Description of the failure.
        message: String,
    },

    /// The broker closed the connection or a channel.
    #[error(
        "{context}: server {entity} error {reply_code}, message: {}",
        String::from_utf8_lossy(.reply_text)
    )]
    ProtocolClose {
        /// Operation that failed.
        context: String,
        /// Whether the connection or a channel was closed.
        entity: CloseEntity,
        /// AMQP reply code.
        reply_code: u16,
        /// Broker-supplied reason.
        reply_text: Bytes,
    },

    /// The broker answered with an unexpected method.
    #[error("{context}: unknown server error, method id: {method_id}")]
    UnknownServer {
        /// Operation that failed.
        context: String,
        /// Method the broker sent.
        method_id: MethodId,
    },

    /// A frame sequence violated delivery reassembly.
    #[error("delivery reassembly failed: {0}")]
    Reassembly(#[from] ReassemblyViolation),
}

impl AmqpError {
    /// Build a [`AmqpError::Library`] error from a known status.
    #[must_use]
    pub fn library(context: &str, status: LibraryStatus) -> Self {
        Self::Library {
            context: context.to_owned(),
            status: Some(status),
            message: status.message().to_owned(),
        }
    }

    /// Map a broker close notification, returning `None` for other methods.
    #[must_use]
    pub fn from_close(context: &str, method: &Method) -> Option<Self> {
        let (entity, reason) = match method {
            Method::ConnectionClose(reason) => (CloseEntity::Connection, reason),
            Method::ChannelClose(reason) => (CloseEntity::Channel, reason),
            _ => return None,
        };
        let CloseReason {
            reply_code,
            reply_text,
            ..
        } = reason;
        Some(Self::ProtocolClose {
            context: context.to_owned(),
            entity,
            reply_code: *reply_code,
            reply_text: reply_text.clone(),
        })
    }

    /// Map a codec failure onto the library status it corresponds to.
    #[must_use]
    pub fn from_codec(context: &str, err: &CodecError) -> Self {
        let status = if err.is_premature_eof() {
            LibraryStatus::ConnectionClosed
        } else {
            match err {
                CodecError::Io(_) => LibraryStatus::SocketError,
                CodecError::Framing(_) | CodecError::Eof(_) => LibraryStatus::BadAmqpData,
            }
        };
        Self::with_detail(context, status, err)
    }

    /// Map a payload decoding failure.
    #[must_use]
    pub fn from_wire(context: &str, err: &WireError) -> Self {
        let status = match err {
            WireError::UnsupportedClass { .. } => LibraryStatus::UnknownClass,
            _ => LibraryStatus::BadAmqpData,
        };
        Self::with_detail(context, status, err)
    }

    fn with_detail(context: &str, status: LibraryStatus, detail: &dyn fmt::Display) -> Self {
        Self::Library {
            context: context.to_owned(),
            status: Some(status),
            message: format!("{status}: {detail}"),
        }
    }

    /// Library status carried by this error, if any.
    #[must_use]
    pub const fn status(&self) -> Option<LibraryStatus> {
        match self {
            Self::Library { status, .. } => *status,
            _ => None,
        }
    }

    /// Whether the broker closed the connection or a channel.
    #[must_use]
    pub const fn is_protocol_close(&self) -> bool { matches!(self, Self::ProtocolClose { .. }) }
}

/// Canonical result alias used by `amqpframe` public APIs.
pub type Result<T> = std::result::Result<T, AmqpError>;

/// Fail when a library call returned a negative status code.
///
/// # Errors
///
/// Returns [`AmqpError::Library`] when `rc` is negative.
///
/// # Examples
///
/// ```
/// use amqpframe::error::{LibraryStatus, check};
///
/// assert!(check("opening socket", 0).is_ok());
///
/// let err = check("opening socket", -9).expect_err("negative status");
/// assert_eq!(err.status(), Some(LibraryStatus::SocketError));
/// assert_eq!(err.to_string(), "opening socket: a socket error occurred");
/// ```
pub fn check(context: &str, rc: i32) -> Result<()> {
    if rc >= 0 {
        return Ok(());
    }
    Err(library_error(context, rc))
}

fn library_error(context: &str, rc: i32) -> AmqpError {
    match LibraryStatus::from_code(rc) {
        Some(status) => AmqpError::library(context, status),
        None => AmqpError::Library {
            context: context.to_owned(),
            status: None,
            message: format!("unknown library error {rc}"),
        },
    }
}

/// Fail unless a broker reply outcome is [`ReplyOutcome::Normal`].
///
/// # Errors
///
/// - [`AmqpError::Library`] for [`ReplyOutcome::None`] and library exceptions.
/// - [`AmqpError::ProtocolClose`] when the broker closed the connection or channel.
/// - [`AmqpError::UnknownServer`] for any other server method.
pub fn check_reply(context: &str, reply: &ReplyOutcome) -> Result<()> {
    match reply {
        ReplyOutcome::Normal => Ok(()),
        ReplyOutcome::None => Err(AmqpError::Library {
            context: context.to_owned(),
            status: None,
            message: "no RPC reply type".to_owned(),
        }),
        // Some callers record the status with its sign flipped.
        ReplyOutcome::LibraryException(rc) => Err(library_error(context, -rc.saturating_abs())),
        ReplyOutcome::ServerException(method) => Err(AmqpError::from_close(context, method)
            .unwrap_or_else(|| AmqpError::UnknownServer {
                context: context.to_owned(),
                method_id: method.id(),
            })),
    }
}

/// Log `result`'s error at `error` level and return its value, if any.
pub fn best_effort<T>(result: Result<T>) -> Option<T> {
    result.inspect_err(|err| log::error!("{err}")).ok()
}

/// Best-effort [`check`]: logs a failure and reports whether `rc` was
/// successful.
pub fn check_best_effort(context: &str, rc: i32) -> bool { best_effort(check(context, rc)).is_some() }

/// Best-effort [`check_reply`]: logs a failure and reports whether the
/// reply was normal.
pub fn check_reply_best_effort(context: &str, reply: &ReplyOutcome) -> bool {
    best_effort(check_reply(context, reply)).is_some()
}
