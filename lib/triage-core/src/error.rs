//! Error types for triage.
//!
//! The first four variants are classified HTTP answers and carry the
//! [`RawResponse`] so the status, headers and error payload stay inspectable.
//! The I/O class (`Connection`, `Tls`, `Timeout`, `Cancelled`) is what a
//! network failure looks like; [`Error::outcome`] maps every variant to an
//! [`Outcome`].

use derive_more::{Display, Error, From};

use crate::{Outcome, RawResponse};

/// Main error type for triage operations.
#[derive(Debug, Display, Error, From)]
pub enum Error {
    /// The server answered 401.
    #[display("unauthenticated: HTTP {}", _0.status())]
    #[from(skip)]
    Unauthenticated(#[error(not(source))] RawResponse),

    /// The server answered 4xx other than 401.
    #[display("client error: HTTP {}", _0.status())]
    #[from(skip)]
    Client(#[error(not(source))] RawResponse),

    /// The server answered 5xx.
    #[display("server error: HTTP {}", _0.status())]
    #[from(skip)]
    Server(#[error(not(source))] RawResponse),

    /// The server answered with a status outside the classified ranges.
    #[display("unexpected response: HTTP {}", _0.status())]
    #[from(skip)]
    UnexpectedStatus(#[error(not(source))] RawResponse),

    /// Network/connection errors.
    #[display("connection error: {_0}")]
    #[from(skip)]
    Connection(#[error(not(source))] String),

    /// TLS/SSL errors.
    #[display("TLS error: {_0}")]
    #[from(skip)]
    Tls(#[error(not(source))] String),

    /// Request timeout.
    #[display("request timeout")]
    #[from(skip)]
    Timeout,

    /// The call was cancelled before it completed.
    #[display("call cancelled")]
    #[from(skip)]
    Cancelled,

    /// Invalid request configuration.
    #[display("invalid request: {_0}")]
    #[from(skip)]
    InvalidRequest(#[error(not(source))] String),

    /// URL parsing error.
    #[display("invalid URL: {_0}")]
    #[from]
    InvalidUrl(url::ParseError),

    /// JSON serialization error.
    #[display("JSON serialization error: {_0}")]
    #[from]
    JsonSerialization(serde_json::Error),

    /// JSON deserialization error with path context.
    #[display("JSON deserialization error at '{path}': {message}")]
    #[from(skip)]
    JsonDeserialization {
        /// JSON path to the error (e.g., `[0].completed`).
        path: String,
        /// Error message.
        message: String,
    },

    /// Any other failure during an attempt.
    #[display("unexpected error: {_0}")]
    #[from(skip)]
    Unexpected(#[error(not(source))] String),

    /// `execute` or `enqueue` was called on a call that already ran.
    #[display("already executed")]
    #[from(skip)]
    AlreadyExecuted,

    /// Programmer error detected while setting up a client or service.
    #[display("configuration error: {_0}")]
    #[from(skip)]
    Configuration(#[error(not(source))] String),
}

/// Result type alias using [`crate::Error`].
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a connection error.
    #[must_use]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection(message.into())
    }

    /// Create a TLS error.
    #[must_use]
    pub fn tls(message: impl Into<String>) -> Self {
        Self::Tls(message.into())
    }

    /// Create an invalid request error.
    #[must_use]
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }

    /// Create a JSON deserialization error with path context.
    #[must_use]
    pub fn json_deserialization(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::JsonDeserialization {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a generic unexpected error.
    #[must_use]
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::Unexpected(message.into())
    }

    /// Create a configuration error.
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Classify this error.
    #[must_use]
    pub const fn outcome(&self) -> Outcome {
        match self {
            Self::Unauthenticated(_) => Outcome::Unauthenticated,
            Self::Client(_) => Outcome::ClientError,
            Self::Server(_) => Outcome::ServerError,
            Self::Connection(_) | Self::Tls(_) | Self::Timeout | Self::Cancelled => {
                Outcome::NetworkError
            }
            Self::UnexpectedStatus(_)
            | Self::InvalidRequest(_)
            | Self::InvalidUrl(_)
            | Self::JsonSerialization(_)
            | Self::JsonDeserialization { .. }
            | Self::Unexpected(_)
            | Self::AlreadyExecuted
            | Self::Configuration(_) => Outcome::UnexpectedError,
        }
    }

    /// Returns `true` for I/O-class failures.
    #[must_use]
    pub const fn is_network(&self) -> bool {
        matches!(self.outcome(), Outcome::NetworkError)
    }

    /// Returns `true` if this is a timeout error.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout)
    }

    /// Returns `true` if this is a connection error.
    #[must_use]
    pub const fn is_connection(&self) -> bool {
        matches!(self, Self::Connection(_))
    }

    /// The response carried by a classified HTTP error.
    #[must_use]
    pub const fn response(&self) -> Option<&RawResponse> {
        match self {
            Self::Unauthenticated(response)
            | Self::Client(response)
            | Self::Server(response)
            | Self::UnexpectedStatus(response) => Some(response),
            _ => None,
        }
    }

    /// The HTTP status code, if a response was received.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        self.response().map(RawResponse::status)
    }

    /// Try to decode the carried error payload as JSON.
    ///
    /// Returns `None` if no response was received.
    pub fn decode_body<E: serde::de::DeserializeOwned>(&self) -> Option<Result<E>> {
        self.response().map(RawResponse::json)
    }
}
