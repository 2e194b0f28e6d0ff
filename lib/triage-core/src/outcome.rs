//! Outcome classification.
//!
//! Every finished attempt maps to exactly one [`Outcome`]:
//!
//! | Outcome | Condition |
//! |---------|-----------|
//! | [`Outcome::Success`] | status in 200..=299 |
//! | [`Outcome::Unauthenticated`] | status 401 |
//! | [`Outcome::ClientError`] | status in 400..=499, except 401 |
//! | [`Outcome::ServerError`] | status in 500..=599 |
//! | [`Outcome::NetworkError`] | transport failure before a status was obtained |
//! | [`Outcome::UnexpectedError`] | any other status or failure |

use derive_more::Display;

use crate::Error;

/// Classification of a finished attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum Outcome {
    /// 2xx response.
    #[display("success")]
    Success,
    /// 401 response.
    #[display("unauthenticated")]
    Unauthenticated,
    /// 4xx response other than 401.
    #[display("client error")]
    ClientError,
    /// 5xx response.
    #[display("server error")]
    ServerError,
    /// The exchange failed at the I/O level.
    #[display("network error")]
    NetworkError,
    /// Anything else.
    #[display("unexpected error")]
    UnexpectedError,
}

impl Outcome {
    /// Classify a received status code.
    ///
    /// Never returns [`Outcome::NetworkError`]: a status code means the
    /// exchange reached the server.
    ///
    /// ```
    /// use triage_core::Outcome;
    ///
    /// assert_eq!(Outcome::from_status(204), Outcome::Success);
    /// assert_eq!(Outcome::from_status(401), Outcome::Unauthenticated);
    /// assert_eq!(Outcome::from_status(302), Outcome::UnexpectedError);
    /// ```
    #[must_use]
    pub const fn from_status(status: u16) -> Self {
        match status {
            200..=299 => Self::Success,
            401 => Self::Unauthenticated,
            400..=499 => Self::ClientError,
            500..=599 => Self::ServerError,
            _ => Self::UnexpectedError,
        }
    }

    /// Classify a failed attempt.
    #[must_use]
    pub const fn from_error(error: &Error) -> Self {
        error.outcome()
    }

    /// Returns `true` for [`Outcome::Success`].
    #[must_use]
    pub const fn is_success(self) -> bool {
        matches!(self, Self::Success)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_2xx_is_success() {
        for status in 200..=299 {
            assert_eq!(Outcome::from_status(status), Outcome::Success, "{status}");
        }
    }

    #[test]
    fn every_4xx_except_401_is_client_error() {
        for status in (400..=499).filter(|s| *s != 401) {
            assert_eq!(Outcome::from_status(status), Outcome::ClientError, "{status}");
        }
        assert_eq!(Outcome::from_status(401), Outcome::Unauthenticated);
    }

    #[test]
    fn every_5xx_is_server_error() {
        for status in 500..=599 {
            assert_eq!(Outcome::from_status(status), Outcome::ServerError, "{status}");
        }
    }

    #[test]
    fn statuses_outside_known_ranges_are_unexpected() {
        for status in (0..200).chain(300..400).chain(600..=999) {
            assert_eq!(
                Outcome::from_status(status),
                Outcome::UnexpectedError,
                "{status}"
            );
        }
        assert_eq!(Outcome::from_status(u16::MAX), Outcome::UnexpectedError);
    }

    #[test]
    fn io_failures_are_network_errors() {
        assert_eq!(
            Outcome::from_error(&Error::connection("connection refused")),
            Outcome::NetworkError
        );
        assert_eq!(Outcome::from_error(&Error::Timeout), Outcome::NetworkError);
        assert_eq!(Outcome::from_error(&Error::Cancelled), Outcome::NetworkError);
    }

    #[test]
    fn other_failures_are_unexpected() {
        assert_eq!(
            Outcome::from_error(&Error::json_deserialization("[0].id", "invalid type")),
            Outcome::UnexpectedError
        );
        assert_eq!(
            Outcome::from_error(&Error::invalid_request("bad header")),
            Outcome::UnexpectedError
        );
    }

    #[test]
    fn display_names() {
        assert_eq!(Outcome::ClientError.to_string(), "client error");
        assert_eq!(Outcome::NetworkError.to_string(), "network error");
    }
}
