//! HTTP responses.
//!
//! Two shapes are used:
//! - [`RawResponse`]: what the transport returns (status, headers, bytes). The
//!   classified errors carry it so callers can inspect an error payload.
//! - [`Response`]: the typed snapshot a call hands back, with the payload
//!   decoded for successful exchanges.

use std::collections::HashMap;

use bytes::Bytes;

/// Transport-level response: status, headers and the undecoded body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    status: u16,
    headers: HashMap<String, String>,
    body: Bytes,
}

impl RawResponse {
    /// Creates a new raw response.
    #[must_use]
    pub fn new(status: u16, headers: HashMap<String, String>, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers,
            body: body.into(),
        }
    }

    /// HTTP status code.
    #[must_use]
    pub const fn status(&self) -> u16 {
        self.status
    }

    /// Response headers.
    #[must_use]
    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    /// Single header value by name.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }

    /// Raw body bytes.
    #[must_use]
    pub const fn body(&self) -> &Bytes {
        &self.body
    }

    /// Consume into the body bytes.
    #[must_use]
    pub fn into_body(self) -> Bytes {
        self.body
    }

    /// Decode the body as JSON, typically an API error payload.
    ///
    /// # Errors
    ///
    /// Returns an error if the body does not deserialize into `E`.
    pub fn json<E: serde::de::DeserializeOwned>(&self) -> crate::Result<E> {
        crate::from_json(&self.body)
    }

    /// Body as text, replacing invalid UTF-8 sequences.
    #[must_use]
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Typed response snapshot.
///
/// For 2xx responses the payload is decoded into `T`, except for `204 No
/// Content` and `205 Reset Content` which never carry one. For any other
/// status the payload is absent and the raw bytes are kept as the error body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response<T> {
    status: u16,
    headers: HashMap<String, String>,
    body: Option<T>,
    error_body: Option<Bytes>,
}

impl<T> Response<T> {
    /// A successful response with an optional payload.
    #[must_use]
    pub fn success(status: u16, headers: HashMap<String, String>, body: Option<T>) -> Self {
        Self {
            status,
            headers,
            body,
            error_body: None,
        }
    }

    /// A response whose payload was not decoded.
    #[must_use]
    pub fn error(raw: RawResponse) -> Self {
        let (status, headers, body) = (raw.status, raw.headers, raw.body);
        Self {
            status,
            headers,
            body: None,
            error_body: Some(body),
        }
    }

    /// HTTP status code.
    #[must_use]
    pub const fn status(&self) -> u16 {
        self.status
    }

    /// Response headers.
    #[must_use]
    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    /// Single header value by name.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }

    /// Decoded payload, if any.
    #[must_use]
    pub const fn body(&self) -> Option<&T> {
        self.body.as_ref()
    }

    /// Consume into the decoded payload.
    #[must_use]
    pub fn into_body(self) -> Option<T> {
        self.body
    }

    /// Undecoded body of a non-2xx response.
    #[must_use]
    pub const fn error_body(&self) -> Option<&Bytes> {
        self.error_body.as_ref()
    }

    /// Status is 2xx.
    #[must_use]
    pub const fn is_successful(&self) -> bool {
        self.status >= 200 && self.status < 300
    }

    /// Drop the decoded payload and keep status, headers and error body.
    #[must_use]
    pub fn into_raw(self) -> RawResponse {
        RawResponse {
            status: self.status,
            headers: self.headers,
            body: self.error_body.unwrap_or_default(),
        }
    }

    /// Transform the payload.
    pub fn map<U, F>(self, f: F) -> Response<U>
    where
        F: FnOnce(T) -> U,
    {
        Response {
            status: self.status,
            headers: self.headers,
            body: self.body.map(f),
            error_body: self.error_body,
        }
    }
}

impl<T: serde::de::DeserializeOwned> Response<T> {
    /// Convert a transport response, decoding the payload of 2xx responses.
    ///
    /// An empty 2xx body decodes as JSON `null`, so `()` and `Option<_>`
    /// payloads succeed without content.
    ///
    /// # Errors
    ///
    /// Returns an error if a 2xx body does not deserialize into `T`.
    pub fn from_raw(raw: RawResponse) -> crate::Result<Self> {
        match raw.status {
            204 | 205 => Ok(Self::success(raw.status, raw.headers, None)),
            200..=299 => {
                let body = if raw.body.trim_ascii().is_empty() {
                    crate::from_json(b"null")?
                } else {
                    crate::from_json(&raw.body)?
                };
                Ok(Self::success(raw.status, raw.headers, Some(body)))
            }
            _ => Ok(Self::error(raw)),
        }
    }
}

#[cfg(test)]
mod tests {
    use assert2::{check, let_assert};

    use super::*;

    fn raw(status: u16, body: &'static str) -> RawResponse {
        let mut headers = HashMap::new();
        headers.insert("content-type".to_string(), "application/json".to_string());
        RawResponse::new(status, headers, body)
    }

    #[test]
    fn success_body_is_decoded() {
        let_assert!(Ok(response) = Response::<Vec<u32>>::from_raw(raw(200, "[1,2]")));

        check!(response.status() == 200);
        check!(response.is_successful());
        check!(response.body() == Some(&vec![1, 2]));
        check!(response.error_body().is_none());
        check!(response.header("content-type") == Some("application/json"));
    }

    #[test]
    fn no_content_skips_decoding() {
        let_assert!(Ok(response) = Response::<Vec<u32>>::from_raw(raw(204, "")));
        check!(response.body().is_none());
        check!(response.is_successful());
    }

    #[test]
    fn empty_success_body_decodes_as_null() {
        let_assert!(Ok(unit) = Response::<()>::from_raw(raw(200, "")));
        check!(unit.body() == Some(&()));

        let_assert!(Ok(optional) = Response::<Option<u32>>::from_raw(raw(202, " ")));
        check!(optional.body() == Some(&None));

        let_assert!(Err(err) = Response::<Vec<u32>>::from_raw(raw(200, "")));
        check!(err.outcome() == crate::Outcome::UnexpectedError);
    }

    #[test]
    fn error_status_keeps_raw_body() {
        let_assert!(
            Ok(response) = Response::<Vec<u32>>::from_raw(raw(401, r#"{"error":"token"}"#))
        );

        check!(!response.is_successful());
        check!(response.body().is_none());
        check!(response.error_body().map(|b| &b[..]) == Some(&br#"{"error":"token"}"#[..]));

        let raw = response.into_raw();
        check!(raw.status() == 401);
        check!(raw.text() == r#"{"error":"token"}"#);
    }

    #[test]
    fn malformed_success_body_fails() {
        let_assert!(Err(err) = Response::<Vec<u32>>::from_raw(raw(200, "{")));
        check!(err.to_string().starts_with("JSON deserialization error"));
    }

    #[test]
    fn raw_error_payload_decodes() {
        #[derive(Debug, PartialEq, serde::Deserialize)]
        struct ApiError {
            error: String,
        }

        let payload: ApiError = raw(500, r#"{"error":"boom"}"#).json().expect("decode");
        check!(
            payload
                == ApiError {
                    error: "boom".to_string()
                }
        );
    }

    #[test]
    fn map_keeps_status() {
        let response = Response::success(201, HashMap::new(), Some("abc".to_string()));
        let mapped = response.map(|s| s.len());
        check!(mapped.status() == 201);
        check!(mapped.body() == Some(&3));
    }
}
