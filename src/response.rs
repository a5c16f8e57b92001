//! Outgoing HTTP response type.
//!
//! A [`Response`] is either bodiless (`304`), a short fixed text body (the
//! error statuses), or a streamed datastream. The stream is owned by the
//! response and, once handed to hyper, by the connection: however the
//! exchange ends, dropping the body releases the byte source.

use std::io;

use bytes::Bytes;
use futures::TryStreamExt;
use http::HeaderMap;
use http::header::{CONTENT_TYPE, HeaderName, HeaderValue, X_CONTENT_TYPE_OPTIONS};
use http_body_util::combinators::UnsyncBoxBody;
use http_body_util::{BodyExt, Empty, Full, StreamBody};
use hyper::body::Frame;
use tracing::warn;

use crate::repository::ContentStream;
use crate::status::Status;

/// Body type handed to hyper.
pub type HttpBody = UnsyncBoxBody<Bytes, io::Error>;

enum Body {
    Empty,
    Full(Bytes),
    Stream(ContentStream),
}

/// An outgoing HTTP response.
///
/// ```rust
/// use disadis::{Response, Status};
/// use http::header::ETAG;
///
/// let not_modified = Response::builder()
///     .status(Status::NotModified)
///     .header(ETAG, "abc123.3")
///     .no_body();
/// assert_eq!(not_modified.header("etag"), Some("abc123.3"));
/// assert!(!not_modified.has_body());
/// ```
pub struct Response {
    status: Status,
    headers: HeaderMap,
    body: Body,
}

impl Response {
    /// Response with no body.
    pub fn empty(status: Status) -> Self {
        Self { status, headers: HeaderMap::new(), body: Body::Empty }
    }

    /// Plain-text error response whose body is just the status line,
    /// e.g. `404 Not Found`. Nothing about the cause is included.
    pub fn error(status: Status) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("text/plain; charset=utf-8"));
        headers.insert(X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
        Self {
            status,
            headers,
            body: Body::Full(Bytes::from(format!("{status}\n"))),
        }
    }

    /// Builder for responses that need extra headers or a streamed body.
    pub fn builder() -> ResponseBuilder {
        ResponseBuilder { status: Status::Ok, headers: HeaderMap::new() }
    }

    pub fn status(&self) -> Status { self.status }
    pub fn headers(&self) -> &HeaderMap { &self.headers }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn has_body(&self) -> bool {
        !matches!(self.body, Body::Empty)
    }

    /// Converts into the hyper response type.
    pub fn into_http(self) -> http::Response<HttpBody> {
        let body = match self.body {
            Body::Empty => Empty::new().map_err(|never| match never {}).boxed_unsync(),
            Body::Full(bytes) => Full::new(bytes).map_err(|never| match never {}).boxed_unsync(),
            Body::Stream(stream) => StreamBody::new(stream.map_ok(Frame::data)).boxed_unsync(),
        };
        let mut resp = http::Response::new(body);
        *resp.status_mut() = self.status.into();
        *resp.headers_mut() = self.headers;
        resp
    }
}

/// Fluent builder for [`Response`]. Defaults to `Status::Ok`.
pub struct ResponseBuilder {
    status: Status,
    headers: HeaderMap,
}

impl ResponseBuilder {
    pub fn status(mut self, status: Status) -> Self {
        self.status = status;
        self
    }

    /// Sets `name`, replacing any earlier value. A value that is not a
    /// legal header value is dropped with a warning.
    pub fn header(mut self, name: HeaderName, value: &str) -> Self {
        match HeaderValue::from_str(value) {
            Ok(v) => {
                self.headers.insert(name, v);
            }
            Err(_) => warn!(header = %name, value, "dropping invalid response header value"),
        }
        self
    }

    pub fn no_body(self) -> Response {
        Response { status: self.status, headers: self.headers, body: Body::Empty }
    }

    /// Terminates with a streamed body.
    pub fn stream(self, stream: ContentStream) -> Response {
        Response { status: self.status, headers: self.headers, body: Body::Stream(stream) }
    }
}
