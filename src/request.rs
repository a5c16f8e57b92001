//! Incoming HTTP request type.
//!
//! The gateway never reads request bodies (everything it serves is a `GET`),
//! so a [`Request`] is just the request head: method, target, headers and
//! the peer address.

use std::net::SocketAddr;

use http::header::{HeaderName, HeaderValue};
use http::{HeaderMap, Method};

/// An incoming HTTP request.
///
/// `path` is what the handler sees and may differ from `uri`: the
/// [`Router`](crate::Router) strips the routing segment before forwarding.
#[derive(Clone, Debug)]
pub struct Request {
    method: Method,
    path: String,
    uri: String,
    headers: HeaderMap,
    remote_addr: Option<SocketAddr>,
}

impl Request {
    /// Builds a request for `target` (`/path?query`). The query string is
    /// kept in [`uri`](Request::uri) but is not part of the path.
    pub fn new(method: Method, target: &str) -> Self {
        let path = target.split_once('?').map_or(target, |(p, _)| p);
        Self {
            method,
            path: path.to_owned(),
            uri: target.to_owned(),
            headers: HeaderMap::new(),
            remote_addr: None,
        }
    }

    /// Shorthand for `Request::new(Method::GET, target)`.
    pub fn get(target: &str) -> Self {
        Self::new(Method::GET, target)
    }

    /// Appends a header value. Repeated names accumulate.
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    pub fn with_remote_addr(mut self, addr: SocketAddr) -> Self {
        self.remote_addr = Some(addr);
        self
    }

    pub(crate) fn from_parts(parts: http::request::Parts, remote_addr: SocketAddr) -> Self {
        let uri = parts
            .uri
            .path_and_query()
            .map_or_else(|| parts.uri.path().to_owned(), |pq| pq.as_str().to_owned());
        Self {
            method: parts.method,
            path: parts.uri.path().to_owned(),
            uri,
            headers: parts.headers,
            remote_addr: Some(remote_addr),
        }
    }

    /// Replaces the handler-visible path, leaving `uri` untouched.
    pub(crate) fn with_path(mut self, path: String) -> Self {
        self.path = path;
        self
    }

    pub fn method(&self) -> &Method { &self.method }
    pub fn path(&self) -> &str { &self.path }
    pub fn uri(&self) -> &str { &self.uri }
    pub fn headers(&self) -> &HeaderMap { &self.headers }
    pub fn remote_addr(&self) -> Option<SocketAddr> { self.remote_addr }

    /// First value of `name`, if present and valid UTF-8 / visible ASCII.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Every value of `name`, across repeated header lines.
    pub fn header_values<'a>(&'a self, name: &str) -> impl Iterator<Item = &'a str> + 'a {
        self.headers
            .get_all(name)
            .into_iter()
            .filter_map(|v| v.to_str().ok())
    }

    /// Client address as reported by the fronting proxy (`X-Real-IP`),
    /// falling back to the TCP peer.
    pub fn real_ip(&self) -> String {
        match self.header("x-real-ip") {
            Some(ip) if !ip.is_empty() => ip.to_owned(),
            _ => self
                .remote_addr
                .map_or_else(|| "-".to_owned(), |a| a.to_string()),
        }
    }
}
