//! The dissemination pipeline: one configured datastream served over `GET`.
//!
//! A [`Disseminator`] handles
//!
//! ```text
//! GET /:id
//! GET /:id/:version      (only when versioned)
//! ```
//!
//! The first returns the current content of the configured datastream of
//! object `prefix + id`. The second returns the same content, but only if
//! `:version` equals the datastream's current version number; any other
//! version is `403`. Older versions are never served.
//!
//! Stages run in a fixed order and the first one to produce a response
//! wins:
//!
//! 1. non-`GET` is `404`
//! 2. parse the identifier and optional version segment
//! 3. authorization, before anything version-related, so a denied caller
//!    learns nothing about which versions exist
//! 4. validate the version segment
//! 5. fetch metadata
//! 6. compare requested and current version
//! 7. `If-None-Match` against the version id, answering `304`
//! 8. fetch and stream the content
//!
//! Malformed requests are `404`, never `400`, so that probing clients get
//! the same answer for "bad request" and "no such object".

use std::io;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll, ready};

use bytes::Bytes;
use futures::Stream;
use http::Method;
use http::header::{
    CACHE_CONTROL, CONTENT_DISPOSITION, CONTENT_LENGTH, CONTENT_TYPE, ETAG, HeaderName,
    IF_NONE_MATCH,
};
use tracing::{debug, error, info, warn};

use crate::auth::{Authorizer, Decision};
use crate::handler::{BoxFuture, Handler};
use crate::path::{Target, parse_version};
use crate::repository::{ContentStream, Repository, RepositoryError};
use crate::request::Request;
use crate::response::Response;
use crate::status::Status;

const CONTENT_TRANSFER_ENCODING: HeaderName = HeaderName::from_static("content-transfer-encoding");

/// Serves one datastream of every object in one namespace.
///
/// ```rust
/// use std::sync::Arc;
/// use disadis::Disseminator;
/// use disadis::repository::MemoryRepository;
///
/// let repo = Arc::new(MemoryRepository::new());
/// let pipeline = Disseminator::new(repo, "content")
///     .prefix("vecnet:")
///     .versioned(true);
/// ```
pub struct Disseminator {
    repository: Arc<dyn Repository>,
    datastream: String,
    versioned: bool,
    prefix: String,
    authorizer: Option<Arc<dyn Authorizer>>,
}

impl Disseminator {
    pub fn new(repository: Arc<dyn Repository>, datastream: impl Into<String>) -> Self {
        Self {
            repository,
            datastream: datastream.into(),
            versioned: false,
            prefix: String::new(),
            authorizer: None,
        }
    }

    /// Accept `/:id/:version` in addition to `/:id`.
    pub fn versioned(mut self, versioned: bool) -> Self {
        self.versioned = versioned;
        self
    }

    /// Namespace prepended verbatim to every decoded identifier. Include
    /// any separator, e.g. `"vecnet:"`.
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Checks every request with `authorizer` before touching the
    /// repository.
    pub fn authorizer(mut self, authorizer: Arc<dyn Authorizer>) -> Self {
        self.authorizer = Some(authorizer);
        self
    }

    pub fn datastream(&self) -> &str { &self.datastream }

    pub async fn handle(&self, req: &Request) -> Response {
        info!(method = %req.method(), path = req.path(), "disseminate");

        if req.method() != Method::GET {
            return Response::error(Status::NotFound);
        }

        let Some(target) = Target::parse(req.path(), &self.prefix) else {
            return Response::error(Status::NotFound);
        };
        let pid = target.pid.as_str();

        if let Some(authorizer) = &self.authorizer {
            match authorizer.check(req, pid).await {
                Decision::Allow => {}
                Decision::Deny => return Response::error(Status::Unauthorized),
                Decision::NotFound => return Response::error(Status::NotFound),
                Decision::Error => return Response::error(Status::InternalServerError),
            }
        }

        let requested = match target.version {
            None => None,
            Some(segment) if self.versioned => match parse_version(segment) {
                Some(v) => Some(v),
                None => return Response::error(Status::NotFound),
            },
            Some(_) => return Response::error(Status::NotFound),
        };

        let info = match self.repository.datastream_info(pid, &self.datastream).await {
            Ok(info) => info,
            Err(RepositoryError::NotFound) => return Response::error(Status::NotFound),
            Err(e) => {
                error!(pid, dsid = %self.datastream, "fetching datastream info: {e}");
                return Response::error(Status::InternalServerError);
            }
        };

        if let Some(requested) = requested {
            let current = info.current_version();
            if current.is_none() {
                // Reported as a version mismatch; the real problem is the
                // repository's version id.
                warn!(pid, version_id = %info.version_id, "cannot parse current version");
            }
            if current != Some(requested) {
                return Response::error(Status::Forbidden);
            }
        }

        if validator_matches(req, &info.version_id) {
            return Response::builder()
                .status(Status::NotModified)
                .header(ETAG, &info.version_id)
                .no_body();
        }

        let content = match self.repository.datastream(pid, &self.datastream).await {
            Ok(content) => content,
            Err(RepositoryError::NotFound) => return Response::error(Status::NotFound),
            Err(e) => {
                error!(pid, dsid = %self.datastream, "fetching datastream content: {e}");
                return Response::error(Status::InternalServerError);
            }
        };

        Response::builder()
            .header(CONTENT_TYPE, &content.info.content_type)
            .header(CONTENT_LENGTH, &content.info.length.to_string())
            .header(CONTENT_DISPOSITION, &format!("inline; filename=\"{}\"", quote(&info.label)))
            .header(CONTENT_TRANSFER_ENCODING, "binary")
            .header(CACHE_CONTROL, "private")
            .header(ETAG, &info.version_id)
            .stream(Box::pin(Released::new(target.pid, content.stream)))
    }
}

impl Handler for Disseminator {
    fn call(&self, req: Request) -> BoxFuture<'_> {
        Box::pin(async move { self.handle(&req).await })
    }
}

/// True when any `If-None-Match` value, across all header lines and
/// comma-separated entries, is exactly `version_id`.
fn validator_matches(req: &Request, version_id: &str) -> bool {
    req.header_values(IF_NONE_MATCH.as_str())
        .flat_map(|line| line.split(','))
        .map(str::trim)
        .any(|tag| tag == version_id)
}

fn quote(label: &str) -> String {
    label.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Content stream that notes how it ended. Whatever the ending, the inner
/// stream is dropped with this one.
struct Released {
    pid: String,
    inner: ContentStream,
    finished: bool,
}

impl Released {
    fn new(pid: String, inner: ContentStream) -> Self {
        Self { pid, inner, finished: false }
    }
}

impl Stream for Released {
    type Item = io::Result<Bytes>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let item = ready!(self.inner.as_mut().poll_next(cx));
        match &item {
            None => self.finished = true,
            Some(Err(e)) => error!(pid = %self.pid, "reading datastream content: {e}"),
            Some(Ok(_)) => {}
        }
        Poll::Ready(item)
    }
}

impl Drop for Released {
    fn drop(&mut self) {
        if !self.finished {
            debug!(pid = %self.pid, "content stream released before completion");
        }
    }
}
