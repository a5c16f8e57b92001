//! Recording fakes shared by the integration tests.

#![allow(dead_code)]

use std::io;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use http_body_util::BodyExt;

use disadis::auth::{Authorizer, Decision};
use disadis::repository::{Content, DatastreamInfo, MemoryRepository, Repository, RepositoryError};
use disadis::{Request, Response};

pub const BODY: &[u8] = b"%PDF-1.4 pretend this is a paper";

#[derive(Clone, Copy)]
pub enum Failure {
    NotFound,
    Other,
}

impl Failure {
    fn error(self) -> RepositoryError {
        match self {
            Self::NotFound => RepositoryError::NotFound,
            Self::Other => RepositoryError::Io(io::Error::other("backend exploded at 10.1.2.3")),
        }
    }
}

/// Memory repository that counts calls, can fail on demand, and notes when
/// a content stream it handed out has been dropped.
pub struct Recording {
    inner: MemoryRepository,
    info_calls: AtomicUsize,
    content_calls: AtomicUsize,
    info_failure: Option<Failure>,
    content_failure: Option<Failure>,
    released: Arc<AtomicBool>,
}

impl Recording {
    /// `vecnet:abc123` with datastream `content` at version id `abc123.3`.
    pub fn new() -> Self {
        Self::with_version_id("abc123.3")
    }

    pub fn with_version_id(version_id: &str) -> Self {
        let mut inner = MemoryRepository::new();
        inner.insert("vecnet:abc123", "content", "paper.pdf", "application/pdf", version_id, BODY);
        Self {
            inner,
            info_calls: AtomicUsize::new(0),
            content_calls: AtomicUsize::new(0),
            info_failure: None,
            content_failure: None,
            released: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn failing_info(mut self, f: Failure) -> Self {
        self.info_failure = Some(f);
        self
    }

    pub fn failing_content(mut self, f: Failure) -> Self {
        self.content_failure = Some(f);
        self
    }

    pub fn info_calls(&self) -> usize { self.info_calls.load(Ordering::SeqCst) }
    pub fn content_calls(&self) -> usize { self.content_calls.load(Ordering::SeqCst) }
    pub fn released(&self) -> bool { self.released.load(Ordering::SeqCst) }
}

struct SetOnDrop(Arc<AtomicBool>);

impl Drop for SetOnDrop {
    fn drop(&mut self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl Repository for Recording {
    async fn datastream_info(&self, pid: &str, dsid: &str) -> Result<DatastreamInfo, RepositoryError> {
        self.info_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(f) = self.info_failure {
            return Err(f.error());
        }
        self.inner.datastream_info(pid, dsid).await
    }

    async fn datastream(&self, pid: &str, dsid: &str) -> Result<Content, RepositoryError> {
        self.content_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(f) = self.content_failure {
            return Err(f.error());
        }
        let content = self.inner.datastream(pid, dsid).await?;
        let guard = SetOnDrop(Arc::clone(&self.released));
        let stream = content.stream.map(move |chunk| {
            let _held = &guard;
            chunk
        });
        Ok(Content { info: content.info, stream: Box::pin(stream) })
    }
}

/// Authorizer with a fixed answer that remembers what it was asked.
pub struct Fixed {
    decision: Decision,
    calls: AtomicUsize,
    last_pid: Mutex<Option<String>>,
}

impl Fixed {
    pub fn new(decision: Decision) -> Self {
        Self { decision, calls: AtomicUsize::new(0), last_pid: Mutex::new(None) }
    }

    pub fn calls(&self) -> usize { self.calls.load(Ordering::SeqCst) }

    pub fn last_pid(&self) -> Option<String> {
        self.last_pid.lock().unwrap().clone()
    }
}

#[async_trait]
impl Authorizer for Fixed {
    async fn check(&self, _req: &Request, pid: &str) -> Decision {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_pid.lock().unwrap() = Some(pid.to_owned());
        self.decision
    }
}

pub async fn body(resp: Response) -> Bytes {
    resp.into_http().into_body().collect().await.unwrap().to_bytes()
}
