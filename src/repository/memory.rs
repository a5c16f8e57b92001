//! In-memory repository, filled once and then shared read-only.

use std::collections::HashMap;

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream;

use super::{Content, DatastreamInfo, Repository, RepositoryError};

/// Datastreams held in memory, keyed by (pid, dsid).
///
/// ```rust
/// use disadis::repository::MemoryRepository;
///
/// let mut repo = MemoryRepository::new();
/// repo.insert("vecnet:abc123", "content", "report.pdf", "application/pdf", "content.3", &b"%PDF"[..]);
/// ```
#[derive(Default)]
pub struct MemoryRepository {
    entries: HashMap<(String, String), (DatastreamInfo, Bytes)>,
}

impl MemoryRepository {
    pub fn new() -> Self { Self::default() }

    /// Adds or replaces a datastream. The length is taken from `bytes`.
    pub fn insert(
        &mut self,
        pid: &str,
        dsid: &str,
        label: &str,
        content_type: &str,
        version_id: &str,
        bytes: impl Into<Bytes>,
    ) {
        let bytes = bytes.into();
        let info = DatastreamInfo {
            label: label.to_owned(),
            content_type: content_type.to_owned(),
            length: bytes.len() as u64,
            version_id: version_id.to_owned(),
        };
        self.entries.insert((pid.to_owned(), dsid.to_owned()), (info, bytes));
    }

    fn lookup(&self, pid: &str, dsid: &str) -> Result<&(DatastreamInfo, Bytes), RepositoryError> {
        self.entries
            .get(&(pid.to_owned(), dsid.to_owned()))
            .ok_or(RepositoryError::NotFound)
    }
}

#[async_trait]
impl Repository for MemoryRepository {
    async fn datastream_info(&self, pid: &str, dsid: &str) -> Result<DatastreamInfo, RepositoryError> {
        self.lookup(pid, dsid).map(|(info, _)| info.clone())
    }

    async fn datastream(&self, pid: &str, dsid: &str) -> Result<Content, RepositoryError> {
        let (info, bytes) = self.lookup(pid, dsid)?;
        Ok(Content {
            info: info.clone(),
            stream: Box::pin(stream::once(std::future::ready(Ok(bytes.clone())))),
        })
    }
}
