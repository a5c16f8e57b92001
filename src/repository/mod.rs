//! The backing store the gateway disseminates from.
//!
//! The pipeline needs exactly two things from a repository: the metadata of
//! one datastream, and its bytes. Both calls name the datastream by object
//! identifier (pid) and datastream id (dsid).
//!
//! [`RepositoryError::NotFound`] is the one failure the pipeline treats
//! differently from the rest: it becomes a `404`, everything else a `500`.
//! Implementations must map "no such object" and "no such datastream" onto
//! it and nothing else.

use std::io;
use std::pin::Pin;

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;

pub mod fs;
pub mod memory;

pub use fs::FsRepository;
pub use memory::MemoryRepository;

/// A datastream's bytes. Dropping the stream releases the underlying source.
pub type ContentStream = Pin<Box<dyn Stream<Item = io::Result<Bytes>> + Send + 'static>>;

/// Datastream metadata as reported by the repository.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DatastreamInfo {
    /// Human-readable label; used as the download filename.
    pub label: String,
    /// MIME type of the content.
    pub content_type: String,
    /// Content length in bytes.
    pub length: u64,
    /// `<base>.<N>` where `N` is the current version number. Doubles as
    /// the ETag.
    pub version_id: String,
}

impl DatastreamInfo {
    /// The `N` in `<base>.<N>`, or `None` when the version id has no `.`
    /// or its suffix is not a non-negative integer.
    pub fn current_version(&self) -> Option<u64> {
        let (_, n) = self.version_id.rsplit_once('.')?;
        n.parse().ok()
    }
}

/// A datastream's bytes together with the descriptor they were served with.
pub struct Content {
    pub info: DatastreamInfo,
    pub stream: ContentStream,
}

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("object or datastream not found")]
    NotFound,
    #[error("repository i/o error: {0}")]
    Io(#[from] io::Error),
    #[error("malformed datastream metadata: {0}")]
    Metadata(String),
}

/// Read access to datastreams.
#[async_trait]
pub trait Repository: Send + Sync + 'static {
    async fn datastream_info(&self, pid: &str, dsid: &str) -> Result<DatastreamInfo, RepositoryError>;

    async fn datastream(&self, pid: &str, dsid: &str) -> Result<Content, RepositoryError>;
}
