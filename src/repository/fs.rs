//! Directory-backed repository.
//!
//! Layout, one directory per object:
//!
//! ```text
//! <root>/<pid>/<dsid>        content bytes
//! <root>/<pid>/<dsid>.toml   label, content_type, version_id
//! ```
//!
//! The content length is the size of the content file. Identifiers are used
//! as single path components, so anything that could escape `root` is
//! reported as not found.

use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::BytesMut;
use futures::stream;
use serde::Deserialize;
use tokio::io::AsyncReadExt;

use super::{Content, ContentStream, DatastreamInfo, Repository, RepositoryError};

const CHUNK_SIZE: usize = 64 * 1024;

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct Sidecar {
    label: String,
    content_type: String,
    version_id: String,
}

pub struct FsRepository {
    root: PathBuf,
}

impl FsRepository {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path { &self.root }

    fn content_path(&self, pid: &str, dsid: &str) -> Result<PathBuf, RepositoryError> {
        if !is_component(pid) || !is_component(dsid) {
            return Err(RepositoryError::NotFound);
        }
        Ok(self.root.join(pid).join(dsid))
    }

    async fn read_info(&self, content: &Path) -> Result<DatastreamInfo, RepositoryError> {
        let raw = tokio::fs::read_to_string(content.with_extension(sidecar_ext(content)))
            .await
            .map_err(not_found_or_io)?;
        let sidecar: Sidecar =
            toml::from_str(&raw).map_err(|e| RepositoryError::Metadata(e.to_string()))?;
        let length = tokio::fs::metadata(content).await.map_err(not_found_or_io)?.len();
        Ok(DatastreamInfo {
            label: sidecar.label,
            content_type: sidecar.content_type,
            length,
            version_id: sidecar.version_id,
        })
    }
}

#[async_trait]
impl Repository for FsRepository {
    async fn datastream_info(&self, pid: &str, dsid: &str) -> Result<DatastreamInfo, RepositoryError> {
        let path = self.content_path(pid, dsid)?;
        self.read_info(&path).await
    }

    async fn datastream(&self, pid: &str, dsid: &str) -> Result<Content, RepositoryError> {
        let path = self.content_path(pid, dsid)?;
        let info = self.read_info(&path).await?;
        let file = tokio::fs::File::open(&path).await.map_err(not_found_or_io)?;
        Ok(Content { info, stream: chunked(file) })
    }
}

/// Streams `file` in `CHUNK_SIZE` pieces. The file is closed when the
/// stream is dropped.
fn chunked(file: tokio::fs::File) -> ContentStream {
    Box::pin(stream::try_unfold(file, |mut file| async move {
        let mut buf = BytesMut::with_capacity(CHUNK_SIZE);
        let n = file.read_buf(&mut buf).await?;
        let next = (n > 0).then(|| (buf.freeze(), file));
        Ok::<_, io::Error>(next)
    }))
}

// `<dsid>.toml`, keeping any dot already in the dsid.
fn sidecar_ext(content: &Path) -> String {
    match content.extension().and_then(|e| e.to_str()) {
        Some(ext) => format!("{ext}.toml"),
        None => "toml".to_owned(),
    }
}

fn is_component(s: &str) -> bool {
    !s.is_empty()
        && s != "."
        && s != ".."
        && !s.contains(['/', '\\', '\0'])
}

fn not_found_or_io(e: io::Error) -> RepositoryError {
    match e.kind() {
        io::ErrorKind::NotFound => RepositoryError::NotFound,
        _ => RepositoryError::Io(e),
    }
}
