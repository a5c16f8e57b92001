//! `/<id>[/<version>]` target parsing.

use percent_encoding::percent_decode_str;

/// The object a request names, and the raw version segment if any.
#[derive(Debug, Eq, PartialEq)]
pub(crate) struct Target<'a> {
    pub pid: String,
    pub version: Option<&'a str>,
}

impl<'a> Target<'a> {
    /// Strips one leading and one trailing `/`, then splits on the first
    /// `/`. The first segment is percent-decoded and appended to `prefix`.
    ///
    /// Returns `None` when the identifier segment is empty, not UTF-8 once
    /// decoded, or decodes to something containing `/`.
    pub fn parse(path: &'a str, prefix: &str) -> Option<Self> {
        let path = path.strip_prefix('/').unwrap_or(path);
        let path = path.strip_suffix('/').unwrap_or(path);
        let (id, version) = match path.split_once('/') {
            Some((id, version)) => (id, Some(version)),
            None => (path, None),
        };

        let id = percent_decode_str(id).decode_utf8().ok()?;
        if id.is_empty() || id.contains('/') {
            return None;
        }
        Some(Self { pid: format!("{prefix}{id}"), version })
    }
}

/// A version segment is a non-negative integer; anything else is invalid.
pub(crate) fn parse_version(segment: &str) -> Option<u64> {
    segment.parse().ok()
}
