//! Weak validators derived from artifact metadata.

use std::fmt;
use std::path::Path;

use crate::cache::artifact::stat;
use crate::cache::ArtifactMetadata;

/// `W/"<byteSize>-<mtimeMillis>"`.
///
/// Describes the file's size and modification time, not its content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeakValidator(String);

impl WeakValidator {
    pub fn from_metadata(metadata: &ArtifactMetadata) -> Self {
        Self(format!(
            "W/\"{}-{}\"",
            metadata.size, metadata.modified_millis
        ))
    }

    /// Validator for the file at `path`; `None` when it cannot be stat'ed.
    pub async fn for_path(path: &Path) -> Option<Self> {
        stat(path).await.map(|m| Self::from_metadata(&m))
    }

    /// String-exact comparison with a request's `If-None-Match` value.
    pub fn matches(&self, if_none_match: &str) -> bool {
        self.0 == if_none_match
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WeakValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
