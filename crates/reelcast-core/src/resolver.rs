//! Source resolution: content reference to manifest URL

use crate::{ContentRef, Error, Result};
use url::Url;

/// Builds manifest URLs for catalog content.
///
/// Pure: no network access. Live content maps to `{base}/live/{id}/stream`,
/// on-demand content to `{base}/videos/{id}/stream`.
#[derive(Debug, Clone)]
pub struct SourceResolver {
    base: Url,
}

impl SourceResolver {
    pub fn new(base: Url) -> Self {
        Self { base }
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    /// Resolve the manifest URL for `content`.
    ///
    /// The identifier is pushed as one path segment, so `/`, `?`, `#`, `%`
    /// and whitespace are percent-encoded while `-`, `_`, `.` and `~` pass
    /// through untouched.
    pub fn resolve(&self, content: &ContentRef) -> Result<Url> {
        let identifier = content.identifier();
        if identifier.is_empty() {
            return Err(Error::invalid_content("identifier is empty"));
        }
        // Dot segments are dropped by URL normalization and would address the wrong path.
        if identifier == "." || identifier == ".." {
            return Err(Error::invalid_content(format!(
                "identifier {identifier:?} is not a valid path segment"
            )));
        }

        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| {
                Error::InvalidConfig(format!("base address cannot carry a path: {}", self.base))
            })?
            .pop_if_empty()
            .push(content.kind().endpoint())
            .push(identifier)
            .push("stream");

        Ok(url)
    }
}
