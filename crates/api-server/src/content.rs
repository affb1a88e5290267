//! Content directory: loads page documents from `<root>/<slug>.json`.
//!
//! Pages are read on every request so edits show up without a restart.

use std::path::{Path, PathBuf};

use storefront_core::{PageDocument, StorefrontError, StorefrontResult};
use tracing::debug;

/// Maximum accepted slug length.
const MAX_SLUG_LEN: usize = 128;

pub struct ContentDirectory {
    root: PathBuf,
}

impl ContentDirectory {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Load a page by slug. A missing file is `Ok(None)`.
    pub async fn load_page(&self, slug: &str) -> StorefrontResult<Option<PageDocument>> {
        validate_slug(slug)?;
        let path = self.root.join(format!("{slug}.json"));

        let raw = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(slug, path = %path.display(), "Page document not found");
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        let mut page: PageDocument = serde_json::from_str(&raw)?;
        if page.slug.is_empty() {
            page.slug = slug.to_string();
        }
        Ok(Some(page))
    }
}

/// Slugs are ASCII letters, digits, `-` and `_`, which keeps lookups
/// inside the content root.
fn validate_slug(slug: &str) -> StorefrontResult<()> {
    let valid = !slug.is_empty()
        && slug.len() <= MAX_SLUG_LEN
        && slug
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(StorefrontError::InvalidSlug(slug.to_string()))
    }
}
