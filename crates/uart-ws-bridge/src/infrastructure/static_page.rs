//! The chat page resource.
//!
//! The page is read from disk once, at startup.  A missing, unreadable or
//! empty file is a configuration error that stops the bridge from starting.

use std::path::{Path, PathBuf};

use axum::body::Bytes;
use thiserror::Error;
use tracing::info;

/// Why the page could not be loaded.
#[derive(Debug, Error)]
pub enum StaticPageError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{0} is empty")]
    Empty(PathBuf),
}

/// An in-memory copy of a static resource.
#[derive(Debug, Clone)]
pub struct StaticPage {
    content_type: &'static str,
    body: Bytes,
}

impl StaticPage {
    pub const HTML: &'static str = "text/html";

    /// Reads the HTML page at `path`.
    ///
    /// # Errors
    ///
    /// [`StaticPageError::Read`] if the file cannot be read and
    /// [`StaticPageError::Empty`] if it has no content.
    pub fn load_html(path: &Path) -> Result<Self, StaticPageError> {
        let body = std::fs::read(path).map_err(|source| StaticPageError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        if body.is_empty() {
            return Err(StaticPageError::Empty(path.to_path_buf()));
        }

        info!("loaded {} ({} bytes)", path.display(), body.len());
        Ok(Self::from_bytes(Self::HTML, body))
    }

    pub fn from_bytes(content_type: &'static str, body: impl Into<Bytes>) -> Self {
        Self {
            content_type,
            body: body.into(),
        }
    }

    pub fn content_type(&self) -> &'static str {
        self.content_type
    }

    /// The page body.  Cloning is a reference-count bump.
    pub fn body(&self) -> Bytes {
        self.body.clone()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
