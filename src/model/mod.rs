//! Core data model for TOC merging.
//!
//! This module contains:
//! - Document handles and public URLs
//! - The navigation tree and its flattened form
//! - Link classification for attribute values

mod links;
mod toc;

pub use links::{LinkReference, SplitUrl, resolve_relative_path, split_url};
pub use toc::{FlattenedEntry, NavigationNode};

use std::fmt;

/// Opaque handle to a unit of rendered markup.
///
/// Identified by its logical path: site-relative, `/`-separated, no leading slash
/// (e.g. `guide/intro.html`). Two handles are the same document iff their paths
/// are equal.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Document(String);

impl Document {
    /// Create a document handle, normalizing separators and stripping a leading `/`.
    pub fn new(path: impl Into<String>) -> Self {
        let path = path.into();
        let path = if path.contains('\\') {
            path.replace('\\', "/")
        } else {
            path
        };
        match path.strip_prefix('/') {
            Some(stripped) => Self(stripped.to_string()),
            None => Self(path),
        }
    }

    /// The logical path of this document.
    pub fn path(&self) -> &str {
        &self.0
    }

    /// Directory portion of the path, including the trailing `/` (empty at the site root).
    pub fn directory(&self) -> &str {
        match self.0.rfind('/') {
            Some(idx) => &self.0[..=idx],
            None => "",
        }
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Document {
    fn from(path: &str) -> Self {
        Self::new(path)
    }
}

impl From<String> for Document {
    fn from(path: String) -> Self {
        Self::new(path)
    }
}

/// The externally visible address of a [`Document`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PublicUrl(String);

impl PublicUrl {
    pub fn new(url: impl Into<String>) -> Self {
        Self(url.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PublicUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
