//! Collaborators the builder depends on.
//!
//! The builder never touches the file system directly. Navigation trees,
//! document metadata, rendered markup and output streams all come through
//! these traits, which must tolerate concurrent use from worker threads.
//!
//! [`Site`](crate::Site) implements the read side over a rendered site on disk;
//! [`PageStore`] and [`MemoryOutput`] keep everything in memory.

use std::collections::{BTreeMap, HashMap};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use crate::error::{Error, Result};
use crate::model::{Document, NavigationNode, PublicUrl};
use crate::transform::LinkResolver;

/// Supplies the navigation tree for a root.
pub trait TocLoader: Send + Sync {
    fn load(&self, root: &Document) -> Result<NavigationNode>;
}

/// Read-only document metadata.
pub trait DocumentProvider: Send + Sync {
    /// The externally visible URL of a document.
    fn public_url(&self, document: &Document) -> PublicUrl;

    /// Where a document's own output lives, relative to the output root.
    fn output_path(&self, document: &Document) -> PathBuf;

    /// The document served at a site path, if any.
    fn document_at(&self, site_path: &str) -> Option<Document>;
}

/// Supplies rendered markup for documents.
pub trait MarkupSource: Send + Sync {
    /// Rendered markup, or `None` when the document was never rendered.
    fn read_markup(&self, document: &Document) -> Result<Option<String>>;
}

/// Opens output streams for artifacts.
pub trait Output: Send + Sync {
    /// Open a stream for `path`. The artifact is complete once the stream is
    /// flushed and dropped.
    fn write_stream(&self, path: &Path) -> io::Result<Box<dyn Write + Send>>;
}

/// Resolves link targets through a [`DocumentProvider`].
pub struct ProviderResolver<'a>(pub &'a dyn DocumentProvider);

impl LinkResolver for ProviderResolver<'_> {
    fn resolve_url(&self, site_path: &str) -> Option<PublicUrl> {
        self.0
            .document_at(site_path)
            .map(|document| self.0.public_url(&document))
    }
}

impl TocLoader for BTreeMap<Document, NavigationNode> {
    fn load(&self, root: &Document) -> Result<NavigationNode> {
        self.get(root)
            .cloned()
            .ok_or_else(|| Error::InvalidToc(format!("no navigation tree for {root}")))
    }
}

// --- Implementation: In-Memory Pages ---

/// Pre-rendered pages pushed in by a documentation build.
///
/// Each document is stored at most once; later additions for the same
/// document are ignored.
#[derive(Debug, Default)]
pub struct PageStore {
    pages: RwLock<HashMap<Document, Arc<str>>>,
}

impl PageStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a page if none is stored for `document` yet.
    ///
    /// Returns `true` if the page was inserted.
    pub fn add_page(&self, document: Document, html: impl Into<Arc<str>>) -> bool {
        let mut pages = self.pages.write().unwrap_or_else(PoisonError::into_inner);
        match pages.entry(document) {
            std::collections::hash_map::Entry::Occupied(_) => false,
            std::collections::hash_map::Entry::Vacant(slot) => {
                slot.insert(html.into());
                true
            }
        }
    }

    pub fn get(&self, document: &Document) -> Option<Arc<str>> {
        self.pages
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(document)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.pages.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl MarkupSource for PageStore {
    fn read_markup(&self, document: &Document) -> Result<Option<String>> {
        Ok(self.get(document).map(|html| html.to_string()))
    }
}

// --- Implementation: In-Memory Output ---

/// Collects artifacts in memory, keyed by path.
#[derive(Debug, Clone, Default)]
pub struct MemoryOutput {
    files: Arc<Mutex<BTreeMap<PathBuf, Vec<u8>>>>,
}

impl MemoryOutput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Contents of a completed artifact.
    pub fn get(&self, path: impl AsRef<Path>) -> Option<Vec<u8>> {
        self.lock().get(path.as_ref()).cloned()
    }

    /// Paths of all completed artifacts, sorted.
    pub fn paths(&self) -> Vec<PathBuf> {
        self.lock().keys().cloned().collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<PathBuf, Vec<u8>>> {
        self.files.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Output for MemoryOutput {
    fn write_stream(&self, path: &Path) -> io::Result<Box<dyn Write + Send>> {
        Ok(Box::new(MemoryStream {
            path: path.to_path_buf(),
            buf: Vec::new(),
            files: Arc::clone(&self.files),
        }))
    }
}

/// Buffers writes and publishes them when dropped.
struct MemoryStream {
    path: PathBuf,
    buf: Vec<u8>,
    files: Arc<Mutex<BTreeMap<PathBuf, Vec<u8>>>>,
}

impl Write for MemoryStream {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for MemoryStream {
    fn drop(&mut self) {
        let buf = std::mem::take(&mut self.buf);
        self.files
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(std::mem::take(&mut self.path), buf);
    }
}
