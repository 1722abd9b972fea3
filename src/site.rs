//! A rendered site on disk.
//!
//! [`Site`] serves navigation trees, document metadata and rendered markup
//! from a directory of built pages; [`FsOutput`] writes artifacts into an
//! output directory.
//!
//! Navigation trees are JSON files inside the site:
//!
//! ```json
//! {
//!   "href": "index.html",
//!   "items": [
//!     { "name": "Guide", "items": [{ "href": "guide/intro.html" }] },
//!     { "href": "reference/" }
//!   ]
//! }
//! ```
//!
//! Hrefs are relative to the TOC file. Items without an href (or pointing
//! off-site) group their children without contributing a page. A top-level
//! array is treated as the items of an anonymous group.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};
use serde::Deserialize;
use tracing::debug;

use crate::error::{Error, Result};
use crate::model::{Document, LinkReference, NavigationNode, PublicUrl, resolve_relative_path, split_url};
use crate::provider::{DocumentProvider, MarkupSource, Output, TocLoader};
use crate::util::{decode_text, sniff_charset};

/// Characters escaped in URL path segments.
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Page served for directory paths (`guide/`).
const DIRECTORY_INDEX: &str = "index.html";

/// A directory of rendered pages published under a base URL.
#[derive(Debug, Clone)]
pub struct Site {
    root: PathBuf,
    base_url: String,
}

impl Site {
    pub fn new(root: impl Into<PathBuf>, base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        Self {
            root: root.into(),
            base_url,
        }
    }

    fn file_path(&self, document: &Document) -> PathBuf {
        self.root.join(document.path())
    }

    /// Map a TOC href to the document it names, if it names one on this site.
    fn toc_document(&self, toc: &Document, href: &str) -> Option<Document> {
        let href = href.trim();
        let path = split_url(href).path;
        let site_path = match LinkReference::classify(href) {
            LinkReference::RelativePath => resolve_relative_path(toc.path(), path),
            LinkReference::Absolute => path.trim_start_matches(['/', '\\']).to_string(),
            _ => return None,
        };
        Some(Document::new(with_directory_index(site_path)))
    }

    fn convert(&self, toc: &Document, item: TocItem) -> NavigationNode {
        // serde_json caps nesting at 128 levels, which bounds this recursion
        NavigationNode {
            document: item
                .href
                .as_deref()
                .and_then(|href| self.toc_document(toc, href)),
            items: item
                .items
                .into_iter()
                .map(|child| self.convert(toc, child))
                .collect(),
        }
    }
}

fn with_directory_index(site_path: String) -> String {
    if site_path.is_empty() || site_path.ends_with('/') {
        format!("{site_path}{DIRECTORY_INDEX}")
    } else {
        site_path
    }
}

#[derive(Debug, Deserialize)]
struct TocItem {
    #[serde(default)]
    href: Option<String>,
    #[serde(default)]
    items: Vec<TocItem>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TocFile {
    Tree(TocItem),
    Items(Vec<TocItem>),
}

impl TocLoader for Site {
    fn load(&self, root: &Document) -> Result<NavigationNode> {
        let bytes = fs::read(self.file_path(root))?;
        let toc: TocFile = serde_json::from_slice(&bytes)
            .map_err(|e| Error::InvalidToc(format!("{root}: {e}")))?;

        let item = match toc {
            TocFile::Tree(item) => item,
            TocFile::Items(items) => TocItem { href: None, items },
        };
        let tree = self.convert(root, item);
        debug!(root = %root, "Loaded navigation tree");
        Ok(tree)
    }
}

impl DocumentProvider for Site {
    fn public_url(&self, document: &Document) -> PublicUrl {
        let mut url = self.base_url.clone();
        for (i, segment) in document.path().split('/').enumerate() {
            if i > 0 {
                url.push('/');
            }
            url.extend(utf8_percent_encode(segment, PATH_SEGMENT));
        }
        PublicUrl::new(url)
    }

    fn output_path(&self, document: &Document) -> PathBuf {
        PathBuf::from(document.path())
    }

    fn document_at(&self, site_path: &str) -> Option<Document> {
        let document = Document::new(with_directory_index(site_path.to_string()));
        self.file_path(&document).is_file().then_some(document)
    }
}

impl MarkupSource for Site {
    fn read_markup(&self, document: &Document) -> Result<Option<String>> {
        match fs::read(self.file_path(document)) {
            Ok(bytes) => Ok(Some(decode_text(&bytes, sniff_charset(&bytes)).into_owned())),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

/// Writes artifacts under an output directory, creating parents as needed.
#[derive(Debug, Clone)]
pub struct FsOutput {
    root: PathBuf,
}

impl FsOutput {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl Output for FsOutput {
    fn write_stream(&self, path: &Path) -> io::Result<Box<dyn Write + Send>> {
        let full = self.root.join(path);
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent)?;
        }
        Ok(Box::new(File::create(full)?))
    }
}
