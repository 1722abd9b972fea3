//! # quire
//!
//! Merges the pages of a rendered documentation site into one printable
//! HTML stream per table of contents, ready to hand to an HTML-to-PDF
//! renderer.
//!
//! ## Features
//!
//! - Pages are written in TOC order, each rendered document exactly once
//! - Element ids are prefixed with a per-page token so they stay unique
//! - Links between merged pages become in-stream `#token...` bookmarks
//! - Markup outside the rewritten attributes is copied byte for byte
//! - Missing or broken pages are reported as diagnostics, never fatal
//!
//! ## Quick Start
//!
//! ```no_run
//! use quire::{Document, FsOutput, PdfBuilder, Site};
//!
//! let site = Site::new("_site", "https://docs.example.com/");
//! let output = FsOutput::new("_site");
//!
//! // Writes _site/guide/toc.pdf.html
//! let report = PdfBuilder::new(&site, &site, &site, &output)
//!     .build_artifacts(&[Document::new("guide/toc.json")])?;
//! assert!(!report.has_errors());
//! # Ok::<(), quire::Error>(())
//! ```
//!
//! ## In-memory builds
//!
//! Any collaborator can be swapped out. [`PageStore`] holds pages pushed in
//! by a documentation build and [`MemoryOutput`] collects artifacts:
//!
//! ```
//! use std::collections::BTreeMap;
//! use std::path::PathBuf;
//! use quire::{Document, MemoryOutput, NavigationNode, PageStore, PdfBuilder, Site};
//!
//! let pages = PageStore::new();
//! pages.add_page(Document::new("intro.html"), "<main><h1 id=\"top\">Intro</h1></main>");
//!
//! let mut tocs = BTreeMap::new();
//! tocs.insert(Document::new("toc.json"), NavigationNode::new("intro.html"));
//!
//! let site = Site::new("_site", "https://docs.example.com/");
//! let output = MemoryOutput::new();
//! let report = PdfBuilder::new(&tocs, &site, &pages, &output)
//!     .build_artifacts(&[Document::new("toc.json")])
//!     .unwrap();
//!
//! assert_eq!(report.artifacts, vec![PathBuf::from("toc.pdf.html")]);
//! ```

pub mod build;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod model;
pub mod provider;
pub mod site;
pub mod token;
pub mod transform;
pub(crate) mod util;

pub use build::{PdfBuilder, artifact_path};
pub use config::BuildConfig;
pub use diagnostics::{BuildReport, Diagnostic, DiagnosticKind, Diagnostics, Level};
pub use error::{Error, Result};
pub use model::{Document, FlattenedEntry, LinkReference, NavigationNode, PublicUrl};
pub use provider::{
    DocumentProvider, MarkupSource, MemoryOutput, Output, PageStore, ProviderResolver, TocLoader,
};
pub use site::{FsOutput, Site};
pub use token::PageToken;
pub use transform::{LinkResolver, RewriteContext, Rewritten, rewrite_markup};
