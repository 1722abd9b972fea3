//! Merging navigation trees into printable artifacts.
//!
//! A build runs in four phases:
//! 1. Load and flatten every root's navigation tree (parallel over roots).
//! 2. Collect the distinct documents across all roots.
//! 3. Rewrite each distinct document exactly once (parallel over documents).
//!    Collecting the results is the only barrier in the build.
//! 4. Write each root's pages, in traversal order, into one artifact
//!    (parallel over roots).
//!
//! Failures are recorded as diagnostics and never stop other documents or
//! roots from being produced.

use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use rayon::prelude::*;
use tracing::{debug, info};

use crate::config::BuildConfig;
use crate::diagnostics::{BuildReport, Diagnostic, DiagnosticKind, Diagnostics};
use crate::error::{Error, Result};
use crate::model::{Document, FlattenedEntry};
use crate::provider::{DocumentProvider, MarkupSource, Output, ProviderResolver, TocLoader};
use crate::token::PageToken;
use crate::transform::{RewriteContext, rewrite_markup};

/// Rewritten pages keyed by document; immutable once built.
type Pages<'d> = HashMap<&'d Document, Arc<str>>;

/// A root whose artifact will be written, with its flattened tree.
struct Job<'d> {
    root: &'d Document,
    path: PathBuf,
    entries: Vec<FlattenedEntry>,
}

/// Builds one merged `.pdf.html` stream per navigation root.
///
/// # Example
///
/// ```no_run
/// use quire::{Document, FsOutput, PdfBuilder, Site};
///
/// let site = Site::new("_site", "https://docs.example.com/");
/// let output = FsOutput::new("_pdf");
/// let report = PdfBuilder::new(&site, &site, &site, &output)
///     .build_artifacts(&[Document::new("guide/toc.json")])?;
/// for diagnostic in &report.diagnostics {
///     eprintln!("{diagnostic}");
/// }
/// # Ok::<(), quire::Error>(())
/// ```
pub struct PdfBuilder<'a> {
    config: BuildConfig,
    tocs: &'a dyn TocLoader,
    documents: &'a dyn DocumentProvider,
    markup: &'a dyn MarkupSource,
    output: &'a dyn Output,
}

impl<'a> PdfBuilder<'a> {
    pub fn new(
        tocs: &'a dyn TocLoader,
        documents: &'a dyn DocumentProvider,
        markup: &'a dyn MarkupSource,
        output: &'a dyn Output,
    ) -> Self {
        Self {
            config: BuildConfig::default(),
            tocs,
            documents,
            markup,
            output,
        }
    }

    /// Configure the builder with custom settings.
    pub fn with_config(mut self, config: BuildConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    /// Build the merged artifact for every root.
    ///
    /// Returns `Err` only when the build cannot start (invalid configuration,
    /// thread pool creation). Everything else is reported in the
    /// [`BuildReport`] alongside the artifacts that were written.
    pub fn build_artifacts(&self, roots: &[Document]) -> Result<BuildReport> {
        self.config.validate()?;

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.threads.unwrap_or(0))
            .build()
            .map_err(|e| Error::Config(format!("cannot start worker pool: {e}")))?;

        let mut seen = HashSet::new();
        let roots: Vec<&Document> = roots.iter().filter(|root| seen.insert(*root)).collect();

        info!(roots = roots.len(), "Building merged artifacts");
        let diagnostics = Diagnostics::new();
        let artifacts = pool.install(|| self.run(&roots, &diagnostics));
        info!(
            artifacts = artifacts.len(),
            diagnostics = diagnostics.len(),
            "Build finished"
        );

        Ok(BuildReport {
            artifacts,
            diagnostics: diagnostics.into_sorted(),
        })
    }

    fn run(&self, roots: &[&Document], diagnostics: &Diagnostics) -> Vec<PathBuf> {
        let trees: Vec<(&Document, Vec<FlattenedEntry>)> = roots
            .par_iter()
            .filter_map(|root| match self.tocs.load(root) {
                Ok(tree) => Some((*root, tree.flatten())),
                Err(e) => {
                    diagnostics.push(
                        Diagnostic::new(DiagnosticKind::TocLoadFailure, e.to_string()).with_root(root),
                    );
                    None
                }
            })
            .collect();
        let jobs = self.claim_artifacts(trees, diagnostics);

        // Every document, with the roots that include it
        let mut owners: BTreeMap<&Document, Vec<&Document>> = BTreeMap::new();
        for job in &jobs {
            for entry in &job.entries {
                let roots = owners.entry(&entry.document).or_default();
                if roots.last() != Some(&job.root) {
                    roots.push(job.root);
                }
            }
        }
        debug!(documents = owners.len(), "Rewriting documents");

        let pages: Pages<'_> = owners
            .par_iter()
            .filter_map(|(document, roots)| {
                self.render_page(document, roots, diagnostics)
                    .map(|page| (*document, page))
            })
            .collect();

        jobs.par_iter()
            .filter_map(|job| self.write_root(job, &pages, diagnostics))
            .collect()
    }

    /// Assign each artifact path to the first root that maps to it.
    fn claim_artifacts<'d>(
        &self,
        trees: Vec<(&'d Document, Vec<FlattenedEntry>)>,
        diagnostics: &Diagnostics,
    ) -> Vec<Job<'d>> {
        let mut claimed: HashMap<PathBuf, &Document> = HashMap::new();
        let mut jobs = Vec::with_capacity(trees.len());

        for (root, entries) in trees {
            let path = artifact_path(&self.documents.output_path(root), &self.config.output_extension);
            match claimed.entry(path.clone()) {
                Entry::Occupied(first) => diagnostics.push(
                    Diagnostic::new(
                        DiagnosticKind::OutputWriteFailure,
                        format!("{} is already written for root {}", path.display(), first.get()),
                    )
                    .with_root(root),
                ),
                Entry::Vacant(slot) => {
                    slot.insert(root);
                    jobs.push(Job { root, path, entries });
                }
            }
        }
        jobs
    }

    /// Read and rewrite one document. `None` means it contributes no output.
    fn render_page(
        &self,
        document: &Document,
        roots: &[&Document],
        diagnostics: &Diagnostics,
    ) -> Option<Arc<str>> {
        let roots = roots
            .iter()
            .map(|root| root.path())
            .collect::<Vec<_>>()
            .join(",");
        let report = |diagnostic: Diagnostic| diagnostics.push(diagnostic.with_root(&roots));

        let markup = match self.markup.read_markup(document) {
            Ok(Some(markup)) => markup,
            Ok(None) => {
                report(
                    Diagnostic::new(
                        DiagnosticKind::MissingRenderedMarkup,
                        "no rendered markup; skipping document and its children",
                    )
                    .with_document(document),
                );
                return None;
            }
            Err(e) => {
                report(
                    Diagnostic::new(
                        DiagnosticKind::MissingRenderedMarkup,
                        format!("cannot read rendered markup: {e}"),
                    )
                    .with_document(document),
                );
                return None;
            }
        };

        let url = self.documents.public_url(document);
        let token = match PageToken::derive(&url) {
            Ok(token) => token,
            Err(e) => {
                report(
                    Diagnostic::new(DiagnosticKind::UrlEncodingFailure, e.to_string())
                        .with_document(document),
                );
                return None;
            }
        };

        let resolver = ProviderResolver(self.documents);
        let ctx = RewriteContext {
            document,
            token: &token,
            resolver: &resolver,
            config: &self.config,
        };

        match rewrite_markup(&markup, &ctx) {
            Ok(rewritten) => {
                debug!(document = %document, token = %token, "Rewrote document");
                rewritten.diagnostics.into_iter().for_each(report);
                Some(Arc::from(rewritten.markup))
            }
            Err(e) => {
                report(
                    Diagnostic::new(DiagnosticKind::MalformedMarkup, e.to_string())
                        .with_document(document),
                );
                None
            }
        }
    }

    fn write_root(&self, job: &Job<'_>, pages: &Pages<'_>, diagnostics: &Diagnostics) -> Option<PathBuf> {
        let Job { root, path, entries } = job;

        let written = self
            .output
            .write_stream(path)
            .and_then(|stream| write_pages(stream, entries, pages));

        match written {
            Ok(count) => {
                info!(root = %root, path = %path.display(), pages = count, "Wrote merged artifact");
                Some(path.clone())
            }
            Err(e) => {
                diagnostics.push(
                    Diagnostic::new(
                        DiagnosticKind::OutputWriteFailure,
                        format!("cannot write {}: {e}", path.display()),
                    )
                    .with_root(root),
                );
                None
            }
        }
    }
}

/// Write pages in traversal order, returning how many were written.
///
/// A document without a page drops its whole subtree. A document listed more
/// than once is written at its first position only.
fn write_pages(
    stream: Box<dyn Write + Send>,
    entries: &[FlattenedEntry],
    pages: &Pages<'_>,
) -> io::Result<usize> {
    let mut writer = BufWriter::new(stream);
    let mut written = HashSet::new();
    let mut i = 0;

    while let Some(entry) = entries.get(i) {
        match pages.get(&entry.document) {
            Some(page) => {
                if written.insert(&entry.document) {
                    writer.write_all(page.as_bytes())?;
                }
                i += 1;
            }
            None => i = entry.subtree_end,
        }
    }

    writer.flush()?;
    Ok(written.len())
}

/// Replace the extension of a root's output path: `guide/toc.json` -> `guide/toc.pdf.html`.
pub fn artifact_path(output: &Path, extension: &str) -> PathBuf {
    let mut path = output.with_extension("").into_os_string();
    path.push(extension);
    PathBuf::from(path)
}
