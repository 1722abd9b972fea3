//! End-to-end merges of a rendered site on disk.

use std::fs;
use std::path::{Path, PathBuf};

use quire::{
    BuildConfig, DiagnosticKind, Document, DocumentProvider, FsOutput, PageToken, PdfBuilder, Site,
};
use tempfile::TempDir;

const BASE_URL: &str = "https://docs.example.com/";

struct Fixture {
    site_dir: TempDir,
    out_dir: TempDir,
}

impl Fixture {
    fn new() -> Self {
        Self {
            site_dir: TempDir::new().unwrap(),
            out_dir: TempDir::new().unwrap(),
        }
    }

    fn page(&self, path: &str, body: &str) -> &Self {
        self.file(path, &format!("<html><body><main>{body}</main></body></html>"))
    }

    fn file(&self, path: &str, contents: &str) -> &Self {
        let full = self.site_dir.path().join(path);
        fs::create_dir_all(full.parent().unwrap()).unwrap();
        fs::write(full, contents).unwrap();
        self
    }

    fn site(&self) -> Site {
        Site::new(self.site_dir.path(), BASE_URL)
    }

    fn build(&self, roots: &[&str]) -> quire::BuildReport {
        self.build_with(roots, BuildConfig::default())
    }

    fn build_with(&self, roots: &[&str], config: BuildConfig) -> quire::BuildReport {
        let site = self.site();
        let output = FsOutput::new(self.out_dir.path());
        let roots: Vec<Document> = roots.iter().map(|r| Document::new(*r)).collect();
        PdfBuilder::new(&site, &site, &site, &output)
            .with_config(config)
            .build_artifacts(&roots)
            .unwrap()
    }

    fn artifact(&self, path: &str) -> String {
        fs::read_to_string(self.out_dir.path().join(path)).unwrap()
    }

    fn token(&self, path: &str) -> String {
        PageToken::derive(&self.site().public_url(&Document::new(path)))
            .unwrap()
            .to_string()
    }
}

/// A TOC `guide/index.html -> [guide/b.html, guide/c.html]`.
fn guide_site() -> Fixture {
    let fx = Fixture::new();
    fx.file(
        "guide/toc.json",
        r#"{ "href": "index.html", "items": [{ "href": "b.html" }, { "href": "c.html" }] }"#,
    )
    .page("guide/index.html", r#"<h1 id="welcome">Guide</h1>"#)
    .page(
        "guide/b.html",
        r##"<h2 id="usage">Usage</h2><a href="#usage">here</a> <a href="c.html#sec1">C</a>"##,
    )
    .page("guide/c.html", r#"<h2 id="sec1">C</h2>"#);
    fx
}

#[test]
fn test_merges_pages_in_toc_order() {
    let fx = guide_site();
    let report = fx.build(&["guide/toc.json"]);

    assert!(report.diagnostics.is_empty(), "{:?}", report.diagnostics);
    assert_eq!(report.artifacts, vec![PathBuf::from("guide/toc.pdf.html")]);

    let (ta, tb, tc) = (
        fx.token("guide/index.html"),
        fx.token("guide/b.html"),
        fx.token("guide/c.html"),
    );
    let merged = fx.artifact("guide/toc.pdf.html");
    assert_eq!(
        merged,
        format!(
            "<html><body><main id=\"{ta}\"><h1 id=\"{ta}welcome\">Guide</h1></main></body></html>\
             <html><body><main id=\"{tb}\"><h2 id=\"{tb}usage\">Usage</h2>\
             <a href=\"#{tb}usage\">here</a> <a href=\"#{tc}sec1\">C</a></main></body></html>\
             <html><body><main id=\"{tc}\"><h2 id=\"{tc}sec1\">C</h2></main></body></html>"
        )
    );
}

#[test]
fn test_token_is_base64_of_public_url() {
    let fx = guide_site();
    assert_eq!(
        fx.token("guide/c.html"),
        "aHR0cHM6Ly9kb2NzLmV4YW1wbGUuY29tL2d1aWRlL2MuaHRtbA=="
    );
}

#[test]
fn test_every_link_target_exists_in_stream() {
    let fx = guide_site();
    fx.build(&["guide/toc.json"]);
    let merged = fx.artifact("guide/toc.pdf.html");

    for href in merged.split("href=\"#").skip(1) {
        let target = &href[..href.find('"').unwrap()];
        assert!(
            merged.contains(&format!("id=\"{target}\"")),
            "dangling link #{target}"
        );
    }
}

#[test]
fn test_rebuild_is_byte_identical() {
    let fx = guide_site();
    fx.build(&["guide/toc.json"]);
    let first = fx.artifact("guide/toc.pdf.html");
    fx.build(&["guide/toc.json"]);
    assert_eq!(fx.artifact("guide/toc.pdf.html"), first);
}

#[test]
fn test_missing_page_skips_its_subtree() {
    let fx = Fixture::new();
    fx.file(
        "toc.json",
        r#"{
            "href": "a.html",
            "items": [
                { "href": "missing.html", "items": [{ "href": "child.html" }] },
                { "href": "c.html" }
            ]
        }"#,
    )
    .page("a.html", "A")
    .page("child.html", "CHILD")
    .page("c.html", "C");

    let report = fx.build(&["toc.json"]);
    let missing: Vec<_> = report.of_kind(DiagnosticKind::MissingRenderedMarkup).collect();
    assert_eq!(missing.len(), 1);
    assert_eq!(missing[0].document.as_deref(), Some("missing.html"));
    assert!(!report.has_errors());

    let merged = fx.artifact("toc.pdf.html");
    assert!(merged.contains(">A</main>"));
    assert!(!merged.contains("CHILD"));
    assert!(merged.contains(">C</main>"));
}

#[test]
fn test_multiple_roots_share_pages() {
    let fx = guide_site();
    fx.file("all.json", r#"[{ "href": "guide/c.html" }, { "href": "guide/" }]"#);

    let report = fx.build(&["guide/toc.json", "all.json"]);
    assert_eq!(
        report.artifacts.iter().map(PathBuf::as_path).collect::<Vec<_>>(),
        vec![Path::new("guide/toc.pdf.html"), Path::new("all.pdf.html")]
    );

    let tc = fx.token("guide/c.html");
    let ta = fx.token("guide/index.html");
    let all = fx.artifact("all.pdf.html");
    let c_at = all.find(&format!("<main id=\"{tc}\">")).unwrap();
    let index_at = all.find(&format!("<main id=\"{ta}\">")).unwrap();
    assert!(c_at < index_at);

    // Rewritten once, so identical in both artifacts
    let guide = fx.artifact("guide/toc.pdf.html");
    let c_page = format!("<main id=\"{tc}\"><h2 id=\"{tc}sec1\">C</h2></main>");
    assert!(guide.contains(&c_page));
    assert!(all.contains(&c_page));
}

#[test]
fn test_external_and_unknown_links_left_alone() {
    let fx = Fixture::new();
    fx.file("toc.json", r#"{ "href": "a.html" }"#).page(
        "a.html",
        r#"<a href="https://example.com/x">web</a><a href="nowhere.html#top">gone</a>"#,
    );

    let report = fx.build(&["toc.json"]);
    let merged = fx.artifact("toc.pdf.html");
    assert!(merged.contains(r#"<a href="https://example.com/x">web</a>"#));
    assert!(merged.contains(r#"<a href="nowhere.html#top">gone</a>"#));

    let unresolved: Vec<_> = report.of_kind(DiagnosticKind::UnresolvableLink).collect();
    assert_eq!(unresolved.len(), 1);
    assert_eq!(unresolved[0].link.as_deref(), Some("nowhere.html#top"));
}

#[test]
fn test_bad_toc_does_not_stop_other_roots() {
    let fx = guide_site();
    fx.file("broken.json", "{ \"href\": ");

    let report = fx.build(&["broken.json", "guide/toc.json"]);
    assert!(report.has_errors());
    assert_eq!(report.of_kind(DiagnosticKind::TocLoadFailure).count(), 1);
    assert_eq!(report.artifacts, vec![PathBuf::from("guide/toc.pdf.html")]);
}

#[test]
fn test_custom_landmark_and_extension() {
    let fx = Fixture::new();
    fx.file("toc.json", r#"{ "href": "a.html" }"#)
        .file("a.html", "<article><p id=\"p\">A</p></article>");

    let config = BuildConfig::new()
        .with_landmark("article")
        .with_output_extension(".print.html")
        .with_threads(2);
    let report = fx.build_with(&["toc.json"], config);
    assert!(report.diagnostics.is_empty(), "{:?}", report.diagnostics);

    let ta = fx.token("a.html");
    assert_eq!(
        fx.artifact("toc.print.html"),
        format!("<article id=\"{ta}\"><p id=\"{ta}p\">A</p></article>")
    );
}
