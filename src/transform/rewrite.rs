//! Per-page id and link rewriting for merged output.
//!
//! Pages rendered independently reuse the same ids (`intro`, `see-also`) and
//! link to each other by path. Once they are concatenated into one stream:
//! - every `id` becomes `token + id`, so ids from different pages cannot clash
//! - relative links and self bookmarks become `#` + target token + fragment
//! - the landmark element's `id` becomes exactly the page token, giving inbound
//!   page links something to land on
//!
//! Rewriting is a single forward pass over element-start events. Only start
//! tags that change are re-serialized; every other byte is copied through as-is.

use std::borrow::Cow;

use percent_encoding::percent_decode_str;
use quick_xml::Reader;
use quick_xml::escape::unescape;
use quick_xml::events::{BytesStart, Event};

use crate::config::BuildConfig;
use crate::diagnostics::{Diagnostic, DiagnosticKind};
use crate::error::{Error, Result};
use crate::model::{Document, LinkReference, PublicUrl, resolve_relative_path, split_url};
use crate::token::PageToken;

/// Maps site paths to the public URL of the document served there.
///
/// Shared read-only across workers during a build.
pub trait LinkResolver: Sync {
    /// Public URL of the document at `site_path` (site-relative, no leading `/`),
    /// or `None` when no document lives there.
    fn resolve_url(&self, site_path: &str) -> Option<PublicUrl>;
}

impl<F> LinkResolver for F
where
    F: Fn(&str) -> Option<PublicUrl> + Sync,
{
    fn resolve_url(&self, site_path: &str) -> Option<PublicUrl> {
        self(site_path)
    }
}

/// Everything needed to rewrite one page.
pub struct RewriteContext<'a> {
    /// The page being rewritten; relative links resolve against its path.
    pub document: &'a Document,
    /// Token derived from this page's own public URL.
    pub token: &'a PageToken,
    pub resolver: &'a dyn LinkResolver,
    pub config: &'a BuildConfig,
}

/// Rewritten markup plus the warnings raised while producing it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rewritten {
    pub markup: String,
    pub diagnostics: Vec<Diagnostic>,
}

/// Elements whose content is raw text and must not be scanned for tags.
const RAW_TEXT_ELEMENTS: &[&[u8]] = &[b"script", b"style", b"textarea", b"title"];

/// Rewrite ids and links in one page.
///
/// Unresolvable links and landmark problems are reported in the returned
/// diagnostics; only markup the scanner cannot read at all is an error.
pub fn rewrite_markup(markup: &str, ctx: &RewriteContext<'_>) -> Result<Rewritten> {
    let mut rewriter = Rewriter {
        ctx,
        landmarks: 0,
        diagnostics: Vec::new(),
    };

    let mut out = String::with_capacity(markup.len() + markup.len() / 8);
    let mut copied = 0usize;
    // Offset of the current scanner's input within `markup`
    let mut base = 0usize;
    let mut reader = scanner(markup);

    loop {
        let event = reader.read_event().map_err(|e| Error::MalformedMarkup {
            position: base as u64 + reader.error_position() as u64,
            message: e.to_string(),
        })?;
        let end = base + reader.buffer_position() as usize;

        match event {
            Event::Start(ref e) | Event::Empty(ref e) => {
                let is_empty = matches!(event, Event::Empty(_));
                if let Some(tag) = rewriter.rewrite_tag(e, is_empty) {
                    let start = tag_start(markup, end, e.len(), is_empty).ok_or_else(|| {
                        Error::MalformedMarkup {
                            position: end as u64,
                            message: "cannot locate start tag".into(),
                        }
                    })?;
                    out.push_str(&markup[copied..start]);
                    out.push_str(&tag);
                    copied = end;
                }

                let name = e.local_name();
                if !is_empty
                    && RAW_TEXT_ELEMENTS
                        .iter()
                        .any(|raw| raw.eq_ignore_ascii_case(name.as_ref()))
                {
                    // Resume scanning at the closing tag
                    base = find_closing_tag(markup, end, name.as_ref()).unwrap_or(markup.len());
                    reader = scanner(&markup[base..]);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }
    out.push_str(&markup[copied..]);

    rewriter.report_landmarks();

    Ok(Rewritten {
        markup: out,
        diagnostics: rewriter.diagnostics,
    })
}

/// Make a raw attribute value safe to write between double quotes.
fn quote(value: &str) -> Cow<'_, str> {
    if value.contains('"') {
        Cow::Owned(value.replace('"', "&quot;"))
    } else {
        Cow::Borrowed(value)
    }
}

/// A lenient scanner: HTML leaves elements unclosed and ampersands bare.
fn scanner(input: &str) -> Reader<&[u8]> {
    let mut reader = Reader::from_str(input);
    let config = reader.config_mut();
    config.check_end_names = false;
    config.allow_unmatched_ends = true;
    config.allow_dangling_amp = true;
    reader
}

/// Offset of the `</name` that closes a raw text element opened before `from`.
fn find_closing_tag(markup: &str, from: usize, name: &[u8]) -> Option<usize> {
    let bytes = markup.as_bytes();
    markup[from..].match_indices("</").map(|(i, _)| from + i).find(|&pos| {
        let name_start = pos + 2;
        let name_end = name_start + name.len();
        bytes
            .get(name_start..name_end)
            .is_some_and(|candidate| candidate.eq_ignore_ascii_case(name))
            && bytes
                .get(name_end)
                .is_none_or(|&b| b == b'>' || b == b'/' || b.is_ascii_whitespace())
    })
}

/// Byte offset of the `<` opening a start tag that ends at `end`.
///
/// `content_len` is the length between `<` and `>` (`/>` for empty elements).
fn tag_start(markup: &str, end: usize, content_len: usize, is_empty: bool) -> Option<usize> {
    let delimiters = if is_empty { 3 } else { 2 };
    let start = end.checked_sub(content_len + delimiters)?;
    (markup.as_bytes().get(start) == Some(&b'<') && markup.is_char_boundary(start))
        .then_some(start)
}

struct Rewriter<'a, 'c> {
    ctx: &'a RewriteContext<'c>,
    landmarks: usize,
    diagnostics: Vec<Diagnostic>,
}

/// An attribute as it will be written back out.
struct OutAttr<'x> {
    key: Cow<'x, [u8]>,
    /// Already escaped for a double-quoted attribute value.
    ///
    /// Rewritten values are the token spliced onto the raw (still escaped)
    /// source value; base64 tokens never need escaping themselves.
    value: Cow<'x, str>,
}

impl Rewriter<'_, '_> {
    /// Re-serialize a start tag if any of its attributes change.
    fn rewrite_tag(&mut self, e: &BytesStart<'_>, is_empty: bool) -> Option<String> {
        let config = self.ctx.config;
        let is_landmark = e
            .local_name()
            .as_ref()
            .eq_ignore_ascii_case(config.landmark.as_bytes())
            && {
                self.landmarks += 1;
                self.landmarks == 1
            };

        let mut changed = is_landmark;
        let mut attrs: Vec<OutAttr<'_>> = Vec::new();

        for attr in e.html_attributes().with_checks(false) {
            // Leave tags with unreadable attributes alone
            let Ok(attr) = attr else {
                return None;
            };
            let key = attr.key.as_ref();
            let raw = String::from_utf8_lossy(&attr.value).into_owned();

            if key.eq_ignore_ascii_case(config.id_attribute.as_bytes()) {
                if is_landmark {
                    continue;
                }
                attrs.push(OutAttr {
                    key: Cow::Owned(key.to_vec()),
                    value: Cow::Owned(quote(&self.ctx.token.prefix(&raw)).into_owned()),
                });
                changed = true;
                continue;
            }

            if config.is_link_attribute(key) {
                if let Some(rewritten) = self.rewrite_link(&raw) {
                    attrs.push(OutAttr {
                        key: Cow::Owned(key.to_vec()),
                        value: Cow::Owned(quote(&rewritten).into_owned()),
                    });
                    changed = true;
                    continue;
                }
            }

            attrs.push(OutAttr {
                key: Cow::Owned(key.to_vec()),
                value: Cow::Owned(quote(&raw).into_owned()),
            });
        }

        if !changed {
            return None;
        }

        if is_landmark {
            attrs.push(OutAttr {
                key: Cow::Borrowed(config.id_attribute.as_bytes()),
                value: Cow::Borrowed(self.ctx.token.as_str()),
            });
        }

        let name = e.name();
        let mut tag = String::with_capacity(e.len() + 32);
        tag.push('<');
        tag.push_str(&String::from_utf8_lossy(name.as_ref()));
        for attr in &attrs {
            tag.push(' ');
            tag.push_str(&String::from_utf8_lossy(&attr.key));
            tag.push_str("=\"");
            tag.push_str(&attr.value);
            tag.push('"');
        }
        tag.push_str(if is_empty { "/>" } else { ">" });
        Some(tag)
    }

    /// Turn a relative link or self bookmark into `#` + target token + fragment.
    ///
    /// `link` is the attribute value as written in the source; the fragment is
    /// carried over without unescaping.
    fn rewrite_link(&mut self, link: &str) -> Option<String> {
        let kind = LinkReference::classify(link);
        if !kind.is_rewritable() {
            return None;
        }

        let split = split_url(link.trim());
        let fragment = split.fragment.strip_prefix('#').unwrap_or("");

        let target = match kind {
            LinkReference::SelfBookmark => self.ctx.token.clone(),
            _ => self.resolve_target(link, split.path)?,
        };

        let mut rewritten = String::with_capacity(1 + target.as_str().len() + fragment.len());
        rewritten.push('#');
        rewritten.push_str(target.as_str());
        rewritten.push_str(fragment);
        Some(rewritten)
    }

    fn resolve_target(&mut self, link: &str, path: &str) -> Option<PageToken> {
        let document = self.ctx.document;
        let path = unescape(path).unwrap_or(Cow::Borrowed(path));
        let decoded = percent_decode_str(&path).decode_utf8_lossy();
        let site_path = resolve_relative_path(document.path(), &decoded);

        let Some(url) = self.ctx.resolver.resolve_url(&site_path) else {
            self.diagnostics.push(
                Diagnostic::new(
                    DiagnosticKind::UnresolvableLink,
                    format!("link target '{site_path}' is not a known document"),
                )
                .with_document(document)
                .with_link(link),
            );
            return None;
        };

        match PageToken::derive(&url) {
            Ok(token) => Some(token),
            Err(e) => {
                self.diagnostics.push(
                    Diagnostic::new(DiagnosticKind::UnresolvableLink, e.to_string())
                        .with_document(document)
                        .with_link(link),
                );
                None
            }
        }
    }

    fn report_landmarks(&mut self) {
        let landmark = &self.ctx.config.landmark;
        let message = match self.landmarks {
            1 => return,
            0 => format!("no <{landmark}> element; links into this page will not resolve"),
            n => format!("<{landmark}> appears {n} times; using the first"),
        };
        self.diagnostics.push(
            Diagnostic::new(DiagnosticKind::MissingOrDuplicateLandmark, message)
                .with_document(self.ctx.document),
        );
    }
}
