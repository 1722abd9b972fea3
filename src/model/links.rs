//! Link classification for markup attribute values.
//!
//! Rendered pages reference each other in a handful of ways:
//! - **Relative paths**: `../guide/setup.html#install`
//! - **Self bookmarks**: `#install` (same document)
//! - **Absolute paths**: `/en-us/guide/setup` (site-rooted, not rewritten)
//! - **External URLs**: `https://example.com`, `mailto:me@example.com`
//!
//! Only relative paths and self bookmarks can be turned into same-stream anchors
//! once pages are merged; everything else passes through untouched.

/// Classification of an attribute value that may denote a navigable target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkReference {
    /// Path relative to the current document (`setup.html`, `../a/b.html#x`).
    RelativePath,
    /// Fragment-only link (`#section`).
    SelfBookmark,
    /// Site-rooted path (`/guide/setup.html`, `\guide`).
    Absolute,
    /// Anything with a scheme or protocol-relative prefix (`https:`, `mailto:`, `//cdn`).
    External,
    /// Empty or otherwise unclassifiable values.
    Unknown,
}

impl LinkReference {
    /// Classify a raw attribute value.
    pub fn classify(value: &str) -> LinkReference {
        let value = value.trim();

        if value.is_empty() {
            return LinkReference::Unknown;
        }

        if value.starts_with('#') {
            return LinkReference::SelfBookmark;
        }

        if value.starts_with("//") || value.starts_with("\\\\") || has_scheme(value) {
            return LinkReference::External;
        }

        if value.starts_with('/') || value.starts_with('\\') {
            return LinkReference::Absolute;
        }

        // `C:\docs` style paths are neither URLs nor site paths
        if value.as_bytes().get(1) == Some(&b':') {
            return LinkReference::Unknown;
        }

        LinkReference::RelativePath
    }

    /// Whether values of this kind are rewritten into merged anchors.
    pub fn is_rewritable(self) -> bool {
        matches!(self, LinkReference::RelativePath | LinkReference::SelfBookmark)
    }
}

/// Check for an RFC 3986 scheme (`alpha *( alpha / digit / "+" / "-" / "." ) ":"`).
///
/// Single-letter schemes are rejected so drive letters are not mistaken for URLs.
fn has_scheme(value: &str) -> bool {
    let Some(colon) = value.find(':') else {
        return false;
    };
    let scheme = &value[..colon];
    let mut chars = scheme.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() => {}
        _ => return false,
    }
    scheme.len() > 1
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

/// A URL split into its path, query and fragment components.
///
/// `query` keeps its leading `?` and `fragment` its leading `#`; both are empty
/// when absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitUrl<'a> {
    pub path: &'a str,
    pub query: &'a str,
    pub fragment: &'a str,
}

/// Split a URL into `(path, query, fragment)`.
pub fn split_url(url: &str) -> SplitUrl<'_> {
    let (rest, fragment) = match url.find('#') {
        Some(pos) => (&url[..pos], &url[pos..]),
        None => (url, ""),
    };
    let (path, query) = match rest.find('?') {
        Some(pos) => (&rest[..pos], &rest[pos..]),
        None => (rest, ""),
    };
    SplitUrl {
        path,
        query,
        fragment,
    }
}

/// Resolve a relative path against the path of the document containing it.
///
/// Follows URL reference resolution: an empty relative path refers to the base
/// document itself, otherwise the path is joined to the base's directory and
/// `.`/`..` segments are collapsed. `..` never climbs above the site root.
///
/// e.g. `resolve_relative_path("guide/a/intro.html", "../setup.html")` -> `"guide/setup.html"`
pub fn resolve_relative_path(base: &str, relative: &str) -> String {
    if relative.is_empty() {
        return base.to_string();
    }

    let mut parts: Vec<&str> = base.split('/').filter(|s| !s.is_empty()).collect();
    // Drop the file name, keep the directory
    if !base.ends_with('/') {
        parts.pop();
    }

    let segments: Vec<&str> = relative.split('/').collect();
    let last = segments.len() - 1;
    let mut trailing_dir = false;
    for (i, segment) in segments.into_iter().enumerate() {
        match segment {
            ".." => {
                parts.pop();
                trailing_dir = i == last;
            }
            "." | "" => trailing_dir = i == last,
            s => parts.push(s),
        }
    }

    let mut resolved = parts.join("/");
    if trailing_dir && !resolved.is_empty() {
        resolved.push('/');
    }
    resolved
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_relative() {
        assert_eq!(LinkReference::classify("setup.html"), LinkReference::RelativePath);
        assert_eq!(LinkReference::classify("../a/b.html#x"), LinkReference::RelativePath);
        assert_eq!(LinkReference::classify("./b"), LinkReference::RelativePath);
        assert_eq!(LinkReference::classify("?tabs=cli"), LinkReference::RelativePath);
    }

    #[test]
    fn test_classify_bookmark() {
        assert_eq!(LinkReference::classify("#sec1"), LinkReference::SelfBookmark);
        assert_eq!(LinkReference::classify("#"), LinkReference::SelfBookmark);
    }

    #[test]
    fn test_classify_external_and_absolute() {
        assert_eq!(LinkReference::classify("https://example.com"), LinkReference::External);
        assert_eq!(LinkReference::classify("mailto:a@b.c"), LinkReference::External);
        assert_eq!(LinkReference::classify("//cdn.example.com/x.js"), LinkReference::External);
        assert_eq!(LinkReference::classify("javascript:void(0)"), LinkReference::External);
        assert_eq!(LinkReference::classify("/guide/setup"), LinkReference::Absolute);
        assert_eq!(LinkReference::classify("\\guide"), LinkReference::Absolute);
    }

    #[test]
    fn test_classify_unknown() {
        assert_eq!(LinkReference::classify(""), LinkReference::Unknown);
        assert_eq!(LinkReference::classify("   "), LinkReference::Unknown);
        assert_eq!(LinkReference::classify("C:\\docs\\a.html"), LinkReference::Unknown);
    }

    #[test]
    fn test_is_rewritable() {
        assert!(LinkReference::RelativePath.is_rewritable());
        assert!(LinkReference::SelfBookmark.is_rewritable());
        assert!(!LinkReference::External.is_rewritable());
        assert!(!LinkReference::Absolute.is_rewritable());
        assert!(!LinkReference::Unknown.is_rewritable());
    }

    #[test]
    fn test_split_url() {
        let split = split_url("a/b.html?x=1#frag");
        assert_eq!(split.path, "a/b.html");
        assert_eq!(split.query, "?x=1");
        assert_eq!(split.fragment, "#frag");

        let split = split_url("#only");
        assert_eq!(split.path, "");
        assert_eq!(split.query, "");
        assert_eq!(split.fragment, "#only");

        // `?` after `#` belongs to the fragment
        let split = split_url("b.html#x?y");
        assert_eq!(split.path, "b.html");
        assert_eq!(split.query, "");
        assert_eq!(split.fragment, "#x?y");
    }

    #[test]
    fn test_resolve_relative_path() {
        assert_eq!(resolve_relative_path("guide/a/intro.html", "setup.html"), "guide/a/setup.html");
        assert_eq!(resolve_relative_path("guide/a/intro.html", "../setup.html"), "guide/setup.html");
        assert_eq!(resolve_relative_path("guide/a/intro.html", "./x/y.html"), "guide/a/x/y.html");
        assert_eq!(resolve_relative_path("index.html", "guide/intro.html"), "guide/intro.html");
    }

    #[test]
    fn test_resolve_empty_is_base() {
        assert_eq!(resolve_relative_path("guide/intro.html", ""), "guide/intro.html");
    }

    #[test]
    fn test_resolve_clamps_at_root() {
        assert_eq!(resolve_relative_path("a.html", "../../b.html"), "b.html");
    }

    #[test]
    fn test_resolve_directory_reference() {
        assert_eq!(resolve_relative_path("guide/intro.html", "../"), "");
        assert_eq!(resolve_relative_path("guide/a/intro.html", "../"), "guide/");
        assert_eq!(resolve_relative_path("guide/intro.html", "sub/"), "guide/sub/");
        assert_eq!(resolve_relative_path("guide/intro.html", "."), "guide/");
    }
}
