//! Page tokens: namespace-unique prefixes derived from public URLs.
//!
//! A token is the standard base64 encoding of the URL's UTF-8 bytes. The
//! encoding is reversible, so distinct URLs can never share a token, and the
//! same URL always yields the same token no matter which page computes it.

use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::error::{Error, Result};
use crate::model::PublicUrl;

/// Token identifying one page inside a merged stream.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PageToken(String);

impl PageToken {
    /// Derive the token for a public URL.
    ///
    /// Fails for URLs that have no byte representation to encode: empty URLs
    /// and URLs containing control characters.
    pub fn derive(url: &PublicUrl) -> Result<PageToken> {
        let raw = url.as_str();
        if raw.is_empty() || raw.chars().any(char::is_control) {
            return Err(Error::UrlEncoding(raw.to_string()));
        }
        Ok(PageToken(STANDARD.encode(raw.as_bytes())))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Prefix an element id with this token.
    pub fn prefix(&self, id: &str) -> String {
        let mut prefixed = String::with_capacity(self.0.len() + id.len());
        prefixed.push_str(&self.0);
        prefixed.push_str(id);
        prefixed
    }

    /// Recover the original id from one produced by [`prefix`](Self::prefix).
    pub fn strip<'a>(&self, id: &'a str) -> Option<&'a str> {
        id.strip_prefix(self.0.as_str())
    }

    /// Decode the token back into the URL it was derived from.
    pub fn decode(&self) -> Option<String> {
        let bytes = STANDARD.decode(&self.0).ok()?;
        String::from_utf8(bytes).ok()
    }
}

impl fmt::Display for PageToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
