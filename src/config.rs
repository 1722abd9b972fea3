//! Build configuration.

use std::path::Path;

use serde::Deserialize;

use crate::error::{Error, Result};

/// Configuration for merging a TOC into a printable stream.
///
/// Loaded from JSON; every field is optional.
///
/// ```json
/// { "landmark": "article", "link_attributes": ["href"], "threads": 4 }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BuildConfig {
    /// Element whose `id` becomes the page token (the inbound anchor target).
    pub landmark: String,
    /// Attributes whose values are treated as links.
    pub link_attributes: Vec<String>,
    /// Attribute holding element identifiers.
    pub id_attribute: String,
    /// Extension replacing the root's own extension in the artifact name.
    pub output_extension: String,
    /// Worker threads; `None` uses one per CPU.
    pub threads: Option<usize>,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            landmark: "main".to_string(),
            link_attributes: vec!["href".to_string()],
            id_attribute: "id".to_string(),
            output_extension: ".pdf.html".to_string(),
            threads: None,
        }
    }
}

impl BuildConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a JSON configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let bytes = std::fs::read(path.as_ref())?;
        let config: BuildConfig = serde_json::from_slice(&bytes)?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_landmark(mut self, landmark: impl Into<String>) -> Self {
        self.landmark = landmark.into();
        self
    }

    pub fn with_link_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.link_attributes.push(attribute.into());
        self
    }

    pub fn with_output_extension(mut self, extension: impl Into<String>) -> Self {
        self.output_extension = extension.into();
        self
    }

    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = Some(threads);
        self
    }

    /// Reject values the builder cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.landmark.trim().is_empty() {
            return Err(Error::Config("landmark must not be empty".into()));
        }
        if self.id_attribute.trim().is_empty() {
            return Err(Error::Config("id_attribute must not be empty".into()));
        }
        if !self.output_extension.starts_with('.') {
            return Err(Error::Config(format!(
                "output_extension must start with '.': {:?}",
                self.output_extension
            )));
        }
        if self.threads == Some(0) {
            return Err(Error::Config("threads must be at least 1".into()));
        }
        Ok(())
    }

    /// Whether `name` is one of the configured link attributes (ASCII case-insensitive).
    pub(crate) fn is_link_attribute(&self, name: &[u8]) -> bool {
        self.link_attributes
            .iter()
            .any(|attr| attr.as_bytes().eq_ignore_ascii_case(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = BuildConfig::default();
        assert_eq!(config.landmark, "main");
        assert_eq!(config.link_attributes, vec!["href"]);
        assert_eq!(config.output_extension, ".pdf.html");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_file_partial() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "landmark": "article", "threads": 2 }}"#).unwrap();

        let config = BuildConfig::from_file(file.path()).unwrap();
        assert_eq!(config.landmark, "article");
        assert_eq!(config.threads, Some(2));
        assert_eq!(config.id_attribute, "id");
    }

    #[test]
    fn test_from_file_rejects_unknown_fields() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "landmarks": "article" }}"#).unwrap();
        assert!(matches!(BuildConfig::from_file(file.path()), Err(Error::Json(_))));
    }

    #[test]
    fn test_validate() {
        assert!(BuildConfig::new().with_threads(0).validate().is_err());
        assert!(BuildConfig::new().with_output_extension("pdf").validate().is_err());
        assert!(BuildConfig::new().with_landmark(" ").validate().is_err());
    }

    #[test]
    fn test_is_link_attribute() {
        let config = BuildConfig::new().with_link_attribute("data-target");
        assert!(config.is_link_attribute(b"HREF"));
        assert!(config.is_link_attribute(b"data-target"));
        assert!(!config.is_link_attribute(b"src"));
    }
}
