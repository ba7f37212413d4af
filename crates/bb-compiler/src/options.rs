use serde::{Deserialize, Serialize};

/// Switches that change how unmatched markup and attributes are rendered.
///
/// All switches are off by default. In toml form keys are kebab-case:
///
/// ```toml
/// auto-close-unterminated-tags = true
/// ignore-unmatched-closing-tags = false
/// sort-output-attributes = true
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "kebab-case")]
pub struct CompilerOptions {
    /// Render opening tags that are never closed as if they were closed at
    /// the end of their parent.
    ///
    /// Otherwise they are kept as literal text.
    pub auto_close_unterminated_tags: bool,

    /// Drop closing tags that have no opening partner instead of keeping them
    /// as literal text.
    pub ignore_unmatched_closing_tags: bool,

    /// Emit attributes sorted by name, making output byte-for-byte stable.
    pub sort_output_attributes: bool,
}

impl CompilerOptions {
    /// Load options from a toml document.
    ///
    /// # Errors
    ///
    /// When the document is not valid toml, has unknown keys or values of the
    /// wrong type.
    pub fn from_toml_str(data: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(data)?)
    }
}

/// Failed to load [CompilerOptions].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid compiler config: {0}")]
    Invalid(#[from] toml::de::Error),
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::{CompilerOptions, ConfigError};

    #[test]
    fn empty_document_is_default() {
        assert_eq!(
            CompilerOptions::from_toml_str("").unwrap(),
            CompilerOptions::default()
        );
    }

    #[test]
    fn partial_document() {
        let options = CompilerOptions::from_toml_str("sort-output-attributes = true").unwrap();
        assert_eq!(
            options,
            CompilerOptions {
                sort_output_attributes: true,
                ..Default::default()
            }
        );
    }

    #[test]
    fn unknown_key_is_rejected() {
        let err = CompilerOptions::from_toml_str("auto-close = true").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(..)));
        assert!(err.to_string().starts_with("invalid compiler config"));
    }

    #[test]
    fn wrong_type_is_rejected() {
        assert!(CompilerOptions::from_toml_str("sort-output-attributes = 1").is_err());
    }
}
