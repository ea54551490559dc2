//! The application whose executables are being blocked

use crate::core::error::{Error, Result};
use crate::validators::{normalize_list, validate_application_name, validate_extension_glob};
use std::path::PathBuf;

/// Immutable description of one blocking run.
///
/// Built from user input each invocation and never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Application {
    pub name: String,
    pub root_path: PathBuf,
    /// Glob patterns in the order given; duplicates are kept
    pub extensions: Vec<String>,
    pub excluded_keywords: Vec<String>,
    pub excluded_files: Vec<String>,
}

impl Application {
    /// Validates and normalizes user input.
    ///
    /// # Errors
    ///
    /// Returns `Error::Validation` if the name is unusable, no extension is
    /// given, or an extension glob is malformed.
    pub fn new(
        name: &str,
        root_path: impl Into<PathBuf>,
        extensions: Vec<String>,
        excluded_keywords: Vec<String>,
        excluded_files: Vec<String>,
    ) -> Result<Self> {
        let name = validate_application_name(name)?;

        let extensions = normalize_list(extensions);
        if extensions.is_empty() {
            return Err(Error::validation(
                "extensions",
                "at least one file pattern is required",
            ));
        }
        for ext in &extensions {
            validate_extension_glob(ext)?;
        }

        Ok(Self {
            name,
            root_path: root_path.into(),
            extensions,
            excluded_keywords: normalize_list(excluded_keywords),
            excluded_files: normalize_list(excluded_files),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_normalizes_lists() {
        let app = Application::new(
            " MyApp ",
            "/opt/myapp",
            vec!["*.exe".into(), " ".into(), "*.exe".into()],
            vec![" update ".into(), String::new()],
            vec!["helper.exe".into()],
        )
        .unwrap();

        assert_eq!(app.name, "MyApp");
        // Duplicate globs survive
        assert_eq!(app.extensions, vec!["*.exe", "*.exe"]);
        assert_eq!(app.excluded_keywords, vec!["update"]);
        assert_eq!(app.excluded_files, vec!["helper.exe"]);
    }

    #[test]
    fn test_new_requires_extension() {
        let err = Application::new("MyApp", "/opt", vec![], vec![], vec![]).unwrap_err();
        assert!(matches!(err, Error::Validation { ref field, .. } if field == "extensions"));
    }

    #[test]
    fn test_new_rejects_empty_name() {
        let err =
            Application::new("   ", "/opt", vec!["*.exe".into()], vec![], vec![]).unwrap_err();
        assert!(matches!(err, Error::Validation { ref field, .. } if field == "name"));
    }
}
