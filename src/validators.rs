//! Input validation and normalization for appblock
//!
//! Application names end up inside firewall rule names, so they are checked
//! here before any rule is built.

use crate::core::error::{Error, Result};
use crate::core::glob::GlobPattern;
use crate::core::naming::{MAX_BASE_LEN, SEPARATOR};
use tracing::warn;

/// Longest accepted application name
pub const MAX_APPLICATION_NAME_LEN: usize = 200;

/// Validates an application name and returns it trimmed.
///
/// Names containing the `" - "` separator are accepted but cannot be told
/// apart from the file-name part later, so a warning is logged.
///
/// # Examples
///
/// ```
/// use appblock::validators::validate_application_name;
///
/// assert_eq!(validate_application_name("  Steam ").unwrap(), "Steam");
/// assert!(validate_application_name("").is_err());
/// assert!(validate_application_name("Bad\nName").is_err());
/// ```
pub fn validate_application_name(input: &str) -> Result<String> {
    let name = input.trim();

    if name.is_empty() {
        return Err(Error::validation("name", "Application name cannot be empty"));
    }

    if name.chars().count() > MAX_APPLICATION_NAME_LEN {
        return Err(Error::validation(
            "name",
            format!("Application name too long (max {MAX_APPLICATION_NAME_LEN} characters)"),
        ));
    }

    if name.chars().any(char::is_control) {
        return Err(Error::validation(
            "name",
            "Application name contains control characters",
        ));
    }

    if name.contains(SEPARATOR) {
        warn!(
            "Application name '{name}' contains '{SEPARATOR}'; its rules will be listed under '{}'",
            name.split(SEPARATOR).next().unwrap_or(name)
        );
    }

    Ok(name.to_string())
}

/// Validates a file-name glob such as `*.exe`.
///
/// # Errors
///
/// Returns `Err` if the pattern is empty, contains a path separator, or has
/// an unterminated character class.
pub fn validate_extension_glob(pattern: &str) -> Result<()> {
    if pattern.is_empty() {
        return Err(Error::validation("extension", "Pattern cannot be empty"));
    }

    if pattern.contains(['/', '\\']) {
        return Err(Error::validation(
            "extension",
            format!("Pattern '{pattern}' must match file names, not paths"),
        ));
    }

    GlobPattern::new(pattern).map(|_| ())
}

/// Validates a rule prefix taken from the configuration.
///
/// The prefix is the only ownership marker, so it must be non-blank. It must
/// also leave room for a maximum-length application name and the separator
/// inside the truncation cap, or the application could not be recovered from
/// truncated names.
///
/// # Examples
///
/// ```
/// use appblock::validators::validate_rule_prefix;
///
/// assert!(validate_rule_prefix("AppBlocker Rule -").is_ok());
/// assert!(validate_rule_prefix("   ").is_err());
/// ```
pub fn validate_rule_prefix(prefix: &str) -> Result<()> {
    if prefix.trim().is_empty() {
        return Err(Error::validation(
            "rule_prefix",
            "Rule prefix cannot be empty; it would match every firewall rule",
        ));
    }

    let max_prefix_len = MAX_BASE_LEN - MAX_APPLICATION_NAME_LEN - SEPARATOR.len();
    if prefix.chars().count() > max_prefix_len {
        return Err(Error::validation(
            "rule_prefix",
            format!("Rule prefix too long (max {max_prefix_len} characters)"),
        ));
    }

    Ok(())
}

/// Trims every entry and drops the empty ones, keeping order and duplicates.
pub fn normalize_list(items: Vec<String>) -> Vec<String> {
    items
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
