//! Rule display-name convention
//!
//! Rule ownership is recorded only in the display name:
//!
//! ```text
//! <prefix><application> - <file name> (Inbound|Outbound)
//! ```
//!
//! The `<prefix><application> - <file name>` part is capped at
//! [`MAX_BASE_LEN`] characters plus [`ELLIPSIS`]. [`RuleNamer`] owns both the
//! encoding and its inverse so the management path never re-implements it.
//!
//! # Example
//!
//! ```
//! use appblock::core::naming::RuleNamer;
//! use appblock::core::store::Direction;
//!
//! let namer = RuleNamer::default();
//! let name = namer.name("MyApp", "tool.exe", Direction::Inbound);
//! assert_eq!(name, "AppBlocker Rule -MyApp - tool.exe (Inbound)");
//! assert_eq!(namer.application_of(&name), Some("MyApp"));
//! ```

use crate::core::store::Direction;

/// Marks every rule created by appblock
pub const RULE_PREFIX: &str = "AppBlocker Rule -";

/// Separator between application name and file name
pub const SEPARATOR: &str = " - ";

/// Maximum characters kept of the base name before [`ELLIPSIS`] is appended
pub const MAX_BASE_LEN: usize = 220;

/// Appended to truncated base names
pub const ELLIPSIS: &str = "...";

/// Builds and parses rule display names
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleNamer {
    prefix: String,
}

impl Default for RuleNamer {
    fn default() -> Self {
        Self::new(RULE_PREFIX)
    }
}

impl RuleNamer {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// `<prefix><application> - <file name>`, truncated to the length cap.
    pub fn base_name(&self, application: &str, file_name: &str) -> String {
        let base = format!("{}{application}{SEPARATOR}{file_name}", self.prefix);

        // Cap counts characters, not bytes
        match base.char_indices().nth(MAX_BASE_LEN) {
            Some((cut, _)) => format!("{}{ELLIPSIS}", &base[..cut]),
            None => base,
        }
    }

    /// Full display name for one direction.
    pub fn name(&self, application: &str, file_name: &str, direction: Direction) -> String {
        format!("{} ({direction})", self.base_name(application, file_name))
    }

    /// Recovers the application name from a display name.
    ///
    /// Returns the shortest non-empty run after the prefix that is followed
    /// by [`SEPARATOR`]. An application name that itself contains `" - "` is
    /// therefore recovered only up to its first separator.
    pub fn application_of<'a>(&self, display_name: &'a str) -> Option<&'a str> {
        let rest = display_name.strip_prefix(self.prefix.as_str())?;

        // Application name has at least one character
        let first_len = rest.chars().next()?.len_utf8();
        let sep_at = rest[first_len..].find(SEPARATOR)? + first_len;

        Some(&rest[..sep_at])
    }

    /// Whether a display name carries this namer's prefix.
    pub fn is_owned(&self, display_name: &str) -> bool {
        display_name.starts_with(self.prefix.as_str())
    }
}
