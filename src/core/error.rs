use crate::core::store::StoreError;
use std::path::PathBuf;
use thiserror::Error;

/// Core error types for appblock
#[derive(Debug, Error)]
pub enum Error {
    /// Root directory does not exist or is not a directory
    #[error("Invalid path: {} does not exist or is not a directory", path.display())]
    InvalidPath { path: PathBuf },

    /// Root directory could not be enumerated
    #[error("Failed to scan {}: {source}", path.display())]
    Scan {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Firewall rule store call failed
    #[error("Rule store error: {0}")]
    Store(#[from] StoreError),

    /// Input validation failed
    #[error("Validation error in {field}: {message}")]
    Validation { field: String, message: String },

    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Represents a translated error with helpful context
#[derive(Debug, Clone)]
pub struct ErrorTranslation {
    pub user_message: String,
    pub suggestions: Vec<String>,
    pub help_url: Option<String>,
}

impl ErrorTranslation {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            user_message: message.into(),
            suggestions: Vec::new(),
            help_url: None,
        }
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    pub fn with_help(mut self, url: impl Into<String>) -> Self {
        self.help_url = Some(url.into());
        self
    }
}

/// Database of netsh error patterns and their translations
pub struct NetshErrorPattern;

impl NetshErrorPattern {
    /// Matches an error message against known patterns and returns a user-friendly translation.
    pub fn match_error(msg: &str) -> ErrorTranslation {
        let lower = msg.to_lowercase();

        // Not running as administrator
        if lower.contains("requires elevation")
            || lower.contains("run as administrator")
            || lower.contains("access is denied")
        {
            return ErrorTranslation::new("Administrator privileges are required to change firewall rules")
                .with_suggestion("Re-run appblock from an elevated terminal")
                .with_suggestion("Or set APPBLOCK_ELEVATION_METHOD=sudo (Windows 11 24H2+) or gsudo")
                .with_help("https://learn.microsoft.com/windows/security/operating-system-security/network-security/windows-firewall/configure-with-command-line");
        }

        // Missing netsh
        if lower.contains("not recognized")
            || lower.contains("no such file")
            || lower.contains("command not found")
            || lower.contains("cannot find the file")
        {
            return ErrorTranslation::new("netsh is not available on this system")
                .with_suggestion("appblock manages Windows Defender Firewall and needs netsh.exe")
                .with_suggestion("Set APPBLOCK_NETSH_COMMAND to the full path of netsh.exe")
                .with_suggestion("Use --dry-run to preview rules on other systems");
        }

        // Firewall service stopped
        if lower.contains("service") && (lower.contains("not running") || lower.contains("stopped"))
        {
            return ErrorTranslation::new("Windows Defender Firewall service is not running")
                .with_suggestion("Start it with: sc start mpssvc")
                .with_suggestion("Check group policy if the service is disabled");
        }

        // Program path rejected
        if lower.contains("program") && (lower.contains("invalid") || lower.contains("path")) {
            return ErrorTranslation::new("The firewall rejected the program path")
                .with_suggestion("Verify the executable still exists")
                .with_suggestion("Paths longer than 260 characters may need long-path support");
        }

        // Bad parameters
        if lower.contains("incorrect") || lower.contains("usage:") {
            return ErrorTranslation::new("netsh rejected the rule parameters")
                .with_suggestion("Check the rule name for unsupported characters")
                .with_suggestion("Rule names are limited to 255 characters");
        }

        // Nothing matched on delete
        if lower.contains("no rules match") {
            return ErrorTranslation::new("No matching firewall rules were found")
                .with_suggestion("The rules may have been removed by another program")
                .with_suggestion("Run `appblock list` to see current rules");
        }

        // Generic fallback
        ErrorTranslation::new(format!("Firewall error: {msg}"))
            .with_suggestion("Check the detailed error message for more information")
            .with_suggestion("Verify netsh is working: netsh advfirewall show currentprofile")
    }
}

pub type Result<T> = std::result::Result<T, Error>;
