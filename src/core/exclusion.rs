//! Exclusion filtering of scanned files

use crate::core::glob::file_names_equal;
use crate::core::scanner::FileCandidate;
use std::fmt;

/// Why a candidate was not blocked
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// File name matched an excluded file entry
    ExcludedFile(String),
    /// File name contained an excluded keyword
    Keyword(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::ExcludedFile(name) => write!(f, "excluded file '{name}'"),
            SkipReason::Keyword(keyword) => write!(f, "matches keyword '{keyword}'"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedFile {
    pub candidate: FileCandidate,
    pub reason: SkipReason,
}

/// Candidates split into those to block and those to leave alone
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Partition {
    pub to_block: Vec<FileCandidate>,
    pub to_skip: Vec<SkippedFile>,
}

/// Returns the reason `file_name` is excluded, if any.
///
/// Exact file names are checked before keywords. Keywords match as
/// case-insensitive substrings and the first match wins.
pub fn skip_reason(
    file_name: &str,
    excluded_files: &[String],
    excluded_keywords: &[String],
) -> Option<SkipReason> {
    if let Some(name) = excluded_files
        .iter()
        .find(|name| file_names_equal(file_name, name))
    {
        return Some(SkipReason::ExcludedFile(name.clone()));
    }

    let lower = file_name.to_lowercase();
    excluded_keywords
        .iter()
        .filter(|k| !k.is_empty())
        .find(|k| lower.contains(&k.to_lowercase()))
        .map(|k| SkipReason::Keyword(k.clone()))
}

/// Splits `candidates` into to-block and to-skip sets, preserving order.
pub fn partition(
    candidates: Vec<FileCandidate>,
    excluded_files: &[String],
    excluded_keywords: &[String],
) -> Partition {
    let mut result = Partition::default();
    for candidate in candidates {
        match skip_reason(&candidate.file_name, excluded_files, excluded_keywords) {
            Some(reason) => result.to_skip.push(SkippedFile { candidate, reason }),
            None => result.to_block.push(candidate),
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn candidate(name: &str) -> FileCandidate {
        FileCandidate {
            full_path: PathBuf::from("/apps").join(name),
            file_name: name.to_string(),
        }
    }

    fn file_names(c: &[FileCandidate]) -> Vec<&str> {
        c.iter().map(|c| c.file_name.as_str()).collect()
    }

    #[test]
    fn test_keyword_exclusion() {
        let result = partition(
            vec![candidate("a.exe"), candidate("b.exe"), candidate("update.exe")],
            &[],
            &["update".to_string()],
        );

        assert_eq!(file_names(&result.to_block), vec!["a.exe", "b.exe"]);
        assert_eq!(result.to_skip.len(), 1);
        assert_eq!(result.to_skip[0].candidate.file_name, "update.exe");
        assert_eq!(
            result.to_skip[0].reason,
            SkipReason::Keyword("update".to_string())
        );
    }

    #[test]
    fn test_keyword_is_case_insensitive() {
        let reason = skip_reason("GameUpdater.exe", &[], &["UPDATE".to_string()]);
        assert_eq!(reason, Some(SkipReason::Keyword("UPDATE".to_string())));
    }

    #[test]
    fn test_excluded_file_checked_first() {
        let reason = skip_reason(
            "updater.exe",
            &["updater.exe".to_string()],
            &["update".to_string()],
        );
        assert_eq!(
            reason,
            Some(SkipReason::ExcludedFile("updater.exe".to_string()))
        );
    }

    #[test]
    fn test_first_keyword_wins() {
        let reason = skip_reason(
            "crash_update.exe",
            &[],
            &["crash".to_string(), "update".to_string()],
        );
        assert_eq!(reason, Some(SkipReason::Keyword("crash".to_string())));
    }

    #[test]
    fn test_excluded_file_is_exact_not_substring() {
        let reason = skip_reason("launcher2.exe", &["launcher.exe".to_string()], &[]);
        assert_eq!(reason, None);
    }

    #[test]
    fn test_empty_keyword_ignored() {
        let result = partition(vec![candidate("a.exe")], &[], &[String::new()]);
        assert_eq!(result.to_block.len(), 1);
    }

    #[test]
    fn test_skip_reason_display() {
        assert_eq!(
            SkipReason::Keyword("setup".into()).to_string(),
            "matches keyword 'setup'"
        );
    }
}
