//! File-name glob matching for extension filters
//!
//! Supports `*` (any run of characters), `?` (exactly one character) and
//! `[abc]` / `[!abc]` character classes. Patterns match the whole file name,
//! never a path.

use crate::core::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Literal(char),
    Any,
    AnySequence,
    CharClass(Vec<char>, bool),
}

/// A compiled file-name pattern such as `*.exe`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobPattern {
    source: String,
    tokens: Vec<Token>,
    case_insensitive: bool,
}

impl GlobPattern {
    /// Compiles `pattern` using the host file system's case rules.
    pub fn new(pattern: &str) -> Result<Self> {
        Self::with_case(pattern, host_case_insensitive())
    }

    /// Compiles `pattern` with explicit case handling.
    pub fn with_case(pattern: &str, case_insensitive: bool) -> Result<Self> {
        let mut tokens = Vec::new();
        let mut chars = pattern.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                '*' => {
                    // Collapse runs of '*'
                    if tokens.last() != Some(&Token::AnySequence) {
                        tokens.push(Token::AnySequence);
                    }
                }
                '?' => tokens.push(Token::Any),
                '[' => {
                    let negated = chars.peek() == Some(&'!');
                    if negated {
                        chars.next();
                    }
                    let mut class_chars = Vec::new();
                    loop {
                        match chars.next() {
                            Some(']') => break,
                            Some(ch) => class_chars.push(fold(ch, case_insensitive)),
                            None => {
                                return Err(Error::validation(
                                    "extension",
                                    format!("unterminated character class in '{pattern}'"),
                                ));
                            }
                        }
                    }
                    tokens.push(Token::CharClass(class_chars, negated));
                }
                other => tokens.push(Token::Literal(fold(other, case_insensitive))),
            }
        }

        Ok(Self {
            source: pattern.to_string(),
            tokens,
            case_insensitive,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Returns true if the whole of `file_name` matches this pattern.
    pub fn matches(&self, file_name: &str) -> bool {
        let text: Vec<char> = file_name
            .chars()
            .map(|c| fold(c, self.case_insensitive))
            .collect();
        do_match(&self.tokens, &text)
    }
}

fn fold(c: char, case_insensitive: bool) -> char {
    if case_insensitive {
        c.to_ascii_lowercase()
    } else {
        c
    }
}

/// Iterative matcher with single-star backtracking.
fn do_match(tokens: &[Token], text: &[char]) -> bool {
    let (mut ti, mut si) = (0usize, 0usize);
    let mut backtrack: Option<(usize, usize)> = None;

    while si < text.len() {
        let advanced = match tokens.get(ti) {
            Some(Token::Literal(c)) => text[si] == *c,
            Some(Token::Any) => true,
            Some(Token::CharClass(chars, negated)) => chars.contains(&text[si]) != *negated,
            Some(Token::AnySequence) => {
                backtrack = Some((ti, si));
                ti += 1;
                continue;
            }
            None => false,
        };

        if advanced {
            ti += 1;
            si += 1;
        } else if let Some((star_ti, star_si)) = backtrack {
            // Let the last '*' swallow one more character
            ti = star_ti + 1;
            si = star_si + 1;
            backtrack = Some((star_ti, star_si + 1));
        } else {
            return false;
        }
    }

    tokens[ti..].iter().all(|t| *t == Token::AnySequence)
}

/// Whether file names on this host compare case-insensitively.
pub const fn host_case_insensitive() -> bool {
    cfg!(windows)
}

/// Compares two file names using the host file system's default rules.
pub fn file_names_equal(a: &str, b: &str) -> bool {
    if host_case_insensitive() {
        a.eq_ignore_ascii_case(b)
    } else {
        a == b
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn glob(p: &str) -> GlobPattern {
        GlobPattern::with_case(p, false).unwrap()
    }

    #[test]
    fn test_extension_glob() {
        let g = glob("*.exe");
        assert!(g.matches("tool.exe"));
        assert!(g.matches(".exe"));
        assert!(!g.matches("tool.exe.bak"));
        assert!(!g.matches("tool.dll"));
    }

    #[test]
    fn test_question_mark_and_class() {
        let g = glob("app?.[de][lx][le]");
        assert!(g.matches("app1.dll"));
        assert!(g.matches("appX.exe"));
        assert!(!g.matches("app.dll"));
        assert!(!g.matches("app12.dll"));
    }

    #[test]
    fn test_negated_class() {
        let g = glob("[!u]*.exe");
        assert!(g.matches("main.exe"));
        assert!(!g.matches("update.exe"));
    }

    #[test]
    fn test_multiple_stars_backtrack() {
        let g = glob("*setup*.exe");
        assert!(g.matches("setup.exe"));
        assert!(g.matches("my-setup-x64.exe"));
        assert!(!g.matches("my-setup-x64.msi"));
    }

    #[test]
    fn test_case_handling() {
        let insensitive = GlobPattern::with_case("*.EXE", true).unwrap();
        assert!(insensitive.matches("Tool.exe"));

        let sensitive = glob("*.EXE");
        assert!(!sensitive.matches("Tool.exe"));
    }

    #[test]
    fn test_unterminated_class_rejected() {
        let err = GlobPattern::new("*.[ex").unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));
    }

    #[test]
    fn test_empty_pattern_matches_only_empty() {
        let g = glob("");
        assert!(g.matches(""));
        assert!(!g.matches("a"));
    }
}
