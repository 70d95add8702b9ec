//! Glob patterns over `/`-separated relative paths.
//!
//! Syntax: `**/` matches zero or more leading directories, any other `**`
//! matches anything including separators, `*` matches within a single
//! component, `?` matches one non-separator character. Everything else is
//! literal. A pattern must match the whole path.

use proofpack_types::{ProofError, Result};
use regex::Regex;

/// A compiled path glob.
#[derive(Clone, Debug)]
pub struct PathPattern {
    source: String,
    regex: Regex,
}

impl PathPattern {
    pub fn new(glob: &str) -> Result<Self> {
        if glob.is_empty() {
            return Err(ProofError::InvalidConfig("empty path pattern".into()));
        }
        if glob.starts_with('/') {
            return Err(ProofError::InvalidConfig(format!(
                "path pattern {glob:?} is absolute; patterns match relative paths"
            )));
        }
        let regex = Regex::new(&glob_to_regex(glob)).map_err(|e| {
            ProofError::InvalidConfig(format!("path pattern {glob:?} does not compile: {e}"))
        })?;
        Ok(Self {
            source: glob.to_string(),
            regex,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn matches(&self, path: &str) -> bool {
        self.regex.is_match(path)
    }
}

fn glob_to_regex(glob: &str) -> String {
    let chars: Vec<char> = glob.chars().collect();
    let mut out = String::with_capacity(glob.len() * 2 + 2);
    out.push('^');

    let mut i = 0;
    while i < chars.len() {
        match chars[i] {
            '*' if chars.get(i + 1) == Some(&'*') => {
                if chars.get(i + 2) == Some(&'/') {
                    out.push_str("(?:.*/)?");
                    i += 3;
                } else {
                    out.push_str(".*");
                    i += 2;
                }
            }
            '*' => {
                out.push_str("[^/]*");
                i += 1;
            }
            '?' => {
                out.push_str("[^/]");
                i += 1;
            }
            c => {
                let mut buf = [0u8; 4];
                out.push_str(&regex::escape(c.encode_utf8(&mut buf)));
                i += 1;
            }
        }
    }

    out.push('$');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn m(glob: &str, path: &str) -> bool {
        PathPattern::new(glob).unwrap().matches(path)
    }

    #[test]
    fn double_star_slash_matches_zero_or_more_dirs() {
        assert!(m("**/*.py", "fit.py"));
        assert!(m("**/*.py", "src/model/fit.py"));
        assert!(!m("**/*.py", "fit.pyi"));
    }

    #[test]
    fn single_star_stays_in_component() {
        assert!(m("src/*.rs", "src/lib.rs"));
        assert!(!m("src/*.rs", "src/bin/main.rs"));
    }

    #[test]
    fn trailing_double_star_matches_everything_below() {
        assert!(m(".git/**", ".git/HEAD"));
        assert!(m(".git/**", ".git/objects/ab/cdef"));
        assert!(!m(".git/**", "src/.git"));
    }

    #[test]
    fn question_mark_is_one_char() {
        assert!(m("run?.log", "run1.log"));
        assert!(!m("run?.log", "run12.log"));
        assert!(!m("a?b", "a/b"));
    }

    #[test]
    fn regex_metacharacters_are_literal() {
        assert!(m("results(v2).json", "results(v2).json"));
        assert!(!m("a.txt", "abtxt"));
        assert!(m("data+[raw]/x", "data+[raw]/x"));
    }

    #[test]
    fn anchored_to_whole_path() {
        assert!(!m("a.txt", "dir/a.txt"));
        assert!(!m("dir", "dir/a.txt"));
    }

    #[test]
    fn rejects_empty_and_absolute() {
        assert!(matches!(PathPattern::new(""), Err(ProofError::InvalidConfig(_))));
        assert!(matches!(PathPattern::new("/etc/*"), Err(ProofError::InvalidConfig(_))));
    }
}
