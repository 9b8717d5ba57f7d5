//! # Glob matching for string fields.
//!
//! The wildcard language is deliberately tiny:
//! - any character matches itself;
//! - `?` consumes exactly one character;
//! - `*` consumes zero or more characters.
//!
//! There is no escape syntax: a pattern cannot match a literal `*` or `?`
//! except through the wildcards themselves.
//!
//! ```text
//! "a*c"  ~ "ac", "abc", "aXXXc"      ≁ "ab"
//! "a?c"  ~ "abc"                     ≁ "ac", "abbc"
//! ```

/// Pre-split glob pattern.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Glob {
    source: String,
    chars: Vec<char>,
}

impl Glob {
    pub fn new(source: impl Into<String>) -> Self {
        let source = source.into();
        let chars = source.chars().collect();
        Self { source, chars }
    }

    /// Original pattern text.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Returns `true` if the whole `value` matches this pattern.
    pub fn is_match(&self, value: &str) -> bool {
        let value: Vec<char> = value.chars().collect();
        match_from(&self.chars, &value)
    }

    /// True if `text` contains a wildcard character.
    pub fn is_glob(text: &str) -> bool {
        text.contains(['*', '?'])
    }
}

/// One-shot glob match.
///
/// # Example
/// ```
/// use specterflow::glob_match;
///
/// assert!(glob_match("a*c", "aXXXc"));
/// assert!(glob_match("a*c", "ac"));
/// assert!(!glob_match("a?c", "abbc"));
/// ```
pub fn glob_match(pattern: &str, value: &str) -> bool {
    Glob::new(pattern).is_match(value)
}

/// Iterative matcher: remembers only the latest `*` and how much of `value`
/// it has absorbed, so a failed literal run resumes one character later.
/// Runs in `O(pattern × value)` whatever the number of stars.
fn match_from(pattern: &[char], value: &[char]) -> bool {
    let (mut p, mut v) = (0, 0);
    // (pattern index after the star, value index the star resumes from)
    let mut star: Option<(usize, usize)> = None;

    while v < value.len() {
        match pattern.get(p) {
            Some('*') => {
                p += 1;
                star = Some((p, v));
            }
            Some('?') => {
                p += 1;
                v += 1;
            }
            Some(c) if *c == value[v] => {
                p += 1;
                v += 1;
            }
            _ => match star {
                Some((after, taken)) => {
                    p = after;
                    v = taken + 1;
                    star = Some((after, taken + 1));
                }
                None => return false,
            },
        }
    }
    pattern[p..].iter().all(|c| *c == '*')
}
