//! Report-only scan for deprecated identifiers
//!
//! Flags code that needs manual review: `ereg` usually becomes `preg_match`,
//! `session_register` usually becomes `$_SESSION`. The scan never edits.

/// Identifiers flagged for manual review
pub const DEPRECATED_TOKENS: &[&str] = &["ereg", "session_register"];

/// A deprecated identifier found in a source text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeprecatedUsage {
    pub token: &'static str,
    pub count: usize,
}

/// Count literal occurrences of each deprecated identifier
///
/// Matching is plain substring counting, so `eregi` also counts as `ereg`.
/// Tokens with no occurrences are omitted.
pub fn scan_deprecated(source: &str) -> Vec<DeprecatedUsage> {
    DEPRECATED_TOKENS
        .iter()
        .map(|&token| DeprecatedUsage {
            token,
            count: source.matches(token).count(),
        })
        .filter(|usage| usage.count > 0)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nothing_found() {
        assert!(scan_deprecated("<?php preg_match('/a/', $s);").is_empty());
    }

    #[test]
    fn test_counts() {
        let source = "ereg('a', $b); eregi('c', $d); session_register('x');";
        assert_eq!(
            scan_deprecated(source),
            vec![
                DeprecatedUsage { token: "ereg", count: 2 },
                DeprecatedUsage { token: "session_register", count: 1 },
            ]
        );
    }
}
