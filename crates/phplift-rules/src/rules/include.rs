//! include/require statement rules
//!
//! Three rules share this module because they all key off the same four
//! language constructs: `include`, `include_once`, `require`, `require_once`.

use std::sync::LazyLock;

use phplift_core::Edit;
use regex::Regex;

use super::{edit_with_rule, is_member_or_variable, Rule};
use crate::scanner::{matching_paren, CodeMap};

static KEYWORD_PAREN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(require_once|include_once|require|include)\s*\(")
        .expect("include parentheses pattern")
});

static KEYWORD_STRING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\b(?:require_once|include_once|require|include)\s*['"]"#)
        .expect("include string pattern")
});

static KEYWORD_QUOTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\b(?:require_once|include_once|require|include)['"]"#)
        .expect("include quote pattern")
});

/// Rewrites `require("a.php");` to `require "a.php";`
pub struct IncludeParenthesesRule;

impl Rule for IncludeParenthesesRule {
    fn name(&self) -> &'static str {
        "include_parentheses"
    }

    fn description(&self) -> &'static str {
        "Remove brackets around the argument of include/require statements"
    }

    fn check(&self, source: &str) -> Vec<Edit> {
        let map = CodeMap::new(source);
        let mut edits = Vec::new();
        let mut resume_at = 0;

        for cap in KEYWORD_PAREN.captures_iter(source) {
            let (Some(full), Some(keyword)) = (cap.get(0), cap.get(1)) else {
                continue;
            };

            if full.start() < resume_at
                || !map.is_code(full.start())
                || is_member_or_variable(source, full.start())
            {
                continue;
            }

            let open = full.end() - 1;
            let Some(close) = matching_paren(source, &map, open) else {
                continue;
            };

            // The parenthesised group must be the whole statement
            let after = &source[close + 1..];
            let gap = after.len() - after.trim_start().len();
            if !after[gap..].starts_with(';') {
                continue;
            }
            let semicolon = close + 1 + gap;

            let argument = strip_wrapping_parens(source[open + 1..close].trim());
            if argument.is_empty() {
                continue;
            }

            edits.push(edit_with_rule(
                full.start(),
                semicolon + 1,
                format!("{} {};", keyword.as_str(), argument),
                "Remove brackets from include/require".to_string(),
                self.name(),
            ));
            resume_at = semicolon + 1;
        }

        edits
    }

    fn change_description(&self, count: usize) -> Option<String> {
        Some(format!("Removed brackets from require/include in {} places.", count))
    }
}

/// Strip every redundant `( ... )` layer that wraps the whole argument
fn strip_wrapping_parens(mut argument: &str) -> &str {
    while argument.starts_with('(') {
        let map = CodeMap::new(argument);
        match matching_paren(argument, &map, 0) {
            Some(close) if close == argument.len() - 1 => {
                argument = argument[1..close].trim();
            }
            _ => break,
        }
    }
    argument
}

/// Rewrites `${$name}` inside an include/require path to `{${$name}}`
pub struct IncludeInterpolationRule;

impl Rule for IncludeInterpolationRule {
    fn name(&self) -> &'static str {
        "include_interpolation"
    }

    fn description(&self) -> &'static str {
        "Wrap ${$...} interpolation in include/require paths as {${$...}}"
    }

    fn check(&self, source: &str) -> Vec<Edit> {
        let map = CodeMap::new(source);
        let mut edits = Vec::new();

        for mat in KEYWORD_STRING.find_iter(source) {
            if !map.is_code(mat.start()) || is_member_or_variable(source, mat.start()) {
                continue;
            }

            let Some(literal) = map.string_starting_at(mat.end() - 1) else {
                continue;
            };

            // Body only, without the delimiters
            let body_start = literal.range.start + 1;
            let body_end = if literal.is_terminated(source) {
                literal.range.end - 1
            } else {
                literal.range.end
            };
            let body = &source[body_start..body_end];

            let mut search_from = 0;
            while let Some(found) = body[search_from..].find("${$") {
                let at = search_from + found;
                search_from = at + 3;

                if body[..at].ends_with('{') {
                    continue;
                }
                let Some(close_rel) = body[at + 3..].find('}') else {
                    break;
                };
                let close = at + 3 + close_rel;
                // `${$}` has no name
                if close == at + 3 || body[close + 1..].starts_with('}') {
                    continue;
                }

                edits.push(edit_with_rule(
                    body_start + at,
                    body_start + close + 1,
                    format!("{{{}}}", &body[at..=close]),
                    "Wrap ${$...} as {${$...}}".to_string(),
                    self.name(),
                ));
                search_from = close + 1;
            }
        }

        edits
    }

    fn change_description(&self, count: usize) -> Option<String> {
        Some(format!(
            "Changed ${{$...}} to {{${{$...}}}} for PHP 8.3 compatibility in {} places.",
            count
        ))
    }
}

/// Inserts a space in `include"x.php"`
pub struct IncludeSpacingRule;

impl Rule for IncludeSpacingRule {
    fn name(&self) -> &'static str {
        "include_spacing"
    }

    fn description(&self) -> &'static str {
        "Ensure one space between include/require and a string argument"
    }

    fn check(&self, source: &str) -> Vec<Edit> {
        let map = CodeMap::new(source);

        KEYWORD_QUOTE
            .find_iter(source)
            .filter(|mat| map.is_code(mat.start()) && !is_member_or_variable(source, mat.start()))
            .map(|mat| {
                let quote = mat.end() - 1;
                edit_with_rule(
                    quote,
                    quote,
                    " ".to_string(),
                    "Insert space after include/require".to_string(),
                    self.name(),
                )
            })
            .collect()
    }

    fn change_description(&self, count: usize) -> Option<String> {
        Some(format!(
            "Ensured space between include/require and the string in {} places.",
            count
        ))
    }
}
