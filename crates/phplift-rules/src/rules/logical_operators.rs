//! Replace `and`/`or` keywords with `&&`/`||` inside if conditions

use std::sync::LazyLock;

use phplift_core::Edit;
use regex::Regex;

use super::{edit_with_rule, is_member_or_variable, Rule};
use crate::scanner::{matching_paren, CodeMap};

static IF_OPEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bif\s*\(").expect("if condition pattern"));

static WORD_OPERATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(?:and|AND|or|OR)\b").expect("logical operator pattern"));

/// Rewrites `and`/`AND` to `&&` and `or`/`OR` to `||` in `if` conditions
///
/// The condition is delimited by balanced parentheses at any depth. Operators
/// inside string literals or comments are never touched. `elseif (...)`
/// conditions are left as they are.
pub struct LogicalOperatorsRule;

impl Rule for LogicalOperatorsRule {
    fn name(&self) -> &'static str {
        "logical_operators"
    }

    fn description(&self) -> &'static str {
        "Use && and || instead of and/or in if conditions"
    }

    fn check(&self, source: &str) -> Vec<Edit> {
        let map = CodeMap::new(source);
        let mut edits = Vec::new();
        let mut resume_at = 0;

        for mat in IF_OPEN.find_iter(source) {
            if mat.start() < resume_at
                || !map.is_code(mat.start())
                || is_member_or_variable(source, mat.start())
            {
                continue;
            }

            let open = mat.end() - 1;
            let Some(close) = matching_paren(source, &map, open) else {
                continue;
            };
            let condition_start = open + 1;

            for word in WORD_OPERATOR.find_iter(&source[condition_start..close]) {
                let at = condition_start + word.start();
                if !map.is_code(at) || is_member_or_variable(source, at) {
                    continue;
                }

                let replacement = match word.as_str() {
                    "and" | "AND" => "&&",
                    _ => "||",
                };
                edits.push(edit_with_rule(
                    at,
                    at + word.len(),
                    replacement.to_string(),
                    format!("Replace '{}' with '{}'", word.as_str(), replacement),
                    self.name(),
                ));
            }

            resume_at = close + 1;
        }

        edits
    }

    fn change_description(&self, count: usize) -> Option<String> {
        Some(format!(
            "Changed 'and/AND' to '&&' and 'or/OR' to '||' in if statements in {} places.",
            count
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use phplift_core::apply_edits;

    fn fix(source: &str) -> String {
        apply_edits(source, &LogicalOperatorsRule.check(source)).unwrap()
    }

    #[test]
    fn test_and_or_replaced() {
        assert_eq!(fix("if ($a AND $b OR $c)"), "if ($a && $b || $c)");
        assert_eq!(fix("if ($a and $b or $c)"), "if ($a && $b || $c)");
    }

    #[test]
    fn test_no_space_after_if_preserved() {
        assert_eq!(fix("if($a AND $b){}"), "if($a && $b){}");
    }

    #[test]
    fn test_string_literal_untouched() {
        let source = r#"if ($s === "cat or dog")"#;
        assert!(LogicalOperatorsRule.check(source).is_empty());
    }

    #[test]
    fn test_escaped_quote_in_literal() {
        let source = r#"if ($s === "say \" or \"" and $t)"#;
        assert_eq!(fix(source), r#"if ($s === "say \" or \"" && $t)"#);
    }

    #[test]
    fn test_unbalanced_apostrophe_in_literal() {
        let source = r#"if ($s === "it's" or $t === 'x')"#;
        assert_eq!(fix(source), r#"if ($s === "it's" || $t === 'x')"#);
    }

    #[test]
    fn test_nested_parentheses() {
        assert_eq!(
            fix("if (($a or $b) and in_array($c, f($d)))"),
            "if (($a || $b) && in_array($c, f($d)))"
        );
    }

    #[test]
    fn test_outside_condition_untouched() {
        let source = "$x = $a or die(); if ($b) { $c = $d and $e; }";
        assert!(LogicalOperatorsRule.check(source).is_empty());
    }

    #[test]
    fn test_elseif_condition_untouched() {
        assert!(LogicalOperatorsRule.check("if ($a) {} elseif ($b AND $c) {}").is_empty());
    }

    #[test]
    fn test_condition_after_inline_html() {
        assert_eq!(
            fix("<p>Don't</p><?php if ($a AND $b) {} ?><p>it's</p>"),
            "<p>Don't</p><?php if ($a && $b) {} ?><p>it's</p>"
        );
    }

    #[test]
    fn test_condition_after_heredoc() {
        let source = "<?php
$s = <<<TXT
It's here
TXT;
if ($a or $b) {}
";
        assert_eq!(fix(source), "<?php
$s = <<<TXT
It's here
TXT;
if ($a || $b) {}
");
    }

    #[test]
    fn test_mixed_case_word_untouched() {
        assert!(LogicalOperatorsRule.check("if ($a And $b Or $c)").is_empty());
    }

    #[test]
    fn test_identifiers_untouched() {
        let source = "if ($and || $obj->or || ORDER_BY || $android)";
        assert!(LogicalOperatorsRule.check(source).is_empty());
    }

    #[test]
    fn test_if_in_comment_untouched() {
        assert!(LogicalOperatorsRule.check("// if ($a and $b)\n").is_empty());
    }
}
