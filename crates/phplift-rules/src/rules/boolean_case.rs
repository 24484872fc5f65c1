//! Lowercase the `TRUE` and `FALSE` literals

use std::sync::LazyLock;

use phplift_core::Edit;
use regex::Regex;

use super::{edit_with_rule, is_member_or_variable, Rule};
use crate::scanner::CodeMap;

static BOOLEAN_UPPER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(TRUE|FALSE)\b").expect("boolean literal pattern"));

/// Rewrites fully-uppercase `TRUE`/`FALSE` to `true`/`false`
///
/// Mixed-case spellings such as `True` are left alone.
pub struct BooleanCaseRule;

impl Rule for BooleanCaseRule {
    fn name(&self) -> &'static str {
        "boolean_case"
    }

    fn description(&self) -> &'static str {
        "Lowercase the TRUE and FALSE literals"
    }

    fn check(&self, source: &str) -> Vec<Edit> {
        let map = CodeMap::new(source);

        BOOLEAN_UPPER
            .find_iter(source)
            .filter(|mat| map.is_code(mat.start()) && !is_member_or_variable(source, mat.start()))
            .map(|mat| {
                edit_with_rule(
                    mat.start(),
                    mat.end(),
                    mat.as_str().to_lowercase(),
                    format!("Use lowercase for '{}'", mat.as_str()),
                    self.name(),
                )
            })
            .collect()
    }

    fn change_description(&self, count: usize) -> Option<String> {
        Some(format!("Changed boolean literals to lowercase in {} places.", count))
    }
}
