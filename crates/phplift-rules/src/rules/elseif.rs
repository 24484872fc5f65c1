//! Convert `else if` to `elseif`

use std::sync::LazyLock;

use phplift_core::Edit;
use regex::Regex;

use super::{edit_with_rule, Rule};
use crate::scanner::CodeMap;

static ELSE_IF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\belse\s+if\b").expect("else if pattern"));

/// Converts `else if` to `elseif`
pub struct ElseifRule;

impl Rule for ElseifRule {
    fn name(&self) -> &'static str {
        "elseif"
    }

    fn description(&self) -> &'static str {
        "Convert else if to elseif"
    }

    fn check(&self, source: &str) -> Vec<Edit> {
        let map = CodeMap::new(source);

        // Must not be in string or comment
        ELSE_IF
            .find_iter(source)
            .filter(|mat| map.is_code(mat.start()))
            .map(|mat| {
                edit_with_rule(
                    mat.start(),
                    mat.end(),
                    "elseif".to_string(),
                    "Convert 'else if' to 'elseif'".to_string(),
                    self.name(),
                )
            })
            .collect()
    }

    fn change_description(&self, count: usize) -> Option<String> {
        Some(format!("Replaced 'else if' with 'elseif' in {} places.", count))
    }
}
