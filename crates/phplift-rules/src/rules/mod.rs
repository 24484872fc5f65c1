//! Rewrite rule implementations
//!
//! Each rule inspects the current source and returns the edits it wants to
//! make. The [`RuleSet`] applies rules one at a time, in a fixed order, so
//! every rule sees the text already rewritten by the rules before it.

mod registry;
mod include;
mod boolean_case;
mod elseif;
mod logical_operators;
mod trailing_whitespace;

pub use registry::{apply_rules, ChangeRecord, Rewrite, RuleInfo, RuleSet};
pub use include::{IncludeInterpolationRule, IncludeParenthesesRule, IncludeSpacingRule};
pub use boolean_case::BooleanCaseRule;
pub use elseif::ElseifRule;
pub use logical_operators::LogicalOperatorsRule;
pub use trailing_whitespace::TrailingWhitespaceRule;

use phplift_core::Edit;

/// A textual rewrite rule
pub trait Rule: Send + Sync {
    /// Internal name, used in config files and `--list-rules`
    fn name(&self) -> &'static str;

    /// Human-readable description
    fn description(&self) -> &'static str;

    /// Check the source and return edits to apply
    ///
    /// Edits must not overlap. The number of edits is the rule's occurrence
    /// count for the change log.
    fn check(&self, source: &str) -> Vec<Edit>;

    /// Change-log line for `count` substitutions, or `None` for silent rules
    fn change_description(&self, count: usize) -> Option<String>;

    /// Whether config may disable this rule
    fn can_disable(&self) -> bool {
        true
    }
}

/// Create an Edit tagged with a rule name
pub fn edit_with_rule(start: usize, end: usize, replacement: String, message: String, rule: &str) -> Edit {
    Edit::new(start..end, replacement, message).with_rule(rule)
}

/// Whether the token at `offset` is a member or variable name rather than a keyword
///
/// `$and`, `$obj->include(...)`, `Foo::TRUE` are all left alone.
pub(crate) fn is_member_or_variable(source: &str, offset: usize) -> bool {
    let before = &source[..offset];
    before.ends_with('$') || before.ends_with("->") || before.ends_with("::")
}
