//! Ordered rule set
//!
//! Rules run in a fixed order that matters: bracket stripping on
//! include/require must come before the rules that expect unbracketed
//! statements, and whitespace trimming always comes last.

use std::collections::HashSet;
use std::sync::Arc;

use phplift_core::apply_edits;

use super::{
    BooleanCaseRule, ElseifRule, IncludeInterpolationRule, IncludeParenthesesRule,
    IncludeSpacingRule, LogicalOperatorsRule, Rule, TrailingWhitespaceRule,
};

/// Information about a registered rule
#[derive(Debug, Clone)]
pub struct RuleInfo {
    pub name: &'static str,
    pub description: &'static str,
    pub can_disable: bool,
}

/// One rule's contribution to a file's change log
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeRecord {
    pub rule: &'static str,
    pub count: usize,
    pub description: String,
}

/// Result of running the rule set over a source text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rewrite {
    /// The fully transformed source
    pub content: String,
    /// Change records in rule order, one per rule that matched
    pub changes: Vec<ChangeRecord>,
}

impl Rewrite {
    /// Change-log lines in rule order
    pub fn descriptions(&self) -> Vec<&str> {
        self.changes.iter().map(|c| c.description.as_str()).collect()
    }
}

/// Ordered collection of rules
#[derive(Clone)]
pub struct RuleSet {
    rules: Vec<Arc<dyn Rule>>,
}

impl RuleSet {
    /// Create the full rule set in canonical order
    pub fn new() -> Self {
        Self {
            rules: vec![
                Arc::new(IncludeParenthesesRule),
                Arc::new(IncludeInterpolationRule),
                Arc::new(IncludeSpacingRule),
                Arc::new(BooleanCaseRule),
                Arc::new(ElseifRule),
                Arc::new(LogicalOperatorsRule),
                Arc::new(TrailingWhitespaceRule),
            ],
        }
    }

    /// Keep only the named rules, preserving canonical order
    ///
    /// Rules that cannot be disabled are always kept.
    pub fn with_enabled(enabled: &HashSet<String>) -> Self {
        let mut set = Self::new();
        set.rules
            .retain(|rule| !rule.can_disable() || enabled.contains(rule.name()));
        set
    }

    /// Get a rule by name
    pub fn get(&self, name: &str) -> Option<&Arc<dyn Rule>> {
        self.rules.iter().find(|rule| rule.name() == name)
    }

    /// All rule names in canonical order
    pub fn all_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|rule| rule.name()).collect()
    }

    /// Get information about all rules
    pub fn list(&self) -> Vec<RuleInfo> {
        self.rules
            .iter()
            .map(|rule| RuleInfo {
                name: rule.name(),
                description: rule.description(),
                can_disable: rule.can_disable(),
            })
            .collect()
    }

    /// Run every rule in order over `source`
    ///
    /// Each rule's edits are applied before the next rule runs. A rule whose
    /// edits cannot be applied is skipped for this source.
    pub fn apply(&self, source: &str) -> Rewrite {
        let mut content = source.to_string();
        let mut changes = Vec::new();

        for rule in &self.rules {
            let edits = rule.check(&content);
            if edits.is_empty() {
                continue;
            }

            if let Ok(new_content) = apply_edits(&content, &edits) {
                if let Some(description) = rule.change_description(edits.len()) {
                    changes.push(ChangeRecord {
                        rule: rule.name(),
                        count: edits.len(),
                        description,
                    });
                }
                content = new_content;
            }
        }

        Rewrite { content, changes }
    }

    /// Number of rules in the set
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Check if the set is empty
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl Default for RuleSet {
    fn default() -> Self {
        Self::new()
    }
}

/// Apply the full rule set to `content`
pub fn apply_rules(content: &str) -> Rewrite {
    RuleSet::new().apply(content)
}
