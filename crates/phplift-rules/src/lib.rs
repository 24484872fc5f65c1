//! phplift-rules: ordered textual rewrite rules for legacy PHP
//!
//! This crate is the pure half of phplift: it never touches the filesystem.
//! Given file content it returns the rewritten content and a change log.
//!
//! # Rules (in application order)
//!
//! 1. `include_parentheses` - `require("a.php");` to `require "a.php";`
//! 2. `include_interpolation` - `${$x}` to `{${$x}}` in include/require paths
//! 3. `include_spacing` - `include"a.php"` to `include "a.php"`
//! 4. `boolean_case` - `TRUE`/`FALSE` to `true`/`false`
//! 5. `elseif` - `else if` to `elseif`
//! 6. `logical_operators` - `and`/`or` to `&&`/`||` in if conditions
//! 7. `trailing_whitespace` - strip line-end whitespace (always, silently)
//!
//! # Example
//!
//! ```
//! use phplift_rules::apply_rules;
//!
//! let rewrite = apply_rules("} else if ($x) {");
//! assert_eq!(rewrite.content, "} elseif ($x) {");
//! assert_eq!(rewrite.changes.len(), 1);
//! ```

pub mod deprecated;
pub mod rules;
pub mod scanner;

pub use deprecated::{scan_deprecated, DeprecatedUsage};
pub use rules::{apply_rules, ChangeRecord, Rewrite, Rule, RuleInfo, RuleSet};
