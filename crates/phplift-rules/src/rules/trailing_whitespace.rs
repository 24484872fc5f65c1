//! Remove trailing whitespace from lines

use phplift_core::Edit;

use super::{edit_with_rule, Rule};

/// Characters stripped from line ends. A `\r` before `\n` counts, so CRLF
/// files come out with LF endings.
const TRAILING: &[char] = &[' ', '\t', '\r', '\0', '\x0B'];

/// Removes trailing whitespace at the end of every line
///
/// Always runs last and is never reported in the change log.
pub struct TrailingWhitespaceRule;

impl Rule for TrailingWhitespaceRule {
    fn name(&self) -> &'static str {
        "trailing_whitespace"
    }

    fn description(&self) -> &'static str {
        "Remove trailing whitespace at the end of lines"
    }

    fn check(&self, source: &str) -> Vec<Edit> {
        let mut edits = Vec::new();
        let mut offset = 0;

        for (line_num, line) in source.split('\n').enumerate() {
            let trimmed = line.trim_end_matches(TRAILING);
            if trimmed.len() < line.len() {
                edits.push(edit_with_rule(
                    offset + trimmed.len(),
                    offset + line.len(),
                    String::new(),
                    format!("Remove trailing whitespace on line {}", line_num + 1),
                    self.name(),
                ));
            }
            offset += line.len() + 1;
        }

        edits
    }

    fn change_description(&self, _count: usize) -> Option<String> {
        None
    }

    fn can_disable(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use phplift_core::apply_edits;

    fn fix(source: &str) -> String {
        apply_edits(source, &TrailingWhitespaceRule.check(source)).unwrap()
    }

    #[test]
    fn test_no_trailing_whitespace() {
        assert!(TrailingWhitespaceRule.check("<?php\n$a = 1;\n").is_empty());
    }

    #[test]
    fn test_trailing_spaces() {
        let source = "<?php   \n$a = 1;\n";
        let edits = TrailingWhitespaceRule.check(source);

        assert_eq!(edits.len(), 1);
        assert_eq!(edits[0].start_offset(), 5);
        assert_eq!(edits[0].end_offset(), 8);
        assert_eq!(fix(source), "<?php\n$a = 1;\n");
    }

    #[test]
    fn test_mixed_whitespace_and_last_line() {
        assert_eq!(fix("<?php \t \n$a;\t"), "<?php\n$a;");
    }

    #[test]
    fn test_crlf_becomes_lf() {
        assert_eq!(fix("<?php\r\n$a = 1;\r\n"), "<?php\n$a = 1;\n");
    }

    #[test]
    fn test_preserves_content() {
        assert_eq!(fix("<?php\n$a = '   ';   \n"), "<?php\n$a = '   ';\n");
    }

    #[test]
    fn test_whitespace_only_lines() {
        assert_eq!(fix("a\n   \n\t\nb"), "a\n\n\nb");
    }

    #[test]
    fn test_silent() {
        assert!(TrailingWhitespaceRule.change_description(4).is_none());
        assert!(!TrailingWhitespaceRule.can_disable());
    }
}
