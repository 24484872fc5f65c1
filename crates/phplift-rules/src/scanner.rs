//! Character scanner that separates PHP code from everything else
//!
//! This is not a tokenizer. It walks the source once, tracking tag, quote
//! and comment state byte by byte, and records the byte ranges that are
//! *not* code: inline HTML outside `<?php ... ?>`, string literals,
//! heredoc/nowdoc bodies and comments. Rules use it to avoid rewriting text
//! that PHP never executes.
//!
//! A source with no `<?` open tag at all is scanned as a PHP fragment.
//! Backslash escapes are honoured inside both quote styles, so `"a \" or b"`
//! is one literal.

use std::ops::Range;

/// Kind of a non-code region
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionKind {
    /// Text outside PHP tags
    InlineHtml,
    /// `'...'` literal
    SingleQuoted,
    /// `"..."` literal
    DoubleQuoted,
    /// `<<<ID` / `<<<'ID'` body, from the `<<<` to the closing identifier
    Heredoc,
    /// `//` or `#` comment, up to (not including) the newline or `?>`
    LineComment,
    /// `/* ... */` comment
    BlockComment,
}

/// A non-code region located in the source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Region {
    pub kind: RegionKind,
    /// Byte range including the delimiters
    pub range: Range<usize>,
}

impl Region {
    /// Whether this is a quoted string literal
    pub fn is_string(&self) -> bool {
        matches!(self.kind, RegionKind::SingleQuoted | RegionKind::DoubleQuoted)
    }

    /// Whether the literal has its closing quote
    ///
    /// Only meaningful for quoted strings; an unterminated literal runs to
    /// the end of the source.
    pub fn is_terminated(&self, source: &str) -> bool {
        let bytes = source.as_bytes();
        self.range.len() >= 2
            && bytes.get(self.range.end - 1) == bytes.get(self.range.start)
    }
}

/// Map of the non-code regions of a source text
#[derive(Debug, Clone, Default)]
pub struct CodeMap {
    regions: Vec<Region>,
}

impl CodeMap {
    /// Scan `source` and record every non-code region
    pub fn new(source: &str) -> Self {
        let bytes = source.as_bytes();
        let mut regions = Vec::new();
        let mut i = 0;

        if find(bytes, 0, b"<?").is_some() {
            i = scan_html(bytes, 0, &mut regions);
        }

        while i < bytes.len() {
            match bytes[i] {
                b'?' if bytes.get(i + 1) == Some(&b'>') => {
                    i = scan_html(bytes, i + 2, &mut regions);
                }
                quote @ (b'\'' | b'"') => {
                    let end = scan_quoted(bytes, i, quote);
                    let kind = if quote == b'\'' {
                        RegionKind::SingleQuoted
                    } else {
                        RegionKind::DoubleQuoted
                    };
                    regions.push(Region { kind, range: i..end });
                    i = end;
                }
                b'/' if bytes.get(i + 1) == Some(&b'/') => {
                    let end = scan_line(bytes, i);
                    regions.push(Region { kind: RegionKind::LineComment, range: i..end });
                    i = end;
                }
                // `#[` opens a PHP 8 attribute, not a comment
                b'#' if bytes.get(i + 1) != Some(&b'[') => {
                    let end = scan_line(bytes, i);
                    regions.push(Region { kind: RegionKind::LineComment, range: i..end });
                    i = end;
                }
                b'/' if bytes.get(i + 1) == Some(&b'*') => {
                    let end = find(bytes, i + 2, b"*/").map(|p| p + 2).unwrap_or(bytes.len());
                    regions.push(Region { kind: RegionKind::BlockComment, range: i..end });
                    i = end;
                }
                b'<' if bytes[i..].starts_with(b"<<<") => match scan_heredoc(bytes, i) {
                    Some(end) => {
                        regions.push(Region { kind: RegionKind::Heredoc, range: i..end });
                        i = end;
                    }
                    None => i += 3,
                },
                _ => i += 1,
            }
        }

        Self { regions }
    }

    /// Whether the byte at `offset` is PHP code outside every literal and comment
    pub fn is_code(&self, offset: usize) -> bool {
        self.region_at(offset).is_none()
    }

    /// The region containing `offset`, if any
    pub fn region_at(&self, offset: usize) -> Option<&Region> {
        let idx = self.regions.partition_point(|r| r.range.end <= offset);
        self.regions
            .get(idx)
            .filter(|r| r.range.start <= offset && offset < r.range.end)
    }

    /// The string literal starting exactly at `offset`, if any
    pub fn string_starting_at(&self, offset: usize) -> Option<&Region> {
        self.region_at(offset)
            .filter(|r| r.is_string() && r.range.start == offset)
    }

    /// All recorded regions in source order
    pub fn regions(&self) -> &[Region] {
        &self.regions
    }
}

/// Offset of the first `needle` at or after `from`
fn find(bytes: &[u8], from: usize, needle: &[u8]) -> Option<usize> {
    bytes
        .get(from..)?
        .windows(needle.len())
        .position(|w| w == needle)
        .map(|p| from + p)
}

/// Record inline HTML from `start` to the next open tag
///
/// Returns the offset just past the tag (`<?php`, `<?=` or `<?`), or the
/// end of input when no tag follows.
fn scan_html(bytes: &[u8], start: usize, regions: &mut Vec<Region>) -> usize {
    let tag = find(bytes, start, b"<?").unwrap_or(bytes.len());
    if tag > start {
        regions.push(Region { kind: RegionKind::InlineHtml, range: start..tag });
    }
    if tag == bytes.len() {
        return tag;
    }

    let after = tag + 2;
    match bytes.get(after..after + 3) {
        Some(word) if word.eq_ignore_ascii_case(b"php") => after + 3,
        _ if bytes.get(after) == Some(&b'=') => after + 1,
        _ => after,
    }
}

/// Return the offset one past the closing quote (or end of input)
fn scan_quoted(bytes: &[u8], start: usize, quote: u8) -> usize {
    let mut i = start + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            c if c == quote => return i + 1,
            _ => i += 1,
        }
    }
    bytes.len()
}

/// Return the offset ending a line comment: the newline, a `?>`, or end of input
fn scan_line(bytes: &[u8], start: usize) -> usize {
    let mut i = start;
    while i < bytes.len() {
        match bytes[i] {
            b'\n' => return i,
            b'?' if bytes.get(i + 1) == Some(&b'>') => return i,
            _ => i += 1,
        }
    }
    bytes.len()
}

fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b >= 0x80
}

/// Return the offset just past a heredoc/nowdoc closing identifier
///
/// `None` when the `<<<` at `start` does not open a well-formed heredoc.
/// An unclosed heredoc runs to the end of input.
fn scan_heredoc(bytes: &[u8], start: usize) -> Option<usize> {
    let mut i = start + 3;
    while matches!(bytes.get(i), Some(b' ' | b'\t')) {
        i += 1;
    }

    let quote = match bytes.get(i) {
        Some(&q @ (b'\'' | b'"')) => {
            i += 1;
            Some(q)
        }
        _ => None,
    };

    let ident_start = i;
    while bytes.get(i).is_some_and(|&b| is_ident_byte(b)) {
        i += 1;
    }
    if i == ident_start || bytes[ident_start].is_ascii_digit() {
        return None;
    }
    let ident = &bytes[ident_start..i];

    if let Some(q) = quote {
        if bytes.get(i) != Some(&q) {
            return None;
        }
        i += 1;
    }

    match bytes.get(i) {
        Some(b'\n') => i += 1,
        Some(b'\r') if bytes.get(i + 1) == Some(&b'\n') => i += 2,
        _ => return None,
    }

    let mut line = i;
    while line < bytes.len() {
        let mut j = line;
        while matches!(bytes.get(j), Some(b' ' | b'\t')) {
            j += 1;
        }
        if bytes[j..].starts_with(ident)
            && !bytes.get(j + ident.len()).is_some_and(|&b| is_ident_byte(b))
        {
            return Some(j + ident.len());
        }
        match find(bytes, line, b"\n") {
            Some(newline) => line = newline + 1,
            None => break,
        }
    }
    Some(bytes.len())
}

/// Find the `)` matching the `(` at `open`, skipping literals and comments
///
/// `map` must have been built from the same `source`.
pub fn matching_paren(source: &str, map: &CodeMap, open: usize) -> Option<usize> {
    let bytes = source.as_bytes();
    if bytes.get(open) != Some(&b'(') {
        return None;
    }

    let mut depth = 0usize;
    let mut i = open;
    while i < bytes.len() {
        if let Some(region) = map.region_at(i) {
            i = region.range.end;
            continue;
        }
        match bytes[i] {
            b'(' => depth += 1,
            b')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
        i += 1;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_code() {
        let map = CodeMap::new("$a = 1;");
        assert!(map.regions().is_empty());
        assert!(map.is_code(0));
    }

    #[test]
    fn test_string_regions() {
        let source = "$s = 'a' . \"b\";";
        let map = CodeMap::new(source);

        assert_eq!(map.regions().len(), 2);
        assert!(!map.is_code(5));
        assert!(!map.is_code(6));
        assert!(map.is_code(9));
        assert_eq!(map.regions()[1].kind, RegionKind::DoubleQuoted);
    }

    #[test]
    fn test_escaped_quote_stays_inside() {
        let source = r#"$s = "a \" or b"; $t"#;
        let map = CodeMap::new(source);

        assert_eq!(map.regions().len(), 1);
        let or_pos = source.find("or").unwrap();
        assert!(!map.is_code(or_pos));
        assert!(map.is_code(source.find("$t").unwrap()));
    }

    #[test]
    fn test_mixed_quotes() {
        let source = r#"$s = "it's"; $x or $y"#;
        let map = CodeMap::new(source);

        assert_eq!(map.regions().len(), 1);
        assert!(map.is_code(source.find("or").unwrap()));
    }

    #[test]
    fn test_comments() {
        let source = "// else if\n# TRUE\n/* and */ $a #[Attr]";
        let map = CodeMap::new(source);

        assert!(!map.is_code(3));
        assert!(!map.is_code(source.find("TRUE").unwrap()));
        assert!(!map.is_code(source.find("and").unwrap()));
        assert!(map.is_code(source.find("$a").unwrap()));
        assert!(map.is_code(source.find("#[").unwrap()));
        assert_eq!(map.regions()[0].range, 0..10);
    }

    #[test]
    fn test_unterminated_string() {
        let map = CodeMap::new("$a = 'open");
        assert!(!map.is_code(9));
    }

    #[test]
    fn test_string_starting_at() {
        let source = "include 'x.php';";
        let map = CodeMap::new(source);

        assert!(map.string_starting_at(8).is_some());
        assert!(map.string_starting_at(9).is_none());
    }

    #[test]
    fn test_matching_paren() {
        let source = "if (a(b) && c(')'))";
        let map = CodeMap::new(source);

        assert_eq!(matching_paren(source, &map, 3), Some(source.len() - 1));
        assert_eq!(matching_paren(source, &map, 5), Some(7));
        assert_eq!(matching_paren(source, &map, 0), None);
    }

    #[test]
    fn test_unbalanced_paren() {
        let source = "if (a";
        let map = CodeMap::new(source);
        assert_eq!(matching_paren(source, &map, 3), None);
    }

    #[test]
    fn test_inline_html_is_not_code() {
        let source = "<p>Don't panic</p>\n<?php $a = TRUE; ?>\n<p>It's fine</p>\n";
        let map = CodeMap::new(source);

        assert!(!map.is_code(source.find("Don't").unwrap()));
        assert!(map.is_code(source.find("TRUE").unwrap()));
        assert!(!map.is_code(source.find("It's").unwrap()));
        assert_eq!(map.regions()[0].kind, RegionKind::InlineHtml);
        assert_eq!(map.regions().len(), 2);
    }

    #[test]
    fn test_short_echo_and_uppercase_tags() {
        let source = "<b><?= $x ?></b><?PHP $y; ?>";
        let map = CodeMap::new(source);

        assert!(map.is_code(source.find("$x").unwrap()));
        assert!(!map.is_code(source.find("</b>").unwrap()));
        assert!(map.is_code(source.find("$y").unwrap()));
    }

    #[test]
    fn test_line_comment_ends_at_close_tag() {
        let source = "<?php // it's a comment ?><p>'</p><?php $z;";
        let map = CodeMap::new(source);

        assert!(!map.is_code(source.find("it's").unwrap()));
        assert!(!map.is_code(source.find("<p>").unwrap()));
        assert!(map.is_code(source.find("$z").unwrap()));
    }

    #[test]
    fn test_heredoc_body() {
        let source = "<?php\n$s = <<<EOT\nIt's TRUE\n  EOT;\nif ($a) {}\n";
        let map = CodeMap::new(source);

        assert!(!map.is_code(source.find("It's").unwrap()));
        assert!(!map.is_code(source.find("TRUE").unwrap()));
        assert!(map.is_code(source.find("if").unwrap()));
        assert_eq!(map.regions()[0].kind, RegionKind::Heredoc);
        assert_eq!(&source[map.regions()[0].range.clone()], "<<<EOT\nIt's TRUE\n  EOT");
    }

    #[test]
    fn test_nowdoc_body() {
        let source = "<?php $s = <<<'SQL'\nSELECT 'x' or y\nSQL;\n$t = 'a';";
        let map = CodeMap::new(source);

        assert!(!map.is_code(source.find("or y").unwrap()));
        assert!(map.is_code(source.find("$t").unwrap()));
        assert_eq!(map.regions()[1].kind, RegionKind::SingleQuoted);
    }

    #[test]
    fn test_shift_operator_is_not_heredoc() {
        let source = "$a = $b <<< $c; $d = 'x';";
        let map = CodeMap::new(source);

        assert!(map.is_code(source.find("$d").unwrap()));
    }

    #[test]
    fn test_is_terminated() {
        let source = "'done' \"open";
        let map = CodeMap::new(source);

        assert!(map.regions()[0].is_terminated(source));
        assert!(!map.regions()[1].is_terminated(source));
    }
}
