//! Bundle compaction (production only).
//!
//! A conservative single-pass minifier: it drops comments, indentation and
//! blank lines and collapses interior whitespace, without touching string or
//! template literal contents. The one correctness-critical rule is the
//! comment policy: a line comment survives only if it mentions one of the
//! recognized metadata keywords (see [`crate::banner`]). Script managers
//! locate the metadata block by scanning comments for those exact tokens, so
//! too narrow a predicate silently breaks the artifact and too broad a one
//! leaks ordinary comments into production output.

use aho_corasick::AhoCorasick;

use crate::banner::preserved_keywords;

/// Production bundle minifier.
///
/// The preserved-keyword predicate is compiled once per instance.
#[derive(Debug)]
pub struct Minifier {
    keywords: AhoCorasick,
}

impl Default for Minifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Minifier {
    /// Build a minifier with the standard keyword set.
    pub fn new() -> Self {
        let keywords = AhoCorasick::builder()
            .ascii_case_insensitive(true)
            .build(preserved_keywords())
            .expect("keyword list forms a valid pattern set");
        Self { keywords }
    }

    /// Whether a line comment with `content` must survive minification.
    ///
    /// Single case-insensitive multi-pattern test; block comments are never
    /// candidates.
    pub fn preserves_comment(&self, content: &str) -> bool {
        self.keywords.is_match(content)
    }

    /// Compact `source` and return the minified text.
    pub fn minify(&self, source: &str) -> String {
        let chars: Vec<char> = source.chars().collect();
        let mut out = String::with_capacity(source.len() / 2);
        let mut i = 0;

        while i < chars.len() {
            let c = chars[i];
            match c {
                '/' if chars.get(i + 1) == Some(&'/') => {
                    let start = i + 2;
                    let mut end = start;
                    while end < chars.len() && chars[end] != '\n' {
                        end += 1;
                    }
                    let content: String = chars[start..end].iter().collect();
                    if self.preserves_comment(&content) {
                        trim_line_end(&mut out);
                        if !out.is_empty() && !out.ends_with('\n') {
                            out.push('\n');
                        }
                        out.push_str("//");
                        out.push_str(&content);
                        out.push('\n');
                    }
                    // Leave the terminating newline for the '\n' arm so a
                    // dropped trailing comment cannot merge two lines.
                    i = end;
                }
                '/' if chars.get(i + 1) == Some(&'*') => {
                    let mut end = i + 2;
                    while end + 1 < chars.len() && !(chars[end] == '*' && chars[end + 1] == '/') {
                        end += 1;
                    }
                    i = (end + 2).min(chars.len());
                }
                '\'' | '"' | '`' => {
                    i = copy_literal(&chars, i, c, &mut out);
                }
                '\n' => {
                    trim_line_end(&mut out);
                    if !out.is_empty() && !out.ends_with('\n') {
                        out.push('\n');
                    }
                    i += 1;
                }
                ' ' | '\t' | '\r' => {
                    // Collapse runs; drop entirely at line start.
                    if !out.is_empty() && !out.ends_with([' ', '\n']) {
                        out.push(' ');
                    }
                    i += 1;
                }
                _ => {
                    out.push(c);
                    i += 1;
                }
            }
        }

        trim_line_end(&mut out);
        if !out.is_empty() && !out.ends_with('\n') {
            out.push('\n');
        }
        out
    }
}

/// Copy a string or template literal verbatim, returning the index past it.
fn copy_literal(chars: &[char], start: usize, delim: char, out: &mut String) -> usize {
    out.push(delim);
    let mut i = start + 1;
    while i < chars.len() {
        let c = chars[i];
        out.push(c);
        i += 1;
        if c == '\\' && i < chars.len() {
            out.push(chars[i]);
            i += 1;
        } else if c == delim {
            break;
        } else if c == '\n' && delim != '`' {
            // Unterminated single-line string; bail out of literal mode.
            break;
        }
    }
    i
}

/// Remove a trailing space left by whitespace collapsing.
fn trim_line_end(out: &mut String) {
    while out.ends_with(' ') {
        out.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordinary_line_comment_is_dropped() {
        let m = Minifier::new();
        let out = m.minify("// helper for the thing\nvar a = 1;\n");
        assert!(!out.contains("helper"));
        assert!(out.contains("var a = 1;"));
    }

    #[test]
    fn test_mixed_case_version_comment_survives() {
        let m = Minifier::new();
        let src = "// just noise\n// @VeRsIoN 2.0.0\nvar a = 1;\n";
        let out = m.minify(src);
        assert!(out.contains("// @VeRsIoN 2.0.0"));
        assert!(!out.contains("noise"));
    }

    #[test]
    fn test_sentinel_comment_survives() {
        let m = Minifier::new();
        let out = m.minify("// ==UserScript==\nlet x = 0;\n// ==/UserScript==\n");
        assert!(out.contains("// ==UserScript=="));
        assert!(out.contains("// ==/UserScript=="));
    }

    #[test]
    fn test_block_comments_never_survive() {
        let m = Minifier::new();
        let out = m.minify("/* @version 1.0 */\nvar a = 1;\n");
        assert!(!out.contains("@version"));
        assert!(out.contains("var a = 1;"));
    }

    #[test]
    fn test_strings_are_untouched() {
        let m = Minifier::new();
        let src = "var s = \"  // not a comment  \";\nvar t = '  spaced  ';\n";
        let out = m.minify(src);
        assert!(out.contains("\"  // not a comment  \""));
        assert!(out.contains("'  spaced  '"));
    }

    #[test]
    fn test_template_literal_lines_are_untouched() {
        let m = Minifier::new();
        let src = "var art = `line one\n   indented line`;\nvar a = 1;\n";
        let out = m.minify(src);
        assert!(out.contains("`line one\n   indented line`"));
    }

    #[test]
    fn test_indentation_and_blank_lines_removed() {
        let m = Minifier::new();
        let src = "function f() {\n        return 1;\n}\n\n\nf();\n";
        let out = m.minify(src);
        assert!(out.contains("\nreturn 1;\n"));
        assert!(!out.contains("\n\n"));
    }

    #[test]
    fn test_escaped_quote_inside_string() {
        let m = Minifier::new();
        let out = m.minify("var s = 'it\\'s  fine';  \n");
        assert!(out.contains("'it\\'s  fine'"));
    }
}
