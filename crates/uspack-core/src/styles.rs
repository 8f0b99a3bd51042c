//! Stylesheet processing chain.
//!
//! A fixed, ordered list of transform steps, each tagged with the modes it
//! runs in. Development runs utility generation only; production
//! additionally runs vendor prefixing and rule compaction, in that order
//! (utilities must be expanded before prefixing, prefixing before compaction
//! so compaction sees the final rule set). Stages are declared at compile
//! time; there is no dynamic step discovery.

use std::fs;
use std::path::{Path, PathBuf};

use globset::{Glob, GlobSet, GlobSetBuilder};
use walkdir::WalkDir;

use crate::error::{Error, Result};
use crate::mode::BuildMode;

/// Class prefix for generated utility rules.
pub const UTILITY_PREFIX: &str = "_ba-";

/// Content globs scanned for utility-class usage, relative to the project root.
pub const CONTENT_GLOBS: &[&str] = &["src/**/*.js", "src/**/*.comp"];

/// Utility-class universe: class suffix and its declarations.
///
/// Scales follow the project theme (quarter-rem spacing, the extended
/// z-index and inset values).
const UTILITIES: &[(&str, &str)] = &[
    ("absolute", "position: absolute;"),
    ("fixed", "position: fixed;"),
    ("flex", "display: flex;"),
    ("hidden", "display: none;"),
    ("inset-1/2", "top: 50%; left: 50%;"),
    ("m-9", "margin: 2.25rem;"),
    ("mt-9", "margin-top: 2.25rem;"),
    ("p-14", "padding: 3.5rem;"),
    ("p-9", "padding: 2.25rem;"),
    ("relative", "position: relative;"),
    ("select-none", "user-select: none;"),
    ("sticky", "position: sticky;"),
    ("top-1/2", "top: 50%;"),
    ("top-9", "top: 2.25rem;"),
    ("z-1000", "z-index: 1000;"),
    ("z-150", "z-index: 150;"),
];

/// Properties duplicated with vendor prefixes in production.
const PREFIXED_PROPERTIES: &[(&str, &[&str])] = &[
    ("appearance", &["-webkit-", "-moz-"]),
    ("backdrop-filter", &["-webkit-"]),
    ("text-size-adjust", &["-webkit-", "-moz-", "-ms-"]),
    ("user-select", &["-webkit-", "-moz-", "-ms-"]),
];

/// Inputs shared by every step.
#[derive(Debug, Clone)]
pub struct StyleContext {
    /// Current build mode.
    pub mode: BuildMode,
    /// Project root the content globs are resolved against.
    pub project_root: PathBuf,
}

/// One transform step in the chain.
pub struct StyleStep {
    /// Step name, used in error reports.
    pub name: &'static str,
    production_only: bool,
    transform: fn(&str, &StyleContext) -> Result<String>,
}

impl StyleStep {
    /// Whether this step runs for `mode`.
    pub fn enabled(&self, mode: BuildMode) -> bool {
        !self.production_only || mode.is_production()
    }
}

impl std::fmt::Debug for StyleStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StyleStep")
            .field("name", &self.name)
            .field("production_only", &self.production_only)
            .finish()
    }
}

/// The fixed, ordered transform chain.
#[derive(Debug)]
pub struct StyleChain {
    steps: Vec<StyleStep>,
}

impl Default for StyleChain {
    fn default() -> Self {
        Self::standard()
    }
}

impl StyleChain {
    /// The standard chain: utilities, then autoprefix (production), then
    /// compaction (production).
    pub fn standard() -> Self {
        Self {
            steps: vec![
                StyleStep {
                    name: "utilities",
                    production_only: false,
                    transform: generate_utilities,
                },
                StyleStep {
                    name: "autoprefix",
                    production_only: true,
                    transform: autoprefix,
                },
                StyleStep {
                    name: "compact",
                    production_only: true,
                    transform: compact,
                },
            ],
        }
    }

    /// Names of the steps enabled for `mode`, in execution order.
    pub fn enabled_steps(&self, mode: BuildMode) -> Vec<&'static str> {
        self.steps
            .iter()
            .filter(|s| s.enabled(mode))
            .map(|s| s.name)
            .collect()
    }

    /// Run the aggregated stylesheet through the enabled steps.
    pub fn process(&self, css: &str, ctx: &StyleContext) -> Result<String> {
        let mut out = css.to_string();
        for step in &self.steps {
            if !step.enabled(ctx.mode) {
                continue;
            }
            tracing::debug!(step = step.name, "running style step");
            out = (step.transform)(&out, ctx)?;
        }
        Ok(out)
    }
}

/// Append utility rules for every class the source actually references.
///
/// A static scan over the content globs, run before compaction so later
/// steps see fully-expanded rules.
fn generate_utilities(css: &str, ctx: &StyleContext) -> Result<String> {
    let sources = read_content_files(ctx)?;

    let mut out = css.to_string();
    for (suffix, declarations) in UTILITIES {
        let class = format!("{UTILITY_PREFIX}{suffix}");
        if !sources.iter().any(|s| s.contains(&class)) {
            continue;
        }
        if !out.is_empty() && !out.ends_with('\n') {
            out.push('\n');
        }
        out.push_str(&format!(
            ".{} {{ {} }}\n",
            escape_class(&class),
            declarations
        ));
    }
    Ok(out)
}

/// Read every file matched by the content globs.
fn read_content_files(ctx: &StyleContext) -> Result<Vec<String>> {
    let globs = content_globset().map_err(|e| Error::Style {
        step: "utilities".to_string(),
        message: e.to_string(),
    })?;

    let mut contents = Vec::new();
    for entry in WalkDir::new(&ctx.project_root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
    {
        let relative = match entry.path().strip_prefix(&ctx.project_root) {
            Ok(p) => p,
            Err(_) => continue,
        };
        if globs.is_match(relative) {
            contents.push(fs::read_to_string(entry.path())?);
        }
    }
    Ok(contents)
}

fn content_globset() -> std::result::Result<GlobSet, globset::Error> {
    let mut builder = GlobSetBuilder::new();
    for glob in CONTENT_GLOBS {
        builder.add(Glob::new(glob)?);
    }
    builder.build()
}

/// Escape characters that are special in a CSS class selector.
fn escape_class(class: &str) -> String {
    class.replace('/', "\\/")
}

/// Duplicate known declarations with vendor-prefixed copies.
fn autoprefix(css: &str, _ctx: &StyleContext) -> Result<String> {
    let mut out = css.to_string();
    for (property, prefixes) in PREFIXED_PROPERTIES {
        out = prefix_property(&out, property, prefixes);
    }
    Ok(out)
}

/// Insert `-vendor-prop: value;` copies before each `prop: value` declaration.
fn prefix_property(css: &str, property: &str, prefixes: &[&str]) -> String {
    let needle = format!("{property}:");
    let mut out = String::with_capacity(css.len());
    let mut consumed = 0;

    while let Some(pos) = css[consumed..].find(&needle) {
        let abs = consumed + pos;

        // Skip matches that are themselves already prefixed
        // (e.g. `-webkit-user-select:`) or part of a longer ident.
        let prev = css[..abs].chars().next_back();
        let standalone = !matches!(prev, Some(c) if c == '-' || c.is_ascii_alphanumeric());

        out.push_str(&css[consumed..abs]);
        if standalone {
            let after = &css[abs + needle.len()..];
            let value_end = after.find([';', '}']).unwrap_or(after.len());
            let value = after[..value_end].trim();
            for prefix in prefixes {
                out.push_str(&format!("{prefix}{property}: {value}; "));
            }
        }
        out.push_str(&needle);
        consumed = abs + needle.len();
    }
    out.push_str(&css[consumed..]);
    out
}

/// Strip comments, collapse whitespace, and drop empty rules.
///
/// The scan copies quoted strings verbatim and distinguishes selector
/// context from declaration blocks: ahead of a pseudo-class a space is a
/// descendant combinator (`.menu :hover`), so `:` is only tightened where
/// it terminates a property name.
fn compact(css: &str, _ctx: &StyleContext) -> Result<String> {
    let chars: Vec<char> = css.chars().collect();
    let mut out = String::with_capacity(css.len());

    // Open blocks: whether the block holds declarations (false for at-rule
    // bodies such as `@media`, which nest further rules), and where the
    // current selector started in `out` so empty rules can be dropped.
    let mut blocks: Vec<(bool, usize)> = Vec::new();
    let mut seg_start = 0;
    let mut at_rule = false;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            '/' if chars.get(i + 1) == Some(&'*') => {
                i += 2;
                while i + 1 < chars.len() && !(chars[i] == '*' && chars[i + 1] == '/') {
                    i += 1;
                }
                i = (i + 2).min(chars.len());
            }
            '"' | '\'' => {
                i = copy_quoted(&chars, i, c, &mut out);
            }
            '@' => {
                at_rule = true;
                out.push(c);
                i += 1;
            }
            '{' => {
                trim_space(&mut out);
                blocks.push((!at_rule, seg_start));
                at_rule = false;
                out.push('{');
                seg_start = out.len();
                i += 1;
            }
            '}' => {
                trim_space(&mut out);
                while out.ends_with(';') {
                    out.pop();
                }
                let (_, sel_start) = blocks.pop().unwrap_or((true, 0));
                if out.ends_with('{') {
                    // Empty rule: drop the selector along with the braces.
                    out.truncate(sel_start);
                } else {
                    out.push('}');
                }
                seg_start = out.len();
                i += 1;
            }
            ';' => {
                trim_space(&mut out);
                out.push(';');
                at_rule = false;
                seg_start = out.len();
                i += 1;
            }
            ',' => {
                trim_space(&mut out);
                out.push(',');
                i += 1;
            }
            ':' => {
                if blocks.last().is_some_and(|(decls, _)| *decls) {
                    trim_space(&mut out);
                }
                out.push(':');
                i += 1;
            }
            c if c.is_whitespace() => {
                if !out.is_empty() && !out.ends_with(['{', '}', ';', ',', ':', ' ']) {
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

    Ok(out.trim().to_string())
}

/// Copy a quoted string verbatim, returning the index past it.
fn copy_quoted(chars: &[char], start: usize, delim: char, out: &mut String) -> usize {
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
        }
    }
    i
}

/// Remove a trailing space left by whitespace collapsing.
fn trim_space(out: &mut String) {
    while out.ends_with(' ') {
        out.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn project_with_source(source: &str) -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("src")).unwrap();
        fs::write(dir.path().join("src/main.js"), source).unwrap();
        dir
    }

    fn ctx(dir: &TempDir, mode: BuildMode) -> StyleContext {
        StyleContext {
            mode,
            project_root: dir.path().to_path_buf(),
        }
    }

    #[test]
    fn test_development_runs_utilities_only() {
        let chain = StyleChain::standard();
        assert_eq!(
            chain.enabled_steps(BuildMode::Development),
            vec!["utilities"]
        );
        assert_eq!(
            chain.enabled_steps(BuildMode::Production),
            vec!["utilities", "autoprefix", "compact"]
        );
    }

    #[test]
    fn test_utilities_purged_to_referenced_classes() {
        let dir = project_with_source("el.className = '_ba-hidden _ba-z-150';\n");
        let chain = StyleChain::standard();
        let out = chain
            .process("", &ctx(&dir, BuildMode::Development))
            .unwrap();

        assert!(out.contains("._ba-hidden { display: none; }"));
        assert!(out.contains("._ba-z-150 { z-index: 150; }"));
        assert!(!out.contains("_ba-flex"));
    }

    #[test]
    fn test_slash_classes_are_escaped() {
        let dir = project_with_source("panel.className = '_ba-top-1/2';\n");
        let chain = StyleChain::standard();
        let out = chain
            .process("", &ctx(&dir, BuildMode::Development))
            .unwrap();
        assert!(out.contains("._ba-top-1\\/2 { top: 50%; }"));
    }

    #[test]
    fn test_autoprefix_duplicates_known_properties() {
        let dir = project_with_source("");
        let out = autoprefix(
            ".a { user-select: none; color: red; }",
            &ctx(&dir, BuildMode::Production),
        )
        .unwrap();

        assert!(out.contains("-webkit-user-select: none;"));
        assert!(out.contains("-moz-user-select: none;"));
        assert!(out.contains("-ms-user-select: none;"));
        // The unprefixed declaration stays, and unrelated ones are untouched.
        assert!(out.contains("user-select: none"));
        assert_eq!(out.matches("color:").count(), 1);
    }

    #[test]
    fn test_autoprefix_does_not_reprefix() {
        let dir = project_with_source("");
        let out = autoprefix(
            ".a { -webkit-user-select: none; }",
            &ctx(&dir, BuildMode::Production),
        )
        .unwrap();
        assert_eq!(out.matches("-webkit-user-select:").count(), 1);
    }

    #[test]
    fn test_compact_strips_comments_and_whitespace() {
        let dir = project_with_source("");
        let out = compact(
            "/* note */\n.a {\n  color: red;\n}\n\n.empty {\n}\n",
            &ctx(&dir, BuildMode::Production),
        )
        .unwrap();
        assert_eq!(out, ".a{color:red}");
    }

    #[test]
    fn test_compact_keeps_descendant_pseudo_class_selector() {
        // `.menu :hover` matches hovered descendants; dropping the space
        // would retarget the rule at the menu itself.
        let dir = project_with_source("");
        let out = compact(
            ".menu :hover {\n  color: red;\n}\n",
            &ctx(&dir, BuildMode::Production),
        )
        .unwrap();
        assert_eq!(out, ".menu :hover{color:red}");
    }

    #[test]
    fn test_compact_leaves_string_values_untouched() {
        let dir = project_with_source("");
        let out = compact(
            ".a::before {\n  content: \"a  b;\";\n}\n",
            &ctx(&dir, BuildMode::Production),
        )
        .unwrap();
        assert_eq!(out, ".a::before{content:\"a  b;\"}");
    }

    #[test]
    fn test_compact_media_query_keeps_inner_selectors() {
        let dir = project_with_source("");
        let out = compact(
            "@media (min-width: 600px) {\n  .nav :focus { outline: none; }\n}\n",
            &ctx(&dir, BuildMode::Production),
        )
        .unwrap();
        assert_eq!(out, "@media (min-width:600px){.nav :focus{outline:none}}");
    }

    #[test]
    fn test_production_chain_order() {
        // Prefixing must happen before compaction: the compacted output
        // still contains the prefixed declarations.
        let dir = project_with_source("label.className = '_ba-select-none';\n");
        let chain = StyleChain::standard();
        let out = chain
            .process("", &ctx(&dir, BuildMode::Production))
            .unwrap();

        assert!(out.contains("-webkit-user-select:none"));
        assert!(!out.contains('\n'));
    }
}
