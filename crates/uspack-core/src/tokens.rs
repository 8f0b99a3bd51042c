//! Token table and single-pass literal replacement.
//!
//! Token substitution runs before compilation so replaced content takes part
//! in type-checking and bundling like ordinary source. Replacement is exact
//! literal matching over the whole program in one left-to-right pass: if a
//! replacement value itself contains another token's key, that key is left
//! unexpanded. Collisions between a token key and legitimate source text are
//! not detected; keys use reserved shapes (`icon__*`, `__BANNER__`) instead.

use aho_corasick::{AhoCorasick, MatchKind};

use crate::error::{Error, Result};
use crate::mode::BuildMode;

/// Token key for the environment-mode literal.
pub const ENV_MODE_TOKEN: &str = "process.env.NODE_ENV";

/// Token key for the startup banner art.
pub const BANNER_ART_TOKEN: &str = "__BANNER__";

/// Insertion-ordered mapping of token key to replacement text.
///
/// Keys are unique; inserting a key twice is an error.
#[derive(Debug, Clone, Default)]
pub struct TokenTable {
    entries: Vec<(String, String)>,
}

impl TokenTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a token.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateToken`] if `key` is already registered.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Result<()> {
        let key = key.into();
        if self.entries.iter().any(|(k, _)| *k == key) {
            return Err(Error::DuplicateToken(key));
        }
        self.entries.push((key, value.into()));
        Ok(())
    }

    /// Look up a replacement value.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Number of registered tokens.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Register the environment-mode token for `mode`.
    ///
    /// The value is JSON-quoted so the substituted literal is a valid string
    /// expression in the output program.
    pub fn insert_env_mode(&mut self, mode: BuildMode) -> Result<()> {
        self.insert(ENV_MODE_TOKEN, format!("\"{}\"", mode.as_str()))
    }

    /// Register the banner-art token: rendered block letters in production,
    /// a plain placeholder during development.
    pub fn insert_banner_art(&mut self, mode: BuildMode, name: &str) -> Result<()> {
        let value = match mode {
            BuildMode::Production => crate::banner::render_logo(name),
            BuildMode::Development => "LOGO".to_string(),
        };
        self.insert(BANNER_ART_TOKEN, value)
    }
}

/// Whole-program literal token replacer.
///
/// Built once per build from the finished table. The automaton matches
/// leftmost-longest, so a key that is a prefix of another key never shadows
/// it, and the single `replace_all` pass guarantees replacement values are
/// never rescanned.
#[derive(Debug)]
pub struct TokenReplacer {
    automaton: AhoCorasick,
    values: Vec<String>,
}

impl TokenReplacer {
    /// Compile a replacer from `table`.
    pub fn new(table: &TokenTable) -> Self {
        let keys: Vec<&str> = table.entries.iter().map(|(k, _)| k.as_str()).collect();
        let values = table.entries.iter().map(|(_, v)| v.clone()).collect();

        // An empty pattern set is still a valid automaton; apply() is then
        // the identity.
        let automaton = AhoCorasick::builder()
            .match_kind(MatchKind::LeftmostLongest)
            .build(&keys)
            .expect("token keys form a valid pattern set");

        Self { automaton, values }
    }

    /// Replace every literal token occurrence in `source`, in one pass.
    pub fn apply(&self, source: &str) -> String {
        if self.values.is_empty() {
            return source.to_string();
        }
        self.automaton.replace_all(source, &self.values)
    }
}
