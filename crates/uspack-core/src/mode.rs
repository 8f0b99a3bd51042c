//! Build mode selection.

use std::env;

/// Environment flag that selects the build mode.
///
/// Unset, `"false"` or `"0"` means [`BuildMode::Production`]; any other value
/// means [`BuildMode::Development`]. Read once at startup.
pub const MODE_ENV_VAR: &str = "USPACK_WATCH";

/// Development vs Production selector.
///
/// Immutable for the lifetime of one build invocation; governs every
/// mode-dependent decision in the pipeline (source maps, minification,
/// banner, style-chain membership, dev-server activation).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildMode {
    Development,
    Production,
}

impl BuildMode {
    /// Read the mode from the `USPACK_WATCH` environment flag.
    pub fn from_env() -> Self {
        match env::var(MODE_ENV_VAR) {
            Ok(v) if v != "false" && v != "0" && !v.is_empty() => Self::Development,
            _ => Self::Production,
        }
    }

    /// Lowercase mode name, as substituted for `process.env.NODE_ENV`.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
        }
    }

    pub fn is_production(self) -> bool {
        matches!(self, Self::Production)
    }

    pub fn is_development(self) -> bool {
        matches!(self, Self::Development)
    }
}
