//! Userscript metadata banner.
//!
//! The production artifact opens with a fixed-order comment block that
//! script managers parse to install and update the script. The recognized
//! tag names live here as a typed list so the banner fields and the
//! minifier's preserved-keyword predicate cannot drift apart.

use crate::manifest::PackageDescriptor;

/// Opening sentinel line of the metadata block.
pub const BLOCK_START: &str = "// ==UserScript==";

/// Closing sentinel line of the metadata block.
pub const BLOCK_END: &str = "// ==/UserScript==";

/// Sentinel word shared by both delimiter lines.
pub const SENTINEL: &str = "UserScript";

/// Fixed `@include` pattern emitted in every banner.
pub const INCLUDE_PATTERN: &str = "*://*/*";

/// Metadata tags recognized by the script-manager ecosystem.
///
/// Exact membership is a compatibility contract: the minifier preserves any
/// line comment mentioning one of these tags (or the block sentinel), and
/// nothing else.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetaTag {
    Name,
    Namespace,
    Version,
    Author,
    Description,
    Homepage,
    HomepageUrl,
    Website,
    Source,
    Icon,
    IconUrl,
    DefaultIcon,
    Icon64,
    Icon64Url,
    UpdateUrl,
    DownloadUrl,
    SupportUrl,
    Include,
    Match,
    Exclude,
    Require,
    Resource,
    Connect,
    RunAt,
    Grant,
    Noframes,
    Unwrap,
    Nocompat,
}

impl MetaTag {
    /// Every recognized tag, in ecosystem order.
    pub const ALL: [MetaTag; 28] = [
        MetaTag::Name,
        MetaTag::Namespace,
        MetaTag::Version,
        MetaTag::Author,
        MetaTag::Description,
        MetaTag::Homepage,
        MetaTag::HomepageUrl,
        MetaTag::Website,
        MetaTag::Source,
        MetaTag::Icon,
        MetaTag::IconUrl,
        MetaTag::DefaultIcon,
        MetaTag::Icon64,
        MetaTag::Icon64Url,
        MetaTag::UpdateUrl,
        MetaTag::DownloadUrl,
        MetaTag::SupportUrl,
        MetaTag::Include,
        MetaTag::Match,
        MetaTag::Exclude,
        MetaTag::Require,
        MetaTag::Resource,
        MetaTag::Connect,
        MetaTag::RunAt,
        MetaTag::Grant,
        MetaTag::Noframes,
        MetaTag::Unwrap,
        MetaTag::Nocompat,
    ];

    /// The tag token as it appears in a banner line, `@` included.
    pub fn as_str(self) -> &'static str {
        match self {
            MetaTag::Name => "@name",
            MetaTag::Namespace => "@namespace",
            MetaTag::Version => "@version",
            MetaTag::Author => "@author",
            MetaTag::Description => "@description",
            MetaTag::Homepage => "@homepage",
            MetaTag::HomepageUrl => "@homepageURL",
            MetaTag::Website => "@website",
            MetaTag::Source => "@source",
            MetaTag::Icon => "@icon",
            MetaTag::IconUrl => "@iconURL",
            MetaTag::DefaultIcon => "@defaulticon",
            MetaTag::Icon64 => "@icon64",
            MetaTag::Icon64Url => "@icon64URL",
            MetaTag::UpdateUrl => "@updateURL",
            MetaTag::DownloadUrl => "@downloadURL",
            MetaTag::SupportUrl => "@supportURL",
            MetaTag::Include => "@include",
            MetaTag::Match => "@match",
            MetaTag::Exclude => "@exclude",
            MetaTag::Require => "@require",
            MetaTag::Resource => "@resource",
            MetaTag::Connect => "@connect",
            MetaTag::RunAt => "@run-at",
            MetaTag::Grant => "@grant",
            MetaTag::Noframes => "@noframes",
            MetaTag::Unwrap => "@unwrap",
            MetaTag::Nocompat => "@nocompat",
        }
    }
}

/// The full keyword set the minifier must preserve: every tag plus the
/// block sentinel.
pub fn preserved_keywords() -> Vec<&'static str> {
    let mut keywords: Vec<&'static str> = MetaTag::ALL.iter().map(|t| t.as_str()).collect();
    keywords.push(SENTINEL);
    keywords
}

/// Render the banner block for `pkg`.
///
/// Byte-exact wire format: a leading blank line, the opening sentinel, one
/// `// @<field> <value>` line per field in fixed order (name, description,
/// author, include, version), the closing sentinel, a trailing newline.
pub fn render(pkg: &PackageDescriptor) -> String {
    format!(
        "\n{start}\n\
         // {name} {0}\n\
         // {description} {1}\n\
         // {author} {2}\n\
         // {include} {3}\n\
         // {version} {4}\n\
         {end}\n",
        pkg.name,
        pkg.description,
        pkg.author.name,
        INCLUDE_PATTERN,
        pkg.version,
        start = BLOCK_START,
        end = BLOCK_END,
        name = MetaTag::Name.as_str(),
        description = MetaTag::Description.as_str(),
        author = MetaTag::Author.as_str(),
        include = MetaTag::Include.as_str(),
        version = MetaTag::Version.as_str(),
    )
}

/// Five-row block glyphs for the startup logo.
///
/// Covers what package names are made of; anything else renders as a gap.
fn glyph(c: char) -> &'static [&'static str; 5] {
    match c.to_ascii_uppercase() {
        'A' => &[" ## ", "#  #", "####", "#  #", "#  #"],
        'B' => &["### ", "#  #", "### ", "#  #", "### "],
        'C' => &[" ###", "#   ", "#   ", "#   ", " ###"],
        'D' => &["### ", "#  #", "#  #", "#  #", "### "],
        'E' => &["####", "#   ", "### ", "#   ", "####"],
        'F' => &["####", "#   ", "### ", "#   ", "#   "],
        'G' => &[" ###", "#   ", "# ##", "#  #", " ###"],
        'H' => &["#  #", "#  #", "####", "#  #", "#  #"],
        'I' => &["###", " # ", " # ", " # ", "###"],
        'J' => &["  ##", "   #", "   #", "#  #", " ## "],
        'K' => &["#  #", "# # ", "##  ", "# # ", "#  #"],
        'L' => &["#   ", "#   ", "#   ", "#   ", "####"],
        'M' => &["#   #", "## ##", "# # #", "#   #", "#   #"],
        'N' => &["#  #", "## #", "# ##", "#  #", "#  #"],
        'O' => &[" ## ", "#  #", "#  #", "#  #", " ## "],
        'P' => &["### ", "#  #", "### ", "#   ", "#   "],
        'Q' => &[" ## ", "#  #", "#  #", "# ##", " ###"],
        'R' => &["### ", "#  #", "### ", "# # ", "#  #"],
        'S' => &[" ###", "#   ", " ## ", "   #", "### "],
        'T' => &["###", " # ", " # ", " # ", " # "],
        'U' => &["#  #", "#  #", "#  #", "#  #", " ## "],
        'V' => &["#   #", "#   #", " # # ", " # # ", "  #  "],
        'W' => &["#   #", "#   #", "# # #", "## ##", "#   #"],
        'X' => &["#  #", "#  #", " ## ", "#  #", "#  #"],
        'Y' => &["# #", "# #", " # ", " # ", " # "],
        'Z' => &["####", "  # ", " #  ", "#   ", "####"],
        '-' | '_' => &["   ", "   ", "###", "   ", "   "],
        '!' => &["#", "#", "#", " ", "#"],
        _ => &["  ", "  ", "  ", "  ", "  "],
    }
}

/// Render `text` as five rows of block letters.
///
/// Substituted for the `__BANNER__` token in production so the script can
/// print a startup logo to the console.
pub fn render_logo(text: &str) -> String {
    let mut rows = vec![String::new(); 5];
    for (i, c) in text.chars().enumerate() {
        let g = glyph(c);
        for (row, line) in rows.iter_mut().zip(g.iter()) {
            if i > 0 {
                row.push(' ');
            }
            row.push_str(line);
        }
    }
    rows.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::Author;

    fn descriptor() -> PackageDescriptor {
        PackageDescriptor {
            name: "X".to_string(),
            description: "D".to_string(),
            author: Author {
                name: "A".to_string(),
            },
            version: "1.0.0".to_string(),
        }
    }

    #[test]
    fn test_banner_is_byte_exact() {
        let expected = "\n\
            // ==UserScript==\n\
            // @name X\n\
            // @description D\n\
            // @author A\n\
            // @include *://*/*\n\
            // @version 1.0.0\n\
            // ==/UserScript==\n";
        assert_eq!(render(&descriptor()), expected);
    }

    #[test]
    fn test_preserved_keyword_set_is_pinned() {
        let keywords = preserved_keywords();
        assert_eq!(
            keywords,
            vec![
                "@name",
                "@namespace",
                "@version",
                "@author",
                "@description",
                "@homepage",
                "@homepageURL",
                "@website",
                "@source",
                "@icon",
                "@iconURL",
                "@defaulticon",
                "@icon64",
                "@icon64URL",
                "@updateURL",
                "@downloadURL",
                "@supportURL",
                "@include",
                "@match",
                "@exclude",
                "@require",
                "@resource",
                "@connect",
                "@run-at",
                "@grant",
                "@noframes",
                "@unwrap",
                "@nocompat",
                "UserScript",
            ]
        );
    }

    #[test]
    fn test_logo_has_five_rows() {
        let logo = render_logo("ok!");
        assert_eq!(logo.lines().count(), 5);
        assert!(logo.contains('#'));
    }

    #[test]
    fn test_logo_unknown_chars_render_as_gap() {
        let logo = render_logo("\u{41f}");
        assert!(logo.lines().all(|l| l.trim().is_empty()));
    }
}
