//! Inline icon catalog.
//!
//! Icons are injected into the application source at build time through the
//! token table: every catalog entry contributes an `icon__<name>` token whose
//! value is the icon's inline SVG serialization. Unreferenced tokens are
//! harmless, so the whole catalog is always exported.

use crate::tokens::TokenTable;

/// Prefix shared by every icon token key.
pub const ICON_TOKEN_PREFIX: &str = "icon__";

/// Inner markup for the builtin icons, in catalog order.
const BUILTIN: &[(&str, &str)] = &[
    (
        "alert-triangle",
        r#"<path d="M10.29 3.86L1.82 18a2 2 0 0 0 1.71 3h16.94a2 2 0 0 0 1.71-3L13.71 3.86a2 2 0 0 0-3.42 0z"></path><line x1="12" y1="9" x2="12" y2="13"></line><line x1="12" y1="17" x2="12.01" y2="17"></line>"#,
    ),
    (
        "check",
        r#"<polyline points="20 6 9 17 4 12"></polyline>"#,
    ),
    (
        "chevron-down",
        r#"<polyline points="6 9 12 15 18 9"></polyline>"#,
    ),
    (
        "eye",
        r#"<path d="M1 12s4-8 11-8 11 8 11 8-4 8-11 8-11-8-11-8z"></path><circle cx="12" cy="12" r="3"></circle>"#,
    ),
    (
        "eye-off",
        r#"<path d="M17.94 17.94A10.07 10.07 0 0 1 12 20c-7 0-11-8-11-8a18.45 18.45 0 0 1 5.06-5.94M9.9 4.24A9.12 9.12 0 0 1 12 4c7 0 11 8 11 8a18.5 18.5 0 0 1-2.16 3.19m-6.72-1.07a3 3 0 1 1-4.24-4.24"></path><line x1="1" y1="1" x2="23" y2="23"></line>"#,
    ),
    (
        "filter",
        r#"<polygon points="22 3 2 3 10 12.46 10 19 14 21 14 12.46 22 3"></polygon>"#,
    ),
    (
        "shield",
        r#"<path d="M12 22s8-4 8-10V5l-8-3-8 3v7c0 6 8 10 8 10z"></path>"#,
    ),
    (
        "x",
        r#"<line x1="18" y1="6" x2="6" y2="18"></line><line x1="6" y1="6" x2="18" y2="18"></line>"#,
    ),
];

/// A single named icon.
#[derive(Debug, Clone)]
pub struct Icon {
    /// Catalog name, e.g. `eye-off`.
    pub name: String,
    /// Inner SVG markup (shapes only, no outer `<svg>` element).
    pub contents: String,
}

impl Icon {
    /// Serialize the icon as a complete inline `<svg>` element.
    pub fn to_svg(&self) -> String {
        format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="24" height="24" viewBox="0 0 24 24" fill="none" stroke="currentColor" stroke-width="2" stroke-linecap="round" stroke-linejoin="round" class="icon icon-{name}">{contents}</svg>"#,
            name = self.name,
            contents = self.contents,
        )
    }
}

/// An ordered, named icon catalog.
#[derive(Debug, Clone, Default)]
pub struct IconCatalog {
    icons: Vec<Icon>,
}

impl IconCatalog {
    /// The catalog shipped with uspack.
    pub fn builtin() -> Self {
        let icons = BUILTIN
            .iter()
            .map(|(name, contents)| Icon {
                name: (*name).to_string(),
                contents: (*contents).to_string(),
            })
            .collect();
        Self { icons }
    }

    /// Look up an icon by name.
    pub fn get(&self, name: &str) -> Option<&Icon> {
        self.icons.iter().find(|icon| icon.name == name)
    }

    /// Number of icons in the catalog.
    pub fn len(&self) -> usize {
        self.icons.len()
    }

    /// Whether the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.icons.is_empty()
    }

    /// Iterate over the icons in catalog order.
    pub fn iter(&self) -> impl Iterator<Item = &Icon> {
        self.icons.iter()
    }

    /// Register one token per icon into `table`, keyed `icon__<name>`.
    ///
    /// Every icon is exported without filtering; the replacer only touches
    /// tokens that actually occur in the source.
    pub fn register_tokens(&self, table: &mut TokenTable) -> crate::error::Result<()> {
        for icon in &self.icons {
            table.insert(format!("{ICON_TOKEN_PREFIX}{}", icon.name), icon.to_svg())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_catalog_is_nonempty_and_unique() {
        let catalog = IconCatalog::builtin();
        assert!(!catalog.is_empty());

        let mut names: Vec<_> = catalog.iter().map(|i| i.name.as_str()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), catalog.len());
    }

    #[test]
    fn test_to_svg_wraps_contents() {
        let catalog = IconCatalog::builtin();
        let icon = catalog.get("x").unwrap();
        let svg = icon.to_svg();

        assert!(svg.starts_with("<svg "));
        assert!(svg.ends_with("</svg>"));
        assert!(svg.contains(r#"class="icon icon-x""#));
        assert!(svg.contains(&icon.contents));
    }

    #[test]
    fn test_register_tokens_covers_whole_catalog() {
        let catalog = IconCatalog::builtin();
        let mut table = TokenTable::new();
        catalog.register_tokens(&mut table).unwrap();

        for icon in catalog.iter() {
            let key = format!("icon__{}", icon.name);
            assert_eq!(table.get(&key), Some(icon.to_svg().as_str()));
        }
    }
}
