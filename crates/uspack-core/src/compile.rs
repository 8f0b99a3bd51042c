//! Source compilation seam.
//!
//! The real component framework and type checker are external; the pipeline
//! only needs pass/fail plus emitted code and any extracted style rules.
//! [`SourceCompiler`] is that seam, and [`ComponentCompiler`] is the thin
//! default adapter: it lowers `.comp` component units (script unwrapped,
//! markup preserved as a template constant, `<style>` blocks extracted) and
//! passes `.js` modules through after a structural well-formedness check.

use std::path::Path;

use crate::error::{Error, Result};

/// File extension of component-markup units.
pub const COMPONENT_EXT: &str = "comp";

/// File extension of plain logic modules.
pub const MODULE_EXT: &str = "js";

/// Output of compiling one source unit.
#[derive(Debug, Clone)]
pub struct CompiledUnit {
    /// Executable module code, imports still in place for the bundler.
    pub code: String,
    /// Style rules extracted from the unit, if any.
    pub css: Option<String>,
}

/// Compiles one source unit to executable form.
pub trait SourceCompiler {
    /// Compile `source`, read from `path`.
    ///
    /// # Errors
    ///
    /// Compilation failure is fatal to the current build pass.
    fn compile(&self, path: &Path, source: &str) -> Result<CompiledUnit>;
}

/// Default component/module lowering.
#[derive(Debug, Clone, Default)]
pub struct ComponentCompiler;

impl ComponentCompiler {
    pub fn new() -> Self {
        Self
    }

    fn compile_component(&self, path: &Path, source: &str) -> Result<CompiledUnit> {
        let mut rest = source.to_string();

        let mut styles = Vec::new();
        while let Some(block) = extract_block(&rest, "style") {
            styles.push(block.inner.trim().to_string());
            rest.replace_range(block.span.clone(), "");
        }

        let script = match extract_block(&rest, "script") {
            Some(block) => {
                let inner = block.inner.trim().to_string();
                rest.replace_range(block.span.clone(), "");
                inner
            }
            None => String::new(),
        };

        check_delimiters(path, &script)?;

        let mut code = script;
        let markup = rest.trim();
        if !markup.is_empty() {
            let name = template_const_name(path);
            if !code.is_empty() {
                code.push('\n');
            }
            code.push_str(&format!(
                "const {name} = `{}`;\n",
                escape_template(markup)
            ));
        }

        let css = if styles.is_empty() {
            None
        } else {
            Some(styles.join("\n"))
        };

        Ok(CompiledUnit { code, css })
    }
}

impl SourceCompiler for ComponentCompiler {
    fn compile(&self, path: &Path, source: &str) -> Result<CompiledUnit> {
        let is_component = path
            .extension()
            .is_some_and(|ext| ext == COMPONENT_EXT);

        if is_component {
            self.compile_component(path, source)
        } else {
            check_delimiters(path, source)?;
            Ok(CompiledUnit {
                code: source.to_string(),
                css: None,
            })
        }
    }
}

/// A tag block found in component markup.
struct TagBlock {
    inner: String,
    span: std::ops::Range<usize>,
}

/// Find the first `<tag …>…</tag>` block.
fn extract_block(source: &str, tag: &str) -> Option<TagBlock> {
    let open = format!("<{tag}");
    let close = format!("</{tag}>");

    let start = source.find(&open)?;
    let open_end = start + source[start..].find('>')? + 1;
    let inner_end = open_end + source[open_end..].find(&close)?;

    Some(TagBlock {
        inner: source[open_end..inner_end].to_string(),
        span: start..inner_end + close.len(),
    })
}

/// Derive the markup template constant name from the unit's file stem.
fn template_const_name(path: &Path) -> String {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("component");
    let sanitized: String = stem
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    format!("__{sanitized}_template")
}

/// Escape markup for embedding in a template literal.
fn escape_template(markup: &str) -> String {
    markup
        .replace('\\', "\\\\")
        .replace('`', "\\`")
        .replace("${", "\\${")
}

/// Structural pass/fail check standing in for the external type checker:
/// brackets must balance outside strings and comments.
fn check_delimiters(path: &Path, code: &str) -> Result<()> {
    let mut stack = Vec::new();
    let chars: Vec<char> = code.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            '/' if chars.get(i + 1) == Some(&'/') => {
                while i < chars.len() && chars[i] != '\n' {
                    i += 1;
                }
            }
            '/' if chars.get(i + 1) == Some(&'*') => {
                i += 2;
                while i + 1 < chars.len() && !(chars[i] == '*' && chars[i + 1] == '/') {
                    i += 1;
                }
                i += 2;
            }
            delim @ ('\'' | '"' | '`') => {
                i += 1;
                while i < chars.len() {
                    if chars[i] == '\\' {
                        i += 2;
                        continue;
                    }
                    if chars[i] == delim {
                        break;
                    }
                    i += 1;
                }
                i += 1;
            }
            open @ ('(' | '[' | '{') => {
                stack.push(open);
                i += 1;
            }
            close @ (')' | ']' | '}') => {
                let expected = match close {
                    ')' => '(',
                    ']' => '[',
                    _ => '{',
                };
                if stack.pop() != Some(expected) {
                    return Err(Error::Compile {
                        path: path.to_path_buf(),
                        message: format!("unbalanced '{close}'"),
                    });
                }
                i += 1;
            }
            _ => i += 1,
        }
    }

    if let Some(open) = stack.pop() {
        return Err(Error::Compile {
            path: path.to_path_buf(),
            message: format!("unclosed '{open}'"),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_module_passthrough() {
        let c = ComponentCompiler::new();
        let unit = c
            .compile(&PathBuf::from("src/util.js"), "export const n = 1;\n")
            .unwrap();
        assert_eq!(unit.code, "export const n = 1;\n");
        assert!(unit.css.is_none());
    }

    #[test]
    fn test_component_splits_script_style_markup() {
        let c = ComponentCompiler::new();
        let source = "<script>\nlet open = false;\n</script>\n\
                      <div class=\"_ba-z-150\">panel</div>\n\
                      <style>\n.panel { color: red; }\n</style>\n";
        let unit = c
            .compile(&PathBuf::from("src/Panel.comp"), source)
            .unwrap();

        assert!(unit.code.contains("let open = false;"));
        assert!(unit.code.contains("const __Panel_template = `"));
        assert!(unit.code.contains("panel"));
        assert_eq!(unit.css.as_deref(), Some(".panel { color: red; }"));
    }

    #[test]
    fn test_component_without_style_has_no_css() {
        let c = ComponentCompiler::new();
        let unit = c
            .compile(&PathBuf::from("src/Bare.comp"), "<script>let a = 1;</script>")
            .unwrap();
        assert!(unit.css.is_none());
    }

    #[test]
    fn test_markup_backticks_are_escaped() {
        let c = ComponentCompiler::new();
        let unit = c
            .compile(
                &PathBuf::from("src/T.comp"),
                "<span>`${code}`</span>",
            )
            .unwrap();
        assert!(unit.code.contains("\\`\\${code}\\`"));
    }

    #[test]
    fn test_unbalanced_module_fails() {
        let c = ComponentCompiler::new();
        let err = c
            .compile(&PathBuf::from("src/bad.js"), "function f() { return 1;\n")
            .unwrap_err();
        assert!(matches!(err, Error::Compile { .. }));
    }

    #[test]
    fn test_braces_in_strings_and_comments_ignored() {
        let c = ComponentCompiler::new();
        let source = "// unmatched { in comment\nconst s = \"also {\";\n";
        assert!(c.compile(&PathBuf::from("src/ok.js"), source).is_ok());
    }
}
