//! Module graph resolution and linking.
//!
//! The bundler walks relative ES-style imports from the fixed entry point,
//! compiles each unit through the [`SourceCompiler`] seam and links
//! everything, dependencies first, into one self-executing unit. Modules are
//! deduplicated by canonical path; bare specifiers are restricted to the
//! configured singleton list and always resolve to the shared copy under
//! `vendor/`. Linking is scope-hoisting: imports vanish, exported
//! declarations live in the shared IIFE scope, so duplicate top-level
//! bindings across modules are a bundle error.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::compile::SourceCompiler;
use crate::error::{Error, Result};
use crate::project::ProjectLayout;
use crate::tokens::TokenReplacer;

/// Bundler options.
#[derive(Debug, Clone)]
pub struct BundleOptions {
    /// Bare specifiers resolved to a single shared `vendor/<name>.js`
    /// module. Any bare import outside this list fails resolution.
    pub dedupe: Vec<String>,
}

impl Default for BundleOptions {
    fn default() -> Self {
        Self {
            dedupe: vec!["runtime".to_string()],
        }
    }
}

/// One import statement of a module.
#[derive(Debug, Clone)]
enum Import {
    /// `import './x'`
    SideEffect { target: PathBuf },
    /// `import Name from './x'`
    Default { target: PathBuf, binding: String },
    /// `import { a, b as c } from './x'`
    Named {
        target: PathBuf,
        bindings: Vec<(String, String)>,
    },
}

impl Import {
    fn target(&self) -> &Path {
        match self {
            Import::SideEffect { target }
            | Import::Default { target, .. }
            | Import::Named { target, .. } => target,
        }
    }
}

/// One resolved, compiled module.
#[derive(Debug)]
struct Module {
    /// Canonical file path.
    path: PathBuf,
    /// Path relative to the project root, for diagnostics and link output.
    rel: String,
    /// Compiled code with import/export statements rewritten out.
    code: String,
    /// Parsed imports, in order of appearance.
    imports: Vec<Import>,
    /// Top-level bindings this module contributes to the shared scope.
    bindings: Vec<String>,
    /// Whether the module has a default export.
    has_default: bool,
    /// Style rules extracted by the compiler, if any.
    css: Option<String>,
}

impl Module {
    /// Name of the hoisted default-export constant.
    fn default_binding(&self) -> String {
        let sanitized: String = self
            .rel
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
            .collect();
        format!("__{sanitized}_default")
    }
}

/// The resolved module graph plus the aggregated component CSS.
#[derive(Debug)]
pub struct ModuleGraph {
    modules: Vec<Module>,
    /// Style rules extracted from components, in module order.
    pub css: String,
}

impl ModuleGraph {
    /// Paths of the bundled modules, dependencies first.
    pub fn module_paths(&self) -> Vec<&Path> {
        self.modules.iter().map(|m| m.path.as_path()).collect()
    }
}

/// Resolves and links the module graph.
pub struct Bundler<'a> {
    compiler: &'a dyn SourceCompiler,
    replacer: &'a TokenReplacer,
    layout: &'a ProjectLayout,
    options: BundleOptions,
}

impl<'a> Bundler<'a> {
    pub fn new(
        compiler: &'a dyn SourceCompiler,
        replacer: &'a TokenReplacer,
        layout: &'a ProjectLayout,
        options: BundleOptions,
    ) -> Self {
        Self {
            compiler,
            replacer,
            layout,
            options,
        }
    }

    /// Resolve the dependency closure of the entry point.
    ///
    /// Token replacement runs on each unit before compilation, so replaced
    /// content participates in compilation and bundling like ordinary
    /// source.
    pub fn resolve(&self) -> Result<ModuleGraph> {
        let entry = canonical(&self.layout.entry())?;

        let mut modules = Vec::new();
        let mut visiting = Vec::new();
        let mut done: HashMap<PathBuf, ()> = HashMap::new();
        self.visit(&entry, &mut visiting, &mut done, &mut modules)?;

        let mut css = String::new();
        let mut seen: HashMap<String, String> = HashMap::new();
        for module in &modules {
            for binding in &module.bindings {
                if let Some(first) = seen.get(binding) {
                    return Err(Error::DuplicateBinding {
                        name: binding.clone(),
                        first: PathBuf::from(first),
                        second: PathBuf::from(&module.rel),
                    });
                }
                seen.insert(binding.clone(), module.rel.clone());
            }
        }

        for module in &mut modules {
            if let Some(rules) = module_css_take(module) {
                if !css.is_empty() {
                    css.push('\n');
                }
                css.push_str(&rules);
            }
        }

        Ok(ModuleGraph { modules, css })
    }

    /// Depth-first post-order walk: a module is emitted after everything it
    /// imports.
    fn visit(
        &self,
        path: &Path,
        visiting: &mut Vec<PathBuf>,
        done: &mut HashMap<PathBuf, ()>,
        out: &mut Vec<Module>,
    ) -> Result<()> {
        if done.contains_key(path) {
            return Ok(());
        }
        if visiting.iter().any(|p| p == path) {
            let chain: Vec<String> = visiting
                .iter()
                .chain(std::iter::once(&path.to_path_buf()))
                .map(|p| self.relative(p))
                .collect();
            return Err(Error::CyclicImport(chain.join(" -> ")));
        }

        visiting.push(path.to_path_buf());
        let module = self.load(path)?;
        for import in &module.imports {
            self.visit(import.target(), visiting, done, out)?;
        }
        visiting.pop();

        done.insert(path.to_path_buf(), ());
        out.push(module);
        Ok(())
    }

    /// Load, token-substitute, compile and parse one module.
    fn load(&self, path: &Path) -> Result<Module> {
        let raw = fs::read_to_string(path)?;
        let substituted = self.replacer.apply(&raw);
        let unit = self.compiler.compile(path, &substituted)?;

        let rel = self.relative(path);
        tracing::debug!(module = %rel, "compiled module");

        let mut imports = Vec::new();
        let mut bindings = Vec::new();
        let mut has_default = false;
        let mut code = String::new();

        for line in unit.code.lines() {
            let trimmed = line.trim_start();

            if trimmed.starts_with("import ") || trimmed == "import" {
                imports.push(self.parse_import(path, trimmed)?);
                continue;
            }

            if let Some(rest) = trimmed.strip_prefix("export default ") {
                has_default = true;
                code.push_str(&format!("const __DEFAULT__ = {rest}\n"));
                continue;
            }

            if let Some(rest) = trimmed.strip_prefix("export ") {
                if let Some(name) = declared_name(rest) {
                    bindings.push(name);
                }
                code.push_str(rest);
                code.push('\n');
                continue;
            }

            if line == trimmed {
                if let Some(name) = declared_name(trimmed) {
                    bindings.push(name);
                }
            }
            code.push_str(line);
            code.push('\n');
        }

        let mut module = Module {
            path: path.to_path_buf(),
            rel,
            code,
            imports,
            bindings,
            has_default,
            css: unit.css,
        };

        if module.has_default {
            let binding = module.default_binding();
            module.code = module.code.replace("__DEFAULT__", &binding);
            module.bindings.push(binding);
        }

        Ok(module)
    }

    /// Parse one import statement.
    fn parse_import(&self, importer: &Path, line: &str) -> Result<Import> {
        let specifier = import_specifier(line).ok_or_else(|| Error::Compile {
            path: importer.to_path_buf(),
            message: format!("unsupported import syntax: {line}"),
        })?;
        let target = self.resolve_specifier(importer, &specifier)?;

        let body = line
            .trim_start_matches("import")
            .split(" from ")
            .next()
            .unwrap_or("")
            .trim();

        if body.starts_with('\'') || body.starts_with('"') {
            return Ok(Import::SideEffect { target });
        }

        if let Some(inner) = body.strip_prefix('{') {
            let inner = inner.trim_end_matches('}').trim_end_matches(' ');
            let mut bindings = Vec::new();
            for part in inner.trim_matches(['{', '}', ' ']).split(',') {
                let part = part.trim();
                if part.is_empty() {
                    continue;
                }
                match part.split_once(" as ") {
                    Some((exported, local)) => {
                        bindings.push((exported.trim().to_string(), local.trim().to_string()))
                    }
                    None => bindings.push((part.to_string(), part.to_string())),
                }
            }
            return Ok(Import::Named { target, bindings });
        }

        Ok(Import::Default {
            target,
            binding: body.to_string(),
        })
    }

    /// Resolve an import specifier against its importer.
    fn resolve_specifier(&self, importer: &Path, specifier: &str) -> Result<PathBuf> {
        if specifier.starts_with("./") || specifier.starts_with("../") {
            let base = importer.parent().unwrap_or(Path::new("."));
            let stem = base.join(specifier);

            let mut candidates = vec![stem.clone()];
            candidates.push(stem.with_extension(crate::compile::MODULE_EXT));
            candidates.push(stem.with_extension(crate::compile::COMPONENT_EXT));

            for candidate in candidates {
                if candidate.is_file() {
                    return canonical(&candidate);
                }
            }
        } else if self.options.dedupe.iter().any(|d| d == specifier) {
            let vendored = self
                .layout
                .vendor_dir()
                .join(format!("{specifier}.js"));
            if vendored.is_file() {
                return canonical(&vendored);
            }
        }

        Err(Error::Resolve {
            specifier: specifier.to_string(),
            importer: importer.to_path_buf(),
        })
    }

    fn relative(&self, path: &Path) -> String {
        match canonical(self.layout.root()) {
            Ok(root) => path
                .strip_prefix(&root)
                .unwrap_or(path)
                .display()
                .to_string(),
            Err(_) => path.display().to_string(),
        }
    }

    /// Link the resolved graph into one self-executing unit.
    ///
    /// `inline_css` injects the final stylesheet at startup (production);
    /// development writes the stylesheet as a separate file instead.
    pub fn link(&self, graph: &ModuleGraph, inline_css: Option<&str>) -> String {
        let mut out = String::new();
        out.push_str("(function () {\n'use strict';\n");

        if let Some(css) = inline_css {
            if !css.is_empty() {
                out.push_str(STYLE_INJECT);
                out.push_str(&format!(
                    "__uspack_inject_style(`{}`);\n",
                    css.replace('\\', "\\\\").replace('`', "\\`").replace("${", "\\${")
                ));
            }
        }

        let by_path: HashMap<&Path, &Module> = graph
            .modules
            .iter()
            .map(|m| (m.path.as_path(), m))
            .collect();

        for module in &graph.modules {
            out.push_str(&format!("// {}\n", module.rel));

            // Bind this module's imports before its code runs.
            for import in &module.imports {
                match import {
                    Import::SideEffect { .. } => {}
                    Import::Default { target, binding } => {
                        if let Some(dep) = by_path.get(target.as_path()) {
                            out.push_str(&format!(
                                "const {binding} = {};\n",
                                dep.default_binding()
                            ));
                        }
                    }
                    Import::Named { bindings, .. } => {
                        for (exported, local) in bindings {
                            if exported != local {
                                out.push_str(&format!("const {local} = {exported};\n"));
                            }
                        }
                    }
                }
            }

            out.push_str(module.code.trim_end());
            out.push('\n');
        }

        out.push_str("})();\n");
        out
    }
}

/// Runtime helper injected ahead of the modules when CSS is inlined.
const STYLE_INJECT: &str = "function __uspack_inject_style(css) {\n\
    var style = document.createElement('style');\n\
    style.textContent = css;\n\
    document.head.appendChild(style);\n\
}\n";

fn canonical(path: &Path) -> Result<PathBuf> {
    Ok(path.canonicalize()?)
}

/// Extract the quoted module specifier from an import line.
fn import_specifier(line: &str) -> Option<String> {
    for quote in ['\'', '"'] {
        if let Some(start) = line.find(quote) {
            if let Some(len) = line[start + 1..].find(quote) {
                return Some(line[start + 1..start + 1 + len].to_string());
            }
        }
    }
    None
}

/// Name declared by a top-level statement, if any.
fn declared_name(statement: &str) -> Option<String> {
    for keyword in ["const ", "let ", "var ", "function ", "class "] {
        if let Some(rest) = statement.strip_prefix(keyword) {
            let name: String = rest
                .chars()
                .take_while(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '$')
                .collect();
            if !name.is_empty() {
                return Some(name);
            }
        }
    }
    None
}

fn module_css_take(module: &mut Module) -> Option<String> {
    module.css.take()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compile::ComponentCompiler;
    use crate::tokens::{TokenReplacer, TokenTable};
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, contents: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    fn bundle(dir: &TempDir) -> Result<(ModuleGraph, String)> {
        let compiler = ComponentCompiler::new();
        let table = TokenTable::new();
        let replacer = TokenReplacer::new(&table);
        let layout = ProjectLayout::new(dir.path());
        let bundler = Bundler::new(&compiler, &replacer, &layout, BundleOptions::default());
        let graph = bundler.resolve()?;
        let code = bundler.link(&graph, None);
        Ok((graph, code))
    }

    #[test]
    fn test_links_dependencies_first() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "src/main.js",
            "import { greet } from './util';\ngreet();\n",
        );
        write(
            dir.path(),
            "src/util.js",
            "export function greet() { return 'hi'; }\n",
        );

        let (graph, code) = bundle(&dir).unwrap();
        assert_eq!(graph.modules.len(), 2);
        assert!(code.starts_with("(function () {\n'use strict';\n"));
        assert!(code.trim_end().ends_with("})();"));

        let util_pos = code.find("function greet").unwrap();
        let main_pos = code.find("greet();").unwrap();
        assert!(util_pos < main_pos);
        assert!(!code.contains("import "));
    }

    #[test]
    fn test_default_import_binds_hoisted_constant() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "src/main.js",
            "import widget from './widget';\nwidget.mount();\n",
        );
        write(
            dir.path(),
            "src/widget.js",
            "export default { mount() {} };\n",
        );

        let (_, code) = bundle(&dir).unwrap();
        assert!(code.contains("const __src_widget_js_default = { mount() {} };"));
        assert!(code.contains("const widget = __src_widget_js_default;"));
    }

    #[test]
    fn test_component_css_is_aggregated_in_module_order() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "src/main.js",
            "import './First.comp';\nimport './Second.comp';\n",
        );
        write(
            dir.path(),
            "src/First.comp",
            "<style>.first { color: red; }</style><b>1</b>",
        );
        write(
            dir.path(),
            "src/Second.comp",
            "<style>.second { color: blue; }</style><b>2</b>",
        );

        let (graph, _) = bundle(&dir).unwrap();
        let first = graph.css.find(".first").unwrap();
        let second = graph.css.find(".second").unwrap();
        assert!(first < second);
    }

    #[test]
    fn test_shared_module_is_deduplicated() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "src/main.js",
            "import './a';\nimport './b';\n",
        );
        write(dir.path(), "src/a.js", "import { n } from './shared';\nn;\n");
        write(dir.path(), "src/b.js", "import { n } from './shared';\nn + 1;\n");
        write(dir.path(), "src/shared.js", "export const n = 1;\n");

        let (graph, code) = bundle(&dir).unwrap();
        assert_eq!(graph.modules.len(), 4);
        assert_eq!(code.matches("const n = 1;").count(), 1);
    }

    #[test]
    fn test_bare_specifier_resolves_to_vendor_singleton() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "src/main.js",
            "import { mount } from 'runtime';\nmount();\n",
        );
        write(dir.path(), "vendor/runtime.js", "export function mount() {}\n");

        let (graph, _) = bundle(&dir).unwrap();
        assert_eq!(graph.modules.len(), 2);
    }

    #[test]
    fn test_unlisted_bare_specifier_fails_resolution() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "src/main.js", "import { x } from 'mystery';\n");

        let err = bundle(&dir).unwrap_err();
        assert!(matches!(err, Error::Resolve { specifier, .. } if specifier == "mystery"));
    }

    #[test]
    fn test_cyclic_import_is_an_error() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "src/main.js", "import './a';\n");
        write(dir.path(), "src/a.js", "import './b';\nexport const a = 1;\n");
        write(dir.path(), "src/b.js", "import './a';\nexport const b = 2;\n");

        let err = bundle(&dir).unwrap_err();
        assert!(matches!(err, Error::CyclicImport(_)));
    }

    #[test]
    fn test_duplicate_top_level_binding_is_an_error() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "src/main.js", "import './a';\nimport './b';\n");
        write(dir.path(), "src/a.js", "export const flag = true;\n");
        write(dir.path(), "src/b.js", "export const flag = false;\n");

        let err = bundle(&dir).unwrap_err();
        assert!(matches!(err, Error::DuplicateBinding { name, .. } if name == "flag"));
    }

    #[test]
    fn test_inline_css_injects_style_helper() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "src/main.js", "const app = 1;\n");

        let compiler = ComponentCompiler::new();
        let table = TokenTable::new();
        let replacer = TokenReplacer::new(&table);
        let layout = ProjectLayout::new(dir.path());
        let bundler = Bundler::new(&compiler, &replacer, &layout, BundleOptions::default());
        let graph = bundler.resolve().unwrap();

        let code = bundler.link(&graph, Some(".a{color:red}"));
        assert!(code.contains("__uspack_inject_style(`.a{color:red}`);"));

        let without = bundler.link(&graph, None);
        assert!(!without.contains("__uspack_inject_style"));
    }
}
