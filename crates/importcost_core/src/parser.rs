use anyhow::{Context, Result};
use dashmap::DashMap;
use log::{debug, trace};
use oxc_allocator::Allocator;
use oxc_ast::ast::*;
use oxc_parser::{Parser as OxcParser, ParserReturn};
use oxc_span::SourceType;
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::types::{ImportSite, SpecKind};

/// Imports of a module on disk, memoized in `cache`.
pub fn imports_for(
    file: &Path,
    cache: &DashMap<PathBuf, Vec<ImportSite>>,
) -> Result<Vec<ImportSite>> {
    let file_buf = file.to_path_buf();
    if let Some(v) = cache.get(&file_buf) {
        trace!("Cache hit for imports: {}", file.display());
        return Ok(v.clone());
    }
    let src =
        fs::read_to_string(file).with_context(|| format!("Failed to read {}", file.display()))?;
    let sites = parse_imports(file, &src);
    cache.insert(file_buf, sites.clone());
    Ok(sites)
}

/// Every import, re-export, `require()` and `import()` in `src`, in source order.
///
/// `path` only selects the dialect (TypeScript, JSX, module). Parse errors are
/// tolerated: whatever oxc recovered is still scanned.
pub fn parse_imports(path: &Path, src: &str) -> Vec<ImportSite> {
    trace!("Parsing imports of {}", path.display());
    let allocator = Allocator::default();
    let ParserReturn { program, errors, .. } =
        OxcParser::new(&allocator, src, source_type_for(path)).parse();
    if !errors.is_empty() {
        debug!("{} parse errors in {}, scanning recovered program", errors.len(), path.display());
    }

    let mut collector = SiteCollector { src, sites: Vec::new() };

    for stmt in &program.body {
        match stmt {
            Statement::ImportDeclaration(decl) => {
                // import type { Foo } from 'bar' never reaches the bundle
                if decl.import_kind.is_type() {
                    trace!("Skipping type-only import declaration in {}", path.display());
                    continue;
                }

                let has_runtime_import = if let Some(specifiers) = &decl.specifiers {
                    specifiers.iter().any(|spec| match spec {
                        ImportDeclarationSpecifier::ImportSpecifier(s) => !s.import_kind.is_type(),
                        ImportDeclarationSpecifier::ImportDefaultSpecifier(_) => true,
                        ImportDeclarationSpecifier::ImportNamespaceSpecifier(_) => true,
                    })
                } else {
                    // import 'side-effect'
                    true
                };

                if has_runtime_import {
                    collector.push(decl.source.value.as_str(), decl.span.start, SpecKind::Static);
                }
            }
            Statement::ExportAllDeclaration(decl) if !decl.export_kind.is_type() => {
                collector.push(decl.source.value.as_str(), decl.span.start, SpecKind::Static);
            }
            Statement::ExportNamedDeclaration(decl) if !decl.export_kind.is_type() => {
                if let Some(source) = &decl.source {
                    collector.push(source.value.as_str(), decl.span.start, SpecKind::Static);
                }
            }
            Statement::ExpressionStatement(es) => collector.scan(&es.expression),
            Statement::VariableDeclaration(vd) => {
                for decl in &vd.declarations {
                    if let Some(init) = &decl.init {
                        collector.scan(init);
                    }
                }
            }
            _ => {}
        }
    }

    debug!("Found {} import sites in {}", collector.sites.len(), path.display());
    collector.sites
}

struct SiteCollector<'s> {
    src: &'s str,
    sites: Vec<ImportSite>,
}

impl SiteCollector<'_> {
    fn push(&mut self, request: &str, offset: u32, kind: SpecKind) {
        let line = line_at(self.src, offset as usize);
        trace!("Found {:?} import '{}' on line {}", kind, request, line);
        self.sites.push(ImportSite { request: request.to_string(), line, kind });
    }

    fn scan(&mut self, expr: &Expression) {
        match expr {
            Expression::CallExpression(ce) => {
                if let Expression::Identifier(callee_ident) = &ce.callee
                    && callee_ident.name.as_str() == "require"
                    && !ce.arguments.is_empty()
                    && let Some(Expression::StringLiteral(sl)) = ce.arguments[0].as_expression()
                {
                    self.push(sl.value.as_str(), ce.span.start, SpecKind::Static);
                }
                for arg in &ce.arguments {
                    if let Some(arg_expr) = arg.as_expression() {
                        self.scan(arg_expr);
                    }
                }
                self.scan(&ce.callee);
            }
            Expression::ImportExpression(ie) => {
                if let Expression::StringLiteral(sl) = &ie.source {
                    self.push(sl.value.as_str(), ie.span.start, SpecKind::Dynamic);
                }
            }
            Expression::ArrayExpression(ae) => {
                for elem in &ae.elements {
                    if let Some(expr) = elem.as_expression() {
                        self.scan(expr);
                    }
                }
            }
            Expression::ObjectExpression(oe) => {
                for prop in &oe.properties {
                    if let Some(expr) = prop.as_property() {
                        self.scan(&expr.value);
                    }
                }
            }
            Expression::ConditionalExpression(ce) => {
                self.scan(&ce.test);
                self.scan(&ce.consequent);
                self.scan(&ce.alternate);
            }
            Expression::AssignmentExpression(ae) => self.scan(&ae.right),
            Expression::ParenthesizedExpression(pe) => self.scan(&pe.expression),
            Expression::AwaitExpression(ae) => self.scan(&ae.argument),
            // require('x').default
            Expression::StaticMemberExpression(me) => self.scan(&me.object),
            _ => {}
        }
    }
}

/// 1-based line containing byte `offset`.
fn line_at(src: &str, offset: usize) -> usize {
    let end = offset.min(src.len());
    src.as_bytes()[..end].iter().filter(|b| **b == b'\n').count() + 1
}

fn source_type_for(path: &Path) -> SourceType {
    let ext = path.extension().and_then(|e| e.to_str());

    let mut st = SourceType::default()
        .with_jsx(matches!(ext, Some("tsx") | Some("jsx") | Some("js")))
        .with_typescript(matches!(ext, Some("ts") | Some("tsx") | Some("mts") | Some("cts")));

    // ESM heuristic - .mjs, .mts are ES modules
    if matches!(ext, Some("mjs") | Some("mts")) {
        st = st.with_module(true);
    }

    st
}
