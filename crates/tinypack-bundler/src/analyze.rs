//! Dependency discovery and module-syntax lowering
//!
//! A read-only walk over the syntax tree finds every `require("...")` call
//! and every static `import`/`export` declaration. Each one becomes a
//! [`Request`] for the resolver plus a [`Rewrite`] whose text refers to the
//! request by index; once the graph builder knows the logical id of every
//! request, [`Analysis::into_edits`] renders the rewrites as plain
//! [`Edit`]s.
//!
//! ES module syntax is lowered to the CommonJS shape the runtime loader
//! provides (`module`, `exports`, `require`).

use std::ops::Range;
use std::path::Path;

use tinypack_ast::visit::{walk_expr, walk_module_item};
use tinypack_ast::*;

use crate::error::ResolveError;
use crate::rewrite::Edit;

const ES_MODULE_MARKER: &str = "Object.defineProperty(exports, \"__esModule\", { value: true });";
const DEFAULT_INTEROP: &str = "(function (m) { return m && m.__esModule ? m.default : m; })";
const EXPORT_STAR: &str = "(function (m) { for (var k in m) if (k !== \"default\" && !(k in exports)) exports[k] = m[k]; })";

/// A module specifier found in the source.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub specifier: String,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Piece {
    Text(String),
    /// The JSON-quoted logical id of the request at this index
    Id(usize),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Rewrite {
    pub range: Range<usize>,
    pub pieces: Vec<Piece>,
}

#[derive(Debug, Default)]
pub struct Analysis {
    pub requests: Vec<Request>,
    pub rewrites: Vec<Rewrite>,
}

impl Analysis {
    /// Renders every rewrite with `ids[i]` standing in for request `i`.
    pub fn into_edits(self, ids: &[String]) -> Vec<Edit> {
        self.rewrites
            .into_iter()
            .map(|rewrite| {
                let mut text = String::new();
                for piece in &rewrite.pieces {
                    match piece {
                        Piece::Text(s) => text.push_str(s),
                        Piece::Id(index) => {
                            let id = ids.get(*index).map(String::as_str).unwrap_or_default();
                            text.push_str(&serde_json::Value::from(id).to_string());
                        }
                    }
                }
                if rewrite.range.is_empty() {
                    Edit::insert(rewrite.range.start, text)
                } else if text.is_empty() {
                    Edit::remove(rewrite.range)
                } else {
                    Edit::replace(rewrite.range, text)
                }
            })
            .collect()
    }
}

/// Collects the requests and rewrites of one module.
pub fn analyze(program: &Program, source: &str, path: &Path) -> Result<Analysis, ResolveError> {
    let mut analyzer = Analyzer {
        source,
        path,
        analysis: Analysis::default(),
        hoisted: Vec::new(),
        trailer: Vec::new(),
        error: None,
    };

    if program.has_module_syntax() {
        analyzer.hoisted.push(Piece::Text(ES_MODULE_MARKER.to_string()));
    }

    analyzer.visit_program(program);

    if let Some(err) = analyzer.error {
        return Err(err);
    }

    let Analyzer {
        mut analysis,
        hoisted,
        trailer,
        ..
    } = analyzer;

    if !hoisted.is_empty() {
        let mut pieces = join_statements(hoisted);
        pieces.push(Piece::Text("\n".to_string()));
        analysis.rewrites.push(Rewrite { range: 0..0, pieces });
    }

    // The lexer skips a `#!` line; it cannot stay inside a function body.
    if source.starts_with("#!") {
        let end = source.find('\n').unwrap_or(source.len());
        analysis.rewrites.push(Rewrite {
            range: 0..end,
            pieces: Vec::new(),
        });
    }

    if !trailer.is_empty() {
        let mut pieces = vec![Piece::Text("\n".to_string())];
        pieces.extend(join_statements(trailer));
        analysis.rewrites.push(Rewrite {
            range: source.len()..source.len(),
            pieces,
        });
    }

    Ok(analysis)
}

fn join_statements(statements: Vec<Piece>) -> Vec<Piece> {
    let mut pieces = Vec::new();
    for (i, piece) in statements.into_iter().enumerate() {
        if i > 0 {
            pieces.push(Piece::Text(" ".to_string()));
        }
        pieces.push(piece);
    }
    pieces
}

fn text(s: impl Into<String>) -> Piece {
    Piece::Text(s.into())
}

struct Analyzer<'a> {
    source: &'a str,
    path: &'a Path,
    analysis: Analysis,
    /// Statements placed at the top of the module
    hoisted: Vec<Piece>,
    /// Statements appended after the last line of the module
    trailer: Vec<Piece>,
    error: Option<ResolveError>,
}

impl Analyzer<'_> {
    fn request(&mut self, specifier: &str, span: Span) -> usize {
        self.analysis.requests.push(Request {
            specifier: specifier.to_string(),
            span,
        });
        self.analysis.requests.len() - 1
    }

    fn rewrite(&mut self, range: Range<usize>, pieces: Vec<Piece>) {
        self.analysis.rewrites.push(Rewrite { range, pieces });
    }

    /// Replaces a whole declaration, keeping its line count.
    fn replace_item(&mut self, span: Span, mut pieces: Vec<Piece>) {
        let lines = self.source[span.start..span.end].matches('\n').count();
        if lines > 0 {
            pieces.push(text("\n".repeat(lines)));
        }
        self.rewrite(span.start..span.end, pieces);
    }

    /// `;` when the text of `span` does not already end a statement.
    fn terminator(&self, span: Span) -> &'static str {
        let item = self.source[span.start..span.end].trim_end();
        if item.ends_with(';') || item.ends_with('}') {
            ""
        } else {
            ";"
        }
    }

    fn require_call(&mut self, call: Span, args: &[Node<Expr>]) {
        let specifier = match args {
            [arg] => arg.value.as_static_string().map(|s| (s.to_string(), arg.span)),
            _ => None,
        };

        match specifier {
            Some((specifier, span)) => {
                let index = self.request(&specifier, span);
                self.rewrite(span.start..span.end, vec![Piece::Id(index)]);
            }
            None => {
                if self.error.is_none() {
                    self.error = Some(ResolveError::DynamicSpecifier {
                        importer: self.path.to_path_buf(),
                        span: call,
                    });
                }
            }
        }
    }

    fn lower_import(&mut self, span: Span, import: &ImportDecl) {
        let index = self.request(&import.source.value, import.source.span);
        let require = || vec![text("require("), Piece::Id(index), text(")")];

        let mut pieces = Vec::new();
        if import.specifiers.is_empty() {
            pieces.extend(require());
            pieces.push(text(";"));
        }

        let mut named = Vec::new();
        for specifier in &import.specifiers {
            match specifier {
                ImportSpecifier::Default(local) => {
                    pieces.push(text(format!("var {} = {}(", local.value.name, DEFAULT_INTEROP)));
                    pieces.extend(require());
                    pieces.push(text("); "));
                }
                ImportSpecifier::Namespace(local) => {
                    pieces.push(text(format!("var {} = ", local.value.name)));
                    pieces.extend(require());
                    pieces.push(text("; "));
                }
                ImportSpecifier::Named { imported, local } => {
                    let local = local.as_ref().unwrap_or(imported);
                    named.push(format!("{}: {}", imported.value.name, local.value.name));
                }
            }
        }

        if !named.is_empty() {
            pieces.push(text(format!("var {{ {} }} = ", named.join(", "))));
            pieces.extend(require());
            pieces.push(text(";"));
        }

        if let Some(Piece::Text(last)) = pieces.last_mut() {
            let trimmed = last.trim_end().len();
            last.truncate(trimmed);
        }

        self.replace_item(span, pieces);
    }

    fn lower_export(&mut self, span: Span, export: &ExportDecl) {
        match export {
            ExportDecl::Default(expr) => {
                self.rewrite(span.start..expr.span.start, vec![text("exports.default = ")]);
                let terminator = self.terminator(span);
                if !terminator.is_empty() {
                    self.rewrite(span.end..span.end, vec![text(terminator)]);
                }
            }

            ExportDecl::DefaultDecl(decl) => match decl.value.bound_names().first() {
                Some(name) => {
                    let assignment = format!("exports.default = {};", name);
                    self.rewrite(span.start..decl.span.start, Vec::new());
                    self.export_binding(span, &decl.value, assignment);
                }
                None => {
                    self.rewrite(span.start..decl.span.start, vec![text("exports.default = ")]);
                    self.rewrite(span.end..span.end, vec![text(";")]);
                }
            },

            ExportDecl::Decl(decl) => {
                self.rewrite(span.start..decl.span.start, Vec::new());
                let assignments: Vec<String> = decl
                    .value
                    .bound_names()
                    .into_iter()
                    .map(|name| format!("exports.{} = {};", name, name))
                    .collect();
                if !assignments.is_empty() {
                    self.export_binding(span, &decl.value, assignments.join(" "));
                }
            }

            ExportDecl::Named {
                specifiers,
                source: None,
            } => {
                for specifier in specifiers {
                    self.trailer.push(text(format!(
                        "exports.{} = {};",
                        specifier.exported_name(),
                        specifier.local.value.name
                    )));
                }
                self.replace_item(span, Vec::new());
            }

            ExportDecl::Named {
                specifiers,
                source: Some(source),
            } => {
                let index = self.request(&source.value, source.span);
                let mut pieces = Vec::new();
                for (i, specifier) in specifiers.iter().enumerate() {
                    if i > 0 {
                        pieces.push(text(" "));
                    }
                    pieces.push(text(format!("exports.{} = require(", specifier.exported_name())));
                    pieces.push(Piece::Id(index));
                    pieces.push(text(format!(").{};", specifier.local.value.name)));
                }
                self.replace_item(span, pieces);
            }

            ExportDecl::All {
                source,
                as_name: None,
            } => {
                let index = self.request(&source.value, source.span);
                let pieces = vec![
                    text(format!("{}(require(", EXPORT_STAR)),
                    Piece::Id(index),
                    text("));"),
                ];
                self.replace_item(span, pieces);
            }

            ExportDecl::All {
                source,
                as_name: Some(name),
            } => {
                let index = self.request(&source.value, source.span);
                let pieces = vec![
                    text(format!("exports.{} = require(", name.value.name)),
                    Piece::Id(index),
                    text(");"),
                ];
                self.replace_item(span, pieces);
            }
        }
    }

    /// Function declarations are hoisted, so their exports are assigned at
    /// the top of the module; other bindings right after the declaration.
    fn export_binding(&mut self, span: Span, decl: &Decl, assignment: String) {
        if matches!(decl, Decl::Function(_)) {
            self.hoisted.push(text(assignment));
        } else {
            let terminator = self.terminator(span);
            self.rewrite(
                span.end..span.end,
                vec![text(format!("{}\n{}", terminator, assignment))],
            );
        }
    }
}

impl Visit for Analyzer<'_> {
    fn visit_module_item(&mut self, item: &Node<ModuleItem>) {
        match &item.value {
            ModuleItem::Import(import) => self.lower_import(item.span, import),
            ModuleItem::Export(export) => self.lower_export(item.span, export),
            ModuleItem::Stmt(_) => {}
        }
        walk_module_item(self, item);
    }

    fn visit_expr(&mut self, expr: &Node<Expr>) {
        if let Expr::Call { callee, args } = &expr.value {
            if callee.value.as_ident() == Some("require") {
                self.require_call(expr.span, args);
            }
        }
        walk_expr(self, expr);
    }
}
