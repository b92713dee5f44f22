//! Module system definitions for the AST

use super::*;

/// Module item (top-level in a module)
#[derive(Debug, Clone, PartialEq)]
pub enum ModuleItem {
    /// Import declaration
    Import(ImportDecl),

    /// Export declaration
    Export(ExportDecl),

    /// Statement (including declarations)
    Stmt(Node<Stmt>),
}

/// Module specifier string as written, with the span of its quotes
#[derive(Debug, Clone, PartialEq)]
pub struct ModuleSource {
    pub value: String,
    pub span: Span,
}

/// Import declaration
#[derive(Debug, Clone, PartialEq)]
pub struct ImportDecl {
    pub specifiers: Vec<ImportSpecifier>,
    pub source: ModuleSource,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ImportSpecifier {
    /// import name from "module"
    Default(Node<Ident>),

    /// import * as name from "module"
    Namespace(Node<Ident>),

    /// import { name } from "module" or import { name as alias } from "module"
    Named {
        imported: Node<Ident>,
        local: Option<Node<Ident>>,
    },
}

/// Export declaration
#[derive(Debug, Clone, PartialEq)]
pub enum ExportDecl {
    /// export { name } / export { name } from "module"
    Named {
        specifiers: Vec<ExportSpecifier>,
        source: Option<ModuleSource>,
    },

    /// export default expr
    Default(Node<Expr>),

    /// export default function/class declaration
    DefaultDecl(Box<Node<Decl>>),

    /// export * from "module" / export * as name from "module"
    All {
        source: ModuleSource,
        as_name: Option<Node<Ident>>,
    },

    /// export declaration
    Decl(Box<Node<Decl>>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExportSpecifier {
    pub local: Node<Ident>,
    pub exported: Option<Node<Ident>>,
}

impl ExportSpecifier {
    /// Name the binding is visible under from outside the module.
    pub fn exported_name(&self) -> &str {
        self.exported
            .as_ref()
            .map(|e| e.value.name.as_str())
            .unwrap_or(&self.local.value.name)
    }
}

/// Root AST node - represents a complete source file
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub items: Vec<Node<ModuleItem>>,
    pub span: Span,
}

impl Program {
    /// Whether the file uses static `import`/`export` syntax.
    pub fn has_module_syntax(&self) -> bool {
        self.items
            .iter()
            .any(|item| matches!(item.value, ModuleItem::Import(_) | ModuleItem::Export(_)))
    }
}
