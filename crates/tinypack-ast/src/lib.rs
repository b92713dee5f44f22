//! # tinypack AST
//!
//! Syntax tree definitions for the JavaScript modules tinypack bundles.
//! Every node carries the byte span it was parsed from, so later stages can
//! rewrite the original text in place instead of re-printing the tree.

use std::fmt;

// =============================================================================
// Core Types (kept in lib.rs - used by all modules)
// =============================================================================

/// Byte range in the source text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn merge(&self, other: &Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// AST node wrapper that includes span information
#[derive(Debug, Clone, PartialEq)]
pub struct Node<T> {
    pub span: Span,
    pub value: T,
}

impl<T> Node<T> {
    pub fn new(value: T, span: Span) -> Self {
        Self { span, value }
    }
}

/// Identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Ident {
    pub name: String,
}

impl Ident {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl fmt::Display for Ident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

// =============================================================================
// Module Declarations
// =============================================================================

pub mod expr;
pub mod stmt;
pub mod decl;
pub mod module;
pub mod visit;

pub use expr::*;
pub use stmt::*;
pub use decl::*;
pub use module::*;
pub use visit::Visit;

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn dummy_span() -> Span {
        Span::new(0, 0)
    }

    #[test]
    fn test_span_merge() {
        let a = Span::new(4, 9);
        let b = Span::new(12, 20);
        assert_eq!(a.merge(&b), Span::new(4, 20));
        assert_eq!(b.merge(&a), Span::new(4, 20));
        assert_eq!(a.len(), 5);
        assert!(Span::new(3, 3).is_empty());
    }

    #[test]
    fn test_expressions() {
        let literal = Expr::Literal(Literal::Number(42.0));
        assert!(matches!(literal, Expr::Literal(Literal::Number(n)) if n == 42.0));

        let ident = Expr::Ident(Ident::new("x"));
        assert!(matches!(ident, Expr::Ident(_)));
    }

    #[test]
    fn test_binary_op() {
        assert_eq!(format!("{}", BinaryOp::Add), "+");
        assert_eq!(format!("{}", BinaryOp::StrictEq), "===");
        assert_eq!(format!("{}", BinaryOp::NullishCoalesce), "??");
    }

    #[test]
    fn test_var_decl() {
        let decl = VarDecl {
            kind: VarDeclKind::Const,
            declarations: vec![VarDeclarator {
                pattern: Node::new(
                    Pattern::Ident(Node::new(Ident::new("x"), dummy_span())),
                    dummy_span(),
                ),
                init: Some(Node::new(
                    Expr::Literal(Literal::Number(10.0)),
                    dummy_span(),
                )),
            }],
        };

        assert_eq!(decl.kind, VarDeclKind::Const);
        assert_eq!(format!("{}", decl.kind), "const");
        assert_eq!(decl.declarations.len(), 1);
    }

    #[test]
    fn test_pattern_bound_names() {
        // const { a, b: [c, ...d], e = 1 } = obj
        let ident = |name: &str| {
            Node::new(Pattern::Ident(Node::new(Ident::new(name), dummy_span())), dummy_span())
        };
        let pattern = Pattern::Object {
            properties: vec![
                ObjectPatternProperty {
                    key: PropertyName::Ident(Node::new(Ident::new("a"), dummy_span())),
                    value: ident("a"),
                    shorthand: true,
                },
                ObjectPatternProperty {
                    key: PropertyName::Ident(Node::new(Ident::new("b"), dummy_span())),
                    value: Node::new(
                        Pattern::Array {
                            elements: vec![Some(ident("c"))],
                            rest: Some(Box::new(ident("d"))),
                        },
                        dummy_span(),
                    ),
                    shorthand: false,
                },
                ObjectPatternProperty {
                    key: PropertyName::Ident(Node::new(Ident::new("e"), dummy_span())),
                    value: Node::new(
                        Pattern::Assignment {
                            pattern: Box::new(ident("e")),
                            default: Box::new(Node::new(
                                Expr::Literal(Literal::Number(1.0)),
                                dummy_span(),
                            )),
                        },
                        dummy_span(),
                    ),
                    shorthand: true,
                },
            ],
            rest: None,
        };

        assert_eq!(pattern.bound_names(), vec!["a", "c", "d", "e"]);
    }

    #[test]
    fn test_function_decl() {
        let func = Function {
            name: Some(Node::new(Ident::new("foo"), dummy_span())),
            params: vec![],
            body: Node::new(BlockStmt { stmts: vec![] }, dummy_span()),
            is_async: false,
            is_generator: false,
        };

        let decl = Decl::Function(func);
        assert_eq!(decl.bound_names(), vec!["foo"]);
    }
}
