//! # tinypack Parser
//!
//! Recursive descent parser for JavaScript modules.
//! Uses precedence climbing for expressions with proper operator precedence.
//! Every node keeps the byte span it came from so the bundler can rewrite
//! the original text in place.

use tinypack_ast::*;
use tinypack_lexer::{Lexer, Token, TokenKind};

// Module declarations
mod error;
mod parser;
mod expr;
mod stmt;
mod decl;
mod pattern;
mod helpers;

// Re-export public types
pub use error::{ParseError, ParseResult};
pub use parser::Parser;

pub(crate) use helpers::parse_number;

/// Tokenizes and parses `source` as a module.
pub fn parse_module(source: &str) -> Result<Program, Vec<ParseError>> {
    let tokens = Lexer::new(source).tokenize();
    Parser::new(tokens).parse_program()
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> Result<Program, Vec<ParseError>> {
        parse_module(source)
    }

    fn first_stmt(program: &Program) -> &Stmt {
        match &program.items[0].value {
            ModuleItem::Stmt(stmt) => &stmt.value,
            other => panic!("expected statement, got {:?}", other),
        }
    }

    fn first_expr(program: &Program) -> &Expr {
        match first_stmt(program) {
            Stmt::Expr(expr) => &expr.value,
            other => panic!("expected expression statement, got {:?}", other),
        }
    }

    fn first_init(program: &Program) -> &Expr {
        match first_stmt(program) {
            Stmt::Decl(Decl::Var(decl)) => &decl.declarations[0].init.as_ref().unwrap().value,
            other => panic!("expected variable declaration, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_variable_declaration() {
        let program = parse("let x = 42, [a, , ...b] = list, { c, d: e = 1 } = obj;").unwrap();
        assert_eq!(program.items.len(), 1);
        match first_stmt(&program) {
            Stmt::Decl(decl) => assert_eq!(decl.bound_names(), vec!["x", "a", "b", "c", "e"]),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_parse_function_declaration() {
        let program = parse("function add(a, b = 2, ...rest) { return a + b; }").unwrap();
        match first_stmt(&program) {
            Stmt::Decl(Decl::Function(func)) => {
                assert_eq!(func.name.as_ref().unwrap().value.name, "add");
                assert_eq!(func.params.len(), 3);
                assert!(func.params[2].is_rest);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_parse_arrow_functions() {
        for source in [
            "const f = x => x * 2;",
            "const f = (a, b) => a + b;",
            "const f = () => { return 1; };",
            "const f = async x => await x;",
            "const f = async (a, { b }) => b;",
            "const f = ([a, b] = []) => a;",
        ] {
            let program = parse(source).unwrap();
            assert!(
                matches!(first_init(&program), Expr::Arrow { .. }),
                "{}",
                source
            );
        }

        let program = parse("const f = async (x) => x;").unwrap();
        assert!(matches!(first_init(&program), Expr::Arrow { is_async: true, .. }));
    }

    #[test]
    fn test_parenthesized_expression_is_not_arrow() {
        let program = parse("(a, b);").unwrap();
        assert!(matches!(first_expr(&program), Expr::Paren(_)));

        let program = parse("async(1);").unwrap();
        assert!(matches!(first_expr(&program), Expr::Call { .. }));
    }

    #[test]
    fn test_parse_class_declaration() {
        let source = r#"
            class Point extends Base {
                #secret = 1;
                static count = 0;
                static { Point.count = 1; }

                constructor(x, y) {
                    super();
                    this.x = x;
                    this.y = y;
                }

                get length() { return Math.hypot(this.x, this.y); }
                set length(v) {}
                static create() { return new Point(0, 0); }
                async *items() { yield this.x; }
            }
        "#;
        let program = parse(source).unwrap();
        match first_stmt(&program) {
            Stmt::Decl(Decl::Class(class)) => {
                assert_eq!(class.name.as_ref().unwrap().value.name, "Point");
                assert!(class.extends.is_some());
                assert_eq!(class.members.len(), 8);
                assert!(matches!(class.members[3], ClassMember::Constructor { .. }));
                assert!(matches!(
                    class.members[4],
                    ClassMember::Method { kind: MethodKind::Getter, .. }
                ));
                assert!(matches!(
                    class.members[7],
                    ClassMember::Method { function: Function { is_async: true, is_generator: true, .. }, .. }
                ));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_parse_imports() {
        let source = r#"
            import "./polyfill";
            import def from "./a";
            import * as ns from "./b";
            import { foo, bar as baz, default as other } from "./c";
            import d, { e } from "./d";
        "#;
        let program = parse(source).unwrap();
        assert_eq!(program.items.len(), 5);

        let sources: Vec<_> = program
            .items
            .iter()
            .map(|item| match &item.value {
                ModuleItem::Import(import) => import.source.value.as_str(),
                _ => panic!("expected import"),
            })
            .collect();
        assert_eq!(sources, ["./polyfill", "./a", "./b", "./c", "./d"]);

        if let ModuleItem::Import(import) = &program.items[3].value {
            assert_eq!(import.specifiers.len(), 3);
            assert_eq!(&source[import.source.span.start..import.source.span.end], "\"./c\"");
        }
    }

    #[test]
    fn test_parse_exports() {
        let source = r#"
            export const a = 1, b = 2;
            export function f() {}
            export class C {}
            export { a as x, b };
            export { y as z } from "./y";
            export * from "./all";
            export * as ns from "./ns";
            export default a + b;
        "#;
        let program = parse(source).unwrap();
        assert_eq!(program.items.len(), 8);
        assert!(program.has_module_syntax());

        match &program.items[0].value {
            ModuleItem::Export(ExportDecl::Decl(decl)) => {
                assert_eq!(decl.value.bound_names(), vec!["a", "b"])
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(matches!(
            &program.items[7].value,
            ModuleItem::Export(ExportDecl::Default(_))
        ));
    }

    #[test]
    fn test_parse_export_default_declarations() {
        let program = parse("export default function () {}").unwrap();
        match &program.items[0].value {
            ModuleItem::Export(ExportDecl::DefaultDecl(decl)) => {
                assert!(decl.value.bound_names().is_empty())
            }
            other => panic!("unexpected {:?}", other),
        }

        let program = parse("export default class Foo {}").unwrap();
        match &program.items[0].value {
            ModuleItem::Export(ExportDecl::DefaultDecl(decl)) => {
                assert_eq!(decl.value.bound_names(), vec!["Foo"])
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_parse_control_flow() {
        let source = r#"
            if (x > 0) {
                console.log("positive");
            } else {
                console.log("negative");
            }

            for (let i = 0; i < 10; i++) {
                console.log(i);
            }

            for (const [k, v] of Object.entries(o)) {}
            for (key in obj) {}

            outer: while (true) {
                break outer;
            }

            switch (x) { case 1: y(); break; default: z(); }
            try { a(); } catch { b(); } finally { c(); }
            do x--; while (x)
        "#;
        let program = parse(source).unwrap();
        assert_eq!(program.items.len(), 8);
        assert!(matches!(
            &program.items[2].value,
            ModuleItem::Stmt(Node { value: Stmt::ForOf { .. }, .. })
        ));
        assert!(matches!(
            &program.items[3].value,
            ModuleItem::Stmt(Node { value: Stmt::ForIn { .. }, .. })
        ));
    }

    #[test]
    fn test_parse_optional_chaining() {
        let program = parse("let x = obj?.prop;").unwrap();
        assert!(matches!(first_init(&program), Expr::OptionalMember { .. }));

        let program = parse("let y = arr?.[0];").unwrap();
        assert!(matches!(first_init(&program), Expr::OptionalIndex { .. }));

        let program = parse("let z = fn?.();").unwrap();
        assert!(matches!(first_init(&program), Expr::OptionalCall { .. }));
    }

    #[test]
    fn test_parse_spread_and_yield() {
        let program = parse("foo(...args);").unwrap();
        match first_expr(&program) {
            Expr::Call { args, .. } => assert!(matches!(args[0].value, Expr::Spread(_))),
            other => panic!("unexpected {:?}", other),
        }

        let program = parse("function* gen() { yield 42; yield* other(); }").unwrap();
        match first_stmt(&program) {
            Stmt::Decl(Decl::Function(func)) => {
                assert!(func.is_generator);
                assert_eq!(func.body.value.stmts.len(), 2);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_parse_templates() {
        let program = parse("let s = `a${b}c${d + 1}e`;").unwrap();
        match first_init(&program) {
            Expr::Template(template) => {
                assert_eq!(template.quasis, vec!["a", "c", "e"]);
                assert_eq!(template.exprs.len(), 2);
            }
            other => panic!("unexpected {:?}", other),
        }

        let program = parse("let q = gql`query { x }`;").unwrap();
        assert!(matches!(first_init(&program), Expr::TaggedTemplate { .. }));
    }

    #[test]
    fn test_parse_object_literal_members() {
        let program = parse(
            "let o = { a, b: 1, [k]: 2, 'c': 3, m() {}, get g() { return 1; }, set s(v) {}, async f() {}, *gen() {}, ...rest, get: 4 };",
        )
        .unwrap();
        match first_init(&program) {
            Expr::Object(properties) => {
                assert_eq!(properties.len(), 11);
                assert!(matches!(
                    properties[0],
                    ObjectProperty::Property { shorthand: true, .. }
                ));
                assert!(matches!(
                    properties[5],
                    ObjectProperty::Method { kind: MethodKind::Getter, .. }
                ));
                assert!(matches!(properties[9], ObjectProperty::Spread(_)));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_parse_precedence() {
        let program = parse("a + b * c ** d ** e;").unwrap();
        match first_expr(&program) {
            Expr::Binary { op: BinaryOp::Add, right, .. } => match &right.value {
                Expr::Binary { op: BinaryOp::Mul, right, .. } => match &right.value {
                    Expr::Binary { op: BinaryOp::Pow, right, .. } => {
                        assert!(matches!(right.value, Expr::Binary { op: BinaryOp::Pow, .. }))
                    }
                    other => panic!("unexpected {:?}", other),
                },
                other => panic!("unexpected {:?}", other),
            },
            other => panic!("unexpected {:?}", other),
        }

        let program = parse("x = a ? b : c, y;").unwrap();
        assert!(matches!(first_expr(&program), Expr::Sequence(items) if items.len() == 2));
    }

    #[test]
    fn test_parse_new_expressions() {
        let program = parse("new a.B(1)(2);").unwrap();
        match first_expr(&program) {
            Expr::Call { callee, .. } => match &callee.value {
                Expr::New { callee, args } => {
                    assert!(matches!(callee.value, Expr::Member { .. }));
                    assert_eq!(args.len(), 1);
                }
                other => panic!("unexpected {:?}", other),
            },
            other => panic!("unexpected {:?}", other),
        }

        let program = parse("function F() { return new.target; }").unwrap();
        assert_eq!(program.items.len(), 1);
    }

    #[test]
    fn test_parse_regex_literal() {
        let program = parse("const re = /a[/]b/gi;").unwrap();
        assert_eq!(
            first_init(&program),
            &Expr::Literal(Literal::RegExp {
                pattern: "a[/]b".to_string(),
                flags: "gi".to_string(),
            })
        );
    }

    #[test]
    fn test_return_asi() {
        let program = parse("function f() { return\n42; }").unwrap();
        match first_stmt(&program) {
            Stmt::Decl(Decl::Function(func)) => {
                assert_eq!(func.body.value.stmts.len(), 2);
                assert!(matches!(func.body.value.stmts[0].value, Stmt::Return(None)));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_postfix_requires_same_line() {
        let program = parse("a\n++b").unwrap();
        assert_eq!(program.items.len(), 2);
    }

    #[test]
    fn test_require_call_spans() {
        let source = "const b = require('./b.js');";
        let program = parse(source).unwrap();
        match first_init(&program) {
            Expr::Call { callee, args } => {
                assert_eq!(callee.value.as_ident(), Some("require"));
                assert_eq!(args[0].value.as_static_string(), Some("./b.js"));
                assert_eq!(&source[args[0].span.start..args[0].span.end], "'./b.js'");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_dynamic_import_is_rejected() {
        let errors = parse("const m = import('./lazy');").unwrap_err();
        assert_eq!(errors[0].message, "dynamic import() is not supported");
    }

    #[test]
    fn test_errors_are_collected() {
        let errors = parse("let = 1;\nconst ok = 2;\nfunction () {}").unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(errors[0].message.contains("Expected pattern"));
        assert!(errors[1].message.contains("Expected function name"));
    }

    #[test]
    fn test_lexer_error_message_is_reported() {
        let errors = parse("let s = 'unterminated\n;").unwrap_err();
        assert_eq!(errors[0].message, "Unterminated string literal");
    }

    #[test]
    fn test_nested_import_is_rejected() {
        let errors = parse("if (x) { import y from './y'; }").unwrap_err();
        assert!(errors[0].message.contains("top level"));
    }
}
