//! Core Parser struct and main parsing methods

use super::*;

/// Recursive descent parser for JavaScript modules
pub struct Parser {
    pub(crate) tokens: Vec<Token>,
    pub(crate) current: usize,
    /// Set while parsing a `for (...;` head, where `in` starts a for-in loop.
    pub(crate) no_in: bool,
}

impl Parser {
    /// Creates a new parser from a token stream
    pub fn new(mut tokens: Vec<Token>) -> Self {
        if tokens.last().map_or(true, |t| t.kind != TokenKind::Eof) {
            let end = tokens.last().map_or(0, |t| t.span.end);
            tokens.push(Token {
                kind: TokenKind::Eof,
                span: Span::new(end, end),
                value: String::new(),
                newline_before: false,
            });
        }
        Self {
            tokens,
            current: 0,
            no_in: false,
        }
    }

    /// Parses a complete program, collecting every error instead of
    /// stopping at the first one.
    pub fn parse_program(&mut self) -> Result<Program, Vec<ParseError>> {
        let mut items = Vec::new();
        let mut errors = Vec::new();

        while !self.is_at_end() {
            match self.parse_module_item() {
                Ok(item) => items.push(item),
                Err(err) => {
                    errors.push(err);
                    self.synchronize();
                }
            }
        }

        if errors.is_empty() {
            let end = self.current_token().span.end;
            Ok(Program {
                items,
                span: Span::new(0, end),
            })
        } else {
            Err(errors)
        }
    }

    // =========================================================================
    // Module Items
    // =========================================================================

    pub(crate) fn parse_module_item(&mut self) -> ParseResult<Node<ModuleItem>> {
        let start = self.current_token().span;

        let item = match self.current_token().kind {
            // `import(...)` and `import.meta` are expressions
            TokenKind::Import
                if !matches!(self.peek_kind(1), Some(TokenKind::LParen | TokenKind::Dot)) =>
            {
                ModuleItem::Import(self.parse_import_decl()?)
            }
            TokenKind::Export => ModuleItem::Export(self.parse_export_decl()?),
            _ => ModuleItem::Stmt(self.parse_statement()?),
        };

        let span = start.merge(&self.previous_token().span);
        Ok(Node::new(item, span))
    }

    // =========================================================================
    // Import/Export
    // =========================================================================

    fn parse_module_source(&mut self) -> ParseResult<ModuleSource> {
        let token = self.consume(TokenKind::StringLiteral)?;
        Ok(ModuleSource {
            value: token.value.clone(),
            span: token.span,
        })
    }

    pub(crate) fn parse_import_decl(&mut self) -> ParseResult<ImportDecl> {
        self.consume(TokenKind::Import)?;

        let mut specifiers = Vec::new();

        // import "module"
        if self.check(&TokenKind::StringLiteral) {
            let source = self.parse_module_source()?;
            self.consume_semicolon();
            return Ok(ImportDecl { specifiers, source });
        }

        // import defaultName from "module"
        if self.check(&TokenKind::Identifier) {
            let name = self.parse_identifier()?;
            specifiers.push(ImportSpecifier::Default(name));

            if !self.eat(TokenKind::Comma) {
                return self.finish_import(specifiers);
            }
        }

        // import * as name from "module"
        if self.eat(TokenKind::Star) {
            self.expect_word("as")?;
            let name = self.parse_identifier()?;
            specifiers.push(ImportSpecifier::Namespace(name));
        }
        // import { a, b as c } from "module"
        else if self.eat(TokenKind::LBrace) {
            while !self.check(&TokenKind::RBrace) && !self.is_at_end() {
                let imported = self.parse_identifier_name()?;
                let local = if self.eat_word("as") {
                    Some(self.parse_identifier()?)
                } else {
                    None
                };

                specifiers.push(ImportSpecifier::Named { imported, local });

                if !self.check(&TokenKind::RBrace) {
                    self.consume(TokenKind::Comma)?;
                }
            }

            self.consume(TokenKind::RBrace)?;
        } else {
            return Err(self.error(format!(
                "Expected import specifiers, found {:?}",
                self.current_token().kind
            )));
        }

        self.finish_import(specifiers)
    }

    fn finish_import(&mut self, specifiers: Vec<ImportSpecifier>) -> ParseResult<ImportDecl> {
        self.expect_word("from")?;
        let source = self.parse_module_source()?;
        self.consume_semicolon();
        Ok(ImportDecl { specifiers, source })
    }

    pub(crate) fn parse_export_decl(&mut self) -> ParseResult<ExportDecl> {
        self.consume(TokenKind::Export)?;

        // export default
        if self.eat(TokenKind::Default) {
            if self.check(&TokenKind::Function)
                || self.check(&TokenKind::Class)
                || self.is_async_function()
            {
                let decl = self.parse_declaration(true)?;
                return Ok(ExportDecl::DefaultDecl(Box::new(decl)));
            }

            let expr = self.parse_assignment()?;
            self.consume_semicolon();
            return Ok(ExportDecl::Default(expr));
        }

        // export * from "module"
        if self.eat(TokenKind::Star) {
            let as_name = if self.eat_word("as") {
                Some(self.parse_identifier_name()?)
            } else {
                None
            };

            self.expect_word("from")?;
            let source = self.parse_module_source()?;
            self.consume_semicolon();

            return Ok(ExportDecl::All { source, as_name });
        }

        // export { ... }
        if self.eat(TokenKind::LBrace) {
            let mut specifiers = Vec::new();

            while !self.check(&TokenKind::RBrace) && !self.is_at_end() {
                let local = self.parse_identifier_name()?;
                let exported = if self.eat_word("as") {
                    Some(self.parse_identifier_name()?)
                } else {
                    None
                };

                specifiers.push(ExportSpecifier { local, exported });

                if !self.check(&TokenKind::RBrace) {
                    self.consume(TokenKind::Comma)?;
                }
            }

            self.consume(TokenKind::RBrace)?;

            let source = if self.eat_word("from") {
                Some(self.parse_module_source()?)
            } else {
                None
            };

            self.consume_semicolon();

            return Ok(ExportDecl::Named { specifiers, source });
        }

        // export declaration
        let decl = self.parse_declaration(false)?;
        Ok(ExportDecl::Decl(Box::new(decl)))
    }
}
