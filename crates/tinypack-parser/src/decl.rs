//! Declaration parsing

use super::*;

impl Parser {
    /// Function, class or variable declaration. `name_optional` allows the
    /// anonymous forms accepted after `export default`.
    pub(crate) fn parse_declaration(&mut self, name_optional: bool) -> ParseResult<Node<Decl>> {
        let start = self.current_token().span;

        let decl = match self.current_token().kind {
            TokenKind::Function => Decl::Function(self.parse_function(name_optional)?),
            TokenKind::Identifier if self.is_async_function() => {
                Decl::Function(self.parse_function(name_optional)?)
            }
            TokenKind::Class => Decl::Class(self.parse_class(name_optional)?),
            TokenKind::Const | TokenKind::Let | TokenKind::Var => {
                Decl::Var(self.parse_var_declaration()?)
            }
            _ => {
                return Err(self.error(format!(
                    "Expected declaration, found {:?}",
                    self.current_token().kind
                )))
            }
        };

        let span = start.merge(&self.previous_token().span);
        Ok(Node::new(decl, span))
    }

    pub(crate) fn parse_function(&mut self, name_optional: bool) -> ParseResult<Function> {
        let is_async = self.eat_word("async");

        self.consume(TokenKind::Function)?;

        let is_generator = self.eat(TokenKind::Star);

        let name = if self.check(&TokenKind::Identifier) {
            Some(self.parse_identifier()?)
        } else if name_optional {
            None
        } else {
            return Err(self.error("Expected function name".to_string()));
        };

        self.parse_function_rest(name, is_async, is_generator)
    }

    /// Parameters and body of a function, method or accessor.
    pub(crate) fn parse_function_rest(
        &mut self,
        name: Option<Node<Ident>>,
        is_async: bool,
        is_generator: bool,
    ) -> ParseResult<Function> {
        let params = self.with_in(|p| p.parse_function_params())?;
        let body = self.with_in(|p| p.parse_block_statement())?;

        Ok(Function {
            name,
            params,
            body,
            is_async,
            is_generator,
        })
    }

    pub(crate) fn parse_class(&mut self, name_optional: bool) -> ParseResult<Class> {
        self.consume(TokenKind::Class)?;

        let name = if self.check(&TokenKind::Identifier) {
            Some(self.parse_identifier()?)
        } else if name_optional {
            None
        } else {
            return Err(self.error("Expected class name".to_string()));
        };

        let extends = if self.eat(TokenKind::Extends) {
            // Left-hand-side expression: member accesses and calls only
            Some(Box::new(self.parse_expression_with_precedence(17)?))
        } else {
            None
        };

        self.consume(TokenKind::LBrace)?;
        let mut members = Vec::new();

        while !self.check(&TokenKind::RBrace) && !self.is_at_end() {
            if self.eat(TokenKind::Semicolon) {
                continue;
            }
            members.push(self.parse_class_member()?);
        }

        self.consume(TokenKind::RBrace)?;

        Ok(Class {
            name,
            extends,
            members,
        })
    }

    pub(crate) fn parse_class_member(&mut self) -> ParseResult<ClassMember> {
        let mut is_static = false;
        if self.check_word("static") && self.modifier_applies() {
            self.advance();
            if self.check(&TokenKind::LBrace) {
                let body = self.with_in(|p| p.parse_block_statement())?;
                return Ok(ClassMember::StaticBlock(body));
            }
            is_static = true;
        }

        let (kind, is_async, is_generator) = self.parse_method_modifiers();
        let key = self.parse_property_name()?;

        if self.check(&TokenKind::LParen) {
            let is_constructor = !is_static
                && kind == MethodKind::Method
                && !is_async
                && !is_generator
                && match &key {
                    PropertyName::Ident(ident) => ident.value.name == "constructor",
                    PropertyName::String(name) => name == "constructor",
                    _ => false,
                };

            let function = self.parse_function_rest(None, is_async, is_generator)?;

            if is_constructor {
                return Ok(ClassMember::Constructor {
                    params: function.params,
                    body: function.body,
                });
            }

            return Ok(ClassMember::Method {
                key,
                kind,
                function,
                is_static,
            });
        }

        if kind != MethodKind::Method || is_async || is_generator {
            return Err(self.error("Expected '(' after method name".to_string()));
        }

        // Field
        let value = if self.eat(TokenKind::Eq) {
            Some(self.with_in(|p| p.parse_assignment())?)
        } else {
            None
        };
        self.consume_semicolon();

        Ok(ClassMember::Property {
            key,
            value,
            is_static,
        })
    }
}
