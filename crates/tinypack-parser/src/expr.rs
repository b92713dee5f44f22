//! Expression parsing

use super::*;

impl Parser {
    /// Full expression, including the comma operator.
    pub(crate) fn parse_expression(&mut self) -> ParseResult<Node<Expr>> {
        let first = self.parse_assignment()?;
        if !self.check(&TokenKind::Comma) {
            return Ok(first);
        }

        let start = first.span;
        let mut exprs = vec![first];
        while self.eat(TokenKind::Comma) {
            exprs.push(self.parse_assignment()?);
        }

        let span = start.merge(&self.previous_token().span);
        Ok(Node::new(Expr::Sequence(exprs), span))
    }

    /// Single expression without top-level commas: arguments, initializers,
    /// array elements and property values.
    pub(crate) fn parse_assignment(&mut self) -> ParseResult<Node<Expr>> {
        self.parse_expression_with_precedence(1)
    }

    pub(crate) fn parse_expression_with_precedence(&mut self, min_precedence: u8) -> ParseResult<Node<Expr>> {
        let mut left = self.parse_prefix_expression()?;

        loop {
            let precedence = self.get_infix_precedence();

            if precedence == 0 || precedence < min_precedence {
                break;
            }

            left = self.parse_infix_expression(left)?;
        }

        Ok(left)
    }

    fn parse_unary(&mut self, op: UnaryOp) -> ParseResult<Expr> {
        self.advance();
        let expr = Box::new(self.parse_expression_with_precedence(15)?);
        Ok(Expr::Unary { op, expr })
    }

    fn parse_prefix_expression(&mut self) -> ParseResult<Node<Expr>> {
        let start = self.current_token().span;

        let expr = match self.current_token().kind {
            // Unary operators
            TokenKind::Plus => self.parse_unary(UnaryOp::Plus)?,
            TokenKind::Minus => self.parse_unary(UnaryOp::Minus)?,
            TokenKind::Bang => self.parse_unary(UnaryOp::Not)?,
            TokenKind::Tilde => self.parse_unary(UnaryOp::BitNot)?,
            TokenKind::Typeof => self.parse_unary(UnaryOp::TypeOf)?,
            TokenKind::Void => self.parse_unary(UnaryOp::Void)?,
            TokenKind::Delete => self.parse_unary(UnaryOp::Delete)?,
            TokenKind::PlusPlus => self.parse_unary(UnaryOp::PreIncrement)?,
            TokenKind::MinusMinus => self.parse_unary(UnaryOp::PreDecrement)?,
            TokenKind::Await => {
                self.advance();
                let expr = Box::new(self.parse_expression_with_precedence(15)?);
                Expr::Await(expr)
            }
            TokenKind::Yield => {
                self.advance();
                let delegate = self.eat(TokenKind::Star);
                // `yield` alone ends at a line break or a closing delimiter
                let ends_here = self.current_token().newline_before
                    || self.is_at_end()
                    || matches!(
                        self.current_token().kind,
                        TokenKind::Semicolon
                            | TokenKind::RBrace
                            | TokenKind::RParen
                            | TokenKind::RBracket
                            | TokenKind::Comma
                            | TokenKind::Colon
                    );
                let argument = if ends_here && !delegate {
                    None
                } else {
                    Some(Box::new(self.parse_assignment()?))
                };
                Expr::Yield { argument, delegate }
            }
            _ => return self.parse_primary_expression(),
        };

        let span = start.merge(&self.previous_token().span);
        Ok(Node::new(expr, span))
    }

    fn parse_infix_expression(&mut self, left: Node<Expr>) -> ParseResult<Node<Expr>> {
        let start = left.span;

        let expr = match self.current_token().kind {
            // Assignment operators
            TokenKind::Eq
            | TokenKind::PlusEq
            | TokenKind::MinusEq
            | TokenKind::StarEq
            | TokenKind::SlashEq
            | TokenKind::PercentEq
            | TokenKind::StarStarEq
            | TokenKind::AmpAmpEq
            | TokenKind::PipePipeEq
            | TokenKind::QuestionQuestionEq
            | TokenKind::LtLtEq
            | TokenKind::GtGtEq
            | TokenKind::GtGtGtEq
            | TokenKind::AmpEq
            | TokenKind::PipeEq
            | TokenKind::CaretEq => {
                let op = self.parse_assignment_operator()?;
                let right = Box::new(self.parse_assignment()?);
                Expr::Assignment {
                    target: Box::new(left),
                    op,
                    value: right,
                }
            }

            // Ternary operator
            TokenKind::Question => {
                self.advance();
                let then_expr = Box::new(self.with_in(|p| p.parse_assignment())?);
                self.consume(TokenKind::Colon)?;
                let else_expr = Box::new(self.parse_assignment()?);
                Expr::Ternary {
                    condition: Box::new(left),
                    then_expr,
                    else_expr,
                }
            }

            // Exponentiation is right-associative
            TokenKind::StarStar => {
                let op = self.parse_binary_operator()?;
                let right = Box::new(self.parse_expression_with_precedence(14)?);
                Expr::Binary {
                    left: Box::new(left),
                    op,
                    right,
                }
            }

            // Binary operators
            TokenKind::PipePipe
            | TokenKind::AmpAmp
            | TokenKind::Pipe
            | TokenKind::Caret
            | TokenKind::Amp
            | TokenKind::EqEq
            | TokenKind::BangEq
            | TokenKind::EqEqEq
            | TokenKind::BangEqEq
            | TokenKind::Lt
            | TokenKind::Gt
            | TokenKind::LtEq
            | TokenKind::GtEq
            | TokenKind::In
            | TokenKind::Instanceof
            | TokenKind::LtLt
            | TokenKind::GtGt
            | TokenKind::GtGtGt
            | TokenKind::Plus
            | TokenKind::Minus
            | TokenKind::Star
            | TokenKind::Slash
            | TokenKind::Percent
            | TokenKind::QuestionQuestion => {
                let precedence = self.get_infix_precedence();
                let op = self.parse_binary_operator()?;
                let right = Box::new(self.parse_expression_with_precedence(precedence + 1)?);
                Expr::Binary {
                    left: Box::new(left),
                    op,
                    right,
                }
            }

            // Member access
            TokenKind::Dot => {
                self.advance();
                let property = self.parse_identifier_name()?;
                Expr::Member {
                    object: Box::new(left),
                    property,
                }
            }

            // Optional chaining
            TokenKind::QuestionDot => {
                self.advance();
                // ?.( for optional call
                if self.check(&TokenKind::LParen) {
                    let args = self.parse_arguments()?;
                    Expr::OptionalCall {
                        callee: Box::new(left),
                        args,
                    }
                }
                // ?.[ for optional index
                else if self.eat(TokenKind::LBracket) {
                    let index = Box::new(self.with_in(|p| p.parse_expression())?);
                    self.consume(TokenKind::RBracket)?;
                    Expr::OptionalIndex {
                        object: Box::new(left),
                        index,
                    }
                }
                // ?.property for optional member
                else {
                    let property = self.parse_identifier_name()?;
                    Expr::OptionalMember {
                        object: Box::new(left),
                        property,
                    }
                }
            }

            // Index access
            TokenKind::LBracket => {
                self.advance();
                let index = Box::new(self.with_in(|p| p.parse_expression())?);
                self.consume(TokenKind::RBracket)?;
                Expr::Index {
                    object: Box::new(left),
                    index,
                }
            }

            // Function call
            TokenKind::LParen => {
                let args = self.parse_arguments()?;
                Expr::Call {
                    callee: Box::new(left),
                    args,
                }
            }

            // Tagged template
            TokenKind::NoSubstitutionTemplate | TokenKind::TemplateHead => {
                let template = self.parse_template()?;
                Expr::TaggedTemplate {
                    tag: Box::new(left),
                    template,
                }
            }

            // Postfix operators
            TokenKind::PlusPlus => {
                self.advance();
                Expr::Unary {
                    op: UnaryOp::PostIncrement,
                    expr: Box::new(left),
                }
            }

            TokenKind::MinusMinus => {
                self.advance();
                Expr::Unary {
                    op: UnaryOp::PostDecrement,
                    expr: Box::new(left),
                }
            }

            _ => return Ok(left),
        };

        let span = start.merge(&self.previous_token().span);
        Ok(Node::new(expr, span))
    }

    /// Parses `(a, ...b)` call arguments including the parentheses.
    pub(crate) fn parse_arguments(&mut self) -> ParseResult<Vec<Node<Expr>>> {
        self.consume(TokenKind::LParen)?;
        let args = self.with_in(|p| {
            let mut args = Vec::new();
            while !p.check(&TokenKind::RParen) && !p.is_at_end() {
                args.push(p.parse_spread_or_assignment()?);
                if !p.check(&TokenKind::RParen) {
                    p.consume(TokenKind::Comma)?;
                }
            }
            Ok(args)
        })?;
        self.consume(TokenKind::RParen)?;
        Ok(args)
    }

    fn parse_spread_or_assignment(&mut self) -> ParseResult<Node<Expr>> {
        if self.check(&TokenKind::DotDotDot) {
            let spread_start = self.current_token().span;
            self.advance();
            let expr = self.parse_assignment()?;
            let spread_span = spread_start.merge(&expr.span);
            return Ok(Node::new(Expr::Spread(Box::new(expr)), spread_span));
        }
        self.parse_assignment()
    }

    /// Parses a template starting at a `NoSubstitutionTemplate` or
    /// `TemplateHead` token.
    fn parse_template(&mut self) -> ParseResult<Template> {
        let kind = self.current_token().kind;
        let head = self.advance().value.clone();
        let mut quasis = vec![head];
        let mut exprs = Vec::new();

        if kind == TokenKind::NoSubstitutionTemplate {
            return Ok(Template { quasis, exprs });
        }

        loop {
            exprs.push(self.with_in(|p| p.parse_expression())?);
            match self.current_token().kind {
                TokenKind::TemplateMiddle => {
                    quasis.push(self.advance().value.clone());
                }
                TokenKind::TemplateTail => {
                    quasis.push(self.advance().value.clone());
                    break;
                }
                _ => return Err(self.error("Expected '}' to close template substitution".to_string())),
            }
        }

        Ok(Template { quasis, exprs })
    }

    pub(crate) fn parse_primary_expression(&mut self) -> ParseResult<Node<Expr>> {
        let start = self.current_token().span;

        let expr = match self.current_token().kind {
            // Literals
            TokenKind::NumberLiteral => {
                let value = self.advance().value.clone();
                Expr::Literal(Literal::Number(parse_number(&value)))
            }
            TokenKind::BigIntLiteral => {
                let value = self.advance().value.clone();
                Expr::Literal(Literal::BigInt(value))
            }
            TokenKind::StringLiteral => {
                let value = self.advance().value.clone();
                Expr::Literal(Literal::String(value))
            }
            TokenKind::RegexLiteral => {
                let raw = self.advance().value.clone();
                let close = raw.rfind('/').unwrap_or(0);
                Expr::Literal(Literal::RegExp {
                    pattern: raw.get(1..close).unwrap_or_default().to_string(),
                    flags: raw[close + 1..].to_string(),
                })
            }
            TokenKind::True => {
                self.advance();
                Expr::Literal(Literal::Boolean(true))
            }
            TokenKind::False => {
                self.advance();
                Expr::Literal(Literal::Boolean(false))
            }
            TokenKind::Null => {
                self.advance();
                Expr::Literal(Literal::Null)
            }

            // Template literal
            TokenKind::NoSubstitutionTemplate | TokenKind::TemplateHead => {
                Expr::Template(self.parse_template()?)
            }

            // Identifiers, arrows with a bare parameter, async functions
            TokenKind::Identifier => return self.parse_identifier_expression(),

            // This
            TokenKind::This => {
                self.advance();
                Expr::This
            }

            // Super
            TokenKind::Super => {
                self.advance();
                Expr::Super
            }

            // Array literal
            TokenKind::LBracket => {
                self.advance();
                let mut elements = Vec::new();

                while !self.check(&TokenKind::RBracket) && !self.is_at_end() {
                    if self.eat(TokenKind::Comma) {
                        elements.push(None);
                        continue;
                    }
                    elements.push(Some(self.parse_spread_or_assignment()?));
                    if !self.check(&TokenKind::RBracket) {
                        self.consume(TokenKind::Comma)?;
                    }
                }

                self.consume(TokenKind::RBracket)?;
                Expr::Array(elements)
            }

            // Object literal
            TokenKind::LBrace => self.parse_object_literal()?,

            // Parenthesized expression or arrow function
            TokenKind::LParen => {
                return self.parse_paren_or_arrow();
            }

            // Function expression
            TokenKind::Function => Expr::Function(Box::new(self.parse_function(true)?)),

            // Class expression
            TokenKind::Class => Expr::Class(Box::new(self.parse_class(true)?)),

            // New expression
            TokenKind::New => {
                self.advance();

                if self.eat(TokenKind::Dot) {
                    // new.target
                    let property = self.parse_identifier_name()?;
                    Expr::MetaProperty {
                        meta: Node::new(Ident::new("new"), start),
                        property,
                    }
                } else {
                    let callee = Box::new(self.parse_new_callee()?);
                    let args = if self.check(&TokenKind::LParen) {
                        self.parse_arguments()?
                    } else {
                        Vec::new()
                    };
                    Expr::New { callee, args }
                }
            }

            TokenKind::Import => {
                self.advance();
                if self.check(&TokenKind::LParen) {
                    return Err(ParseError {
                        message: "dynamic import() is not supported".to_string(),
                        span: start.merge(&self.current_token().span),
                    });
                }
                self.consume(TokenKind::Dot)?;
                let property = self.parse_identifier_name()?;
                Expr::MetaProperty {
                    meta: Node::new(Ident::new("import"), start),
                    property,
                }
            }

            _ => {
                return Err(self.error(format!(
                    "Unexpected token in expression: {:?}",
                    self.current_token().kind
                )))
            }
        };

        let span = start.merge(&self.previous_token().span);
        Ok(Node::new(expr, span))
    }

    fn parse_identifier_expression(&mut self) -> ParseResult<Node<Expr>> {
        let start = self.current_token().span;

        // x => body
        if self.peek_kind(1) == Some(TokenKind::FatArrow) && !self.peek_newline(1) {
            let param = self.parse_bare_param()?;
            return self.parse_arrow_function(start, vec![param], false);
        }

        if self.check_word("async") && !self.peek_newline(1) {
            match self.peek_kind(1) {
                Some(TokenKind::Function) => {
                    let function = self.parse_function(true)?;
                    let span = start.merge(&self.previous_token().span);
                    return Ok(Node::new(Expr::Function(Box::new(function)), span));
                }
                // async x => body
                Some(TokenKind::Identifier) if self.peek_kind(2) == Some(TokenKind::FatArrow) => {
                    self.advance();
                    let param = self.parse_bare_param()?;
                    return self.parse_arrow_function(start, vec![param], true);
                }
                // async (a, b) => body, or a call to something named `async`
                Some(TokenKind::LParen) => {
                    let checkpoint = self.current;
                    self.advance();
                    if let Ok(params) = self.parse_function_params() {
                        if self.check(&TokenKind::FatArrow) && !self.current_token().newline_before {
                            return self.parse_arrow_function(start, params, true);
                        }
                    }
                    self.current = checkpoint;
                }
                _ => {}
            }
        }

        let ident = self.parse_identifier()?;
        Ok(Node::new(Expr::Ident(ident.value), ident.span))
    }

    fn parse_bare_param(&mut self) -> ParseResult<Param> {
        let ident = self.parse_identifier()?;
        let span = ident.span;
        Ok(Param {
            pattern: Node::new(Pattern::Ident(ident), span),
            is_rest: false,
        })
    }

    /// Callee of `new`: a member chain without call arguments, so that
    /// `new a.B(x)` passes `x` to `a.B`.
    fn parse_new_callee(&mut self) -> ParseResult<Node<Expr>> {
        let start = self.current_token().span;
        let mut callee = self.parse_primary_expression()?;

        loop {
            let expr = match self.current_token().kind {
                TokenKind::Dot => {
                    self.advance();
                    let property = self.parse_identifier_name()?;
                    Expr::Member {
                        object: Box::new(callee),
                        property,
                    }
                }
                TokenKind::LBracket => {
                    self.advance();
                    let index = Box::new(self.with_in(|p| p.parse_expression())?);
                    self.consume(TokenKind::RBracket)?;
                    Expr::Index {
                        object: Box::new(callee),
                        index,
                    }
                }
                TokenKind::NoSubstitutionTemplate | TokenKind::TemplateHead => {
                    let template = self.parse_template()?;
                    Expr::TaggedTemplate {
                        tag: Box::new(callee),
                        template,
                    }
                }
                _ => break,
            };
            callee = Node::new(expr, start.merge(&self.previous_token().span));
        }

        Ok(callee)
    }

    fn parse_object_literal(&mut self) -> ParseResult<Expr> {
        self.consume(TokenKind::LBrace)?;
        let mut properties = Vec::new();

        while !self.check(&TokenKind::RBrace) && !self.is_at_end() {
            // Spread
            if self.eat(TokenKind::DotDotDot) {
                let expr = self.parse_assignment()?;
                properties.push(ObjectProperty::Spread(expr));
            } else {
                properties.push(self.parse_object_member()?);
            }

            if !self.check(&TokenKind::RBrace) {
                self.consume(TokenKind::Comma)?;
            }
        }

        self.consume(TokenKind::RBrace)?;
        Ok(Expr::Object(properties))
    }

    fn parse_object_member(&mut self) -> ParseResult<ObjectProperty> {
        let (kind, is_async, is_generator) = self.parse_method_modifiers();
        let key = self.parse_property_name()?;

        // Method shorthand, getter or setter
        if self.check(&TokenKind::LParen) {
            let function = self.parse_function_rest(None, is_async, is_generator)?;
            return Ok(ObjectProperty::Method {
                key,
                kind,
                function,
            });
        }

        if kind != MethodKind::Method || is_async || is_generator {
            return Err(self.error("Expected '(' after method name".to_string()));
        }

        if self.eat(TokenKind::Colon) {
            let value = self.parse_assignment()?;
            return Ok(ObjectProperty::Property {
                key,
                value,
                shorthand: false,
            });
        }

        // Shorthand property
        match key {
            PropertyName::Ident(ident) => {
                let value = Node::new(Expr::Ident(ident.value.clone()), ident.span);
                Ok(ObjectProperty::Property {
                    key: PropertyName::Ident(ident),
                    value,
                    shorthand: true,
                })
            }
            _ => Err(self.error("Invalid property shorthand".to_string())),
        }
    }

    fn parse_paren_or_arrow(&mut self) -> ParseResult<Node<Expr>> {
        let start = self.current_token().span;

        // Try to determine if this is an arrow function or parenthesized expression
        let checkpoint = self.current;

        // Try parsing as arrow function parameters
        if let Ok(params) = self.parse_function_params() {
            if self.check(&TokenKind::FatArrow) && !self.current_token().newline_before {
                return self.parse_arrow_function(start, params, false);
            }
        }

        // Reset and parse as parenthesized expression
        self.current = checkpoint;
        self.consume(TokenKind::LParen)?;
        let expr = self.with_in(|p| p.parse_expression())?;
        self.consume(TokenKind::RParen)?;

        let span = start.merge(&self.previous_token().span);
        Ok(Node::new(Expr::Paren(Box::new(expr)), span))
    }

    fn parse_arrow_function(
        &mut self,
        start: Span,
        params: Vec<Param>,
        is_async: bool,
    ) -> ParseResult<Node<Expr>> {
        self.consume(TokenKind::FatArrow)?;

        let body = if self.check(&TokenKind::LBrace) {
            ArrowBody::Block(Box::new(self.parse_block_statement()?))
        } else {
            ArrowBody::Expr(Box::new(self.parse_assignment()?))
        };

        let span = start.merge(&self.previous_token().span);
        Ok(Node::new(
            Expr::Arrow {
                params,
                body,
                is_async,
            },
            span,
        ))
    }
}
