//! Helper methods and utilities

use super::*;

impl Parser {
    pub(crate) fn parse_identifier(&mut self) -> ParseResult<Node<Ident>> {
        let token = self.consume(TokenKind::Identifier)?;
        Ok(Node::new(Ident::new(token.value.clone()), token.span))
    }

    /// Identifier, keyword or private name: property names after `.`,
    /// object keys and import/export specifiers.
    pub(crate) fn parse_identifier_name(&mut self) -> ParseResult<Node<Ident>> {
        let kind = self.current_token().kind;
        if kind == TokenKind::Identifier || kind == TokenKind::PrivateName || kind.is_keyword() {
            let token = self.advance();
            Ok(Node::new(Ident::new(token.value.clone()), token.span))
        } else {
            Err(self.error(format!("Expected property name, found {:?}", kind)))
        }
    }

    pub(crate) fn parse_property_name(&mut self) -> ParseResult<PropertyName> {
        match self.current_token().kind {
            TokenKind::StringLiteral | TokenKind::BigIntLiteral => {
                let value = self.advance().value.clone();
                Ok(PropertyName::String(value))
            }
            TokenKind::NumberLiteral => {
                let value = self.advance().value.clone();
                Ok(PropertyName::Number(parse_number(&value)))
            }
            TokenKind::PrivateName => Ok(PropertyName::Private(self.parse_identifier_name()?)),
            TokenKind::LBracket => {
                self.advance();
                let expr = Box::new(self.with_in(|p| p.parse_assignment())?);
                self.consume(TokenKind::RBracket)?;
                Ok(PropertyName::Computed(expr))
            }
            _ => Ok(PropertyName::Ident(self.parse_identifier_name()?)),
        }
    }

    /// Parses `(a, b = 1, ...rest)` including the parentheses.
    pub(crate) fn parse_function_params(&mut self) -> ParseResult<Vec<Param>> {
        self.consume(TokenKind::LParen)?;
        let mut params = Vec::new();

        while !self.check(&TokenKind::RParen) && !self.is_at_end() {
            let is_rest = self.eat(TokenKind::DotDotDot);
            let pattern = if is_rest {
                self.parse_pattern()?
            } else {
                self.parse_pattern_with_default()?
            };
            params.push(Param { pattern, is_rest });

            if !self.check(&TokenKind::RParen) {
                self.consume(TokenKind::Comma)?;
            }
        }

        self.consume(TokenKind::RParen)?;
        Ok(params)
    }

    /// Reads the `async`, `*`, `get` and `set` prefixes of a method in an
    /// object literal or class body.
    pub(crate) fn parse_method_modifiers(&mut self) -> (MethodKind, bool, bool) {
        let mut is_async = false;
        if self.check_word("async") && self.modifier_applies() && !self.peek_newline(1) {
            self.advance();
            is_async = true;
        }

        let is_generator = self.eat(TokenKind::Star);

        let mut kind = MethodKind::Method;
        if !is_async && !is_generator {
            if self.check_word("get") && self.modifier_applies() {
                self.advance();
                kind = MethodKind::Getter;
            } else if self.check_word("set") && self.modifier_applies() {
                self.advance();
                kind = MethodKind::Setter;
            }
        }

        (kind, is_async, is_generator)
    }

    /// A contextual word like `get` or `static` is a modifier only when a
    /// member name follows it; `{ get: 1 }` and `get() {}` use it as a name.
    pub(crate) fn modifier_applies(&self) -> bool {
        !matches!(
            self.peek_kind(1),
            None | Some(
                TokenKind::LParen
                    | TokenKind::Eq
                    | TokenKind::Semicolon
                    | TokenKind::RBrace
                    | TokenKind::Comma
                    | TokenKind::Colon
                    | TokenKind::Eof
            )
        )
    }

    /// `async function` with no line break in between.
    pub(crate) fn is_async_function(&self) -> bool {
        self.check_word("async")
            && self.peek_kind(1) == Some(TokenKind::Function)
            && !self.peek_newline(1)
    }

    pub(crate) fn parse_binary_operator(&mut self) -> ParseResult<BinaryOp> {
        let op = match self.current_token().kind {
            TokenKind::Plus => BinaryOp::Add,
            TokenKind::Minus => BinaryOp::Sub,
            TokenKind::Star => BinaryOp::Mul,
            TokenKind::Slash => BinaryOp::Div,
            TokenKind::Percent => BinaryOp::Mod,
            TokenKind::StarStar => BinaryOp::Pow,
            TokenKind::EqEq => BinaryOp::Eq,
            TokenKind::BangEq => BinaryOp::NotEq,
            TokenKind::EqEqEq => BinaryOp::StrictEq,
            TokenKind::BangEqEq => BinaryOp::StrictNotEq,
            TokenKind::Lt => BinaryOp::Lt,
            TokenKind::LtEq => BinaryOp::LtEq,
            TokenKind::Gt => BinaryOp::Gt,
            TokenKind::GtEq => BinaryOp::GtEq,
            TokenKind::AmpAmp => BinaryOp::And,
            TokenKind::PipePipe => BinaryOp::Or,
            TokenKind::QuestionQuestion => BinaryOp::NullishCoalesce,
            TokenKind::Amp => BinaryOp::BitAnd,
            TokenKind::Pipe => BinaryOp::BitOr,
            TokenKind::Caret => BinaryOp::BitXor,
            TokenKind::LtLt => BinaryOp::LeftShift,
            TokenKind::GtGt => BinaryOp::RightShift,
            TokenKind::GtGtGt => BinaryOp::UnsignedRightShift,
            TokenKind::In => BinaryOp::In,
            TokenKind::Instanceof => BinaryOp::InstanceOf,
            _ => return Err(self.error("Expected binary operator".to_string())),
        };
        self.advance();
        Ok(op)
    }

    pub(crate) fn parse_assignment_operator(&mut self) -> ParseResult<AssignmentOp> {
        let op = match self.current_token().kind {
            TokenKind::Eq => AssignmentOp::Assign,
            TokenKind::PlusEq => AssignmentOp::AddAssign,
            TokenKind::MinusEq => AssignmentOp::SubAssign,
            TokenKind::StarEq => AssignmentOp::MulAssign,
            TokenKind::SlashEq => AssignmentOp::DivAssign,
            TokenKind::PercentEq => AssignmentOp::ModAssign,
            TokenKind::StarStarEq => AssignmentOp::PowAssign,
            TokenKind::AmpAmpEq => AssignmentOp::AndAssign,
            TokenKind::PipePipeEq => AssignmentOp::OrAssign,
            TokenKind::QuestionQuestionEq => AssignmentOp::NullishAssign,
            TokenKind::LtLtEq => AssignmentOp::LeftShiftAssign,
            TokenKind::GtGtEq => AssignmentOp::RightShiftAssign,
            TokenKind::GtGtGtEq => AssignmentOp::UnsignedRightShiftAssign,
            TokenKind::AmpEq => AssignmentOp::BitAndAssign,
            TokenKind::PipeEq => AssignmentOp::BitOrAssign,
            TokenKind::CaretEq => AssignmentOp::BitXorAssign,
            _ => return Err(self.error("Expected assignment operator".to_string())),
        };
        self.advance();
        Ok(op)
    }

    // =========================================================================
    // Operator Precedence
    // =========================================================================

    pub(crate) fn get_infix_precedence(&self) -> u8 {
        let token = self.current_token();
        match token.kind {
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
            | TokenKind::CaretEq => 1,
            TokenKind::Question => 2,
            TokenKind::QuestionQuestion => 3,
            TokenKind::PipePipe => 4,
            TokenKind::AmpAmp => 5,
            TokenKind::Pipe => 6,
            TokenKind::Caret => 7,
            TokenKind::Amp => 8,
            TokenKind::EqEq | TokenKind::BangEq | TokenKind::EqEqEq | TokenKind::BangEqEq => 9,
            TokenKind::In if self.no_in => 0,
            TokenKind::Lt
            | TokenKind::Gt
            | TokenKind::LtEq
            | TokenKind::GtEq
            | TokenKind::In
            | TokenKind::Instanceof => 10,
            TokenKind::LtLt | TokenKind::GtGt | TokenKind::GtGtGt => 11,
            TokenKind::Plus | TokenKind::Minus => 12,
            TokenKind::Star | TokenKind::Slash | TokenKind::Percent => 13,
            TokenKind::StarStar => 14,
            // Restricted production: no postfix operator after a line break
            TokenKind::PlusPlus | TokenKind::MinusMinus if !token.newline_before => 16,
            TokenKind::Dot
            | TokenKind::QuestionDot
            | TokenKind::LBracket
            | TokenKind::LParen
            | TokenKind::NoSubstitutionTemplate
            | TokenKind::TemplateHead => 17,
            _ => 0,
        }
    }

    // =========================================================================
    // Utility Methods (Token Manipulation)
    // =========================================================================

    pub(crate) fn current_token(&self) -> &Token {
        &self.tokens[self.current.min(self.tokens.len() - 1)]
    }

    pub(crate) fn previous_token(&self) -> &Token {
        &self.tokens[(self.current.saturating_sub(1)).min(self.tokens.len() - 1)]
    }

    pub(crate) fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.current += 1;
        }
        self.previous_token()
    }

    pub(crate) fn check(&self, kind: &TokenKind) -> bool {
        !self.is_at_end() && &self.current_token().kind == kind
    }

    /// Current token is the identifier `word` (a contextual keyword).
    pub(crate) fn check_word(&self, word: &str) -> bool {
        let token = self.current_token();
        token.kind == TokenKind::Identifier && token.value == word
    }

    pub(crate) fn eat(&mut self, kind: TokenKind) -> bool {
        if self.check(&kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    pub(crate) fn eat_word(&mut self, word: &str) -> bool {
        if self.check_word(word) {
            self.advance();
            true
        } else {
            false
        }
    }

    pub(crate) fn expect_word(&mut self, word: &str) -> ParseResult<()> {
        if self.eat_word(word) {
            Ok(())
        } else {
            Err(self.error(format!(
                "Expected '{}', found {:?}",
                word,
                self.current_token().kind
            )))
        }
    }

    pub(crate) fn peek_kind(&self, offset: usize) -> Option<TokenKind> {
        self.tokens.get(self.current + offset).map(|t| t.kind)
    }

    /// Whether a line break precedes the token `offset` places ahead.
    pub(crate) fn peek_newline(&self, offset: usize) -> bool {
        self.tokens
            .get(self.current + offset)
            .map_or(false, |t| t.newline_before)
    }

    pub(crate) fn is_at_end(&self) -> bool {
        self.current >= self.tokens.len() || self.current_token().kind == TokenKind::Eof
    }

    pub(crate) fn consume(&mut self, kind: TokenKind) -> ParseResult<&Token> {
        if self.check(&kind) {
            Ok(self.advance())
        } else {
            Err(self.error(format!("Expected {:?}, found {:?}", kind, self.current_token().kind)))
        }
    }

    pub(crate) fn consume_semicolon(&mut self) {
        if self.check(&TokenKind::Semicolon) {
            self.advance();
        }
    }

    /// Runs `f` with `in` parsed as an operator again, restoring the
    /// previous setting afterwards.
    pub(crate) fn with_in<T>(&mut self, f: impl FnOnce(&mut Self) -> ParseResult<T>) -> ParseResult<T> {
        let saved = std::mem::replace(&mut self.no_in, false);
        let result = f(self);
        self.no_in = saved;
        result
    }

    pub(crate) fn error(&self, message: String) -> ParseError {
        let token = self.current_token();
        // Lexer errors carry their own message
        let message = if token.kind == TokenKind::Error {
            token.value.clone()
        } else {
            message
        };
        ParseError {
            message,
            span: token.span,
        }
    }

    pub(crate) fn synchronize(&mut self) {
        self.advance();

        while !self.is_at_end() {
            if self.previous_token().kind == TokenKind::Semicolon {
                return;
            }

            match self.current_token().kind {
                TokenKind::Class
                | TokenKind::Function
                | TokenKind::Let
                | TokenKind::Const
                | TokenKind::Var
                | TokenKind::For
                | TokenKind::If
                | TokenKind::While
                | TokenKind::Return
                | TokenKind::Import
                | TokenKind::Export => return,
                _ => {}
            }

            self.advance();
        }
    }
}

/// Numeric value of a number token's text (`0x1f`, `1e3`, `.5`, ...).
pub(crate) fn parse_number(text: &str) -> f64 {
    let radix = match text.get(..2) {
        Some("0x") => 16,
        Some("0o") => 8,
        Some("0b") => 2,
        _ => return text.parse::<f64>().unwrap_or(f64::NAN),
    };
    text[2..]
        .chars()
        .filter_map(|c| c.to_digit(radix))
        .fold(0.0, |acc, digit| acc * radix as f64 + digit as f64)
}
