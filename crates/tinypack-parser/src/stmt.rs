//! Statement parsing

use super::*;

impl Parser {
    pub(crate) fn parse_statement(&mut self) -> ParseResult<Node<Stmt>> {
        let start = self.current_token().span;

        let stmt = match self.current_token().kind {
            TokenKind::LBrace => Stmt::Block(self.parse_block_statement()?.value),
            TokenKind::If => self.parse_if_statement()?,
            TokenKind::For => self.parse_for_statement()?,
            TokenKind::While => self.parse_while_statement()?,
            TokenKind::Do => self.parse_do_while_statement()?,
            TokenKind::Switch => self.parse_switch_statement()?,
            TokenKind::Return => self.parse_return_statement()?,
            TokenKind::Break => Stmt::Break(self.parse_jump_label(TokenKind::Break)?),
            TokenKind::Continue => Stmt::Continue(self.parse_jump_label(TokenKind::Continue)?),
            TokenKind::Throw => self.parse_throw_statement()?,
            TokenKind::Try => self.parse_try_statement()?,
            TokenKind::Debugger => {
                self.advance();
                self.consume_semicolon();
                Stmt::Debugger
            }
            TokenKind::Semicolon => {
                self.advance();
                Stmt::Empty
            }
            TokenKind::Const | TokenKind::Let | TokenKind::Var => {
                let var_decl = self.parse_var_declaration()?;
                Stmt::Decl(Decl::Var(var_decl))
            }
            TokenKind::Function => Stmt::Decl(Decl::Function(self.parse_function(false)?)),
            TokenKind::Identifier if self.is_async_function() => {
                Stmt::Decl(Decl::Function(self.parse_function(false)?))
            }
            TokenKind::Class => Stmt::Decl(Decl::Class(self.parse_class(false)?)),
            TokenKind::Export => {
                return Err(self.error("export declarations may only appear at the top level of a module".to_string()))
            }
            TokenKind::Import
                if !matches!(self.peek_kind(1), Some(TokenKind::LParen | TokenKind::Dot)) =>
            {
                return Err(self.error("import declarations may only appear at the top level of a module".to_string()))
            }
            TokenKind::With => {
                return Err(self.error("with statements are not supported".to_string()))
            }
            _ => {
                // Check for labeled statement
                if self.check(&TokenKind::Identifier) && self.peek_kind(1) == Some(TokenKind::Colon) {
                    let label = self.parse_identifier()?;
                    self.consume(TokenKind::Colon)?;
                    let stmt = Box::new(self.parse_statement()?);
                    Stmt::Labeled { label, stmt }
                } else {
                    let expr = self.parse_expression()?;
                    self.consume_semicolon();
                    Stmt::Expr(expr)
                }
            }
        };

        let span = start.merge(&self.previous_token().span);
        Ok(Node::new(stmt, span))
    }

    pub(crate) fn parse_block_statement(&mut self) -> ParseResult<Node<BlockStmt>> {
        let start = self.current_token().span;
        self.consume(TokenKind::LBrace)?;

        let mut stmts = Vec::new();

        while !self.check(&TokenKind::RBrace) && !self.is_at_end() {
            stmts.push(self.parse_statement()?);
        }

        self.consume(TokenKind::RBrace)?;
        let span = start.merge(&self.previous_token().span);

        Ok(Node::new(BlockStmt { stmts }, span))
    }

    pub(crate) fn parse_var_declaration(&mut self) -> ParseResult<VarDecl> {
        let var_decl = self.parse_var_declaration_without_semicolon()?;
        self.consume_semicolon();
        Ok(var_decl)
    }

    pub(crate) fn parse_var_declaration_without_semicolon(&mut self) -> ParseResult<VarDecl> {
        let kind = match self.current_token().kind {
            TokenKind::Const => VarDeclKind::Const,
            TokenKind::Let => VarDeclKind::Let,
            TokenKind::Var => VarDeclKind::Var,
            _ => return Err(self.error("Expected var, let, or const".to_string())),
        };
        self.advance();

        let mut declarations = Vec::new();

        loop {
            let pattern = self.parse_pattern()?;
            let init = if self.eat(TokenKind::Eq) {
                Some(self.parse_assignment()?)
            } else {
                None
            };

            declarations.push(VarDeclarator { pattern, init });

            if !self.eat(TokenKind::Comma) {
                break;
            }
        }

        Ok(VarDecl { kind, declarations })
    }

    fn parse_if_statement(&mut self) -> ParseResult<Stmt> {
        self.consume(TokenKind::If)?;
        let condition = self.parse_condition()?;

        let then_stmt = Box::new(self.parse_statement()?);

        let else_stmt = if self.eat(TokenKind::Else) {
            Some(Box::new(self.parse_statement()?))
        } else {
            None
        };

        Ok(Stmt::If {
            condition,
            then_stmt,
            else_stmt,
        })
    }

    /// `( expression )` after `if`, `while` and `switch`.
    fn parse_condition(&mut self) -> ParseResult<Node<Expr>> {
        self.consume(TokenKind::LParen)?;
        let condition = self.with_in(|p| p.parse_expression())?;
        self.consume(TokenKind::RParen)?;
        Ok(condition)
    }

    fn parse_for_statement(&mut self) -> ParseResult<Stmt> {
        self.consume(TokenKind::For)?;

        let is_await = self.eat(TokenKind::Await);

        self.consume(TokenKind::LParen)?;

        // The head is parsed with `in` disabled so `for (x in o)` is not a
        // binary expression.
        let saved_no_in = std::mem::replace(&mut self.no_in, true);
        let init = self.parse_for_init();
        self.no_in = saved_no_in;
        let init = init?;

        // for-in / for-of
        let is_in = self.check(&TokenKind::In);
        if is_in || self.check_word("of") {
            let left = match init {
                Some(ForInit::VarDecl(var_decl)) => ForInLeft::VarDecl(var_decl),
                Some(ForInit::Expr(expr)) => ForInLeft::Pattern(self.expr_to_pattern(expr)?),
                None => return Err(self.error("Expected loop variable".to_string())),
            };
            self.advance();

            let right = if is_in {
                self.with_in(|p| p.parse_expression())?
            } else {
                self.with_in(|p| p.parse_assignment())?
            };
            self.consume(TokenKind::RParen)?;
            let body = Box::new(self.parse_statement()?);

            return Ok(if is_in {
                Stmt::ForIn { left, right, body }
            } else {
                Stmt::ForOf {
                    left,
                    right,
                    body,
                    is_await,
                }
            });
        }

        // Regular for loop
        self.consume(TokenKind::Semicolon)?;

        let condition = if self.check(&TokenKind::Semicolon) {
            None
        } else {
            Some(self.with_in(|p| p.parse_expression())?)
        };

        self.consume(TokenKind::Semicolon)?;

        let update = if self.check(&TokenKind::RParen) {
            None
        } else {
            Some(self.with_in(|p| p.parse_expression())?)
        };

        self.consume(TokenKind::RParen)?;
        let body = Box::new(self.parse_statement()?);

        Ok(Stmt::For {
            init,
            condition,
            update,
            body,
        })
    }

    fn parse_for_init(&mut self) -> ParseResult<Option<ForInit>> {
        if self.check(&TokenKind::Semicolon) {
            return Ok(None);
        }
        if matches!(
            self.current_token().kind,
            TokenKind::Const | TokenKind::Let | TokenKind::Var
        ) {
            return Ok(Some(ForInit::VarDecl(
                self.parse_var_declaration_without_semicolon()?,
            )));
        }
        Ok(Some(ForInit::Expr(self.parse_expression()?)))
    }

    fn parse_while_statement(&mut self) -> ParseResult<Stmt> {
        self.consume(TokenKind::While)?;
        let condition = self.parse_condition()?;
        let body = Box::new(self.parse_statement()?);

        Ok(Stmt::While { condition, body })
    }

    fn parse_do_while_statement(&mut self) -> ParseResult<Stmt> {
        self.consume(TokenKind::Do)?;
        let body = Box::new(self.parse_statement()?);
        self.consume(TokenKind::While)?;
        let condition = self.parse_condition()?;
        self.consume_semicolon();

        Ok(Stmt::DoWhile { body, condition })
    }

    fn parse_switch_statement(&mut self) -> ParseResult<Stmt> {
        self.consume(TokenKind::Switch)?;
        let discriminant = self.parse_condition()?;

        self.consume(TokenKind::LBrace)?;
        let mut cases = Vec::new();

        while !self.check(&TokenKind::RBrace) && !self.is_at_end() {
            let test = if self.eat(TokenKind::Case) {
                Some(self.parse_expression()?)
            } else if self.eat(TokenKind::Default) {
                None
            } else {
                return Err(self.error("Expected case or default in switch statement".to_string()));
            };
            self.consume(TokenKind::Colon)?;

            let mut consequent = Vec::new();
            while !self.check(&TokenKind::Case)
                && !self.check(&TokenKind::Default)
                && !self.check(&TokenKind::RBrace)
                && !self.is_at_end()
            {
                consequent.push(self.parse_statement()?);
            }

            cases.push(SwitchCase { test, consequent });
        }

        self.consume(TokenKind::RBrace)?;

        Ok(Stmt::Switch {
            discriminant,
            cases,
        })
    }

    fn parse_return_statement(&mut self) -> ParseResult<Stmt> {
        self.consume(TokenKind::Return)?;

        // A line break after `return` ends the statement
        let expr = if self.check(&TokenKind::Semicolon)
            || self.check(&TokenKind::RBrace)
            || self.is_at_end()
            || self.current_token().newline_before
        {
            None
        } else {
            Some(self.parse_expression()?)
        };

        self.consume_semicolon();
        Ok(Stmt::Return(expr))
    }

    fn parse_jump_label(&mut self, keyword: TokenKind) -> ParseResult<Option<Node<Ident>>> {
        self.consume(keyword)?;

        let label = if self.check(&TokenKind::Identifier) && !self.current_token().newline_before {
            Some(self.parse_identifier()?)
        } else {
            None
        };

        self.consume_semicolon();
        Ok(label)
    }

    fn parse_throw_statement(&mut self) -> ParseResult<Stmt> {
        self.consume(TokenKind::Throw)?;
        if self.current_token().newline_before {
            return Err(self.error("Illegal newline after throw".to_string()));
        }
        let expr = self.parse_expression()?;
        self.consume_semicolon();
        Ok(Stmt::Throw(expr))
    }

    fn parse_try_statement(&mut self) -> ParseResult<Stmt> {
        self.consume(TokenKind::Try)?;
        let block = self.parse_block_statement()?;

        let catch = if self.eat(TokenKind::Catch) {
            let param = if self.eat(TokenKind::LParen) {
                let p = Some(self.parse_pattern()?);
                self.consume(TokenKind::RParen)?;
                p
            } else {
                None
            };

            let body = self.parse_block_statement()?;

            Some(CatchClause { param, body })
        } else {
            None
        };

        let finally = if self.eat(TokenKind::Finally) {
            Some(self.parse_block_statement()?)
        } else {
            None
        };

        if catch.is_none() && finally.is_none() {
            return Err(self.error("Try statement must have catch or finally clause".to_string()));
        }

        Ok(Stmt::Try {
            block,
            catch,
            finally,
        })
    }
}
