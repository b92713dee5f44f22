//! Pattern parsing

use super::*;

impl Parser {
    pub(crate) fn parse_pattern(&mut self) -> ParseResult<Node<Pattern>> {
        let start = self.current_token().span;

        let pattern = match self.current_token().kind {
            TokenKind::LBracket => self.parse_array_pattern()?,
            TokenKind::LBrace => self.parse_object_pattern()?,
            TokenKind::Identifier => Pattern::Ident(self.parse_identifier()?),
            _ => {
                return Err(self.error(format!(
                    "Expected pattern, found {:?}",
                    self.current_token().kind
                )))
            }
        };

        Ok(Node::new(pattern, start.merge(&self.previous_token().span)))
    }

    /// Parse a pattern that may have a default value (used in destructuring contexts)
    pub(crate) fn parse_pattern_with_default(&mut self) -> ParseResult<Node<Pattern>> {
        let mut result = self.parse_pattern()?;

        // Assignment pattern (default value in destructuring)
        if self.eat(TokenKind::Eq) {
            let default = Box::new(self.parse_assignment()?);
            let span = result.span.merge(&default.span);
            result = Node::new(
                Pattern::Assignment {
                    pattern: Box::new(result),
                    default,
                },
                span,
            );
        }

        Ok(result)
    }

    pub(crate) fn parse_array_pattern(&mut self) -> ParseResult<Pattern> {
        self.consume(TokenKind::LBracket)?;
        let mut elements = Vec::new();
        let mut rest = None;

        while !self.check(&TokenKind::RBracket) && !self.is_at_end() {
            if self.eat(TokenKind::DotDotDot) {
                rest = Some(Box::new(self.parse_pattern()?));
                break;
            } else if self.eat(TokenKind::Comma) {
                elements.push(None);
            } else {
                elements.push(Some(self.parse_pattern_with_default()?));
                if !self.check(&TokenKind::RBracket) {
                    self.consume(TokenKind::Comma)?;
                }
            }
        }

        self.consume(TokenKind::RBracket)?;

        Ok(Pattern::Array { elements, rest })
    }

    pub(crate) fn parse_object_pattern(&mut self) -> ParseResult<Pattern> {
        self.consume(TokenKind::LBrace)?;
        let mut properties = Vec::new();
        let mut rest = None;

        while !self.check(&TokenKind::RBrace) && !self.is_at_end() {
            if self.eat(TokenKind::DotDotDot) {
                rest = Some(Box::new(self.parse_pattern()?));
                break;
            }

            let key = self.parse_property_name()?;

            let (value, shorthand) = if self.eat(TokenKind::Colon) {
                (self.parse_pattern_with_default()?, false)
            } else {
                // Shorthand, optionally with a default: `{ a = 1 }`
                let ident = match &key {
                    PropertyName::Ident(ident) if !ident.value.name.starts_with('#') => ident.clone(),
                    _ => return Err(self.error("Invalid object pattern shorthand".to_string())),
                };
                let span = ident.span;
                let mut value = Node::new(Pattern::Ident(ident), span);
                if self.eat(TokenKind::Eq) {
                    let default = Box::new(self.parse_assignment()?);
                    let span = span.merge(&default.span);
                    value = Node::new(
                        Pattern::Assignment {
                            pattern: Box::new(value),
                            default,
                        },
                        span,
                    );
                }
                (value, true)
            };

            properties.push(ObjectPatternProperty {
                key,
                value,
                shorthand,
            });

            if !self.check(&TokenKind::RBrace) {
                self.consume(TokenKind::Comma)?;
            }
        }

        self.consume(TokenKind::RBrace)?;

        Ok(Pattern::Object { properties, rest })
    }

    /// Reinterprets an already parsed expression as an assignment target,
    /// as on the left of `for (... of xs)`.
    pub(crate) fn expr_to_pattern(&self, expr: Node<Expr>) -> ParseResult<Node<Pattern>> {
        let span = expr.span;
        let pattern = match expr.value {
            Expr::Ident(ident) => Pattern::Ident(Node::new(ident, span)),
            Expr::Paren(inner) => return self.expr_to_pattern(*inner),
            Expr::Member { .. } | Expr::Index { .. } => Pattern::Expr(Box::new(expr)),
            Expr::Assignment {
                target,
                op: AssignmentOp::Assign,
                value,
            } => Pattern::Assignment {
                pattern: Box::new(self.expr_to_pattern(*target)?),
                default: value,
            },
            Expr::Array(elements) => {
                let mut patterns = Vec::new();
                let mut rest = None;
                for element in elements {
                    match element {
                        Some(Node {
                            value: Expr::Spread(inner),
                            ..
                        }) => rest = Some(Box::new(self.expr_to_pattern(*inner)?)),
                        Some(element) => patterns.push(Some(self.expr_to_pattern(element)?)),
                        None => patterns.push(None),
                    }
                }
                Pattern::Array {
                    elements: patterns,
                    rest,
                }
            }
            Expr::Object(members) => {
                let mut properties = Vec::new();
                let mut rest = None;
                for member in members {
                    match member {
                        ObjectProperty::Property {
                            key,
                            value,
                            shorthand,
                        } => properties.push(ObjectPatternProperty {
                            key,
                            value: self.expr_to_pattern(value)?,
                            shorthand,
                        }),
                        ObjectProperty::Spread(inner) => {
                            rest = Some(Box::new(self.expr_to_pattern(inner)?))
                        }
                        ObjectProperty::Method { .. } => {
                            return Err(ParseError {
                                message: "Invalid destructuring target".to_string(),
                                span,
                            })
                        }
                    }
                }
                Pattern::Object { properties, rest }
            }
            _ => {
                return Err(ParseError {
                    message: "Invalid assignment target".to_string(),
                    span,
                })
            }
        };

        Ok(Node::new(pattern, span))
    }
}
