use tinypack_ast::Span;
use crate::token::{Token, TokenKind};

/// The lexer/tokenizer for JavaScript modules.
pub struct Lexer<'a> {
    source: &'a str,
    chars: std::str::CharIndices<'a>,
    current_pos: usize,
    current_char: Option<char>,
    /// Set when whitespace or comments skipped before the token in progress
    /// contained a line terminator.
    newline_before: bool,
    /// Kind of the last token produced; decides `/` versus regex.
    prev_kind: Option<TokenKind>,
    /// One entry per open `{`: `true` when it was opened by `${` in a template.
    braces: Vec<bool>,
}

impl<'a> Lexer<'a> {
    /// Creates a new lexer from source code. A leading `#!` line is skipped.
    pub fn new(source: &'a str) -> Self {
        let mut chars = source.char_indices();
        let current_char = chars.next().map(|(_, c)| c);
        let mut lexer = Self {
            source,
            chars,
            current_pos: 0,
            current_char,
            newline_before: false,
            prev_kind: None,
            braces: Vec::new(),
        };
        if source.starts_with("#!") {
            while let Some(ch) = lexer.current_char {
                if ch == '\n' {
                    break;
                }
                lexer.advance();
            }
        }
        lexer
    }

    /// Tokenizes the entire source code and returns all tokens.
    pub fn tokenize(&mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token();
            let is_eof = token.kind == TokenKind::Eof;
            tokens.push(token);
            if is_eof {
                break;
            }
        }
        tokens
    }

    /// Gets the next token from the source.
    pub fn next_token(&mut self) -> Token {
        self.newline_before = false;
        let token = match self.skip_whitespace_and_comments() {
            Some(error_token) => error_token,
            None => self.read_token(),
        };
        self.prev_kind = Some(token.kind);
        token
    }

    fn read_token(&mut self) -> Token {
        let start = self.current_pos;

        let ch = match self.current_char {
            None => return self.make(TokenKind::Eof, start, String::new()),
            Some(ch) => ch,
        };

        match ch {
            // String literals
            '"' | '\'' => self.read_string_literal(ch),
            '`' => {
                self.advance();
                self.read_template_chunk(start, true)
            }

            // Numbers
            '0'..='9' => self.read_number(),

            // Identifiers and keywords
            'a'..='z' | 'A'..='Z' | '_' | '$' | '\\' => self.read_identifier_or_keyword(),
            '#' => self.read_private_name(),

            // Operators
            '+' => self.read_plus(),
            '-' => self.read_minus(),
            '*' => self.read_star(),
            '/' => self.read_slash_or_regex(),
            '%' => self.read_with_eq(start, TokenKind::Percent, TokenKind::PercentEq),
            '^' => self.read_with_eq(start, TokenKind::Caret, TokenKind::CaretEq),
            '=' => self.read_eq(),
            '!' => self.read_bang(),
            '<' => self.read_lt(),
            '>' => self.read_gt(),
            '&' => self.read_doubled(start, '&', [TokenKind::Amp, TokenKind::AmpEq, TokenKind::AmpAmp, TokenKind::AmpAmpEq]),
            '|' => self.read_doubled(start, '|', [TokenKind::Pipe, TokenKind::PipeEq, TokenKind::PipePipe, TokenKind::PipePipeEq]),
            '?' => self.read_question(),
            '.' => self.read_dot(),
            '~' => self.single(start, TokenKind::Tilde),

            // Delimiters
            '{' => {
                self.braces.push(false);
                self.single(start, TokenKind::LBrace)
            }
            '}' => {
                if self.braces.pop() == Some(true) {
                    self.advance();
                    self.read_template_chunk(start, false)
                } else {
                    self.single(start, TokenKind::RBrace)
                }
            }
            '(' => self.single(start, TokenKind::LParen),
            ')' => self.single(start, TokenKind::RParen),
            '[' => self.single(start, TokenKind::LBracket),
            ']' => self.single(start, TokenKind::RBracket),
            ';' => self.single(start, TokenKind::Semicolon),
            ',' => self.single(start, TokenKind::Comma),
            ':' => self.single(start, TokenKind::Colon),

            // Unicode identifiers
            _ if ch.is_alphabetic() => self.read_identifier_or_keyword(),

            // Error
            _ => {
                self.advance();
                self.make(TokenKind::Error, start, format!("Unexpected character: {}", ch))
            }
        }
    }

    // Helper methods

    fn make(&self, kind: TokenKind, start: usize, value: impl Into<String>) -> Token {
        Token::new(
            kind,
            Span::new(start, self.current_pos),
            value.into(),
            self.newline_before,
        )
    }

    /// Consumes one character and produces a token whose value is that text.
    fn single(&mut self, start: usize, kind: TokenKind) -> Token {
        self.advance();
        self.make(kind, start, &self.source[start..self.current_pos])
    }

    /// Produces a token covering `start..current_pos` with its source text.
    fn punct(&self, start: usize, kind: TokenKind) -> Token {
        self.make(kind, start, &self.source[start..self.current_pos])
    }

    fn advance(&mut self) {
        if let Some((pos, ch)) = self.chars.next() {
            self.current_pos = pos;
            self.current_char = Some(ch);
        } else {
            self.current_pos = self.source.len();
            self.current_char = None;
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.clone().next().map(|(_, c)| c)
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.current_char == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn skip_whitespace_and_comments(&mut self) -> Option<Token> {
        loop {
            match self.current_char {
                Some(ch) if is_line_terminator(ch) => {
                    self.newline_before = true;
                    self.advance();
                }
                Some(ch) if ch.is_whitespace() || ch == '\u{FEFF}' => {
                    self.advance();
                }
                Some('/') => {
                    if self.peek() == Some('/') {
                        // Single-line comment
                        self.skip_single_line_comment();
                    } else if self.peek() == Some('*') {
                        // Multi-line comment
                        let start = self.current_pos;
                        if !self.skip_multi_line_comment() {
                            return Some(self.make(
                                TokenKind::Error,
                                start,
                                "Unterminated multi-line comment",
                            ));
                        }
                    } else {
                        break;
                    }
                }
                _ => break,
            }
        }
        None
    }

    fn skip_single_line_comment(&mut self) {
        // Skip //
        self.advance();
        self.advance();

        while let Some(ch) = self.current_char {
            if is_line_terminator(ch) {
                break;
            }
            self.advance();
        }
    }

    fn skip_multi_line_comment(&mut self) -> bool {
        // Skip /*
        self.advance();
        self.advance();

        while let Some(ch) = self.current_char {
            if ch == '*' && self.peek() == Some('/') {
                self.advance(); // *
                self.advance(); // /
                return true;
            }
            if is_line_terminator(ch) {
                self.newline_before = true;
            }
            self.advance();
        }
        false // Unterminated
    }

    fn read_string_literal(&mut self, quote: char) -> Token {
        let start = self.current_pos;
        self.advance(); // Skip opening quote

        let mut value = String::new();

        while let Some(ch) = self.current_char {
            if ch == quote {
                self.advance(); // Skip closing quote
                return self.make(TokenKind::StringLiteral, start, value);
            } else if ch == '\\' {
                self.advance();
                self.read_escape(&mut value);
            } else if ch == '\n' || ch == '\r' {
                break;
            } else {
                value.push(ch);
                self.advance();
            }
        }

        self.make(TokenKind::Error, start, "Unterminated string literal")
    }

    /// Reads the escape sequence after a backslash into `value`.
    fn read_escape(&mut self, value: &mut String) {
        let Some(escaped) = self.current_char else {
            return;
        };
        self.advance();
        match escaped {
            'n' => value.push('\n'),
            'r' => value.push('\r'),
            't' => value.push('\t'),
            'b' => value.push('\u{8}'),
            'f' => value.push('\u{c}'),
            'v' => value.push('\u{b}'),
            '0' if !self.current_char.map_or(false, |c| c.is_ascii_digit()) => value.push('\0'),
            'u' => value.push(self.read_unicode_escape()),
            'x' => value.push(self.read_hex_digits(2)),
            // Line continuation
            '\r' => {
                self.eat('\n');
            }
            '\n' | '\u{2028}' | '\u{2029}' => {}
            other => value.push(other),
        }
    }

    fn read_unicode_escape(&mut self) -> char {
        if self.eat('{') {
            let mut code = 0u32;
            while let Some(digit) = self.current_char.and_then(|c| c.to_digit(16)) {
                code = code.saturating_mul(16).saturating_add(digit);
                self.advance();
            }
            self.eat('}');
            return char::from_u32(code).unwrap_or('\u{FFFD}');
        }
        self.read_hex_digits(4)
    }

    fn read_hex_digits(&mut self, count: usize) -> char {
        let mut code = 0u32;
        for _ in 0..count {
            match self.current_char.and_then(|c| c.to_digit(16)) {
                Some(digit) => {
                    code = code * 16 + digit;
                    self.advance();
                }
                None => break,
            }
        }
        char::from_u32(code).unwrap_or('\u{FFFD}')
    }

    /// Reads template text up to the closing backtick or the next `${`.
    /// The opening backtick or `}` has already been consumed.
    fn read_template_chunk(&mut self, start: usize, opened_by_backtick: bool) -> Token {
        let mut value = String::new();

        while let Some(ch) = self.current_char {
            if ch == '`' {
                self.advance();
                let kind = if opened_by_backtick {
                    TokenKind::NoSubstitutionTemplate
                } else {
                    TokenKind::TemplateTail
                };
                return self.make(kind, start, value);
            } else if ch == '$' && self.peek() == Some('{') {
                self.advance();
                self.advance();
                self.braces.push(true);
                let kind = if opened_by_backtick {
                    TokenKind::TemplateHead
                } else {
                    TokenKind::TemplateMiddle
                };
                return self.make(kind, start, value);
            } else if ch == '\\' {
                self.advance();
                self.read_escape(&mut value);
            } else {
                value.push(ch);
                self.advance();
            }
        }

        self.make(TokenKind::Error, start, "Unterminated template literal")
    }

    fn read_digits(&mut self, value: &mut String, accept: impl Fn(char) -> bool) {
        while let Some(ch) = self.current_char {
            if accept(ch) || ch == '_' {
                if ch != '_' {
                    value.push(ch);
                }
                self.advance();
            } else {
                break;
            }
        }
    }

    fn read_exponent(&mut self, value: &mut String) {
        if let Some(marker @ ('e' | 'E')) = self.current_char {
            let sign_then_digit = matches!(self.peek(), Some('+' | '-'))
                && self.chars.clone().nth(1).map_or(false, |(_, c)| c.is_ascii_digit());
            if !(sign_then_digit || self.peek().map_or(false, |c| c.is_ascii_digit())) {
                return;
            }
            value.push(marker);
            self.advance();
            if let Some(sign @ ('+' | '-')) = self.current_char {
                value.push(sign);
                self.advance();
            }
            self.read_digits(value, |c| c.is_ascii_digit());
        }
    }

    fn read_number(&mut self) -> Token {
        let start = self.current_pos;

        // Check for special number formats
        if self.current_char == Some('0') {
            let radix = match self.peek() {
                Some('x' | 'X') => Some(16),
                Some('o' | 'O') => Some(8),
                Some('b' | 'B') => Some(2),
                _ => None,
            };
            if let Some(radix) = radix {
                return self.read_radix_number(start, radix);
            }
        }

        let mut value = String::new();

        // Integer part
        self.read_digits(&mut value, |c| c.is_ascii_digit());

        // Check for BigInt suffix
        if self.eat('n') {
            return self.make(TokenKind::BigIntLiteral, start, value);
        }

        // Fraction; `1.` alone is a complete number
        if self.current_char == Some('.') {
            value.push('.');
            self.advance();
            self.read_digits(&mut value, |c| c.is_ascii_digit());
        }

        self.read_exponent(&mut value);

        self.make(TokenKind::NumberLiteral, start, value)
    }

    fn read_radix_number(&mut self, start: usize, radix: u32) -> Token {
        self.advance(); // 0
        let marker = self.current_char.unwrap_or('x').to_ascii_lowercase();
        self.advance(); // x, o, b

        let mut value = format!("0{}", marker);
        self.read_digits(&mut value, |c| c.is_digit(radix));

        if self.eat('n') {
            return self.make(TokenKind::BigIntLiteral, start, value);
        }
        self.make(TokenKind::NumberLiteral, start, value)
    }

    fn read_identifier_name(&mut self) -> String {
        let mut value = String::new();

        while let Some(ch) = self.current_char {
            if ch.is_alphanumeric() || ch == '_' || ch == '$' || ch == '\u{200C}' || ch == '\u{200D}' {
                value.push(ch);
                self.advance();
            } else if ch == '\\' && self.peek() == Some('u') {
                self.advance();
                self.advance();
                value.push(self.read_unicode_escape());
            } else {
                break;
            }
        }

        value
    }

    fn read_identifier_or_keyword(&mut self) -> Token {
        let start = self.current_pos;
        let value = self.read_identifier_name();

        if value.is_empty() {
            self.advance();
            return self.make(TokenKind::Error, start, "Unexpected character: \\");
        }

        // An escaped keyword is an identifier
        let escaped = self.source[start..self.current_pos].contains('\\');
        let kind = match TokenKind::keyword(&value) {
            Some(kind) if !escaped => kind,
            _ => TokenKind::Identifier,
        };

        self.make(kind, start, value)
    }

    fn read_private_name(&mut self) -> Token {
        let start = self.current_pos;
        self.advance(); // #
        let name = self.read_identifier_name();
        if name.is_empty() {
            return self.make(TokenKind::Error, start, "Unexpected character: #");
        }
        self.make(TokenKind::PrivateName, start, format!("#{}", name))
    }

    /// `op` or `op=`.
    fn read_with_eq(&mut self, start: usize, plain: TokenKind, assign: TokenKind) -> Token {
        self.advance();
        let kind = if self.eat('=') { assign } else { plain };
        self.punct(start, kind)
    }

    /// `c`, `c=`, `cc`, `cc=` in that order in `kinds`.
    fn read_doubled(&mut self, start: usize, c: char, kinds: [TokenKind; 4]) -> Token {
        self.advance();
        let kind = if self.eat(c) {
            if self.eat('=') { kinds[3] } else { kinds[2] }
        } else if self.eat('=') {
            kinds[1]
        } else {
            kinds[0]
        };
        self.punct(start, kind)
    }

    fn read_plus(&mut self) -> Token {
        let start = self.current_pos;
        self.advance();

        let kind = match self.current_char {
            Some('+') => {
                self.advance();
                TokenKind::PlusPlus
            }
            Some('=') => {
                self.advance();
                TokenKind::PlusEq
            }
            _ => TokenKind::Plus,
        };
        self.punct(start, kind)
    }

    fn read_minus(&mut self) -> Token {
        let start = self.current_pos;
        self.advance();

        let kind = match self.current_char {
            Some('-') => {
                self.advance();
                TokenKind::MinusMinus
            }
            Some('=') => {
                self.advance();
                TokenKind::MinusEq
            }
            _ => TokenKind::Minus,
        };
        self.punct(start, kind)
    }

    fn read_star(&mut self) -> Token {
        let start = self.current_pos;
        self.read_doubled(start, '*', [TokenKind::Star, TokenKind::StarEq, TokenKind::StarStar, TokenKind::StarStarEq])
    }

    fn read_slash_or_regex(&mut self) -> Token {
        let start = self.current_pos;
        let regex_allowed = !self.prev_kind.map_or(false, |kind| kind.ends_expression());
        if regex_allowed {
            return self.read_regex(start);
        }
        self.read_with_eq(start, TokenKind::Slash, TokenKind::SlashEq)
    }

    fn read_regex(&mut self, start: usize) -> Token {
        self.advance(); // /
        let mut in_class = false;

        loop {
            match self.current_char {
                None => break,
                Some(ch) if is_line_terminator(ch) => break,
                Some('\\') => {
                    self.advance();
                    if self.current_char.map_or(false, |c| !is_line_terminator(c)) {
                        self.advance();
                    }
                }
                Some('[') => {
                    in_class = true;
                    self.advance();
                }
                Some(']') => {
                    in_class = false;
                    self.advance();
                }
                Some('/') if !in_class => {
                    self.advance();
                    // Flags
                    while self.current_char.map_or(false, |c| c.is_alphanumeric()) {
                        self.advance();
                    }
                    return self.punct(start, TokenKind::RegexLiteral);
                }
                Some(_) => self.advance(),
            }
        }

        self.make(TokenKind::Error, start, "Unterminated regular expression")
    }

    fn read_eq(&mut self) -> Token {
        let start = self.current_pos;
        self.advance();

        let kind = match self.current_char {
            Some('=') => {
                self.advance();
                if self.eat('=') { TokenKind::EqEqEq } else { TokenKind::EqEq }
            }
            Some('>') => {
                self.advance();
                TokenKind::FatArrow
            }
            _ => TokenKind::Eq,
        };
        self.punct(start, kind)
    }

    fn read_bang(&mut self) -> Token {
        let start = self.current_pos;
        self.advance();

        let kind = if self.eat('=') {
            if self.eat('=') { TokenKind::BangEqEq } else { TokenKind::BangEq }
        } else {
            TokenKind::Bang
        };
        self.punct(start, kind)
    }

    fn read_lt(&mut self) -> Token {
        let start = self.current_pos;
        self.read_doubled(start, '<', [TokenKind::Lt, TokenKind::LtEq, TokenKind::LtLt, TokenKind::LtLtEq])
    }

    fn read_gt(&mut self) -> Token {
        let start = self.current_pos;
        self.advance();

        let kind = match self.current_char {
            Some('>') => {
                self.advance();
                match self.current_char {
                    Some('>') => {
                        self.advance();
                        if self.eat('=') { TokenKind::GtGtGtEq } else { TokenKind::GtGtGt }
                    }
                    Some('=') => {
                        self.advance();
                        TokenKind::GtGtEq
                    }
                    _ => TokenKind::GtGt,
                }
            }
            Some('=') => {
                self.advance();
                TokenKind::GtEq
            }
            _ => TokenKind::Gt,
        };
        self.punct(start, kind)
    }

    fn read_question(&mut self) -> Token {
        let start = self.current_pos;
        self.advance();

        let kind = match self.current_char {
            Some('?') => {
                self.advance();
                if self.eat('=') { TokenKind::QuestionQuestionEq } else { TokenKind::QuestionQuestion }
            }
            // `a?.5:b` is a conditional, not optional chaining
            Some('.') if !self.peek().map_or(false, |c| c.is_ascii_digit()) => {
                self.advance();
                TokenKind::QuestionDot
            }
            _ => TokenKind::Question,
        };
        self.punct(start, kind)
    }

    fn read_dot(&mut self) -> Token {
        let start = self.current_pos;
        self.advance();

        if self.current_char == Some('.') && self.peek() == Some('.') {
            self.advance();
            self.advance();
            self.punct(start, TokenKind::DotDotDot)
        } else if self.current_char.map_or(false, |c| c.is_ascii_digit()) {
            // Number starting with dot (e.g., .5)
            let mut value = String::from("0.");
            self.read_digits(&mut value, |c| c.is_ascii_digit());
            self.read_exponent(&mut value);
            self.make(TokenKind::NumberLiteral, start, value)
        } else {
            self.punct(start, TokenKind::Dot)
        }
    }
}

fn is_line_terminator(ch: char) -> bool {
    matches!(ch, '\n' | '\r' | '\u{2028}' | '\u{2029}')
}
