use tinypack_ast::Span;

/// Represents the different kinds of tokens in JavaScript.
///
/// Contextual words such as `async`, `of`, `from`, `as`, `get`, `set` and
/// `static` are lexed as [`TokenKind::Identifier`]; the parser decides
/// their meaning from position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // Keywords
    Let,
    Const,
    Var,
    Function,
    Return,
    If,
    Else,
    For,
    While,
    Do,
    Break,
    Continue,
    Switch,
    Case,
    Default,
    Class,
    Extends,
    Import,
    Export,
    New,
    This,
    Super,
    Typeof,
    Instanceof,
    In,
    Void,
    Delete,
    Null,
    True,
    False,
    Await,
    Yield,
    Try,
    Catch,
    Finally,
    Throw,
    Debugger,
    With,

    // Literals
    NumberLiteral,
    BigIntLiteral,
    StringLiteral,
    RegexLiteral,

    // Template pieces: `a` / `a${  /  }b${  /  }c`
    NoSubstitutionTemplate,
    TemplateHead,
    TemplateMiddle,
    TemplateTail,

    // Identifiers
    Identifier,
    PrivateName, // #name

    // Operators
    Plus,              // +
    Minus,             // -
    Star,              // *
    Slash,             // /
    Percent,           // %
    StarStar,          // **
    Eq,                // =
    EqEq,              // ==
    EqEqEq,            // ===
    BangEq,            // !=
    BangEqEq,          // !==
    Lt,                // <
    Gt,                // >
    LtEq,              // <=
    GtEq,              // >=
    AmpAmp,            // &&
    PipePipe,          // ||
    Bang,              // !
    Amp,               // &
    Pipe,              // |
    Caret,             // ^
    Tilde,             // ~
    LtLt,              // <<
    GtGt,              // >>
    GtGtGt,            // >>>
    PlusEq,            // +=
    MinusEq,           // -=
    StarEq,            // *=
    SlashEq,           // /=
    PercentEq,         // %=
    StarStarEq,        // **=
    AmpAmpEq,          // &&=
    PipePipeEq,        // ||=
    QuestionQuestionEq,// ??=
    LtLtEq,            // <<=
    GtGtEq,            // >>=
    GtGtGtEq,          // >>>=
    AmpEq,             // &=
    PipeEq,            // |=
    CaretEq,           // ^=
    QuestionQuestion,  // ??
    QuestionDot,       // ?.
    PlusPlus,          // ++
    MinusMinus,        // --
    FatArrow,          // =>
    DotDotDot,         // ...

    // Delimiters
    LParen,            // (
    RParen,            // )
    LBrace,            // {
    RBrace,            // }
    LBracket,          // [
    RBracket,          // ]
    Semicolon,         // ;
    Comma,             // ,
    Dot,               // .
    Colon,             // :
    Question,          // ?

    // Special
    Eof,
    Error,
}

impl TokenKind {
    /// Looks up the keyword spelled by `word`.
    pub fn keyword(word: &str) -> Option<TokenKind> {
        let kind = match word {
            "let" => TokenKind::Let,
            "const" => TokenKind::Const,
            "var" => TokenKind::Var,
            "function" => TokenKind::Function,
            "return" => TokenKind::Return,
            "if" => TokenKind::If,
            "else" => TokenKind::Else,
            "for" => TokenKind::For,
            "while" => TokenKind::While,
            "do" => TokenKind::Do,
            "break" => TokenKind::Break,
            "continue" => TokenKind::Continue,
            "switch" => TokenKind::Switch,
            "case" => TokenKind::Case,
            "default" => TokenKind::Default,
            "class" => TokenKind::Class,
            "extends" => TokenKind::Extends,
            "import" => TokenKind::Import,
            "export" => TokenKind::Export,
            "new" => TokenKind::New,
            "this" => TokenKind::This,
            "super" => TokenKind::Super,
            "typeof" => TokenKind::Typeof,
            "instanceof" => TokenKind::Instanceof,
            "in" => TokenKind::In,
            "void" => TokenKind::Void,
            "delete" => TokenKind::Delete,
            "null" => TokenKind::Null,
            "true" => TokenKind::True,
            "false" => TokenKind::False,
            "await" => TokenKind::Await,
            "yield" => TokenKind::Yield,
            "try" => TokenKind::Try,
            "catch" => TokenKind::Catch,
            "finally" => TokenKind::Finally,
            "throw" => TokenKind::Throw,
            "debugger" => TokenKind::Debugger,
            "with" => TokenKind::With,
            _ => return None,
        };
        Some(kind)
    }

    pub fn is_keyword(&self) -> bool {
        matches!(
            self,
            TokenKind::Let
                | TokenKind::Const
                | TokenKind::Var
                | TokenKind::Function
                | TokenKind::Return
                | TokenKind::If
                | TokenKind::Else
                | TokenKind::For
                | TokenKind::While
                | TokenKind::Do
                | TokenKind::Break
                | TokenKind::Continue
                | TokenKind::Switch
                | TokenKind::Case
                | TokenKind::Default
                | TokenKind::Class
                | TokenKind::Extends
                | TokenKind::Import
                | TokenKind::Export
                | TokenKind::New
                | TokenKind::This
                | TokenKind::Super
                | TokenKind::Typeof
                | TokenKind::Instanceof
                | TokenKind::In
                | TokenKind::Void
                | TokenKind::Delete
                | TokenKind::Null
                | TokenKind::True
                | TokenKind::False
                | TokenKind::Await
                | TokenKind::Yield
                | TokenKind::Try
                | TokenKind::Catch
                | TokenKind::Finally
                | TokenKind::Throw
                | TokenKind::Debugger
                | TokenKind::With
        )
    }

    /// Whether a token of this kind can be the last token of an expression.
    /// A `/` following such a token is division; otherwise it opens a regex.
    pub fn ends_expression(&self) -> bool {
        matches!(
            self,
            TokenKind::Identifier
                | TokenKind::PrivateName
                | TokenKind::NumberLiteral
                | TokenKind::BigIntLiteral
                | TokenKind::StringLiteral
                | TokenKind::RegexLiteral
                | TokenKind::NoSubstitutionTemplate
                | TokenKind::TemplateTail
                | TokenKind::This
                | TokenKind::Super
                | TokenKind::Null
                | TokenKind::True
                | TokenKind::False
                | TokenKind::RParen
                | TokenKind::RBracket
                | TokenKind::RBrace
                | TokenKind::PlusPlus
                | TokenKind::MinusMinus
        )
    }
}

/// Represents a token with its kind, span, and value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
    /// Text of identifiers and keywords, cooked contents of strings and
    /// templates, the raw text of numbers and regexes, or an error message.
    pub value: String,
    /// A line terminator appeared between this token and the previous one.
    pub newline_before: bool,
}

impl Token {
    pub(crate) fn new(kind: TokenKind, span: Span, value: String, newline_before: bool) -> Self {
        Self {
            kind,
            span,
            value,
            newline_before,
        }
    }
}
