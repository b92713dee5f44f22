//! Expression definitions for the AST

use super::*;
use std::fmt;

/// Expression
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Literal values
    Literal(Literal),

    /// Identifier
    Ident(Ident),

    /// Binary operation: left op right
    Binary {
        left: Box<Node<Expr>>,
        op: BinaryOp,
        right: Box<Node<Expr>>,
    },

    /// Unary operation: op expr
    Unary {
        op: UnaryOp,
        expr: Box<Node<Expr>>,
    },

    /// Assignment: target = value
    Assignment {
        target: Box<Node<Expr>>,
        op: AssignmentOp,
        value: Box<Node<Expr>>,
    },

    /// Function call: callee(args)
    Call {
        callee: Box<Node<Expr>>,
        args: Vec<Node<Expr>>,
    },

    /// Member access: object.property (also object.#private)
    Member {
        object: Box<Node<Expr>>,
        property: Node<Ident>,
    },

    /// Index access: object[index]
    Index {
        object: Box<Node<Expr>>,
        index: Box<Node<Expr>>,
    },

    /// Array literal: [elem1, , ...rest]
    Array(Vec<Option<Node<Expr>>>),

    /// Object literal: { key1: value1, key2() {} }
    Object(Vec<ObjectProperty>),

    /// Arrow function: (params) => body
    Arrow {
        params: Vec<Param>,
        body: ArrowBody,
        is_async: bool,
    },

    /// Function expression: function name?(params) { body }
    Function(Box<Function>),

    /// Class expression: class name? extends base { members }
    Class(Box<Class>),

    /// Ternary/conditional: condition ? then_expr : else_expr
    Ternary {
        condition: Box<Node<Expr>>,
        then_expr: Box<Node<Expr>>,
        else_expr: Box<Node<Expr>>,
    },

    /// Template literal: `hello ${expr}`
    Template(Template),

    /// Tagged template literal: tag`template`
    TaggedTemplate {
        tag: Box<Node<Expr>>,
        template: Template,
    },

    /// New expression: new Constructor(args)
    New {
        callee: Box<Node<Expr>>,
        args: Vec<Node<Expr>>,
    },

    /// Await expression: await expr
    Await(Box<Node<Expr>>),

    /// Yield expression: yield expr, yield* expr
    Yield {
        argument: Option<Box<Node<Expr>>>,
        delegate: bool,
    },

    /// Parenthesized expression
    Paren(Box<Node<Expr>>),

    /// Sequence expression: expr1, expr2, ...
    Sequence(Vec<Node<Expr>>),

    /// Spread expression: ...expr (in call args, array literals)
    Spread(Box<Node<Expr>>),

    /// Optional chaining call: expr?.(args)
    OptionalCall {
        callee: Box<Node<Expr>>,
        args: Vec<Node<Expr>>,
    },

    /// Optional chaining member: expr?.prop
    OptionalMember {
        object: Box<Node<Expr>>,
        property: Node<Ident>,
    },

    /// Optional chaining index: expr?.[index]
    OptionalIndex {
        object: Box<Node<Expr>>,
        index: Box<Node<Expr>>,
    },

    /// Meta property: new.target
    MetaProperty {
        meta: Node<Ident>,
        property: Node<Ident>,
    },

    /// This expression
    This,

    /// Super expression
    Super,
}

impl Expr {
    /// The value of a string literal or a template literal without
    /// substitutions. These are the only forms accepted as a static
    /// module specifier.
    pub fn as_static_string(&self) -> Option<&str> {
        match self {
            Expr::Literal(Literal::String(value)) => Some(value),
            Expr::Template(template) if template.exprs.is_empty() => {
                template.quasis.first().map(String::as_str)
            }
            _ => None,
        }
    }

    /// Name of a plain identifier expression.
    pub fn as_ident(&self) -> Option<&str> {
        match self {
            Expr::Ident(ident) => Some(&ident.name),
            _ => None,
        }
    }
}

/// Template literal pieces. `quasis` always has one more entry than `exprs`.
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    pub quasis: Vec<String>,
    pub exprs: Vec<Node<Expr>>,
}

/// Literal values
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Number(f64),
    BigInt(String),
    String(String),
    Boolean(bool),
    Null,
    RegExp { pattern: String, flags: String },
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,

    // Comparison
    Eq,
    NotEq,
    StrictEq,
    StrictNotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,

    // Logical
    And,
    Or,
    NullishCoalesce,

    // Bitwise
    BitAnd,
    BitOr,
    BitXor,
    LeftShift,
    RightShift,
    UnsignedRightShift,

    // Other
    In,
    InstanceOf,
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Plus,
    Minus,
    Not,
    BitNot,
    TypeOf,
    Void,
    Delete,
    PreIncrement,
    PreDecrement,
    PostIncrement,
    PostDecrement,
}

/// Assignment operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssignmentOp {
    Assign,
    AddAssign,
    SubAssign,
    MulAssign,
    DivAssign,
    ModAssign,
    PowAssign,
    LeftShiftAssign,
    RightShiftAssign,
    UnsignedRightShiftAssign,
    BitAndAssign,
    BitOrAssign,
    BitXorAssign,
    AndAssign,
    OrAssign,
    NullishAssign,
}

/// Arrow function body
#[derive(Debug, Clone, PartialEq)]
pub enum ArrowBody {
    Expr(Box<Node<Expr>>),
    Block(Box<Node<BlockStmt>>),
}

/// Object literal member
#[derive(Debug, Clone, PartialEq)]
pub enum ObjectProperty {
    Property {
        key: PropertyName,
        value: Node<Expr>,
        shorthand: bool,
    },
    Method {
        key: PropertyName,
        kind: MethodKind,
        function: Function,
    },
    Spread(Node<Expr>),
}

/// Method flavour shared by object literals and classes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MethodKind {
    Method,
    Getter,
    Setter,
}

/// Property name
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyName {
    Ident(Node<Ident>),
    String(String),
    Number(f64),
    Private(Node<Ident>),
    Computed(Box<Node<Expr>>),
}

// Display implementations

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::Pow => "**",
            BinaryOp::Eq => "==",
            BinaryOp::NotEq => "!=",
            BinaryOp::StrictEq => "===",
            BinaryOp::StrictNotEq => "!==",
            BinaryOp::Lt => "<",
            BinaryOp::LtEq => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::GtEq => ">=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
            BinaryOp::NullishCoalesce => "??",
            BinaryOp::BitAnd => "&",
            BinaryOp::BitOr => "|",
            BinaryOp::BitXor => "^",
            BinaryOp::LeftShift => "<<",
            BinaryOp::RightShift => ">>",
            BinaryOp::UnsignedRightShift => ">>>",
            BinaryOp::In => "in",
            BinaryOp::InstanceOf => "instanceof",
        };
        write!(f, "{}", s)
    }
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            UnaryOp::Plus => "+",
            UnaryOp::Minus => "-",
            UnaryOp::Not => "!",
            UnaryOp::BitNot => "~",
            UnaryOp::TypeOf => "typeof",
            UnaryOp::Void => "void",
            UnaryOp::Delete => "delete",
            UnaryOp::PreIncrement | UnaryOp::PostIncrement => "++",
            UnaryOp::PreDecrement | UnaryOp::PostDecrement => "--",
        };
        write!(f, "{}", s)
    }
}
