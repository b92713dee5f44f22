//! Declaration definitions for the AST

use super::*;

/// Declaration
#[derive(Debug, Clone, PartialEq)]
pub enum Decl {
    /// Function declaration
    Function(Function),

    /// Class declaration
    Class(Class),

    /// Variable declaration
    Var(VarDecl),
}

impl Decl {
    /// Names this declaration introduces into the enclosing scope.
    pub fn bound_names(&self) -> Vec<&str> {
        match self {
            Decl::Function(func) => func.name.iter().map(|n| n.value.name.as_str()).collect(),
            Decl::Class(class) => class.name.iter().map(|n| n.value.name.as_str()).collect(),
            Decl::Var(var) => var.bound_names(),
        }
    }
}

/// Function (declaration, expression or method body)
#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    pub name: Option<Node<Ident>>,
    pub params: Vec<Param>,
    pub body: Node<BlockStmt>,
    pub is_async: bool,
    pub is_generator: bool,
}

/// Function parameter
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub pattern: Node<Pattern>,
    pub is_rest: bool,
}

/// Class (declaration or expression)
#[derive(Debug, Clone, PartialEq)]
pub struct Class {
    pub name: Option<Node<Ident>>,
    pub extends: Option<Box<Node<Expr>>>,
    pub members: Vec<ClassMember>,
}

/// Class member
#[derive(Debug, Clone, PartialEq)]
pub enum ClassMember {
    /// Constructor
    Constructor {
        params: Vec<Param>,
        body: Node<BlockStmt>,
    },

    /// Method, getter or setter
    Method {
        key: PropertyName,
        kind: MethodKind,
        function: Function,
        is_static: bool,
    },

    /// Field: `x = 1;`, `static y;`, `#z = 2;`
    Property {
        key: PropertyName,
        value: Option<Node<Expr>>,
        is_static: bool,
    },

    /// Static initialization block: `static { ... }`
    StaticBlock(Node<BlockStmt>),
}
