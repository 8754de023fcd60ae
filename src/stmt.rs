use std::rc::Rc;

use crate::expr::Expr;
use crate::token::Token;

/// A `fun` declaration. Shared behind an `Rc` so every closure created from
/// it points at the same body instead of copying the tree.
#[derive(Debug, PartialEq)]
pub struct FunctionDecl {
    pub name: Token,
    pub params: Vec<Token>,
    pub body: Vec<Stmt>,
}

#[derive(Debug, PartialEq)]
pub enum Stmt {
    Expression(Expr),

    Print {
        keyword: Token,
        value: Expr,
    },

    Var {
        name: Token,
        initializer: Option<Expr>,
    },

    Block(Vec<Stmt>),

    If {
        condition: Expr,
        then_branch: Box<Stmt>,
        else_branch: Option<Box<Stmt>>,
    },

    // `for` loops are desugared into this by the parser
    While {
        condition: Expr,
        body: Box<Stmt>,
    },

    Break {
        keyword: Token,
    },

    Function(Rc<FunctionDecl>),

    Return {
        keyword: Token,
        value: Option<Expr>,
    },
}
