use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::token::{Literal, Token};

/// Stable handle identifying one syntactic occurrence of a variable access
/// or assignment. The resolver keys its hop counts on it, so two
/// identical-looking `a` references are still distinct entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ExprId(usize);

static NEXT_EXPR_ID: AtomicUsize = AtomicUsize::new(0);

impl ExprId {
    /// Next handle in the process‑wide sequence. Handles are never reused,
    /// so closures created by earlier REPL lines keep valid resolutions.
    pub fn fresh() -> Self {
        ExprId(NEXT_EXPR_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for ExprId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, PartialEq)]
pub enum Expr {
    // Number, string, true, false or nil
    Literal(Literal),

    // Parenthesized sub-expression
    Grouping(Box<Expr>),

    // `!x`, `-x`
    Unary {
        operator: Token,
        right: Box<Expr>,
    },

    // Arithmetic, comparison and equality operators
    Binary {
        left: Box<Expr>,
        operator: Token,
        right: Box<Expr>,
    },

    // Short-circuiting `and` / `or`
    Logical {
        left: Box<Expr>,
        operator: Token,
        right: Box<Expr>,
    },

    // cond ? then : else
    Ternary {
        condition: Box<Expr>,
        then_branch: Box<Expr>,
        else_branch: Box<Expr>,
    },

    Variable {
        id: ExprId,
        name: Token,
    },

    Assign {
        id: ExprId,
        name: Token,
        value: Box<Expr>,
    },

    // `paren` is the closing ')' kept for error reporting
    Call {
        callee: Box<Expr>,
        paren: Token,
        arguments: Vec<Expr>,
    },
}

impl Expr {
    pub fn variable(name: Token) -> Self {
        Expr::Variable {
            id: ExprId::fresh(),
            name,
        }
    }

    pub fn assign(name: Token, value: Expr) -> Self {
        Expr::Assign {
            id: ExprId::fresh(),
            name,
            value: Box::new(value),
        }
    }
}
