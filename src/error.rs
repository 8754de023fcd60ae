//! Centralised error hierarchy for the **Lox interpreter**.
//!
//! The static phases (scanner, parser, resolver) accumulate [`LoxError`]s and
//! keep going; the runtime stops at the first [`RuntimeError`]. [`RunError`]
//! is what a full pipeline run hands back to the driver, which alone decides
//! how to print diagnostics and which exit status to use.
//!
//! The module **does not** print diagnostics itself

use std::io;
use thiserror::Error;

use log::debug;

use crate::token::{Token, TokenType};

/// Exit status for lexical, syntax or resolution failures.
pub const EXIT_FORMAT_ERROR: i32 = 65;

/// Exit status for a failed interpretation.
pub const EXIT_RUNTIME_ERROR: i32 = 70;

/// Error produced by one of the static phases.
#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum LoxError {
    /// Lexical (scanner) error with source line information.
    #[error("[line {line}] Error: {message}")]
    Lex {
        /// Human‑readable description.
        message: String,

        /// 1‑based line where the error occurred.
        line: usize,
    },

    /// Syntactic (parser) error.
    #[error("[line {line}] Error{location}: {message}")]
    Parse {
        message: String,
        line: usize,
        /// ` at 'lexeme'` or ` at end`.
        location: String,
    },

    /// Static‑analysis failure (redeclaration, self‑referencing initializer, ...).
    #[error("[line {line}] Error{location}: {message}")]
    Resolve {
        message: String,
        line: usize,
        location: String,
    },
}

impl LoxError {
    /// Helper constructor for the **scanner**.
    pub fn lex<S: Into<String>>(line: usize, msg: S) -> Self {
        let message: String = msg.into();

        debug!("Creating Lex error: line={}, msg={}", line, message);

        LoxError::Lex { message, line }
    }

    /// Helper constructor for the **parser**.
    pub fn parse<S: Into<String>>(token: &Token, msg: S) -> Self {
        let message: String = msg.into();

        debug!("Creating Parse error: line={}, msg={}", token.line, message);

        LoxError::Parse {
            message,
            line: token.line,
            location: location(token),
        }
    }

    /// Helper constructor for the **resolver**.
    pub fn resolve<S: Into<String>>(token: &Token, msg: S) -> Self {
        let message: String = msg.into();

        debug!("Creating Resolve error: line={}, msg={}", token.line, message);

        LoxError::Resolve {
            message,
            line: token.line,
            location: location(token),
        }
    }

    pub fn line(&self) -> usize {
        match self {
            LoxError::Lex { line, .. }
            | LoxError::Parse { line, .. }
            | LoxError::Resolve { line, .. } => *line,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            LoxError::Lex { message, .. }
            | LoxError::Parse { message, .. }
            | LoxError::Resolve { message, .. } => message,
        }
    }
}

fn location(token: &Token) -> String {
    if token.token_type == TokenType::EOF {
        " at end".to_string()
    } else {
        format!(" at '{}'", token.lexeme)
    }
}

/// The fixed taxonomy of runtime failures.
#[derive(Debug, Error)]
pub enum RuntimeErrorKind {
    #[error("Operand must be a number.")]
    OperandMustBeNumber,

    #[error("Operands must be numbers.")]
    OperandsMustBeNumbers,

    #[error("Operands must be two numbers or one of them must be a string.")]
    InvalidAddition,

    #[error("Division by zero.")]
    DivisionByZero,

    #[error("Undefined variable '{0}'.")]
    UndefinedVariable(String),

    #[error("Expected {expected} arguments but got {got}.")]
    ArityMismatch { expected: usize, got: usize },

    #[error("Can only call functions.")]
    NotCallable,

    #[error("Stack overflow.")]
    StackOverflow,

    #[error("Failed to write output: {0}")]
    Output(#[from] io::Error),
}

/// Terminal runtime failure, tied to the token that caused it.
#[derive(Debug, Error)]
#[error("[line {line}] Error at '{lexeme}': {kind}")]
pub struct RuntimeError {
    pub line: usize,
    pub lexeme: String,
    #[source]
    pub kind: RuntimeErrorKind,
}

impl RuntimeError {
    pub fn new(token: &Token, kind: RuntimeErrorKind) -> Self {
        debug!(
            "Creating Runtime error: line={}, lexeme={}, kind={}",
            token.line, token.lexeme, kind
        );

        Self {
            line: token.line,
            lexeme: token.lexeme.clone(),
            kind,
        }
    }
}

/// Outcome of a failed pipeline run.
#[derive(Debug, Error)]
pub enum RunError {
    /// Every lexical, syntax or resolution error found before execution.
    #[error("{} static error(s)", .0.len())]
    Static(Vec<LoxError>),

    #[error(transparent)]
    Runtime(RuntimeError),
}

impl RunError {
    pub fn exit_code(&self) -> i32 {
        match self {
            RunError::Static(_) => EXIT_FORMAT_ERROR,
            RunError::Runtime(_) => EXIT_RUNTIME_ERROR,
        }
    }
}

/// Crate‑wide `Result` alias for the static phases.
pub type Result<T> = std::result::Result<T, LoxError>;
