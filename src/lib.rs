pub mod ast_printer;
pub mod callable;
pub mod environment;
pub mod error;
pub mod expr;
pub mod interpreter;
pub mod parser;
pub mod resolver;
pub mod scanner;
pub mod stmt;
pub mod token;
pub mod value;

use std::io::Write;

use log::info;

use crate::error::RunError;
use crate::interpreter::Interpreter;
use crate::value::Value;

/// Run `source` through the whole pipeline: scan, parse, resolve, interpret.
///
/// Lexical and syntax errors are gathered together before giving up, so a
/// file with several independent mistakes reports all of them. Resolution
/// only runs on an error-free parse; interpretation only on a clean resolve.
pub fn run<W: Write>(source: &str, interpreter: &mut Interpreter<W>) -> Result<Value, RunError> {
    info!("Running {} bytes of source", source.len());

    let (tokens, mut errors) = scanner::scan(source);
    let (statements, parse_errors) = parser::parse(&tokens);
    errors.extend(parse_errors);

    if !errors.is_empty() {
        return Err(RunError::Static(errors));
    }

    resolver::resolve(interpreter, &statements).map_err(RunError::Static)?;

    interpreter
        .interpret(&statements)
        .map_err(RunError::Runtime)
}
