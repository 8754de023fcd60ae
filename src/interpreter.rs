use std::cell::RefCell;
use std::collections::HashMap;
use std::io::{self, Write};
use std::rc::Rc;

use log::{debug, info};

use crate::callable::LoxFunction;
use crate::environment::Environment;
use crate::error::{RuntimeError, RuntimeErrorKind};
use crate::expr::{Expr, ExprId};
use crate::stmt::Stmt;
use crate::token::{Token, TokenType};
use crate::value::Value;

/// Deepest chain of nested calls before the run fails with a stack overflow.
/// Each call costs several host frames, so this stays well inside the main
/// thread's stack even in debug builds.
pub const MAX_CALL_DEPTH: usize = 255;

/// Convenient alias for interpreter results.
pub type IResult<T> = Result<T, RuntimeError>;

/// How a statement finished. `Break` and `Return` unwind to the nearest
/// loop or call; they are not errors and never escape those boundaries.
#[derive(Debug, Clone, PartialEq)]
pub enum Flow {
    Normal,
    Break,
    Return(Value),
}

/// Tree‑walking evaluator. `print` output goes to `W` (stdout by default).
pub struct Interpreter<W: Write = io::Stdout> {
    globals: Rc<RefCell<Environment>>,
    environment: Rc<RefCell<Environment>>,
    locals: HashMap<ExprId, usize>,
    call_depth: usize,
    out: W,
}

impl Interpreter<io::Stdout> {
    pub fn new() -> Self {
        Self::with_output(io::stdout())
    }
}

impl Default for Interpreter<io::Stdout> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Write> Interpreter<W> {
    pub fn with_output(out: W) -> Self {
        info!("Initializing Interpreter");

        let globals = Rc::new(RefCell::new(Environment::new()));

        Self {
            environment: Rc::clone(&globals),
            globals,
            locals: HashMap::new(),
            call_depth: 0,
            out,
        }
    }

    pub fn output(&self) -> &W {
        &self.out
    }

    pub fn output_mut(&mut self) -> &mut W {
        &mut self.out
    }

    pub fn into_output(self) -> W {
        self.out
    }

    /// Record that the variable occurrence `id` binds `depth` frames out.
    /// Called by the resolver.
    pub fn resolve(&mut self, id: ExprId, depth: usize) {
        self.locals.insert(id, depth);
    }

    /// Hop counts recorded so far, keyed by node.
    pub fn locals(&self) -> &HashMap<ExprId, usize> {
        &self.locals
    }

    /// Interprets a list of statements (a "program").
    ///
    /// Yields the value of the final statement when it is an expression
    /// statement, `nil` otherwise. The first runtime error ends the run.
    pub fn interpret(&mut self, statements: &[Stmt]) -> IResult<Value> {
        debug!("Interpreting {} statements", statements.len());

        let mut last: Value = Value::Nil;

        for stmt in statements {
            last = match stmt {
                Stmt::Expression(expr) => self.evaluate(expr)?,
                _ => {
                    self.execute(stmt)?;
                    Value::Nil
                }
            };
        }

        info!("Interpretation completed successfully");
        Ok(last)
    }

    /// Executes a single statement.
    pub fn execute(&mut self, stmt: &Stmt) -> IResult<Flow> {
        match stmt {
            Stmt::Expression(expr) => {
                self.evaluate(expr)?;
                Ok(Flow::Normal)
            }

            Stmt::Print { keyword, value } => {
                let value = self.evaluate(value)?;
                writeln!(self.out, "{}", value)
                    .map_err(|e| RuntimeError::new(keyword, RuntimeErrorKind::Output(e)))?;
                debug!("Printed value: {}", value);
                Ok(Flow::Normal)
            }

            Stmt::Var { name, initializer } => {
                let value = match initializer {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };
                debug!("Defining variable '{}' = {}", name.lexeme, value);
                self.environment.borrow_mut().define(&name.lexeme, value);
                Ok(Flow::Normal)
            }

            Stmt::Block(statements) => {
                let frame = Environment::with_enclosing(Rc::clone(&self.environment));
                self.execute_block(statements, Rc::new(RefCell::new(frame)))
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.evaluate(condition)?.is_truthy() {
                    self.execute(then_branch)
                } else if let Some(else_stmt) = else_branch {
                    self.execute(else_stmt)
                } else {
                    Ok(Flow::Normal)
                }
            }

            Stmt::While { condition, body } => {
                debug!("Entering while loop");
                while self.evaluate(condition)?.is_truthy() {
                    match self.execute(body)? {
                        Flow::Normal => {}
                        Flow::Break => {
                            debug!("Break out of while loop");
                            break;
                        }
                        ret @ Flow::Return(_) => return Ok(ret),
                    }
                }
                Ok(Flow::Normal)
            }

            Stmt::Break { .. } => Ok(Flow::Break),

            Stmt::Function(decl) => {
                debug!("Defining function '{}'", decl.name.lexeme);
                // Capture the current frame by reference as the closure.
                let function = LoxFunction::new(Rc::clone(decl), Rc::clone(&self.environment));
                self.environment
                    .borrow_mut()
                    .define(&decl.name.lexeme, Value::Callable(Rc::new(function)));
                Ok(Flow::Normal)
            }

            Stmt::Return { value, .. } => {
                let value = match value {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };
                debug!("Returning value: {}", value);
                Ok(Flow::Return(value))
            }
        }
    }

    /// Run `statements` with `frame` as the current frame, restoring the
    /// previous frame however the block exits.
    pub(crate) fn execute_block(
        &mut self,
        statements: &[Stmt],
        frame: Rc<RefCell<Environment>>,
    ) -> IResult<Flow> {
        let previous = std::mem::replace(&mut self.environment, frame);
        let result = self.execute_all(statements);
        self.environment = previous;
        result
    }

    fn execute_all(&mut self, statements: &[Stmt]) -> IResult<Flow> {
        for stmt in statements {
            match self.execute(stmt)? {
                Flow::Normal => {}
                flow => return Ok(flow),
            }
        }
        Ok(Flow::Normal)
    }

    /// Evaluates an expression and returns a Value.
    pub fn evaluate(&mut self, expr: &Expr) -> IResult<Value> {
        match expr {
            Expr::Literal(literal) => Ok(Value::from(literal)),

            Expr::Grouping(inner) => self.evaluate(inner),

            Expr::Unary { operator, right } => self.evaluate_unary(operator, right),

            Expr::Binary {
                left,
                operator,
                right,
            } => self.evaluate_binary(left, operator, right),

            Expr::Logical {
                left,
                operator,
                right,
            } => {
                let left_val = self.evaluate(left)?;
                let short_circuit = if operator.token_type == TokenType::OR {
                    left_val.is_truthy()
                } else {
                    !left_val.is_truthy()
                };

                if short_circuit {
                    Ok(left_val)
                } else {
                    self.evaluate(right)
                }
            }

            Expr::Ternary {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.evaluate(condition)?.is_truthy() {
                    self.evaluate(then_branch)
                } else {
                    self.evaluate(else_branch)
                }
            }

            Expr::Variable { id, name } => self.look_up_variable(*id, name),

            Expr::Assign { id, name, value } => {
                let value = self.evaluate(value)?;

                match self.locals.get(id) {
                    Some(&distance) => {
                        Environment::assign_at(&self.environment, distance, name, value.clone())?
                    }
                    None => self.globals.borrow_mut().assign(name, value.clone())?,
                }

                debug!("Assigned {} to '{}'", value, name.lexeme);
                Ok(value)
            }

            Expr::Call {
                callee,
                paren,
                arguments,
            } => {
                let callee_val = self.evaluate(callee)?;

                let mut arg_values = Vec::with_capacity(arguments.len());
                for arg in arguments {
                    arg_values.push(self.evaluate(arg)?);
                }

                self.invoke_callable(callee_val, paren, arg_values)
            }
        }
    }

    fn look_up_variable(&self, id: ExprId, name: &Token) -> IResult<Value> {
        match self.locals.get(&id) {
            Some(&distance) => Environment::get_at(&self.environment, distance, name),
            None => self.globals.borrow().get(name),
        }
    }

    fn evaluate_unary(&mut self, op: &Token, right: &Expr) -> IResult<Value> {
        let right_val = self.evaluate(right)?;

        match (op.token_type, right_val) {
            (TokenType::BANG, value) => Ok(Value::Bool(!value.is_truthy())),
            (TokenType::MINUS, Value::Number(n)) => Ok(Value::Number(-n)),
            (_, value) => {
                debug!("Unary '{}' applied to a {}", op.lexeme, value.type_name());
                Err(RuntimeError::new(op, RuntimeErrorKind::OperandMustBeNumber))
            }
        }
    }

    fn evaluate_binary(&mut self, left: &Expr, op: &Token, right: &Expr) -> IResult<Value> {
        let left_val = self.evaluate(left)?;
        let right_val = self.evaluate(right)?;

        match op.token_type {
            TokenType::PLUS => match (left_val, right_val) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
                (l @ Value::String(_), r) | (l, r @ Value::String(_)) => {
                    Ok(Value::String(format!("{}{}", l, r)))
                }
                (l, r) => {
                    debug!("Cannot add {} and {}", l.type_name(), r.type_name());
                    Err(RuntimeError::new(op, RuntimeErrorKind::InvalidAddition))
                }
            },

            TokenType::SLASH => {
                if right_val == Value::Number(0.0) {
                    return Err(RuntimeError::new(op, RuntimeErrorKind::DivisionByZero));
                }
                let (a, b) = number_operands(op, &left_val, &right_val)?;
                Ok(Value::Number(a / b))
            }

            TokenType::MINUS => {
                let (a, b) = number_operands(op, &left_val, &right_val)?;
                Ok(Value::Number(a - b))
            }

            TokenType::STAR => {
                let (a, b) = number_operands(op, &left_val, &right_val)?;
                Ok(Value::Number(a * b))
            }

            TokenType::GREATER => {
                let (a, b) = number_operands(op, &left_val, &right_val)?;
                Ok(Value::Bool(a > b))
            }

            TokenType::GREATER_EQUAL => {
                let (a, b) = number_operands(op, &left_val, &right_val)?;
                Ok(Value::Bool(a >= b))
            }

            TokenType::LESS => {
                let (a, b) = number_operands(op, &left_val, &right_val)?;
                Ok(Value::Bool(a < b))
            }

            TokenType::LESS_EQUAL => {
                let (a, b) = number_operands(op, &left_val, &right_val)?;
                Ok(Value::Bool(a <= b))
            }

            TokenType::EQUAL_EQUAL => Ok(Value::Bool(left_val == right_val)),

            TokenType::BANG_EQUAL => Ok(Value::Bool(left_val != right_val)),

            // The parser only builds binary nodes from the operators above.
            _ => Err(RuntimeError::new(op, RuntimeErrorKind::OperandsMustBeNumbers)),
        }
    }

    /// Invokes a callable with already evaluated arguments.
    fn invoke_callable(
        &mut self,
        callee_val: Value,
        paren: &Token,
        arg_values: Vec<Value>,
    ) -> IResult<Value> {
        let function: Rc<LoxFunction> = match callee_val {
            Value::Callable(function) => function,
            other => {
                debug!("Attempted to call a {}", other.type_name());
                return Err(RuntimeError::new(paren, RuntimeErrorKind::NotCallable));
            }
        };

        if arg_values.len() != function.arity() {
            return Err(RuntimeError::new(
                paren,
                RuntimeErrorKind::ArityMismatch {
                    expected: function.arity(),
                    got: arg_values.len(),
                },
            ));
        }

        if self.call_depth >= MAX_CALL_DEPTH {
            debug!("Call to '{}' exceeds depth {}", function.name(), MAX_CALL_DEPTH);
            return Err(RuntimeError::new(paren, RuntimeErrorKind::StackOverflow));
        }

        debug!("Calling function '{}'", function.name());
        self.call_depth += 1;
        let result = function.call(self, arg_values);
        self.call_depth -= 1;
        let result = result?;
        debug!("Function '{}' returned: {}", function.name(), result);

        Ok(result)
    }
}

fn number_operands(op: &Token, left: &Value, right: &Value) -> IResult<(f64, f64)> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => Ok((*a, *b)),
        _ => {
            debug!(
                "Operator '{}' applied to {} and {}",
                op.lexeme,
                left.type_name(),
                right.type_name()
            );
            Err(RuntimeError::new(op, RuntimeErrorKind::OperandsMustBeNumbers))
        }
    }
}
