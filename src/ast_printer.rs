//! Debug renderings of the syntax tree: a Lisp‑like parenthesized form for
//! whole programs and a postfix (reverse Polish) form for expressions.

use crate::expr::Expr;
use crate::stmt::Stmt;
use crate::token::Literal;

pub struct AstPrinter;

impl AstPrinter {
    pub fn print_program(&self, statements: &[Stmt]) -> String {
        statements
            .iter()
            .map(|stmt| self.print_stmt(stmt))
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn print_stmt(&self, stmt: &Stmt) -> String {
        match stmt {
            Stmt::Expression(expr) => format!("(; {})", self.print(expr)),

            Stmt::Print { value, .. } => format!("(print {})", self.print(value)),

            Stmt::Var { name, initializer } => match initializer {
                Some(expr) => format!("(var {} {})", name.lexeme, self.print(expr)),
                None => format!("(var {})", name.lexeme),
            },

            Stmt::Block(statements) => {
                let body: Vec<String> = statements.iter().map(|s| self.print_stmt(s)).collect();
                format!("(block {})", body.join(" "))
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => match else_branch {
                Some(else_branch) => format!(
                    "(if {} {} {})",
                    self.print(condition),
                    self.print_stmt(then_branch),
                    self.print_stmt(else_branch)
                ),
                None => format!(
                    "(if {} {})",
                    self.print(condition),
                    self.print_stmt(then_branch)
                ),
            },

            Stmt::While { condition, body } => {
                format!("(while {} {})", self.print(condition), self.print_stmt(body))
            }

            Stmt::Break { .. } => "(break)".to_string(),

            Stmt::Function(decl) => {
                let params: Vec<&str> = decl.params.iter().map(|p| p.lexeme.as_str()).collect();
                let body: Vec<String> = decl.body.iter().map(|s| self.print_stmt(s)).collect();
                format!(
                    "(fun {} ({}) {})",
                    decl.name.lexeme,
                    params.join(" "),
                    body.join(" ")
                )
            }

            Stmt::Return { value, .. } => match value {
                Some(expr) => format!("(return {})", self.print(expr)),
                None => "(return)".to_string(),
            },
        }
    }

    pub fn print(&self, expr: &Expr) -> String {
        match expr {
            Expr::Binary {
                left,
                operator,
                right,
            }
            | Expr::Logical {
                left,
                operator,
                right,
            } => format!(
                "({} {} {})",
                operator.lexeme,
                self.print(left),
                self.print(right)
            ),

            Expr::Unary { operator, right } => {
                format!("({} {})", operator.lexeme, self.print(right))
            }

            Expr::Literal(literal) => literal.to_string(),

            Expr::Grouping(expr) => format!("(group {})", self.print(expr)),

            Expr::Ternary {
                condition,
                then_branch,
                else_branch,
            } => format!(
                "(?: {} {} {})",
                self.print(condition),
                self.print(then_branch),
                self.print(else_branch)
            ),

            Expr::Variable { name, .. } => name.lexeme.clone(),

            Expr::Assign { name, value, .. } => {
                format!("(= {} {})", name.lexeme, self.print(value))
            }

            Expr::Call {
                callee, arguments, ..
            } => {
                let mut parts: Vec<String> = vec![self.print(callee)];
                parts.extend(arguments.iter().map(|a| self.print(a)));
                format!("(call {})", parts.join(" "))
            }
        }
    }
}

/// Postfix rendering: operands first, then the operator (`1 2 +`).
pub struct RpnPrinter;

impl RpnPrinter {
    pub fn print(&self, expr: &Expr) -> String {
        match expr {
            Expr::Binary {
                left,
                operator,
                right,
            }
            | Expr::Logical {
                left,
                operator,
                right,
            } => format!(
                "{} {} {}",
                self.print(left),
                self.print(right),
                operator.lexeme
            ),

            // Prefix minus gets its own spelling so it can't be read as subtraction.
            Expr::Unary { operator, right } => match operator.lexeme.as_str() {
                "-" => format!("{} neg", self.print(right)),
                op => format!("{} {}", self.print(right), op),
            },

            Expr::Literal(literal) => match literal {
                Literal::Number(n) => n.to_string(),
                other => other.to_string(),
            },

            Expr::Grouping(expr) => self.print(expr),

            Expr::Ternary {
                condition,
                then_branch,
                else_branch,
            } => format!(
                "{} {} {} ?:",
                self.print(condition),
                self.print(then_branch),
                self.print(else_branch)
            ),

            Expr::Variable { name, .. } => name.lexeme.clone(),

            Expr::Assign { name, value, .. } => format!("{} {} =", name.lexeme, self.print(value)),

            Expr::Call {
                callee, arguments, ..
            } => {
                let mut parts: Vec<String> = arguments.iter().map(|a| self.print(a)).collect();
                parts.push(self.print(callee));
                parts.push(format!("call/{}", arguments.len()));
                parts.join(" ")
            }
        }
    }
}
