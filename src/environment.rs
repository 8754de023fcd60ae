use crate::error::{RuntimeError, RuntimeErrorKind};
use crate::token::Token;
use crate::value::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// One scope frame. Frames are shared (`Rc`) because closures keep the frame
/// they were declared in alive after the block or call that made it exits.
#[derive(Debug, Default)]
pub struct Environment {
    values: HashMap<String, Value>,
    enclosing: Option<Rc<RefCell<Environment>>>,
}

impl Environment {
    /// The global frame.
    pub fn new() -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: None,
        }
    }

    pub fn with_enclosing(enclosing: Rc<RefCell<Environment>>) -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: Some(enclosing),
        }
    }

    /// Bind `name` in this frame, replacing any previous binding.
    pub fn define(&mut self, name: &str, value: Value) {
        self.values.insert(name.to_string(), value);
    }

    pub fn get(&self, name: &Token) -> Result<Value, RuntimeError> {
        if let Some(value) = self.values.get(&name.lexeme) {
            Ok(value.clone())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow().get(name)
        } else {
            Err(undefined(name))
        }
    }

    pub fn assign(&mut self, name: &Token, value: Value) -> Result<(), RuntimeError> {
        if let Some(slot) = self.values.get_mut(&name.lexeme) {
            *slot = value;
            Ok(())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow_mut().assign(name, value)
        } else {
            Err(undefined(name))
        }
    }

    /// Read `name` from the frame exactly `distance` hops out of `env`.
    pub fn get_at(
        env: &Rc<RefCell<Environment>>,
        distance: usize,
        name: &Token,
    ) -> Result<Value, RuntimeError> {
        let frame = Self::ancestor(env, distance).ok_or_else(|| undefined(name))?;
        let frame = frame.borrow();

        frame
            .values
            .get(&name.lexeme)
            .cloned()
            .ok_or_else(|| undefined(name))
    }

    /// Overwrite `name` in the frame exactly `distance` hops out of `env`.
    pub fn assign_at(
        env: &Rc<RefCell<Environment>>,
        distance: usize,
        name: &Token,
        value: Value,
    ) -> Result<(), RuntimeError> {
        let frame = Self::ancestor(env, distance).ok_or_else(|| undefined(name))?;
        let mut frame = frame.borrow_mut();

        match frame.values.get_mut(&name.lexeme) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(undefined(name)),
        }
    }

    fn ancestor(env: &Rc<RefCell<Environment>>, distance: usize) -> Option<Rc<RefCell<Environment>>> {
        let mut frame = Rc::clone(env);

        for _ in 0..distance {
            let next = frame.borrow().enclosing.clone()?;
            frame = next;
        }

        Some(frame)
    }
}

fn undefined(name: &Token) -> RuntimeError {
    RuntimeError::new(name, RuntimeErrorKind::UndefinedVariable(name.lexeme.clone()))
}
