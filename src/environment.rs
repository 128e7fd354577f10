use crate::error::{LoxError, Result};
use crate::token::Token;
use crate::value::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Shared handle to a scope.  Closures keep their defining scope alive
/// through one of these.
pub type EnvRef<'a> = Rc<RefCell<Environment<'a>>>;

/// One lexical scope: name → value, plus the enclosing scope.
///
/// Bindings are never removed.  `define` inserts or overwrites in this scope,
/// `assign` overwrites wherever the name already lives.
#[derive(Debug, Default)]
pub struct Environment<'a> {
    values: HashMap<&'a str, Value<'a>>,
    enclosing: Option<EnvRef<'a>>,
}

impl<'a> Environment<'a> {
    pub fn new() -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: None,
        }
    }

    pub fn with_enclosing(enclosing: EnvRef<'a>) -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: Some(enclosing),
        }
    }

    /// Wrap in a fresh shared handle.
    pub fn into_ref(self) -> EnvRef<'a> {
        Rc::new(RefCell::new(self))
    }

    pub fn define(&mut self, name: &'a str, value: Value<'a>) {
        self.values.insert(name, value);
    }

    pub fn get(&self, name: &Token<'a>) -> Result<Value<'a>> {
        if let Some(value) = self.values.get(name.lexeme) {
            Ok(value.clone())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow().get(name)
        } else {
            Err(LoxError::runtime(
                name,
                format!("Undefined variable '{}'.", name.lexeme),
            ))
        }
    }

    pub fn assign(&mut self, name: &Token<'a>, value: Value<'a>) -> Result<()> {
        if let Some(slot) = self.values.get_mut(name.lexeme) {
            *slot = value;
            Ok(())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow_mut().assign(name, value)
        } else {
            Err(LoxError::runtime(
                name,
                format!("Undefined variable '{}'.", name.lexeme),
            ))
        }
    }

    /// Walk exactly `distance` enclosing links.
    pub fn ancestor(env: &EnvRef<'a>, distance: usize) -> Option<EnvRef<'a>> {
        let mut current: EnvRef<'a> = Rc::clone(env);

        for _ in 0..distance {
            let next: EnvRef<'a> = current.borrow().enclosing.as_ref().map(Rc::clone)?;
            current = next;
        }

        Some(current)
    }

    /// Read `name` from the scope `distance` hops out, without searching further.
    pub fn get_at(env: &EnvRef<'a>, distance: usize, name: &str) -> Option<Value<'a>> {
        let scope: EnvRef<'a> = Self::ancestor(env, distance)?;
        let value: Option<Value<'a>> = scope.borrow().values.get(name).cloned();
        value
    }

    /// Overwrite `name` in the scope `distance` hops out.  Returns `false` when
    /// that scope does not hold the name.
    pub fn assign_at(env: &EnvRef<'a>, distance: usize, name: &str, value: Value<'a>) -> bool {
        let Some(scope) = Self::ancestor(env, distance) else {
            return false;
        };

        let mut scope = scope.borrow_mut();
        match scope.values.get_mut(name) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::TokenType;

    fn ident(name: &str) -> Token<'_> {
        Token::new(TokenType::IDENTIFIER, name, 1)
    }

    #[test]
    fn inner_scope_shadows_without_touching_outer() {
        let outer = Environment::new().into_ref();
        outer.borrow_mut().define("a", Value::Number(1.0));

        let inner = Environment::with_enclosing(Rc::clone(&outer)).into_ref();
        inner.borrow_mut().define("a", Value::Number(2.0));

        assert_eq!(inner.borrow().get(&ident("a")).unwrap(), Value::Number(2.0));
        assert_eq!(outer.borrow().get(&ident("a")).unwrap(), Value::Number(1.0));
    }

    #[test]
    fn assign_walks_outward_and_rejects_unknown_names() {
        let outer = Environment::new().into_ref();
        outer.borrow_mut().define("a", Value::Nil);
        let inner = Environment::with_enclosing(Rc::clone(&outer)).into_ref();

        inner
            .borrow_mut()
            .assign(&ident("a"), Value::Bool(true))
            .unwrap();
        assert_eq!(outer.borrow().get(&ident("a")).unwrap(), Value::Bool(true));

        let err = inner
            .borrow_mut()
            .assign(&ident("b"), Value::Nil)
            .unwrap_err();
        assert_eq!(err.message(), "Undefined variable 'b'.");
    }

    #[test]
    fn distance_lookups_do_not_search() {
        let global = Environment::new().into_ref();
        global.borrow_mut().define("x", Value::Number(1.0));
        let middle = Environment::with_enclosing(Rc::clone(&global)).into_ref();
        let inner = Environment::with_enclosing(Rc::clone(&middle)).into_ref();

        assert_eq!(Environment::get_at(&inner, 2, "x"), Some(Value::Number(1.0)));
        assert_eq!(Environment::get_at(&inner, 1, "x"), None);
        assert!(Environment::ancestor(&inner, 3).is_none());

        assert!(Environment::assign_at(&inner, 2, "x", Value::Number(5.0)));
        assert!(!Environment::assign_at(&inner, 0, "x", Value::Nil));
        assert_eq!(Environment::get_at(&global, 0, "x"), Some(Value::Number(5.0)));
    }
}
