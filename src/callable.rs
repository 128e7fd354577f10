//! Everything a Lox call expression can invoke.
//!
//! Classes implement [`Callable`] as well (see [`crate::class`]); calling one
//! constructs an instance.

use std::cell::RefCell;
use std::rc::Rc;

use log::debug;

use crate::class::LoxInstance;
use crate::environment::{EnvRef, Environment};
use crate::error::Result;
use crate::interpreter::{ControlFlow, Interpreter};
use crate::parser::FunctionDecl;
use crate::value::Value;

/// Fixed arity plus the ability to be invoked with already‑evaluated arguments.
/// Arity is checked by the interpreter before `call` runs.
pub trait Callable<'a> {
    fn arity(&self) -> usize;

    fn call(&self, interpreter: &mut Interpreter<'a>, arguments: Vec<Value<'a>>)
        -> Result<Value<'a>>;
}

/// A primitive implemented in Rust, e.g. `clock`.
pub struct NativeFunction<'a> {
    pub name: &'static str,
    pub arity: usize,
    pub func: fn(&[Value<'a>]) -> Value<'a>,
}

impl<'a> Callable<'a> for NativeFunction<'a> {
    fn arity(&self) -> usize {
        self.arity
    }

    fn call(
        &self,
        _interpreter: &mut Interpreter<'a>,
        arguments: Vec<Value<'a>>,
    ) -> Result<Value<'a>> {
        debug!("Calling native function '{}'", self.name);

        Ok((self.func)(&arguments))
    }
}

/// Seconds since the Unix epoch, as a float.
pub fn clock<'a>(_arguments: &[Value<'a>]) -> Value<'a> {
    let micros: i64 = chrono::Utc::now().timestamp_micros();

    Value::Number(micros as f64 / 1_000_000.0)
}

/// A user function or method closed over its defining scope.
pub struct LoxFunction<'a> {
    declaration: Rc<FunctionDecl<'a>>,
    closure: EnvRef<'a>,
    is_initializer: bool,
}

impl<'a> LoxFunction<'a> {
    pub fn new(declaration: Rc<FunctionDecl<'a>>, closure: EnvRef<'a>, is_initializer: bool) -> Self {
        Self {
            declaration,
            closure,
            is_initializer,
        }
    }

    pub fn name(&self) -> &'a str {
        self.declaration.name.lexeme
    }

    /// Copy of this method whose scope chain starts with `this = instance`.
    pub fn bind(&self, instance: Rc<RefCell<LoxInstance<'a>>>) -> LoxFunction<'a> {
        let mut environment: Environment<'a> = Environment::with_enclosing(Rc::clone(&self.closure));
        environment.define("this", Value::Instance(instance));

        LoxFunction {
            declaration: Rc::clone(&self.declaration),
            closure: environment.into_ref(),
            is_initializer: self.is_initializer,
        }
    }

    /// The bound receiver of an initializer.
    fn bound_this(&self) -> Value<'a> {
        Environment::get_at(&self.closure, 0, "this").unwrap_or(Value::Nil)
    }
}

impl<'a> Callable<'a> for LoxFunction<'a> {
    fn arity(&self) -> usize {
        self.declaration.params.len()
    }

    fn call(
        &self,
        interpreter: &mut Interpreter<'a>,
        arguments: Vec<Value<'a>>,
    ) -> Result<Value<'a>> {
        debug!(
            "Calling '{}' with {} argument(s)",
            self.name(),
            arguments.len()
        );

        let mut environment: Environment<'a> = Environment::with_enclosing(Rc::clone(&self.closure));

        for (param, argument) in self.declaration.params.iter().zip(arguments) {
            environment.define(param.lexeme, argument);
        }

        let flow: ControlFlow<'a> =
            interpreter.execute_block(&self.declaration.body, environment.into_ref())?;

        // `init` always hands back the instance, even on a bare `return;`.
        if self.is_initializer {
            return Ok(self.bound_this());
        }

        match flow {
            ControlFlow::Return(value) => Ok(value),
            ControlFlow::Normal => Ok(Value::Nil),
        }
    }
}
