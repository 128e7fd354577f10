use std::collections::HashMap;
use std::io::{self, Write};
use std::rc::Rc;

use log::{debug, info};

use crate::callable::{clock, Callable, LoxFunction, NativeFunction};
use crate::class::{LoxClass, LoxInstance};
use crate::environment::{EnvRef, Environment};
use crate::error::{LoxError, Result};
use crate::parser::{Expr, ExprId, LiteralValue, Stmt};
use crate::token::{Token, TokenType};
use crate::value::Value;

/// How a statement finished.  `Return` travels up through blocks, `if` and
/// `while` until the enclosing function call consumes it.
#[derive(Debug)]
pub enum ControlFlow<'a> {
    Normal,
    Return(Value<'a>),
}

/// Tree‑walking evaluator.
///
/// Owns the global scope, the binding distances recorded by the resolver and
/// the sink that `print` writes to.
pub struct Interpreter<'a> {
    globals: EnvRef<'a>,
    environment: EnvRef<'a>,
    locals: HashMap<ExprId, usize>,
    output: Box<dyn Write + 'a>,
}

impl<'a> Default for Interpreter<'a> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> Interpreter<'a> {
    /// Creates an Interpreter printing to stdout.
    pub fn new() -> Self {
        Self::with_output(Box::new(io::stdout()))
    }

    /// Creates an Interpreter writing `print` output to `output` and defines
    /// native functions such as `clock`.
    pub fn with_output(output: Box<dyn Write + 'a>) -> Self {
        info!("Initializing Interpreter");

        let globals: EnvRef<'a> = Environment::new().into_ref();

        debug!("Defining native function 'clock'");

        globals.borrow_mut().define(
            "clock",
            Value::NativeFunction(Rc::new(NativeFunction {
                name: "clock",
                arity: 0,
                func: clock,
            })),
        );

        Self {
            environment: Rc::clone(&globals),
            globals,
            locals: HashMap::new(),
            output,
        }
    }

    /// Record that the expression `id` refers to a binding `depth` scopes out.
    /// Called by the resolver.
    pub fn resolve(&mut self, id: ExprId, depth: usize) {
        debug!("Expression {:?} bound at depth {}", id, depth);

        self.locals.insert(id, depth);
    }

    /// Interprets a list of statements (a "program").  Stops at the first
    /// runtime error and returns it.
    pub fn interpret(&mut self, statements: &[Stmt<'a>]) -> Result<()> {
        debug!("Interpreting {} statements", statements.len());

        for stmt in statements {
            self.execute(stmt)?;
        }

        self.output.flush()?;

        info!("Interpretation completed successfully");
        Ok(())
    }

    /// Executes a single statement.
    pub fn execute(&mut self, stmt: &Stmt<'a>) -> Result<ControlFlow<'a>> {
        match stmt {
            Stmt::Expression(expr) => {
                self.evaluate(expr)?;
                Ok(ControlFlow::Normal)
            }

            Stmt::Print(expr) => {
                let value: Value<'a> = self.evaluate(expr)?;
                writeln!(self.output, "{}", value)?;
                debug!("Printed value: {}", value);
                Ok(ControlFlow::Normal)
            }

            Stmt::Var { name, initializer } => {
                let value: Value<'a> = match initializer {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };
                debug!("Defining variable '{}' = {}", name.lexeme, value);
                self.environment.borrow_mut().define(name.lexeme, value);
                Ok(ControlFlow::Normal)
            }

            Stmt::Block(statements) => {
                let scope: EnvRef<'a> =
                    Environment::with_enclosing(Rc::clone(&self.environment)).into_ref();
                self.execute_block(statements, scope)
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
                    Ok(ControlFlow::Normal)
                }
            }

            Stmt::While { condition, body } => {
                while self.evaluate(condition)?.is_truthy() {
                    if let ControlFlow::Return(value) = self.execute(body)? {
                        return Ok(ControlFlow::Return(value));
                    }
                }
                Ok(ControlFlow::Normal)
            }

            Stmt::Function(declaration) => {
                debug!("Defining function '{}'", declaration.name.lexeme);
                let function = LoxFunction::new(
                    Rc::clone(declaration),
                    Rc::clone(&self.environment),
                    false,
                );
                self.environment.borrow_mut().define(
                    declaration.name.lexeme,
                    Value::Function(Rc::new(function)),
                );
                Ok(ControlFlow::Normal)
            }

            Stmt::Return { value, .. } => {
                let value: Value<'a> = match value {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };
                debug!("Returning value: {}", value);
                Ok(ControlFlow::Return(value))
            }

            Stmt::Class {
                name,
                superclass,
                methods,
            } => {
                let superclass: Option<Rc<LoxClass<'a>>> = match superclass {
                    Some(expr) => match self.evaluate(expr)? {
                        Value::Class(class) => Some(class),
                        _ => {
                            let at: &Token<'a> = match expr {
                                Expr::Variable { name, .. } => name,
                                _ => name,
                            };
                            return Err(LoxError::runtime(at, "Superclass must be a class."));
                        }
                    },
                    None => None,
                };

                // Bound early so methods can refer to their own class.
                self.environment.borrow_mut().define(name.lexeme, Value::Nil);

                let enclosing: Option<EnvRef<'a>> = superclass.as_ref().map(|class| {
                    let previous: EnvRef<'a> = Rc::clone(&self.environment);
                    let mut scope: Environment<'a> = Environment::with_enclosing(Rc::clone(&previous));
                    scope.define("super", Value::Class(Rc::clone(class)));
                    self.environment = scope.into_ref();
                    previous
                });

                let mut table: HashMap<&'a str, Rc<LoxFunction<'a>>> = HashMap::new();
                for method in methods {
                    let function = LoxFunction::new(
                        Rc::clone(method),
                        Rc::clone(&self.environment),
                        method.name.lexeme == "init",
                    );
                    table.insert(method.name.lexeme, Rc::new(function));
                }

                let class = LoxClass::new(name.lexeme, superclass, table);

                if let Some(previous) = enclosing {
                    self.environment = previous;
                }

                info!("Class '{}' defined", name.lexeme);

                self.environment
                    .borrow_mut()
                    .assign(name, Value::Class(Rc::new(class)))?;
                Ok(ControlFlow::Normal)
            }
        }
    }

    /// Run `statements` inside `environment`, restoring the current scope on
    /// every exit path.
    pub fn execute_block(
        &mut self,
        statements: &[Stmt<'a>],
        environment: EnvRef<'a>,
    ) -> Result<ControlFlow<'a>> {
        let previous: EnvRef<'a> = std::mem::replace(&mut self.environment, environment);

        let mut result: Result<ControlFlow<'a>> = Ok(ControlFlow::Normal);
        for stmt in statements {
            match self.execute(stmt) {
                Ok(ControlFlow::Normal) => continue,
                other => {
                    result = other;
                    break;
                }
            }
        }

        self.environment = previous;
        result
    }

    /// Evaluates an expression and returns a Value.
    pub fn evaluate(&mut self, expr: &Expr<'a>) -> Result<Value<'a>> {
        match expr {
            Expr::Literal(literal) => Ok(match literal {
                LiteralValue::Number(n) => Value::Number(*n),
                LiteralValue::Str(s) => Value::String(s.clone()),
                LiteralValue::True => Value::Bool(true),
                LiteralValue::False => Value::Bool(false),
                LiteralValue::Nil => Value::Nil,
            }),

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
                let left_val: Value<'a> = self.evaluate(left)?;

                let short_circuit: bool = match operator.token_type {
                    TokenType::OR => left_val.is_truthy(),
                    _ => !left_val.is_truthy(),
                };

                if short_circuit {
                    Ok(left_val)
                } else {
                    self.evaluate(right)
                }
            }

            Expr::Variable { id, name } => self.look_up_variable(*id, name),

            Expr::Assign { id, name, value } => {
                let value: Value<'a> = self.evaluate(value)?;

                match self.locals.get(id) {
                    Some(&distance) => {
                        let assigned: bool = Environment::assign_at(
                            &self.environment,
                            distance,
                            name.lexeme,
                            value.clone(),
                        );
                        if !assigned {
                            return Err(undefined_variable(name));
                        }
                    }
                    None => self.globals.borrow_mut().assign(name, value.clone())?,
                }

                Ok(value)
            }

            Expr::Call {
                callee,
                paren,
                arguments,
            } => {
                let callee_val: Value<'a> = self.evaluate(callee)?;

                let mut arg_values: Vec<Value<'a>> = Vec::with_capacity(arguments.len());
                for arg in arguments {
                    arg_values.push(self.evaluate(arg)?);
                }

                self.invoke_callable(&callee_val, paren, arg_values)
            }

            Expr::Get { object, name } => match self.evaluate(object)? {
                Value::Instance(instance) => LoxInstance::get(&instance, name),
                _ => Err(LoxError::runtime(name, "Only instances have properties.")),
            },

            Expr::Set {
                object,
                name,
                value,
            } => {
                let Value::Instance(instance) = self.evaluate(object)? else {
                    return Err(LoxError::runtime(name, "Only instances have fields."));
                };

                let value: Value<'a> = self.evaluate(value)?;
                instance.borrow_mut().set(name, value.clone());
                Ok(value)
            }

            Expr::This { id, keyword } => self.look_up_variable(*id, keyword),

            Expr::Super {
                id,
                keyword,
                method,
            } => self.evaluate_super(*id, keyword, method),
        }
    }

    fn evaluate_unary(&mut self, op: &Token<'a>, right: &Expr<'a>) -> Result<Value<'a>> {
        let right_val: Value<'a> = self.evaluate(right)?;

        match op.token_type {
            TokenType::MINUS => match right_val {
                Value::Number(n) => Ok(Value::Number(-n)),
                _ => Err(LoxError::runtime(op, "Operand must be a number.")),
            },
            TokenType::BANG => Ok(Value::Bool(!right_val.is_truthy())),
            _ => Err(LoxError::runtime(
                op,
                format!("Invalid unary operator '{}'.", op.lexeme),
            )),
        }
    }

    fn evaluate_binary(
        &mut self,
        left: &Expr<'a>,
        op: &Token<'a>,
        right: &Expr<'a>,
    ) -> Result<Value<'a>> {
        let left_val: Value<'a> = self.evaluate(left)?;
        let right_val: Value<'a> = self.evaluate(right)?;

        debug!(
            "Binary '{}' on {} and {}",
            op.lexeme,
            left_val.type_name(),
            right_val.type_name()
        );

        match op.token_type {
            // Equality is defined for every pair of values and never fails.
            TokenType::EQUAL_EQUAL => return Ok(Value::Bool(left_val == right_val)),
            TokenType::BANG_EQUAL => return Ok(Value::Bool(left_val != right_val)),

            TokenType::PLUS => {
                return match (left_val, right_val) {
                    (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
                    (Value::String(a), Value::String(b)) => Ok(Value::String(a + &b)),
                    _ => Err(LoxError::runtime(
                        op,
                        "Operands must be two numbers or two strings.",
                    )),
                }
            }

            _ => {}
        }

        let (a, b) = match (left_val, right_val) {
            (Value::Number(a), Value::Number(b)) => (a, b),
            _ => return Err(LoxError::runtime(op, "Operands must be numbers.")),
        };

        match op.token_type {
            TokenType::MINUS => Ok(Value::Number(a - b)),
            TokenType::STAR => Ok(Value::Number(a * b)),
            TokenType::SLASH => Ok(Value::Number(a / b)),
            TokenType::GREATER => Ok(Value::Bool(a > b)),
            TokenType::GREATER_EQUAL => Ok(Value::Bool(a >= b)),
            TokenType::LESS => Ok(Value::Bool(a < b)),
            TokenType::LESS_EQUAL => Ok(Value::Bool(a <= b)),
            _ => Err(LoxError::runtime(
                op,
                format!("Invalid binary operator '{}'.", op.lexeme),
            )),
        }
    }

    fn evaluate_super(
        &mut self,
        id: ExprId,
        keyword: &Token<'a>,
        method: &Token<'a>,
    ) -> Result<Value<'a>> {
        let distance: usize = *self
            .locals
            .get(&id)
            .ok_or_else(|| undefined_variable(keyword))?;

        let superclass: Rc<LoxClass<'a>> =
            match Environment::get_at(&self.environment, distance, "super") {
                Some(Value::Class(class)) => class,
                _ => return Err(undefined_variable(keyword)),
            };

        // `this` always lives one scope inside the `super` scope.
        let instance = match distance
            .checked_sub(1)
            .and_then(|d| Environment::get_at(&self.environment, d, "this"))
        {
            Some(Value::Instance(instance)) => instance,
            _ => {
                return Err(LoxError::runtime(
                    keyword,
                    "Can't use 'super' outside of a method.",
                ))
            }
        };

        let Some(found) = superclass.find_method(method.lexeme) else {
            return Err(LoxError::runtime(
                method,
                format!("Undefined property '{}'.", method.lexeme),
            ));
        };

        Ok(Value::Function(Rc::new(found.bind(instance))))
    }

    /// The resolver's distance is authoritative; unresolved names are globals.
    fn look_up_variable(&self, id: ExprId, name: &Token<'a>) -> Result<Value<'a>> {
        match self.locals.get(&id) {
            Some(&distance) => Environment::get_at(&self.environment, distance, name.lexeme)
                .ok_or_else(|| undefined_variable(name)),
            None => self.globals.borrow().get(name),
        }
    }

    /// Invokes a callable (native function, user function or class).
    fn invoke_callable(
        &mut self,
        callee_val: &Value<'a>,
        paren: &Token<'a>,
        arguments: Vec<Value<'a>>,
    ) -> Result<Value<'a>> {
        let callable: &dyn Callable<'a> = match callee_val {
            Value::NativeFunction(native) => &**native,
            Value::Function(function) => &**function,
            Value::Class(class) => class,
            _ => {
                return Err(LoxError::runtime(
                    paren,
                    "Can only call functions and classes.",
                ))
            }
        };

        if arguments.len() != callable.arity() {
            return Err(LoxError::runtime(
                paren,
                format!(
                    "Expected {} arguments but got {}.",
                    callable.arity(),
                    arguments.len()
                ),
            ));
        }

        debug!("Calling {} with {} argument(s)", callee_val, arguments.len());

        callable.call(self, arguments)
    }
}

fn undefined_variable(name: &Token<'_>) -> LoxError {
    LoxError::runtime(name, format!("Undefined variable '{}'.", name.lexeme))
}
