pub mod ast_printer;
pub mod callable;
pub mod class;
pub mod environment;
pub mod error;
pub mod interpreter;
pub mod parser;
pub mod resolver;
pub mod scanner;
pub mod token;
pub mod value;

use std::io::Write;

use log::info;

use error::Diagnostics;
use interpreter::Interpreter;
use parser::Parser;
use resolver::Resolver;

/// One interpreter session: Scanner → Parser → Resolver → Interpreter.
///
/// Globals and closures persist across [`Lox::run`] calls, which is what the
/// REPL relies on.  Each call reports into a fresh [`Diagnostics`].
pub struct Lox<'a> {
    interpreter: Interpreter<'a>,
    next_expr_id: usize,
}

impl<'a> Default for Lox<'a> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> Lox<'a> {
    /// Session printing to stdout.
    pub fn new() -> Self {
        Self::with_interpreter(Interpreter::new())
    }

    /// Session printing to `output`.
    pub fn with_output(output: Box<dyn Write + 'a>) -> Self {
        Self::with_interpreter(Interpreter::with_output(output))
    }

    fn with_interpreter(interpreter: Interpreter<'a>) -> Self {
        Self {
            interpreter,
            next_expr_id: 0,
        }
    }

    /// Run one chunk of source.  Static errors skip execution entirely; a
    /// runtime error stops it at the failing statement.
    pub fn run(&mut self, source: &'a str) -> Diagnostics {
        let mut diagnostics = Diagnostics::new();

        let tokens = scanner::scan_tokens(source, &mut diagnostics);

        let mut parser = Parser::new(tokens).with_first_id(self.next_expr_id);
        let statements = parser.parse(&mut diagnostics);
        self.next_expr_id = parser.next_id();

        if diagnostics.had_error() {
            info!("Static errors found, skipping resolution");
            return diagnostics;
        }

        Resolver::new(&mut self.interpreter).resolve(&statements, &mut diagnostics);

        if diagnostics.had_error() {
            info!("Resolution errors found, skipping execution");
            return diagnostics;
        }

        if let Err(e) = self.interpreter.interpret(&statements) {
            diagnostics.report(e);
        }

        diagnostics
    }
}

/// Run `source` in a fresh session and return everything it printed.
pub fn run_capture(source: &str) -> (String, Diagnostics) {
    let mut buffer: Vec<u8> = Vec::new();

    let diagnostics = {
        let mut lox = Lox::with_output(Box::new(&mut buffer));
        lox.run(source)
    };

    (String::from_utf8_lossy(&buffer).into_owned(), diagnostics)
}
