//! Centralised error hierarchy for the **Lox interpreter**.
//!
//! All subsystems (scanner, parser, resolver, runtime, CLI) convert their
//! internal failure modes into one of the variants defined here.  Static
//! errors are collected into a [`Diagnostics`] accumulator that is threaded
//! through every stage, so the driving shell inspects one value instead of
//! process-wide flags.
//!
//! The module **does not** print diagnostics itself

use std::io;
use thiserror::Error;

use log::{debug, info};

use crate::token::{Token, TokenType};

/// Canonical error type used throughout the interpreter.
#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum LoxError {
    /// Lexical (scanner) error with source line information.
    #[error("[line {line}] Error{location}: {message}")]
    Lex {
        /// Human‑readable description.
        message: String,

        /// Always empty for lexical errors; kept for a uniform rendering.
        location: String,

        /// 1‑based line where the error occurred.
        line: usize,
    },

    /// Syntactic (parser) error.
    #[error("[line {line}] Error{location}: {message}")]
    Parse {
        message: String,
        location: String,
        line: usize,
    },

    /// Static‑analysis or resolution failure (e.g. early‑binding errors).
    #[error("[line {line}] Error{location}: {message}")]
    Resolve {
        message: String,
        location: String,
        line: usize,
    },

    /// Runtime evaluation error.  Fatal to the run that raised it.
    #[error("{message}\n[line {line}]")]
    Runtime { message: String, line: usize },

    /// Failure writing `print` output.  Stored as its message so the enum
    /// stays `Clone + PartialEq`; ends the run like a runtime error.
    #[error("{0}")]
    Io(String),
}

impl From<io::Error> for LoxError {
    fn from(err: io::Error) -> Self {
        LoxError::Io(err.to_string())
    }
}

/// `" at end"` for the EOF token, `" at 'lexeme'"` otherwise.
fn location_of(token: &Token<'_>) -> String {
    match token.token_type {
        TokenType::EOF => " at end".to_string(),
        _ => format!(" at '{}'", token.lexeme),
    }
}

impl LoxError {
    /// Helper constructor for the **scanner**.
    pub fn lex<S: Into<String>>(line: usize, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Lex error: line={}, msg={}", line, message);

        LoxError::Lex {
            message,
            location: String::new(),
            line,
        }
    }

    /// Helper constructor for the **parser**, positioned at `token`.
    pub fn parse<S: Into<String>>(token: &Token<'_>, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Parse error: line={}, msg={}", token.line, message);

        LoxError::Parse {
            message,
            location: location_of(token),
            line: token.line,
        }
    }

    /// Helper constructor for the **resolver**, positioned at `token`.
    pub fn resolve<S: Into<String>>(token: &Token<'_>, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Resolve error: line={}, msg={}", token.line, message);

        LoxError::Resolve {
            message,
            location: location_of(token),
            line: token.line,
        }
    }

    /// Helper constructor for the **interpreter**; carries the offending token's line.
    pub fn runtime<S: Into<String>>(token: &Token<'_>, msg: S) -> Self {
        let message: String = msg.into();

        debug!("Creating Runtime error: line={}, msg={}", token.line, message);

        LoxError::Runtime {
            message,
            line: token.line,
        }
    }

    /// Source line the error points at, when it has one.
    pub fn line(&self) -> Option<usize> {
        match self {
            LoxError::Lex { line, .. }
            | LoxError::Parse { line, .. }
            | LoxError::Resolve { line, .. }
            | LoxError::Runtime { line, .. } => Some(*line),
            LoxError::Io(_) => None,
        }
    }

    /// The bare message without line/location decoration.
    pub fn message(&self) -> String {
        match self {
            LoxError::Lex { message, .. }
            | LoxError::Parse { message, .. }
            | LoxError::Resolve { message, .. }
            | LoxError::Runtime { message, .. } => message.clone(),
            LoxError::Io(msg) => msg.clone(),
        }
    }

    /// Static errors block execution; runtime and output errors end it.
    pub fn is_runtime(&self) -> bool {
        matches!(self, LoxError::Runtime { .. } | LoxError::Io(_))
    }
}

/// Crate‑wide `Result` alias.
pub type Result<T> = std::result::Result<T, LoxError>;

/// Errors collected over one pass of the pipeline.
///
/// Lexical, syntax and resolution errors are individually non‑fatal and pile
/// up here; at most one runtime error is ever recorded because it halts the run.
#[derive(Debug, Default, Clone)]
pub struct Diagnostics {
    errors: Vec<LoxError>,
    runtime_error: Option<LoxError>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an error.  Runtime errors after the first are ignored.
    pub fn report(&mut self, error: LoxError) {
        debug!("Diagnostic reported: {}", error);

        if error.is_runtime() {
            if self.runtime_error.is_none() {
                self.runtime_error = Some(error);
            }
        } else {
            self.errors.push(error);
        }
    }

    /// Did scanning, parsing or resolving report anything?
    pub fn had_error(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn had_runtime_error(&self) -> bool {
        self.runtime_error.is_some()
    }

    /// Static errors in the order they were reported.
    pub fn errors(&self) -> &[LoxError] {
        &self.errors
    }

    pub fn runtime_error(&self) -> Option<&LoxError> {
        self.runtime_error.as_ref()
    }

    /// Every recorded error, static ones first.
    pub fn iter(&self) -> impl Iterator<Item = &LoxError> {
        self.errors.iter().chain(self.runtime_error.iter())
    }

    /// Conventional sysexits: 65 for bad input, 70 for a failed run.
    pub fn exit_code(&self) -> i32 {
        if self.had_error() {
            65
        } else if self.had_runtime_error() {
            70
        } else {
            0
        }
    }
}
