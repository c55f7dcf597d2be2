use sable_core::Token;
use thiserror::Error;

use crate::value::Value;

#[derive(Debug, Error, PartialEq, Clone)]
pub enum Error {
    #[error("[{line}:{col}] parse error: expected {expected}, found {found}")]
    Parse {
        line: usize,
        col: usize,
        expected: String,
        found: String,
    },

    #[error("[{line}:{col}] undefined name '{name}'")]
    UndefinedName {
        line: usize,
        col: usize,
        name: String,
    },

    #[error("[{line}:{col}] type error: {msg}")]
    Type { line: usize, col: usize, msg: String },

    #[error("[{line}:{col}] expected {expected} arguments but got {found}")]
    Arity {
        line: usize,
        col: usize,
        expected: usize,
        found: usize,
    },

    #[error("[{line}:{col}] arithmetic error: {msg}")]
    Arithmetic { line: usize, col: usize, msg: String },

    // Internal unwinding channel for `return`; never escapes a `run` call.
    #[error("return value")]
    Return(ReturnValue),
}

#[derive(Debug, PartialEq, Clone)]
pub struct ReturnValue {
    pub(crate) value: Value,
}

impl Error {
    pub(crate) fn parse(token: &Token, expected: &str) -> Self {
        let found = match token.lexeme.as_str() {
            "" => String::from("end of input"),
            lexeme => format!("'{}'", lexeme),
        };

        Error::Parse {
            line: token.line,
            col: token.col,
            expected: String::from(expected),
            found,
        }
    }

    pub(crate) fn undefined_name(token: &Token) -> Self {
        Error::UndefinedName {
            line: token.line,
            col: token.col,
            name: token.lexeme.clone(),
        }
    }

    pub(crate) fn type_error(token: &Token, msg: &str) -> Self {
        Error::Type {
            line: token.line,
            col: token.col,
            msg: String::from(msg),
        }
    }

    pub(crate) fn arity(token: &Token, expected: usize, found: usize) -> Self {
        Error::Arity {
            line: token.line,
            col: token.col,
            expected,
            found,
        }
    }

    pub(crate) fn arithmetic(token: &Token, msg: &str) -> Self {
        Error::Arithmetic {
            line: token.line,
            col: token.col,
            msg: String::from(msg),
        }
    }

    pub(crate) fn return_value(value: Value) -> Self {
        Error::Return(ReturnValue { value })
    }
}
