use std::cell::RefCell;
use std::fmt::{Debug, Formatter};
use std::rc::Rc;

use sable_core::Token;

use crate::ast::Stmt;
use crate::env::Environment;
use crate::error::Error;
use crate::interpreter::Interpreter;
use crate::value::Value;

/// Anything invocable from sable code. `paren` is the call site's closing
/// parenthesis, used to position errors raised by the callee itself.
pub trait Callable {
    fn name(&self) -> &str;
    fn arity(&self) -> usize;
    fn call(
        self: Rc<Self>,
        interpreter: &mut Interpreter,
        paren: &Token,
        args: &[Value],
    ) -> Result<Value, Error>;
}

impl Debug for dyn Callable {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.name().is_empty() {
            write!(f, "<fn>")
        } else {
            write!(f, "<fn {}>", self.name())
        }
    }
}

// Natives report failures as bare messages; the position is attached at the
// call site since a host function has no source location of its own.
pub(crate) type BoxedFunction = Box<dyn Fn(&[Value]) -> Result<Value, String>>;

// Bridges native rust functions into the interpreter environment. All of
// these trait objects live in the standard library root frame.
pub(crate) struct Native {
    func: BoxedFunction,
    name: String,
    arity: usize,
}

impl Native {
    pub(crate) fn new(func: BoxedFunction, name: String, arity: usize) -> Self {
        Self { func, name, arity }
    }
}

impl Callable for Native {
    fn name(&self) -> &str {
        &self.name
    }

    fn arity(&self) -> usize {
        self.arity
    }

    fn call(
        self: Rc<Self>,
        _: &mut Interpreter,
        paren: &Token,
        args: &[Value],
    ) -> Result<Value, Error> {
        (self.func)(args).map_err(|msg| Error::type_error(paren, &msg))
    }
}

// A user function value: parameter list, body and the environment captured
// at the definition site. The call frame is always chained to that captured
// environment, never to the caller's.
#[derive(Debug)]
pub(crate) struct Function {
    closure: Rc<RefCell<Environment>>,
    name: Option<String>,
    params: Vec<Token>,
    body: Vec<Stmt>,
}

impl Function {
    // The body statements are cloned out of the AST here. Statements hold
    // their expressions behind `Rc`, so the clone is shallow.
    pub(crate) fn new(
        closure: Rc<RefCell<Environment>>,
        name: Option<String>,
        params: &[Token],
        body: &[Stmt],
    ) -> Self {
        Function {
            closure,
            name,
            params: Vec::from(params),
            body: Vec::from(body),
        }
    }
}

impl Callable for Function {
    fn name(&self) -> &str {
        self.name.as_deref().unwrap_or("")
    }

    fn arity(&self) -> usize {
        self.params.len()
    }

    fn call(
        self: Rc<Self>,
        interpreter: &mut Interpreter,
        _: &Token,
        args: &[Value],
    ) -> Result<Value, Error> {
        let env = Environment::child(Rc::clone(&self.closure));
        for (param, arg) in self.params.iter().zip(args) {
            env.borrow_mut().define(&param.lexeme, arg.clone());
        }

        // A `return` in the body unwinds through the error channel; falling
        // off the end yields nil.
        match interpreter.execute_block_with_env(&self.body, env) {
            Ok(()) => Ok(Value::Nil),
            Err(Error::Return(value)) => Ok(value.value),
            Err(err) => Err(err),
        }
    }
}
