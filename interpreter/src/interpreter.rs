use std::cell::RefCell;
use std::rc::Rc;
use std::slice;

use sable_core::{Literal, Token, Type};

use crate::ast::{Expr, ExprVisitor, Stmt, StmtVisitor};
use crate::callable::Function;
use crate::env::Environment;
use crate::error::Error;
use crate::parser::StmtStream;
use crate::value::Value;

pub struct Interpreter {
    env: Rc<RefCell<Environment>>,
}

/// Result of one `run` call. `env` is the frame that received the program's
/// top level bindings; it is returned even when `error` is set, so side
/// effects of statements executed before the failure stay observable and a
/// REPL can keep threading it.
pub struct RunOutput {
    pub env: Rc<RefCell<Environment>>,
    pub error: Option<Error>,
}

impl Interpreter {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Interpreter {
            env: Rc::new(RefCell::new(Environment::new())),
        }
    }

    /// Executes the statements in order against a fresh child of `base`.
    /// `base` itself (typically the standard library root) is never written.
    /// Execution is fail-fast: the first runtime error aborts the rest of
    /// the sequence, with no rollback of earlier statements.
    pub fn run(&mut self, stmts: &StmtStream, base: Rc<RefCell<Environment>>) -> RunOutput {
        let top = Environment::child(base);
        self.env = Rc::clone(&top);

        let mut error = None;
        for stmt in &stmts.0 {
            match self.visit_stmt(stmt) {
                Ok(()) => {}
                // A top level `return` ends the program; its value is
                // discarded.
                Err(Error::Return(_)) => break,
                Err(err) => {
                    error = Some(err);
                    break;
                }
            }
        }

        RunOutput { env: top, error }
    }

    pub(crate) fn execute_block_with_env(
        &mut self,
        stmts: &[Stmt],
        env: Rc<RefCell<Environment>>,
    ) -> Result<(), Error> {
        let current = self.env.clone();
        self.env = env;
        for stmt in stmts {
            if let err @ Err(_) = self.visit_stmt(stmt) {
                self.env = current;
                return err;
            }
        }
        self.env = current;
        Ok(())
    }

    fn numeric_operands(
        &self,
        operator: &Token,
        left: Value,
        right: Value,
    ) -> Result<(f64, f64), Error> {
        match (left, right) {
            (Value::Num(left), Value::Num(right)) => Ok((left, right)),
            _ => Err(Error::type_error(operator, "operands must be numbers")),
        }
    }
}

impl ExprVisitor for Interpreter {
    type Item = Value;

    fn visit_assign(&mut self, name: &Token, value: &Expr) -> Result<Value, Error> {
        let value = self.visit_expr(value)?;

        let assigned = self
            .env
            .borrow_mut()
            .assign(&name.lexeme, value.clone())
            .is_ok();
        if assigned {
            // Assignment is an expression; its value is the assigned value.
            Ok(value)
        } else {
            Err(Error::undefined_name(name))
        }
    }

    fn visit_binary(
        &mut self,
        left: &Expr,
        operator: &Token,
        right: &Expr,
    ) -> Result<Value, Error> {
        let left = self.visit_expr(left)?;
        let right = self.visit_expr(right)?;

        match operator.ty {
            Type::Plus => match (left, right) {
                (Value::Num(left), Value::Num(right)) => Ok(Value::Num(left + right)),
                (Value::Str(left), Value::Str(right)) => {
                    Ok(Value::from(String::from(left.as_str()) + &right))
                }
                _ => Err(Error::type_error(
                    operator,
                    "operands must be two numbers or two strings",
                )),
            },
            Type::Minus => {
                let (left, right) = self.numeric_operands(operator, left, right)?;
                Ok(Value::Num(left - right))
            }
            Type::Star => {
                let (left, right) = self.numeric_operands(operator, left, right)?;
                Ok(Value::Num(left * right))
            }
            Type::Slash => {
                let (left, right) = self.numeric_operands(operator, left, right)?;
                if right == 0.0 {
                    Err(Error::arithmetic(operator, "division by zero"))
                } else {
                    Ok(Value::Num(left / right))
                }
            }
            Type::Greater => self.compare(operator, left, right, |ord| ord.is_gt()),
            Type::GreaterEqual => self.compare(operator, left, right, |ord| ord.is_ge()),
            Type::Less => self.compare(operator, left, right, |ord| ord.is_lt()),
            Type::LessEqual => self.compare(operator, left, right, |ord| ord.is_le()),
            Type::EqualEqual => Ok(Value::Bool(left == right)),
            Type::BangEqual => Ok(Value::Bool(left != right)),
            _ => Err(Error::type_error(operator, "invalid binary operator")),
        }
    }

    fn visit_call(
        &mut self,
        callee: &Expr,
        paren: &Token,
        args: &[Expr],
    ) -> Result<Value, Error> {
        let callee = self.visit_expr(callee)?;
        let mut evaluated_args = Vec::new();
        for arg in args {
            evaluated_args.push(self.visit_expr(arg)?);
        }

        match callee {
            Value::Callable(func) => {
                if func.arity() != evaluated_args.len() {
                    return Err(Error::arity(paren, func.arity(), evaluated_args.len()));
                }
                func.call(self, paren, &evaluated_args)
            }
            _ => Err(Error::type_error(paren, "can only call functions")),
        }
    }

    fn visit_function_expr(
        &mut self,
        _: &Token,
        name: &Option<String>,
        params: &[Token],
        body: &[Stmt],
    ) -> Result<Value, Error> {
        // The closure captures the environment active at the definition
        // site; free variables resolve there at call time.
        let function = Function::new(self.env.clone(), name.clone(), params, body);
        Ok(Value::Callable(Rc::new(function)))
    }

    fn visit_grouping(&mut self, expression: &Expr) -> Result<Value, Error> {
        self.visit_expr(expression)
    }

    fn visit_literal(&mut self, value: &Literal) -> Result<Value, Error> {
        Ok(Value::from(value.clone()))
    }

    fn visit_logical(
        &mut self,
        left: &Expr,
        operator: &Token,
        right: &Expr,
    ) -> Result<Value, Error> {
        let left = self.visit_expr(left)?;

        // Short-circuit: the right operand is only evaluated when the left
        // one does not already decide the result. The deciding operand's
        // value is returned as-is.
        if operator.ty == Type::Or {
            if left.is_truthy() {
                return Ok(left);
            }
        } else if !left.is_truthy() {
            return Ok(left);
        }

        self.visit_expr(right)
    }

    fn visit_unary(&mut self, operator: &Token, right: &Expr) -> Result<Value, Error> {
        let right = self.visit_expr(right)?;
        match (operator.ty, right) {
            (Type::Minus, Value::Num(val)) => Ok(Value::Num(-val)),
            (Type::Minus, _) => Err(Error::type_error(operator, "operand must be a number")),
            (Type::Bang, val) => Ok(Value::Bool(!val.is_truthy())),
            _ => Err(Error::type_error(operator, "invalid unary operator")),
        }
    }

    fn visit_variable(&mut self, name: &Token) -> Result<Value, Error> {
        match self.env.borrow().get(&name.lexeme) {
            Some(value) => Ok(value),
            None => Err(Error::undefined_name(name)),
        }
    }
}

impl Interpreter {
    fn compare(
        &self,
        operator: &Token,
        left: Value,
        right: Value,
        check: fn(std::cmp::Ordering) -> bool,
    ) -> Result<Value, Error> {
        let ord = match (left, right) {
            (Value::Num(left), Value::Num(right)) => left.partial_cmp(&right),
            (Value::Str(left), Value::Str(right)) => Some(left.cmp(&right)),
            _ => {
                return Err(Error::type_error(
                    operator,
                    "operands must be two numbers or two strings",
                ))
            }
        };

        // NaN comparisons are simply false.
        Ok(Value::Bool(ord.map(check).unwrap_or(false)))
    }
}

impl StmtVisitor for Interpreter {
    type Item = ();

    fn visit_block(&mut self, statements: &[Stmt]) -> Result<(), Error> {
        let env = Environment::child(self.env.clone());
        self.execute_block_with_env(statements, env)
    }

    fn visit_expression(&mut self, expression: &Expr) -> Result<(), Error> {
        self.visit_expr(expression)?;
        Ok(())
    }

    fn visit_if(
        &mut self,
        condition: &Expr,
        _: &Token,
        then_branch: &Stmt,
        else_branch: &Stmt,
    ) -> Result<(), Error> {
        if self.visit_expr(condition)?.is_truthy() {
            self.visit_stmt(then_branch)
        } else {
            self.visit_stmt(else_branch)
        }
    }

    fn visit_while(&mut self, condition: &Expr, body: &Stmt, _: &Token) -> Result<(), Error> {
        while self.visit_expr(condition)?.is_truthy() {
            // Each iteration gets its own frame so declarations made in one
            // pass do not leak into the next.
            let env = Environment::child(self.env.clone());
            self.execute_block_with_env(slice::from_ref(body), env)?;
        }
        Ok(())
    }

    fn visit_return(&mut self, _: &Token, value: &Expr) -> Result<(), Error> {
        let value = self.visit_expr(value)?;
        Err(Error::return_value(value))
    }

    fn visit_var(&mut self, name: &Token, init: &Expr) -> Result<(), Error> {
        let value = self.visit_expr(init)?;
        self.env.borrow_mut().define(&name.lexeme, value);
        Ok(())
    }
}
