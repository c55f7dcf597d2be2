use std::rc::Rc;

use sable_core::{Literal, Token};

use crate::error::Error;

// Tokens are cloned into the nodes that need them for runtime diagnostics.
// They are cheap enough and the cloning happens only during parsing.

#[derive(Debug, PartialEq)]
pub(crate) enum Expr {
    Assign {
        name: Token,
        value: Box<Expr>,
    },
    Binary {
        left: Box<Expr>,
        operator: Token,
        right: Box<Expr>,
    },
    Call {
        callee: Box<Expr>,
        paren: Token,
        args: Vec<Expr>,
    },
    // A function literal. Named when it comes from a function declaration
    // (which is sugar for `var name = fun ...`), anonymous otherwise.
    Function {
        keyword: Token,
        name: Option<String>,
        params: Vec<Token>,
        body: Vec<Stmt>,
    },
    Grouping {
        expression: Box<Expr>,
    },
    Literal {
        value: Literal,
    },
    Logical {
        left: Box<Expr>,
        operator: Token,
        right: Box<Expr>,
    },
    Unary {
        operator: Token,
        right: Box<Expr>,
    },
    Variable {
        name: Token,
    },
}

pub(crate) trait ExprVisitor {
    type Item;

    fn visit_expr(&mut self, expr: &Expr) -> Result<Self::Item, Error> {
        match expr {
            Expr::Assign { name, value } => self.visit_assign(name, value),
            Expr::Binary {
                left,
                operator,
                right,
            } => self.visit_binary(left, operator, right),
            Expr::Call {
                callee,
                paren,
                args,
            } => self.visit_call(callee, paren, args),
            Expr::Function {
                keyword,
                name,
                params,
                body,
            } => self.visit_function_expr(keyword, name, params, body),
            Expr::Grouping { expression } => self.visit_grouping(expression),
            Expr::Literal { value } => self.visit_literal(value),
            Expr::Logical {
                left,
                operator,
                right,
            } => self.visit_logical(left, operator, right),
            Expr::Unary { operator, right } => self.visit_unary(operator, right),
            Expr::Variable { name } => self.visit_variable(name),
        }
    }

    fn visit_assign(&mut self, name: &Token, value: &Expr) -> Result<Self::Item, Error>;
    fn visit_binary(
        &mut self,
        left: &Expr,
        operator: &Token,
        right: &Expr,
    ) -> Result<Self::Item, Error>;
    fn visit_call(
        &mut self,
        callee: &Expr,
        paren: &Token,
        args: &[Expr],
    ) -> Result<Self::Item, Error>;
    fn visit_function_expr(
        &mut self,
        keyword: &Token,
        name: &Option<String>,
        params: &[Token],
        body: &[Stmt],
    ) -> Result<Self::Item, Error>;
    fn visit_grouping(&mut self, expression: &Expr) -> Result<Self::Item, Error>;
    fn visit_literal(&mut self, value: &Literal) -> Result<Self::Item, Error>;
    fn visit_logical(
        &mut self,
        left: &Expr,
        operator: &Token,
        right: &Expr,
    ) -> Result<Self::Item, Error>;
    fn visit_unary(&mut self, operator: &Token, right: &Expr) -> Result<Self::Item, Error>;
    fn visit_variable(&mut self, name: &Token) -> Result<Self::Item, Error>;
}

#[allow(dead_code)]
impl Expr {
    pub(crate) fn nil() -> Self {
        Expr::Literal {
            value: Literal::Nil,
        }
    }

    pub(crate) fn assign(name: Token, value: Expr) -> Self {
        Expr::Assign {
            name,
            value: Box::new(value),
        }
    }

    pub(crate) fn binary(left: Expr, operator: Token, right: Expr) -> Self {
        Expr::Binary {
            left: Box::new(left),
            operator,
            right: Box::new(right),
        }
    }

    pub(crate) fn call(callee: Expr, paren: Token, args: Vec<Expr>) -> Self {
        Expr::Call {
            callee: Box::new(callee),
            paren,
            args,
        }
    }

    pub(crate) fn function(
        keyword: Token,
        name: Option<String>,
        params: Vec<Token>,
        body: Vec<Stmt>,
    ) -> Self {
        Expr::Function {
            keyword,
            name,
            params,
            body,
        }
    }

    pub(crate) fn grouping(expression: Expr) -> Self {
        Expr::Grouping {
            expression: Box::new(expression),
        }
    }

    pub(crate) fn literal<T>(value: T) -> Self
    where
        Literal: From<T>,
    {
        Expr::Literal {
            value: Literal::from(value),
        }
    }

    pub(crate) fn logical(left: Expr, operator: Token, right: Expr) -> Self {
        Expr::Logical {
            left: Box::new(left),
            operator,
            right: Box::new(right),
        }
    }

    pub(crate) fn unary(operator: Token, right: Expr) -> Self {
        Expr::Unary {
            operator,
            right: Box::new(right),
        }
    }

    pub(crate) fn variable(name: Token) -> Self {
        Expr::Variable { name }
    }
}

#[derive(Debug, PartialEq, Clone)]
pub(crate) enum Stmt {
    Block {
        statements: Vec<Stmt>,
    },
    Expression {
        expression: Rc<Expr>,
    },
    If {
        condition: Rc<Expr>,
        token: Token,
        then_branch: Rc<Stmt>,
        else_branch: Rc<Stmt>,
    },
    While {
        condition: Rc<Expr>,
        body: Rc<Stmt>,
        token: Token,
    },
    Return {
        keyword: Token,
        value: Rc<Expr>,
    },
    Var {
        name: Token,
        init: Rc<Expr>,
    },
}

pub(crate) trait StmtVisitor {
    type Item;

    fn visit_stmt(&mut self, stmt: &Stmt) -> Result<Self::Item, Error> {
        match stmt {
            Stmt::Block { statements } => self.visit_block(statements),
            Stmt::Expression { expression } => self.visit_expression(expression),
            Stmt::If {
                condition,
                token,
                then_branch,
                else_branch,
            } => self.visit_if(condition, token, then_branch, else_branch),
            Stmt::While {
                condition,
                body,
                token,
            } => self.visit_while(condition, body, token),
            Stmt::Return { keyword, value } => self.visit_return(keyword, value),
            Stmt::Var { name, init } => self.visit_var(name, init),
        }
    }

    fn visit_block(&mut self, statements: &[Stmt]) -> Result<Self::Item, Error>;
    fn visit_expression(&mut self, expression: &Expr) -> Result<Self::Item, Error>;
    fn visit_if(
        &mut self,
        condition: &Expr,
        token: &Token,
        then_branch: &Stmt,
        else_branch: &Stmt,
    ) -> Result<Self::Item, Error>;
    fn visit_while(
        &mut self,
        condition: &Expr,
        body: &Stmt,
        token: &Token,
    ) -> Result<Self::Item, Error>;
    fn visit_return(&mut self, keyword: &Token, value: &Expr) -> Result<Self::Item, Error>;
    fn visit_var(&mut self, name: &Token, init: &Expr) -> Result<Self::Item, Error>;
}

#[allow(dead_code)]
impl Stmt {
    pub(crate) fn block(statements: Vec<Stmt>) -> Self {
        Stmt::Block { statements }
    }

    pub(crate) fn expression(expression: Expr) -> Self {
        Stmt::Expression {
            expression: Rc::new(expression),
        }
    }

    pub(crate) fn if_(condition: Expr, token: Token, then_branch: Stmt, else_branch: Stmt) -> Self {
        Stmt::If {
            condition: Rc::new(condition),
            token,
            then_branch: Rc::new(then_branch),
            else_branch: Rc::new(else_branch),
        }
    }

    pub(crate) fn while_(condition: Expr, body: Stmt, token: Token) -> Self {
        Stmt::While {
            condition: Rc::new(condition),
            body: Rc::new(body),
            token,
        }
    }

    pub(crate) fn return_(keyword: Token, value: Expr) -> Self {
        Stmt::Return {
            keyword,
            value: Rc::new(value),
        }
    }

    pub(crate) fn var(name: Token, init: Expr) -> Self {
        Stmt::Var {
            name,
            init: Rc::new(init),
        }
    }
}
