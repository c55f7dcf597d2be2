use sable_core::{Literal, Token, Type};

use crate::ast::{Expr, Stmt};
use crate::error::Error;

pub struct Parser<'a> {
    tokens: &'a Vec<Token>,
    current: usize,

    // Stand-in terminator for partial token sequences. A scan aborted by a
    // lex error has no trailing `Eof` token, but its tokens are still fed
    // through the parser.
    eof: Token,
}

// A wrapper over vector of statements to not leak Stmt to public
#[derive(Debug, PartialEq)]
pub struct StmtStream(pub(crate) Vec<Stmt>);

impl StmtStream {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Best-effort parse result. Statements completed before the error are
/// always present; `error` is `None` on a clean parse.
#[derive(Debug, PartialEq)]
pub struct ParseOutput {
    pub statements: StmtStream,
    pub error: Option<Error>,
}

// Helper aliases for shorter return types
type BlockResult = Result<Vec<Stmt>, Error>;
type StmtResult = Result<Stmt, Error>;
type ExprResult = Result<Expr, Error>;

impl<'a> Parser<'a> {
    pub fn new(tokens: &'a Vec<Token>) -> Self {
        let (line, col) = tokens.last().map(|t| (t.line, t.col)).unwrap_or((0, 0));
        Parser {
            tokens,
            current: 0,
            eof: Token::new(Type::Eof, String::new(), line, col, Literal::Nil),
        }
    }

    /// Parses top level statements until the end-of-input token. The first
    /// syntax error abandons the statement under construction and stops the
    /// parse; prior complete statements are kept.
    pub fn parse(&mut self) -> ParseOutput {
        let mut statements = Vec::new();
        let mut error = None;

        while !self.is_at_end() {
            match self.declaration() {
                Ok(stmt) => statements.push(stmt),
                Err(err) => {
                    error = Some(err);
                    break;
                }
            }
        }

        ParseOutput {
            statements: StmtStream(statements),
            error,
        }
    }

    fn declaration(&mut self) -> StmtResult {
        if self.match_one(Type::Fun) {
            self.function_declaration()
        } else if self.match_one(Type::Var) {
            self.var_declaration()
        } else {
            self.statement()
        }
    }

    // `fun name(params) { body }` is sugar for a variable declaration bound
    // to a function literal.
    fn function_declaration(&mut self) -> StmtResult {
        let keyword = self.previous().clone();
        let name = self.consume(Type::Identifier, "function name")?.clone();
        let (params, body) = self.function_rest()?;

        let literal = Expr::function(keyword, Some(name.lexeme.clone()), params, body);
        Ok(Stmt::var(name, literal))
    }

    // Parameter list and body, shared between declarations and literals.
    fn function_rest(&mut self) -> Result<(Vec<Token>, Vec<Stmt>), Error> {
        self.consume(Type::LeftParen, "'(' before parameters")?;

        let mut params = Vec::new();
        if !self.check(Type::RightParen) {
            loop {
                if params.len() >= 255 {
                    return Err(Error::parse(
                        self.peek(),
                        "no more than 255 parameters",
                    ));
                }

                params.push(self.consume(Type::Identifier, "parameter name")?.clone());
                if !self.match_one(Type::Comma) {
                    break;
                }
            }
        }

        self.consume(Type::RightParen, "')' after parameters")?;
        self.consume(Type::LeftBrace, "'{' before function body")?;
        let body = self.block()?;
        Ok((params, body))
    }

    fn var_declaration(&mut self) -> StmtResult {
        let name = self.consume(Type::Identifier, "variable name")?.clone();
        let mut init = Expr::nil();
        if self.match_one(Type::Equal) {
            init = self.expression()?;
        }

        self.consume(Type::SemiColon, "';' after variable declaration")?;
        Ok(Stmt::var(name, init))
    }

    fn statement(&mut self) -> StmtResult {
        if self.match_one(Type::If) {
            self.if_statement()
        } else if self.match_one(Type::Return) {
            self.return_statement()
        } else if self.match_one(Type::While) {
            self.while_statement()
        } else if self.match_one(Type::For) {
            self.for_statement()
        } else if self.match_one(Type::LeftBrace) {
            Ok(Stmt::Block {
                statements: self.block()?,
            })
        } else {
            self.expression_statement()
        }
    }

    fn block(&mut self) -> BlockResult {
        let mut stmts = Vec::new();
        while !self.check(Type::RightBrace) && !self.is_at_end() {
            stmts.push(self.declaration()?);
        }
        self.consume(Type::RightBrace, "'}' after block")?;
        Ok(stmts)
    }

    fn expression_statement(&mut self) -> StmtResult {
        let expr = self.expression()?;
        self.consume(Type::SemiColon, "';' after expression")?;
        Ok(Stmt::expression(expr))
    }

    fn if_statement(&mut self) -> StmtResult {
        let token = self.previous().clone();
        self.consume(Type::LeftParen, "'(' after 'if'")?;
        let condition = self.expression()?;
        self.consume(Type::RightParen, "')' after if condition")?;

        let then_branch = self.statement()?;
        let mut else_branch = Stmt::block(Vec::new());
        if self.match_one(Type::Else) {
            else_branch = self.statement()?;
        }

        Ok(Stmt::if_(condition, token, then_branch, else_branch))
    }

    fn while_statement(&mut self) -> StmtResult {
        let token = self.previous().clone();
        self.consume(Type::LeftParen, "'(' after 'while'")?;
        let condition = self.expression()?;
        self.consume(Type::RightParen, "')' after while condition")?;
        let body = self.statement()?;
        Ok(Stmt::while_(condition, body, token))
    }

    fn for_statement(&mut self) -> StmtResult {
        let token = self.previous().clone();
        self.consume(Type::LeftParen, "'(' after 'for'")?;

        let initializer = if self.match_one(Type::SemiColon) {
            Stmt::block(Vec::new())
        } else if self.match_one(Type::Var) {
            self.var_declaration()?
        } else {
            self.expression_statement()?
        };

        let condition = if !self.check(Type::SemiColon) {
            self.expression()?
        } else {
            Expr::literal(true)
        };
        self.consume(Type::SemiColon, "';' after loop condition")?;

        let increment = if !self.check(Type::RightParen) {
            Some(self.expression()?)
        } else {
            None
        };
        self.consume(Type::RightParen, "')' after for clauses")?;

        let mut while_body = vec![self.statement()?];
        if let Some(increment) = increment {
            while_body.push(Stmt::expression(increment));
        }

        Ok(Stmt::block(vec![
            // initialise the variables first
            initializer,
            // after that, it's just a normal while loop
            Stmt::while_(condition, Stmt::block(while_body), token),
        ]))
    }

    fn return_statement(&mut self) -> StmtResult {
        let keyword = self.previous().clone();
        let mut value = Expr::nil();
        if !self.check(Type::SemiColon) {
            value = self.expression()?;
        }

        self.consume(Type::SemiColon, "';' after return value")?;
        Ok(Stmt::return_(keyword, value))
    }

    fn expression(&mut self) -> ExprResult {
        self.assignment()
    }

    fn assignment(&mut self) -> ExprResult {
        let expr = self.or_expression()?;
        if self.match_one(Type::Equal) {
            let equals = self.previous().clone();
            let value = self.assignment()?;

            match expr {
                Expr::Variable { name } => Ok(Expr::assign(name, value)),
                _ => Err(Error::parse(&equals, "assignment target")),
            }
        } else {
            Ok(expr)
        }
    }

    fn or_expression(&mut self) -> ExprResult {
        let mut expr = self.and_expression()?;
        while self.match_one(Type::Or) {
            let operator = self.previous().clone();
            let right = self.and_expression()?;
            expr = Expr::logical(expr, operator, right);
        }
        Ok(expr)
    }

    fn and_expression(&mut self) -> ExprResult {
        let mut expr = self.equality()?;
        while self.match_one(Type::And) {
            let operator = self.previous().clone();
            let right = self.equality()?;
            expr = Expr::logical(expr, operator, right);
        }
        Ok(expr)
    }

    fn equality(&mut self) -> ExprResult {
        let mut expr = self.comparison()?;
        while self.match_either(&[Type::BangEqual, Type::EqualEqual]) {
            let operator = self.previous().clone();
            let right = self.comparison()?;
            expr = Expr::binary(expr, operator, right);
        }
        Ok(expr)
    }

    fn comparison(&mut self) -> ExprResult {
        let mut expr = self.term()?;
        while self.match_either(&[
            Type::Greater,
            Type::GreaterEqual,
            Type::Less,
            Type::LessEqual,
        ]) {
            let operator = self.previous().clone();
            let right = self.term()?;
            expr = Expr::binary(expr, operator, right);
        }
        Ok(expr)
    }

    fn term(&mut self) -> ExprResult {
        let mut expr = self.factor()?;
        while self.match_either(&[Type::Plus, Type::Minus]) {
            let operator = self.previous().clone();
            let right = self.factor()?;
            expr = Expr::binary(expr, operator, right);
        }
        Ok(expr)
    }

    fn factor(&mut self) -> ExprResult {
        let mut expr = self.unary()?;
        while self.match_either(&[Type::Slash, Type::Star]) {
            let operator = self.previous().clone();
            let right = self.unary()?;
            expr = Expr::binary(expr, operator, right);
        }
        Ok(expr)
    }

    fn unary(&mut self) -> ExprResult {
        if self.match_either(&[Type::Bang, Type::Minus]) {
            let operator = self.previous().clone();
            Ok(Expr::unary(operator, self.unary()?))
        } else {
            self.call()
        }
    }

    fn call(&mut self) -> ExprResult {
        let mut expr = self.primary()?;
        while self.match_one(Type::LeftParen) {
            expr = self.finish_call(expr)?;
        }
        Ok(expr)
    }

    fn finish_call(&mut self, callee: Expr) -> ExprResult {
        let mut args: Vec<Expr> = Vec::new();
        if !self.check(Type::RightParen) {
            loop {
                if args.len() >= 255 {
                    return Err(Error::parse(self.peek(), "no more than 255 arguments"));
                }

                args.push(self.expression()?);
                if !self.match_one(Type::Comma) {
                    break;
                }
            }
        }

        let paren = self.consume(Type::RightParen, "')' after arguments")?;
        Ok(Expr::call(callee, paren.clone(), args))
    }

    fn primary(&mut self) -> ExprResult {
        if self.match_either(&[Type::True, Type::False, Type::Nil, Type::Number, Type::String]) {
            Ok(Expr::Literal {
                value: self.previous().value.clone(),
            })
        } else if self.match_one(Type::LeftParen) {
            let expr = self.expression()?;
            self.consume(Type::RightParen, "')' after expression")?;
            Ok(Expr::grouping(expr))
        } else if self.match_one(Type::Identifier) {
            Ok(Expr::variable(self.previous().clone()))
        } else if self.match_one(Type::Fun) {
            // anonymous function literal
            let keyword = self.previous().clone();
            let (params, body) = self.function_rest()?;
            Ok(Expr::function(keyword, None, params, body))
        } else {
            Err(Error::parse(self.peek(), "expression"))
        }
    }

    fn is_at_end(&self) -> bool {
        self.peek().ty == Type::Eof
    }

    fn check(&self, ty: Type) -> bool {
        if self.is_at_end() {
            false
        } else {
            self.peek().ty == ty
        }
    }

    fn consume(&mut self, ty: Type, expected: &str) -> Result<&Token, Error> {
        if self.check(ty) {
            Ok(self.advance())
        } else {
            Err(Error::parse(self.peek(), expected))
        }
    }

    fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.current += 1;
        }

        self.previous()
    }

    fn peek(&self) -> &Token {
        self.tokens.get(self.current).unwrap_or(&self.eof)
    }

    fn previous(&self) -> &Token {
        self.tokens
            .get(self.current.saturating_sub(1))
            .unwrap_or(&self.eof)
    }

    fn match_either(&mut self, types: &[Type]) -> bool {
        for ty in types {
            if self.match_one(*ty) {
                // Already skipped in the `match_one`, just return result
                return true;
            }
        }

        false
    }

    fn match_one(&mut self, ty: Type) -> bool {
        if self.check(ty) {
            self.advance();
            true
        } else {
            false
        }
    }
}
