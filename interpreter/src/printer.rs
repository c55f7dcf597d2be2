use sable_core::{Literal, Token};

use crate::ast::{Expr, ExprVisitor, Stmt, StmtVisitor};
use crate::error::Error;
use crate::parser::StmtStream;

/// Renders an AST back to source text. Grouping nodes are preserved by the
/// parser, so the rendering keeps the original precedence and re-parsing it
/// yields a behaviorally equivalent program.
pub(crate) struct AstPrinter {
    indent: usize,
}

impl AstPrinter {
    pub(crate) fn new() -> Self {
        AstPrinter { indent: 0 }
    }

    pub(crate) fn print(&mut self, stmts: &StmtStream) -> String {
        let mut out = String::new();
        for stmt in &stmts.0 {
            out.push_str(&self.render_stmt(stmt));
            out.push('\n');
        }
        out
    }

    // The visitor signatures are fallible for the interpreter's sake; the
    // printer itself never fails.
    fn render_stmt(&mut self, stmt: &Stmt) -> String {
        self.visit_stmt(stmt).unwrap()
    }

    fn render_expr(&mut self, expr: &Expr) -> String {
        self.visit_expr(expr).unwrap()
    }

    fn pad(&self) -> String {
        "    ".repeat(self.indent)
    }

    fn render_block(&mut self, statements: &[Stmt]) -> String {
        let mut out = String::from("{\n");
        self.indent += 1;
        for stmt in statements {
            out.push_str(&self.pad());
            out.push_str(&self.render_stmt(stmt));
            out.push('\n');
        }
        self.indent -= 1;
        out.push_str(&self.pad());
        out.push('}');
        out
    }

    fn quote(value: &str) -> String {
        let mut out = String::from("\"");
        for ch in value.chars() {
            match ch {
                '\\' => out.push_str("\\\\"),
                '"' => out.push_str("\\\""),
                '\n' => out.push_str("\\n"),
                '\t' => out.push_str("\\t"),
                '\r' => out.push_str("\\r"),
                _ => out.push(ch),
            }
        }
        out.push('"');
        out
    }
}

impl ExprVisitor for AstPrinter {
    type Item = String;

    fn visit_assign(&mut self, name: &Token, value: &Expr) -> Result<String, Error> {
        Ok(format!("{} = {}", name.lexeme, self.render_expr(value)))
    }

    fn visit_binary(
        &mut self,
        left: &Expr,
        operator: &Token,
        right: &Expr,
    ) -> Result<String, Error> {
        Ok(format!(
            "{} {} {}",
            self.render_expr(left),
            operator.lexeme,
            self.render_expr(right)
        ))
    }

    fn visit_call(
        &mut self,
        callee: &Expr,
        _: &Token,
        args: &[Expr],
    ) -> Result<String, Error> {
        let args: Vec<String> = args.iter().map(|arg| self.render_expr(arg)).collect();
        Ok(format!("{}({})", self.render_expr(callee), args.join(", ")))
    }

    fn visit_function_expr(
        &mut self,
        _: &Token,
        _: &Option<String>,
        params: &[Token],
        body: &[Stmt],
    ) -> Result<String, Error> {
        // Rendered anonymous; the binding name is carried by the enclosing
        // variable declaration.
        let params: Vec<&str> = params.iter().map(|p| p.lexeme.as_str()).collect();
        Ok(format!(
            "fun ({}) {}",
            params.join(", "),
            self.render_block(body)
        ))
    }

    fn visit_grouping(&mut self, expression: &Expr) -> Result<String, Error> {
        Ok(format!("({})", self.render_expr(expression)))
    }

    fn visit_literal(&mut self, value: &Literal) -> Result<String, Error> {
        Ok(match value {
            Literal::Str(val) => AstPrinter::quote(val),
            Literal::Num(val) => format!("{}", val),
            Literal::Bool(val) => format!("{}", val),
            Literal::Nil => String::from("nil"),
        })
    }

    fn visit_logical(
        &mut self,
        left: &Expr,
        operator: &Token,
        right: &Expr,
    ) -> Result<String, Error> {
        Ok(format!(
            "{} {} {}",
            self.render_expr(left),
            operator.lexeme,
            self.render_expr(right)
        ))
    }

    fn visit_unary(&mut self, operator: &Token, right: &Expr) -> Result<String, Error> {
        Ok(format!("{}{}", operator.lexeme, self.render_expr(right)))
    }

    fn visit_variable(&mut self, name: &Token) -> Result<String, Error> {
        Ok(name.lexeme.clone())
    }
}

impl StmtVisitor for AstPrinter {
    type Item = String;

    fn visit_block(&mut self, statements: &[Stmt]) -> Result<String, Error> {
        Ok(self.render_block(statements))
    }

    fn visit_expression(&mut self, expression: &Expr) -> Result<String, Error> {
        Ok(format!("{};", self.render_expr(expression)))
    }

    fn visit_if(
        &mut self,
        condition: &Expr,
        _: &Token,
        then_branch: &Stmt,
        else_branch: &Stmt,
    ) -> Result<String, Error> {
        Ok(format!(
            "if ({}) {} else {}",
            self.render_expr(condition),
            self.render_stmt(then_branch),
            self.render_stmt(else_branch)
        ))
    }

    fn visit_while(&mut self, condition: &Expr, body: &Stmt, _: &Token) -> Result<String, Error> {
        Ok(format!(
            "while ({}) {}",
            self.render_expr(condition),
            self.render_stmt(body)
        ))
    }

    fn visit_return(&mut self, _: &Token, value: &Expr) -> Result<String, Error> {
        Ok(format!("return {};", self.render_expr(value)))
    }

    fn visit_var(&mut self, name: &Token, init: &Expr) -> Result<String, Error> {
        Ok(format!("var {} = {};", name.lexeme, self.render_expr(init)))
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::str;

    use sable_core::Scanner;

    use crate::interpreter::Interpreter;
    use crate::parser::{Parser, StmtStream};
    use crate::printer::AstPrinter;
    use crate::stdlib;

    fn parse(src: &str) -> StmtStream {
        let mut scanner = Scanner::new();
        let scanned = scanner.scan(src);
        assert_eq!(scanned.error, None);

        let mut parser = Parser::new(&scanned.tokens);
        let parsed = parser.parse();
        assert_eq!(parsed.error, None);
        parsed.statements
    }

    fn run(stmts: &StmtStream) -> String {
        let output: Rc<RefCell<Vec<u8>>> = Rc::new(RefCell::new(Vec::new()));
        let base = stdlib::root(output.clone());
        let mut interpreter = Interpreter::new();
        let result = interpreter.run(stmts, base);
        assert_eq!(result.error, None);
        let printed = String::from(str::from_utf8(&output.borrow()).unwrap());
        printed
    }

    #[test]
    fn test_simple_rendering() {
        let stmts = parse("var x = (1 + 2) * 3;");
        let rendered = AstPrinter::new().print(&stmts);
        assert_eq!(rendered, "var x = (1 + 2) * 3;\n");
    }

    #[test]
    fn test_string_escapes_are_reencoded() {
        let stmts = parse("print(\"a\\tb\\\"c\\\"\");");
        let rendered = AstPrinter::new().print(&stmts);
        assert_eq!(rendered, "print(\"a\\tb\\\"c\\\"\");\n");
    }

    #[test]
    fn test_round_trip_behavior() {
        // Re-lexing and re-parsing the rendering must reproduce the same
        // evaluated behavior, node identity aside.
        let sources = [
            "print((1 + 2) * 5 + 2);",
            "var x = 10; if (x > 5 and x < 20) { print(\"mid\"); } else { print(\"out\"); }",
            "fun fib(n) { if (n < 2) { return n; } return fib(n - 1) + fib(n - 2); } print(fib(12));",
            "var i = 0; while (i < 3) { print(i * i); i = i + 1; }",
            "for (var i = 0; i < 3; i = i + 1) { print(-i); }",
            "fun make_adder(n) { return fun (x) { return x + n; }; } print(make_adder(3)(4));",
        ];

        for src in sources {
            let first = parse(src);
            let rendered = AstPrinter::new().print(&first);
            let second = parse(&rendered);

            assert_eq!(
                run(&first),
                run(&second),
                "behavior diverged after round trip of {:?}, rendered {:?}",
                src,
                rendered
            );
        }
    }
}
