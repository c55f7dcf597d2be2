use std::cell::RefCell;
use std::rc::Rc;
use std::str;

use interpreter::error::Error;
use interpreter::interpreter::{Interpreter, RunOutput};
use interpreter::parser::{ParseOutput, Parser};
use interpreter::stdlib;
use interpreter::value::Value;
use sable_core::{ScanOutput, Scanner};

struct Pipeline {
    scanned: ScanOutput,
    parsed: ParseOutput,
    result: RunOutput,
    printed: String,
}

// Drives all three stages the way the batch driver does: each stage
// consumes the previous stage's partial artifact regardless of errors.
fn run_pipeline(src: &str) -> Pipeline {
    let mut scanner = Scanner::new();
    let scanned = scanner.scan(src);

    let mut parser = Parser::new(&scanned.tokens);
    let parsed = parser.parse();

    let output: Rc<RefCell<Vec<u8>>> = Rc::new(RefCell::new(Vec::new()));
    let base = stdlib::root(output.clone());
    let mut interpreter = Interpreter::new();
    let result = interpreter.run(&parsed.statements, base);

    let printed = String::from(str::from_utf8(&output.borrow()).unwrap());
    Pipeline {
        scanned,
        parsed,
        result,
        printed,
    }
}

#[test]
fn test_clean_program_runs_end_to_end() {
    let out = run_pipeline(
        "fun add(a, b) { return a + b; }\n\
         print(add(2, 3));",
    );

    assert_eq!(out.scanned.error, None);
    assert_eq!(out.parsed.error, None);
    assert_eq!(out.result.error, None);
    assert_eq!(out.printed, "5\n");
}

#[test]
fn test_lex_error_still_runs_prior_statements() {
    // The unterminated string aborts scanning, but the statements formed
    // from the tokens before it still parse and run.
    let out = run_pipeline("print(1); var s = \"oops");

    assert!(matches!(
        out.scanned.error,
        Some(sable_core::Error::UnterminatedString { .. })
    ));
    assert!(out.parsed.error.is_some());
    assert_eq!(out.printed, "1\n");
}

#[test]
fn test_parse_error_still_runs_prior_statements() {
    let out = run_pipeline("var a = 2; print(a); var b = ;");

    assert_eq!(out.scanned.error, None);
    assert!(matches!(out.parsed.error, Some(Error::Parse { .. })));
    assert_eq!(out.parsed.statements.len(), 2);
    assert_eq!(out.printed, "2\n");
    assert_eq!(out.result.error, None);
}

#[test]
fn test_declaration_binds_in_returned_env() {
    let out = run_pipeline("var x = 1 + 2 * 3;");
    assert_eq!(out.result.env.borrow().get("x"), Some(Value::from(7)));
}

#[test]
fn test_block_scope_not_visible_at_top_level() {
    let out = run_pipeline("if (true) { var y = 1; }");
    assert_eq!(out.result.error, None);
    assert_eq!(out.result.env.borrow().get("y"), None);
}

#[test]
fn test_undefined_function_parses_but_fails_at_runtime() {
    let out = run_pipeline("foo(1);");

    assert_eq!(out.parsed.error, None);
    assert!(matches!(
        out.result.error,
        Some(Error::UndefinedName { ref name, .. }) if name == "foo"
    ));
}

#[test]
fn test_interactive_session_threads_environment() {
    let output: Rc<RefCell<Vec<u8>>> = Rc::new(RefCell::new(Vec::new()));
    let mut interpreter = Interpreter::new();
    let mut env = stdlib::root(output.clone());
    let mut scanner = Scanner::new();

    // A failed line contributes nothing but keeps the session state; later
    // lines still see everything defined before it.
    let lines = [
        "var count = 0;",
        "count = count + 1;",
        "count = count + oops;",
        "print(count);",
    ];

    for line in lines {
        let scanned = scanner.scan(line);
        let mut parser = Parser::new(&scanned.tokens);
        let parsed = parser.parse();
        let result = interpreter.run(&parsed.statements, env);
        env = result.env;
    }

    assert_eq!(str::from_utf8(&output.borrow()).unwrap(), "1\n");
}
