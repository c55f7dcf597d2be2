use std::cell::RefCell;
use std::env;
use std::fs;
use std::io::{self, Write};
use std::rc::Rc;

use interpreter::interpreter::Interpreter;
use interpreter::parser::Parser;
use interpreter::stdlib;
use sable_core::Scanner;

fn main() -> io::Result<()> {
    let mut args: Vec<String> = env::args().skip(1).collect();
    let debug = args.iter().any(|arg| arg == "--dbg");
    args.retain(|arg| arg != "--dbg");

    match args.first() {
        Some(path) if args.len() == 1 => run_file(path, debug),
        Some(_) => {
            eprintln!("Usage: sable [script] [--dbg]");
            std::process::exit(64);
        }
        None => repl(),
    }
}

// Batch mode. Every stage's error is reported, but the next stage still
// consumes whatever partial artifact was produced.
fn run_file(path: &str, debug: bool) -> io::Result<()> {
    let source = fs::read_to_string(path)?;
    let stdout: Rc<RefCell<dyn Write>> = Rc::new(RefCell::new(io::stdout()));

    let mut scanner = Scanner::new();
    let scanned = scanner.scan(&source);
    if debug {
        fs::write("tokens.txt", format!("{:#?}\n", scanned.tokens))?;
    }
    if let Some(err) = &scanned.error {
        eprintln!("[{}:{}] lex error: {}", err.line(), err.col(), err);
    }

    let mut parser = Parser::new(&scanned.tokens);
    let parsed = parser.parse();
    if debug {
        fs::write("ast.txt", format!("{:#?}\n", parsed.statements))?;
    }
    if let Some(err) = &parsed.error {
        eprintln!("{}", err);
    }

    let mut interpreter = Interpreter::new();
    let result = interpreter.run(&parsed.statements, stdlib::root(stdout));
    if let Some(err) = result.error {
        eprintln!("{}", err);
    }

    Ok(())
}

// Interactive mode. Each line runs against the environment returned by the
// previous turn, so bindings persist across inputs. A failed stage only
// contributes the statements it completed for this line; nothing stale is
// ever re-executed.
fn repl() -> io::Result<()> {
    let stdout: Rc<RefCell<dyn Write>> = Rc::new(RefCell::new(io::stdout()));
    let mut interpreter = Interpreter::new();
    let mut env = stdlib::root(stdout);

    let stdin = io::stdin();
    let mut line = String::new();

    loop {
        print!("> ");
        io::stdout().flush()?;

        line.clear();
        if stdin.read_line(&mut line)? == 0 {
            return Ok(());
        }

        let mut scanner = Scanner::new();
        let scanned = scanner.scan(&line);
        if let Some(err) = &scanned.error {
            eprintln!("[{}:{}] lex error: {}", err.line(), err.col(), err);
        }

        let mut parser = Parser::new(&scanned.tokens);
        let parsed = parser.parse();
        if let Some(err) = &parsed.error {
            eprintln!("{}", err);
        }

        let result = interpreter.run(&parsed.statements, env);
        env = result.env;
        if let Some(err) = result.error {
            eprintln!("{}", err);
        }
    }
}
