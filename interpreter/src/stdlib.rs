use std::cell::RefCell;
use std::io::Write;
use std::rc::Rc;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::callable::{BoxedFunction, Native};
use crate::env::Environment;
use crate::value::Value;

/// Builds a fresh standard library root frame. By convention nothing writes
/// to this frame afterwards; the interpreter puts top level bindings in a
/// child of it. Program output goes to the injected writer so hosts and
/// tests can capture it.
pub fn root(stdout: Rc<RefCell<dyn Write>>) -> Rc<RefCell<Environment>> {
    let env = Rc::new(RefCell::new(Environment::new()));

    let print_out = stdout.clone();
    let print: BoxedFunction = Box::new(move |args| {
        writeln!(RefCell::borrow_mut(&print_out), "{}", args[0])
            .map_err(|err| err.to_string())?;
        Ok(Value::Nil)
    });
    define_native(&env, "print", print, 1);

    let clock: BoxedFunction = Box::new(|_| {
        let since_epoch = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|err| err.to_string())?;
        Ok(Value::Num(since_epoch.as_secs_f64()))
    });
    define_native(&env, "clock", clock, 0);

    let sqrt: BoxedFunction = Box::new(|args| match args[0] {
        Value::Num(n) => Ok(Value::Num(n.sqrt())),
        _ => Err(String::from("sqrt expects a number")),
    });
    define_native(&env, "sqrt", sqrt, 1);

    let str_fn: BoxedFunction = Box::new(|args| Ok(Value::from(args[0].to_string())));
    define_native(&env, "str", str_fn, 1);

    let len: BoxedFunction = Box::new(|args| match &args[0] {
        Value::Str(s) => Ok(Value::Num(s.chars().count() as f64)),
        _ => Err(String::from("len expects a string")),
    });
    define_native(&env, "len", len, 1);

    env.borrow_mut()
        .define("PI", Value::Num(std::f64::consts::PI));

    env
}

fn define_native(
    env: &Rc<RefCell<Environment>>,
    name: &str,
    func: BoxedFunction,
    arity: usize,
) {
    let native = Native::new(func, String::from(name), arity);
    env.borrow_mut()
        .define(name, Value::Callable(Rc::new(native)));
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use crate::stdlib;
    use crate::value::Value;

    #[test]
    fn test_root_bindings_present() {
        let out: Rc<RefCell<Vec<u8>>> = Rc::new(RefCell::new(Vec::new()));
        let root = stdlib::root(out);

        for name in ["print", "clock", "sqrt", "str", "len"] {
            match root.borrow().get(name) {
                Some(Value::Callable(_)) => {}
                other => panic!("expected native '{}', found {:?}", name, other),
            }
        }

        assert_eq!(
            root.borrow().get("PI"),
            Some(Value::Num(std::f64::consts::PI))
        );
    }
}
