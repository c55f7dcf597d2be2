use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::value::Value;

/// One scope frame: name bindings plus a link to the enclosing frame.
/// Frames are shared through `Rc` so a closure keeps its defining chain
/// alive after the block that created it has exited.
#[derive(Debug)]
pub struct Environment {
    enclosing: Option<Rc<RefCell<Environment>>>,
    values: HashMap<String, Value>,
}

// Marker for a failed assignment; the interpreter attaches the offending
// token and converts this into a positioned error.
#[derive(Debug, PartialEq)]
pub(crate) struct UndefinedVariable;

impl Environment {
    pub fn new() -> Self {
        Environment {
            enclosing: None,
            values: HashMap::new(),
        }
    }

    pub fn with(enclosing: Rc<RefCell<Environment>>) -> Self {
        Environment {
            enclosing: Some(enclosing),
            values: HashMap::new(),
        }
    }

    /// Creates a fresh frame enclosed by `parent`, shared and ready to be
    /// handed to block or call execution.
    pub fn child(parent: Rc<RefCell<Environment>>) -> Rc<RefCell<Environment>> {
        Rc::new(RefCell::new(Environment::with(parent)))
    }

    // Redefinition in the same frame overwrites the previous binding, so
    // redeclaring a top level variable in a REPL session just works.
    pub fn define(&mut self, key: &str, value: Value) {
        self.values.insert(String::from(key), value);
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        if let Some(val) = self.values.get(key) {
            Some(val.clone())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.as_ref().borrow().get(key)
        } else {
            None
        }
    }

    // Updates the nearest frame that already binds `key`. Assignment never
    // implicitly declares.
    pub(crate) fn assign(&mut self, key: &str, value: Value) -> Result<(), UndefinedVariable> {
        if let Some(val) = self.values.get_mut(key) {
            *val = value;
            Ok(())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.as_ref().borrow_mut().assign(key, value)
        } else {
            Err(UndefinedVariable)
        }
    }
}

impl Default for Environment {
    fn default() -> Self {
        Environment::new()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use crate::env::{Environment, UndefinedVariable};
    use crate::value::Value;

    #[test]
    fn test_define_and_get() {
        let mut env = Environment::new();
        env.define("foo", Value::from("bar"));
        env.define("baz", Value::from(false));

        assert_eq!(env.get("foo"), Some(Value::from("bar")));
        assert_eq!(env.get("baz"), Some(Value::from(false)));
    }

    #[test]
    fn test_redefine_overwrites_in_same_frame() {
        let mut env = Environment::new();
        env.define("foo", Value::from(1));
        env.define("foo", Value::from("two"));

        assert_eq!(env.get("foo"), Some(Value::from("two")));
    }

    #[test]
    fn test_assign_fails_if_undefined() {
        let mut env = Environment::new();
        assert_eq!(
            Err(UndefinedVariable),
            env.assign("foo", Value::from("bar"))
        );
        assert_eq!(None, env.get("foo"));
    }

    #[test]
    fn test_shadowing_and_assignment_across_frames() {
        let outer = Rc::new(RefCell::new(Environment::new()));
        outer.borrow_mut().define("foo", Value::from("bar"));
        outer.borrow_mut().define("count", Value::from(0));

        {
            let inner = Environment::child(outer.clone());
            inner.borrow_mut().define("foo", Value::from("shadowed"));
            assert_eq!(inner.borrow().get("foo"), Some(Value::from("shadowed")));

            // Assignment to a name bound only in the enclosing frame updates
            // it there.
            inner
                .borrow_mut()
                .assign("count", Value::from(10))
                .unwrap();
        }

        assert_eq!(outer.borrow().get("foo"), Some(Value::from("bar")));
        assert_eq!(outer.borrow().get("count"), Some(Value::from(10)));
    }
}
