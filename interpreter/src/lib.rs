pub mod callable;
pub mod env;
pub mod error;
pub mod interpreter;
pub mod parser;
pub mod stdlib;
pub mod value;

pub(crate) mod ast;
pub(crate) mod printer;
