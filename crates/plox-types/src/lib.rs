#![deny(unused_must_use)]
#![warn(clippy::dbg_macro, clippy::todo, clippy::unimplemented)]
#![forbid(unsafe_code)]

mod checker;
pub mod scope;

#[cfg(test)]
mod checker_tests;

pub use checker::{TypeChecker, TypeError, MAX_EVAL_DEPTH};
pub use plox_ast::ast::TypeTag;
pub use scope::ScopeChain;
