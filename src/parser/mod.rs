//! Parser for brace templates (`"Hello {name}"`)

pub mod ast;
mod grammar;
pub mod lexer;

pub use ast::*;
pub use grammar::parse;
