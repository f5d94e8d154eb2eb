//! Source synthesis: turn an effect graph into the text of one pixel program.

pub(crate) mod builder;
pub(crate) mod emit;
pub(crate) mod error;
pub mod names;
pub(crate) mod scope;
