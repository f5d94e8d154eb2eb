//! The pixel program language that synthesized sources are written in.
//!
//! A program is a header (`program`, `use`, `channels`, `params`, `progress` directives)
//! followed by sections in loop nesting order, from `@fields` to `@after_loop`. Programs are
//! lexed, parsed and resolved once into a [`ProgramTemplate`](resolve::ProgramTemplate) of
//! stack bytecode; each picture then instantiates the template with its parameters.

pub(crate) mod ast;
pub(crate) mod bytecode;
pub(crate) mod error;
pub(crate) mod exec;
pub(crate) mod lexer;
pub(crate) mod noise;
pub(crate) mod parser;
pub(crate) mod resolve;
pub(crate) mod vm;
