//! Effect graph model: typed variables, effects, and the container arena that owns them.

pub(crate) mod container;
pub(crate) mod effect;
pub(crate) mod error;
pub(crate) mod events;
pub(crate) mod variable;
