//! CLI command implementations.

mod send;

pub(crate) use send::SendArgs;
