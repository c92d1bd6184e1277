//! Request handlers.

pub mod token;
