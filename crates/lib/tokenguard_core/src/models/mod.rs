//! Domain models.

pub mod credential;
