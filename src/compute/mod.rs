//! Computational modules: the spatial index and input validation.

pub mod spatial;
pub mod validation;
