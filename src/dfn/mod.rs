//! Implements the explicit discrete fracture network generator

mod generator;
mod geometry;
pub use crate::dfn::generator::*;
pub use crate::dfn::geometry::*;
