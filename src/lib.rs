//! Fracsim - fracture network growth simulator
//!
//! This crate implements a statistical fracture-population growth engine for
//! 3D rock volumes subjected to time-varying mechanical, thermal and
//! fluid-pressure loading, plus an explicit discrete-fracture-network (DFN)
//! generator that converts the statistical population into polygonal
//! fracture geometry consistent across neighboring grid cells.

/// Defines a type alias for the error type as a static string
pub type StrError = &'static str;

pub mod base;
pub mod dfn;
pub mod fracture;
pub mod grid;
pub mod loading;
pub mod mechanics;
pub mod prelude;
pub mod tensor;
