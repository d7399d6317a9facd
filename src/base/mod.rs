//! Implements the base structures shared by the growth engine and the DFN generator

mod control;
mod enums;
mod progress;
pub use crate::base::control::*;
pub use crate::base::enums::*;
pub use crate::base::progress::*;
