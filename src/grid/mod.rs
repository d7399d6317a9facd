//! Implements the gridblock cell and the global fracture grid

mod cornerpoints;
mod fracture_grid;
mod gridblock;
pub use crate::grid::cornerpoints::*;
pub use crate::grid::fracture_grid::*;
pub use crate::grid::gridblock::*;
