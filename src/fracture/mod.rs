//! Implements the statistical fracture-population growth state machine

mod aperture;
mod dip_set;
mod fracture_set;
mod micro_population;
mod population;
pub use crate::fracture::aperture::*;
pub use crate::fracture::dip_set::*;
pub use crate::fracture::fracture_set::*;
pub use crate::fracture::micro_population::*;
pub use crate::fracture::population::*;
