//! Implements the deformation-episode loading history

mod deformation_episode;
mod schedule;
pub use crate::loading::deformation_episode::*;
pub use crate::loading::schedule::*;
