//! Makes available common structures needed to run a simulation
//!
//! You may write `use fracsim::prelude::*` in your code and obtain
//! access to commonly used functionality.

pub use crate::base::{
    BoundaryDeformation, BoundaryKind, InitialStressRelaxation, ProgressMonitor, PropagationControl,
    SearchAdjacentGridblocks, SlipSense, TimeUnits,
};
pub use crate::dfn::{DfnGenerationConfig, DfnGenerator, GlobalDfn, Macrofracture, Microfracture, StageSelection, TipState};
pub use crate::fracture::{ApertureContext, ApertureModel, DipSetStatus, FractureDipSet, FractureSet, SetInteraction};
pub use crate::grid::{CornerPoints, FractureGrid, Gridblock, GridblockConfig, RunSummary};
pub use crate::loading::{DeformationEpisode, EpisodeDuration, EpisodeLoad, EpisodeSchedule};
pub use crate::mechanics::{MechanicalProperties, StressStrainState};
pub use crate::tensor::{Tensor2, Tensor4};
pub use crate::StrError;
