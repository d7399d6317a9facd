use serde::{Deserialize, Serialize};

/// Number of seconds in a year (365.25 days)
pub const SECONDS_PER_YEAR: f64 = 31_557_600.0;

/// Defines the time units of a deformation episode
#[derive(Clone, Copy, Debug, Eq, PartialEq, Deserialize, Serialize)]
pub enum TimeUnits {
    /// SI seconds
    Seconds,

    /// Years (365.25 days)
    Years,

    /// Million years
    MegaYears,
}

impl TimeUnits {
    /// Returns the conversion factor from this unit to seconds
    pub fn to_seconds(&self) -> f64 {
        match self {
            TimeUnits::Seconds => 1.0,
            TimeUnits::Years => SECONDS_PER_YEAR,
            TimeUnits::MegaYears => SECONDS_PER_YEAR * 1e6,
        }
    }
}

/// Defines how the initial horizontal effective stress is derived from the vertical stress
#[derive(Clone, Copy, Debug, PartialEq, Deserialize, Serialize)]
pub enum InitialStressRelaxation {
    /// Uniaxial-strain ratio `σh' = ν/(1−ν)・σv'`
    Uniaxial,

    /// Critically stressed crust: `σh' = σv'/Kp` with `Kp = (√(1+μ²)+μ)²`
    Critical,

    /// User-supplied ratio `σh' = k0・σv'`
    User(f64),
}

/// Defines whether a cell searches neighboring cells for stress-shadow interaction
#[derive(Clone, Copy, Debug, Eq, PartialEq, Deserialize, Serialize)]
pub enum SearchAdjacentGridblocks {
    /// Never search neighbors
    None,

    /// Always search neighbors
    All,

    /// Search neighbors across open boundaries only; faulted boundaries decouple the cells
    Automatic,
}

/// Defines the nature of a boundary between two adjacent gridblocks
///
/// Recorded on the west and south boundaries of each cell only; the east and
/// north values are read from the neighboring cell's west/south flags.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Deserialize, Serialize)]
pub enum BoundaryKind {
    /// Fractures may propagate across the boundary
    Open,

    /// A fault: fractures always terminate at the boundary
    Faulted,
}

/// Defines the mechanical behavior of the cell's lateral boundaries
///
/// Only the rigid behavior is implemented; a ductile value is accepted in
/// configuration files and falls back to rigid with a warning.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Deserialize, Serialize)]
pub enum BoundaryDeformation {
    /// Rigid lateral boundaries (the applied strain is fully transmitted)
    Rigid,

    /// Ductile/viscous lateral boundaries (not implemented; treated as rigid)
    Ductile,
}

/// Defines the macroscopic displacement sense of a fracture set
#[derive(Clone, Copy, Debug, Eq, PartialEq, Deserialize, Serialize)]
pub enum SlipSense {
    /// Dilatant (mode I) opening
    Dilatant,

    /// Normal (extensional) shear
    Normal,

    /// Reverse (compressional) shear
    Reverse,
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::{TimeUnits, SECONDS_PER_YEAR};

    #[test]
    fn time_unit_conversion_works() {
        assert_eq!(TimeUnits::Seconds.to_seconds(), 1.0);
        assert_eq!(TimeUnits::Years.to_seconds(), SECONDS_PER_YEAR);
        assert_eq!(TimeUnits::MegaYears.to_seconds(), SECONDS_PER_YEAR * 1e6);
    }
}
