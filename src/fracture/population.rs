use crate::StrError;
use serde::{Deserialize, Serialize};

/// Holds the population densities recorded at the end of one timestep
///
/// Density measures follow the Dershowitz P-system: P30 is count per volume,
/// P32 is area per volume, P33 is volume fraction.
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize)]
pub struct TimestepRecord {
    /// End time of the timestep (s)
    pub time: f64,

    /// Volumetric density of macrofractures still propagating (1/m³)
    pub active_mfp30: f64,

    /// Volumetric density of macrofractures deactivated by stress shadows (1/m³)
    pub static_relay_mfp30: f64,

    /// Volumetric density of macrofractures deactivated by intersection (1/m³)
    pub static_intersect_mfp30: f64,

    /// Total macrofracture volumetric density (1/m³)
    pub total_mfp30: f64,

    /// Total macrofracture area density (1/m)
    pub total_mfp32: f64,

    /// Total macrofracture volume fraction at the implicit aperture
    pub total_mfp33: f64,

    /// Microfracture area density (1/m)
    pub micro_p32: f64,

    /// Fracture porosity at the implicit aperture
    pub porosity: f64,
}

/// Holds the append-only time-indexed history of a fracture dip set
///
/// Owned exclusively by its gridblock; the host grid loop only reads
/// finalized records by timestep index.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct PopulationSeries {
    records: Vec<TimestepRecord>,
}

impl PopulationSeries {
    /// Allocates a new empty instance
    pub fn new() -> Self {
        PopulationSeries { records: Vec::new() }
    }

    /// Appends a record; times must be non-decreasing
    pub fn push(&mut self, record: TimestepRecord) -> Result<(), StrError> {
        if let Some(last) = self.records.last() {
            if record.time < last.time {
                return Err("timestep records must be appended in time order");
            }
        }
        self.records.push(record);
        Ok(())
    }

    /// Returns the number of recorded timesteps
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns whether no timestep has been recorded yet
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Returns the record at a timestep index
    pub fn get(&self, index: usize) -> Result<&TimestepRecord, StrError> {
        self.records.get(index).ok_or("timestep index out of range")
    }

    /// Returns the last record, if any
    pub fn last(&self) -> Option<&TimestepRecord> {
        self.records.last()
    }

    /// Returns the latest timestep index whose recorded time is ≤ the query time
    ///
    /// Binary search, O(log n). Returns None when the query time precedes the
    /// first record.
    pub fn timestep_index_for(&self, time: f64) -> Option<usize> {
        let upper = self.records.partition_point(|r| r.time <= time);
        if upper == 0 {
            None
        } else {
            Some(upper - 1)
        }
    }

    /// Returns all recorded end times
    pub fn times(&self) -> impl Iterator<Item = f64> + '_ {
        self.records.iter().map(|r| r.time)
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::{PopulationSeries, TimestepRecord};
    use crate::StrError;

    fn record(time: f64) -> TimestepRecord {
        TimestepRecord {
            time,
            ..Default::default()
        }
    }

    #[test]
    fn push_rejects_out_of_order_records() -> Result<(), StrError> {
        let mut series = PopulationSeries::new();
        series.push(record(1.0))?;
        series.push(record(1.0))?;
        assert_eq!(
            series.push(record(0.5)).err(),
            Some("timestep records must be appended in time order")
        );
        Ok(())
    }

    #[test]
    fn index_by_time_finds_latest_record() -> Result<(), StrError> {
        let mut series = PopulationSeries::new();
        for t in [1.0, 2.0, 4.0, 8.0] {
            series.push(record(t))?;
        }
        assert_eq!(series.timestep_index_for(0.5), None);
        assert_eq!(series.timestep_index_for(1.0), Some(0));
        assert_eq!(series.timestep_index_for(3.9), Some(1));
        assert_eq!(series.timestep_index_for(4.0), Some(2));
        assert_eq!(series.timestep_index_for(100.0), Some(3));
        assert_eq!(series.get(2)?.time, 4.0);
        assert_eq!(series.get(9).err(), Some("timestep index out of range"));
        Ok(())
    }
}
