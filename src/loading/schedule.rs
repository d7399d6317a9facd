use super::{DeformationEpisode, EpisodeDuration, SubEpisode};
use crate::base::TimeUnits;
use crate::tensor::Tensor2;
use crate::StrError;
use serde::{Deserialize, Serialize};

/// Holds the ordered sequence of deformation episodes applied to a gridblock
///
/// # Notes
///
/// * Episodes are consumed strictly in sequence
/// * An open-ended episode (`UntilSaturation`) is allowed as the last stage only
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct EpisodeSchedule {
    /// Ordered list of episodes
    pub episodes: Vec<DeformationEpisode>,
}

impl EpisodeSchedule {
    /// Allocates a new empty instance
    pub fn new() -> Self {
        EpisodeSchedule { episodes: Vec::new() }
    }

    /// Appends an episode
    pub fn push(&mut self, episode: DeformationEpisode) -> Result<&mut Self, StrError> {
        if let Some(last) = self.episodes.last() {
            if last.duration_seconds().is_none() {
                return Err("cannot append an episode after an until-saturation episode");
            }
        }
        self.episodes.push(episode);
        Ok(self)
    }

    /// Appends an absolute effective-stress time series as stress-rate episodes
    ///
    /// The series overrides the strain-rate representation: each consecutive
    /// pair of samples becomes one `StressRate` episode whose rate reproduces
    /// the sampled values exactly at the sample times. The first sample is
    /// applied as an absolute initial override.
    pub fn push_stress_series(
        &mut self,
        times: &[f64],
        stresses: &[Tensor2],
        pressures: &[f64],
        time_units: TimeUnits,
    ) -> Result<&mut Self, StrError> {
        if times.len() < 2 {
            return Err("the stress time series needs at least 2 samples");
        }
        if times.len() != stresses.len() || times.len() != pressures.len() {
            return Err("the stress time series arrays must have equal lengths");
        }
        for k in 1..times.len() {
            let dt = times[k] - times[k - 1];
            if dt <= 0.0 {
                return Err("the stress time series times must be strictly increasing");
            }
            let mut rate = stresses[k];
            rate.add(-1.0, &stresses[k - 1]);
            rate.scale(1.0 / dt);
            let pressure_rate = (pressures[k] - pressures[k - 1]) / dt;
            let mut episode =
                DeformationEpisode::from_stress_rate(rate, pressure_rate, EpisodeDuration::Fixed(dt), time_units)?;
            if k == 1 {
                episode.set_initial_overrides(Some(stresses[0]), Some(pressures[0]));
            }
            self.push(episode)?;
        }
        Ok(self)
    }

    /// Returns the number of episodes
    pub fn len(&self) -> usize {
        self.episodes.len()
    }

    /// Returns whether the schedule is empty
    pub fn is_empty(&self) -> bool {
        self.episodes.is_empty()
    }

    /// Returns the cumulative episode end times in seconds
    ///
    /// An open-ended final episode contributes `None` as its end time.
    pub fn boundaries(&self) -> Vec<Option<f64>> {
        let mut out = Vec::with_capacity(self.episodes.len());
        let mut t = 0.0;
        for episode in &self.episodes {
            match episode.duration_seconds() {
                Some(d) => {
                    t += d;
                    out.push(Some(t));
                }
                None => out.push(None),
            }
        }
        out
    }

    /// Returns the total duration in seconds (None when the last episode is open-ended)
    pub fn total_duration(&self) -> Option<f64> {
        let mut t = 0.0;
        for episode in &self.episodes {
            match episode.duration_seconds() {
                Some(d) => t += d,
                None => return None,
            }
        }
        Some(t)
    }

    /// Returns all sub-episode spans as (episode index, start time, duration, overrides) in seconds
    pub fn spans(&self) -> Vec<(usize, f64, Option<f64>, bool)> {
        let mut out = Vec::new();
        let mut episode_start = 0.0;
        for (index, episode) in self.episodes.iter().enumerate() {
            for SubEpisode {
                start_offset,
                duration,
                apply_overrides,
            } in episode.sub_episodes()
            {
                out.push((index, episode_start + start_offset, duration, apply_overrides));
            }
            match episode.duration_seconds() {
                Some(d) => episode_start += d,
                None => break,
            }
        }
        out
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
