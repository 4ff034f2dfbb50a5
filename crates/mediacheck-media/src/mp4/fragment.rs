//! Per-sample resolution for movie fragments.
//!
//! A trun row may omit its size or duration, in which case the value comes
//! from the traf's tfhd defaults and then from the init segment's trex.

use super::{Tfhd, Trex, Trun};

/// A fragment sample with every default applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FragmentSample {
    /// Sample index within the run (0-based).
    pub index: u32,
    /// Sample size in bytes.
    pub size: u32,
    /// Sample duration in track timescale units.
    pub duration: u32,
    /// Decode timestamp in track timescale units.
    pub decode_time: u64,
    /// Composition time offset (for PTS calculation).
    pub composition_time_offset: i64,
}

impl FragmentSample {
    /// Presentation timestamp in track timescale units.
    pub fn presentation_time(&self) -> i64 {
        self.decode_time as i64 + self.composition_time_offset
    }

    /// Presentation time in seconds.
    pub fn presentation_secs(&self, timescale: u32) -> f64 {
        self.presentation_time() as f64 / f64::from(timescale.max(1))
    }
}

/// Defaults that apply to trun rows missing a field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SampleDefaults {
    pub duration: Option<u32>,
    pub size: Option<u32>,
}

impl SampleDefaults {
    /// Merge tfhd defaults over trex defaults.
    pub fn new(tfhd: Option<&Tfhd>, trex: Option<&Trex>) -> Self {
        Self {
            duration: tfhd
                .and_then(|t| t.default_sample_duration)
                .or(trex.map(|t| t.default_sample_duration)),
            size: tfhd
                .and_then(|t| t.default_sample_size)
                .or(trex.map(|t| t.default_sample_size)),
        }
    }
}

/// Resolve every row of `trun` starting at `base_media_decode_time`.
pub fn resolve_samples(
    trun: &Trun,
    defaults: SampleDefaults,
    base_media_decode_time: u64,
) -> Vec<FragmentSample> {
    let mut decode_time = base_media_decode_time;
    trun.samples
        .iter()
        .enumerate()
        .map(|(index, row)| {
            let duration = row.duration.or(defaults.duration).unwrap_or(0);
            let sample = FragmentSample {
                index: index as u32,
                size: row.size.or(defaults.size).unwrap_or(0),
                duration,
                decode_time,
                composition_time_offset: row.composition_time_offset.unwrap_or(0),
            };
            decode_time += u64::from(duration);
            sample
        })
        .collect()
}

/// Sum of resolved sample durations.
pub fn total_duration(trun: &Trun, defaults: SampleDefaults) -> u64 {
    trun.samples
        .iter()
        .map(|row| u64::from(row.duration.or(defaults.duration).unwrap_or(0)))
        .sum()
}
