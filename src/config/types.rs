use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub output: OutputConfig,

    #[serde(default)]
    pub limits: LimitsConfig,

    #[serde(default)]
    pub tolerances: ToleranceConfig,

    #[serde(default)]
    pub representations: Vec<RepresentationConfig>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OutputConfig {
    /// Directory receiving `report.json` and the `captions/` tree
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,

    /// Write one JSON file per caption stream
    #[serde(default = "default_true")]
    pub write_captions: bool,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("./mediacheck-output")
}

fn default_true() -> bool {
    true
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
            write_captions: default_true(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LimitsConfig {
    /// Representations decoded at the same time
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Budget for reading and decoding one segment (default: 30)
    #[serde(default = "default_segment_timeout")]
    pub segment_timeout_secs: u64,
}

fn default_concurrency() -> usize {
    4
}

fn default_segment_timeout() -> u64 {
    30
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            segment_timeout_secs: default_segment_timeout(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ToleranceConfig {
    /// Allowed distance between a segment start and the previous segment end
    #[serde(default = "default_gap_ms")]
    pub gap_ms: f64,

    /// Allowed difference between manifest and media decode times or durations
    #[serde(default = "default_mismatch_ms")]
    pub mismatch_ms: f64,
}

fn default_gap_ms() -> f64 {
    100.0
}

fn default_mismatch_ms() -> f64 {
    10.0
}

impl Default for ToleranceConfig {
    fn default() -> Self {
        Self {
            gap_ms: default_gap_ms(),
            mismatch_ms: default_mismatch_ms(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackKind {
    #[default]
    Video,
    Audio,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RepresentationConfig {
    pub id: String,

    #[serde(default)]
    pub kind: TrackKind,

    /// Init segment path
    pub init: PathBuf,

    /// Caption scheme URI or HLS INSTREAM-ID (`CC1`, `SERVICE1`)
    #[serde(default)]
    pub captions: Option<String>,

    /// Accessibility value mapping streams to languages (`CC1=eng;CC3=spa`)
    #[serde(default)]
    pub caption_languages: Option<String>,

    #[serde(default)]
    pub segments: Vec<SegmentConfig>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SegmentConfig {
    pub path: PathBuf,

    /// Manifest start time
    pub start_ms: f64,

    /// Manifest duration
    pub duration_ms: f64,

    /// Decode time announced by the manifest, when it has one
    #[serde(default)]
    pub decode_time_ms: Option<f64>,

    #[serde(default = "default_period")]
    pub period: String,
}

fn default_period() -> String {
    "0".to_string()
}
