//! The JSON report written by a `check` run.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;

use crate::extract::{Captions, EventMessage, MissingCue, SegmentTiming, TimingIssue};

#[derive(Debug, Clone, Serialize)]
pub struct CaptionStreamSummary {
    pub key: String,
    pub stream: String,
    pub representation: String,
    pub cue_count: usize,
    pub file: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SegmentTimingEntry {
    pub representation: String,
    pub segment: PathBuf,
    #[serde(flatten)]
    pub timing: SegmentTiming,
}

#[derive(Debug, Clone, Serialize)]
pub struct EmsgEntry {
    pub representation: String,
    pub segment: PathBuf,
    pub start_ms: f64,
    #[serde(flatten)]
    pub message: EventMessage,
}

#[derive(Debug, Default, Serialize)]
pub struct Report {
    pub captions: Vec<CaptionStreamSummary>,
    pub missing_cues: Vec<MissingCue>,
    pub segment_timing: Vec<SegmentTimingEntry>,
    pub timing_issues: Vec<TimingIssue>,
    pub emsg: Vec<EmsgEntry>,
}

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record caption streams along with the files they were written to.
    pub fn add_captions(&mut self, captions: &Captions, files: &[PathBuf]) {
        for (key, stream) in captions {
            let file = files
                .iter()
                .find(|f| {
                    f.file_name()
                        .and_then(|n| n.to_str())
                        .is_some_and(|n| n.ends_with(&format!("{}.json", key)))
                })
                .cloned();
            self.captions.push(CaptionStreamSummary {
                key: key.clone(),
                stream: stream.stream.clone(),
                representation: stream.representation.clone(),
                cue_count: stream.cues.len(),
                file,
            });
        }
    }

    pub fn has_issues(&self) -> bool {
        !self.missing_cues.is_empty() || !self.timing_issues.is_empty()
    }

    /// Write the report as pretty-printed JSON.
    pub async fn write(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create {:?}", parent))?;
        }
        let json = serde_json::to_vec_pretty(self)?;
        tokio::fs::write(path, json)
            .await
            .with_context(|| format!("Failed to write report: {:?}", path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::CaptionStream;
    use mediacheck_common::Cue;

    #[test]
    fn test_add_captions_links_files() {
        let mut captions = Captions::new();
        captions.insert(
            "CC1_v1".to_string(),
            CaptionStream {
                stream: "CC1".to_string(),
                representation: "v1".to_string(),
                cues: vec![Cue::new(0.0, 1.0, "CC1")],
            },
        );
        let files = vec![PathBuf::from("/out/captions/captions-eng-CC1_v1.json")];

        let mut report = Report::new();
        report.add_captions(&captions, &files);
        assert_eq!(report.captions.len(), 1);
        assert_eq!(report.captions[0].cue_count, 1);
        assert_eq!(report.captions[0].file, Some(files[0].clone()));
        assert!(!report.has_issues());
    }

    #[test]
    fn test_report_serializes_tagged_issues() {
        let mut report = Report::new();
        report.timing_issues.push(TimingIssue::Gap {
            representation: "v1".to_string(),
            expected_start_ms: 2000.0,
            previous_start_ms: 0.0,
            start_ms: 2500.0,
        });
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["timing_issues"][0]["type"], "gap");
        assert!(report.has_issues());
    }
}
