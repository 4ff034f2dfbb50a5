//! A full `check` run over a job description.

use std::path::Path;

use anyhow::Result;

use crate::config::{Config, TrackKind};
use crate::extract::timing::read_segment_timing;
use crate::extract::{
    caption_languages, check_gaps, extract_captions, extract_emsg, validate_captions,
    write_captions,
};
use crate::report::{EmsgEntry, Report, SegmentTimingEntry};

/// Run caption extraction, timing checks and emsg extraction, then write
/// `report.json` into `out_dir`.
pub async fn run_check(config: &Config, out_dir: &Path) -> Result<Report> {
    let mut report = Report::new();

    tracing::info!("Extracting captions...");
    let captions = extract_captions(config).await?;
    let files = if config.output.write_captions {
        write_captions(&captions, &caption_languages(config), out_dir).await?
    } else {
        Vec::new()
    };
    report.add_captions(&captions, &files);
    report.missing_cues = validate_captions(&captions);

    let total: usize = config.representations.iter().map(|r| r.segments.len()).sum();
    tracing::info!("Checking for gaps in {} segments...", total);
    for rep in &config.representations {
        let mut timings = Vec::with_capacity(rep.segments.len());
        for segment in &rep.segments {
            match read_segment_timing(&rep.init, &segment.path).await {
                Ok(timing) => {
                    report.segment_timing.push(SegmentTimingEntry {
                        representation: rep.id.clone(),
                        segment: segment.path.clone(),
                        timing,
                    });
                    timings.push(Some(timing));
                }
                Err(e) => {
                    tracing::warn!("No timing for {:?}: {:#}", segment.path, e);
                    timings.push(None);
                }
            }
        }
        report
            .timing_issues
            .extend(check_gaps(rep, &timings, &config.tolerances));
    }

    tracing::info!("Extracting emsgs...");
    for rep in config
        .representations
        .iter()
        .filter(|r| r.kind == TrackKind::Video)
    {
        for segment in &rep.segments {
            let Ok(data) = tokio::fs::read(&segment.path).await else {
                continue;
            };
            match extract_emsg(&data) {
                Ok(messages) => report.emsg.extend(messages.into_iter().map(|message| EmsgEntry {
                    representation: rep.id.clone(),
                    segment: segment.path.clone(),
                    start_ms: segment.start_ms,
                    message,
                })),
                Err(e) => tracing::warn!("{:#}", e),
            }
        }
    }

    report.write(&out_dir.join("report.json")).await?;
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{RepresentationConfig, SegmentConfig};
    use crate::extract::test_fixtures::{init_segment, media_segment, EDM, EOC, RCL};
    use mediacheck_media::fmp4::build_emsg;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_run_check_writes_report() {
        let temp = tempdir().unwrap();
        let init = temp.path().join("init.mp4");
        std::fs::write(&init, init_segment()).unwrap();

        let first = temp.path().join("1.m4s");
        let mut data = build_emsg("urn:test", "v", 1000, 0, 0, 1, b"hello");
        data.extend(media_segment(1, 0, &[RCL, (b'O', b'k'), EOC]));
        std::fs::write(&first, data).unwrap();
        let second = temp.path().join("2.m4s");
        std::fs::write(&second, media_segment(2, 3, &[EDM])).unwrap();

        let segment = |path: &Path, start_ms: f64| SegmentConfig {
            path: path.to_path_buf(),
            start_ms,
            duration_ms: 1000.0,
            decode_time_ms: Some(start_ms),
            period: "0".to_string(),
        };
        let config = Config {
            representations: vec![RepresentationConfig {
                id: "v1".to_string(),
                kind: TrackKind::Video,
                init,
                captions: Some("CC1".to_string()),
                caption_languages: None,
                segments: vec![segment(&first, 0.0), segment(&second, 3000.0)],
            }],
            ..Default::default()
        };

        let out = temp.path().join("out");
        let report = run_check(&config, &out).await.unwrap();

        assert_eq!(report.captions.len(), 1);
        assert_eq!(report.captions[0].cue_count, 1);
        assert_eq!(report.segment_timing.len(), 2);
        assert_eq!(report.timing_issues.len(), 1);
        assert_eq!(report.emsg.len(), 1);
        assert_eq!(report.emsg[0].message.message_data, "hello");
        assert!(out.join("report.json").exists());
        assert!(out.join("captions").join("captions-CC1_v1.json").exists());
    }
}
