//! Segment timing read from `tfdt`/`trun` and the per-representation gap check.

use anyhow::{Context, Result};
use mediacheck_media::mp4::{children, parse_tfdt, parse_tfhd, parse_trun, total_duration};
use mediacheck_media::mp4::{SampleDefaults, Tfhd, Trun};
use mediacheck_media::{read_track_timescales, BoxParser, ParsedBox, TrackTimescales};
use serde::Serialize;

use crate::config::{RepresentationConfig, SegmentConfig, ToleranceConfig};

/// Timescale assumed when the init segment does not describe the track.
pub const DEFAULT_TIMESCALE: u32 = 1000;

/// Decode time and duration of one media segment, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SegmentTiming {
    pub decode_time_ms: f64,
    pub duration_ms: f64,
}

#[derive(Default)]
struct FragmentTimes {
    tfhd: Option<Tfhd>,
    base_media_decode_time: u64,
    truns: Vec<Trun>,
}

fn on_tfhd(
    parsed: &mut ParsedBox<'_, '_, FragmentTimes>,
    frag: &mut FragmentTimes,
) -> mediacheck_media::Result<()> {
    frag.tfhd = Some(parse_tfhd(parsed)?);
    Ok(())
}

fn on_tfdt(
    parsed: &mut ParsedBox<'_, '_, FragmentTimes>,
    frag: &mut FragmentTimes,
) -> mediacheck_media::Result<()> {
    frag.base_media_decode_time = parse_tfdt(parsed)?.base_media_decode_time;
    Ok(())
}

fn on_trun(
    parsed: &mut ParsedBox<'_, '_, FragmentTimes>,
    frag: &mut FragmentTimes,
) -> mediacheck_media::Result<()> {
    frag.truns.push(parse_trun(parsed)?);
    Ok(())
}

/// Read the decode time and summed sample durations of a media segment.
pub fn segment_timing(tracks: &TrackTimescales, media: &[u8]) -> Result<SegmentTiming> {
    let parser = BoxParser::builder()
        .basic(b"moof", children)
        .basic(b"traf", children)
        .full(b"tfhd", on_tfhd)
        .full(b"tfdt", on_tfdt)
        .full(b"trun", on_trun)
        .build();
    let mut frag = FragmentTimes::default();
    parser
        .parse(media, &mut frag)
        .context("Failed to parse media segment")?;

    let track_id = frag.tfhd.as_ref().map(|t| t.track_id);
    let timescale = track_id
        .and_then(|id| tracks.timescale(id))
        .unwrap_or(DEFAULT_TIMESCALE);
    let defaults = SampleDefaults::new(
        frag.tfhd.as_ref(),
        track_id.and_then(|id| tracks.trex.get(&id)),
    );
    let duration: u64 = frag
        .truns
        .iter()
        .map(|trun| total_duration(trun, defaults))
        .sum();

    let to_ms = |units: u64| units as f64 * 1000.0 / f64::from(timescale);
    Ok(SegmentTiming {
        decode_time_ms: to_ms(frag.base_media_decode_time),
        duration_ms: to_ms(duration),
    })
}

/// Read an init and a media segment from disk and time the media segment.
pub async fn read_segment_timing(
    init: &std::path::Path,
    media: &std::path::Path,
) -> Result<SegmentTiming> {
    let init_data = tokio::fs::read(init)
        .await
        .with_context(|| format!("Failed to read init segment: {:?}", init))?;
    let media_data = tokio::fs::read(media)
        .await
        .with_context(|| format!("Failed to read segment: {:?}", media))?;
    let tracks = read_track_timescales(&init_data).context("Failed to parse init segment")?;
    segment_timing(&tracks, &media_data)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TimingIssue {
    /// The segment starts later than the previous one ends.
    Gap {
        representation: String,
        expected_start_ms: f64,
        previous_start_ms: f64,
        start_ms: f64,
    },
    DecodeTimeMismatch {
        representation: String,
        start_ms: f64,
        expected_ms: f64,
        decode_time_ms: f64,
    },
    DurationMismatch {
        representation: String,
        start_ms: f64,
        expected_ms: f64,
        media_duration_ms: f64,
    },
}

/// Compare each segment against its predecessor and its media timing.
///
/// `timings` runs parallel to `rep.segments`; `None` marks a segment whose
/// media could not be read and skips the media comparisons for it. The
/// first segment has no predecessor and is not checked.
pub fn check_gaps(
    rep: &RepresentationConfig,
    timings: &[Option<SegmentTiming>],
    tolerances: &ToleranceConfig,
) -> Vec<TimingIssue> {
    let mut issues = Vec::new();

    for (idx, pair) in rep.segments.windows(2).enumerate() {
        let (previous, segment): (&SegmentConfig, &SegmentConfig) = (&pair[0], &pair[1]);

        if let Some(timing) = timings.get(idx + 1).copied().flatten() {
            if let Some(expected) = segment.decode_time_ms {
                if (expected - timing.decode_time_ms).abs() > tolerances.mismatch_ms {
                    tracing::warn!(
                        "Expected start time {} does not match decode time {}",
                        expected,
                        timing.decode_time_ms
                    );
                    issues.push(TimingIssue::DecodeTimeMismatch {
                        representation: rep.id.clone(),
                        start_ms: segment.start_ms,
                        expected_ms: expected,
                        decode_time_ms: timing.decode_time_ms,
                    });
                }
            }

            if segment.duration_ms != 0.0
                && timing.duration_ms != 0.0
                && (segment.duration_ms - timing.duration_ms).abs() > tolerances.mismatch_ms
            {
                tracing::warn!(
                    "Expected duration {} does not match media duration {}",
                    segment.duration_ms,
                    timing.duration_ms
                );
                issues.push(TimingIssue::DurationMismatch {
                    representation: rep.id.clone(),
                    start_ms: segment.start_ms,
                    expected_ms: segment.duration_ms,
                    media_duration_ms: timing.duration_ms,
                });
            }
        }

        let expected_start = previous.start_ms + previous.duration_ms;
        if segment.start_ms - expected_start > tolerances.gap_ms {
            tracing::warn!("Gap detected in representation {}", rep.id);
            issues.push(TimingIssue::Gap {
                representation: rep.id.clone(),
                expected_start_ms: expected_start,
                previous_start_ms: previous.start_ms,
                start_ms: segment.start_ms,
            });
        }
    }

    issues
}
