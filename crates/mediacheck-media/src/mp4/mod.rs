//! ISO-BMFF ("MP4") box parsing.
//!
//! The [`parser`] module holds the registration-driven box walker, [`boxes`]
//! the per-box field decoders, [`fragment`] the per-sample resolution of
//! movie fragments and [`rewrite`] the in-place timescale utilities.

pub mod boxes;
pub mod fragment;
pub mod parser;
pub mod rewrite;
mod types;

pub use boxes::*;
pub use fragment::{resolve_samples, total_duration, FragmentSample, SampleDefaults};
pub use parser::{
    children, sample_description, visual_sample_entry, BoxHandler, BoxKind, BoxParser,
    BoxParserBuilder, ParsedBox,
};
pub use types::BoxType;

use std::collections::HashMap;

use crate::Result;

/// Track timing context read from an init segment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackTimescales {
    /// Track ID to media timescale.
    pub timescales: HashMap<u32, u32>,
    /// Track ID to fragment defaults.
    pub trex: HashMap<u32, Trex>,
}

impl TrackTimescales {
    pub fn timescale(&self, track_id: u32) -> Option<u32> {
        self.timescales.get(&track_id).copied()
    }
}

#[derive(Default)]
struct TrackScan {
    track_ids: Vec<u32>,
    timescales: Vec<u32>,
    trex: Vec<Trex>,
}

fn on_tkhd(parsed: &mut ParsedBox<'_, '_, TrackScan>, scan: &mut TrackScan) -> Result<()> {
    scan.track_ids.push(parse_tkhd(parsed)?.track_id);
    Ok(())
}

fn on_mdhd(parsed: &mut ParsedBox<'_, '_, TrackScan>, scan: &mut TrackScan) -> Result<()> {
    scan.timescales.push(parse_mdhd(parsed)?.timescale);
    Ok(())
}

fn on_trex(parsed: &mut ParsedBox<'_, '_, TrackScan>, scan: &mut TrackScan) -> Result<()> {
    scan.trex.push(parse_trex(parsed)?);
    Ok(())
}

/// Pair each track's tkhd track ID with its mdhd timescale.
///
/// Pairing is positional: the n-th tkhd visited goes with the n-th mdhd.
/// A track without a timescale is logged and left out.
pub fn read_track_timescales(init: &[u8]) -> Result<TrackTimescales> {
    let parser = BoxParser::builder()
        .basic(b"moov", children)
        .basic(b"mvex", children)
        .basic(b"trak", children)
        .full(b"tkhd", on_tkhd)
        .basic(b"mdia", children)
        .full(b"mdhd", on_mdhd)
        .full(b"trex", on_trex)
        .build();
    let mut scan = TrackScan::default();
    parser.parse(init, &mut scan)?;

    let mut tracks = TrackTimescales::default();
    for (idx, track_id) in scan.track_ids.iter().enumerate() {
        match scan.timescales.get(idx) {
            Some(&timescale) if timescale != 0 => {
                tracks.timescales.insert(*track_id, timescale);
            }
            _ => tracing::warn!(track_id, idx, "no timescale for track"),
        }
    }
    for trex in scan.trex {
        tracks.trex.insert(trex.track_id, trex);
    }
    Ok(tracks)
}
