//! Extraction passes over downloaded segments.
//!
//! - `captions` - CEA-608/708 cues per representation, JSON output and
//!   cross-representation validation
//! - `timing` - Segment decode time/duration and gap checks
//! - `emsg` - Event message boxes

pub mod captions;
pub mod emsg;
pub mod timing;

#[cfg(test)]
pub(crate) mod test_fixtures;

pub use captions::{
    caption_languages, extract_captions, validate_captions, write_captions, CaptionStream,
    Captions, MissingCue,
};
pub use emsg::{extract_emsg, EventMessage};
pub use timing::{check_gaps, segment_timing, SegmentTiming, TimingIssue};
