//! Mediacheck-Media: ISO-BMFF parsing and fragment synthesis
//!
//! This crate reads the boxes of fragmented MP4 init and media segments and
//! turns them into typed values for caption extraction and timing checks.
//!
//! # Modules
//!
//! - `reader` - Bounds-checked big/little-endian cursor over a byte buffer
//! - `writer` - In-place fixed-width writes at absolute offsets
//! - `mp4` - Box walker, field decoders, fragment sample resolution and timescale rewrite
//! - `fmp4` - Fragmented MP4 serialization (init segment, moof/mdat, emsg)
//!
//! # Architecture
//!
//! A parse pass is a [`mp4::BoxParser`] built from `(name, kind, handler)`
//! registrations plus a caller-owned context struct:
//!
//! 1. The caller registers container boxes with [`mp4::children`] and leaf
//!    boxes with handlers that call a field decoder (`parse_tfdt`, ...)
//! 2. Handlers push decoded values into the context
//! 3. After the walk the caller reads its results out of the context
//!
//! The parser itself keeps no state between passes.

pub mod error;
pub mod fmp4;
pub mod mp4;
pub mod reader;
pub mod writer;

pub use error::{Error, Result};
pub use fmp4::{InitSegmentBuilder, MoofBuilder, SampleSpec};
pub use mp4::{read_track_timescales, BoxParser, BoxType, ParsedBox, TrackTimescales};
pub use reader::{ByteReader, Endian};
pub use writer::ByteWriter;
