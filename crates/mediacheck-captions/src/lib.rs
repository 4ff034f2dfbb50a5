//! Mediacheck-Captions: CEA-608/708 closed captions from fragmented MP4
//!
//! Captions travel inside the video bitstream as `user_data_registered_itu_t_t35`
//! SEI messages. This crate finds those messages in the samples of a media
//! segment and runs them through line-21 (CEA-608) or DTVCC (CEA-708)
//! decoding to produce timed [`Cue`](mediacheck_common::Cue) values.
//!
//! # Modules
//!
//! - `sei` - NAL unit classification, emulation prevention and `cc_data` parsing
//! - `cea608` - Line-21 data channels and their caption memories
//! - `cea708` - DTVCC packet assembly, services and windows
//! - `assembler` - Styled character grid to cue text runs
//! - `decoder` - Packet queues and dispatch to the 608 channels or 708 services
//! - `parser` - Per-representation init/media parsing with segment dedup
//!
//! # Example
//!
//! ```no_run
//! use mediacheck_captions::CaptionParser;
//! use mediacheck_common::CeaScheme;
//!
//! # fn run(init: &[u8], segments: &[Vec<u8>]) -> mediacheck_captions::Result<()> {
//! let mut parser = CaptionParser::new(CeaScheme::Cea608);
//! parser.parse_init(init, "p0")?;
//! for (id, segment) in segments.iter().enumerate() {
//!     for cue in parser.parse_media(segment, id as u64 + 1, "p0") {
//!         println!("{} {}", cue.id, cue.raw_text);
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod assembler;
pub mod cea608;
pub mod cea708;
pub mod decoder;
pub mod error;
pub mod parser;
pub mod sei;

pub use decoder::CeaDecoder;
pub use error::{CaptionError, Result};
pub use parser::{detect_bitstream_format, scan_segment, CaptionPacket, CaptionParser};
pub use sei::BitstreamFormat;
