//! Mediacheck-Common: Shared types and utilities.
//!
//! This crate provides common functionality used across mediacheck:
//!
//! - **Cue model**: `Cue`, `Text`, `Style` and `Region` as written to captions JSON
//! - **Caption schemes**: CEA-608/708 resolution from DASH scheme URIs and HLS INSTREAM-IDs
//! - **Error Handling**: Common error types and result aliases
//!
//! # Examples
//!
//! ```
//! use mediacheck_common::{CeaScheme, Cue};
//!
//! let scheme: CeaScheme = "CC1".parse().unwrap();
//! assert_eq!(scheme, CeaScheme::Cea608);
//!
//! let cue = Cue::new(0.0, 1.5, "CC1");
//! assert_eq!(cue.stream(), "CC1");
//! ```

pub mod cue;
pub mod error;
pub mod scheme;

pub use cue::{build_raw_text, Color, Cue, Region, RegionAlign, RegionScroll, Style, Text};
pub use error::{Error, Result};
pub use scheme::{stream_label, stream_languages, CeaScheme, CEA608_SCHEME_URI, CEA708_SCHEME_URI};
