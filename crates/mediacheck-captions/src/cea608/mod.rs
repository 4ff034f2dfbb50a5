//! CEA-608 line-21 caption decoding.
//!
//! Byte pairs are routed to one of four channels (CC1 to CC4) by field and
//! by the channel bit of the most recent control code. Each [`Channel`]
//! keeps displayed and non-displayed memories and emits a cue whenever
//! displayed content is replaced or erased.

mod channel;
mod memory;
mod tables;

pub use channel::{is_control_code, CaptionMode, Channel};
pub use memory::Memory;
pub use tables::CharSet;

/// A byte pair from an NTSC field, in arrival order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cea608Packet {
    /// Presentation time in seconds.
    pub pts: f64,
    /// 0 for field 1, 1 for field 2.
    pub field: u8,
    pub data1: u8,
    pub data2: u8,
    /// Arrival order, breaks ties between equal timestamps.
    pub order: usize,
}

/// Whether a byte has an odd number of set bits.
pub fn is_odd_parity(byte: u8) -> bool {
    byte.count_ones() % 2 == 1
}
