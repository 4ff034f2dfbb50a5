//! CEA-708 DTVCC caption decoding.
//!
//! Caption channel bytes are assembled into packets by
//! [`DtvccPacketBuilder`]. Each packet holds service blocks addressed to one
//! of 63 [`Service`]s, and each service draws into up to eight windows.

mod packet;
mod service;
mod tables;
mod window;

pub use packet::{
    Cea708Byte, DtvccPacket, DtvccPacketBuilder, DTVCC_PACKET_DATA, DTVCC_PACKET_START,
};
pub use service::Service;
pub use window::{Justification, Window, WindowDefinition, MAX_COLS, MAX_ROWS};
