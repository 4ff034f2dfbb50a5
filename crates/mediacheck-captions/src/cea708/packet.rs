//! DTVCC packet assembly.
//!
//! Caption channel packets arrive two bytes per `cc_data` construct. A byte
//! typed as packet start opens a packet whose size code gives the number of
//! bytes to follow; the packet is complete once that many data bytes were
//! collected. A new start abandons any unfinished packet.

use crate::{CaptionError, Result};

/// `cc_type` of a byte that continues a DTVCC packet.
pub const DTVCC_PACKET_DATA: u8 = 2;
/// `cc_type` of a byte that starts a DTVCC packet.
pub const DTVCC_PACKET_START: u8 = 3;

/// One caption channel byte.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cea708Byte {
    /// Presentation time in seconds.
    pub pts: f64,
    pub cc_type: u8,
    pub value: u8,
    /// Arrival order, breaks ties between equal timestamps.
    pub order: usize,
}

/// A complete DTVCC packet with a read cursor.
#[derive(Debug, Clone)]
pub struct DtvccPacket {
    bytes: Vec<Cea708Byte>,
    position: usize,
}

impl DtvccPacket {
    pub fn new(bytes: Vec<Cea708Byte>) -> Self {
        Self { bytes, position: 0 }
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn has_more_data(&self) -> bool {
        self.position < self.bytes.len()
    }

    pub fn read_byte(&mut self) -> Result<Cea708Byte> {
        let byte = self
            .bytes
            .get(self.position)
            .copied()
            .ok_or(CaptionError::PacketExhausted(self.position))?;
        self.position += 1;
        Ok(byte)
    }

    /// Skip parameter bytes. Skipping past the end leaves the packet exhausted.
    pub fn skip(&mut self, count: usize) {
        if self.position + count > self.bytes.len() {
            tracing::trace!(
                position = self.position,
                count,
                len = self.bytes.len(),
                "skip past end of DTVCC packet"
            );
        }
        self.position = (self.position + count).min(self.bytes.len());
    }
}

/// Collects caption channel bytes into complete packets.
#[derive(Debug, Default)]
pub struct DtvccPacketBuilder {
    built: Vec<DtvccPacket>,
    current: Option<Vec<Cea708Byte>>,
    bytes_left: usize,
}

impl DtvccPacketBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_byte(&mut self, byte: Cea708Byte) {
        if byte.cc_type == DTVCC_PACKET_START {
            // packet_size_code 0 means the maximum of 128 bytes, header included.
            let size_code = usize::from(byte.value & 0x3F);
            let packet_size = if size_code == 0 { 64 } else { size_code } * 2;
            self.bytes_left = packet_size - 1;
            self.current = Some(Vec::with_capacity(self.bytes_left));
            return;
        }

        let Some(current) = self.current.as_mut() else {
            return;
        };
        if self.bytes_left > 0 {
            current.push(byte);
            self.bytes_left -= 1;
        }
        if self.bytes_left == 0 {
            if let Some(bytes) = self.current.take() {
                self.built.push(DtvccPacket::new(bytes));
            }
        }
    }

    /// Hand out the completed packets, keeping any packet still in progress.
    pub fn take_built(&mut self) -> Vec<DtvccPacket> {
        std::mem::take(&mut self.built)
    }

    pub fn clear(&mut self) {
        self.built.clear();
        self.current = None;
        self.bytes_left = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn byte(cc_type: u8, value: u8, order: usize) -> Cea708Byte {
        Cea708Byte {
            pts: 0.0,
            cc_type,
            value,
            order,
        }
    }

    #[test]
    fn test_packet_completes_after_declared_size() {
        let mut builder = DtvccPacketBuilder::new();
        // Size code 2: four bytes total, three after the header.
        builder.add_byte(byte(DTVCC_PACKET_START, 0x02, 0));
        builder.add_byte(byte(DTVCC_PACKET_DATA, 0x21, 1));
        builder.add_byte(byte(DTVCC_PACKET_DATA, 0x41, 2));
        assert!(builder.take_built().is_empty());
        builder.add_byte(byte(DTVCC_PACKET_DATA, 0x42, 3));

        let packets = builder.take_built();
        assert_eq!(packets.len(), 1);
        let mut packet = packets.into_iter().next().unwrap();
        assert_eq!(packet.len(), 3);
        assert_eq!(packet.read_byte().unwrap().value, 0x21);
        assert!(builder.take_built().is_empty());
    }

    #[test]
    fn test_orphan_data_ignored_and_unfinished_packet_dropped() {
        let mut builder = DtvccPacketBuilder::new();
        builder.add_byte(byte(DTVCC_PACKET_DATA, 0x11, 0));
        builder.add_byte(byte(DTVCC_PACKET_START, 0x02, 1));
        builder.add_byte(byte(DTVCC_PACKET_DATA, 0x22, 2));
        builder.add_byte(byte(DTVCC_PACKET_START, 0x01, 3));
        builder.add_byte(byte(DTVCC_PACKET_DATA, 0x33, 4));

        let packets = builder.take_built();
        assert_eq!(packets.len(), 1);
        let mut packet = packets.into_iter().next().unwrap();
        assert_eq!(packet.read_byte().unwrap().value, 0x33);
        assert!(!packet.has_more_data());
    }

    #[test]
    fn test_size_code_zero_is_maximum() {
        let mut builder = DtvccPacketBuilder::new();
        builder.add_byte(byte(DTVCC_PACKET_START, 0x00, 0));
        for i in 0..126 {
            builder.add_byte(byte(DTVCC_PACKET_DATA, 0, i + 1));
        }
        assert!(builder.take_built().is_empty());
        builder.add_byte(byte(DTVCC_PACKET_DATA, 0, 127));
        assert_eq!(builder.take_built()[0].len(), 127);
    }

    #[test]
    fn test_read_past_end() {
        let mut packet = DtvccPacket::new(vec![byte(DTVCC_PACKET_DATA, 1, 0)]);
        packet.skip(4);
        assert_eq!(packet.position(), 1);
        assert!(matches!(
            packet.read_byte(),
            Err(CaptionError::PacketExhausted(1))
        ));
    }
}
