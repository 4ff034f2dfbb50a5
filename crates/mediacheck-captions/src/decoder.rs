//! Caption decoder for one representation.
//!
//! [`CeaDecoder::extract`] queues the caption bytes of each SEI payload with
//! its presentation time; [`CeaDecoder::decode`] sorts the queue and runs it
//! through the CEA-608 channels or the CEA-708 services, returning the cues
//! that were flushed. State carries over between calls until
//! [`CeaDecoder::clear`].

use std::collections::BTreeMap;

use mediacheck_common::{CeaScheme, Cue};
use tracing::debug;

use crate::cea608::{is_control_code, is_odd_parity, Cea608Packet, Channel};
use crate::cea708::{Cea708Byte, DtvccPacket, DtvccPacketBuilder, Service, DTVCC_PACKET_DATA};
use crate::sei::parse_cc_data;
use crate::Result;

/// Consecutive bad pairs after which all 608 channels are reset.
pub const BAD_FRAME_RESET_THRESHOLD: u32 = 45;

#[derive(Debug)]
pub struct CeaDecoder {
    cea608_queue: Vec<Cea608Packet>,
    cea708_queue: Vec<Cea708Byte>,
    packet_builder: DtvccPacketBuilder,
    bad_frames: u32,
    /// CC1, CC2, CC3, CC4.
    channels: [Channel; 4],
    /// Active data channel (0 or 1) per field.
    field_channel: [u8; 2],
    services: BTreeMap<u8, Service>,
    first_pts_pending: bool,
}

impl Default for CeaDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl CeaDecoder {
    pub fn new() -> Self {
        Self {
            cea608_queue: Vec::new(),
            cea708_queue: Vec::new(),
            packet_builder: DtvccPacketBuilder::new(),
            bad_frames: 0,
            channels: [
                Channel::new(0, 0),
                Channel::new(0, 1),
                Channel::new(1, 0),
                Channel::new(1, 1),
            ],
            field_channel: [0; 2],
            services: BTreeMap::new(),
            first_pts_pending: true,
        }
    }

    fn reset(&mut self) {
        self.field_channel = [0; 2];
        for channel in &mut self.channels {
            channel.reset();
        }
        self.first_pts_pending = true;
    }

    /// Drop all queued data and decoder state.
    pub fn clear(&mut self) {
        self.bad_frames = 0;
        self.cea608_queue.clear();
        self.cea708_queue.clear();
        self.packet_builder.clear();
        self.reset();
        for service in self.services.values_mut() {
            service.clear();
        }
    }

    /// Queue the caption data of one `user_data_registered_itu_t_t35` payload.
    ///
    /// Only constructs matching `scheme` are kept: NTSC field pairs for
    /// CEA-608, DTVCC bytes for CEA-708. Of a DTVCC pair only the first byte
    /// can start a packet.
    pub fn extract(&mut self, payload: &[u8], pts: f64, scheme: CeaScheme) -> Result<()> {
        if self.first_pts_pending {
            for channel in &mut self.channels {
                channel.set_first_pts(pts);
            }
            self.first_pts_pending = false;
        }

        for cc in parse_cc_data(payload)? {
            match (scheme, cc.cc_type) {
                (CeaScheme::Cea608, field @ (0 | 1)) => {
                    let order = self.cea608_queue.len();
                    self.cea608_queue.push(Cea608Packet {
                        pts,
                        field,
                        data1: cc.data1,
                        data2: cc.data2,
                        order,
                    });
                }
                (CeaScheme::Cea708, cc_type @ (2 | 3)) => {
                    let order = self.cea708_queue.len();
                    self.cea708_queue.push(Cea708Byte {
                        pts,
                        cc_type,
                        value: cc.data1,
                        order,
                    });
                    self.cea708_queue.push(Cea708Byte {
                        pts,
                        cc_type: DTVCC_PACKET_DATA,
                        value: cc.data2,
                        order: order + 1,
                    });
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Decode everything queued so far and return the flushed cues.
    pub fn decode(&mut self) -> Vec<Cue> {
        let mut cues = Vec::new();

        let mut cea608 = std::mem::take(&mut self.cea608_queue);
        cea608.sort_by(|a, b| a.pts.total_cmp(&b.pts).then(a.order.cmp(&b.order)));
        for packet in cea608 {
            cues.extend(self.decode_cea608(packet));
        }

        let mut cea708 = std::mem::take(&mut self.cea708_queue);
        cea708.sort_by(|a, b| a.pts.total_cmp(&b.pts).then(a.order.cmp(&b.order)));
        for byte in cea708 {
            self.packet_builder.add_byte(byte);
        }
        for mut packet in self.packet_builder.take_built() {
            if let Err(e) = self.decode_cea708(&mut packet, &mut cues) {
                debug!(error = %e, "abandoning DTVCC packet");
            }
        }

        cues
    }

    fn decode_cea608(&mut self, packet: Cea608Packet) -> Option<Cue> {
        let field = usize::from(packet.field & 0x01);

        // The channel bit of a control code selects the data channel.
        if is_control_code(packet.data1) {
            self.field_channel[field] = (packet.data1 >> 3) & 0x01;
        }
        let index = (field << 1) | usize::from(self.field_channel[field]);

        let (b1, b2) = (packet.data1, packet.data2);
        if (b1 == 0xFF && b2 == 0xFF)
            || (b1 == 0 && b2 == 0)
            || !is_odd_parity(b1)
            || !is_odd_parity(b2)
        {
            self.bad_frames += 1;
            if self.bad_frames >= BAD_FRAME_RESET_THRESHOLD {
                debug!(bad_frames = self.bad_frames, "resetting CEA-608 channels");
                self.reset();
            }
            return None;
        }
        self.bad_frames = 0;

        let (b1, b2) = (b1 & 0x7F, b2 & 0x7F);
        if b1 == 0 && b2 == 0 {
            return None;
        }

        let channel = &mut self.channels[index];
        if is_control_code(b1) {
            channel.handle_control_code(b1, b2, packet.pts)
        } else {
            channel.handle_basic_chars(b1, b2);
            None
        }
    }

    /// Walk the service blocks of one packet. A block header holds a 3-bit
    /// service number (7 means an extended number follows) and a 5-bit size.
    fn decode_cea708(&mut self, packet: &mut DtvccPacket, out: &mut Vec<Cue>) -> Result<()> {
        while packet.has_more_data() {
            let header = packet.read_byte()?.value;
            let mut number = (header & 0xE0) >> 5;
            let block_size = usize::from(header & 0x1F);
            if number == 0x07 && block_size != 0 {
                number = packet.read_byte()?.value & 0x3F;
            }

            if number == 0 {
                packet.skip(block_size);
                continue;
            }

            let service = self
                .services
                .entry(number)
                .or_insert_with(|| Service::new(number));
            let start = packet.position();
            while packet.position() - start < block_size {
                service.handle_control_code(packet, out)?;
            }
        }
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn service(&self, number: u8) -> Option<&Service> {
        self.services.get(&number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Set the parity bit so the byte has odd parity.
    fn odd(b: u8) -> u8 {
        if is_odd_parity(b) {
            b
        } else {
            b | 0x80
        }
    }

    fn cc_payload(triplets: &[(u8, u8, u8)]) -> Vec<u8> {
        let mut payload = vec![0xB5, 0x00, 0x31, b'G', b'A', b'9', b'4', 0x03];
        payload.push(0x40 | triplets.len() as u8);
        payload.push(0xFF);
        for &(cc_type, d1, d2) in triplets {
            payload.extend_from_slice(&[0xFC | cc_type, d1, d2]);
        }
        payload
    }

    fn field1(b1: u8, b2: u8) -> (u8, u8, u8) {
        (0, odd(b1), odd(b2))
    }

    #[test]
    fn test_608_pop_on_through_decoder() {
        let mut decoder = CeaDecoder::new();
        let payload = cc_payload(&[field1(0x14, 0x20), field1(b'H', b'i'), field1(0x14, 0x2F)]);
        decoder.extract(&payload, 0.5, CeaScheme::Cea608).unwrap();
        decoder
            .extract(&cc_payload(&[field1(0x14, 0x2C)]), 2.0, CeaScheme::Cea608)
            .unwrap();

        let cues = decoder.decode();
        assert_eq!(cues.len(), 1);
        assert_eq!(cues[0].raw_text, "Hi");
        assert_eq!(cues[0].id, "0.5_2_CC1");
    }

    #[test]
    fn test_608_channel_bit_selects_cc2() {
        let mut decoder = CeaDecoder::new();
        let payload = cc_payload(&[
            field1(0x1C, 0x20),
            field1(b'O', b'k'),
            field1(0x1C, 0x2F),
        ]);
        decoder.extract(&payload, 1.0, CeaScheme::Cea608).unwrap();
        decoder
            .extract(&cc_payload(&[field1(0x1C, 0x2C)]), 1.5, CeaScheme::Cea608)
            .unwrap();
        let cues = decoder.decode();
        assert_eq!(cues.len(), 1);
        assert!(cues[0].id.ends_with("_CC2"));
    }

    #[test]
    fn test_608_ignores_dtvcc_constructs() {
        let mut decoder = CeaDecoder::new();
        decoder
            .extract(&cc_payload(&[(3, 0x02, 0x21)]), 0.0, CeaScheme::Cea608)
            .unwrap();
        assert!(decoder.cea608_queue.is_empty());
        decoder
            .extract(&cc_payload(&[field1(0x14, 0x20)]), 0.0, CeaScheme::Cea708)
            .unwrap();
        assert!(decoder.cea708_queue.is_empty());
    }

    #[test]
    fn test_bad_frames_reset_channels() {
        let mut decoder = CeaDecoder::new();
        let loaded = cc_payload(&[field1(0x14, 0x20), field1(b'N', b'o'), field1(0x14, 0x2F)]);
        decoder.extract(&loaded, 0.0, CeaScheme::Cea608).unwrap();
        assert!(decoder.decode().is_empty());

        let bad = cc_payload(&vec![(0, 0xFF, 0xFF); 15]);
        for i in 0..3 {
            decoder.extract(&bad, 1.0 + f64::from(i), CeaScheme::Cea608).unwrap();
        }
        assert!(decoder.decode().is_empty());
        assert_eq!(decoder.bad_frames, BAD_FRAME_RESET_THRESHOLD);

        decoder
            .extract(&cc_payload(&[field1(0x14, 0x2C)]), 5.0, CeaScheme::Cea608)
            .unwrap();
        assert!(decoder.decode().is_empty());
    }

    #[test]
    fn test_44_bad_frames_keep_state() {
        let mut decoder = CeaDecoder::new();
        let loaded = cc_payload(&[field1(0x14, 0x20), field1(b'O', b'k'), field1(0x14, 0x2F)]);
        decoder.extract(&loaded, 0.0, CeaScheme::Cea608).unwrap();
        let bad = cc_payload(&vec![(0, 0x00, 0x00); 22]);
        decoder.extract(&bad, 1.0, CeaScheme::Cea608).unwrap();
        decoder.extract(&bad, 1.0, CeaScheme::Cea608).unwrap();
        decoder
            .extract(&cc_payload(&[field1(0x14, 0x2C)]), 5.0, CeaScheme::Cea608)
            .unwrap();
        let cues = decoder.decode();
        assert_eq!(cues.len(), 1);
        assert_eq!(cues[0].raw_text, "Ok");
    }

    #[test]
    fn test_708_service_blocks_across_packets() {
        let mut decoder = CeaDecoder::new();
        // Size code 6: eleven bytes follow the packet header. Service 1 block
        // of ten bytes defines visible window 0, writes "Hi" and a NUL.
        let first = cc_payload(&[
            (3, 0x06, 0x2A),
            (2, 0x98, 0x20),
            (2, 0x46, 0x32),
            (2, 0x71, 0x1F),
            (2, 0x09, b'H'),
            (2, b'i', 0x00),
        ]);
        // Size code 2: service 1 block carrying ClearWindows(0).
        let second = cc_payload(&[(3, 0x02, 0x22), (2, 0x88, 0x01)]);
        decoder.extract(&first, 1.0, CeaScheme::Cea708).unwrap();
        decoder.extract(&second, 3.0, CeaScheme::Cea708).unwrap();

        let cues = decoder.decode();
        assert_eq!(cues.len(), 1);
        assert_eq!(cues[0].raw_text, "Hi");
        assert_eq!(cues[0].end, 3.0);
        assert!(cues[0].id.ends_with("_svc1"));
        assert!(decoder.service(1).is_some());
    }

    #[test]
    fn test_708_null_service_block_skipped() {
        let mut decoder = CeaDecoder::new();
        let payload = cc_payload(&[(3, 0x02, 0x02), (2, b'X', b'Y')]);
        decoder.extract(&payload, 0.0, CeaScheme::Cea708).unwrap();
        assert!(decoder.decode().is_empty());
        assert!(decoder.service(0).is_none());
    }

    #[test]
    fn test_clear_drops_state() {
        let mut decoder = CeaDecoder::new();
        let loaded = cc_payload(&[field1(0x14, 0x20), field1(b'N', b'o'), field1(0x14, 0x2F)]);
        decoder.extract(&loaded, 0.0, CeaScheme::Cea608).unwrap();
        decoder.decode();
        decoder.clear();
        decoder
            .extract(&cc_payload(&[field1(0x14, 0x2C)]), 5.0, CeaScheme::Cea608)
            .unwrap();
        assert!(decoder.decode().is_empty());
    }
}
