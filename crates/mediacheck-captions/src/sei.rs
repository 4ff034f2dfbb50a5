//! SEI parsing for caption carriage.
//!
//! Captions ride in `user_data_registered_itu_t_t35` SEI messages (payload
//! type 4) of H.264 and H.265 video. The payload is ATSC A/53 `cc_data()`:
//! a T.35 country code, the ATSC provider code, the `GA94` identifier and a
//! list of three-byte caption constructs.

use mediacheck_media::ByteReader;

use crate::Result;

/// SEI payload type for `user_data_registered_itu_t_t35`.
pub const SEI_USER_DATA_REGISTERED: u32 = 4;

const USA_COUNTRY_CODE: u8 = 0xB5;
const ATSC_PROVIDER_CODE: u16 = 0x0031;
/// "GA94"
const ATSC1_USER_IDENTIFIER: u32 = 0x4741_3934;
const USER_DATA_TYPE_CC_DATA: u8 = 0x03;
/// Country code + provider code + user identifier + user data type.
const MIN_CC_PAYLOAD_LEN: usize = 8;

/// Video bitstream that carries the SEI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BitstreamFormat {
    H264,
    H265,
}

impl BitstreamFormat {
    /// Map a sample entry or `frma` fourcc to a bitstream format.
    pub fn from_codec(codec: &str) -> Option<Self> {
        match codec {
            "avc1" | "avc3" | "dvav" | "dva1" => Some(Self::H264),
            "hev1" | "hvc1" | "dvh1" | "dvhe" => Some(Self::H265),
            _ => None,
        }
    }

    /// Bytes in the NAL unit header.
    pub fn header_size(&self) -> usize {
        match self {
            Self::H264 => 1,
            Self::H265 => 2,
        }
    }

    /// Whether the first NAL header byte marks an SEI unit.
    pub fn is_sei(&self, header: u8) -> bool {
        match self {
            Self::H264 => header & 0x1F == 0x06,
            Self::H265 => matches!((header >> 1) & 0x3F, 0x27 | 0x28),
        }
    }
}

/// Strip emulation prevention bytes: every `0x03` following two zero bytes.
pub fn remove_emulation_prevention(data: &[u8]) -> Vec<u8> {
    let mut result = Vec::with_capacity(data.len());
    let mut zeros = 0;

    for &byte in data {
        if zeros == 2 && byte == 0x03 {
            zeros = 0;
            continue;
        }
        zeros = if byte == 0x00 { zeros + 1 } else { 0 };
        result.push(byte);
    }

    result
}

/// Collect the caption candidate payloads from one SEI NAL unit payload
/// (NAL header already removed).
///
/// A message whose declared size runs past the end of the unit yields the
/// bytes that are present and ends the scan.
pub fn user_data_payloads(nal_payload: &[u8]) -> Vec<Vec<u8>> {
    let rbsp = remove_emulation_prevention(nal_payload);
    let mut payloads = Vec::new();
    let mut pos = 0;

    while pos < rbsp.len() {
        let Some(payload_type) = read_sei_value(&rbsp, &mut pos) else {
            break;
        };
        let Some(payload_size) = read_sei_value(&rbsp, &mut pos) else {
            break;
        };

        let end = pos.saturating_add(payload_size as usize).min(rbsp.len());
        if payload_type == SEI_USER_DATA_REGISTERED {
            payloads.push(rbsp[pos..end].to_vec());
        }
        pos = end;
    }

    payloads
}

/// Read a `0xFF`-extended SEI type or size field.
fn read_sei_value(rbsp: &[u8], pos: &mut usize) -> Option<u32> {
    let mut value = 0u32;
    while *rbsp.get(*pos)? == 0xFF {
        value += 255;
        *pos += 1;
    }
    value += u32::from(*rbsp.get(*pos)?);
    *pos += 1;
    Some(value)
}

/// One valid `cc_data` construct.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CcTriplet {
    /// 0 and 1 are NTSC field 1 and 2, 2 and 3 are DTVCC data and start.
    pub cc_type: u8,
    pub data1: u8,
    pub data2: u8,
}

/// Validate an ATSC A/53 user data payload and return its valid caption
/// constructs.
///
/// Payloads from another provider, or with `process_cc_data_flag` cleared,
/// yield no constructs. Constructs with `cc_valid` cleared are consumed and
/// dropped.
pub fn parse_cc_data(payload: &[u8]) -> Result<Vec<CcTriplet>> {
    if payload.len() < MIN_CC_PAYLOAD_LEN {
        return Ok(Vec::new());
    }

    let mut reader = ByteReader::big_endian(payload);
    if reader.read_u8()? != USA_COUNTRY_CODE
        || reader.read_u16()? != ATSC_PROVIDER_CODE
        || reader.read_u32()? != ATSC1_USER_IDENTIFIER
        || reader.read_u8()? != USER_DATA_TYPE_CC_DATA
    {
        return Ok(Vec::new());
    }

    // reserved(1) process_cc_data_flag(1) zero_bit(1) cc_count(5)
    let flags = reader.read_u8()?;
    if flags & 0x40 == 0 {
        return Ok(Vec::new());
    }
    let count = flags & 0x1F;
    reader.skip(1)?;

    let mut triplets = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let marker = reader.read_u8()?;
        let data1 = reader.read_u8()?;
        let data2 = reader.read_u8()?;
        if marker & 0x04 != 0 {
            triplets.push(CcTriplet {
                cc_type: marker & 0x03,
                data1,
                data2,
            });
        }
    }

    Ok(triplets)
}
