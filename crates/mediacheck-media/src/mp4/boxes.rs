//! Field decoders for individual box types.
//!
//! Each decoder takes a [`ParsedBox`] whose reader sits at the payload and
//! returns a typed struct. Fields that a box only carries when a flag bit is
//! set are `Option`s. All numbers are big-endian.

use super::ParsedBox;
use crate::Result;

/// Seconds between the NTP epoch (1900) and the Unix epoch (1970).
const NTP_UNIX_OFFSET_SECS: f64 = 2_208_988_800.0;

/// tfhd flag bits.
pub mod tfhd_flags {
    pub const BASE_DATA_OFFSET: u32 = 0x000001;
    pub const SAMPLE_DESCRIPTION_INDEX: u32 = 0x000002;
    pub const DEFAULT_SAMPLE_DURATION: u32 = 0x000008;
    pub const DEFAULT_SAMPLE_SIZE: u32 = 0x000010;
    pub const DEFAULT_SAMPLE_FLAGS: u32 = 0x000020;
}

/// trun flag bits.
pub mod trun_flags {
    pub const DATA_OFFSET: u32 = 0x000001;
    pub const FIRST_SAMPLE_FLAGS: u32 = 0x000004;
    pub const SAMPLE_DURATION: u32 = 0x000100;
    pub const SAMPLE_SIZE: u32 = 0x000200;
    pub const SAMPLE_FLAGS: u32 = 0x000400;
    pub const SAMPLE_COMPOSITION_TIME_OFFSET: u32 = 0x000800;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
pub struct Tkhd {
    pub track_id: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
pub struct Mvhd {
    pub timescale: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
pub struct Mdhd {
    pub timescale: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
pub struct Mehd {
    pub fragment_duration: u64,
}

/// Track extends defaults from the init segment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
pub struct Trex {
    pub track_id: u32,
    pub default_sample_description_index: u32,
    pub default_sample_duration: u32,
    pub default_sample_size: u32,
    pub default_sample_flags: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
pub struct Tfhd {
    pub track_id: u32,
    pub base_data_offset: Option<u64>,
    pub sample_description_index: Option<u32>,
    pub default_sample_duration: Option<u32>,
    pub default_sample_size: Option<u32>,
    pub default_sample_flags: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
pub struct Tfdt {
    pub base_media_decode_time: u64,
}

/// One sample row of a trun box.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
pub struct TrunSample {
    pub duration: Option<u32>,
    pub size: Option<u32>,
    /// Unsigned in version 0, signed in version 1.
    pub composition_time_offset: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
pub struct Trun {
    pub sample_count: u32,
    pub data_offset: Option<i32>,
    pub samples: Vec<TrunSample>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
pub struct ElstEntry {
    pub segment_duration: u64,
    pub media_time: i64,
    pub media_rate_integer: i16,
    pub media_rate_fraction: i16,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
pub struct Elst {
    pub entries: Vec<ElstEntry>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
pub struct SidxReference {
    pub reference_type: u8,
    pub reference_size: u32,
    pub subsegment_duration: u32,
    pub starts_with_sap: bool,
    pub sap_type: u8,
    pub sap_delta_time: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
pub struct Sidx {
    pub reference_id: u32,
    pub timescale: u32,
    pub earliest_presentation_time: u64,
    pub first_offset: u64,
    pub references: Vec<SidxReference>,
}

/// DASH event message.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
pub struct Emsg {
    pub scheme_id_uri: String,
    pub value: String,
    pub timescale: u32,
    pub presentation_time_delta: u64,
    pub event_duration: u32,
    pub id: u32,
    pub message_data: Vec<u8>,
}

/// Original format of an encrypted sample entry.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
pub struct Frma {
    pub codec: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
pub struct Tenc {
    pub crypt_byte_block: Option<u8>,
    pub skip_byte_block: Option<u8>,
    pub is_protected: u8,
    pub per_sample_iv_size: u8,
    pub default_kid: [u8; 16],
    pub constant_iv: Option<Vec<u8>>,
}

/// Producer reference time.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
pub struct Prft {
    pub reference_track_id: u32,
    /// NTP timestamp in milliseconds since 1900.
    pub ntp_timestamp_ms: f64,
    pub wall_clock_time_secs: f64,
    pub media_time: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
pub struct Payl {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
pub struct Iden {
    pub id: String,
}

fn skip_times<C>(parsed: &mut ParsedBox<'_, '_, C>) -> Result<()> {
    // creation_time + modification_time
    let width = if parsed.version == 1 { 16 } else { 8 };
    parsed.reader.skip(width)
}

fn read_versioned<C>(parsed: &mut ParsedBox<'_, '_, C>) -> Result<u64> {
    if parsed.version == 1 {
        parsed.reader.read_u64()
    } else {
        parsed.reader.read_u32().map(u64::from)
    }
}

pub fn parse_tkhd<C>(parsed: &mut ParsedBox<'_, '_, C>) -> Result<Tkhd> {
    skip_times(parsed)?;
    let track_id = parsed.reader.read_u32()?;
    Ok(Tkhd { track_id })
}

pub fn parse_mvhd<C>(parsed: &mut ParsedBox<'_, '_, C>) -> Result<Mvhd> {
    skip_times(parsed)?;
    let timescale = parsed.reader.read_u32()?;
    Ok(Mvhd { timescale })
}

pub fn parse_mdhd<C>(parsed: &mut ParsedBox<'_, '_, C>) -> Result<Mdhd> {
    skip_times(parsed)?;
    let timescale = parsed.reader.read_u32()?;
    Ok(Mdhd { timescale })
}

pub fn parse_mehd<C>(parsed: &mut ParsedBox<'_, '_, C>) -> Result<Mehd> {
    let fragment_duration = read_versioned(parsed)?;
    Ok(Mehd { fragment_duration })
}

pub fn parse_trex<C>(parsed: &mut ParsedBox<'_, '_, C>) -> Result<Trex> {
    let reader = &mut *parsed.reader;
    Ok(Trex {
        track_id: reader.read_u32()?,
        default_sample_description_index: reader.read_u32()?,
        default_sample_duration: reader.read_u32()?,
        default_sample_size: reader.read_u32()?,
        default_sample_flags: reader.read_u32()?,
    })
}

pub fn parse_tfhd<C>(parsed: &mut ParsedBox<'_, '_, C>) -> Result<Tfhd> {
    use tfhd_flags::*;

    let flags = parsed.flags;
    let reader = &mut *parsed.reader;
    let mut tfhd = Tfhd {
        track_id: reader.read_u32()?,
        ..Tfhd::default()
    };
    if flags & BASE_DATA_OFFSET != 0 {
        tfhd.base_data_offset = Some(reader.read_u64()?);
    }
    if flags & SAMPLE_DESCRIPTION_INDEX != 0 {
        tfhd.sample_description_index = Some(reader.read_u32()?);
    }
    if flags & DEFAULT_SAMPLE_DURATION != 0 {
        tfhd.default_sample_duration = Some(reader.read_u32()?);
    }
    if flags & DEFAULT_SAMPLE_SIZE != 0 {
        tfhd.default_sample_size = Some(reader.read_u32()?);
    }
    if flags & DEFAULT_SAMPLE_FLAGS != 0 {
        tfhd.default_sample_flags = Some(reader.read_u32()?);
    }
    Ok(tfhd)
}

pub fn parse_tfdt<C>(parsed: &mut ParsedBox<'_, '_, C>) -> Result<Tfdt> {
    let base_media_decode_time = read_versioned(parsed)?;
    Ok(Tfdt {
        base_media_decode_time,
    })
}

pub fn parse_trun<C>(parsed: &mut ParsedBox<'_, '_, C>) -> Result<Trun> {
    use trun_flags::*;

    let flags = parsed.flags;
    let signed_offsets = parsed.version != 0;
    let reader = &mut *parsed.reader;

    let sample_count = reader.read_u32()?;
    let data_offset = if flags & DATA_OFFSET != 0 {
        Some(reader.read_i32()?)
    } else {
        None
    };
    if flags & FIRST_SAMPLE_FLAGS != 0 {
        reader.skip(4)?;
    }

    // Each sample needs at least one field's worth of bytes, so a corrupt
    // count cannot drive a huge allocation.
    let mut samples = Vec::with_capacity((sample_count as usize).min(reader.remaining() / 4 + 1));
    for _ in 0..sample_count {
        let mut sample = TrunSample::default();
        if flags & SAMPLE_DURATION != 0 {
            sample.duration = Some(reader.read_u32()?);
        }
        if flags & SAMPLE_SIZE != 0 {
            sample.size = Some(reader.read_u32()?);
        }
        if flags & SAMPLE_FLAGS != 0 {
            reader.skip(4)?;
        }
        if flags & SAMPLE_COMPOSITION_TIME_OFFSET != 0 {
            let offset = if signed_offsets {
                i64::from(reader.read_i32()?)
            } else {
                i64::from(reader.read_u32()?)
            };
            sample.composition_time_offset = Some(offset);
        }
        samples.push(sample);
    }

    Ok(Trun {
        sample_count,
        data_offset,
        samples,
    })
}

pub fn parse_elst<C>(parsed: &mut ParsedBox<'_, '_, C>) -> Result<Elst> {
    let entry_count = parsed.reader.read_u32()?;
    let mut entries = Vec::new();
    for _ in 0..entry_count {
        let (segment_duration, media_time) = if parsed.version == 1 {
            (parsed.reader.read_u64()?, parsed.reader.read_i64()?)
        } else {
            (
                u64::from(parsed.reader.read_u32()?),
                i64::from(parsed.reader.read_i32()?),
            )
        };
        entries.push(ElstEntry {
            segment_duration,
            media_time,
            media_rate_integer: parsed.reader.read_i16()?,
            media_rate_fraction: parsed.reader.read_i16()?,
        });
    }
    Ok(Elst { entries })
}

pub fn parse_sidx<C>(parsed: &mut ParsedBox<'_, '_, C>) -> Result<Sidx> {
    let reference_id = parsed.reader.read_u32()?;
    let timescale = parsed.reader.read_u32()?;
    let earliest_presentation_time = read_versioned(parsed)?;
    let first_offset = read_versioned(parsed)?;

    let reader = &mut *parsed.reader;
    reader.skip(2)?; // reserved
    let reference_count = reader.read_u16()?;

    let mut references = Vec::with_capacity(reference_count as usize);
    for _ in 0..reference_count {
        let chunk = reader.read_u32()?;
        let subsegment_duration = reader.read_u32()?;
        let sap = reader.read_u32()?;
        references.push(SidxReference {
            reference_type: (chunk >> 31) as u8,
            reference_size: chunk & 0x7FFF_FFFF,
            subsegment_duration,
            starts_with_sap: sap >> 31 == 1,
            sap_type: ((sap >> 28) & 0x7) as u8,
            sap_delta_time: sap & 0x0FFF_FFFF,
        });
    }

    Ok(Sidx {
        reference_id,
        timescale,
        earliest_presentation_time,
        first_offset,
        references,
    })
}

pub fn parse_emsg<C>(parsed: &mut ParsedBox<'_, '_, C>) -> Result<Emsg> {
    let (scheme_id_uri, value, timescale, presentation_time_delta, event_duration, id) =
        if parsed.version == 0 {
            let scheme_id_uri = parsed.reader.read_terminated_string();
            let value = parsed.reader.read_terminated_string();
            (
                scheme_id_uri,
                value,
                parsed.reader.read_u32()?,
                u64::from(parsed.reader.read_u32()?),
                parsed.reader.read_u32()?,
                parsed.reader.read_u32()?,
            )
        } else {
            let timescale = parsed.reader.read_u32()?;
            let presentation_time_delta = parsed.reader.read_u64()?;
            let event_duration = parsed.reader.read_u32()?;
            let id = parsed.reader.read_u32()?;
            let scheme_id_uri = parsed.reader.read_terminated_string();
            let value = parsed.reader.read_terminated_string();
            (
                scheme_id_uri,
                value,
                timescale,
                presentation_time_delta,
                event_duration,
                id,
            )
        };

    let remaining = parsed.remaining();
    let message_data = parsed.reader.read_bytes(remaining)?.to_vec();

    Ok(Emsg {
        scheme_id_uri,
        value,
        timescale,
        presentation_time_delta,
        event_duration,
        id,
        message_data,
    })
}

pub fn parse_frma<C>(parsed: &mut ParsedBox<'_, '_, C>) -> Result<Frma> {
    let fourcc = parsed.reader.read_fourcc()?;
    Ok(Frma {
        codec: String::from_utf8_lossy(&fourcc).into_owned(),
    })
}

pub fn parse_tenc<C>(parsed: &mut ParsedBox<'_, '_, C>) -> Result<Tenc> {
    let version = parsed.version;
    let reader = &mut *parsed.reader;
    reader.skip(1)?; // reserved

    let (crypt_byte_block, skip_byte_block) = if version == 1 {
        let blocks = reader.read_u8()?;
        (Some(blocks >> 4), Some(blocks & 0x0F))
    } else {
        reader.skip(1)?;
        (None, None)
    };

    let is_protected = reader.read_u8()?;
    let per_sample_iv_size = reader.read_u8()?;
    let mut default_kid = [0u8; 16];
    default_kid.copy_from_slice(reader.read_bytes(16)?);

    let constant_iv = if is_protected == 1 && per_sample_iv_size == 0 {
        let size = reader.read_u8()?;
        Some(reader.read_bytes(size as usize)?.to_vec())
    } else {
        None
    };

    Ok(Tenc {
        crypt_byte_block,
        skip_byte_block,
        is_protected,
        per_sample_iv_size,
        default_kid,
        constant_iv,
    })
}

pub fn parse_prft<C>(parsed: &mut ParsedBox<'_, '_, C>) -> Result<Prft> {
    let reference_track_id = parsed.reader.read_u32()?;
    let seconds = parsed.reader.read_u32()?;
    let fraction = parsed.reader.read_u32()?;
    let media_time = read_versioned(parsed)?;

    let ntp_timestamp_ms = f64::from(seconds) * 1000.0 + f64::from(fraction) / 4_294_967_296.0 * 1000.0;
    Ok(Prft {
        reference_track_id,
        ntp_timestamp_ms,
        wall_clock_time_secs: ntp_timestamp_ms / 1000.0 - NTP_UNIX_OFFSET_SECS,
        media_time,
    })
}

/// Return the remaining payload of an mdat box.
pub fn parse_mdat<'d, C>(parsed: &mut ParsedBox<'_, 'd, C>) -> Result<&'d [u8]> {
    let remaining = parsed.remaining();
    parsed.reader.read_bytes(remaining)
}

pub fn parse_payl<C>(parsed: &mut ParsedBox<'_, '_, C>) -> Result<Payl> {
    Ok(Payl {
        text: parsed.reader.read_terminated_string(),
    })
}

pub fn parse_iden<C>(parsed: &mut ParsedBox<'_, '_, C>) -> Result<Iden> {
    let remaining = parsed.remaining();
    let raw = parsed.reader.read_bytes(remaining)?;
    Ok(Iden {
        id: String::from_utf8_lossy(raw).into_owned(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mp4::{BoxParser, BoxType};
    use crate::ByteReader;
    use bytes::{BufMut, BytesMut};

    fn full_box(name: &[u8; 4], version: u8, flags: u32, payload: &[u8]) -> Vec<u8> {
        let mut buf = BytesMut::new();
        buf.put_u32(12 + payload.len() as u32);
        buf.put_slice(name);
        buf.put_u32((u32::from(version) << 24) | flags);
        buf.put_slice(payload);
        buf.to_vec()
    }

    /// Run a single decoder over a buffer holding one full box.
    fn decode<T>(
        data: &[u8],
        decoder: impl FnOnce(&mut ParsedBox<'_, '_, ()>) -> Result<T>,
    ) -> Result<T> {
        let parser = BoxParser::<()>::builder().build();
        let mut reader = ByteReader::big_endian(data);
        let size = reader.read_u32()? as usize;
        let box_type = BoxType(reader.read_fourcc()?);
        let word = reader.read_u32()?;
        let mut parsed = ParsedBox {
            parser: &parser,
            reader: &mut reader,
            box_type,
            start: 0,
            size,
            header_size: 12,
            version: (word >> 24) as u8,
            flags: word & 0x00FF_FFFF,
        };
        decoder(&mut parsed)
    }

    #[test]
    fn test_tkhd_versions() {
        let mut v0 = BytesMut::new();
        v0.put_u32(1);
        v0.put_u32(2);
        v0.put_u32(7);
        v0.put_slice(&[0; 60]);
        let tkhd = decode(&full_box(b"tkhd", 0, 7, &v0), parse_tkhd).unwrap();
        assert_eq!(tkhd.track_id, 7);

        let mut v1 = BytesMut::new();
        v1.put_u64(1);
        v1.put_u64(2);
        v1.put_u32(9);
        v1.put_slice(&[0; 60]);
        let tkhd = decode(&full_box(b"tkhd", 1, 7, &v1), parse_tkhd).unwrap();
        assert_eq!(tkhd.track_id, 9);
    }

    #[test]
    fn test_mdhd_timescale() {
        let mut v1 = BytesMut::new();
        v1.put_u64(0);
        v1.put_u64(0);
        v1.put_u32(90_000);
        v1.put_u64(0);
        v1.put_u32(0);
        let mdhd = decode(&full_box(b"mdhd", 1, 0, &v1), parse_mdhd).unwrap();
        assert_eq!(mdhd.timescale, 90_000);
    }

    #[test]
    fn test_tfhd_optional_fields_in_bit_order() {
        let mut payload = BytesMut::new();
        payload.put_u32(1); // track_ID
        payload.put_u32(3); // sample_description_index
        payload.put_u32(3000); // default_sample_duration
        payload.put_u32(0x0101_0000); // default_sample_flags
        let flags = tfhd_flags::SAMPLE_DESCRIPTION_INDEX
            | tfhd_flags::DEFAULT_SAMPLE_DURATION
            | tfhd_flags::DEFAULT_SAMPLE_FLAGS;

        let tfhd = decode(&full_box(b"tfhd", 0, flags, &payload), parse_tfhd).unwrap();
        assert_eq!(
            tfhd,
            Tfhd {
                track_id: 1,
                base_data_offset: None,
                sample_description_index: Some(3),
                default_sample_duration: Some(3000),
                default_sample_size: None,
                default_sample_flags: Some(0x0101_0000),
            }
        );
    }

    #[test]
    fn test_trun_duration_size_offset() {
        let durations = [3000u32, 3003, 2997];
        let sizes = [1200u32, 80, 95];
        let offsets = [0u32, 6000, 3000];

        let mut payload = BytesMut::new();
        payload.put_u32(3);
        for i in 0..3 {
            payload.put_u32(durations[i]);
            payload.put_u32(sizes[i]);
            payload.put_u32(offsets[i]);
        }
        let flags = trun_flags::SAMPLE_DURATION
            | trun_flags::SAMPLE_SIZE
            | trun_flags::SAMPLE_COMPOSITION_TIME_OFFSET;

        let trun = decode(&full_box(b"trun", 0, flags, &payload), parse_trun).unwrap();
        assert_eq!(trun.sample_count, 3);
        assert_eq!(trun.data_offset, None);
        let got: Vec<_> = trun
            .samples
            .iter()
            .map(|s| (s.duration, s.size, s.composition_time_offset))
            .collect();
        assert_eq!(
            got,
            vec![
                (Some(3000), Some(1200), Some(0)),
                (Some(3003), Some(80), Some(6000)),
                (Some(2997), Some(95), Some(3000)),
            ]
        );
    }

    #[test]
    fn test_trun_signed_offsets_and_data_offset() {
        let mut payload = BytesMut::new();
        payload.put_u32(1);
        payload.put_i32(-8);
        payload.put_u32(0x0200_0000); // first_sample_flags
        payload.put_i32(-1500);
        let flags = trun_flags::DATA_OFFSET
            | trun_flags::FIRST_SAMPLE_FLAGS
            | trun_flags::SAMPLE_COMPOSITION_TIME_OFFSET;

        let trun = decode(&full_box(b"trun", 1, flags, &payload), parse_trun).unwrap();
        assert_eq!(trun.data_offset, Some(-8));
        assert_eq!(trun.samples[0].composition_time_offset, Some(-1500));
        assert_eq!(trun.samples[0].duration, None);
    }

    #[test]
    fn test_trun_truncated_is_error() {
        let mut payload = BytesMut::new();
        payload.put_u32(5);
        payload.put_u32(100);
        let data = full_box(b"trun", 0, trun_flags::SAMPLE_SIZE, &payload);
        assert!(decode(&data, parse_trun).unwrap_err().is_bounds());
    }

    #[test]
    fn test_tfdt_versions() {
        let tfdt = decode(&full_box(b"tfdt", 0, 0, &90_000u32.to_be_bytes()), parse_tfdt).unwrap();
        assert_eq!(tfdt.base_media_decode_time, 90_000);

        let big = 0x0000_0001_0000_0000u64;
        let tfdt = decode(&full_box(b"tfdt", 1, 0, &big.to_be_bytes()), parse_tfdt).unwrap();
        assert_eq!(tfdt.base_media_decode_time, big);
    }

    #[test]
    fn test_emsg_version_0() {
        let mut payload = BytesMut::new();
        payload.put_slice(b"urn:scte:scte35:2013:bin\0");
        payload.put_slice(b"1\0");
        payload.put_u32(90_000);
        payload.put_u32(180_000);
        payload.put_u32(45_000);
        payload.put_u32(42);
        payload.put_slice(b"splice");

        let emsg = decode(&full_box(b"emsg", 0, 0, &payload), parse_emsg).unwrap();
        assert_eq!(emsg.scheme_id_uri, "urn:scte:scte35:2013:bin");
        assert_eq!(emsg.value, "1");
        assert_eq!(emsg.timescale, 90_000);
        assert_eq!(emsg.presentation_time_delta, 180_000);
        assert_eq!(emsg.event_duration, 45_000);
        assert_eq!(emsg.id, 42);
        assert_eq!(emsg.message_data, b"splice");
    }

    #[test]
    fn test_emsg_version_1() {
        let mut payload = BytesMut::new();
        payload.put_u32(1000);
        payload.put_u64(5_000);
        payload.put_u32(0xFFFF_FFFF);
        payload.put_u32(7);
        payload.put_slice(b"urn:mpeg:dash:event:2012\0");
        payload.put_slice(b"\0");

        let emsg = decode(&full_box(b"emsg", 1, 0, &payload), parse_emsg).unwrap();
        assert_eq!(emsg.scheme_id_uri, "urn:mpeg:dash:event:2012");
        assert_eq!(emsg.value, "");
        assert_eq!(emsg.presentation_time_delta, 5_000);
        assert_eq!(emsg.id, 7);
        assert!(emsg.message_data.is_empty());
    }

    #[test]
    fn test_sidx_references() {
        let mut payload = BytesMut::new();
        payload.put_u32(1);
        payload.put_u32(90_000);
        payload.put_u32(0);
        payload.put_u32(0);
        payload.put_u16(0);
        payload.put_u16(2);
        payload.put_u32(5000);
        payload.put_u32(180_000);
        payload.put_u32(0x9000_0000);
        payload.put_u32(0x8000_0010);
        payload.put_u32(180_000);
        payload.put_u32(0);

        let sidx = decode(&full_box(b"sidx", 0, 0, &payload), parse_sidx).unwrap();
        assert_eq!(sidx.timescale, 90_000);
        assert_eq!(sidx.references.len(), 2);
        assert_eq!(sidx.references[0].reference_type, 0);
        assert_eq!(sidx.references[0].reference_size, 5000);
        assert!(sidx.references[0].starts_with_sap);
        assert_eq!(sidx.references[0].sap_type, 1);
        assert_eq!(sidx.references[1].reference_type, 1);
        assert_eq!(sidx.references[1].reference_size, 16);
    }

    #[test]
    fn test_elst_entries() {
        let mut payload = BytesMut::new();
        payload.put_u32(1);
        payload.put_u32(1000);
        payload.put_i32(-1);
        payload.put_i16(1);
        payload.put_i16(0);
        let elst = decode(&full_box(b"elst", 0, 0, &payload), parse_elst).unwrap();
        assert_eq!(
            elst.entries,
            vec![ElstEntry {
                segment_duration: 1000,
                media_time: -1,
                media_rate_integer: 1,
                media_rate_fraction: 0,
            }]
        );
    }

    #[test]
    fn test_prft_wall_clock() {
        let mut payload = BytesMut::new();
        payload.put_u32(1);
        payload.put_u32(2_208_988_800 + 10);
        payload.put_u32(0x8000_0000);
        payload.put_u32(900);
        let prft = decode(&full_box(b"prft", 0, 0, &payload), parse_prft).unwrap();
        assert_eq!(prft.media_time, 900);
        assert!((prft.wall_clock_time_secs - 10.5).abs() < 1e-6);
    }

    #[test]
    fn test_tenc_constant_iv() {
        let mut payload = BytesMut::new();
        payload.put_u8(0);
        payload.put_u8(0x19);
        payload.put_u8(1);
        payload.put_u8(0);
        payload.put_slice(&[0xAB; 16]);
        payload.put_u8(2);
        payload.put_slice(&[1, 2]);
        let tenc = decode(&full_box(b"tenc", 1, 0, &payload), parse_tenc).unwrap();
        assert_eq!(tenc.crypt_byte_block, Some(1));
        assert_eq!(tenc.skip_byte_block, Some(9));
        assert_eq!(tenc.default_kid, [0xAB; 16]);
        assert_eq!(tenc.constant_iv, Some(vec![1, 2]));
    }
}
