//! In-place timescale rewriting for init and media segments.
//!
//! A first pass walks the boxes and records where each timed field lives;
//! a second pass rescales those fields through a [`ByteWriter`]. Box sizes
//! never change.

use super::boxes::{tfhd_flags, trun_flags};
use super::{children, BoxParser, ParsedBox};
use crate::{ByteWriter, Error, Result};

#[derive(Debug, Clone, Copy)]
enum Patch {
    Mvhd { payload: usize, version: u8 },
    Mehd { payload: usize, version: u8 },
    Mdhd { payload: usize, version: u8 },
    Trex { payload: usize },
    Sidx { payload: usize, version: u8 },
    Tfhd { payload: usize, flags: u32 },
    Tfdt { payload: usize, version: u8 },
    Trun { payload: usize, version: u8, flags: u32 },
}

macro_rules! patch_handler {
    ($name:ident, |$payload:tt, $version:tt, $flags:tt| $patch:expr) => {
        fn $name(parsed: &mut ParsedBox<'_, '_, Vec<Patch>>, patches: &mut Vec<Patch>) -> Result<()> {
            let ($payload, $version, $flags) = (parsed.payload_start(), parsed.version, parsed.flags);
            patches.push($patch);
            Ok(())
        }
    };
}

patch_handler!(on_mvhd, |payload, version, _| Patch::Mvhd { payload, version });
patch_handler!(on_mehd, |payload, version, _| Patch::Mehd { payload, version });
patch_handler!(on_mdhd, |payload, version, _| Patch::Mdhd { payload, version });
patch_handler!(on_trex, |payload, _, _| Patch::Trex { payload });
patch_handler!(on_sidx, |payload, version, _| Patch::Sidx { payload, version });
patch_handler!(on_tfhd, |payload, _, flags| Patch::Tfhd { payload, flags });
patch_handler!(on_tfdt, |payload, version, _| Patch::Tfdt { payload, version });
patch_handler!(on_trun, |payload, version, flags| Patch::Trun {
    payload,
    version,
    flags
});

fn scale(value: u64, from: u32, to: u32) -> u64 {
    (u128::from(value) * u128::from(to) / u128::from(from.max(1))) as u64
}

fn scale_u32(writer: &mut ByteWriter<'_>, offset: usize, from: u32, to: u32) -> Result<()> {
    let original = writer.get_u32(offset)?;
    let scaled = u32::try_from(scale(u64::from(original), from, to))
        .map_err(|_| Error::Overflow("rescaled value exceeds 32 bits"))?;
    writer.set_u32(offset, scaled)
}

fn scale_u64(writer: &mut ByteWriter<'_>, offset: usize, from: u32, to: u32) -> Result<()> {
    let original = writer.get_u64(offset)?;
    writer.set_u64(offset, scale(original, from, to))
}

fn scale_versioned(
    writer: &mut ByteWriter<'_>,
    offset: usize,
    version: u8,
    from: u32,
    to: u32,
) -> Result<usize> {
    if version == 1 {
        scale_u64(writer, offset, from, to)?;
        Ok(8)
    } else {
        scale_u32(writer, offset, from, to)?;
        Ok(4)
    }
}

fn timescale_offset(payload: usize, version: u8) -> usize {
    payload + if version == 1 { 16 } else { 8 }
}

/// Rewrite the movie and media timescales of an init segment.
///
/// Returns the original media timescale of the first track. Fragment
/// durations in mehd and trex defaults are rescaled to match.
pub fn rewrite_init_timescale(data: &mut [u8], timescale: u32) -> Result<Option<u32>> {
    let parser = BoxParser::builder()
        .basic(b"moov", children)
        .basic(b"trak", children)
        .basic(b"mdia", children)
        .basic(b"mvex", children)
        .full(b"mvhd", on_mvhd)
        .full(b"mehd", on_mehd)
        .full(b"mdhd", on_mdhd)
        .full(b"trex", on_trex)
        .build();
    let mut patches = Vec::new();
    parser.parse(data, &mut patches)?;

    let mut writer = ByteWriter::big_endian(data);
    let mut movie_timescale = None;
    let mut media_timescale = None;

    for patch in &patches {
        match *patch {
            Patch::Mvhd { payload, version } => {
                let offset = timescale_offset(payload, version);
                movie_timescale.get_or_insert(writer.get_u32(offset)?);
                writer.set_u32(offset, timescale)?;
            }
            Patch::Mdhd { payload, version } => {
                let offset = timescale_offset(payload, version);
                media_timescale.get_or_insert(writer.get_u32(offset)?);
                writer.set_u32(offset, timescale)?;
            }
            _ => {}
        }
    }

    for patch in &patches {
        match *patch {
            Patch::Mehd { payload, version } => {
                let from = movie_timescale.ok_or(Error::MissingBox("mvhd"))?;
                scale_versioned(&mut writer, payload, version, from, timescale)?;
            }
            Patch::Trex { payload } => {
                let from = media_timescale.ok_or(Error::MissingBox("mdhd"))?;
                // default_sample_duration follows track_ID and description index
                scale_u32(&mut writer, payload + 8, from, timescale)?;
            }
            _ => {}
        }
    }

    Ok(media_timescale)
}

/// Rescale every timed field of a media segment from `original` to `timescale`.
pub fn rewrite_segment_timescale(data: &mut [u8], original: u32, timescale: u32) -> Result<()> {
    let parser = BoxParser::builder()
        .basic(b"moof", children)
        .basic(b"traf", children)
        .full(b"sidx", on_sidx)
        .full(b"tfhd", on_tfhd)
        .full(b"tfdt", on_tfdt)
        .full(b"trun", on_trun)
        .build();
    let mut patches = Vec::new();
    parser.parse(data, &mut patches)?;

    let mut writer = ByteWriter::big_endian(data);
    for patch in patches {
        match patch {
            Patch::Sidx { payload, version } => {
                let mut offset = payload + 4; // reference_ID
                writer.set_u32(offset, timescale)?;
                offset += 4;
                offset += scale_versioned(&mut writer, offset, version, original, timescale)?;
                offset += if version == 1 { 8 } else { 4 }; // first_offset
                offset += 2; // reserved
                let count = writer.get_u16(offset)?;
                offset += 2;
                for _ in 0..count {
                    scale_u32(&mut writer, offset + 4, original, timescale)?;
                    offset += 12;
                }
            }
            Patch::Tfhd { payload, flags } => {
                let mut offset = payload + 4;
                if flags & tfhd_flags::BASE_DATA_OFFSET != 0 {
                    offset += 8;
                }
                if flags & tfhd_flags::SAMPLE_DESCRIPTION_INDEX != 0 {
                    offset += 4;
                }
                if flags & tfhd_flags::DEFAULT_SAMPLE_DURATION != 0 {
                    scale_u32(&mut writer, offset, original, timescale)?;
                }
            }
            Patch::Tfdt { payload, version } => {
                scale_versioned(&mut writer, payload, version, original, timescale)?;
            }
            Patch::Trun {
                payload,
                version,
                flags,
            } => rescale_trun(&mut writer, payload, version, flags, original, timescale)?,
            _ => {}
        }
    }
    Ok(())
}

fn rescale_trun(
    writer: &mut ByteWriter<'_>,
    payload: usize,
    version: u8,
    flags: u32,
    from: u32,
    to: u32,
) -> Result<()> {
    let count = writer.get_u32(payload)?;
    let mut offset = payload + 4;
    if flags & trun_flags::DATA_OFFSET != 0 {
        offset += 4;
    }
    if flags & trun_flags::FIRST_SAMPLE_FLAGS != 0 {
        offset += 4;
    }
    for _ in 0..count {
        if flags & trun_flags::SAMPLE_DURATION != 0 {
            scale_u32(writer, offset, from, to)?;
            offset += 4;
        }
        if flags & trun_flags::SAMPLE_SIZE != 0 {
            offset += 4;
        }
        if flags & trun_flags::SAMPLE_FLAGS != 0 {
            offset += 4;
        }
        if flags & trun_flags::SAMPLE_COMPOSITION_TIME_OFFSET != 0 {
            if version == 0 {
                scale_u32(writer, offset, from, to)?;
            } else {
                let original = i128::from(writer.get_i32(offset)?);
                let scaled = (original * i128::from(to)).div_euclid(i128::from(from.max(1)));
                let scaled = i32::try_from(scaled)
                    .map_err(|_| Error::Overflow("rescaled offset exceeds 32 bits"))?;
                writer.set_i32(offset, scaled)?;
            }
            offset += 4;
        }
    }
    Ok(())
}
