//! Fragmented MP4 (fMP4) serialization.
//!
//! This module synthesizes small but well-formed fMP4 structures:
//! - Init segment (ftyp + moov with one video track and mvex/trex)
//! - Media segment (moof + mdat) via [`MoofBuilder`]
//! - Event message boxes via [`build_emsg`]

mod moof;

pub use moof::{MoofBuilder, SampleSpec};

use bytes::{BufMut, BytesMut};

/// Write a box header with a placeholder size and return its start offset.
pub(crate) fn begin_box(buf: &mut BytesMut, name: &[u8; 4]) -> usize {
    let start = buf.len();
    buf.put_u32(0); // placeholder
    buf.put_slice(name);
    start
}

/// Write a full box header with a placeholder size.
pub(crate) fn begin_full_box(buf: &mut BytesMut, name: &[u8; 4], version: u8, flags: u32) -> usize {
    let start = begin_box(buf, name);
    buf.put_u32((u32::from(version) << 24) | (flags & 0x00FF_FFFF));
    start
}

/// Patch the size field of a box opened with [`begin_box`].
pub(crate) fn end_box(buf: &mut BytesMut, start: usize) {
    let size = (buf.len() - start) as u32;
    buf[start..start + 4].copy_from_slice(&size.to_be_bytes());
}

/// Builder for creating single-video-track init segments.
pub struct InitSegmentBuilder {
    track_id: u32,
    timescale: u32,
    width: u16,
    height: u16,
    codec: [u8; 4],
    encrypted: bool,
    trex_duration: u32,
    trex_size: u32,
}

impl Default for InitSegmentBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl InitSegmentBuilder {
    /// Create a new builder for an `avc1` track 1 at 90 kHz.
    pub fn new() -> Self {
        Self {
            track_id: 1,
            timescale: 90000,
            width: 1920,
            height: 1080,
            codec: *b"avc1",
            encrypted: false,
            trex_duration: 0,
            trex_size: 0,
        }
    }

    pub fn track_id(mut self, track_id: u32) -> Self {
        self.track_id = track_id;
        self
    }

    /// Set media timescale.
    pub fn timescale(mut self, ts: u32) -> Self {
        self.timescale = ts;
        self
    }

    /// Set the sample entry fourcc (`avc1`, `hvc1`, ...).
    pub fn codec(mut self, codec: &[u8; 4]) -> Self {
        self.codec = *codec;
        self
    }

    /// Wrap the sample entry in `encv` with the codec recorded in `frma`.
    pub fn encrypted(mut self, encrypted: bool) -> Self {
        self.encrypted = encrypted;
        self
    }

    /// Set trex default sample duration and size.
    pub fn trex_defaults(mut self, duration: u32, size: u32) -> Self {
        self.trex_duration = duration;
        self.trex_size = size;
        self
    }

    /// Build the init segment.
    pub fn build(self) -> Vec<u8> {
        let mut buf = BytesMut::with_capacity(1024);
        self.write_ftyp(&mut buf);
        self.write_moov(&mut buf);
        buf.to_vec()
    }

    fn write_ftyp(&self, buf: &mut BytesMut) {
        let start = begin_box(buf, b"ftyp");
        buf.put_slice(b"iso6"); // major brand
        buf.put_u32(0); // minor version
        for brand in [b"iso6", b"cmfc", b"dash"] {
            buf.put_slice(brand);
        }
        end_box(buf, start);
    }

    fn write_moov(&self, buf: &mut BytesMut) {
        let moov = begin_box(buf, b"moov");
        self.write_mvhd(buf);

        let trak = begin_box(buf, b"trak");
        self.write_tkhd(buf);
        let mdia = begin_box(buf, b"mdia");
        self.write_mdhd(buf);
        self.write_hdlr(buf);
        let minf = begin_box(buf, b"minf");
        let stbl = begin_box(buf, b"stbl");
        self.write_stsd(buf);
        for name in [b"stts", b"stsc", b"stco"] {
            let empty = begin_full_box(buf, name, 0, 0);
            buf.put_u32(0); // entry count
            end_box(buf, empty);
        }
        let stsz = begin_full_box(buf, b"stsz", 0, 0);
        buf.put_u32(0); // sample size
        buf.put_u32(0); // sample count
        end_box(buf, stsz);
        end_box(buf, stbl);
        end_box(buf, minf);
        end_box(buf, mdia);
        end_box(buf, trak);

        let mvex = begin_box(buf, b"mvex");
        let trex = begin_full_box(buf, b"trex", 0, 0);
        buf.put_u32(self.track_id);
        buf.put_u32(1); // default sample description index
        buf.put_u32(self.trex_duration);
        buf.put_u32(self.trex_size);
        buf.put_u32(0); // default sample flags
        end_box(buf, trex);
        end_box(buf, mvex);

        end_box(buf, moov);
    }

    fn write_mvhd(&self, buf: &mut BytesMut) {
        let start = begin_full_box(buf, b"mvhd", 0, 0);
        buf.put_u32(0); // creation time
        buf.put_u32(0); // modification time
        buf.put_u32(1000); // movie timescale
        buf.put_u32(0); // duration
        buf.put_u32(0x00010000); // rate = 1.0
        buf.put_u16(0x0100); // volume = 1.0
        buf.put_slice(&[0; 10]); // reserved
        put_identity_matrix(buf);
        buf.put_slice(&[0; 24]); // pre-defined
        buf.put_u32(self.track_id + 1); // next track ID
        end_box(buf, start);
    }

    fn write_tkhd(&self, buf: &mut BytesMut) {
        let start = begin_full_box(buf, b"tkhd", 1, 7);
        buf.put_u64(0); // creation time
        buf.put_u64(0); // modification time
        buf.put_u32(self.track_id);
        buf.put_u32(0); // reserved
        buf.put_u64(0); // duration
        buf.put_u64(0); // reserved
        buf.put_u16(0); // layer
        buf.put_u16(0); // alternate group
        buf.put_u16(0); // volume
        buf.put_u16(0); // reserved
        put_identity_matrix(buf);
        buf.put_u32(u32::from(self.width) << 16);
        buf.put_u32(u32::from(self.height) << 16);
        end_box(buf, start);
    }

    fn write_mdhd(&self, buf: &mut BytesMut) {
        let start = begin_full_box(buf, b"mdhd", 1, 0);
        buf.put_u64(0); // creation time
        buf.put_u64(0); // modification time
        buf.put_u32(self.timescale);
        buf.put_u64(0); // duration
        buf.put_u16(0x55C4); // language: und
        buf.put_u16(0); // pre_defined
        end_box(buf, start);
    }

    fn write_hdlr(&self, buf: &mut BytesMut) {
        let start = begin_full_box(buf, b"hdlr", 0, 0);
        buf.put_u32(0); // pre_defined
        buf.put_slice(b"vide");
        buf.put_slice(&[0; 12]); // reserved
        buf.put_slice(b"VideoHandler\0");
        end_box(buf, start);
    }

    fn write_stsd(&self, buf: &mut BytesMut) {
        let stsd = begin_full_box(buf, b"stsd", 0, 0);
        buf.put_u32(1); // entry count

        let entry_name = if self.encrypted { b"encv" } else { &self.codec };
        let entry = begin_box(buf, entry_name);
        buf.put_slice(&[0; 6]); // reserved
        buf.put_u16(1); // data reference index
        buf.put_slice(&[0; 16]); // pre_defined + reserved
        buf.put_u16(self.width);
        buf.put_u16(self.height);
        buf.put_u32(0x00480000); // 72 dpi horizontal
        buf.put_u32(0x00480000); // 72 dpi vertical
        buf.put_u32(0); // reserved
        buf.put_u16(1); // frame count
        buf.put_slice(&[0; 32]); // compressor name
        buf.put_u16(0x0018); // depth
        buf.put_i16(-1); // pre_defined

        let config_name = if self.codec.starts_with(b"h") || self.codec.starts_with(b"dvh") {
            b"hvcC"
        } else {
            b"avcC"
        };
        let config = begin_box(buf, config_name);
        buf.put_slice(&[1, 0x64, 0, 0x28, 0xFF, 0xE0, 0]);
        end_box(buf, config);

        if self.encrypted {
            let sinf = begin_box(buf, b"sinf");
            let frma = begin_box(buf, b"frma");
            buf.put_slice(&self.codec);
            end_box(buf, frma);
            let schm = begin_full_box(buf, b"schm", 0, 0);
            buf.put_slice(b"cenc");
            buf.put_u32(0x00010000);
            end_box(buf, schm);
            let schi = begin_box(buf, b"schi");
            let tenc = begin_full_box(buf, b"tenc", 0, 0);
            buf.put_u8(0); // reserved
            buf.put_u8(0); // reserved
            buf.put_u8(1); // is protected
            buf.put_u8(8); // per-sample IV size
            buf.put_slice(&[0x11; 16]); // default KID
            end_box(buf, tenc);
            end_box(buf, schi);
            end_box(buf, sinf);
        }

        end_box(buf, entry);
        end_box(buf, stsd);
    }
}

fn put_identity_matrix(buf: &mut BytesMut) {
    for value in [0x00010000u32, 0, 0, 0, 0x00010000, 0, 0, 0, 0x40000000] {
        buf.put_u32(value);
    }
}

/// Serialize a version 0 emsg box.
pub fn build_emsg(
    scheme_id_uri: &str,
    value: &str,
    timescale: u32,
    presentation_time_delta: u32,
    event_duration: u32,
    id: u32,
    message_data: &[u8],
) -> Vec<u8> {
    let mut buf = BytesMut::new();
    let start = begin_full_box(&mut buf, b"emsg", 0, 0);
    buf.put_slice(scheme_id_uri.as_bytes());
    buf.put_u8(0);
    buf.put_slice(value.as_bytes());
    buf.put_u8(0);
    buf.put_u32(timescale);
    buf.put_u32(presentation_time_delta);
    buf.put_u32(event_duration);
    buf.put_u32(id);
    buf.put_slice(message_data);
    end_box(&mut buf, start);
    buf.to_vec()
}
