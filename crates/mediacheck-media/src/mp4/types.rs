//! Four-character box type codes.

use std::fmt;

/// Four-character box type code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BoxType(pub [u8; 4]);

impl BoxType {
    pub const FTYP: Self = Self(*b"ftyp");
    pub const MOOV: Self = Self(*b"moov");
    pub const MVHD: Self = Self(*b"mvhd");
    pub const MVEX: Self = Self(*b"mvex");
    pub const MEHD: Self = Self(*b"mehd");
    pub const TREX: Self = Self(*b"trex");
    pub const TRAK: Self = Self(*b"trak");
    pub const TKHD: Self = Self(*b"tkhd");
    pub const EDTS: Self = Self(*b"edts");
    pub const ELST: Self = Self(*b"elst");
    pub const MDIA: Self = Self(*b"mdia");
    pub const MDHD: Self = Self(*b"mdhd");
    pub const MINF: Self = Self(*b"minf");
    pub const STBL: Self = Self(*b"stbl");
    pub const STSD: Self = Self(*b"stsd");
    pub const SIDX: Self = Self(*b"sidx");
    pub const MOOF: Self = Self(*b"moof");
    pub const TRAF: Self = Self(*b"traf");
    pub const TFHD: Self = Self(*b"tfhd");
    pub const TFDT: Self = Self(*b"tfdt");
    pub const TRUN: Self = Self(*b"trun");
    pub const MDAT: Self = Self(*b"mdat");
    pub const EMSG: Self = Self(*b"emsg");
    pub const PRFT: Self = Self(*b"prft");

    // Sample entries
    pub const AVC1: Self = Self(*b"avc1");
    pub const AVC3: Self = Self(*b"avc3");
    pub const DVAV: Self = Self(*b"dvav");
    pub const DVA1: Self = Self(*b"dva1");
    pub const HEV1: Self = Self(*b"hev1");
    pub const HVC1: Self = Self(*b"hvc1");
    pub const DVH1: Self = Self(*b"dvh1");
    pub const DVHE: Self = Self(*b"dvhe");
    pub const ENCV: Self = Self(*b"encv");

    // Protection
    pub const SINF: Self = Self(*b"sinf");
    pub const FRMA: Self = Self(*b"frma");
    pub const SCHI: Self = Self(*b"schi");
    pub const TENC: Self = Self(*b"tenc");

    // WebVTT in MP4
    pub const PAYL: Self = Self(*b"payl");
    pub const IDEN: Self = Self(*b"iden");

    /// Create from bytes.
    pub const fn from_bytes(bytes: [u8; 4]) -> Self {
        Self(bytes)
    }

    /// Get the 4-char code as a string.
    pub fn as_str(&self) -> &str {
        std::str::from_utf8(&self.0).unwrap_or("????")
    }
}

impl fmt::Display for BoxType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<&[u8; 4]> for BoxType {
    fn from(bytes: &[u8; 4]) -> Self {
        Self(*bytes)
    }
}
