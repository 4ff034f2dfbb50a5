//! Per-representation caption extraction from fragmented MP4.
//!
//! A [`CaptionParser`] learns the codec and track timescales from the init
//! segment, then walks each media segment's `moof`/`mdat` pair to pull SEI
//! NAL units out of the samples and feed their caption payloads to a
//! [`CeaDecoder`].

use std::collections::{HashMap, HashSet};

use mediacheck_common::{CeaScheme, Cue};
use mediacheck_media::mp4::{
    children, parse_frma, parse_tfdt, parse_tfhd, parse_trun, sample_description,
    visual_sample_entry, TrunSample, Trun,
};
use mediacheck_media::{read_track_timescales, BoxParser, ByteReader, ParsedBox, TrackTimescales};
use tracing::{debug, warn};

use crate::decoder::CeaDecoder;
use crate::sei::{user_data_payloads, BitstreamFormat};
use crate::{CaptionError, Result};

/// Timescale used when a fragment's track is missing from the init segment.
pub const DEFAULT_TIMESCALE: u32 = 90_000;

const CODEC_BOXES: [&[u8; 4]; 8] = [
    b"avc1", b"avc3", b"dvav", b"dva1", b"hev1", b"hvc1", b"dvh1", b"dvhe",
];

/// One caption payload with its presentation time in seconds.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptionPacket {
    pub pts: f64,
    pub payload: Vec<u8>,
}

/// Caption decoding state for one representation.
#[derive(Debug)]
pub struct CaptionParser {
    scheme: CeaScheme,
    decoder: CeaDecoder,
    format: Option<BitstreamFormat>,
    tracks: TrackTimescales,
    parsed_ids: HashMap<String, HashSet<u64>>,
    current_period: Option<String>,
}

impl CaptionParser {
    pub fn new(scheme: CeaScheme) -> Self {
        Self {
            scheme,
            decoder: CeaDecoder::new(),
            format: None,
            tracks: TrackTimescales::default(),
            parsed_ids: HashMap::new(),
            current_period: None,
        }
    }

    pub fn scheme(&self) -> CeaScheme {
        self.scheme
    }

    /// Bitstream format found in the last init segment.
    pub fn bitstream_format(&self) -> Option<BitstreamFormat> {
        self.format
    }

    /// Forget the period, the consumed segment ids and all decoder state.
    pub fn clear(&mut self) {
        self.current_period = None;
        self.parsed_ids.clear();
        self.decoder.clear();
    }

    /// Read the codec and track timing of an init segment.
    ///
    /// An init segment for a period other than the current one resets the
    /// decoder first.
    pub fn parse_init(&mut self, data: &[u8], period_id: &str) -> Result<()> {
        if self.enter_period(period_id) {
            self.decoder.clear();
        }

        self.tracks = read_track_timescales(data)?;
        self.format = detect_bitstream_format(data)?;
        if self.format.is_none() {
            warn!(period_id, "unable to determine bitstream format for CEA parsing");
        }
        Ok(())
    }

    /// Decode the captions carried in one media segment.
    ///
    /// A segment id already consumed in this period yields nothing. Box or
    /// read errors are logged and the segment contributes no cues; decoder
    /// state is kept for the next segment.
    pub fn parse_media(&mut self, data: &[u8], segment_id: u64, period_id: &str) -> Vec<Cue> {
        self.enter_period(period_id);
        let seen = self.parsed_ids.entry(period_id.to_string()).or_default();
        if !seen.insert(segment_id) {
            debug!(segment_id, period_id, "segment already parsed");
            return Vec::new();
        }

        let Some(format) = self.format else {
            return Vec::new();
        };

        let packets = match scan_segment(data, format, &self.tracks) {
            Ok(packets) => packets,
            Err(e) => {
                warn!(segment_id, error = %e, "failed to parse segment for captions");
                return Vec::new();
            }
        };

        for packet in packets.iter().filter(|p| !p.payload.is_empty()) {
            if let Err(e) = self.decoder.extract(&packet.payload, packet.pts, self.scheme) {
                debug!(segment_id, pts = packet.pts, error = %e, "skipping caption payload");
            }
        }
        self.decoder.decode()
    }

    /// Record `period_id` as current, returning whether it changed.
    fn enter_period(&mut self, period_id: &str) -> bool {
        if self.current_period.as_deref() == Some(period_id) {
            return false;
        }
        self.current_period = Some(period_id.to_string());
        true
    }
}

#[derive(Default)]
struct CodecScan {
    format: Option<BitstreamFormat>,
}

fn set_format(scan: &mut CodecScan, codec: &str) {
    if let Some(format) = BitstreamFormat::from_codec(codec) {
        scan.format = Some(format);
    }
}

fn on_codec(parsed: &mut ParsedBox<'_, '_, CodecScan>, scan: &mut CodecScan) -> MediaResult {
    set_format(scan, parsed.box_type.as_str());
    Ok(())
}

fn on_frma(parsed: &mut ParsedBox<'_, '_, CodecScan>, scan: &mut CodecScan) -> MediaResult {
    let frma = parse_frma(parsed)?;
    set_format(scan, &frma.codec);
    Ok(())
}

/// Find the video bitstream format from the sample entries of an init
/// segment, looking through `encv` to the original format in `frma`.
pub fn detect_bitstream_format(init: &[u8]) -> Result<Option<BitstreamFormat>> {
    let mut builder = BoxParser::<CodecScan>::builder()
        .basic(b"moov", children)
        .basic(b"trak", children)
        .basic(b"mdia", children)
        .basic(b"minf", children)
        .basic(b"stbl", children)
        .full(b"stsd", sample_description)
        .basic(b"encv", visual_sample_entry)
        .basic(b"sinf", children)
        .basic(b"frma", on_frma);
    for name in CODEC_BOXES {
        builder = builder.basic(name, on_codec);
    }

    let mut scan = CodecScan::default();
    builder.build().parse(init, &mut scan)?;
    Ok(scan.format)
}

struct SegmentScan<'a> {
    format: BitstreamFormat,
    tracks: &'a TrackTimescales,
    moof_start: usize,
    truns: Vec<Trun>,
    default_duration: u32,
    default_size: u32,
    timescale: u32,
    base_media_decode_time: u64,
    packets: Vec<CaptionPacket>,
}

impl<'a> SegmentScan<'a> {
    fn new(format: BitstreamFormat, tracks: &'a TrackTimescales) -> Self {
        // Until a tfhd names the track, fall back to the first trex.
        let trex = tracks.trex.values().next();
        Self {
            format,
            tracks,
            moof_start: 0,
            truns: Vec::new(),
            default_duration: trex.map_or(0, |t| t.default_sample_duration),
            default_size: trex.map_or(0, |t| t.default_sample_size),
            timescale: DEFAULT_TIMESCALE,
            base_media_decode_time: 0,
            packets: Vec::new(),
        }
    }

    /// Walk the NAL units of the mdat payload, sample by sample.
    fn scan_mdat(&mut self, data: &[u8], payload_start: usize, end: usize) -> Result<()> {
        let samples: Vec<TrunSample> = self
            .truns
            .iter()
            .flat_map(|t| t.samples.iter().copied())
            .collect();
        let size_of = |sample: Option<&TrunSample>, default: u32| {
            i64::from(sample.and_then(|s| s.size).filter(|&s| s != 0).unwrap_or(default))
        };

        let data_offset = self.truns.first().and_then(|t| t.data_offset).unwrap_or(0);
        let start = (self.moof_start as i64 + i64::from(data_offset))
            .clamp(payload_start as i64, end as i64) as usize;
        let mut reader = ByteReader::big_endian(&data[..end]);
        reader.seek(start)?;

        let header_size = self.format.header_size();
        let mut sample_index = 0;
        let mut sample_size = size_of(samples.first(), self.default_size);

        while reader.has_more_data() {
            let nalu_size = reader.read_u32()? as usize;
            let header = reader.read_u8()?;
            if header_size > 1 {
                reader.skip(header_size - 1)?;
            }
            let body_len = nalu_size.saturating_sub(header_size);

            if self.format.is_sei(header) {
                let offset = samples
                    .get(sample_index)
                    .and_then(|s| s.composition_time_offset)
                    .unwrap_or(0);
                let pts = (i128::from(self.base_media_decode_time) + i128::from(offset)) as f64
                    / f64::from(self.timescale);
                for payload in user_data_payloads(reader.read_bytes(body_len)?) {
                    self.packets.push(CaptionPacket { pts, payload });
                }
            } else if reader.skip(body_len).is_err() {
                break;
            }

            sample_size -= nalu_size as i64 + 4;
            if sample_size <= 0 {
                let duration = samples
                    .get(sample_index)
                    .and_then(|s| s.duration)
                    .filter(|&d| d != 0)
                    .unwrap_or(self.default_duration);
                self.base_media_decode_time = self
                    .base_media_decode_time
                    .checked_add(u64::from(duration))
                    .ok_or_else(|| {
                        mediacheck_media::Error::invalid_box("sample decode time overflows 64 bits")
                    })?;
                sample_index += 1;
                sample_size = size_of(samples.get(sample_index), self.default_size);
            }
        }
        Ok(())
    }
}

type MediaResult = std::result::Result<(), mediacheck_media::Error>;

fn on_moof<'a>(
    parsed: &mut ParsedBox<'_, '_, SegmentScan<'a>>,
    scan: &mut SegmentScan<'a>,
) -> MediaResult {
    scan.moof_start = parsed.start;
    scan.truns.clear();
    children(parsed, scan)
}

fn on_tfhd<'a>(
    parsed: &mut ParsedBox<'_, '_, SegmentScan<'a>>,
    scan: &mut SegmentScan<'a>,
) -> MediaResult {
    let tfhd = parse_tfhd(parsed)?;
    let trex = scan.tracks.trex.get(&tfhd.track_id);
    scan.default_duration = tfhd
        .default_sample_duration
        .filter(|&d| d != 0)
        .or(trex.map(|t| t.default_sample_duration))
        .unwrap_or(scan.default_duration);
    scan.default_size = tfhd
        .default_sample_size
        .filter(|&s| s != 0)
        .or(trex.map(|t| t.default_sample_size))
        .unwrap_or(scan.default_size);
    if let Some(timescale) = scan.tracks.timescale(tfhd.track_id) {
        scan.timescale = timescale;
    }
    Ok(())
}

fn on_tfdt<'a>(
    parsed: &mut ParsedBox<'_, '_, SegmentScan<'a>>,
    scan: &mut SegmentScan<'a>,
) -> MediaResult {
    scan.base_media_decode_time = parse_tfdt(parsed)?.base_media_decode_time;
    Ok(())
}

fn on_trun<'a>(
    parsed: &mut ParsedBox<'_, '_, SegmentScan<'a>>,
    scan: &mut SegmentScan<'a>,
) -> MediaResult {
    let trun = parse_trun(parsed)?;
    scan.truns.push(trun);
    Ok(())
}

fn on_mdat<'a>(
    parsed: &mut ParsedBox<'_, '_, SegmentScan<'a>>,
    scan: &mut SegmentScan<'a>,
) -> MediaResult {
    let data = parsed.reader.data();
    match scan.scan_mdat(data, parsed.payload_start(), parsed.end()) {
        Err(CaptionError::Media(e)) if !e.is_bounds() => Err(e),
        Err(e) => {
            debug!(error = %e, "stopping SEI scan early");
            Ok(())
        }
        Ok(()) => Ok(()),
    }
}

/// Collect the caption payloads of every SEI NAL unit in a media segment.
pub fn scan_segment(
    data: &[u8],
    format: BitstreamFormat,
    tracks: &TrackTimescales,
) -> Result<Vec<CaptionPacket>> {
    let parser = BoxParser::<SegmentScan<'_>>::builder()
        .basic(b"moof", on_moof)
        .basic(b"traf", children)
        .full(b"tfhd", on_tfhd)
        .full(b"tfdt", on_tfdt)
        .full(b"trun", on_trun)
        .basic(b"mdat", on_mdat)
        .build();

    let mut scan = SegmentScan::new(format, tracks);
    parser.parse(data, &mut scan)?;
    Ok(scan.packets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mediacheck_media::{InitSegmentBuilder, MoofBuilder, SampleSpec};

    fn sei_nal(payload: &[u8]) -> Vec<u8> {
        // NAL header, payload type 4, size, payload, rbsp trailing bits.
        let mut nal = vec![0x06, 0x04, payload.len() as u8];
        nal.extend_from_slice(payload);
        nal.push(0x80);
        let mut sample = (nal.len() as u32).to_be_bytes().to_vec();
        sample.extend(nal);
        sample
    }

    fn other_nal() -> Vec<u8> {
        let mut sample = 5u32.to_be_bytes().to_vec();
        sample.extend_from_slice(&[0x65, 0x88, 0x84, 0x00, 0x10]);
        sample
    }

    #[test]
    fn test_detect_bitstream_format() {
        let avc = InitSegmentBuilder::new().build();
        assert_eq!(detect_bitstream_format(&avc).unwrap(), Some(BitstreamFormat::H264));

        let hevc = InitSegmentBuilder::new().codec(b"hvc1").build();
        assert_eq!(detect_bitstream_format(&hevc).unwrap(), Some(BitstreamFormat::H265));

        let unknown = InitSegmentBuilder::new().codec(b"mp4v").build();
        assert_eq!(detect_bitstream_format(&unknown).unwrap(), None);
    }

    #[test]
    fn test_detect_format_through_encv() {
        let init = InitSegmentBuilder::new().codec(b"hev1").encrypted(true).build();
        assert_eq!(detect_bitstream_format(&init).unwrap(), Some(BitstreamFormat::H265));
    }

    #[test]
    fn test_scan_segment_times_sei_by_sample() {
        let tracks = read_track_timescales(&InitSegmentBuilder::new().build()).unwrap();
        let mut second = other_nal();
        second.extend(sei_nal(&[0xAA, 0xBB]));
        let segment = MoofBuilder::new(1, 1)
            .base_media_decode_time(90_000)
            .sample(SampleSpec::new(sei_nal(&[0x01])).duration(3000))
            .sample(SampleSpec::new(second).duration(3000).composition_offset(1500))
            .build();

        let packets = scan_segment(&segment, BitstreamFormat::H264, &tracks).unwrap();
        assert_eq!(packets.len(), 2);
        assert_eq!(packets[0].pts, 1.0);
        assert_eq!(packets[0].payload, vec![0x01]);
        assert_eq!(packets[1].pts, (90_000.0 + 3000.0 + 1500.0) / 90_000.0);
        assert_eq!(packets[1].payload, vec![0xAA, 0xBB]);
    }

    #[test]
    fn test_truncated_mdat_keeps_earlier_packets() {
        let tracks = TrackTimescales::default();
        let mut data = sei_nal(&[0x07]);
        // A NAL claiming more bytes than the mdat holds.
        data.extend_from_slice(&[0x00, 0x00, 0x10, 0x00, 0x06, 0x04]);
        let segment = MoofBuilder::new(1, 1)
            .sample(SampleSpec::new(data).duration(1000))
            .build();
        let packets = scan_segment(&segment, BitstreamFormat::H264, &tracks).unwrap();
        assert_eq!(packets.len(), 1);
        assert_eq!(packets[0].payload, vec![0x07]);
    }

    #[test]
    fn test_unknown_format_yields_nothing() {
        let mut parser = CaptionParser::new(CeaScheme::Cea608);
        let init = InitSegmentBuilder::new().codec(b"mp4v").build();
        parser.parse_init(&init, "p0").unwrap();
        assert_eq!(parser.bitstream_format(), None);
        let segment = MoofBuilder::new(1, 1)
            .sample(SampleSpec::new(sei_nal(&[0x01])).duration(1000))
            .build();
        assert!(parser.parse_media(&segment, 1, "p0").is_empty());
    }

    #[test]
    fn test_unrecognised_init_clears_format() {
        let mut parser = CaptionParser::new(CeaScheme::Cea608);
        parser.parse_init(&InitSegmentBuilder::new().build(), "p0").unwrap();
        assert_eq!(parser.bitstream_format(), Some(BitstreamFormat::H264));

        let init = InitSegmentBuilder::new().codec(b"mp4v").build();
        parser.parse_init(&init, "p1").unwrap();
        assert_eq!(parser.bitstream_format(), None);
    }

    #[test]
    fn test_corrupt_segment_yields_no_cues() {
        let mut parser = CaptionParser::new(CeaScheme::Cea608);
        parser.parse_init(&InitSegmentBuilder::new().build(), "p0").unwrap();
        // moof header claiming a 64-bit size with no room for it.
        let corrupt = [0x00, 0x00, 0x00, 0x01, b'm', b'o', b'o', b'f', 0x00];
        assert!(parser.parse_media(&corrupt, 1, "p0").is_empty());
    }

    #[test]
    fn test_period_tracking() {
        let mut parser = CaptionParser::new(CeaScheme::Cea708);
        assert!(parser.enter_period("a"));
        assert!(!parser.enter_period("a"));
        assert!(parser.enter_period("b"));
        parser.clear();
        assert!(parser.enter_period("b"));
    }
}
