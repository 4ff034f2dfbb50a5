//! End-to-end caption extraction over synthesized fMP4 segments.

use assert_matches::assert_matches;
use bytes::{BufMut, BytesMut};
use mediacheck_captions::{CaptionError, CaptionParser};
use mediacheck_common::CeaScheme;
use mediacheck_media::{InitSegmentBuilder, MoofBuilder, SampleSpec};

const RCL: (u8, u8) = (0x14, 0x20);
const EOC: (u8, u8) = (0x14, 0x2F);
const EDM: (u8, u8) = (0x14, 0x2C);

fn odd(b: u8) -> u8 {
    if b.count_ones() % 2 == 1 {
        b
    } else {
        b | 0x80
    }
}

/// ATSC A/53 `cc_data` carrying field 1 pairs.
fn cc_data(pairs: &[(u8, u8)]) -> Vec<u8> {
    let mut buf = BytesMut::new();
    buf.put_u8(0xB5);
    buf.put_u16(0x0031);
    buf.put_slice(b"GA94");
    buf.put_u8(0x03);
    buf.put_u8(0x40 | pairs.len() as u8);
    buf.put_u8(0xFF);
    for &(b1, b2) in pairs {
        buf.put_u8(0xFC);
        buf.put_u8(odd(b1));
        buf.put_u8(odd(b2));
    }
    buf.put_u8(0xFF);
    buf.to_vec()
}

/// Length-prefixed H.264 SEI NAL unit; `prefix` is raw RBSP placed before
/// the caption message.
fn sei_sample(prefix: &[u8], payload: &[u8]) -> Vec<u8> {
    let mut nal = BytesMut::new();
    nal.put_u8(0x06);
    nal.put_slice(prefix);
    nal.put_u8(0x04);
    nal.put_u8(payload.len() as u8);
    nal.put_slice(payload);
    nal.put_u8(0x80);

    let mut sample = BytesMut::new();
    sample.put_u32(nal.len() as u32);
    sample.put_slice(&nal);
    sample.to_vec()
}

fn segment(sequence: u32, decode_time: u64, sample: Vec<u8>) -> Vec<u8> {
    MoofBuilder::new(sequence, 1)
        .base_media_decode_time(decode_time)
        .sample(SampleSpec::new(sample).duration(3000))
        .build()
}

fn loaded_parser() -> CaptionParser {
    let mut parser = CaptionParser::new(CeaScheme::Cea608);
    let init = InitSegmentBuilder::new().timescale(90_000).build();
    parser.parse_init(&init, "p0").unwrap();
    parser
}

#[test]
fn test_pop_on_caption_from_sei() {
    let mut parser = loaded_parser();

    let first = segment(1, 0, sei_sample(&[], &cc_data(&[RCL, (b'H', b'i'), EOC])));
    assert!(parser.parse_media(&first, 1, "p0").is_empty());

    let second = segment(2, 90_000, sei_sample(&[], &cc_data(&[EDM])));
    let cues = parser.parse_media(&second, 2, "p0");
    assert_eq!(cues.len(), 1);
    assert_eq!(cues[0].raw_text, "Hi");
    assert_eq!(cues[0].begin, 0.0);
    assert_eq!(cues[0].end, 1.0);
    assert_eq!(cues[0].id, "0_1_CC1");
    assert_eq!(cues[0].stream(), "CC1");
}

#[test]
fn test_repeated_segment_is_skipped() {
    let mut parser = loaded_parser();
    let first = segment(1, 0, sei_sample(&[], &cc_data(&[RCL, (b'H', b'i'), EOC])));
    let second = segment(2, 90_000, sei_sample(&[], &cc_data(&[EDM])));

    parser.parse_media(&first, 1, "p0");
    assert_eq!(parser.parse_media(&second, 2, "p0").len(), 1);
    assert!(parser.parse_media(&second, 2, "p0").is_empty());
    assert!(parser.parse_media(&first, 1, "p0").is_empty());
}

#[test]
fn test_new_period_resets_decoder() {
    let mut parser = loaded_parser();
    let first = segment(1, 0, sei_sample(&[], &cc_data(&[RCL, (b'H', b'i'), EOC])));
    parser.parse_media(&first, 1, "p0");

    let init = InitSegmentBuilder::new().build();
    parser.parse_init(&init, "p1").unwrap();
    let second = segment(2, 90_000, sei_sample(&[], &cc_data(&[EDM])));
    assert!(parser.parse_media(&second, 2, "p1").is_empty());
}

#[test]
fn test_emulation_prevention_before_sei_parsing() {
    let mut parser = loaded_parser();
    // Unregistered message type 5 whose three RBSP bytes are 00 00 01,
    // escaped on the wire as 00 00 03 01.
    let prefix = [0x05, 0x03, 0x00, 0x00, 0x03, 0x01];
    let first = segment(
        1,
        0,
        sei_sample(&prefix, &cc_data(&[RCL, (b'O', b'k'), EOC])),
    );
    parser.parse_media(&first, 1, "p0");

    let second = segment(2, 45_000, sei_sample(&[], &cc_data(&[EDM])));
    let cues = parser.parse_media(&second, 2, "p0");
    assert_eq!(cues.len(), 1);
    assert_eq!(cues[0].raw_text, "Ok");
    assert_eq!(cues[0].end, 0.5);
}

#[test]
fn test_cea708_parser_ignores_608_pairs() {
    let mut parser = CaptionParser::new(CeaScheme::Cea708);
    parser
        .parse_init(&InitSegmentBuilder::new().build(), "p0")
        .unwrap();
    let first = segment(1, 0, sei_sample(&[], &cc_data(&[RCL, (b'H', b'i'), EOC])));
    let second = segment(2, 90_000, sei_sample(&[], &cc_data(&[EDM])));
    assert!(parser.parse_media(&first, 1, "p0").is_empty());
    assert!(parser.parse_media(&second, 2, "p0").is_empty());
}

#[test]
fn test_truncated_init_is_an_error() {
    let mut parser = CaptionParser::new(CeaScheme::Cea608);
    let init = InitSegmentBuilder::new().build();
    let err = parser.parse_init(&init[..init.len() - 20], "p0");
    assert_matches!(err, Err(CaptionError::Media(_)));
}

#[test]
fn test_decode_time_overflow_skips_segment() {
    let mut parser = loaded_parser();
    let huge = segment(
        1,
        u64::MAX - 10,
        sei_sample(&[], &cc_data(&[RCL, (b'H', b'i'), EOC])),
    );
    assert!(parser.parse_media(&huge, 1, "p0").is_empty());

    // The parser stays usable for the following segments.
    let second = segment(2, 0, sei_sample(&[], &cc_data(&[RCL, (b'O', b'k'), EOC])));
    assert!(parser.parse_media(&second, 2, "p0").is_empty());
    let third = segment(3, 90_000, sei_sample(&[], &cc_data(&[EDM])));
    let cues = parser.parse_media(&third, 3, "p0");
    assert_eq!(cues.len(), 1);
    assert_eq!(cues[0].raw_text, "Ok");
}
