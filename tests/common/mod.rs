//! Shared fixture builders for integration tests.
//!
//! Segments are synthesized with the fMP4 builders from `mediacheck-media`
//! and carry CEA-608 captions in H.264 SEI NAL units.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use bytes::{BufMut, BytesMut};
use mediacheck_media::{InitSegmentBuilder, MoofBuilder, SampleSpec};

pub const RCL: (u8, u8) = (0x14, 0x20);
pub const EOC: (u8, u8) = (0x14, 0x2F);
pub const EDM: (u8, u8) = (0x14, 0x2C);

fn odd_parity(b: u8) -> u8 {
    if b.count_ones() % 2 == 1 {
        b
    } else {
        b | 0x80
    }
}

/// Length-prefixed SEI NAL unit holding one `cc_data` message.
pub fn sei_sample(pairs: &[(u8, u8)]) -> Vec<u8> {
    let mut cc = BytesMut::new();
    cc.put_u8(0xB5);
    cc.put_u16(0x0031);
    cc.put_slice(b"GA94");
    cc.put_u8(0x03);
    cc.put_u8(0x40 | pairs.len() as u8);
    cc.put_u8(0xFF);
    for &(b1, b2) in pairs {
        cc.put_u8(0xFC);
        cc.put_u8(odd_parity(b1));
        cc.put_u8(odd_parity(b2));
    }
    cc.put_u8(0xFF);

    let mut sample = BytesMut::new();
    sample.put_u32(cc.len() as u32 + 4);
    sample.put_slice(&[0x06, 0x04, cc.len() as u8]);
    sample.put_slice(&cc);
    sample.put_u8(0x80);
    sample.to_vec()
}

/// Write an init segment and two media segments producing one "Hi" cue
/// from 0 s to 2 s. Returns `(init, [segment1, segment2])`.
pub fn write_caption_fixture(dir: &Path) -> (PathBuf, Vec<PathBuf>) {
    let init = dir.join("init.mp4");
    std::fs::write(&init, InitSegmentBuilder::new().timescale(90_000).build()).unwrap();

    let first = MoofBuilder::new(1, 1)
        .base_media_decode_time(0)
        .sample(SampleSpec::new(sei_sample(&[RCL, (b'H', b'i'), EOC])).duration(180_000))
        .build();
    let second = MoofBuilder::new(2, 1)
        .base_media_decode_time(180_000)
        .sample(SampleSpec::new(sei_sample(&[EDM])).duration(180_000))
        .build();

    let paths = vec![dir.join("seg-1.m4s"), dir.join("seg-2.m4s")];
    std::fs::write(&paths[0], first).unwrap();
    std::fs::write(&paths[1], second).unwrap();
    (init, paths)
}
