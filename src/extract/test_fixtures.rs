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

/// H.264 SEI sample carrying CEA-608 field 1 pairs.
pub fn cea608_sample(pairs: &[(u8, u8)]) -> Vec<u8> {
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

pub fn init_segment() -> Vec<u8> {
    InitSegmentBuilder::new().timescale(90_000).build()
}

/// One-sample media segment starting at `seconds`.
pub fn media_segment(sequence: u32, seconds: u64, pairs: &[(u8, u8)]) -> Vec<u8> {
    MoofBuilder::new(sequence, 1)
        .base_media_decode_time(seconds * 90_000)
        .sample(SampleSpec::new(cea608_sample(pairs)).duration(90_000))
        .build()
}
