//! Movie fragment (moof) box builder.

use super::{begin_box, begin_full_box, end_box};
use crate::mp4::trun_flags;
use bytes::{BufMut, BytesMut};

/// One sample of a synthesized fragment.
#[derive(Debug, Clone, Default)]
pub struct SampleSpec {
    pub data: Vec<u8>,
    pub duration: u32,
    pub composition_offset: i32,
}

impl SampleSpec {
    pub fn new(data: Vec<u8>) -> Self {
        Self {
            data,
            ..Self::default()
        }
    }

    pub fn duration(mut self, duration: u32) -> Self {
        self.duration = duration;
        self
    }

    pub fn composition_offset(mut self, offset: i32) -> Self {
        self.composition_offset = offset;
        self
    }
}

/// Builder for moof + mdat media segments.
pub struct MoofBuilder {
    sequence_number: u32,
    track_id: u32,
    base_media_decode_time: u64,
    samples: Vec<SampleSpec>,
}

impl MoofBuilder {
    /// Create a new moof builder.
    pub fn new(sequence_number: u32, track_id: u32) -> Self {
        Self {
            sequence_number,
            track_id,
            base_media_decode_time: 0,
            samples: Vec::new(),
        }
    }

    /// Set base media decode time.
    pub fn base_media_decode_time(mut self, time: u64) -> Self {
        self.base_media_decode_time = time;
        self
    }

    /// Append a sample.
    pub fn sample(mut self, sample: SampleSpec) -> Self {
        self.samples.push(sample);
        self
    }

    /// Build the moof box followed by an mdat holding every sample's data.
    pub fn build(self) -> Vec<u8> {
        let data_size: usize = self.samples.iter().map(|s| s.data.len()).sum();
        let mut buf = BytesMut::with_capacity(256 + self.samples.len() * 16 + data_size);

        self.write_moof(&mut buf);

        let mdat = begin_box(&mut buf, b"mdat");
        for sample in &self.samples {
            buf.put_slice(&sample.data);
        }
        end_box(&mut buf, mdat);

        buf.to_vec()
    }

    fn write_moof(&self, buf: &mut BytesMut) {
        let moof = begin_box(buf, b"moof");

        // mfhd (movie fragment header)
        let mfhd = begin_full_box(buf, b"mfhd", 0, 0);
        buf.put_u32(self.sequence_number);
        end_box(buf, mfhd);

        let traf = begin_box(buf, b"traf");

        // Flags: default-base-is-moof (0x020000)
        let tfhd = begin_full_box(buf, b"tfhd", 0, 0x020000);
        buf.put_u32(self.track_id);
        end_box(buf, tfhd);

        // Version 1 for 64-bit decode time
        let tfdt = begin_full_box(buf, b"tfdt", 1, 0);
        buf.put_u64(self.base_media_decode_time);
        end_box(buf, tfdt);

        let flags = trun_flags::DATA_OFFSET
            | trun_flags::SAMPLE_DURATION
            | trun_flags::SAMPLE_SIZE
            | trun_flags::SAMPLE_COMPOSITION_TIME_OFFSET;
        let trun = begin_full_box(buf, b"trun", 1, flags);
        buf.put_u32(self.samples.len() as u32);
        let data_offset_pos = buf.len();
        buf.put_i32(0); // placeholder
        for sample in &self.samples {
            buf.put_u32(sample.duration);
            buf.put_u32(sample.data.len() as u32);
            buf.put_i32(sample.composition_offset);
        }
        end_box(buf, trun);

        end_box(buf, traf);
        end_box(buf, moof);

        // With default-base-is-moof, data_offset counts from the moof start
        // to the first mdat payload byte.
        let data_offset = (buf.len() - moof + 8) as i32;
        buf[data_offset_pos..data_offset_pos + 4].copy_from_slice(&data_offset.to_be_bytes());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_moof_builder() {
        let segment = MoofBuilder::new(1, 1)
            .base_media_decode_time(0)
            .sample(SampleSpec::new(vec![1, 2, 3]).duration(3000))
            .sample(SampleSpec::new(vec![4, 5]).duration(3000).composition_offset(1500))
            .build();

        // Check moof header
        assert_eq!(&segment[4..8], b"moof");
        let moof_size = u32::from_be_bytes([segment[0], segment[1], segment[2], segment[3]]) as usize;

        // mdat follows the moof and carries the sample bytes
        assert_eq!(&segment[moof_size + 4..moof_size + 8], b"mdat");
        assert_eq!(&segment[moof_size + 8..], &[1, 2, 3, 4, 5]);
    }
}
