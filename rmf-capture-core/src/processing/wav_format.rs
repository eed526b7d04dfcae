//! RIFF/WAVE helpers for captured PCM.
//!
//! Only the canonical 44-byte PCM header is produced. The data size is not
//! known until capture ends, so writers emit a placeholder header first and
//! patch the two size fields on finalize.

use crate::models::audio_models::StreamFormat;

/// Size of the canonical WAV header in bytes.
pub const WAV_HEADER_SIZE: usize = 44;

const RIFF_SIZE_OFFSET: usize = 4;
const DATA_SIZE_OFFSET: usize = 40;

/// Build a 44-byte header for `format` carrying `data_size` bytes of PCM.
///
/// ```text
/// [0-3]    "RIFF"
/// [4-7]    36 + data_size
/// [8-11]   "WAVE"
/// [12-15]  "fmt "
/// [16-19]  16
/// [20-21]  1 (PCM)
/// [22-23]  channels
/// [24-27]  sample_rate
/// [28-31]  byte_rate
/// [32-33]  block_align
/// [34-35]  bits_per_sample
/// [36-39]  "data"
/// [40-43]  data_size
/// ```
pub fn header_for(format: &StreamFormat, data_size: u32) -> [u8; WAV_HEADER_SIZE] {
    let layout = format.layout;
    let block_align = layout.block_align() as u16;
    let byte_rate = format.sample_rate * layout.block_align();

    let mut header = [0u8; WAV_HEADER_SIZE];
    header[0..4].copy_from_slice(b"RIFF");
    header[4..8].copy_from_slice(&riff_size(data_size).to_le_bytes());
    header[8..12].copy_from_slice(b"WAVE");

    header[12..16].copy_from_slice(b"fmt ");
    header[16..20].copy_from_slice(&16u32.to_le_bytes());
    header[20..22].copy_from_slice(&1u16.to_le_bytes());
    header[22..24].copy_from_slice(&layout.channels.to_le_bytes());
    header[24..28].copy_from_slice(&format.sample_rate.to_le_bytes());
    header[28..32].copy_from_slice(&byte_rate.to_le_bytes());
    header[32..34].copy_from_slice(&block_align.to_le_bytes());
    header[34..36].copy_from_slice(&layout.bits_per_sample.to_le_bytes());

    header[36..40].copy_from_slice(b"data");
    header[40..44].copy_from_slice(&data_size.to_le_bytes());
    header
}

fn riff_size(data_size: u32) -> u32 {
    data_size.saturating_add(36)
}

/// Offsets and values to patch once the final data size is known.
pub fn size_patches(data_size: u64) -> [(u64, [u8; 4]); 2] {
    let data_size = u32::try_from(data_size).unwrap_or(u32::MAX);
    [
        (RIFF_SIZE_OFFSET as u64, riff_size(data_size).to_le_bytes()),
        (DATA_SIZE_OFFSET as u64, data_size.to_le_bytes()),
    ]
}

/// Parsed view of a canonical header, used to verify written artifacts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavInfo {
    pub channels: u16,
    pub sample_rate: u32,
    pub byte_rate: u32,
    pub block_align: u16,
    pub bits_per_sample: u16,
    pub data_size: u32,
}

/// Parse a canonical 44-byte PCM header. Returns `None` for anything else.
pub fn parse_header(bytes: &[u8]) -> Option<WavInfo> {
    if bytes.len() < WAV_HEADER_SIZE
        || &bytes[0..4] != b"RIFF"
        || &bytes[8..12] != b"WAVE"
        || &bytes[12..16] != b"fmt "
        || &bytes[36..40] != b"data"
        || u16_at(bytes, 20) != 1
    {
        return None;
    }
    Some(WavInfo {
        channels: u16_at(bytes, 22),
        sample_rate: u32_at(bytes, 24),
        byte_rate: u32_at(bytes, 28),
        block_align: u16_at(bytes, 32),
        bits_per_sample: u16_at(bytes, 34),
        data_size: u32_at(bytes, 40),
    })
}

fn u16_at(bytes: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([bytes[offset], bytes[offset + 1]])
}

fn u32_at(bytes: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([bytes[offset], bytes[offset + 1], bytes[offset + 2], bytes[offset + 3]])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::audio_models::{AudioFormat, SamplingFreq};

    fn stream(format: AudioFormat, freq: SamplingFreq) -> StreamFormat {
        StreamFormat::resolve(format, freq).unwrap()
    }

    #[test]
    fn header_magic_and_pcm_code() {
        let header = header_for(&stream(AudioFormat::S16_STEREO, SamplingFreq::HZ_48000), 0);
        assert_eq!(header.len(), WAV_HEADER_SIZE);
        assert_eq!(&header[0..4], b"RIFF");
        assert_eq!(&header[8..12], b"WAVE");
        assert_eq!(&header[36..40], b"data");
        assert_eq!(u16_at(&header, 20), 1);
        assert_eq!(u32_at(&header, 16), 16);
    }

    #[test]
    fn header_16bit_stereo_48k() {
        let header = header_for(&stream(AudioFormat::S16_STEREO, SamplingFreq::HZ_48000), 9600);
        let info = parse_header(&header).unwrap();
        assert_eq!(info.channels, 2);
        assert_eq!(info.sample_rate, 48_000);
        assert_eq!(info.byte_rate, 192_000);
        assert_eq!(info.block_align, 4);
        assert_eq!(info.bits_per_sample, 16);
        assert_eq!(info.data_size, 9600);
        assert_eq!(u32_at(&header, 4), 36 + 9600);
    }

    #[test]
    fn header_24bit_surround() {
        let header = header_for(&stream(AudioFormat::S24_5_1, SamplingFreq::HZ_44100), 0);
        let info = parse_header(&header).unwrap();
        assert_eq!(info.channels, 6);
        assert_eq!(info.bits_per_sample, 24);
        assert_eq!(info.block_align, 18);
        assert_eq!(info.byte_rate, 44_100 * 18);
    }

    #[test]
    fn size_patches_target_both_fields() {
        let mut header = header_for(&stream(AudioFormat::S16_MONO, SamplingFreq::HZ_16000), 0);
        for (offset, bytes) in size_patches(32_000) {
            let at = offset as usize;
            header[at..at + 4].copy_from_slice(&bytes);
        }
        let info = parse_header(&header).unwrap();
        assert_eq!(info.data_size, 32_000);
        assert_eq!(u32_at(&header, 4), 32_036);
    }

    #[test]
    fn parse_rejects_non_wav() {
        assert!(parse_header(b"not a wav file").is_none());
        let mut header = header_for(&stream(AudioFormat::S16_STEREO, SamplingFreq::HZ_48000), 0);
        header[20] = 3;
        assert!(parse_header(&header).is_none());
    }
}
