use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::CaptureError;

/// Which of the two independent capture streams a session belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionKind {
    Primary,
    Auxiliary,
}

impl SessionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Primary => "primary",
            Self::Auxiliary => "auxiliary",
        }
    }

    pub(crate) fn index(&self) -> usize {
        match self {
            Self::Primary => 0,
            Self::Auxiliary => 1,
        }
    }
}

impl fmt::Display for SessionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SessionKind {
    type Err = CaptureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "primary" => Ok(Self::Primary),
            "auxiliary" => Ok(Self::Auxiliary),
            other => Err(CaptureError::InvalidArgument(format!(
                "unrecognized capture type: {other:?}"
            ))),
        }
    }
}

/// Channel count and sample width of a PCM stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PcmLayout {
    pub channels: u16,
    pub bits_per_sample: u16,
}

impl PcmLayout {
    /// Bytes per interleaved frame.
    pub fn block_align(&self) -> u32 {
        self.channels as u32 * self.bits_per_sample as u32 / 8
    }
}

/// Sample format code.
///
/// Codes form a closed, contiguous range `[MIN, MAX)`. `MAX` is a sentinel,
/// not a format: it and anything above it are representable so that callers
/// can be rejected for passing them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AudioFormat(pub u32);

impl AudioFormat {
    pub const S16_STEREO: Self = Self(0);
    pub const S24_STEREO: Self = Self(1);
    pub const S16_MONO_LEFT: Self = Self(2);
    pub const S16_MONO_RIGHT: Self = Self(3);
    pub const S16_MONO: Self = Self(4);
    pub const S24_5_1: Self = Self(5);
    pub const MAX: Self = Self(6);

    pub const MIN: Self = Self::S16_STEREO;

    pub const ALL: [Self; 6] = [
        Self::S16_STEREO,
        Self::S24_STEREO,
        Self::S16_MONO_LEFT,
        Self::S16_MONO_RIGHT,
        Self::S16_MONO,
        Self::S24_5_1,
    ];

    pub fn is_valid(&self) -> bool {
        *self >= Self::MIN && *self < Self::MAX
    }

    pub fn layout(&self) -> Option<PcmLayout> {
        let (channels, bits_per_sample) = match *self {
            Self::S16_STEREO => (2, 16),
            Self::S24_STEREO => (2, 24),
            Self::S16_MONO_LEFT | Self::S16_MONO_RIGHT | Self::S16_MONO => (1, 16),
            Self::S24_5_1 => (6, 24),
            _ => return None,
        };
        Some(PcmLayout {
            channels,
            bits_per_sample,
        })
    }
}

impl fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match *self {
            Self::S16_STEREO => "16bit-stereo",
            Self::S24_STEREO => "24bit-stereo",
            Self::S16_MONO_LEFT => "16bit-mono-left",
            Self::S16_MONO_RIGHT => "16bit-mono-right",
            Self::S16_MONO => "16bit-mono",
            Self::S24_5_1 => "24bit-5.1",
            Self(code) => return write!(f, "invalid-format({code})"),
        };
        f.write_str(name)
    }
}

/// Sampling rate code, validated the same way as [`AudioFormat`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SamplingFreq(pub u32);

impl SamplingFreq {
    pub const HZ_16000: Self = Self(0);
    pub const HZ_22050: Self = Self(1);
    pub const HZ_24000: Self = Self(2);
    pub const HZ_32000: Self = Self(3);
    pub const HZ_44100: Self = Self(4);
    pub const HZ_48000: Self = Self(5);
    pub const MAX: Self = Self(6);

    pub const MIN: Self = Self::HZ_16000;

    pub const ALL: [Self; 6] = [
        Self::HZ_16000,
        Self::HZ_22050,
        Self::HZ_24000,
        Self::HZ_32000,
        Self::HZ_44100,
        Self::HZ_48000,
    ];

    pub fn is_valid(&self) -> bool {
        *self >= Self::MIN && *self < Self::MAX
    }

    pub fn hz(&self) -> Option<u32> {
        match *self {
            Self::HZ_16000 => Some(16_000),
            Self::HZ_22050 => Some(22_050),
            Self::HZ_24000 => Some(24_000),
            Self::HZ_32000 => Some(32_000),
            Self::HZ_44100 => Some(44_100),
            Self::HZ_48000 => Some(48_000),
            _ => None,
        }
    }
}

impl fmt::Display for SamplingFreq {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.hz() {
            Some(hz) => write!(f, "{hz}Hz"),
            None => write!(f, "invalid-freq({})", self.0),
        }
    }
}

/// Fully resolved stream description handed to a capture provider on start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamFormat {
    pub sample_rate: u32,
    pub layout: PcmLayout,
}

impl StreamFormat {
    /// Resolve a format/rate pair. Returns `None` if either code is out of range.
    pub fn resolve(format: AudioFormat, freq: SamplingFreq) -> Option<Self> {
        Some(Self {
            sample_rate: freq.hz()?,
            layout: format.layout()?,
        })
    }

    /// Nominal bytes per second: `channels * rate * bits / 8`.
    pub fn byte_rate(&self) -> u64 {
        self.sample_rate as u64 * self.layout.block_align() as u64
    }
}
