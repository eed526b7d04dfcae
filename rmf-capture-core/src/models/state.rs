use std::fmt;

use super::audio_models::{AudioFormat, SamplingFreq};

/// Capture session state machine.
///
/// State transitions:
/// ```text
///            open             start
/// closed ─────────→ open ─────────→ started
///    ↑               │  ←─────────     │
///    └───────────────┘      stop       │
///          close         (close rejected while started)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    Closed,
    Open,
    Started,
}

impl SessionState {
    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Closed)
    }

    pub fn is_started(&self) -> bool {
        matches!(self, Self::Started)
    }

    /// Open or Started.
    pub fn is_live(&self) -> bool {
        !self.is_closed()
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Closed => "closed",
            Self::Open => "open",
            Self::Started => "started",
        })
    }
}

/// Point-in-time snapshot of one session.
///
/// `format` and `sampling_freq` are meaningful only while `started`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Status {
    pub started: bool,
    pub format: AudioFormat,
    pub sampling_freq: SamplingFreq,
    pub fifo_size: usize,
    pub fifo_depth: usize,
    pub overflows: u32,
    pub underflows: u32,
}

impl Default for Status {
    fn default() -> Self {
        Self {
            started: false,
            format: AudioFormat::S16_STEREO,
            sampling_freq: SamplingFreq::HZ_48000,
            fifo_size: 0,
            fifo_depth: 0,
            overflows: 0,
            underflows: 0,
        }
    }
}

impl Status {
    /// A started status must carry an in-range format and rate.
    pub fn is_valid_active(&self) -> bool {
        self.started && self.format.is_valid() && self.sampling_freq.is_valid()
    }
}

/// Per-session delivery counters since the most recent start.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryDiagnostics {
    pub callback_count: u64,
    pub bytes_delivered: u64,
}
