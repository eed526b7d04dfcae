use std::sync::Arc;

use crate::models::audio_models::{SessionKind, StreamFormat};
use crate::models::error::CaptureError;
use crate::traits::sink::BufferSink;

/// Buffering figures a provider may report through session status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FifoStats {
    pub depth: usize,
    pub overflows: u32,
    pub underflows: u32,
}

/// Source of captured audio for one session slot.
///
/// The registry owns one provider per [`SessionKind`] and drives it from the
/// session state machine. Implemented by:
/// - `SimulatedCapture` (reference backend, no hardware)
/// - a vendor driver binding on real devices
pub trait CaptureProvider: Send {
    /// Begin delivering audio of `format` to `sink` on a provider-owned thread.
    fn start(&mut self, format: StreamFormat, sink: Arc<dyn BufferSink>) -> Result<(), CaptureError>;

    /// Stop delivery.
    ///
    /// Must not return until the delivery thread can no longer invoke the
    /// sink: once `stop` returns, no further callbacks may occur.
    fn stop(&mut self) -> Result<(), CaptureError>;

    /// Whether this provider can serve the given session kind at all.
    fn supports(&self, kind: SessionKind) -> bool {
        let _ = kind;
        true
    }

    fn fifo_stats(&self) -> FifoStats {
        FifoStats::default()
    }
}
