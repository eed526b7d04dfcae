use std::fmt;
use std::sync::Arc;

use super::audio_models::{AudioFormat, SamplingFreq, StreamFormat};
use super::error::CaptureError;
use crate::traits::sink::{BufferSink, StatusSink};

pub const DEFAULT_DELAY_COMPENSATION_MS: u32 = 0;
pub const DEFAULT_FIFO_SIZE: usize = 64 * 1024;
pub const DEFAULT_THRESHOLD: usize = 8 * 1024;

/// Capture parameters passed to `start`.
///
/// Equality compares the scalar fields by value and the callbacks by `Arc`
/// identity, so a settings value read back from a started session equals
/// the one it was started with only if it carries the very same sinks.
#[derive(Clone)]
pub struct Settings {
    pub format: AudioFormat,
    pub sampling_freq: SamplingFreq,

    /// Caller-adjustable delay, echoed back unchanged by `current_settings`.
    pub delay_compensation_ms: u32,

    /// Requested buffering in bytes (implementation-defined use).
    pub fifo_size: usize,

    /// Delivery threshold in bytes (implementation-defined use).
    pub threshold: usize,

    /// Mandatory data sink. `start` rejects settings without one.
    pub cb_buffer_ready: Option<Arc<dyn BufferSink>>,

    /// Optional status-change sink.
    pub cb_status_change: Option<Arc<dyn StatusSink>>,
}

impl Settings {
    /// Validate what `start` requires: in-range format and rate, a data sink.
    pub fn validate(&self) -> Result<StreamFormat, CaptureError> {
        if !self.format.is_valid() {
            return Err(CaptureError::InvalidArgument(format!(
                "unsupported format: {}",
                self.format
            )));
        }
        if !self.sampling_freq.is_valid() {
            return Err(CaptureError::InvalidArgument(format!(
                "unsupported sampling frequency: {}",
                self.sampling_freq
            )));
        }
        if self.cb_buffer_ready.is_none() {
            return Err(CaptureError::InvalidArgument(
                "buffer-ready callback is required".into(),
            ));
        }
        StreamFormat::resolve(self.format, self.sampling_freq)
            .ok_or_else(|| CaptureError::Internal("format table out of sync".into()))
    }

    pub fn with_buffer_sink(mut self, sink: Arc<dyn BufferSink>) -> Self {
        self.cb_buffer_ready = Some(sink);
        self
    }

    pub fn with_status_sink(mut self, sink: Arc<dyn StatusSink>) -> Self {
        self.cb_status_change = Some(sink);
        self
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            format: AudioFormat::S16_STEREO,
            sampling_freq: SamplingFreq::HZ_48000,
            delay_compensation_ms: DEFAULT_DELAY_COMPENSATION_MS,
            fifo_size: DEFAULT_FIFO_SIZE,
            threshold: DEFAULT_THRESHOLD,
            cb_buffer_ready: None,
            cb_status_change: None,
        }
    }
}

fn same_sink<T: ?Sized>(left: &Option<Arc<T>>, right: &Option<Arc<T>>) -> bool {
    match (left, right) {
        (None, None) => true,
        (Some(l), Some(r)) => std::ptr::addr_eq(Arc::as_ptr(l), Arc::as_ptr(r)),
        _ => false,
    }
}

impl PartialEq for Settings {
    fn eq(&self, other: &Self) -> bool {
        self.format == other.format
            && self.sampling_freq == other.sampling_freq
            && self.delay_compensation_ms == other.delay_compensation_ms
            && self.fifo_size == other.fifo_size
            && self.threshold == other.threshold
            && same_sink(&self.cb_buffer_ready, &other.cb_buffer_ready)
            && same_sink(&self.cb_status_change, &other.cb_status_change)
    }
}

impl Eq for Settings {}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("format", &self.format)
            .field("sampling_freq", &self.sampling_freq)
            .field("delay_compensation_ms", &self.delay_compensation_ms)
            .field("fifo_size", &self.fifo_size)
            .field("threshold", &self.threshold)
            .field("cb_buffer_ready", &self.cb_buffer_ready.as_ref().map(Arc::as_ptr))
            .field("cb_status_change", &self.cb_status_change.as_ref().map(Arc::as_ptr))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop_sink() -> Arc<dyn BufferSink> {
        Arc::new(|_: &[u8]| {})
    }

    #[test]
    fn default_is_valid_once_sink_attached() {
        let settings = Settings::default();
        assert!(matches!(settings.validate(), Err(CaptureError::InvalidArgument(_))));

        let settings = settings.with_buffer_sink(noop_sink());
        let stream = settings.validate().unwrap();
        assert_eq!(stream.byte_rate(), 192_000);
    }

    #[test]
    fn rejects_out_of_range_codes() {
        let base = Settings::default().with_buffer_sink(noop_sink());

        let bad_format = Settings {
            format: AudioFormat::MAX,
            ..base.clone()
        };
        assert!(matches!(bad_format.validate(), Err(CaptureError::InvalidArgument(_))));

        let bad_freq = Settings {
            sampling_freq: SamplingFreq::MAX,
            ..base
        };
        assert!(matches!(bad_freq.validate(), Err(CaptureError::InvalidArgument(_))));
    }

    #[test]
    fn equality_uses_sink_identity() {
        let sink = noop_sink();
        let a = Settings::default().with_buffer_sink(Arc::clone(&sink));
        let b = Settings::default().with_buffer_sink(sink);
        assert_eq!(a, b);

        let c = Settings::default().with_buffer_sink(noop_sink());
        assert_ne!(a, c);
    }

    #[test]
    fn equality_covers_delay_compensation() {
        let sink = noop_sink();
        let a = Settings::default().with_buffer_sink(Arc::clone(&sink));
        let b = Settings {
            delay_compensation_ms: a.delay_compensation_ms + 1000,
            ..a.clone()
        };
        assert_ne!(a, b);
    }
}
