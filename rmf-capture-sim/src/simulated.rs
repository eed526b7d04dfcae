//! Simulated capture provider.
//!
//! Produces PCM at exactly the nominal byte rate of the started format on a
//! dedicated delivery thread. Delivery is paced against a monotonic clock
//! rather than counted sleeps, so oversleeping only makes the next buffer
//! larger and never loses bytes.

use std::f32::consts::TAU;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use rmf_capture_core::models::audio_models::{SessionKind, StreamFormat};
use rmf_capture_core::models::error::CaptureError;
use rmf_capture_core::traits::capture_provider::{CaptureProvider, FifoStats};
use rmf_capture_core::traits::sink::BufferSink;

/// Default delivery cadence.
pub const DEFAULT_PERIOD: Duration = Duration::from_millis(10);

/// What the simulated device "hears".
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Signal {
    Silence,
    Tone { hz: f32, amplitude: f32 },
}

impl Default for Signal {
    fn default() -> Self {
        Signal::Tone {
            hz: 440.0,
            amplitude: 0.25,
        }
    }
}

/// Hardware-free [`CaptureProvider`].
pub struct SimulatedCapture {
    signal: Signal,
    period: Duration,
    available: bool,
    running: Arc<AtomicBool>,
    fifo_depth: Arc<AtomicUsize>,
    capture_handle: Mutex<Option<thread::JoinHandle<()>>>,
}

impl SimulatedCapture {
    pub fn new() -> Self {
        Self {
            signal: Signal::default(),
            period: DEFAULT_PERIOD,
            available: true,
            running: Arc::new(AtomicBool::new(false)),
            fifo_depth: Arc::new(AtomicUsize::new(0)),
            capture_handle: Mutex::new(None),
        }
    }

    /// A provider for a stream the device does not have.
    pub fn unavailable() -> Self {
        let mut capture = Self::new();
        capture.available = false;
        capture
    }

    pub fn with_signal(mut self, signal: Signal) -> Self {
        self.signal = signal;
        self
    }

    pub fn with_period(mut self, period: Duration) -> Self {
        self.period = period.max(Duration::from_millis(1));
        self
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

impl Default for SimulatedCapture {
    fn default() -> Self {
        Self::new()
    }
}

impl CaptureProvider for SimulatedCapture {
    fn start(&mut self, format: StreamFormat, sink: Arc<dyn BufferSink>) -> Result<(), CaptureError> {
        if self.running.load(Ordering::SeqCst) {
            return Err(CaptureError::InvalidState("simulated capture already running".into()));
        }

        self.running.store(true, Ordering::SeqCst);
        let running = Arc::clone(&self.running);
        let fifo_depth = Arc::clone(&self.fifo_depth);
        let synth = Synth::new(self.signal, format);
        let period = self.period;

        let spawned = thread::Builder::new()
            .name("sim-capture".into())
            .spawn(move || delivery_loop(running, format, synth, period, fifo_depth, sink));
        let handle = match spawned {
            Ok(handle) => handle,
            Err(e) => {
                self.running.store(false, Ordering::SeqCst);
                return Err(CaptureError::Internal(format!("failed to spawn capture thread: {}", e)));
            }
        };

        *self.capture_handle.lock() = Some(handle);
        log::debug!(
            "Simulated capture running: {} Hz, {} ch, {} bit",
            format.sample_rate,
            format.layout.channels,
            format.layout.bits_per_sample
        );
        Ok(())
    }

    fn stop(&mut self) -> Result<(), CaptureError> {
        self.running.store(false, Ordering::SeqCst);
        let joined = match self.capture_handle.lock().take() {
            Some(handle) => handle.join(),
            None => Ok(()),
        };
        self.fifo_depth.store(0, Ordering::SeqCst);
        joined.map_err(|_| CaptureError::Internal("capture thread panicked".into()))
    }

    fn supports(&self, _kind: SessionKind) -> bool {
        self.available
    }

    fn fifo_stats(&self) -> FifoStats {
        FifoStats {
            depth: self.fifo_depth.load(Ordering::SeqCst),
            overflows: 0,
            underflows: 0,
        }
    }
}

impl Drop for SimulatedCapture {
    fn drop(&mut self) {
        if self.running.load(Ordering::SeqCst) {
            let _ = self.stop();
        }
    }
}

fn delivery_loop(
    running: Arc<AtomicBool>,
    format: StreamFormat,
    mut synth: Synth,
    period: Duration,
    fifo_depth: Arc<AtomicUsize>,
    sink: Arc<dyn BufferSink>,
) {
    let started = Instant::now();
    let mut frames_sent: u64 = 0;

    while running.load(Ordering::SeqCst) {
        thread::sleep(period);
        if !running.load(Ordering::SeqCst) {
            break;
        }

        let due = frames_due(started.elapsed(), format.sample_rate);
        let frames = due.saturating_sub(frames_sent);
        if frames == 0 {
            continue;
        }

        let buffer = synth.render(frames as usize);
        fifo_depth.store(buffer.len(), Ordering::SeqCst);
        log::trace!("sim-capture delivering {} bytes", buffer.len());
        sink.on_buffer_ready(&buffer);
        fifo_depth.store(0, Ordering::SeqCst);
        frames_sent = due;
    }
}

/// Frames a device running at `sample_rate` has produced after `elapsed`.
fn frames_due(elapsed: Duration, sample_rate: u32) -> u64 {
    (elapsed.as_nanos() * sample_rate as u128 / 1_000_000_000) as u64
}

/// Interleaved PCM generator. Every channel carries the same sample.
struct Synth {
    signal: Signal,
    sample_rate: u32,
    channels: usize,
    bytes_per_sample: usize,
    frame_index: u64,
}

impl Synth {
    fn new(signal: Signal, format: StreamFormat) -> Self {
        Self {
            signal,
            sample_rate: format.sample_rate,
            channels: format.layout.channels as usize,
            bytes_per_sample: format.layout.bits_per_sample as usize / 8,
            frame_index: 0,
        }
    }

    fn render(&mut self, frames: usize) -> Vec<u8> {
        let frame_bytes = self.channels * self.bytes_per_sample;
        let Signal::Tone { hz, amplitude } = self.signal else {
            self.frame_index += frames as u64;
            return vec![0u8; frames * frame_bytes];
        };

        let mut out = Vec::with_capacity(frames * frame_bytes);
        for _ in 0..frames {
            let t = (self.frame_index % self.sample_rate as u64) as f32 / self.sample_rate as f32;
            let value = (TAU * hz * t).sin() * amplitude.clamp(0.0, 1.0);
            for _ in 0..self.channels {
                self.push_sample(&mut out, value);
            }
            self.frame_index += 1;
        }
        out
    }

    fn push_sample(&self, out: &mut Vec<u8>, value: f32) {
        match self.bytes_per_sample {
            2 => out.extend_from_slice(&((value * i16::MAX as f32) as i16).to_le_bytes()),
            3 => {
                let sample = (value * 8_388_607.0) as i32;
                out.extend_from_slice(&sample.to_le_bytes()[0..3]);
            }
            n => out.extend(std::iter::repeat(0u8).take(n)),
        }
    }
}
