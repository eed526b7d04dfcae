use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use crate::models::audio_models::SessionKind;
use crate::models::error::CaptureError;
use crate::models::settings::Settings;
use crate::models::state::{DeliveryDiagnostics, SessionState, Status};
use crate::traits::capture_provider::CaptureProvider;
use crate::traits::sink::{BufferSink, StatusSink};

/// Counters shared between a session and its delivery thread.
#[derive(Debug, Default)]
struct DeliveryCounters {
    callbacks: AtomicU64,
    bytes: AtomicU64,
}

impl DeliveryCounters {
    fn reset(&self) {
        self.callbacks.store(0, Ordering::SeqCst);
        self.bytes.store(0, Ordering::SeqCst);
    }

    fn snapshot(&self) -> DeliveryDiagnostics {
        DeliveryDiagnostics {
            callback_count: self.callbacks.load(Ordering::SeqCst),
            bytes_delivered: self.bytes.load(Ordering::SeqCst),
        }
    }
}

/// Sink handed to the provider: counts, gates, then forwards to the caller.
///
/// The gate is closed before the provider is stopped, so even a provider
/// that delivers one late buffer while winding down cannot reach the
/// caller's sink after `stop` has been requested.
struct GatedSink {
    inner: Arc<dyn BufferSink>,
    counters: Arc<DeliveryCounters>,
    open: AtomicBool,
}

impl BufferSink for GatedSink {
    fn on_buffer_ready(&self, buffer: &[u8]) {
        if buffer.is_empty() || !self.open.load(Ordering::SeqCst) {
            return;
        }
        self.counters.callbacks.fetch_add(1, Ordering::SeqCst);
        self.counters.bytes.fetch_add(buffer.len() as u64, Ordering::SeqCst);
        self.inner.on_buffer_ready(buffer);
    }
}

/// Notification to deliver once the slot lock has been released.
pub(crate) type PendingNotice = Option<(Arc<dyn StatusSink>, Status)>;

/// State machine for one capture stream.
///
/// Lives inside a registry slot; every method takes the generation carried
/// by the caller's handle and rejects it with `InvalidHandle` unless it
/// names the current, non-closed incarnation of this session.
pub struct CaptureSession<P: CaptureProvider> {
    kind: SessionKind,
    state: SessionState,
    generation: u64,
    settings: Option<Settings>,
    provider: P,
    counters: Arc<DeliveryCounters>,
    gate: Option<Arc<GatedSink>>,
}

impl<P: CaptureProvider> CaptureSession<P> {
    pub fn new(kind: SessionKind, provider: P) -> Self {
        Self {
            kind,
            state: SessionState::Closed,
            generation: 1,
            settings: None,
            provider,
            counters: Arc::new(DeliveryCounters::default()),
            gate: None,
        }
    }

    pub fn kind(&self) -> SessionKind {
        self.kind
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn supports_kind(&self) -> bool {
        self.provider.supports(self.kind)
    }

    fn check(&self, generation: u64) -> Result<(), CaptureError> {
        if self.state.is_closed() || generation != self.generation {
            return Err(CaptureError::InvalidHandle);
        }
        Ok(())
    }

    /// Closed → Open. Returns the generation to embed in the new handle.
    pub fn open(&mut self) -> Result<u64, CaptureError> {
        if self.state.is_live() {
            return Err(CaptureError::InvalidState(format!(
                "{} capture is already {}",
                self.kind, self.state
            )));
        }
        self.state = SessionState::Open;
        self.settings = None;
        log::debug!("{} session opened (generation {})", self.kind, self.generation);
        Ok(self.generation)
    }

    /// Open → Closed. Invalidates every copy of the handle.
    pub fn close(&mut self, generation: u64) -> Result<(), CaptureError> {
        self.check(generation)?;
        if self.state.is_started() {
            return Err(CaptureError::InvalidState(format!(
                "{} capture must be stopped before close",
                self.kind
            )));
        }
        self.state = SessionState::Closed;
        self.settings = None;
        self.gate = None;
        self.generation += 1;
        log::debug!("{} session closed", self.kind);
        Ok(())
    }

    /// Open → Started.
    pub(crate) fn start(&mut self, generation: u64, settings: &Settings) -> Result<PendingNotice, CaptureError> {
        self.check(generation)?;
        let stream = settings.validate()?;
        if self.state.is_started() {
            return Err(CaptureError::InvalidState(format!(
                "{} capture is already started",
                self.kind
            )));
        }
        let Some(sink) = settings.cb_buffer_ready.clone() else {
            return Err(CaptureError::InvalidArgument("buffer-ready callback is required".into()));
        };

        self.counters.reset();
        let gate = Arc::new(GatedSink {
            inner: sink,
            counters: Arc::clone(&self.counters),
            open: AtomicBool::new(true),
        });
        self.provider.start(stream, Arc::clone(&gate) as Arc<dyn BufferSink>)?;

        self.gate = Some(gate);
        self.settings = Some(settings.clone());
        self.state = SessionState::Started;
        log::info!(
            "{} capture started: {} @ {} ({} B/s)",
            self.kind,
            settings.format,
            settings.sampling_freq,
            stream.byte_rate()
        );
        Ok(self.notice())
    }

    /// Started → Open. Delivery has ceased when this returns.
    pub(crate) fn stop(&mut self, generation: u64) -> Result<PendingNotice, CaptureError> {
        self.check(generation)?;
        if !self.state.is_started() {
            return Err(CaptureError::InvalidState(format!(
                "{} capture is not started",
                self.kind
            )));
        }
        if let Some(gate) = self.gate.take() {
            gate.open.store(false, Ordering::SeqCst);
        }
        let stopped = self.provider.stop();
        // The session is Open whether or not the provider reported a clean
        // stop: the gate guarantees the caller's sink is silent either way.
        self.state = SessionState::Open;
        let notice = self.notice();
        let diag = self.counters.snapshot();
        log::info!(
            "{} capture stopped after {} callbacks / {} bytes",
            self.kind,
            diag.callback_count,
            diag.bytes_delivered
        );
        if let Err(e) = stopped {
            log::warn!("{} provider reported an error while stopping: {}", self.kind, e);
        }
        Ok(notice)
    }

    pub fn status(&self, generation: u64) -> Result<Status, CaptureError> {
        self.check(generation)?;
        Ok(self.snapshot())
    }

    pub fn current_settings(&self, generation: u64) -> Result<Settings, CaptureError> {
        self.check(generation)?;
        match (&self.state, &self.settings) {
            (SessionState::Started, Some(settings)) => Ok(settings.clone()),
            _ => Err(CaptureError::InvalidState(format!(
                "{} capture is not started",
                self.kind
            ))),
        }
    }

    pub fn diagnostics(&self, generation: u64) -> Result<DeliveryDiagnostics, CaptureError> {
        self.check(generation)?;
        Ok(self.counters.snapshot())
    }

    pub(crate) fn is_live(&self) -> bool {
        self.state.is_live()
    }

    #[cfg(test)]
    pub(crate) fn generation(&self) -> u64 {
        self.generation
    }

    fn snapshot(&self) -> Status {
        match (&self.state, &self.settings) {
            (SessionState::Started, Some(settings)) => {
                let fifo = self.provider.fifo_stats();
                Status {
                    started: true,
                    format: settings.format,
                    sampling_freq: settings.sampling_freq,
                    fifo_size: settings.fifo_size,
                    fifo_depth: fifo.depth,
                    overflows: fifo.overflows,
                    underflows: fifo.underflows,
                }
            }
            _ => Status::default(),
        }
    }

    fn notice(&self) -> PendingNotice {
        let sink = self.settings.as_ref()?.cb_status_change.clone()?;
        Some((sink, self.snapshot()))
    }
}

impl<P: CaptureProvider> Drop for CaptureSession<P> {
    fn drop(&mut self) {
        if self.state.is_started() {
            if let Some(gate) = self.gate.take() {
                gate.open.store(false, Ordering::SeqCst);
            }
            if let Err(e) = self.provider.stop() {
                log::error!("Failed to stop {} capture on teardown: {}", self.kind, e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::audio_models::{AudioFormat, StreamFormat};
    use parking_lot::Mutex;

    /// Provider that delivers one buffer synchronously on start.
    #[derive(Default)]
    struct OneShot {
        running: bool,
        sink: Option<Arc<dyn BufferSink>>,
    }

    impl CaptureProvider for OneShot {
        fn start(&mut self, _format: StreamFormat, sink: Arc<dyn BufferSink>) -> Result<(), CaptureError> {
            sink.on_buffer_ready(&[0u8; 10]);
            sink.on_buffer_ready(&[]);
            self.sink = Some(sink);
            self.running = true;
            Ok(())
        }

        fn stop(&mut self) -> Result<(), CaptureError> {
            self.running = false;
            Ok(())
        }
    }

    fn settings_with_counter() -> (Settings, Arc<Mutex<usize>>) {
        let seen = Arc::new(Mutex::new(0usize));
        let counter = Arc::clone(&seen);
        let sink: Arc<dyn BufferSink> = Arc::new(move |buf: &[u8]| *counter.lock() += buf.len());
        (Settings::default().with_buffer_sink(sink), seen)
    }

    #[test]
    fn lifecycle_transitions() {
        let mut session = CaptureSession::new(SessionKind::Primary, OneShot::default());
        let (settings, seen) = settings_with_counter();

        let generation = session.open().unwrap();
        assert_eq!(session.state(), SessionState::Open);

        session.start(generation, &settings).unwrap();
        assert_eq!(session.state(), SessionState::Started);
        assert_eq!(*seen.lock(), 10);
        assert_eq!(session.diagnostics(generation).unwrap().callback_count, 1);

        session.stop(generation).unwrap();
        assert_eq!(session.state(), SessionState::Open);

        session.close(generation).unwrap();
        assert_eq!(session.state(), SessionState::Closed);
    }

    #[test]
    fn close_bumps_generation() {
        let mut session = CaptureSession::new(SessionKind::Auxiliary, OneShot::default());
        let first = session.open().unwrap();
        session.close(first).unwrap();

        let second = session.open().unwrap();
        assert_ne!(first, second);
        assert_eq!(session.status(first), Err(CaptureError::InvalidHandle));
        assert!(session.status(second).is_ok());
    }

    #[test]
    fn guards_reject_without_side_effects() {
        let mut session = CaptureSession::new(SessionKind::Primary, OneShot::default());
        let (settings, _) = settings_with_counter();
        let generation = session.open().unwrap();

        assert!(matches!(session.stop(generation), Err(CaptureError::InvalidState(_))));
        assert!(matches!(session.current_settings(generation), Err(CaptureError::InvalidState(_))));
        assert_eq!(session.state(), SessionState::Open);

        let invalid = Settings {
            format: AudioFormat::MAX,
            ..settings.clone()
        };
        assert!(matches!(session.start(generation, &invalid), Err(CaptureError::InvalidArgument(_))));
        assert!(!session.status(generation).unwrap().started);

        session.start(generation, &settings).unwrap();
        assert!(matches!(session.start(generation, &settings), Err(CaptureError::InvalidState(_))));
        assert!(matches!(session.close(generation), Err(CaptureError::InvalidState(_))));
        assert_eq!(session.state(), SessionState::Started);
        assert_eq!(session.current_settings(generation).unwrap(), settings);
    }

    #[test]
    fn gate_blocks_late_delivery() {
        let mut session = CaptureSession::new(SessionKind::Primary, OneShot::default());
        let (settings, seen) = settings_with_counter();
        let generation = session.open().unwrap();
        session.start(generation, &settings).unwrap();
        session.stop(generation).unwrap();

        // A misbehaving provider that keeps the sink past stop is silenced.
        if let Some(sink) = session.provider.sink.as_ref() {
            sink.on_buffer_ready(&[1u8; 64]);
        }
        assert_eq!(*seen.lock(), 10);
    }
}
