//! Session registry: the reference implementation of the capture control API.
//!
//! Owns exactly two session slots, one per [`SessionKind`], each behind its
//! own lock. Operations on different slots never contend with each other, so
//! a stalled primary stop cannot delay an auxiliary status query.
//!
//! Handles carry the registry id, so a handle issued by one registry is
//! rejected by every other one.

use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

use crate::models::audio_models::SessionKind;
use crate::models::error::CaptureError;
use crate::models::handle::Handle;
use crate::models::settings::Settings;
use crate::models::state::{DeliveryDiagnostics, SessionState, Status};
use crate::session::capture::{CaptureSession, PendingNotice};
use crate::traits::capture_provider::CaptureProvider;
use crate::traits::hal::AudioCaptureHal;

static NEXT_REGISTRY_ID: AtomicU64 = AtomicU64::new(1);

/// Behaviour switches for the points where drivers legitimately differ.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegistryOptions {
    /// Fail `default_settings` with `InvalidState` while no session is open.
    pub default_settings_requires_open: bool,
}

pub struct SessionRegistry<P: CaptureProvider> {
    id: u64,
    slots: [Mutex<CaptureSession<P>>; 2],
    options: RegistryOptions,
}

impl<P: CaptureProvider> SessionRegistry<P> {
    pub fn new(primary: P, auxiliary: P) -> Self {
        Self::with_options(primary, auxiliary, RegistryOptions::default())
    }

    pub fn with_options(primary: P, auxiliary: P, options: RegistryOptions) -> Self {
        let id = NEXT_REGISTRY_ID.fetch_add(1, Ordering::Relaxed);
        log::debug!("Session registry {} created ({:?})", id, options);
        Self {
            id,
            slots: [
                Mutex::new(CaptureSession::new(SessionKind::Primary, primary)),
                Mutex::new(CaptureSession::new(SessionKind::Auxiliary, auxiliary)),
            ],
            options,
        }
    }

    pub fn options(&self) -> RegistryOptions {
        self.options
    }

    fn slot(&self, kind: SessionKind) -> &Mutex<CaptureSession<P>> {
        &self.slots[kind.index()]
    }

    /// Resolve a handle to its slot, or fail with `InvalidHandle`.
    ///
    /// Generation matching happens under the slot lock inside the session.
    fn slot_for(&self, handle: Handle) -> Result<&Mutex<CaptureSession<P>>, CaptureError> {
        if handle.is_null() || handle.registry != self.id {
            return Err(CaptureError::InvalidHandle);
        }
        Ok(self.slot(handle.kind))
    }

    /// Open the primary session.
    pub fn open_default(&self) -> Result<Handle, CaptureError> {
        self.open_kind(SessionKind::Primary)
    }

    /// Open a session by its type name.
    pub fn open_typed(&self, capture_type: &str) -> Result<Handle, CaptureError> {
        let kind: SessionKind = capture_type.parse()?;
        self.open_kind(kind)
    }

    pub fn open_kind(&self, kind: SessionKind) -> Result<Handle, CaptureError> {
        let mut session = self.slot(kind).lock();
        if !session.supports_kind() {
            return Err(CaptureError::InvalidArgument(format!(
                "{kind} capture is not supported by this device"
            )));
        }
        let generation = session.open()?;
        Ok(Handle {
            registry: self.id,
            kind,
            generation,
        })
    }

    pub fn close(&self, handle: Handle) -> Result<(), CaptureError> {
        self.slot_for(handle)?.lock().close(handle.generation)
    }

    pub fn start(&self, handle: Handle, settings: &Settings) -> Result<(), CaptureError> {
        let notice = self.slot_for(handle)?.lock().start(handle.generation, settings)?;
        dispatch(notice);
        Ok(())
    }

    /// Stop delivery. The slot lock is held while the provider winds down, so
    /// a concurrent `status` on the same session observes either Started or
    /// the fully stopped Open state, never an intermediate.
    pub fn stop(&self, handle: Handle) -> Result<(), CaptureError> {
        let notice = self.slot_for(handle)?.lock().stop(handle.generation)?;
        dispatch(notice);
        Ok(())
    }

    pub fn status(&self, handle: Handle) -> Result<Status, CaptureError> {
        self.slot_for(handle)?.lock().status(handle.generation)
    }

    pub fn current_settings(&self, handle: Handle) -> Result<Settings, CaptureError> {
        self.slot_for(handle)?.lock().current_settings(handle.generation)
    }

    /// Defaults are constant; nothing a caller does to a session changes them.
    pub fn default_settings(&self) -> Result<Settings, CaptureError> {
        if self.options.default_settings_requires_open && !self.any_open() {
            return Err(CaptureError::InvalidState(
                "default settings require an open session".into(),
            ));
        }
        Ok(Settings::default())
    }

    pub fn diagnostics(&self, handle: Handle) -> Result<DeliveryDiagnostics, CaptureError> {
        self.slot_for(handle)?.lock().diagnostics(handle.generation)
    }

    /// Current state of a slot, for observers that hold no handle.
    pub fn state(&self, kind: SessionKind) -> SessionState {
        self.slot(kind).lock().state()
    }

    fn any_open(&self) -> bool {
        self.slots.iter().any(|slot| slot.lock().is_live())
    }

    #[cfg(test)]
    fn generation(&self, kind: SessionKind) -> u64 {
        self.slot(kind).lock().generation()
    }
}

fn dispatch(notice: PendingNotice) {
    if let Some((sink, status)) = notice {
        sink.on_status_change(&status);
    }
}

fn log_call<T>(op: &str, result: &Result<T, CaptureError>) {
    match result {
        Ok(_) => log::trace!("Result {}: SUCCESS", op),
        Err(e) => log::debug!("Result {}: {} ({})", op, e.code(), e),
    }
}

impl<P: CaptureProvider> AudioCaptureHal for SessionRegistry<P> {
    fn open(&self, handle: Option<&mut Handle>) -> Result<(), CaptureError> {
        log::trace!("Calling Open");
        let result = match handle {
            None => Err(CaptureError::InvalidArgument("no handle slot supplied".into())),
            Some(out) => self.open_default().map(|h| *out = h),
        };
        log_call("Open", &result);
        result
    }

    fn open_type(&self, handle: Option<&mut Handle>, capture_type: &str) -> Result<(), CaptureError> {
        log::trace!("Calling OpenType({:?})", capture_type);
        let result = match handle {
            None => Err(CaptureError::InvalidArgument("no handle slot supplied".into())),
            Some(out) => self.open_typed(capture_type).map(|h| *out = h),
        };
        log_call("OpenType", &result);
        result
    }

    fn close(&self, handle: Handle) -> Result<(), CaptureError> {
        log::trace!("Calling Close({})", handle);
        let result = SessionRegistry::close(self, handle);
        log_call("Close", &result);
        result
    }

    fn start(&self, handle: Handle, settings: Option<&Settings>) -> Result<(), CaptureError> {
        log::trace!("Calling Start({})", handle);
        let result = self.status(handle).and_then(|_| match settings {
            None => Err(CaptureError::InvalidArgument("no settings supplied".into())),
            Some(settings) => SessionRegistry::start(self, handle, settings),
        });
        log_call("Start", &result);
        result
    }

    fn stop(&self, handle: Handle) -> Result<(), CaptureError> {
        log::trace!("Calling Stop({})", handle);
        let result = SessionRegistry::stop(self, handle);
        log_call("Stop", &result);
        result
    }

    fn get_status(&self, handle: Handle, status: Option<&mut Status>) -> Result<(), CaptureError> {
        log::trace!("Calling GetStatus({})", handle);
        let result = self.status(handle).and_then(|current| match status {
            None => Err(CaptureError::InvalidArgument("no status slot supplied".into())),
            Some(out) => {
                *out = current;
                Ok(())
            }
        });
        log_call("GetStatus", &result);
        result
    }

    fn get_default_settings(&self, settings: Option<&mut Settings>) -> Result<(), CaptureError> {
        log::trace!("Calling GetDefaultSettings");
        let result = match settings {
            None => Err(CaptureError::InvalidArgument("no settings slot supplied".into())),
            Some(out) => self.default_settings().map(|d| *out = d),
        };
        log_call("GetDefaultSettings", &result);
        result
    }

    fn get_current_settings(&self, handle: Handle, settings: Option<&mut Settings>) -> Result<(), CaptureError> {
        log::trace!("Calling GetCurrentSettings({})", handle);
        // Handle first, then the output slot, then state.
        let result = self.slot_for(handle).and_then(|slot| {
            let session = slot.lock();
            session.status(handle.generation)?;
            let out = settings.ok_or_else(|| CaptureError::InvalidArgument("no settings slot supplied".into()))?;
            *out = session.current_settings(handle.generation)?;
            Ok(())
        });
        log_call("GetCurrentSettings", &result);
        result
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::models::audio_models::{AudioFormat, SamplingFreq, StreamFormat};
    use crate::models::error::ErrorCode;
    use crate::traits::sink::{BufferSink, StatusSink};

    #[derive(Default)]
    struct Idle {
        started: bool,
    }

    impl CaptureProvider for Idle {
        fn start(&mut self, _format: StreamFormat, _sink: Arc<dyn BufferSink>) -> Result<(), CaptureError> {
            self.started = true;
            Ok(())
        }

        fn stop(&mut self) -> Result<(), CaptureError> {
            self.started = false;
            Ok(())
        }
    }

    fn registry() -> SessionRegistry<Idle> {
        SessionRegistry::new(Idle::default(), Idle::default())
    }

    fn settings() -> Settings {
        Settings::default().with_buffer_sink(Arc::new(|_: &[u8]| {}))
    }

    #[test]
    fn open_close_reopen() {
        let reg = registry();
        let first = reg.open_default().unwrap();
        assert_eq!(first.kind(), SessionKind::Primary);
        assert!(matches!(reg.open_default(), Err(CaptureError::InvalidState(_))));
        assert!(matches!(reg.open_typed("primary"), Err(CaptureError::InvalidState(_))));

        reg.close(first).unwrap();
        assert_eq!(reg.close(first), Err(CaptureError::InvalidHandle));
        assert_eq!(reg.generation(SessionKind::Primary), 2);

        let second = reg.open_typed("primary").unwrap();
        assert_ne!(first, second);
        assert_eq!(reg.status(first), Err(CaptureError::InvalidHandle));
    }

    #[test]
    fn sessions_are_independent() {
        let reg = registry();
        let primary = reg.open_typed("primary").unwrap();
        let aux = reg.open_typed("auxiliary").unwrap();

        reg.start(primary, &settings()).unwrap();
        assert!(reg.status(primary).unwrap().started);
        assert!(!reg.status(aux).unwrap().started);

        reg.start(aux, &settings()).unwrap();
        reg.stop(primary).unwrap();
        assert!(reg.status(aux).unwrap().started);

        reg.close(primary).unwrap();
        assert_eq!(reg.state(SessionKind::Auxiliary), SessionState::Started);
        reg.stop(aux).unwrap();
        reg.close(aux).unwrap();
    }

    #[test]
    fn foreign_and_null_handles_rejected() {
        let a = registry();
        let b = registry();
        let handle = a.open_default().unwrap();
        let _ = b.open_default().unwrap();

        assert_eq!(b.status(handle), Err(CaptureError::InvalidHandle));
        assert_eq!(a.status(Handle::NULL), Err(CaptureError::InvalidHandle));
        assert_eq!(a.close(Handle::NULL), Err(CaptureError::InvalidHandle));
    }

    #[test]
    fn hal_check_order() {
        let reg = registry();
        assert_eq!(
            ErrorCode::of(&AudioCaptureHal::start(&reg, Handle::NULL, None)),
            ErrorCode::InvalidHandle
        );
        assert_eq!(ErrorCode::of(&reg.get_status(Handle::NULL, None)), ErrorCode::InvalidHandle);
        assert_eq!(ErrorCode::of(&reg.get_current_settings(Handle::NULL, None)), ErrorCode::InvalidHandle);
        assert_eq!(ErrorCode::of(&AudioCaptureHal::open(&reg, None)), ErrorCode::InvalidArgument);
        assert_eq!(ErrorCode::of(&reg.get_default_settings(None)), ErrorCode::InvalidArgument);

        let mut handle = Handle::NULL;
        AudioCaptureHal::open(&reg, Some(&mut handle)).unwrap();
        assert!(!handle.is_null());
        assert_eq!(ErrorCode::of(&AudioCaptureHal::start(&reg, handle, None)), ErrorCode::InvalidArgument);
        // Missing output outranks wrong state.
        assert_eq!(ErrorCode::of(&reg.get_current_settings(handle, None)), ErrorCode::InvalidArgument);
        let mut out = Settings::default();
        assert_eq!(
            ErrorCode::of(&reg.get_current_settings(handle, Some(&mut out))),
            ErrorCode::InvalidState
        );
    }

    #[test]
    fn hal_rejects_junk_type() {
        let reg = registry();
        let mut handle = Handle::NULL;
        assert_eq!(
            ErrorCode::of(&reg.open_type(Some(&mut handle), "junk")),
            ErrorCode::InvalidArgument
        );
        assert!(handle.is_null());
        assert_eq!(reg.state(SessionKind::Primary), SessionState::Closed);
    }

    #[test]
    fn defaults_unaffected_by_current_settings() {
        let reg = registry();
        let handle = reg.open_default().unwrap();
        let defaults = reg.default_settings().unwrap();

        let mut custom = settings();
        custom.delay_compensation_ms = defaults.delay_compensation_ms + 1000;
        custom.sampling_freq = SamplingFreq::HZ_16000;
        custom.format = AudioFormat::S16_MONO;
        reg.start(handle, &custom).unwrap();

        assert_eq!(reg.current_settings(handle).unwrap(), custom);
        assert_eq!(reg.default_settings().unwrap(), defaults);
        reg.stop(handle).unwrap();
    }

    #[test]
    fn default_settings_gate() {
        let reg = SessionRegistry::with_options(
            Idle::default(),
            Idle::default(),
            RegistryOptions {
                default_settings_requires_open: true,
            },
        );
        assert!(matches!(reg.default_settings(), Err(CaptureError::InvalidState(_))));
        let handle = reg.open_typed("auxiliary").unwrap();
        assert!(reg.default_settings().is_ok());
        reg.close(handle).unwrap();
        assert!(reg.default_settings().is_err());
    }

    #[test]
    fn status_sink_sees_transitions() {
        struct Recorder(Mutex<Vec<bool>>);
        impl StatusSink for Recorder {
            fn on_status_change(&self, status: &Status) {
                self.0.lock().push(status.started);
            }
        }

        let reg = registry();
        let recorder = Arc::new(Recorder(Mutex::new(Vec::new())));
        let handle = reg.open_default().unwrap();
        let with_status = settings().with_status_sink(Arc::clone(&recorder) as Arc<dyn StatusSink>);

        reg.start(handle, &with_status).unwrap();
        reg.stop(handle).unwrap();
        assert_eq!(*recorder.0.lock(), vec![true, false]);
    }
}
