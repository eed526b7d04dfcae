//! # rmf-capture-core
//!
//! Session model and reference control logic for an audio capture HAL.
//!
//! A device exposes up to two independent capture streams, primary and
//! auxiliary. Callers open a session, start it with [`Settings`] carrying a
//! [`BufferSink`], receive PCM on a provider-owned thread, then stop and
//! close. [`SessionRegistry`] implements the control boundary
//! ([`AudioCaptureHal`]) over any [`CaptureProvider`] backend.
//!
//! ## Architecture
//!
//! ```text
//! rmf-capture-core (this crate)
//! ├── traits/       ← AudioCaptureHal, CaptureProvider, BufferSink, StatusSink
//! ├── models/       ← CaptureError, ErrorCode, Handle, Settings, Status, SessionState, formats
//! ├── session/      ← CaptureSession (per-slot state machine), SessionRegistry
//! ├── processing/   ← WAV header generation and parsing
//! └── storage/      ← ArtifactWriter, metadata sidecar
//! ```

pub mod models;
pub mod processing;
pub mod session;
pub mod storage;
pub mod traits;

pub use models::audio_models::{AudioFormat, PcmLayout, SamplingFreq, SessionKind, StreamFormat};
pub use models::error::{CaptureError, ErrorCode};
pub use models::handle::Handle;
pub use models::settings::Settings;
pub use models::state::{DeliveryDiagnostics, SessionState, Status};
pub use session::capture::CaptureSession;
pub use session::registry::{RegistryOptions, SessionRegistry};
pub use storage::artifact::ArtifactWriter;
pub use storage::metadata::ArtifactMetadata;
pub use traits::capture_provider::{CaptureProvider, FifoStats};
pub use traits::hal::AudioCaptureHal;
pub use traits::sink::{BufferSink, StatusSink};
