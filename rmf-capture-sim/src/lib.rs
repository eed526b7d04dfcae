//! # rmf-capture-sim
//!
//! Simulated backend for `rmf-capture-core`.
//!
//! Provides:
//! - `SimulatedCapture`: a `CaptureProvider` generating tone or silence at the
//!   exact byte rate of the started format
//! - `reference_registry`: a ready-to-use `SessionRegistry` over two simulated
//!   streams, the reference device the conformance suites run against
//!
//! ## Usage
//! ```ignore
//! use rmf_capture_core::{AudioCaptureHal, RegistryOptions};
//!
//! let hal = rmf_capture_sim::reference_registry(RegistryOptions::default());
//! let handle = hal.open_default()?;
//! ```

pub mod simulated;

use rmf_capture_core::{RegistryOptions, SessionRegistry};

pub use simulated::{Signal, SimulatedCapture, DEFAULT_PERIOD};

/// Registry with both primary and auxiliary streams available.
pub fn reference_registry(options: RegistryOptions) -> SessionRegistry<SimulatedCapture> {
    SessionRegistry::with_options(SimulatedCapture::new(), SimulatedCapture::new(), options)
}

/// Registry for a device without an auxiliary stream.
pub fn primary_only_registry(options: RegistryOptions) -> SessionRegistry<SimulatedCapture> {
    SessionRegistry::with_options(SimulatedCapture::new(), SimulatedCapture::unavailable(), options)
}
