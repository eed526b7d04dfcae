//! # rmf-capture-conformance
//!
//! Conformance suites for any [`AudioCaptureHal`] implementation.
//!
//! ## Architecture
//!
//! ```text
//! rmf-capture-conformance (this crate)
//! ├── profile/    ← DeviceProfile: TOML feature flags and timing, AC_* env overrides
//! ├── harness/    ← TestContext (logged calls, assertions), Suite, Runner, RunReport
//! ├── monitor     ← DeliveryCounter sink, JitterMonitor
//! ├── suites/     ← L1 state machine, L2 data flow, L3 throughput/jitter/independence
//! └── main.rs     ← rmf-capture-conformance CLI against the simulated device
//! ```
//!
//! ## Usage
//! ```ignore
//! use rmf_capture_conformance::{run_all, DeviceProfile};
//!
//! let profile = DeviceProfile::fast();
//! let hal = rmf_capture_sim::reference_registry(profile.registry_options());
//! let report = run_all(&hal, &profile);
//! assert!(report.all_passed());
//! ```

pub mod error;
pub mod harness;
pub mod monitor;
pub mod profile;
pub mod suites;

use rmf_capture_core::AudioCaptureHal;

pub use error::{ConformanceError, Result};
pub use harness::{Filter, Level, RunReport, Runner, Suite};
pub use monitor::{DeliveryCounter, JitterConfig, JitterMonitor, JitterReport};
pub use profile::{DeviceProfile, Timing};

/// Register every suite the profile enables and run them against `hal`.
pub fn run_all(hal: &dyn AudioCaptureHal, profile: &DeviceProfile) -> RunReport {
    run_filtered(hal, profile, &Filter::default())
}

pub fn run_filtered(hal: &dyn AudioCaptureHal, profile: &DeviceProfile, filter: &Filter) -> RunReport {
    let suites = suites::register(profile);
    Runner::new(hal, profile).run(&suites, filter)
}
