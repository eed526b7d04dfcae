//! The full suites against the reference registry over simulated streams.
//!
//! Uses [`DeviceProfile::fast`] so the data-flow levels finish in seconds.

use std::path::PathBuf;

use rmf_capture_conformance::{run_filtered, DeviceProfile, Filter, Level, RunReport};
use rmf_capture_core::processing::wav_format;
use rmf_capture_core::storage::metadata::read_metadata;
use rmf_capture_core::{SamplingFreq, SessionKind};
use rmf_capture_sim::{primary_only_registry, reference_registry};

fn profile(name: &str) -> DeviceProfile {
    let mut profile = DeviceProfile::fast();
    profile.auxsupport = true;
    profile.artifact_dir = std::env::temp_dir().join(format!("rmf_conformance_{}_{}", std::process::id(), name));
    profile
}

fn run(profile: &DeviceProfile, levels: &[Level]) -> RunReport {
    let hal = reference_registry(profile.registry_options());
    let report = run_filtered(&hal, profile, &Filter::levels(levels));
    assert!(report.all_passed(), "{}", report.summary_table());
    report
}

#[test]
fn l1_passes() {
    let mut profile = profile("l1");
    profile.positive_only_suite = true;
    let report = run(&profile, &[Level::L1]);
    assert_eq!(report.outcomes.len(), 32 + 13);
    assert_eq!(report.suites.len(), 2);
}

#[test]
fn l1_passes_with_default_settings_gate() {
    let mut profile = profile("l1_gate");
    profile.default_settings_requires_open = true;
    let report = run(&profile, &[Level::L1]);
    assert_eq!(report.outcomes.len(), 32);
}

#[test]
fn l2_passes() {
    let report = run(&profile("l2"), &[Level::L2]);
    assert_eq!(report.outcomes.len(), 3);
}

#[test]
fn l3_passes_and_keeps_artifacts() {
    let profile = profile("l3");
    let report = run(&profile, &[Level::L3]);
    assert_eq!(report.outcomes.len(), 7);

    for (stem, kind) in [
        ("output_primary", SessionKind::Primary),
        ("output_auxiliary", SessionKind::Auxiliary),
        ("output_combined_primary", SessionKind::Primary),
        ("output_combined_auxiliary", SessionKind::Auxiliary),
    ] {
        let path: PathBuf = profile.artifact_dir.join(format!("{stem}.wav"));
        let bytes = std::fs::read(&path).unwrap_or_else(|e| panic!("{}: {e}", path.display()));
        let info = wav_format::parse_header(&bytes).expect("valid WAV header");
        assert_eq!(info.sample_rate, 48_000);
        assert_eq!(info.channels, 2);
        assert_eq!(info.data_size as usize, bytes.len() - wav_format::WAV_HEADER_SIZE);

        let meta = read_metadata(&path).unwrap();
        assert_eq!(meta.kind, kind);
        assert_eq!(meta.sampling_freq, SamplingFreq::HZ_48000);
        assert_eq!(meta.byte_count, info.data_size as u64);
    }
    let _ = std::fs::remove_dir_all(&profile.artifact_dir);
}

#[test]
fn primary_only_device_passes() {
    let mut profile = profile("primary_only");
    profile.auxsupport = false;
    let hal = primary_only_registry(profile.registry_options());
    let report = run_filtered(&hal, &profile, &Filter::default());
    assert!(report.all_passed(), "{}", report.summary_table());
    assert_eq!(report.outcomes.len(), 21 + 1 + 2);
    let _ = std::fs::remove_dir_all(&profile.artifact_dir);
}
