pub mod schema;

use std::path::{Path, PathBuf};
use std::time::Duration;

use rmf_capture_core::RegistryOptions;
use schema::FileProfile;

use crate::error::{ConformanceError, Result};

/// Environment flag overriding `features.auxsupport`.
pub const ENV_AUX_SUPPORTED: &str = "AC_AUX_CAPTURE_SUPPORTED";
/// Environment flag adding the L1 positive-only suite.
pub const ENV_POSITIVE_ONLY: &str = "AC_GENERATE_POSITIVE_ONLY_SUITE";

/// Timing constants the data-flow suites measure against.
#[derive(Debug, Clone, PartialEq)]
pub struct Timing {
    /// Capture window of the L2 runs and the L3 data checks.
    pub measurement_window: Duration,
    /// Window of the L3 jitter runs.
    pub extended_window: Duration,
    /// How long delivery must stay silent after stop.
    pub post_stop_wait: Duration,
    /// Pause before reading status in the simultaneous-sessions test.
    pub status_settle: Duration,
    /// Run time per phase of the independence check.
    pub independence_wait: Duration,
    pub jitter_interval: Duration,
    /// Minimum bytes per `jitter_interval` while started.
    pub jitter_threshold_bytes: u64,
    /// Allowed throughput deviation, in percent of the nominal byte rate.
    pub throughput_tolerance_pct: f64,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            measurement_window: Duration::from_secs(10),
            extended_window: Duration::from_secs(120),
            post_stop_wait: Duration::from_secs(1),
            status_settle: Duration::from_millis(100),
            independence_wait: Duration::from_secs(2),
            jitter_interval: Duration::from_millis(100),
            jitter_threshold_bytes: 16 * 1024,
            throughput_tolerance_pct: 10.0,
        }
    }
}

impl Timing {
    /// Sub-second windows for exercising the suites against the simulator.
    pub fn fast() -> Self {
        Self {
            measurement_window: Duration::from_millis(500),
            extended_window: Duration::from_millis(800),
            post_stop_wait: Duration::from_millis(150),
            status_settle: Duration::from_millis(50),
            independence_wait: Duration::from_millis(300),
            jitter_interval: Duration::from_millis(100),
            jitter_threshold_bytes: 4 * 1024,
            throughput_tolerance_pct: 25.0,
        }
    }
}

/// Fully resolved device profile.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceProfile {
    pub auxsupport: bool,
    pub default_settings_requires_open: bool,
    pub positive_only_suite: bool,
    pub timing: Timing,
    pub artifact_dir: PathBuf,
}

impl Default for DeviceProfile {
    fn default() -> Self {
        Self {
            auxsupport: false,
            default_settings_requires_open: false,
            positive_only_suite: false,
            timing: Timing::default(),
            artifact_dir: PathBuf::from("/tmp"),
        }
    }
}

impl DeviceProfile {
    /// Built-in defaults overlaid with a profile file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            ConformanceError::Profile(format!("failed to read {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&contents)
            .map_err(|e| ConformanceError::Profile(format!("failed to parse {}: {e}", path.display())))
    }

    pub fn from_toml_str(s: &str) -> Result<Self> {
        let file = FileProfile::from_toml(s)?;
        let mut profile = Self::default();
        profile.apply_file(&file)?;
        Ok(profile)
    }

    /// Defaults with [`Timing::fast`], for running the suites in tests.
    pub fn fast() -> Self {
        Self {
            timing: Timing::fast(),
            artifact_dir: std::env::temp_dir(),
            ..Self::default()
        }
    }

    /// Apply the `AC_*` overrides from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_env_from(|key| std::env::var(key).ok());
    }

    /// Apply the `AC_*` overrides from `lookup`. A set variable enables its
    /// feature only when its value starts with `TRUE`, in any case.
    pub fn apply_env_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(value) = lookup(ENV_AUX_SUPPORTED) {
            self.auxsupport = env_flag(&value);
            log::debug!("{} = {:?}, auxsupport = {}", ENV_AUX_SUPPORTED, value, self.auxsupport);
        }
        if let Some(value) = lookup(ENV_POSITIVE_ONLY) {
            self.positive_only_suite = env_flag(&value);
            log::debug!("{} = {:?}, positive_only_suite = {}", ENV_POSITIVE_ONLY, value, self.positive_only_suite);
        }
    }

    /// Options for a reference registry that behaves the way this profile
    /// says the device does.
    pub fn registry_options(&self) -> RegistryOptions {
        RegistryOptions {
            default_settings_requires_open: self.default_settings_requires_open,
        }
    }

    fn apply_file(&mut self, file: &FileProfile) -> Result<()> {
        let section = &file.rmfaudiocapture;

        if let Some(aux) = section.features.auxsupport {
            self.auxsupport = aux;
        }
        if let Some(requires_open) = section.features.default_settings_requires_open {
            self.default_settings_requires_open = requires_open;
        }
        if let Some(positive_only) = section.features.positive_only_suite {
            self.positive_only_suite = positive_only;
        }

        let t = &section.timing;
        let timing = &mut self.timing;
        if let Some(secs) = t.measurement_window_secs {
            timing.measurement_window = secs_to_duration("measurement_window_secs", secs)?;
        }
        if let Some(secs) = t.extended_window_secs {
            timing.extended_window = secs_to_duration("extended_window_secs", secs)?;
        }
        if let Some(secs) = t.independence_wait_secs {
            timing.independence_wait = secs_to_duration("independence_wait_secs", secs)?;
        }
        if let Some(ms) = t.post_stop_wait_ms {
            timing.post_stop_wait = Duration::from_millis(ms);
        }
        if let Some(ms) = t.status_settle_ms {
            timing.status_settle = Duration::from_millis(ms);
        }
        if let Some(ms) = t.jitter_interval_ms {
            if ms == 0 {
                return Err(ConformanceError::Profile("jitter_interval_ms must be positive".into()));
            }
            timing.jitter_interval = Duration::from_millis(ms);
        }
        if let Some(bytes) = t.jitter_threshold_bytes {
            timing.jitter_threshold_bytes = bytes;
        }
        if let Some(pct) = t.throughput_tolerance_pct {
            if !(0.0..100.0).contains(&pct) {
                return Err(ConformanceError::Profile(format!(
                    "throughput_tolerance_pct must be in [0, 100), got {pct}"
                )));
            }
            timing.throughput_tolerance_pct = pct;
        }

        if let Some(ref dir) = section.output.artifact_dir {
            self.artifact_dir = PathBuf::from(dir);
        }
        Ok(())
    }
}

fn secs_to_duration(key: &str, secs: f64) -> Result<Duration> {
    Duration::try_from_secs_f64(secs)
        .ok()
        .filter(|d| !d.is_zero())
        .ok_or_else(|| ConformanceError::Profile(format!("{key} must be a positive number of seconds, got {secs}")))
}

/// `TRUE`, `true`, `TrueColor`... all enable; anything else disables.
fn env_flag(value: &str) -> bool {
    value
        .get(..4)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("true"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults_match_reference_timing() {
        let profile = DeviceProfile::default();
        assert!(!profile.auxsupport);
        assert_eq!(profile.timing.measurement_window, Duration::from_secs(10));
        assert_eq!(profile.timing.extended_window, Duration::from_secs(120));
        assert_eq!(profile.timing.jitter_threshold_bytes, 16384);
        assert_eq!(profile.artifact_dir, PathBuf::from("/tmp"));
    }

    #[test]
    fn file_overrides_defaults() {
        let profile = DeviceProfile::from_toml_str(
            r#"
[rmfaudiocapture.features]
auxsupport = true

[rmfaudiocapture.timing]
measurement_window_secs = 2.5
post_stop_wait_ms = 250
"#,
        )
        .unwrap();
        assert!(profile.auxsupport);
        assert_eq!(profile.timing.measurement_window, Duration::from_millis(2500));
        assert_eq!(profile.timing.post_stop_wait, Duration::from_millis(250));
        // untouched keys keep their defaults
        assert_eq!(profile.timing.jitter_interval, Duration::from_millis(100));
    }

    #[test]
    fn invalid_values_rejected() {
        for toml in [
            "[rmfaudiocapture.timing]\nmeasurement_window_secs = 0\n",
            "[rmfaudiocapture.timing]\nextended_window_secs = -1.0\n",
            "[rmfaudiocapture.timing]\njitter_interval_ms = 0\n",
            "[rmfaudiocapture.timing]\nthroughput_tolerance_pct = 150.0\n",
        ] {
            assert!(
                matches!(DeviceProfile::from_toml_str(toml), Err(ConformanceError::Profile(_))),
                "accepted {toml:?}"
            );
        }
    }

    #[test]
    fn env_flag_prefix_match() {
        assert!(env_flag("TRUE"));
        assert!(env_flag("true"));
        assert!(env_flag("TrUe_ish"));
        assert!(!env_flag("1"));
        assert!(!env_flag("tru"));
        assert!(!env_flag(""));
        assert!(!env_flag("FALSE"));
    }

    #[test]
    fn env_overrides_file() {
        let mut profile = DeviceProfile::from_toml_str("[rmfaudiocapture.features]\nauxsupport = true\n").unwrap();
        let env: HashMap<&str, &str> = [(ENV_AUX_SUPPORTED, "false"), (ENV_POSITIVE_ONLY, "True")].into();
        profile.apply_env_from(|key| env.get(key).map(|v| v.to_string()));
        assert!(!profile.auxsupport);
        assert!(profile.positive_only_suite);
    }

    #[test]
    fn unset_env_keeps_profile() {
        let mut profile = DeviceProfile::from_toml_str("[rmfaudiocapture.features]\nauxsupport = true\n").unwrap();
        profile.apply_env_from(|_| None);
        assert!(profile.auxsupport);
        assert!(!profile.positive_only_suite);
    }

    #[test]
    fn missing_file_is_profile_error() {
        let path = std::env::temp_dir().join("rmf_capture_no_such_profile.toml");
        assert!(matches!(DeviceProfile::load(&path), Err(ConformanceError::Profile(_))));
    }
}
