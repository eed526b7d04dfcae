use serde::Deserialize;

/// TOML-deserializable device profile.
///
/// Every key is optional; absent keys keep the built-in defaults.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct FileProfile {
    #[serde(default)]
    pub rmfaudiocapture: CaptureSection,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct CaptureSection {
    #[serde(default)]
    pub features: FeaturesConfig,

    #[serde(default)]
    pub timing: TimingConfig,

    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct FeaturesConfig {
    /// Device exposes an auxiliary capture stream.
    pub auxsupport: Option<bool>,
    /// GetDefaultSettings fails with INVALID_STATE until a session is open.
    pub default_settings_requires_open: Option<bool>,
    /// Also register the L1 positive-only suite.
    pub positive_only_suite: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct TimingConfig {
    pub measurement_window_secs: Option<f64>,
    pub extended_window_secs: Option<f64>,
    pub post_stop_wait_ms: Option<u64>,
    pub status_settle_ms: Option<u64>,
    pub independence_wait_secs: Option<f64>,
    pub jitter_interval_ms: Option<u64>,
    pub jitter_threshold_bytes: Option<u64>,
    pub throughput_tolerance_pct: Option<f64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct OutputConfig {
    /// Directory WAV artifacts are written to.
    pub artifact_dir: Option<String>,
}

impl FileProfile {
    pub fn from_toml(s: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_deserialises_to_defaults() {
        let profile = FileProfile::from_toml("").expect("empty TOML should parse");
        assert!(profile.rmfaudiocapture.features.auxsupport.is_none());
        assert!(profile.rmfaudiocapture.timing.jitter_interval_ms.is_none());
        assert!(profile.rmfaudiocapture.output.artifact_dir.is_none());
    }

    #[test]
    fn full_toml_parses() {
        let toml = r#"
[rmfaudiocapture.features]
auxsupport = true
default_settings_requires_open = true

[rmfaudiocapture.timing]
measurement_window_secs = 10
extended_window_secs = 120
jitter_threshold_bytes = 16384
throughput_tolerance_pct = 10.0

[rmfaudiocapture.output]
artifact_dir = "/var/tmp/capture"
"#;
        let profile = FileProfile::from_toml(toml).expect("valid TOML");
        let section = profile.rmfaudiocapture;
        assert_eq!(section.features.auxsupport, Some(true));
        assert_eq!(section.features.default_settings_requires_open, Some(true));
        assert_eq!(section.timing.measurement_window_secs, Some(10.0));
        assert_eq!(section.timing.jitter_threshold_bytes, Some(16384));
        assert_eq!(section.output.artifact_dir.as_deref(), Some("/var/tmp/capture"));
    }

    #[test]
    fn unknown_timing_key_rejected() {
        let toml = "[rmfaudiocapture.timing]\nmeasurement_window = 3\n";
        assert!(FileProfile::from_toml(toml).is_err());
    }
}
