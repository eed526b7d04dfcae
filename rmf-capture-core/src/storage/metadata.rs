use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::models::audio_models::{AudioFormat, SamplingFreq, SessionKind, StreamFormat};
use crate::models::error::CaptureError;

/// Description of a captured WAV artifact, stored as a JSON sidecar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactMetadata {
    pub id: String,
    pub created_at: String,
    pub kind: SessionKind,
    pub format: AudioFormat,
    pub sampling_freq: SamplingFreq,
    pub sample_rate: u32,
    pub channels: u16,
    pub bits_per_sample: u16,
    pub byte_count: u64,
    pub duration_secs: f64,
    pub file_path: String,
    pub checksum: String,
}

impl ArtifactMetadata {
    pub fn new(
        kind: SessionKind,
        format: AudioFormat,
        sampling_freq: SamplingFreq,
        stream: &StreamFormat,
        byte_count: u64,
        file_path: &str,
        checksum: &str,
    ) -> Self {
        let byte_rate = stream.byte_rate();
        let duration_secs = if byte_rate == 0 {
            0.0
        } else {
            byte_count as f64 / byte_rate as f64
        };
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            created_at: chrono::Utc::now().to_rfc3339(),
            kind,
            format,
            sampling_freq,
            sample_rate: stream.sample_rate,
            channels: stream.layout.channels,
            bits_per_sample: stream.layout.bits_per_sample,
            byte_count,
            duration_secs,
            file_path: file_path.to_string(),
            checksum: checksum.to_string(),
        }
    }
}

/// Write `{artifact}.metadata.json` next to the artifact.
pub fn write_metadata(metadata: &ArtifactMetadata, artifact_path: &Path) -> Result<(), CaptureError> {
    let metadata_path = artifact_path.with_extension("metadata.json");
    let json = serde_json::to_string_pretty(metadata)
        .map_err(|e| CaptureError::Internal(format!("failed to serialize metadata: {}", e)))?;
    fs::write(&metadata_path, json)
        .map_err(|e| CaptureError::Internal(format!("failed to write metadata: {}", e)))?;
    Ok(())
}

pub fn read_metadata(artifact_path: &Path) -> Result<ArtifactMetadata, CaptureError> {
    let metadata_path = artifact_path.with_extension("metadata.json");
    let json = fs::read_to_string(&metadata_path)
        .map_err(|e| CaptureError::Internal(format!("failed to read metadata: {}", e)))?;
    serde_json::from_str(&json).map_err(|e| CaptureError::Internal(format!("failed to parse metadata: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_from_byte_rate() {
        let stream = StreamFormat::resolve(AudioFormat::S16_STEREO, SamplingFreq::HZ_48000).unwrap();
        let meta = ArtifactMetadata::new(
            SessionKind::Primary,
            AudioFormat::S16_STEREO,
            SamplingFreq::HZ_48000,
            &stream,
            1_920_000,
            "/tmp/output_primary.wav",
            "00",
        );
        assert!(approx::relative_eq!(meta.duration_secs, 10.0));
        assert_eq!(meta.sample_rate, 48_000);
        assert!(chrono::DateTime::parse_from_rfc3339(&meta.created_at).is_ok());
        assert!(uuid::Uuid::parse_str(&meta.id).is_ok());
    }

    #[test]
    fn serializes_kind_lowercase() {
        let stream = StreamFormat::resolve(AudioFormat::S16_MONO, SamplingFreq::HZ_16000).unwrap();
        let meta = ArtifactMetadata::new(
            SessionKind::Auxiliary,
            AudioFormat::S16_MONO,
            SamplingFreq::HZ_16000,
            &stream,
            0,
            "x.wav",
            "",
        );
        let json = serde_json::to_value(&meta).unwrap();
        assert_eq!(json["kind"], "auxiliary");
        assert_eq!(json["format"], 4);
    }
}
