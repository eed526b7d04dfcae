use std::fs::{self, File};
use std::io::{BufWriter, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::models::audio_models::{AudioFormat, SamplingFreq, SessionKind, StreamFormat};
use crate::models::error::CaptureError;
use crate::processing::wav_format;
use crate::storage::metadata::{self, ArtifactMetadata};

/// Streaming WAV writer for captured sessions.
///
/// ```text
/// [44-byte WAV header, sizes patched on finish]
/// [raw PCM exactly as delivered...]
/// ```
///
/// The SHA-256 checksum covers the PCM payload only, so it can be compared
/// against a digest taken on the delivery side.
pub struct ArtifactWriter {
    path: PathBuf,
    kind: SessionKind,
    format: AudioFormat,
    sampling_freq: SamplingFreq,
    stream: StreamFormat,
    file: Option<BufWriter<File>>,
    hasher: Sha256,
    data_bytes: u64,
}

fn storage_err(what: &str, e: impl std::fmt::Display) -> CaptureError {
    CaptureError::Internal(format!("{what}: {e}"))
}

impl ArtifactWriter {
    /// Create the file and write a placeholder header.
    pub fn create(
        path: impl Into<PathBuf>,
        kind: SessionKind,
        format: AudioFormat,
        sampling_freq: SamplingFreq,
    ) -> Result<Self, CaptureError> {
        let path = path.into();
        let stream = StreamFormat::resolve(format, sampling_freq).ok_or_else(|| {
            CaptureError::InvalidArgument(format!("cannot write {format} @ {sampling_freq}"))
        })?;

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| storage_err("failed to create directory", e))?;
            }
        }
        let file = File::create(&path).map_err(|e| storage_err("failed to create artifact", e))?;
        let mut file = BufWriter::new(file);
        file.write_all(&wav_format::header_for(&stream, 0))
            .map_err(|e| storage_err("failed to write header", e))?;

        log::debug!("Writing {} artifact to {}", kind, path.display());
        Ok(Self {
            path,
            kind,
            format,
            sampling_freq,
            stream,
            file: Some(file),
            hasher: Sha256::new(),
            data_bytes: 0,
        })
    }

    pub fn write(&mut self, data: &[u8]) -> Result<(), CaptureError> {
        let file = self
            .file
            .as_mut()
            .ok_or_else(|| CaptureError::InvalidState("artifact already finished".into()))?;
        file.write_all(data).map_err(|e| storage_err("write failed", e))?;
        self.hasher.update(data);
        self.data_bytes += data.len() as u64;
        Ok(())
    }

    /// Patch the header sizes, flush, and write the JSON sidecar.
    pub fn finish(&mut self) -> Result<ArtifactMetadata, CaptureError> {
        let mut file = self
            .file
            .take()
            .ok_or_else(|| CaptureError::InvalidState("artifact already finished".into()))?;

        for (offset, bytes) in wav_format::size_patches(self.data_bytes) {
            file.seek(SeekFrom::Start(offset)).map_err(|e| storage_err("seek failed", e))?;
            file.write_all(&bytes).map_err(|e| storage_err("header patch failed", e))?;
        }
        file.flush().map_err(|e| storage_err("flush failed", e))?;

        let checksum = hex_encode(&std::mem::take(&mut self.hasher).finalize());
        let meta = ArtifactMetadata::new(
            self.kind,
            self.format,
            self.sampling_freq,
            &self.stream,
            self.data_bytes,
            &self.path.to_string_lossy(),
            &checksum,
        );
        metadata::write_metadata(&meta, &self.path)?;
        log::info!(
            "{} artifact finished: {} bytes ({:.2} s) -> {}",
            self.kind,
            self.data_bytes,
            meta.duration_secs,
            self.path.display()
        );
        Ok(meta)
    }

    /// PCM bytes written so far, excluding the header.
    pub fn data_bytes(&self) -> u64 {
        self.data_bytes
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::wav_format::{parse_header, WAV_HEADER_SIZE};

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("rmf_artifact_test_{}_{}.wav", name, std::process::id()))
    }

    fn cleanup(path: &Path) {
        let _ = fs::remove_file(path);
        let _ = fs::remove_file(path.with_extension("metadata.json"));
    }

    #[test]
    fn writes_header_and_payload() {
        let path = temp_path("payload");
        let mut writer =
            ArtifactWriter::create(&path, SessionKind::Primary, AudioFormat::S16_STEREO, SamplingFreq::HZ_48000)
                .unwrap();
        writer.write(&[1u8; 1000]).unwrap();
        writer.write(&[2u8; 920]).unwrap();
        let meta = writer.finish().unwrap();

        let bytes = fs::read(&path).unwrap();
        assert_eq!(bytes.len(), WAV_HEADER_SIZE + 1920);
        let info = parse_header(&bytes).unwrap();
        assert_eq!(info.data_size, 1920);
        assert_eq!(info.sample_rate, 48_000);
        assert_eq!(meta.byte_count, 1920);
        assert_eq!(meta.channels, 2);
        assert!(approx::relative_eq!(meta.duration_secs, 0.01, epsilon = 1e-9));

        cleanup(&path);
    }

    #[test]
    fn checksum_covers_payload_only() {
        let path = temp_path("checksum");
        let mut writer =
            ArtifactWriter::create(&path, SessionKind::Auxiliary, AudioFormat::S16_MONO, SamplingFreq::HZ_16000)
                .unwrap();
        writer.write(b"abc").unwrap();
        let meta = writer.finish().unwrap();

        // SHA-256("abc")
        assert_eq!(
            meta.checksum,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_eq!(meta.kind, SessionKind::Auxiliary);

        cleanup(&path);
    }

    #[test]
    fn sidecar_round_trips() {
        let path = temp_path("sidecar");
        let mut writer =
            ArtifactWriter::create(&path, SessionKind::Primary, AudioFormat::S24_STEREO, SamplingFreq::HZ_44100)
                .unwrap();
        writer.write(&[0u8; 6]).unwrap();
        let meta = writer.finish().unwrap();

        let loaded = metadata::read_metadata(&path).unwrap();
        assert_eq!(loaded, meta);
        assert_eq!(loaded.bits_per_sample, 24);

        cleanup(&path);
    }

    #[test]
    fn finish_twice_fails() {
        let path = temp_path("twice");
        let mut writer =
            ArtifactWriter::create(&path, SessionKind::Primary, AudioFormat::S16_STEREO, SamplingFreq::HZ_48000)
                .unwrap();
        writer.finish().unwrap();
        assert!(matches!(writer.finish(), Err(CaptureError::InvalidState(_))));
        assert!(writer.write(&[0u8; 4]).is_err());

        cleanup(&path);
    }

    #[test]
    fn rejects_sentinel_format() {
        let path = temp_path("sentinel");
        let result = ArtifactWriter::create(&path, SessionKind::Primary, AudioFormat::MAX, SamplingFreq::HZ_48000);
        assert!(matches!(result, Err(CaptureError::InvalidArgument(_))));
        assert!(!path.exists());
    }
}
