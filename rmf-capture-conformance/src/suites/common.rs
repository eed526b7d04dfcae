//! Checks shared by the L1/L2/L3 suites.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use rmf_capture_core::{
    ArtifactMetadata, ArtifactWriter, BufferSink, ErrorCode, Handle, SessionKind, Settings, Status, StatusSink, StreamFormat,
};

use crate::error::ConformanceError;
use crate::harness::{Fatal, TestContext};
use crate::monitor::DeliveryCounter;

/// Data callback that discards everything.
pub fn dummy_sink() -> Arc<dyn BufferSink> {
    Arc::new(|_: &[u8]| {})
}

struct IgnoreStatus;

impl StatusSink for IgnoreStatus {
    fn on_status_change(&self, _: &Status) {}
}

pub fn dummy_status_sink() -> Arc<dyn StatusSink> {
    Arc::new(IgnoreStatus)
}

/// Default settings with a discarding data callback.
#[track_caller]
pub fn dummy_settings(ctx: &TestContext) -> Result<Settings, Fatal> {
    Ok(ctx.default_settings()?.with_buffer_sink(dummy_sink()))
}

/// Default settings delivering into `counter`.
#[track_caller]
pub fn counted_settings(ctx: &TestContext, counter: &Arc<DeliveryCounter>) -> Result<Settings, Fatal> {
    Ok(ctx.default_settings()?.with_buffer_sink(counter.clone()))
}

/// Format and rate of `settings` lie in their valid ranges.
#[track_caller]
pub fn check_valid_settings(ctx: &TestContext, settings: &Settings) -> bool {
    ctx.check(
        settings.format.is_valid() && settings.sampling_freq.is_valid(),
        format!(
            "settings out of range: format {}, sampling freq {}",
            settings.format, settings.sampling_freq
        ),
    )
}

#[track_caller]
pub fn check_not_started(ctx: &TestContext, handle: Handle) -> bool {
    match ctx.status_of(handle) {
        Some(status) => ctx.check(!status.started, format!("{handle} reports started")),
        None => false,
    }
}

/// Started, with the format and rate it was started with.
#[track_caller]
pub fn check_started_as(ctx: &TestContext, handle: Handle, settings: &Settings) -> bool {
    let Some(status) = ctx.status_of(handle) else {
        return false;
    };
    ctx.check(status.is_valid_active(), format!("{handle} is not actively capturing: {status:?}"))
        && ctx.check_eq(status.format, settings.format, "status format")
        && ctx.check_eq(status.sampling_freq, settings.sampling_freq, "status sampling freq")
}

/// GetCurrentSettings returns exactly what Start was given.
#[track_caller]
pub fn check_settings_echo(ctx: &TestContext, handle: Handle, expected: &Settings) -> bool {
    let mut current = Settings::default();
    ctx.check_code(ctx.get_current_settings(handle, Some(&mut current)), ErrorCode::Success)
        && ctx.check_eq(&current, expected, "current settings")
}

/// No callback ran after stop returned.
#[track_caller]
pub fn check_post_stop_silence(ctx: &TestContext, kind: SessionKind, counter: &DeliveryCounter) -> bool {
    let at_stop = counter.snapshot();
    ctx.sleep(ctx.profile().timing.post_stop_wait);
    let later = counter.snapshot();
    ctx.check(
        later == at_stop,
        format!(
            "{kind}: {} bytes in {} callbacks delivered after stop",
            later.bytes - at_stop.bytes,
            later.callbacks - at_stop.callbacks
        ),
    )
}

/// Every callback carried data, and there was at least one.
#[track_caller]
pub fn check_delivery_contract(ctx: &TestContext, kind: SessionKind, counter: &DeliveryCounter) -> bool {
    let snap = counter.snapshot();
    ctx.check(snap.callbacks > 0, format!("{kind}: data callback never invoked"))
        && ctx.check(
            snap.empty_buffers == 0,
            format!("{kind}: {} callbacks with an empty buffer", snap.empty_buffers),
        )
}

/// Bytes delivered over `elapsed` against the nominal rate of `settings`.
///
/// The percentage must lie strictly inside `100 ± tolerance`.
#[track_caller]
pub fn check_throughput(ctx: &TestContext, kind: SessionKind, settings: &Settings, bytes: u64, elapsed: Duration) -> bool {
    let Some(stream) = StreamFormat::resolve(settings.format, settings.sampling_freq) else {
        return ctx.check(false, format!("{kind}: no byte rate for {} @ {}", settings.format, settings.sampling_freq));
    };
    let expected = stream.byte_rate() as f64 * elapsed.as_secs_f64();
    let pct = throughput_pct(bytes, expected);
    let tolerance = ctx.profile().timing.throughput_tolerance_pct;
    log::info!(
        "{} {}: {} bytes in {:.3}s, {:.0} expected ({:.2}%)",
        ctx.tag(),
        kind,
        bytes,
        elapsed.as_secs_f64(),
        expected,
        pct
    );
    ctx.check(
        within_tolerance(pct, tolerance),
        format!("{kind}: delivered {pct:.2}% of the nominal {} B/s, tolerance ±{tolerance}%", stream.byte_rate()),
    )
}

pub(crate) fn throughput_pct(bytes: u64, expected: f64) -> f64 {
    if expected <= 0.0 {
        return 0.0;
    }
    bytes as f64 / expected * 100.0
}

pub(crate) fn within_tolerance(pct: f64, tolerance: f64) -> bool {
    pct > 100.0 - tolerance && pct < 100.0 + tolerance
}

/// Write `data` as a WAV artifact at `path` and return its sidecar metadata.
pub fn save_capture(path: &Path, kind: SessionKind, settings: &Settings, data: &[u8]) -> crate::Result<ArtifactMetadata> {
    if data.is_empty() {
        return Err(ConformanceError::Artifact(format!(
            "no {kind} audio recorded for {}",
            path.display()
        )));
    }
    let mut writer = ArtifactWriter::create(path, kind, settings.format, settings.sampling_freq)?;
    writer.write(data)?;
    Ok(writer.finish()?)
}

/// Write what `counter` recorded to `<artifact_dir>/<stem>.wav`.
#[track_caller]
pub fn write_artifact(ctx: &TestContext, stem: &str, kind: SessionKind, settings: &Settings, counter: &DeliveryCounter) -> bool {
    let path = ctx.profile().artifact_dir.join(format!("{stem}.wav"));
    match save_capture(&path, kind, settings, &counter.take_captured()) {
        Ok(meta) => {
            log::info!(
                "{} wrote {} ({} bytes, {:.2}s, sha256 {})",
                ctx.tag(),
                path.display(),
                meta.byte_count,
                meta.duration_secs,
                meta.checksum
            );
            true
        }
        Err(e) => ctx.check(false, format!("failed to write {}: {e}", path.display())),
    }
}
