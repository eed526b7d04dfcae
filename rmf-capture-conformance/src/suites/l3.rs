//! L3: extended throughput, jitter and independence runs.

use std::sync::Arc;
use std::time::Instant;

use rmf_capture_core::{ErrorCode, Handle, SessionKind, Settings};

use super::common::{
    check_delivery_contract, check_not_started, check_post_stop_silence, check_settings_echo, check_started_as,
    check_throughput, counted_settings, write_artifact,
};
use crate::harness::{Level, Suite, TestCase, TestContext, TestResult};
use crate::monitor::{DeliveryCounter, JitterConfig, JitterMonitor};
use crate::profile::DeviceProfile;

pub const SUITE: &str = "[L3 rmfAudioCapture]";

struct Capture {
    kind: SessionKind,
    handle: Handle,
    settings: Settings,
    counter: Arc<DeliveryCounter>,
}

fn open_captures(ctx: &TestContext, kinds: &[SessionKind], recording: bool) -> Result<Vec<Capture>, crate::harness::Fatal> {
    let mut captures = Vec::with_capacity(kinds.len());
    for &kind in kinds {
        let handle = ctx.open_kind(kind)?;
        let counter = if recording {
            DeliveryCounter::recording()
        } else {
            DeliveryCounter::new()
        };
        let settings = counted_settings(ctx, &counter)?;
        captures.push(Capture {
            kind,
            handle,
            settings,
            counter,
        });
    }
    Ok(captures)
}

/// Capture one window, check the byte total, then keep the audio as WAV.
fn data_check(ctx: &TestContext, kinds: &[SessionKind], artifact_prefix: &str) -> TestResult {
    let captures = open_captures(ctx, kinds, true)?;

    let started = Instant::now();
    for capture in &captures {
        ctx.require_code(ctx.start(capture.handle, Some(&capture.settings)), ErrorCode::Success)?;
    }
    ctx.sleep(ctx.profile().timing.measurement_window);
    for capture in &captures {
        ctx.check_code(ctx.stop(capture.handle), ErrorCode::Success);
    }
    let elapsed = started.elapsed();

    for capture in &captures {
        check_post_stop_silence(ctx, capture.kind, &capture.counter);
    }
    for capture in &captures {
        let valid = check_delivery_contract(ctx, capture.kind, &capture.counter)
            && check_throughput(ctx, capture.kind, &capture.settings, capture.counter.bytes(), elapsed);
        if valid {
            let stem = format!("{}{}", artifact_prefix, capture.kind);
            write_artifact(ctx, &stem, capture.kind, &capture.settings, &capture.counter);
        }
    }

    for capture in &captures {
        ctx.check_code(ctx.close(capture.handle), ErrorCode::Success);
    }
    Ok(())
}

/// Run the extended window with one jitter monitor per session.
fn jitter_check(ctx: &TestContext, kinds: &[SessionKind]) -> TestResult {
    let timing = ctx.profile().timing.clone();
    let captures = open_captures(ctx, kinds, false)?;

    let started = Instant::now();
    for capture in &captures {
        ctx.require_code(ctx.start(capture.handle, Some(&capture.settings)), ErrorCode::Success)?;
    }
    // let delivery settle before the first interval
    ctx.sleep(timing.jitter_interval);

    let config = JitterConfig {
        interval: timing.jitter_interval,
        threshold_bytes: timing.jitter_threshold_bytes,
        window: timing.extended_window,
    };
    let mut monitors = Vec::with_capacity(captures.len());
    for capture in &captures {
        let spawned = JitterMonitor::spawn(capture.kind.as_str(), Arc::clone(&capture.counter), config);
        match spawned {
            Ok(monitor) => monitors.push(monitor),
            Err(e) => {
                for monitor in monitors {
                    let _ = monitor.cancel();
                }
                return ctx.require(false, format!("failed to spawn jitter monitor: {e}"));
            }
        }
    }

    for (capture, monitor) in captures.iter().zip(monitors) {
        match monitor.finish() {
            Some(report) => {
                log::info!(
                    "{} {}: {} intervals, minimum {} bytes",
                    ctx.tag(),
                    capture.kind,
                    report.intervals,
                    report.min_bytes.unwrap_or(0)
                );
                ctx.check(report.intervals > 0, format!("{}: no jitter interval completed", capture.kind));
                if let Some(first) = report.shortfalls.first() {
                    ctx.check(
                        false,
                        format!(
                            "{}: {} of {} intervals below {} bytes, first was interval {} with {} bytes",
                            capture.kind,
                            report.shortfalls.len(),
                            report.intervals,
                            config.threshold_bytes,
                            first.interval,
                            first.bytes
                        ),
                    );
                }
            }
            None => {
                ctx.check(false, format!("{}: jitter monitor panicked", capture.kind));
            }
        }
    }

    for capture in &captures {
        ctx.check_code(ctx.stop(capture.handle), ErrorCode::Success);
    }
    let elapsed = started.elapsed();

    for capture in &captures {
        check_delivery_contract(ctx, capture.kind, &capture.counter);
        check_throughput(ctx, capture.kind, &capture.settings, capture.counter.bytes(), elapsed);
    }
    for capture in &captures {
        check_post_stop_silence(ctx, capture.kind, &capture.counter);
    }
    for capture in &captures {
        ctx.check_code(ctx.close(capture.handle), ErrorCode::Success);
    }
    Ok(())
}

/// Stop `stopped` while `running` keeps going; only `running` may grow, and
/// `running` keeps its status and settings.
fn check_stop_isolated(ctx: &TestContext, stopped: &Capture, running: &Capture) {
    ctx.check_code(ctx.stop(stopped.handle), ErrorCode::Success);
    let stopped_before = stopped.counter.bytes();
    let running_before = running.counter.bytes();

    check_not_started(ctx, stopped.handle);
    check_started_as(ctx, running.handle, &running.settings);
    check_settings_echo(ctx, running.handle, &running.settings);

    ctx.sleep(ctx.profile().timing.post_stop_wait);
    ctx.check_eq(
        stopped.counter.bytes(),
        stopped_before,
        &format!("{} bytes after stop", stopped.kind),
    );
    ctx.check(
        running.counter.bytes() > running_before,
        format!("{} stopped delivering when {} was stopped", running.kind, stopped.kind),
    );
}

fn independent_data_check(ctx: &TestContext) -> TestResult {
    let wait = ctx.profile().timing.independence_wait;
    let captures = open_captures(ctx, &[SessionKind::Auxiliary, SessionKind::Primary], false)?;
    let [aux, primary] = captures.as_slice() else {
        return ctx.require(false, "expected two sessions");
    };

    // primary stops while auxiliary runs
    ctx.require_code(ctx.start(aux.handle, Some(&aux.settings)), ErrorCode::Success)?;
    ctx.require_code(ctx.start(primary.handle, Some(&primary.settings)), ErrorCode::Success)?;
    ctx.sleep(wait);
    check_stop_isolated(ctx, primary, aux);
    ctx.check_code(ctx.stop(aux.handle), ErrorCode::Success);
    check_post_stop_silence(ctx, aux.kind, &aux.counter);

    // auxiliary stops while primary runs
    ctx.require_code(ctx.start(primary.handle, Some(&primary.settings)), ErrorCode::Success)?;
    ctx.require_code(ctx.start(aux.handle, Some(&aux.settings)), ErrorCode::Success)?;
    ctx.sleep(wait);
    check_stop_isolated(ctx, aux, primary);
    ctx.check_code(ctx.stop(primary.handle), ErrorCode::Success);
    check_post_stop_silence(ctx, primary.kind, &primary.counter);

    check_delivery_contract(ctx, aux.kind, &aux.counter);
    check_delivery_contract(ctx, primary.kind, &primary.counter);

    ctx.check_code(ctx.close(primary.handle), ErrorCode::Success);
    ctx.check_code(ctx.close(aux.handle), ErrorCode::Success);
    Ok(())
}

fn primary_data_check(ctx: &TestContext) -> TestResult {
    data_check(ctx, &[SessionKind::Primary], "output_")
}

fn primary_jitter_check(ctx: &TestContext) -> TestResult {
    jitter_check(ctx, &[SessionKind::Primary])
}

fn auxiliary_data_check(ctx: &TestContext) -> TestResult {
    data_check(ctx, &[SessionKind::Auxiliary], "output_")
}

fn auxiliary_jitter_check(ctx: &TestContext) -> TestResult {
    jitter_check(ctx, &[SessionKind::Auxiliary])
}

fn combined_data_check(ctx: &TestContext) -> TestResult {
    data_check(ctx, &[SessionKind::Auxiliary, SessionKind::Primary], "output_combined_")
}

fn combined_jitter_check(ctx: &TestContext) -> TestResult {
    jitter_check(ctx, &[SessionKind::Auxiliary, SessionKind::Primary])
}

pub fn suite(profile: &DeviceProfile) -> Suite {
    let mut suite = Suite::new(SUITE, Level::L3);
    suite
        .add(TestCase::new("primary_data_check", 1, true, primary_data_check))
        .add(TestCase::new("primary_jitter_check", 2, true, primary_jitter_check));
    if profile.auxsupport {
        suite
            .add(TestCase::new("auxiliary_data_check", 3, true, auxiliary_data_check))
            .add(TestCase::new("auxiliary_jitter_check", 4, true, auxiliary_jitter_check))
            .add(TestCase::new("combined_data_check", 5, true, combined_data_check))
            .add(TestCase::new("independent_data_check", 6, true, independent_data_check))
            .add(TestCase::new("combined_jitter_check", 7, true, combined_jitter_check));
    }
    suite
}
