//! L2: functional data flow over one measurement window.
//!
//! Each test opens the sessions it needs, starts them with default settings,
//! lets them run, then checks the settings echo, the delivered byte rate,
//! that every callback carried data and that delivery ceased at stop.

use std::sync::Arc;
use std::time::Instant;

use rmf_capture_core::{ErrorCode, Handle, SessionKind, Settings};

use super::common::{
    check_delivery_contract, check_post_stop_silence, check_settings_echo, check_throughput, counted_settings,
};
use crate::harness::{Level, Suite, TestCase, TestContext, TestResult};
use crate::monitor::DeliveryCounter;
use crate::profile::DeviceProfile;

pub const SUITE: &str = "[L2 rmfAudioCapture]";

struct Capture {
    kind: SessionKind,
    handle: Handle,
    settings: Settings,
    counter: Arc<DeliveryCounter>,
}

fn capture_window(ctx: &TestContext, kinds: &[SessionKind]) -> TestResult {
    let mut captures = Vec::with_capacity(kinds.len());
    for &kind in kinds {
        let handle = ctx.open_kind(kind)?;
        let counter = DeliveryCounter::new();
        let settings = counted_settings(ctx, &counter)?;
        captures.push(Capture {
            kind,
            handle,
            settings,
            counter,
        });
    }

    let started = Instant::now();
    for capture in &captures {
        ctx.require_code(ctx.start(capture.handle, Some(&capture.settings)), ErrorCode::Success)?;
    }

    let window = ctx.profile().timing.measurement_window;
    for capture in &captures {
        ctx.check(
            capture.counter.wait_for_bytes(1, window),
            format!("{}: no data delivered within {:?} of start", capture.kind, window),
        );
    }
    ctx.sleep(window);

    for capture in &captures {
        check_settings_echo(ctx, capture.handle, &capture.settings);
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

fn primary_capture(ctx: &TestContext) -> TestResult {
    capture_window(ctx, &[SessionKind::Primary])
}

fn auxiliary_capture(ctx: &TestContext) -> TestResult {
    capture_window(ctx, &[SessionKind::Auxiliary])
}

fn auxiliary_and_primary_capture(ctx: &TestContext) -> TestResult {
    capture_window(ctx, &[SessionKind::Auxiliary, SessionKind::Primary])
}

pub fn suite(profile: &DeviceProfile) -> Suite {
    let mut suite = Suite::new(SUITE, Level::L2);
    suite.add(TestCase::new("primary_capture", 1, true, primary_capture));
    if profile.auxsupport {
        suite
            .add(TestCase::new("auxiliary_capture", 2, true, auxiliary_capture))
            .add(TestCase::new("auxiliary_and_primary_capture", 3, true, auxiliary_and_primary_capture));
    }
    suite
}
