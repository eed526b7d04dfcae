//! L1: state machine and parameter validation.
//!
//! Every step asserts the exact result code. Rejected calls must leave the
//! session as it was, which the tests confirm through GetStatus and by
//! finishing each sequence with calls that only succeed from that state.

use rmf_capture_core::ErrorCode::{InvalidArgument, InvalidHandle, InvalidState, Success};
use rmf_capture_core::{AudioFormat, Handle, SamplingFreq, SessionKind, Settings, Status};

use super::common::{
    check_not_started, check_settings_echo, check_started_as, check_valid_settings, dummy_settings,
    dummy_status_sink,
};
use crate::harness::{Fatal, Level, Suite, TestCase, TestContext, TestResult};
use crate::profile::DeviceProfile;

const PRIMARY: &str = "primary";
const AUXILIARY: &str = "auxiliary";

pub const SUITE: &str = "[L1 rmfAudioCapture]";
pub const POSITIVE_ONLY_SUITE: &str = "[L1 rmfAudioCapture positive-only]";

/// Open `kind` as an application would: Open for primary, OpenType otherwise.
#[track_caller]
fn open_session(ctx: &TestContext, kind: SessionKind) -> Result<Handle, Fatal> {
    match kind {
        SessionKind::Primary => {
            let mut handle = Handle::NULL;
            ctx.require_code(ctx.open(Some(&mut handle)), Success)?;
            Ok(handle)
        }
        SessionKind::Auxiliary => ctx.open_kind(kind),
    }
}

fn open_type_primary_positive(ctx: &TestContext) -> TestResult {
    let mut handle = Handle::NULL;
    ctx.require_code(ctx.open_type(Some(&mut handle), PRIMARY), Success)?;
    ctx.check_code(ctx.close(handle), Success);

    ctx.require_code(ctx.open_type(Some(&mut handle), PRIMARY), Success)?;
    ctx.check_code(ctx.close(handle), Success);
    Ok(())
}

fn open_type_primary_negative(ctx: &TestContext) -> TestResult {
    let mut handle = Handle::NULL;
    ctx.check_code(ctx.open_type(None, PRIMARY), InvalidArgument);
    ctx.check_code(ctx.open_type(Some(&mut handle), "xyz"), InvalidArgument);

    ctx.require_code(ctx.open_type(Some(&mut handle), PRIMARY), Success)?;
    let mut second = Handle::NULL;
    ctx.check_code(ctx.open_type(Some(&mut second), PRIMARY), InvalidState);

    // the first handle survives the rejected open
    ctx.check_code(ctx.close(handle), Success);
    Ok(())
}

fn open_positive(ctx: &TestContext) -> TestResult {
    let mut handle = Handle::NULL;
    ctx.require_code(ctx.open(Some(&mut handle)), Success)?;
    ctx.check_code(ctx.close(handle), Success);

    ctx.require_code(ctx.open(Some(&mut handle)), Success)?;
    ctx.check_code(ctx.close(handle), Success);

    // Open and OpenType(primary) address the same session
    ctx.require_code(ctx.open_type(Some(&mut handle), PRIMARY), Success)?;
    ctx.check_code(ctx.close(handle), Success);

    ctx.require_code(ctx.open(Some(&mut handle)), Success)?;
    ctx.check_code(ctx.close(handle), Success);
    Ok(())
}

fn open_negative(ctx: &TestContext) -> TestResult {
    let mut handle = Handle::NULL;
    let mut other = Handle::NULL;
    ctx.check_code(ctx.open(None), InvalidArgument);

    ctx.require_code(ctx.open(Some(&mut handle)), Success)?;
    ctx.check_code(ctx.open(Some(&mut other)), InvalidState);
    ctx.check_code(ctx.open_type(Some(&mut other), PRIMARY), InvalidState);
    ctx.check_code(ctx.close(handle), Success);

    ctx.require_code(ctx.open_type(Some(&mut handle), PRIMARY), Success)?;
    ctx.check_code(ctx.open(Some(&mut other)), InvalidState);
    ctx.check_code(ctx.close(handle), Success);
    Ok(())
}

fn close_positive(ctx: &TestContext) -> TestResult {
    let mut handle = Handle::NULL;
    ctx.require_code(ctx.open(Some(&mut handle)), Success)?;
    ctx.check_code(ctx.close(handle), Success);
    Ok(())
}

fn close_positive_complex(ctx: &TestContext) -> TestResult {
    let mut handle = Handle::NULL;
    ctx.require_code(ctx.open(Some(&mut handle)), Success)?;
    let settings = dummy_settings(ctx)?;
    ctx.require_code(ctx.start(handle, Some(&settings)), Success)?;
    ctx.check_code(ctx.stop(handle), Success);
    ctx.check_code(ctx.close(handle), Success);

    // closing invalidated the handle
    ctx.check_code(ctx.start(handle, Some(&settings)), InvalidHandle);

    ctx.require_code(ctx.open(Some(&mut handle)), Success)?;
    ctx.require_code(ctx.start(handle, Some(&settings)), Success)?;
    ctx.check_code(ctx.stop(handle), Success);
    ctx.require_code(ctx.start(handle, Some(&settings)), Success)?;
    ctx.check_code(ctx.stop(handle), Success);
    ctx.check_code(ctx.close(handle), Success);
    Ok(())
}

fn close_negative(ctx: &TestContext) -> TestResult {
    let mut handle = Handle::NULL;
    ctx.check_code(ctx.close(Handle::NULL), InvalidHandle);

    ctx.require_code(ctx.open(Some(&mut handle)), Success)?;
    ctx.check_code(ctx.close(Handle::NULL), InvalidHandle);
    ctx.check_code(ctx.close(handle), Success);
    ctx.check_code(ctx.close(handle), InvalidHandle);
    Ok(())
}

fn close_started_rejected(ctx: &TestContext, kind: SessionKind) -> TestResult {
    let handle = open_session(ctx, kind)?;
    let settings = dummy_settings(ctx)?;
    ctx.require_code(ctx.start(handle, Some(&settings)), Success)?;

    ctx.check_code(ctx.close(handle), InvalidState);
    check_started_as(ctx, handle, &settings);

    ctx.check_code(ctx.stop(handle), Success);
    ctx.check_code(ctx.close(handle), Success);
    Ok(())
}

fn default_settings_positive(ctx: &TestContext) -> TestResult {
    let mut handle = Handle::NULL;
    ctx.require_code(ctx.open(Some(&mut handle)), Success)?;

    let first = ctx.default_settings()?;
    check_valid_settings(ctx, &first);
    let second = ctx.default_settings()?;
    check_valid_settings(ctx, &second);
    ctx.check_eq(&second, &first, "repeated default settings");

    ctx.check_code(ctx.close(handle), Success);
    Ok(())
}

fn default_settings_positive_complex(ctx: &TestContext) -> TestResult {
    let mut handle = Handle::NULL;
    ctx.require_code(ctx.open(Some(&mut handle)), Success)?;

    let defaults = ctx.default_settings()?;
    check_valid_settings(ctx, &defaults);

    let mut custom = dummy_settings(ctx)?;
    custom.delay_compensation_ms = defaults.delay_compensation_ms + 1000;
    ctx.require_code(ctx.start(handle, Some(&custom)), Success)?;

    // a session's custom delay never leaks into the defaults
    let during = ctx.default_settings()?;
    check_valid_settings(ctx, &during);
    ctx.check_eq(during.delay_compensation_ms, defaults.delay_compensation_ms, "default delay while started");

    ctx.check_code(ctx.stop(handle), Success);
    let after = ctx.default_settings()?;
    check_valid_settings(ctx, &after);
    ctx.check_eq(after.delay_compensation_ms, defaults.delay_compensation_ms, "default delay after stop");

    ctx.check_code(ctx.close(handle), Success);
    Ok(())
}

fn default_settings_negative(ctx: &TestContext) -> TestResult {
    let closed_code = if ctx.profile().default_settings_requires_open {
        InvalidState
    } else {
        Success
    };
    let mut settings = Settings::default();
    ctx.check_code(ctx.get_default_settings(Some(&mut settings)), closed_code);

    let mut handle = Handle::NULL;
    ctx.require_code(ctx.open(Some(&mut handle)), Success)?;
    ctx.check_code(ctx.get_default_settings(None), InvalidArgument);
    ctx.check_code(ctx.close(handle), Success);

    ctx.check_code(ctx.get_default_settings(Some(&mut settings)), closed_code);
    Ok(())
}

fn default_settings_negative_complex(ctx: &TestContext) -> TestResult {
    let mut handle = Handle::NULL;
    ctx.require_code(ctx.open(Some(&mut handle)), Success)?;
    let settings = dummy_settings(ctx)?;
    ctx.require_code(ctx.start(handle, Some(&settings)), Success)?;

    ctx.check_code(ctx.get_default_settings(None), InvalidArgument);
    ctx.check_code(ctx.stop(handle), Success);
    ctx.check_code(ctx.get_default_settings(None), InvalidArgument);

    ctx.check_code(ctx.close(handle), Success);
    Ok(())
}

fn start_positive(ctx: &TestContext) -> TestResult {
    let mut handle = Handle::NULL;
    ctx.require_code(ctx.open(Some(&mut handle)), Success)?;
    let settings = dummy_settings(ctx)?;
    ctx.require_code(ctx.start(handle, Some(&settings)), Success)?;
    ctx.check_code(ctx.stop(handle), Success);

    let mut custom = dummy_settings(ctx)?.with_status_sink(dummy_status_sink());
    custom.delay_compensation_ms += 2000;
    ctx.require_code(ctx.start(handle, Some(&custom)), Success)?;
    check_settings_echo(ctx, handle, &custom);
    ctx.check_code(ctx.stop(handle), Success);
    ctx.check_code(ctx.close(handle), Success);

    // start after stop, close, reopen
    ctx.require_code(ctx.open(Some(&mut handle)), Success)?;
    let settings = dummy_settings(ctx)?;
    ctx.require_code(ctx.start(handle, Some(&settings)), Success)?;
    ctx.check_code(ctx.stop(handle), Success);
    ctx.check_code(ctx.close(handle), Success);
    Ok(())
}

fn start_rejections(ctx: &TestContext, kind: SessionKind) -> TestResult {
    ctx.check_code(ctx.start(Handle::NULL, None), InvalidHandle);

    let handle = open_session(ctx, kind)?;
    let settings = dummy_settings(ctx)?;
    ctx.check_code(ctx.start(Handle::NULL, None), InvalidHandle);
    ctx.check_code(ctx.start(Handle::NULL, Some(&settings)), InvalidHandle);
    ctx.check_code(ctx.start(handle, None), InvalidArgument);

    let mut bad = settings.clone();
    bad.format = AudioFormat::MAX;
    ctx.check_code(ctx.start(handle, Some(&bad)), InvalidArgument);

    let mut bad = settings.clone();
    bad.sampling_freq = SamplingFreq::MAX;
    ctx.check_code(ctx.start(handle, Some(&bad)), InvalidArgument);

    let mut bad = settings.clone();
    bad.cb_buffer_ready = None;
    ctx.check_code(ctx.start(handle, Some(&bad)), InvalidArgument);

    // none of the rejected starts took effect
    check_not_started(ctx, handle);

    ctx.require_code(ctx.start(handle, Some(&settings)), Success)?;
    ctx.check_code(ctx.start(handle, Some(&settings)), InvalidState);
    ctx.check_code(ctx.stop(handle), Success);
    ctx.check_code(ctx.close(handle), Success);

    ctx.check_code(ctx.start(handle, Some(&settings)), InvalidHandle);
    Ok(())
}

fn stop_positive(ctx: &TestContext) -> TestResult {
    let mut handle = Handle::NULL;
    ctx.require_code(ctx.open(Some(&mut handle)), Success)?;
    let settings = dummy_settings(ctx)?;
    ctx.require_code(ctx.start(handle, Some(&settings)), Success)?;
    ctx.check_code(ctx.stop(handle), Success);
    ctx.require_code(ctx.start(handle, Some(&settings)), Success)?;
    ctx.check_code(ctx.stop(handle), Success);
    ctx.check_code(ctx.close(handle), Success);

    ctx.require_code(ctx.open(Some(&mut handle)), Success)?;
    let settings = dummy_settings(ctx)?;
    ctx.require_code(ctx.start(handle, Some(&settings)), Success)?;
    ctx.check_code(ctx.stop(handle), Success);
    ctx.check_code(ctx.close(handle), Success);
    Ok(())
}

fn stop_rejections(ctx: &TestContext, kind: SessionKind) -> TestResult {
    ctx.check_code(ctx.stop(Handle::NULL), InvalidHandle);

    let handle = open_session(ctx, kind)?;
    ctx.check_code(ctx.stop(handle), InvalidState);

    let settings = dummy_settings(ctx)?;
    ctx.require_code(ctx.start(handle, Some(&settings)), Success)?;
    ctx.check_code(ctx.stop(Handle::NULL), InvalidHandle);
    ctx.check_code(ctx.stop(handle), Success);
    ctx.check_code(ctx.stop(handle), InvalidState);
    ctx.check_code(ctx.close(handle), Success);

    ctx.check_code(ctx.stop(handle), InvalidHandle);
    Ok(())
}

fn get_status_positive(ctx: &TestContext) -> TestResult {
    let mut handle = Handle::NULL;
    ctx.require_code(ctx.open(Some(&mut handle)), Success)?;
    check_not_started(ctx, handle);

    let settings = dummy_settings(ctx)?;
    ctx.require_code(ctx.start(handle, Some(&settings)), Success)?;
    check_started_as(ctx, handle, &settings);

    ctx.check_code(ctx.stop(handle), Success);
    check_not_started(ctx, handle);

    ctx.check_code(ctx.close(handle), Success);
    Ok(())
}

fn get_status_rejections(ctx: &TestContext, kind: SessionKind) -> TestResult {
    let mut status = Status::default();
    ctx.check_code(ctx.get_status(Handle::NULL, Some(&mut status)), InvalidHandle);

    let handle = open_session(ctx, kind)?;
    ctx.check_code(ctx.get_status(Handle::NULL, Some(&mut status)), InvalidHandle);
    ctx.check_code(ctx.get_status(handle, None), InvalidArgument);

    let settings = dummy_settings(ctx)?;
    ctx.require_code(ctx.start(handle, Some(&settings)), Success)?;
    ctx.check_code(ctx.get_status(Handle::NULL, Some(&mut status)), InvalidHandle);
    ctx.check_code(ctx.get_status(handle, None), InvalidArgument);

    ctx.check_code(ctx.stop(handle), Success);
    ctx.check_code(ctx.get_status(Handle::NULL, Some(&mut status)), InvalidHandle);
    ctx.check_code(ctx.get_status(handle, None), InvalidArgument);
    ctx.check_code(ctx.close(handle), Success);

    ctx.check_code(ctx.get_status(handle, Some(&mut status)), InvalidHandle);
    ctx.check_code(ctx.get_status(handle, None), InvalidHandle);
    Ok(())
}

fn current_settings_positive(ctx: &TestContext) -> TestResult {
    let mut handle = Handle::NULL;
    ctx.require_code(ctx.open(Some(&mut handle)), Success)?;

    for extra_delay in [1000, 2000] {
        let mut custom = dummy_settings(ctx)?;
        custom.delay_compensation_ms += extra_delay;
        ctx.require_code(ctx.start(handle, Some(&custom)), Success)?;
        check_settings_echo(ctx, handle, &custom);
        ctx.check_code(ctx.stop(handle), Success);
    }

    ctx.check_code(ctx.close(handle), Success);
    Ok(())
}

fn current_settings_rejections(ctx: &TestContext, kind: SessionKind) -> TestResult {
    let mut current = Settings::default();
    ctx.check_code(ctx.get_current_settings(Handle::NULL, Some(&mut current)), InvalidHandle);

    let handle = open_session(ctx, kind)?;
    ctx.check_code(ctx.get_current_settings(handle, Some(&mut current)), InvalidState);

    let settings = dummy_settings(ctx)?;
    ctx.require_code(ctx.start(handle, Some(&settings)), Success)?;
    ctx.check_code(ctx.get_current_settings(Handle::NULL, Some(&mut current)), InvalidHandle);
    ctx.check_code(ctx.get_current_settings(handle, None), InvalidArgument);

    ctx.check_code(ctx.stop(handle), Success);
    ctx.check_code(ctx.get_current_settings(handle, Some(&mut current)), InvalidState);
    ctx.check_code(ctx.get_current_settings(handle, None), InvalidArgument);
    ctx.check_code(ctx.get_current_settings(Handle::NULL, Some(&mut current)), InvalidHandle);
    ctx.check_code(ctx.close(handle), Success);

    ctx.check_code(ctx.get_current_settings(handle, Some(&mut current)), InvalidHandle);
    Ok(())
}

/// A closed session's handle stays dead after the same kind is reopened.
fn stale_handle_rejected(ctx: &TestContext, kind: SessionKind) -> TestResult {
    let stale = open_session(ctx, kind)?;
    ctx.require_code(ctx.close(stale), Success)?;
    let live = open_session(ctx, kind)?;

    let settings = dummy_settings(ctx)?;
    let mut status = Status::default();
    let mut current = Settings::default();
    ctx.check_code(ctx.start(stale, Some(&settings)), InvalidHandle);
    ctx.check_code(ctx.stop(stale), InvalidHandle);
    ctx.check_code(ctx.get_status(stale, Some(&mut status)), InvalidHandle);
    ctx.check_code(ctx.get_current_settings(stale, Some(&mut current)), InvalidHandle);
    ctx.check_code(ctx.close(stale), InvalidHandle);
    check_not_started(ctx, live);

    ctx.require_code(ctx.start(live, Some(&settings)), Success)?;
    ctx.check_code(ctx.start(stale, Some(&settings)), InvalidHandle);
    ctx.check_code(ctx.get_status(stale, Some(&mut status)), InvalidHandle);
    ctx.check_code(ctx.get_current_settings(stale, Some(&mut current)), InvalidHandle);
    ctx.check_code(ctx.stop(stale), InvalidHandle);
    ctx.check_code(ctx.close(stale), InvalidHandle);
    check_started_as(ctx, live, &settings);

    ctx.check_code(ctx.stop(live), Success);
    ctx.check_code(ctx.close(live), Success);
    Ok(())
}

fn close_negative_complex(ctx: &TestContext) -> TestResult {
    close_started_rejected(ctx, SessionKind::Primary)
}

fn start_negative(ctx: &TestContext) -> TestResult {
    start_rejections(ctx, SessionKind::Primary)
}

fn stop_negative(ctx: &TestContext) -> TestResult {
    stop_rejections(ctx, SessionKind::Primary)
}

fn get_status_negative(ctx: &TestContext) -> TestResult {
    get_status_rejections(ctx, SessionKind::Primary)
}

fn current_settings_negative(ctx: &TestContext) -> TestResult {
    current_settings_rejections(ctx, SessionKind::Primary)
}

fn stale_handle_primary(ctx: &TestContext) -> TestResult {
    stale_handle_rejected(ctx, SessionKind::Primary)
}

fn close_negative_complex_auxiliary(ctx: &TestContext) -> TestResult {
    close_started_rejected(ctx, SessionKind::Auxiliary)
}

fn start_negative_auxiliary(ctx: &TestContext) -> TestResult {
    start_rejections(ctx, SessionKind::Auxiliary)
}

fn stop_negative_auxiliary(ctx: &TestContext) -> TestResult {
    stop_rejections(ctx, SessionKind::Auxiliary)
}

fn get_status_negative_auxiliary(ctx: &TestContext) -> TestResult {
    get_status_rejections(ctx, SessionKind::Auxiliary)
}

fn current_settings_negative_auxiliary(ctx: &TestContext) -> TestResult {
    current_settings_rejections(ctx, SessionKind::Auxiliary)
}

fn stale_handle_auxiliary(ctx: &TestContext) -> TestResult {
    stale_handle_rejected(ctx, SessionKind::Auxiliary)
}

fn open_type_auxiliary_positive(ctx: &TestContext) -> TestResult {
    let mut handle = Handle::NULL;
    ctx.require_code(ctx.open_type(Some(&mut handle), AUXILIARY), Success)?;
    ctx.check_code(ctx.close(handle), Success);

    ctx.require_code(ctx.open_type(Some(&mut handle), AUXILIARY), Success)?;
    ctx.check_code(ctx.close(handle), Success);
    Ok(())
}

fn open_type_auxiliary_negative(ctx: &TestContext) -> TestResult {
    let mut handle = Handle::NULL;
    ctx.check_code(ctx.open_type(None, AUXILIARY), InvalidArgument);

    ctx.require_code(ctx.open_type(Some(&mut handle), AUXILIARY), Success)?;
    let mut second = Handle::NULL;
    ctx.check_code(ctx.open_type(Some(&mut second), AUXILIARY), InvalidState);
    ctx.check_code(ctx.close(handle), Success);
    Ok(())
}

fn mixed_positive(ctx: &TestContext) -> TestResult {
    let mut aux = Handle::NULL;
    let mut primary = Handle::NULL;
    ctx.require_code(ctx.open_type(Some(&mut aux), AUXILIARY), Success)?;
    ctx.require_code(ctx.open_type(Some(&mut primary), PRIMARY), Success)?;
    ctx.check_code(ctx.close(primary), Success);

    ctx.require_code(ctx.open(Some(&mut primary)), Success)?;
    ctx.check_code(ctx.close(aux), Success);
    ctx.require_code(ctx.open_type(Some(&mut aux), AUXILIARY), Success)?;

    ctx.check_code(ctx.close(primary), Success);
    ctx.check_code(ctx.close(aux), Success);
    Ok(())
}

fn mixed_negative(ctx: &TestContext) -> TestResult {
    let mut aux = Handle::NULL;
    let mut primary = Handle::NULL;
    let mut other = Handle::NULL;
    ctx.require_code(ctx.open_type(Some(&mut aux), AUXILIARY), Success)?;
    ctx.check_code(ctx.open_type(Some(&mut other), AUXILIARY), InvalidState);

    ctx.require_code(ctx.open_type(Some(&mut primary), PRIMARY), Success)?;
    ctx.check_code(ctx.open_type(Some(&mut other), PRIMARY), InvalidState);
    ctx.check_code(ctx.open(Some(&mut other)), InvalidState);

    // a stale primary handle never reaches the auxiliary session
    ctx.check_code(ctx.close(primary), Success);
    ctx.check_code(ctx.close(primary), InvalidHandle);
    check_not_started(ctx, aux);

    ctx.check_code(ctx.close(aux), Success);
    Ok(())
}

fn simultaneous_sessions(ctx: &TestContext) -> TestResult {
    let aux = ctx.open_kind(SessionKind::Auxiliary)?;
    check_not_started(ctx, aux);

    let aux_settings = dummy_settings(ctx)?;
    ctx.require_code(ctx.start(aux, Some(&aux_settings)), Success)?;

    let primary = ctx.open_kind(SessionKind::Primary)?;
    let primary_settings = dummy_settings(ctx)?;
    ctx.require_code(ctx.start(primary, Some(&primary_settings)), Success)?;

    ctx.sleep(ctx.profile().timing.status_settle);
    check_started_as(ctx, primary, &primary_settings);
    check_started_as(ctx, aux, &aux_settings);
    check_settings_echo(ctx, primary, &primary_settings);
    check_settings_echo(ctx, aux, &aux_settings);

    ctx.check_code(ctx.stop(primary), Success);
    check_not_started(ctx, primary);
    check_started_as(ctx, aux, &aux_settings);

    ctx.check_code(ctx.stop(aux), Success);
    check_not_started(ctx, aux);

    ctx.check_code(ctx.close(primary), Success);
    ctx.check_code(ctx.close(aux), Success);
    Ok(())
}

/// The L1 suite, and the positive-only variant when the profile asks for it.
pub fn suites(profile: &DeviceProfile) -> Vec<Suite> {
    let mut suite = Suite::new(SUITE, Level::L1);
    suite
        .add(TestCase::new("open_type_primary_positive", 1, true, open_type_primary_positive))
        .add(TestCase::new("open_type_primary_negative", 2, false, open_type_primary_negative))
        .add(TestCase::new("open_positive", 3, true, open_positive))
        .add(TestCase::new("open_negative", 4, false, open_negative))
        .add(TestCase::new("close_positive", 5, true, close_positive))
        .add(TestCase::new("close_positive_complex", 6, true, close_positive_complex))
        .add(TestCase::new("close_negative", 7, false, close_negative))
        .add(TestCase::new("close_negative_complex", 8, false, close_negative_complex))
        .add(TestCase::new("default_settings_positive", 9, true, default_settings_positive))
        .add(TestCase::new("default_settings_positive_complex", 10, true, default_settings_positive_complex))
        .add(TestCase::new("default_settings_negative", 11, false, default_settings_negative))
        .add(TestCase::new("default_settings_negative_complex", 12, false, default_settings_negative_complex))
        .add(TestCase::new("start_positive", 13, true, start_positive))
        .add(TestCase::new("start_negative", 14, false, start_negative))
        .add(TestCase::new("stop_positive", 15, true, stop_positive))
        .add(TestCase::new("stop_negative", 16, false, stop_negative))
        .add(TestCase::new("get_status_positive", 17, true, get_status_positive))
        .add(TestCase::new("get_status_negative", 18, false, get_status_negative))
        .add(TestCase::new("current_settings_positive", 19, true, current_settings_positive))
        .add(TestCase::new("current_settings_negative", 20, false, current_settings_negative))
        .add(TestCase::new("stale_handle_primary", 21, false, stale_handle_primary));

    if profile.auxsupport {
        suite
            .add(TestCase::new("open_type_auxiliary_positive", 22, true, open_type_auxiliary_positive))
            .add(TestCase::new("open_type_auxiliary_negative", 23, false, open_type_auxiliary_negative))
            .add(TestCase::new("mixed_positive", 24, true, mixed_positive))
            .add(TestCase::new("mixed_negative", 25, false, mixed_negative))
            .add(TestCase::new("simultaneous_sessions", 26, true, simultaneous_sessions))
            .add(TestCase::new("close_negative_complex_auxiliary", 27, false, close_negative_complex_auxiliary))
            .add(TestCase::new("start_negative_auxiliary", 28, false, start_negative_auxiliary))
            .add(TestCase::new("stop_negative_auxiliary", 29, false, stop_negative_auxiliary))
            .add(TestCase::new("get_status_negative_auxiliary", 30, false, get_status_negative_auxiliary))
            .add(TestCase::new("current_settings_negative_auxiliary", 31, false, current_settings_negative_auxiliary))
            .add(TestCase::new("stale_handle_auxiliary", 32, false, stale_handle_auxiliary));
    }

    let mut suites = Vec::new();
    if profile.positive_only_suite {
        let mut positive = Suite::new(POSITIVE_ONLY_SUITE, Level::L1);
        for test in suite.tests.iter().filter(|t| t.positive) {
            positive.add(test.clone());
        }
        suites.push(suite);
        suites.push(positive);
    } else {
        suites.push(suite);
    }
    suites
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aux_tests_gated() {
        let mut profile = DeviceProfile::fast();
        let suites = suites(&profile);
        assert_eq!(suites.len(), 1);
        assert_eq!(suites[0].tests.len(), 21);
        assert!(suites[0].find("mixed_positive").is_none());
        assert!(suites[0].find("stale_handle_primary").is_some());
        assert!(suites[0].find("stop_negative_auxiliary").is_none());

        profile.auxsupport = true;
        let suites = super::suites(&profile);
        assert_eq!(suites[0].tests.len(), 32);
        assert_eq!(suites[0].tests.last().map(|t| t.id), Some(32));
        for name in [
            "close_negative_complex_auxiliary",
            "start_negative_auxiliary",
            "stop_negative_auxiliary",
            "get_status_negative_auxiliary",
            "current_settings_negative_auxiliary",
            "stale_handle_auxiliary",
        ] {
            assert!(suites[0].find(name).is_some_and(|t| !t.positive), "{name}");
        }
    }

    #[test]
    fn positive_only_suite_holds_positive_tests() {
        let mut profile = DeviceProfile::fast();
        profile.auxsupport = true;
        profile.positive_only_suite = true;
        let suites = suites(&profile);
        assert_eq!(suites.len(), 2);

        let positive = &suites[1];
        assert_eq!(positive.name, POSITIVE_ONLY_SUITE);
        assert_eq!(positive.tests.len(), 13);
        assert!(positive.tests.iter().all(|t| t.positive));
        assert!(positive.find("simultaneous_sessions").is_some());
        assert!(positive.find("start_negative").is_none());
    }
}
