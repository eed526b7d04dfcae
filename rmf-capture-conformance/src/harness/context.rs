//! Per-test execution context.
//!
//! Wraps the HAL under test so every control call is logged with its inputs
//! and outcome, remembers the handles a test has opened so the runner can
//! release them after a fatal failure, and collects assertion failures.
//!
//! Two assertion flavours:
//!
//! ```text
//! check_*    record the failure, keep going         -> bool
//! require_*  record the failure, abort this test    -> TestResult (use `?`)
//! ```

use std::cell::RefCell;
use std::fmt::Debug;
use std::panic::Location;
use std::time::Duration;

use rmf_capture_core::{AudioCaptureHal, CaptureError, ErrorCode, Handle, SessionKind, Settings, Status};

use crate::profile::DeviceProfile;

/// Returned by a `require_*` assertion that failed; aborts the current test.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fatal;

pub type TestResult = Result<(), Fatal>;

/// One failed assertion.
#[derive(Debug, Clone, PartialEq)]
pub struct Failure {
    pub location: String,
    pub message: String,
    /// The control call made most recently before the assertion.
    pub last_call: Option<String>,
    pub fatal: bool,
}

impl std::fmt::Display for Failure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.location, self.message)?;
        if let Some(ref call) = self.last_call {
            write!(f, " [after {}]", call)?;
        }
        Ok(())
    }
}

pub struct TestContext<'a> {
    hal: &'a dyn AudioCaptureHal,
    profile: &'a DeviceProfile,
    tag: String,
    failures: RefCell<Vec<Failure>>,
    last_call: RefCell<Option<String>>,
    opened: RefCell<Vec<Handle>>,
}

fn outcome<T>(result: &Result<T, CaptureError>) -> ErrorCode {
    ErrorCode::of(result)
}

fn slot<T>(out: &Option<&mut T>) -> &'static str {
    if out.is_some() {
        "slot"
    } else {
        "NULL"
    }
}

impl<'a> TestContext<'a> {
    pub fn new(hal: &'a dyn AudioCaptureHal, profile: &'a DeviceProfile, tag: impl Into<String>) -> Self {
        Self {
            hal,
            profile,
            tag: tag.into(),
            failures: RefCell::new(Vec::new()),
            last_call: RefCell::new(None),
            opened: RefCell::new(Vec::new()),
        }
    }

    pub fn profile(&self) -> &DeviceProfile {
        self.profile
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    // ---- control calls ----

    fn record_call(&self, call: String, code: ErrorCode) {
        log::debug!("{} Result {} -> {}", self.tag, call, code);
        *self.last_call.borrow_mut() = Some(format!("{call} -> {code}"));
    }

    pub fn open(&self, handle: Option<&mut Handle>) -> Result<(), CaptureError> {
        log::debug!("{} Calling Open(IN: handle={})", self.tag, slot(&handle));
        let result = match handle {
            None => self.hal.open(None),
            Some(out) => {
                let result = self.hal.open(Some(&mut *out));
                if result.is_ok() {
                    self.opened.borrow_mut().push(*out);
                }
                result
            }
        };
        self.record_call("Open".into(), outcome(&result));
        result
    }

    pub fn open_type(&self, handle: Option<&mut Handle>, capture_type: &str) -> Result<(), CaptureError> {
        log::debug!(
            "{} Calling OpenType(IN: handle={}, type={:?})",
            self.tag,
            slot(&handle),
            capture_type
        );
        let result = match handle {
            None => self.hal.open_type(None, capture_type),
            Some(out) => {
                let result = self.hal.open_type(Some(&mut *out), capture_type);
                if result.is_ok() {
                    self.opened.borrow_mut().push(*out);
                }
                result
            }
        };
        self.record_call(format!("OpenType({capture_type:?})"), outcome(&result));
        result
    }

    pub fn close(&self, handle: Handle) -> Result<(), CaptureError> {
        log::debug!("{} Calling Close(IN: handle={})", self.tag, handle);
        let result = self.hal.close(handle);
        if result.is_ok() {
            self.opened.borrow_mut().retain(|h| *h != handle);
        }
        self.record_call(format!("Close({handle})"), outcome(&result));
        result
    }

    pub fn start(&self, handle: Handle, settings: Option<&Settings>) -> Result<(), CaptureError> {
        log::debug!("{} Calling Start(IN: handle={}, settings={:?})", self.tag, handle, settings);
        let result = self.hal.start(handle, settings);
        self.record_call(format!("Start({handle})"), outcome(&result));
        result
    }

    pub fn stop(&self, handle: Handle) -> Result<(), CaptureError> {
        log::debug!("{} Calling Stop(IN: handle={})", self.tag, handle);
        let result = self.hal.stop(handle);
        self.record_call(format!("Stop({handle})"), outcome(&result));
        result
    }

    pub fn get_status(&self, handle: Handle, status: Option<&mut Status>) -> Result<(), CaptureError> {
        log::debug!("{} Calling GetStatus(IN: handle={}, status={})", self.tag, handle, slot(&status));
        let result = self.hal.get_status(handle, status);
        self.record_call(format!("GetStatus({handle})"), outcome(&result));
        result
    }

    pub fn get_default_settings(&self, settings: Option<&mut Settings>) -> Result<(), CaptureError> {
        log::debug!("{} Calling GetDefaultSettings(IN: settings={})", self.tag, slot(&settings));
        let result = self.hal.get_default_settings(settings);
        self.record_call("GetDefaultSettings".into(), outcome(&result));
        result
    }

    pub fn get_current_settings(&self, handle: Handle, settings: Option<&mut Settings>) -> Result<(), CaptureError> {
        log::debug!(
            "{} Calling GetCurrentSettings(IN: handle={}, settings={})",
            self.tag,
            handle,
            slot(&settings)
        );
        let result = self.hal.get_current_settings(handle, settings);
        self.record_call(format!("GetCurrentSettings({handle})"), outcome(&result));
        result
    }

    // ---- assertions ----

    #[track_caller]
    fn fail(&self, message: String, fatal: bool) {
        let location = Location::caller();
        let failure = Failure {
            location: format!("{}:{}", location.file(), location.line()),
            message,
            last_call: self.last_call.borrow().clone(),
            fatal,
        };
        log::error!("{} FAIL {}", self.tag, failure);
        self.failures.borrow_mut().push(failure);
    }

    #[track_caller]
    pub fn check_code(&self, result: Result<(), CaptureError>, expected: ErrorCode) -> bool {
        let actual = ErrorCode::of(&result);
        if actual != expected {
            self.fail(format!("expected {expected}, got {actual}"), false);
            return false;
        }
        true
    }

    #[track_caller]
    pub fn require_code(&self, result: Result<(), CaptureError>, expected: ErrorCode) -> TestResult {
        let actual = ErrorCode::of(&result);
        if actual != expected {
            self.fail(format!("expected {expected}, got {actual}"), true);
            return Err(Fatal);
        }
        Ok(())
    }

    #[track_caller]
    pub fn check(&self, condition: bool, message: impl Into<String>) -> bool {
        if !condition {
            self.fail(message.into(), false);
        }
        condition
    }

    #[track_caller]
    pub fn require(&self, condition: bool, message: impl Into<String>) -> TestResult {
        if !condition {
            self.fail(message.into(), true);
            return Err(Fatal);
        }
        Ok(())
    }

    #[track_caller]
    pub fn check_eq<T: PartialEq + Debug>(&self, actual: T, expected: T, what: &str) -> bool {
        if actual != expected {
            self.fail(format!("{what}: expected {expected:?}, got {actual:?}"), false);
            return false;
        }
        true
    }

    /// Record a panic that escaped the test body.
    pub(crate) fn record_panic(&self, message: String) {
        let failure = Failure {
            location: "<panic>".into(),
            message,
            last_call: self.last_call.borrow().clone(),
            fatal: true,
        };
        log::error!("{} PANIC {}", self.tag, failure);
        self.failures.borrow_mut().push(failure);
    }

    // ---- helpers shared by the suites ----

    /// Open `kind` through OpenType, aborting the test if that fails.
    #[track_caller]
    pub fn open_kind(&self, kind: SessionKind) -> Result<Handle, Fatal> {
        let mut handle = Handle::NULL;
        self.require_code(self.open_type(Some(&mut handle), kind.as_str()), ErrorCode::Success)?;
        Ok(handle)
    }

    /// Fetch default settings, aborting the test if that fails.
    #[track_caller]
    pub fn default_settings(&self) -> Result<Settings, Fatal> {
        let mut settings = Settings::default();
        self.require_code(self.get_default_settings(Some(&mut settings)), ErrorCode::Success)?;
        Ok(settings)
    }

    /// Status of `handle`, or `None` after recording a failure.
    #[track_caller]
    pub fn status_of(&self, handle: Handle) -> Option<Status> {
        let mut status = Status::default();
        self.check_code(self.get_status(handle, Some(&mut status)), ErrorCode::Success)
            .then_some(status)
    }

    pub fn sleep(&self, duration: Duration) {
        log::trace!("{} sleeping {:?}", self.tag, duration);
        std::thread::sleep(duration);
    }

    // ---- teardown ----

    /// Stop and close whatever the test left open. Outcomes are ignored.
    pub(crate) fn release_leftovers(&self) {
        let leftovers: Vec<Handle> = self.opened.borrow_mut().drain(..).collect();
        for handle in leftovers {
            log::debug!("{} releasing leftover {}", self.tag, handle);
            let _ = self.hal.stop(handle);
            let _ = self.hal.close(handle);
        }
    }

    pub(crate) fn into_failures(self) -> Vec<Failure> {
        self.failures.into_inner()
    }

    pub fn failure_count(&self) -> usize {
        self.failures.borrow().len()
    }
}
