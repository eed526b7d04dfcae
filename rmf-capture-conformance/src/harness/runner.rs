use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;

use rmf_capture_core::AudioCaptureHal;

use super::context::TestContext;
use super::report::{RunReport, TestOutcome};
use super::suite::{Level, Suite, TestCase};
use crate::profile::DeviceProfile;

/// Which registered tests to run. Name filters are substring matches.
#[derive(Debug, Clone, Default)]
pub struct Filter {
    /// Empty means every level.
    pub levels: Vec<Level>,
    pub suite: Option<String>,
    pub test: Option<String>,
}

impl Filter {
    pub fn levels(levels: &[Level]) -> Self {
        Self {
            levels: levels.to_vec(),
            ..Self::default()
        }
    }

    pub fn admits_suite(&self, suite: &Suite) -> bool {
        (self.levels.is_empty() || self.levels.contains(&suite.level))
            && self.suite.as_deref().is_none_or(|s| suite.name.contains(s))
    }

    pub fn admits_test(&self, test: &TestCase) -> bool {
        self.test.as_deref().is_none_or(|t| test.name.contains(t))
    }
}

/// Runs suites against one HAL, one test at a time.
pub struct Runner<'a> {
    hal: &'a dyn AudioCaptureHal,
    profile: &'a DeviceProfile,
}

impl<'a> Runner<'a> {
    pub fn new(hal: &'a dyn AudioCaptureHal, profile: &'a DeviceProfile) -> Self {
        Self { hal, profile }
    }

    pub fn run(&self, suites: &[Suite], filter: &Filter) -> RunReport {
        let started_at = chrono::Utc::now();
        let started = Instant::now();
        let mut outcomes = Vec::new();

        for suite in suites.iter().filter(|s| filter.admits_suite(s)) {
            log::info!("Suite {} ({} tests)", suite.name, suite.tests.len());
            for test in suite.tests.iter().filter(|t| filter.admits_test(t)) {
                outcomes.push(self.run_test(suite, test));
            }
        }

        RunReport::new(outcomes, started_at, started.elapsed())
    }

    pub fn run_test(&self, suite: &Suite, test: &TestCase) -> TestOutcome {
        let tag = suite.tag(test);
        let ctx = TestContext::new(self.hal, self.profile, tag.clone());
        log::info!("{} In {} {}", tag, suite.name, test.name);

        let started = Instant::now();
        let result = panic::catch_unwind(AssertUnwindSafe(|| (test.run)(&ctx)));
        if let Err(payload) = result {
            ctx.record_panic(panic_message(payload.as_ref()));
        }
        ctx.release_leftovers();
        let elapsed = started.elapsed();

        let failures = ctx.into_failures();
        if failures.is_empty() {
            log::info!("{} Out {} PASSED ({} ms)", tag, test.name, elapsed.as_millis());
        } else {
            log::info!(
                "{} Out {} FAILED, {} assertion(s) ({} ms)",
                tag,
                test.name,
                failures.len(),
                elapsed.as_millis()
            );
        }
        TestOutcome::new(&suite.name, suite.level, tag, test.name, failures, elapsed)
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("panicked: {s}")
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("panicked: {s}")
    } else {
        "panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::harness::context::TestResult;
    use rmf_capture_core::{ErrorCode, Handle, RegistryOptions, SessionKind};
    use rmf_capture_sim::reference_registry;

    fn passes(ctx: &TestContext) -> TestResult {
        ctx.check_code(ctx.close(Handle::NULL), ErrorCode::InvalidHandle);
        Ok(())
    }

    fn leaks_open_session(ctx: &TestContext) -> TestResult {
        ctx.open_kind(SessionKind::Primary)?;
        ctx.require(false, "bail out with the session open")
    }

    fn panics(_: &TestContext) -> TestResult {
        panic!("driver exploded");
    }

    fn suite() -> Suite {
        let mut suite = Suite::new("[L1 runner]", Level::L1);
        suite
            .add(TestCase::new("passes", 1, true, passes))
            .add(TestCase::new("leaks_open_session", 2, true, leaks_open_session))
            .add(TestCase::new("panics", 3, false, panics));
        suite
    }

    #[test]
    fn outcomes_and_cleanup() {
        let hal = reference_registry(RegistryOptions::default());
        let profile = DeviceProfile::fast();
        let report = Runner::new(&hal, &profile).run(&[suite()], &Filter::default());

        assert_eq!(report.outcomes.len(), 3);
        assert!(report.outcomes[0].passed);
        assert!(!report.outcomes[1].passed && report.outcomes[1].fatal);
        assert!(report.outcomes[2].fatal);
        assert!(report.outcomes[2].failures[0].contains("driver exploded"));
        // the leaked session was released by the runner
        assert!(hal.state(SessionKind::Primary).is_closed());
    }

    #[test]
    fn filters_by_level_and_name() {
        let hal = reference_registry(RegistryOptions::default());
        let profile = DeviceProfile::fast();
        let runner = Runner::new(&hal, &profile);

        let none = runner.run(&[suite()], &Filter::levels(&[Level::L2]));
        assert!(none.outcomes.is_empty());

        let filter = Filter {
            test: Some("pass".into()),
            ..Filter::default()
        };
        let one = runner.run(&[suite()], &filter);
        assert_eq!(one.outcomes.len(), 1);
        assert!(one.all_passed());
    }
}
