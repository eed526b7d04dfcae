pub mod context;
pub mod report;
pub mod runner;
pub mod suite;

pub use context::{Failure, Fatal, TestContext, TestResult};
pub use report::{RunReport, SuiteTotals, TestOutcome};
pub use runner::{Filter, Runner};
pub use suite::{Level, Suite, TestCase, TestFn};
