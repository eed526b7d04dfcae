use std::fmt;

use serde::Serialize;

use super::context::{TestContext, TestResult};

/// Escalating test scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    /// State machine and parameter validation.
    L1,
    /// Short functional data-flow runs.
    L2,
    /// Extended throughput, jitter and independence runs.
    L3,
}

impl Level {
    pub fn group(&self) -> u8 {
        match self {
            Self::L1 => 1,
            Self::L2 => 2,
            Self::L3 => 3,
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::L1 => "L1",
            Self::L2 => "L2",
            Self::L3 => "L3",
        })
    }
}

pub type TestFn = fn(&TestContext) -> TestResult;

#[derive(Clone)]
pub struct TestCase {
    pub name: &'static str,
    pub id: u16,
    /// Makes only calls that are expected to succeed.
    pub positive: bool,
    pub run: TestFn,
}

impl TestCase {
    pub fn new(name: &'static str, id: u16, positive: bool, run: TestFn) -> Self {
        Self {
            name,
            id,
            positive,
            run,
        }
    }
}

impl fmt::Debug for TestCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestCase")
            .field("name", &self.name)
            .field("id", &self.id)
            .field("positive", &self.positive)
            .finish()
    }
}

/// A named, ordered set of tests at one level.
#[derive(Debug, Clone)]
pub struct Suite {
    pub name: String,
    pub level: Level,
    pub tests: Vec<TestCase>,
}

impl Suite {
    pub fn new(name: impl Into<String>, level: Level) -> Self {
        Self {
            name: name.into(),
            level,
            tests: Vec::new(),
        }
    }

    pub fn add(&mut self, test: TestCase) -> &mut Self {
        self.tests.push(test);
        self
    }

    /// `[GGIII]`, group then id, as the test appears in logs.
    pub fn tag(&self, test: &TestCase) -> String {
        format!("[{:02}{:03}]", self.level.group(), test.id)
    }

    pub fn find(&self, name: &str) -> Option<&TestCase> {
        self.tests.iter().find(|t| t.name == name)
    }
}
