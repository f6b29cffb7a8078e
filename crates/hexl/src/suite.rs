//! Test specifications and the sets that group them.
//!
//! A [`TestSpec`] is a parameterized test that knows its own name, whether
//! its parameter combination is meaningful, and how to run itself. Specs are
//! collected into a [`TestSet`] under a slash-separated path; the
//! [`for_each!`](crate::for_each) macro fills a set with the cartesian
//! product of several value tables.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Final status of one test
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestStatus {
    /// All checks held
    Passed,
    /// A check failed
    Failed,
    /// The test could not be carried out
    Error,
    /// The test does not apply to the target
    #[serde(rename = "na")]
    NotApplicable,
}

impl TestStatus {
    /// Upper-case label used in logs
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Passed => "PASSED",
            Self::Failed => "FAILED",
            Self::Error => "ERROR",
            Self::NotApplicable => "NA",
        }
    }
}

impl fmt::Display for TestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Status plus whatever the test printed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestOutcome {
    /// Final status
    pub status: TestStatus,
    /// Diagnostic output
    pub output: String,
}

impl TestOutcome {
    /// Create a passing outcome
    #[must_use]
    pub const fn pass() -> Self {
        Self {
            status: TestStatus::Passed,
            output: String::new(),
        }
    }

    /// Create a failing outcome
    #[must_use]
    pub fn fail(output: impl Into<String>) -> Self {
        Self {
            status: TestStatus::Failed,
            output: output.into(),
        }
    }

    /// Create an error outcome
    #[must_use]
    pub fn error(output: impl Into<String>) -> Self {
        Self {
            status: TestStatus::Error,
            output: output.into(),
        }
    }

    /// Create a not-applicable outcome
    #[must_use]
    pub const fn not_applicable() -> Self {
        Self {
            status: TestStatus::NotApplicable,
            output: String::new(),
        }
    }

    /// Attach diagnostic output
    #[must_use]
    pub fn with_output(mut self, output: impl Into<String>) -> Self {
        self.output = output.into();
        self
    }

    /// Whether the test passed
    #[must_use]
    pub fn is_passed(&self) -> bool {
        self.status == TestStatus::Passed
    }
}

/// A runnable, self-describing test
pub trait TestSpec: fmt::Debug {
    /// Test name, unique within its set. May contain `/`.
    fn name(&self) -> String;

    /// Whether this parameter combination is worth running
    fn is_valid(&self) -> bool {
        true
    }

    /// Run the test
    fn run(&self) -> TestOutcome;
}

/// Specs grouped under a path
#[derive(Debug, Default)]
pub struct TestSet {
    path: String,
    specs: Vec<Box<dyn TestSpec>>,
    children: Vec<TestSet>,
}

impl TestSet {
    /// Create an empty set at `path`
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            specs: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Path of this set
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Add a spec
    pub fn add(&mut self, spec: impl TestSpec + 'static) {
        self.specs.push(Box::new(spec));
    }

    /// Nest another set; its path is joined below this one
    pub fn add_set(&mut self, set: Self) {
        self.children.push(set);
    }

    /// Number of specs, nested sets included
    #[must_use]
    pub fn len(&self) -> usize {
        self.specs.len() + self.children.iter().map(Self::len).sum::<usize>()
    }

    /// Whether the set holds no specs
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Visit every spec with its full set path, depth first, in insertion order
    pub fn iterate<F>(&self, mut visit: F)
    where
        F: FnMut(&str, &dyn TestSpec),
    {
        self.iterate_under("", &mut visit);
    }

    fn iterate_under<F>(&self, parent: &str, visit: &mut F)
    where
        F: FnMut(&str, &dyn TestSpec),
    {
        let path = join_path(parent, &self.path);
        for spec in &self.specs {
            visit(&path, spec.as_ref());
        }
        for child in &self.children {
            child.iterate_under(&path, visit);
        }
    }

    /// Keep only specs whose full name (`path/name`) contains `pattern`
    #[must_use]
    pub fn filtered(self, pattern: &str) -> Self {
        self.filtered_under("", pattern)
    }

    fn filtered_under(self, parent: &str, pattern: &str) -> Self {
        let path = join_path(parent, &self.path);
        let specs = self
            .specs
            .into_iter()
            .filter(|spec| join_path(&path, &spec.name()).contains(pattern))
            .collect();
        let children = self
            .children
            .into_iter()
            .map(|child| child.filtered_under(&path, pattern))
            .filter(|child| !child.is_empty())
            .collect();
        Self {
            path: self.path,
            specs,
            children,
        }
    }
}

/// Join two path fragments with `/`, skipping empty ones
#[must_use]
pub fn join_path(parent: &str, child: &str) -> String {
    match (parent.is_empty(), child.is_empty()) {
        (true, _) => child.to_string(),
        (_, true) => parent.to_string(),
        _ => format!("{parent}/{child}"),
    }
}

/// Fill a [`TestSet`] with one spec per combination of table values.
///
/// Tables are iterated in order, the last one fastest. Each table expression
/// is evaluated once per value of the tables before it, so it must be cheap
/// to re-create (an array constant or a `.iter().copied()` call).
///
/// ```
/// use hexl::suite::{TestOutcome, TestSet, TestSpec};
///
/// #[derive(Debug)]
/// struct Pair(u32, bool);
///
/// impl TestSpec for Pair {
///     fn name(&self) -> String {
///         format!("{}_{}", self.0, self.1)
///     }
///     fn run(&self) -> TestOutcome {
///         TestOutcome::pass()
///     }
/// }
///
/// let mut set = TestSet::new("pairs");
/// hexl::for_each!(set, [n in [1u32, 2, 3], flag in [false, true]] => Pair(n, flag));
/// assert_eq!(set.len(), 6);
/// ```
#[macro_export]
macro_rules! for_each {
    (@nest $set:expr, [$var:ident in $values:expr], $body:expr) => {
        for $var in $values {
            $set.add($body);
        }
    };
    (@nest $set:expr, [$var:ident in $values:expr, $($rest:tt)+], $body:expr) => {
        for $var in $values {
            $crate::for_each!(@nest $set, [$($rest)+], $body);
        }
    };
    ($set:expr, [$($var:ident in $values:expr),+ $(,)?] => $body:expr) => {
        $crate::for_each!(@nest $set, [$($var in $values),+], $body)
    };
}
