//! Task: immutable work descriptor + one-shot outcome fields.

use std::any::Any;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::str::FromStr;

use futures::FutureExt;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::outcome::Outcome;
use crate::error::FanoutError;
use crate::ports::Workload;

/// Task status.
///
/// State transitions (monotonic, each at most once):
/// - Pending -> Running -> Done
/// - Pending -> Running -> Failed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    #[default]
    Pending,
    Running,
    Done,
    Failed,
}

impl TaskStatus {
    /// Is this a terminal state (no further transitions)?
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskStatus::Done | TaskStatus::Failed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Running => "running",
            TaskStatus::Done => "done",
            TaskStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `(name, complexity)` pair supplied by the driver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskSpec {
    name: String,
    complexity: u32,
}

impl TaskSpec {
    pub fn new(name: impl Into<String>, complexity: u32) -> Result<Self, FanoutError> {
        let name = name.into();
        if name.is_empty() {
            return Err(FanoutError::InvalidTask {
                name,
                reason: "name must not be empty".to_string(),
            });
        }
        if complexity == 0 {
            return Err(FanoutError::InvalidTask {
                name,
                reason: "complexity must be positive".to_string(),
            });
        }
        Ok(Self { name, complexity })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn complexity(&self) -> u32 {
        self.complexity
    }
}

/// Parses `NAME:COMPLEXITY`. The split is on the last `:` so names may
/// contain colons.
impl FromStr for TaskSpec {
    type Err = FanoutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let Some((name, complexity)) = s.rsplit_once(':') else {
            return Err(FanoutError::InvalidTask {
                name: s.to_string(),
                reason: "expected NAME:COMPLEXITY".to_string(),
            });
        };
        let complexity = complexity
            .trim()
            .parse::<u32>()
            .map_err(|e| FanoutError::InvalidTask {
                name: name.to_string(),
                reason: format!("complexity {complexity:?}: {e}"),
            })?;
        TaskSpec::new(name.trim(), complexity)
    }
}

/// `Task-1 .. Task-count`, each with a random complexity in `1..=3`.
pub fn generate_tasks<R: Rng>(count: usize, rng: &mut R) -> Vec<TaskSpec> {
    (1..=count)
        .map(|i| TaskSpec {
            name: format!("Task-{i}"),
            complexity: rng.gen_range(1..=3),
        })
        .collect()
}

/// A unit of work travelling through the queue.
///
/// Ownership model: the queue hands a `Task` by value to exactly one worker,
/// so no locking is needed here. `execute` must be called at most once;
/// that is guaranteed by the queue's single delivery, not by `Task`.
#[derive(Debug, Clone)]
pub struct Task {
    spec: TaskSpec,
    status: TaskStatus,
    result: Option<String>,
}

impl Task {
    pub fn new(spec: TaskSpec) -> Self {
        Self {
            spec,
            status: TaskStatus::Pending,
            result: None,
        }
    }

    pub fn spec(&self) -> &TaskSpec {
        &self.spec
    }

    pub fn name(&self) -> &str {
        self.spec.name()
    }

    pub fn complexity(&self) -> u32 {
        self.spec.complexity()
    }

    pub fn status(&self) -> TaskStatus {
        self.status
    }

    pub fn result(&self) -> Option<&str> {
        self.result.as_deref()
    }

    /// Run the task body and record its outcome.
    ///
    /// Pending -> Running, then Done with the body's result, or Failed with
    /// the error text as payload. A failing or panicking body never
    /// propagates out of here.
    pub async fn execute(&mut self, workload: &dyn Workload) -> Outcome {
        debug_assert_eq!(self.status, TaskStatus::Pending, "task executed twice");
        self.status = TaskStatus::Running;

        let body = AssertUnwindSafe(workload.run(&self.spec)).catch_unwind().await;
        match body {
            Ok(Ok(result)) => {
                self.result = Some(result);
                self.status = TaskStatus::Done;
            }
            Ok(Err(err)) => {
                self.result = Some(err.to_string());
                self.status = TaskStatus::Failed;
            }
            Err(payload) => {
                self.result = Some(format!("task panicked: {}", panic_message(&*payload)));
                self.status = TaskStatus::Failed;
            }
        }

        self.outcome()
    }

    /// Current `{status, result}` pair.
    pub fn outcome(&self) -> Outcome {
        Outcome {
            status: self.status,
            result: self.result.clone(),
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        msg
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg
    } else {
        "unknown panic payload"
    }
}

impl From<TaskSpec> for Task {
    fn from(spec: TaskSpec) -> Self {
        Task::new(spec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::WorkloadError;
    use async_trait::async_trait;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use rstest::rstest;

    struct Echo;

    #[async_trait]
    impl Workload for Echo {
        async fn run(&self, spec: &TaskSpec) -> Result<String, WorkloadError> {
            Ok(format!("{} ok", spec.name()))
        }
    }

    struct Broken;

    #[async_trait]
    impl Workload for Broken {
        async fn run(&self, _spec: &TaskSpec) -> Result<String, WorkloadError> {
            Err(WorkloadError::new("boom"))
        }
    }

    #[tokio::test]
    async fn execute_transitions_to_done() {
        let mut task = Task::new(TaskSpec::new("A", 1).unwrap());
        assert_eq!(task.status(), TaskStatus::Pending);
        assert_eq!(task.result(), None);

        let outcome = task.execute(&Echo).await;

        assert_eq!(outcome.status, TaskStatus::Done);
        assert_eq!(outcome.result.as_deref(), Some("A ok"));
        assert_eq!(task.status(), TaskStatus::Done);
        assert_eq!(task.result(), Some("A ok"));
    }

    #[tokio::test]
    async fn failing_body_is_recorded_not_propagated() {
        let mut task = Task::new(TaskSpec::new("B", 2).unwrap());

        let outcome = task.execute(&Broken).await;

        assert_eq!(outcome.status, TaskStatus::Failed);
        assert!(outcome.result.unwrap().contains("boom"));
        assert!(task.status().is_terminal());
    }

    struct Exploding;

    #[async_trait]
    impl Workload for Exploding {
        async fn run(&self, spec: &TaskSpec) -> Result<String, WorkloadError> {
            panic!("{} blew up", spec.name());
        }
    }

    #[tokio::test]
    async fn panicking_body_becomes_failed_outcome() {
        let mut task = Task::new(TaskSpec::new("C", 1).unwrap());

        let outcome = task.execute(&Exploding).await;

        assert_eq!(outcome.status, TaskStatus::Failed);
        assert_eq!(outcome.result.as_deref(), Some("task panicked: C blew up"));
        assert_eq!(task.status(), TaskStatus::Failed);
    }

    #[rstest]
    #[case("A:1", "A", 1)]
    #[case("Task-7:3", "Task-7", 3)]
    #[case("ns:job: 2", "ns:job", 2)]
    fn spec_parses(#[case] input: &str, #[case] name: &str, #[case] complexity: u32) {
        let spec: TaskSpec = input.parse().unwrap();
        assert_eq!(spec.name(), name);
        assert_eq!(spec.complexity(), complexity);
    }

    #[rstest]
    #[case("A")]
    #[case("A:0")]
    #[case("A:-1")]
    #[case(":2")]
    fn spec_rejects(#[case] input: &str) {
        assert!(input.parse::<TaskSpec>().is_err());
    }

    #[test]
    fn status_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&TaskStatus::Done).unwrap(), "\"done\"");
        assert_eq!(serde_json::to_string(&TaskStatus::Failed).unwrap(), "\"failed\"");
        assert_eq!(TaskStatus::Running.to_string(), "running");
    }

    #[test]
    fn generated_tasks_have_unique_names_and_bounded_complexity() {
        let mut rng = StdRng::seed_from_u64(7);
        let specs = generate_tasks(10, &mut rng);

        assert_eq!(specs.len(), 10);
        assert_eq!(specs[0].name(), "Task-1");
        assert_eq!(specs[9].name(), "Task-10");
        assert!(specs.iter().all(|s| (1..=3).contains(&s.complexity())));
    }
}
