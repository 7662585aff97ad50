//! Outcome record stored per task name.

use serde::{Deserialize, Serialize};

use super::task::TaskStatus;

/// `{status, result}` as kept by the state store.
///
/// Always replaced as a whole, so readers never see a status from one write
/// paired with a result from another.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outcome {
    pub status: TaskStatus,
    pub result: Option<String>,
}

impl Outcome {
    pub fn done(result: impl Into<String>) -> Self {
        Self {
            status: TaskStatus::Done,
            result: Some(result.into()),
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            status: TaskStatus::Failed,
            result: Some(error.into()),
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}
