//! Domain model (ids, tasks, outcomes, completion events, snapshots).
//!
//! ここには並行処理の仕組みは含めない。queue / store / worker が
//! これらの型を受け渡す。

pub mod event;
pub mod ids;
pub mod outcome;
pub mod snapshot;
pub mod task;

pub use event::CompletionEvent;
pub use ids::{RunId, WorkerId};
pub use outcome::Outcome;
pub use snapshot::{ProgressCounts, Snapshot};
pub use task::{Task, TaskSpec, TaskStatus, generate_tasks};
