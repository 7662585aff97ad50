//! Queue module: the FIFO of tasks that workers drain.

mod memory;

pub use memory::WorkQueue;
