//! Estate activity trail.
//!
//! Records who did what to an estate. Recording is fire-and-forget: a
//! failed write is logged and never fails the operation that produced it.

mod event;
mod storage;

pub use event::{ActivityEntry, ActivityEvent};
pub use storage::{ActivityStore, OptionalActivityLog, WithActivityLog};

#[cfg(any(test, feature = "test-estates"))]
pub use storage::test::InMemoryActivityStore;
