pub mod execution;
pub mod notice;

pub use execution::{ExecutionSession, ExecutionState, SessionEvent, SessionObserver, StartOutcome};
pub use notice::{Notice, NoticeLevel};
