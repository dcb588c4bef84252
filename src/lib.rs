pub mod app;
pub mod frame;
pub mod history;
pub mod task;

pub use app::Session;
pub use history::{CommitKind, HistoryRecord, SessionHistoryController};
