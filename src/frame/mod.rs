pub mod handle;
pub mod tree;

pub use handle::{CachePolicy, FrameHandle, FrameHost, HistoryLoadType};
pub use tree::{FrameId, FrameTree, FrameTreeError, PendingLoad};
