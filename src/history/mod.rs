pub mod controller;
pub mod list;
pub mod navigation;
pub mod record;
pub mod settings;
pub mod snapshot;

pub use controller::{CommitKind, SessionHistoryController, TraversalState};
pub use list::BackForwardList;
pub use navigation::{plan_traversal, should_do_same_document_navigation, TraversalRequest};
pub use record::{HistoryRecord, Referrer, ReferrerPolicy, ScrollOffset, ScrollRestoration, ViewportOffset};
pub use settings::HistorySettings;
pub use snapshot::{FrameHistoryEntry, FrameTreeSnapshot};
