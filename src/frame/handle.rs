//! Capabilities the history controller needs from the host's frame tree.

use crate::history::HistoryRecord;
use std::collections::HashSet;
use std::rc::Rc;

/// How a frame should apply a history record it is asked to load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryLoadType {
    /// Update URL, state and scroll position without loading a new document.
    SameDocument,
    /// Load the record's document from scratch.
    DifferentDocument,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CachePolicy {
    UseProtocolCachePolicy,
    ReloadIgnoringCacheData,
    #[default]
    ReturnCacheDataElseLoad,
    ReturnCacheDataDontLoad,
}

impl CachePolicy {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "protocol" | "use-protocol" => Some(Self::UseProtocolCachePolicy),
            "reload" | "reload-ignoring-cache" => Some(Self::ReloadIgnoringCacheData),
            "else-load" | "return-cache-else-load" => Some(Self::ReturnCacheDataElseLoad),
            "dont-load" | "return-cache-dont-load" => Some(Self::ReturnCacheDataDontLoad),
            _ => None,
        }
    }
}

/// A live frame as seen by the history controller.
pub trait FrameHandle {
    fn unique_name(&self) -> String;

    fn parent(&self) -> Option<Rc<dyn FrameHandle>>;

    /// Next frame in a pre-order walk of the whole tree, or `None` after the last one.
    fn next_in_preorder(&self) -> Option<Rc<dyn FrameHandle>>;

    /// Ask the frame to navigate to a stored record. The load completes
    /// asynchronously and is reported back through a `BackForward` commit.
    fn load_history_record(
        &self,
        record: HistoryRecord,
        load_type: HistoryLoadType,
        cache_policy: CachePolicy,
    );
}

pub trait FrameHost {
    fn lookup_frame_by_unique_name(&self, name: &str) -> Option<Rc<dyn FrameHandle>>;
}

/// Walks parent links up to the top frame of `frame`'s tree.
pub fn top_frame(frame: Rc<dyn FrameHandle>) -> Rc<dyn FrameHandle> {
    let mut current = frame;
    while let Some(parent) = current.parent() {
        current = parent;
    }
    current
}

/// Unique names of every frame in the tree containing `frame`.
pub fn live_frame_names(frame: Rc<dyn FrameHandle>) -> HashSet<String> {
    let mut names = HashSet::new();
    let mut next = Some(top_frame(frame));

    while let Some(current) = next {
        names.insert(current.unique_name());
        next = current.next_in_preorder();
    }

    names
}
