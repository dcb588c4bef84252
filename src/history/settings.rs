use crate::frame::handle::CachePolicy;

#[derive(Debug, Clone)]
pub struct HistorySettings {
    /// Maximum number of back/forward positions kept; `None` keeps everything.
    pub max_entries: Option<usize>,
    pub traversal_cache_policy: CachePolicy,
}

impl Default for HistorySettings {
    fn default() -> Self {
        Self {
            max_entries: None,
            traversal_cache_policy: CachePolicy::ReturnCacheDataElseLoad,
        }
    }
}
