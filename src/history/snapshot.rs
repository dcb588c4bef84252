use super::controller::CommitKind;
use super::record::HistoryRecord;
use crate::frame::handle::{live_frame_names, FrameHandle};
use std::rc::Rc;

/// A history record together with the frame it belongs to.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameHistoryEntry {
    pub unique_name: String,
    pub record: HistoryRecord,
    pub is_same_document: bool,
}

impl FrameHistoryEntry {
    pub fn new(unique_name: impl Into<String>, record: HistoryRecord, is_same_document: bool) -> Self {
        Self {
            unique_name: unique_name.into(),
            record,
            is_same_document,
        }
    }

    pub fn item_sequence_number(&self) -> i64 {
        self.record.item_sequence_number
    }
}

/// Every frame's history record for one back/forward position.
///
/// Holds at most one entry per frame unique name. Entries keep the order in
/// which their frames first committed, which for a well-behaved host is the
/// tree's pre-order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameTreeSnapshot {
    entries: Vec<FrameHistoryEntry>,
}

impl FrameTreeSnapshot {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn insert_or_replace(
        &mut self,
        frame_unique_name: &str,
        record: HistoryRecord,
        commit_kind: CommitKind,
        is_same_document: bool,
    ) {
        match self.entries.iter_mut().find(|e| e.unique_name == frame_unique_name) {
            Some(entry) => {
                log::trace!(
                    "{}: replacing entry {} -> {} ({:?})",
                    frame_unique_name,
                    entry.record.item_sequence_number,
                    record.item_sequence_number,
                    commit_kind
                );
                entry.record = record;
                entry.is_same_document = is_same_document;
            }
            None => {
                log::trace!(
                    "{}: new entry {} ({:?})",
                    frame_unique_name,
                    record.item_sequence_number,
                    commit_kind
                );
                self.entries.push(FrameHistoryEntry::new(
                    frame_unique_name,
                    record,
                    is_same_document,
                ));
            }
        }
    }

    /// Drops entries for frames that are no longer part of the tree containing `frame`.
    pub fn prune_to_frame_tree(&mut self, frame: Rc<dyn FrameHandle>) {
        let live = live_frame_names(frame);
        self.entries.retain(|entry| {
            let keep = live.contains(&entry.unique_name);
            if !keep {
                log::trace!("{}: pruning entry for detached frame", entry.unique_name);
            }
            keep
        });
    }

    pub fn entry(&self, unique_name: &str) -> Option<&FrameHistoryEntry> {
        self.entries.iter().find(|e| e.unique_name == unique_name)
    }

    pub fn entries(&self) -> &[FrameHistoryEntry] {
        &self.entries
    }

    pub fn contains_item(&self, item_sequence_number: i64) -> bool {
        self.entries
            .iter()
            .any(|e| e.item_sequence_number() == item_sequence_number)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::FrameTree;

    fn record(url: &str, item: i64) -> HistoryRecord {
        HistoryRecord::new(url).with_sequence_numbers(item, item)
    }

    #[test]
    fn test_insert_or_replace_keeps_one_entry_per_frame() {
        let mut snapshot = FrameTreeSnapshot::new();
        snapshot.insert_or_replace("top", record("https://a.test/", 1), CommitKind::Standard, false);
        snapshot.insert_or_replace("child", record("https://b.test/", 2), CommitKind::Standard, false);
        snapshot.insert_or_replace("top", record("https://a.test/#x", 3), CommitKind::Standard, true);

        assert_eq!(snapshot.len(), 2);
        let top = snapshot.entry("top").unwrap();
        assert_eq!(top.item_sequence_number(), 3);
        assert!(top.is_same_document);
        // Replacing keeps the original position.
        assert_eq!(snapshot.entries()[0].unique_name, "top");
        assert_eq!(snapshot.entries()[1].unique_name, "child");
    }

    #[test]
    fn test_clone_is_independent() {
        let mut original = FrameTreeSnapshot::new();
        original.insert_or_replace("top", record("https://a.test/", 1), CommitKind::Standard, false);

        let mut copy = original.clone();
        copy.insert_or_replace("top", record("https://a.test/next", 2), CommitKind::Standard, false);
        copy.insert_or_replace("child", record("https://b.test/", 3), CommitKind::Standard, false);

        assert_eq!(original.len(), 1);
        assert_eq!(original.entry("top").unwrap().item_sequence_number(), 1);
        assert_eq!(copy.entry("top").unwrap().item_sequence_number(), 2);
    }

    #[test]
    fn test_prune_removes_detached_frames() {
        let tree = FrameTree::new("top");
        let top = tree.top();
        let kept = tree.append_child(top, "kept").unwrap();
        let gone = tree.append_child(top, "gone").unwrap();
        tree.append_child(gone, "gone-inner").unwrap();

        let mut snapshot = FrameTreeSnapshot::new();
        for (i, name) in ["top", "kept", "gone", "gone-inner"].iter().enumerate() {
            snapshot.insert_or_replace(name, record("https://a.test/", i as i64), CommitKind::Standard, false);
        }

        tree.remove(gone).unwrap();
        snapshot.prune_to_frame_tree(tree.handle(kept).unwrap());

        let names: Vec<&str> = snapshot.entries().iter().map(|e| e.unique_name.as_str()).collect();
        assert_eq!(names, vec!["top", "kept"]);
    }

    #[test]
    fn test_contains_item() {
        let mut snapshot = FrameTreeSnapshot::new();
        snapshot.insert_or_replace("top", record("https://a.test/", 7), CommitKind::Standard, false);

        assert!(snapshot.contains_item(7));
        assert!(!snapshot.contains_item(8));
    }
}
