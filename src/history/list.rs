use super::snapshot::FrameTreeSnapshot;

/// Ordered back/forward positions plus the cursor into them.
///
/// `current_index` is -1 exactly when the list is empty, and otherwise
/// always points at an existing snapshot.
#[derive(Debug)]
pub struct BackForwardList {
    snapshots: Vec<FrameTreeSnapshot>,
    current_index: i64,
    max_entries: Option<usize>,
}

impl BackForwardList {
    pub fn new(max_entries: Option<usize>) -> Self {
        Self {
            snapshots: Vec::new(),
            current_index: -1,
            max_entries,
        }
    }

    pub fn current_index(&self) -> i64 {
        self.current_index
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn snapshots(&self) -> &[FrameTreeSnapshot] {
        &self.snapshots
    }

    pub fn get(&self, index: i64) -> Option<&FrameTreeSnapshot> {
        usize::try_from(index).ok().and_then(|i| self.snapshots.get(i))
    }

    pub fn get_mut(&mut self, index: i64) -> Option<&mut FrameTreeSnapshot> {
        usize::try_from(index).ok().and_then(|i| self.snapshots.get_mut(i))
    }

    pub fn current(&self) -> Option<&FrameTreeSnapshot> {
        self.get(self.current_index)
    }

    pub fn current_mut(&mut self) -> Option<&mut FrameTreeSnapshot> {
        self.get_mut(self.current_index)
    }

    /// Entries before the cursor; -1 while the list is empty.
    pub fn back_count(&self) -> i64 {
        self.current_index
    }

    pub fn forward_count(&self) -> i64 {
        self.snapshots.len() as i64 - self.current_index - 1
    }

    pub fn can_go_back(&self) -> bool {
        self.current_index > 0
    }

    pub fn can_go_forward(&self) -> bool {
        self.forward_count() > 0
    }

    /// Index `offset` positions away from the cursor, if it exists.
    pub fn target_index(&self, offset: i64) -> Option<usize> {
        let target = self.current_index.checked_add(offset)?;
        usize::try_from(target)
            .ok()
            .filter(|&t| t < self.snapshots.len())
    }

    pub fn set_current(&mut self, index: usize) {
        if index < self.snapshots.len() {
            self.current_index = index as i64;
        }
    }

    /// Makes `snapshot` the position after the cursor, discarding any
    /// forward entries, and moves the cursor onto it.
    ///
    /// Returns how many of the oldest snapshots were evicted to respect
    /// `max_entries`.
    pub fn push(&mut self, snapshot: FrameTreeSnapshot) -> usize {
        let next = (self.current_index + 1) as usize;
        if next < self.snapshots.len() {
            log::debug!(
                "Discarding {} forward entries after index {}",
                self.snapshots.len() - next,
                self.current_index
            );
            self.snapshots.truncate(next);
        }

        self.snapshots.push(snapshot);
        self.current_index = next as i64;

        let capacity = match self.max_entries {
            Some(max) => max.max(1),
            None => return 0,
        };
        let excess = self.snapshots.len().saturating_sub(capacity);
        if excess > 0 {
            log::debug!("Evicting {} oldest entries (capacity {})", excess, capacity);
            self.snapshots.drain(..excess);
            self.current_index -= excess as i64;
        }
        excess
    }

    /// Offset from the cursor to the first snapshot, in list order, holding
    /// `item_sequence_number`.
    ///
    /// A list with at most one snapshot always answers `Some(0)`, even when
    /// nothing matches.
    pub fn find_entry(&self, item_sequence_number: i64) -> Option<i64> {
        if self.snapshots.len() <= 1 {
            return Some(0);
        }

        self.snapshots
            .iter()
            .position(|s| s.contains_item(item_sequence_number))
            .map(|i| i as i64 - self.current_index)
    }
}
