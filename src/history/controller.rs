use super::list::BackForwardList;
use super::navigation::{plan_traversal, TraversalRequest};
use super::record::HistoryRecord;
use super::settings::HistorySettings;
use super::snapshot::FrameTreeSnapshot;
use crate::frame::handle::FrameHost;
use crate::task::Scheduler;
use std::cell::RefCell;
use std::rc::Rc;

/// How a frame's finished navigation relates to the back/forward list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitKind {
    /// A new navigation: adds a position and drops forward history.
    Standard,
    /// A frame replaying a stored record during back/forward traversal.
    BackForward,
    /// A new child frame's first load. Leaves the list alone.
    InitialCommitInChildFrame,
    /// Reload or `replaceState`: rewrites the current position in place.
    Inert,
}

/// Where the controller is in a back/forward traversal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraversalState {
    Idle,
    /// Traversal loads were issued and the next `BackForward` commit has not
    /// arrived yet. That commit picks the position the cursor lands on;
    /// `target` is the position the traversal aimed at while it is still in
    /// the list.
    AwaitingBackForwardResolution { target: Option<usize> },
}

#[derive(Debug)]
struct HistoryState {
    list: BackForwardList,
    traversal: TraversalState,
}

impl HistoryState {
    fn begin_traversal(&mut self, offset: i64) -> Vec<TraversalRequest> {
        let Some(target) = self.list.target_index(offset) else {
            log::debug!("Traversal by {} is no longer in range", offset);
            return Vec::new();
        };
        let (Some(current), Some(wanted)) = (self.list.current(), self.list.get(target as i64)) else {
            return Vec::new();
        };

        let requests = plan_traversal(current, wanted);
        if !requests.is_empty() {
            log::debug!(
                "Traversing from {} to {}: {} frame loads",
                self.list.current_index(),
                target,
                requests.len()
            );
            self.traversal = TraversalState::AwaitingBackForwardResolution {
                target: Some(target),
            };
        }
        requests
    }

    fn commit_standard(&mut self, snapshot: FrameTreeSnapshot) {
        let evicted = self.list.push(snapshot);
        if evicted == 0 {
            return;
        }
        if let TraversalState::AwaitingBackForwardResolution { target } = &mut self.traversal {
            *target = target.and_then(|t| t.checked_sub(evicted));
        }
    }

    fn resolve_back_forward(
        &mut self,
        target: Option<usize>,
        frame_unique_name: &str,
        record: HistoryRecord,
        commit_kind: CommitKind,
        is_same_document: bool,
    ) {
        // The first guarded commit ends the wait whether or not it matches.
        self.traversal = TraversalState::Idle;

        // A record left unchanged by several navigations sits in many
        // positions; the traversal target names the one this load belongs to.
        // The list-order scan only applies when the target does not hold it.
        let item = record.item_sequence_number;
        let index = target
            .filter(|&t| self.list.get(t as i64).is_some_and(|s| s.contains_item(item)))
            .or_else(|| {
                let offset = self.list.find_entry(item)?;
                usize::try_from(self.list.current_index() + offset)
                    .ok()
                    .filter(|&i| i < self.list.len())
            });

        let Some(index) = index else {
            log::warn!(
                "{}: back/forward commit for item {} matches no history entry",
                frame_unique_name,
                item
            );
            return;
        };

        log::debug!(
            "{}: back/forward commit moves cursor {} -> {}",
            frame_unique_name,
            self.list.current_index(),
            index
        );
        if let Some(snapshot) = self.list.get_mut(index as i64) {
            snapshot.insert_or_replace(frame_unique_name, record, commit_kind, is_same_document);
        }
        self.list.set_current(index);
    }

    fn update_current(
        &mut self,
        frame_unique_name: &str,
        record: HistoryRecord,
        commit_kind: CommitKind,
        is_same_document: bool,
    ) {
        match self.list.current_mut() {
            Some(snapshot) => {
                snapshot.insert_or_replace(frame_unique_name, record, commit_kind, is_same_document)
            }
            None => log::debug!(
                "{}: ignoring {:?} commit, history is empty",
                frame_unique_name,
                commit_kind
            ),
        }
    }
}

/// Back/forward list for a page made of a tree of frames.
///
/// Cloning yields another handle to the same history; all handles must stay
/// on the thread that owns the frame tree.
#[derive(Clone)]
pub struct SessionHistoryController {
    state: Rc<RefCell<HistoryState>>,
    host: Rc<dyn FrameHost>,
    scheduler: Rc<dyn Scheduler>,
    settings: HistorySettings,
}

impl SessionHistoryController {
    pub fn new(host: Rc<dyn FrameHost>, scheduler: Rc<dyn Scheduler>, settings: HistorySettings) -> Self {
        Self {
            state: Rc::new(RefCell::new(HistoryState {
                list: BackForwardList::new(settings.max_entries),
                traversal: TraversalState::Idle,
            })),
            host,
            scheduler,
            settings,
        }
    }

    pub fn settings(&self) -> &HistorySettings {
        &self.settings
    }

    /// Records a finished navigation of `frame_unique_name`.
    pub fn commit(
        &self,
        frame_unique_name: &str,
        record: HistoryRecord,
        commit_kind: CommitKind,
        is_same_document: bool,
    ) {
        match commit_kind {
            CommitKind::Standard => {
                let mut snapshot = self
                    .state
                    .borrow()
                    .list
                    .current()
                    .cloned()
                    .unwrap_or_default();
                snapshot.insert_or_replace(frame_unique_name, record, commit_kind, is_same_document);

                // Host calls happen without the state borrowed.
                match self.host.lookup_frame_by_unique_name(frame_unique_name) {
                    Some(frame) => snapshot.prune_to_frame_tree(frame),
                    None => log::debug!("{}: frame not found, skipping prune", frame_unique_name),
                }

                self.state.borrow_mut().commit_standard(snapshot);
            }
            CommitKind::BackForward => {
                let mut state = self.state.borrow_mut();
                let traversal = state.traversal;
                match traversal {
                    TraversalState::AwaitingBackForwardResolution { target } => state
                        .resolve_back_forward(
                            target,
                            frame_unique_name,
                            record,
                            commit_kind,
                            is_same_document,
                        ),
                    TraversalState::Idle => state.update_current(
                        frame_unique_name,
                        record,
                        commit_kind,
                        is_same_document,
                    ),
                }
            }
            CommitKind::InitialCommitInChildFrame => {
                log::trace!("{}: initial child commit leaves history alone", frame_unique_name);
            }
            CommitKind::Inert => {
                self.state.borrow_mut().update_current(
                    frame_unique_name,
                    record,
                    commit_kind,
                    is_same_document,
                );
            }
        }
    }

    /// Schedules a traversal `offset` positions away from the current one.
    ///
    /// Returns false, doing nothing, when the target is outside the list.
    /// The frame loads themselves are issued from a deferred task.
    pub fn navigate_by_offset(&self, offset: i64) -> bool {
        let in_range = self.state.borrow().list.target_index(offset).is_some();
        if !in_range {
            log::debug!("Ignoring traversal by {}: out of range", offset);
            return false;
        }

        let state = Rc::downgrade(&self.state);
        let host = Rc::clone(&self.host);
        let cache_policy = self.settings.traversal_cache_policy;

        self.scheduler.post(Box::new(move || {
            let Some(state) = state.upgrade() else {
                return;
            };
            let requests = state.borrow_mut().begin_traversal(offset);

            for request in requests {
                match host.lookup_frame_by_unique_name(&request.unique_name) {
                    Some(frame) => {
                        frame.load_history_record(request.record, request.load_type, cache_policy)
                    }
                    None => log::warn!(
                        "{}: frame disappeared before its history load",
                        request.unique_name
                    ),
                }
            }
        }));
        true
    }

    pub fn navigate_to_index(&self, index: i64) -> bool {
        let offset = index.saturating_sub(self.current_index());
        self.navigate_by_offset(offset)
    }

    pub fn history_back_list_count(&self) -> i64 {
        self.state.borrow().list.back_count()
    }

    pub fn history_forward_list_count(&self) -> i64 {
        self.state.borrow().list.forward_count()
    }

    pub fn can_go_back(&self) -> bool {
        self.state.borrow().list.can_go_back()
    }

    pub fn can_go_forward(&self) -> bool {
        self.state.borrow().list.can_go_forward()
    }

    /// The current position's record for a frame being (re)created, if any.
    pub fn history_item_for_new_child_frame(&self, child_unique_name: &str) -> Option<HistoryRecord> {
        let state = self.state.borrow();
        let entry = state.list.current()?.entry(child_unique_name)?;
        Some(entry.record.clone())
    }

    /// Offset from the cursor to the first position holding `record`'s item.
    pub fn find_entry(&self, record: &HistoryRecord) -> Option<i64> {
        self.state.borrow().list.find_entry(record.item_sequence_number)
    }

    pub fn current_index(&self) -> i64 {
        self.state.borrow().list.current_index()
    }

    pub fn len(&self) -> usize {
        self.state.borrow().list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.borrow().list.is_empty()
    }

    pub fn traversal_state(&self) -> TraversalState {
        self.state.borrow().traversal
    }

    pub fn snapshot(&self, index: i64) -> Option<FrameTreeSnapshot> {
        self.state.borrow().list.get(index).cloned()
    }

    pub fn current_snapshot(&self) -> Option<FrameTreeSnapshot> {
        self.state.borrow().list.current().cloned()
    }

    pub fn snapshots(&self) -> Vec<FrameTreeSnapshot> {
        self.state.borrow().list.snapshots().to_vec()
    }
}
