use crate::frame::{FrameId, FrameTree, FrameTreeError, HistoryLoadType};
use crate::history::{CommitKind, HistoryRecord, HistorySettings, SessionHistoryController};
use crate::task::{Scheduler, TaskQueue};
use std::fmt::Write;
use std::rc::Rc;

/// A page's frame tree wired to its session history, with a deferred task
/// queue standing in for the event loop.
pub struct Session {
    tree: FrameTree,
    tasks: Rc<TaskQueue>,
    history: SessionHistoryController,
}

impl Session {
    pub fn new(top_name: &str, settings: HistorySettings) -> Self {
        let tree = FrameTree::new(top_name);
        let tasks = Rc::new(TaskQueue::new());
        let history = SessionHistoryController::new(
            Rc::new(tree.clone()),
            Rc::clone(&tasks) as Rc<dyn Scheduler>,
            settings,
        );

        Self {
            tree,
            tasks,
            history,
        }
    }

    pub fn tree(&self) -> &FrameTree {
        &self.tree
    }

    pub fn history(&self) -> &SessionHistoryController {
        &self.history
    }

    pub fn pending_tasks(&self) -> usize {
        self.tasks.pending()
    }

    /// Loads a new document into `frame`.
    ///
    /// A child frame's first document is an initial commit; every other
    /// load adds a history position. Child frames of the old document go away.
    pub fn navigate(&self, frame: &str, url: &str) -> Result<HistoryRecord, FrameTreeError> {
        let id = self.tree.find_or_err(frame)?;
        let previous = self.tree.current_record(id);

        let mut record = HistoryRecord::new(url);
        record.target_frame_name = frame.to_string();
        if let Some(previous) = &previous {
            record = record.with_referrer(previous.url.clone(), previous.referrer.policy);
        }

        let kind = if previous.is_none() && self.tree.parent(id).is_some() {
            CommitKind::InitialCommitInChildFrame
        } else {
            CommitKind::Standard
        };

        self.detach_children(id)?;
        self.tree.set_current_record(id, record.clone());
        log::info!("{}: navigated to {} ({:?})", frame, url, kind);
        self.history.commit(frame, record.clone(), kind, false);
        Ok(record)
    }

    /// Fragment navigation within the frame's current document.
    pub fn navigate_fragment(&self, frame: &str, url: &str) -> Result<HistoryRecord, FrameTreeError> {
        let id = self.tree.find_or_err(frame)?;
        let Some(current) = self.tree.current_record(id) else {
            return self.navigate(frame, url);
        };

        let record = current.same_document(url);
        self.tree.set_current_record(id, record.clone());
        self.history.commit(frame, record.clone(), CommitKind::Standard, true);
        Ok(record)
    }

    pub fn push_state(&self, frame: &str, url: &str, state: &str) -> Result<HistoryRecord, FrameTreeError> {
        let id = self.tree.find_or_err(frame)?;
        let Some(current) = self.tree.current_record(id) else {
            return self.navigate(frame, url);
        };

        let record = current.same_document(url).with_state_object(state);
        self.tree.set_current_record(id, record.clone());
        self.history.commit(frame, record.clone(), CommitKind::Standard, true);
        Ok(record)
    }

    /// `replaceState`: rewrites the frame's current record without a new position.
    pub fn replace_state(&self, frame: &str, url: &str) -> Result<HistoryRecord, FrameTreeError> {
        let id = self.tree.find_or_err(frame)?;
        let Some(mut record) = self.tree.current_record(id) else {
            return self.navigate(frame, url);
        };

        record.url = url.to_string();
        self.tree.set_current_record(id, record.clone());
        self.history.commit(frame, record.clone(), CommitKind::Inert, true);
        Ok(record)
    }

    pub fn reload(&self, frame: &str) -> Result<(), FrameTreeError> {
        let id = self.tree.find_or_err(frame)?;
        match self.tree.current_record(id) {
            Some(record) => self.history.commit(frame, record, CommitKind::Inert, false),
            None => log::debug!("{}: nothing to reload", frame),
        }
        Ok(())
    }

    /// Creates a child frame. If the current history position remembers a
    /// record for that name, the frame starts from it.
    pub fn add_frame(&self, parent: &str, name: &str) -> Result<FrameId, FrameTreeError> {
        let parent = self.tree.find_or_err(parent)?;
        let id = self.tree.append_child(parent, name)?;

        if let Some(record) = self.history.history_item_for_new_child_frame(name) {
            log::info!("{}: restored {} from history", name, record.url);
            self.tree.set_current_record(id, record.clone());
            self.history
                .commit(name, record, CommitKind::InitialCommitInChildFrame, false);
        }
        Ok(id)
    }

    pub fn remove_frame(&self, name: &str) -> Result<(), FrameTreeError> {
        let id = self.tree.find_or_err(name)?;
        self.tree.remove(id)
    }

    pub fn go(&self, offset: i64) -> bool {
        self.history.navigate_by_offset(offset)
    }

    pub fn go_to(&self, index: i64) -> bool {
        self.history.navigate_to_index(index)
    }

    pub fn back(&self) -> bool {
        self.go(-1)
    }

    pub fn forward(&self) -> bool {
        self.go(1)
    }

    /// Runs deferred tasks and completes every requested history load until
    /// nothing is left to do. Returns the number of loads completed.
    pub fn settle(&self) -> usize {
        let mut completed = 0;

        loop {
            let ran = self.tasks.run_until_idle();
            let loads = self.tree.take_pending_loads();
            if ran == 0 && loads.is_empty() {
                break;
            }

            for (id, load) in loads {
                let Some(name) = self.tree.name(id) else {
                    continue;
                };
                log::info!("{}: {:?} history load of {}", name, load.load_type, load.record.url);
                self.tree.set_current_record(id, load.record.clone());
                self.history.commit(
                    &name,
                    load.record,
                    CommitKind::BackForward,
                    load.load_type == HistoryLoadType::SameDocument,
                );
                completed += 1;
            }
        }

        completed
    }

    /// Text dump of the back/forward list, one position per line.
    pub fn describe(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "history: {} entries, current {} (back {}, forward {})",
            self.history.len(),
            self.history.current_index(),
            self.history.history_back_list_count(),
            self.history.history_forward_list_count()
        );

        let current = self.history.current_index();
        for (index, snapshot) in self.history.snapshots().iter().enumerate() {
            let marker = if index as i64 == current { '>' } else { ' ' };
            let _ = write!(out, "{} [{}]", marker, index);
            for entry in snapshot.entries() {
                let _ = write!(
                    out,
                    " {}={} (#{})",
                    entry.unique_name, entry.record.url, entry.record.item_sequence_number
                );
            }
            out.push('\n');
        }
        out
    }

    fn detach_children(&self, id: FrameId) -> Result<(), FrameTreeError> {
        let children: Vec<FrameId> = self
            .tree
            .preorder()
            .into_iter()
            .filter(|&f| self.tree.parent(f) == Some(id))
            .collect();
        for child in children {
            self.tree.remove(child)?;
        }
        Ok(())
    }
}
