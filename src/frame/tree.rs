use super::handle::{CachePolicy, FrameHandle, FrameHost, HistoryLoadType};
use crate::history::HistoryRecord;
use std::cell::RefCell;
use std::rc::Rc;
use thiserror::Error;

pub type FrameId = usize;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum FrameTreeError {
    #[error("Frame name already in use: {0}")]
    DuplicateName(String),
    #[error("Unknown frame: {0}")]
    UnknownFrame(String),
    #[error("Invalid frame id: {0}")]
    InvalidId(FrameId),
    #[error("Cannot remove the top frame")]
    RemoveTop,
}

/// A history load requested by the controller that the frame has not finished yet.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingLoad {
    pub record: HistoryRecord,
    pub load_type: HistoryLoadType,
    pub cache_policy: CachePolicy,
}

#[derive(Debug)]
struct FrameNode {
    unique_name: String,
    parent: Option<FrameId>,
    children: Vec<FrameId>,
    attached: bool,
    current: Option<HistoryRecord>,
    pending: Vec<PendingLoad>,
}

impl FrameNode {
    fn new(unique_name: String, parent: Option<FrameId>) -> Self {
        Self {
            unique_name,
            parent,
            children: Vec::new(),
            attached: true,
            current: None,
            pending: Vec::new(),
        }
    }
}

#[derive(Debug)]
struct FrameArena {
    nodes: Vec<FrameNode>,
}

impl FrameArena {
    fn node(&self, id: FrameId) -> Option<&FrameNode> {
        self.nodes.get(id).filter(|n| n.attached)
    }

    fn find(&self, name: &str) -> Option<FrameId> {
        self.nodes
            .iter()
            .position(|n| n.attached && n.unique_name == name)
    }

    fn next_in_preorder(&self, id: FrameId) -> Option<FrameId> {
        let node = self.node(id)?;
        if let Some(&first) = node.children.first() {
            return Some(first);
        }

        let mut current = id;
        loop {
            let parent = self.node(current)?.parent?;
            let siblings = &self.node(parent)?.children;
            let position = siblings.iter().position(|&c| c == current)?;
            if let Some(&next) = siblings.get(position + 1) {
                return Some(next);
            }
            current = parent;
        }
    }
}

/// In-memory frame tree: a top frame plus nested child frames, each with a
/// unique name. Cloning yields another handle to the same tree.
///
/// Removed frames stay in the arena (so stale ids never alias a new frame)
/// but are invisible to lookups and traversal.
#[derive(Debug, Clone)]
pub struct FrameTree {
    arena: Rc<RefCell<FrameArena>>,
    root: FrameId,
}

impl FrameTree {
    pub fn new(top_name: &str) -> Self {
        let root = FrameNode::new(top_name.to_string(), None);
        Self {
            arena: Rc::new(RefCell::new(FrameArena { nodes: vec![root] })),
            root: 0,
        }
    }

    pub fn top(&self) -> FrameId {
        self.root
    }

    pub fn append_child(&self, parent: FrameId, unique_name: &str) -> Result<FrameId, FrameTreeError> {
        let mut arena = self.arena.borrow_mut();
        if arena.node(parent).is_none() {
            return Err(FrameTreeError::InvalidId(parent));
        }
        if arena.find(unique_name).is_some() {
            return Err(FrameTreeError::DuplicateName(unique_name.to_string()));
        }

        let id = arena.nodes.len();
        arena
            .nodes
            .push(FrameNode::new(unique_name.to_string(), Some(parent)));
        arena.nodes[parent].children.push(id);
        Ok(id)
    }

    /// Detaches `id` and all of its descendants.
    pub fn remove(&self, id: FrameId) -> Result<(), FrameTreeError> {
        if id == self.root {
            return Err(FrameTreeError::RemoveTop);
        }

        let mut arena = self.arena.borrow_mut();
        let parent = arena
            .node(id)
            .ok_or(FrameTreeError::InvalidId(id))?
            .parent;
        if let Some(parent) = parent {
            arena.nodes[parent].children.retain(|&c| c != id);
        }
        arena.nodes[id].parent = None;

        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let node = &mut arena.nodes[current];
            node.attached = false;
            node.pending.clear();
            stack.extend(node.children.iter().copied());
        }
        Ok(())
    }

    pub fn find(&self, unique_name: &str) -> Option<FrameId> {
        self.arena.borrow().find(unique_name)
    }

    pub fn find_or_err(&self, unique_name: &str) -> Result<FrameId, FrameTreeError> {
        self.find(unique_name)
            .ok_or_else(|| FrameTreeError::UnknownFrame(unique_name.to_string()))
    }

    pub fn name(&self, id: FrameId) -> Option<String> {
        self.arena.borrow().node(id).map(|n| n.unique_name.clone())
    }

    pub fn parent(&self, id: FrameId) -> Option<FrameId> {
        self.arena.borrow().node(id).and_then(|n| n.parent)
    }

    pub fn next_in_preorder(&self, id: FrameId) -> Option<FrameId> {
        self.arena.borrow().next_in_preorder(id)
    }

    /// Attached frames in pre-order, starting at the top frame.
    pub fn preorder(&self) -> Vec<FrameId> {
        let arena = self.arena.borrow();
        let mut order = Vec::new();
        let mut next = Some(self.root);
        while let Some(id) = next {
            order.push(id);
            next = arena.next_in_preorder(id);
        }
        order
    }

    pub fn frame_count(&self) -> usize {
        self.arena.borrow().nodes.iter().filter(|n| n.attached).count()
    }

    pub fn current_record(&self, id: FrameId) -> Option<HistoryRecord> {
        self.arena.borrow().node(id).and_then(|n| n.current.clone())
    }

    pub fn set_current_record(&self, id: FrameId, record: HistoryRecord) {
        let mut arena = self.arena.borrow_mut();
        if let Some(node) = arena.nodes.get_mut(id).filter(|n| n.attached) {
            node.current = Some(record);
        }
    }

    /// Removes and returns every pending history load, in pre-order of the frames.
    pub fn take_pending_loads(&self) -> Vec<(FrameId, PendingLoad)> {
        let order = self.preorder();
        let mut arena = self.arena.borrow_mut();
        let mut loads = Vec::new();
        for id in order {
            for load in arena.nodes[id].pending.drain(..) {
                loads.push((id, load));
            }
        }
        loads
    }

    pub fn has_pending_loads(&self) -> bool {
        self.arena
            .borrow()
            .nodes
            .iter()
            .any(|n| n.attached && !n.pending.is_empty())
    }

    pub fn handle(&self, id: FrameId) -> Option<Rc<dyn FrameHandle>> {
        self.arena.borrow().node(id)?;
        Some(Rc::new(FrameRef {
            arena: Rc::clone(&self.arena),
            id,
        }))
    }
}

impl FrameHost for FrameTree {
    fn lookup_frame_by_unique_name(&self, name: &str) -> Option<Rc<dyn FrameHandle>> {
        self.find(name).and_then(|id| self.handle(id))
    }
}

struct FrameRef {
    arena: Rc<RefCell<FrameArena>>,
    id: FrameId,
}

impl FrameRef {
    fn sibling(&self, id: FrameId) -> Rc<dyn FrameHandle> {
        Rc::new(FrameRef {
            arena: Rc::clone(&self.arena),
            id,
        })
    }
}

impl FrameHandle for FrameRef {
    fn unique_name(&self) -> String {
        self.arena.borrow().nodes[self.id].unique_name.clone()
    }

    fn parent(&self) -> Option<Rc<dyn FrameHandle>> {
        let parent = self.arena.borrow().node(self.id)?.parent?;
        Some(self.sibling(parent))
    }

    fn next_in_preorder(&self) -> Option<Rc<dyn FrameHandle>> {
        let next = self.arena.borrow().next_in_preorder(self.id)?;
        Some(self.sibling(next))
    }

    fn load_history_record(
        &self,
        record: HistoryRecord,
        load_type: HistoryLoadType,
        cache_policy: CachePolicy,
    ) {
        let mut arena = self.arena.borrow_mut();
        match arena.nodes.get_mut(self.id).filter(|n| n.attached) {
            Some(node) => node.pending.push(PendingLoad {
                record,
                load_type,
                cache_policy,
            }),
            None => log::warn!("Dropping history load for detached frame {}", self.id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::handle::live_frame_names;

    fn sample_tree() -> (FrameTree, FrameId, FrameId, FrameId) {
        // top
        // ├── a
        // │   └── a1
        // └── b
        let tree = FrameTree::new("top");
        let a = tree.append_child(tree.top(), "a").unwrap();
        let a1 = tree.append_child(a, "a1").unwrap();
        let b = tree.append_child(tree.top(), "b").unwrap();
        (tree, a, a1, b)
    }

    #[test]
    fn test_preorder_walk() {
        let (tree, a, a1, b) = sample_tree();

        assert_eq!(tree.preorder(), vec![tree.top(), a, a1, b]);
        assert_eq!(tree.next_in_preorder(a1), Some(b));
        assert_eq!(tree.next_in_preorder(b), None);
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let (tree, a, _, _) = sample_tree();

        assert_eq!(
            tree.append_child(a, "b"),
            Err(FrameTreeError::DuplicateName("b".to_string()))
        );
    }

    #[test]
    fn test_remove_detaches_subtree() {
        let (tree, a, a1, b) = sample_tree();

        tree.remove(a).unwrap();
        assert_eq!(tree.preorder(), vec![tree.top(), b]);
        assert_eq!(tree.find("a1"), None);
        assert!(tree.handle(a1).is_none());
        assert_eq!(tree.frame_count(), 2);

        // The name becomes available again once the old frame is gone.
        let again = tree.append_child(tree.top(), "a").unwrap();
        assert_ne!(again, a);
        assert_eq!(tree.remove(tree.top()), Err(FrameTreeError::RemoveTop));
    }

    #[test]
    fn test_live_names_from_any_frame() {
        let (tree, _, a1, _) = sample_tree();

        let names = live_frame_names(tree.handle(a1).unwrap());
        let mut names: Vec<String> = names.into_iter().collect();
        names.sort();
        assert_eq!(names, vec!["a", "a1", "b", "top"]);
    }

    #[test]
    fn test_load_requests_become_pending() {
        let (tree, _, _, b) = sample_tree();
        let record = HistoryRecord::new("https://b.test/");

        let handle = tree.lookup_frame_by_unique_name("b").unwrap();
        handle.load_history_record(
            record.clone(),
            HistoryLoadType::DifferentDocument,
            CachePolicy::ReturnCacheDataElseLoad,
        );

        assert!(tree.has_pending_loads());
        let loads = tree.take_pending_loads();
        assert_eq!(loads.len(), 1);
        assert_eq!(loads[0].0, b);
        assert_eq!(loads[0].1.record, record);
        assert!(!tree.has_pending_loads());
    }
}
