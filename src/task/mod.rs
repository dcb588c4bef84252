//! Deferred task execution on the owning thread.

use std::cell::{Cell, RefCell};
use tokio::sync::mpsc;

pub type Task = Box<dyn FnOnce()>;

/// Runs a task later on the owning event loop.
pub trait Scheduler {
    fn post(&self, task: Task);
}

/// Runs every task inline, as soon as it is posted.
#[derive(Debug, Default, Clone, Copy)]
pub struct ImmediateScheduler;

impl Scheduler for ImmediateScheduler {
    fn post(&self, task: Task) {
        task();
    }
}

/// FIFO queue of deferred tasks, drained explicitly by the owner.
pub struct TaskQueue {
    tx: mpsc::UnboundedSender<Task>,
    rx: RefCell<mpsc::UnboundedReceiver<Task>>,
    queued: Cell<usize>,
}

impl TaskQueue {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            tx,
            rx: RefCell::new(rx),
            queued: Cell::new(0),
        }
    }

    /// Number of tasks posted but not yet run.
    pub fn pending(&self) -> usize {
        self.queued.get()
    }

    /// Runs the oldest queued task. Returns false when the queue was empty.
    pub fn run_one(&self) -> bool {
        // The receiver borrow ends before the task runs so it can post more tasks.
        let task = self.rx.borrow_mut().try_recv();
        match task {
            Ok(task) => {
                self.queued.set(self.queued.get().saturating_sub(1));
                task();
                true
            }
            Err(_) => false,
        }
    }

    /// Runs tasks until the queue is empty, including tasks posted while
    /// draining. Returns how many ran.
    pub fn run_until_idle(&self) -> usize {
        let mut ran = 0;
        while self.run_one() {
            ran += 1;
        }
        ran
    }
}

impl Default for TaskQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler for TaskQueue {
    fn post(&self, task: Task) {
        // The receiver lives as long as the queue, so sending cannot fail.
        if self.tx.send(task).is_ok() {
            self.queued.set(self.queued.get() + 1);
        }
    }
}
