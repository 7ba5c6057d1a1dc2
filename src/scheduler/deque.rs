//! Per-worker task queues for the work-stealing scheduler.

use std::collections::VecDeque;
use std::sync::Mutex;

use crate::barnes_hut::QuadNode;

/// A unit of tree traversal: one quadtree node to process.
#[derive(Clone, Copy)]
pub struct Task<'t> {
    pub node: &'t QuadNode,
}

/// Double-ended task queue owned by one worker.
///
/// The owning worker pushes and pops at the front, keeping recently split
/// subtrees hot; thieves take from the back, which holds the largest
/// still-undivided subtrees and keeps them off the owner's end. Head, tail
/// and size are guarded by a single mutex with short critical sections.
///
/// # Examples
///
/// ```
/// use rs_nbody::barnes_hut::QuadNode;
/// use rs_nbody::scheduler::{Deque, Task};
///
/// let node = QuadNode::new(0.0, 1.0, 0.0, 1.0, None);
/// let deque = Deque::new();
/// deque.push_front(Task { node: &node });
/// assert_eq!(deque.len(), 1);
/// assert!(deque.pop_back().is_some());
/// assert!(deque.pop_front().is_none());
/// ```
#[derive(Default)]
pub struct Deque<'t> {
    tasks: Mutex<VecDeque<Task<'t>>>,
}

impl<'t> Deque<'t> {
    pub fn new() -> Self {
        Deque {
            tasks: Mutex::new(VecDeque::new()),
        }
    }

    /// Pushes onto the owner's end.
    pub fn push_front(&self, task: Task<'t>) {
        self.tasks.lock().expect("deque lock poisoned").push_front(task);
    }

    /// Pushes onto the steal end.
    pub fn push_back(&self, task: Task<'t>) {
        self.tasks.lock().expect("deque lock poisoned").push_back(task);
    }

    /// Pops from the owner's end (LIFO).
    pub fn pop_front(&self) -> Option<Task<'t>> {
        self.tasks.lock().expect("deque lock poisoned").pop_front()
    }

    /// Pops from the steal end (FIFO relative to the owner).
    pub fn pop_back(&self) -> Option<Task<'t>> {
        self.tasks.lock().expect("deque lock poisoned").pop_back()
    }

    pub fn len(&self) -> usize {
        self.tasks.lock().expect("deque lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
