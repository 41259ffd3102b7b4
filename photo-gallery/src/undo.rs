use std::collections::VecDeque;

/// Bounded LIFO of reversible actions. Pushing onto a full stack drops the
/// oldest record.
#[derive(Debug, Clone)]
pub struct UndoStack<T> {
    records: VecDeque<T>,
    depth: usize,
}

impl<T> UndoStack<T> {
    pub fn new(depth: usize) -> Self {
        let depth = depth.max(1);
        Self {
            records: VecDeque::with_capacity(depth),
            depth,
        }
    }

    pub fn push(&mut self, record: T) {
        if self.records.len() == self.depth {
            self.records.pop_front();
        }
        self.records.push_back(record);
    }

    pub fn pop(&mut self) -> Option<T> {
        self.records.pop_back()
    }

    pub fn peek(&self) -> Option<&T> {
        self.records.back()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn depth(&self) -> usize {
        self.depth
    }
}
