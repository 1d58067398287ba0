#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Bounded FIFO of unit movement commands with all-or-nothing enqueue.

use std::collections::VecDeque;

use codewalk_core::{CapacityError, Direction, EnqueueError, MoveCommands, StepCount};

/// Ordered list of pending unit movement commands.
#[derive(Clone, Debug)]
pub struct CommandQueue {
    actions: VecDeque<Direction>,
    capacity: usize,
}

impl CommandQueue {
    /// Creates an empty queue that holds at most `capacity` commands.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            actions: VecDeque::new(),
            capacity,
        }
    }

    /// Maximum number of commands the queue accepts.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of queued commands.
    #[must_use]
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// Reports whether the queue is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Removes the oldest command.
    pub fn pop(&mut self) -> Option<Direction> {
        self.actions.pop_front()
    }

    /// Discards every queued command.
    pub fn clear(&mut self) {
        self.actions.clear();
    }

    /// Iterates over queued commands, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = Direction> + '_ {
        self.actions.iter().copied()
    }

    fn check_room(&self, requested: u64) -> Result<usize, CapacityError> {
        let queued = self.actions.len();
        let rejected = CapacityError {
            queued,
            requested,
            capacity: self.capacity,
        };
        let requested = usize::try_from(requested).map_err(|_| rejected)?;
        match queued.checked_add(requested) {
            Some(total) if total <= self.capacity => Ok(requested),
            _ => Err(rejected),
        }
    }
}

impl MoveCommands for CommandQueue {
    fn enqueue(&mut self, direction: Direction, n: i64) -> Result<(), EnqueueError> {
        let requested = StepCount::validate(n)?;
        let count = self.check_room(requested)?;
        self.actions.extend(std::iter::repeat(direction).take(count));
        Ok(())
    }
}
