//! Blocking FIFO queue used for each direction of the bridge
//!
//! `BlockingQueue` is an unbounded, thread-safe FIFO with a blocking
//! "wait until non-empty" primitive. All state lives behind one mutex and the
//! condition variable is tied to that same mutex, so a wake-up can never be
//! lost between the emptiness check and the park.
//!
//! # Consumer contract
//!
//! `wait_for_not_empty` followed by `pop` is two critical sections, not one.
//! With two consumers on one queue, the other consumer may drain the item in
//! between and the `pop` will fail with [`Error::EmptyQueue`]. The pair is only
//! safe with a single consumer per queue. [`BlockingQueue::split`] enforces
//! that with a move-only [`QueueConsumer`]; callers that really need several
//! consumers should use [`BlockingQueue::take`], which waits and removes under
//! one lock.

use crate::{Error, Result};
use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};

struct QueueState<T> {
    items: VecDeque<T>,
    closed: bool,
}

/// Unbounded blocking FIFO queue
pub struct BlockingQueue<T> {
    state: Mutex<QueueState<T>>,
    not_empty: Condvar,
}

impl<T> BlockingQueue<T> {
    /// Create an empty queue
    pub fn new() -> Self {
        Self {
            state: Mutex::new(QueueState {
                items: VecDeque::new(),
                closed: false,
            }),
            not_empty: Condvar::new(),
        }
    }

    /// Append an item to the tail and wake one waiter.
    ///
    /// Never blocks and never fails; capacity is unbounded. Pushing to a
    /// closed queue still enqueues the item.
    pub fn push(&self, item: T) {
        {
            let mut state = self.state.lock();
            state.items.push_back(item);
        }
        self.not_empty.notify_one();
    }

    /// Block until the queue holds at least one item.
    ///
    /// Returns `true` when an item is available and `false` when the queue was
    /// closed while empty.
    pub fn wait_for_not_empty(&self) -> bool {
        let mut state = self.state.lock();
        while state.items.is_empty() && !state.closed {
            self.not_empty.wait(&mut state);
        }
        !state.items.is_empty()
    }

    /// Like [`wait_for_not_empty`](Self::wait_for_not_empty) but gives up
    /// after `timeout`. Returns whether the queue is non-empty.
    pub fn wait_for_not_empty_timeout(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut state = self.state.lock();
        while state.items.is_empty() && !state.closed {
            if self.not_empty.wait_until(&mut state, deadline).timed_out() {
                break;
            }
        }
        !state.items.is_empty()
    }

    /// Remove and return the head item.
    ///
    /// The caller must have just observed that the queue is non-empty. An
    /// empty queue yields [`Error::EmptyQueue`], which always indicates a
    /// broken single-consumer contract.
    pub fn pop(&self) -> Result<T> {
        self.state.lock().items.pop_front().ok_or(Error::EmptyQueue)
    }

    /// Remove the head item if there is one
    pub fn try_pop(&self) -> Option<T> {
        self.state.lock().items.pop_front()
    }

    /// Wait for an item and remove it in one critical section.
    ///
    /// Safe with any number of consumers. Returns `None` once the queue is
    /// closed and drained.
    pub fn take(&self) -> Option<T> {
        let mut state = self.state.lock();
        loop {
            if let Some(item) = state.items.pop_front() {
                return Some(item);
            }
            if state.closed {
                return None;
            }
            self.not_empty.wait(&mut state);
        }
    }

    /// Close the queue and wake every waiter
    pub fn close(&self) {
        self.state.lock().closed = true;
        self.not_empty.notify_all();
    }

    /// Whether [`close`](Self::close) has been called
    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    /// Number of queued items
    pub fn len(&self) -> usize {
        self.state.lock().items.len()
    }

    /// Whether the queue is currently empty
    pub fn is_empty(&self) -> bool {
        self.state.lock().items.is_empty()
    }

    /// Split the queue into a cloneable producer and the one consumer
    pub fn split(self) -> (QueueProducer<T>, QueueConsumer<T>) {
        let queue = Arc::new(self);
        (
            QueueProducer {
                queue: Arc::clone(&queue),
            },
            QueueConsumer { queue },
        )
    }
}

impl<T> Default for BlockingQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Create a queue and split it into producer and consumer halves
pub fn channel<T>() -> (QueueProducer<T>, QueueConsumer<T>) {
    BlockingQueue::new().split()
}

/// Producing half of a split queue. Cheap to clone.
pub struct QueueProducer<T> {
    queue: Arc<BlockingQueue<T>>,
}

impl<T> Clone for QueueProducer<T> {
    fn clone(&self) -> Self {
        Self {
            queue: Arc::clone(&self.queue),
        }
    }
}

impl<T> QueueProducer<T> {
    /// Append an item; never blocks
    pub fn push(&self, item: T) {
        self.queue.push(item);
    }

    /// Close the underlying queue and wake the consumer
    pub fn close(&self) {
        self.queue.close();
    }

    pub fn is_closed(&self) -> bool {
        self.queue.is_closed()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

/// Consuming half of a split queue.
///
/// Not `Clone`: there is exactly one consumer per queue, so the
/// `wait_for_not_empty` / `pop` pair below cannot race.
pub struct QueueConsumer<T> {
    queue: Arc<BlockingQueue<T>>,
}

impl<T> QueueConsumer<T> {
    /// Block until an item is available; `false` if closed while empty
    pub fn wait_for_not_empty(&self) -> bool {
        self.queue.wait_for_not_empty()
    }

    pub fn wait_for_not_empty_timeout(&self, timeout: Duration) -> bool {
        self.queue.wait_for_not_empty_timeout(timeout)
    }

    /// Remove the head item
    pub fn pop(&self) -> Result<T> {
        self.queue.pop()
    }

    /// Wait for the next item; `None` once the queue is closed and drained
    pub fn recv(&self) -> Option<T> {
        if self.queue.wait_for_not_empty() {
            self.queue.try_pop()
        } else {
            None
        }
    }

    pub fn try_recv(&self) -> Option<T> {
        self.queue.try_pop()
    }

    /// Close the underlying queue and wake any waiter
    pub fn close(&self) {
        self.queue.close();
    }

    pub fn is_closed(&self) -> bool {
        self.queue.is_closed()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}
