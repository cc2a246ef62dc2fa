use std::collections::VecDeque;
use std::num::NonZero;
use std::time::Duration;

use parking_lot::{Condvar, Mutex};

/// A blocking first-in-first-out queue with a fixed capacity, for use as the shared state of
/// producer/consumer benchmarks in tests and examples.
///
/// Producers block while the queue is full and consumers block while it is empty. Closing the
/// queue releases every blocked thread: pushes are then rejected and pops drain whatever is
/// left before reporting that nothing more will arrive.
///
/// # Example
///
/// ```rust
/// use std::num::NonZero;
///
/// use testing::BoundedQueue;
///
/// let queue = BoundedQueue::new(NonZero::new(2).unwrap());
///
/// queue.push(1).unwrap();
/// queue.push(2).unwrap();
/// queue.close();
///
/// assert_eq!(queue.pop(), Some(1));
/// assert_eq!(queue.pop(), Some(2));
/// assert_eq!(queue.pop(), None);
/// ```
#[derive(Debug)]
pub struct BoundedQueue<T> {
    state: Mutex<QueueState<T>>,
    capacity: NonZero<usize>,

    not_empty: Condvar,
    not_full: Condvar,
}

#[derive(Debug)]
struct QueueState<T> {
    items: VecDeque<T>,
    closed: bool,
}

impl<T> BoundedQueue<T> {
    /// Creates an open, empty queue that holds at most `capacity` items.
    #[must_use]
    pub fn new(capacity: NonZero<usize>) -> Self {
        Self {
            state: Mutex::new(QueueState {
                items: VecDeque::with_capacity(capacity.get()),
                closed: false,
            }),
            capacity,
            not_empty: Condvar::new(),
            not_full: Condvar::new(),
        }
    }

    /// The maximum number of items the queue holds at once.
    #[must_use]
    pub fn capacity(&self) -> NonZero<usize> {
        self.capacity
    }

    /// The number of items currently in the queue.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.lock().items.len()
    }

    /// Whether the queue currently holds no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.state.lock().items.is_empty()
    }

    /// Appends an item, waiting for space if the queue is full.
    ///
    /// # Errors
    ///
    /// Returns the item back if the queue is closed, either before the call or while waiting.
    pub fn push(&self, item: T) -> Result<(), T> {
        let mut state = self.state.lock();

        while !state.closed && state.items.len() >= self.capacity.get() {
            self.not_full.wait(&mut state);
        }

        if state.closed {
            return Err(item);
        }

        state.items.push_back(item);
        drop(state);

        self.not_empty.notify_one();
        Ok(())
    }

    /// Removes the oldest item, waiting for one if the queue is empty.
    ///
    /// Returns `None` once the queue is closed and drained.
    pub fn pop(&self) -> Option<T> {
        let mut state = self.state.lock();

        loop {
            if let Some(item) = state.items.pop_front() {
                drop(state);
                self.not_full.notify_one();
                return Some(item);
            }

            if state.closed {
                return None;
            }

            self.not_empty.wait(&mut state);
        }
    }

    /// Removes the oldest item, waiting at most `timeout` for one to arrive.
    ///
    /// Returns `None` if the timeout elapsed or the queue is closed and drained.
    pub fn pop_timeout(&self, timeout: Duration) -> Option<T> {
        let mut state = self.state.lock();

        loop {
            if let Some(item) = state.items.pop_front() {
                drop(state);
                self.not_full.notify_one();
                return Some(item);
            }

            if state.closed || self.not_empty.wait_for(&mut state, timeout).timed_out() {
                return None;
            }
        }
    }

    /// Closes the queue, waking up every thread blocked on it.
    ///
    /// Items already in the queue can still be popped.
    pub fn close(&self) {
        self.state.lock().closed = true;

        self.not_empty.notify_all();
        self.not_full.notify_all();
    }

    /// Whether [`close()`](Self::close) has been called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use super::*;
    use crate::with_watchdog;

    fn queue<T>(capacity: usize) -> BoundedQueue<T> {
        BoundedQueue::new(NonZero::new(capacity).unwrap())
    }

    #[test]
    fn items_come_out_in_order() {
        let queue = queue(4);

        for i in 0..4 {
            queue.push(i).unwrap();
        }

        assert_eq!(queue.len(), 4);

        for i in 0..4 {
            assert_eq!(queue.pop(), Some(i));
        }

        assert!(queue.is_empty());
    }

    #[test]
    fn push_after_close_is_rejected() {
        let queue = queue(1);
        queue.close();

        assert!(queue.is_closed());
        assert_eq!(queue.push(5), Err(5));
    }

    #[test]
    fn pop_timeout_gives_up() {
        let queue = queue::<u8>(1);

        assert_eq!(queue.pop_timeout(Duration::from_millis(1)), None);
    }

    #[test]
    fn full_queue_blocks_producer_until_consumed() {
        with_watchdog(|| {
            let queue = Arc::new(queue(1));
            queue.push(0).unwrap();

            let producer = thread::spawn({
                let queue = Arc::clone(&queue);
                move || queue.push(1)
            });

            assert_eq!(queue.pop(), Some(0));
            assert_eq!(producer.join().unwrap(), Ok(()));
            assert_eq!(queue.pop(), Some(1));
        });
    }

    #[test]
    fn close_releases_blocked_consumer() {
        with_watchdog(|| {
            let queue = Arc::new(queue::<u32>(1));

            let consumer = thread::spawn({
                let queue = Arc::clone(&queue);
                move || queue.pop()
            });

            queue.close();
            assert_eq!(consumer.join().unwrap(), None);
        });
    }
}
