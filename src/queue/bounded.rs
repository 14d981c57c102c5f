//! Fixed-capacity FIFO ring buffer.

use crate::core::{Result, ThreadError};

/// A fixed-capacity FIFO ring buffer.
///
/// Storage is allocated once, up front, and never grows. `push` hands the
/// item back when the buffer is full so the caller decides whether to wait,
/// drop or retry.
///
/// # Example
///
/// ```rust
/// use dynamic_thread_pool::queue::BoundedQueue;
///
/// let mut queue = BoundedQueue::try_with_capacity(2).unwrap();
/// queue.push(1).unwrap();
/// queue.push(2).unwrap();
/// assert_eq!(queue.push(3), Err(3));
///
/// assert_eq!(queue.pop(), Some(1));
/// assert_eq!(queue.pop(), Some(2));
/// assert_eq!(queue.pop(), None);
/// ```
pub struct BoundedQueue<T> {
    slots: Box<[Option<T>]>,
    front: usize,
    rear: usize,
    len: usize,
}

impl<T> BoundedQueue<T> {
    /// Allocates a queue holding at most `capacity` items.
    ///
    /// # Errors
    ///
    /// Returns `ThreadError::InvalidConfig` if `capacity` is 0 or the slot
    /// buffer cannot be allocated.
    pub fn try_with_capacity(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(ThreadError::invalid_config(
                "queue_capacity",
                "Queue capacity must be greater than 0",
            ));
        }

        let mut slots = Vec::new();
        slots.try_reserve_exact(capacity).map_err(|e| {
            ThreadError::invalid_config(
                "queue_capacity",
                format!("Cannot allocate {} queue slots: {}", capacity, e),
            )
        })?;
        slots.resize_with(capacity, || None);

        Ok(Self {
            slots: slots.into_boxed_slice(),
            front: 0,
            rear: 0,
            len: 0,
        })
    }

    /// Appends an item at the rear, or returns it if the queue is full.
    pub fn push(&mut self, item: T) -> std::result::Result<(), T> {
        if self.is_full() {
            return Err(item);
        }
        self.slots[self.rear] = Some(item);
        self.rear = (self.rear + 1) % self.capacity();
        self.len += 1;
        Ok(())
    }

    /// Removes the item at the front.
    pub fn pop(&mut self) -> Option<T> {
        if self.len == 0 {
            return None;
        }
        let item = self.slots[self.front].take();
        self.front = (self.front + 1) % self.capacity();
        self.len -= 1;
        item
    }

    /// Removes every queued item, front first.
    pub fn drain(&mut self) -> Vec<T> {
        let mut items = Vec::with_capacity(self.len);
        while let Some(item) = self.pop() {
            items.push(item);
        }
        items
    }

    /// Number of queued items.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Whether no further item can be pushed.
    pub fn is_full(&self) -> bool {
        self.len == self.capacity()
    }

    /// Maximum number of queued items.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }
}

impl<T> std::fmt::Debug for BoundedQueue<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoundedQueue")
            .field("len", &self.len)
            .field("capacity", &self.capacity())
            .field("front", &self.front)
            .field("rear", &self.rear)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capacity() {
        let queue: BoundedQueue<u32> = BoundedQueue::try_with_capacity(5).unwrap();
        assert_eq!(queue.capacity(), 5);
        assert!(queue.is_empty());
        assert!(!queue.is_full());
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let result = BoundedQueue::<u32>::try_with_capacity(0);
        assert!(matches!(result, Err(ThreadError::InvalidConfig { .. })));
    }

    #[test]
    fn test_push_full_returns_item() {
        let mut queue = BoundedQueue::try_with_capacity(2).unwrap();
        queue.push("a").unwrap();
        queue.push("b").unwrap();
        assert!(queue.is_full());
        assert_eq!(queue.push("c"), Err("c"));
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn test_fifo_across_wraparound() {
        let mut queue = BoundedQueue::try_with_capacity(3).unwrap();
        let mut expected = 0;

        // Interleave pushes and pops so front/rear wrap several times
        for round in 0..10 {
            queue.push(round * 2).unwrap();
            queue.push(round * 2 + 1).unwrap();
            assert_eq!(queue.pop(), Some(expected));
            expected += 1;
            assert_eq!(queue.pop(), Some(expected));
            expected += 1;
        }
        assert!(queue.is_empty());
        assert_eq!(queue.pop(), None);
    }

    #[test]
    fn test_drain_releases_slots() {
        let shared = std::sync::Arc::new(());
        let mut queue = BoundedQueue::try_with_capacity(4).unwrap();
        queue.push(std::sync::Arc::clone(&shared)).unwrap();
        queue.push(std::sync::Arc::clone(&shared)).unwrap();
        queue.pop();
        queue.push(std::sync::Arc::clone(&shared)).unwrap();
        assert_eq!(std::sync::Arc::strong_count(&shared), 3);

        let drained = queue.drain();
        assert_eq!(drained.len(), 2);
        assert!(queue.is_empty());

        drop(drained);
        assert_eq!(std::sync::Arc::strong_count(&shared), 1);
    }
}
