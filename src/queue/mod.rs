//! Task queue storage.
//!
//! [`BoundedQueue`] is the ring buffer that holds pending jobs. It is not
//! synchronized on its own: the pool keeps it behind its state mutex and
//! pairs it with the `not_full` / `not_empty` condition variables to provide
//! blocking enqueue and dequeue.

mod bounded;

pub use bounded::BoundedQueue;
