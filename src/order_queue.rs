//! Bounded FIFO of pending orders shared by customers and baristas.

use std::collections::VecDeque;
use std::sync::{Condvar, Mutex};

use crate::types::Order;

/// A fixed-capacity, synchronized FIFO with a one-way shutdown flag.
///
/// The orders, their count and the shutdown flag live under one mutex so
/// that "empty and shut down" is always observed as a single snapshot.
pub struct OrderQueue {
    inner: Mutex<OrderQueueState>,
    not_full: Condvar,
    not_empty: Condvar,
    capacity: usize,
}

struct OrderQueueState {
    orders: VecDeque<Order>,
    shut_down: bool,
    peak_len: usize,
}

impl OrderQueue {
    /// Create an empty queue holding at most `capacity` orders.
    pub fn new(capacity: usize) -> Self {
        debug_assert!(capacity > 0, "capacity must be > 0");
        Self {
            inner: Mutex::new(OrderQueueState {
                orders: VecDeque::with_capacity(capacity),
                shut_down: false,
                peak_len: 0,
            }),
            not_full: Condvar::new(),
            not_empty: Condvar::new(),
            capacity,
        }
    }

    /// Block until there is room, then append the order.
    ///
    /// Returns the order back if the queue was shut down.
    #[cfg(test)]
    pub fn push(&self, order: Order) -> Result<(), Order> {
        self.push_with(order, |_| {})
    }

    /// Block until there is room, then append the order, running `on_queued`
    /// inside the same critical section as the insertion.
    ///
    /// Returns the order back if the queue was shut down.
    pub fn push_with<F>(&self, order: Order, on_queued: F) -> Result<(), Order>
    where
        F: FnOnce(&Order),
    {
        let mut guard = self.inner.lock().expect("order queue mutex poisoned");
        loop {
            if guard.shut_down {
                return Err(order);
            }
            if guard.orders.len() < self.capacity {
                break;
            }
            // Wait releases the lock and re-acquires it before returning.
            guard = self.not_full.wait(guard).expect("condvar wait failed");
        }
        on_queued(&order);
        guard.orders.push_back(order);
        guard.peak_len = guard.peak_len.max(guard.orders.len());
        self.not_empty.notify_one();
        Ok(())
    }

    /// Block until an order is available or the queue is shut down and empty.
    ///
    /// Orders still queued at shutdown are handed out before `None` is returned.
    pub fn pop_or_shutdown(&self) -> Option<Order> {
        let mut guard = self.inner.lock().expect("order queue mutex poisoned");
        loop {
            if let Some(order) = guard.orders.pop_front() {
                self.not_full.notify_one();
                return Some(order);
            }
            if guard.shut_down {
                return None;
            }
            guard = self.not_empty.wait(guard).expect("condvar wait failed");
        }
    }

    /// Try to pop immediately without blocking.
    pub fn try_pop(&self) -> Option<Order> {
        let mut guard = self.inner.lock().expect("order queue mutex poisoned");
        let order = guard.orders.pop_front();
        if order.is_some() {
            self.not_full.notify_one();
        }
        order
    }

    /// Signal that no more orders will arrive and wake every waiter.
    ///
    /// Returns `false` if the queue was already shut down.
    pub fn shutdown(&self) -> bool {
        let mut guard = self.inner.lock().expect("order queue mutex poisoned");
        if guard.shut_down {
            return false;
        }
        guard.shut_down = true;
        self.not_empty.notify_all();
        self.not_full.notify_all();
        true
    }

    #[cfg(test)]
    pub fn is_shut_down(&self) -> bool {
        self.inner.lock().expect("order queue mutex poisoned").shut_down
    }

    /// Current number of queued orders.
    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.inner.lock().expect("order queue mutex poisoned").orders.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Highest queue length observed since creation.
    pub fn peak_len(&self) -> usize {
        self.inner.lock().expect("order queue mutex poisoned").peak_len
    }
}
