//! A FIFO queue with constant-time operations at both ends.
//!
//! The room index counts its nodes breadth-first through this queue. Links are stored in
//! the same kind of handle arena as the tree nodes, so dequeued slots are recycled by the
//! next enqueue instead of returning to the allocator.

use crate::error::{Error, Result};
use crate::raw::{Arena, Handle};

struct Link<T> {
    value: T,
    prev: Option<Handle>,
    next: Option<Handle>,
}

/// A doubly linked first-in, first-out queue.
///
/// # Examples
///
/// ```
/// use hilbert_hotel::queue::OrderedQueue;
///
/// let mut queue = OrderedQueue::new();
/// queue.enqueue("bus 1");
/// queue.enqueue("bus 2");
/// assert_eq!(queue.dequeue(), Some("bus 1"));
/// assert_eq!(queue.len(), 1);
/// ```
pub struct OrderedQueue<T> {
    links: Arena<Link<T>>,
    head: Option<Handle>,
    tail: Option<Handle>,
}

impl<T> OrderedQueue<T> {
    /// Creates an empty queue.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            links: Arena::new(),
            head: None,
            tail: None,
        }
    }

    /// Number of queued elements.
    ///
    /// # Complexity
    ///
    /// O(1)
    #[must_use]
    pub const fn len(&self) -> usize {
        self.links.len()
    }

    /// # Complexity
    ///
    /// O(1)
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// Appends `value` behind every queued element.
    ///
    /// # Complexity
    ///
    /// O(1) amortized.
    pub fn enqueue(&mut self, value: T) {
        let handle = self.links.alloc(Link {
            value,
            prev: self.tail,
            next: None,
        });
        match self.tail {
            Some(tail) => self.links.get_mut(tail).next = Some(handle),
            None => self.head = Some(handle),
        }
        self.tail = Some(handle);
    }

    /// Removes and returns the oldest element, or `None` when empty.
    ///
    /// # Complexity
    ///
    /// O(1)
    pub fn dequeue(&mut self) -> Option<T> {
        let head = self.head?;
        let Link { value, next, .. } = self.links.take(head);
        match next {
            Some(next) => self.links.get_mut(next).prev = None,
            None => self.tail = None,
        }
        self.head = next;
        Some(value)
    }

    /// Like [`dequeue`](Self::dequeue), but reports an empty queue as an error.
    ///
    /// # Errors
    ///
    /// [`Error::EmptyQueue`] if nothing is queued.
    pub fn try_dequeue(&mut self) -> Result<T> {
        self.dequeue().ok_or(Error::EmptyQueue)
    }

    /// The oldest element, without removing it.
    #[must_use]
    pub fn front(&self) -> Option<&T> {
        self.head.map(|head| &self.links.get(head).value)
    }

    /// The newest element, without removing it.
    #[must_use]
    pub fn back(&self) -> Option<&T> {
        self.tail.map(|tail| &self.links.get(tail).value)
    }

    /// Removes and returns the newest element.
    ///
    /// # Complexity
    ///
    /// O(1)
    pub fn pop_back(&mut self) -> Option<T> {
        let tail = self.tail?;
        let Link { value, prev, .. } = self.links.take(tail);
        match prev {
            Some(prev) => self.links.get_mut(prev).next = None,
            None => self.head = None,
        }
        self.tail = prev;
        Some(value)
    }

    /// Drops every queued element.
    pub fn clear(&mut self) {
        self.links.clear();
        self.head = None;
        self.tail = None;
    }
}

impl<T> Default for OrderedQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Extend<T> for OrderedQueue<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for value in iter {
            self.enqueue(value);
        }
    }
}

impl<T> FromIterator<T> for OrderedQueue<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut queue = Self::new();
        queue.extend(iter);
        queue
    }
}
