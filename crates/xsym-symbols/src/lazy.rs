//! Lock-free, compute-once fields shared between threads.
//!
//! Several threads may race to fill the same field. Each computes a
//! candidate; exactly one candidate is published and every reader, losers
//! included, observes that one value from then on.

use once_cell::race::OnceBox;
use std::fmt;

/// Observable state of a [`LazyField`].
#[derive(Debug, PartialEq)]
pub enum FieldState<'a, T> {
    /// Nothing published yet.
    Unknown,
    /// A value was published; it never changes afterwards.
    Computed(&'a T),
}

/// A field computed on first access and immutable afterwards.
pub struct LazyField<T> {
    cell: OnceBox<T>,
}

impl<T> LazyField<T> {
    pub const fn new() -> Self {
        Self {
            cell: OnceBox::new(),
        }
    }

    /// Returns the published value, computing and publishing one if absent.
    ///
    /// `init` may run on several threads at once; only the first publish
    /// wins and the other candidates are dropped.
    pub fn get_or_init(&self, init: impl FnOnce() -> T) -> &T {
        self.cell.get_or_init(|| Box::new(init()))
    }

    /// Publishes `value` if the field is still unknown.
    ///
    /// Returns the value that ended up published, which is `value` only if
    /// this call won.
    pub fn publish(&self, value: T) -> &T {
        let _ = self.cell.set(Box::new(value));
        // The cell is set now, by us or by a racing writer.
        self.cell.get_or_init(|| unreachable!("published value vanished"))
    }

    pub fn get(&self) -> Option<&T> {
        self.cell.get()
    }

    pub fn state(&self) -> FieldState<'_, T> {
        match self.cell.get() {
            Some(value) => FieldState::Computed(value),
            None => FieldState::Unknown,
        }
    }
}

impl<T> Default for LazyField<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: fmt::Debug> fmt::Debug for LazyField<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.cell.get() {
            Some(value) => f.debug_tuple("LazyField").field(value).finish(),
            None => f.write_str("LazyField(<unknown>)"),
        }
    }
}

#[cfg(test)]
#[path = "../tests/lazy_tests.rs"]
mod tests;
