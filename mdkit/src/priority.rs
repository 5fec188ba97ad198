use std::cmp::Reverse;

/// Default priority for rules and listeners. Higher priorities run first.
pub const DEFAULT_PRIORITY: i32 = 0;

/// A registered value with its priority and registration sequence number.
pub(crate) struct Prioritized<T> {
  pub(crate) value:    T,
  pub(crate) priority: i32,
  pub(crate) sequence: u64,
}

impl<T> Prioritized<T> {
  /// Sort key: descending priority, then registration order.
  pub(crate) const fn key(&self) -> (Reverse<i32>, u64) {
    (Reverse(self.priority), self.sequence)
  }
}

/// Put entries in dispatch order.
pub(crate) fn sort_by_priority<T>(entries: &mut [Prioritized<T>]) {
  entries.sort_by_key(Prioritized::key);
}
