use std::collections::HashMap;
use std::hash::Hash;

/// An opaque id handed out by a [`HandleStore`].
pub trait Handle: Copy + Eq + Hash + std::fmt::Debug {
    fn from_raw(raw: u64) -> Self;
    fn raw(self) -> u64;
}

macro_rules! define_handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(u64);

        impl $crate::handle::Handle for $name {
            fn from_raw(raw: u64) -> Self {
                Self(raw)
            }

            fn raw(self) -> u64 {
                self.0
            }
        }
    };
}

pub(crate) use define_handle;

/// Type-safe handle store mapping opaque handles to values.
///
/// Handles are never reused within one store, so a stale handle held after
/// removal simply misses instead of aliasing a newer item.
pub struct HandleStore<H: Handle, T> {
    items: HashMap<H, T>,
    next: u64,
}

impl<H: Handle, T> HandleStore<H, T> {
    pub fn new() -> Self {
        Self {
            items: HashMap::new(),
            next: 1,
        }
    }

    /// Insert an item and return its handle.
    pub fn insert(&mut self, item: T) -> H {
        let handle = H::from_raw(self.next);
        self.next += 1;
        self.items.insert(handle, item);
        handle
    }

    pub fn get(&self, handle: H) -> Option<&T> {
        self.items.get(&handle)
    }

    pub fn get_mut(&mut self, handle: H) -> Option<&mut T> {
        self.items.get_mut(&handle)
    }

    /// Remove and return the item.
    pub fn remove(&mut self, handle: H) -> Option<T> {
        self.items.remove(&handle)
    }

    pub fn contains(&self, handle: H) -> bool {
        self.items.contains_key(&handle)
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (H, &mut T)> {
        self.items.iter_mut().map(|(h, t)| (*h, t))
    }

    /// Handles in allocation order. Used where iteration must be stable.
    pub fn sorted_handles(&self) -> Vec<H> {
        let mut handles: Vec<H> = self.items.keys().copied().collect();
        handles.sort_by_key(|h| h.raw());
        handles
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<H: Handle, T> Default for HandleStore<H, T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    define_handle!(TestHandle);

    #[test]
    fn test_insert_returns_distinct_handles() {
        let mut store: HandleStore<TestHandle, &str> = HandleStore::new();
        let a = store.insert("a");
        let b = store.insert("b");
        assert_ne!(a, b);
        assert_eq!(store.get(a), Some(&"a"));
        assert_eq!(store.get(b), Some(&"b"));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_removed_handle_is_not_reused() {
        let mut store: HandleStore<TestHandle, u32> = HandleStore::new();
        let a = store.insert(1);
        assert_eq!(store.remove(a), Some(1));
        let b = store.insert(2);
        assert_ne!(a, b);
        assert!(store.get(a).is_none());
    }

    #[test]
    fn test_sorted_handles_follow_allocation_order() {
        let mut store: HandleStore<TestHandle, u32> = HandleStore::new();
        let handles: Vec<_> = (0..10).map(|i| store.insert(i)).collect();
        assert_eq!(store.sorted_handles(), handles);
    }
}
