use std::fmt;
use std::marker::PhantomData;
use std::mem;
use std::ptr::{self, NonNull};

/// A node in the doubly linked list.
///
/// Contains a value and pointers to the previous and next entries.
/// This structure is not meant to be used directly by users of the `List`.
pub(crate) struct Entry<T> {
    /// The value stored in this entry. Uses MaybeUninit to allow for sigil nodes.
    val: mem::MaybeUninit<T>,
    /// Pointer to the previous entry in the list.
    prev: *mut Entry<T>,
    /// Pointer to the next entry in the list.
    next: *mut Entry<T>,
}

impl<T> Entry<T> {
    fn new(val: T) -> Self {
        Entry {
            val: mem::MaybeUninit::new(val),
            prev: ptr::null_mut(),
            next: ptr::null_mut(),
        }
    }

    /// Creates a new sigil (sentinel) entry without initializing the value.
    ///
    /// Sigil entries are used as head and tail markers in the list.
    fn new_sigil() -> Self {
        Entry {
            val: mem::MaybeUninit::uninit(),
            prev: ptr::null_mut(),
            next: ptr::null_mut(),
        }
    }

    /// Returns a reference to the value held by this entry.
    ///
    /// # Safety
    ///
    /// The value must be initialized, i.e. this must not be a sigil node.
    pub(crate) unsafe fn get_value(&self) -> &T {
        // SAFETY: caller guarantees this is not a sigil node
        unsafe { self.val.assume_init_ref() }
    }

    /// Moves the value out of a detached entry, freeing the node.
    ///
    /// # Safety
    ///
    /// The value must be initialized, i.e. this must not be a sigil node.
    unsafe fn into_value(self: Box<Self>) -> T {
        // SAFETY: caller guarantees this is not a sigil node
        unsafe { self.val.assume_init() }
    }
}

/// An unbounded doubly linked list ordered by recency.
///
/// The front (just after the head sentinel) holds the most recently used
/// value and the back (just before the tail sentinel) the least recently
/// used one. Nodes are heap allocated and never move, so the owning cache
/// can keep raw pointers to them in its key map.
pub(crate) struct List<T> {
    len: usize,
    head: *mut Entry<T>,
    tail: *mut Entry<T>,
}

impl<T> List<T> {
    /// Creates an empty list with linked sentinels.
    pub(crate) fn new() -> List<T> {
        let head = Box::into_raw(Box::new(Entry::new_sigil()));
        let tail = Box::into_raw(Box::new(Entry::new_sigil()));

        let list = List { len: 0, head, tail };

        unsafe {
            // SAFETY: head and tail are newly allocated and valid pointers
            (*list.head).next = list.tail;
            (*list.tail).prev = list.head;
        }

        list
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Removes the first (most recently used) item from the list.
    pub(crate) fn remove_first(&mut self) -> Option<T> {
        if self.is_empty() {
            return None;
        }
        // SAFETY: head is valid and the list is not empty
        let next = unsafe { (*self.head).next };
        if next == self.tail {
            return None;
        }
        unsafe {
            // SAFETY: next is a non-sigil node of this list
            self.detach(next);
        }
        self.len -= 1;
        // SAFETY: next was allocated by `add` and is no longer linked
        unsafe { Some(Box::from_raw(next).into_value()) }
    }

    /// Unlinks `node` from the list and returns its value.
    ///
    /// # Safety
    ///
    /// `node` must be a pointer returned by [`List::add`] on this list that
    /// has not been removed yet.
    pub(crate) unsafe fn remove(&mut self, node: *mut Entry<T>) -> Option<T> {
        if self.is_empty() || node.is_null() || node == self.head || node == self.tail {
            return None;
        }

        unsafe {
            // SAFETY: caller guarantees node is valid and part of this list
            self.detach(node);
            self.len -= 1;
            Some(Box::from_raw(node).into_value())
        }
    }

    /// # Safety
    ///
    /// `node` must be a valid, linked, non-sigil node of this list.
    unsafe fn detach(&mut self, node: *mut Entry<T>) {
        unsafe {
            // SAFETY: a linked node always has valid neighbours
            (*(*node).prev).next = (*node).next;
            (*(*node).next).prev = (*node).prev;
        }
    }

    /// Links `node` right after the head sentinel.
    ///
    /// # Safety
    ///
    /// `node` must be valid and not currently linked into any list.
    unsafe fn attach(&mut self, node: *mut Entry<T>) {
        unsafe {
            // SAFETY: head is valid for the lifetime of the list
            (*node).next = (*self.head).next;
            (*node).prev = self.head;
            (*self.head).next = node;
            (*(*node).next).prev = node;
        }
    }

    /// Moves a node to the front of the list, marking it most recently used.
    ///
    /// # Safety
    ///
    /// `node` must point to a valid entry linked into this list.
    pub(crate) unsafe fn move_to_front(&mut self, node: *mut Entry<T>) {
        if node.is_null() || node == self.head || node == self.tail {
            return;
        }

        unsafe {
            if (*self.head).next == node {
                return;
            }
            self.detach(node);
            self.attach(node);
        }
    }

    /// Adds a value to the front of the list and returns a stable pointer to
    /// its node.
    pub(crate) fn add(&mut self, v: T) -> *mut Entry<T> {
        let node = NonNull::from(Box::leak(Box::new(Entry::new(v))));
        // SAFETY: node is freshly allocated and not linked anywhere
        unsafe { self.attach(node.as_ptr()) };
        self.len += 1;
        node.as_ptr()
    }

    /// Iterates values from the least recently used to the most recently used.
    pub(crate) fn iter(&self) -> Iter<'_, T> {
        Iter {
            // SAFETY: tail is valid for the lifetime of the list
            cursor: unsafe { (*self.tail).prev },
            head: self.head,
            remaining: self.len,
            _marker: PhantomData,
        }
    }

    pub(crate) fn clear(&mut self) {
        while self.remove_first().is_some() {}
    }
}

impl<T> Drop for List<T> {
    fn drop(&mut self) {
        self.clear();

        // SAFETY: head and tail were allocated in `new` and are freed only here
        unsafe {
            if !self.head.is_null() {
                let _ = Box::from_raw(self.head);
                self.head = ptr::null_mut();
            }
            if !self.tail.is_null() {
                let _ = Box::from_raw(self.tail);
                self.tail = ptr::null_mut();
            }
        }
    }
}

impl<T> fmt::Debug for List<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("List").field("length", &self.len).finish()
    }
}

/// Borrowing iterator walking the list from back (LRU) to front (MRU).
pub(crate) struct Iter<'a, T> {
    cursor: *mut Entry<T>,
    head: *mut Entry<T>,
    remaining: usize,
    _marker: PhantomData<&'a T>,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        if self.remaining == 0 || self.cursor == self.head {
            return None;
        }
        // SAFETY: cursor is a linked, non-sigil node; the shared borrow of the
        // list keeps every node alive and unmodified for 'a
        unsafe {
            let node = self.cursor;
            self.cursor = (*node).prev;
            self.remaining -= 1;
            Some((*node).get_value())
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(list: &List<u32>) -> Vec<u32> {
        list.iter().copied().collect()
    }

    #[test]
    fn test_new_list_is_empty() {
        let list = List::<u32>::new();
        assert_eq!(list.len(), 0);
        assert!(list.is_empty());
        assert!(!list.head.is_null());
        assert!(!list.tail.is_null());
        assert_eq!(list.iter().next(), None);
    }

    #[test]
    fn test_add_orders_lru_to_mru() {
        let mut list = List::new();
        list.add(10);
        list.add(20);
        list.add(30);
        assert_eq!(list.len(), 3);
        assert_eq!(collect(&list), vec![10, 20, 30]);
    }

    #[test]
    fn test_move_to_front() {
        let mut list = List::new();
        let node1 = list.add(10);
        let _node2 = list.add(20);
        let node3 = list.add(30);

        unsafe {
            list.move_to_front(node1);
        }
        assert_eq!(collect(&list), vec![20, 30, 10]);

        // already at the front
        unsafe {
            list.move_to_front(node1);
        }
        assert_eq!(collect(&list), vec![20, 30, 10]);

        unsafe {
            list.move_to_front(node3);
        }
        assert_eq!(collect(&list), vec![20, 10, 30]);
    }

    #[test]
    fn test_remove_middle() {
        let mut list = List::new();
        let _node1 = list.add(10);
        let node2 = list.add(20);
        let _node3 = list.add(30);

        let removed = unsafe { list.remove(node2) }.unwrap();
        assert_eq!(removed, 20);
        assert_eq!(list.len(), 2);
        assert_eq!(collect(&list), vec![10, 30]);
    }

    #[test]
    fn test_remove_sigil_is_rejected() {
        let mut list = List::new();
        list.add(1);
        let head = list.head;
        assert!(unsafe { list.remove(head) }.is_none());
        assert!(unsafe { list.remove(ptr::null_mut()) }.is_none());
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn test_clear_then_reuse() {
        let mut list = List::new();
        list.add(10);
        list.add(20);
        list.clear();
        assert!(list.is_empty());
        assert_eq!(collect(&list), Vec::<u32>::new());

        list.add(40);
        assert_eq!(collect(&list), vec![40]);
    }

    #[test]
    fn test_remove_first_takes_mru() {
        let mut list = List::new();
        list.add(10);
        list.add(20);
        assert_eq!(list.remove_first(), Some(20));
        assert_eq!(list.remove_first(), Some(10));
        assert_eq!(list.remove_first(), None);
    }

    #[test]
    fn test_drop_releases_owned_values() {
        use std::sync::Arc;

        let shared = Arc::new(7u32);
        {
            let mut list = List::new();
            list.add(Arc::clone(&shared));
            list.add(Arc::clone(&shared));
            assert_eq!(Arc::strong_count(&shared), 3);
        }
        assert_eq!(Arc::strong_count(&shared), 1);
    }
}
