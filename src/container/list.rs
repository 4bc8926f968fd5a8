//! Allocator-aware doubly-linked list
//!
//! Every node is a separate fixed-size allocation, which makes this the
//! natural workload for the multipool allocator: all nodes of one element
//! type land in one size class, and a popped node's block is immediately
//! reusable for the next push.

use core::marker::PhantomData;
use core::ptr::NonNull;

use crate::allocator::TypedAllocator;
use crate::error::AllocResult;
use crate::handle::AllocHandle;

struct Node<T> {
    value: T,
    prev: Option<NonNull<Node<T>>>,
    next: Option<NonNull<Node<T>>>,
}

/// Doubly-linked list whose nodes live in a pooled allocator.
pub struct PoolList<'a, T> {
    head: Option<NonNull<Node<T>>>,
    tail: Option<NonNull<Node<T>>>,
    len: usize,
    handle: AllocHandle<'a>,
    _marker: PhantomData<T>,
}

impl<'a, T> PoolList<'a, T> {
    /// Creates an empty list; nodes are allocated per element.
    pub fn new(handle: AllocHandle<'a>) -> Self {
        Self {
            head: None,
            tail: None,
            len: 0,
            handle,
            _marker: PhantomData,
        }
    }

    /// The handle this list allocates through
    #[inline]
    pub fn allocator(&self) -> AllocHandle<'a> {
        self.handle
    }

    /// Number of elements
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// True when the list holds no elements
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// First element, if any
    pub fn front(&self) -> Option<&T> {
        // SAFETY: head points at a live node owned by this list.
        self.head.map(|node| unsafe { &node.as_ref().value })
    }

    /// Last element, if any
    pub fn back(&self) -> Option<&T> {
        // SAFETY: tail points at a live node owned by this list.
        self.tail.map(|node| unsafe { &node.as_ref().value })
    }

    /// Appends an element at the back.
    ///
    /// # Errors
    /// Fails when the allocator cannot provide a node; the list is left
    /// unchanged.
    pub fn try_push_back(&mut self, value: T) -> AllocResult<()> {
        let node = self.new_node(value, self.tail, None)?;
        match self.tail {
            // SAFETY: old tail is a live node owned by this list.
            Some(mut tail) => unsafe { tail.as_mut().next = Some(node) },
            None => self.head = Some(node),
        }
        self.tail = Some(node);
        self.len += 1;
        Ok(())
    }

    /// Prepends an element at the front.
    ///
    /// # Errors
    /// Fails when the allocator cannot provide a node; the list is left
    /// unchanged.
    pub fn try_push_front(&mut self, value: T) -> AllocResult<()> {
        let node = self.new_node(value, None, self.head)?;
        match self.head {
            // SAFETY: old head is a live node owned by this list.
            Some(mut head) => unsafe { head.as_mut().prev = Some(node) },
            None => self.tail = Some(node),
        }
        self.head = Some(node);
        self.len += 1;
        Ok(())
    }

    /// Removes and returns the first element
    pub fn pop_front(&mut self) -> Option<T> {
        let node = self.head?;
        // SAFETY: head is a live node owned by this list; after unlinking
        // we hold the only pointer to it.
        let node_ref = unsafe { node.as_ref() };
        self.head = node_ref.next;
        match self.head {
            // SAFETY: the new head is a live node owned by this list.
            Some(mut head) => unsafe { head.as_mut().prev = None },
            None => self.tail = None,
        }
        self.len -= 1;
        Some(self.take_node(node))
    }

    /// Removes and returns the last element
    pub fn pop_back(&mut self) -> Option<T> {
        let node = self.tail?;
        // SAFETY: tail is a live node owned by this list; after unlinking
        // we hold the only pointer to it.
        let node_ref = unsafe { node.as_ref() };
        self.tail = node_ref.prev;
        match self.tail {
            // SAFETY: the new tail is a live node owned by this list.
            Some(mut tail) => unsafe { tail.as_mut().next = None },
            None => self.head = None,
        }
        self.len -= 1;
        Some(self.take_node(node))
    }

    /// Removes all elements, returning every node to the allocator
    pub fn clear(&mut self) {
        while self.pop_front().is_some() {}
    }

    /// Front-to-back iterator
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            next: self.head,
            remaining: self.len,
            _marker: PhantomData,
        }
    }

    fn new_node(
        &self,
        value: T,
        prev: Option<NonNull<Node<T>>>,
        next: Option<NonNull<Node<T>>>,
    ) -> AllocResult<NonNull<Node<T>>> {
        // SAFETY: alloc_init returns initialized, exclusively owned storage;
        // the node is released in take_node with the same type.
        unsafe { self.handle.alloc_init(Node { value, prev, next }) }
    }

    /// Moves the value out of an unlinked node and frees the node's block.
    fn take_node(&self, node: NonNull<Node<T>>) -> T {
        // SAFETY: the node is unlinked, so this list holds the only pointer;
        // read moves the whole node out, then the block goes back untyped.
        unsafe {
            let unlinked = node.as_ptr().read();
            self.handle.dealloc_typed(node);
            unlinked.value
        }
    }
}

impl<T> Drop for PoolList<'_, T> {
    fn drop(&mut self) {
        self.clear();
    }
}

impl<T: core::fmt::Debug> core::fmt::Debug for PoolList<'_, T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

/// Iterator over list elements, front to back.
pub struct Iter<'b, T> {
    next: Option<NonNull<Node<T>>>,
    remaining: usize,
    _marker: PhantomData<&'b T>,
}

impl<'b, T> Iterator for Iter<'b, T> {
    type Item = &'b T;

    fn next(&mut self) -> Option<&'b T> {
        let node = self.next?;
        // SAFETY: the node is live for 'b (the iterator borrows the list).
        let node_ref = unsafe { node.as_ref() };
        self.next = node_ref.next;
        self.remaining -= 1;
        Some(&node_ref.value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}

impl<'b, T> IntoIterator for &'b PoolList<'_, T> {
    type Item = &'b T;
    type IntoIter = Iter<'b, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocator::{BumpAllocator, MultipoolAllocator};
    use crate::store::BackingStore;

    #[test]
    fn test_push_pop_both_ends() {
        let store = BackingStore::new(4096).unwrap();
        let allocator = BumpAllocator::new(&store);
        let handle = AllocHandle::new(&allocator);

        let mut list = PoolList::new(handle);
        list.try_push_back(2u32).unwrap();
        list.try_push_back(3).unwrap();
        list.try_push_front(1).unwrap();

        assert_eq!(list.len(), 3);
        assert_eq!(list.front(), Some(&1));
        assert_eq!(list.back(), Some(&3));
        assert_eq!(list.pop_front(), Some(1));
        assert_eq!(list.pop_back(), Some(3));
        assert_eq!(list.pop_back(), Some(2));
        assert_eq!(list.pop_back(), None);
        assert!(list.is_empty());
    }

    #[test]
    fn test_iteration_order() {
        let store = BackingStore::new(4096).unwrap();
        let allocator = BumpAllocator::new(&store);
        let handle = AllocHandle::new(&allocator);

        let mut list = PoolList::new(handle);
        for i in 0..5u8 {
            list.try_push_back(i).unwrap();
        }
        let collected: Vec<u8> = list.iter().copied().collect();
        assert_eq!(collected, vec![0, 1, 2, 3, 4]);
        assert_eq!(list.iter().len(), 5);
    }

    #[test]
    fn test_nodes_return_to_free_list() {
        let store = BackingStore::new(4096).unwrap();
        let node_size = size_of::<Node<u64>>();
        let pool = MultipoolAllocator::new(&store, &[node_size]).unwrap();
        let handle = AllocHandle::new(&pool);

        let mut list = PoolList::new(handle);
        for i in 0..8u64 {
            list.try_push_back(i).unwrap();
        }
        assert_eq!(pool.class_stats()[0].carved_blocks, 8);

        for _ in 0..8 {
            list.pop_front();
        }
        assert_eq!(pool.free_blocks(node_size), Some(8));

        // Refilling reuses every freed node; nothing new is carved.
        for i in 0..8u64 {
            list.try_push_back(i).unwrap();
        }
        assert_eq!(pool.class_stats()[0].carved_blocks, 8);
    }

    #[test]
    fn test_exhaustion_leaves_list_intact() {
        let store = BackingStore::new(128).unwrap();
        let allocator = BumpAllocator::new(&store);
        let handle = AllocHandle::new(&allocator);

        let mut list: PoolList<'_, u64> = PoolList::new(handle);
        let mut pushed = 0usize;
        loop {
            match list.try_push_back(0) {
                Ok(()) => pushed += 1,
                Err(err) => {
                    assert!(err.is_out_of_memory());
                    break;
                }
            }
        }
        assert_eq!(list.len(), pushed);
        let walked = list.iter().count();
        assert_eq!(walked, pushed);
    }

    #[test]
    fn test_drop_runs_destructors() {
        use std::rc::Rc;

        let store = BackingStore::new(4096).unwrap();
        let allocator = BumpAllocator::new(&store);
        let handle = AllocHandle::new(&allocator);

        let tracker = Rc::new(());
        {
            let mut list = PoolList::new(handle);
            for _ in 0..4 {
                list.try_push_back(Rc::clone(&tracker)).unwrap();
            }
            assert_eq!(Rc::strong_count(&tracker), 5);
        }
        assert_eq!(Rc::strong_count(&tracker), 1);
    }
}
