//! Recency list backing [`BoundedCache`](crate::BoundedCache)
//!
//! Slab of nodes threaded into a doubly-linked list, newest at the head and
//! oldest at the tail, with a hash index for O(1) lookup. Not synchronized;
//! the owning cache holds it behind a mutex.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;
use ahash::RandomState;

/// Node in the recency list
struct Node<K, V> {
    key: K,
    value: V,
    prev: Option<usize>,
    next: Option<usize>,
}

/// Recency-ordered map with a fixed capacity (> 0)
pub(crate) struct LruList<K, V> {
    map: HashMap<K, usize, RandomState>,
    nodes: Vec<Option<Node<K, V>>>,
    head: Option<usize>,
    tail: Option<usize>,
    free_list: Vec<usize>,
    capacity: usize,
}

impl<K, V> LruList<K, V>
where
    K: Hash + Eq + Clone,
{
    /// Create an empty list holding at most `capacity` entries
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "Capacity must be greater than 0");

        Self {
            map: HashMap::with_capacity_and_hasher(capacity, RandomState::new()),
            nodes: Vec::with_capacity(capacity),
            head: None,
            tail: None,
            free_list: Vec::new(),
            capacity,
        }
    }

    /// Look up `key`, marking it most recently used
    pub fn get<Q>(&mut self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let idx = *self.map.get(key)?;
        self.move_to_front(idx);
        self.nodes[idx].as_ref().map(|node| &node.value)
    }

    /// Look up `key` without touching its recency
    pub fn peek<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let idx = *self.map.get(key)?;
        self.nodes[idx].as_ref().map(|node| &node.value)
    }

    /// Overwrite the value of an existing key and mark it most recently used.
    ///
    /// Returns false if `key` is not present.
    pub fn replace<Q>(&mut self, key: &Q, value: V) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let Some(&idx) = self.map.get(key) else {
            return false;
        };
        if let Some(node) = &mut self.nodes[idx] {
            node.value = value;
        }
        self.move_to_front(idx);
        true
    }

    /// Insert a key that is not yet present at the head of the list.
    ///
    /// Oldest entries are evicted one at a time until there is room.
    /// Returns the number of evicted entries.
    pub fn insert(&mut self, key: K, value: V) -> usize {
        debug_assert!(!self.map.contains_key(&key));

        let mut evicted = 0;
        while self.map.len() >= self.capacity {
            if !self.evict() {
                break;
            }
            evicted += 1;
        }

        let idx = self.alloc_node();
        self.nodes[idx] = Some(Node {
            key: key.clone(),
            value,
            prev: None,
            next: self.head,
        });

        if let Some(head_idx) = self.head {
            if let Some(head) = &mut self.nodes[head_idx] {
                head.prev = Some(idx);
            }
        }

        self.head = Some(idx);
        if self.tail.is_none() {
            self.tail = Some(idx);
        }

        self.map.insert(key, idx);
        evicted
    }

    /// Whether `key` is present
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.map.contains_key(key)
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Keys from least to most recently used
    pub fn keys_oldest_first(&self) -> Vec<K> {
        let mut keys = Vec::with_capacity(self.map.len());
        let mut cursor = self.tail;
        while let Some(idx) = cursor {
            let Some(node) = &self.nodes[idx] else {
                break;
            };
            keys.push(node.key.clone());
            cursor = node.prev;
        }
        keys
    }

    fn move_to_front(&mut self, idx: usize) {
        if self.head == Some(idx) {
            return;
        }

        self.unlink(idx);

        if let Some(node) = &mut self.nodes[idx] {
            node.prev = None;
            node.next = self.head;
        }

        if let Some(head_idx) = self.head {
            if let Some(head) = &mut self.nodes[head_idx] {
                head.prev = Some(idx);
            }
        }

        self.head = Some(idx);
        if self.tail.is_none() {
            self.tail = Some(idx);
        }
    }

    fn unlink(&mut self, idx: usize) {
        let (prev, next) = match &self.nodes[idx] {
            Some(node) => (node.prev, node.next),
            None => return,
        };

        match prev {
            Some(prev_idx) => {
                if let Some(prev_node) = &mut self.nodes[prev_idx] {
                    prev_node.next = next;
                }
            }
            None => self.head = next,
        }

        match next {
            Some(next_idx) => {
                if let Some(next_node) = &mut self.nodes[next_idx] {
                    next_node.prev = prev;
                }
            }
            None => self.tail = prev,
        }
    }

    /// Drop the tail entry. Returns false if the list was empty.
    fn evict(&mut self) -> bool {
        let Some(tail_idx) = self.tail else {
            return false;
        };
        // Unlink while the node is still in the slab so its neighbours are patched.
        self.unlink(tail_idx);
        if let Some(node) = self.nodes[tail_idx].take() {
            self.map.remove(&node.key);
        }
        self.free_list.push(tail_idx);
        true
    }

    fn alloc_node(&mut self) -> usize {
        if let Some(idx) = self.free_list.pop() {
            idx
        } else {
            let idx = self.nodes.len();
            self.nodes.push(None);
            idx
        }
    }
}
