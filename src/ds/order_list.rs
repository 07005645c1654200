//! Ordered list of cache entries addressed by stable [`SlotId`]s.
//!
//! ```text
//!   slots:  [ Linked(a) | Vacant ──┐ | Linked(c) | Linked(b) ]
//!                                  └──► next vacant slot (or none)
//!
//!   head ──► a ◄──► b ◄──► c ◄── tail
//! ```
//!
//! Nodes live in one `Vec` and link to each other by slot index, so an id
//! stays valid until its node is removed. Vacant slots are chained through
//! themselves and refilled before the vector grows; removing never
//! allocates.
//!
//! The policies read the same list three ways: FIFO as a queue (victim at
//! the head), LRU as a recency list (`move_to_back` on a hit), CLOCK as a
//! ring (`next_of`, wrapping to `front_id`).

use std::collections::TryReserveError;

use crate::error::InvariantError;

/// Stable handle to a node in an [`OrderList`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlotId(usize);

impl SlotId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug)]
struct Node<T> {
    value: T,
    prev: Option<SlotId>,
    next: Option<SlotId>,
}

#[derive(Debug)]
enum Slot<T> {
    Linked(Node<T>),
    /// Index of the next vacant slot in the chain.
    Vacant(Option<usize>),
}

#[derive(Debug)]
pub struct OrderList<T> {
    slots: Vec<Slot<T>>,
    vacant_head: Option<usize>,
    vacant_len: usize,
    head: Option<SlotId>,
    tail: Option<SlotId>,
    len: usize,
}

impl<T> OrderList<T> {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            vacant_head: None,
            vacant_len: 0,
            head: None,
            tail: None,
            len: 0,
        }
    }

    /// Ensures the next `additional` pushes do not allocate.
    pub fn try_reserve(&mut self, additional: usize) -> Result<(), TryReserveError> {
        self.slots
            .try_reserve(additional.saturating_sub(self.vacant_len))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn front_id(&self) -> Option<SlotId> {
        self.head
    }

    pub fn next_of(&self, id: SlotId) -> Option<SlotId> {
        self.node(id)?.next
    }

    pub fn get(&self, id: SlotId) -> Option<&T> {
        self.node(id).map(|node| &node.value)
    }

    pub fn get_mut(&mut self, id: SlotId) -> Option<&mut T> {
        self.node_mut(id).map(|node| &mut node.value)
    }

    /// Walks from head to tail.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            list: self,
            next: self.head,
        }
    }

    pub fn push_back(&mut self, value: T) -> SlotId {
        let node = Node {
            value,
            prev: None,
            next: None,
        };
        let id = match self.vacant_head {
            Some(index) => {
                if let Slot::Vacant(next_vacant) = &self.slots[index] {
                    self.vacant_head = *next_vacant;
                }
                self.slots[index] = Slot::Linked(node);
                self.vacant_len -= 1;
                SlotId(index)
            },
            None => {
                self.slots.push(Slot::Linked(node));
                SlotId(self.slots.len() - 1)
            },
        };
        self.attach_back(id);
        self.len += 1;
        id
    }

    pub fn remove(&mut self, id: SlotId) -> Option<T> {
        self.unlink(id)?;
        let slot = std::mem::replace(&mut self.slots[id.0], Slot::Vacant(self.vacant_head));
        self.vacant_head = Some(id.0);
        self.vacant_len += 1;
        self.len -= 1;
        match slot {
            Slot::Linked(node) => Some(node.value),
            Slot::Vacant(_) => None,
        }
    }

    /// Moves the node to the tail. Returns `false` if `id` is not linked.
    pub fn move_to_back(&mut self, id: SlotId) -> bool {
        if self.node(id).is_none() {
            return false;
        }
        if self.tail != Some(id) {
            self.unlink(id);
            self.attach_back(id);
        }
        true
    }

    pub fn clear(&mut self) {
        self.slots.clear();
        self.vacant_head = None;
        self.vacant_len = 0;
        self.head = None;
        self.tail = None;
        self.len = 0;
    }

    pub fn check_invariants(&self) -> Result<(), InvariantError> {
        let mut walked = 0usize;
        let mut prev = None;
        let mut cursor = self.head;
        while let Some(id) = cursor {
            let node = self.node(id).ok_or_else(|| {
                InvariantError::new(format!("link points at vacant slot {}", id.index()))
            })?;
            if node.prev != prev {
                return Err(InvariantError::new(format!(
                    "slot {} has a stale back link",
                    id.index()
                )));
            }
            walked += 1;
            if walked > self.len {
                return Err(InvariantError::new(format!(
                    "walked past {} nodes; the list has a cycle or a wrong length",
                    self.len
                )));
            }
            prev = Some(id);
            cursor = node.next;
        }
        if self.tail != prev {
            return Err(InvariantError::new("tail is not the last reachable node"));
        }
        if walked != self.len {
            return Err(InvariantError::new(format!(
                "walked {walked} nodes but length is {}",
                self.len
            )));
        }

        let mut vacant = 0usize;
        let mut chain = self.vacant_head;
        while let Some(index) = chain {
            match self.slots.get(index) {
                Some(Slot::Vacant(next)) if vacant < self.slots.len() => {
                    vacant += 1;
                    chain = *next;
                },
                _ => return Err(InvariantError::new("vacant chain is broken")),
            }
        }
        if vacant != self.vacant_len || vacant + self.len != self.slots.len() {
            return Err(InvariantError::new(format!(
                "{} slots hold {} linked and {vacant} vacant (expected {} vacant)",
                self.slots.len(),
                self.len,
                self.vacant_len
            )));
        }
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn corrupt_len(&mut self, len: usize) {
        self.len = len;
    }

    fn node(&self, id: SlotId) -> Option<&Node<T>> {
        match self.slots.get(id.0)? {
            Slot::Linked(node) => Some(node),
            Slot::Vacant(_) => None,
        }
    }

    fn node_mut(&mut self, id: SlotId) -> Option<&mut Node<T>> {
        match self.slots.get_mut(id.0)? {
            Slot::Linked(node) => Some(node),
            Slot::Vacant(_) => None,
        }
    }

    /// Links a detached node after the current tail.
    fn attach_back(&mut self, id: SlotId) {
        let old_tail = self.tail;
        if let Some(node) = self.node_mut(id) {
            node.prev = old_tail;
            node.next = None;
        }
        match old_tail {
            Some(tail) => {
                if let Some(node) = self.node_mut(tail) {
                    node.next = Some(id);
                }
            },
            None => self.head = Some(id),
        }
        self.tail = Some(id);
    }

    /// Splices the node out, leaving it in its slot with no links.
    fn unlink(&mut self, id: SlotId) -> Option<()> {
        let node = self.node_mut(id)?;
        let (prev, next) = (node.prev.take(), node.next.take());
        match prev {
            Some(before) => {
                if let Some(node) = self.node_mut(before) {
                    node.next = next;
                }
            },
            None => self.head = next,
        }
        match next {
            Some(after) => {
                if let Some(node) = self.node_mut(after) {
                    node.prev = prev;
                }
            },
            None => self.tail = prev,
        }
        Some(())
    }
}

/// Head-to-tail walk yielding each node's id with its value.
pub struct Iter<'a, T> {
    list: &'a OrderList<T>,
    next: Option<SlotId>,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = (SlotId, &'a T);

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.next?;
        let node = self.list.node(id)?;
        self.next = node.next;
        Some((id, &node.value))
    }
}
