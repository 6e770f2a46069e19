//! A rendered list that supports optimistic removal with rollback.
use std::{cell::RefCell, rc::Rc};

use im::Vector;

/// Items removed optimistically, with the positions they occupied.
#[derive(Debug, Clone)]
#[must_use = "a removal should be either kept or rolled back"]
pub struct Removal<T> {
    removed: Vec<(usize, T)>,
}

impl<T> Removal<T> {
    pub fn is_empty(&self) -> bool {
        self.removed.is_empty()
    }

    pub fn len(&self) -> usize {
        self.removed.len()
    }
}

/// Shared, cheaply cloneable list state. Clones see the same items.
#[derive(Debug)]
pub struct OptimisticList<T: Clone> {
    items: Rc<RefCell<Vector<T>>>,
}

impl<T: Clone> Clone for OptimisticList<T> {
    fn clone(&self) -> Self {
        Self {
            items: Rc::clone(&self.items),
        }
    }
}

impl<T: Clone> Default for OptimisticList<T> {
    fn default() -> Self {
        Self {
            items: Rc::new(RefCell::new(Vector::new())),
        }
    }
}

impl<T: Clone> OptimisticList<T> {
    pub fn new(items: impl IntoIterator<Item = T>) -> Self {
        let list = Self::default();
        list.replace(items);
        list
    }

    /// A snapshot. `im::Vector` clones share structure, so this is cheap.
    pub fn items(&self) -> Vector<T> {
        self.items.borrow().clone()
    }

    pub fn to_vec(&self) -> Vec<T> {
        self.items.borrow().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.items.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.borrow().is_empty()
    }

    pub fn replace(&self, items: impl IntoIterator<Item = T>) {
        *self.items.borrow_mut() = items.into_iter().collect();
    }

    pub fn clear(&self) {
        self.items.borrow_mut().clear();
    }

    pub fn push_back(&self, item: T) {
        self.items.borrow_mut().push_back(item);
    }

    pub fn any(&self, predicate: impl Fn(&T) -> bool) -> bool {
        self.items.borrow().iter().any(predicate)
    }

    pub fn find(&self, predicate: impl Fn(&T) -> bool) -> Option<T> {
        self.items.borrow().iter().find(|item| predicate(item)).cloned()
    }

    pub fn update_where(&self, predicate: impl Fn(&T) -> bool, update: impl Fn(&mut T)) {
        for item in self.items.borrow_mut().iter_mut() {
            if predicate(item) {
                update(item);
            }
        }
    }

    /// Remove every matching item now, remembering where each one was.
    pub fn remove_where(&self, predicate: impl Fn(&T) -> bool) -> Removal<T> {
        let mut items = self.items.borrow_mut();
        let mut removed = Vec::new();
        let mut kept = Vector::new();
        for (index, item) in items.iter().enumerate() {
            if predicate(item) {
                removed.push((index, item.clone()));
            } else {
                kept.push_back(item.clone());
            }
        }
        *items = kept;
        Removal { removed }
    }

    /// Put removed items back at their old positions (clamped to the current length, in case
    /// the list shrank in the meantime).
    pub fn rollback(&self, removal: Removal<T>) {
        let mut items = self.items.borrow_mut();
        for (index, item) in removal.removed {
            let at = index.min(items.len());
            items.insert(at, item);
        }
    }
}
