// Copyright © 2025 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: Indexed slot storage for board objects with validity tracking.
// Author: Lukas Bower

use crate::{BoardObj, BoardObjGrpError, BoardObjGrpMask};

/// Slot count of the fixed-size "e32" group shape.
pub const E32_CAPACITY: usize = 32;
/// Slot count of the large "e255" group shape.
pub const E255_CAPACITY: usize = 255;

/// Indexed group of board objects.
///
/// A slot is either empty or owns exactly one object. Iteration follows slot
/// index order regardless of insertion order. The group performs no locking;
/// shared groups must be wrapped by the caller.
#[derive(Debug)]
pub struct BoardObjGrp<T> {
    slots: Vec<Option<T>>,
    mask: BoardObjGrpMask,
}

impl<T: BoardObj> BoardObjGrp<T> {
    /// Reserve a group with `capacity` slots.
    pub fn construct(capacity: usize) -> Result<Self, BoardObjGrpError> {
        let mut slots = Vec::new();
        slots
            .try_reserve_exact(capacity)
            .map_err(|_| BoardObjGrpError::Allocation { capacity })?;
        slots.resize_with(capacity, || None);
        let mask =
            BoardObjGrpMask::try_new(capacity).ok_or(BoardObjGrpError::Allocation { capacity })?;
        Ok(Self { slots, mask })
    }

    /// Reserve a fixed 32-slot group.
    pub fn construct_e32() -> Result<Self, BoardObjGrpError> {
        Self::construct(E32_CAPACITY)
    }

    /// Reserve a 255-slot group.
    pub fn construct_e255() -> Result<Self, BoardObjGrpError> {
        Self::construct(E255_CAPACITY)
    }

    /// Store `object` at `index`, taking ownership of it.
    pub fn insert(&mut self, object: T, index: usize) -> Result<(), BoardObjGrpError> {
        let capacity = self.capacity();
        let slot = self
            .slots
            .get_mut(index)
            .ok_or(BoardObjGrpError::IndexOutOfRange { index, capacity })?;
        if slot.is_some() {
            return Err(BoardObjGrpError::Occupied { index });
        }
        *slot = Some(object);
        self.mask.set(index);
        Ok(())
    }

    /// Remove and return the object at `index`, if any.
    pub fn remove(&mut self, index: usize) -> Option<T> {
        let object = self.slots.get_mut(index)?.take();
        if object.is_some() {
            self.mask.clear(index);
        }
        object
    }

    /// Drop every stored object.
    pub fn clear(&mut self) {
        self.slots.iter_mut().for_each(|slot| *slot = None);
        self.mask.clear_all();
    }
}

impl<T> BoardObjGrp<T> {
    /// Object at `index`; absence is a normal outcome.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&T> {
        self.slots.get(index).and_then(Option::as_ref)
    }

    /// Mutable object at `index`.
    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        self.slots.get_mut(index).and_then(Option::as_mut)
    }

    /// Number of slots.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of live objects.
    #[must_use]
    pub fn len(&self) -> usize {
        self.mask.count()
    }

    /// Reports whether no slot is occupied.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.mask.is_empty()
    }

    /// Validity mask of the group.
    #[must_use]
    pub fn mask(&self) -> &BoardObjGrpMask {
        &self.mask
    }

    /// `(index, object)` pairs over occupied slots in ascending index order.
    #[must_use]
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            inner: self.slots.iter().enumerate(),
        }
    }
}

impl<'a, T> IntoIterator for &'a BoardObjGrp<T> {
    type Item = (usize, &'a T);
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over the occupied slots of a [`BoardObjGrp`].
#[derive(Debug, Clone)]
pub struct Iter<'a, T> {
    inner: core::iter::Enumerate<core::slice::Iter<'a, Option<T>>>,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = (usize, &'a T);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner
            .by_ref()
            .find_map(|(index, slot)| slot.as_ref().map(|object| (index, object)))
    }
}
