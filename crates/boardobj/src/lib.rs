// Copyright © 2025 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: Provide indexed board object groups shared by the perf domains.
// Author: Lukas Bower
#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! Board objects and the fixed-capacity groups that own them.
//!
//! Every performance domain stores its objects in a [`BoardObjGrp`]. A slot
//! index is the stable identity of an object; callers hold indices, never
//! references, across phases.

mod grp;
mod mask;

pub use grp::{BoardObjGrp, Iter, E255_CAPACITY, E32_CAPACITY};
pub use mask::{BoardObjGrpMask, SetBits};

use thiserror::Error;

/// Type tag identifying the concrete board object variant.
pub type BoardObjType = u8;

/// Type tag reserved for the common base of every board object.
pub const BOARDOBJ_TYPE_SUPER: BoardObjType = 0;

/// Bitmask of type classifications satisfied by a board object.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct TypeMask(u32);

impl TypeMask {
    /// Mask satisfied by no type.
    pub const EMPTY: Self = Self(0);

    /// Mask for a single type tag. Tags past the mask width yield [`Self::EMPTY`].
    #[must_use]
    pub const fn of(ty: BoardObjType) -> Self {
        match 1u32.checked_shl(ty as u32) {
            Some(bit) => Self(bit),
            None => Self::EMPTY,
        }
    }

    /// Returns the mask extended with `ty`.
    #[must_use]
    pub const fn with(self, ty: BoardObjType) -> Self {
        Self(self.0 | Self::of(ty).0)
    }

    /// Reports whether `ty` is part of the mask.
    #[must_use]
    pub const fn contains(self, ty: BoardObjType) -> bool {
        self.0 & Self::of(ty).0 != 0
    }

    /// Raw mask bits.
    #[must_use]
    pub const fn bits(self) -> u32 {
        self.0
    }
}

/// Polymorphic object stored in a [`BoardObjGrp`] slot.
pub trait BoardObj {
    /// Concrete variant tag.
    fn obj_type(&self) -> BoardObjType;

    /// Every classification the object satisfies.
    fn type_mask(&self) -> TypeMask;

    /// Reports whether the object satisfies the `ty` classification.
    fn implements(&self, ty: BoardObjType) -> bool {
        self.type_mask().contains(ty)
    }
}

/// Errors raised by board object group operations.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum BoardObjGrpError {
    /// Slot storage could not be reserved.
    #[error("unable to reserve {capacity} board object slots")]
    Allocation {
        /// Requested slot count.
        capacity: usize,
    },
    /// Index lies outside the group capacity.
    #[error("board object index {index} out of range (capacity {capacity})")]
    IndexOutOfRange {
        /// Requested index.
        index: usize,
        /// Group capacity.
        capacity: usize,
    },
    /// Slot already holds a live object.
    #[error("board object slot {index} already occupied")]
    Occupied {
        /// Requested index.
        index: usize,
    },
}
