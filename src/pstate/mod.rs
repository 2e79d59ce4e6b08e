// Copyright © 2025 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: P-state board objects and their per-clock constraint lists.
// Author: Lukas Bower

mod decode;
mod lookup;
mod registry;

pub use decode::{load_table, pstate_sw_setup};
pub use registry::{PstateObjs, PstateRegistry};

use boardobj::{BoardObj, BoardObjType, TypeMask, BOARDOBJ_TYPE_SUPER};
use perf_table::CLK_SET_INFO_MAX_SIZE;

use crate::domain::clk::ClkWhich;

/// Type tag of P-states decoded from the 3.x table format.
pub const PSTATE_TYPE_3X: BoardObjType = 3;

/// Frequency constraint of one clock domain at one P-state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClkSetInfo {
    /// Clock domain the constraint applies to.
    pub clkwhich: ClkWhich,
    /// Nominal frequency in MHz.
    pub nominal_mhz: u32,
    /// Minimum frequency in MHz.
    pub min_mhz: u16,
    /// Maximum frequency in MHz.
    pub max_mhz: u16,
}

/// Bounded clock constraint list of a P-state.
pub type ClkSetInfoList = heapless::Vec<ClkSetInfo, CLK_SET_INFO_MAX_SIZE>;

/// One performance level.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Pstate {
    obj_type: BoardObjType,
    type_mask: TypeMask,
    num: u32,
    clklist: ClkSetInfoList,
    lpwr_entry_idx: u8,
}

impl Pstate {
    /// 3.x P-state with ordinal `num`.
    #[must_use]
    pub fn construct_3x(num: u32, clklist: ClkSetInfoList, lpwr_entry_idx: u8) -> Self {
        Self {
            obj_type: PSTATE_TYPE_3X,
            type_mask: TypeMask::of(BOARDOBJ_TYPE_SUPER).with(PSTATE_TYPE_3X),
            num,
            clklist,
            lpwr_entry_idx,
        }
    }

    /// P-state ordinal; lower is faster.
    #[must_use]
    pub fn num(&self) -> u32 {
        self.num
    }

    /// Clock constraints in table order.
    #[must_use]
    pub fn clklist(&self) -> &[ClkSetInfo] {
        &self.clklist
    }

    /// Index into the low-power policy table.
    #[must_use]
    pub fn lpwr_entry_idx(&self) -> u8 {
        self.lpwr_entry_idx
    }

    /// Constraint for `clkwhich`, if this level governs it.
    #[must_use]
    pub fn clk_set_info(&self, clkwhich: ClkWhich) -> Option<&ClkSetInfo> {
        self.clklist.iter().find(|info| info.clkwhich == clkwhich)
    }
}

impl BoardObj for Pstate {
    fn obj_type(&self) -> BoardObjType {
        self.obj_type
    }

    fn type_mask(&self) -> TypeMask {
        self.type_mask
    }
}
