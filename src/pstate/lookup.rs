// Copyright © 2025 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: Read-only P-state queries used by clock arbitration.
// Author: Lukas Bower

use crate::domain::clk::ClkWhich;
use crate::error::PerfError;

use super::{ClkSetInfo, Pstate, PstateRegistry};

impl PstateRegistry {
    /// First P-state in slot order whose ordinal is `num`.
    pub fn find(&self, num: u32) -> Result<Option<Pstate>, PerfError> {
        let objs = self.lock()?;
        Ok(objs
            .group()
            .iter()
            .map(|(_, pstate)| pstate)
            .find(|pstate| pstate.num() == num)
            .cloned())
    }

    /// Constraint for `clkwhich` at P-state `num`.
    pub fn clk_set_info(
        &self,
        num: u32,
        clkwhich: ClkWhich,
    ) -> Result<Option<ClkSetInfo>, PerfError> {
        let objs = self.lock()?;
        Ok(objs
            .group()
            .iter()
            .map(|(_, pstate)| pstate)
            .find(|pstate| pstate.num() == num)
            .and_then(|pstate| pstate.clk_set_info(clkwhich))
            .copied())
    }
}
