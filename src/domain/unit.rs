// Copyright © 2025 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: Foundational unit-state modules and the best-effort memory clock.
// Author: Lukas Bower

use log::debug;

use crate::pmu::PmuCommand;

use super::{DomainError, DomainId, DomainModule, SetupContext};

/// Bytes of cross-cutting state reserved by each foundational unit.
pub const UNIT_STATE_BYTES: usize = 4096;

/// Foundational unit (clock, perf, thermal, pmgr) owning per-unit state
/// that later domains rely on. Its state lives until `free`.
#[derive(Debug)]
pub struct PmuUnit {
    id: DomainId,
    state: Option<Vec<u8>>,
}

impl PmuUnit {
    /// Unit module for `id`.
    #[must_use]
    pub fn new(id: DomainId) -> Self {
        Self { id, state: None }
    }

    /// Reports whether the unit currently holds its state.
    #[must_use]
    pub fn is_allocated(&self) -> bool {
        self.state.is_some()
    }
}

impl DomainModule for PmuUnit {
    fn id(&self) -> DomainId {
        self.id
    }

    fn software_setup(&mut self, _ctx: &mut SetupContext<'_>) -> Result<(), DomainError> {
        let mut state = Vec::new();
        state
            .try_reserve_exact(UNIT_STATE_BYTES)
            .map_err(|_| DomainError::Alloc(UNIT_STATE_BYTES))?;
        state.resize(UNIT_STATE_BYTES, 0);
        self.state = Some(state);
        debug!("{}: unit state reserved", self.id);
        Ok(())
    }

    fn free(&mut self) {
        if self.state.take().is_some() {
            debug!("{}: unit state freed", self.id);
        }
    }
}

/// Memory-clock module. Its PMU setup is the one best-effort step.
#[derive(Debug, Default)]
pub struct MclkModule {
    initialised: bool,
    deinits: u32,
}

impl MclkModule {
    /// Uninitialised memory clock.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reports whether the last PMU init was acknowledged.
    #[must_use]
    pub fn is_initialised(&self) -> bool {
        self.initialised
    }

    /// Number of deinit calls issued by `free`.
    #[must_use]
    pub fn deinit_count(&self) -> u32 {
        self.deinits
    }
}

impl DomainModule for MclkModule {
    fn id(&self) -> DomainId {
        DomainId::Mclk
    }

    fn software_setup(&mut self, _ctx: &mut SetupContext<'_>) -> Result<(), DomainError> {
        Ok(())
    }

    fn pmu_setup(&mut self, ctx: &mut SetupContext<'_>) -> Result<(), DomainError> {
        ctx.pmu.exchange(&PmuCommand::MclkInit)?;
        self.initialised = true;
        Ok(())
    }

    // Deinit runs whether or not the init was acknowledged.
    fn free(&mut self) {
        debug!("mclk: deinit (initialised: {})", self.initialised);
        self.initialised = false;
        self.deinits = self.deinits.saturating_add(1);
    }
}
