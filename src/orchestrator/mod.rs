// Copyright © 2025 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: Drive the two-phase P-state bring-up and final teardown.
// Author: Lukas Bower

//! Two-phase bring-up.
//!
//! [`PstateSupport::software_phase`] builds the software model and decodes
//! the P-state table; [`PstateSupport::pmu_setup_phase`] pushes the model to
//! the PMU. A failed software phase frees the foundational domains it had
//! set up, newest first. A failed PMU phase rolls nothing back.

mod sequence;
mod unwind;

pub use sequence::{Gated, PmuStep, SoftwareStep, PMU_SEQUENCE, SOFTWARE_SEQUENCE};

use core::fmt;

use log::{debug, error, info, warn};

use crate::bios::BiosImage;
use crate::config::{PerfCaps, PerfConfig};
use crate::domain::clk::{self, ClkWhich};
use crate::domain::{DomainError, DomainId, DomainTable, PerfModel, Phase, SetupContext};
use crate::error::PerfError;
use crate::pmu::{PmuChannel, PmuCommand};
use crate::pstate::{self, ClkSetInfo, Pstate, PstateRegistry};

use unwind::UnwindGuard;

/// Domains released by [`PstateSupport::deinit`], in order.
const TEARDOWN_ORDER: [DomainId; 5] = [
    DomainId::Pmgr,
    DomainId::Therm,
    DomainId::Perf,
    DomainId::Clk,
    DomainId::Mclk,
];

/// Lifecycle of the P-state subsystem.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SupportState {
    /// Nothing has run yet.
    Uninitialized,
    /// The software phase completed.
    SoftwareReady,
    /// Both phases completed.
    PmuReady,
    /// A phase failed; the subsystem is unusable.
    Failed,
    /// Final teardown ran.
    TornDown,
}

impl SupportState {
    /// Short identifier used in logs and errors.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Uninitialized => "uninitialized",
            Self::SoftwareReady => "software-ready",
            Self::PmuReady => "pmu-ready",
            Self::Failed => "failed",
            Self::TornDown => "torn-down",
        }
    }
}

impl fmt::Display for SupportState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// P-state subsystem state owned by its device.
pub struct PstateSupport<P: PmuChannel, B: BiosImage> {
    caps: PerfCaps,
    domains: DomainTable,
    model: PerfModel,
    pstates: Option<PstateRegistry>,
    pmu: P,
    bios: B,
    state: SupportState,
}

impl<P: PmuChannel, B: BiosImage> fmt::Debug for PstateSupport<P, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PstateSupport")
            .field("caps", &self.caps)
            .field("domains", &self.domains)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl<P: PmuChannel, B: BiosImage> PstateSupport<P, B> {
    /// Subsystem driving `domains` with capabilities fixed at `caps`.
    pub fn new(caps: PerfCaps, domains: DomainTable, pmu: P, bios: B) -> Result<Self, PerfError> {
        Ok(Self {
            caps,
            domains,
            model: PerfModel::new()?,
            pstates: None,
            pmu,
            bios,
            state: SupportState::Uninitialized,
        })
    }

    /// Subsystem with the built-in modules described by `config`.
    pub fn from_config(config: &PerfConfig, pmu: P, bios: B) -> Result<Self, PerfError> {
        Self::new(config.caps(), DomainTable::builtin(config), pmu, bios)
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> SupportState {
        self.state
    }

    /// Capability flags.
    #[must_use]
    pub fn caps(&self) -> PerfCaps {
        self.caps
    }

    /// Shared software model.
    #[must_use]
    pub fn model(&self) -> &PerfModel {
        &self.model
    }

    /// Decoded P-state registry, once the software phase built it.
    #[must_use]
    pub fn pstates(&self) -> Option<&PstateRegistry> {
        self.pstates.as_ref()
    }

    /// PMU channel.
    #[must_use]
    pub fn pmu(&self) -> &P {
        &self.pmu
    }

    /// Mutable PMU channel.
    pub fn pmu_mut(&mut self) -> &mut P {
        &mut self.pmu
    }

    /// Firmware image.
    #[must_use]
    pub fn bios(&self) -> &B {
        &self.bios
    }

    fn expect_state(&self, expected: SupportState) -> Result<(), PerfError> {
        if self.state == expected {
            Ok(())
        } else {
            Err(PerfError::PhaseOrder {
                expected,
                found: self.state,
            })
        }
    }

    /// Build the software model and decode the P-state table.
    pub fn software_phase(&mut self) -> Result<(), PerfError> {
        self.expect_state(SupportState::Uninitialized)?;
        info!("pstate: software phase start (caps {:?})", self.caps);
        match self.run_software() {
            Ok(()) => {
                self.state = SupportState::SoftwareReady;
                info!("pstate: software phase complete");
                Ok(())
            }
            Err(err) => {
                self.state = SupportState::Failed;
                error!("pstate: software phase failed: {err}");
                Err(err)
            }
        }
    }

    fn run_software(&mut self) -> Result<(), PerfError> {
        let Self {
            caps,
            domains,
            model,
            pstates,
            pmu,
            bios,
            ..
        } = self;
        let caps = *caps;

        pmu.wait_ready().map_err(PerfError::PmuNotReady)?;

        let mut guard = UnwindGuard::new(domains);
        for gated in SOFTWARE_SEQUENCE {
            if !gated.enabled(caps) {
                debug!("pstate: skip {:?}", gated.step);
                continue;
            }
            match gated.step {
                SoftwareStep::Domain(id) => {
                    debug!("pstate: {id} software setup");
                    let module = guard.table().require(id)?;
                    let mut ctx = SetupContext {
                        caps,
                        model: &mut *model,
                        pmu: &mut *pmu,
                    };
                    module
                        .software_setup(&mut ctx)
                        .map_err(|source| setup_error(id, Phase::Software, source))?;
                    guard.register(id);
                }
                SoftwareStep::PstateTable => {
                    debug!("pstate: decode performance table");
                    *pstates = Some(pstate::pstate_sw_setup(&*bios, &model.clk_domains)?);
                }
            }
        }
        guard.commit();
        Ok(())
    }

    /// Push the software model to the PMU. Nothing is rolled back on failure.
    pub fn pmu_setup_phase(&mut self) -> Result<(), PerfError> {
        self.expect_state(SupportState::SoftwareReady)?;
        info!("pstate: pmu phase start");
        match self.run_pmu() {
            Ok(()) => {
                self.state = SupportState::PmuReady;
                info!("pstate: pmu phase complete");
                Ok(())
            }
            Err(err) => {
                self.state = SupportState::Failed;
                error!("pstate: pmu phase failed: {err}");
                Err(err)
            }
        }
    }

    fn run_pmu(&mut self) -> Result<(), PerfError> {
        let Self {
            caps,
            domains,
            model,
            pmu,
            ..
        } = self;
        let caps = *caps;

        for gated in PMU_SEQUENCE {
            if !gated.enabled(caps) {
                debug!("pstate: skip {:?}", gated.step);
                continue;
            }
            match gated.step {
                PmuStep::BestEffort(id) => {
                    let Some(module) = domains.get_mut(id) else {
                        debug!("pstate: {id} not present");
                        continue;
                    };
                    let mut ctx = SetupContext {
                        caps,
                        model: &mut *model,
                        pmu: &mut *pmu,
                    };
                    if let Err(err) = module.pmu_setup(&mut ctx) {
                        warn!("pstate: {id} pmu setup failed, continuing: {err}");
                    }
                }
                PmuStep::Domain(id) => {
                    debug!("pstate: {id} pmu setup");
                    let module = domains.require(id)?;
                    let mut ctx = SetupContext {
                        caps,
                        model: &mut *model,
                        pmu: &mut *pmu,
                    };
                    module
                        .pmu_setup(&mut ctx)
                        .map_err(|source| setup_error(id, Phase::Pmu, source))?;
                }
                PmuStep::Load(load) => {
                    debug!("pstate: load {load}");
                    pmu.exchange(&PmuCommand::Load(load))
                        .map_err(|source| PerfError::PmuCommand {
                            command: load,
                            source,
                        })?;
                }
            }
        }
        Ok(())
    }

    /// Final teardown: release unit state, deinit the memory clock and
    /// destroy the P-state registry.
    pub fn deinit(&mut self) {
        for id in TEARDOWN_ORDER {
            if let Some(module) = self.domains.get_mut(id) {
                module.free();
            }
        }
        if let Some(registry) = self.pstates.take() {
            registry.destroy();
        }
        self.state = SupportState::TornDown;
        info!("pstate: torn down");
    }

    /// P-state with ordinal `num`; `None` before the table is decoded.
    pub fn find_pstate(&self, num: u32) -> Result<Option<Pstate>, PerfError> {
        match &self.pstates {
            Some(registry) => registry.find(num),
            None => Ok(None),
        }
    }

    /// Constraint for `clkwhich` at P-state `num`.
    pub fn clk_set_info(
        &self,
        num: u32,
        clkwhich: ClkWhich,
    ) -> Result<Option<ClkSetInfo>, PerfError> {
        match &self.pstates {
            Some(registry) => registry.clk_set_info(num, clkwhich),
            None => Ok(None),
        }
    }

    /// Constraint for the clock domain named `name` at P-state `num`.
    pub fn clk_set_info_by_name(
        &self,
        num: u32,
        name: &str,
    ) -> Result<Option<ClkSetInfo>, PerfError> {
        match clk::find_by_name(&self.model.clk_domains, name) {
            Some((_, clkwhich)) => self.clk_set_info(num, clkwhich),
            None => Ok(None),
        }
    }
}

fn setup_error(domain: DomainId, phase: Phase, source: DomainError) -> PerfError {
    PerfError::DomainSetup {
        domain,
        phase,
        source,
    }
}
