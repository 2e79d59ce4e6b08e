// Copyright © 2025 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: Fixed dependency order of both bring-up phases.
// Author: Lukas Bower

use crate::config::PerfCaps;
use crate::domain::DomainId;
use crate::pmu::PmuLoad;

/// A step that only runs when every capability in `requires` is enabled.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Gated<S> {
    /// Step to run.
    pub step: S,
    /// Capabilities the step depends on.
    pub requires: PerfCaps,
}

impl<S> Gated<S> {
    const fn always(step: S) -> Self {
        Self {
            step,
            requires: PerfCaps::empty(),
        }
    }

    const fn when(requires: PerfCaps, step: S) -> Self {
        Self { step, requires }
    }

    /// Reports whether `caps` enables the step.
    #[must_use]
    pub fn enabled(&self, caps: PerfCaps) -> bool {
        caps.contains(self.requires)
    }
}

/// Step of the software phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SoftwareStep {
    /// `software_setup` of a domain module.
    Domain(DomainId),
    /// Firmware P-state table decode.
    PstateTable,
}

/// Step of the PMU phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PmuStep {
    /// `pmu_setup` whose failure is logged and ignored; skipped when the
    /// module is not registered.
    BestEffort(DomainId),
    /// Mandatory `pmu_setup`.
    Domain(DomainId),
    /// Load command pushing configured state live.
    Load(PmuLoad),
}

const VFE_AND_VF_POINT: PerfCaps = PerfCaps::VFE.union(PerfCaps::VF_POINT);

/// Software phase order. Clock domains precede the table decode because
/// P-state clock entries resolve against them by position.
pub const SOFTWARE_SEQUENCE: &[Gated<SoftwareStep>] = &[
    Gated::always(SoftwareStep::Domain(DomainId::Clk)),
    Gated::always(SoftwareStep::Domain(DomainId::Perf)),
    Gated::always(SoftwareStep::Domain(DomainId::Therm)),
    Gated::always(SoftwareStep::Domain(DomainId::Pmgr)),
    Gated::always(SoftwareStep::Domain(DomainId::VoltRail)),
    Gated::always(SoftwareStep::Domain(DomainId::VoltDev)),
    Gated::always(SoftwareStep::Domain(DomainId::VoltPolicy)),
    Gated::always(SoftwareStep::Domain(DomainId::ClkVin)),
    Gated::always(SoftwareStep::Domain(DomainId::ClkFll)),
    Gated::always(SoftwareStep::Domain(DomainId::ThermDomain)),
    Gated::when(PerfCaps::VFE, SoftwareStep::Domain(DomainId::VfeVar)),
    Gated::when(PerfCaps::VFE, SoftwareStep::Domain(DomainId::VfeEqu)),
    Gated::always(SoftwareStep::Domain(DomainId::ClkDomain)),
    Gated::when(VFE_AND_VF_POINT, SoftwareStep::Domain(DomainId::ClkVfPoint)),
    Gated::always(SoftwareStep::Domain(DomainId::ClkProg)),
    Gated::when(
        PerfCaps::CLK_FREQ_DOMAIN,
        SoftwareStep::Domain(DomainId::ClkFreqDomain),
    ),
    Gated::always(SoftwareStep::PstateTable),
    Gated::when(
        PerfCaps::PMGR_DOMAIN,
        SoftwareStep::Domain(DomainId::PmgrDomain),
    ),
    Gated::when(
        PerfCaps::CLK_FREQ_CONTROLLER,
        SoftwareStep::Domain(DomainId::ClkFreqController),
    ),
    Gated::when(PerfCaps::LPWR_PG, SoftwareStep::Domain(DomainId::LpwrPg)),
    Gated::when(PerfCaps::CHANGE_SEQ, SoftwareStep::Domain(DomainId::ChangeSeq)),
];

/// PMU phase order.
pub const PMU_SEQUENCE: &[Gated<PmuStep>] = &[
    Gated::always(PmuStep::BestEffort(DomainId::Mclk)),
    Gated::always(PmuStep::Domain(DomainId::VoltRail)),
    Gated::always(PmuStep::Domain(DomainId::VoltDev)),
    Gated::always(PmuStep::Domain(DomainId::VoltPolicy)),
    Gated::always(PmuStep::Load(PmuLoad::Volt)),
    Gated::always(PmuStep::Domain(DomainId::ThermDomain)),
    Gated::when(PerfCaps::VFE, PmuStep::Domain(DomainId::VfeVar)),
    Gated::when(PerfCaps::VFE, PmuStep::Domain(DomainId::VfeEqu)),
    Gated::always(PmuStep::Domain(DomainId::ClkDomain)),
    Gated::always(PmuStep::Domain(DomainId::ClkProg)),
    Gated::always(PmuStep::Domain(DomainId::ClkVin)),
    Gated::when(
        PerfCaps::CLK_FREQ_DOMAIN,
        PmuStep::Domain(DomainId::ClkFreqDomain),
    ),
    Gated::always(PmuStep::Domain(DomainId::ClkFll)),
    Gated::when(
        PerfCaps::CLK_FREQ_CONTROLLER,
        PmuStep::Domain(DomainId::ClkFreqController),
    ),
    Gated::when(VFE_AND_VF_POINT, PmuStep::Domain(DomainId::ClkVfPoint)),
    Gated::always(PmuStep::Load(PmuLoad::ClkVin)),
    Gated::when(PerfCaps::CLK_FREQ_DOMAIN, PmuStep::Load(PmuLoad::ClkDomains)),
    Gated::when(PerfCaps::PMGR_DOMAIN, PmuStep::Domain(DomainId::PmgrDomain)),
    Gated::when(PerfCaps::CHANGE_SEQ, PmuStep::Domain(DomainId::ChangeSeq)),
    Gated::when(PerfCaps::VFE, PmuStep::Load(PmuLoad::Vfe)),
];
