// Copyright © 2025 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: Define the two-call domain module contract and the shared software model.
// Author: Lukas Bower

//! Performance domain modules.
//!
//! Each domain exposes `software_setup` (build the in-memory model, no
//! hardware traffic) and `pmu_setup` (push the model to the PMU). The
//! orchestrator owns the call order; modules only see a [`SetupContext`].

/// Clock domains.
pub mod clk;
/// Generic object-model domains.
pub mod objects;
/// Foundational unit state and the memory clock.
pub mod unit;

use core::fmt;
use std::collections::BTreeMap;

use boardobj::{BoardObjGrp, BoardObjGrpError};
use serde::Deserialize;
use thiserror::Error;

use crate::config::{PerfCaps, PerfConfig};
use crate::error::PerfError;
use crate::pmu::{PmuChannel, PmuError};

use clk::{ClkDomain, ClkDomainGroup};
use objects::ObjectDomain;
use unit::{MclkModule, PmuUnit};

/// Every performance-relevant domain known to the bring-up sequence.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DomainId {
    /// Clock unit state.
    Clk,
    /// Perf unit state.
    Perf,
    /// Thermal unit state.
    Therm,
    /// Power-management unit state.
    Pmgr,
    /// Voltage rails.
    VoltRail,
    /// Voltage devices.
    VoltDev,
    /// Voltage policies.
    VoltPolicy,
    /// Clock VIN devices.
    ClkVin,
    /// Clock FLL devices.
    ClkFll,
    /// Thermal domains.
    ThermDomain,
    /// VFE variables.
    VfeVar,
    /// VFE equations.
    VfeEqu,
    /// Clock domains.
    ClkDomain,
    /// Clock VF points.
    ClkVfPoint,
    /// Clock programming entries.
    ClkProg,
    /// Per-clock frequency domains.
    ClkFreqDomain,
    /// Power-management domains.
    PmgrDomain,
    /// Clock frequency controllers.
    ClkFreqController,
    /// Low-power gating policy.
    LpwrPg,
    /// Performance change sequencer.
    ChangeSeq,
    /// Memory clock.
    Mclk,
}

impl DomainId {
    /// Domains whose software setup allocates cross-cutting unit state.
    pub const FOUNDATIONS: [DomainId; 4] = [Self::Clk, Self::Perf, Self::Therm, Self::Pmgr];

    /// Domains backed by a generic object model.
    pub const OBJECT_MODELS: [DomainId; 15] = [
        Self::VoltRail,
        Self::VoltDev,
        Self::VoltPolicy,
        Self::ClkVin,
        Self::ClkFll,
        Self::ThermDomain,
        Self::VfeVar,
        Self::VfeEqu,
        Self::ClkVfPoint,
        Self::ClkProg,
        Self::ClkFreqDomain,
        Self::PmgrDomain,
        Self::ClkFreqController,
        Self::LpwrPg,
        Self::ChangeSeq,
    ];

    /// Name used in logs and configuration keys.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Clk => "clk",
            Self::Perf => "perf",
            Self::Therm => "therm",
            Self::Pmgr => "pmgr",
            Self::VoltRail => "volt_rail",
            Self::VoltDev => "volt_dev",
            Self::VoltPolicy => "volt_policy",
            Self::ClkVin => "clk_vin",
            Self::ClkFll => "clk_fll",
            Self::ThermDomain => "therm_domain",
            Self::VfeVar => "vfe_var",
            Self::VfeEqu => "vfe_equ",
            Self::ClkDomain => "clk_domain",
            Self::ClkVfPoint => "clk_vf_point",
            Self::ClkProg => "clk_prog",
            Self::ClkFreqDomain => "clk_freq_domain",
            Self::PmgrDomain => "pmgr_domain",
            Self::ClkFreqController => "clk_freq_controller",
            Self::LpwrPg => "lpwr_pg",
            Self::ChangeSeq => "change_seq",
            Self::Mclk => "mclk",
        }
    }

    /// Reports whether failures after this domain must free its state.
    #[must_use]
    pub fn is_foundation(self) -> bool {
        Self::FOUNDATIONS.contains(&self)
    }

    /// Reports whether the domain is built from a configured object count.
    #[must_use]
    pub fn is_object_model(self) -> bool {
        Self::OBJECT_MODELS.contains(&self)
    }
}

impl fmt::Display for DomainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Bring-up phase a call belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    /// Software model construction.
    Software,
    /// PMU programming.
    Pmu,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Software => "software",
            Self::Pmu => "pmu",
        })
    }
}

/// Domain-specific setup failures.
#[derive(Debug, Error)]
pub enum DomainError {
    /// Configuration or firmware data is inconsistent.
    #[error("{0}")]
    Invalid(String),
    /// Object group construction or insertion failed.
    #[error(transparent)]
    BoardObj(#[from] BoardObjGrpError),
    /// Unit state could not be reserved.
    #[error("unable to reserve {0} bytes of unit state")]
    Alloc(usize),
    /// `pmu_setup` ran before the software model existed.
    #[error("software model not constructed")]
    NotConstructed,
    /// The PMU rejected the domain update.
    #[error(transparent)]
    Pmu(#[from] PmuError),
}

/// Software model shared between domain modules.
#[derive(Debug)]
pub struct PerfModel {
    /// Clock domains, populated by the clock-domain module. Slot index is
    /// the positional identity used by the P-state table.
    pub clk_domains: BoardObjGrp<ClkDomain>,
}

impl PerfModel {
    /// Model with an empty clock-domain group.
    pub fn new() -> Result<Self, PerfError> {
        Ok(Self {
            clk_domains: BoardObjGrp::construct_e32()?,
        })
    }
}

/// Everything a domain module may touch during a setup call.
pub struct SetupContext<'a> {
    /// Capability flags.
    pub caps: PerfCaps,
    /// Shared software model.
    pub model: &'a mut PerfModel,
    /// PMU command channel.
    pub pmu: &'a mut dyn PmuChannel,
}

/// A performance domain driven by the orchestrator.
pub trait DomainModule {
    /// Domain the module implements.
    fn id(&self) -> DomainId;

    /// Build and validate the in-memory model. Must not talk to the PMU.
    fn software_setup(&mut self, ctx: &mut SetupContext<'_>) -> Result<(), DomainError>;

    /// Push the model to the PMU and wait for the acknowledgement.
    fn pmu_setup(&mut self, _ctx: &mut SetupContext<'_>) -> Result<(), DomainError> {
        Ok(())
    }

    /// Release state built by `software_setup`.
    fn free(&mut self) {}
}

/// Registered domain modules, keyed by domain.
#[derive(Default)]
pub struct DomainTable {
    modules: BTreeMap<DomainId, Box<dyn DomainModule>>,
}

impl fmt::Debug for DomainTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.modules.keys()).finish()
    }
}

impl DomainTable {
    /// Empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Built-in modules for every domain described by `config`.
    #[must_use]
    pub fn builtin(config: &PerfConfig) -> Self {
        let mut table = Self::new();
        for id in DomainId::FOUNDATIONS {
            table.register(Box::new(PmuUnit::new(id)));
        }
        for id in DomainId::OBJECT_MODELS {
            table.register(Box::new(ObjectDomain::new(id, config.object_count(id))));
        }
        table.register(Box::new(ClkDomainGroup::new(config.clk_domains.clone())));
        if config.mclk {
            table.register(Box::new(MclkModule::new()));
        }
        table
    }

    /// Register `module`, returning the module it replaces.
    pub fn register(&mut self, module: Box<dyn DomainModule>) -> Option<Box<dyn DomainModule>> {
        self.modules.insert(module.id(), module)
    }

    /// Remove the module for `id`.
    pub fn unregister(&mut self, id: DomainId) -> Option<Box<dyn DomainModule>> {
        self.modules.remove(&id)
    }

    /// Reports whether `id` has a module.
    #[must_use]
    pub fn contains(&self, id: DomainId) -> bool {
        self.modules.contains_key(&id)
    }

    /// Module for `id`, if registered.
    pub fn get_mut(&mut self, id: DomainId) -> Option<&mut Box<dyn DomainModule>> {
        self.modules.get_mut(&id)
    }

    /// Module for a mandatory step.
    pub fn require(&mut self, id: DomainId) -> Result<&mut Box<dyn DomainModule>, PerfError> {
        self.modules.get_mut(&id).ok_or(PerfError::MissingDomain(id))
    }
}
