// Copyright © 2025 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: Clock-domain board objects and the module that populates them.
// Author: Lukas Bower

use core::fmt;

use boardobj::{BoardObj, BoardObjGrp, BoardObjType, TypeMask, BOARDOBJ_TYPE_SUPER};
use log::debug;
use serde::Deserialize;

use crate::config::ClkDomainConfig;
use crate::pmu::PmuCommand;

use super::{DomainError, DomainId, DomainModule, SetupContext};

/// API clock-domain identifier carried by P-state clock entries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClkWhich(pub u32);

impl fmt::Display for ClkWhich {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:x}", self.0)
    }
}

/// Programming model of a clock domain.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClkDomainKind {
    /// Frequency fixed by firmware.
    Fixed,
    /// Independently programmable domain.
    #[default]
    Master,
    /// Domain following a master.
    Slave,
}

impl ClkDomainKind {
    /// Board object type tag of the kind.
    #[must_use]
    pub const fn type_tag(self) -> BoardObjType {
        match self {
            Self::Fixed => 1,
            Self::Master => 2,
            Self::Slave => 3,
        }
    }
}

/// One clock domain in the clock-domain group.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClkDomain {
    name: String,
    domain: ClkWhich,
    kind: ClkDomainKind,
}

impl ClkDomain {
    /// Clock domain named `name` exposed as `domain`.
    #[must_use]
    pub fn new(name: impl Into<String>, domain: ClkWhich, kind: ClkDomainKind) -> Self {
        Self {
            name: name.into(),
            domain,
            kind,
        }
    }

    /// Human-readable name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// API domain identifier.
    #[must_use]
    pub fn domain(&self) -> ClkWhich {
        self.domain
    }

    /// Programming model.
    #[must_use]
    pub fn kind(&self) -> ClkDomainKind {
        self.kind
    }
}

impl BoardObj for ClkDomain {
    fn obj_type(&self) -> BoardObjType {
        self.kind.type_tag()
    }

    fn type_mask(&self) -> TypeMask {
        TypeMask::of(BOARDOBJ_TYPE_SUPER).with(self.kind.type_tag())
    }
}

/// Slot index of the clock domain named `name`.
#[must_use]
pub fn find_by_name(group: &BoardObjGrp<ClkDomain>, name: &str) -> Option<(usize, ClkWhich)> {
    group
        .iter()
        .find(|(_, domain)| domain.name() == name)
        .map(|(index, domain)| (index, domain.domain()))
}

/// Builds the clock-domain group from configuration in table order.
#[derive(Debug)]
pub struct ClkDomainGroup {
    entries: Vec<ClkDomainConfig>,
    constructed: bool,
}

impl ClkDomainGroup {
    /// Module that will publish `entries`.
    #[must_use]
    pub fn new(entries: Vec<ClkDomainConfig>) -> Self {
        Self {
            entries,
            constructed: false,
        }
    }
}

impl DomainModule for ClkDomainGroup {
    fn id(&self) -> DomainId {
        DomainId::ClkDomain
    }

    fn software_setup(&mut self, ctx: &mut SetupContext<'_>) -> Result<(), DomainError> {
        let group = &mut ctx.model.clk_domains;
        group.clear();
        for (index, entry) in self.entries.iter().enumerate() {
            let domain = ClkDomain::new(entry.name.clone(), ClkWhich(entry.api_domain), entry.kind);
            debug!(
                "clk domain {index}: {} api={} kind={:?}",
                domain.name(),
                domain.domain(),
                domain.kind()
            );
            group.insert(domain, index)?;
        }
        self.constructed = true;
        Ok(())
    }

    fn pmu_setup(&mut self, ctx: &mut SetupContext<'_>) -> Result<(), DomainError> {
        if !self.constructed {
            return Err(DomainError::NotConstructed);
        }
        let command = PmuCommand::BoardObjGrpSet {
            domain: DomainId::ClkDomain,
            mask: ctx.model.clk_domains.mask().clone(),
        };
        ctx.pmu.exchange(&command)?;
        Ok(())
    }

    fn free(&mut self) {
        self.constructed = false;
    }
}
