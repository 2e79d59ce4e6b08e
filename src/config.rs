// Copyright © 2025 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: Load capability flags and domain layout from TOML configuration.
// Author: Lukas Bower

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use bitflags::bitflags;
use serde::Deserialize;
use thiserror::Error;

use crate::domain::clk::ClkDomainKind;
use crate::domain::DomainId;

bitflags! {
    /// Capability flags resolved once before the software phase.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct PerfCaps: u32 {
        /// Virtual frequency estimator variables and equations.
        const VFE = 1 << 0;
        /// Clock VF points.
        const VF_POINT = 1 << 1;
        /// Per-clock frequency domains.
        const CLK_FREQ_DOMAIN = 1 << 2;
        /// Clock frequency controllers.
        const CLK_FREQ_CONTROLLER = 1 << 3;
        /// Power-management domains.
        const PMGR_DOMAIN = 1 << 4;
        /// Low-power gating policy.
        const LPWR_PG = 1 << 5;
        /// Performance change sequencer.
        const CHANGE_SEQ = 1 << 6;
    }
}

/// Object count used for a domain missing from `[domains]`.
pub const DEFAULT_OBJECT_COUNT: usize = 1;

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("unable to read {path}: {source}")]
    Io {
        /// Configuration path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// The TOML did not match the schema.
    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),
    /// The configuration parsed but is inconsistent.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// `[capabilities]` table.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct CapabilityConfig {
    /// See [`PerfCaps::VFE`].
    pub vfe: bool,
    /// See [`PerfCaps::VF_POINT`].
    pub vf_point: bool,
    /// See [`PerfCaps::CLK_FREQ_DOMAIN`].
    pub clk_freq_domain: bool,
    /// See [`PerfCaps::CLK_FREQ_CONTROLLER`].
    pub clk_freq_controller: bool,
    /// See [`PerfCaps::PMGR_DOMAIN`].
    pub pmgr_domain: bool,
    /// See [`PerfCaps::LPWR_PG`].
    pub lpwr_pg: bool,
    /// See [`PerfCaps::CHANGE_SEQ`].
    pub change_seq: bool,
}

impl CapabilityConfig {
    /// Flag set described by the table.
    #[must_use]
    pub fn caps(&self) -> PerfCaps {
        let mut caps = PerfCaps::empty();
        caps.set(PerfCaps::VFE, self.vfe);
        caps.set(PerfCaps::VF_POINT, self.vf_point);
        caps.set(PerfCaps::CLK_FREQ_DOMAIN, self.clk_freq_domain);
        caps.set(PerfCaps::CLK_FREQ_CONTROLLER, self.clk_freq_controller);
        caps.set(PerfCaps::PMGR_DOMAIN, self.pmgr_domain);
        caps.set(PerfCaps::LPWR_PG, self.lpwr_pg);
        caps.set(PerfCaps::CHANGE_SEQ, self.change_seq);
        caps
    }
}

/// One `[[clk_domains]]` entry. Table order is slot order.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ClkDomainConfig {
    /// Human-readable domain name.
    pub name: String,
    /// API domain identifier recorded in P-state clock entries.
    pub api_domain: u32,
    /// Programming model of the domain.
    #[serde(default)]
    pub kind: ClkDomainKind,
}

/// Full P-state subsystem configuration.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct PerfConfig {
    /// Capability flags.
    pub capabilities: CapabilityConfig,
    /// Clock domains, in the positional order the P-state table uses.
    pub clk_domains: Vec<ClkDomainConfig>,
    /// Object counts for model-only domains.
    pub domains: BTreeMap<DomainId, usize>,
    /// Whether memory-clock initialisation is available.
    pub mclk: bool,
}

impl PerfConfig {
    /// Read and validate the configuration at `path`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Parse and validate configuration text.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Capability flags.
    #[must_use]
    pub fn caps(&self) -> PerfCaps {
        self.capabilities.caps()
    }

    /// Objects to build for `id`.
    #[must_use]
    pub fn object_count(&self, id: DomainId) -> usize {
        self.domains
            .get(&id)
            .copied()
            .unwrap_or(DEFAULT_OBJECT_COUNT)
    }

    /// Reject inconsistent clock domains and misplaced object counts.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.clk_domains.len() > boardobj::E32_CAPACITY {
            return Err(ConfigError::Invalid(format!(
                "{} clock domains exceed {}",
                self.clk_domains.len(),
                boardobj::E32_CAPACITY
            )));
        }
        let mut names = BTreeSet::new();
        let mut api_domains = BTreeSet::new();
        for entry in &self.clk_domains {
            if !names.insert(entry.name.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate clock domain name {:?}",
                    entry.name
                )));
            }
            if !api_domains.insert(entry.api_domain) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate clock api_domain 0x{:x}",
                    entry.api_domain
                )));
            }
        }
        if let Some(id) = self.domains.keys().find(|id| !id.is_object_model()) {
            return Err(ConfigError::Invalid(format!(
                "domain {id} does not take an object count"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
mclk = true

[capabilities]
vfe = true
change_seq = true

[[clk_domains]]
name = "gpcclk"
api_domain = 1

[[clk_domains]]
name = "mclk"
api_domain = 2
kind = "fixed"

[domains]
volt_rail = 2
vfe_var = 12
"#;

    #[test]
    fn sample_config_parses() {
        let config = PerfConfig::from_toml_str(SAMPLE).expect("parse");
        assert_eq!(config.caps(), PerfCaps::VFE | PerfCaps::CHANGE_SEQ);
        assert_eq!(config.clk_domains.len(), 2);
        assert_eq!(config.clk_domains[1].kind, ClkDomainKind::Fixed);
        assert_eq!(config.object_count(DomainId::VfeVar), 12);
        assert_eq!(config.object_count(DomainId::VoltDev), DEFAULT_OBJECT_COUNT);
        assert!(config.mclk);
    }

    #[test]
    fn duplicate_clock_names_are_rejected() {
        let text = r#"
[[clk_domains]]
name = "core"
api_domain = 1

[[clk_domains]]
name = "core"
api_domain = 2
"#;
        assert!(matches!(
            PerfConfig::from_toml_str(text),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn foundation_domains_take_no_object_count() {
        let text = "[domains]\nclk = 3\n";
        assert!(matches!(
            PerfConfig::from_toml_str(text),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn unknown_capability_is_a_parse_error() {
        let text = "[capabilities]\nwarp_drive = true\n";
        assert!(matches!(
            PerfConfig::from_toml_str(text),
            Err(ConfigError::Parse(_))
        ));
    }
}
