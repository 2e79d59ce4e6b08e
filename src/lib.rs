// Copyright © 2025 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: Root library for GPU P-state discovery and PMU bring-up.
// Author: Lukas Bower
#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! GPU performance-state coordination.
//!
//! Builds the software model of the performance domains (clocks, voltage,
//! thermal, power gating), decodes the firmware P-state table into a
//! [`PstateRegistry`], then pushes the model to the PMU in a fixed
//! dependency order. See [`PstateSupport`] for the two-phase bring-up.

/// Firmware image access.
pub mod bios;
/// Capability flags and TOML configuration.
pub mod config;
/// Performance domain modules and the shared software model.
pub mod domain;
/// Top-level error taxonomy.
pub mod error;
/// Two-phase bring-up sequencing.
pub mod orchestrator;
/// PMU command channel.
pub mod pmu;
/// P-state objects, registry, table decode and lookups.
pub mod pstate;

pub use bios::BiosImage;
pub use config::{PerfCaps, PerfConfig};
pub use domain::{DomainId, DomainModule, DomainTable, Phase, SetupContext};
pub use error::PerfError;
pub use orchestrator::{PstateSupport, SupportState};
pub use pmu::{LoopbackPmu, PmuChannel, PmuCommand, PmuLoad};
pub use pstate::{ClkSetInfo, Pstate, PstateRegistry};
