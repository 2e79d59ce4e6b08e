// Copyright © 2025 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: Model the synchronous PMU command/acknowledge channel.
// Author: Lukas Bower

use core::fmt;

use boardobj::BoardObjGrpMask;
use log::trace;
use thiserror::Error;

use crate::domain::DomainId;

/// Commands that push already-configured state live on the PMU.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PmuLoad {
    /// Voltage rail/device/policy configuration.
    Volt,
    /// Clock VIN calibration.
    ClkVin,
    /// Clock domain programming.
    ClkDomains,
    /// VFE variables and equations.
    Vfe,
}

impl PmuLoad {
    /// Short identifier used in logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Volt => "VOLT",
            Self::ClkVin => "CLK_VIN",
            Self::ClkDomains => "CLK_DOMAINS",
            Self::Vfe => "VFE",
        }
    }
}

impl fmt::Display for PmuLoad {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request sent to the PMU. The wire encoding belongs to the RPC layer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PmuCommand {
    /// Replace the PMU copy of a domain's object group with the valid slots in `mask`.
    BoardObjGrpSet {
        /// Domain owning the group.
        domain: DomainId,
        /// Validity mask of the software group.
        mask: BoardObjGrpMask,
    },
    /// Program the memory clock.
    MclkInit,
    /// Push a configured subsystem live.
    Load(PmuLoad),
}

impl PmuCommand {
    /// What the command addresses, for matching and logging.
    #[must_use]
    pub fn target(&self) -> PmuTarget {
        match self {
            Self::BoardObjGrpSet { domain, .. } => PmuTarget::Domain(*domain),
            Self::MclkInit => PmuTarget::Domain(DomainId::Mclk),
            Self::Load(load) => PmuTarget::Load(*load),
        }
    }
}

/// Addressee of a [`PmuCommand`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PmuTarget {
    /// A domain's object group.
    Domain(DomainId),
    /// A load command.
    Load(PmuLoad),
}

/// Acknowledgement returned by the PMU.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PmuAck {
    /// PMU status word; zero on success.
    pub status: u32,
}

/// Failures reported by the PMU channel.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum PmuError {
    /// The PMU never reported ready.
    #[error("PMU not ready")]
    NotReady,
    /// The PMU rejected the request.
    #[error("PMU rejected request, status = {}", StatusWord(*status))]
    Nack {
        /// Status code, when the PMU supplied one.
        status: Option<u32>,
    },
    /// No acknowledgement arrived within the channel timeout.
    #[error("PMU acknowledgement timed out")]
    Timeout,
}

struct StatusWord(Option<u32>);

impl fmt::Display for StatusWord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(status) => write!(f, "0x{status:08x}"),
            None => f.write_str("none"),
        }
    }
}

/// Blocking request/acknowledge exchange with the PMU.
pub trait PmuChannel {
    /// Block until the PMU accepts requests.
    fn wait_ready(&mut self) -> Result<(), PmuError>;

    /// Send `command` and block for its acknowledgement.
    fn exchange(&mut self, command: &PmuCommand) -> Result<PmuAck, PmuError>;
}

/// In-process PMU that acknowledges and records every command.
#[derive(Debug, Clone)]
pub struct LoopbackPmu {
    ready: bool,
    commands: Vec<PmuCommand>,
    failures: Vec<(PmuTarget, u32)>,
}

impl Default for LoopbackPmu {
    fn default() -> Self {
        Self::new()
    }
}

impl LoopbackPmu {
    /// Ready channel with no injected failures.
    #[must_use]
    pub fn new() -> Self {
        Self {
            ready: true,
            commands: Vec::new(),
            failures: Vec::new(),
        }
    }

    /// Channel whose readiness handshake fails.
    #[must_use]
    pub fn not_ready() -> Self {
        Self {
            ready: false,
            ..Self::new()
        }
    }

    /// Reject every command addressed to `target` with `status`.
    #[must_use]
    pub fn fail_on(mut self, target: PmuTarget, status: u32) -> Self {
        self.failures.push((target, status));
        self
    }

    /// Commands received so far, in arrival order.
    #[must_use]
    pub fn commands(&self) -> &[PmuCommand] {
        &self.commands
    }

    /// Targets of the commands received so far.
    #[must_use]
    pub fn targets(&self) -> Vec<PmuTarget> {
        self.commands.iter().map(PmuCommand::target).collect()
    }
}

impl PmuChannel for LoopbackPmu {
    fn wait_ready(&mut self) -> Result<(), PmuError> {
        if self.ready {
            Ok(())
        } else {
            Err(PmuError::NotReady)
        }
    }

    fn exchange(&mut self, command: &PmuCommand) -> Result<PmuAck, PmuError> {
        trace!("pmu <- {command:?}");
        self.commands.push(command.clone());
        let target = command.target();
        match self.failures.iter().find(|(failing, _)| *failing == target) {
            Some((_, status)) => Err(PmuError::Nack {
                status: Some(*status),
            }),
            None => Ok(PmuAck { status: 0 }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loopback_rejects_injected_target_only() {
        let mut pmu = LoopbackPmu::new().fail_on(PmuTarget::Load(PmuLoad::Vfe), 0x1f);
        assert_eq!(
            pmu.exchange(&PmuCommand::Load(PmuLoad::Volt)),
            Ok(PmuAck { status: 0 })
        );
        assert_eq!(
            pmu.exchange(&PmuCommand::Load(PmuLoad::Vfe)),
            Err(PmuError::Nack { status: Some(0x1f) })
        );
        assert_eq!(pmu.commands().len(), 2);
    }

    #[test]
    fn nack_status_renders_as_hex_word() {
        let err = PmuError::Nack { status: Some(0x2a) };
        assert_eq!(err.to_string(), "PMU rejected request, status = 0x0000002a");
    }
}
