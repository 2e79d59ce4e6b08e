// Copyright © 2025 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: Define the error taxonomy surfaced by P-state bring-up.
// Author: Lukas Bower

use boardobj::BoardObjGrpError;
use perf_table::TableError;
use thiserror::Error;

use crate::domain::{DomainError, DomainId, Phase};
use crate::orchestrator::SupportState;
use crate::pmu::{PmuError, PmuLoad};

/// Errors returned by P-state bring-up and registry operations.
///
/// Every variant is fatal to the phase that produced it; callers treat the
/// subsystem as unusable rather than retrying mid-pipeline.
#[derive(Debug, Error)]
pub enum PerfError {
    /// A registry or its slot storage could not be created.
    #[error("allocation failed: {0}")]
    Allocation(#[source] BoardObjGrpError),
    /// The firmware performance table failed validation.
    #[error("malformed performance table: {0}")]
    MalformedTable(#[from] TableError),
    /// Double insertion or out-of-range registry index.
    #[error("board object index error: {0}")]
    Index(#[source] BoardObjGrpError),
    /// The PMU did not complete its readiness handshake.
    #[error("PMU not ready to process pstate requests: {0}")]
    PmuNotReady(#[source] PmuError),
    /// A domain module failed its setup call.
    #[error("{domain} {phase} setup failed: {source}")]
    DomainSetup {
        /// Failing domain.
        domain: DomainId,
        /// Phase the failure happened in.
        phase: Phase,
        /// Domain-specific cause.
        #[source]
        source: DomainError,
    },
    /// A PMU load command was rejected.
    #[error("failed to send {command} load command to PMU: {source}")]
    PmuCommand {
        /// Load command that failed.
        command: PmuLoad,
        /// PMU-reported cause.
        #[source]
        source: PmuError,
    },
    /// A phase entry point was called out of order.
    #[error("phase order violation: expected {expected}, found {found}")]
    PhaseOrder {
        /// State the entry point requires.
        expected: SupportState,
        /// State the subsystem is in.
        found: SupportState,
    },
    /// A mandatory step has no registered domain module.
    #[error("no module registered for mandatory domain {0}")]
    MissingDomain(DomainId),
    /// The P-state registry lock was poisoned by a panicking holder.
    #[error("pstate registry lock poisoned")]
    LockPoisoned,
}

impl From<BoardObjGrpError> for PerfError {
    fn from(err: BoardObjGrpError) -> Self {
        match err {
            BoardObjGrpError::Allocation { .. } => Self::Allocation(err),
            BoardObjGrpError::IndexOutOfRange { .. } | BoardObjGrpError::Occupied { .. } => {
                Self::Index(err)
            }
        }
    }
}
