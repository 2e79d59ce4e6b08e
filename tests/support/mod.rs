// Copyright © 2025 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: Shared fixtures for P-state bring-up integration tests.
// Author: Lukas Bower
#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use gpu_pstate::config::ClkDomainConfig;
use gpu_pstate::domain::clk::{ClkDomainGroup, ClkDomainKind};
use gpu_pstate::domain::{DomainError, DomainId, DomainModule, DomainTable, SetupContext};
use perf_table::{CLOCK_ENTRY_6X_SIZE_8, HEADER_SIZE_10, VERSION_5X};

/// Module call observed by a [`Recorder`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Call {
    Software(DomainId),
    Pmu(DomainId),
    Free(DomainId),
}

/// Shared call log.
pub type CallLog = Rc<RefCell<Vec<Call>>>;

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Domain module that records every call and optionally fails one phase.
pub struct Recorder {
    id: DomainId,
    log: CallLog,
    inner: Option<Box<dyn DomainModule>>,
    fail_software: bool,
    fail_pmu: bool,
}

impl Recorder {
    pub fn new(id: DomainId, log: &CallLog) -> Self {
        Self {
            id,
            log: Rc::clone(log),
            inner: None,
            fail_software: false,
            fail_pmu: false,
        }
    }

    pub fn wrapping(inner: Box<dyn DomainModule>, log: &CallLog) -> Self {
        let mut recorder = Self::new(inner.id(), log);
        recorder.inner = Some(inner);
        recorder
    }

    pub fn failing_software(mut self) -> Self {
        self.fail_software = true;
        self
    }

    pub fn failing_pmu(mut self) -> Self {
        self.fail_pmu = true;
        self
    }
}

impl DomainModule for Recorder {
    fn id(&self) -> DomainId {
        self.id
    }

    fn software_setup(&mut self, ctx: &mut SetupContext<'_>) -> Result<(), DomainError> {
        self.log.borrow_mut().push(Call::Software(self.id));
        if self.fail_software {
            return Err(DomainError::Invalid(format!("{} injected failure", self.id)));
        }
        match self.inner.as_mut() {
            Some(inner) => inner.software_setup(ctx),
            None => Ok(()),
        }
    }

    fn pmu_setup(&mut self, ctx: &mut SetupContext<'_>) -> Result<(), DomainError> {
        self.log.borrow_mut().push(Call::Pmu(self.id));
        if self.fail_pmu {
            return Err(DomainError::Invalid(format!("{} injected failure", self.id)));
        }
        match self.inner.as_mut() {
            Some(inner) => inner.pmu_setup(ctx),
            None => Ok(()),
        }
    }

    fn free(&mut self) {
        self.log.borrow_mut().push(Call::Free(self.id));
        if let Some(inner) = self.inner.as_mut() {
            inner.free();
        }
    }
}

/// Every domain known to the sequencer, mclk included.
pub fn all_domains() -> Vec<DomainId> {
    let mut ids = DomainId::FOUNDATIONS.to_vec();
    ids.extend(DomainId::OBJECT_MODELS);
    ids.push(DomainId::ClkDomain);
    ids.push(DomainId::Mclk);
    ids
}

/// Clock-domain configuration with a single "core" domain.
pub fn core_clock() -> Vec<ClkDomainConfig> {
    vec![ClkDomainConfig {
        name: "core".to_owned(),
        api_domain: 1,
        kind: ClkDomainKind::Master,
    }]
}

/// Table of recorders for every domain; the clock-domain recorder wraps a real
/// module populated with [`core_clock`].
pub fn recording_table(log: &CallLog) -> DomainTable {
    let mut table = DomainTable::new();
    for id in all_domains() {
        let recorder = if id == DomainId::ClkDomain {
            Recorder::wrapping(Box::new(ClkDomainGroup::new(core_clock())), log)
        } else {
            Recorder::new(id, log)
        };
        table.register(Box::new(recorder));
    }
    table
}

/// Domains in the order their software setup ran.
pub fn software_calls(log: &CallLog) -> Vec<DomainId> {
    log.borrow()
        .iter()
        .filter_map(|call| match call {
            Call::Software(id) => Some(*id),
            _ => None,
        })
        .collect()
}

/// Domains in the order their PMU setup ran.
pub fn pmu_calls(log: &CallLog) -> Vec<DomainId> {
    log.borrow()
        .iter()
        .filter_map(|call| match call {
            Call::Pmu(id) => Some(*id),
            _ => None,
        })
        .collect()
}

/// Domains in the order they were freed.
pub fn free_calls(log: &CallLog) -> Vec<DomainId> {
    log.borrow()
        .iter()
        .filter_map(|call| match call {
            Call::Free(id) => Some(*id),
            _ => None,
        })
        .collect()
}

/// Performance table with one clock entry per record: `(level, nominal, min, max)`.
pub fn one_clock_table(records: &[(u8, u32, u32, u32)]) -> Vec<u8> {
    let mut bytes = vec![
        VERSION_5X,
        HEADER_SIZE_10,
        3,
        records.len() as u8,
        CLOCK_ENTRY_6X_SIZE_8,
        1,
        0,
        0,
        0,
        0,
    ];
    for &(level, nominal, min, max) in records {
        bytes.extend_from_slice(&[level, 0, 0]);
        bytes.extend_from_slice(&nominal.to_le_bytes());
        bytes.extend_from_slice(&(min | (max << 14)).to_le_bytes());
    }
    bytes
}
