// Copyright © 2025 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: Scope guard that frees foundational domain state on a failed software phase.
// Author: Lukas Bower

use heapless::Vec;
use log::warn;

use crate::domain::{DomainId, DomainTable};

/// Frees every registered foundational domain, newest first, unless committed.
pub(super) struct UnwindGuard<'a> {
    domains: &'a mut DomainTable,
    registered: Vec<DomainId, 4>,
    armed: bool,
}

impl<'a> UnwindGuard<'a> {
    pub(super) fn new(domains: &'a mut DomainTable) -> Self {
        Self {
            domains,
            registered: Vec::new(),
            armed: true,
        }
    }

    pub(super) fn table(&mut self) -> &mut DomainTable {
        &mut *self.domains
    }

    /// Record that `id` now owns state to release on failure. Only the four
    /// foundational domains are tracked.
    pub(super) fn register(&mut self, id: DomainId) {
        if id.is_foundation() && !self.registered.contains(&id) {
            let _ = self.registered.push(id);
        }
    }

    pub(super) fn commit(mut self) {
        self.armed = false;
    }
}

impl Drop for UnwindGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        while let Some(id) = self.registered.pop() {
            warn!("pstate: unwinding {id}");
            if let Some(module) = self.domains.get_mut(id) {
                module.free();
            }
        }
    }
}
