// Copyright © 2025 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: Lock-guarded P-state object group with its change notifier.
// Author: Lukas Bower

use std::sync::{Condvar, Mutex, MutexGuard};

use boardobj::BoardObjGrp;
use log::{debug, info};

use crate::error::PerfError;

use super::Pstate;

/// Registry contents guarded by the [`PstateRegistry`] lock.
#[derive(Debug)]
pub struct PstateObjs {
    grp: BoardObjGrp<Pstate>,
    num_levels: usize,
}

impl PstateObjs {
    /// Insert `pstate` at record `index`, counting the level on success.
    pub fn insert(&mut self, pstate: Pstate, index: usize) -> Result<(), PerfError> {
        self.grp.insert(pstate, index)?;
        self.num_levels += 1;
        Ok(())
    }

    /// Underlying object group.
    #[must_use]
    pub fn group(&self) -> &BoardObjGrp<Pstate> {
        &self.grp
    }

    /// Levels inserted so far.
    #[must_use]
    pub fn num_levels(&self) -> usize {
        self.num_levels
    }
}

/// P-state registry shared with later clock arbitration.
///
/// The notifier is created with the lock and is reserved for runtime
/// P-state transitions; nothing in bring-up signals it.
#[derive(Debug)]
pub struct PstateRegistry {
    objs: Mutex<PstateObjs>,
    notifier: Condvar,
}

impl PstateRegistry {
    /// Allocate an empty fixed-size registry.
    pub fn construct() -> Result<Self, PerfError> {
        let grp = BoardObjGrp::construct_e32()?;
        debug!("pstate registry constructed ({} slots)", grp.capacity());
        Ok(Self {
            objs: Mutex::new(PstateObjs { grp, num_levels: 0 }),
            notifier: Condvar::new(),
        })
    }

    /// Take the registry lock.
    pub fn lock(&self) -> Result<MutexGuard<'_, PstateObjs>, PerfError> {
        self.objs.lock().map_err(|_| PerfError::LockPoisoned)
    }

    /// Levels inserted so far.
    pub fn num_levels(&self) -> Result<usize, PerfError> {
        Ok(self.lock()?.num_levels)
    }

    /// Clone of every stored P-state in slot order.
    pub fn snapshot(&self) -> Result<Vec<(usize, Pstate)>, PerfError> {
        let objs = self.lock()?;
        Ok(objs
            .grp
            .iter()
            .map(|(index, pstate)| (index, pstate.clone()))
            .collect())
    }

    /// Change notifier paired with the registry lock.
    #[must_use]
    pub fn notifier(&self) -> &Condvar {
        &self.notifier
    }

    /// Tear down the registry together with its lock and notifier.
    pub fn destroy(self) {
        let mut objs = match self.objs.into_inner() {
            Ok(objs) => objs,
            Err(poisoned) => poisoned.into_inner(),
        };
        let levels = objs.num_levels;
        objs.grp.clear();
        info!("pstate registry destroyed ({levels} levels)");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pstate::ClkSetInfoList;

    #[test]
    fn insert_counts_levels_and_rejects_duplicates() {
        let registry = PstateRegistry::construct().expect("registry");
        {
            let mut objs = registry.lock().expect("lock");
            objs.insert(Pstate::construct_3x(0, ClkSetInfoList::new(), 0), 0)
                .expect("first");
            assert!(matches!(
                objs.insert(Pstate::construct_3x(1, ClkSetInfoList::new(), 0), 0),
                Err(PerfError::Index(_))
            ));
        }
        assert_eq!(registry.num_levels().expect("levels"), 1);
        assert_eq!(registry.snapshot().expect("snapshot").len(), 1);
        registry.destroy();
    }
}
