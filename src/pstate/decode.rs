// Copyright © 2025 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: Decode the firmware performance table into the P-state registry.
// Author: Lukas Bower

use boardobj::BoardObjGrp;
use log::{debug, error, info};
use perf_table::{PerfTable, TableError};

use crate::bios::BiosImage;
use crate::domain::clk::ClkDomain;
use crate::error::PerfError;

use super::{ClkSetInfo, ClkSetInfoList, Pstate, PstateRegistry};

/// Decode `bytes` into `registry`, returning the number of P-states added.
///
/// The header is validated before the registry lock is taken, so a rejected
/// table leaves the registry untouched. Clock entry `n` of every record
/// binds to slot `n` of `clk_domains`. A failure part-way through leaves
/// the levels already inserted in place.
pub fn load_table(
    registry: &PstateRegistry,
    bytes: &[u8],
    clk_domains: &BoardObjGrp<ClkDomain>,
) -> Result<usize, PerfError> {
    let table = PerfTable::parse(bytes)?;
    let header = table.header();
    debug!(
        "perf table v0x{:02x}: {} entries of {}+{}x{} bytes",
        header.version,
        header.base_entry_count,
        header.base_entry_size,
        header.clock_entry_count,
        header.clock_entry_size
    );

    let mut objs = registry.lock()?;
    let mut added = 0;
    for (index, entry) in table.entries() {
        if entry.is_skip() {
            debug!("perf entry {index}: skipped");
            continue;
        }
        let num = entry.pstate_num().ok_or(TableError::InvalidLevel {
            index,
            level: entry.level(),
        })?;

        let mut clklist = ClkSetInfoList::new();
        for (clkidx, clock) in entry.clocks().enumerate() {
            let domain = clk_domains
                .get(clkidx)
                .ok_or(TableError::ClockDomainOutOfRange {
                    index,
                    clock: clkidx,
                })?;
            let info = ClkSetInfo {
                clkwhich: domain.domain(),
                nominal_mhz: clock.nominal_mhz(),
                min_mhz: clock.min_mhz(),
                max_mhz: clock.max_mhz(),
            };
            debug!(
                "P{num} {}: nominal {} MHz, min {} MHz, max {} MHz",
                domain.name(),
                info.nominal_mhz,
                info.min_mhz,
                info.max_mhz
            );
            // Validated header bounds the clock count by the list capacity.
            clklist
                .push(info)
                .map_err(|_| TableError::TooManyClockEntries(header.clock_entry_count))?;
        }

        let pstate = Pstate::construct_3x(num, clklist, entry.lpwr_entry_idx());
        objs.insert(pstate, index)?;
        added += 1;
        info!("P{num} decoded from perf entry {index}");
    }
    Ok(added)
}

/// Build the P-state registry from the firmware image.
///
/// The registry is destroyed again if the table is missing or fails to
/// decode.
pub fn pstate_sw_setup<B: BiosImage + ?Sized>(
    bios: &B,
    clk_domains: &BoardObjGrp<ClkDomain>,
) -> Result<PstateRegistry, PerfError> {
    let registry = PstateRegistry::construct()?;
    let decoded = match bios.perf_table() {
        Some(bytes) => load_table(&registry, bytes, clk_domains),
        None => Err(TableError::Missing.into()),
    };
    match decoded {
        Ok(levels) => {
            info!("pstate table decoded: {levels} levels");
            Ok(registry)
        }
        Err(err) => {
            error!("pstate table decode failed: {err}");
            registry.destroy();
            Err(err)
        }
    }
}
