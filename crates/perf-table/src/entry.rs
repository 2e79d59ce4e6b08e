// Copyright © 2025 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: Walk performance table records and extract clock bit-fields.
// Author: Lukas Bower

use crate::{PerfTableHeader, MAX_PSTATE_LEVEL, PERFLEVEL_SKIP_ENTRY};

const NOM_FREQ_MHZ_MASK: u32 = 0x0000_3fff;
const MIN_FREQ_MHZ_MASK: u32 = 0x0000_3fff;
const MAX_FREQ_MHZ_MASK: u32 = 0x0fff_c000;
const MAX_FREQ_MHZ_SHIFT: u32 = 14;

/// Iterator over `(record index, record)` pairs.
#[derive(Debug, Clone)]
pub struct Entries<'a> {
    header: PerfTableHeader,
    area: &'a [u8],
    next: usize,
}

impl<'a> Entries<'a> {
    /// `area` starts at the first record and ends where the last clock
    /// sub-record's `param1` read ends.
    pub(crate) fn new(header: PerfTableHeader, area: &'a [u8]) -> Self {
        Self {
            header,
            area,
            next: 0,
        }
    }
}

impl<'a> Iterator for Entries<'a> {
    type Item = (usize, PerfEntry<'a>);

    fn next(&mut self) -> Option<Self::Item> {
        let index = self.next;
        if index >= usize::from(self.header.base_entry_count) {
            return None;
        }
        let tail = self.area.get(index * self.header.entry_stride()..)?;
        self.next += 1;
        Some((
            index,
            PerfEntry {
                header: self.header,
                tail,
            },
        ))
    }
}

/// One performance level record.
#[derive(Debug, Clone, Copy)]
pub struct PerfEntry<'a> {
    header: PerfTableHeader,
    // Record bytes followed by everything after it in the readable area.
    tail: &'a [u8],
}

impl<'a> PerfEntry<'a> {
    fn byte(&self, offset: usize) -> u8 {
        self.tail.get(offset).copied().unwrap_or(0)
    }

    /// Raw level byte.
    #[must_use]
    pub fn level(&self) -> u8 {
        self.byte(0)
    }

    /// Reports whether the record is the skip sentinel.
    #[must_use]
    pub fn is_skip(&self) -> bool {
        self.level() == PERFLEVEL_SKIP_ENTRY
    }

    /// P-state ordinal (`15 - level`), or `None` for levels outside `[0, 15]`.
    #[must_use]
    pub fn pstate_num(&self) -> Option<u32> {
        let level = self.level();
        (level <= MAX_PSTATE_LEVEL).then(|| u32::from(MAX_PSTATE_LEVEL - level))
    }

    /// Per-record flags.
    #[must_use]
    pub fn flags0(&self) -> u8 {
        self.byte(1)
    }

    /// Index into the low-power policy table; zero when the base entry omits it.
    #[must_use]
    pub fn lpwr_entry_idx(&self) -> u8 {
        if usize::from(self.header.base_entry_size) > 2 {
            self.byte(2)
        } else {
            0
        }
    }

    /// Clock sub-records in table order.
    #[must_use]
    pub fn clocks(&self) -> ClockEntries<'a> {
        let base = usize::from(self.header.base_entry_size);
        ClockEntries {
            tail: self.tail.get(base..).unwrap_or(&[]),
            size: usize::from(self.header.clock_entry_size),
            remaining: usize::from(self.header.clock_entry_count),
        }
    }
}

/// Iterator over the clock sub-records of one record.
#[derive(Debug, Clone)]
pub struct ClockEntries<'a> {
    tail: &'a [u8],
    size: usize,
    remaining: usize,
}

impl Iterator for ClockEntries<'_> {
    type Item = ClockEntry;

    fn next(&mut self) -> Option<ClockEntry> {
        if self.remaining == 0 {
            return None;
        }
        let entry = ClockEntry::from_bytes(self.tail);
        self.tail = self.tail.get(self.size..).unwrap_or(&[]);
        self.remaining -= 1;
        Some(entry)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for ClockEntries<'_> {}

/// Raw clock programming parameters of one clock sub-record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockEntry {
    /// First parameter word.
    pub param0: u32,
    /// Second parameter word, read at sub-record offset 4. With 6-byte
    /// sub-records its upper half comes from the bytes that follow.
    pub param1: u32,
}

impl ClockEntry {
    fn from_bytes(raw: &[u8]) -> Self {
        Self {
            param0: le_u32(raw),
            param1: le_u32(raw.get(4..).unwrap_or(&[])),
        }
    }

    /// Nominal frequency in MHz.
    #[must_use]
    pub fn nominal_mhz(&self) -> u32 {
        self.param0 & NOM_FREQ_MHZ_MASK
    }

    /// Minimum frequency in MHz.
    #[must_use]
    pub fn min_mhz(&self) -> u16 {
        (self.param1 & MIN_FREQ_MHZ_MASK) as u16
    }

    /// Maximum frequency in MHz.
    #[must_use]
    pub fn max_mhz(&self) -> u16 {
        ((self.param1 & MAX_FREQ_MHZ_MASK) >> MAX_FREQ_MHZ_SHIFT) as u16
    }
}

/// Little-endian word from the first four bytes of `bytes`, zero-padded.
fn le_u32(bytes: &[u8]) -> u32 {
    let mut buf = [0u8; 4];
    let len = bytes.len().min(buf.len());
    buf[..len].copy_from_slice(&bytes[..len]);
    u32::from_le_bytes(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn le_u32_reads_one_word() {
        assert_eq!(le_u32(&[0x34, 0x12]), 0x1234);
        assert_eq!(le_u32(&[0x78, 0x56, 0x34, 0x12, 0xff]), 0x1234_5678);
    }

    #[test]
    fn frequency_fields_use_fixed_offsets() {
        let param1 = (900u32 << MAX_FREQ_MHZ_SHIFT) | 200;
        let mut raw = 800u32.to_le_bytes().to_vec();
        raw.extend_from_slice(&param1.to_le_bytes());
        let entry = ClockEntry::from_bytes(&raw);
        assert_eq!(entry.nominal_mhz(), 800);
        assert_eq!(entry.min_mhz(), 200);
        assert_eq!(entry.max_mhz(), 900);
    }

    #[test]
    fn nominal_ignores_bits_above_field() {
        let raw = [0xff, 0xff, 0xff, 0xff, 0, 0];
        assert_eq!(ClockEntry::from_bytes(&raw).nominal_mhz(), 0x3fff);
    }
}
