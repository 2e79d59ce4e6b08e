// Copyright © 2025 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: Parse and validate the performance table header.
// Author: Lukas Bower

use crate::*;

/// Fixed 10-byte performance table header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PerfTableHeader {
    /// Table layout version ([`VERSION_5X`] or [`VERSION_6X`]).
    pub version: u8,
    /// Header length in bytes; records start at this offset.
    pub header_size: u8,
    /// Size of the base part of each record.
    pub base_entry_size: u8,
    /// Number of records.
    pub base_entry_count: u8,
    /// Size of each clock sub-record.
    pub clock_entry_size: u8,
    /// Number of clock sub-records following each base entry.
    pub clock_entry_count: u8,
    /// Table-wide flags.
    pub flags0: u8,
    /// Level the firmware boots in.
    pub initial_pstate: u8,
    /// CPI support level.
    pub cpi_support_level: u8,
    /// CPI feature bits.
    pub cpi_features: u8,
}

impl PerfTableHeader {
    /// Read the raw header fields. Performs no validation beyond length.
    pub fn parse(bytes: &[u8]) -> Result<Self, TableError> {
        let needed = usize::from(HEADER_SIZE_10);
        let raw: &[u8; 10] = bytes
            .get(..needed)
            .and_then(|head| head.try_into().ok())
            .ok_or(TableError::Truncated {
                needed,
                available: bytes.len(),
            })?;
        Ok(Self {
            version: raw[0],
            header_size: raw[1],
            base_entry_size: raw[2],
            base_entry_count: raw[3],
            clock_entry_size: raw[4],
            clock_entry_count: raw[5],
            flags0: raw[6],
            initial_pstate: raw[7],
            cpi_support_level: raw[8],
            cpi_features: raw[9],
        })
    }

    /// Check every header invariant. A failure rejects the whole table.
    pub fn validate(&self) -> Result<(), TableError> {
        let base_sizes: &[u8] = match self.version {
            VERSION_5X => &[BASE_ENTRY_5X_SIZE_2, BASE_ENTRY_5X_SIZE_3],
            VERSION_6X => &[
                BASE_ENTRY_5X_SIZE_2,
                BASE_ENTRY_5X_SIZE_3,
                BASE_ENTRY_6X_SIZE_5,
            ],
            other => return Err(TableError::UnsupportedVersion(other)),
        };
        if self.header_size != HEADER_SIZE_10 {
            return Err(TableError::HeaderSize(self.header_size));
        }
        if self.base_entry_count == 0 {
            return Err(TableError::NoEntries);
        }
        if !base_sizes.contains(&self.base_entry_size) {
            return Err(TableError::BaseEntrySize {
                version: self.version,
                size: self.base_entry_size,
            });
        }
        if ![CLOCK_ENTRY_5X_SIZE_6, CLOCK_ENTRY_6X_SIZE_8].contains(&self.clock_entry_size) {
            return Err(TableError::ClockEntrySize(self.clock_entry_size));
        }
        if usize::from(self.clock_entry_count) > CLK_SET_INFO_MAX_SIZE {
            return Err(TableError::TooManyClockEntries(self.clock_entry_count));
        }
        Ok(())
    }

    /// Bytes per record: base entry plus all of its clock sub-records.
    #[must_use]
    pub fn entry_stride(&self) -> usize {
        usize::from(self.base_entry_size)
            + usize::from(self.clock_entry_count) * usize::from(self.clock_entry_size)
    }

    /// Bytes spanned by all records.
    #[must_use]
    pub fn records_len(&self) -> usize {
        usize::from(self.base_entry_count) * self.entry_stride()
    }

    /// Bytes the decoder reads past the records. Every sub-record's `param1`
    /// is a full word at offset 4, so with 6-byte sub-records the last read
    /// runs two bytes beyond the declared layout.
    #[must_use]
    pub fn param1_overrun(&self) -> usize {
        if self.clock_entry_count == 0 {
            0
        } else {
            CLOCK_PARAM1_END.saturating_sub(usize::from(self.clock_entry_size))
        }
    }

    /// Bytes that must follow the header for the table to decode.
    #[must_use]
    pub fn read_len(&self) -> usize {
        self.records_len() + self.param1_overrun()
    }
}
