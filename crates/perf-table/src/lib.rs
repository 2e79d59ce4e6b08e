// Copyright © 2025 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: Decode the firmware-resident performance (P-state) table.
// Author: Lukas Bower
#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! Firmware performance table codec.
//!
//! The table is a 10-byte header followed by `base_entry_count` records.
//! Each record is a base entry of `base_entry_size` bytes followed by
//! `clock_entry_count` clock sub-records of `clock_entry_size` bytes. All
//! integers are little-endian. A clock sub-record's `param1` is always read
//! as a full word at offset 4, even when the sub-record is only 6 bytes
//! long. This crate validates and walks the layout;
//! it knows nothing about clock-domain registries.

mod entry;
mod header;

pub use entry::{ClockEntries, ClockEntry, Entries, PerfEntry};
pub use header::PerfTableHeader;

use thiserror::Error;

/// Table version tag for the 5x layout.
pub const VERSION_5X: u8 = 0x50;
/// Table version tag for the 6x layout.
pub const VERSION_6X: u8 = 0x60;

/// The only recognised header size.
pub const HEADER_SIZE_10: u8 = 10;

/// Base entry size carrying level and flags.
pub const BASE_ENTRY_5X_SIZE_2: u8 = 2;
/// Base entry size adding the low-power entry index.
pub const BASE_ENTRY_5X_SIZE_3: u8 = 3;
/// Extended 6x base entry size.
pub const BASE_ENTRY_6X_SIZE_5: u8 = 5;

/// Clock sub-record with a 16-bit `param1`.
pub const CLOCK_ENTRY_5X_SIZE_6: u8 = 6;
/// Clock sub-record with a 32-bit `param1`.
pub const CLOCK_ENTRY_6X_SIZE_8: u8 = 8;

/// Offset just past a clock sub-record's `param1` word.
pub(crate) const CLOCK_PARAM1_END: usize = 8;

/// Maximum number of clock sub-records per P-state.
pub const CLK_SET_INFO_MAX_SIZE: usize = 32;

/// Level value marking an intentionally absent performance level.
pub const PERFLEVEL_SKIP_ENTRY: u8 = 0xff;

/// Highest raw level; ordinals are derived as `MAX_PSTATE_LEVEL - level`.
pub const MAX_PSTATE_LEVEL: u8 = 0x0f;

/// Errors produced while validating or walking a performance table.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum TableError {
    /// The firmware image has no performance table.
    #[error("performance table not found")]
    Missing,
    /// The buffer ended before the declared layout did.
    #[error("truncated table: need {needed} bytes, have {available}")]
    Truncated {
        /// Bytes required by the header-declared layout.
        needed: usize,
        /// Bytes present in the buffer.
        available: usize,
    },
    /// Unknown table version.
    #[error("unknown/unsupported performance table version 0x{0:02x}")]
    UnsupportedVersion(u8),
    /// Header size is not recognised.
    #[error("unsupported header size {0}")]
    HeaderSize(u8),
    /// Header declares no base entries.
    #[error("table declares no base entries")]
    NoEntries,
    /// Base entry size is not accepted for the table version.
    #[error("base entry size {size} not accepted for version 0x{version:02x}")]
    BaseEntrySize {
        /// Table version.
        version: u8,
        /// Declared base entry size.
        size: u8,
    },
    /// Clock entry size is not recognised.
    #[error("unsupported clock entry size {0}")]
    ClockEntrySize(u8),
    /// More clock sub-records than a P-state can hold.
    #[error("clock entry count {0} exceeds {CLK_SET_INFO_MAX_SIZE}")]
    TooManyClockEntries(u8),
    /// A non-skip record carries a level outside `[0, 15]`.
    #[error("record {index} has invalid pstate level 0x{level:02x}")]
    InvalidLevel {
        /// Record index.
        index: usize,
        /// Raw level byte.
        level: u8,
    },
    /// A clock sub-record refers to a clock domain position that does not exist.
    #[error("record {index} clock entry {clock} has no matching clock domain")]
    ClockDomainOutOfRange {
        /// Record index.
        index: usize,
        /// Clock sub-record position.
        clock: usize,
    },
}

/// Validated view over a performance table buffer.
#[derive(Debug, Clone, Copy)]
pub struct PerfTable<'a> {
    header: PerfTableHeader,
    records: &'a [u8],
}

impl<'a> PerfTable<'a> {
    /// Validate the header and check that every byte the record walk reads
    /// is present.
    pub fn parse(bytes: &'a [u8]) -> Result<Self, TableError> {
        let header = PerfTableHeader::parse(bytes)?;
        header.validate()?;
        let start = usize::from(header.header_size);
        let needed = start + header.read_len();
        if bytes.len() < needed {
            return Err(TableError::Truncated {
                needed,
                available: bytes.len(),
            });
        }
        Ok(Self {
            header,
            records: &bytes[start..needed],
        })
    }

    /// Validated header.
    #[must_use]
    pub fn header(&self) -> &PerfTableHeader {
        &self.header
    }

    /// Every record, including skip entries, in table order.
    #[must_use]
    pub fn entries(&self) -> Entries<'a> {
        Entries::new(self.header, self.records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(base_size: u8, clock_size: u8, records: &[&[u8]]) -> Vec<u8> {
        let mut out = vec![
            VERSION_5X,
            HEADER_SIZE_10,
            base_size,
            records.len() as u8,
            clock_size,
            1,
            0,
            0,
            0,
            0,
        ];
        for record in records {
            out.extend_from_slice(record);
        }
        out
    }

    #[test]
    fn truncated_record_area_is_rejected() {
        let bytes = table(3, 6, &[&[0x0f, 0, 0, 1, 0, 0, 0, 2]]);
        assert_eq!(
            PerfTable::parse(&bytes).map(|_| ()),
            Err(TableError::Truncated {
                needed: 21,
                available: 18
            })
        );
    }

    #[test]
    fn trailing_bytes_are_ignored() {
        let mut bytes = table(3, 6, &[&[0x0f, 0, 0, 1, 0, 0, 0, 2, 0]]);
        bytes.extend_from_slice(&[0, 0, 0xaa, 0xbb]);
        let parsed = PerfTable::parse(&bytes).expect("parse");
        assert_eq!(parsed.entries().count(), 1);
    }
}
