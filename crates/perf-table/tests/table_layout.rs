// Copyright © 2025 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: Validate performance table header rejection and record walking.
// Author: Lukas Bower
#![forbid(unsafe_code)]

use perf_table::{
    PerfTable, TableError, BASE_ENTRY_5X_SIZE_2, BASE_ENTRY_5X_SIZE_3, CLK_SET_INFO_MAX_SIZE,
    CLOCK_ENTRY_5X_SIZE_6, CLOCK_ENTRY_6X_SIZE_8, HEADER_SIZE_10, PERFLEVEL_SKIP_ENTRY,
    VERSION_5X, VERSION_6X,
};

struct TableBuilder {
    version: u8,
    base_size: u8,
    clock_size: u8,
    clock_count: u8,
    records: Vec<Vec<u8>>,
    trailer: Vec<u8>,
}

impl TableBuilder {
    fn new(clock_count: u8) -> Self {
        Self {
            version: VERSION_5X,
            base_size: BASE_ENTRY_5X_SIZE_3,
            clock_size: CLOCK_ENTRY_6X_SIZE_8,
            clock_count,
            records: Vec::new(),
            trailer: Vec::new(),
        }
    }

    fn record(mut self, level: u8, lpwr: u8, clocks: &[(u32, u32, u32)]) -> Self {
        let mut raw = vec![level, 0, lpwr];
        raw.truncate(usize::from(self.base_size));
        raw.resize(usize::from(self.base_size), 0);
        for (nominal, min, max) in clocks {
            raw.extend_from_slice(&nominal.to_le_bytes());
            let param1 = (max << 14) | min;
            raw.extend_from_slice(&param1.to_le_bytes()[..usize::from(self.clock_size) - 4]);
        }
        self.records.push(raw);
        self
    }

    fn build(&self) -> Vec<u8> {
        let mut out = vec![
            self.version,
            HEADER_SIZE_10,
            self.base_size,
            self.records.len() as u8,
            self.clock_size,
            self.clock_count,
            0,
            0,
            0,
            0,
        ];
        for record in &self.records {
            out.extend_from_slice(record);
        }
        out.extend_from_slice(&self.trailer);
        out
    }
}

fn reject(bytes: &[u8]) -> TableError {
    PerfTable::parse(bytes).map(|_| ()).expect_err("header must be rejected")
}

#[test]
fn zero_base_entry_count_is_rejected() {
    let bytes = TableBuilder::new(1).build();
    assert_eq!(reject(&bytes), TableError::NoEntries);
}

#[test]
fn unrecognised_entry_sizes_are_rejected() {
    let mut bytes = TableBuilder::new(0).record(15, 0, &[]).build();
    bytes[2] = 4;
    assert_eq!(
        reject(&bytes),
        TableError::BaseEntrySize {
            version: VERSION_5X,
            size: 4
        }
    );

    let mut bytes = TableBuilder::new(0).record(15, 0, &[]).build();
    bytes[4] = 7;
    assert_eq!(reject(&bytes), TableError::ClockEntrySize(7));
}

#[test]
fn too_many_clock_entries_are_rejected() {
    let mut bytes = TableBuilder::new(0).record(15, 0, &[]).build();
    bytes[5] = CLK_SET_INFO_MAX_SIZE as u8 + 1;
    assert_eq!(
        reject(&bytes),
        TableError::TooManyClockEntries(CLK_SET_INFO_MAX_SIZE as u8 + 1)
    );
}

#[test]
fn unknown_version_and_header_size_are_rejected() {
    let mut bytes = TableBuilder::new(0).record(15, 0, &[]).build();
    bytes[0] = 0x40;
    assert_eq!(reject(&bytes), TableError::UnsupportedVersion(0x40));

    let mut bytes = TableBuilder::new(0).record(15, 0, &[]).build();
    bytes[1] = 12;
    assert_eq!(reject(&bytes), TableError::HeaderSize(12));
}

#[test]
fn ordinal_is_fifteen_minus_level() {
    let mut builder = TableBuilder::new(0);
    for level in 0..=15u8 {
        builder = builder.record(level, 0, &[]);
    }
    let bytes = builder.build();
    let table = PerfTable::parse(&bytes).expect("parse");
    for (index, entry) in table.entries() {
        assert_eq!(entry.level(), index as u8);
        assert_eq!(entry.pstate_num(), Some(15 - index as u32));
    }
}

#[test]
fn skip_sentinel_is_reported_not_rejected() {
    let bytes = TableBuilder::new(1)
        .record(PERFLEVEL_SKIP_ENTRY, 0, &[(0, 0, 0)])
        .record(15, 2, &[(800, 200, 900)])
        .build();
    let table = PerfTable::parse(&bytes).expect("parse");
    let entries: Vec<_> = table.entries().collect();
    assert_eq!(entries.len(), 2);
    assert!(entries[0].1.is_skip());
    assert_eq!(entries[0].1.pstate_num(), None);
    assert!(!entries[1].1.is_skip());
    assert_eq!(entries[1].1.lpwr_entry_idx(), 2);
}

#[test]
fn clock_fields_decode_from_each_record() {
    let bytes = TableBuilder::new(2)
        .record(15, 0, &[(800, 200, 900), (405, 100, 810)])
        .record(8, 0, &[(300, 150, 600), (101, 50, 202)])
        .build();
    let table = PerfTable::parse(&bytes).expect("parse");
    let decoded: Vec<Vec<(u32, u16, u16)>> = table
        .entries()
        .map(|(_, entry)| {
            entry
                .clocks()
                .map(|clk| (clk.nominal_mhz(), clk.min_mhz(), clk.max_mhz()))
                .collect()
        })
        .collect();
    assert_eq!(
        decoded,
        vec![
            vec![(800, 200, 900), (405, 100, 810)],
            vec![(300, 150, 600), (101, 50, 202)],
        ]
    );
}

#[test]
fn both_table_versions_share_structure() {
    let mut builder = TableBuilder::new(1).record(10, 1, &[(700, 300, 750)]);
    builder.version = VERSION_6X;
    let bytes = builder.build();
    let table = PerfTable::parse(&bytes).expect("6x parse");
    let (_, entry) = table.entries().next().expect("one record");
    assert_eq!(entry.pstate_num(), Some(5));
}

#[test]
fn short_base_entry_has_no_lpwr_index() {
    let mut builder = TableBuilder::new(1);
    builder.base_size = BASE_ENTRY_5X_SIZE_2;
    builder.clock_size = CLOCK_ENTRY_5X_SIZE_6;
    builder.trailer = vec![0, 0];
    let bytes = builder.record(15, 9, &[(500, 100, 1)]).build();
    let table = PerfTable::parse(&bytes).expect("parse");
    let (_, entry) = table.entries().next().expect("one record");
    assert_eq!(entry.lpwr_entry_idx(), 0);
    let clk = entry.clocks().next().expect("clock");
    assert_eq!(clk.nominal_mhz(), 500);
    assert_eq!(clk.min_mhz(), 100);
    assert_eq!(clk.max_mhz(), 1);
}

#[test]
fn six_byte_clock_entry_reads_full_param1_word() {
    let param1: u32 = 200 | (900 << 14);
    let mut builder = TableBuilder::new(1);
    builder.clock_size = CLOCK_ENTRY_5X_SIZE_6;
    // The upper half of param1 lies in the two bytes after the sub-record.
    builder.trailer = param1.to_le_bytes()[2..].to_vec();
    let bytes = builder.record(15, 0, &[(800, 200, 900)]).build();

    let table = PerfTable::parse(&bytes).expect("5x parse");
    let (_, entry) = table.entries().next().expect("one record");
    let clk = entry.clocks().next().expect("clock");
    assert_eq!(clk.param1, param1);
    assert_eq!(
        (clk.nominal_mhz(), clk.min_mhz(), clk.max_mhz()),
        (800, 200, 900)
    );
}

#[test]
fn six_byte_clock_entry_needs_bytes_past_the_layout() {
    let mut builder = TableBuilder::new(1);
    builder.clock_size = CLOCK_ENTRY_5X_SIZE_6;
    let bytes = builder.record(15, 0, &[(800, 200, 900)]).build();
    assert_eq!(
        reject(&bytes),
        TableError::Truncated {
            needed: bytes.len() + 2,
            available: bytes.len(),
        }
    );
}
