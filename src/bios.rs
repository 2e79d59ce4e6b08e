// Copyright © 2025 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: Locate the performance table inside a resident firmware image.
// Author: Lukas Bower

use std::fs;
use std::io;
use std::path::Path;

/// Read-only accessor for the firmware image already resident in memory.
pub trait BiosImage {
    /// Bytes of the performance table, or `None` when the image has none.
    fn perf_table(&self) -> Option<&[u8]>;
}

impl BiosImage for [u8] {
    fn perf_table(&self) -> Option<&[u8]> {
        Some(self)
    }
}

impl BiosImage for Vec<u8> {
    fn perf_table(&self) -> Option<&[u8]> {
        Some(self.as_slice())
    }
}

impl<T: BiosImage + ?Sized> BiosImage for &T {
    fn perf_table(&self) -> Option<&[u8]> {
        (**self).perf_table()
    }
}

/// Firmware image holding a standalone performance table, as dumped to disk.
#[derive(Debug, Clone, Default)]
pub struct PerfTableImage {
    table: Option<Vec<u8>>,
}

impl PerfTableImage {
    /// Image carrying `table`.
    #[must_use]
    pub fn new(table: Vec<u8>) -> Self {
        Self { table: Some(table) }
    }

    /// Image without a performance table.
    #[must_use]
    pub fn empty() -> Self {
        Self { table: None }
    }

    /// Read a table dump from `path`.
    pub fn load(path: &Path) -> io::Result<Self> {
        Ok(Self::new(fs::read(path)?))
    }
}

impl BiosImage for PerfTableImage {
    fn perf_table(&self) -> Option<&[u8]> {
        self.table.as_deref()
    }
}
