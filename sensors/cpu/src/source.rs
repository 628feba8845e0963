//! Providers of the kernel CPU accounting table.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// A source of raw counter tables, read once per sampling tick.
pub trait CounterSource {
    /// Returns the whole accounting table as text.
    fn read_table(&self) -> io::Result<String>;

    /// Where the table comes from, for diagnostics.
    fn describe(&self) -> String;
}

/// Counters backed by `/proc/stat` (or a file laid out like it).
#[derive(Debug, Clone)]
pub struct ProcStat {
    path: PathBuf,
}

impl ProcStat {
    const STAT: &'static str = "/proc/stat";

    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for ProcStat {
    fn default() -> Self {
        Self::new(Self::STAT)
    }
}

impl CounterSource for ProcStat {
    fn read_table(&self) -> io::Result<String> {
        fs::read_to_string(&self.path)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}
