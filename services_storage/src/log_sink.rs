//! Append-only targets for the file edit log

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;

/// Byte sink the edit log appends its lines to
pub trait LogSink {
    /// Appends `bytes` at the end of the sink
    fn append(&mut self, bytes: &[u8]) -> io::Result<()>;

    /// Makes every appended byte durable
    fn sync(&mut self) -> io::Result<()>;

    /// Current length in bytes
    fn size(&self) -> io::Result<u64>;

    /// Cuts the sink back to `len` bytes
    fn truncate(&mut self, len: u64) -> io::Result<()>;

    /// Switches to the file now found at `path`, e.g. after it was replaced
    fn reopen(&mut self, path: &Path) -> io::Result<()>;
}

impl LogSink for File {
    fn append(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.write_all(bytes)
    }

    fn sync(&mut self) -> io::Result<()> {
        self.sync_data()
    }

    fn size(&self) -> io::Result<u64> {
        Ok(self.metadata()?.len())
    }

    fn truncate(&mut self, len: u64) -> io::Result<()> {
        self.set_len(len)
    }

    fn reopen(&mut self, path: &Path) -> io::Result<()> {
        *self = OpenOptions::new().append(true).open(path)?;
        Ok(())
    }
}
