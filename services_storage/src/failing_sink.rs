//! # Failing Log Sink
//!
//! A [`LogSink`] wrapper that simulates I/O failures, for exercising the
//! edit log's behavior when appends or syncs go wrong.

use crate::log_sink::LogSink;
use std::io;
use std::path::Path;

/// When failures should occur
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Never fail (passthrough)
    Never,
    /// After N appends, write half of each append and then fail
    TornAppendAfter(usize),
    /// After N syncs, fail every sync
    SyncAfter(usize),
}

/// Wrapper around a sink that can simulate failures
#[derive(Debug)]
pub struct FailingSink<S: LogSink> {
    inner: S,
    policy: FailurePolicy,
    append_count: usize,
    sync_count: usize,
    fail_truncate: bool,
}

impl<S: LogSink> FailingSink<S> {
    pub fn new(inner: S, policy: FailurePolicy) -> Self {
        Self {
            inner,
            policy,
            append_count: 0,
            sync_count: 0,
            fail_truncate: false,
        }
    }

    /// Makes every truncate fail as well
    pub fn with_failing_truncate(mut self) -> Self {
        self.fail_truncate = true;
        self
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Resets the failure policy and counters
    pub fn set_policy(&mut self, policy: FailurePolicy) {
        self.policy = policy;
        self.append_count = 0;
        self.sync_count = 0;
        self.fail_truncate = false;
    }
}

fn injected(what: &str) -> io::Error {
    io::Error::other(format!("injected {} failure", what))
}

impl<S: LogSink> LogSink for FailingSink<S> {
    fn append(&mut self, bytes: &[u8]) -> io::Result<()> {
        if let FailurePolicy::TornAppendAfter(n) = self.policy {
            if self.append_count >= n {
                self.inner.append(&bytes[..bytes.len() / 2])?;
                return Err(injected("append"));
            }
        }
        self.append_count += 1;
        self.inner.append(bytes)
    }

    fn sync(&mut self) -> io::Result<()> {
        if let FailurePolicy::SyncAfter(n) = self.policy {
            if self.sync_count >= n {
                return Err(injected("sync"));
            }
        }
        self.sync_count += 1;
        self.inner.sync()
    }

    fn size(&self) -> io::Result<u64> {
        self.inner.size()
    }

    fn truncate(&mut self, len: u64) -> io::Result<()> {
        if self.fail_truncate {
            return Err(injected("truncate"));
        }
        self.inner.truncate(len)
    }

    fn reopen(&mut self, path: &Path) -> io::Result<()> {
        self.inner.reopen(path)
    }
}
