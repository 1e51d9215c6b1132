// Licensed under the Apache-2.0 license

//! Logging hooks shared by the drivers.
//!
//! Drivers take a `Logger` as a type parameter so that logging compiles away entirely
//! with [`NoOpLogger`]. [`BufferLogger`] keeps the most recent records in a fixed-size
//! ring for boards without a console; the records can be dumped from a debugger or
//! drained over whatever transport the application has.

use heapless::{Deque, String};

/// Maximum length of a single buffered log message, longer messages are truncated.
pub const LOG_MESSAGE_CAPACITY: usize = 48;

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Debug,
    Info,
    Error,
}

pub trait Logger {
    fn log(&mut self, level: LogLevel, msg: &str);

    fn debug(&mut self, msg: &str) {
        self.log(LogLevel::Debug, msg);
    }

    fn info(&mut self, msg: &str) {
        self.log(LogLevel::Info, msg);
    }

    fn error(&mut self, msg: &str) {
        self.log(LogLevel::Error, msg);
    }
}

#[derive(Copy, Clone, Debug, Default)]
pub struct NoOpLogger;

impl Logger for NoOpLogger {
    #[inline(always)]
    fn log(&mut self, _level: LogLevel, _msg: &str) {}
}

impl<L: Logger + ?Sized> Logger for &mut L {
    fn log(&mut self, level: LogLevel, msg: &str) {
        (**self).log(level, msg);
    }
}

/// A single buffered log record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogRecord {
    pub level: LogLevel,
    pub message: String<LOG_MESSAGE_CAPACITY>,
}

/// Ring-buffer logger holding the last `N` records at or above `min_level`.
pub struct BufferLogger<const N: usize> {
    records: Deque<LogRecord, N>,
    min_level: LogLevel,
    dropped: u32,
}

impl<const N: usize> Default for BufferLogger<N> {
    fn default() -> Self {
        Self::new(LogLevel::Debug)
    }
}

impl<const N: usize> BufferLogger<N> {
    #[must_use]
    pub const fn new(min_level: LogLevel) -> Self {
        Self {
            records: Deque::new(),
            min_level,
            dropped: 0,
        }
    }

    pub fn records(&self) -> impl Iterator<Item = &LogRecord> {
        self.records.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of records evicted to make room for newer ones.
    #[must_use]
    pub fn dropped(&self) -> u32 {
        self.dropped
    }

    pub fn pop_oldest(&mut self) -> Option<LogRecord> {
        self.records.pop_front()
    }

    pub fn clear(&mut self) {
        self.records.clear();
        self.dropped = 0;
    }
}

impl<const N: usize> Logger for BufferLogger<N> {
    fn log(&mut self, level: LogLevel, msg: &str) {
        if level < self.min_level || N == 0 {
            return;
        }

        let mut message = String::new();
        for ch in msg.chars() {
            if message.push(ch).is_err() {
                break;
            }
        }

        if self.records.is_full() {
            self.records.pop_front();
            self.dropped = self.dropped.saturating_add(1);
        }
        // Cannot fail: a slot was freed above.
        let _ = self.records.push_back(LogRecord { level, message });
    }
}
