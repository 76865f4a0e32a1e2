//! Diagnostics Log Module
//!
//! Bounded ring buffer of recent operational messages shown on /proxyinfo.
//! Every message is forwarded to `tracing` as well.

use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

use tracing::{error, info, warn};

// == Log Level ==
/// Severity used when forwarding a message to `tracing`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Warning,
    Error,
}

// == Diagnostics Log ==
/// Most recent messages, newest first.
///
/// When full, recording a new message drops the oldest one.
#[derive(Debug)]
pub struct DiagnosticsLog {
    max_size: usize,
    messages: Mutex<VecDeque<String>>,
}

impl DiagnosticsLog {
    /// Creates an empty log holding at most `max_size` messages.
    pub fn new(max_size: usize) -> Self {
        Self {
            max_size,
            messages: Mutex::new(VecDeque::with_capacity(max_size)),
        }
    }

    // == Record ==
    /// Forwards `msg` to tracing and keeps it in the ring buffer.
    pub fn record(&self, level: LogLevel, msg: impl Into<String>) {
        let msg = msg.into();
        match level {
            LogLevel::Info => info!("{}", msg),
            LogLevel::Warning => warn!("{}", msg),
            LogLevel::Error => error!("{}", msg),
        }

        if self.max_size == 0 {
            return;
        }

        let mut messages = self.messages.lock().unwrap_or_else(PoisonError::into_inner);
        if messages.len() + 1 > self.max_size {
            messages.pop_back();
        }
        messages.push_front(msg);
    }

    pub fn info(&self, msg: impl Into<String>) {
        self.record(LogLevel::Info, msg);
    }

    pub fn warning(&self, msg: impl Into<String>) {
        self.record(LogLevel::Warning, msg);
    }

    pub fn error(&self, msg: impl Into<String>) {
        self.record(LogLevel::Error, msg);
    }

    /// Snapshot of the buffered messages, newest first.
    pub fn messages(&self) -> Vec<String> {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_newest_first() {
        let log = DiagnosticsLog::new(10);
        log.info("first");
        log.warning("second");
        log.error("third");

        assert_eq!(log.messages(), vec!["third", "second", "first"]);
    }

    #[test]
    fn test_log_drops_oldest_on_overflow() {
        let log = DiagnosticsLog::new(3);
        for i in 1..=5 {
            log.info(format!("msg{}", i));
        }

        assert_eq!(log.len(), 3);
        assert_eq!(log.messages(), vec!["msg5", "msg4", "msg3"]);
    }

    #[test]
    fn test_log_capacity_one_keeps_latest() {
        let log = DiagnosticsLog::new(1);
        log.info("a");
        log.info("b");

        assert_eq!(log.messages(), vec!["b"]);
    }

    #[test]
    fn test_log_zero_capacity_keeps_nothing() {
        let log = DiagnosticsLog::new(0);
        log.info("dropped");

        assert!(log.is_empty());
        assert_eq!(log.max_size(), 0);
    }
}
