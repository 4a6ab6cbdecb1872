//! In-memory sink
//!
//! Keeps every message it receives. Mostly useful in tests and for showing a
//! recent log excerpt inside an application.

use crate::core::level::LogLevel;
use crate::sinks::traits::{Sink, SinkResult};
use std::sync::Mutex;

#[derive(Debug, Default)]
pub struct MemorySink {
    entries: Mutex<Vec<(LogLevel, String)>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every `(level, message)` received, oldest first
    pub fn entries(&self) -> Vec<(LogLevel, String)> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.clone()
    }

    /// Messages only, oldest first
    pub fn messages(&self) -> Vec<String> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.iter().map(|(_, message)| message.clone()).collect()
    }

    /// Messages at `level`, oldest first
    pub fn messages_at(&self, level: LogLevel) -> Vec<String> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries
            .iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, message)| message.clone())
            .collect()
    }

    /// All messages as one text, newest first, one message per line
    pub fn contents(&self) -> String {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries
            .iter()
            .rev()
            .map(|(_, message)| format!("{}\n", message))
            .collect()
    }

    pub fn len(&self) -> usize {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.clear();
    }
}

impl Sink for MemorySink {
    fn write(&self, level: LogLevel, message: &str) -> SinkResult<()> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.push((level, message.to_string()));
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }

    fn stats(&self) -> String {
        format!("MemorySink: {} message(s)", self.len())
    }
}
