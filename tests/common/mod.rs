//! Shared helpers for integration tests.

use std::io::Write;
use std::sync::{Arc, Mutex};

use kvlog::{Adapter, FormatOption};

/// Sink collecting everything written, readable while loggers still hold it.
#[derive(Clone, Default)]
pub struct Capture(Arc<Mutex<Vec<u8>>>);

impl Write for Capture {
    fn write(&mut self, data: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().write(data)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl Capture {
    pub fn text(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }

    /// Every written line, parsed as JSON.
    pub fn records(&self) -> Vec<serde_json::Value> {
        self.text()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }
}

/// JSON adapter without timestamps, writing into a fresh capture.
#[allow(dead_code)]
pub fn json_adapter() -> (Adapter, Capture) {
    let capture = Capture::default();
    let adapter = Adapter::new(capture.clone(), [FormatOption::DisableTimestamp]);
    (adapter, capture)
}
