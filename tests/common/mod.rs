#![allow(dead_code)]

use std::io;
use std::sync::{Arc, Mutex};

use serde_json::Value;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::fmt::MakeWriter;

use ntpdial::logging;

/// In-memory sink for the JSON log stream.
#[derive(Clone, Default)]
pub struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    /// Route this thread's records into a fresh buffer until the guard drops.
    pub fn install() -> (Self, tracing::subscriber::DefaultGuard) {
        let logs = Self::default();
        let guard =
            tracing::subscriber::set_default(logging::subscriber(LevelFilter::INFO, logs.clone()));
        (logs, guard)
    }

    pub fn records(&self) -> Vec<Value> {
        let bytes = self.0.lock().unwrap();
        String::from_utf8_lossy(&bytes)
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    /// Records whose message is `message`, in emission order.
    pub fn with_message(&self, message: &str) -> Vec<Value> {
        self.records()
            .into_iter()
            .filter(|r| r["message"] == message)
            .collect()
    }

    /// Messages of the per-target outcome records, in emission order.
    pub fn outcomes(&self) -> Vec<(String, String)> {
        self.records()
            .into_iter()
            .filter(|r| r["message"] == "server response" || r["message"] == "query failed")
            .map(|r| {
                (
                    r["message"].as_str().unwrap_or_default().to_string(),
                    r["server"].as_str().unwrap_or_default().to_string(),
                )
            })
            .collect()
    }
}

impl io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for CapturedLogs {
    type Writer = CapturedLogs;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}
