// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Report output shared by the polling loop and the discovery listener.
//!
//! Text lines are consumed by tooling that greps for fixed phrases
//! (`Participant with GUID`, `Participant locators:` ...), so the text
//! layout of each record is part of the monitor's contract.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::io::{self, Write};
use std::sync::Arc;

/// Output format for report records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per record per line.
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "t" => Ok(OutputFormat::Text),
            "json" | "j" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown format: {}", s)),
        }
    }
}

/// A record the monitor can emit.
pub trait Record: fmt::Display + Serialize {
    /// Value of the `record` tag in JSON output.
    const KIND: &'static str;
}

/// Serialized writer for report records.
pub struct Reporter {
    format: OutputFormat,
    out: Mutex<Box<dyn Write + Send>>,
}

impl Reporter {
    /// Report to stdout.
    pub fn stdout(format: OutputFormat) -> Self {
        Self::with_writer(format, io::stdout())
    }

    /// Report to an arbitrary writer.
    pub fn with_writer(format: OutputFormat, writer: impl Write + Send + 'static) -> Self {
        Self {
            format,
            out: Mutex::new(Box::new(writer)),
        }
    }

    /// Write one record. Output failures are logged, never propagated.
    pub fn emit<R: Record>(&self, record: &R) {
        let line = match self.format {
            OutputFormat::Text => record.to_string(),
            OutputFormat::Json => match to_json_line(record) {
                Ok(line) => line,
                Err(err) => {
                    tracing::warn!("Failed to serialize {} record: {}", R::KIND, err);
                    return;
                }
            },
        };

        let mut out = self.out.lock();
        if let Err(err) = writeln!(out, "{}", line).and_then(|_| out.flush()) {
            tracing::warn!("Report output failed: {}", err);
        }
    }
}

fn to_json_line<R: Record>(record: &R) -> serde_json::Result<String> {
    let mut value = serde_json::to_value(record)?;
    if let Value::Object(ref mut map) = value {
        map.insert("record".into(), Value::String(R::KIND.into()));
    }
    serde_json::to_string(&value)
}

/// In-memory sink, cloneable so a caller can keep reading what the
/// [`Reporter`] wrote.
#[derive(Debug, Clone, Default)]
pub struct BufferOutput(Arc<Mutex<Vec<u8>>>);

impl BufferOutput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far, lossily decoded.
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock()).into_owned()
    }

    pub fn clear(&self) {
        self.0.lock().clear();
    }
}

impl Write for BufferOutput {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
