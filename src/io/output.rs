//! Slice serialization for the downstream phase.
//!
//! The minimal interchange shape is frozen for compatibility:
//!
//! ```json
//! {"mutated_method": "<sig>", "callers": ["<sig>", ...]}
//! ```
//!
//! The extended form adds per-caller call-site evidence under
//! `caller_contexts` without disturbing those two fields. Serialization is
//! pure and total: identical slices serialize byte-identically.

use crate::extractor::ContextSlice;
use serde::Serialize;
use std::io::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
}

pub trait SliceWriter {
    fn write_slice(&mut self, slice: &ContextSlice) -> anyhow::Result<()>;
}

#[derive(Debug, Serialize)]
struct SliceRecord {
    mutated_method: String,
    callers: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    caller_contexts: Option<Vec<CallerContextRecord>>,
}

#[derive(Debug, Serialize)]
struct CallerContextRecord {
    method: String,
    depth: u32,
    call_sites: Vec<String>,
}

fn record(slice: &ContextSlice, extended: bool) -> SliceRecord {
    SliceRecord {
        mutated_method: slice.target.to_string(),
        callers: slice.caller_signatures(),
        caller_contexts: extended.then(|| {
            slice
                .callers
                .iter()
                .map(|c| CallerContextRecord {
                    method: c.method.to_string(),
                    depth: c.depth,
                    call_sites: c.sites.iter().map(|s| s.to_string()).collect(),
                })
                .collect()
        }),
    }
}

pub struct JsonWriter<W: Write> {
    writer: W,
    extended: bool,
}

impl<W: Write> JsonWriter<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            extended: false,
        }
    }

    pub fn extended(writer: W) -> Self {
        Self {
            writer,
            extended: true,
        }
    }
}

impl<W: Write> SliceWriter for JsonWriter<W> {
    fn write_slice(&mut self, slice: &ContextSlice) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(&record(slice, self.extended))?;
        self.writer.write_all(json.as_bytes())?;
        writeln!(self.writer)?;
        Ok(())
    }
}

pub fn create_writer<'a, W: Write + 'a>(
    format: OutputFormat,
    writer: W,
    extended: bool,
) -> Box<dyn SliceWriter + 'a> {
    match format {
        OutputFormat::Json => {
            if extended {
                Box::new(JsonWriter::extended(writer))
            } else {
                Box::new(JsonWriter::new(writer))
            }
        }
    }
}
