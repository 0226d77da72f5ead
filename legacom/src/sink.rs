//! Append-only sinks that field mappers serialize their schema into.

use std::collections::HashSet;
use std::io::{self, Write};

use serde_json::Value;

use crate::errors::{MapperError, MapperResult};
use crate::node::SchemaNode;

/// An append-only structured document builder positioned inside an object.
///
/// Keys can be appended once; a second append of the same key is an error.
pub trait SchemaSink {
    fn field(&mut self, key: &str, value: Value) -> MapperResult<()>;
}

fn duplicate_key(key: &str) -> MapperError {
    MapperError::Io(io::Error::new(
        io::ErrorKind::InvalidInput,
        format!("duplicate key [{key}] in schema document"),
    ))
}

impl SchemaSink for SchemaNode {
    fn field(&mut self, key: &str, value: Value) -> MapperResult<()> {
        if self.contains_key(key) {
            return Err(duplicate_key(key));
        }
        self.insert(key.to_string(), value);
        Ok(())
    }
}

/// Streams a single JSON object into a writer as fields are appended.
///
/// The opening brace is written on construction and the closing brace by
/// [`JsonObjectWriter::finish`]. A failed write leaves the underlying writer in an
/// undefined state; callers must not retry against the same writer.
pub struct JsonObjectWriter<W: Write> {
    writer: W,
    keys: HashSet<String>,
}

impl<W: Write> JsonObjectWriter<W> {
    pub fn new(mut writer: W) -> MapperResult<Self> {
        writer.write_all(b"{")?;
        Ok(Self {
            writer,
            keys: HashSet::new(),
        })
    }

    pub fn finish(mut self) -> MapperResult<W> {
        self.writer.write_all(b"}")?;
        self.writer.flush()?;
        Ok(self.writer)
    }
}

impl<W: Write> SchemaSink for JsonObjectWriter<W> {
    fn field(&mut self, key: &str, value: Value) -> MapperResult<()> {
        if !self.keys.insert(key.to_string()) {
            return Err(duplicate_key(key));
        }
        if self.keys.len() > 1 {
            self.writer.write_all(b",")?;
        }
        serde_json::to_writer(&mut self.writer, key)?;
        self.writer.write_all(b":")?;
        serde_json::to_writer(&mut self.writer, &value)?;
        Ok(())
    }
}
