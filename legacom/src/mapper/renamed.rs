//! A decorator presenting any field mapper under another type name.
//!
//! Wrapped mappers emit their own type identifier and expose no hook to change it, so
//! serialization runs in two stages: the wrapped mapper is emitted into a fresh
//! in-memory document that is materialized as a [`SchemaNode`] tree, the tree's `type`
//! entry is patched, and the patched tree is appended to the caller's sink. The wrapped
//! mapper's emission logic is reused as-is, including its key order.

use std::any::Any;
use std::io;

use serde_json::Value;

use super::FieldMapper;
use crate::errors::{MapperError, MapperResult};
use crate::node::{SchemaNode, TYPE_KEY};
use crate::sink::{JsonObjectWriter, SchemaSink};

#[derive(Debug)]
pub struct RenamedFieldMapper<M> {
    inner: M,
    content_type: &'static str,
}

impl<M: FieldMapper> RenamedFieldMapper<M> {
    pub fn new(inner: M, content_type: &'static str) -> Self {
        debug_assert_ne!(inner.content_type(), content_type, "renaming a mapper to its own type");
        Self { inner, content_type }
    }

    pub fn inner(&self) -> &M {
        &self.inner
    }

    /// Type name the wrapped mapper would declare on its own.
    pub fn base_content_type(&self) -> &str {
        self.inner.content_type()
    }
}

impl<M: FieldMapper> FieldMapper for RenamedFieldMapper<M> {
    fn simple_name(&self) -> &str {
        self.inner.simple_name()
    }

    fn full_name(&self) -> &str {
        self.inner.full_name()
    }

    fn content_type(&self) -> &str {
        self.content_type
    }

    fn to_schema(&self, out: &mut dyn SchemaSink) -> MapperResult<()> {
        let body = emit_tree(&self.inner)?;
        let body = patch_type(body, self.content_type);
        out.field(self.simple_name(), Value::Object(body))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Emits `mapper` into a fresh JSON document and materializes the body it wrote under
/// its simple name.
///
/// Fails with an I/O-kind error when emission fails, when the document cannot be read
/// back, or when it does not hold exactly one object under the mapper's simple name.
pub fn emit_tree(mapper: &dyn FieldMapper) -> MapperResult<SchemaNode> {
    let mut writer = JsonObjectWriter::new(Vec::new())?;
    mapper.to_schema(&mut writer)?;
    let bytes = writer.finish()?;

    let mut document: SchemaNode = serde_json::from_slice(&bytes)?;
    let body = document.remove(mapper.simple_name());
    match body {
        Some(Value::Object(body)) if document.is_empty() => Ok(body),
        _ => Err(MapperError::Io(io::Error::new(
            io::ErrorKind::InvalidData,
            format!(
                "field [{}] did not emit a single object under its own name",
                mapper.simple_name()
            ),
        ))),
    }
}

/// Sets the `type` entry of a field body, keeping its position when already present.
pub fn patch_type(mut body: SchemaNode, type_name: &str) -> SchemaNode {
    body.insert(TYPE_KEY.to_string(), Value::from(type_name));
    body
}
