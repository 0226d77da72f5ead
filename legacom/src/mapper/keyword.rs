//! Minimal `keyword` field, mostly used as a multi-field of completion fields.

use std::any::Any;

use serde_json::Value;

use super::{BuilderContext, FieldMapper, MapperBuilder, Parsed, ParserContext, TypeParser};
use crate::errors::{MapperError, MapperResult};
use crate::node::{SchemaNode, TYPE_KEY, node_boolean, node_integer};
use crate::sink::SchemaSink;

pub const CONTENT_TYPE: &str = "keyword";

const IGNORE_ABOVE: &str = "ignore_above";
const INDEX: &str = "index";
const STORE: &str = "store";

#[derive(Debug, Clone)]
pub struct KeywordBuilder {
    name: String,
    ignore_above: Option<u32>,
    index: bool,
    store: bool,
}

impl KeywordBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ignore_above: None,
            index: true,
            store: false,
        }
    }

    pub fn ignore_above(&mut self, limit: i32) -> MapperResult<&mut Self> {
        let limit = u32::try_from(limit).map_err(|_| {
            MapperError::invalid_argument(
                self.name.as_str(),
                format!("[{IGNORE_ABOVE}] must be positive, got [{limit}]"),
            )
        })?;
        self.ignore_above = Some(limit);
        Ok(self)
    }

    pub fn index(&mut self, index: bool) -> &mut Self {
        self.index = index;
        self
    }

    pub fn store(&mut self, store: bool) -> &mut Self {
        self.store = store;
        self
    }

    pub fn build_mapper(self, context: &BuilderContext<'_>) -> KeywordFieldMapper {
        KeywordFieldMapper {
            full_name: context.full_name(&self.name),
            simple_name: self.name,
            ignore_above: self.ignore_above,
            index: self.index,
            store: self.store,
        }
    }
}

impl MapperBuilder for KeywordBuilder {
    fn name(&self) -> &str {
        &self.name
    }

    fn build(self: Box<Self>, context: &BuilderContext<'_>) -> MapperResult<Box<dyn FieldMapper>> {
        Ok(Box::new(self.build_mapper(context)))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordFieldMapper {
    simple_name: String,
    full_name: String,
    ignore_above: Option<u32>,
    index: bool,
    store: bool,
}

impl KeywordFieldMapper {
    pub fn ignore_above(&self) -> Option<u32> {
        self.ignore_above
    }

    pub fn is_indexed(&self) -> bool {
        self.index
    }

    pub fn is_stored(&self) -> bool {
        self.store
    }
}

impl FieldMapper for KeywordFieldMapper {
    fn simple_name(&self) -> &str {
        &self.simple_name
    }

    fn full_name(&self) -> &str {
        &self.full_name
    }

    fn content_type(&self) -> &str {
        CONTENT_TYPE
    }

    fn to_schema(&self, out: &mut dyn SchemaSink) -> MapperResult<()> {
        let mut body = SchemaNode::new();
        body.insert(TYPE_KEY.to_string(), Value::from(CONTENT_TYPE));
        if !self.index {
            body.insert(INDEX.to_string(), Value::Bool(false));
        }
        if self.store {
            body.insert(STORE.to_string(), Value::Bool(true));
        }
        if let Some(limit) = self.ignore_above {
            body.insert(IGNORE_ABOVE.to_string(), Value::from(limit));
        }
        out.field(&self.simple_name, Value::Object(body))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct KeywordTypeParser;

impl TypeParser for KeywordTypeParser {
    fn parse(&self, name: &str, node: SchemaNode, _context: &ParserContext<'_>) -> MapperResult<Parsed> {
        let mut builder = KeywordBuilder::new(name);
        let mut residual = SchemaNode::new();
        for (key, value) in node {
            match key.as_str() {
                IGNORE_ABOVE => {
                    builder.ignore_above(node_integer(name, IGNORE_ABOVE, &value)?)?;
                }
                INDEX => {
                    builder.index(node_boolean(&value));
                }
                STORE => {
                    builder.store(node_boolean(&value));
                }
                _ => {
                    residual.insert(key, value);
                }
            }
        }
        Ok(Parsed {
            builder: Box::new(builder),
            residual,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::IndexAnalyzers;
    use crate::registry::TypeRegistry;
    use crate::settings::IndexSettings;
    use crate::version::IndexVersion;
    use serde_json::json;

    #[test]
    fn parses_and_emits_non_default_options() {
        let registry = TypeRegistry::new();
        let analyzers = IndexAnalyzers::default();
        let context = ParserContext::new(&registry, &analyzers, IndexVersion::CURRENT);
        let node = json!({"type": "keyword", "ignore_above": "64", "index": false, "norms": true});
        let parsed = KeywordTypeParser
            .parse("raw", node.as_object().cloned().unwrap(), &context)
            .unwrap();
        assert_eq!(parsed.residual, *json!({"type": "keyword", "norms": true}).as_object().unwrap());

        let settings = IndexSettings::default();
        let mapper = parsed.builder.build(&BuilderContext::root(&settings)).unwrap();
        let mut out = SchemaNode::new();
        mapper.to_schema(&mut out).unwrap();
        assert_eq!(
            Value::Object(out),
            json!({"raw": {"type": "keyword", "index": false, "ignore_above": 64}})
        );
    }

    #[test]
    fn negative_ignore_above_is_invalid() {
        let err = KeywordBuilder::new("raw").ignore_above(-1).unwrap_err();
        assert_eq!(err.kind(), crate::errors::ErrorKind::InvalidArgument);
    }
}
