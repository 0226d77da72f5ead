//! Document mappings: the `properties` block holding every top-level field.

use serde_json::Value;

use crate::analysis::IndexAnalyzers;
use crate::errors::{MapperError, MapperResult};
use crate::mapper::{BuilderContext, FieldMapper, ParserContext};
use crate::node::{SchemaNode, TYPE_KEY, node_to_string};
use crate::registry::TypeRegistry;
use crate::settings::IndexSettings;

pub const PROPERTIES_KEY: &str = "properties";

/// A mapping key that no parser consumed.
#[derive(Debug, Clone, PartialEq)]
pub struct UnconsumedKey {
    pub field: String,
    pub key: String,
    pub value: Value,
}

/// Parses whole document mappings with the types bound in a [`TypeRegistry`].
#[derive(Debug)]
pub struct MappingParser<'a> {
    registry: &'a TypeRegistry,
    settings: &'a IndexSettings,
    analyzers: IndexAnalyzers,
}

impl<'a> MappingParser<'a> {
    pub fn new(registry: &'a TypeRegistry, settings: &'a IndexSettings) -> MapperResult<Self> {
        Ok(Self {
            registry,
            settings,
            analyzers: IndexAnalyzers::from_settings(settings)?,
        })
    }

    pub fn analyzers(&self) -> &IndexAnalyzers {
        &self.analyzers
    }

    /// Parses `{ "properties": { <field>: <node>, ... } }`.
    ///
    /// Keys a field's parser leaves unconsumed are kept in [`RootMapping::unconsumed`]
    /// and reported at warn level; they do not fail the parse.
    pub fn parse(&self, mut mapping: SchemaNode) -> MapperResult<RootMapping> {
        let properties = match mapping.remove(PROPERTIES_KEY) {
            None | Some(Value::Null) => SchemaNode::new(),
            Some(Value::Object(properties)) => properties,
            Some(other) => {
                return Err(MapperError::parsing(
                    PROPERTIES_KEY,
                    format!("expected an object but got [{other}]"),
                ));
            }
        };
        for key in mapping.keys() {
            log::warn!("ignoring unsupported root mapping parameter [{key}]");
        }

        let context = ParserContext::new(self.registry, &self.analyzers, self.settings.version_created);
        let root = BuilderContext::root(self.settings);
        let mut fields = Vec::with_capacity(properties.len());
        let mut unconsumed = Vec::new();

        for (name, node) in properties {
            let Value::Object(node) = node else {
                return Err(MapperError::parsing(name, "field mapping must be an object"));
            };
            let Some(type_name) = node.get(TYPE_KEY).map(node_to_string) else {
                return Err(MapperError::parsing(name.as_str(), format!("no type specified for property [{name}]")));
            };
            let parser = self.registry.get(&type_name).ok_or_else(|| MapperError::UnknownType {
                field: name.clone(),
                type_name: type_name.clone(),
            })?;

            let parsed = parser.parse(&name, node, &context)?;
            for (key, value) in parsed.residual {
                if key == TYPE_KEY {
                    continue;
                }
                log::warn!("field [{name}] of type [{type_name}] left parameter [{key}] unconsumed");
                unconsumed.push(UnconsumedKey {
                    field: name.clone(),
                    key,
                    value,
                });
            }
            fields.push(parsed.builder.build(&root)?);
        }

        Ok(RootMapping { fields, unconsumed })
    }

    /// Parses a mapping from JSON text.
    pub fn parse_str(&self, json: &str) -> MapperResult<RootMapping> {
        let mapping: SchemaNode = serde_json::from_str(json)?;
        self.parse(mapping)
    }
}

/// The top-level fields of a parsed document mapping, in declaration order.
#[derive(Debug, Default)]
pub struct RootMapping {
    fields: Vec<Box<dyn FieldMapper>>,
    unconsumed: Vec<UnconsumedKey>,
}

impl RootMapping {
    pub fn fields(&self) -> impl Iterator<Item = &dyn FieldMapper> {
        self.fields.iter().map(Box::as_ref)
    }

    pub fn field(&self, name: &str) -> Option<&dyn FieldMapper> {
        self.fields().find(|field| field.simple_name() == name)
    }

    pub fn unconsumed(&self) -> &[UnconsumedKey] {
        &self.unconsumed
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Re-emits `{ "properties": { ... } }`.
    pub fn to_schema(&self) -> MapperResult<SchemaNode> {
        let mut properties = SchemaNode::new();
        for field in &self.fields {
            field.to_schema(&mut properties)?;
        }
        let mut mapping = SchemaNode::new();
        mapping.insert(PROPERTIES_KEY.to_string(), Value::Object(properties));
        Ok(mapping)
    }
}
