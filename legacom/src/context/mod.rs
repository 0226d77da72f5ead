//! Context mappings attached to completion fields.
//!
//! A context mapping narrows or biases suggestions (by category or by location). The
//! completion field only parses, stores, and re-emits them; they are applied at query
//! time by the host engine.

mod category;
mod geo;

pub use category::CategoryContextMapping;
pub use geo::{DEFAULT_PRECISION, GeoContextMapping, MAX_PRECISION, encode_geohash, precision_for_distance};

use serde_json::Value;

use crate::errors::{MapperError, MapperResult};
use crate::node::{SchemaNode, TYPE_KEY, node_to_string};
use crate::version::IndexVersion;

#[derive(Debug, Clone, PartialEq)]
pub enum ContextMapping {
    Category(CategoryContextMapping),
    Geo(GeoContextMapping),
}

impl ContextMapping {
    pub fn name(&self) -> &str {
        match self {
            ContextMapping::Category(mapping) => &mapping.name,
            ContextMapping::Geo(mapping) => &mapping.name,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            ContextMapping::Category(_) => CategoryContextMapping::TYPE,
            ContextMapping::Geo(_) => GeoContextMapping::TYPE,
        }
    }

    /// The mapping's configuration body, `type` first.
    pub fn to_value(&self) -> Value {
        let mut body = SchemaNode::new();
        body.insert(TYPE_KEY.to_string(), Value::from(self.type_name()));
        match self {
            ContextMapping::Category(mapping) => mapping.write_body(&mut body),
            ContextMapping::Geo(mapping) => mapping.write_body(&mut body),
        }
        Value::Object(body)
    }
}

/// Context mappings of one field, unique by name, in declaration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContextMappings {
    mappings: Vec<ContextMapping>,
}

impl ContextMappings {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Appends a mapping, replacing an existing mapping of the same name in place.
    pub fn insert(&mut self, mapping: ContextMapping) {
        match self.mappings.iter_mut().find(|existing| existing.name() == mapping.name()) {
            Some(existing) => *existing = mapping,
            None => self.mappings.push(mapping),
        }
    }

    pub fn get(&self, name: &str) -> Option<&ContextMapping> {
        self.mappings.iter().find(|mapping| mapping.name() == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ContextMapping> {
        self.mappings.iter()
    }

    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }

    /// The `context` block as it appears in a field's schema node.
    pub fn to_value(&self) -> Value {
        let block: SchemaNode = self
            .mappings
            .iter()
            .map(|mapping| (mapping.name().to_string(), mapping.to_value()))
            .collect();
        Value::Object(block)
    }
}

/// Parses a field's `context` block.
///
/// `null` yields no mappings. For indices created on or after 2.0.0-beta1 any key a
/// mapping does not understand is an error; older indices silently drop them.
pub fn load_mappings(field: &str, config: &Value, version: IndexVersion) -> MapperResult<ContextMappings> {
    let mut mappings = ContextMappings::empty();
    match config {
        Value::Null => Ok(mappings),
        Value::Object(block) => {
            for (name, entry) in block {
                let Value::Object(entry) = entry else {
                    return Err(MapperError::parsing(
                        field,
                        format!("context mapping [{name}] must be an object"),
                    ));
                };
                mappings.insert(load_mapping(field, name, entry.clone(), version)?);
            }
            Ok(mappings)
        }
        _ => Err(MapperError::parsing(field, "no valid context configuration")),
    }
}

fn load_mapping(field: &str, name: &str, mut config: SchemaNode, version: IndexVersion) -> MapperResult<ContextMapping> {
    let Some(kind) = config.remove(TYPE_KEY) else {
        return Err(MapperError::parsing(
            field,
            format!("missing [{TYPE_KEY}] in context mapping [{name}]"),
        ));
    };

    let mapping = match node_to_string(&kind).as_str() {
        CategoryContextMapping::TYPE => ContextMapping::Category(CategoryContextMapping::load(name, &mut config)),
        GeoContextMapping::TYPE => ContextMapping::Geo(GeoContextMapping::load(field, name, &mut config)?),
        other => {
            return Err(MapperError::parsing(field, format!("unknown context type [{other}]")));
        }
    };

    if !config.is_empty() {
        let leftover: Vec<&str> = config.keys().map(String::as_str).collect();
        if version.on_or_after(IndexVersion::V_2_0_0_BETA1) {
            return Err(MapperError::parsing(
                field,
                format!("context mapping [{name}] has unsupported parameters: {leftover:?}"),
            ));
        }
        log::debug!("ignoring unsupported parameters {leftover:?} in context mapping [{name}] of field [{field}]");
    }

    Ok(mapping)
}
