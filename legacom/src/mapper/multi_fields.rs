//! Multi-fields: additional sub-fields indexing the same value in other ways.

use serde_json::Value;

use super::{BuilderContext, FieldMapper, MapperBuilder, ParserContext};
use crate::errors::{MapperError, MapperResult};
use crate::node::{SchemaNode, TYPE_KEY, node_to_string};
use crate::sink::SchemaSink;

pub const FIELDS_KEY: &str = "fields";

/// Types that describe structure rather than values and cannot be multi-fields.
const OBJECT_TYPES: &[&str] = &["object", "nested"];

#[derive(Debug, Default)]
pub struct MultiFieldsBuilder {
    builders: Vec<Box<dyn MapperBuilder>>,
}

impl MultiFieldsBuilder {
    /// Adds a sub-field builder; a later builder with the same name replaces the earlier one.
    pub fn add(&mut self, builder: Box<dyn MapperBuilder>) {
        self.builders.retain(|existing| existing.name() != builder.name());
        self.builders.push(builder);
    }

    pub fn is_empty(&self) -> bool {
        self.builders.is_empty()
    }

    /// Builds every sub-field in the context of their parent field.
    pub fn build(self, parent: &BuilderContext<'_>) -> MapperResult<MultiFields> {
        let mappers = self
            .builders
            .into_iter()
            .map(|builder| builder.build(parent))
            .collect::<MapperResult<Vec<_>>>()?;
        Ok(MultiFields { mappers })
    }
}

#[derive(Debug, Default)]
pub struct MultiFields {
    mappers: Vec<Box<dyn FieldMapper>>,
}

impl MultiFields {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.mappers.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn FieldMapper> {
        self.mappers.iter().map(Box::as_ref)
    }

    pub fn get(&self, simple_name: &str) -> Option<&dyn FieldMapper> {
        self.iter().find(|mapper| mapper.simple_name() == simple_name)
    }

    /// Appends the `fields` block, if there are any sub-fields.
    pub fn to_schema(&self, out: &mut dyn SchemaSink) -> MapperResult<()> {
        if self.mappers.is_empty() {
            return Ok(());
        }
        let mut block = SchemaNode::new();
        for mapper in &self.mappers {
            mapper.to_schema(&mut block)?;
        }
        out.field(FIELDS_KEY, Value::Object(block))
    }
}

/// Handles the `fields` key of a field's schema node.
///
/// Returns `Ok(false)` for any other key so the caller can keep looking. Each sub-field
/// is parsed by the parser registered for its own `type`; keys the sub-parser leaves
/// unconsumed are an error.
pub fn parse_multi_field(
    builder: &mut MultiFieldsBuilder,
    field: &str,
    context: &ParserContext<'_>,
    key: &str,
    value: &Value,
) -> MapperResult<bool> {
    if key != FIELDS_KEY {
        return Ok(false);
    }

    let context = context.multi_field_context();
    let entries = match value {
        Value::Array(items) if items.is_empty() => return Ok(true),
        Value::Object(entries) => entries,
        other => {
            return Err(MapperError::parsing(
                field,
                format!("expected map for property [{FIELDS_KEY}] but got [{other}]"),
            ));
        }
    };

    for (sub_name, sub_node) in entries {
        if sub_name.contains('.') {
            return Err(MapperError::parsing(
                field,
                format!("field name [{sub_name}] which is a multi field of [{field}] cannot contain '.'"),
            ));
        }
        let Value::Object(sub_node) = sub_node else {
            return Err(MapperError::parsing(
                field,
                format!("illegal field [{sub_name}], only fields can be specified inside fields"),
            ));
        };
        let Some(type_name) = sub_node.get(TYPE_KEY).map(node_to_string) else {
            return Err(MapperError::parsing(field, format!("no type specified for property [{sub_name}]")));
        };
        if OBJECT_TYPES.contains(&type_name.as_str()) {
            return Err(MapperError::parsing(
                field,
                format!("type [{type_name}] cannot be used in multi field"),
            ));
        }
        let parser = context.type_parser(&type_name).ok_or_else(|| MapperError::UnknownType {
            field: sub_name.clone(),
            type_name: type_name.clone(),
        })?;

        log::debug!("parsing multi field [{field}.{sub_name}] of type [{type_name}]");
        let mut parsed = parser.parse(sub_name, sub_node.clone(), &context)?;
        parsed.residual.remove(TYPE_KEY);
        if !parsed.residual.is_empty() {
            let leftover: Vec<&str> = parsed.residual.keys().map(String::as_str).collect();
            return Err(MapperError::parsing(
                field,
                format!("multi field [{sub_name}] has unsupported parameters: {leftover:?}"),
            ));
        }
        builder.add(parsed.builder);
    }

    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::IndexAnalyzers;
    use crate::registry::TypeRegistry;
    use crate::settings::IndexSettings;
    use crate::version::IndexVersion;
    use serde_json::json;

    fn parse(value: Value) -> MapperResult<MultiFieldsBuilder> {
        let registry = TypeRegistry::with_builtin_types();
        let analyzers = IndexAnalyzers::default();
        let context = ParserContext::new(&registry, &analyzers, IndexVersion::CURRENT);
        let mut builder = MultiFieldsBuilder::default();
        assert!(parse_multi_field(&mut builder, "title", &context, FIELDS_KEY, &value)?);
        Ok(builder)
    }

    #[test]
    fn other_keys_are_not_consumed() {
        let registry = TypeRegistry::with_builtin_types();
        let analyzers = IndexAnalyzers::default();
        let context = ParserContext::new(&registry, &analyzers, IndexVersion::CURRENT);
        let mut builder = MultiFieldsBuilder::default();
        let consumed = parse_multi_field(&mut builder, "title", &context, "analyzer", &json!("simple")).unwrap();
        assert!(!consumed);
        assert!(builder.is_empty());
    }

    #[test]
    fn builds_sub_fields_under_parent_path() {
        let builder = parse(json!({"raw": {"type": "keyword", "ignore_above": 256}})).unwrap();
        let settings = IndexSettings::default();
        let parent = BuilderContext::root(&settings).child("title");
        let fields = builder.build(&parent).unwrap();
        let raw = fields.get("raw").unwrap();
        assert_eq!(raw.full_name(), "title.raw");
        assert_eq!(raw.content_type(), "keyword");
    }

    #[test]
    fn empty_list_means_no_sub_fields() {
        assert!(parse(json!([])).unwrap().is_empty());
    }

    #[test]
    fn malformed_sub_fields_are_rejected() {
        assert!(parse(json!("raw")).is_err());
        assert!(parse(json!({"a.b": {"type": "keyword"}})).is_err());
        assert!(parse(json!({"raw": "keyword"})).is_err());
        assert!(parse(json!({"raw": {"ignore_above": 10}})).is_err());
        assert!(parse(json!({"raw": {"type": "object"}})).is_err());
        assert!(parse(json!({"raw": {"type": "keyword", "boost": 2}})).is_err());

        let err = parse(json!({"raw": {"type": "geo_shape"}})).unwrap_err();
        assert!(matches!(err, MapperError::UnknownType { .. }));
    }
}
