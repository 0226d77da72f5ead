//! The `legacy_completion` field type.
//!
//! Fields of this type are parsed and assembled exactly like `completion` fields, so
//! their suggestions are indexed in the 2.x analyzing format, but they declare and
//! persist themselves as `legacy_completion`. A mapping saved with such a field therefore
//! resolves back to this type when it is loaded again.

use super::completion::{self, CompletionBuilder, CompletionFieldMapper, CompletionTypeParser};
use super::renamed::RenamedFieldMapper;
use super::{BuilderContext, FieldMapper, MapperBuilder, Parsed, ParserContext, TypeParser};
use crate::errors::MapperResult;
use crate::node::SchemaNode;

pub const CONTENT_TYPE: &str = "legacy_completion";

const _: () = assert!(!crate::const_str_eq(CONTENT_TYPE, completion::CONTENT_TYPE));

/// A completion field declaring itself as `legacy_completion`.
pub type LegacyCompletionFieldMapper = RenamedFieldMapper<CompletionFieldMapper>;

#[derive(Debug)]
pub struct LegacyCompletionBuilder {
    inner: CompletionBuilder,
}

impl LegacyCompletionBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            inner: CompletionBuilder::new(name),
        }
    }

    /// The completion builder doing the assembly, for programmatic configuration.
    pub fn completion(&mut self) -> &mut CompletionBuilder {
        &mut self.inner
    }

    pub fn build_mapper(self, context: &BuilderContext<'_>) -> MapperResult<LegacyCompletionFieldMapper> {
        let base = self.inner.build_mapper(context)?;
        Ok(RenamedFieldMapper::new(base, CONTENT_TYPE))
    }
}

impl From<CompletionBuilder> for LegacyCompletionBuilder {
    fn from(inner: CompletionBuilder) -> Self {
        Self { inner }
    }
}

impl MapperBuilder for LegacyCompletionBuilder {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn build(self: Box<Self>, context: &BuilderContext<'_>) -> MapperResult<Box<dyn FieldMapper>> {
        Ok(Box::new(self.build_mapper(context)?))
    }
}

/// Type parser registered under [`CONTENT_TYPE`].
#[derive(Debug, Default, Clone, Copy)]
pub struct LegacyCompletionTypeParser;

impl LegacyCompletionTypeParser {
    pub fn parse_builder(
        &self,
        name: &str,
        node: SchemaNode,
        context: &ParserContext<'_>,
    ) -> MapperResult<(LegacyCompletionBuilder, SchemaNode)> {
        let (builder, residual) = CompletionTypeParser.parse_builder(name, node, context)?;
        Ok((builder.into(), residual))
    }
}

impl TypeParser for LegacyCompletionTypeParser {
    fn parse(&self, name: &str, node: SchemaNode, context: &ParserContext<'_>) -> MapperResult<Parsed> {
        let (builder, residual) = self.parse_builder(name, node, context)?;
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
    use crate::errors::ErrorKind;
    use crate::registry::TypeRegistry;
    use crate::settings::IndexSettings;
    use crate::version::IndexVersion;
    use serde_json::{Value, json};

    fn build(node: Value) -> MapperResult<LegacyCompletionFieldMapper> {
        let registry = TypeRegistry::with_builtin_types();
        let analyzers = IndexAnalyzers::default();
        let context = ParserContext::new(&registry, &analyzers, IndexVersion::CURRENT);
        let (builder, _) = LegacyCompletionTypeParser.parse_builder(
            "suggest",
            node.as_object().cloned().unwrap(),
            &context,
        )?;
        let settings = IndexSettings::default();
        builder.build_mapper(&BuilderContext::root(&settings))
    }

    #[test]
    fn declares_the_alternate_type() {
        let mapper = build(json!({"type": CONTENT_TYPE})).unwrap();
        assert_eq!(mapper.content_type(), CONTENT_TYPE);
        assert_eq!(mapper.base_content_type(), completion::CONTENT_TYPE);
        assert_eq!(mapper.simple_name(), "suggest");
    }

    #[test]
    fn serializes_like_completion_except_for_type() {
        let mapper = build(json!({"analyzer": "standard", "payloads": true})).unwrap();

        let mut base = SchemaNode::new();
        mapper.inner().to_schema(&mut base).unwrap();
        let mut renamed = SchemaNode::new();
        mapper.to_schema(&mut renamed).unwrap();

        let mut base_body = base["suggest"].as_object().cloned().unwrap();
        let renamed_body = renamed["suggest"].as_object().unwrap();
        assert_eq!(base_body["type"], json!("completion"));
        assert_eq!(renamed_body["type"], json!(CONTENT_TYPE));
        assert!(base_body.keys().eq(renamed_body.keys()));

        base_body.insert("type".into(), json!(CONTENT_TYPE));
        assert_eq!(&base_body, renamed_body);
    }

    #[test]
    fn invalid_length_never_builds() {
        let err = build(json!({"type": CONTENT_TYPE, "max_input_length": 0})).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn programmatic_configuration_goes_through_the_completion_builder() {
        let mut builder = LegacyCompletionBuilder::new("suggest");
        builder.completion().payloads(true).max_input_length(7).unwrap();
        let settings = IndexSettings::default();
        let mapper = builder.build_mapper(&BuilderContext::root(&settings)).unwrap();
        assert!(mapper.inner().options().has_payloads());
        assert_eq!(mapper.inner().options().max_input_length(), 7);
        assert_eq!(mapper.inner().options().index_analyzer().name(), "simple");
    }
}
