//! The `completion` field: an analyzing suggester field in the 2.x on-disk format.
//!
//! [`CompletionTypeParser::parse_builder`] is the options parser shared by every field
//! type assembled from this implementation, including `legacy_completion`.

use std::any::Any;

use serde_json::Value;

use super::multi_fields::{MultiFields, MultiFieldsBuilder, parse_multi_field};
use super::{BuilderContext, FieldMapper, MapperBuilder, Parsed, ParserContext, TypeParser};
use crate::analysis::{DEFAULT_ANALYZER, NamedAnalyzer};
use crate::context::{ContextMappings, load_mappings};
use crate::errors::{MapperError, MapperResult};
use crate::node::{SchemaNode, TYPE_KEY, node_boolean, node_integer, node_to_string};
use crate::sink::SchemaSink;
use crate::version::{IndexVersion, KeyGate, KeySpelling, accepts};

pub const CONTENT_TYPE: &str = "completion";

pub mod defaults {
    pub const PRESERVE_SEPARATORS: bool = true;
    pub const HAS_PAYLOADS: bool = false;
    pub const PRESERVE_POSITION_INCREMENTS: bool = true;
    pub const MAX_INPUT_LENGTH: u32 = 50;
}

pub mod keys {
    pub const ANALYZER: &str = "analyzer";
    pub const INDEX_ANALYZER: &str = "index_analyzer";
    pub const SEARCH_ANALYZER: &str = "search_analyzer";
    pub const PAYLOADS: &str = "payloads";
    pub const PRESERVE_SEPARATORS: &str = "preserve_separators";
    pub const PRESERVE_POSITION_INCREMENTS: &str = "preserve_position_increments";
    pub const MAX_INPUT_LENGTH: &str = "max_input_length";
    pub const MAX_INPUT_LEN: &str = "max_input_len";
    pub const CONTEXT: &str = "context";
    pub const COPY_TO: &str = "copy_to";
}

/// Spellings that set the index analyzer.
pub const INDEX_ANALYZER_KEYS: &[KeySpelling] = &[
    KeySpelling {
        key: keys::ANALYZER,
        gate: KeyGate::Always,
        deprecated: false,
    },
    KeySpelling {
        key: keys::INDEX_ANALYZER,
        gate: KeyGate::Before(IndexVersion::V_2_0_0_BETA1),
        deprecated: true,
    },
];

/// Spellings that set the maximum input length.
pub const MAX_INPUT_LENGTH_KEYS: &[KeySpelling] = &[
    KeySpelling {
        key: keys::MAX_INPUT_LENGTH,
        gate: KeyGate::Always,
        deprecated: false,
    },
    KeySpelling {
        key: keys::MAX_INPUT_LEN,
        gate: KeyGate::Always,
        deprecated: true,
    },
];

/// Validated configuration of a completion field.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionOptions {
    preserve_separators: bool,
    payloads: bool,
    preserve_position_increments: bool,
    max_input_length: u32,
    context_mappings: ContextMappings,
    index_analyzer: NamedAnalyzer,
    search_analyzer: NamedAnalyzer,
}

impl CompletionOptions {
    pub fn preserve_separators(&self) -> bool {
        self.preserve_separators
    }

    pub fn has_payloads(&self) -> bool {
        self.payloads
    }

    pub fn preserve_position_increments(&self) -> bool {
        self.preserve_position_increments
    }

    pub fn max_input_length(&self) -> u32 {
        self.max_input_length
    }

    pub fn context_mappings(&self) -> &ContextMappings {
        &self.context_mappings
    }

    pub fn index_analyzer(&self) -> &NamedAnalyzer {
        &self.index_analyzer
    }

    pub fn search_analyzer(&self) -> &NamedAnalyzer {
        &self.search_analyzer
    }
}

/// Lookup provider writing the analyzing suggester postings format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalyzingLookupProvider {
    preserve_separators: bool,
    preserve_position_increments: bool,
    has_payloads: bool,
}

impl AnalyzingLookupProvider {
    pub const NAME: &'static str = "analyzing";
    pub const CODEC_VERSION: u32 = 2;

    const SERIALIZE_PRESERVE_SEPARATORS: u32 = 1;
    const SERIALIZE_HAS_PAYLOADS: u32 = 2;
    const SERIALIZE_PRESERVE_POSITION_INCREMENTS: u32 = 4;

    pub fn new(preserve_separators: bool, preserve_position_increments: bool, has_payloads: bool) -> Self {
        Self {
            preserve_separators,
            preserve_position_increments,
            has_payloads,
        }
    }

    pub fn preserve_separators(&self) -> bool {
        self.preserve_separators
    }

    pub fn preserve_position_increments(&self) -> bool {
        self.preserve_position_increments
    }

    pub fn has_payloads(&self) -> bool {
        self.has_payloads
    }

    /// Option flags as stored in the postings header of each segment.
    pub fn options_bits(&self) -> u32 {
        let mut bits = 0;
        if self.preserve_separators {
            bits |= Self::SERIALIZE_PRESERVE_SEPARATORS;
        }
        if self.has_payloads {
            bits |= Self::SERIALIZE_HAS_PAYLOADS;
        }
        if self.preserve_position_increments {
            bits |= Self::SERIALIZE_PRESERVE_POSITION_INCREMENTS;
        }
        bits
    }
}

#[derive(Debug)]
pub struct CompletionBuilder {
    name: String,
    preserve_separators: bool,
    payloads: bool,
    preserve_position_increments: bool,
    max_input_length: u32,
    context_mappings: ContextMappings,
    index_analyzer: Option<NamedAnalyzer>,
    search_analyzer: Option<NamedAnalyzer>,
    multi_fields: MultiFieldsBuilder,
    copy_to: Vec<String>,
}

impl CompletionBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            preserve_separators: defaults::PRESERVE_SEPARATORS,
            payloads: defaults::HAS_PAYLOADS,
            preserve_position_increments: defaults::PRESERVE_POSITION_INCREMENTS,
            max_input_length: defaults::MAX_INPUT_LENGTH,
            context_mappings: ContextMappings::empty(),
            index_analyzer: None,
            search_analyzer: None,
            multi_fields: MultiFieldsBuilder::default(),
            copy_to: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn payloads(&mut self, payloads: bool) -> &mut Self {
        self.payloads = payloads;
        self
    }

    pub fn preserve_separators(&mut self, preserve_separators: bool) -> &mut Self {
        self.preserve_separators = preserve_separators;
        self
    }

    pub fn preserve_position_increments(&mut self, preserve_position_increments: bool) -> &mut Self {
        self.preserve_position_increments = preserve_position_increments;
        self
    }

    /// Rejects values `<= 0`, leaving the builder unchanged.
    pub fn max_input_length(&mut self, max_input_length: i32) -> MapperResult<&mut Self> {
        match u32::try_from(max_input_length) {
            Ok(length) if length > 0 => {
                self.max_input_length = length;
                Ok(self)
            }
            _ => Err(MapperError::invalid_argument(
                self.name.as_str(),
                format!("{} must be > 0 but was [{max_input_length}]", keys::MAX_INPUT_LENGTH),
            )),
        }
    }

    pub fn context_mappings(&mut self, context_mappings: ContextMappings) -> &mut Self {
        self.context_mappings = context_mappings;
        self
    }

    pub fn index_analyzer(&mut self, analyzer: NamedAnalyzer) -> &mut Self {
        self.index_analyzer = Some(analyzer);
        self
    }

    pub fn search_analyzer(&mut self, analyzer: NamedAnalyzer) -> &mut Self {
        self.search_analyzer = Some(analyzer);
        self
    }

    pub fn add_multi_field(&mut self, builder: Box<dyn MapperBuilder>) -> &mut Self {
        self.multi_fields.add(builder);
        self
    }

    pub fn copy_to(&mut self, targets: impl IntoIterator<Item = impl Into<String>>) -> &mut Self {
        self.copy_to = targets.into_iter().map(Into::into).collect();
        self
    }

    /// Assembles the field: builds multi-fields beneath this field's path, configures the
    /// lookup provider, and attaches the context mappings.
    pub fn build_mapper(self, context: &BuilderContext<'_>) -> MapperResult<CompletionFieldMapper> {
        let index_analyzer = self
            .index_analyzer
            .unwrap_or_else(|| NamedAnalyzer::built_in(DEFAULT_ANALYZER));
        let search_analyzer = self.search_analyzer.unwrap_or_else(|| index_analyzer.clone());
        let provider = AnalyzingLookupProvider::new(
            self.preserve_separators,
            self.preserve_position_increments,
            self.payloads,
        );
        let multi_fields = self.multi_fields.build(&context.child(&self.name))?;

        Ok(CompletionFieldMapper {
            full_name: context.full_name(&self.name),
            simple_name: self.name,
            options: CompletionOptions {
                preserve_separators: self.preserve_separators,
                payloads: self.payloads,
                preserve_position_increments: self.preserve_position_increments,
                max_input_length: self.max_input_length,
                context_mappings: self.context_mappings,
                index_analyzer,
                search_analyzer,
            },
            provider,
            multi_fields,
            copy_to: self.copy_to,
        })
    }
}

impl MapperBuilder for CompletionBuilder {
    fn name(&self) -> &str {
        &self.name
    }

    fn build(self: Box<Self>, context: &BuilderContext<'_>) -> MapperResult<Box<dyn FieldMapper>> {
        Ok(Box::new(self.build_mapper(context)?))
    }
}

#[derive(Debug)]
pub struct CompletionFieldMapper {
    simple_name: String,
    full_name: String,
    options: CompletionOptions,
    provider: AnalyzingLookupProvider,
    multi_fields: MultiFields,
    copy_to: Vec<String>,
}

impl CompletionFieldMapper {
    pub fn options(&self) -> &CompletionOptions {
        &self.options
    }

    pub fn provider(&self) -> &AnalyzingLookupProvider {
        &self.provider
    }

    pub fn multi_fields(&self) -> &MultiFields {
        &self.multi_fields
    }

    pub fn copy_to(&self) -> &[String] {
        &self.copy_to
    }

    pub fn requires_context(&self) -> bool {
        !self.options.context_mappings.is_empty()
    }
}

impl FieldMapper for CompletionFieldMapper {
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
        let options = &self.options;
        let mut body = SchemaNode::new();
        body.field(TYPE_KEY, Value::from(CONTENT_TYPE))?;
        body.field(keys::ANALYZER, Value::from(options.index_analyzer.name()))?;
        body.field(keys::SEARCH_ANALYZER, Value::from(options.search_analyzer.name()))?;
        body.field(keys::PAYLOADS, Value::Bool(self.provider.has_payloads()))?;
        body.field(keys::PRESERVE_SEPARATORS, Value::Bool(self.provider.preserve_separators()))?;
        body.field(
            keys::PRESERVE_POSITION_INCREMENTS,
            Value::Bool(self.provider.preserve_position_increments()),
        )?;
        body.field(keys::MAX_INPUT_LENGTH, Value::from(options.max_input_length))?;
        self.multi_fields.to_schema(&mut body)?;
        if !self.copy_to.is_empty() {
            let targets = self.copy_to.iter().map(|target| Value::from(target.as_str())).collect();
            body.field(keys::COPY_TO, Value::Array(targets))?;
        }
        if self.requires_context() {
            body.field(keys::CONTEXT, options.context_mappings.to_value())?;
        }
        out.field(&self.simple_name, Value::Object(body))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Working record for the first parsing pass: raw values of every recognized key.
#[derive(Debug, Default)]
struct RawCompletionOptions {
    index_analyzer: Option<String>,
    search_analyzer: Option<String>,
    context_mappings: Option<ContextMappings>,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct CompletionTypeParser;

impl CompletionTypeParser {
    /// Parses a completion field's schema node into a builder and the residual node.
    ///
    /// Keys are consumed in a first pass; a repeated key keeps its last value. Unknown
    /// keys, and the `type` key, are returned untouched in the residual node. The second
    /// pass resolves analyzers:
    ///
    /// * no index analyzer and a search analyzer is a configuration conflict;
    /// * no analyzer at all falls back to the built-in `simple` analyzer for both;
    /// * an index analyzer alone is also used for search.
    pub fn parse_builder(
        &self,
        name: &str,
        node: SchemaNode,
        context: &ParserContext<'_>,
    ) -> MapperResult<(CompletionBuilder, SchemaNode)> {
        let version = context.version_created();
        let mut builder = CompletionBuilder::new(name);
        let mut raw = RawCompletionOptions::default();
        let mut residual = SchemaNode::new();

        for (key, value) in node {
            if key == TYPE_KEY {
                residual.insert(key, value);
            } else if accepts(INDEX_ANALYZER_KEYS, &key, version) {
                raw.index_analyzer = Some(node_to_string(&value));
            } else if key == keys::SEARCH_ANALYZER {
                raw.search_analyzer = Some(node_to_string(&value));
            } else if key == keys::PAYLOADS {
                builder.payloads(node_boolean(&value));
            } else if key == keys::PRESERVE_SEPARATORS {
                builder.preserve_separators(node_boolean(&value));
            } else if key == keys::PRESERVE_POSITION_INCREMENTS {
                builder.preserve_position_increments(node_boolean(&value));
            } else if accepts(MAX_INPUT_LENGTH_KEYS, &key, version) {
                builder.max_input_length(node_integer(name, keys::MAX_INPUT_LENGTH, &value)?)?;
            } else if parse_multi_field(&mut builder.multi_fields, name, context, &key, &value)? {
                continue;
            } else if key == keys::CONTEXT {
                raw.context_mappings = Some(load_mappings(name, &value, version)?);
            } else {
                residual.insert(key, value);
            }
        }

        let analyzers = context.analyzers();
        let resolve = |analyzer: String| {
            analyzers.get(&analyzer).cloned().ok_or_else(|| MapperError::UnresolvableReference {
                field: name.to_string(),
                analyzer,
            })
        };
        let (index_analyzer, search_analyzer) = match (raw.index_analyzer, raw.search_analyzer) {
            (None, Some(_)) => {
                return Err(MapperError::ConfigurationConflict {
                    field: name.to_string(),
                });
            }
            (None, None) => {
                let fallback = analyzers.default_analyzer();
                (fallback.clone(), fallback)
            }
            (Some(index), None) => {
                let index = resolve(index)?;
                (index.clone(), index)
            }
            (Some(index), Some(search)) => (resolve(index)?, resolve(search)?),
        };
        builder.index_analyzer(index_analyzer).search_analyzer(search_analyzer);
        if let Some(context_mappings) = raw.context_mappings {
            builder.context_mappings(context_mappings);
        }

        Ok((builder, residual))
    }
}

impl TypeParser for CompletionTypeParser {
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
    use serde_json::json;

    fn parse_at(node: Value, version: IndexVersion) -> MapperResult<(CompletionBuilder, SchemaNode)> {
        let registry = TypeRegistry::with_builtin_types();
        let analyzers = IndexAnalyzers::default();
        let context = ParserContext::new(&registry, &analyzers, version);
        CompletionTypeParser.parse_builder("suggest", node.as_object().cloned().unwrap(), &context)
    }

    fn build(node: Value) -> CompletionFieldMapper {
        let (builder, _) = parse_at(node, IndexVersion::CURRENT).unwrap();
        let settings = IndexSettings::default();
        builder.build_mapper(&BuilderContext::root(&settings)).unwrap()
    }

    #[test]
    fn defaults_match_the_suggester_format() {
        let mapper = build(json!({"type": "completion"}));
        let options = mapper.options();
        assert!(options.preserve_separators());
        assert!(!options.has_payloads());
        assert!(options.preserve_position_increments());
        assert_eq!(options.max_input_length(), defaults::MAX_INPUT_LENGTH);
        assert_eq!(options.index_analyzer().name(), "simple");
        assert_eq!(options.search_analyzer().name(), "simple");
        assert_eq!(mapper.provider().options_bits(), 0b101);
    }

    #[test]
    fn flags_reach_the_lookup_provider() {
        let mapper = build(json!({
            "payloads": true,
            "preserve_separators": "false",
            "preserve_position_increments": false
        }));
        let provider = mapper.provider();
        assert!(provider.has_payloads());
        assert!(!provider.preserve_separators());
        assert!(!provider.preserve_position_increments());
        assert_eq!(provider.options_bits(), 0b010);
    }

    #[test]
    fn max_input_length_must_be_positive() {
        for value in [json!(0), json!(-3), json!("0")] {
            let err = parse_at(json!({"max_input_length": value}), IndexVersion::CURRENT).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidArgument);
            assert!(err.to_string().contains("max_input_length"));
            assert!(err.to_string().contains("suggest"));
        }
        let err = parse_at(json!({"max_input_length": "many"}), IndexVersion::CURRENT).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn deprecated_max_input_len_is_accepted() {
        let mapper = build(json!({"max_input_len": 20}));
        assert_eq!(mapper.options().max_input_length(), 20);
    }

    #[test]
    fn index_analyzer_spelling_is_version_gated() {
        let (builder, residual) = parse_at(json!({"index_analyzer": "standard"}), IndexVersion::V_1_7_0).unwrap();
        assert!(residual.is_empty());
        let settings = IndexSettings::default();
        let mapper = builder.build_mapper(&BuilderContext::root(&settings)).unwrap();
        assert_eq!(mapper.options().index_analyzer().name(), "standard");
        assert_eq!(mapper.options().search_analyzer().name(), "standard");

        let (_, residual) = parse_at(json!({"index_analyzer": "standard"}), IndexVersion::V_2_0_0).unwrap();
        assert_eq!(residual.get("index_analyzer"), Some(&json!("standard")));
    }

    #[test]
    fn unknown_analyzer_is_an_unresolvable_reference() {
        let err = parse_at(json!({"analyzer": "autocomplete"}), IndexVersion::CURRENT).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnresolvableReference);
        assert!(err.to_string().contains("[autocomplete]"));

        let err = parse_at(json!({"analyzer": "simple", "search_analyzer": "fuzzy"}), IndexVersion::CURRENT)
            .unwrap_err();
        assert!(matches!(err, MapperError::UnresolvableReference { ref analyzer, .. } if analyzer == "fuzzy"));
    }

    #[test]
    fn search_analyzer_alone_conflicts_even_when_unknown() {
        let err = parse_at(json!({"search_analyzer": "nope"}), IndexVersion::CURRENT).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConfigurationConflict);
    }

    #[test]
    fn schema_lists_every_option_in_order() {
        let mapper = build(json!({
            "analyzer": "standard",
            "search_analyzer": "whitespace",
            "max_input_length": 10,
            "fields": {"raw": {"type": "keyword"}},
            "context": {"genre": {"type": "category"}}
        }));
        let mut out = SchemaNode::new();
        mapper.to_schema(&mut out).unwrap();
        let body = out["suggest"].as_object().unwrap();
        let keys: Vec<&str> = body.keys().map(String::as_str).collect();
        assert_eq!(
            keys,
            [
                "type",
                "analyzer",
                "search_analyzer",
                "payloads",
                "preserve_separators",
                "preserve_position_increments",
                "max_input_length",
                "fields",
                "context"
            ]
        );
        assert_eq!(body["type"], json!("completion"));
        assert_eq!(body["fields"], json!({"raw": {"type": "keyword"}}));
        assert_eq!(body["context"], json!({"genre": {"type": "category", "default": []}}));
    }

    #[test]
    fn copy_to_targets_are_emitted() {
        let mut builder = CompletionBuilder::new("suggest");
        builder.copy_to(["all", "suggest_copy"]);
        let settings = IndexSettings::default();
        let mapper = builder.build_mapper(&BuilderContext::root(&settings).child("doc")).unwrap();
        assert_eq!(mapper.full_name(), "doc.suggest");
        assert_eq!(mapper.copy_to(), ["all", "suggest_copy"]);
        let body = (&mapper as &dyn FieldMapper).schema_body().unwrap();
        assert_eq!(body["copy_to"], json!(["all", "suggest_copy"]));
    }
}
