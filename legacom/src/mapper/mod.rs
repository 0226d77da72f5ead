//! Field mappers: the runtime definitions of mapped fields, their builders, and the
//! type parsers that turn schema nodes into builders.
//!
//! The flow for one field is always the same:
//!
//! ```text
//! schema node ──TypeParser::parse──▶ MapperBuilder ──build──▶ FieldMapper ──to_schema──▶ schema node
//! ```

pub mod completion;
pub mod keyword;
pub mod legacy;
pub mod multi_fields;
pub mod renamed;

use std::any::Any;
use std::fmt;

use serde_json::Value;

use crate::analysis::IndexAnalyzers;
use crate::errors::MapperResult;
use crate::node::SchemaNode;
use crate::registry::TypeRegistry;
use crate::settings::IndexSettings;
use crate::sink::SchemaSink;
use crate::version::IndexVersion;

pub use completion::{AnalyzingLookupProvider, CompletionBuilder, CompletionFieldMapper, CompletionOptions, CompletionTypeParser};
pub use keyword::{KeywordBuilder, KeywordFieldMapper, KeywordTypeParser};
pub use legacy::{LegacyCompletionBuilder, LegacyCompletionFieldMapper, LegacyCompletionTypeParser};
pub use multi_fields::{MultiFields, MultiFieldsBuilder};
pub use renamed::{RenamedFieldMapper, emit_tree, patch_type};

/// Runtime definition of one mapped field.
///
/// Implementations are immutable once built and may be shared across threads.
pub trait FieldMapper: Any + fmt::Debug + Send + Sync {
    /// Last path segment of the field name.
    fn simple_name(&self) -> &str;

    /// Dotted path of the field from the mapping root.
    fn full_name(&self) -> &str;

    /// Type identifier the field declares to the schema system.
    fn content_type(&self) -> &str;

    /// Appends this field's schema node to `out`, keyed by [`FieldMapper::simple_name`].
    fn to_schema(&self, out: &mut dyn SchemaSink) -> MapperResult<()>;

    fn as_any(&self) -> &dyn Any;
}

impl<'a> dyn FieldMapper + 'a {
    pub fn downcast_ref<T: FieldMapper>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    /// The field's schema body, without the enclosing simple-name key.
    pub fn schema_body(&self) -> MapperResult<SchemaNode> {
        let mut node = SchemaNode::new();
        self.to_schema(&mut node)?;
        match node.remove(self.simple_name()) {
            Some(Value::Object(body)) => Ok(body),
            _ => Ok(SchemaNode::new()),
        }
    }
}

/// Accumulates a field's configuration until it is built into a [`FieldMapper`].
pub trait MapperBuilder: fmt::Debug + Send {
    fn name(&self) -> &str;

    fn build(self: Box<Self>, context: &BuilderContext<'_>) -> MapperResult<Box<dyn FieldMapper>>;
}

/// Result of parsing one field's schema node.
#[derive(Debug)]
pub struct Parsed {
    pub builder: Box<dyn MapperBuilder>,
    /// Keys of the input node the parser did not consume, unaltered.
    pub residual: SchemaNode,
}

/// Entry point the schema system calls for every field declaring a registered type.
pub trait TypeParser: Send + Sync {
    fn parse(&self, name: &str, node: SchemaNode, context: &ParserContext<'_>) -> MapperResult<Parsed>;
}

/// Capabilities available to type parsers: analyzer lookup, the index-created version,
/// and the type registry used for nested multi-fields.
#[derive(Clone, Copy)]
pub struct ParserContext<'a> {
    registry: &'a TypeRegistry,
    analyzers: &'a IndexAnalyzers,
    version_created: IndexVersion,
    within_multi_field: bool,
}

impl<'a> ParserContext<'a> {
    pub fn new(registry: &'a TypeRegistry, analyzers: &'a IndexAnalyzers, version_created: IndexVersion) -> Self {
        Self {
            registry,
            analyzers,
            version_created,
            within_multi_field: false,
        }
    }

    pub fn analyzers(&self) -> &'a IndexAnalyzers {
        self.analyzers
    }

    pub fn version_created(&self) -> IndexVersion {
        self.version_created
    }

    pub fn type_parser(&self, type_name: &str) -> Option<&'a dyn TypeParser> {
        self.registry.get(type_name)
    }

    pub fn is_within_multi_field(&self) -> bool {
        self.within_multi_field
    }

    pub fn multi_field_context(&self) -> Self {
        Self {
            within_multi_field: true,
            ..*self
        }
    }
}

impl fmt::Debug for ParserContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParserContext")
            .field("version_created", &self.version_created)
            .field("within_multi_field", &self.within_multi_field)
            .finish_non_exhaustive()
    }
}

/// Construction context: index settings and the object path the field lives under.
#[derive(Debug, Clone)]
pub struct BuilderContext<'a> {
    settings: &'a IndexSettings,
    path: Vec<String>,
}

impl<'a> BuilderContext<'a> {
    pub fn root(settings: &'a IndexSettings) -> Self {
        Self {
            settings,
            path: Vec::new(),
        }
    }

    pub fn settings(&self) -> &'a IndexSettings {
        self.settings
    }

    /// Context for the children of the field `name`.
    pub fn child(&self, name: &str) -> Self {
        let mut path = self.path.clone();
        path.push(name.to_string());
        Self {
            settings: self.settings,
            path,
        }
    }

    pub fn full_name(&self, name: &str) -> String {
        if self.path.is_empty() {
            return name.to_string();
        }
        format!("{}.{name}", self.path.join("."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_names_follow_the_path() {
        let settings = IndexSettings::default();
        let root = BuilderContext::root(&settings);
        assert_eq!(root.full_name("title"), "title");
        let nested = root.child("title").child("raw");
        assert_eq!(nested.full_name("lower"), "title.raw.lower");
    }

    #[test]
    fn multi_field_context_keeps_capabilities() {
        let registry = TypeRegistry::with_builtin_types();
        let analyzers = IndexAnalyzers::default();
        let context = ParserContext::new(&registry, &analyzers, IndexVersion::V_1_7_0);
        let nested = context.multi_field_context();
        assert!(nested.is_within_multi_field());
        assert!(!context.is_within_multi_field());
        assert_eq!(nested.version_created(), IndexVersion::V_1_7_0);
        assert!(nested.type_parser("keyword").is_some());
    }
}
