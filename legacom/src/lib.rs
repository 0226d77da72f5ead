//! Legacy completion field type for document index mappings.
//!
//! `legacy_completion` fields are parsed and assembled by the `completion` field
//! implementation, so their suggestions keep the 2.x analyzing suggester format, while
//! the field declares and persists itself under its own type name:
//!
//! ```
//! use legacom::{IndexSettings, MappingParser, TypeRegistry};
//!
//! let settings = IndexSettings::default();
//! let parser = MappingParser::new(TypeRegistry::global(), &settings)?;
//! let mapping = parser.parse_str(r#"{"properties": {"suggest": {"type": "legacy_completion"}}}"#)?;
//! let saved = mapping.to_schema()?;
//! assert_eq!(saved["properties"]["suggest"]["type"], "legacy_completion");
//! # Ok::<(), legacom::MapperError>(())
//! ```

/// Const string equality comparison
pub(crate) const fn const_str_eq(a: &str, b: &str) -> bool {
    let a_bytes = a.as_bytes();
    let b_bytes = b.as_bytes();
    if a_bytes.len() != b_bytes.len() {
        return false;
    }
    let mut i = 0;
    while i < a_bytes.len() {
        if a_bytes[i] != b_bytes[i] {
            return false;
        }
        i += 1;
    }
    true
}

pub mod analysis;
pub mod context;
pub mod errors;
pub mod mapper;
pub mod mapping;
pub mod node;
pub mod registry;
pub mod settings;
pub mod sink;
pub mod version;

pub use analysis::{IndexAnalyzers, NamedAnalyzer};
pub use context::{ContextMapping, ContextMappings};
pub use errors::*;
pub use mapper::{
    BuilderContext, CompletionOptions, FieldMapper, LegacyCompletionFieldMapper, LegacyCompletionTypeParser,
    MapperBuilder, Parsed, ParserContext, RenamedFieldMapper, TypeParser,
};
pub use mapping::{MappingParser, RootMapping, UnconsumedKey};
pub use node::SchemaNode;
pub use registry::{TypeRegistration, TypeRegistry};
pub use settings::IndexSettings;
pub use sink::{JsonObjectWriter, SchemaSink};
pub use version::IndexVersion;

// Re-export inventory so plugin crates can submit type registrations
pub use inventory;
