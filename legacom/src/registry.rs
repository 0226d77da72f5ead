//! Type-name → type-parser bindings.
//!
//! Built-in types are registered explicitly. Crates adding further field types submit a
//! [`TypeRegistration`] through `inventory`; every submission linked into the process is
//! collected the first time [`TypeRegistry::global`] is called, after which the registry
//! is read-only.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, OnceLock};

use crate::errors::{MapperError, MapperResult};
use crate::mapper::{CompletionTypeParser, KeywordTypeParser, LegacyCompletionTypeParser, TypeParser, completion, keyword, legacy};

/// A field type contributed by another crate.
///
/// ```text
/// inventory::submit! {
///     legacom::TypeRegistration { name: "my_type", parser: my_type_parser }
/// }
/// ```
pub struct TypeRegistration {
    /// Type name as it appears in schema nodes.
    pub name: &'static str,
    /// Constructs the parser bound to `name`.
    pub parser: fn() -> Box<dyn TypeParser>,
}

inventory::collect!(TypeRegistration);

/// All registered plugin types.
pub fn registered_types() -> impl Iterator<Item = &'static TypeRegistration> {
    inventory::iter::<TypeRegistration>()
}

static GLOBAL: OnceLock<TypeRegistry> = OnceLock::new();

#[derive(Default)]
pub struct TypeRegistry {
    parsers: BTreeMap<String, Arc<dyn TypeParser>>,
}

impl TypeRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// `completion`, `legacy_completion` and `keyword`.
    pub fn with_builtin_types() -> Self {
        let mut parsers: BTreeMap<String, Arc<dyn TypeParser>> = BTreeMap::new();
        parsers.insert(completion::CONTENT_TYPE.to_string(), Arc::new(CompletionTypeParser));
        parsers.insert(legacy::CONTENT_TYPE.to_string(), Arc::new(LegacyCompletionTypeParser));
        parsers.insert(keyword::CONTENT_TYPE.to_string(), Arc::new(KeywordTypeParser));
        Self { parsers }
    }

    /// Built-in types plus every [`TypeRegistration`] submitted through `inventory`.
    pub fn with_registered_types() -> MapperResult<Self> {
        let mut registry = Self::with_builtin_types();
        for registration in registered_types() {
            log::debug!("registering field type [{}]", registration.name);
            registry.register(registration.name, Arc::from((registration.parser)()))?;
        }
        Ok(registry)
    }

    /// The process-wide registry, initialised on first use.
    ///
    /// # Panics
    ///
    /// Panics if two registrations claim the same type name.
    pub fn global() -> &'static TypeRegistry {
        GLOBAL.get_or_init(|| match Self::with_registered_types() {
            Ok(registry) => registry,
            Err(err) => panic!("invalid field type registration: {err}"),
        })
    }

    /// Binds `name` to `parser`. A name can only be bound once.
    pub fn register(&mut self, name: &str, parser: Arc<dyn TypeParser>) -> MapperResult<()> {
        if self.parsers.contains_key(name) {
            return Err(MapperError::DuplicateType(name.to_string()));
        }
        self.parsers.insert(name.to_string(), parser);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&dyn TypeParser> {
        self.parsers.get(name).map(Arc::as_ref)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.parsers.contains_key(name)
    }

    /// Registered type names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.parsers.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.parsers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parsers.is_empty()
    }
}

impl fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeRegistry").field("types", &self.parsers.keys()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_types_are_bound() {
        let registry = TypeRegistry::with_builtin_types();
        let names: Vec<&str> = registry.names().collect();
        assert_eq!(names, ["completion", "keyword", "legacy_completion"]);
        assert!(registry.get("legacy_completion").is_some());
        assert!(registry.get("legacy-completion").is_none());
    }

    #[test]
    fn names_cannot_be_rebound() {
        let mut registry = TypeRegistry::with_builtin_types();
        let err = registry
            .register("legacy_completion", Arc::new(CompletionTypeParser))
            .unwrap_err();
        assert!(matches!(err, MapperError::DuplicateType(ref name) if name == "legacy_completion"));
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn global_registry_contains_builtins() {
        let registry = TypeRegistry::global();
        assert!(registry.contains("completion"));
        assert!(registry.contains("legacy_completion"));
        assert!(std::ptr::eq(registry, TypeRegistry::global()));
    }
}
