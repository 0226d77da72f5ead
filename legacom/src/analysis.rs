//! Analyzer handles and the per-index analyzer lookup.
//!
//! Tokenization itself is out of scope: a [`NamedAnalyzer`] is an opaque handle whose
//! identity (name and definition) is all that mapping parsing and serialization need.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::errors::{MapperError, MapperResult};
use crate::settings::{AnalyzerSettings, IndexSettings};

/// Name of the analyzer substituted when a completion field configures none.
pub const DEFAULT_ANALYZER: &str = "simple";

/// Analyzers every index provides without configuration.
pub const BUILT_IN_ANALYZERS: &[&str] = &["standard", "simple", "whitespace", "keyword", "stop"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalyzerScope {
    /// Shipped with the engine and shared by every index.
    Global,
    /// Declared in the index settings.
    Index,
}

#[derive(Debug, PartialEq, Eq)]
struct AnalyzerInner {
    name: String,
    scope: AnalyzerScope,
    kind: String,
    tokenizer: Option<String>,
    filters: Vec<String>,
}

/// Cheaply clonable handle to a registered analyzer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedAnalyzer(Arc<AnalyzerInner>);

impl NamedAnalyzer {
    pub fn built_in(name: impl Into<String>) -> Self {
        let name = name.into();
        Self(Arc::new(AnalyzerInner {
            kind: name.clone(),
            name,
            scope: AnalyzerScope::Global,
            tokenizer: None,
            filters: Vec::new(),
        }))
    }

    pub fn custom(name: impl Into<String>, settings: &AnalyzerSettings) -> Self {
        Self(Arc::new(AnalyzerInner {
            name: name.into(),
            scope: AnalyzerScope::Index,
            kind: settings.kind.clone(),
            tokenizer: settings.tokenizer.clone(),
            filters: settings.filter.clone(),
        }))
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn scope(&self) -> AnalyzerScope {
        self.0.scope
    }

    pub fn kind(&self) -> &str {
        &self.0.kind
    }

    pub fn tokenizer(&self) -> Option<&str> {
        self.0.tokenizer.as_deref()
    }

    pub fn filters(&self) -> &[String] {
        &self.0.filters
    }
}

/// All analyzers resolvable by name for one index.
#[derive(Debug, Clone)]
pub struct IndexAnalyzers {
    analyzers: BTreeMap<String, NamedAnalyzer>,
}

impl Default for IndexAnalyzers {
    fn default() -> Self {
        let analyzers = BUILT_IN_ANALYZERS
            .iter()
            .map(|name| (name.to_string(), NamedAnalyzer::built_in(*name)))
            .collect();
        Self { analyzers }
    }
}

impl IndexAnalyzers {
    /// Built-in analyzers plus every custom analyzer declared in `settings`.
    pub fn from_settings(settings: &IndexSettings) -> MapperResult<Self> {
        let mut analyzers = Self::default();
        for (name, config) in &settings.analysis.analyzer {
            if analyzers.analyzers.contains_key(name) {
                return Err(MapperError::invalid_argument(
                    name.as_str(),
                    format!("custom analyzer [{name}] shadows a built-in analyzer"),
                ));
            }
            analyzers.analyzers.insert(name.clone(), NamedAnalyzer::custom(name.as_str(), config));
        }
        Ok(analyzers)
    }

    pub fn get(&self, name: &str) -> Option<&NamedAnalyzer> {
        self.analyzers.get(name)
    }

    /// The analyzer substituted when a field configures none.
    pub fn default_analyzer(&self) -> NamedAnalyzer {
        self.analyzers
            .get(DEFAULT_ANALYZER)
            .cloned()
            .unwrap_or_else(|| NamedAnalyzer::built_in(DEFAULT_ANALYZER))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.analyzers.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn built_ins_are_always_available() {
        let analyzers = IndexAnalyzers::default();
        for name in BUILT_IN_ANALYZERS {
            assert_eq!(analyzers.get(name).map(NamedAnalyzer::name), Some(*name));
        }
        assert_eq!(analyzers.default_analyzer().name(), "simple");
        assert!(analyzers.get("autocomplete").is_none());
    }

    #[test]
    fn custom_analyzers_come_from_settings() {
        let mut settings = IndexSettings::default();
        settings.analysis.analyzer.insert(
            "autocomplete".into(),
            AnalyzerSettings {
                kind: "custom".into(),
                tokenizer: Some("standard".into()),
                filter: vec!["lowercase".into()],
            },
        );
        let analyzers = IndexAnalyzers::from_settings(&settings).unwrap();
        let custom = analyzers.get("autocomplete").unwrap();
        assert_eq!(custom.scope(), AnalyzerScope::Index);
        assert_eq!(custom.tokenizer(), Some("standard"));
        assert_eq!(custom.filters(), ["lowercase".to_string()]);
    }

    #[test]
    fn custom_analyzer_cannot_shadow_built_in() {
        let mut settings = IndexSettings::default();
        settings.analysis.analyzer.insert("simple".into(), AnalyzerSettings::default());
        assert!(IndexAnalyzers::from_settings(&settings).is_err());
    }
}
