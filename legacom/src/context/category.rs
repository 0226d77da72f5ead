use serde_json::Value;

use crate::node::{SchemaNode, node_string_list, node_to_string};

const FIELD_PATH: &str = "path";
const FIELD_DEFAULT: &str = "default";

/// Restricts suggestions to one or more categories, read from the suggestion itself or
/// from another field of the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryContextMapping {
    pub name: String,
    /// Document field the category values are read from when the suggestion has none.
    pub path: Option<String>,
    pub default_values: Vec<String>,
}

impl CategoryContextMapping {
    pub const TYPE: &'static str = "category";

    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: None,
            default_values: Vec::new(),
        }
    }

    /// Consumes the keys this mapping understands from `config`.
    pub(super) fn load(name: &str, config: &mut SchemaNode) -> Self {
        let mut mapping = Self::new(name);
        if let Some(path) = config.remove(FIELD_PATH) {
            mapping.path = Some(node_to_string(&path));
        }
        if let Some(defaults) = config.remove(FIELD_DEFAULT) {
            mapping.default_values = node_string_list(&defaults);
        }
        mapping
    }

    pub(super) fn write_body(&self, body: &mut SchemaNode) {
        if let Some(path) = &self.path {
            body.insert(FIELD_PATH.to_string(), Value::from(path.as_str()));
        }
        let defaults = self.default_values.iter().map(|value| Value::from(value.as_str())).collect();
        body.insert(FIELD_DEFAULT.to_string(), Value::Array(defaults));
    }
}
