use std::io;

use thiserror::Error;

/// Top-level error type returned while parsing, building, or serializing field mappings.
#[derive(Debug, Error)]
pub enum MapperError {
    /// A value failed local validation (for example a non-positive `max_input_length`).
    #[error("invalid argument on field [{field}]: {message}")]
    InvalidArgument { field: String, message: String },

    /// A named analyzer is not registered with the index.
    #[error("field [{field}]: can't find default or mapped analyzer with name [{analyzer}]")]
    UnresolvableReference { field: String, analyzer: String },

    /// `search_analyzer` was configured without an index analyzer.
    #[error("analyzer on completion field [{field}] must be set when search_analyzer is set")]
    ConfigurationConflict { field: String },

    /// The schema node is malformed in a way not covered by the kinds above.
    #[error("failed to parse mapping for field [{field}]: {message}")]
    Parsing { field: String, message: String },

    /// No type parser is registered under the requested type name.
    #[error("no handler for type [{type_name}] declared on field [{field}]")]
    UnknownType { field: String, type_name: String },

    /// A type parser was registered twice under the same name.
    #[error("type [{0}] is already registered")]
    DuplicateType(String),

    /// Writing to a schema sink failed.
    #[error("schema serialization failed: {0}")]
    Io(#[from] io::Error),

    /// An emitted schema document could not be materialized.
    #[error("schema document could not be materialized: {0}")]
    Json(#[from] serde_json::Error),
}

/// Coarse classification of [`MapperError`] values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidArgument,
    UnresolvableReference,
    ConfigurationConflict,
    Parsing,
    Registry,
    Io,
}

impl MapperError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            MapperError::InvalidArgument { .. } => ErrorKind::InvalidArgument,
            MapperError::UnresolvableReference { .. } => ErrorKind::UnresolvableReference,
            MapperError::ConfigurationConflict { .. } => ErrorKind::ConfigurationConflict,
            MapperError::Parsing { .. } | MapperError::UnknownType { .. } => ErrorKind::Parsing,
            MapperError::DuplicateType(_) => ErrorKind::Registry,
            MapperError::Io(_) | MapperError::Json(_) => ErrorKind::Io,
        }
    }

    /// Name of the field the error was raised for, when there is one.
    pub fn field(&self) -> Option<&str> {
        match self {
            MapperError::InvalidArgument { field, .. }
            | MapperError::UnresolvableReference { field, .. }
            | MapperError::ConfigurationConflict { field }
            | MapperError::Parsing { field, .. }
            | MapperError::UnknownType { field, .. } => Some(field),
            MapperError::DuplicateType(_) | MapperError::Io(_) | MapperError::Json(_) => None,
        }
    }

    /// Convenience helper for a field-scoped parse failure.
    pub fn parsing(field: impl Into<String>, message: impl Into<String>) -> Self {
        MapperError::Parsing {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn invalid_argument(field: impl Into<String>, message: impl Into<String>) -> Self {
        MapperError::InvalidArgument {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Convenience alias used across the mapper modules.
pub type MapperResult<T> = Result<T, MapperError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_group_related_variants() {
        let err = MapperError::UnknownType {
            field: "title".into(),
            type_name: "nope".into(),
        };
        assert_eq!(err.kind(), ErrorKind::Parsing);
        assert_eq!(err.field(), Some("title"));

        let io = MapperError::from(io::Error::other("sink closed"));
        assert_eq!(io.kind(), ErrorKind::Io);
        assert_eq!(io.field(), None);
    }

    #[test]
    fn conflict_message_names_field() {
        let err = MapperError::ConfigurationConflict {
            field: "suggest".into(),
        };
        assert_eq!(
            err.to_string(),
            "analyzer on completion field [suggest] must be set when search_analyzer is set"
        );
    }
}
