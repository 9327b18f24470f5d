//! Error types for strata.
//!
//! Every failure is fatal for the current run: the model is either
//! finalized and rendered completely or the caller gets one of these.

use thiserror::Error;

/// Broad classification of a [`StrataError`], for callers that format
/// errors per category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The schema description is structurally inconsistent.
    SchemaIntegrity,
    /// The model is valid but cannot be expressed in the target dialect.
    DialectIncompatibility,
    /// Configuration could not be read or understood.
    Configuration,
    /// Reading an input file failed.
    Io,
}

/// The main error type for strata operations.
#[derive(Debug, Error)]
pub enum StrataError {
    #[error("Duplicate field '{field}' in entity '{entity}'")]
    DuplicateField { entity: String, field: String },

    #[error("Duplicate index '{index}' in entity '{entity}'")]
    DuplicateIndex { entity: String, index: String },

    #[error("Duplicate entity '{entity}' in database '{database}'")]
    DuplicateEntity { database: String, entity: String },

    #[error("Duplicate database '{0}' in schema")]
    DuplicateDatabase(String),

    #[error("Behavior '{behavior}' is already registered on '{owner}'")]
    DuplicateBehavior { owner: String, behavior: String },

    /// An index or unique constraint was added without any field.
    #[error("Index '{index}' on entity '{entity}' has no fields")]
    EmptyIndex { entity: String, index: String },

    #[error("Field '{field}' referenced by {context} does not exist in entity '{entity}'")]
    UnknownField {
        entity: String,
        field: String,
        context: String,
    },

    /// A relation (or diff) names an entity the database does not contain.
    #[error("Entity '{entity}' referenced by {context} does not exist. Available entities: {available}")]
    UnknownEntity {
        entity: String,
        context: String,
        available: String,
    },

    #[error("Domain '{domain}' referenced by {context} does not exist. Available domains: {available}")]
    UnknownDomain {
        domain: String,
        context: String,
        available: String,
    },

    #[error("Relation '{relation}' of entity '{entity}' points to '{foreign}', which has no primary key")]
    MissingForeignPrimaryKey {
        entity: String,
        relation: String,
        foreign: String,
    },

    #[error("Cannot synthesize field '{field}' for relation '{relation}': entity '{entity}' already has a field with that name")]
    SynthesizedFieldCollision {
        entity: String,
        relation: String,
        field: String,
    },

    #[error("Entity '{entity}' already has inheritance field '{existing}', cannot add '{field}'")]
    DuplicateInheritance {
        entity: String,
        existing: String,
        field: String,
    },

    #[error("Invalid referential action '{0}'. Expected: NONE, CASCADE, RESTRICT, SET NULL, SET DEFAULT or NO ACTION")]
    InvalidAction(String),

    #[error("Unknown field type '{0}'")]
    UnknownType(String),

    #[error("Unknown behavior '{0}'")]
    UnknownBehavior(String),

    /// The entity behavior scheduler did not converge.
    #[error("Behavior application did not converge after {0} iterations")]
    BehaviorLoop(usize),

    #[error("Invalid diff: {0}")]
    InvalidDiff(String),

    /// A default value the dialect cannot store.
    #[error("Field '{entity}.{field}': {reason}")]
    IllegalDefault {
        entity: String,
        field: String,
        reason: String,
    },

    #[error("You have specified autoIncrement for field '{field}', but entity '{entity}' does not use the native id method")]
    AutoIncrementWithoutNativeId { entity: String, field: String },

    #[error("Type {field_type} of field '{field}' has no mapping on platform '{platform}'")]
    UnmappableType {
        platform: String,
        field: String,
        field_type: String,
    },

    #[error("Field '{entity}.{field}': default value '{value}' is not numeric")]
    InvalidNumericDefault {
        entity: String,
        field: String,
        value: String,
    },

    #[error("Unknown platform '{0}'. Expected: sql, mysql, pgsql or sqlite")]
    UnknownPlatform(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid schema document: {0}")]
    Document(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl StrataError {
    /// Create an unknown-entity error listing the valid names.
    pub fn unknown_entity<'a>(
        entity: impl Into<String>,
        context: impl Into<String>,
        available: impl IntoIterator<Item = &'a str>,
    ) -> Self {
        Self::UnknownEntity {
            entity: entity.into(),
            context: context.into(),
            available: available.into_iter().collect::<Vec<_>>().join(", "),
        }
    }

    /// Create an illegal-default error.
    pub fn illegal_default(
        entity: impl Into<String>,
        field: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::IllegalDefault {
            entity: entity.into(),
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::IllegalDefault { .. }
            | Self::AutoIncrementWithoutNativeId { .. }
            | Self::UnmappableType { .. }
            | Self::InvalidNumericDefault { .. }
            | Self::UnknownPlatform(_) => ErrorKind::DialectIncompatibility,
            Self::Config(_) => ErrorKind::Configuration,
            Self::Io(_) => ErrorKind::Io,
            _ => ErrorKind::SchemaIntegrity,
        }
    }
}

/// Result type alias for strata operations.
pub type StrataResult<T> = Result<T, StrataError>;
