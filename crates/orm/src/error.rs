//! Error types for the model registry
//!
//! Every stage of the pipeline has its own error enum so callers can match on
//! the stage that failed; `OrmError` wraps them all for `?` propagation.

use thiserror::Error;

/// ORM result type alias
pub type OrmResult<T> = Result<T, OrmError>;

/// Top level error for registration, bootstrap and schema generation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrmError {
    #[error(transparent)]
    Registration(#[from] RegistrationError),

    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Failures while turning a model descriptor into registry metadata
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistrationError {
    #[error("model `{full_name}` (table `{table}`) is already registered")]
    DuplicateModel { full_name: String, table: String },

    #[error("model `{0}` has no primary key; mark a field `pk`/`auto` or declare an integer `id` field")]
    MissingPrimaryKey(String),

    #[error("model `{model}` has an invalid storage engine `{engine}`")]
    InvalidEngine { model: String, engine: String },

    #[error("cannot register `{0}`: models must be registered by their plain struct type")]
    InvalidPointerKind(String),

    #[error("field `{field}`: {reason}")]
    InvalidField { field: String, reason: String },

    #[error("field `{field}`: wrong tag format `{tag}({value})`, {reason}")]
    Tag {
        field: String,
        tag: String,
        value: String,
        reason: String,
    },
}

/// Failures of the one-shot relation resolution
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolutionError {
    #[error("cannot resolve relation target of field `{field}`: `{target}` is not registered")]
    UnresolvedRelationTarget { field: String, target: String },

    #[error("field `{field}` has a wrong rel_through value `{through}`")]
    UnresolvedThrough { field: String, through: String },

    #[error("junction table `{table}` for field `{field}` is already registered")]
    TableNameCollision { field: String, table: String },

    #[error("cannot generate a reverse field for `{field}` on model `{model}`")]
    ReverseFieldGenerationFailed { field: String, model: String },

    #[error("cannot find the link fields of junction model `{through}` for field `{field}`")]
    M2MLinkNotFound { field: String, through: String },

    #[error("reverse field `{field}` has no matching relation in model `{model}`")]
    ReverseFieldUnmatched { field: String, model: String },
}

/// Failures while producing DDL
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("no model registered, register your models before generating a schema")]
    EmptyRegistry,

    #[error("cannot find column `{column}` used by {clause} of `{model}`")]
    UnknownColumn {
        model: String,
        column: String,
        clause: &'static str,
    },
}

/// Registry lifecycle violations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LifecycleError {
    #[error("registry is closed: models cannot be registered after bootstrap")]
    RegistryClosed,
}

/// Configuration loading errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Invalid value for field '{field}': '{value}'. Expected: {expected}")]
    InvalidValue {
        field: String,
        value: String,
        expected: String,
    },
}

impl RegistrationError {
    pub(crate) fn invalid_field(field: impl Into<String>, reason: impl Into<String>) -> Self {
        RegistrationError::InvalidField {
            field: field.into(),
            reason: reason.into(),
        }
    }
}
