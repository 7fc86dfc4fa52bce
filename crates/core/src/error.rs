// Central Error Type for the Repository Layer

use thiserror::Error;

/// Repository-level error type
#[derive(Error, Debug)]
pub enum RepositoryError {
    /// A required constructor dependency was not supplied
    #[error("Missing argument: {0} can not be empty")]
    MissingArgument(&'static str),

    /// The specification locator could not produce the requested specification
    #[error(
        "Could not resolve requested specification {specification} for entity {entity} from the specification locator"
    )]
    Resolution {
        specification: &'static str,
        entity: &'static str,
        #[source]
        source: ResolutionError,
    },

    /// Ordering key selector is not a direct member access
    #[error("Query shape error: {0}")]
    QueryShape(String),

    /// `single()` saw zero or more than one element
    #[error("Invalid operation: {0}")]
    Cardinality(String),

    #[error("Not supported: {0}")]
    NotSupported(String),

    /// Specification used before `initialize`
    #[error("Specification {0} has not been initialized with a unit of work")]
    NotInitialized(&'static str),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Mapping error: {0}")]
    Mapping(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Why a specification could not be resolved
#[derive(Error, Debug)]
pub enum ResolutionError {
    #[error("no registration for {0}")]
    NotRegistered(&'static str),

    #[error("{registrations} registrations for {specification}, expected exactly one")]
    Ambiguous {
        specification: &'static str,
        registrations: usize,
    },

    #[error("construction failed: {0}")]
    Construction(#[source] Box<RepositoryError>),
}

/// Result type alias using RepositoryError
pub type Result<T> = std::result::Result<T, RepositoryError>;

impl RepositoryError {
    /// Error returned when an ordering key is not a single entity field
    pub fn member_expected() -> Self {
        RepositoryError::QueryShape("A property of the entity needs to be specified.".to_string())
    }

    /// True for `single()` cardinality violations
    pub fn is_cardinality(&self) -> bool {
        matches!(self, RepositoryError::Cardinality(_))
    }
}
