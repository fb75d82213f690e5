use thiserror::Error;

/// Result type alias for TickTick operations
pub type Result<T> = std::result::Result<T, TickTickError>;

/// Error types for the TickTick MCP server.
///
/// These cover the failure modes of talking to the TickTick service and of
/// validating tool input before it reaches the wire. Tool-level failures are
/// rendered back to the MCP client as `{"error": ...}` payloads; only
/// malformed protocol traffic becomes a JSON-RPC error.
///
/// # Examples
///
/// ```rust
/// use ticktick_core::error::TickTickError;
///
/// let err = TickTickError::not_found_task("6123abc");
/// assert!(err.is_not_found());
/// ```
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TickTickError {
    /// Object not found by the given identifier
    #[error("Not found: {0}")]
    NotFound(String),

    /// Validation error with details
    #[error("Validation error: {0}")]
    Validation(String),

    /// Authentication or authorization failure against TickTick
    #[error("Authentication error: {0}")]
    Auth(String),

    /// TickTick API call failure (transport or non-success status)
    #[error("TickTick API error: {0}")]
    Api(String),

    /// JSON (de)serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl TickTickError {
    /// Create a not found error for a task ID
    pub fn not_found_task(id: &str) -> Self {
        Self::NotFound(format!("Task with ID {id} not found"))
    }

    /// Create a not found error for an arbitrary object ID
    pub fn not_found_object(id: &str) -> Self {
        Self::NotFound(format!("Object with ID '{id}' not found"))
    }

    /// Create a validation error for an unparseable date string
    pub fn invalid_date(input: &str) -> Self {
        Self::Validation(format!(
            "Invalid date format: '{input}'. Use ISO format (YYYY-MM-DD or YYYY-MM-DDTHH:MM:SS)"
        ))
    }

    /// Create a validation error for an unknown timezone name
    pub fn invalid_timezone(name: &str) -> Self {
        Self::Validation(format!("Invalid timezone: '{name}'. Use a TZ database name"))
    }

    /// Create a validation error for an empty field
    pub fn empty_field(field: &str) -> Self {
        Self::Validation(format!("Field '{field}' cannot be empty"))
    }

    /// Check if this error indicates a not found condition
    pub fn is_not_found(&self) -> bool {
        matches!(self, TickTickError::NotFound(_))
    }

    /// Check if this error indicates a validation problem
    pub fn is_validation(&self) -> bool {
        matches!(self, TickTickError::Validation(_))
    }

    /// Check if this error indicates an authentication problem
    pub fn is_auth(&self) -> bool {
        matches!(self, TickTickError::Auth(_))
    }
}

impl From<serde_json::Error> for TickTickError {
    fn from(err: serde_json::Error) -> Self {
        TickTickError::Serialization(err.to_string())
    }
}
