use thiserror::Error;

/// Application-level errors
#[derive(Debug, Error)]
pub enum AppError {
    /// Missing or malformed configuration.
    #[error("Configuration error: {message}")]
    Config {
        /// What was wrong.
        message: String,
    },

    /// Graph store rejected an operation.
    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),

    /// A model or scrape provider failed.
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Protocol-level failure.
    #[error("MCP protocol error: {0}")]
    Mcp(#[from] McpError),

    /// Anything else, including tool validation.
    #[error("Internal error: {message}")]
    Internal {
        /// Error description.
        message: String,
    },
}

/// Graph store errors
#[derive(Debug, Error)]
pub enum GraphError {
    /// No node with this id.
    #[error("Node not found: {node_id}")]
    NodeNotFound {
        /// Requested node id.
        node_id: String,
    },

    /// The node's kind or stage does not allow the action.
    #[error("Invalid action '{action}' on node {node_id}: {reason}")]
    InvalidAction {
        /// Attempted action, e.g. "promote".
        action: String,
        /// Target node id.
        node_id: String,
        /// Why it was refused.
        reason: String,
    },
}

/// External provider errors (generation, speech, scraping)
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Retries exhausted.
    #[error("Provider unavailable: {message} (retries: {retries})")]
    Unavailable {
        /// Last failure seen.
        message: String,
        /// Retries attempted.
        retries: u32,
    },

    /// Non-success HTTP status.
    #[error("API error: {status} - {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Response body or provider message.
        message: String,
    },

    /// Body could not be decoded.
    #[error("Invalid response: {message}")]
    InvalidResponse {
        /// Decode failure.
        message: String,
    },

    /// The model answered with no usable parts.
    #[error("Empty response from {model}")]
    EmptyResponse {
        /// Model that answered.
        model: String,
    },

    /// Request exceeded the configured timeout.
    #[error("Request timeout after {timeout_ms}ms")]
    Timeout {
        /// Timeout that was hit.
        timeout_ms: u64,
    },

    /// Scrape service reported a failure.
    #[error("Scrape failed: {reason}")]
    Scrape {
        /// Service-provided reason.
        reason: String,
    },

    /// Provider credentials are absent.
    #[error("Provider not configured: {message}")]
    NotConfigured {
        /// Which setting is missing.
        message: String,
    },

    /// Transport failure from reqwest.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// MCP protocol errors
#[derive(Debug, Error)]
pub enum McpError {
    /// Request envelope or params could not be decoded.
    #[error("Invalid request: {message}")]
    InvalidRequest {
        /// Decode failure.
        message: String,
    },

    /// No tool with this name.
    #[error("Unknown tool: {tool_name}")]
    UnknownTool {
        /// Requested tool.
        tool_name: String,
    },

    /// Tool arguments failed to parse or validate.
    #[error("Invalid parameters for {tool_name}: {message}")]
    InvalidParameters {
        /// Tool being called.
        tool_name: String,
        /// What was wrong.
        message: String,
    },

    /// The tool ran and failed.
    #[error("Tool execution failed: {message}")]
    ExecutionFailed {
        /// Underlying error text.
        message: String,
    },

    /// Result serialization failed.
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Tool-specific errors with structured details
#[derive(Debug, Error)]
pub enum ToolError {
    /// An input field was rejected.
    #[error("Validation failed: {field} - {reason}")]
    Validation {
        /// Field name.
        field: String,
        /// Why it was rejected.
        reason: String,
    },

    /// Persona or angle expansion produced nothing usable.
    #[error("Expansion failed: {message}")]
    Expansion {
        /// Failure label shown to the user.
        message: String,
    },

    /// Context analysis failed.
    #[error("Analysis failed: {message}")]
    Analysis {
        /// Failure label shown to the user.
        message: String,
    },
}

impl From<ToolError> for AppError {
    fn from(err: ToolError) -> Self {
        AppError::Internal {
            message: err.to_string(),
        }
    }
}

impl From<AppError> for McpError {
    fn from(err: AppError) -> Self {
        McpError::ExecutionFailed {
            message: err.to_string(),
        }
    }
}

/// Result type alias for application errors
pub type AppResult<T> = Result<T, AppError>;

/// Result type alias for graph store operations
pub type GraphResult<T> = Result<T, GraphError>;

/// Result type alias for provider calls
pub type ProviderResult<T> = Result<T, ProviderError>;

/// Result type alias for MCP operations
pub type McpResult<T> = Result<T, McpError>;
