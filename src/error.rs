use thiserror::Error;

/// Main error type for the Nano account notifier
#[derive(Error, Debug)]
pub enum NotifierError {
    #[error("RPC error: {0}")]
    Rpc(#[from] RpcError),

    #[error("Notification error: {0}")]
    Notify(#[from] NotifyError),

    #[error("Processing error: {0}")]
    Processing(#[from] ProcessingError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("State error: {0}")]
    State(#[from] StateError),
}

/// Node RPC errors
#[derive(Error, Debug)]
pub enum RpcError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parsing failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Node returned HTTP {status}")]
    Status { status: u16 },

    #[error("Node error: {0}")]
    Node(String),

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),

    #[error("Last known transaction {hash} not found in the newest {searched} history entries")]
    BoundaryNotFound { hash: String, searched: u32 },
}

/// Email dispatch errors
#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("Mail relay request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Mail relay rejected message to {recipient}: HTTP {status}")]
    Rejected { recipient: String, status: u16 },
}

/// Errors turning node data into notifications
#[derive(Error, Debug)]
pub enum ProcessingError {
    #[error("Invalid raw amount: {0}")]
    InvalidAmount(String),
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Configuration parsing failed: {0}")]
    Parsing(String),

    #[error("Invalid URL format: {0}")]
    InvalidUrl(String),
}

/// State file errors
#[derive(Error, Debug)]
pub enum StateError {
    #[error("State file I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("State file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, NotifierError>;

/// Error severity levels for logging
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// The process cannot continue
    Critical,
    /// An account check failed and its state was not advanced
    High,
    /// Transient failure, the next poll will likely succeed
    Medium,
    Low,
}

impl NotifierError {
    /// Get the severity level of an error
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            NotifierError::Config(_) => ErrorSeverity::Critical,
            NotifierError::State(_) => ErrorSeverity::Critical,

            NotifierError::Rpc(RpcError::BoundaryNotFound { .. }) => ErrorSeverity::High,
            NotifierError::Rpc(RpcError::Node(_)) => ErrorSeverity::High,
            NotifierError::Processing(_) => ErrorSeverity::High,
            NotifierError::Notify(NotifyError::Rejected { .. }) => ErrorSeverity::High,

            NotifierError::Rpc(RpcError::Http(_)) => ErrorSeverity::Medium,
            NotifierError::Rpc(RpcError::Status { .. }) => ErrorSeverity::Medium,
            NotifierError::Notify(NotifyError::Http(_)) => ErrorSeverity::Medium,

            _ => ErrorSeverity::Low,
        }
    }

    /// Check if the error is likely to clear up on a later poll
    pub fn is_recoverable(&self) -> bool {
        match self {
            NotifierError::Rpc(RpcError::Http(_)) => true,
            NotifierError::Rpc(RpcError::Status { status }) => *status >= 500,
            NotifierError::Notify(NotifyError::Http(_)) => true,

            // Needs operator attention
            NotifierError::Config(_) => false,
            NotifierError::State(_) => false,
            NotifierError::Rpc(RpcError::BoundaryNotFound { .. }) => false,

            _ => false,
        }
    }
}
