use thiserror::Error;

use crate::models::Address;

/// Main error type for the transaction parser
#[derive(Error, Debug)]
pub enum ParserError {
    #[error("RPC error: {0}")]
    Rpc(#[from] RpcError),

    #[error("Service error: {0}")]
    Service(#[from] ServiceError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("System error: {0}")]
    System(#[from] SystemError),
}

/// Failures talking to the remote node.
///
/// The client never retries; the scheduler simply tries again on the next tick.
#[derive(Error, Debug)]
pub enum RpcError {
    /// Connection refused, timeout, body could not be read.
    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The node answered with a JSON-RPC error object. Displays the remote message verbatim.
    #[error("{message}")]
    Protocol { code: i64, message: String },

    #[error("Invalid response format: {0}")]
    Decode(String),
}

/// Errors produced by the parser service layer
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("error validating address: {0}")]
    Validation(String),

    #[error("error address already exists: {0}")]
    Conflict(Address),

    #[error("error address not subscribed: {0}")]
    NotFound(Address),

    #[error(transparent)]
    Format(#[from] FormatError),

    #[error(transparent)]
    Rpc(#[from] RpcError),

    #[error("no parser registered for chain {0}")]
    ChainNotConfigured(u64),
}

/// Hex quantity could not be turned into a number
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    #[error("unexpected result format: {0}")]
    UnexpectedFormat(String),

    #[error("failed to parse hex {value:?}: {reason}")]
    InvalidHex { value: String, reason: String },
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

/// System-level errors
#[derive(Error, Debug)]
pub enum SystemError {
    #[error("Server error: {0}")]
    Server(String),
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, ParserError>;

/// Coarse classification an outer layer can map onto a status code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Conflict,
    NotFound,
    Transport,
    Protocol,
    Decode,
    Format,
    Config,
    Internal,
}

impl ErrorKind {
    /// Stable snake_case label used in API error bodies and structured logs
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation_error",
            ErrorKind::Conflict => "conflict",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Transport => "transport_error",
            ErrorKind::Protocol => "protocol_error",
            ErrorKind::Decode => "decode_error",
            ErrorKind::Format => "format_error",
            ErrorKind::Config => "config_error",
            ErrorKind::Internal => "internal_error",
        }
    }
}

/// Error severity levels for logging and monitoring
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// Critical errors that require immediate attention
    Critical,
    /// High priority errors that affect functionality
    High,
    /// Medium priority errors that may affect performance
    Medium,
    /// Low priority errors that are mostly informational
    Low,
}

impl RpcError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RpcError::Transport(_) => ErrorKind::Transport,
            RpcError::Protocol { .. } => ErrorKind::Protocol,
            RpcError::Decode(_) => ErrorKind::Decode,
        }
    }

    /// Node failures are retried implicitly by the next polling tick
    pub fn is_recoverable(&self) -> bool {
        true
    }
}

impl ServiceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ServiceError::Validation(_) => ErrorKind::Validation,
            ServiceError::Conflict(_) => ErrorKind::Conflict,
            ServiceError::NotFound(_) => ErrorKind::NotFound,
            ServiceError::Format(_) => ErrorKind::Format,
            ServiceError::Rpc(e) => e.kind(),
            ServiceError::ChainNotConfigured(_) => ErrorKind::Internal,
        }
    }

    pub fn is_recoverable(&self) -> bool {
        match self {
            ServiceError::Rpc(e) => e.is_recoverable(),
            _ => false,
        }
    }
}

impl ParserError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ParserError::Rpc(e) => e.kind(),
            ParserError::Service(e) => e.kind(),
            ParserError::Config(_) => ErrorKind::Config,
            ParserError::System(_) => ErrorKind::Internal,
        }
    }

    /// Get the severity level of an error
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            ParserError::Config(_) => ErrorSeverity::Critical,
            ParserError::System(_) => ErrorSeverity::Critical,
            ParserError::Service(ServiceError::ChainNotConfigured(_)) => ErrorSeverity::Critical,

            ParserError::Rpc(RpcError::Transport(_)) => ErrorSeverity::High,
            ParserError::Service(ServiceError::Rpc(RpcError::Transport(_))) => ErrorSeverity::High,

            ParserError::Rpc(_) => ErrorSeverity::Medium,
            ParserError::Service(ServiceError::Rpc(_)) => ErrorSeverity::Medium,
            ParserError::Service(ServiceError::Format(_)) => ErrorSeverity::Medium,

            ParserError::Service(_) => ErrorSeverity::Low,
        }
    }

    /// Whether waiting for the next polling tick can clear the error
    pub fn is_recoverable(&self) -> bool {
        match self {
            ParserError::Rpc(e) => e.is_recoverable(),
            ParserError::Service(e) => e.is_recoverable(),
            ParserError::Config(_) | ParserError::System(_) => false,
        }
    }
}
