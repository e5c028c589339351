//! Error types for chain connectivity

/// Errors that can occur during chain operations
#[derive(Debug)]
pub enum ChainError {
    // Connection errors
    RpcError(String),

    // Read-only call errors
    CallFailed(String),

    // Configuration errors
    InvalidConfig(String),
}

impl std::fmt::Display for ChainError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChainError::RpcError(msg) => write!(f, "RPC error: {}", msg),
            ChainError::CallFailed(msg) => write!(f, "Contract call failed: {}", msg),
            ChainError::InvalidConfig(msg) => write!(f, "Invalid configuration: {}", msg),
        }
    }
}

impl std::error::Error for ChainError {}
