//! Centralized error handling
//!
//! Every failure carries a unique error code so a log line identifies the
//! failing stage without a backtrace.
//!
//! Error codes follow pattern: CATEGORY_SPECIFIC_ERROR
//! - RPC_xxx: upstream / forked RPC errors
//! - SIM_xxx: simulation aborts
//! - CLS_xxx: static classification errors
//! - CFG_xxx: configuration errors

use std::fmt;

/// Application-wide error type
#[derive(Debug)]
pub struct ScanError {
    /// Unique error code for logging
    pub code: ErrorCode,
    /// Human-readable message
    pub message: String,
    /// Optional underlying error
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl ScanError {
    /// Create a new ScanError
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            source: None,
        }
    }

    /// Create ScanError with source error
    pub fn with_source(
        code: ErrorCode,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            code,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Get error code as string (for logging)
    pub fn code_str(&self) -> &'static str {
        self.code.as_str()
    }
}

impl fmt::Display for ScanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code.as_str(), self.message)
    }
}

impl std::error::Error for ScanError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Unique error codes for monitoring
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // ============================================
    // CLI / Configuration
    // ============================================
    /// Transaction hash argument malformed
    InvalidTxHash,
    /// Missing required environment variable
    ConfigMissingEnv,
    /// Environment variable holds an unusable value
    ConfigInvalidValue,

    // ============================================
    // RPC
    // ============================================
    /// Upstream RPC endpoint unreachable
    RpcConnectionFailed,
    /// RPC returned an error response
    RpcError,
    /// RPC response could not be decoded
    RpcInvalidResponse,
    /// Deployment transaction not found on chain
    TxNotFound,

    // ============================================
    // Static analysis
    // ============================================
    /// Analyzer asked about a selector missing from the function table
    UnknownSelector,

    // ============================================
    // Simulation
    // ============================================
    /// Forked endpoint unreachable after node start
    ForkUnavailable,
    /// Forked node process failed to start
    NodeStartFailed,
    /// Deployer holds zero tokens after the fork, nothing to test
    NoInitialSupply,
    /// Trading-control name suggests a dynamic dead-block schedule
    UnsupportedPattern,
    /// Router quoted a non-positive output, fee cannot be measured
    ZeroQuote,

    /// Unknown error
    Unknown,
}

impl ErrorCode {
    /// Get string representation of error code
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidTxHash => "CLI_INVALID_TX_HASH",
            Self::ConfigMissingEnv => "CFG_MISSING_ENV",
            Self::ConfigInvalidValue => "CFG_INVALID_VALUE",

            Self::RpcConnectionFailed => "RPC_CONNECTION_FAILED",
            Self::RpcError => "RPC_ERROR",
            Self::RpcInvalidResponse => "RPC_INVALID_RESPONSE",
            Self::TxNotFound => "RPC_TX_NOT_FOUND",

            Self::UnknownSelector => "CLS_UNKNOWN_SELECTOR",

            Self::ForkUnavailable => "SIM_FORK_UNAVAILABLE",
            Self::NodeStartFailed => "SIM_NODE_START_FAILED",
            Self::NoInitialSupply => "SIM_NO_INITIAL_SUPPLY",
            Self::UnsupportedPattern => "SIM_UNSUPPORTED_PATTERN",
            Self::ZeroQuote => "SIM_ZERO_QUOTE",

            Self::Unknown => "UNKNOWN_ERROR",
        }
    }

    /// Fatal errors abort the scan with a non-zero exit. The two
    /// non-fatal codes are verdicts about the contract itself; the scan
    /// completes and reports them as the dynamic-testing result.
    /// Everything the state machine handles internally (probe reverts,
    /// empty candidate sets) never becomes an error in the first place.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::NoInitialSupply | Self::UnsupportedPattern)
    }
}

// ============================================
// Convenience constructors
// ============================================

impl ScanError {
    /// Upstream RPC unreachable
    pub fn rpc_connection_failed(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::RpcConnectionFailed, msg)
    }

    /// Deployment transaction not found
    pub fn tx_not_found(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::TxNotFound, msg)
    }

    /// Unknown selector requested from an analyzer
    pub fn unknown_selector(selector: [u8; 4]) -> Self {
        Self::new(
            ErrorCode::UnknownSelector,
            format!("selector 0x{} not in function table", hex::encode(selector)),
        )
    }

    /// Forked endpoint unreachable
    pub fn fork_unavailable(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::ForkUnavailable, msg)
    }

    /// No tokens minted to the deployer
    pub fn no_initial_supply() -> Self {
        Self::new(
            ErrorCode::NoInitialSupply,
            "no tokens minted to the deployer at deploy time",
        )
    }

    /// Dynamic dead-block schedule shape, intent not guessed
    pub fn unsupported_pattern(name: &str) -> Self {
        Self::new(
            ErrorCode::UnsupportedPattern,
            format!("dead blocks might be dynamic: {:?}", name),
        )
    }

    /// Router quote not strictly positive
    pub fn zero_quote() -> Self {
        Self::new(ErrorCode::ZeroQuote, "router quoted zero output tokens")
    }

    /// Missing environment variable
    pub fn missing_env(var: &str) -> Self {
        Self::new(
            ErrorCode::ConfigMissingEnv,
            format!("missing environment variable: {}", var),
        )
    }
}

// ============================================
// Result type alias
// ============================================

/// Scanner Result type
pub type ScanResult<T> = Result<T, ScanError>;

// ============================================
// Conversion from common error types
// ============================================

impl From<std::io::Error> for ScanError {
    fn from(err: std::io::Error) -> Self {
        Self::with_source(ErrorCode::Unknown, "IO error", err)
    }
}

impl From<reqwest::Error> for ScanError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_connect() {
            Self::with_source(ErrorCode::RpcConnectionFailed, "connection failed", err)
        } else {
            Self::with_source(ErrorCode::RpcError, "request failed", err)
        }
    }
}

impl From<serde_json::Error> for ScanError {
    fn from(err: serde_json::Error) -> Self {
        Self::with_source(ErrorCode::RpcInvalidResponse, "JSON parse error", err)
    }
}
