use std::fmt;

// === ViewError ===

/// Errors reported by an embedded content view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewError {
    /// The view refused or failed to start loading the given URL.
    LoadRejected(String),
    /// Script evaluation could not be scheduled.
    ScriptFailed(String),
    /// The view has been destroyed.
    Detached,
}

impl fmt::Display for ViewError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViewError::LoadRejected(url) => write!(f, "Load rejected: {}", url),
            ViewError::ScriptFailed(msg) => write!(f, "Script evaluation failed: {}", msg),
            ViewError::Detached => write!(f, "Content view detached"),
        }
    }
}

impl std::error::Error for ViewError {}

// === SettingsError ===

/// Errors related to the key-value settings store.
#[derive(Debug)]
pub enum SettingsError {
    /// Database operation failed.
    DatabaseError(String),
    /// The provided settings key is invalid.
    InvalidKey(String),
    /// The provided settings value is invalid.
    InvalidValue(String),
}

impl fmt::Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingsError::DatabaseError(msg) => write!(f, "Settings database error: {}", msg),
            SettingsError::InvalidKey(key) => write!(f, "Invalid settings key: {}", key),
            SettingsError::InvalidValue(msg) => {
                write!(f, "Invalid settings value: {}", msg)
            }
        }
    }
}

impl std::error::Error for SettingsError {}

impl From<rusqlite::Error> for SettingsError {
    fn from(e: rusqlite::Error) -> Self {
        SettingsError::DatabaseError(e.to_string())
    }
}

// === ThemeError ===

/// Errors related to theme engine operations.
#[derive(Debug, PartialEq, Eq)]
pub enum ThemeError {
    /// The provided color value is invalid.
    InvalidColor(String),
}

impl fmt::Display for ThemeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ThemeError::InvalidColor(color) => write!(f, "Invalid color: {}", color),
        }
    }
}

impl std::error::Error for ThemeError {}

// === AssistantError ===

/// Errors related to the remote voice assistant.
#[derive(Debug)]
pub enum AssistantError {
    /// No API key has been configured.
    MissingApiKey,
    /// A network error occurred while talking to the assistant endpoint.
    NetworkError(String),
    /// The endpoint answered with a non-success status.
    HttpStatus(u16, String),
    /// The response body could not be interpreted.
    InvalidResponse(String),
}

impl fmt::Display for AssistantError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssistantError::MissingApiKey => write!(f, "Assistant API key is not configured"),
            AssistantError::NetworkError(msg) => write!(f, "Assistant network error: {}", msg),
            AssistantError::HttpStatus(code, body) => {
                write!(f, "Assistant HTTP {}: {}", code, body)
            }
            AssistantError::InvalidResponse(msg) => {
                write!(f, "Invalid assistant response: {}", msg)
            }
        }
    }
}

impl std::error::Error for AssistantError {}

impl From<reqwest::Error> for AssistantError {
    fn from(e: reqwest::Error) -> Self {
        AssistantError::NetworkError(e.to_string())
    }
}

// === RpcError ===

/// Errors returned by the host bridge method table.
#[derive(Debug, PartialEq, Eq)]
pub enum RpcError {
    /// The method name is not part of the bridge surface.
    UnknownMethod(String),
    /// A required parameter is missing or has the wrong type.
    InvalidParams(String),
    /// The handler failed.
    Internal(String),
}

impl fmt::Display for RpcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RpcError::UnknownMethod(m) => write!(f, "unknown method: {}", m),
            RpcError::InvalidParams(msg) => write!(f, "invalid params: {}", msg),
            RpcError::Internal(msg) => write!(f, "internal error: {}", msg),
        }
    }
}

impl std::error::Error for RpcError {}
