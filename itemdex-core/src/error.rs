//! Error types for itemdex operations

use std::path::PathBuf;
use thiserror::Error;

/// Structural errors in the hand-authored text files.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TextError {
    #[error("Anchor not found in {file}: {anchor}")]
    ParseAnchorNotFound { file: String, anchor: String },

    #[error("Duplicate identifier: {symbol}")]
    DuplicateIdentifier { symbol: String },

    #[error("No record with id {id}")]
    UnknownRecord { id: usize },

    #[error("No graphics row for record {id}")]
    MissingGraphicsRow { id: usize },
}

impl TextError {
    pub fn anchor(file: impl Into<String>, anchor: impl Into<String>) -> Self {
        TextError::ParseAnchorNotFound {
            file: file.into(),
            anchor: anchor.into(),
        }
    }
}

/// Icon asset errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AssetError {
    #[error("Icon dimension mismatch: expected {expected}x{expected}, got {width}x{height}")]
    IconDimensionMismatch { expected: u32, width: u32, height: u32 },

    #[error("Icon could not be decoded: {reason}")]
    Decode { reason: String },
}

/// Validation errors for caller-supplied values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required field missing: {field}")]
    RequiredFieldMissing { field: String },

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read layout file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse layout TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid layout value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

/// File system errors, always naming the offending path.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FileError {
    #[error("File not found: {}", path.display())]
    Missing { path: PathBuf },

    #[error("IO error on {}: {reason}", path.display())]
    Io { path: PathBuf, reason: String },
}

impl FileError {
    pub fn io(path: impl Into<PathBuf>, err: &std::io::Error) -> Self {
        let path = path.into();
        if err.kind() == std::io::ErrorKind::NotFound {
            FileError::Missing { path }
        } else {
            FileError::Io {
                path,
                reason: err.to_string(),
            }
        }
    }
}

/// Master error type for all itemdex errors.
#[derive(Debug, Error)]
pub enum ItemdexError {
    #[error("Text error: {0}")]
    Text(#[from] TextError),

    #[error("Asset error: {0}")]
    Asset(#[from] AssetError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("File error: {0}")]
    File(#[from] FileError),
}

/// Result type alias for itemdex operations.
pub type ItemdexResult<T> = Result<T, ItemdexError>;

// =============================================================================
// TESTS
// =============================================================================
