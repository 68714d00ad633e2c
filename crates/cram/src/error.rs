//! Error types for the cram library.
//!
//! This module provides a comprehensive error type covering every failure
//! mode in the library:
//! - Remote API and network errors
//! - Local store operations
//! - Input validation (file type, file size)
//! - Authentication and sync
//!
//! Note that AI-generation failures never surface here: the generation
//! client recovers them internally by substituting mock content. The
//! variants below are either hard input errors (bad file) or plumbing
//! errors (store, filesystem, config) that callers must handle.

use thiserror::Error;

/// Error type alias used for the [`cram`](crate) crate.
pub type Result<T> = core::result::Result<T, CramError>;

/// Errors that can occur when working with the cram library.
#[derive(Error, Debug)]
pub enum CramError {
  /// The uploaded file's MIME type (or extension) is not supported.
  ///
  /// Only PDF and the two common word-processor types are accepted.
  /// The string parameter carries the offending type for the user.
  #[error("Unsupported file type: {0}. Use a PDF or Word document.")]
  UnsupportedFileType(String),

  /// The uploaded file exceeds the size ceiling.
  ///
  /// Surfaced before any extraction is attempted.
  #[error("File is too large ({size} bytes, maximum {max} bytes)")]
  FileTooLarge {
    /// Actual size of the rejected file in bytes.
    size: u64,
    /// The configured ceiling in bytes.
    max:  u64,
  },

  /// A network request failed.
  ///
  /// This can occur when:
  /// - The network is unavailable
  /// - The server is unreachable
  /// - The request times out
  /// - TLS/SSL errors occur
  #[error(transparent)]
  Network(#[from] reqwest::Error),

  /// The remote API returned an error response.
  ///
  /// The string parameter contains the HTTP status and any error
  /// message the API included in its body.
  #[error("API error: {0}")]
  Api(String),

  /// The remote reply could not be interpreted.
  ///
  /// Either the response envelope was missing its text field, or the
  /// reply text held no parsable payload of the expected shape. The
  /// generation client catches this internally and falls back to mock
  /// content; it only propagates from the raw transport layer.
  #[error("Malformed model reply: {0}")]
  InvalidResponse(String),

  /// A JSON (de)serialization failed.
  #[error(transparent)]
  Serde(#[from] serde_json::Error),

  /// A SQLite operation failed.
  #[error(transparent)]
  Sqlite(#[from] rusqlite::Error),

  /// An async SQLite operation failed.
  ///
  /// This wraps errors from the `tokio-rusqlite` crate, covering
  /// async-specific failures in store operations.
  #[error(transparent)]
  AsyncSqlite(#[from] tokio_rusqlite::Error),

  /// A file system operation failed.
  #[error(transparent)]
  Path(#[from] std::io::Error),

  /// PDF parsing and processing errors from the lopdf library.
  ///
  /// Common cases include malformed or corrupted PDF files, missing
  /// required objects, invalid stream encoding, and encrypted files.
  #[error(transparent)]
  Lopdf(#[from] lopdf::Error),

  /// A TOML configuration file could not be parsed.
  #[error(transparent)]
  TomlDe(#[from] toml::de::Error),

  /// An authentication or sign-up call was rejected by the identity
  /// provider, or cloud sync is not configured.
  #[error("Authentication failed: {0}")]
  Auth(String),

  /// A configuration value is missing or invalid.
  #[error("{0}")]
  Config(String),
}
