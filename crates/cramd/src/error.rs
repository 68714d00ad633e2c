//! Error type for the cram CLI.

use thiserror::Error;

/// Error type alias used for the `cramd` crate.
pub type Result<T> = core::result::Result<T, CramdError>;

/// Errors surfaced by CLI commands.
///
/// Library errors pass through transparently; the CLI adds only its own
/// interaction failures.
#[derive(Error, Debug)]
pub enum CramdError {
  /// An error bubbled up from the `cram` library.
  #[error(transparent)]
  Cram(#[from] cram::error::CramError),

  /// A file system operation failed.
  #[error(transparent)]
  Io(#[from] std::io::Error),

  /// A terminal prompt failed.
  #[error(transparent)]
  Dialoguer(#[from] dialoguer::Error),
}
