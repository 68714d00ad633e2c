//! Study-content generation library for course documents.
//!
//! `cram` turns uploaded course material into revision artifacts, providing:
//!
//! - Text extraction from course documents (PDF, with a stubbed word-processor path)
//! - AI-backed generation of quizzes, flashcards, summaries, and study plans
//! - Deterministic local fallbacks whenever the remote model is unavailable
//! - Local persistence of every generated artifact in a key-value store
//! - An identity/session adapter with optional cloud snapshot sync
//!
//! # Design
//!
//! The remote generation client ([`generator::Generator`]) never fails its
//! caller: a missing credential, a network error, or a malformed reply all
//! route to a locally synthesized substitute of the same shape. Input
//! validation errors (unsupported file type, oversized file) are the only
//! hard errors surfaced from the ingestion path.
//!
//! # Getting started
//!
//! ```no_run
//! use cram::{
//!   config::Config,
//!   document::SourceFile,
//!   pipeline::{BundleOptions, Pipeline},
//!   prelude::*,
//!   store::Store,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), CramError> {
//!   let config = Config::default();
//!   let store = Store::open(Store::default_path()).await?;
//!
//!   // Extract text from a course document.
//!   let file = SourceFile::from_path("cours-thermo.pdf").await?;
//!   let document = cram::document::extract(&file)?;
//!
//!   // Generate quizzes, flashcards, a summary, and a study plan.
//!   let pipeline = Pipeline::new(&config).with_store(store.clone());
//!   let bundle = pipeline.build_bundle(&document.text, &BundleOptions::default()).await;
//!   pipeline.persist(&bundle, &file.name, &store).await?;
//!   Ok(())
//! }
//! ```
//!
//! # Module organization
//!
//! - [`prompt`]: fixed prompt templates and placeholder substitution
//! - [`llm`]: chat-completion transport for the remote model endpoint
//! - [`artifact`]: generated content types and their shape validation
//! - [`generator`]: remote generation client with mock fallback
//! - [`mock`]: deterministic locally synthesized substitutes
//! - [`document`]: file validation and text extraction
//! - [`heuristics`]: local text analysis fallbacks
//! - [`pipeline`]: extraction-to-persistence orchestration
//! - [`store`]: SQLite-backed key-value persistence
//! - [`auth`]: identity/session adapter and cloud snapshot sync

#![warn(missing_docs, clippy::missing_docs_in_private_items)]

use std::{
  collections::BTreeMap,
  fmt::Display,
  path::{Path, PathBuf},
};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, trace, warn};
#[cfg(test)]
use {tempfile::tempdir, tracing_test::traced_test};

pub mod artifact;
pub mod auth;
pub mod config;
pub mod document;
pub mod error;
pub mod generator;
pub mod heuristics;
pub mod llm;
pub mod mock;
pub mod pipeline;
pub mod prompt;
pub mod store;

use crate::{artifact::*, error::*};

/// Common traits and types for ergonomic imports.
///
/// ```no_run
/// use cram::prelude::*;
///
/// fn handle(result: Result<(), CramError>) {
///   if let Err(e) = result {
///     eprintln!("{e}");
///   }
/// }
/// ```
pub mod prelude {
  pub use crate::{
    auth::{AuthProvider, SnapshotStore},
    error::CramError,
  };
}
