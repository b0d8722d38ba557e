//! Error types for Strata operations.
//!
//! This module provides the main error type [`StrataError`], which wraps the
//! per-concern errors of persistence, analysis and export. Model edits never
//! fail and have no variant here.

use std::io;

use thiserror::Error;

use crate::{analysis::AnalysisError, export::ExportError, store::StoreError};

/// The main error type for Strata operations.
#[derive(Debug, Error)]
pub enum StrataError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Analysis error: {0}")]
    Analysis(#[from] AnalysisError),

    #[error("Export error: {0}")]
    Export(#[from] ExportError),

    #[error("Unknown template `{0}`")]
    UnknownTemplate(String),
}
