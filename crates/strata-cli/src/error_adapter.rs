//! Error adapter for converting StrataError to miette diagnostics.
//!
//! This module provides the bridge between the library's standard error types
//! and miette's rich diagnostic formatting used in the CLI. Every variant gets
//! a stable `strata::*` code; a few get a help line pointing at the fix.

use std::fmt;

use miette::{Diagnostic as MietteDiagnostic, LabeledSpan};

use strata::{StrataError, analysis::AnalysisError, store::StoreError};

/// Adapter for [`StrataError`].
///
/// None of the variants carry source locations, so the diagnostic has a code,
/// an optional help line and no labels.
pub struct ErrorAdapter<'a>(pub &'a StrataError);

impl fmt::Debug for ErrorAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl fmt::Display for ErrorAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl std::error::Error for ErrorAdapter<'_> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.0.source()
    }
}

impl MietteDiagnostic for ErrorAdapter<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        let code = match &self.0 {
            StrataError::Io(_) => "strata::io",
            StrataError::Json(_) => "strata::json",
            StrataError::Config(_) => "strata::config",
            StrataError::Store(_) => "strata::store",
            StrataError::Analysis(_) => "strata::analysis",
            StrataError::Export(_) => "strata::export",
            StrataError::UnknownTemplate(_) => "strata::template",
        };
        Some(Box::new(code))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        let help: String = match &self.0 {
            StrataError::Analysis(AnalysisError::MissingApiKey(var)) => {
                format!("export {var}=<your API key> and run the command again")
            }
            StrataError::Analysis(AnalysisError::Exhausted { attempts, .. }) => {
                format!("the model failed {attempts} times; try again later")
            }
            StrataError::Store(StoreError::InvalidId(_)) => {
                "ids may only contain letters, digits, `-` and `_`".to_string()
            }
            StrataError::UnknownTemplate(_) => {
                "run `strata template list` to see the available templates".to_string()
            }
            _ => return None,
        };
        Some(Box::new(help))
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        None
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        None
    }
}
