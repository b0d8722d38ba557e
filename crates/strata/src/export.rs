//! Export of diagrams and analysis reports.
//!
//! # Pipeline Position
//!
//! ```text
//! Diagram (model)
//!     ↓ route
//! Connector geometry
//!     ↓ render (svg module)
//! SVG document
//!     ↓ rasterise (png module)
//! PNG bytes
//! ```
//!
//! # Available Backends
//!
//! - [`svg`] - SVG output via [`svg::SvgRenderer`]
//! - [`png`] - PNG rasterisation of the SVG output via `resvg`
//!
//! Download file names are derived from the structure name with every run
//! of whitespace replaced by a single underscore.

pub mod png;
pub mod svg;

use thiserror::Error;

/// Errors that can occur during export.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Failed to parse SVG: {0}")]
    SvgParse(String),

    #[error("Failed to allocate a {width}x{height} pixmap")]
    Pixmap { width: u32, height: u32 },

    #[error("Failed to encode PNG: {0}")]
    PngEncode(String),

    #[error("Invalid export scale {0}: must be finite and positive")]
    InvalidScale(f32),
}

/// Returns the download name of a rendered diagram.
///
/// ```
/// # use strata::export::diagram_file_name;
/// assert_eq!(diagram_file_name("HK  Holding Structure"), "HK_Holding_Structure_Diagram.png");
/// ```
pub fn diagram_file_name(structure_name: &str) -> String {
    format!("{}_Diagram.png", underscore_whitespace(structure_name))
}

/// Returns the download name of an analysis report.
///
/// ```
/// # use strata::export::analysis_file_name;
/// assert_eq!(analysis_file_name("Untitled Structure"), "Untitled_Structure_Analysis.txt");
/// ```
pub fn analysis_file_name(structure_name: &str) -> String {
    format!("{}_Analysis.txt", underscore_whitespace(structure_name))
}

fn underscore_whitespace(name: &str) -> String {
    let mut result = String::with_capacity(name.len());
    let mut in_whitespace = false;
    for c in name.chars() {
        if c.is_whitespace() {
            if !in_whitespace {
                result.push('_');
            }
            in_whitespace = true;
        } else {
            result.push(c);
            in_whitespace = false;
        }
    }
    result
}
