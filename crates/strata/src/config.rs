//! Configuration types for Strata.
//!
//! All types implement [`serde::Deserialize`] with per-field defaults, so a
//! partial TOML file overrides only what it names.
//!
//! # Overview
//!
//! - [`AppConfig`] - Top-level configuration combining every section.
//! - [`RoutingConfig`] - Connector routing parameters.
//! - [`StyleConfig`] - Rendering and export appearance.
//! - [`StoreConfig`] - Which persistence backend is used and where it lives.
//! - [`AnalysisConfig`] - The generative model endpoint and retry budget.
//! - [`ShareConfig`] - Base URL of shared links.
//!
//! # Example
//!
//! ```
//! # use strata::config::AppConfig;
//! let config = AppConfig::default();
//! assert_eq!(config.routing().parallel_spacing(), 20.0);
//! assert_eq!(config.analysis().max_attempts(), 3);
//! assert!(config.style().background_color().is_ok());
//! ```

use std::{path::PathBuf, time::Duration};

use serde::Deserialize;

use strata_core::{color::Color, routing::DEFAULT_PARALLEL_SPACING};

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    routing: RoutingConfig,

    #[serde(default)]
    style: StyleConfig,

    #[serde(default)]
    store: StoreConfig,

    #[serde(default)]
    analysis: AnalysisConfig,

    #[serde(default)]
    share: ShareConfig,
}

impl AppConfig {
    /// Returns the routing configuration.
    pub fn routing(&self) -> &RoutingConfig {
        &self.routing
    }

    /// Returns the style configuration.
    pub fn style(&self) -> &StyleConfig {
        &self.style
    }

    /// Returns the persistence configuration.
    pub fn store(&self) -> &StoreConfig {
        &self.store
    }

    /// Returns the analysis configuration.
    pub fn analysis(&self) -> &AnalysisConfig {
        &self.analysis
    }

    /// Returns the share configuration.
    pub fn share(&self) -> &ShareConfig {
        &self.share
    }

    /// Overrides the store directory. Used when the caller resolves a
    /// platform data directory the library cannot know about.
    pub fn with_store_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.store.path = Some(path.into());
        self
    }
}

/// Connector routing parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct RoutingConfig {
    /// Distance between parallel connectors joining the same entity pair.
    #[serde(default = "default_parallel_spacing")]
    parallel_spacing: f32,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            parallel_spacing: default_parallel_spacing(),
        }
    }
}

impl RoutingConfig {
    pub fn parallel_spacing(&self) -> f32 {
        self.parallel_spacing
    }
}

fn default_parallel_spacing() -> f32 {
    DEFAULT_PARALLEL_SPACING
}

/// Visual styling configuration for rendered diagrams.
#[derive(Debug, Clone, Deserialize)]
pub struct StyleConfig {
    /// Background [`Color`] of the rendered diagram, as a color string.
    #[serde(default)]
    background_color: Option<String>,

    /// Pixel density multiplier for raster export.
    #[serde(default = "default_export_scale")]
    export_scale: f32,
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            background_color: None,
            export_scale: default_export_scale(),
        }
    }
}

impl StyleConfig {
    /// Returns the parsed background [`Color`], or `None` if no color is configured.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured color string cannot be parsed
    /// into a valid [`Color`].
    pub fn background_color(&self) -> Result<Option<Color>, String> {
        self.background_color
            .as_ref()
            .map(|color| Color::new(color))
            .transpose()
            .map_err(|err| format!("Invalid background color in config: {err}"))
    }

    pub fn export_scale(&self) -> f32 {
        self.export_scale
    }
}

fn default_export_scale() -> f32 {
    2.0
}

/// The persistence backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// One JSON file per structure in a local directory.
    #[default]
    File,
    /// The structures REST API.
    Http,
}

/// Persistence configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    backend: StoreBackend,

    /// Directory of the file store.
    #[serde(default)]
    path: Option<PathBuf>,

    /// Root of the structures API, e.g. `http://localhost:3000/api`.
    #[serde(default)]
    base_url: Option<String>,
}

impl StoreConfig {
    pub fn backend(&self) -> StoreBackend {
        self.backend
    }

    pub fn path(&self) -> Option<&PathBuf> {
        self.path.as_ref()
    }

    pub fn base_url(&self) -> Option<&str> {
        self.base_url.as_deref()
    }
}

/// Generative model and retry configuration for tax analysis.
#[derive(Debug, Clone, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default = "default_analysis_endpoint")]
    endpoint: String,

    #[serde(default = "default_analysis_model")]
    model: String,

    /// Name of the environment variable holding the API key.
    #[serde(default = "default_api_key_env")]
    api_key_env: String,

    #[serde(default = "default_max_attempts")]
    max_attempts: u32,

    #[serde(default = "default_base_delay_ms")]
    base_delay_ms: u64,

    #[serde(default = "default_timeout_secs")]
    timeout_secs: u64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            endpoint: default_analysis_endpoint(),
            model: default_analysis_model(),
            api_key_env: default_api_key_env(),
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl AnalysisConfig {
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn api_key_env(&self) -> &str {
        &self.api_key_env
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Delay before the first retry; later retries double it.
    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_analysis_endpoint() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_analysis_model() -> String {
    "gemini-3-flash-preview".to_string()
}

fn default_api_key_env() -> String {
    "GEMINI_API_KEY".to_string()
}

fn default_max_attempts() -> u32 {
    3
}

fn default_base_delay_ms() -> u64 {
    1000
}

fn default_timeout_secs() -> u64 {
    120
}

/// Shared link configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ShareConfig {
    #[serde(default = "default_share_base_url")]
    base_url: String,
}

impl Default for ShareConfig {
    fn default() -> Self {
        Self {
            base_url: default_share_base_url(),
        }
    }
}

impl ShareConfig {
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

fn default_share_base_url() -> String {
    "http://localhost:3000".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();

        assert_eq!(config.style().export_scale(), 2.0);
        assert_eq!(config.store().backend(), StoreBackend::File);
        assert_eq!(config.analysis().api_key_env(), "GEMINI_API_KEY");
        assert_eq!(config.analysis().base_delay(), Duration::from_secs(1));
        assert_eq!(config.share().base_url(), "http://localhost:3000");
        assert!(config.style().background_color().unwrap().is_none());
    }

    #[test]
    fn test_invalid_background_color() {
        let config = StyleConfig {
            background_color: Some("not-a-color".to_string()),
            ..StyleConfig::default()
        };

        let err = config.background_color().unwrap_err();
        assert!(err.contains("Invalid background color"));
    }
}
