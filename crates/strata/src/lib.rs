//! Strata - composing, persisting and analysing ownership structures.
//!
//! A structure is a diagram of legal entities (companies, trusts,
//! individuals, partnerships, foundations) joined by typed relationships
//! such as equity holdings, loans or royalty flows. This crate adds the
//! outer surfaces on top of the [`strata_core`] model: persistence,
//! rendering to SVG and PNG, built-in templates, share links and AI tax
//! analysis.

pub mod analysis;
pub mod config;
pub mod export;
pub mod session;
pub mod store;
pub mod templates;

mod error;

pub use strata_core::{color, geometry, identifier, model, routing, shape};

pub use error::StrataError;
pub use session::Session;

use log::{debug, info};

use config::{AppConfig, StoreBackend};
use export::{png::svg_to_png, svg::SvgRenderer};
use model::Diagram;
use routing::{ConnectorRoute, Router};
use store::{FileStore, HttpStore, StructureStore};

/// Directory of the file store when none is configured.
pub const DEFAULT_STORE_DIR: &str = "structures";

/// Renders diagrams according to an [`AppConfig`].
///
/// # Examples
///
/// ```rust,no_run
/// use strata::{DiagramRenderer, config::AppConfig, model::Diagram, shape::EntityShape};
/// use strata::model::EntityType;
///
/// let mut diagram = Diagram::new();
/// diagram.add_entity(EntityType::LimitedCompany, EntityShape::Rectangle);
///
/// let renderer = DiagramRenderer::new(AppConfig::default());
///
/// let svg = renderer.render_svg(&diagram)
///     .expect("Failed to render");
/// let png = renderer.render_png(&diagram)
///     .expect("Failed to rasterise");
///
/// // Or use default config
/// let renderer = DiagramRenderer::default();
/// ```
#[derive(Debug, Default)]
pub struct DiagramRenderer {
    config: AppConfig,
}

impl DiagramRenderer {
    /// Create a new renderer with the given configuration.
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// The connector router built from the routing section.
    pub fn router(&self) -> Router {
        Router::new(self.config.routing().parallel_spacing())
    }

    /// Computes the connector geometry of every drawable relationship.
    pub fn route(&self, diagram: &Diagram) -> Vec<ConnectorRoute> {
        self.router().route_all(diagram)
    }

    /// Render a diagram to an SVG string.
    ///
    /// # Errors
    ///
    /// Returns [`StrataError::Config`] when the configured background color
    /// does not parse.
    pub fn render_svg(&self, diagram: &Diagram) -> Result<String, StrataError> {
        info!(
            entities = diagram.entities().len(),
            relationships = diagram.relationships().len();
            "Rendering diagram"
        );

        let background = self
            .config
            .style()
            .background_color()
            .map_err(StrataError::Config)?;

        let svg = SvgRenderer::new(self.router())
            .with_background(background)
            .render_to_string(diagram);
        debug!(bytes = svg.len(); "SVG rendered");
        Ok(svg)
    }

    /// Render a diagram to PNG bytes at the configured export scale.
    ///
    /// # Errors
    ///
    /// Returns [`StrataError::Export`] when rasterisation fails, in addition
    /// to the errors of [`DiagramRenderer::render_svg`].
    pub fn render_png(&self, diagram: &Diagram) -> Result<Vec<u8>, StrataError> {
        let svg = self.render_svg(diagram)?;
        Ok(svg_to_png(&svg, self.config.style().export_scale())?)
    }
}

/// Opens the structure store selected by `config`.
///
/// The file backend falls back to [`DEFAULT_STORE_DIR`] when no path is
/// configured. The HTTP backend requires a base URL.
pub fn open_store(config: &AppConfig) -> Result<Box<dyn StructureStore>, StrataError> {
    let store = config.store();
    match store.backend() {
        StoreBackend::File => {
            let root = store
                .path()
                .cloned()
                .unwrap_or_else(|| DEFAULT_STORE_DIR.into());
            debug!(root:? = root; "Opening file store");
            Ok(Box::new(FileStore::open(root)?))
        }
        StoreBackend::Http => {
            let base_url = store.base_url().ok_or_else(|| {
                StrataError::Config("store.base_url is required for the http backend".to_string())
            })?;
            debug!(base_url; "Opening HTTP store");
            Ok(Box::new(HttpStore::new(base_url)))
        }
    }
}
