//! SVG rendering of a routed diagram.
//!
//! The document holds, bottom to top: an optional background, the legend,
//! the entities, then the connectors with their labels. The viewport is the
//! union of every drawn element's bounds plus a margin.

use std::collections::BTreeMap;

use log::{debug, warn};
use svg::{Document, node::element as svg_element};

use strata_core::{
    color::Color,
    geometry::{Bounds, Point, Size},
    model::{Diagram, Entity, EntityType, Relationship},
    routing::{ConnectorRoute, Router},
    shape::EntityShape,
};

/// Blank space around the drawn content.
pub const DIAGRAM_MARGIN: f32 = 50.0;
/// Fixed size of a connector label box.
pub const LABEL_SIZE: Size = Size::new(80.0, 20.0);
/// Size of the legend box.
pub const LEGEND_SIZE: Size = Size::new(140.0, 140.0);
/// Stroke colour of connectors without their own colour.
pub const DEFAULT_CONNECTOR_COLOR: &str = "#94a3b8";

const LEGEND_GAP: f32 = 40.0;
const BORDER_COLOR: &str = "#e2e8f0";
const TITLE_COLOR: &str = "#1e293b";
const CAPTION_COLOR: &str = "#64748b";
const LABEL_TEXT_COLOR: &str = "#475569";
const FONT_FAMILY: &str = "Inter, sans-serif";
const MONO_FONT_FAMILY: &str = "JetBrains Mono, monospace";
const CORNER_RADIUS: f32 = 8.0;
const COLOR_BAR_HEIGHT: f32 = 4.0;
const CIRCLE_RADIUS: f32 = 50.0;
const TRIANGLE_RADIUS: f32 = 60.0;
const CONNECTOR_WIDTH: f32 = 2.0;

const LEGEND_ENTRIES: [(&str, &str); 5] = [
    ("#3b82f6", "Corporate"),
    ("#f43f5e", "SPV"),
    ("#10b981", "Trust"),
    ("#f59e0b", "Individual/Partnership"),
    ("#ec4899", "Other"),
];

/// Renders diagrams to SVG documents.
///
/// # Examples
///
/// ```
/// # use strata::export::svg::SvgRenderer;
/// # use strata::geometry::Point;
/// # use strata::model::{Diagram, EntityType};
/// # use strata::shape::EntityShape;
/// let mut diagram = Diagram::new();
/// diagram.add_entity_at(EntityType::Spv, EntityShape::Diamond, Point::new(0.0, 0.0));
///
/// let svg = SvgRenderer::default().render_to_string(&diagram);
/// assert!(svg.starts_with("<svg"));
/// assert!(svg.contains("New spv"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct SvgRenderer {
    router: Router,
    background: Option<Color>,
}

/// Collects the connector colours in use so each gets one arrowhead marker.
#[derive(Debug, Default)]
struct MarkerRegistry(BTreeMap<String, Color>);

impl MarkerRegistry {
    /// Registers `color` and returns the id of its marker.
    fn register(&mut self, color: Color) -> String {
        let id = marker_id(color);
        self.0.entry(id.clone()).or_insert(color);
        id
    }

    fn definitions(&self) -> svg_element::Definitions {
        self.0
            .iter()
            .fold(svg_element::Definitions::new(), |defs, (id, color)| {
                defs.add(create_arrowhead(id, *color))
            })
    }
}

impl SvgRenderer {
    pub fn new(router: Router) -> Self {
        Self {
            router,
            background: None,
        }
    }

    /// Sets the background fill. `None` leaves the document transparent.
    pub fn with_background(mut self, background: Option<Color>) -> Self {
        self.background = background;
        self
    }

    pub fn render_to_string(&self, diagram: &Diagram) -> String {
        self.render(diagram).to_string()
    }

    /// Renders the diagram to an SVG document.
    pub fn render(&self, diagram: &Diagram) -> Document {
        let routes = self.router.route_all(diagram);
        let legend_origin = self.legend_origin(diagram);
        let viewport = self
            .content_bounds(diagram, &routes, legend_origin)
            .expand(DIAGRAM_MARGIN);
        debug!(
            width = viewport.width(),
            height = viewport.height(),
            routes = routes.len();
            "Rendering SVG document"
        );

        let mut doc = Document::new()
            .set(
                "viewBox",
                format!(
                    "{} {} {} {}",
                    viewport.min_x(),
                    viewport.min_y(),
                    viewport.width(),
                    viewport.height()
                ),
            )
            .set("width", viewport.width())
            .set("height", viewport.height());

        if let Some(background) = self.background {
            doc = doc.add(
                svg_element::Rectangle::new()
                    .set("x", viewport.min_x())
                    .set("y", viewport.min_y())
                    .set("width", viewport.width())
                    .set("height", viewport.height())
                    .set("fill", background.to_string())
                    .set("fill-opacity", background.alpha()),
            );
        }

        doc = doc.add(render_legend(legend_origin));

        let mut entities = svg_element::Group::new().set("class", "entities");
        for entity in diagram.entities() {
            entities = entities.add(render_entity(entity));
        }
        doc = doc.add(entities);

        let mut markers = MarkerRegistry::default();
        let mut connectors = svg_element::Group::new().set("class", "relationships");
        for route in &routes {
            if let Some(relationship) = diagram.relationship(&route.relationship_id) {
                connectors = connectors.add(render_connector(relationship, route, &mut markers));
            }
        }

        doc.add(markers.definitions()).add(connectors)
    }

    /// Places the legend to the upper left of the entities.
    fn legend_origin(&self, diagram: &Diagram) -> Point {
        match entities_bounds(diagram) {
            Some(bounds) => Point::new(
                bounds.min_x() - LEGEND_GAP - LEGEND_SIZE.width(),
                bounds.min_y(),
            ),
            None => Point::default(),
        }
    }

    fn content_bounds(&self, diagram: &Diagram, routes: &[ConnectorRoute], legend_origin: Point) -> Bounds {
        let legend = legend_origin
            .add_point(LEGEND_SIZE.half_extents())
            .to_bounds(LEGEND_SIZE);

        let with_entities = entities_bounds(diagram)
            .map(|bounds| bounds.merge(&legend))
            .unwrap_or(legend);

        routes.iter().fold(with_entities, |acc, route| {
            acc.merge(&route.label_anchor.to_bounds(LABEL_SIZE))
        })
    }
}

fn entity_bounds(entity: &Entity) -> Bounds {
    entity.position().to_bounds(entity.shape().nominal_size())
}

fn entities_bounds(diagram: &Diagram) -> Option<Bounds> {
    diagram
        .entities()
        .iter()
        .map(entity_bounds)
        .reduce(|acc, bounds| acc.merge(&bounds))
}

fn render_legend(origin: Point) -> svg_element::Group {
    let mut group = svg_element::Group::new()
        .set("class", "legend")
        .set("transform", format!("translate({}, {})", origin.x(), origin.y()))
        .add(
            svg_element::Rectangle::new()
                .set("width", LEGEND_SIZE.width())
                .set("height", LEGEND_SIZE.height())
                .set("rx", CORNER_RADIUS)
                .set("fill", "white")
                .set("stroke", BORDER_COLOR),
        )
        .add(
            text("Legend", Point::new(10.0, 16.0), 12.0, TITLE_COLOR)
                .set("font-weight", "bold")
                .set("text-anchor", "start"),
        );

    for (index, (color, caption)) in LEGEND_ENTRIES.iter().enumerate() {
        let y = 35.0 + index as f32 * 20.0;
        group = group
            .add(
                svg_element::Rectangle::new()
                    .set("x", 10.0)
                    .set("y", y)
                    .set("width", 12.0)
                    .set("height", 12.0)
                    .set("rx", 2.0)
                    .set("fill", *color),
            )
            .add(
                text(caption, Point::new(30.0, y + 6.0), 10.0, CAPTION_COLOR)
                    .set("text-anchor", "start"),
            );
    }

    group
}

fn render_entity(entity: &Entity) -> svg_element::Group {
    let shape = entity.shape();
    let position = entity.position();
    let color = entity.entity_type.color();

    let mut group = svg_element::Group::new()
        .set("class", "entity")
        .set("data-id", entity.id());

    group = match shape {
        EntityShape::Rectangle => {
            let bounds = entity_bounds(entity);
            group
                .add(
                    svg_element::Rectangle::new()
                        .set("x", bounds.min_x())
                        .set("y", bounds.min_y())
                        .set("width", bounds.width())
                        .set("height", bounds.height())
                        .set("rx", CORNER_RADIUS)
                        .set("fill", "white")
                        .set("stroke", BORDER_COLOR)
                        .set("stroke-width", 1),
                )
                .add(color_bar(bounds, color))
        }
        EntityShape::Circle => group.add(
            svg_element::Circle::new()
                .set("cx", position.x())
                .set("cy", position.y())
                .set("r", CIRCLE_RADIUS)
                .set("fill", "white")
                .set("stroke", color)
                .set("stroke-width", 2),
        ),
        EntityShape::Triangle => {
            let half_base = TRIANGLE_RADIUS * 3f32.sqrt() / 2.0;
            let vertices = [
                Point::new(0.0, -TRIANGLE_RADIUS),
                Point::new(half_base, TRIANGLE_RADIUS / 2.0),
                Point::new(-half_base, TRIANGLE_RADIUS / 2.0),
            ];
            group.add(outline_polygon(position, &vertices, color))
        }
        EntityShape::Diamond => {
            let half = shape.nominal_size().half_extents();
            let vertices = [
                Point::new(0.0, -half.y()),
                Point::new(half.x(), 0.0),
                Point::new(0.0, half.y()),
                Point::new(-half.x(), 0.0),
            ];
            group.add(outline_polygon(position, &vertices, color))
        }
    };

    // Caption rows sit lower inside rectangles, which have no apex.
    let rows: [f32; 3] = if shape == EntityShape::Rectangle {
        [-14.0, 5.0, 24.0]
    } else {
        [-4.0, 15.0, 29.0]
    };

    group
        .add(
            text(&entity.name, position.add_point(Point::new(0.0, rows[0])), 12.0, TITLE_COLOR)
                .set("font-weight", "bold"),
        )
        .add(text(
            &entity.incorporation_jurisdiction,
            position.add_point(Point::new(0.0, rows[1])),
            10.0,
            CAPTION_COLOR,
        ))
        .add(type_caption(entity.entity_type, position.add_point(Point::new(0.0, rows[2]))))
}

/// The 4px accent strip along the top edge of a rectangle, rounded only at
/// its top corners.
fn color_bar(bounds: Bounds, color: &str) -> svg_element::Path {
    let r = CORNER_RADIUS;
    let (left, top, right) = (bounds.min_x(), bounds.min_y(), bounds.max_x());
    let bottom = top + COLOR_BAR_HEIGHT;
    let d = format!(
        "M {left} {bottom} L {left} {} Q {left} {top} {} {top} L {} {top} Q {right} {top} {right} {} L {right} {bottom} Z",
        top + r.min(COLOR_BAR_HEIGHT),
        left + r,
        right - r,
        top + r.min(COLOR_BAR_HEIGHT),
    );
    svg_element::Path::new().set("d", d).set("fill", color)
}

fn outline_polygon(center: Point, vertices: &[Point], color: &str) -> svg_element::Polygon {
    let points = vertices
        .iter()
        .map(|vertex| {
            let absolute = center.add_point(*vertex);
            format!("{},{}", absolute.x(), absolute.y())
        })
        .collect::<Vec<_>>()
        .join(" ");

    svg_element::Polygon::new()
        .set("points", points)
        .set("fill", "white")
        .set("stroke", color)
        .set("stroke-width", 2)
}

fn type_caption(entity_type: EntityType, position: Point) -> svg_element::Text {
    text(entity_type.as_str(), position, 8.0, entity_type.color()).set("font-family", MONO_FONT_FAMILY)
}

fn render_connector(
    relationship: &Relationship,
    route: &ConnectorRoute,
    markers: &mut MarkerRegistry,
) -> svg_element::Group {
    let color = connector_color(relationship);
    let marker = markers.register(color);

    let mut line = svg_element::Line::new()
        .set("x1", route.start.x())
        .set("y1", route.start.y())
        .set("x2", route.end.x())
        .set("y2", route.end.y())
        .set("stroke", color.to_string())
        .set("stroke-opacity", color.alpha())
        .set("stroke-width", CONNECTOR_WIDTH)
        .set("marker-end", format!("url(#{marker})"));
    if let Some(dash) = relationship.line_type().dash_array() {
        line = line.set("stroke-dasharray", dash);
    }

    let label_box = route.label_anchor.to_bounds(LABEL_SIZE);
    let label = svg_element::Group::new()
        .add(
            svg_element::Rectangle::new()
                .set("x", label_box.min_x())
                .set("y", label_box.min_y())
                .set("width", LABEL_SIZE.width())
                .set("height", LABEL_SIZE.height())
                .set("rx", 4.0)
                .set("fill", "white")
                .set("stroke", BORDER_COLOR),
        )
        .add(text(&relationship.display_text(), route.label_anchor, 10.0, LABEL_TEXT_COLOR));

    svg_element::Group::new()
        .set("class", "relationship")
        .set("data-id", relationship.id())
        .add(line)
        .add(label)
}

/// Returns the relationship's own colour, or the default when it has none
/// or it does not parse.
fn connector_color(relationship: &Relationship) -> Color {
    match relationship.color.as_deref() {
        Some(raw) => Color::new(raw).unwrap_or_else(|err| {
            warn!(relationship_id = relationship.id(), err; "Ignoring invalid connector colour");
            default_connector_color()
        }),
        None => default_connector_color(),
    }
}

fn default_connector_color() -> Color {
    Color::from_rgb8(0x94, 0xa3, 0xb8)
}

fn marker_id(color: Color) -> String {
    format!("arrowhead-{}", color.id_fragment())
}

fn create_arrowhead(id: &str, color: Color) -> svg_element::Marker {
    svg_element::Marker::new()
        .set("id", id)
        .set("viewBox", "0 0 10 10")
        .set("refX", 9)
        .set("refY", 5)
        .set("markerWidth", 6)
        .set("markerHeight", 6)
        .set("orient", "auto")
        .add(
            svg_element::Path::new()
                .set("d", "M 0 0 L 10 5 L 0 10 z")
                .set("fill", color.to_string())
                .set("fill-opacity", color.alpha()),
        )
}

/// Centered single-line text.
fn text(content: &str, position: Point, font_size: f32, fill: &str) -> svg_element::Text {
    svg_element::Text::new(content)
        .set("x", position.x())
        .set("y", position.y())
        .set("font-family", FONT_FAMILY)
        .set("font-size", font_size)
        .set("fill", fill)
        .set("text-anchor", "middle")
        .set("dominant-baseline", "middle")
}
