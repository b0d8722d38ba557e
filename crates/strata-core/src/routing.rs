//! Connector routing.
//!
//! Every relationship is drawn as a straight connector between the centers of
//! its two entities, clipped at each entity's nominal bounding box. Connectors
//! that join the same unordered pair of entities are "siblings" and are spread
//! apart perpendicular to their own direction so they never overlap:
//!
//! ```text
//!        k=0  ─────────────►   offset -S
//!   [A]  k=1  ─────────────►   offset  0    [B]
//!        k=2  ◄─────────────   offset +S
//! ```
//!
//! The offset of sibling `k` out of `n` is `(k - (n - 1) / 2) * S`, where `S`
//! is the spacing and `k` is the relationship's position in the diagram's
//! relationship list among its siblings. Because the perpendicular is taken
//! from each connector's own direction, a reversed sibling is displaced to
//! the mirrored side.
//!
//! Routing is a pure function of the diagram. It never mutates it.

use log::{debug, trace};
use serde::Serialize;

use crate::{
    geometry::Point,
    model::{Diagram, Relationship},
    shape::clip_to_bounding_box,
};

/// Distance between adjacent parallel connectors.
pub const DEFAULT_PARALLEL_SPACING: f32 = 20.0;

/// The computed geometry of one connector.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectorRoute {
    pub relationship_id: String,
    /// Where the connector leaves the source entity's bounding box.
    pub start: Point,
    /// Where the connector enters the target entity's bounding box.
    pub end: Point,
    /// Center of the connector label.
    pub label_anchor: Point,
    /// Signed perpendicular displacement of this connector.
    pub offset: f32,
    pub sibling_index: usize,
    pub sibling_count: usize,
}

/// Computes connector geometry for a diagram.
///
/// # Examples
///
/// ```
/// # use strata_core::geometry::Point;
/// # use strata_core::model::{Diagram, EntityType, RelationshipType};
/// # use strata_core::routing::Router;
/// # use strata_core::shape::EntityShape;
/// let mut diagram = Diagram::new();
/// let a = diagram
///     .add_entity_at(EntityType::Individual, EntityShape::Rectangle, Point::new(100.0, 100.0))
///     .id()
///     .to_string();
/// let b = diagram
///     .add_entity_at(EntityType::Individual, EntityShape::Rectangle, Point::new(300.0, 100.0))
///     .id()
///     .to_string();
/// diagram.add_relationship(&a, &b, RelationshipType::Equity, "Equity", Default::default());
///
/// let routes = Router::default().route_all(&diagram);
/// assert_eq!(routes[0].start, Point::new(170.0, 100.0));
/// assert_eq!(routes[0].end, Point::new(230.0, 100.0));
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Router {
    spacing: f32,
}

impl Default for Router {
    fn default() -> Self {
        Self::new(DEFAULT_PARALLEL_SPACING)
    }
}

impl Router {
    pub fn new(spacing: f32) -> Self {
        Self { spacing }
    }

    pub fn spacing(&self) -> f32 {
        self.spacing
    }

    /// Routes every relationship whose endpoints both exist, in relationship
    /// order. Relationships with a missing endpoint are skipped.
    pub fn route_all(&self, diagram: &Diagram) -> Vec<ConnectorRoute> {
        let routes: Vec<ConnectorRoute> = diagram
            .relationships()
            .iter()
            .filter_map(|relationship| self.route(diagram, relationship))
            .collect();

        trace!(
            routed = routes.len(),
            total = diagram.relationships().len();
            "Routed connectors"
        );
        routes
    }

    /// Routes a single relationship of `diagram`.
    ///
    /// Returns `None` when either endpoint names no entity.
    pub fn route(&self, diagram: &Diagram, relationship: &Relationship) -> Option<ConnectorRoute> {
        let (Some(from), Some(to)) = (
            diagram.entity(&relationship.from_id),
            diagram.entity(&relationship.to_id),
        ) else {
            debug!(
                relationship_id = relationship.id(),
                from_id = relationship.from_id.as_str(),
                to_id = relationship.to_id.as_str();
                "Skipping relationship with missing endpoint"
            );
            return None;
        };

        let (sibling_index, sibling_count) = sibling_position(diagram, relationship);
        let offset = self.sibling_offset(sibling_index, sibling_count);

        let from_center = from.position();
        let to_center = to.position();
        let normal = to_center.sub_point(from_center).unit_normal();
        let displacement = normal.scale(offset);

        let adjusted_from = from_center.add_point(displacement);
        let adjusted_to = to_center.add_point(displacement);

        let start = clip_to_bounding_box(adjusted_to, adjusted_from, from.shape().nominal_size());
        let end = clip_to_bounding_box(adjusted_from, adjusted_to, to.shape().nominal_size());
        let label_anchor = adjusted_from
            .midpoint(adjusted_to)
            .add_point(normal.scale(offset * 0.5));

        Some(ConnectorRoute {
            relationship_id: relationship.id().to_string(),
            start,
            end,
            label_anchor,
            offset,
            sibling_index,
            sibling_count,
        })
    }

    /// Returns the perpendicular offset of sibling `index` out of `count`.
    ///
    /// The offsets are symmetric about zero; a lone connector has offset 0.
    ///
    /// ```
    /// # use strata_core::routing::Router;
    /// let router = Router::default();
    /// assert_eq!(router.sibling_offset(0, 1), 0.0);
    /// assert_eq!(router.sibling_offset(0, 2), -10.0);
    /// assert_eq!(router.sibling_offset(2, 3), 20.0);
    /// ```
    pub fn sibling_offset(&self, index: usize, count: usize) -> f32 {
        if count == 0 {
            return 0.0;
        }
        (index as f32 - (count as f32 - 1.0) / 2.0) * self.spacing
    }
}

/// Position of `relationship` among the relationships joining the same
/// unordered entity pair, in list order, and the size of that group. A
/// duplicated id takes the position of its first occurrence.
fn sibling_position(diagram: &Diagram, relationship: &Relationship) -> (usize, usize) {
    let mut index = None;
    let mut count = 0;
    for candidate in diagram.relationships() {
        if !candidate.is_sibling_of(relationship) {
            continue;
        }
        if index.is_none() && candidate.id() == relationship.id() {
            index = Some(count);
        }
        count += 1;
    }
    (index.unwrap_or(0), count.max(1))
}
