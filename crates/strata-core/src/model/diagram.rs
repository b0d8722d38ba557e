//! The mutable diagram model.

use std::{collections::HashMap, str};

use log::{debug, trace};
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::{
    entity::{Entity, EntityPatch, EntityType},
    relationship::{
        INCOME_FLOW_COLOR, Relationship, RelationshipExtras, RelationshipPatch, RelationshipType,
    },
};
use crate::{geometry::Point, identifier::new_id, shape::EntityShape};

/// Lower corner of the region new entities are dropped into.
pub const SPAWN_ORIGIN: Point = Point::new(100.0, 100.0);
/// Side length of the square spawn region.
pub const SPAWN_EXTENT: f32 = 200.0;
/// Jurisdiction given to newly added entities.
pub const DEFAULT_JURISDICTION: &str = "Hong Kong";

/// Direction of the relationships created by [`Diagram::batch_connect`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectDirection {
    /// One relationship from the pivot to each target.
    PivotToTargets,
    /// One relationship from each target to the pivot.
    TargetsToPivot,
}

impl str::FromStr for ConnectDirection {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "one-to-many" | "pivot-to-targets" => Ok(Self::PivotToTargets),
            "many-to-one" | "targets-to-pivot" => Ok(Self::TargetsToPivot),
            _ => Err("Invalid connect direction"),
        }
    }
}

/// The authoritative entity and relationship collections of one session.
///
/// Serializes as `{"entities": [...], "relationships": [...]}`, the payload
/// stored in a structure record.
///
/// Tolerance policies:
/// - updates, moves and deletes addressed to an unknown id are silent no-ops;
/// - relationship endpoints are not checked against the entity collection.
///
/// The one enforced invariant is the cascade: deleting an entity deletes
/// every relationship that references it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Diagram {
    #[serde(default)]
    entities: Vec<Entity>,
    #[serde(default)]
    relationships: Vec<Relationship>,
}

impl Diagram {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a diagram from existing collections without validation.
    pub fn from_parts(entities: Vec<Entity>, relationships: Vec<Relationship>) -> Self {
        Self {
            entities,
            relationships,
        }
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn relationships(&self) -> &[Relationship] {
        &self.relationships
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty() && self.relationships.is_empty()
    }

    pub fn entity(&self, id: &str) -> Option<&Entity> {
        self.entities.iter().find(|entity| entity.id() == id)
    }

    pub fn relationship(&self, id: &str) -> Option<&Relationship> {
        self.relationships.iter().find(|rel| rel.id() == id)
    }

    /// Adds an entity of the given kind at a random position inside the spawn
    /// region.
    pub fn add_entity(&mut self, entity_type: EntityType, shape: EntityShape) -> &Entity {
        self.add_entity_with_rng(entity_type, shape, &mut rand::rng())
    }

    /// Same as [`Diagram::add_entity`] with an explicit random source.
    pub fn add_entity_with_rng<R: Rng + ?Sized>(
        &mut self,
        entity_type: EntityType,
        shape: EntityShape,
        rng: &mut R,
    ) -> &Entity {
        let position = Point::new(
            SPAWN_ORIGIN.x() + rng.random::<f32>() * SPAWN_EXTENT,
            SPAWN_ORIGIN.y() + rng.random::<f32>() * SPAWN_EXTENT,
        );
        self.add_entity_at(entity_type, shape, position)
    }

    /// Adds an entity of the given kind at `position`.
    ///
    /// The entity gets a fresh id, the name `"New <type token>"` in lower case
    /// and the default jurisdiction.
    pub fn add_entity_at(
        &mut self,
        entity_type: EntityType,
        shape: EntityShape,
        position: Point,
    ) -> &Entity {
        let name = format!("New {}", entity_type.as_str().to_lowercase());
        let entity = Entity::new(new_id(), entity_type, name, position)
            .with_shape(shape)
            .with_jurisdiction(DEFAULT_JURISDICTION);
        debug!(id = entity.id(), entity_type = entity_type.as_str(); "Entity added");

        self.entities.push(entity);
        &self.entities[self.entities.len() - 1]
    }

    /// Appends a fully formed entity as-is.
    pub fn insert_entity(&mut self, entity: Entity) {
        self.entities.push(entity);
    }

    /// Merges `patch` into the entity with the given id.
    pub fn update_entity(&mut self, id: &str, patch: EntityPatch) {
        match self.entities.iter_mut().find(|entity| entity.id() == id) {
            Some(entity) => patch.apply(entity),
            None => debug!(id; "Ignoring update for unknown entity"),
        }
    }

    /// Moves the entity with the given id to `position`.
    pub fn move_entity(&mut self, id: &str, position: Point) {
        match self.entities.iter_mut().find(|entity| entity.id() == id) {
            Some(entity) => entity.set_position(position),
            None => debug!(id; "Ignoring move for unknown entity"),
        }
    }

    /// Removes the entity and every relationship that references it.
    pub fn delete_entity(&mut self, id: &str) {
        self.entities.retain(|entity| entity.id() != id);
        let before = self.relationships.len();
        self.relationships.retain(|rel| !rel.references(id));
        debug!(id, cascaded = before - self.relationships.len(); "Entity deleted");
    }

    /// Adds a relationship with a fresh id. Endpoints are not validated.
    pub fn add_relationship(
        &mut self,
        from_id: &str,
        to_id: &str,
        relationship_type: RelationshipType,
        label: impl Into<String>,
        extras: RelationshipExtras,
    ) -> &Relationship {
        let relationship =
            Relationship::new(new_id(), from_id, to_id, relationship_type, label, extras);
        debug!(
            id = relationship.id(),
            from_id,
            to_id,
            relationship_type = relationship_type.as_str();
            "Relationship added"
        );

        self.relationships.push(relationship);
        &self.relationships[self.relationships.len() - 1]
    }

    /// Adds an income-flow relationship with the preset label for its type
    /// (the derived label for non-income types) and the income colour.
    pub fn add_income_flow(
        &mut self,
        from_id: &str,
        to_id: &str,
        relationship_type: RelationshipType,
    ) -> &Relationship {
        let label = relationship_type
            .income_flow_label()
            .map(str::to_string)
            .unwrap_or_else(|| relationship_type.default_label());
        let extras = RelationshipExtras {
            color: Some(INCOME_FLOW_COLOR.to_string()),
            ..RelationshipExtras::default()
        };
        self.add_relationship(from_id, to_id, relationship_type, label, extras)
    }

    /// Merges `patch` into the relationship with the given id.
    ///
    /// See [`RelationshipPatch`] for the label regeneration rule.
    pub fn update_relationship(&mut self, id: &str, patch: RelationshipPatch) {
        match self.relationships.iter_mut().find(|rel| rel.id() == id) {
            Some(rel) => patch.apply(rel),
            None => debug!(id; "Ignoring update for unknown relationship"),
        }
    }

    pub fn delete_relationship(&mut self, id: &str) {
        self.relationships.retain(|rel| rel.id() != id);
    }

    /// Removes whatever the id names: an entity (with its cascade) or a
    /// relationship.
    pub fn delete(&mut self, id: &str) {
        if self.entity(id).is_some() {
            self.delete_entity(id);
        } else {
            self.delete_relationship(id);
        }
    }

    /// Connects `pivot_id` with every target in one step.
    ///
    /// Each relationship is a 100% equity stake labelled `"Equity"`. Existing
    /// edges are not consulted, so repeating a batch creates parallel
    /// duplicates. Returns the ids of the new relationships in target order.
    pub fn batch_connect<S: AsRef<str>>(
        &mut self,
        pivot_id: &str,
        target_ids: &[S],
        direction: ConnectDirection,
    ) -> Vec<String> {
        let mut created = Vec::with_capacity(target_ids.len());
        for target_id in target_ids {
            let target_id = target_id.as_ref();
            let (from_id, to_id) = match direction {
                ConnectDirection::PivotToTargets => (pivot_id, target_id),
                ConnectDirection::TargetsToPivot => (target_id, pivot_id),
            };
            let rel = self.add_relationship(
                from_id,
                to_id,
                RelationshipType::Equity,
                RelationshipType::Equity.default_label(),
                RelationshipExtras::with_percentage(100.0),
            );
            created.push(rel.id().to_string());
        }

        trace!(pivot_id, created:? = created; "Batch connect completed");
        created
    }

    /// Gives every entity and relationship a fresh id, rewriting relationship
    /// endpoints to follow their entities. Endpoints that named no entity are
    /// left untouched.
    pub fn reissue_ids(&mut self) {
        let mut mapping = HashMap::with_capacity(self.entities.len());
        for entity in &mut self.entities {
            let fresh = new_id();
            mapping.insert(entity.id().to_string(), fresh.clone());
            entity.reassign_id(fresh);
        }

        for rel in &mut self.relationships {
            rel.reassign_id(new_id());
            if let Some(fresh) = mapping.get(&rel.from_id) {
                rel.from_id = fresh.clone();
            }
            if let Some(fresh) = mapping.get(&rel.to_id) {
                rel.to_id = fresh.clone();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;

    fn three_entity_chain() -> (Diagram, [String; 3]) {
        let mut diagram = Diagram::new();
        let ids = [
            Point::new(0.0, 0.0),
            Point::new(0.0, 150.0),
            Point::new(0.0, 300.0),
        ]
        .map(|position| {
            diagram
                .add_entity_at(EntityType::LimitedCompany, EntityShape::Rectangle, position)
                .id()
                .to_string()
        });
        (diagram, ids)
    }

    #[test]
    fn test_add_entity_defaults() {
        let mut diagram = Diagram::new();
        let entity = diagram
            .add_entity_with_rng(
                EntityType::JointStockCompany,
                EntityShape::Diamond,
                &mut StdRng::seed_from_u64(7),
            )
            .clone();

        assert_eq!(entity.name, "New joint_stock_company");
        assert_eq!(entity.incorporation_jurisdiction, "Hong Kong");
        assert_eq!(entity.shape(), EntityShape::Diamond);

        let position = entity.position();
        assert!((100.0..300.0).contains(&position.x()));
        assert!((100.0..300.0).contains(&position.y()));
    }

    #[test]
    fn test_added_ids_are_unique() {
        let mut diagram = Diagram::new();
        for _ in 0..50 {
            diagram.add_entity(EntityType::Individual, EntityShape::Circle);
        }
        let mut ids: Vec<&str> = diagram.entities().iter().map(Entity::id).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 50);
    }

    #[test]
    fn test_cascade_delete() {
        let (mut diagram, [a, b, c]) = three_entity_chain();
        diagram.add_relationship(&a, &b, RelationshipType::Equity, "Equity", Default::default());
        diagram.add_relationship(&b, &c, RelationshipType::Equity, "Equity", Default::default());

        diagram.delete_entity(&b);

        assert_eq!(diagram.entities().len(), 2);
        assert!(diagram.relationships().is_empty());
    }

    #[test]
    fn test_delete_entity_leaves_unrelated_edges() {
        let (mut diagram, [a, b, c]) = three_entity_chain();
        let keep = diagram
            .add_relationship(&a, &b, RelationshipType::Debt, "Loan", Default::default())
            .id()
            .to_string();
        diagram.add_relationship(&c, &a, RelationshipType::Debt, "Loan", Default::default());

        diagram.delete_entity(&c);

        assert_eq!(diagram.relationships().len(), 1);
        assert_eq!(diagram.relationships()[0].id(), keep);
        assert!(diagram.entity(&a).is_some());
        assert!(diagram.entity(&b).is_some());
    }

    #[test]
    fn test_update_unknown_ids_is_noop() {
        let (mut diagram, _) = three_entity_chain();
        let before = diagram.clone();

        diagram.update_entity(
            "missing",
            EntityPatch {
                name: Some("Ghost".to_string()),
                ..EntityPatch::default()
            },
        );
        diagram.update_relationship(
            "missing",
            RelationshipPatch {
                label: Some("Ghost".to_string()),
                ..RelationshipPatch::default()
            },
        );
        diagram.move_entity("missing", Point::new(1.0, 1.0));
        diagram.delete_entity("missing");
        diagram.delete_relationship("missing");

        assert_eq!(diagram, before);
    }

    #[test]
    fn test_update_relationship_type_rewrites_label() {
        let (mut diagram, [a, b, _]) = three_entity_chain();
        let id = diagram
            .add_relationship(&a, &b, RelationshipType::Equity, "Equity", Default::default())
            .id()
            .to_string();

        diagram.update_relationship(
            &id,
            RelationshipPatch {
                relationship_type: Some(RelationshipType::Royalty),
                label: Some("Custom".to_string()),
                ..RelationshipPatch::default()
            },
        );

        assert_eq!(diagram.relationship(&id).unwrap().label, "Royalty");
    }

    #[test]
    fn test_dangling_relationship_is_accepted() {
        let (mut diagram, [a, ..]) = three_entity_chain();
        diagram.add_relationship(&a, "nowhere", RelationshipType::Services, "Services", Default::default());

        assert_eq!(diagram.relationships().len(), 1);
        assert_eq!(diagram.relationships()[0].to_id, "nowhere");
    }

    #[test]
    fn test_batch_connect_pivot_to_targets() {
        let (mut diagram, [a, b, c]) = three_entity_chain();
        let created = diagram.batch_connect(&a, &[&b, &c], ConnectDirection::PivotToTargets);

        assert_eq!(created.len(), 2);
        for (rel, target) in diagram.relationships().iter().zip([&b, &c]) {
            assert_eq!(rel.from_id, a);
            assert_eq!(&rel.to_id, target);
            assert_eq!(rel.relationship_type, RelationshipType::Equity);
            assert_eq!(rel.label, "Equity");
            assert_eq!(rel.percentage, Some(100.0));
        }
    }

    #[test]
    fn test_batch_connect_targets_to_pivot_duplicates() {
        let (mut diagram, [a, b, c]) = three_entity_chain();
        diagram.batch_connect(&a, &[b.clone(), c.clone()], ConnectDirection::TargetsToPivot);
        diagram.batch_connect(&a, &[b.clone(), c.clone()], ConnectDirection::TargetsToPivot);

        assert_eq!(diagram.relationships().len(), 4);
        assert!(diagram.relationships().iter().all(|rel| rel.to_id == a));
        let from_b = diagram
            .relationships()
            .iter()
            .filter(|rel| rel.from_id == b)
            .count();
        assert_eq!(from_b, 2);
    }

    #[test]
    fn test_income_flow_preset() {
        let (mut diagram, [a, b, _]) = three_entity_chain();
        let rel = diagram
            .add_income_flow(&a, &b, RelationshipType::CapitalGain)
            .clone();

        assert_eq!(rel.label, "Capital Gains");
        assert_eq!(rel.color.as_deref(), Some(INCOME_FLOW_COLOR));
        assert_eq!(rel.percentage, None);
    }

    #[test]
    fn test_delete_dispatches_by_kind() {
        let (mut diagram, [a, b, _]) = three_entity_chain();
        let rel_id = diagram
            .add_relationship(&a, &b, RelationshipType::Equity, "Equity", Default::default())
            .id()
            .to_string();

        diagram.delete(&rel_id);
        assert!(diagram.relationships().is_empty());
        assert_eq!(diagram.entities().len(), 3);

        diagram.delete(&a);
        assert_eq!(diagram.entities().len(), 2);
    }

    #[test]
    fn test_reissue_ids_remaps_endpoints() {
        let (mut diagram, [a, b, _]) = three_entity_chain();
        diagram.add_relationship(&a, &b, RelationshipType::Equity, "Equity", Default::default());
        diagram.add_relationship(&a, "outside", RelationshipType::Debt, "Loan", Default::default());

        diagram.reissue_ids();

        assert!(diagram.entity(&a).is_none());
        let first = &diagram.relationships()[0];
        assert!(diagram.entity(&first.from_id).is_some());
        assert!(diagram.entity(&first.to_id).is_some());
        assert_eq!(diagram.relationships()[1].to_id, "outside");
    }

    #[test]
    fn test_deserializes_structure_payload() {
        let json = r#"{
            "entities": [
                {"id": "1", "type": "INDIVIDUAL", "name": "Founder", "incorporationJurisdiction": "Hong Kong", "x": 400, "y": 50},
                {"id": "2", "type": "JOINT_STOCK_COMPANY", "shape": "CIRCLE", "name": "HoldCo", "incorporationJurisdiction": "BVI", "x": 400, "y": 200}
            ],
            "relationships": [
                {"id": "r1", "fromId": "1", "toId": "2", "type": "EQUITY", "label": "Equity", "percentage": 100}
            ]
        }"#;
        let diagram: Diagram = serde_json::from_str(json).unwrap();

        assert_eq!(diagram.entities().len(), 2);
        assert_eq!(diagram.entity("2").unwrap().shape(), EntityShape::Circle);
        assert_eq!(diagram.relationship("r1").unwrap().display_text(), "100% Equity");
    }
}
