//! The diagram model: entities, relationships and the operations that edit
//! them.
//!
//! [`Diagram`] owns both collections. Entities and relationships are plain
//! data; edits go through the diagram so that deleting an entity can cascade
//! to the relationships that reference it.

mod diagram;
mod entity;
mod relationship;

pub use diagram::{ConnectDirection, DEFAULT_JURISDICTION, Diagram, SPAWN_EXTENT, SPAWN_ORIGIN};
pub use entity::{Entity, EntityPatch, EntityType};
pub use relationship::{
    INCOME_FLOW_COLOR, LineType, Relationship, RelationshipExtras, RelationshipPatch,
    RelationshipType, format_type_label,
};
