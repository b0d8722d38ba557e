//! Entities: the nodes of an ownership diagram.

use std::{fmt, str};

use serde::{Deserialize, Serialize};

use crate::{geometry::Point, shape::EntityShape};

/// The legal kind of an entity.
///
/// Purely descriptive: it selects the accent colour and the type caption, and
/// has no effect on layout or routing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityType {
    JointStockCompany,
    Individual,
    Partnership,
    Foundation,
    JointVenture,
    Branch,
    RepresentativeOffice,
    Spv,
    Society,
    SoleProprietorship,
    ListedCompany,
    LimitedCompany,
    UnlimitedCompany,
    Cooperative,
    Lpf,
    Ofc,
    UnitTrust,
    DiscretionaryTrust,
    HybridTrust,
    CharitableTrust,
    CharitableCompany,
    VentureCapital,
}

impl EntityType {
    pub const ALL: [EntityType; 22] = [
        Self::JointStockCompany,
        Self::Individual,
        Self::Partnership,
        Self::Foundation,
        Self::JointVenture,
        Self::Branch,
        Self::RepresentativeOffice,
        Self::Spv,
        Self::Society,
        Self::SoleProprietorship,
        Self::ListedCompany,
        Self::LimitedCompany,
        Self::UnlimitedCompany,
        Self::Cooperative,
        Self::Lpf,
        Self::Ofc,
        Self::UnitTrust,
        Self::DiscretionaryTrust,
        Self::HybridTrust,
        Self::CharitableTrust,
        Self::CharitableCompany,
        Self::VentureCapital,
    ];

    /// Returns the enumeration token, e.g. `"JOINT_STOCK_COMPANY"`.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::JointStockCompany => "JOINT_STOCK_COMPANY",
            Self::Individual => "INDIVIDUAL",
            Self::Partnership => "PARTNERSHIP",
            Self::Foundation => "FOUNDATION",
            Self::JointVenture => "JOINT_VENTURE",
            Self::Branch => "BRANCH",
            Self::RepresentativeOffice => "REPRESENTATIVE_OFFICE",
            Self::Spv => "SPV",
            Self::Society => "SOCIETY",
            Self::SoleProprietorship => "SOLE_PROPRIETORSHIP",
            Self::ListedCompany => "LISTED_COMPANY",
            Self::LimitedCompany => "LIMITED_COMPANY",
            Self::UnlimitedCompany => "UNLIMITED_COMPANY",
            Self::Cooperative => "COOPERATIVE",
            Self::Lpf => "LPF",
            Self::Ofc => "OFC",
            Self::UnitTrust => "UNIT_TRUST",
            Self::DiscretionaryTrust => "DISCRETIONARY_TRUST",
            Self::HybridTrust => "HYBRID_TRUST",
            Self::CharitableTrust => "CHARITABLE_TRUST",
            Self::CharitableCompany => "CHARITABLE_COMPANY",
            Self::VentureCapital => "VENTURE_CAPITAL",
        }
    }

    /// Returns the accent colour used when drawing entities of this kind.
    pub fn color(self) -> &'static str {
        match self {
            Self::JointStockCompany => "#3b82f6",
            Self::Individual => "#f59e0b",
            Self::Partnership => "#8b5cf6",
            Self::Foundation => "#ec4899",
            Self::JointVenture => "#06b6d4",
            Self::Branch => "#6366f1",
            Self::RepresentativeOffice => "#14b8a6",
            Self::Spv => "#f43f5e",
            Self::Society => "#84cc16",
            Self::SoleProprietorship => "#eab308",
            Self::ListedCompany => "#2563eb",
            Self::LimitedCompany => "#3b82f6",
            Self::UnlimitedCompany => "#ef4444",
            Self::Cooperative => "#f97316",
            Self::Lpf => "#6366f1",
            Self::Ofc => "#3b82f6",
            Self::UnitTrust => "#10b981",
            Self::DiscretionaryTrust => "#059669",
            Self::HybridTrust => "#0d9488",
            Self::CharitableTrust => "#0891b2",
            Self::CharitableCompany => "#0e7490",
            Self::VentureCapital => "#4f46e5",
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl str::FromStr for EntityType {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = s.trim().to_ascii_uppercase().replace(['-', ' '], "_");
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == token)
            .ok_or("Invalid entity type")
    }
}

/// A node in the ownership graph.
///
/// The `id` is fixed at creation. Position is free-floating and overlap with
/// other entities is allowed. Field names serialize in camelCase so stored
/// records stay compatible with the web editor's payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entity {
    id: String,
    #[serde(rename = "type")]
    pub entity_type: EntityType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    shape: Option<EntityShape>,
    pub name: String,
    #[serde(default)]
    pub incorporation_jurisdiction: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registration_location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub industry: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tax_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tax_status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tax_residency: Option<String>,
    #[serde(rename = "isCTC", default, skip_serializing_if = "Option::is_none")]
    pub is_ctc: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_family_office: Option<bool>,
    #[serde(rename = "isCFC", default, skip_serializing_if = "Option::is_none")]
    pub is_cfc: Option<bool>,
    #[serde(rename = "isDLRI", default, skip_serializing_if = "Option::is_none")]
    pub is_dlri: Option<bool>,
    #[serde(rename = "isSection88", default, skip_serializing_if = "Option::is_none")]
    pub is_section88: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    x: f32,
    y: f32,
}

impl Entity {
    /// Creates an entity with only the required attributes set.
    pub fn new(
        id: impl Into<String>,
        entity_type: EntityType,
        name: impl Into<String>,
        position: Point,
    ) -> Self {
        Self {
            id: id.into(),
            entity_type,
            shape: None,
            name: name.into(),
            incorporation_jurisdiction: String::new(),
            registration_location: None,
            industry: None,
            status: None,
            tax_number: None,
            tax_status: None,
            tax_residency: None,
            is_ctc: None,
            is_family_office: None,
            is_cfc: None,
            is_dlri: None,
            is_section88: None,
            notes: None,
            x: position.x(),
            y: position.y(),
        }
    }

    /// Sets the shape (builder style).
    pub fn with_shape(mut self, shape: EntityShape) -> Self {
        self.shape = Some(shape);
        self
    }

    /// Sets the incorporation jurisdiction (builder style).
    pub fn with_jurisdiction(mut self, jurisdiction: impl Into<String>) -> Self {
        self.incorporation_jurisdiction = jurisdiction.into();
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the shape, defaulting to a rectangle when none was recorded.
    pub fn shape(&self) -> EntityShape {
        self.shape.unwrap_or_default()
    }

    pub fn set_shape(&mut self, shape: EntityShape) {
        self.shape = Some(shape);
    }

    /// Returns the center position of the entity.
    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn set_position(&mut self, position: Point) {
        self.x = position.x();
        self.y = position.y();
    }

    /// Replaces the identifier. Only id re-issuing (template application)
    /// may do this, so it stays inside the crate.
    pub(crate) fn reassign_id(&mut self, id: String) {
        self.id = id;
    }
}

/// A partial update for an [`Entity`].
///
/// Every `Some` field overwrites the entity's value; `None` leaves it alone.
/// The id is not part of the patch because it never changes.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct EntityPatch {
    #[serde(rename = "type")]
    pub entity_type: Option<EntityType>,
    pub shape: Option<EntityShape>,
    pub name: Option<String>,
    pub incorporation_jurisdiction: Option<String>,
    pub registration_location: Option<String>,
    pub industry: Option<String>,
    pub status: Option<String>,
    pub tax_number: Option<String>,
    pub tax_status: Option<String>,
    pub tax_residency: Option<String>,
    #[serde(rename = "isCTC")]
    pub is_ctc: Option<bool>,
    pub is_family_office: Option<bool>,
    #[serde(rename = "isCFC")]
    pub is_cfc: Option<bool>,
    #[serde(rename = "isDLRI")]
    pub is_dlri: Option<bool>,
    pub is_section88: Option<bool>,
    pub notes: Option<String>,
    pub x: Option<f32>,
    pub y: Option<f32>,
}

impl EntityPatch {
    /// Merges the patch into `entity`.
    pub fn apply(self, entity: &mut Entity) {
        if let Some(entity_type) = self.entity_type {
            entity.entity_type = entity_type;
        }
        if let Some(shape) = self.shape {
            entity.shape = Some(shape);
        }
        if let Some(name) = self.name {
            entity.name = name;
        }
        if let Some(jurisdiction) = self.incorporation_jurisdiction {
            entity.incorporation_jurisdiction = jurisdiction;
        }
        merge(&mut entity.registration_location, self.registration_location);
        merge(&mut entity.industry, self.industry);
        merge(&mut entity.status, self.status);
        merge(&mut entity.tax_number, self.tax_number);
        merge(&mut entity.tax_status, self.tax_status);
        merge(&mut entity.tax_residency, self.tax_residency);
        merge(&mut entity.is_ctc, self.is_ctc);
        merge(&mut entity.is_family_office, self.is_family_office);
        merge(&mut entity.is_cfc, self.is_cfc);
        merge(&mut entity.is_dlri, self.is_dlri);
        merge(&mut entity.is_section88, self.is_section88);
        merge(&mut entity.notes, self.notes);
        if let Some(x) = self.x {
            entity.x = x;
        }
        if let Some(y) = self.y {
            entity.y = y;
        }
    }
}

pub(super) fn merge<T>(slot: &mut Option<T>, value: Option<T>) {
    if value.is_some() {
        *slot = value;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_type_round_trips_token() {
        for kind in EntityType::ALL {
            assert_eq!(kind.as_str().parse::<EntityType>(), Ok(kind));
        }
        assert_eq!(
            "discretionary-trust".parse::<EntityType>(),
            Ok(EntityType::DiscretionaryTrust)
        );
        assert!("llama".parse::<EntityType>().is_err());
    }

    #[test]
    fn test_shape_defaults_to_rectangle() {
        let json = r#"{"id":"1","type":"INDIVIDUAL","name":"Founder","incorporationJurisdiction":"Hong Kong","x":400,"y":50}"#;
        let entity: Entity = serde_json::from_str(json).unwrap();

        assert_eq!(entity.shape(), EntityShape::Rectangle);
        assert_eq!(entity.position(), Point::new(400.0, 50.0));
        assert_eq!(entity.entity_type, EntityType::Individual);
    }

    #[test]
    fn test_flag_fields_use_original_casing() {
        let mut entity = Entity::new("e1", EntityType::Spv, "Vehicle", Point::default());
        entity.is_ctc = Some(true);
        entity.is_section88 = Some(false);

        let value = serde_json::to_value(&entity).unwrap();
        assert_eq!(value["isCTC"], true);
        assert_eq!(value["isSection88"], false);
        assert_eq!(value["type"], "SPV");
        assert!(value.get("shape").is_none());
    }

    #[test]
    fn test_patch_merges_only_present_fields() {
        let mut entity = Entity::new("e1", EntityType::Individual, "Founder", Point::default())
            .with_jurisdiction("Hong Kong");
        entity.notes = Some("keep me".to_string());

        let patch = EntityPatch {
            name: Some("Settlor".to_string()),
            shape: Some(EntityShape::Circle),
            is_cfc: Some(true),
            ..EntityPatch::default()
        };
        patch.apply(&mut entity);

        assert_eq!(entity.name, "Settlor");
        assert_eq!(entity.shape(), EntityShape::Circle);
        assert_eq!(entity.is_cfc, Some(true));
        assert_eq!(entity.incorporation_jurisdiction, "Hong Kong");
        assert_eq!(entity.notes.as_deref(), Some("keep me"));
        assert_eq!(entity.id(), "e1");
    }

    #[test]
    fn test_patch_rejects_id_field() {
        let result: Result<EntityPatch, _> = serde_json::from_str(r#"{"id":"other"}"#);
        assert!(result.is_err());
    }
}
