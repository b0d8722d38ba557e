//! Relationships: directed, typed edges between two entities.

use std::{fmt, str};

use serde::{Deserialize, Serialize};

use super::entity::merge;

/// Colour given to relationships created from an income-flow preset.
pub const INCOME_FLOW_COLOR: &str = "#10b981";

/// The kind of a relationship. Descriptive only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RelationshipType {
    Equity,
    Debt,
    Trustee,
    Beneficiary,
    Partnership,
    Management,
    Services,
    Licensing,
    Dividend,
    Interest,
    Royalty,
    RentalIncome,
    CapitalGain,
    PensionAnnuity,
    SocialSecurity,
    IndependentService,
    BusinessProfit,
}

impl RelationshipType {
    pub const ALL: [RelationshipType; 17] = [
        Self::Equity,
        Self::Debt,
        Self::Trustee,
        Self::Beneficiary,
        Self::Partnership,
        Self::Management,
        Self::Services,
        Self::Licensing,
        Self::Dividend,
        Self::Interest,
        Self::Royalty,
        Self::RentalIncome,
        Self::CapitalGain,
        Self::PensionAnnuity,
        Self::SocialSecurity,
        Self::IndependentService,
        Self::BusinessProfit,
    ];

    /// Returns the enumeration token, e.g. `"CAPITAL_GAIN"`.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Equity => "EQUITY",
            Self::Debt => "DEBT",
            Self::Trustee => "TRUSTEE",
            Self::Beneficiary => "BENEFICIARY",
            Self::Partnership => "PARTNERSHIP",
            Self::Management => "MANAGEMENT",
            Self::Services => "SERVICES",
            Self::Licensing => "LICENSING",
            Self::Dividend => "DIVIDEND",
            Self::Interest => "INTEREST",
            Self::Royalty => "ROYALTY",
            Self::RentalIncome => "RENTAL_INCOME",
            Self::CapitalGain => "CAPITAL_GAIN",
            Self::PensionAnnuity => "PENSION_ANNUITY",
            Self::SocialSecurity => "SOCIAL_SECURITY",
            Self::IndependentService => "INDEPENDENT_SERVICE",
            Self::BusinessProfit => "BUSINESS_PROFIT",
        }
    }

    /// Returns the label derived from the token: `CAPITAL_GAIN` becomes
    /// `"Capital Gain"`.
    pub fn default_label(self) -> String {
        format_type_label(self.as_str())
    }

    /// Returns the preset label for the treaty income flows, or `None` for
    /// structural relationship kinds.
    pub fn income_flow_label(self) -> Option<&'static str> {
        match self {
            Self::Dividend => Some("Dividends"),
            Self::Interest => Some("Interest"),
            Self::Royalty => Some("Royalties"),
            Self::RentalIncome => Some("Rental Income"),
            Self::CapitalGain => Some("Capital Gains"),
            Self::BusinessProfit => Some("Business Profits"),
            Self::PensionAnnuity => Some("Pensions"),
            Self::SocialSecurity => Some("Social Security"),
            Self::IndependentService => Some("Ind. Services"),
            _ => None,
        }
    }
}

impl fmt::Display for RelationshipType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl str::FromStr for RelationshipType {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = s.trim().to_ascii_uppercase().replace(['-', ' '], "_");
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == token)
            .ok_or("Invalid relationship type")
    }
}

/// Formats an enumeration token as a label.
///
/// The token is split on underscores; each segment keeps its first character
/// and lower-cases the rest; segments are joined with spaces.
///
/// # Examples
///
/// ```
/// use strata_core::model::format_type_label;
///
/// assert_eq!(format_type_label("SOCIAL_SECURITY"), "Social Security");
/// assert_eq!(format_type_label("EQUITY"), "Equity");
/// ```
pub fn format_type_label(token: &str) -> String {
    token
        .split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_string() + &chars.as_str().to_lowercase(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Stroke pattern for a connector.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LineType {
    #[default]
    Solid,
    Dashed,
    Dotted,
}

impl LineType {
    /// Returns the SVG `stroke-dasharray` value, `None` for solid lines.
    pub fn dash_array(self) -> Option<&'static str> {
        match self {
            Self::Solid => None,
            Self::Dashed => Some("10,5"),
            Self::Dotted => Some("2,2"),
        }
    }
}

impl str::FromStr for LineType {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "SOLID" => Ok(Self::Solid),
            "DASHED" => Ok(Self::Dashed),
            "DOTTED" => Ok(Self::Dotted),
            _ => Err("Invalid line type"),
        }
    }
}

/// Optional attributes supplied when a relationship is created.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RelationshipExtras {
    pub percentage: Option<f64>,
    pub amount: Option<String>,
    pub color: Option<String>,
    pub line_type: Option<LineType>,
    pub notes: Option<String>,
}

impl RelationshipExtras {
    /// Extras carrying only an ownership percentage.
    pub fn with_percentage(percentage: f64) -> Self {
        Self {
            percentage: Some(percentage),
            ..Self::default()
        }
    }
}

/// A directed edge from `from_id` to `to_id`.
///
/// Endpoint ids are not validated against the entity collection; a
/// relationship whose endpoint is missing is simply not routed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Relationship {
    id: String,
    pub from_id: String,
    pub to_id: String,
    #[serde(rename = "type")]
    pub relationship_type: RelationshipType,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub percentage: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_type: Option<LineType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Relationship {
    pub fn new(
        id: impl Into<String>,
        from_id: impl Into<String>,
        to_id: impl Into<String>,
        relationship_type: RelationshipType,
        label: impl Into<String>,
        extras: RelationshipExtras,
    ) -> Self {
        Self {
            id: id.into(),
            from_id: from_id.into(),
            to_id: to_id.into(),
            relationship_type,
            label: label.into(),
            percentage: extras.percentage,
            amount: extras.amount,
            color: extras.color,
            line_type: extras.line_type,
            notes: extras.notes,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns true if this relationship touches `entity_id` at either end.
    pub fn references(&self, entity_id: &str) -> bool {
        self.from_id == entity_id || self.to_id == entity_id
    }

    /// Returns true if both relationships join the same unordered pair of
    /// entities. Direction does not matter.
    pub fn is_sibling_of(&self, other: &Relationship) -> bool {
        (self.from_id == other.from_id && self.to_id == other.to_id)
            || (self.from_id == other.to_id && self.to_id == other.from_id)
    }

    /// Returns the text drawn on the connector label: `"<pct>% <label>"` when a
    /// percentage is set, otherwise the bare label.
    pub fn display_text(&self) -> String {
        match self.percentage {
            Some(percentage) => format!("{percentage}% {}", self.label),
            None => self.label.clone(),
        }
    }

    /// Returns the line pattern, solid when none was recorded.
    pub fn line_type(&self) -> LineType {
        self.line_type.unwrap_or_default()
    }

    pub(crate) fn reassign_id(&mut self, id: String) {
        self.id = id;
    }
}

/// A partial update for a [`Relationship`].
///
/// When `relationship_type` is present the label is regenerated from the new
/// type after all other fields are merged, so an explicit `label` supplied in
/// the same patch is overwritten.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RelationshipPatch {
    pub from_id: Option<String>,
    pub to_id: Option<String>,
    #[serde(rename = "type")]
    pub relationship_type: Option<RelationshipType>,
    pub label: Option<String>,
    pub percentage: Option<f64>,
    pub amount: Option<String>,
    pub color: Option<String>,
    pub line_type: Option<LineType>,
    pub notes: Option<String>,
}

impl RelationshipPatch {
    /// Merges the patch into `relationship`.
    pub fn apply(self, relationship: &mut Relationship) {
        if let Some(from_id) = self.from_id {
            relationship.from_id = from_id;
        }
        if let Some(to_id) = self.to_id {
            relationship.to_id = to_id;
        }
        if let Some(label) = self.label {
            relationship.label = label;
        }
        merge(&mut relationship.percentage, self.percentage);
        merge(&mut relationship.amount, self.amount);
        merge(&mut relationship.color, self.color);
        merge(&mut relationship.line_type, self.line_type);
        merge(&mut relationship.notes, self.notes);

        if let Some(relationship_type) = self.relationship_type {
            relationship.relationship_type = relationship_type;
            relationship.label = relationship_type.default_label();
        }
    }
}
