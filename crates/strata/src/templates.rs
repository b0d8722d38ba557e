//! Built-in structure templates.
//!
//! Each template is a complete diagram shipped as JSON inside the binary.
//! Template ids are only meaningful inside one template; [`Template::instantiate`]
//! re-issues them so that applying a template twice never yields shared ids.

use log::debug;

use strata_core::model::Diagram;

use crate::StrataError;

/// A named, built-in structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Template {
    slug: &'static str,
    title: &'static str,
    source: &'static str,
}

macro_rules! template {
    ($slug:literal, $title:literal) => {
        Template {
            slug: $slug,
            title: $title,
            source: include_str!(concat!("../templates/", $slug, ".json")),
        }
    };
}

/// Every built-in template, in menu order.
pub const BUILTIN_TEMPLATES: [Template; 18] = [
    template!("hk-holding", "HK Holding Structure"),
    template!("hk-offshore", "HK-BVI Offshore Setup"),
    template!("offshore-chain", "HK/BVI/Cayman Chain"),
    template!("hk-trust", "HK Family Trust"),
    template!("double-irish", "Double Irish"),
    template!("dutch-sandwich", "Double Irish + Dutch Sandwich"),
    template!("lux-financing", "Luxembourg Financing"),
    template!("swiss-principal", "Swiss Principal Company"),
    template!("sg-ip-box", "Singapore IP Box / Hub"),
    template!("mauritius-cyprus", "Mauritius / Cyprus Gateway"),
    template!("dutch-cv-bv", "Netherlands CV/BV"),
    template!("delaware-llc", "Delaware LLC / Check-the-Box"),
    template!("hk-cayman", "HK-Cayman"),
    template!("hk-delaware", "HK-Delaware"),
    template!("hk-singapore", "HK-Singapore"),
    template!("hk-luxembourg", "HK-Luxembourg"),
    template!("hk-mauritius", "HK-Mauritius"),
    template!("hk-netherlands", "HK-Netherlands"),
];

impl Template {
    /// Short identifier, e.g. `"double-irish"`.
    pub fn slug(&self) -> &'static str {
        self.slug
    }

    /// Human readable name, e.g. `"Double Irish"`.
    pub fn title(&self) -> &'static str {
        self.title
    }

    /// Parses the template with the ids it was authored with.
    pub fn diagram(&self) -> Result<Diagram, StrataError> {
        Ok(serde_json::from_str(self.source)?)
    }

    /// Parses the template and gives every entity and relationship a fresh
    /// id, remapping relationship endpoints.
    pub fn instantiate(&self) -> Result<Diagram, StrataError> {
        let mut diagram = self.diagram()?;
        diagram.reissue_ids();
        debug!(
            slug = self.slug,
            entities = diagram.entities().len(),
            relationships = diagram.relationships().len();
            "Template instantiated"
        );
        Ok(diagram)
    }
}

/// Looks a template up by slug.
///
/// ```
/// # use strata::templates::find_template;
/// let template = find_template("hk-trust").unwrap();
/// assert_eq!(template.title(), "HK Family Trust");
/// assert!(find_template("nope").is_none());
/// ```
pub fn find_template(slug: &str) -> Option<&'static Template> {
    BUILTIN_TEMPLATES
        .iter()
        .find(|template| template.slug == slug)
}
