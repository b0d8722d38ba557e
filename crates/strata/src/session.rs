//! The editing session: one live diagram with its identity.
//!
//! A [`Session`] owns the diagram being edited together with the id and name
//! it is saved under. It is passed explicitly to every operation; there is no
//! process-wide diagram.

use chrono::Local;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use url::Url;

use strata_core::{
    identifier::new_id,
    model::{ConnectDirection, Diagram},
};

use crate::{
    StrataError,
    analysis::{AnalysisReport, Analyzer, GenerativeModel, Sleeper, render_report},
    export::{analysis_file_name, diagram_file_name},
    store::{StructureRecord, StructureStore},
    templates::Template,
};

/// Name given to a fresh session.
pub const DEFAULT_STRUCTURE_NAME: &str = "Untitled Structure";

const SHARE_QUERY_KEY: &str = "id";

/// An editing session.
///
/// Serializes as `{id, name, data}`, the shape of a structure record without
/// its timestamp.
///
/// # Examples
///
/// ```
/// use strata::Session;
///
/// let session = Session::new();
/// assert_eq!(session.name(), "Untitled Structure");
///
/// let url = session.share_url("http://localhost:3000").unwrap();
/// assert_eq!(Session::id_from_share_url(&url).as_deref(), Some(session.id()));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    id: String,
    name: String,
    #[serde(rename = "data", default)]
    diagram: Diagram,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    /// Starts a session with a fresh id, the default name and an empty
    /// diagram.
    pub fn new() -> Self {
        Self {
            id: new_id(),
            name: DEFAULT_STRUCTURE_NAME.to_string(),
            diagram: Diagram::new(),
        }
    }

    pub fn from_record(record: StructureRecord) -> Self {
        Self {
            id: record.id,
            name: record.name,
            diagram: record.data,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn diagram(&self) -> &Diagram {
        &self.diagram
    }

    pub fn diagram_mut(&mut self) -> &mut Diagram {
        &mut self.diagram
    }

    /// Saves a snapshot of the current diagram under the session's id.
    ///
    /// # Errors
    ///
    /// Returns [`StrataError::Store`] when the store fails. Nothing is
    /// retried.
    pub fn save(&self, store: &dyn StructureStore) -> Result<(), StrataError> {
        let snapshot = self.diagram.clone();
        store.save(&self.id, &self.name, &snapshot)?;
        info!(id = self.id.as_str(), name = self.name.as_str(); "Session saved");
        Ok(())
    }

    /// Opens the structure with the given id, `None` when the store has no
    /// such record.
    pub fn open(store: &dyn StructureStore, id: &str) -> Result<Option<Self>, StrataError> {
        let session = store.load(id)?.map(Self::from_record);
        match &session {
            Some(session) => info!(id, name = session.name(); "Session opened"),
            None => info!(id; "No structure with this id"),
        }
        Ok(session)
    }

    /// Replaces the diagram with a fresh copy of `template`. The session keeps
    /// its id and name.
    pub fn apply_template(&mut self, template: &Template) -> Result<(), StrataError> {
        self.diagram = template.instantiate()?;
        info!(slug = template.slug(); "Template applied");
        Ok(())
    }

    /// See [`Diagram::batch_connect`].
    pub fn batch_connect<S: AsRef<str>>(
        &mut self,
        pivot_id: &str,
        target_ids: &[S],
        direction: ConnectDirection,
    ) -> Vec<String> {
        self.diagram.batch_connect(pivot_id, target_ids, direction)
    }

    /// Builds the link that reopens this session: `<base>/?id=<id>`.
    ///
    /// # Errors
    ///
    /// Returns [`StrataError::Config`] when `base_url` is not an absolute URL.
    pub fn share_url(&self, base_url: &str) -> Result<String, StrataError> {
        let mut url = Url::parse(base_url)
            .map_err(|err| StrataError::Config(format!("Invalid share base URL `{base_url}`: {err}")))?;
        url.set_fragment(None);
        url.query_pairs_mut()
            .clear()
            .append_pair(SHARE_QUERY_KEY, &self.id);
        Ok(url.into())
    }

    /// Extracts the session id from a shared link.
    ///
    /// Returns `None` when `url` does not parse or carries no non-empty `id`
    /// query parameter.
    pub fn id_from_share_url(url: &str) -> Option<String> {
        let url = Url::parse(url).ok()?;
        let id = url
            .query_pairs()
            .find(|(key, _)| key == SHARE_QUERY_KEY)
            .map(|(_, value)| value.into_owned())
            .filter(|value| !value.is_empty());
        debug!(id:?; "Parsed share URL");
        id
    }

    /// Download name of the rendered diagram.
    pub fn diagram_file_name(&self) -> String {
        diagram_file_name(&self.name)
    }

    /// Download name of the analysis report.
    pub fn analysis_file_name(&self) -> String {
        analysis_file_name(&self.name)
    }

    /// Runs the analysis on a snapshot of the diagram.
    pub fn analyze<M: GenerativeModel, S: Sleeper>(
        &self,
        analyzer: &Analyzer<M, S>,
    ) -> Result<AnalysisReport, StrataError> {
        Ok(analyzer.analyze(&self.diagram)?)
    }

    /// Renders `report` as the plain-text download for this session.
    pub fn report_text(&self, report: &AnalysisReport) -> String {
        render_report(report, &self.name, Local::now())
    }
}
