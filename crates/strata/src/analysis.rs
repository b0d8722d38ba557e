//! AI tax analysis of a diagram.
//!
//! The [`Analyzer`] serializes the diagram into a prompt, sends it to a
//! [`GenerativeModel`], and parses the JSON reply into an [`AnalysisReport`].
//! Failed attempts are retried according to a [`RetryPolicy`]; once the
//! attempts run out the last failure is returned inside
//! [`AnalysisError::Exhausted`]. There is never a partial result.

mod gemini;
mod report;
mod retry;

pub use gemini::GeminiClient;
pub use report::{AnalysisReport, PlanStep, render_report};
pub use retry::{RetryPolicy, Sleeper, ThreadSleeper};

use log::{info, warn};
use thiserror::Error;

use strata_core::model::Diagram;

use crate::config::AnalysisConfig;

/// Errors raised while producing an analysis.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("API key not found: set the `{0}` environment variable")]
    MissingApiKey(String),

    #[error("Request failed: {0}")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("Model service responded with status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Model returned an empty response")]
    EmptyResponse,

    #[error("Model response is not a valid analysis: {0}")]
    Parse(#[source] serde_json::Error),

    #[error("Analysis failed after {attempts} attempts: {last}")]
    Exhausted {
        attempts: u32,
        #[source]
        last: Box<AnalysisError>,
    },
}

impl AnalysisError {
    /// Returns false for failures that another attempt cannot fix.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::MissingApiKey(_) | Self::Exhausted { .. })
    }
}

/// A text generation backend: one blocking request, one response text.
pub trait GenerativeModel {
    fn generate(&self, prompt: &str) -> Result<String, AnalysisError>;
}

impl<M: GenerativeModel + ?Sized> GenerativeModel for &M {
    fn generate(&self, prompt: &str) -> Result<String, AnalysisError> {
        (**self).generate(prompt)
    }
}

/// Runs tax analysis with bounded retry.
///
/// # Examples
///
/// ```
/// use strata::analysis::{AnalysisError, Analyzer, GenerativeModel, RetryPolicy};
/// use strata::model::Diagram;
///
/// struct Canned;
///
/// impl GenerativeModel for Canned {
///     fn generate(&self, _prompt: &str) -> Result<String, AnalysisError> {
///         Ok(r#"{"refinements": ["Consider a CoR"]}"#.to_string())
///     }
/// }
///
/// let analyzer = Analyzer::new(Canned, RetryPolicy::default());
/// let report = analyzer.analyze(&Diagram::new()).unwrap();
/// assert_eq!(report.refinements, ["Consider a CoR"]);
/// ```
#[derive(Debug)]
pub struct Analyzer<M, S = ThreadSleeper> {
    model: M,
    policy: RetryPolicy,
    sleeper: S,
}

impl<M: GenerativeModel> Analyzer<M> {
    pub fn new(model: M, policy: RetryPolicy) -> Self {
        Self::with_sleeper(model, policy, ThreadSleeper)
    }
}

impl Analyzer<GeminiClient> {
    /// Builds a Gemini-backed analyzer from configuration.
    pub fn from_config(config: &AnalysisConfig) -> Result<Self, AnalysisError> {
        let model = GeminiClient::from_config(config)?;
        let policy = RetryPolicy::new(config.max_attempts(), config.base_delay());
        Ok(Self::new(model, policy))
    }
}

impl<M: GenerativeModel, S: Sleeper> Analyzer<M, S> {
    pub fn with_sleeper(model: M, policy: RetryPolicy, sleeper: S) -> Self {
        Self {
            model,
            policy,
            sleeper,
        }
    }

    /// Analyzes the diagram.
    ///
    /// # Errors
    ///
    /// Returns a non-retryable error as soon as it occurs, and
    /// [`AnalysisError::Exhausted`] wrapping the last failure once every
    /// attempt has failed.
    pub fn analyze(&self, diagram: &Diagram) -> Result<AnalysisReport, AnalysisError> {
        let prompt = build_prompt(diagram)?;
        let max_attempts = self.policy.max_attempts();

        let mut attempt = 0;
        loop {
            let err = match self.attempt(&prompt) {
                Ok(report) => {
                    info!(attempt = attempt + 1; "Analysis completed");
                    return Ok(report);
                }
                Err(err) if !err.is_retryable() => return Err(err),
                Err(err) => err,
            };

            warn!(attempt = attempt + 1, max_attempts, err:err; "Analysis attempt failed");
            attempt += 1;
            if attempt >= max_attempts {
                return Err(AnalysisError::Exhausted {
                    attempts: attempt,
                    last: Box::new(err),
                });
            }
            self.sleeper.sleep(self.policy.delay_after(attempt - 1));
        }
    }

    fn attempt(&self, prompt: &str) -> Result<AnalysisReport, AnalysisError> {
        let text = self.model.generate(prompt)?;
        serde_json::from_str(&text).map_err(AnalysisError::Parse)
    }
}

/// Builds the analysis prompt, embedding the diagram's entities and
/// relationships as JSON.
pub fn build_prompt(diagram: &Diagram) -> Result<String, AnalysisError> {
    let entities = serde_json::to_string(diagram.entities()).map_err(AnalysisError::Parse)?;
    let relationships =
        serde_json::to_string(diagram.relationships()).map_err(AnalysisError::Parse)?;

    Ok(format!(
        "Analyze the following tax structure for a professional tax advisor.

CRITICAL FOCUS:
1. International tax issues for the structure.
2. Double Taxation Agreements (DTA) between Hong Kong and other involved countries (especially the PRC, Singapore, UK, etc.).
3. Beneficial ownership requirements for treaty benefits.
4. Potential BEPS 2.0 implications (Pillar Two) if applicable.
5. Hong Kong's FSIE (Foreign-Sourced Income Exemption) regime.

Structure Data:
Entities: {entities}
Relationships: {relationships}

Provide a detailed analysis including investor considerations, structure considerations, downstream implications, a draft step plan, and suggested refinements."
    ))
}
