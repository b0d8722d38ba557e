//! The structured analysis result and its plain-text rendering.

use std::fmt;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

const DISCLAIMER: &str = "Disclaimer: This report is generated by AI for informational purposes only and does not constitute professional tax or legal advice.";

/// Structured tax analysis of one diagram.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    #[serde(default)]
    pub investor_considerations: Vec<String>,
    #[serde(default)]
    pub structure_considerations: Vec<String>,
    #[serde(default)]
    pub downstream_implications: Vec<String>,
    #[serde(default)]
    pub step_plan: Vec<PlanStep>,
    #[serde(default)]
    pub refinements: Vec<String>,
}

/// One step of the implementation plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanStep {
    pub step: f64,
    pub action: String,
    pub tax_impact: String,
}

/// Renders the downloadable plain-text report.
///
/// The layout is a fixed header, four numbered sections and the disclaimer
/// footer. Downstream implications are part of the structured result but not
/// of the text report.
///
/// # Examples
///
/// ```
/// # use strata::analysis::{AnalysisReport, render_report};
/// let text = render_report(&AnalysisReport::default(), "HK Holding", chrono::Local::now());
/// assert!(text.starts_with("TAX STRUCTURE ANALYSIS REPORT"));
/// assert!(text.contains("Structure: HK Holding"));
/// ```
pub fn render_report(report: &AnalysisReport, structure_name: &str, generated_at: DateTime<Local>) -> String {
    let mut text = String::new();
    write_report(&mut text, report, structure_name, generated_at)
        .expect("Writing to String buffer is infallible");
    text.trim().to_string()
}

fn write_report(
    out: &mut impl fmt::Write,
    report: &AnalysisReport,
    structure_name: &str,
    generated_at: DateTime<Local>,
) -> fmt::Result {
    writeln!(out, "TAX STRUCTURE ANALYSIS REPORT")?;
    writeln!(out, "Generated on: {}", generated_at.format("%Y-%m-%d %H:%M:%S"))?;
    writeln!(out, "Structure: {structure_name}")?;
    writeln!(out)?;

    writeln!(out, "1. INVESTOR CONSIDERATIONS")?;
    writeln!(out, "{}", bullets(&report.investor_considerations))?;
    writeln!(out)?;

    writeln!(out, "2. STRUCTURE RISKS & CONSIDERATIONS")?;
    writeln!(out, "{}", bullets(&report.structure_considerations))?;
    writeln!(out)?;

    let steps = report
        .step_plan
        .iter()
        .map(|step| format!("Step {}: {}\n   Impact: {}", step.step, step.action, step.tax_impact))
        .collect::<Vec<_>>()
        .join("\n\n");
    writeln!(out, "3. STEP-BY-STEP IMPLEMENTATION PLAN")?;
    writeln!(out, "{steps}")?;
    writeln!(out)?;

    writeln!(out, "4. AI REFINEMENTS & SUGGESTIONS")?;
    writeln!(out, "{}", bullets(&report.refinements))?;
    writeln!(out)?;

    writeln!(out, "---")?;
    write!(out, "{DISCLAIMER}")
}

fn bullets(items: &[String]) -> String {
    items
        .iter()
        .map(|item| format!("- {item}"))
        .collect::<Vec<_>>()
        .join("\n")
}
