//! Diagnostic analysis report types.

use serde::{Deserialize, Serialize};

/// Narrative sections of a diagnostic report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisDetail {
    /// One-paragraph summary of the study.
    pub summary: String,
    /// Detailed findings.
    pub findings: String,
    /// Description of the review that was performed.
    pub description: String,
    /// Symptoms consistent with the findings.
    pub symptoms: String,
    /// Recommended follow-up.
    pub recommendations: String,
}

/// A diagnostic report produced by one analysis invocation.
///
/// Transient by itself; callers persist it into a collection if they want
/// it kept.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    /// Whether an abnormality was identified.
    pub disease_found: bool,
    /// Name of the identified condition, or a normal-study marker.
    pub disease_name: String,
    /// Stage or acuity; empty when nothing was found.
    pub disease_stage: String,
    /// Narrative sections.
    pub analysis: AnalysisDetail,
}
