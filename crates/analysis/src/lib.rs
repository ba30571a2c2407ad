//! Diagnostic analysis invocation for MedVision.
//!
//! One invocation either forwards the image to a hosted generative-AI
//! endpoint (when a credential is configured) or synthesizes a
//! deterministic mock report after a simulated delay. Invocations are
//! single-shot: no retry, no streaming, no cancellation.

mod error;
mod protocol;
mod remote;
mod service;
mod simulator;

pub use error::*;
pub use remote::*;
pub use service::*;
pub use simulator::*;

use async_trait::async_trait;
use entities::AnalysisReport;

/// A single diagnostic analysis request.
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    /// Image as a `data:<mime>;base64,` URI (raw base64 is also accepted).
    pub image_data_uri: String,
    /// Imaging modality, e.g. `xray`, `ct`, `mri`.
    pub imaging_type: String,
    /// Body region under study.
    pub body_region: String,
    /// Patient name, used only for report narration.
    pub patient_name: String,
}

/// A backend capable of producing a diagnostic report.
#[async_trait]
pub trait Analyzer: Send + Sync {
    /// Runs one analysis to completion.
    async fn analyze(&self, request: &AnalysisRequest) -> AnalysisResult<AnalysisReport>;
}
