//! Deterministic analysis simulator.

use std::time::Duration;

use async_trait::async_trait;
use entities::{AnalysisDetail, AnalysisReport};
use rand::Rng;
use tracing::debug;

use crate::{AnalysisRequest, AnalysisResult, Analyzer};

/// Default artificial latency before a simulated report is returned.
const DEFAULT_DELAY: Duration = Duration::from_millis(1500);

/// Probability that a simulated study contains a finding.
const FINDING_PROBABILITY: f64 = 0.6;

/// Analyzer that fabricates a plausible report without any network call.
pub struct SimulatedAnalyzer {
    delay: Duration,
}

impl SimulatedAnalyzer {
    /// Creates a simulator with the default latency.
    pub fn new() -> Self {
        Self {
            delay: DEFAULT_DELAY,
        }
    }

    /// Overrides the artificial latency; `Duration::ZERO` disables it.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

impl Default for SimulatedAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Analyzer for SimulatedAnalyzer {
    async fn analyze(&self, request: &AnalysisRequest) -> AnalysisResult<AnalysisReport> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let finding = rand::rng().random_bool(FINDING_PROBABILITY);
        debug!(imaging_type = %request.imaging_type, finding, "simulated analysis");
        Ok(simulate_report(
            &request.imaging_type,
            &request.body_region,
            finding,
        ))
    }
}

/// Builds a report from the modality decision table.
///
/// `finding` selects between the abnormal branch for the modality and the
/// normal-study report; modalities other than `xray`, `ct`, and `mri`
/// take the dermatological branch.
pub fn simulate_report(imaging_type: &str, body_region: &str, finding: bool) -> AnalysisReport {
    let type_label = if imaging_type.is_empty() {
        "SCAN".to_string()
    } else {
        imaging_type.to_uppercase()
    };
    let region_label = if body_region.is_empty() {
        "targeted area".to_string()
    } else {
        body_region.to_lowercase()
    };

    if !finding {
        return AnalysisReport {
            disease_found: false,
            disease_name: "No Abnormalities Detected".to_string(),
            disease_stage: String::new(),
            analysis: AnalysisDetail {
                summary: format!("The {type_label} of the {region_label} appears entirely normal."),
                findings: format!(
                    "Thorough examination of the {region_label} shows intact anatomical \
                     structures. Tissue density, boundaries, and morphology are all within \
                     normal physiological limits. No signs of masses, lesions, or active \
                     inflammation."
                ),
                description: format!(
                    "Comprehensive AI-assisted radiological review of the {type_label} imaging."
                ),
                symptoms: "N/A - Healthy profile.".to_string(),
                recommendations: "No immediate medical intervention is required based on this \
                                  scan. Continue with routine health maintenance."
                    .to_string(),
            },
        };
    }

    let (disease_name, disease_stage, summary, findings, symptoms, recommendations) =
        match imaging_type {
            "xray" => (
                "Subtle Hairline Fracture".to_string(),
                "Acute (Undisplaced)".to_string(),
                format!(
                    "The radiological examination of the {region_label} reveals a subtle \
                     undisplaced hairline fracture."
                ),
                format!(
                    "Review of the radiograph reveals a faint, non-displaced radiolucent line, \
                     consistent with a subtle hairline fracture. The anatomical alignment is \
                     maintained with no significant displacement, step-off, or angulation. The \
                     adjacent bony structures appear intact, and no significant joint effusion \
                     or severe soft tissue swelling is definitively identified."
                ),
                "Patient may report localized pain, tenderness upon palpation, mild to moderate \
                 swelling, and pain exacerbated by weight-bearing or movement."
                    .to_string(),
                "Conservative management with immobilization (such as a splint or cast) is \
                 typically recommended to promote healing and prevent displacement. Rest, \
                 elevation, and icing should be applied to reduce swelling. Orthopedic \
                 follow-up with repeat radiographs in 1-2 weeks is advised to monitor interval \
                 healing and alignment."
                    .to_string(),
            ),
            "ct" => (
                format!("Mass Lesion / Nodularity in {region_label}"),
                "Stage II".to_string(),
                format!(
                    "The structural {type_label} analysis of the {region_label} indicates a \
                     distinct anomalous formation."
                ),
                format!(
                    "High-resolution slices show a hyperdense nodule measuring approximately \
                     2.4cm in the {region_label}. Surrounding tissue exhibits mild edema but no \
                     gross invasion into adjacent structures."
                ),
                "May present as chronic localized pressure, unexplained weight loss, or \
                 persistent localized discomfort."
                    .to_string(),
                "Schedule a follow-up PET scan and consider an image-guided biopsy to determine \
                 malignancy."
                    .to_string(),
            ),
            "mri" => (
                format!("Tissue Inflammation / Tears in {region_label}"),
                "Acute".to_string(),
                format!(
                    "Detailed soft-tissue {type_label} of the {region_label} shows signs of \
                     acute tissue distress."
                ),
                format!(
                    "T2-weighted images demonstrate hyperintense signals throughout the \
                     {region_label}, indicative of severe edema and possible micro-tearing of \
                     the connective fibers. No complete rupture is observed."
                ),
                "Significant swelling, reduced range of motion, and sharp pain during specific \
                 movements."
                    .to_string(),
                "Strict rest, application of ice, and NSAIDs. Physical therapy consultation \
                 required in 2 weeks once acute inflammation subsides."
                    .to_string(),
            ),
            _ => (
                format!("Dermatological Anomaly on {region_label}"),
                "Stage I".to_string(),
                format!(
                    "Visual inspection of the {region_label} indicates irregular pigmentation \
                     patterns."
                ),
                format!(
                    "The lesion on the {region_label} presents with asymmetric borders, varied \
                     coloration (including dark brown and erythematous areas), and a diameter \
                     exceeding 6mm."
                ),
                "Patient may report recent changes in size, shape, or color, accompanied by \
                 mild pruritus."
                    .to_string(),
                "Urgent consultation with a dermatologist for an excisional biopsy to rule out \
                 malignant melanoma."
                    .to_string(),
            ),
        };

    AnalysisReport {
        disease_found: true,
        disease_name,
        disease_stage,
        analysis: AnalysisDetail {
            summary,
            findings,
            description: format!(
                "Comprehensive AI-assisted radiological review of the {type_label} imaging."
            ),
            symptoms,
            recommendations,
        },
    }
}
