//! Remote analyzer over the generative-language endpoint.

use async_trait::async_trait;
use entities::AnalysisReport;
use tracing::debug;

use crate::protocol::{
    Content, GenerateContentRequest, GenerateContentResponse, GenerationConfig, InlineData, Part,
};
use crate::{AnalysisError, AnalysisRequest, AnalysisResult, Analyzer};

/// Default endpoint base.
const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Default model identifier.
const DEFAULT_MODEL: &str = "gemini-2.0-flash";

/// Sampling temperature; kept low so reports stay close to deterministic.
const TEMPERATURE: f32 = 0.1;

/// MIME type assumed when the data URI carries none.
const DEFAULT_MIME: &str = "image/jpeg";

/// Analyzer that forwards the image to a hosted generative-AI endpoint.
pub struct RemoteAnalyzer {
    http: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: String,
}

impl RemoteAnalyzer {
    /// Creates an analyzer authenticating with `api_key`.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_key: api_key.into(),
        }
    }

    /// Overrides the endpoint base URL.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into().trim_end_matches('/').to_string();
        self
    }

    /// Overrides the model identifier.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    fn build_request(&self, request: &AnalysisRequest) -> GenerateContentRequest {
        let (mime_type, data) = split_data_uri(&request.image_data_uri);
        GenerateContentRequest {
            contents: vec![Content {
                parts: vec![
                    Part::Text {
                        text: build_prompt(request),
                    },
                    Part::InlineData {
                        inline_data: InlineData {
                            mime_type: mime_type.to_string(),
                            data: data.to_string(),
                        },
                    },
                ],
            }],
            generation_config: GenerationConfig {
                temperature: TEMPERATURE,
                response_mime_type: "application/json",
            },
        }
    }
}

#[async_trait]
impl Analyzer for RemoteAnalyzer {
    async fn analyze(&self, request: &AnalysisRequest) -> AnalysisResult<AnalysisReport> {
        let url = format!("{}/models/{}:generateContent", self.endpoint, self.model);
        debug!(model = %self.model, "invoking remote analysis");

        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&self.build_request(request))
            .send()
            .await
            .map_err(|e| AnalysisError::RemoteCallFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AnalysisError::RemoteCallFailed(format!(
                "endpoint returned status {status}: {body}"
            )));
        }

        let body: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| AnalysisError::RemoteResponseInvalid(e.to_string()))?;

        let text = body
            .candidates
            .first()
            .and_then(|candidate| candidate.content.parts.first())
            .map(|part| part.text.as_str())
            .ok_or_else(|| {
                AnalysisError::RemoteResponseInvalid("response contained no candidates".to_string())
            })?;

        serde_json::from_str(strip_code_fences(text))
            .map_err(|e| AnalysisError::RemoteResponseInvalid(format!("report did not parse: {e}")))
    }
}

/// Splits a `data:` URI into its MIME type and base64 payload.
///
/// Input without a recognizable prefix is passed through whole with the
/// default MIME type.
pub(crate) fn split_data_uri(uri: &str) -> (&str, &str) {
    let Some(rest) = uri.strip_prefix("data:") else {
        return (DEFAULT_MIME, uri);
    };
    match rest.split_once(";base64,") {
        Some((mime, payload)) if !mime.is_empty() => (mime, payload),
        Some((_, payload)) => (DEFAULT_MIME, payload),
        None => (DEFAULT_MIME, uri),
    }
}

/// Strips surrounding Markdown code fences from a model response.
pub(crate) fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let inner = inner.strip_prefix("json").unwrap_or(inner);
    let inner = inner.strip_suffix("```").unwrap_or(inner);
    inner.trim()
}

fn build_prompt(request: &AnalysisRequest) -> String {
    format!(
        "You are assisting a radiologist. Analyze the attached {imaging} image of the {region} \
         for patient {name}. Respond with a single JSON object of this exact shape: \
         {{\"disease_found\": boolean, \"disease_name\": string, \"disease_stage\": string, \
         \"analysis\": {{\"summary\": string, \"findings\": string, \"description\": string, \
         \"symptoms\": string, \"recommendations\": string}}}}. \
         If the study is normal, set disease_found to false and disease_name to \
         \"No Abnormalities Detected\". No prose outside the JSON object.",
        imaging = request.imaging_type,
        region = request.body_region,
        name = request.patient_name,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_data_uri_detects_mime() {
        let (mime, payload) = split_data_uri("data:image/png;base64,AAAA");
        assert_eq!(mime, "image/png");
        assert_eq!(payload, "AAAA");
    }

    #[test]
    fn test_split_data_uri_defaults_to_jpeg() {
        let (mime, payload) = split_data_uri("data:;base64,BBBB");
        assert_eq!(mime, "image/jpeg");
        assert_eq!(payload, "BBBB");

        let (mime, payload) = split_data_uri("CCCC");
        assert_eq!(mime, "image/jpeg");
        assert_eq!(payload, "CCCC");
    }

    #[test]
    fn test_strip_code_fences_variants() {
        assert_eq!(strip_code_fences("{\"a\":1}"), "{\"a\":1}");
        assert_eq!(strip_code_fences("```{\"a\":1}```"), "{\"a\":1}");
        assert_eq!(strip_code_fences("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fences("  ```json {\"a\":1} ``` "), "{\"a\":1}");
    }

    #[test]
    fn test_prompt_names_the_study() {
        let prompt = build_prompt(&AnalysisRequest {
            image_data_uri: "data:image/png;base64,AAAA".to_string(),
            imaging_type: "xray".to_string(),
            body_region: "wrist".to_string(),
            patient_name: "A. Ruiz".to_string(),
        });
        assert!(prompt.contains("xray"));
        assert!(prompt.contains("wrist"));
        assert!(prompt.contains("A. Ruiz"));
        assert!(prompt.contains("disease_found"));
    }
}
