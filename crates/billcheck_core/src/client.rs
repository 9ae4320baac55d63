//! HTTP client for the remote authenticity classifier.

use reqwest::StatusCode;
use reqwest::blocking::multipart::{Form, Part};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default classifier address, matching the reference deployment.
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";

/// Environment variable overriding the classifier base URL.
pub const BASE_URL_ENV: &str = "BILLCHECK_API_URL";

/// Base URL of the classification service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    base_url: String,
}

impl Endpoint {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }

    /// Reads `BILLCHECK_API_URL`, falling back to [`DEFAULT_BASE_URL`].
    pub fn from_env() -> Self {
        match std::env::var(BASE_URL_ENV) {
            Ok(url) if !url.trim().is_empty() => Self::new(url),
            _ => Self::default(),
        }
    }

    /// Full URL of the prediction endpoint.
    pub fn predict_url(&self) -> String {
        format!("{}/predict", self.base_url.trim_end_matches('/'))
    }
}

impl Default for Endpoint {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

/// Classifier output: a label plus an optional confidence fraction in [0,1].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub label: String,
    pub confidence: Option<f64>,
}

impl Prediction {
    /// Confidence rendered as a percentage string, when present.
    pub fn confidence_percent(&self) -> Option<String> {
        self.confidence.map(format_confidence)
    }
}

/// Formats a confidence fraction as a two-decimal percentage, e.g. `93.00%`.
///
/// Uses Rust's default float formatting; exact halfway values round to even.
pub fn format_confidence(fraction: f64) -> String {
    format!("{:.2}%", fraction * 100.0)
}

/// Why a prediction request failed. Logged, never shown to the user.
#[derive(Debug, Error)]
pub enum PredictError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("server returned HTTP {0}")]
    Status(StatusCode),
    #[error("malformed response body: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Wire shape of a successful `/predict` response.
#[derive(Debug, Deserialize)]
struct PredictResponse {
    prediction: String,
    confidence: Option<f64>,
}

/// Blocking client for the `/predict` endpoint. Cheap to clone; submissions
/// run it on a background thread so the interface never blocks on it.
#[derive(Debug, Clone)]
pub struct InferenceClient {
    url: String,
    http: reqwest::blocking::Client,
}

impl InferenceClient {
    pub fn new(endpoint: Endpoint) -> Self {
        Self {
            url: endpoint.predict_url(),
            http: reqwest::blocking::Client::new(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Submits the file bytes as one multipart POST and maps the response.
    ///
    /// Single request, no retry, the client's default timeout. The part is
    /// named `file`, which is the only field the classifier reads.
    pub fn predict(&self, file_name: &str, bytes: &[u8]) -> Result<Prediction, PredictError> {
        let part = Part::bytes(bytes.to_vec()).file_name(file_name.to_owned());
        let form = Form::new().part("file", part);

        let response = self.http.post(&self.url).multipart(form).send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(PredictError::Status(status));
        }

        let body = response.text()?;
        let parsed: PredictResponse = serde_json::from_str(&body)?;
        Ok(Prediction {
            label: parsed.prediction,
            confidence: parsed.confidence,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn endpoint_defaults_to_local_service() {
        assert_eq!(Endpoint::default().predict_url(), "http://127.0.0.1:8000/predict");
    }

    #[test]
    fn endpoint_trims_trailing_slashes() {
        let endpoint = Endpoint::new("http://classifier.internal:9000/");
        assert_eq!(endpoint.predict_url(), "http://classifier.internal:9000/predict");
    }

    #[rstest]
    #[case(0.0, "0.00%")]
    #[case(0.5, "50.00%")]
    #[case(1.0, "100.00%")]
    #[case(0.93, "93.00%")]
    #[case(0.8675, "86.75%")]
    fn confidence_renders_with_two_decimals(#[case] fraction: f64, #[case] expected: &str) {
        assert_eq!(format_confidence(fraction), expected);
    }

    #[test]
    fn prediction_without_confidence_has_no_percentage() {
        let prediction = Prediction {
            label: "real".to_string(),
            confidence: None,
        };
        assert_eq!(prediction.confidence_percent(), None);
    }

    #[test]
    fn wire_shape_tolerates_missing_confidence() {
        let parsed: PredictResponse = serde_json::from_str(r#"{"prediction":"fake"}"#).unwrap();
        assert_eq!(parsed.prediction, "fake");
        assert_eq!(parsed.confidence, None);
    }
}
