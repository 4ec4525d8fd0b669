//! REST client for the remote serverless functions.
//!
//! Each function is a JSON-in, JSON-out `POST` under a common base URL,
//! authenticated with a bearer key. Built on [`reqwest`].

use async_trait::async_trait;
use base64::Engine;
use studioplan_core::import::{AnalysisError, ColumnAnalyzer, ColumnMapping};
use studioplan_core::roster::{normalize_roster, RosterMember};
use studioplan_core::spreadsheet::Sheet;

use crate::messages::{
    AnalyzeStructureRequest, AnalyzeStructureResponse, ExtractRosterRequest,
    ExtractRosterResponse, ANALYSIS_SAMPLE_ROWS,
};

/// HTTP client for one functions deployment.
pub struct FunctionsApi {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

/// Errors from the functions REST layer.
#[derive(Debug, thiserror::Error)]
pub enum FunctionsError {
    /// The HTTP request itself failed (network, DNS, TLS, decoding).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The function returned a non-2xx status code.
    #[error("Remote function error ({status}): {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },
}

impl FunctionsApi {
    /// Create a client.
    ///
    /// * `base_url` - Functions root, e.g. `https://host/functions/v1`.
    /// * `api_key` - Sent as a bearer token when present.
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url, api_key)
    }

    /// Create a client reusing an existing [`reqwest::Client`].
    pub fn with_client(
        client: reqwest::Client,
        base_url: impl Into<String>,
        api_key: Option<String>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
        }
    }

    /// Ask the remote classifier to map the sheet's columns.
    ///
    /// Only the first rows are sent, as display strings.
    pub async fn analyze_structure(&self, sheet: &Sheet) -> Result<ColumnMapping, FunctionsError> {
        let body = AnalyzeStructureRequest {
            rows: sheet.preview(ANALYSIS_SAMPLE_ROWS),
        };
        let response: AnalyzeStructureResponse =
            self.post("analyze-excel-structure", &body).await?;
        Ok(response.into_mapping(sheet.width()))
    }

    /// Extract a team roster from a base64-encoded image.
    ///
    /// The returned roster is already passed through [`normalize_roster`].
    pub async fn extract_team_roster(
        &self,
        image_base64: &str,
        mime_type: &str,
    ) -> Result<Vec<RosterMember>, FunctionsError> {
        let body = ExtractRosterRequest {
            image: image_base64,
            mime_type,
        };
        let response: ExtractRosterResponse = self.post("extract-team-roster", &body).await?;
        Ok(normalize_roster(response.members))
    }

    // ---- private helpers ----

    async fn post<B: serde::Serialize, T: serde::de::DeserializeOwned>(
        &self,
        function: &str,
        body: &B,
    ) -> Result<T, FunctionsError> {
        let mut request = self
            .client
            .post(format!("{}/{}", self.base_url, function))
            .json(body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        tracing::debug!(function, "Calling remote function");
        let response = request.send().await?;
        Self::parse_response(response).await
    }

    /// Ensure the response has a success status code, or turn it into
    /// [`FunctionsError::Api`] carrying the body text.
    async fn ensure_success(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, FunctionsError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(FunctionsError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, FunctionsError> {
        let response = Self::ensure_success(response).await?;
        Ok(response.json::<T>().await?)
    }
}

/// Base64-encode raw image bytes for [`FunctionsApi::extract_team_roster`].
pub fn encode_image(bytes: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(bytes)
}

#[async_trait]
impl ColumnAnalyzer for FunctionsApi {
    async fn analyze(&self, sheet: &Sheet) -> Result<ColumnMapping, AnalysisError> {
        self.analyze_structure(sheet).await.map_err(|e| match e {
            FunctionsError::Request(err) if err.is_decode() => {
                AnalysisError::InvalidResponse(err.to_string())
            }
            other => AnalysisError::Remote(other.to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use studioplan_core::import::{analyze_with_fallback, AnalysisSource, ProjectField};

    use super::*;

    fn sheet() -> Sheet {
        Sheet::from_strings([["Job", "Title"], ["1.1", "Tower"]])
    }

    #[tokio::test]
    async fn analyze_structure_posts_rows_and_converts_mapping() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/analyze-excel-structure")
            .match_header("authorization", "Bearer secret")
            .match_body(mockito::Matcher::PartialJson(serde_json::json!({
                "rows": [["Job", "Title"], ["1.1", "Tower"]]
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"header_row":0,"columns":[{"index":0,"field":"code"},{"index":1,"field":"name","confidence":0.7}]}"#)
            .create_async()
            .await;

        let api = FunctionsApi::new(format!("{}/", server.url()), Some("secret".into()));
        let mapping = api.analyze_structure(&sheet()).await.unwrap();

        mock.assert_async().await;
        assert_eq!(mapping.source, AnalysisSource::Remote);
        assert_eq!(mapping.column_of(ProjectField::Name), Some(1));
    }

    #[tokio::test]
    async fn non_success_status_is_an_api_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/extract-team-roster")
            .with_status(503)
            .with_body("overloaded")
            .create_async()
            .await;

        let api = FunctionsApi::new(server.url(), None);
        let err = api.extract_team_roster("aGk=", "image/png").await.unwrap_err();
        assert_matches!(err, FunctionsError::Api { status: 503, ref body } if body == "overloaded");
    }

    #[tokio::test]
    async fn roster_is_normalized() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/extract-team-roster")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"members":[{"name":" Ada "},{"name":"ada"},{"name":""}]}"#)
            .create_async()
            .await;

        let api = FunctionsApi::new(server.url(), None);
        let roster = api.extract_team_roster(&encode_image(b"png"), "image/png").await.unwrap();
        assert_eq!(roster.len(), 1);
        assert_eq!(roster[0].name, "Ada");
        assert_eq!(roster[0].weekly_capacity, Some(40.0));
    }

    #[tokio::test]
    async fn failed_remote_analysis_falls_back_to_heuristics() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/analyze-excel-structure")
            .with_status(500)
            .create_async()
            .await;

        let api = FunctionsApi::new(server.url(), None);
        let mapping = analyze_with_fallback(Some(&api), &sheet()).await;
        assert_eq!(mapping.source, AnalysisSource::Heuristic);
        assert!(mapping.suggestions[0].contains("unavailable"));
    }

    #[test]
    fn encodes_image_as_standard_base64() {
        assert_eq!(encode_image(b"hi"), "aGk=");
    }
}
