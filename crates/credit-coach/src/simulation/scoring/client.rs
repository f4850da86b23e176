use tracing::{debug, warn};

use super::{ScoringClient, ScoringError, ScoringMode, ScoringResult};
use crate::config::ScoringConfig;
use crate::simulation::features::FeatureVector;

/// reqwest-backed client for the `/predict` and `/what-if` endpoints.
#[derive(Debug, Clone)]
pub struct HttpScoringClient {
    base_url: String,
    http_client: reqwest::Client,
}

impl HttpScoringClient {
    pub fn new(config: &ScoringConfig) -> Result<Self, ScoringError> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|err| ScoringError::Network(err.to_string()))?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            http_client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, mode: ScoringMode) -> String {
        format!("{}{}", self.base_url, mode.path())
    }
}

impl ScoringClient for HttpScoringClient {
    async fn score(
        &self,
        vector: &FeatureVector,
        mode: ScoringMode,
    ) -> Result<ScoringResult, ScoringError> {
        let url = self.endpoint(mode);

        let response = self
            .http_client
            .post(&url)
            .json(vector)
            .send()
            .await
            .map_err(|err| {
                warn!(%url, error = %err, "scoring request failed");
                ScoringError::Network(err.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!(%url, status = status.as_u16(), "scoring service returned an error status");
            return Err(ScoringError::ServiceUnavailable {
                status: status.as_u16(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|err| ScoringError::Network(err.to_string()))?;

        let result: ScoringResult = serde_json::from_str(&body)
            .map_err(|err| ScoringError::InvalidResponse(err.to_string()))?;
        let result = result.validate()?;

        debug!(
            %url,
            probability = result.default_probability,
            decision = result.decision.label(),
            "scored feature vector"
        );
        Ok(result)
    }
}
