use crate::model::ClassifierError;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

#[derive(Debug, Serialize)]
struct Parameters<'a> {
    candidate_labels: &'a [String],
}

#[derive(Debug, Serialize)]
struct ZeroShotRequest<'a> {
    inputs: &'a str,
    parameters: Parameters<'a>,
}

/// Non-success statuses keep the response body for the log.
fn decode(status: u16, body: &str) -> Result<Value, ClassifierError> {
    if !(200..300).contains(&status) {
        return Err(ClassifierError::Status {
            status,
            body: body.to_string(),
        });
    }
    Ok(serde_json::from_str(body)?)
}

/// Scores a text against candidate labels and returns the raw response body.
#[async_trait::async_trait]
pub trait ZeroShot: Send + Sync {
    async fn score(&self, text: &str, labels: &[String]) -> Result<Value, ClassifierError>;
}

/// Hugging Face inference API (or anything speaking the same request shape).
pub struct HuggingFaceClient {
    client: Client,
    api_url: String,
    token: String,
}

impl HuggingFaceClient {
    pub fn new(api_url: &str, token: &str, timeout: Duration) -> Result<Self, ClassifierError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            api_url: api_url.to_string(),
            token: token.to_string(),
        })
    }
}

#[async_trait::async_trait]
impl ZeroShot for HuggingFaceClient {
    async fn score(&self, text: &str, labels: &[String]) -> Result<Value, ClassifierError> {
        let body = ZeroShotRequest {
            inputs: text,
            parameters: Parameters {
                candidate_labels: labels,
            },
        };

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.text().await?;
        decode(status, &body)
    }
}
