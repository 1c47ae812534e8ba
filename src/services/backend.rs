// src/services/backend.rs
use reqwest::Url;
use serde_json::{Value, json};

use crate::error::BackendError;

/// Thin client for the bot-hosting backend.
#[derive(Debug, Clone)]
pub struct BackendClient {
    http: reqwest::Client,
    base_url: String,
}

impl BackendClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, BackendError> {
        let mut url =
            Url::parse(&self.base_url).map_err(|e| BackendError::InvalidUrl(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| BackendError::InvalidUrl(self.base_url.clone()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// `GET /bots?userId=<id>`
    pub async fn list_bots(&self, user_id: &str) -> Result<Value, BackendError> {
        let url = self.endpoint(&["bots"])?;
        let body = self
            .http
            .get(url)
            .query(&[("userId", user_id)])
            .send()
            .await?
            .json()
            .await?;
        Ok(body)
    }

    /// `GET /logs/<deploymentId>`
    pub async fn logs(&self, deployment_id: &str) -> Result<Value, BackendError> {
        let url = self.endpoint(&["logs", deployment_id])?;
        Ok(self.http.get(url).send().await?.json().await?)
    }

    /// `POST /stop`. The response status is not inspected.
    pub async fn stop(&self, deployment_id: &str) -> Result<(), BackendError> {
        self.post_deployment("stop", deployment_id).await
    }

    /// `POST /start`. The response status is not inspected.
    pub async fn start(&self, deployment_id: &str) -> Result<(), BackendError> {
        self.post_deployment("start", deployment_id).await
    }

    async fn post_deployment(&self, action: &str, deployment_id: &str) -> Result<(), BackendError> {
        let url = self.endpoint(&[action])?;
        self.http
            .post(url)
            .json(&json!({ "deploymentId": deployment_id }))
            .send()
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_escapes_path_segments() {
        let client = BackendClient::new("http://localhost:3000");
        let url = client.endpoint(&["logs", "abc/def"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:3000/logs/abc%2Fdef");
    }

    #[test]
    fn endpoint_keeps_base_path() {
        let client = BackendClient::new("http://localhost:3000/api/");
        let url = client.endpoint(&["bots"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:3000/api/bots");
    }

    #[test]
    fn invalid_base_url_is_an_error() {
        let client = BackendClient::new("not a url");
        assert!(matches!(
            client.endpoint(&["bots"]),
            Err(BackendError::InvalidUrl(_))
        ));
    }
}
