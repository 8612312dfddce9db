//! Drone build API client
//!
//! Implements [`BuildApi`] against the Drone REST API:
//!
//! - `GET  /api/repos/{owner}/{name}/builds/latest?branch=`
//! - `GET  /api/repos/{owner}/{name}/builds`
//! - `POST /api/repos/{owner}/{name}/builds/{number}?fork=true&KEY=VALUE...`

use async_trait::async_trait;
use downstream_core::{BuildApi, BuildRecord, RemoteError, TriggerParams};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{base_url, check_status, decode, transport, ClientError};
use crate::USER_AGENT;

/// Drone configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DroneConfig {
    /// Drone server URL
    pub server_url: String,
    /// API token from the Drone user settings
    pub token: String,
}

impl DroneConfig {
    pub fn new(server_url: &str, token: &str) -> Self {
        DroneConfig {
            server_url: server_url.to_string(),
            token: token.to_string(),
        }
    }
}

/// Drone client for build lookup and forking
pub struct DroneClient {
    server_url: String,
    token: String,
    http_client: reqwest::Client,
}

impl DroneClient {
    pub fn new(config: DroneConfig) -> Result<Self, ClientError> {
        let http_client = reqwest::Client::builder().user_agent(USER_AGENT).build()?;
        Ok(DroneClient {
            server_url: base_url(&config.server_url)?,
            token: config.token,
            http_client,
        })
    }

    fn builds_url(&self, owner: &str, name: &str) -> String {
        format!("{}/api/repos/{}/{}/builds", self.server_url, owner, name)
    }

    fn build_url(&self, owner: &str, name: &str, build: &str) -> String {
        format!("{}/{}", self.builds_url(owner, name), build)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, RemoteError> {
        let response = request
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(transport)?;
        check_status(response).await?.json().await.map_err(decode)
    }
}

#[async_trait]
impl BuildApi for DroneClient {
    async fn latest_build(
        &self,
        owner: &str,
        name: &str,
        branch: Option<&str>,
    ) -> Result<BuildRecord, RemoteError> {
        let url = self.build_url(owner, name, "latest");
        debug!(?branch, "GET {url}");
        let mut request = self.http_client.get(&url);
        if let Some(branch) = branch {
            request = request.query(&[("branch", branch)]);
        }
        self.get_json(request).await
    }

    async fn build_history(
        &self,
        owner: &str,
        name: &str,
    ) -> Result<Vec<BuildRecord>, RemoteError> {
        let url = self.builds_url(owner, name);
        debug!("GET {url}");
        self.get_json(self.http_client.get(&url)).await
    }

    async fn fork_build(
        &self,
        owner: &str,
        name: &str,
        number: u64,
        params: &TriggerParams,
    ) -> Result<BuildRecord, RemoteError> {
        let url = self.build_url(owner, name, &number.to_string());
        debug!(params = params.len(), "POST {url}");
        let request = self
            .http_client
            .post(&url)
            .query(&[("fork", "true")])
            .query(&fork_query(params));
        self.get_json(request).await
    }
}

fn fork_query(params: &TriggerParams) -> Vec<(&str, &str)> {
    params.iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use downstream_core::BuildStatus;

    fn client() -> DroneClient {
        DroneClient::new(DroneConfig::new("https://drone.example.com/", "t0ken")).unwrap()
    }

    #[test]
    fn test_build_urls() {
        let c = client();
        assert_eq!(
            c.builds_url("acme", "api"),
            "https://drone.example.com/api/repos/acme/api/builds"
        );
        assert_eq!(
            c.build_url("acme", "api", "latest"),
            "https://drone.example.com/api/repos/acme/api/builds/latest"
        );
    }

    #[test]
    fn test_invalid_server_rejected() {
        let err = DroneClient::new(DroneConfig::new("drone.example.com", "t")).err();
        assert!(matches!(err, Some(ClientError::InvalidUrl(_))));
    }

    #[test]
    fn test_fork_request_carries_params() {
        let c = client();
        let mut params = TriggerParams::new();
        params.insert("DEPLOY_TO", "staging");
        params.insert("NOTE", "a b&c");
        let request = c
            .http_client
            .post(c.build_url("acme", "api", "42"))
            .query(&[("fork", "true")])
            .query(&fork_query(&params))
            .build()
            .unwrap();
        assert_eq!(
            request.url().as_str(),
            "https://drone.example.com/api/repos/acme/api/builds/42?fork=true&DEPLOY_TO=staging&NOTE=a+b%26c"
        );
    }

    #[test]
    fn test_build_payload_decodes() {
        let body = r#"{"id": 311, "number": 57, "event": "push", "status": "running",
            "branch": "master", "commit": "6b8a6d1", "started_at": 1700000000}"#;
        let build: BuildRecord = serde_json::from_str(body).unwrap();
        assert_eq!(build, BuildRecord::new(57, BuildStatus::Running, "master"));
    }

    #[test]
    fn test_build_list_payload_decodes_in_order() {
        let body = r#"[
            {"number": 10, "status": "failure", "branch": "master"},
            {"number": 9, "status": "success", "branch": "master"},
            {"number": 8, "status": "blocked", "branch": "feature"}
        ]"#;
        let builds: Vec<BuildRecord> = serde_json::from_str(body).unwrap();
        let numbers: Vec<u64> = builds.iter().map(|b| b.number).collect();
        assert_eq!(numbers, vec![10, 9, 8]);
        assert_eq!(builds[2].status, BuildStatus::Blocked);
    }
}
