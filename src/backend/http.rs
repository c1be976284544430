//! HTTP client for the home-automation cloud API
//!
//! Lists homes and modules, reads module status and runs scenarios through
//! the bridge. Every call goes through [`HttpBackend::send_json`], which owns
//! the retry policy.

use async_trait::async_trait;
use reqwest::header::RETRY_AFTER;
use reqwest::{Client, RequestBuilder};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;

use super::retry::{
    delay_for_attempt, is_recoverable_error, is_recoverable_status, parse_retry_after,
};
use super::{Backend, BackendSession, DeviceRecord, DeviceState, RetryPolicy, Scenario};
use crate::config::BackendConfig;
use crate::session::SessionContext;
use crate::{Error, Result};

/// Model code of the bridge module
const BRIDGE_MODEL: &str = "NXG";

/// Backend client over the vendor's HTTP API
#[derive(Debug, Clone)]
pub struct HttpBackend {
    /// HTTP client
    client: Client,
    /// Base URL, without trailing slash
    base_url: String,
    /// Fallback token when the session carries none
    access_token: Option<SecretString>,
    /// Pin a specific home; otherwise the first listed home is used
    home_id: Option<String>,
    /// Retry policy for every call
    retry: RetryPolicy,
}

#[derive(Debug, Deserialize)]
struct HomesDataResponse {
    body: HomesDataBody,
}

#[derive(Debug, Deserialize)]
struct HomesDataBody {
    #[serde(default)]
    homes: Vec<Home>,
}

#[derive(Debug, Deserialize)]
struct Home {
    id: String,
    #[serde(default)]
    modules: Vec<DeviceRecord>,
}

#[derive(Debug, Deserialize)]
struct HomeStatusResponse {
    body: HomeStatusBody,
}

#[derive(Debug, Deserialize)]
struct HomeStatusBody {
    home: HomeStatus,
}

#[derive(Debug, Deserialize)]
struct HomeStatus {
    #[serde(default)]
    modules: Vec<DeviceState>,
}

#[derive(Debug, Deserialize)]
struct StatusAck {
    #[serde(default)]
    status: Option<String>,
}

impl HttpBackend {
    /// Create a client from backend configuration
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built
    pub fn new(config: &BackendConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::Config(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            access_token: config.access_token.clone(),
            home_id: config.home_id.clone(),
            retry: config.retry.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Send a request built by `build`, retrying transient failures
    async fn send_json<T, F>(&self, operation: &str, build: F) -> Result<T>
    where
        T: DeserializeOwned,
        F: Fn() -> RequestBuilder + Send + Sync,
    {
        let mut attempt = 0;

        loop {
            let wait = match build().send().await {
                Ok(response) if response.status().is_success() => {
                    return response.json::<T>().await.map_err(|e| {
                        Error::Backend(format!("{operation}: invalid response: {e}"))
                    });
                }
                Ok(response) => {
                    let status = response.status().as_u16();
                    let retry_after = parse_retry_after(
                        response
                            .headers()
                            .get(RETRY_AFTER)
                            .and_then(|v| v.to_str().ok()),
                    );
                    let body = response.text().await.unwrap_or_default();

                    if !is_recoverable_status(status) || attempt >= self.retry.max_retries {
                        return Err(Error::Backend(format!(
                            "{operation} failed: {status} - {body}"
                        )));
                    }
                    delay_for_attempt(&self.retry, attempt, retry_after)
                }
                Err(e) => {
                    if !is_recoverable_error(&e) || attempt >= self.retry.max_retries {
                        return Err(Error::Backend(format!("{operation} failed: {e}")));
                    }
                    delay_for_attempt(&self.retry, attempt, None)
                }
            };

            tracing::warn!(
                operation,
                attempt = attempt + 1,
                delay_ms = u64::try_from(wait.as_millis()).unwrap_or(u64::MAX),
                "backend call failed, retrying"
            );
            tokio::time::sleep(wait).await;
            attempt += 1;
        }
    }

    async fn homes_data(&self, token: &SecretString) -> Result<Vec<Home>> {
        let url = self.url("/api/homesdata");
        let response: HomesDataResponse = self
            .send_json("homesdata", || {
                self.client.get(&url).bearer_auth(token.expose_secret())
            })
            .await?;
        Ok(response.body.homes)
    }

    /// Pick the configured home, or the first listed one
    fn select_home(&self, homes: Vec<Home>) -> Result<Home> {
        let selected = match &self.home_id {
            Some(id) => homes.into_iter().find(|h| &h.id == id),
            None => homes.into_iter().next(),
        };
        selected.ok_or_else(|| Error::NotFound("no home available for this account".to_string()))
    }
}

/// Find the bridge that runs scenarios for a home's modules
fn bridge_of(modules: &[DeviceRecord]) -> Option<String> {
    modules
        .iter()
        .find(|m| m.model.as_deref() == Some(BRIDGE_MODEL))
        .map(|m| m.id.clone())
        .or_else(|| modules.iter().find_map(|m| m.bridge.clone()))
}

#[async_trait]
impl Backend for HttpBackend {
    async fn warm_up(&self, ctx: &SessionContext) -> Result<BackendSession> {
        let access_token = ctx
            .bearer_token
            .clone()
            .or_else(|| self.access_token.clone())
            .ok_or_else(|| Error::Config("no backend access token available".to_string()))?;

        let home = self.select_home(self.homes_data(&access_token).await?)?;
        let bridge_id = bridge_of(&home.modules);
        let shutter_ids = home
            .modules
            .iter()
            .filter(|m| m.is_shutter())
            .map(|m| m.id.clone())
            .collect::<Vec<_>>();

        tracing::debug!(
            home_id = %home.id,
            bridge_id = ?bridge_id,
            shutters = shutter_ids.len(),
            user_id = ?ctx.identity,
            "backend session established"
        );

        Ok(BackendSession {
            access_token,
            home_id: home.id,
            bridge_id,
            shutter_ids,
        })
    }

    async fn list_devices(&self, session: &BackendSession) -> Result<Vec<DeviceRecord>> {
        let homes = self.homes_data(&session.access_token).await?;
        let home = homes
            .into_iter()
            .find(|h| h.id == session.home_id)
            .ok_or_else(|| Error::NotFound(format!("home {}", session.home_id)))?;
        Ok(home.modules)
    }

    async fn read_device_status(&self, session: &BackendSession) -> Result<Vec<DeviceState>> {
        let url = self.url("/api/homestatus");
        let body = json!({ "home_id": session.home_id });
        let response: HomeStatusResponse = self
            .send_json("homestatus", || {
                self.client
                    .post(&url)
                    .bearer_auth(session.access_token.expose_secret())
                    .json(&body)
            })
            .await?;
        Ok(response.body.home.modules)
    }

    async fn trigger_scenario(&self, session: &BackendSession, scenario: Scenario) -> Result<()> {
        let bridge_id = session
            .bridge_id
            .as_deref()
            .ok_or_else(|| Error::Backend("home has no bridge to run scenarios".to_string()))?;

        let url = self.url("/syncapi/v1/setstate");
        let body = json!({
            "home": {
                "id": session.home_id,
                "modules": [{ "id": bridge_id, "scenario": scenario.as_str() }],
            }
        });

        let ack: StatusAck = self
            .send_json("setstate", || {
                self.client
                    .post(&url)
                    .bearer_auth(session.access_token.expose_secret())
                    .json(&body)
            })
            .await?;

        match ack.status.as_deref() {
            Some("ok") | None => {
                tracing::info!(%scenario, home_id = %session.home_id, "scenario triggered");
                Ok(())
            }
            Some(other) => Err(Error::Backend(format!(
                "scenario {scenario} rejected: {other}"
            ))),
        }
    }
}
