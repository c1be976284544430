//! Home-automation backend collaborator
//!
//! The router talks to the backend only through the [`Backend`] trait. A
//! warm-up call establishes a [`BackendSession`] and every domain call takes
//! that session, so the domain call cannot run before warm-up has happened.

mod http;
pub mod retry;

use async_trait::async_trait;
use secrecy::SecretString;
use serde::Deserialize;

pub use http::HttpBackend;
pub use retry::RetryPolicy;

use crate::Result;
use crate::session::SessionContext;

/// Device-type tag the backend assigns to roller shutters
pub const SHUTTER_TYPE: &str = "shutter";

/// Named backend automation routine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scenario {
    /// Opens every shutter in the home
    WakeUp,
    /// Closes every shutter in the home
    Bedtime,
}

impl Scenario {
    /// Wire name the backend expects
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::WakeUp => "wake_up",
            Self::Bedtime => "bedtime",
        }
    }
}

impl std::fmt::Display for Scenario {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Session established by warm-up
#[derive(Debug, Clone)]
pub struct BackendSession {
    /// Access token used for subsequent calls
    pub access_token: SecretString,

    /// Home the session operates on
    pub home_id: String,

    /// Bridge module that executes scenarios, when the home has one
    pub bridge_id: Option<String>,

    /// Ids of the home's roller shutters at warm-up time
    pub shutter_ids: Vec<String>,
}

impl BackendSession {
    /// Whether `endpoint_id` names a shutter of this home
    #[must_use]
    pub fn has_shutter(&self, endpoint_id: &str) -> bool {
        self.shutter_ids.iter().any(|id| id == endpoint_id)
    }
}

/// A module from the backend's home listing
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DeviceRecord {
    /// Stable backend device id
    pub id: String,

    /// User-assigned device name
    #[serde(default)]
    pub name: Option<String>,

    /// Hardware model code
    #[serde(rename = "type", default)]
    pub model: Option<String>,

    /// Device-type tag (`shutter`, `window`, ...)
    #[serde(default)]
    pub velux_type: Option<String>,

    /// Bridge the module is attached to
    #[serde(default)]
    pub bridge: Option<String>,
}

impl DeviceRecord {
    /// Whether the record describes a roller shutter
    #[must_use]
    pub fn is_shutter(&self) -> bool {
        self.velux_type.as_deref() == Some(SHUTTER_TYPE)
    }
}

/// Live state of a module from the backend's status call
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DeviceState {
    /// Backend device id
    pub id: String,

    /// Position in percent, 0 = closed, 100 = open
    #[serde(default)]
    pub current_position: Option<i64>,

    /// Whether the module is reachable from the bridge
    #[serde(default)]
    pub reachable: Option<bool>,
}

/// Home-automation backend operations consumed by the router
///
/// Implementations own their timeout and retry policy. An `Err` from any
/// domain call means retries are exhausted.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Establish a session for this invocation
    ///
    /// Safe to call on every invocation.
    async fn warm_up(&self, ctx: &SessionContext) -> Result<BackendSession>;

    /// List device records of the session's home, in backend order
    async fn list_devices(&self, session: &BackendSession) -> Result<Vec<DeviceRecord>>;

    /// Read current state of every device in the session's home
    async fn read_device_status(&self, session: &BackendSession) -> Result<Vec<DeviceState>>;

    /// Run a scenario on the session's home
    async fn trigger_scenario(&self, session: &BackendSession, scenario: Scenario) -> Result<()>;
}
