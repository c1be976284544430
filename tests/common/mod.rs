//! Shared test utilities
#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde_json::{json, Value};
use shutter_gateway::backend::{Backend, BackendSession, DeviceRecord, DeviceState, Scenario};
use shutter_gateway::config::SkillConfig;
use shutter_gateway::db::{self, SqliteTokenStore};
use shutter_gateway::{
    DbPool, Error, InvocationHandler, Result, SessionContext, SetupTokenService, SkillHandler,
    SmartHomeRouter,
};

/// Set up an in-memory test database
#[must_use]
pub fn setup_test_db() -> DbPool {
    db::init_memory().expect("failed to init test db")
}

/// Backend double that records every call
///
/// The default home holds a single shutter, `s1`.
pub struct MockBackend {
    pub devices: Mutex<Vec<DeviceRecord>>,
    pub states: Mutex<Vec<DeviceState>>,
    /// Make every domain call fail
    pub fail: AtomicBool,
    /// Make warm-up fail
    pub fail_warm_up: AtomicBool,
    pub warm_ups: AtomicUsize,
    pub domain_calls: AtomicUsize,
    pub scenarios: Mutex<Vec<Scenario>>,
    pub identities: Mutex<Vec<Option<String>>>,
    pub bearer_tokens: Mutex<Vec<Option<String>>>,
}

impl Default for MockBackend {
    fn default() -> Self {
        Self {
            devices: Mutex::new(vec![device("s1", "shutter")]),
            states: Mutex::default(),
            fail: AtomicBool::new(false),
            fail_warm_up: AtomicBool::new(false),
            warm_ups: AtomicUsize::new(0),
            domain_calls: AtomicUsize::new(0),
            scenarios: Mutex::default(),
            identities: Mutex::default(),
            bearer_tokens: Mutex::default(),
        }
    }
}

impl MockBackend {
    #[must_use]
    pub fn with_devices(devices: Vec<DeviceRecord>, states: Vec<DeviceState>) -> Arc<Self> {
        Arc::new(Self {
            devices: Mutex::new(devices),
            states: Mutex::new(states),
            ..Self::default()
        })
    }

    #[must_use]
    pub fn failing() -> Arc<Self> {
        let backend = Self::default();
        backend.fail.store(true, Ordering::SeqCst);
        Arc::new(backend)
    }

    #[must_use]
    pub fn failing_warm_up() -> Arc<Self> {
        let backend = Self::default();
        backend.fail_warm_up.store(true, Ordering::SeqCst);
        Arc::new(backend)
    }

    pub fn warm_ups(&self) -> usize {
        self.warm_ups.load(Ordering::SeqCst)
    }

    pub fn domain_calls(&self) -> usize {
        self.domain_calls.load(Ordering::SeqCst)
    }

    pub fn scenarios(&self) -> Vec<Scenario> {
        self.scenarios.lock().unwrap().clone()
    }

    fn domain_call(&self) -> Result<()> {
        self.domain_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            Err(Error::Backend("retries exhausted".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl Backend for MockBackend {
    async fn warm_up(&self, ctx: &SessionContext) -> Result<BackendSession> {
        self.warm_ups.fetch_add(1, Ordering::SeqCst);
        self.identities.lock().unwrap().push(ctx.identity.clone());
        self.bearer_tokens
            .lock()
            .unwrap()
            .push(ctx.bearer_token.as_ref().map(|t| t.expose_secret().to_string()));

        if self.fail_warm_up.load(Ordering::SeqCst) {
            return Err(Error::Backend("auth down".to_string()));
        }

        let shutter_ids = self
            .devices
            .lock()
            .unwrap()
            .iter()
            .filter(|d| d.is_shutter())
            .map(|d| d.id.clone())
            .collect();

        Ok(BackendSession {
            access_token: SecretString::from("session-token".to_string()),
            home_id: "home-1".to_string(),
            bridge_id: Some("bridge-1".to_string()),
            shutter_ids,
        })
    }

    async fn list_devices(&self, _session: &BackendSession) -> Result<Vec<DeviceRecord>> {
        self.domain_call()?;
        Ok(self.devices.lock().unwrap().clone())
    }

    async fn read_device_status(&self, _session: &BackendSession) -> Result<Vec<DeviceState>> {
        self.domain_call()?;
        Ok(self.states.lock().unwrap().clone())
    }

    async fn trigger_scenario(&self, _session: &BackendSession, scenario: Scenario) -> Result<()> {
        self.domain_call()?;
        self.scenarios.lock().unwrap().push(scenario);
        Ok(())
    }
}

/// A backend device record
#[must_use]
pub fn device(id: &str, velux_type: &str) -> DeviceRecord {
    DeviceRecord {
        id: id.to_string(),
        name: Some(format!("Room {id}")),
        model: Some("NXO".to_string()),
        velux_type: Some(velux_type.to_string()),
        bridge: Some("bridge-1".to_string()),
    }
}

/// A backend device state
#[must_use]
pub fn state(id: &str, position: i64, reachable: bool) -> DeviceState {
    DeviceState {
        id: id.to_string(),
        current_position: Some(position),
        reachable: Some(reachable),
    }
}

/// Wire everything over a mock backend
pub fn build_handler(backend: Arc<MockBackend>, db: DbPool) -> (InvocationHandler, SetupTokenService) {
    let tokens = SetupTokenService::new(Arc::new(SqliteTokenStore::new(db)));
    let router = SmartHomeRouter::new(backend.clone());
    let skill = SkillHandler::new(backend, tokens.clone(), SkillConfig::default());
    (InvocationHandler::new(router, skill), tokens)
}

/// A device-directive event
#[must_use]
pub fn directive_event(namespace: &str, name: &str, endpoint_id: Option<&str>, payload: Value) -> Value {
    let mut event = json!({
        "directive": {
            "header": {
                "namespace": namespace,
                "name": name,
                "payloadVersion": "3",
                "messageId": "message-1",
                "correlationToken": "correlation-1"
            },
            "payload": payload
        }
    });
    if let Some(id) = endpoint_id {
        event["directive"]["endpoint"] = json!({
            "scope": { "type": "BearerToken", "token": "bearer-1" },
            "endpointId": id,
            "cookie": {}
        });
    }
    event
}

/// A custom-skill request event
#[must_use]
pub fn skill_event(request_type: &str, intent: Option<&str>, locale: &str) -> Value {
    let mut request = json!({
        "type": request_type,
        "requestId": "request-1",
        "locale": locale
    });
    if let Some(name) = intent {
        request["intent"] = json!({ "name": name });
    }
    json!({
        "version": "1.0",
        "session": { "user": { "userId": "amzn1.ask.account.TEST" } },
        "request": request
    })
}
