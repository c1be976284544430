//! Outbound event envelopes
//!
//! One builder per directive family. Every header carries payload version
//! `3` and a fresh message id.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use super::catalog::{Interface, POSITION_CLOSED, POSITION_INSTANCE, POSITION_OPEN};
use super::directive::Scope;
use super::resolver::EndpointDescriptor;
use crate::backend::DeviceState;
use crate::Error;

/// Payload version of every outbound header
pub const PAYLOAD_VERSION: &str = "3";

/// Top-level outbound envelope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<Context>,
    pub event: Event,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub header: Header,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<EventEndpoint>,
    pub payload: Value,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Header {
    pub namespace: String,
    pub name: String,
    pub payload_version: String,
    pub message_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correlation_token: Option<String>,
}

impl Header {
    fn new(namespace: &str, name: &str, correlation_token: Option<&str>) -> Self {
        Self {
            namespace: namespace.to_string(),
            name: name.to_string(),
            payload_version: PAYLOAD_VERSION.to_string(),
            message_id: Uuid::new_v4().to_string(),
            correlation_token: correlation_token.map(ToString::to_string),
        }
    }
}

/// Endpoint echoed back from the directive
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventEndpoint {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<Scope>,
    pub endpoint_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Context {
    pub properties: Vec<StateProperty>,
}

/// One reported property value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateProperty {
    pub namespace: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance: Option<String>,
    pub value: Value,
    pub time_of_sample: DateTime<Utc>,
    pub uncertainty_in_milliseconds: u64,
}

/// Error classification carried by an `ErrorResponse`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorType {
    InvalidDirective,
    NoSuchEndpoint,
    InvalidValue,
    BridgeUnreachable,
    InternalError,
}

impl From<&Error> for ErrorType {
    fn from(error: &Error) -> Self {
        match error {
            Error::InvalidDirective(_) | Error::InvalidRequest(_) => Self::InvalidDirective,
            Error::NotFound(_) => Self::NoSuchEndpoint,
            Error::InvalidValue(_) => Self::InvalidValue,
            Error::Backend(_) | Error::Http(_) => Self::BridgeUnreachable,
            _ => Self::InternalError,
        }
    }
}

/// `Alexa.Discovery` / `Discover.Response`
#[must_use]
pub fn discovery(endpoints: Vec<EndpointDescriptor>) -> ResponseEnvelope {
    ResponseEnvelope {
        context: None,
        event: Event {
            header: Header::new("Alexa.Discovery", "Discover.Response", None),
            endpoint: None,
            payload: json!({ "endpoints": endpoints }),
        },
    }
}

/// `Alexa` / `StateReport` for one device
#[must_use]
pub fn state_report(
    correlation_token: &str,
    endpoint: EventEndpoint,
    state: &DeviceState,
    now: DateTime<Utc>,
) -> ResponseEnvelope {
    ResponseEnvelope {
        context: Some(Context {
            properties: state_properties(state, now),
        }),
        event: Event {
            header: Header::new(
                Interface::Alexa.namespace(),
                "StateReport",
                Some(correlation_token),
            ),
            endpoint: Some(endpoint),
            payload: json!({}),
        },
    }
}

/// Position and connectivity properties of a device
///
/// A position the backend does not know is reported as closed.
#[must_use]
pub fn state_properties(state: &DeviceState, now: DateTime<Utc>) -> Vec<StateProperty> {
    let position = state
        .current_position
        .map_or(POSITION_CLOSED, |p| p.clamp(POSITION_CLOSED, POSITION_OPEN));

    let mut properties = Vec::with_capacity(2);
    properties.push(StateProperty {
        namespace: Interface::RangeController.namespace().to_string(),
        name: "rangeValue".to_string(),
        instance: Some(POSITION_INSTANCE.to_string()),
        value: json!(position),
        time_of_sample: now,
        uncertainty_in_milliseconds: 0,
    });

    let connectivity = if state.reachable.unwrap_or(false) {
        "OK"
    } else {
        "UNREACHABLE"
    };
    properties.push(StateProperty {
        namespace: Interface::EndpointHealth.namespace().to_string(),
        name: "connectivity".to_string(),
        instance: None,
        value: json!({ "value": connectivity }),
        time_of_sample: now,
        uncertainty_in_milliseconds: 0,
    });

    properties
}

/// `Alexa` / `Response` acknowledging a control directive
#[must_use]
pub fn control(correlation_token: Option<&str>, endpoint: EventEndpoint) -> ResponseEnvelope {
    ResponseEnvelope {
        context: None,
        event: Event {
            header: Header::new(Interface::Alexa.namespace(), "Response", correlation_token),
            endpoint: Some(endpoint),
            payload: json!({}),
        },
    }
}

/// `Alexa.SceneController` / `ActivationStarted`
#[must_use]
pub fn activation_started(
    correlation_token: &str,
    endpoint: EventEndpoint,
    now: DateTime<Utc>,
) -> ResponseEnvelope {
    ResponseEnvelope {
        context: Some(Context {
            properties: Vec::new(),
        }),
        event: Event {
            header: Header::new(
                Interface::SceneController.namespace(),
                "ActivationStarted",
                Some(correlation_token),
            ),
            endpoint: Some(endpoint),
            payload: json!({
                "cause": { "type": "VOICE_INTERACTION" },
                "timestamp": now,
            }),
        },
    }
}

/// `Alexa` / `ErrorResponse`
#[must_use]
pub fn error(
    correlation_token: Option<&str>,
    endpoint: Option<EventEndpoint>,
    kind: ErrorType,
    message: &str,
) -> ResponseEnvelope {
    ResponseEnvelope {
        context: None,
        event: Event {
            header: Header::new(Interface::Alexa.namespace(), "ErrorResponse", correlation_token),
            endpoint,
            payload: json!({ "type": kind, "message": message }),
        },
    }
}
