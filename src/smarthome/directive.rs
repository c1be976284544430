//! Inbound device directives and their classification

use serde::{Deserialize, Serialize};

use super::catalog::{MODE_CLOSE, MODE_OPEN, POSITION_CLOSED, POSITION_OPEN};
use super::resolver::SceneTrigger;
use crate::backend::Scenario;
use crate::{Error, Result};

/// Top-level device-directive event
#[derive(Debug, Clone, Deserialize)]
pub struct DirectiveEnvelope {
    pub directive: Directive,
}

/// A device directive
#[derive(Debug, Clone, Deserialize)]
pub struct Directive {
    pub header: DirectiveHeader,
    #[serde(default)]
    pub endpoint: Option<DirectiveEndpoint>,
    #[serde(default)]
    pub payload: DirectivePayload,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectiveHeader {
    pub namespace: String,
    pub name: String,
    #[serde(default)]
    pub payload_version: Option<String>,
    #[serde(default)]
    pub message_id: Option<String>,
    #[serde(default)]
    pub correlation_token: Option<String>,
    #[serde(default)]
    pub instance: Option<String>,
}

/// Authorization scope attached to a directive
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scope {
    #[serde(rename = "type")]
    pub kind: String,
    pub token: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectiveEndpoint {
    #[serde(default)]
    pub scope: Option<Scope>,
    pub endpoint_id: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectivePayload {
    #[serde(default)]
    pub scope: Option<Scope>,
    #[serde(default)]
    pub mode: Option<String>,
    #[serde(default)]
    pub range_value: Option<f64>,
    #[serde(default)]
    pub range_value_delta: Option<f64>,
}

/// Routing family of a directive
#[derive(Debug, Clone, PartialEq)]
pub enum DirectiveKind {
    Discover,
    ReportState,
    Control(ControlRequest),
    ActivateScene,
    Unsupported,
}

/// Device-control request carried by a mode/range directive
#[derive(Debug, Clone, PartialEq)]
pub enum ControlRequest {
    SetMode(Option<String>),
    SetRangeValue(Option<f64>),
    AdjustRangeValue(Option<f64>),
}

/// What a shutter is asked to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutterAction {
    Open,
    Close,
}

impl ShutterAction {
    /// Backend scenario that performs the action
    #[must_use]
    pub const fn scenario(self) -> Scenario {
        match self {
            Self::Open => Scenario::WakeUp,
            Self::Close => Scenario::Bedtime,
        }
    }
}

impl ControlRequest {
    /// Resolve the request to an open/close action
    ///
    /// Scenarios move every shutter fully, so only the end positions map.
    ///
    /// # Errors
    ///
    /// Returns `InvalidValue` when the value is missing or not one the
    /// scenarios can reach
    #[allow(clippy::float_cmp, clippy::cast_precision_loss)]
    pub fn action(&self) -> Result<ShutterAction> {
        match self {
            Self::SetMode(Some(mode)) if mode == MODE_OPEN => Ok(ShutterAction::Open),
            Self::SetMode(Some(mode)) if mode == MODE_CLOSE => Ok(ShutterAction::Close),
            Self::SetMode(mode) => Err(Error::InvalidValue(format!(
                "unsupported mode {}",
                mode.as_deref().unwrap_or("<none>")
            ))),
            Self::SetRangeValue(Some(v)) if *v == POSITION_OPEN as f64 => Ok(ShutterAction::Open),
            Self::SetRangeValue(Some(v)) if *v == POSITION_CLOSED as f64 => Ok(ShutterAction::Close),
            Self::SetRangeValue(value) => Err(Error::InvalidValue(format!(
                "position {value:?} is neither {POSITION_CLOSED} nor {POSITION_OPEN}"
            ))),
            Self::AdjustRangeValue(Some(d)) if *d > 0.0 => Ok(ShutterAction::Open),
            Self::AdjustRangeValue(Some(d)) if *d < 0.0 => Ok(ShutterAction::Close),
            Self::AdjustRangeValue(delta) => Err(Error::InvalidValue(format!(
                "position delta {delta:?} has no direction"
            ))),
        }
    }
}

impl Directive {
    /// Classify by `(namespace, name)`, first match wins
    #[must_use]
    pub fn kind(&self) -> DirectiveKind {
        let payload = &self.payload;
        match (self.header.namespace.as_str(), self.header.name.as_str()) {
            ("Alexa.Discovery", _) => DirectiveKind::Discover,
            ("Alexa", "ReportState") => DirectiveKind::ReportState,
            ("Alexa.ModeController" | "Alexa.RangeController", "SetMode") => {
                DirectiveKind::Control(ControlRequest::SetMode(payload.mode.clone()))
            }
            ("Alexa.ModeController" | "Alexa.RangeController", "SetRangeValue") => {
                DirectiveKind::Control(ControlRequest::SetRangeValue(payload.range_value))
            }
            ("Alexa.ModeController" | "Alexa.RangeController", "AdjustRangeValue") => {
                DirectiveKind::Control(ControlRequest::AdjustRangeValue(payload.range_value_delta))
            }
            ("Alexa.SceneController", "Activate") => DirectiveKind::ActivateScene,
            _ => DirectiveKind::Unsupported,
        }
    }

    /// Bearer token from the endpoint scope, or the payload scope (discovery)
    #[must_use]
    pub fn bearer_token(&self) -> Option<&str> {
        self.endpoint
            .as_ref()
            .and_then(|e| e.scope.as_ref())
            .or(self.payload.scope.as_ref())
            .map(|s| s.token.as_str())
    }

    /// Target endpoint id, if any
    #[must_use]
    pub fn endpoint_id(&self) -> Option<&str> {
        self.endpoint.as_ref().map(|e| e.endpoint_id.as_str())
    }

    /// Correlation token, required by deferred and state responses
    ///
    /// # Errors
    ///
    /// Returns `InvalidDirective` when the directive carries none
    pub fn require_correlation_token(&self) -> Result<&str> {
        self.header.correlation_token.as_deref().ok_or_else(|| {
            Error::InvalidDirective(format!("{} requires a correlation token", self.header.name))
        })
    }

    /// Target endpoint id, required by device directives
    ///
    /// # Errors
    ///
    /// Returns `InvalidDirective` when the directive names no endpoint
    pub fn require_endpoint_id(&self) -> Result<&str> {
        self.endpoint_id().ok_or_else(|| {
            Error::InvalidDirective(format!("{} requires an endpoint", self.header.name))
        })
    }

    /// Scene targeted by an `Activate` directive
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when the endpoint is not a scene
    pub fn scene(&self) -> Result<SceneTrigger> {
        let id = self.require_endpoint_id()?;
        SceneTrigger::from_endpoint_id(id)
            .ok_or_else(|| Error::NotFound(format!("no scene with endpoint id {id}")))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn directive(namespace: &str, name: &str, payload: serde_json::Value) -> Directive {
        serde_json::from_value(json!({
            "header": {
                "namespace": namespace,
                "name": name,
                "payloadVersion": "3",
                "messageId": "m-1",
                "correlationToken": "corr-1"
            },
            "endpoint": {
                "scope": { "type": "BearerToken", "token": "tok" },
                "endpointId": "shutter-1",
                "cookie": {}
            },
            "payload": payload
        }))
        .unwrap()
    }

    #[test]
    fn test_classification() {
        let cases = [
            ("Alexa.Discovery", "Discover", DirectiveKind::Discover),
            ("Alexa", "ReportState", DirectiveKind::ReportState),
            ("Alexa.SceneController", "Activate", DirectiveKind::ActivateScene),
            ("Alexa.SceneController", "Deactivate", DirectiveKind::Unsupported),
            ("Alexa.PowerController", "TurnOn", DirectiveKind::Unsupported),
            ("Alexa", "Response", DirectiveKind::Unsupported),
        ];
        for (namespace, name, expected) in cases {
            assert_eq!(directive(namespace, name, json!({})).kind(), expected, "{namespace}.{name}");
        }
    }

    #[test]
    fn test_control_classification_reads_payload() {
        let d = directive("Alexa.ModeController", "SetMode", json!({ "mode": "open" }));
        assert_eq!(
            d.kind(),
            DirectiveKind::Control(ControlRequest::SetMode(Some("open".to_string())))
        );

        let d = directive("Alexa.RangeController", "AdjustRangeValue", json!({ "rangeValueDelta": -10 }));
        assert_eq!(
            d.kind(),
            DirectiveKind::Control(ControlRequest::AdjustRangeValue(Some(-10.0)))
        );
    }

    #[test]
    fn test_control_actions() {
        let open = ControlRequest::SetMode(Some(MODE_OPEN.to_string()));
        assert_eq!(open.action().unwrap(), ShutterAction::Open);
        assert_eq!(
            ControlRequest::SetRangeValue(Some(0.0)).action().unwrap(),
            ShutterAction::Close
        );
        assert_eq!(
            ControlRequest::AdjustRangeValue(Some(25.0)).action().unwrap(),
            ShutterAction::Open
        );

        assert!(matches!(
            ControlRequest::SetMode(Some("half".to_string())).action(),
            Err(Error::InvalidValue(_))
        ));
        assert!(ControlRequest::SetMode(None).action().is_err());
        assert!(ControlRequest::SetRangeValue(Some(40.0)).action().is_err());
        assert!(ControlRequest::AdjustRangeValue(Some(0.0)).action().is_err());
    }

    #[test]
    fn test_action_scenarios() {
        assert_eq!(ShutterAction::Open.scenario(), Scenario::WakeUp);
        assert_eq!(ShutterAction::Close.scenario(), Scenario::Bedtime);
    }

    #[test]
    fn test_bearer_token_sources() {
        let d = directive("Alexa", "ReportState", json!({}));
        assert_eq!(d.bearer_token(), Some("tok"));

        let discover: Directive = serde_json::from_value(json!({
            "header": { "namespace": "Alexa.Discovery", "name": "Discover" },
            "payload": { "scope": { "type": "BearerToken", "token": "disc" } }
        }))
        .unwrap();
        assert_eq!(discover.bearer_token(), Some("disc"));
        assert_eq!(discover.endpoint_id(), None);
    }

    #[test]
    fn test_missing_correlation_token() {
        let d: Directive = serde_json::from_value(json!({
            "header": { "namespace": "Alexa", "name": "ReportState" }
        }))
        .unwrap();
        assert!(matches!(
            d.require_correlation_token(),
            Err(Error::InvalidDirective(_))
        ));
        assert!(d.require_endpoint_id().is_err());
    }

    #[test]
    fn test_scene_lookup() {
        let d = directive("Alexa.SceneController", "Activate", json!({}));
        assert!(matches!(d.scene(), Err(Error::NotFound(_))));
    }
}
