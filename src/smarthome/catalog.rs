//! Capability catalog
//!
//! Static description of what a shutter endpoint and a scene endpoint can
//! do. The action mappings below are what the voice service turns "open the
//! shutter" into; each mapped directive must be one the router resolves to
//! a [`ShutterAction`](super::directive::ShutterAction), which the
//! `catalog_actions_route` test enforces.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::locale::Locale;

/// Manufacturer reported for every endpoint
pub const MANUFACTURER: &str = "Velux";

/// Capability interface version
pub const INTERFACE_VERSION: &str = "3";

/// Instance name of the mode capability
pub const MODE_INSTANCE: &str = "Shutter.Mode";

/// Instance name of the position capability
pub const POSITION_INSTANCE: &str = "Shutter.Position";

/// Mode value that opens the shutter
pub const MODE_OPEN: &str = "open";

/// Mode value that closes the shutter
pub const MODE_CLOSE: &str = "close";

/// Fully open position, percent
pub const POSITION_OPEN: i64 = 100;

/// Fully closed position, percent
pub const POSITION_CLOSED: i64 = 0;

/// Capability interface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Interface {
    #[serde(rename = "Alexa")]
    Alexa,
    #[serde(rename = "Alexa.EndpointHealth")]
    EndpointHealth,
    #[serde(rename = "Alexa.ModeController")]
    ModeController,
    #[serde(rename = "Alexa.RangeController")]
    RangeController,
    #[serde(rename = "Alexa.SceneController")]
    SceneController,
}

impl Interface {
    /// Directive namespace of the interface
    #[must_use]
    pub const fn namespace(self) -> &'static str {
        match self {
            Self::Alexa => "Alexa",
            Self::EndpointHealth => "Alexa.EndpointHealth",
            Self::ModeController => "Alexa.ModeController",
            Self::RangeController => "Alexa.RangeController",
            Self::SceneController => "Alexa.SceneController",
        }
    }
}

/// A declared control/report surface on an endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Capability {
    #[serde(rename = "type")]
    pub kind: String,
    pub interface: Interface,
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<Properties>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capability_resources: Option<Resources>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub configuration: Option<Configuration>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub semantics: Option<Semantics>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supports_deactivation: Option<bool>,
}

impl Capability {
    fn new(interface: Interface) -> Self {
        Self {
            kind: "AlexaInterface".to_string(),
            interface,
            version: INTERFACE_VERSION.to_string(),
            instance: None,
            properties: None,
            capability_resources: None,
            configuration: None,
            semantics: None,
            supports_deactivation: None,
        }
    }
}

/// Reportable properties of a capability
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Properties {
    pub supported: Vec<SupportedProperty>,
    pub proactively_reported: bool,
    pub retrievable: bool,
}

impl Properties {
    fn new(name: &str, retrievable: bool) -> Self {
        Self {
            supported: vec![SupportedProperty {
                name: name.to_string(),
            }],
            proactively_reported: false,
            retrievable,
        }
    }

    fn retrievable(name: &str) -> Self {
        Self::new(name, true)
    }

    /// Settable but never reported; state reports carry position instead
    fn settable(name: &str) -> Self {
        Self::new(name, false)
    }
}

/// Name of a reportable property
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupportedProperty {
    pub name: String,
}

/// Friendly names attached to a capability, mode or preset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resources {
    pub friendly_names: Vec<FriendlyName>,
}

impl Resources {
    /// One text name per supported locale, plus optional catalog assets
    fn named(en: &str, de: &str, assets: &[&str]) -> Self {
        let mut friendly_names: Vec<FriendlyName> = Locale::ALL
            .iter()
            .map(|&locale| FriendlyName::Text {
                text: match locale {
                    Locale::EnUs => en.to_string(),
                    Locale::DeDe => de.to_string(),
                },
                locale,
            })
            .collect();
        friendly_names.extend(assets.iter().map(|id| FriendlyName::Asset {
            asset_id: (*id).to_string(),
        }));
        Self { friendly_names }
    }
}

/// Friendly name, either literal text or a catalog asset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "@type", content = "value")]
pub enum FriendlyName {
    #[serde(rename = "text")]
    Text { text: String, locale: Locale },
    #[serde(rename = "asset")]
    Asset {
        #[serde(rename = "assetId")]
        asset_id: String,
    },
}

/// Controller-specific configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Configuration {
    Mode(ModeConfiguration),
    Range(RangeConfiguration),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModeConfiguration {
    pub ordered: bool,
    pub supported_modes: Vec<SupportedMode>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupportedMode {
    pub value: String,
    pub mode_resources: Resources,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RangeConfiguration {
    pub supported_range: SupportedRange,
    pub unit_of_measure: String,
    pub presets: Vec<Preset>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupportedRange {
    pub minimum_value: i64,
    pub maximum_value: i64,
    pub precision: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preset {
    pub range_value: i64,
    pub preset_resources: Resources,
}

/// Utterance semantics: which actions map to which directive
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Semantics {
    pub action_mappings: Vec<ActionMapping>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub state_mappings: Vec<StateMapping>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionMapping {
    #[serde(rename = "@type")]
    pub kind: String,
    pub actions: Vec<SemanticAction>,
    pub directive: MappedDirective,
}

impl ActionMapping {
    fn to_directive(actions: Vec<SemanticAction>, name: &str, payload: Value) -> Self {
        Self {
            kind: "ActionsToDirective".to_string(),
            actions,
            directive: MappedDirective {
                name: name.to_string(),
                payload,
            },
        }
    }
}

/// Directive issued for a semantic action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappedDirective {
    pub name: String,
    pub payload: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SemanticAction {
    #[serde(rename = "Alexa.Actions.Open")]
    Open,
    #[serde(rename = "Alexa.Actions.Close")]
    Close,
    #[serde(rename = "Alexa.Actions.Raise")]
    Raise,
    #[serde(rename = "Alexa.Actions.Lower")]
    Lower,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateMapping {
    #[serde(rename = "@type")]
    pub kind: String,
    pub states: Vec<SemanticState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<StateRange>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateRange {
    pub minimum_value: i64,
    pub maximum_value: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SemanticState {
    #[serde(rename = "Alexa.States.Open")]
    Open,
    #[serde(rename = "Alexa.States.Closed")]
    Closed,
}

/// Capabilities of a roller shutter endpoint
///
/// Open/Close go through the mode controller, Raise/Lower through the
/// position controller, so no action is mapped twice.
#[must_use]
pub fn shutter_capabilities() -> Vec<Capability> {
    vec![
        Capability::new(Interface::Alexa),
        mode_capability(),
        position_capability(),
        health_capability(),
    ]
}

/// Capability of a scene pseudo-endpoint
#[must_use]
pub fn scene_capabilities(en: &str, de: &str) -> Vec<Capability> {
    let mut scene = Capability::new(Interface::SceneController);
    scene.supports_deactivation = Some(false);
    scene.capability_resources = Some(Resources::named(en, de, &[]));
    vec![scene]
}

fn mode_capability() -> Capability {
    let mut mode = Capability::new(Interface::ModeController);
    mode.instance = Some(MODE_INSTANCE.to_string());
    mode.properties = Some(Properties::settable("mode"));
    mode.capability_resources = Some(Resources::named(
        "Shutter",
        "Rolladen",
        &["Alexa.Setting.Opening"],
    ));
    mode.configuration = Some(Configuration::Mode(ModeConfiguration {
        ordered: false,
        supported_modes: vec![
            SupportedMode {
                value: MODE_OPEN.to_string(),
                mode_resources: Resources::named("open", "öffnen", &["Alexa.Value.Open"]),
            },
            SupportedMode {
                value: MODE_CLOSE.to_string(),
                mode_resources: Resources::named("close", "schließen", &["Alexa.Value.Close"]),
            },
        ],
    }));
    mode.semantics = Some(Semantics {
        action_mappings: vec![
            ActionMapping::to_directive(
                vec![SemanticAction::Open],
                "SetMode",
                json!({ "mode": MODE_OPEN }),
            ),
            ActionMapping::to_directive(
                vec![SemanticAction::Close],
                "SetMode",
                json!({ "mode": MODE_CLOSE }),
            ),
        ],
        state_mappings: Vec::new(),
    });
    mode
}

fn position_capability() -> Capability {
    let mut position = Capability::new(Interface::RangeController);
    position.instance = Some(POSITION_INSTANCE.to_string());
    position.properties = Some(Properties::retrievable("rangeValue"));
    position.capability_resources = Some(Resources::named(
        "Position",
        "Position",
        &["Alexa.Setting.Opening"],
    ));
    position.configuration = Some(Configuration::Range(RangeConfiguration {
        supported_range: SupportedRange {
            minimum_value: POSITION_CLOSED,
            maximum_value: POSITION_OPEN,
            precision: 1,
        },
        unit_of_measure: "Alexa.Unit.Percent".to_string(),
        presets: vec![
            Preset {
                range_value: POSITION_OPEN,
                preset_resources: Resources::named("open", "offen", &["Alexa.Value.Maximum"]),
            },
            Preset {
                range_value: POSITION_CLOSED,
                preset_resources: Resources::named("closed", "geschlossen", &["Alexa.Value.Minimum"]),
            },
        ],
    }));
    position.semantics = Some(Semantics {
        action_mappings: vec![
            ActionMapping::to_directive(
                vec![SemanticAction::Raise],
                "AdjustRangeValue",
                json!({ "rangeValueDelta": POSITION_OPEN, "rangeValueDeltaDefault": false }),
            ),
            ActionMapping::to_directive(
                vec![SemanticAction::Lower],
                "AdjustRangeValue",
                json!({ "rangeValueDelta": -POSITION_OPEN, "rangeValueDeltaDefault": false }),
            ),
        ],
        state_mappings: vec![
            StateMapping {
                kind: "StatesToValue".to_string(),
                states: vec![SemanticState::Closed],
                value: Some(json!(POSITION_CLOSED)),
                range: None,
            },
            StateMapping {
                kind: "StatesToRange".to_string(),
                states: vec![SemanticState::Open],
                value: None,
                range: Some(StateRange {
                    minimum_value: POSITION_CLOSED + 1,
                    maximum_value: POSITION_OPEN,
                }),
            },
        ],
    });
    position
}

fn health_capability() -> Capability {
    let mut health = Capability::new(Interface::EndpointHealth);
    health.properties = Some(Properties::retrievable("connectivity"));
    health
}
