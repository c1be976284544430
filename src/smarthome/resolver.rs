//! Backend device records → protocol endpoints

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::catalog::{scene_capabilities, shutter_capabilities, Capability, MANUFACTURER};
use super::directive::ShutterAction;
use crate::backend::DeviceRecord;

/// Endpoint id of the "open all" scene
pub const OPEN_ALL_ENDPOINT_ID: &str = "open-all-shutters";

/// Endpoint id of the "close all" scene
pub const CLOSE_ALL_ENDPOINT_ID: &str = "close-all-shutters";

/// Scene pseudo-endpoints, in discovery order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneTrigger {
    OpenAll,
    CloseAll,
}

impl SceneTrigger {
    pub const ALL: [Self; 2] = [Self::OpenAll, Self::CloseAll];

    #[must_use]
    pub fn from_endpoint_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.endpoint_id() == id)
    }

    #[must_use]
    pub const fn endpoint_id(self) -> &'static str {
        match self {
            Self::OpenAll => OPEN_ALL_ENDPOINT_ID,
            Self::CloseAll => CLOSE_ALL_ENDPOINT_ID,
        }
    }

    #[must_use]
    pub const fn action(self) -> ShutterAction {
        match self {
            Self::OpenAll => ShutterAction::Open,
            Self::CloseAll => ShutterAction::Close,
        }
    }

    const fn names(self) -> (&'static str, &'static str) {
        match self {
            Self::OpenAll => ("Open All Shutters", "Alle Rollläden öffnen"),
            Self::CloseAll => ("Close All Shutters", "Alle Rollläden schließen"),
        }
    }

    fn descriptor(self) -> EndpointDescriptor {
        let (en, de) = self.names();
        EndpointDescriptor {
            endpoint_id: self.endpoint_id().to_string(),
            manufacturer_name: MANUFACTURER.to_string(),
            friendly_name: en.to_string(),
            description: format!("Scene: {}", en.to_lowercase()),
            display_categories: vec![DisplayCategory::SceneTrigger],
            additional_attributes: None,
            cookie: Map::new(),
            capabilities: scene_capabilities(en, de),
        }
    }
}

/// Display category shown in the companion app
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DisplayCategory {
    ExteriorBlind,
    SceneTrigger,
}

/// Device metadata beyond the friendly name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdditionalAttributes {
    pub manufacturer: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    pub custom_identifier: String,
}

/// A discoverable endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointDescriptor {
    pub endpoint_id: String,
    pub manufacturer_name: String,
    pub friendly_name: String,
    pub description: String,
    pub display_categories: Vec<DisplayCategory>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_attributes: Option<AdditionalAttributes>,
    #[serde(default)]
    pub cookie: Map<String, Value>,
    pub capabilities: Vec<Capability>,
}

impl EndpointDescriptor {
    fn shutter(record: &DeviceRecord) -> Self {
        let name = record.name.as_deref().unwrap_or(&record.id);
        Self {
            endpoint_id: record.id.clone(),
            manufacturer_name: MANUFACTURER.to_string(),
            friendly_name: format!("Roller Shutter {name}"),
            description: format!("{MANUFACTURER} roller shutter {name}"),
            display_categories: vec![DisplayCategory::ExteriorBlind],
            additional_attributes: Some(AdditionalAttributes {
                manufacturer: MANUFACTURER.to_string(),
                model: record.model.clone(),
                custom_identifier: record.id.clone(),
            }),
            cookie: Map::new(),
            capabilities: shutter_capabilities(),
        }
    }
}

/// Build discovery endpoints from a backend listing
///
/// Shutters keep backend order; the scene endpoints always come last.
/// Records of any other device type are skipped.
#[must_use]
pub fn resolve(records: &[DeviceRecord]) -> Vec<EndpointDescriptor> {
    records
        .iter()
        .filter(|r| r.is_shutter())
        .map(EndpointDescriptor::shutter)
        .chain(SceneTrigger::ALL.into_iter().map(SceneTrigger::descriptor))
        .collect()
}
