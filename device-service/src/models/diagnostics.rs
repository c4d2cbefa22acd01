use chrono::SecondsFormat;
use mongodb::bson::{doc, Bson, Document};
use serde::{Deserialize, Serialize};

use super::device::{extract_path, NOT_AVAILABLE, VALUE_KEY};

const GPON_INTERFACE_KEY: &str = "X_FH_GponInterfaceConfig";

/// Only the WAN subtree is needed to locate the GPON interface.
pub fn gpon_projection() -> Document {
    doc! { "InternetGatewayDevice.WANDevice": 1 }
}

pub fn downloads_projection() -> Document {
    doc! { "Downloads": 1 }
}

/// Optical levels reported by the ONT's GPON interface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GponPower {
    #[serde(rename = "RXPower")]
    pub rx_power: String,
    #[serde(rename = "TXPower")]
    pub tx_power: String,
}

impl Default for GponPower {
    fn default() -> Self {
        Self {
            rx_power: NOT_AVAILABLE.to_string(),
            tx_power: NOT_AVAILABLE.to_string(),
        }
    }
}

impl GponPower {
    /// Reads the first `WANDevice.<n>` instance that carries a GPON interface config.
    pub fn from_document(device: &Document) -> Self {
        let Some(interface) = gpon_interface(device) else {
            return Self::default();
        };

        Self {
            rx_power: power_level(interface, "RXPower"),
            tx_power: power_level(interface, "TXPower"),
        }
    }
}

fn gpon_interface(device: &Document) -> Option<&Document> {
    device
        .get_document("InternetGatewayDevice")
        .and_then(|igd| igd.get_document("WANDevice"))
        .ok()?
        .iter()
        .filter_map(|(_, wan)| wan.as_document())
        .find_map(|wan| wan.get_document(GPON_INTERFACE_KEY).ok())
}

fn power_level(interface: &Document, key: &str) -> String {
    let level = extract_path(interface, &[key, VALUE_KEY], NOT_AVAILABLE);
    if level.is_empty() {
        NOT_AVAILABLE.to_string()
    } else {
        level
    }
}

/// Completion time of the device's most recent firmware download, if any.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LastDownload {
    #[serde(rename = "lastDownload")]
    pub last_download: Option<String>,
}

impl LastDownload {
    /// Looks at the first `Downloads.<n>` instance; GenieACS `_`-prefixed
    /// metadata keys are not instances.
    pub fn from_document(device: &Document) -> Self {
        let last_download = device
            .get_document("Downloads")
            .ok()
            .and_then(|downloads| {
                downloads
                    .iter()
                    .find(|(key, _)| !key.starts_with('_'))
                    .and_then(|(_, instance)| instance.as_document())
            })
            .and_then(|instance| instance.get_document("LastDownload").ok())
            .and_then(|last| match last.get(VALUE_KEY) {
                Some(Bson::DateTime(at)) => {
                    Some(at.to_chrono().to_rfc3339_opts(SecondsFormat::Millis, true))
                }
                _ => None,
            });

        Self { last_download }
    }
}
