use mongodb::bson::{Bson, Document};
use serde::{Deserialize, Serialize};

/// Placeholder for a parameter the device document does not carry.
pub const NOT_AVAILABLE: &str = "N/A";

/// GenieACS stores each TR-069 parameter as an object whose `_value` key holds the leaf.
pub const VALUE_KEY: &str = "_value";

/// The TR-069 parameters reported per device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceParameter {
    SerialNumber,
    ProductClass,
    SoftwareVersion,
    ExternalIpAddress,
}

impl DeviceParameter {
    /// Output order of the summary.
    pub const ALL: [DeviceParameter; 4] = [
        DeviceParameter::SerialNumber,
        DeviceParameter::ProductClass,
        DeviceParameter::SoftwareVersion,
        DeviceParameter::ExternalIpAddress,
    ];

    /// Key segments of the parameter object, without the trailing `_value`.
    pub fn path(self) -> &'static [&'static str] {
        match self {
            DeviceParameter::SerialNumber => {
                &["InternetGatewayDevice", "DeviceInfo", "SerialNumber"]
            }
            DeviceParameter::ProductClass => {
                &["InternetGatewayDevice", "DeviceInfo", "ProductClass"]
            }
            DeviceParameter::SoftwareVersion => {
                &["InternetGatewayDevice", "DeviceInfo", "SoftwareVersion"]
            }
            DeviceParameter::ExternalIpAddress => &[
                "InternetGatewayDevice",
                "WANDevice",
                "1",
                "WANConnectionDevice",
                "1",
                "WANIPConnection",
                "1",
                "ExternalIPAddress",
            ],
        }
    }

    /// Dotted form used in MongoDB projections and filters.
    pub fn dotted_path(self) -> String {
        self.path().join(".")
    }

    /// Dotted path of the `_value` leaf.
    pub fn value_path(self) -> String {
        format!("{}.{}", self.dotted_path(), VALUE_KEY)
    }

    /// Read this parameter's `_value` from a device document.
    pub fn extract(self, document: &Document) -> String {
        let mut keys = self.path().to_vec();
        keys.push(VALUE_KEY);
        extract_path(document, &keys, NOT_AVAILABLE)
    }
}

/// Walk `keys` through nested documents and render the leaf as a string.
///
/// Returns `default` as soon as a segment is missing, an intermediate value is
/// not an embedded document, or the leaf is not a scalar. String leaves are
/// returned verbatim; numeric and boolean leaves use their display form.
pub fn extract_path(document: &Document, keys: &[&str], default: &str) -> String {
    let Some((leaf, parents)) = keys.split_last() else {
        return default.to_string();
    };

    let mut current = document;
    for key in parents {
        match current.get(*key) {
            Some(Bson::Document(inner)) => current = inner,
            _ => return default.to_string(),
        }
    }

    match current.get(*leaf) {
        Some(Bson::String(value)) => value.clone(),
        Some(Bson::Int32(value)) => value.to_string(),
        Some(Bson::Int64(value)) => value.to_string(),
        Some(Bson::Double(value)) => value.to_string(),
        Some(Bson::Boolean(value)) => value.to_string(),
        _ => default.to_string(),
    }
}

/// Projection selecting only the reported parameter subtrees.
pub fn summary_projection() -> Document {
    DeviceParameter::ALL
        .iter()
        .map(|parameter| (parameter.dotted_path(), Bson::Int32(1)))
        .collect()
}

/// Flattened view of a device, serialized in the order the fields are declared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DeviceSummary {
    pub serial_number: String,
    pub product_class: String,
    pub software_version: String,
    #[serde(rename = "ExternalIPAddress")]
    pub external_ip_address: String,
}

impl DeviceSummary {
    pub fn from_document(document: &Document) -> Self {
        Self {
            serial_number: DeviceParameter::SerialNumber.extract(document),
            product_class: DeviceParameter::ProductClass.extract(document),
            software_version: DeviceParameter::SoftwareVersion.extract(document),
            external_ip_address: DeviceParameter::ExternalIpAddress.extract(document),
        }
    }
}

impl Default for DeviceSummary {
    fn default() -> Self {
        Self {
            serial_number: NOT_AVAILABLE.to_string(),
            product_class: NOT_AVAILABLE.to_string(),
            software_version: NOT_AVAILABLE.to_string(),
            external_ip_address: NOT_AVAILABLE.to_string(),
        }
    }
}

impl From<&Document> for DeviceSummary {
    fn from(document: &Document) -> Self {
        Self::from_document(document)
    }
}
