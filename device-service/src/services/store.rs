use async_trait::async_trait;
use mongodb::bson::Document;
use service_core::error::AppError;

use crate::models::VALUE_KEY;

/// Read access to the GenieACS `devices` collection.
///
/// Implementations return raw (projected) device documents; flattening into
/// summaries happens in the handlers.
#[async_trait]
pub trait DeviceStore: Send + Sync {
    /// Every device document, unfiltered and in natural order.
    async fn list_devices(&self) -> Result<Vec<Document>, AppError>;

    /// The device whose TR-069 serial or GenieACS `_deviceId._SerialNumber` equals `serial`.
    async fn find_by_serial(&self, serial: &str) -> Result<Option<Document>, AppError>;

    /// Up to `limit` devices that have informed, newest `_lastInform` first.
    async fn list_recent(&self, limit: i64) -> Result<Vec<Document>, AppError>;

    /// The `InternetGatewayDevice.WANDevice` subtree of the device matching `serial`.
    async fn find_gpon_interface(&self, serial: &str) -> Result<Option<Document>, AppError>;

    /// The `Downloads` subtree of the device matching `serial`.
    async fn find_downloads(&self, serial: &str) -> Result<Option<Document>, AppError>;

    async fn health_check(&self) -> Result<(), AppError>;
}

/// In-memory store for tests and local runs without MongoDB.
pub struct MockDeviceStore {
    devices: Vec<Document>,
    healthy: bool,
}

impl MockDeviceStore {
    pub fn new(devices: Vec<Document>) -> Self {
        Self {
            devices,
            healthy: true,
        }
    }

    /// A store whose every call fails like an unreachable database.
    pub fn unavailable() -> Self {
        Self {
            devices: Vec::new(),
            healthy: false,
        }
    }

    fn find(&self, serial: &str) -> Option<Document> {
        self.devices
            .iter()
            .find(|device| matches_serial(device, serial))
            .cloned()
    }

    fn ensure_available(&self) -> Result<(), AppError> {
        if self.healthy {
            Ok(())
        } else {
            Err(AppError::DatabaseError(anyhow::anyhow!(
                "mock device store is unavailable"
            )))
        }
    }
}

fn matches_serial(device: &Document, serial: &str) -> bool {
    let tr069_serial = device
        .get_document("InternetGatewayDevice")
        .and_then(|d| d.get_document("DeviceInfo"))
        .and_then(|d| d.get_document("SerialNumber"))
        .and_then(|d| d.get_str(VALUE_KEY));
    let acs_serial = device
        .get_document("_deviceId")
        .and_then(|d| d.get_str("_SerialNumber"));

    tr069_serial.ok() == Some(serial) || acs_serial.ok() == Some(serial)
}

#[async_trait]
impl DeviceStore for MockDeviceStore {
    async fn list_devices(&self) -> Result<Vec<Document>, AppError> {
        self.ensure_available()?;
        Ok(self.devices.clone())
    }

    async fn find_by_serial(&self, serial: &str) -> Result<Option<Document>, AppError> {
        self.ensure_available()?;
        tracing::debug!(serial = %serial, "[MOCK] Looking up device");
        Ok(self.find(serial))
    }

    async fn list_recent(&self, limit: i64) -> Result<Vec<Document>, AppError> {
        self.ensure_available()?;
        let mut informed: Vec<(i64, &Document)> = self
            .devices
            .iter()
            .filter_map(|device| {
                device
                    .get_datetime("_lastInform")
                    .ok()
                    .map(|at| (at.timestamp_millis(), device))
            })
            .collect();
        informed.sort_by(|a, b| b.0.cmp(&a.0));

        Ok(informed
            .into_iter()
            .take(usize::try_from(limit).unwrap_or(0))
            .map(|(_, device)| device.clone())
            .collect())
    }

    async fn find_gpon_interface(&self, serial: &str) -> Result<Option<Document>, AppError> {
        self.ensure_available()?;
        Ok(self.find(serial))
    }

    async fn find_downloads(&self, serial: &str) -> Result<Option<Document>, AppError> {
        self.ensure_available()?;
        Ok(self.find(serial))
    }

    async fn health_check(&self) -> Result<(), AppError> {
        self.ensure_available()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::{doc, DateTime};

    fn device(serial: &str, last_inform_ms: Option<i64>) -> Document {
        let mut device = doc! {
            "_deviceId": { "_SerialNumber": serial },
            "InternetGatewayDevice": {
                "DeviceInfo": { "SerialNumber": { "_value": serial } }
            }
        };
        if let Some(ms) = last_inform_ms {
            device.insert("_lastInform", DateTime::from_millis(ms));
        }
        device
    }

    #[tokio::test]
    async fn test_find_by_serial_matches_device_id_only_documents() {
        let store = MockDeviceStore::new(vec![doc! {
            "_deviceId": { "_SerialNumber": "ZTEGC8A1B2C3" }
        }]);

        let found = store.find_by_serial("ZTEGC8A1B2C3").await.unwrap();
        assert!(found.is_some());
        assert!(store.find_by_serial("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_recent_orders_by_last_inform_and_skips_silent_devices() {
        let store = MockDeviceStore::new(vec![
            device("old", Some(1_000)),
            device("never", None),
            device("new", Some(3_000)),
            device("mid", Some(2_000)),
        ]);

        let recent = store.list_recent(2).await.unwrap();
        let serials: Vec<&str> = recent
            .iter()
            .map(|d| d.get_document("_deviceId").unwrap().get_str("_SerialNumber").unwrap())
            .collect();

        assert_eq!(serials, vec!["new", "mid"]);
    }

    #[tokio::test]
    async fn test_unavailable_store_fails_every_call() {
        let store = MockDeviceStore::unavailable();

        assert!(matches!(
            store.list_devices().await,
            Err(AppError::DatabaseError(_))
        ));
        assert!(store.find_downloads("any").await.is_err());
        assert!(store.health_check().await.is_err());
    }
}
