#![allow(dead_code)]

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use device_service::config::{DeviceConfig, MongoConfig, ObservabilityConfig};
use device_service::services::{DeviceDb, DeviceStore, MockDeviceStore};
use device_service::startup::Application;
use device_service::{build_router, AppState};
use mongodb::bson::{doc, DateTime, Document};
use service_core::config::Config as CoreConfig;
use std::sync::Arc;
use tower::util::ServiceExt;

/// A fully populated GenieACS device document.
pub fn device_document(serial: &str, product_class: &str, version: &str, ip: &str) -> Document {
    doc! {
        "_id": format!("00259E-{}-{}", product_class, serial),
        "_deviceId": {
            "_SerialNumber": serial,
            "_ProductClass": product_class,
            "_OUI": "00259E",
        },
        "InternetGatewayDevice": {
            "DeviceInfo": {
                "SerialNumber": { "_value": serial, "_type": "xsd:string" },
                "ProductClass": { "_value": product_class },
                "SoftwareVersion": { "_value": version },
                "UpTime": { "_value": 3600 },
            },
            "WANDevice": {
                "1": {
                    "WANConnectionDevice": {
                        "1": {
                            "WANIPConnection": {
                                "1": { "ExternalIPAddress": { "_value": ip } }
                            }
                        }
                    }
                }
            }
        }
    }
}

pub fn with_last_inform(mut device: Document, millis: i64) -> Document {
    device.insert("_lastInform", DateTime::from_millis(millis));
    device
}

/// Router over an in-memory store.
pub fn mock_router(devices: Vec<Document>) -> Router {
    router_with(Arc::new(MockDeviceStore::new(devices)))
}

pub fn router_with(store: Arc<dyn DeviceStore>) -> Router {
    build_router(AppState::new(store))
}

pub async fn get(router: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let response = router
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null)
    };

    (status, body)
}

/// The service running against a real MongoDB in a throwaway database.
pub struct TestApp {
    pub http_address: String,
    pub port: u16,
    pub db: DeviceDb,
    pub db_name: String,
}

impl TestApp {
    pub async fn spawn() -> Self {
        let db_name = format!("device_test_{}", uuid::Uuid::new_v4().simple());

        let config = DeviceConfig {
            common: CoreConfig {
                port: 0, // Random port for testing
                log_level: "info".to_string(),
            },
            mongodb: MongoConfig {
                uri: std::env::var("TEST_MONGODB_URI")
                    .unwrap_or_else(|_| "mongodb://localhost:27017".to_string()),
                database: db_name.clone(),
                collection: "devices".to_string(),
            },
            observability: ObservabilityConfig {
                otlp_endpoint: None,
            },
        };

        let app = Application::build(config)
            .await
            .expect("Failed to build test application");

        let port = app.port();
        let db = app.db().clone();
        let http_address = format!("http://127.0.0.1:{}", port);

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        // Wait for HTTP server to be ready by polling health endpoint
        let client = reqwest::Client::new();
        let health_url = format!("{}/health", http_address);
        for _ in 0..50 {
            if client.get(&health_url).send().await.is_ok() {
                break;
            }
            tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
        }

        TestApp {
            http_address,
            port,
            db,
            db_name,
        }
    }

    pub async fn seed(&self, devices: Vec<Document>) {
        if devices.is_empty() {
            return;
        }
        self.db
            .devices()
            .insert_many(devices, None)
            .await
            .expect("Failed to seed devices");
    }

    /// Drop the throwaway database.
    pub async fn cleanup(&self) {
        let _ = self.db.client().database(&self.db_name).drop(None).await;
    }
}
