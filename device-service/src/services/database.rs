use crate::models::{downloads_projection, gpon_projection, summary_projection, DeviceParameter};
use crate::services::store::DeviceStore;
use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{
    bson::{doc, Document},
    options::{FindOneOptions, FindOptions},
    Client as MongoClient, Collection, Database,
};
use service_core::error::AppError;

#[derive(Clone)]
pub struct DeviceDb {
    client: MongoClient,
    db: Database,
    collection: String,
}

impl DeviceDb {
    pub async fn connect(uri: &str, database: &str, collection: &str) -> Result<Self, AppError> {
        tracing::info!(uri = %uri, "Connecting to MongoDB");
        let client = MongoClient::with_uri_str(uri).await.map_err(|e| {
            tracing::error!("Failed to connect to MongoDB at {}: {}", uri, e);
            AppError::from(e)
        })?;
        let db = client.database(database);
        tracing::info!(
            database = %database,
            collection = %collection,
            "Successfully connected to MongoDB database"
        );
        Ok(Self {
            client,
            db,
            collection: collection.to_string(),
        })
    }

    pub fn client(&self) -> &MongoClient {
        &self.client
    }

    pub fn devices(&self) -> Collection<Document> {
        self.db.collection(&self.collection)
    }

    async fn find_projected(
        &self,
        serial: &str,
        projection: Document,
    ) -> Result<Option<Document>, AppError> {
        let options = FindOneOptions::builder().projection(projection).build();

        self.devices()
            .find_one(serial_filter(serial), options)
            .await
            .map_err(|e| {
                tracing::error!(serial = %serial, "Failed to find device: {}", e);
                AppError::from(e)
            })
    }
}

/// Filter for a serial reported either by the CPE or by GenieACS itself.
pub fn serial_filter(serial: &str) -> Document {
    let mut reported = Document::new();
    reported.insert(DeviceParameter::SerialNumber.value_path(), serial);

    doc! {
        "$or": [
            reported,
            { "_deviceId._SerialNumber": serial },
        ]
    }
}

/// Devices whose `_lastInform` is a BSON date; null or string placeholders
/// never reach the sort.
pub fn recent_filter() -> Document {
    doc! { "_lastInform": { "$type": "date" } }
}

#[async_trait]
impl DeviceStore for DeviceDb {
    async fn list_devices(&self) -> Result<Vec<Document>, AppError> {
        let options = FindOptions::builder()
            .projection(summary_projection())
            .build();

        let cursor = self.devices().find(doc! {}, options).await.map_err(|e| {
            tracing::error!("Failed to query devices: {}", e);
            AppError::from(e)
        })?;

        cursor.try_collect().await.map_err(|e| {
            tracing::error!("Failed to read device cursor: {}", e);
            AppError::from(e)
        })
    }

    async fn find_by_serial(&self, serial: &str) -> Result<Option<Document>, AppError> {
        self.find_projected(serial, summary_projection()).await
    }

    async fn list_recent(&self, limit: i64) -> Result<Vec<Document>, AppError> {
        let options = FindOptions::builder()
            .projection(summary_projection())
            .sort(doc! { "_lastInform": -1 })
            .limit(limit)
            .build();

        let cursor = self
            .devices()
            .find(recent_filter(), options)
            .await
            .map_err(|e| {
                tracing::error!("Failed to query recent devices: {}", e);
                AppError::from(e)
            })?;

        cursor.try_collect().await.map_err(|e| {
            tracing::error!("Failed to read recent device cursor: {}", e);
            AppError::from(e)
        })
    }

    async fn find_gpon_interface(&self, serial: &str) -> Result<Option<Document>, AppError> {
        self.find_projected(serial, gpon_projection()).await
    }

    async fn find_downloads(&self, serial: &str) -> Result<Option<Document>, AppError> {
        self.find_projected(serial, downloads_projection()).await
    }

    async fn health_check(&self) -> Result<(), AppError> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 }, None)
            .await
            .map_err(|e| {
                tracing::error!("MongoDB health check failed: {}", e);
                AppError::from(e)
            })?;
        Ok(())
    }
}
