use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;

use crate::models::{DeviceSummary, GponPower, LastDownload};
use crate::services::{record_device_query, record_devices_returned};
use crate::startup::AppState;
use service_core::error::AppError;

pub const DEFAULT_RECENT_LIMIT: i64 = 10;
pub const MAX_RECENT_LIMIT: i64 = 100;

/// `limit` stays raw text so a malformed value falls back instead of rejecting the request.
#[derive(Debug, Deserialize)]
pub struct RecentDevicesQuery {
    pub limit: Option<String>,
}

/// Leading-integer parse: surrounding text after the digits is ignored,
/// and a missing, non-numeric or zero limit means the default.
pub fn parse_limit(raw: Option<&str>) -> i64 {
    let Some(raw) = raw else {
        return DEFAULT_RECENT_LIMIT;
    };

    let trimmed = raw.trim_start();
    let (negative, unsigned) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };
    let digits = unsigned.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 {
        return DEFAULT_RECENT_LIMIT;
    }

    let magnitude = unsigned[..digits].parse::<i64>().unwrap_or(i64::MAX);
    let limit = if negative { -magnitude } else { magnitude };
    if limit == 0 {
        DEFAULT_RECENT_LIMIT
    } else {
        limit.clamp(1, MAX_RECENT_LIMIT)
    }
}

/// `GET /devices`: every device in the collection, flattened.
#[tracing::instrument(skip(state))]
pub async fn list_devices(
    State(state): State<AppState>,
) -> Result<Json<Vec<DeviceSummary>>, AppError> {
    let devices = state.store.list_devices().await;
    record_device_query("list", devices.is_ok());
    let devices = devices?;

    let summaries: Vec<DeviceSummary> = devices.iter().map(DeviceSummary::from).collect();
    record_devices_returned("list", summaries.len());
    tracing::info!(count = summaries.len(), "Listed devices");

    Ok(Json(summaries))
}

#[tracing::instrument(skip(state))]
pub async fn get_device_by_serial(
    State(state): State<AppState>,
    Path(serial): Path<String>,
) -> Result<Json<DeviceSummary>, AppError> {
    let device = state.store.find_by_serial(&serial).await;
    record_device_query("serial", device.is_ok());

    match device? {
        Some(d) => Ok(Json(DeviceSummary::from_document(&d))),
        None => Err(AppError::NotFound(anyhow::anyhow!(
            "Device not found: {}",
            serial
        ))),
    }
}

#[tracing::instrument(skip(state))]
pub async fn list_recent_devices(
    State(state): State<AppState>,
    Query(query): Query<RecentDevicesQuery>,
) -> Result<Json<Vec<DeviceSummary>>, AppError> {
    let limit = parse_limit(query.limit.as_deref());

    let devices = state.store.list_recent(limit).await;
    record_device_query("recent", devices.is_ok());
    let devices = devices?;

    let summaries: Vec<DeviceSummary> = devices.iter().map(DeviceSummary::from).collect();
    record_devices_returned("recent", summaries.len());

    Ok(Json(summaries))
}

#[tracing::instrument(skip(state))]
pub async fn get_gpon_power(
    State(state): State<AppState>,
    Path(serial): Path<String>,
) -> Result<Json<GponPower>, AppError> {
    let device = state.store.find_gpon_interface(&serial).await;
    record_device_query("gpon", device.is_ok());

    match device? {
        Some(d) => Ok(Json(GponPower::from_document(&d))),
        None => Err(AppError::NotFound(anyhow::anyhow!(
            "Device not found: {}",
            serial
        ))),
    }
}

/// An unknown serial is not an error here: it reads as "never downloaded".
#[tracing::instrument(skip(state))]
pub async fn get_last_download(
    State(state): State<AppState>,
    Path(serial): Path<String>,
) -> Result<Json<LastDownload>, AppError> {
    let device = state.store.find_downloads(&serial).await;
    record_device_query("downloads", device.is_ok());

    let last_download = device?
        .map(|d| LastDownload::from_document(&d))
        .unwrap_or_default();
    Ok(Json(last_download))
}
