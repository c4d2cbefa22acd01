pub mod database;
pub mod metrics;
pub mod store;

pub use database::{recent_filter, serial_filter, DeviceDb};
pub use metrics::{get_metrics, init_metrics, record_device_query, record_devices_returned};
pub use store::{DeviceStore, MockDeviceStore};
