pub mod devices;
pub mod health;

pub use devices::{
    get_device_by_serial, get_gpon_power, get_last_download, list_devices, list_recent_devices,
};
pub use health::{health_check, metrics_endpoint, readiness_check};
