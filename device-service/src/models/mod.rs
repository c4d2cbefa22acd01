pub mod device;
pub mod diagnostics;

pub use device::{
    extract_path, summary_projection, DeviceParameter, DeviceSummary, NOT_AVAILABLE, VALUE_KEY,
};
pub use diagnostics::{downloads_projection, gpon_projection, GponPower, LastDownload};
