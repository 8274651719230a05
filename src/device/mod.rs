pub mod memory;
pub mod platform;
pub mod resolver;

use serde::{Deserialize, Serialize};

pub use platform::PlatformClass;

/// Storage key the device id lives under in every backend.
pub const DEVICE_ID_KEY: &str = "deviceId";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceIdentity {
    pub platform_class: PlatformClass,
    pub id: String,
}
