use serde::{Deserialize, Serialize};

/// Platform tags that use the secure store.
pub const MOBILE_TAGS: [&str; 2] = ["android", "ios"];

/// Which storage backend a platform keeps its device id in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlatformClass {
    Mobile,
    Other,
}

impl PlatformClass {
    pub fn from_tag(tag: &str) -> Self {
        if MOBILE_TAGS.contains(&tag) {
            PlatformClass::Mobile
        } else {
            PlatformClass::Other
        }
    }
}

/// The platform tag of the running binary, e.g. `linux`, `android`.
pub fn runtime_tag() -> &'static str {
    std::env::consts::OS
}
