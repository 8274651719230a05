use async_trait::async_trait;
use sysinfo::System;

use crate::error::StorageError;

/// Reports total physical memory, used as a last-resort device id.
#[async_trait]
pub trait MemoryProbe: Send + Sync {
    async fn total_memory(&self) -> Result<u64, StorageError>;
}

pub struct SystemMemory;

#[async_trait]
impl MemoryProbe for SystemMemory {
    async fn total_memory(&self) -> Result<u64, StorageError> {
        let mut sys = System::new();
        sys.refresh_memory();
        match sys.total_memory() {
            0 => Err(StorageError::Probe("total memory unavailable".to_string())),
            bytes => Ok(bytes),
        }
    }
}
