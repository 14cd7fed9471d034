//! Azure Blob Storage backend
//!
//! The bucket name is used as the container. Account and credentials come
//! from the standard AZURE_STORAGE_* variables or managed identity.

use object_store::azure::MicrosoftAzureBuilder;
use object_store::ObjectStore;
use std::sync::Arc;
use tracing::info;

use crate::config::BackendConfig;
use crate::errors::Result;

/// Build an Azure Blob client for the configured container
pub fn build(config: &BackendConfig) -> Result<Arc<dyn ObjectStore>> {
    let store = MicrosoftAzureBuilder::from_env()
        .with_container_name(&config.bucket_name)
        .build()?;
    info!(container = %config.bucket_name, "Using Azure Blob Storage backend");
    Ok(Arc::new(store))
}
