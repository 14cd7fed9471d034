//! Google Cloud Storage backend
//!
//! Authentication follows the Application Default Credentials chain:
//! - Workload Identity in GKE
//! - GOOGLE_APPLICATION_CREDENTIALS / GOOGLE_SERVICE_ACCOUNT environment variables
//! - GCE metadata server

use object_store::gcp::GoogleCloudStorageBuilder;
use object_store::ObjectStore;
use std::sync::Arc;
use tracing::info;

use crate::config::BackendConfig;
use crate::errors::Result;

/// Build a GCS client for the configured bucket
pub fn build(config: &BackendConfig) -> Result<Arc<dyn ObjectStore>> {
    let store = GoogleCloudStorageBuilder::from_env()
        .with_bucket_name(&config.bucket_name)
        .build()?;
    info!(bucket = %config.bucket_name, "Using Google Cloud Storage backend");
    Ok(Arc::new(store))
}
