//! AWS S3 storage backend
//!
//! Relies on the default AWS credential chain:
//! - IRSA role annotations in Kubernetes
//! - Environment variables (AWS_ACCESS_KEY_ID, AWS_SECRET_ACCESS_KEY)
//! - EC2 instance metadata / ECS task role

use object_store::aws::AmazonS3Builder;
use object_store::ObjectStore;
use std::sync::Arc;
use tracing::info;

use crate::config::BackendConfig;
use crate::errors::Result;

/// Build an S3 client for the configured bucket
pub fn build(config: &BackendConfig) -> Result<Arc<dyn ObjectStore>> {
    let mut builder = AmazonS3Builder::from_env().with_bucket_name(&config.bucket_name);

    if let Some(region) = &config.region {
        builder = builder.with_region(region);
    }

    // S3-compatible services like MinIO
    if let Some(endpoint) = &config.endpoint {
        builder = builder
            .with_endpoint(endpoint)
            .with_allow_http(endpoint.starts_with("http://"));
    }

    let store = builder.build()?;
    info!(bucket = %config.bucket_name, region = ?config.region, "Using AWS S3 backend");
    Ok(Arc::new(store))
}
